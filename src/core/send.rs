//! Send workflow - Moves a draft to sent and emails the client.
//!
//! The status change is committed first with a conditional write; delivery
//! happens afterwards. A delivery failure does not roll the status back, it is
//! reported in the outcome so the caller can retry the email on its own.

use crate::{
    config::SenderConfig,
    core::{
        caller::CallerContext,
        document::{DocumentDetails, find_owned_document, hydrate},
        status::compare_and_set_status,
    },
    entities::DocumentStatus,
    errors::{Error, Result},
    notify::{AttachmentRenderer, Notifier, render_document_email},
};
use sea_orm::{DatabaseConnection, prelude::Uuid};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// What happened to the email after the document was marked sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum NotificationOutcome {
    /// The email was handed to the notifier successfully
    Delivered,
    /// The document is sent but the email did not go out
    Failed {
        /// Notifier error message
        reason: String,
    },
}

/// Result of [`send_document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendOutcome {
    /// The document as stored after the status change
    pub details: DocumentDetails,
    /// Delivery result for the email
    pub notification: NotificationOutcome,
}

impl SendOutcome {
    /// Whether the email was delivered as well.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.notification, NotificationOutcome::Delivered)
    }
}

/// Sends a draft invoice or quote to its client.
///
/// When `attachments` is given, its file is rendered before the status change
/// and attached to the email.
///
/// # Errors
/// Returns an error if:
/// - The document does not exist or belongs to another user (`NotFound`)
/// - The document is not a draft, including when a concurrent send won (`InvalidState`)
/// - The client was deleted or has no email address (`Validation`); nothing changes
/// - The attachment cannot be rendered; nothing changes
/// - The database write fails
///
/// A notifier failure is not an error; see [`NotificationOutcome::Failed`].
#[instrument(skip(db, notifier, attachments, sender), fields(user_id = %caller.user_id))]
pub async fn send_document(
    db: &DatabaseConnection,
    caller: &CallerContext,
    document_id: Uuid,
    notifier: &dyn Notifier,
    attachments: Option<&dyn AttachmentRenderer>,
    sender: &SenderConfig,
) -> Result<SendOutcome> {
    let document = find_owned_document(db, caller, document_id).await?;
    if document.status != DocumentStatus::Draft {
        return Err(Error::InvalidState {
            kind: document.kind,
            status: document.status,
            action: "send",
        });
    }

    let mut details = hydrate(db, document).await?;
    let attachment = match attachments {
        Some(renderer) => Some(renderer.render(&details).await?),
        None => None,
    };
    let message = render_document_email(&details, sender, attachment)?;

    if !compare_and_set_status(db, caller, document_id, DocumentStatus::Draft, DocumentStatus::Sent)
        .await?
    {
        let latest = find_owned_document(db, caller, document_id).await?;
        return Err(Error::InvalidState {
            kind: latest.kind,
            status: latest.status,
            action: "send",
        });
    }
    details.document = find_owned_document(db, caller, document_id).await?;
    info!(%document_id, number = %details.document.number, "Document marked sent");

    let notification = match notifier.send(&message).await {
        Ok(()) => {
            info!(%document_id, recipient = %message.recipient, "Document email delivered");
            NotificationOutcome::Delivered
        }
        Err(e) => {
            warn!(%document_id, error = %e, "Document sent but email delivery failed");
            NotificationOutcome::Failed {
                reason: e.to_string(),
            }
        }
    };

    Ok(SendOutcome {
        details,
        notification,
    })
}
