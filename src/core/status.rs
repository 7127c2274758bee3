//! Status lifecycles for invoices and quotes.
//!
//! Invoice: `draft -> sent -> {paid, overdue, cancelled}`.
//! Quote: `draft -> sent -> {accepted, rejected, expired}`.
//! Every status after `sent` is terminal. A draft is never cancelled; it is deleted.

use crate::{
    core::{caller::CallerContext, document::find_owned_document},
    entities::{Document, DocumentKind, DocumentStatus, document},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument, warn};

impl DocumentStatus {
    /// Whether the document has reached the client and must be kept for the record.
    ///
    /// Cancelled, rejected and expired documents are closed but were never
    /// binding, so they are not committed.
    #[must_use]
    pub const fn is_committed(self) -> bool {
        matches!(
            self,
            Self::Sent | Self::Paid | Self::Overdue | Self::Accepted
        )
    }
}

/// Whether no further transition leaves `status`.
#[must_use]
pub fn is_terminal(kind: DocumentKind, status: DocumentStatus) -> bool {
    allowed_transitions(kind, status).is_empty()
}

/// Statuses reachable in one step from `from`.
#[must_use]
pub const fn allowed_transitions(
    kind: DocumentKind,
    from: DocumentStatus,
) -> &'static [DocumentStatus] {
    use DocumentStatus::{Accepted, Cancelled, Draft, Expired, Overdue, Paid, Rejected, Sent};

    match (kind, from) {
        (_, Draft) => &[Sent],
        (DocumentKind::Invoice, Sent) => &[Paid, Overdue, Cancelled],
        (DocumentKind::Quote, Sent) => &[Accepted, Rejected, Expired],
        _ => &[],
    }
}

/// Whether `from -> to` is a legal move for `kind`.
#[must_use]
pub fn can_transition(kind: DocumentKind, from: DocumentStatus, to: DocumentStatus) -> bool {
    allowed_transitions(kind, from).contains(&to)
}

/// Fails unless `from -> to` is a legal move for `kind`.
///
/// # Errors
/// `InvalidStatus` when `to` is not in the kind's vocabulary at all,
/// `InvalidTransition` when it is but cannot be reached from `from`.
pub fn ensure_transition(kind: DocumentKind, from: DocumentStatus, to: DocumentStatus) -> Result<()> {
    if !kind.permits(to) {
        return Err(Error::InvalidStatus { kind, status: to });
    }
    if !can_transition(kind, from, to) {
        return Err(Error::InvalidTransition { kind, from, to });
    }
    Ok(())
}

/// Moves `document_id` from `from` to `to` only if it still holds `from`.
///
/// Returns whether the row was updated. A `false` means another writer got there first.
pub(crate) async fn compare_and_set_status<C>(
    db: &C,
    caller: &CallerContext,
    document_id: Uuid,
    from: DocumentStatus,
    to: DocumentStatus,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = Document::update_many()
        .set(document::ActiveModel {
            status: Set(to),
            updated_at: Set(Utc::now()),
            ..Default::default()
        })
        .filter(document::Column::Id.eq(document_id))
        .filter(document::Column::UserId.eq(caller.user_id.as_str()))
        .filter(document::Column::Status.eq(from))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Applies a legal status change to one of the caller's documents.
///
/// # Errors
/// Returns an error if:
/// - The document does not exist or belongs to another user (`NotFound`)
/// - `to` is not part of the kind's lifecycle (`InvalidStatus`)
/// - The move is not allowed from the current status (`InvalidTransition`)
/// - The status changed concurrently between read and write (`InvalidTransition`)
#[instrument(skip(db), fields(user_id = %caller.user_id))]
pub async fn transition_document(
    db: &DatabaseConnection,
    caller: &CallerContext,
    document_id: Uuid,
    to: DocumentStatus,
) -> Result<document::Model> {
    let current = find_owned_document(db, caller, document_id).await?;
    ensure_transition(current.kind, current.status, to)?;

    if !compare_and_set_status(db, caller, document_id, current.status, to).await? {
        let latest = find_owned_document(db, caller, document_id).await?;
        warn!(%document_id, expected = %current.status, found = %latest.status, "Status changed concurrently");
        return Err(Error::InvalidTransition {
            kind: latest.kind,
            from: latest.status,
            to,
        });
    }

    let updated = find_owned_document(db, caller, document_id).await?;
    info!(%document_id, from = %current.status, to = %updated.status, "Document status changed");
    Ok(updated)
}

/// Moves sent invoices whose due date is before `today` to overdue.
///
/// Regular callers sweep their own invoices; an admin caller sweeps every user's.
/// Intended for an external scheduler.
#[instrument(skip(db), fields(user_id = %caller.user_id))]
pub async fn mark_overdue_invoices(
    db: &DatabaseConnection,
    caller: &CallerContext,
    today: NaiveDate,
) -> Result<Vec<document::Model>> {
    let mut query = Document::find()
        .filter(document::Column::Kind.eq(DocumentKind::Invoice))
        .filter(document::Column::Status.eq(DocumentStatus::Sent))
        .filter(document::Column::DueDate.lt(today));
    if !caller.is_admin {
        query = query.filter(document::Column::UserId.eq(caller.user_id.as_str()));
    }
    let candidates = query.order_by_asc(document::Column::DueDate).all(db).await?;

    let mut marked = Vec::with_capacity(candidates.len());
    for invoice in candidates {
        let owner = CallerContext::user(invoice.user_id.clone());
        if compare_and_set_status(db, &owner, invoice.id, DocumentStatus::Sent, DocumentStatus::Overdue)
            .await?
        {
            marked.push(find_owned_document(db, &owner, invoice.id).await?);
        }
    }

    if !marked.is_empty() {
        info!(count = marked.len(), %today, "Marked invoices overdue");
    }
    Ok(marked)
}
