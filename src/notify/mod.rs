//! Outbound notifications.
//!
//! Delivery is an external concern; the core hands a finished [`EmailMessage`]
//! to whatever [`Notifier`] the host application wires in.

/// HTML rendering of document emails
pub mod email;

use crate::{
    core::document::DocumentDetails,
    entities::DocumentModel,
    errors::Result,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

pub use email::render_document_email;

/// An opaque file attached to an email, e.g. a rendered PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name shown to the recipient
    pub filename: String,
    /// Raw file bytes
    pub content: Vec<u8>,
}

impl Attachment {
    /// A PDF named after the document, e.g. `invoice-INV-2024-001.pdf`.
    #[must_use]
    pub fn for_document(document: &DocumentModel, content: Vec<u8>) -> Self {
        Self {
            filename: format!("{}-{}.pdf", document.kind, document.number),
            content,
        }
    }
}

/// A ready-to-send email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Recipient address
    pub recipient: String,
    /// Address replies should go to, from the sender configuration
    pub reply_to: Option<String>,
    /// Subject line
    pub subject: String,
    /// Rendered HTML body
    pub html_body: String,
    /// Optional file, usually the document as a PDF
    pub attachment: Option<Attachment>,
}

/// Delivers emails on behalf of the send workflow.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one message.
    ///
    /// # Errors
    /// Implementations return `Error::Notification` when delivery fails.
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Produces the file attached to a document's email, e.g. a PDF rendering.
#[async_trait]
pub trait AttachmentRenderer: Send + Sync {
    /// Renders the attachment for one document.
    ///
    /// # Errors
    /// A failure aborts the send before the document changes status.
    async fn render(&self, details: &DocumentDetails) -> Result<Attachment>;
}

/// Notifier that only logs the message. Useful in development.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            recipient = %message.recipient,
            subject = %message.subject,
            bytes = message.html_body.len(),
            attachment = message.attachment.as_ref().map(|a| a.filename.as_str()),
            "Email delivery skipped (log notifier)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        let message = EmailMessage {
            recipient: "ap@acme.test".to_string(),
            reply_to: None,
            subject: "Invoice #INV-1 from Billing".to_string(),
            html_body: "<p>hi</p>".to_string(),
            attachment: None,
        };
        assert!(LogNotifier.send(&message).await.is_ok());
    }
}
