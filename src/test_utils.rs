//! Shared test utilities for the billing core.
//!
//! Helpers for setting up an in-memory database and creating clients and
//! documents with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    config::settings::BillingConfig,
    core::{
        caller::CallerContext,
        client::{NewClient, create_client},
        document::create_document,
        model::{DocumentDraft, LineItemInput},
    },
    entities::{DocumentKind, client, document},
    errors::{Error, Result},
    notify::{EmailMessage, Notifier},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Regular caller who owns the fixtures.
pub fn test_caller() -> CallerContext {
    CallerContext::user("test_user")
}

/// Regular caller who owns nothing by default.
pub fn other_caller() -> CallerContext {
    CallerContext::user("other_user")
}

pub fn admin_caller() -> CallerContext {
    CallerContext::admin("admin_user")
}

/// Creates a client with an email derived from its name.
///
/// `"Acme"` gets `billing@acme.test`.
pub async fn create_test_client(
    db: &DatabaseConnection,
    caller: &CallerContext,
    name: &str,
) -> Result<client::Model> {
    let domain: String = name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_lowercase();
    create_client(
        db,
        caller,
        NewClient::named(name).with_email(format!("billing@{domain}.test")),
    )
    .await
}

/// Sets up a database with one client named "Acme" owned by [`test_caller`].
pub async fn setup_with_client() -> Result<(DatabaseConnection, client::Model)> {
    let db = setup_test_db().await?;
    let client = create_test_client(&db, &test_caller(), "Acme").await?;
    Ok((db, client))
}

/// Design 2 x 100 and Hosting 1 x 50: subtotal 250.
pub fn sample_items() -> Vec<LineItemInput> {
    vec![
        LineItemInput::new("Design", dec!(2), dec!(100)),
        LineItemInput::new("Hosting", dec!(1), dec!(50)),
    ]
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Invoice with the default (untaxed) configuration, issued 2024-03-01, due 2024-03-31.
pub fn invoice_draft(client_id: Uuid) -> DocumentDraft {
    DocumentDraft::new(
        DocumentKind::Invoice,
        client_id,
        date(2024, 3, 1),
        date(2024, 3, 31),
    )
}

/// Quote with the default (untaxed) configuration, issued 2024-03-01, valid until 2024-04-30.
pub fn quote_draft(client_id: Uuid) -> DocumentDraft {
    DocumentDraft::new(
        DocumentKind::Quote,
        client_id,
        date(2024, 3, 1),
        date(2024, 4, 30),
    )
}

/// Creates a draft invoice with [`sample_items`] and an auto-assigned number.
pub async fn create_test_invoice(
    db: &DatabaseConnection,
    caller: &CallerContext,
    client_id: Uuid,
) -> Result<document::Model> {
    create_document(
        db,
        caller,
        &BillingConfig::default(),
        invoice_draft(client_id),
        sample_items(),
    )
    .await
}

/// Notifier that keeps every message it is given.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<EmailMessage>>,
    fail: bool,
}

impl RecordingNotifier {
    /// A notifier whose every delivery fails.
    pub fn failing() -> Self {
        Self {
            messages: Mutex::default(),
            fail: true,
        }
    }

    /// Messages successfully delivered so far.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        if self.fail {
            return Err(Error::Notification {
                message: format!("mailbox for {} unavailable", message.recipient),
            });
        }
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }
}
