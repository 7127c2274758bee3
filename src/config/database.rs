//! Database configuration module.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust structs.
//! The one index the entities cannot express (document numbers unique per user and
//! kind) is added by hand.

use crate::entities::{Client, Document, DocumentColumn, LineItem};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/billing.sqlite?mode=rwc";

/// Name of the unique index behind the per-user document number check.
pub const DOCUMENT_NUMBER_INDEX: &str = "idx_documents_user_kind_number";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection using `DATABASE_URL`, falling back to a local `SQLite` file.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if let Some(dir) = sqlite_file_dir(&database_url) {
        std::fs::create_dir_all(dir)?;
    }
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Directory holding the database file for a file-backed `SQLite` url.
fn sqlite_file_dir(url: &str) -> Option<&Path> {
    let path = url.strip_prefix("sqlite://")?.split('?').next()?;
    Path::new(path)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
}

/// Creates all tables and indexes if they do not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_entity_table(db, &schema, Client).await?;
    create_entity_table(db, &schema, Document).await?;
    create_entity_table(db, &schema, LineItem).await?;

    let number_index = Index::create()
        .name(DOCUMENT_NUMBER_INDEX)
        .table(Document)
        .col(DocumentColumn::UserId)
        .col(DocumentColumn::Kind)
        .col(DocumentColumn::Number)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&number_index)).await?;

    info!("Database schema is ready");
    Ok(())
}

async fn create_entity_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(builder.build(&table)).await?;

    for mut index in schema.create_index_from_entity(entity) {
        index.if_not_exists();
        db.execute(builder.build(&index)).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ClientModel, DocumentModel, LineItemModel};
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<ClientModel> = Client::find().limit(1).all(&db).await?;
        let _: Vec<DocumentModel> = Document::find().limit(1).all(&db).await?;
        let _: Vec<LineItemModel> = LineItem::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[test]
    fn test_sqlite_file_dir() {
        assert_eq!(sqlite_file_dir(DEFAULT_DATABASE_URL), Some(Path::new("data")));
        assert_eq!(sqlite_file_dir("sqlite://billing.sqlite"), None);
        assert_eq!(sqlite_file_dir("sqlite::memory:"), None);
        assert_eq!(sqlite_file_dir("postgres://localhost/billing"), None);
    }

    #[test]
    fn test_default_database_url() {
        if std::env::var("DATABASE_URL").is_err() {
            assert_eq!(get_database_url(), DEFAULT_DATABASE_URL);
        }
    }
}
