//! Client directory - Handles client records referenced by documents.
//!
//! Clients are owned by one user. Every lookup is filtered on the caller's id, so
//! a client owned by someone else is indistinguishable from one that does not exist.

use crate::{
    core::{
        caller::CallerContext,
        model::{contains_ignore_case, normalize_text},
    },
    entities::{Client, client},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Contact details for a new client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    /// Display name; must not be blank
    pub name: String,
    /// Billing address for sent documents
    pub email: Option<String>,
    /// Contact phone number
    pub phone: Option<String>,
    /// Street address
    pub address: Option<String>,
    /// City
    pub city: Option<String>,
    /// State or region
    pub state: Option<String>,
    /// Country
    pub country: Option<String>,
    /// Postal or ZIP code
    pub postal_code: Option<String>,
    /// Client's tax registration number
    pub tax_id: Option<String>,
    /// Private notes about the client
    pub notes: Option<String>,
}

impl NewClient {
    /// A client with only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Partial client update; `None` leaves a field unchanged, an empty string clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientUpdate {
    /// New display name; must not be blank
    pub name: Option<String>,
    /// Billing address for sent documents
    pub email: Option<String>,
    /// Contact phone number
    pub phone: Option<String>,
    /// Street address
    pub address: Option<String>,
    /// City
    pub city: Option<String>,
    /// State or region
    pub state: Option<String>,
    /// Country
    pub country: Option<String>,
    /// Postal or ZIP code
    pub postal_code: Option<String>,
    /// Client's tax registration number
    pub tax_id: Option<String>,
    /// Private notes about the client
    pub notes: Option<String>,
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("Client name cannot be empty"));
    }
    Ok(())
}

fn validate_email(email: Option<&str>) -> Result<()> {
    match email.map(str::trim) {
        Some(address) if !address.is_empty() && !address.contains('@') => Err(
            Error::validation(format!("'{address}' is not a valid email address")),
        ),
        _ => Ok(()),
    }
}

/// Creates a client owned by the caller.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or whitespace-only
/// - The email is present but has no `@`
/// - The database insert fails
#[instrument(skip(db, new_client), fields(user_id = %caller.user_id))]
pub async fn create_client(
    db: &DatabaseConnection,
    caller: &CallerContext,
    new_client: NewClient,
) -> Result<client::Model> {
    validate_name(&new_client.name)?;
    validate_email(new_client.email.as_deref())?;

    let now = chrono::Utc::now();
    let client = client::ActiveModel {
        id: Set(Uuid::now_v7()),
        user_id: Set(caller.user_id.clone()),
        name: Set(new_client.name.trim().to_string()),
        email: Set(normalize_text(new_client.email)),
        phone: Set(normalize_text(new_client.phone)),
        address: Set(normalize_text(new_client.address)),
        city: Set(normalize_text(new_client.city)),
        state: Set(normalize_text(new_client.state)),
        country: Set(normalize_text(new_client.country)),
        postal_code: Set(normalize_text(new_client.postal_code)),
        tax_id: Set(normalize_text(new_client.tax_id)),
        notes: Set(normalize_text(new_client.notes)),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let client = client.insert(db).await?;
    info!(client_id = %client.id, "Created client");
    Ok(client)
}

/// Finds a client owned by the caller, failing with `NotFound` otherwise.
pub(crate) async fn find_owned_client<C>(
    db: &C,
    caller: &CallerContext,
    client_id: Uuid,
) -> Result<client::Model>
where
    C: ConnectionTrait,
{
    Client::find_by_id(client_id)
        .filter(client::Column::UserId.eq(caller.user_id.as_str()))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("client", client_id))
}

/// Retrieves one of the caller's clients.
pub async fn get_client(
    db: &DatabaseConnection,
    caller: &CallerContext,
    client_id: Uuid,
) -> Result<client::Model> {
    find_owned_client(db, caller, client_id).await
}

/// Lists the caller's clients alphabetically.
pub async fn list_clients(
    db: &DatabaseConnection,
    caller: &CallerContext,
) -> Result<Vec<client::Model>> {
    Client::find()
        .filter(client::Column::UserId.eq(caller.user_id.as_str()))
        .order_by_asc(client::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Ids of clients whose name contains `term`, ignoring case, within the caller's scope.
///
/// Admins searching across all users pass `owner = None`.
pub(crate) async fn client_ids_matching<C>(
    db: &C,
    owner: Option<&str>,
    term: &str,
) -> Result<Vec<Uuid>>
where
    C: ConnectionTrait,
{
    let mut query = Client::find().filter(contains_ignore_case(client::Column::Name, term));
    if let Some(user_id) = owner {
        query = query.filter(client::Column::UserId.eq(user_id));
    }
    Ok(query.all(db).await?.into_iter().map(|c| c.id).collect())
}

/// Applies a partial update to one of the caller's clients.
#[instrument(skip(db, update), fields(user_id = %caller.user_id))]
pub async fn update_client(
    db: &DatabaseConnection,
    caller: &CallerContext,
    client_id: Uuid,
    update: ClientUpdate,
) -> Result<client::Model> {
    if let Some(name) = &update.name {
        validate_name(name)?;
    }
    validate_email(update.email.as_deref())?;

    let mut client: client::ActiveModel = find_owned_client(db, caller, client_id).await?.into();

    if let Some(name) = update.name {
        client.name = Set(name.trim().to_string());
    }
    let optional_fields = [
        (update.email, &mut client.email),
        (update.phone, &mut client.phone),
        (update.address, &mut client.address),
        (update.city, &mut client.city),
        (update.state, &mut client.state),
        (update.country, &mut client.country),
        (update.postal_code, &mut client.postal_code),
        (update.tax_id, &mut client.tax_id),
        (update.notes, &mut client.notes),
    ];
    for (value, column) in optional_fields {
        if value.is_some() {
            *column = Set(normalize_text(value));
        }
    }
    client.updated_at = Set(chrono::Utc::now());

    client.update(db).await.map_err(Into::into)
}

/// Deletes one of the caller's clients. Documents that reference it are left untouched.
#[instrument(skip(db), fields(user_id = %caller.user_id))]
pub async fn delete_client(
    db: &DatabaseConnection,
    caller: &CallerContext,
    client_id: Uuid,
) -> Result<()> {
    let client = find_owned_client(db, caller, client_id).await?;
    client.delete(db).await?;
    info!(%client_id, "Deleted client");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_client_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let caller = test_caller();

        let result = create_client(&db, &caller, NewClient::named("   ")).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        let result = create_client(&db, &caller, NewClient::named("Acme").with_email("nope")).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_get_client_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let caller = test_caller();

        let created = create_client(
            &db,
            &caller,
            NewClient {
                name: "  Acme Ltd ".to_string(),
                email: Some("ap@acme.test".to_string()),
                city: Some("   ".to_string()),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(created.name, "Acme Ltd");
        assert_eq!(created.user_id, caller.user_id);
        assert_eq!(created.city, None);

        let fetched = get_client(&db, &caller, created.id).await?;
        assert_eq!(fetched, created);

        Ok(())
    }

    #[tokio::test]
    async fn test_clients_are_scoped_to_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = test_caller();
        let stranger = other_caller();

        let client = create_test_client(&db, &owner, "Acme").await?;

        let result = get_client(&db, &stranger, client.id).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound {
                entity: "client",
                id: _
            }
        ));
        assert!(list_clients(&db, &stranger).await?.is_empty());
        assert!(delete_client(&db, &stranger, client.id).await.is_err());

        Ok(())
    }

    #[tokio::test]
    async fn test_list_clients_alphabetical() -> Result<()> {
        let db = setup_test_db().await?;
        let caller = test_caller();

        create_test_client(&db, &caller, "Zeta").await?;
        create_test_client(&db, &caller, "Alpha").await?;

        let names: Vec<String> = list_clients(&db, &caller)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_client_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let caller = test_caller();
        let client = create_test_client(&db, &caller, "Acme").await?;

        let updated = update_client(
            &db,
            &caller,
            client.id,
            ClientUpdate {
                name: Some("Acme Holdings".to_string()),
                email: Some(String::new()),
                country: Some("NZ".to_string()),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.name, "Acme Holdings");
        assert_eq!(updated.email, None);
        assert_eq!(updated.country.as_deref(), Some("NZ"));
        assert!(updated.updated_at >= client.updated_at);

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_client_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let caller = test_caller();
        let client = create_test_client(&db, &caller, "Acme").await?;

        delete_client(&db, &caller, client.id).await?;

        assert!(get_client(&db, &caller, client.id).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_client_search_is_literal_and_case_insensitive() -> Result<()> {
        let db = setup_test_db().await?;
        let caller = test_caller();
        let acme = create_test_client(&db, &caller, "Acme").await?;
        let percent = create_test_client(&db, &caller, "100% Organic").await?;
        let underscored = create_test_client(&db, &caller, "north_star").await?;

        let ids = client_ids_matching(&db, Some("test_user"), "%").await?;
        assert_eq!(ids, vec![percent.id]);

        let ids = client_ids_matching(&db, Some("test_user"), "_").await?;
        assert_eq!(ids, vec![underscored.id]);

        let ids = client_ids_matching(&db, Some("test_user"), "ACME").await?;
        assert_eq!(ids, vec![acme.id]);

        // Another user's scope sees nothing
        assert!(
            client_ids_matching(&db, Some("other_user"), "acme")
                .await?
                .is_empty()
        );
        Ok(())
    }
}
