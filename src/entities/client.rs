//! Client entity - The customers a user bills.
//!
//! Documents reference a client by id but do not own it; deleting a client
//! leaves its documents in place.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Client database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    /// Unique identifier for the client
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Owning user
    #[sea_orm(indexed)]
    pub user_id: String,
    /// Display name used on documents and in search
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
    /// When the client was created
    pub created_at: DateTimeUtc,
    /// When the client was last modified
    pub updated_at: DateTimeUtc,
}

/// Clients have no enforced relations; documents look them up by id.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
