//! Line item entity - A billable row owned by exactly one document.
//!
//! Rows are removed together with their document (the foreign key cascades,
//! and the service deletes them explicitly inside the same transaction).

use super::ExactDecimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Line item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "line_items")]
pub struct Model {
    /// Unique identifier for the line item
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Owning document
    #[sea_orm(indexed)]
    pub document_id: Uuid,
    /// Display order within the document, starting at 0
    pub position: i32,
    /// What is being billed
    pub description: String,
    /// Units billed, zero or greater
    #[sea_orm(column_type = "Text")]
    pub quantity: ExactDecimal,
    /// Price per unit, zero or greater
    #[sea_orm(column_type = "Text")]
    pub unit_price: ExactDecimal,
    /// Derived: `quantity * unit_price`
    #[sea_orm(column_type = "Text")]
    pub amount: ExactDecimal,
    /// When the line item was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between LineItem and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line item belongs to one document
    #[sea_orm(
        belongs_to = "super::document::Entity",
        from = "Column::DocumentId",
        to = "super::document::Column::Id",
        on_delete = "Cascade"
    )]
    Document,
}

impl Related<super::document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Document.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
