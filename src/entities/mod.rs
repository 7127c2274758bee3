//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod client;
pub mod document;
pub mod exact_decimal;
pub mod line_item;

// Re-export specific types to avoid conflicts
pub use client::{Column as ClientColumn, Entity as Client, Model as ClientModel};
pub use document::{
    Column as DocumentColumn, Currency, DocumentKind, DocumentStatus, Entity as Document,
    Model as DocumentModel, TaxType,
};
pub use exact_decimal::ExactDecimal;
pub use line_item::{Column as LineItemColumn, Entity as LineItem, Model as LineItemModel};
