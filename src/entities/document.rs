//! Document entity - Invoices and quotes share one table, tagged by `kind`.
//!
//! The two kinds have the same shape and differ only in their status vocabulary
//! and in how the second date is labelled (due date vs valid until).
//! Money columns hold exact decimals stored as text; totals are always derived
//! from the line items.

use super::ExactDecimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which kind of billing document a row holds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// A request for payment
    #[sea_orm(string_value = "invoice")]
    Invoice,
    /// A priced offer the client may accept
    #[sea_orm(string_value = "quote")]
    Quote,
}

impl DocumentKind {
    /// Statuses a document of this kind may hold.
    #[must_use]
    pub const fn statuses(self) -> &'static [DocumentStatus] {
        match self {
            Self::Invoice => &[
                DocumentStatus::Draft,
                DocumentStatus::Sent,
                DocumentStatus::Paid,
                DocumentStatus::Overdue,
                DocumentStatus::Cancelled,
            ],
            Self::Quote => &[
                DocumentStatus::Draft,
                DocumentStatus::Sent,
                DocumentStatus::Accepted,
                DocumentStatus::Rejected,
                DocumentStatus::Expired,
            ],
        }
    }

    /// Whether `status` belongs to this kind's vocabulary.
    #[must_use]
    pub fn permits(self, status: DocumentStatus) -> bool {
        self.statuses().contains(&status)
    }

    /// Human label for the second date field.
    #[must_use]
    pub const fn due_date_label(self) -> &'static str {
        match self {
            Self::Invoice => "Due Date",
            Self::Quote => "Valid Until",
        }
    }

    /// Capitalised name used in email subjects and headings.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Invoice => "Invoice",
            Self::Quote => "Quote",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Invoice => "invoice",
            Self::Quote => "quote",
        })
    }
}

/// Every status either kind can hold. Use [`DocumentKind::permits`] to check membership.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Being prepared, not yet seen by the client
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Delivered to the client
    #[sea_orm(string_value = "sent")]
    Sent,
    /// Invoice settled
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Invoice past its due date and unpaid
    #[sea_orm(string_value = "overdue")]
    Overdue,
    /// Invoice withdrawn after sending
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    /// Quote agreed by the client
    #[sea_orm(string_value = "accepted")]
    Accepted,
    /// Quote declined by the client
    #[sea_orm(string_value = "rejected")]
    Rejected,
    /// Quote passed its valid-until date
    #[sea_orm(string_value = "expired")]
    Expired,
}

impl DocumentStatus {
    /// The stored string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tax regime applied to a document's subtotal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum TaxType {
    /// No tax; the rate is ignored
    #[sea_orm(string_value = "none")]
    None,
    /// Value-added tax
    #[sea_orm(string_value = "vat")]
    Vat,
    /// Goods and services tax
    #[sea_orm(string_value = "gst")]
    Gst,
    /// Sales tax
    #[sea_orm(string_value = "sales")]
    Sales,
    /// User-named tax, see `tax_label`
    #[sea_orm(string_value = "custom")]
    Custom,
}

impl TaxType {
    /// Default display label; custom taxes carry their own.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "No Tax",
            Self::Vat => "VAT",
            Self::Gst => "GST",
            Self::Sales => "Sales Tax",
            Self::Custom => "Tax",
        }
    }
}

/// Currency a document is billed in. Amounts are never converted between currencies.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(3))")]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US dollar
    #[default]
    #[sea_orm(string_value = "USD")]
    Usd,
    /// Euro
    #[sea_orm(string_value = "EUR")]
    Eur,
    /// British pound
    #[sea_orm(string_value = "GBP")]
    Gbp,
    /// Canadian dollar
    #[sea_orm(string_value = "CAD")]
    Cad,
    /// Australian dollar
    #[sea_orm(string_value = "AUD")]
    Aud,
    /// Japanese yen
    #[sea_orm(string_value = "JPY")]
    Jpy,
    /// Nigerian naira
    #[sea_orm(string_value = "NGN")]
    Ngn,
    /// South African rand
    #[sea_orm(string_value = "ZAR")]
    Zar,
    /// Kenyan shilling
    #[sea_orm(string_value = "KES")]
    Kes,
    /// Ghanaian cedi
    #[sea_orm(string_value = "GHS")]
    Ghs,
}

impl Currency {
    /// ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Cad => "CAD",
            Self::Aud => "AUD",
            Self::Jpy => "JPY",
            Self::Ngn => "NGN",
            Self::Zar => "ZAR",
            Self::Kes => "KES",
            Self::Ghs => "GHS",
        }
    }

    /// Symbol printed before amounts.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Usd => "$",
            Self::Eur => "€",
            Self::Gbp => "£",
            Self::Cad => "CA$",
            Self::Aud => "A$",
            Self::Jpy => "¥",
            Self::Ngn => "₦",
            Self::Zar => "R",
            Self::Kes => "KSh",
            Self::Ghs => "GH₵",
        }
    }

    /// Digits after the decimal point when displaying amounts.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Self::Jpy => 0,
            _ => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Document database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    /// Unique identifier for the document
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Owning user
    #[sea_orm(indexed)]
    pub user_id: String,
    /// Client being billed; a reference, not ownership
    pub client_id: Uuid,
    /// Invoice or quote
    pub kind: DocumentKind,
    /// Human-facing number, unique per user and kind (e.g. `INV-2024-001`)
    pub number: String,
    /// Current lifecycle status, always within `kind.statuses()`
    pub status: DocumentStatus,
    /// Date the document was issued
    pub issue_date: Date,
    /// Payment due date for invoices, expiry date for quotes
    pub due_date: Date,
    /// Currency every amount on the document is expressed in
    pub currency: Currency,
    /// Tax regime applied to the subtotal
    pub tax_type: TaxType,
    /// Display name for `TaxType::Custom`
    pub tax_label: Option<String>,
    /// Percentage in 0..=100
    #[sea_orm(column_type = "Text")]
    pub tax_rate: ExactDecimal,
    /// Derived: tax on the item subtotal
    #[sea_orm(column_type = "Text")]
    pub tax_amount: ExactDecimal,
    /// Derived: item subtotal plus tax
    #[sea_orm(column_type = "Text")]
    pub total_amount: ExactDecimal,
    /// Free text shown to the client
    pub notes: Option<String>,
    /// Payment or acceptance terms
    pub terms: Option<String>,
    /// When the document was created
    pub created_at: DateTimeUtc,
    /// When the document was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Document and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One document owns many line items
    #[sea_orm(has_many = "super::line_item::Entity")]
    LineItems,
}

impl Related<super::line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LineItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
