//! Input shapes for documents and the validation rules applied before persistence.
//!
//! Everything here is checked without touching the store; ownership of the
//! referenced client is verified by the document service.

use crate::{
    core::calculator::{self, TaxConfig, Totals},
    entities::{Currency, DocumentKind, DocumentStatus},
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait,
    sea_query::{Expr, Func, LikeExpr, SimpleExpr},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One billable row as submitted by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemInput {
    /// What is being billed; must not be blank
    pub description: String,
    /// Units, zero or greater
    pub quantity: Decimal,
    /// Price per unit, zero or greater
    pub unit_price: Decimal,
}

impl LineItemInput {
    /// Creates a line item input.
    #[must_use]
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
        }
    }

    /// `(quantity, unit_price)` pair for the calculator.
    #[must_use]
    pub const fn pricing(&self) -> (Decimal, Decimal) {
        (self.quantity, self.unit_price)
    }

    /// Rejects blank descriptions and negative numbers.
    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(Error::validation("Line item description cannot be empty"));
        }
        calculator::item_amount(self.quantity, self.unit_price)?;
        Ok(())
    }
}

/// Checks a full replacement set of line items.
pub fn validate_items(items: &[LineItemInput]) -> Result<()> {
    if items.is_empty() {
        return Err(Error::validation("A document needs at least one line item"));
    }
    items.iter().try_for_each(LineItemInput::validate)
}

/// Totals for a set of line items.
pub fn totals_for(items: &[LineItemInput], tax: &TaxConfig) -> Result<Totals> {
    calculator::compute_totals(items.iter().map(LineItemInput::pricing), tax)
}

/// Everything needed to create an invoice or a quote, apart from its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDraft {
    /// Invoice or quote
    pub kind: DocumentKind,
    /// Client being billed; must belong to the caller
    pub client_id: Uuid,
    /// Caller-chosen number; `None` assigns the next one in sequence
    pub number: Option<String>,
    /// Issue date
    pub issue_date: NaiveDate,
    /// Due date (invoice) or valid-until date (quote)
    pub due_date: NaiveDate,
    /// Tax applied to the item subtotal; `None` uses the configured default
    pub tax: Option<TaxConfig>,
    /// Billing currency; `None` uses the configured default
    pub currency: Option<Currency>,
    /// Free text shown to the client
    pub notes: Option<String>,
    /// Payment or acceptance terms
    pub terms: Option<String>,
}

impl DocumentDraft {
    /// A draft with the default tax and currency, no notes or terms and an
    /// auto-assigned number.
    #[must_use]
    pub const fn new(
        kind: DocumentKind,
        client_id: Uuid,
        issue_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            kind,
            client_id,
            number: None,
            issue_date,
            due_date,
            tax: None,
            currency: None,
            notes: None,
            terms: None,
        }
    }

    /// Sets an explicit document number.
    #[must_use]
    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    /// Sets the tax configuration.
    #[must_use]
    pub fn with_tax(mut self, tax: TaxConfig) -> Self {
        self.tax = Some(tax);
        self
    }

    /// Sets the billing currency.
    #[must_use]
    pub const fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    /// Validates the draft together with its items.
    pub fn validate(&self, items: &[LineItemInput]) -> Result<()> {
        if let Some(number) = &self.number {
            validate_number(number)?;
        }
        validate_dates(self.kind, self.issue_date, self.due_date)?;
        if let Some(tax) = &self.tax {
            tax.validate()?;
        }
        validate_items(items)
    }
}

/// Partial update; `None` fields are left unchanged.
///
/// Text fields set to an empty string are cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUpdate {
    /// Move the document to another of the caller's clients
    pub client_id: Option<Uuid>,
    /// New number; must stay unique per user and kind
    pub number: Option<String>,
    /// New issue date
    pub issue_date: Option<NaiveDate>,
    /// New due or valid-until date
    pub due_date: Option<NaiveDate>,
    /// Billing currency; amounts are kept as they are
    pub currency: Option<Currency>,
    /// Replacement notes
    pub notes: Option<String>,
    /// Replacement terms
    pub terms: Option<String>,
    /// New tax configuration; totals are recomputed
    pub tax: Option<TaxConfig>,
    /// Full replacement of the line items; totals are recomputed
    pub items: Option<Vec<LineItemInput>>,
    /// Requested status; must be a legal transition
    pub status: Option<DocumentStatus>,
    /// When set, the update fails with `StaleWrite` if the stored `updated_at` differs
    pub expected_updated_at: Option<DateTime<Utc>>,
}

impl DocumentUpdate {
    /// Whether the update changes anything that feeds the totals.
    #[must_use]
    pub const fn touches_totals(&self) -> bool {
        self.items.is_some() || self.tax.is_some()
    }

    /// Whether the update changes how the document is priced, totals or currency.
    #[must_use]
    pub const fn touches_pricing(&self) -> bool {
        self.touches_totals() || self.currency.is_some()
    }

    /// Store-independent checks.
    pub fn validate(&self) -> Result<()> {
        if let Some(number) = &self.number {
            validate_number(number)?;
        }
        if let Some(tax) = &self.tax {
            tax.validate()?;
        }
        if let Some(items) = &self.items {
            validate_items(items)?;
        }
        Ok(())
    }
}

/// Filters for document listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFilter {
    /// Only invoices or only quotes
    pub kind: Option<DocumentKind>,
    /// Only this status
    pub status: Option<DocumentStatus>,
    /// Case-insensitive match on document number or client name
    pub search: Option<String>,
}

impl DocumentFilter {
    /// All documents of one kind.
    #[must_use]
    pub const fn kind(kind: DocumentKind) -> Self {
        Self {
            kind: Some(kind),
            status: None,
            search: None,
        }
    }

    /// Trimmed search term, `None` when blank.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

pub(crate) fn validate_number(number: &str) -> Result<()> {
    if number.trim().is_empty() {
        return Err(Error::validation("Document number cannot be empty"));
    }
    Ok(())
}

pub(crate) fn validate_dates(
    kind: DocumentKind,
    issue_date: NaiveDate,
    due_date: NaiveDate,
) -> Result<()> {
    if issue_date > due_date {
        return Err(Error::validation(format!(
            "Issue date {issue_date} is after the {kind} {} {due_date}",
            kind.due_date_label().to_lowercase()
        )));
    }
    Ok(())
}

/// Case-insensitive substring match on `column`.
///
/// `%` and `_` in the term match literally.
pub(crate) fn contains_ignore_case<C: ColumnTrait>(column: C, term: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column.as_column_ref())))
        .like(LikeExpr::new(like_pattern(term)).escape('\\'))
}

/// `%term%` in lower case with LIKE wildcards escaped by `\`.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Trims free text and turns blanks into `None`.
pub(crate) fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::TaxType;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft() -> DocumentDraft {
        DocumentDraft::new(
            DocumentKind::Invoice,
            Uuid::now_v7(),
            date(2024, 3, 1),
            date(2024, 3, 31),
        )
    }

    fn items() -> Vec<LineItemInput> {
        vec![LineItemInput::new("Design", dec!(2), dec!(100))]
    }

    #[test]
    fn test_valid_draft() {
        assert!(draft().validate(&items()).is_ok());
        assert!(draft().with_number("INV-7").validate(&items()).is_ok());
    }

    #[test]
    fn test_blank_number_rejected() {
        let result = draft().with_number("   ").validate(&items());
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));
    }

    #[test]
    fn test_items_required() {
        let result = draft().validate(&[]);
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));
    }

    #[test]
    fn test_blank_description_rejected() {
        let result = draft().validate(&[LineItemInput::new(" ", dec!(1), dec!(1))]);
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));
    }

    #[test]
    fn test_negative_price_rejected() {
        let result = draft().validate(&[LineItemInput::new("Refund", dec!(1), dec!(-5))]);
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount {
                field: "unit price",
                amount: _
            }
        ));
    }

    #[test]
    fn test_issue_after_due_rejected() {
        let mut bad = draft();
        bad.issue_date = date(2024, 4, 1);
        let err = bad.validate(&items()).unwrap_err();
        assert!(matches!(err, Error::Validation { message: _ }));

        // Same-day is fine
        let mut same_day = draft();
        same_day.due_date = same_day.issue_date;
        assert!(same_day.validate(&items()).is_ok());
    }

    #[test]
    fn test_quote_date_message_uses_valid_until() {
        let mut quote = draft();
        quote.kind = DocumentKind::Quote;
        quote.issue_date = date(2024, 5, 1);
        let err = quote.validate(&items()).unwrap_err();
        assert!(err.to_string().contains("valid until"));
    }

    #[test]
    fn test_bad_tax_rate_rejected() {
        let result = draft()
            .with_tax(TaxConfig::new(TaxType::Vat, dec!(101)))
            .validate(&items());
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidTaxRate { rate: _ }
        ));
    }

    #[test]
    fn test_update_validation() {
        assert!(DocumentUpdate::default().validate().is_ok());
        let update = DocumentUpdate {
            items: Some(Vec::new()),
            ..Default::default()
        };
        assert!(update.touches_totals());
        assert!(matches!(
            update.validate().unwrap_err(),
            Error::Validation { message: _ }
        ));
    }

    #[test]
    fn test_search_term() {
        let filter = DocumentFilter {
            search: Some("  acme ".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.search_term(), Some("acme"));
        assert_eq!(DocumentFilter::default().search_term(), None);
    }

    #[test]
    fn test_draft_defaults_to_configured_tax_and_currency() {
        let draft = draft();
        assert_eq!(draft.tax, None);
        assert_eq!(draft.currency, None);
        let draft = draft
            .with_tax(TaxConfig::new(TaxType::Vat, dec!(20)))
            .with_currency(Currency::Eur);
        assert_eq!(draft.currency, Some(Currency::Eur));
        assert!(draft.validate(&items()).is_ok());
    }

    #[test]
    fn test_currency_change_touches_pricing_not_totals() {
        let update = DocumentUpdate {
            currency: Some(Currency::Gbp),
            ..Default::default()
        };
        assert!(update.touches_pricing());
        assert!(!update.touches_totals());
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Acme"), "%acme%");
        assert_eq!(like_pattern("100%"), r"%100\%%");
        assert_eq!(like_pattern("a_b"), r"%a\_b%");
        assert_eq!(like_pattern(r"C:\x"), r"%c:\\x%");
    }

    #[test]
    fn test_contains_ignore_case_uses_lower_and_escape() {
        use crate::entities::{Client, ClientColumn};
        use sea_orm::{DatabaseBackend, EntityTrait, QueryFilter, QueryTrait};

        let sql = Client::find()
            .filter(contains_ignore_case(ClientColumn::Name, "Acme"))
            .build(DatabaseBackend::Postgres)
            .to_string();
        assert!(sql.contains(r#"LOWER("clients"."name") LIKE '%acme%'"#), "{sql}");
        assert!(sql.contains("ESCAPE"), "{sql}");
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text(Some("  hi ".to_string())), Some("hi".to_string()));
        assert_eq!(normalize_text(Some("   ".to_string())), None);
        assert_eq!(normalize_text(None), None);
    }
}
