//! Money and line-item arithmetic.
//!
//! Pure functions over `Decimal`: no floating point, no rounding on the
//! computation path, same output for the same input. Rounding to cents happens
//! only when a value is formatted for display.

use crate::{
    entities::{Currency, DocumentModel, TaxType},
    errors::{Error, Result},
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Tax applied to a document's subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxConfig {
    /// Tax regime
    pub tax_type: TaxType,
    /// Percentage in 0..=100, ignored for `TaxType::None`
    pub rate: Decimal,
    /// Display name for `TaxType::Custom`
    pub label: Option<String>,
}

impl TaxConfig {
    /// No tax.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            tax_type: TaxType::None,
            rate: Decimal::ZERO,
            label: None,
        }
    }

    /// A named tax regime at `rate` percent.
    #[must_use]
    pub const fn new(tax_type: TaxType, rate: Decimal) -> Self {
        Self {
            tax_type,
            rate,
            label: None,
        }
    }

    /// A user-named tax at `rate` percent.
    #[must_use]
    pub fn custom(label: impl Into<String>, rate: Decimal) -> Self {
        Self {
            tax_type: TaxType::Custom,
            rate,
            label: Some(label.into()),
        }
    }

    /// Checks the rate is a percentage. Out-of-range rates are rejected, never clamped.
    pub fn validate(&self) -> Result<()> {
        if self.tax_type == TaxType::None {
            return Ok(());
        }
        if self.rate < Decimal::ZERO || self.rate > Decimal::ONE_HUNDRED {
            return Err(Error::InvalidTaxRate { rate: self.rate });
        }
        Ok(())
    }

    /// Label shown next to the tax line, e.g. `VAT (20%)`.
    #[must_use]
    pub fn display_label(&self) -> String {
        let name = match (self.tax_type, self.label.as_deref()) {
            (TaxType::Custom, Some(label)) if !label.trim().is_empty() => label.trim(),
            (tax_type, _) => tax_type.label(),
        };
        if self.tax_type == TaxType::None {
            name.to_string()
        } else {
            format!("{name} ({}%)", self.rate.normalize())
        }
    }
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self::none()
    }
}

impl From<&DocumentModel> for TaxConfig {
    fn from(document: &DocumentModel) -> Self {
        Self {
            tax_type: document.tax_type,
            rate: document.tax_rate.get(),
            label: document.tax_label.clone(),
        }
    }
}

/// Derived money figures for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of line item amounts
    pub subtotal: Decimal,
    /// Tax on the subtotal
    pub tax: Decimal,
    /// `subtotal + tax`
    pub total: Decimal,
}

/// Amount for one line: `quantity * unit_price`.
///
/// # Errors
/// Returns `InvalidAmount` if either input is negative and `AmountOverflow`
/// if the product does not fit in a `Decimal`.
pub fn item_amount(quantity: Decimal, unit_price: Decimal) -> Result<Decimal> {
    if quantity.is_sign_negative() && !quantity.is_zero() {
        return Err(Error::InvalidAmount {
            field: "quantity",
            amount: quantity,
        });
    }
    if unit_price.is_sign_negative() && !unit_price.is_zero() {
        return Err(Error::InvalidAmount {
            field: "unit price",
            amount: unit_price,
        });
    }
    quantity
        .checked_mul(unit_price)
        .ok_or(Error::AmountOverflow {
            field: "line amount",
        })
}

/// Sum of `item_amount` over `(quantity, unit_price)` pairs. Empty input gives zero.
pub fn subtotal<I>(items: I) -> Result<Decimal>
where
    I: IntoIterator<Item = (Decimal, Decimal)>,
{
    items
        .into_iter()
        .try_fold(Decimal::ZERO, |sum, (quantity, unit_price)| {
            sum.checked_add(item_amount(quantity, unit_price)?)
                .ok_or(Error::AmountOverflow { field: "subtotal" })
        })
}

/// Tax on `subtotal`: zero for `TaxType::None`, otherwise `subtotal * rate / 100`.
pub fn tax(subtotal: Decimal, config: &TaxConfig) -> Result<Decimal> {
    config.validate()?;
    if subtotal.is_sign_negative() && !subtotal.is_zero() {
        return Err(Error::InvalidAmount {
            field: "subtotal",
            amount: subtotal,
        });
    }
    if config.tax_type == TaxType::None {
        return Ok(Decimal::ZERO);
    }
    subtotal
        .checked_mul(config.rate)
        .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(Error::AmountOverflow { field: "tax" })
}

/// `subtotal + tax`
pub fn total(subtotal: Decimal, tax: Decimal) -> Result<Decimal> {
    subtotal
        .checked_add(tax)
        .ok_or(Error::AmountOverflow { field: "total" })
}

/// Subtotal, tax and total for a set of `(quantity, unit_price)` pairs.
pub fn compute_totals<I>(items: I, config: &TaxConfig) -> Result<Totals>
where
    I: IntoIterator<Item = (Decimal, Decimal)>,
{
    let subtotal = subtotal(items)?;
    let tax = tax(subtotal, config)?;
    Ok(Totals {
        subtotal,
        tax,
        total: total(subtotal, tax)?,
    })
}

/// Formats a money value with two decimals, rounding half away from zero.
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

/// Formats an amount with the currency's symbol and minor units, e.g. `€1234.50`.
#[must_use]
pub fn format_price(amount: Decimal, currency: Currency) -> String {
    let places = currency.minor_units();
    let mut rounded = amount.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(places);
    format!("{}{rounded}", currency.symbol())
}
