//! Billing configuration loading from config.toml
//!
//! Every section is optional; a missing file section falls back to the defaults
//! below, so an empty config.toml is valid.

use crate::core::{calculator::TaxConfig, document::DeletePolicy};
use crate::entities::{Currency, DocumentKind, TaxType};
use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub struct BillingConfig {
    /// Document number prefixes
    pub numbering: NumberingConfig,
    /// Tax applied to new documents when the caller does not choose one
    pub tax: TaxDefaults,
    /// Document lifecycle policies
    pub documents: DocumentPolicyConfig,
    /// Identity used in outgoing emails
    pub sender: SenderConfig,
}

/// Prefixes for sequentially assigned document numbers.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NumberingConfig {
    /// Prefix for invoices, e.g. `INV` gives `INV-2024-001`
    pub invoice_prefix: String,
    /// Prefix for quotes
    pub quote_prefix: String,
}

impl Default for NumberingConfig {
    fn default() -> Self {
        Self {
            invoice_prefix: "INV".to_string(),
            quote_prefix: "QUO".to_string(),
        }
    }
}

impl NumberingConfig {
    /// Returns the prefix for `kind`.
    #[must_use]
    pub fn prefix_for(&self, kind: DocumentKind) -> &str {
        match kind {
            DocumentKind::Invoice => &self.invoice_prefix,
            DocumentKind::Quote => &self.quote_prefix,
        }
    }
}

/// Default tax settings.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TaxDefaults {
    /// Tax regime
    #[serde(rename = "type")]
    pub tax_type: TaxType,
    /// Percentage in 0..=100
    pub rate: Decimal,
    /// Label for custom taxes
    pub label: Option<String>,
}

impl Default for TaxDefaults {
    fn default() -> Self {
        Self {
            tax_type: TaxType::None,
            rate: Decimal::TEN,
            label: None,
        }
    }
}

impl TaxDefaults {
    /// Tax configuration for a new document that did not choose its own.
    #[must_use]
    pub fn tax_config(&self) -> TaxConfig {
        TaxConfig {
            tax_type: self.tax_type,
            rate: self.rate,
            label: self.label.clone(),
        }
    }
}

/// Document lifecycle policies.
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub struct DocumentPolicyConfig {
    /// Allow deleting documents that were already sent
    pub allow_delete_sent: bool,
    /// Currency for new documents that do not choose one
    pub default_currency: Currency,
}

impl DocumentPolicyConfig {
    /// The delete policy these settings describe.
    #[must_use]
    pub const fn delete_policy(&self) -> DeletePolicy {
        if self.allow_delete_sent {
            DeletePolicy::Unrestricted
        } else {
            DeletePolicy::DraftOnly
        }
    }
}

/// Identity shown in outgoing emails.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SenderConfig {
    /// Business name, used in the subject line
    pub name: String,
    /// Reply-to address
    pub email: Option<String>,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            name: "Billing".to_string(),
            email: None,
        }
    }
}

/// Loads billing configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A field has the wrong type
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BillingConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Parses billing configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<BillingConfig> {
    let config: BillingConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if config.tax.rate < Decimal::ZERO || config.tax.rate > Decimal::ONE_HUNDRED {
        return Err(Error::Config {
            message: format!("Default tax rate {}% is outside 0-100", config.tax.rate),
        });
    }
    for prefix in [
        &config.numbering.invoice_prefix,
        &config.numbering.quote_prefix,
    ] {
        if prefix.trim().is_empty() {
            return Err(Error::Config {
                message: "Document number prefixes cannot be empty".to_string(),
            });
        }
    }

    Ok(config)
}

/// Loads configuration from `BILLING_CONFIG`, or ./config.toml when unset.
///
/// A missing default file is not an error: the built-in defaults are used.
pub fn load_default_config() -> Result<BillingConfig> {
    match std::env::var("BILLING_CONFIG") {
        Ok(path) => load_config(path),
        Err(_) if Path::new("config.toml").exists() => load_config("config.toml"),
        Err(_) => {
            tracing::info!("No config.toml found, using built-in defaults");
            Ok(BillingConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_billing_config() {
        let toml_str = r#"
            [numbering]
            invoice_prefix = "FAC"
            quote_prefix = "DEV"

            [tax]
            type = "vat"
            rate = "20"

            [documents]
            allow_delete_sent = true
            default_currency = "EUR"

            [sender]
            name = "Acme Studio"
            email = "billing@acme.test"
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.numbering.prefix_for(DocumentKind::Invoice), "FAC");
        assert_eq!(config.numbering.prefix_for(DocumentKind::Quote), "DEV");
        assert_eq!(config.tax.tax_type, TaxType::Vat);
        assert_eq!(config.tax.rate, dec!(20));
        assert_eq!(
            config.tax.tax_config(),
            TaxConfig::new(TaxType::Vat, dec!(20))
        );
        assert_eq!(config.documents.delete_policy(), DeletePolicy::Unrestricted);
        assert_eq!(config.documents.default_currency, Currency::Eur);
        assert_eq!(config.sender.name, "Acme Studio");
        assert_eq!(config.sender.email.as_deref(), Some("billing@acme.test"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.numbering.invoice_prefix, "INV");
        assert_eq!(config.numbering.quote_prefix, "QUO");
        assert_eq!(config.tax.tax_type, TaxType::None);
        assert_eq!(config.documents.delete_policy(), DeletePolicy::DraftOnly);
        assert_eq!(config.documents.default_currency, Currency::Usd);
    }

    #[test]
    fn test_rejects_unknown_currency() {
        let result = parse_config("[documents]\ndefault_currency = \"XYZ\"\n");
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));
    }

    #[test]
    fn test_rejects_out_of_range_tax_rate() {
        let result = parse_config("[tax]\ntype = \"gst\"\nrate = \"150\"\n");
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));
    }

    #[test]
    fn test_rejects_blank_prefix() {
        let result = parse_config("[numbering]\ninvoice_prefix = \"  \"\n");
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = load_config("definitely/not/here.toml");
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));
    }
}
