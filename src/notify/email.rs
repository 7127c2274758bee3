//! HTML email for a sent invoice or quote.
//!
//! The body comes from `templates/document_email.html`. Tera escapes every
//! interpolated value because the template name ends in `.html`.

use crate::{
    config::SenderConfig,
    core::{
        calculator::{TaxConfig, format_price},
        document::DocumentDetails,
    },
    entities::{TaxType, client},
    errors::{Error, Result},
    notify::{Attachment, EmailMessage},
};
use serde::Serialize;
use tera::{Context, Tera};

const TEMPLATE_NAME: &str = "document_email.html";
const TEMPLATE: &str = include_str!("../../templates/document_email.html");

#[derive(Serialize)]
struct EmailView<'a> {
    title: &'a str,
    kind: String,
    number: &'a str,
    issue_date: String,
    due_label: &'a str,
    due_date: String,
    client: BillTo<'a>,
    items: Vec<ItemRow<'a>>,
    subtotal: String,
    tax: Option<TaxRow>,
    total: String,
    notes: Option<&'a str>,
    has_attachment: bool,
}

#[derive(Serialize)]
struct BillTo<'a> {
    name: &'a str,
    address: Option<&'a str>,
    locality: Option<String>,
    country: Option<&'a str>,
}

#[derive(Serialize)]
struct ItemRow<'a> {
    description: &'a str,
    quantity: String,
    unit_price: String,
    amount: String,
}

#[derive(Serialize)]
struct TaxRow {
    label: String,
    amount: String,
}

impl<'a> BillTo<'a> {
    fn from_client(client: &'a client::Model) -> Self {
        // "City, ST 12345"
        let locality = client.city.as_deref().map(|city| {
            let mut line = city.to_string();
            if let Some(state) = client.state.as_deref() {
                line.push_str(", ");
                line.push_str(state);
            }
            if let Some(postal_code) = client.postal_code.as_deref() {
                line.push(' ');
                line.push_str(postal_code);
            }
            line
        });
        Self {
            name: &client.name,
            address: client.address.as_deref(),
            locality,
            country: client.country.as_deref(),
        }
    }
}

/// Builds the email sent to the client when a document goes out.
///
/// Amounts are printed in the document's currency. The footer mentions the
/// attachment only when one is given.
///
/// # Errors
/// Returns `Validation` if the document's client was deleted or has no email
/// address, and `Template` if the body fails to render.
pub fn render_document_email(
    details: &DocumentDetails,
    sender: &SenderConfig,
    attachment: Option<Attachment>,
) -> Result<EmailMessage> {
    let document = &details.document;
    let client = details.client.as_ref().ok_or_else(|| {
        Error::validation(format!(
            "{} {} has no client to send to",
            document.kind.title(),
            document.number
        ))
    })?;
    let recipient = client
        .email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .ok_or_else(|| Error::validation(format!("Client '{}' has no email address", client.name)))?;

    let currency = document.currency;
    let title = document.kind.title();
    let tax = (document.tax_type != TaxType::None).then(|| TaxRow {
        label: TaxConfig::from(document).display_label(),
        amount: format_price(document.tax_amount.get(), currency),
    });
    let view = EmailView {
        title,
        kind: document.kind.to_string(),
        number: &document.number,
        issue_date: document.issue_date.to_string(),
        due_label: document.kind.due_date_label(),
        due_date: document.due_date.to_string(),
        client: BillTo::from_client(client),
        items: details
            .items
            .iter()
            .map(|item| ItemRow {
                description: &item.description,
                quantity: item.quantity.normalize().to_string(),
                unit_price: format_price(item.unit_price.get(), currency),
                amount: format_price(item.amount.get(), currency),
            })
            .collect(),
        subtotal: format_price(details.subtotal(), currency),
        tax,
        total: format_price(document.total_amount.get(), currency),
        notes: document.notes.as_deref(),
        has_attachment: attachment.is_some(),
    };

    let mut tera = Tera::default();
    tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)?;
    let html_body = tera.render(TEMPLATE_NAME, &Context::from_serialize(&view)?)?;

    let reply_to = sender
        .email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(ToString::to_string);

    Ok(EmailMessage {
        recipient: recipient.to_string(),
        reply_to,
        subject: format!("{title} #{} from {}", document.number, sender.name),
        html_body,
        attachment,
    })
}
