//! Document business logic - Handles invoice and quote persistence.
//!
//! A document and its line items are always written together inside one database
//! transaction, so a failed item insert never leaves a document without items.
//! Totals are derived by the calculator on every write that touches items or tax;
//! callers cannot set them directly.

use crate::{
    config::settings::BillingConfig,
    core::{
        calculator::{self, TaxConfig},
        caller::CallerContext,
        client,
        model::{
            self, DocumentDraft, DocumentFilter, DocumentUpdate, LineItemInput, normalize_text,
        },
        status,
    },
    entities::{
        Client, Document, DocumentKind, DocumentStatus, LineItem, client as client_entity,
        document, line_item,
    },
    errors::{Error, Result},
};
use chrono::{Datelike, Utc};
use sea_orm::{
    Condition, QueryOrder, QuerySelect, Select, Set, TransactionTrait, prelude::*,
};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Which documents may be deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Documents that reached the client (sent, paid, overdue, accepted) are kept
    #[default]
    DraftOnly,
    /// Any document may be deleted
    Unrestricted,
}

impl DeletePolicy {
    /// Whether a document in `status` may be deleted under this policy.
    #[must_use]
    pub const fn allows(self, status: DocumentStatus) -> bool {
        match self {
            Self::DraftOnly => !status.is_committed(),
            Self::Unrestricted => true,
        }
    }
}

/// A document hydrated with its items and client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentDetails {
    /// The document record
    pub document: document::Model,
    /// Line items in display order
    pub items: Vec<line_item::Model>,
    /// The referenced client; `None` if it has since been deleted
    pub client: Option<client_entity::Model>,
}

impl DocumentDetails {
    /// Sum of the item amounts.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(|item| item.amount.get()).sum()
    }
}

/// Creates an invoice or quote with its line items.
///
/// Validation and the client ownership check run before anything is written. When
/// the draft carries no number, the next `{PREFIX}-{YEAR}-{SEQ}` number is assigned;
/// a draft without tax or currency gets the configured defaults.
///
/// # Errors
/// Returns an error if:
/// - The draft or items fail validation (`Validation`, `InvalidAmount`, `InvalidTaxRate`,
///   `AmountOverflow`)
/// - The client does not exist or belongs to someone else (`NotFound`)
/// - The number is already used by the caller for this kind (`DuplicateNumber`)
/// - The database write fails; nothing is persisted in that case
#[instrument(skip(db, config, draft, items), fields(user_id = %caller.user_id, kind = %draft.kind))]
pub async fn create_document(
    db: &DatabaseConnection,
    caller: &CallerContext,
    config: &BillingConfig,
    draft: DocumentDraft,
    items: Vec<LineItemInput>,
) -> Result<document::Model> {
    draft.validate(&items)?;
    let tax = draft.tax.unwrap_or_else(|| config.tax.tax_config());
    let currency = draft.currency.unwrap_or(config.documents.default_currency);
    let totals = model::totals_for(&items, &tax)?;

    client::find_owned_client(db, caller, draft.client_id).await?;

    let kind = draft.kind;
    let number = match draft.number.as_deref() {
        Some(number) => number.trim().to_string(),
        None => {
            let prefix = config.numbering.prefix_for(kind);
            next_document_number(db, caller, kind, prefix, draft.issue_date.year()).await?
        }
    };
    ensure_number_available(db, caller, kind, &number, None).await?;

    let now = Utc::now();
    let document_id = Uuid::now_v7();
    let document = document::ActiveModel {
        id: Set(document_id),
        user_id: Set(caller.user_id.clone()),
        client_id: Set(draft.client_id),
        kind: Set(kind),
        number: Set(number.clone()),
        status: Set(DocumentStatus::Draft),
        issue_date: Set(draft.issue_date),
        due_date: Set(draft.due_date),
        currency: Set(currency),
        tax_type: Set(tax.tax_type),
        tax_label: Set(normalize_text(tax.label)),
        tax_rate: Set(tax.rate.into()),
        tax_amount: Set(totals.tax.into()),
        total_amount: Set(totals.total.into()),
        notes: Set(normalize_text(draft.notes)),
        terms: Set(normalize_text(draft.terms)),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let txn = db.begin().await?;
    let document = document
        .insert(&txn)
        .await
        .map_err(|e| Error::from_insert(e, kind, &number))?;
    insert_line_items(&txn, document_id, &items).await?;
    txn.commit().await?;

    info!(document_id = %document.id, number = %document.number, total = %document.total_amount, "Created document");
    Ok(document)
}

/// Retrieves one of the caller's documents with its items and client.
///
/// # Errors
/// Returns `NotFound` if the id does not exist or belongs to another user.
pub async fn get_document(
    db: &DatabaseConnection,
    caller: &CallerContext,
    document_id: Uuid,
) -> Result<DocumentDetails> {
    let document = find_owned_document(db, caller, document_id).await?;
    hydrate(db, document).await
}

/// Lists the caller's documents, newest first.
pub async fn list_documents(
    db: &DatabaseConnection,
    caller: &CallerContext,
    filter: &DocumentFilter,
) -> Result<Vec<document::Model>> {
    let query = Document::find().filter(document::Column::UserId.eq(caller.user_id.as_str()));
    let query = apply_filter(db, query, filter, Some(caller.user_id.as_str())).await?;
    query.all(db).await.map_err(Into::into)
}

/// Lists documents across every user, newest first. Read-only, admin only.
///
/// # Errors
/// Returns `Forbidden` when the caller is not an admin.
#[instrument(skip(db, filter), fields(user_id = %caller.user_id))]
pub async fn list_all_documents(
    db: &DatabaseConnection,
    caller: &CallerContext,
    filter: &DocumentFilter,
) -> Result<Vec<document::Model>> {
    caller.require_admin()?;
    let query = apply_filter(db, Document::find(), filter, None).await?;
    let documents = query.all(db).await?;
    debug!(count = documents.len(), "Admin document listing");
    Ok(documents)
}

/// Applies a partial update to one of the caller's documents.
///
/// Replacing the items or the tax configuration recomputes the totals in the same
/// transaction. Status changes must follow the kind's lifecycle.
///
/// # Errors
/// Returns an error if:
/// - The update fails validation
/// - The document or a new client reference does not resolve (`NotFound`)
/// - `expected_updated_at` no longer matches (`StaleWrite`)
/// - Items, tax or currency are changed on a document in a terminal status (`InvalidState`)
/// - The new number is taken (`DuplicateNumber`)
/// - The status change is not a legal transition (`InvalidTransition`, `InvalidStatus`)
#[instrument(skip(db, update), fields(user_id = %caller.user_id))]
pub async fn update_document(
    db: &DatabaseConnection,
    caller: &CallerContext,
    document_id: Uuid,
    update: DocumentUpdate,
) -> Result<document::Model> {
    update.validate()?;
    let touches_totals = update.touches_totals();
    let touches_pricing = update.touches_pricing();

    let txn = db.begin().await?;
    let current = find_owned_document(&txn, caller, document_id).await?;

    if let Some(expected) = update.expected_updated_at {
        if current.updated_at != expected {
            return Err(Error::StaleWrite { id: document_id });
        }
    }
    if touches_pricing && status::is_terminal(current.kind, current.status) {
        return Err(Error::InvalidState {
            kind: current.kind,
            status: current.status,
            action: "edit",
        });
    }

    let issue_date = update.issue_date.unwrap_or(current.issue_date);
    let due_date = update.due_date.unwrap_or(current.due_date);
    model::validate_dates(current.kind, issue_date, due_date)?;

    if let Some(client_id) = update.client_id {
        client::find_owned_client(&txn, caller, client_id).await?;
    }

    let number = update.number.as_deref().map(str::trim);
    if let Some(number) = number.filter(|n| *n != current.number) {
        ensure_number_available(&txn, caller, current.kind, number, Some(document_id)).await?;
    }

    if let Some(to) = update.status {
        if to != current.status {
            status::ensure_transition(current.kind, current.status, to)?;
        }
    }

    let mut active: document::ActiveModel = current.clone().into();
    if let Some(client_id) = update.client_id {
        active.client_id = Set(client_id);
    }
    if let Some(number) = number {
        active.number = Set(number.to_string());
    }
    active.issue_date = Set(issue_date);
    active.due_date = Set(due_date);
    if let Some(currency) = update.currency {
        active.currency = Set(currency);
    }
    if update.notes.is_some() {
        active.notes = Set(normalize_text(update.notes));
    }
    if update.terms.is_some() {
        active.terms = Set(normalize_text(update.terms));
    }
    if let Some(to) = update.status {
        active.status = Set(to);
    }

    if touches_totals {
        let tax_config = update.tax.unwrap_or_else(|| TaxConfig::from(&current));
        let subtotal = match &update.items {
            Some(items) => {
                LineItem::delete_many()
                    .filter(line_item::Column::DocumentId.eq(document_id))
                    .exec(&txn)
                    .await?;
                insert_line_items(&txn, document_id, items).await?;
                calculator::subtotal(items.iter().map(LineItemInput::pricing))?
            }
            None => {
                let stored = load_items(&txn, document_id).await?;
                calculator::subtotal(
                    stored
                        .iter()
                        .map(|item| (item.quantity.get(), item.unit_price.get())),
                )?
            }
        };
        let tax = calculator::tax(subtotal, &tax_config)?;

        active.tax_type = Set(tax_config.tax_type);
        active.tax_label = Set(normalize_text(tax_config.label));
        active.tax_rate = Set(tax_config.rate.into());
        active.tax_amount = Set(tax.into());
        active.total_amount = Set(calculator::total(subtotal, tax)?.into());
    }
    active.updated_at = Set(Utc::now());

    let kind = current.kind;
    let updated = active.update(&txn).await.map_err(|e| match number {
        Some(number) => Error::from_insert(e, kind, number),
        None => Error::Database(e),
    })?;
    txn.commit().await?;

    info!(%document_id, status = %updated.status, "Updated document");
    Ok(updated)
}

/// Deletes one of the caller's documents together with its line items.
///
/// # Errors
/// Returns `NotFound` for unknown or foreign ids and `DeleteForbidden` when the
/// policy protects the document's current status.
#[instrument(skip(db), fields(user_id = %caller.user_id))]
pub async fn delete_document(
    db: &DatabaseConnection,
    caller: &CallerContext,
    document_id: Uuid,
    policy: DeletePolicy,
) -> Result<()> {
    let txn = db.begin().await?;
    let document = find_owned_document(&txn, caller, document_id).await?;

    if !policy.allows(document.status) {
        return Err(Error::DeleteForbidden {
            kind: document.kind,
            status: document.status,
        });
    }

    let removed = LineItem::delete_many()
        .filter(line_item::Column::DocumentId.eq(document_id))
        .exec(&txn)
        .await?;
    Document::delete_by_id(document_id).exec(&txn).await?;
    txn.commit().await?;

    info!(%document_id, items = removed.rows_affected, "Deleted document");
    Ok(())
}

/// Next sequential number for the caller, e.g. `INV-2024-004`.
///
/// Looks at existing numbers with the same prefix and year and takes the highest
/// numeric suffix plus one. Caller-chosen numbers in other formats are ignored.
pub async fn next_document_number<C>(
    db: &C,
    caller: &CallerContext,
    kind: DocumentKind,
    prefix: &str,
    year: i32,
) -> Result<String>
where
    C: ConnectionTrait,
{
    let stem = format!("{}-{year}-", prefix.trim());
    let numbers: Vec<String> = Document::find()
        .select_only()
        .column(document::Column::Number)
        .filter(document::Column::UserId.eq(caller.user_id.as_str()))
        .filter(document::Column::Kind.eq(kind))
        .filter(document::Column::Number.starts_with(stem.as_str()))
        .into_tuple()
        .all(db)
        .await?;

    let next = numbers
        .iter()
        .filter_map(|number| number.strip_prefix(&stem)?.parse::<u32>().ok())
        .max()
        .unwrap_or(0)
        + 1;
    Ok(format!("{stem}{next:03}"))
}

/// Finds a document owned by the caller, failing with `NotFound` otherwise.
pub(crate) async fn find_owned_document<C>(
    db: &C,
    caller: &CallerContext,
    document_id: Uuid,
) -> Result<document::Model>
where
    C: ConnectionTrait,
{
    Document::find_by_id(document_id)
        .filter(document::Column::UserId.eq(caller.user_id.as_str()))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("document", document_id))
}

/// Loads items and client for a document.
pub(crate) async fn hydrate<C>(db: &C, document: document::Model) -> Result<DocumentDetails>
where
    C: ConnectionTrait,
{
    let items = load_items(db, document.id).await?;
    let client = Client::find_by_id(document.client_id).one(db).await?;
    Ok(DocumentDetails {
        document,
        items,
        client,
    })
}

async fn load_items<C>(db: &C, document_id: Uuid) -> Result<Vec<line_item::Model>>
where
    C: ConnectionTrait,
{
    LineItem::find()
        .filter(line_item::Column::DocumentId.eq(document_id))
        .order_by_asc(line_item::Column::Position)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn insert_line_items<C>(db: &C, document_id: Uuid, items: &[LineItemInput]) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let mut rows = Vec::with_capacity(items.len());
    for (position, item) in (0_i32..).zip(items) {
        rows.push(line_item::ActiveModel {
            id: Set(Uuid::now_v7()),
            document_id: Set(document_id),
            position: Set(position),
            description: Set(item.description.trim().to_string()),
            quantity: Set(item.quantity.into()),
            unit_price: Set(item.unit_price.into()),
            amount: Set(calculator::item_amount(item.quantity, item.unit_price)?.into()),
            created_at: Set(now),
        });
    }
    LineItem::insert_many(rows).exec_without_returning(db).await?;
    Ok(())
}

async fn ensure_number_available<C>(
    db: &C,
    caller: &CallerContext,
    kind: DocumentKind,
    number: &str,
    exclude: Option<Uuid>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let mut query = Document::find()
        .filter(document::Column::UserId.eq(caller.user_id.as_str()))
        .filter(document::Column::Kind.eq(kind))
        .filter(document::Column::Number.eq(number));
    if let Some(id) = exclude {
        query = query.filter(document::Column::Id.ne(id));
    }
    if query.count(db).await? > 0 {
        return Err(Error::DuplicateNumber {
            kind,
            number: number.to_string(),
        });
    }
    Ok(())
}

async fn apply_filter<C>(
    db: &C,
    mut query: Select<Document>,
    filter: &DocumentFilter,
    owner: Option<&str>,
) -> Result<Select<Document>>
where
    C: ConnectionTrait,
{
    if let Some(kind) = filter.kind {
        query = query.filter(document::Column::Kind.eq(kind));
    }
    if let Some(status) = filter.status {
        query = query.filter(document::Column::Status.eq(status));
    }
    if let Some(term) = filter.search_term() {
        let client_ids = client::client_ids_matching(db, owner, term).await?;
        query = query.filter(
            Condition::any()
                .add(model::contains_ignore_case(document::Column::Number, term))
                .add(document::Column::ClientId.is_in(client_ids)),
        );
    }
    Ok(query
        .order_by_desc(document::Column::CreatedAt)
        .order_by_desc(document::Column::Id))
}
