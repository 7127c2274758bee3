//! Core business logic - framework-agnostic billing operations.
//!
//! Every operation that touches stored data takes an explicit [`CallerContext`]
//! and is scoped to the caller's own records unless it is an admin read.

/// Explicit identity passed to every service call
pub mod caller;
/// Pure money and line-item arithmetic
pub mod calculator;
/// Client directory operations
pub mod client;
/// Invoice and quote persistence
pub mod document;
/// Input shapes and validation rules for documents
pub mod model;
/// Send workflow with the email side effect
pub mod send;
/// Per-kind status lifecycles and transitions
pub mod status;

pub use caller::CallerContext;
pub use calculator::{TaxConfig, Totals};
pub use document::{DeletePolicy, DocumentDetails};
pub use model::{DocumentDraft, DocumentFilter, DocumentUpdate, LineItemInput};
pub use send::{NotificationOutcome, SendOutcome};
