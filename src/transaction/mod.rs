//! Transaction management for the budgeting application.
//!
//! This module contains everything related to the ledger:
//! - The `Transaction` model and the drafts it is created from
//! - Database functions for recording, deleting and listing transactions
//! - The route handlers for the transaction endpoints

mod core;
mod create_transaction_endpoint;
mod delete_transaction_endpoint;
mod list_transactions_endpoint;

pub use core::{
    DEFAULT_EXPENSE_CATEGORIES, DEFAULT_INCOME_CATEGORIES, LedgerChange, Transaction,
    TransactionDraft, TransactionId, TransactionKind, create_transaction,
    create_transaction_table, delete_transaction, list_transactions,
};
pub use create_transaction_endpoint::create_transaction_endpoint;
pub use delete_transaction_endpoint::delete_transaction_endpoint;
pub use list_transactions_endpoint::{LedgerSnapshot, list_transactions_endpoint};
