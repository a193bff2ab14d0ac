//! Creates the application database schema.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{transaction::create_transaction_table, user::create_user_table};

/// Create the tables for the application in the database at `connection`, if
/// they do not already exist.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&sql_transaction)?;
    create_transaction_table(&sql_transaction)?;

    sql_transaction.commit()?;

    Ok(())
}
