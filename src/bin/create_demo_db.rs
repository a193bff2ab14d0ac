use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::OffsetDateTime;

use carteira::{
    PasswordHash, ValidatedPassword, credit_balance, initialize_db,
    transaction::{TransactionDraft, TransactionKind, create_transaction},
    user::{NewUser, create_user},
};

/// A utility for creating a demo database for the REST API server of carteira.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let mut connection = Connection::open(output_path)?;

    initialize_db(&connection)?;

    println!("Creating demo user...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;

    let user = create_user(
        NewUser {
            email: "demo@example.com".to_owned(),
            full_name: "Demo User".to_owned(),
            password_hash,
        },
        &connection,
    )?;

    connection.execute(
        "UPDATE user SET monthly_salary = ?1 WHERE id = ?2",
        (5200.0, user.id.as_i64()),
    )?;

    println!("Seeding the current month...");

    // Ledger writes only accept dates in the current month.
    let today = OffsetDateTime::now_utc().date();
    let first_of_month = today.replace_day(1)?;

    credit_balance(user.id, 150.0, today, &mut connection)?;

    let seeds = [
        (
            "Monthly pay",
            5200.0,
            TransactionKind::Income,
            "Salary",
            first_of_month,
            true,
        ),
        (
            "Rent",
            1500.0,
            TransactionKind::Expense,
            "Home",
            first_of_month,
            true,
        ),
        (
            "Supermarket run",
            230.4,
            TransactionKind::Expense,
            "Food",
            today,
            false,
        ),
        (
            "Bus card top-up",
            60.0,
            TransactionKind::Expense,
            "Transport",
            today,
            false,
        ),
        (
            "Cinema tickets",
            48.0,
            TransactionKind::Expense,
            "Leisure",
            today,
            false,
        ),
    ];

    for (description, amount, kind, category, date, is_recurring) in seeds {
        create_transaction(
            user.id,
            TransactionDraft {
                description: description.to_owned(),
                amount,
                kind,
                category: category.to_owned(),
                date,
                is_recurring,
            },
            today,
            &mut connection,
        )?;
    }

    println!("Success!");
    println!("Log in with 'demo@example.com' and the password 'test'.");

    Ok(())
}
