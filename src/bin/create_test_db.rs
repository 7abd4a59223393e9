use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use finance_tracker::{
    CategoryName, NewCategory, NewTransaction, PasswordHash, TransactionType, ValidatedPassword,
    create_category, create_transaction, create_user, initialize_db,
};

const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_PASSWORD: &str = "correct-horse-battery-staple-42";

/// A utility for creating a test database for the finance tracker.
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
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user {DEMO_EMAIL} with password {DEMO_PASSWORD}...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(DEMO_PASSWORD),
        bcrypt::DEFAULT_COST,
    )?;
    let user = create_user("Demo User", DEMO_EMAIL, &password_hash, &conn)?;

    println!("Creating categories and transactions...");

    let salary = create_category(
        user.id,
        NewCategory {
            name: CategoryName::new("Salary")?,
            type_: TransactionType::Income,
        },
        &conn,
    )?;
    let groceries = create_category(
        user.id,
        NewCategory {
            name: CategoryName::new("Groceries")?,
            type_: TransactionType::Expense,
        },
        &conn,
    )?;

    let now = OffsetDateTime::now_utc();

    create_transaction(
        user.id,
        NewTransaction {
            category_id: salary.id,
            type_: TransactionType::Income,
            amount: 3200.0,
            description: "Monthly pay".to_owned(),
            date: now - Duration::days(14),
        },
        &conn,
    )?;

    for (days_ago, amount) in [(12, 84.2), (5, 42.5), (1, 17.95)] {
        create_transaction(
            user.id,
            NewTransaction {
                category_id: groceries.id,
                type_: TransactionType::Expense,
                amount,
                description: "Supermarket".to_owned(),
                date: now - Duration::days(days_ago),
            },
            &conn,
        )?;
    }

    println!("Success!");

    Ok(())
}
