//! # Seed / Maintenance Tool
//!
//! Populates the database with the sample catalog, and optionally wipes the
//! order ledger.
//!
//! ## Usage
//! ```bash
//! # Insert Coffee, Croissant, Sandwich (skips SKUs already present)
//! cargo run -p tally-db --bin seed
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//!
//! # Delete every order and restart order numbering at 1
//! cargo run -p tally-db --bin seed -- --reset-orders
//! ```

use std::env;
use tally_db::repository::product::SAMPLE_PRODUCTS;
use tally_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./tally.db");
    let mut reset_orders = false;
    let mut skip_catalog = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--reset-orders" => reset_orders = true,
            "--no-catalog" => skip_catalog = true,
            "--help" | "-h" => {
                println!("Tally POS Seed Tool");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>     Database file path (default: ./tally.db)");
                println!("      --reset-orders  Delete all orders and reset order numbering");
                println!("      --no-catalog    Do not insert the sample catalog");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {other}"),
        }
        i += 1;
    }

    println!("🌱 Tally POS Seed Tool");
    println!("======================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if !skip_catalog {
        let inserted = db.products().seed_samples().await?;
        println!(
            "✓ Sample catalog: {} of {} products inserted",
            inserted,
            SAMPLE_PRODUCTS.len()
        );
    }

    if reset_orders {
        let removed = db.sales().delete_all_orders().await?;
        println!("✓ Deleted {} orders; next order id is {}", removed, db.sales().next_order_id().await?);
    }

    println!();
    println!(
        "Catalog: {} products, Ledger: {} orders",
        db.products().count().await?,
        db.sales().count().await?
    );

    db.close().await;
    println!("✓ Seed complete!");

    Ok(())
}
