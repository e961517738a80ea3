//! # Seed Data Generator
//!
//! Fills a development database with a small grocery catalog, a few
//! customers, cashiers and a supplier.
//!
//! ## Usage
//! ```bash
//! cargo run -p toko-db --bin seed
//! cargo run -p toko-db --bin seed -- --db ./data/toko.db --stock 50
//! ```
//!
//! Ids are printed at the end so they can be pasted into curl calls
//! against `toko-server`.

use std::env;

use toko_core::{Money, NewProduct};
use toko_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// (sku, name, unit, price in rupiah)
const CATALOG: &[(&str, &str, &str, i64)] = &[
    ("BRS-05", "Beras Pandan Wangi 5 kg", "karung", 72_000),
    ("BRS-10", "Beras Pandan Wangi 10 kg", "karung", 140_000),
    ("GLA-01", "Gula Pasir 1 kg", "kg", 16_500),
    ("MYK-02", "Minyak Goreng 2 L", "pouch", 36_000),
    ("TLR-10", "Telur Ayam", "kg", 28_000),
    ("TPG-01", "Tepung Terigu 1 kg", "kg", 12_000),
    ("MIE-GRG", "Mie Instan Goreng", "pcs", 3_100),
    ("MIE-KDS", "Mie Instan Kuah Soto", "pcs", 3_000),
    ("KPI-200", "Kopi Bubuk 200 g", "bungkus", 25_000),
    ("TEH-25", "Teh Celup isi 25", "kotak", 7_500),
    ("SBN-01", "Sabun Mandi Batang", "pcs", 4_000),
    ("DTG-800", "Deterjen Bubuk 800 g", "bungkus", 21_000),
    ("AQA-600", "Air Mineral 600 ml", "botol", 3_500),
    ("AQA-DUS", "Air Mineral 600 ml isi 24", "dus", 48_000),
    ("KCP-135", "Kecap Manis 135 ml", "botol", 6_500),
    ("SMB-20", "Sambal Botol 340 ml", "botol", 14_000),
];

const CUSTOMERS: &[(&str, &str, &str)] = &[
    ("Dewi Lestari", "0812-3456-7890", "Jl. Anggrek 12, Bandung"),
    ("Rudi Hartono", "0813-2222-1111", "Jl. Cempaka 4, Bandung"),
    ("Siti Aminah", "0857-9999-0000", "Gg. Melati 2, Cimahi"),
];

const CASHIERS: &[&str] = &["Agus", "Rina"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./toko_dev.db");
    let mut stock: i64 = 25;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--stock" | "-s" => {
                if i + 1 < args.len() {
                    stock = args[i + 1].parse().unwrap_or(25);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Toko POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>      Database file path (default: ./toko_dev.db)");
                println!("  -s, --stock <N>      Opening stock per product (default: 25)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(path = %db_path, "Seeding database");
    let db = Database::new(DbConfig::new(&db_path)).await?;

    if db.products().count().await? > 0 {
        warn!("Database already has products, skipping seed. Delete the file to regenerate.");
        return Ok(());
    }

    let mut inserted = 0;
    for (sku, name, unit, price) in CATALOG {
        let product = NewProduct {
            sku: sku.to_string(),
            name: name.to_string(),
            unit: unit.to_string(),
            image: None,
            price: Money::from_rupiah(*price),
            initial_stock: stock,
        };
        match db.products().insert(&product).await {
            Ok(_) => inserted += 1,
            Err(e) => warn!(sku, error = %e, "Failed to insert product"),
        }
    }
    info!(inserted, "Products seeded");

    println!();
    println!("Customers:");
    for (name, contact, address) in CUSTOMERS {
        let customer = db.customers().insert(name, Some(*contact), Some(*address)).await?;
        println!("  {:<14} {}", customer.name, customer.id);
    }

    println!("Cashiers:");
    for name in CASHIERS {
        let cashier = db.cashiers().insert(name).await?;
        println!("  {:<14} {}", cashier.name, cashier.id);
    }

    let supplier = db
        .suppliers()
        .insert("CV Sumber Rejeki", Some("022-555-0101"))
        .await?;
    println!("Supplier:");
    println!("  {:<14} {}", supplier.name, supplier.id);

    println!();
    println!("Seed complete: {} products, {} stock each", inserted, stock);

    db.close().await;
    Ok(())
}
