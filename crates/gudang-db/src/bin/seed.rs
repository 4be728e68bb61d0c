//! # Seed Data Generator
//!
//! Populates the database with development catalog data.
//!
//! ## Usage
//! ```bash
//! # Seed the default development database
//! cargo run -p gudang-db --bin seed
//!
//! # Specify database path
//! cargo run -p gudang-db --bin seed -- --db ./data/gudang.db
//! ```
//!
//! Every unit of opening stock arrives through an incoming movement, so
//! the ledger fold law holds from the very first row: folding any
//! product's history reproduces its registry stock exactly.

use std::env;

use chrono::Utc;
use tracing_subscriber::EnvFilter;

use gudang_core::Product;
use gudang_db::{Database, DbConfig, IncomingReceipt, StoreService};

/// (store_id, store_name)
const STORES: &[(&str, &str)] = &[
    ("TK-001", "Toko Pusat Jakarta"),
    ("TK-002", "Cabang Bandung"),
];

/// (name, category, purchase_price, sale_price, min_stock, opening_qty)
const CATALOG: &[(&str, &str, i64, i64, i64, i64)] = &[
    ("Pensil 2B", "ATK", 2_000, 3_000, 10, 120),
    ("Buku Tulis 38 Lembar", "ATK", 3_500, 5_000, 10, 80),
    ("Pulpen Hitam", "ATK", 1_500, 2_500, 10, 100),
    ("Penghapus Putih", "ATK", 1_000, 2_000, 5, 60),
    ("Spidol Whiteboard", "ATK", 6_000, 8_500, 5, 24),
    ("Beras Premium 5kg", "Sembako", 62_000, 68_000, 4, 30),
    ("Minyak Goreng 1L", "Sembako", 15_500, 17_500, 6, 48),
    ("Gula Pasir 1kg", "Sembako", 13_000, 15_000, 6, 40),
    ("Teh Botol 450ml", "Minuman", 3_000, 4_500, 12, 96),
    ("Air Mineral 600ml", "Minuman", 2_000, 3_500, 24, 144),
    ("Kopi Sachet", "Minuman", 1_200, 2_000, 20, 200),
    ("Keripik Singkong 100g", "Snack", 5_000, 7_500, 8, 36),
    ("Biskuit Kaleng", "Snack", 22_000, 27_500, 4, 18),
];

const SUPPLIER: &str = "CV Sumber Jaya";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./gudang_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Gudang POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./gudang_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Gudang POS Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let service = StoreService::new(db);

    println!();
    println!("Seeding catalog...");

    let mut seeded = 0;
    let start = std::time::Instant::now();

    for (store_idx, (store_id, store_name)) in STORES.iter().enumerate() {
        for (item_idx, (name, category, purchase, sale, min_stock, opening)) in
            CATALOG.iter().enumerate()
        {
            // spread the catalog across both stores, with some overlap
            if store_idx == 1 && item_idx % 3 == 0 {
                continue;
            }

            // Catalog entry first (this is the catalog-management step the
            // dashboard normally does), with zero stock and the sale price
            let now = Utc::now();
            let sku = service.database().products().next_sku().await?;
            let product = Product {
                id: sku,
                name: (*name).to_string(),
                category: (*category).to_string(),
                stock: 0,
                min_stock: *min_stock,
                purchase_price: *purchase,
                sale_price: *sale,
                supplier: None,
                store_id: (*store_id).to_string(),
                store_name: (*store_name).to_string(),
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            service.database().products().insert(&product).await?;

            // Opening stock arrives as a proper incoming movement
            let outcome = service
                .receive_stock(IncomingReceipt {
                    store_id: (*store_id).to_string(),
                    store_name: (*store_name).to_string(),
                    name: (*name).to_string(),
                    supplier: SUPPLIER.to_string(),
                    quantity: *opening,
                    unit_purchase_price: *purchase,
                    notes: "stok awal".to_string(),
                    created_by: "seed".to_string(),
                })
                .await?;

            seeded += 1;
            println!(
                "  {} {} ({}x) @ {}",
                outcome.product.id, outcome.product.name, outcome.product.stock, store_id
            );
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Seeded {} products in {:?}", seeded, elapsed);

    // Spot-check the round-trip law on the first product
    println!();
    println!("Verifying ledger integrity...");
    service.verify_integrity("SKU-001").await?;
    println!("  SKU-001: ledger fold matches registry stock");

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
