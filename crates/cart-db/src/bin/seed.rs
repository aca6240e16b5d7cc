//! # Seed Data Generator
//!
//! Populates the database with demo products and prices a demo cart
//! against them.
//!
//! ## Usage
//! ```bash
//! # Seed ./cart_dev.db with the default config
//! cargo run -p cart-db --bin seed
//!
//! # Specify database path and cart config
//! cargo run -p cart-db --bin seed -- --db ./data/cart.db --config ./cart.toml
//! ```
//!
//! ## Demo Cart
//! Two requests against the same session: the first adds lines with item
//! conditions and saves, the second restores the cart, adds a cart-level
//! discount and prints subtotal and total.

use std::env;
use std::path::PathBuf;

use cart_core::{stored_item_ids, Cart, CartConfig, ItemId};
use cart_db::{Database, DbConfig, DbResult, NewProduct};
use tracing_subscriber::EnvFilter;

/// Demo catalog: (id, name, price)
const PRODUCTS: &[(u64, &str, f64)] = &[
    (1, "Espresso Cup", 5.24),
    (2, "Pour-Over Kettle", 10.48),
    (3, "Grinder", 15.72),
    (4, "Paper Filters", 3.99),
    (5, "Coffee Beans 1kg", 24.50),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./cart_dev.db");
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Cart Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>      Database file path (default: ./cart_dev.db)");
                println!("  -c, --config <PATH>  Cart config TOML (default: built-in defaults)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Cart Seed Data Generator");
    println!("========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products, skipping insert", existing);
    } else {
        let inserted = insert_products(&db, PRODUCTS).await?;
        println!("✓ Inserted {} of {} products", inserted, PRODUCTS.len());
    }

    let config = CartConfig::load_or_default(config_path);
    let keys = config.session_keys();

    let cup = ItemId::new(1)?;
    let kettle = ItemId::new(2)?;

    // Request 1: fill the cart. Rows for the saved lines and the ones added.
    let mut store = db.sessions().load_store(&keys).await?;
    let mut ids = stored_item_ids(&store, &keys)?;
    ids.extend([cup, kettle]);
    let catalog = db.products().load_catalog_for(&ids).await?;
    let mut cart = Cart::open(config.clone(), catalog, &mut store)?;
    cart.empty();
    cart.empty_conditions();

    cart.item(cup).set_quantity(1).condition("sale").set_value("-10%");
    cart.item(cup).condition("engraving").set_value("+1");
    cart.item(kettle).set_quantity(1);
    cart.save(&mut store)?;
    db.sessions().flush_store(&store, &keys).await?;
    println!("✓ Saved demo cart under '{}'", keys.items);

    // Request 2: restore and price. Only the saved lines need rows.
    let mut store = db.sessions().load_store(&keys).await?;
    let ids = stored_item_ids(&store, &keys)?;
    let catalog = db.products().load_catalog_for(&ids).await?;
    let mut cart = Cart::open(config, catalog, &mut store)?;
    cart.condition("member").set_value("-10%");

    println!();
    let ids: Vec<ItemId> = cart.keys().collect();
    for id in ids {
        let (quantity, price, sum) = {
            let priced = cart.priced(id)?;
            (priced.item().quantity(), priced.price()?, priced.price_sum()?)
        };
        println!(
            "  #{} x{}  price {}  sum {}",
            id,
            quantity,
            cart.format_amount(price),
            cart.format_amount(sum),
        );
    }
    let subtotal = cart.subtotal()?;
    let total = cart.total()?;
    println!("  subtotal {}", cart.format_amount(subtotal));
    println!("  total    {}", cart.format_amount(total));

    cart.save(&mut store)?;
    db.sessions().flush_store(&store, &keys).await?;

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Inserts the demo rows and returns how many went in. A failed row is
/// reported and skipped.
async fn insert_products(db: &Database, products: &[(u64, &str, f64)]) -> DbResult<usize> {
    let mut inserted = 0;
    for (raw, name, price) in products {
        let product = NewProduct {
            id: ItemId::new(*raw).map_err(cart_core::CoreError::from)?,
            name: (*name).to_string(),
            price: *price,
        };
        match db.products().insert(&product).await {
            Ok(_) => inserted += 1,
            Err(e) => eprintln!("Failed to insert {}: {}", name, e),
        }
    }
    Ok(inserted)
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - Default: INFO, with debug for the cart crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cart=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
