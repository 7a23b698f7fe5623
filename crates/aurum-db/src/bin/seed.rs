//! # Seed Data Generator
//!
//! Populates the database with development data: the category tree, a
//! jewelry catalog, and two demo users.
//!
//! ## Usage
//! ```bash
//! cargo run -p aurum-db --bin seed
//!
//! # Specify database path
//! cargo run -p aurum-db --bin seed -- --db ./data/aurum.db
//! ```
//!
//! ## Demo Users
//! - `admin@aurum.dev` / `admin123` (ADMIN)
//! - `seller@aurum.dev` / `seller123` (USER)

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHasher};
use chrono::Utc;
use std::env;
use uuid::Uuid;

use aurum_core::{Category, Product, Role, User};
use aurum_db::{Database, DbConfig};

/// Catalog: (category, [(code, title, quantity, min_stock, unit_price, sale_price)]).
/// Prices in cents.
const CATALOG: &[(&str, &[(&str, &str, i64, i64, i64, i64)])] = &[
    (
        "Rings",
        &[
            ("RING001", "Gold Ring 18k", 12, 3, 42000, 69900),
            ("RING002", "Silver Band", 30, 5, 4500, 8900),
            ("RING003", "Solitaire Ring", 4, 2, 180000, 299000),
            ("RING004", "Signet Ring", 8, 2, 35000, 59900),
        ],
    ),
    (
        "Necklaces",
        &[
            ("CHAIN01", "Venetian Chain 45cm", 15, 4, 28000, 49900),
            ("CHAIN02", "Silver Choker", 20, 5, 9000, 15900),
            ("PEND001", "Heart Pendant", 25, 5, 6500, 12900),
        ],
    ),
    (
        "Earrings",
        &[
            ("EARR001", "Gold Hoop Earrings", 18, 4, 19000, 34900),
            ("EARR002", "Pearl Studs", 22, 5, 8000, 14900),
            ("EARR003", "Crystal Drops", 6, 3, 12000, 21900),
        ],
    ),
    (
        "Bracelets",
        &[
            ("BRAC001", "Charm Bracelet", 14, 3, 16000, 27900),
            ("BRAC002", "Tennis Bracelet", 3, 2, 95000, 159000),
        ],
    ),
    (
        "Watches",
        &[
            ("WATCH01", "Classic Leather Watch", 10, 2, 45000, 79900),
            ("WATCH02", "Steel Chronograph", 5, 2, 110000, 189000),
        ],
    ),
];

const DEMO_USERS: &[(&str, &str, &str, Role)] = &[
    ("Admin", "admin@aurum.dev", "admin123", Role::Admin),
    ("Seller", "seller@aurum.dev", "seller123", Role::User),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./data/aurum.db");

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
                println!("Aurum Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./data/aurum.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Aurum Seed Data Generator");
    println!("=========================");
    println!("Database: {}", db_path);
    println!();

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(db.pool())
        .await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding users...");
    for (name, email, password, role) in DEMO_USERS {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
            role: *role,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        db.users().insert(&user).await?;
        println!("  {} ({})", email, role);
    }

    println!();
    println!("Seeding catalog...");
    let mut product_count = 0;

    for (category_name, products) in CATALOG {
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: category_name.to_string(),
            description: None,
            parent_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.categories().insert(&category).await?;

        for (code, title, quantity, min_stock, unit_price, sale_price) in *products {
            let now = Utc::now();
            let product = Product {
                id: Uuid::new_v4().to_string(),
                code: code.to_string(),
                title: title.to_string(),
                description: None,
                category_id: category.id.clone(),
                quantity: *quantity,
                unit_price_cents: *unit_price,
                sale_price_cents: *sale_price,
                min_stock: *min_stock,
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            db.products().insert(&product).await?;
            product_count += 1;
        }

        println!("  {} ({} products)", category_name, products.len());
    }

    println!();
    println!("✓ Seed complete: {} categories, {} products", CATALOG.len(), product_count);

    Ok(())
}

fn hash_password(password: &str) -> Result<String, Box<dyn std::error::Error>> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| format!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}
