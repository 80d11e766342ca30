//! Deterministic sample orders for demos and tests.
//!
//! Data is drawn from a seeded generator so every run produces the same
//! table. Orders span 2014 through 2017 across four regions.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusqlite::{params, Connection};
use tracing::info;

use lumen_core::error::LumenError;

use crate::db::Database;

/// Default generator seed.
pub const DEFAULT_SEED: u64 = 0x5eed_2017;

/// Default number of generated orders.
pub const DEFAULT_ORDER_COUNT: usize = 3_000;

struct Location {
    region: &'static str,
    state: &'static str,
    abbr: &'static str,
    cities: &'static [(&'static str, &'static str)],
}

const LOCATIONS: &[Location] = &[
    Location { region: "West", state: "California", abbr: "CA", cities: &[("Los Angeles", "90036"), ("San Francisco", "94122"), ("San Diego", "92024")] },
    Location { region: "West", state: "Washington", abbr: "WA", cities: &[("Seattle", "98103"), ("Spokane", "99207")] },
    Location { region: "West", state: "Oregon", abbr: "OR", cities: &[("Portland", "97206")] },
    Location { region: "West", state: "Arizona", abbr: "AZ", cities: &[("Phoenix", "85023"), ("Tucson", "85705")] },
    Location { region: "West", state: "Colorado", abbr: "CO", cities: &[("Denver", "80219"), ("Aurora", "80013")] },
    Location { region: "Central", state: "Texas", abbr: "TX", cities: &[("Houston", "77095"), ("Dallas", "75217"), ("Austin", "78745")] },
    Location { region: "Central", state: "Illinois", abbr: "IL", cities: &[("Chicago", "60623"), ("Springfield", "62701")] },
    Location { region: "Central", state: "Michigan", abbr: "MI", cities: &[("Detroit", "48227")] },
    Location { region: "Central", state: "Minnesota", abbr: "MN", cities: &[("Minneapolis", "55407")] },
    Location { region: "East", state: "New York", abbr: "NY", cities: &[("New York City", "10035"), ("Buffalo", "14215")] },
    Location { region: "East", state: "Pennsylvania", abbr: "PA", cities: &[("Philadelphia", "19140"), ("Pittsburgh", "15212")] },
    Location { region: "East", state: "Ohio", abbr: "OH", cities: &[("Columbus", "43229"), ("Cleveland", "44105")] },
    Location { region: "East", state: "Massachusetts", abbr: "MA", cities: &[("Boston", "02127")] },
    Location { region: "South", state: "Florida", abbr: "FL", cities: &[("Miami", "33142"), ("Jacksonville", "32216")] },
    Location { region: "South", state: "Georgia", abbr: "GA", cities: &[("Atlanta", "30318")] },
    Location { region: "South", state: "Virginia", abbr: "VA", cities: &[("Richmond", "23223")] },
    Location { region: "South", state: "North Carolina", abbr: "NC", cities: &[("Charlotte", "28205"), ("Raleigh", "27604")] },
    Location { region: "South", state: "Tennessee", abbr: "TN", cities: &[("Nashville", "37211")] },
];

/// (category, sub_category, base unit price, products)
const CATALOG: &[(&str, &str, f64, &[&str])] = &[
    ("Furniture", "Chairs", 180.0, &["Hon Task Chair", "Global Leather Chair"]),
    ("Furniture", "Tables", 320.0, &["Bretford Conference Table", "Barricks Round Table"]),
    ("Furniture", "Bookcases", 210.0, &["Bush Westfield Bookcase", "Sauder Library"]),
    ("Furniture", "Furnishings", 35.0, &["Eldon Desk Lamp", "Howard Wall Clock"]),
    ("Office Supplies", "Binders", 18.0, &["Avery Binder", "Wilson Jones Binder"]),
    ("Office Supplies", "Paper", 12.0, &["Xerox Copy Paper", "Easy-staple Paper"]),
    ("Office Supplies", "Storage", 95.0, &["Fellowes Bankers Box", "Tennsco Shelving"]),
    ("Office Supplies", "Art", 8.0, &["Newell Pencils", "Dixon Markers"]),
    ("Technology", "Phones", 240.0, &["Apple Smart Phone", "Cisco IP Phone"]),
    ("Technology", "Accessories", 60.0, &["Logitech Mouse", "Kingston Flash Drive"]),
    ("Technology", "Machines", 520.0, &["Okidata Printer", "Brother Fax Machine"]),
    ("Technology", "Copiers", 900.0, &["Canon Copier", "Hewlett Packard Copier"]),
];

const FIRST_NAMES: &[&str] = &[
    "Aaron", "Brenda", "Carlos", "Dana", "Elena", "Frank", "Grace", "Henry", "Irene", "Jamal",
    "Karen", "Luis", "Maya", "Nolan", "Olivia", "Peter",
];

const LAST_NAMES: &[&str] = &["Bergman", "Chen", "Diaz", "Foster", "Hughes", "Klein", "Morris", "Patel"];

const SEGMENTS: &[&str] = &["Consumer", "Corporate", "Home Office"];

const SHIP_MODES: &[&str] = &["Standard Class", "Second Class", "First Class", "Same Day"];

const DISCOUNTS: &[f64] = &[0.0, 0.0, 0.0, 0.1, 0.2];

/// Number of days covered, 2014-01-01 through 2017-12-31.
const SPAN_DAYS: i64 = 1_461;

fn pick<'a, T>(rng: &mut StdRng, items: &'a [T]) -> &'a T {
    &items[rng.random_range(0..items.len())]
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Seed the orders table unless it already has rows. Returns rows inserted.
pub fn seed_sample_data(db: &Database, seed: u64, orders: usize) -> Result<usize, LumenError> {
    let inserted = db.with_conn(|conn| insert_orders(conn, seed, orders))?;
    if inserted > 0 {
        info!(rows = inserted, seed, "Seeded sample orders");
    }
    Ok(inserted)
}

fn insert_orders(conn: &Connection, seed: u64, orders: usize) -> Result<usize, LumenError> {
    let existing: i64 = conn
        .query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))
        .map_err(|e| LumenError::Storage(e.to_string()))?;
    if existing > 0 {
        return Ok(0);
    }

    let start = NaiveDate::from_ymd_opt(2014, 1, 1)
        .ok_or_else(|| LumenError::Storage("invalid seed start date".into()))?;
    let mut rng = StdRng::seed_from_u64(seed);

    let customers: Vec<(String, String, &str)> = FIRST_NAMES
        .iter()
        .enumerate()
        .flat_map(|(i, first)| {
            LAST_NAMES
                .iter()
                .enumerate()
                .filter(move |(j, _)| (i + j) % 3 == 0)
                .map(move |(j, last)| (i, j, *first, *last))
        })
        .map(|(i, j, first, last)| {
            let id = format!(
                "{}{}-{}",
                &first[..1],
                &last[..1],
                10_000 + i * 100 + j * 7
            );
            (id, format!("{} {}", first, last), SEGMENTS[i % SEGMENTS.len()])
        })
        .collect();

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| LumenError::Storage(e.to_string()))?;
    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO orders (
                    order_id, order_date, ship_date, ship_mode, customer_id, customer_name,
                    segment, country, city, state, postal_code, region, product_id,
                    category, sub_category, product_name, sales, quantity, discount, profit
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
            )
            .map_err(|e| LumenError::Storage(e.to_string()))?;

        for n in 0..orders {
            let order_date = start + Duration::days(rng.random_range(0..SPAN_DAYS));
            let ship_date = order_date + Duration::days(rng.random_range(0..7));
            let location = pick(&mut rng, LOCATIONS);
            let (city, postal_code) = *pick(&mut rng, location.cities);
            let (customer_id, customer_name, segment) = pick(&mut rng, &customers);
            let catalog_index = rng.random_range(0..CATALOG.len());
            let (category, sub_category, base_price, products) = CATALOG[catalog_index];
            let product_index = rng.random_range(0..products.len());

            let quantity: i64 = rng.random_range(1..=9);
            let discount = *pick(&mut rng, DISCOUNTS);
            let unit_price = base_price * rng.random_range(0.6..1.4);
            let sales = round2(unit_price * quantity as f64 * (1.0 - discount));
            let margin = rng.random_range(-0.15..0.35) - discount;
            let profit = round2(sales * margin);

            let order_id = format!(
                "{}-{}-{}",
                location.abbr,
                order_date.format("%Y"),
                100_000 + n
            );
            let product_id = format!(
                "{}-{}-{}",
                category[..3].to_uppercase(),
                sub_category[..2].to_uppercase(),
                10_000_000 + catalog_index * 10 + product_index
            );

            stmt.execute(params![
                order_id,
                order_date.format("%Y-%m-%d").to_string(),
                ship_date.format("%Y-%m-%d").to_string(),
                *pick(&mut rng, SHIP_MODES),
                customer_id,
                customer_name,
                *segment,
                "United States",
                city,
                location.state,
                postal_code,
                location.region,
                product_id,
                category,
                sub_category,
                products[product_index],
                sales,
                quantity,
                discount,
                profit,
            ])
            .map_err(|e| LumenError::Storage(format!("Failed to insert order: {}", e)))?;
        }
    }
    tx.commit()
        .map_err(|e| LumenError::Storage(e.to_string()))?;

    Ok(orders)
}
