use std::env;

use tracing_subscriber::EnvFilter;

use leafdb::{InsertOutcome, Result, Row, Table};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let mut args = env::args().skip(1);
    let db_path = args.next().unwrap_or_else(|| "demo.db".to_string());
    let count: u32 = args.next().and_then(|n| n.parse().ok()).unwrap_or(50);

    println!("LeafDB - a single-table B-tree on disk");
    println!("======================================\n");

    let mut table = Table::open(&db_path)?;
    println!("Opened {} ({} pages)", db_path, table.num_pages());

    // Visit keys in a scattered order so splits land all over the tree
    let stride = 7919;
    let mut inserted = 0;
    for i in 0..count {
        let key = ((u64::from(i) * stride) % u64::from(count)) as u32 + 1;
        let row = Row::new(key, &format!("user{}", key), &format!("person{}@example.com", key))?;

        match table.insert(key, &row)? {
            InsertOutcome::Success => inserted += 1,
            InsertOutcome::DuplicateKey => println!("Key {} already present", key),
            InsertOutcome::TableFull => {
                println!("Table full after {} inserts", inserted);
                break;
            }
        }
    }

    table.check_integrity()?;
    println!("Inserted {} rows", inserted);
    println!("  - Pages: {}", table.num_pages());
    println!("  - Depth: {}", table.depth()?);

    println!("\nFirst rows in key order:");
    for row in table.scan()?.take(5) {
        println!("  {}", row?);
    }

    table.close()?;

    let mut table = Table::open(&db_path)?;
    let total = table.scan()?.count();
    println!("\nReopened {}: {} rows", db_path, total);
    table.close()?;

    Ok(())
}
