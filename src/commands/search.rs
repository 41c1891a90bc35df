use anyhow::Result;

use delivery_board::board;
use delivery_board::config::Config;
use delivery_board::filter::MIN_SEARCH_LEN;

use super::{fetch_snapshot, print_record};

pub async fn search(config: &Config, query: String, json: bool) -> Result<()> {
    if query.trim().chars().count() < MIN_SEARCH_LEN {
        println!("Enter at least {MIN_SEARCH_LEN} characters of a postcode.");
        return Ok(());
    }

    let snapshot = fetch_snapshot(config).await?;
    let groups = board::search(&snapshot.records, &query);

    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }

    println!("Searching postcodes for: \"{}\"", query.trim());
    println!("================================");

    if groups.is_empty() {
        println!("\nNo deliveries found for \"{}\"", query.trim());
        return Ok(());
    }

    println!("\nFound {} postcode(s):\n", groups.len());

    for (i, group) in groups.iter().enumerate() {
        println!("{}. {} ({} deliveries)", i + 1, group.postcode, group.count());
        if let Some(next) = group.next() {
            print!("   Next:");
            print_record(next);
        }
        println!();
    }

    Ok(())
}
