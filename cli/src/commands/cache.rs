use anyhow::Result;
use std::collections::BTreeMap;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use plateful_core::models::CacheEntry;
use plateful_core::service::FoodLog;

use super::helpers::truncate;

pub(crate) fn cmd_cache_show(log: &FoodLog, json: bool) -> Result<()> {
    let cache = log.cache();

    if json {
        let map: BTreeMap<&str, &CacheEntry> = cache.iter().collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    if cache.is_empty() {
        println!("Food cache is empty");
        return Ok(());
    }

    #[derive(Tabled)]
    struct CacheRow {
        #[tabled(rename = "Query")]
        query: String,
        #[tabled(rename = "Calories")]
        calories: u32,
        #[tabled(rename = "Category")]
        category: String,
    }

    let rows: Vec<CacheRow> = cache
        .iter()
        .map(|(query, entry)| CacheRow {
            query: truncate(query, 35),
            calories: entry.calories,
            category: entry.category.clone(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(1)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    let count = cache.len();
    println!("\n{count} cached foods");
    Ok(())
}

pub(crate) fn cmd_cache_clear(log: &mut FoodLog, json: bool) -> Result<()> {
    let count = log.cache().len();
    log.clear_cache()?;
    if json {
        println!("{}", serde_json::json!({ "cleared": count }));
    } else {
        println!("Cleared {count} cached foods");
    }
    Ok(())
}
