use anyhow::Result;
use std::process;

use plateful_core::service::FoodLog;

use super::helpers::{json_error, prompt_confirm};

pub(crate) fn cmd_delete(log: &mut FoodLog, entry_id: u64, json: bool) -> Result<()> {
    let Some(entry) = log.get_entry(entry_id).cloned() else {
        if json {
            println!("{}", json_error(&format!("Entry {entry_id} not found")));
        } else {
            eprintln!("Entry {entry_id} not found");
        }
        process::exit(2);
    };

    log.remove_entry(entry_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        let food = &entry.food;
        let meal = entry.meal;
        let day = entry.day;
        println!("Deleted entry {entry_id}: {food} ({meal}, {day})");
    }
    Ok(())
}

pub(crate) fn cmd_clear(log: &mut FoodLog, yes: bool, json: bool) -> Result<()> {
    if !yes && !prompt_confirm("Are you sure you want to clear all entries?")? {
        if json {
            println!("{}", serde_json::json!({ "cleared": false }));
        } else {
            eprintln!("Nothing cleared");
        }
        return Ok(());
    }

    let count = log.entries().len();
    log.clear_all()?;

    if json {
        println!("{}", serde_json::json!({ "cleared": true, "entries": count }));
    } else {
        println!("Cleared {count} entries and the food cache");
    }
    Ok(())
}
