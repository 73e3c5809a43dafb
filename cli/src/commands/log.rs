use anyhow::Result;
use std::process;
use tracing::warn;

use plateful_core::cancel::CancellationToken;
use plateful_core::error::ResolveError;
use plateful_core::resolver::NutritionLookup;
use plateful_core::service::FoodLog;

use super::helpers::{json_error, parse_day, parse_meal};

pub(crate) async fn cmd_add(
    log: &mut FoodLog,
    lookup: &dyn NutritionLookup,
    food: &str,
    meal: &str,
    day: Option<&str>,
    json: bool,
) -> Result<()> {
    let meal = parse_meal(meal)?;
    let day = parse_day(day)?;

    // Ctrl-C cancels an in-flight lookup.
    let cancel = CancellationToken::new();
    let on_interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let result = log.add_food(lookup, food, meal, day, &cancel).await;
    on_interrupt.abort();

    let entry = match result {
        Ok(entry) => entry,
        Err(err) => {
            let Some(resolve_err) = err.downcast_ref::<ResolveError>() else {
                return Err(err);
            };
            warn!(food, error = ?resolve_err, "could not add entry");
            let message = failure_message(&err);
            if json {
                println!("{}", json_error(&message));
            } else {
                eprintln!("{message}");
            }
            process::exit(if resolve_err.is_not_found() { 2 } else { 1 });
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        let food = &entry.food;
        let meal = entry.meal;
        let day = entry.day;
        let cal = entry.calories;
        let id = entry.id;
        println!("Logged: {food} for {meal} on {day} — {cal} kcal (id: {id})");
    }

    Ok(())
}

/// The error with its full cause chain, so storage failures name their cause.
fn failure_message(err: &anyhow::Error) -> String {
    format!("{err:#}")
}
