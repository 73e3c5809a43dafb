use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use plateful_core::aggregate::CalorieMatrix;
use plateful_core::models::{DAYS_OF_WEEK, MEAL_TYPES, MealFilter, MealType};
use plateful_core::service::FoodLog;

use super::helpers::{print_date_header, print_entry_table};

const BAR_WIDTH: u64 = 40;

pub(crate) fn cmd_list(log: &FoodLog, meal: &str, json: bool) -> Result<()> {
    let filter: MealFilter = meal.parse()?;
    let entries = log.list_entries(filter);

    if json {
        let entries: Vec<_> = entries.collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    print_date_header();

    if entries.clone().next().is_none() {
        match filter {
            MealFilter::All => eprintln!("No entries logged"),
            MealFilter::Meal(meal) => eprintln!("No {meal} entries logged"),
        }
        process::exit(2);
    }

    print_entry_table(entries);
    Ok(())
}

pub(crate) fn cmd_chart(log: &FoodLog, json: bool) -> Result<()> {
    let totals = log.totals();

    if json {
        println!("{}", serde_json::to_string_pretty(&totals.chart())?);
        return Ok(());
    }

    print_date_header();
    println!("=== {} ===\n", plateful_core::aggregate::CHART_TITLE);
    println!("{}\n", totals_table(&totals));

    for line in render_bars(&totals, BAR_WIDTH) {
        println!("  {line}");
    }
    println!();
    let legend: Vec<String> = MEAL_TYPES
        .iter()
        .map(|&m| format!("{} {m}", bar_glyph(m)))
        .collect();
    println!("  {}", legend.join("   "));

    Ok(())
}

fn totals_table(totals: &CalorieMatrix) -> String {
    #[derive(Tabled)]
    struct TotalsRow {
        #[tabled(rename = "Day")]
        day: &'static str,
        #[tabled(rename = "Breakfast")]
        breakfast: u64,
        #[tabled(rename = "Lunch")]
        lunch: u64,
        #[tabled(rename = "Dinner")]
        dinner: u64,
        #[tabled(rename = "Total")]
        total: u64,
    }

    let rows: Vec<TotalsRow> = DAYS_OF_WEEK
        .iter()
        .map(|&day| TotalsRow {
            day: day.label(),
            breakfast: totals.get(MealType::Breakfast, day),
            lunch: totals.get(MealType::Lunch, day),
            dinner: totals.get(MealType::Dinner, day),
            total: totals.day_total(day),
        })
        .collect();

    Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..5)).with(Alignment::right()))
        .to_string()
}

fn bar_glyph(meal: MealType) -> char {
    match meal {
        MealType::Breakfast => '█',
        MealType::Lunch => '▓',
        MealType::Dinner => '░',
    }
}

/// One stacked bar per day, scaled so the largest day spans `width` cells.
fn render_bars(totals: &CalorieMatrix, width: u64) -> Vec<String> {
    let max_day = DAYS_OF_WEEK
        .iter()
        .map(|&d| totals.day_total(d))
        .max()
        .unwrap_or(0);

    DAYS_OF_WEEK
        .iter()
        .map(|&day| {
            let mut bar = String::new();
            if max_day > 0 {
                for meal in MEAL_TYPES {
                    let cells = totals.get(meal, day) * width / max_day;
                    for _ in 0..cells {
                        bar.push(bar_glyph(meal));
                    }
                }
            }
            let label = day.label();
            let total = totals.day_total(day);
            format!("{label:<9} {bar} {total}")
        })
        .collect()
}
