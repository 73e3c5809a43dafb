use serde::Serialize;

use crate::models::{DAYS_OF_WEEK, Day, Entry, MEAL_TYPES, MealType};

/// Calorie sums indexed by meal slot and day of week.
///
/// Always derived from an entry set with [`compute_totals`]; never updated in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CalorieMatrix {
    totals: [[u64; DAYS_OF_WEEK.len()]; MEAL_TYPES.len()],
}

/// One stacked-bar dataset: a meal's totals across the week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MealSeries {
    pub label: &'static str,
    pub color: &'static str,
    pub data: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyChart {
    pub title: &'static str,
    pub labels: Vec<&'static str>,
    pub datasets: Vec<MealSeries>,
}

pub const CHART_TITLE: &str = "Weekly Calorie Intake";

/// Sum calories per (meal, day). Order of `entries` does not matter.
pub fn compute_totals<'a, I>(entries: I) -> CalorieMatrix
where
    I: IntoIterator<Item = &'a Entry>,
{
    let mut matrix = CalorieMatrix::default();
    for entry in entries {
        matrix.totals[entry.meal.index()][entry.day.index()] += u64::from(entry.calories);
    }
    matrix
}

impl CalorieMatrix {
    #[must_use]
    pub fn get(&self, meal: MealType, day: Day) -> u64 {
        self.totals[meal.index()][day.index()]
    }

    #[must_use]
    pub fn day_total(&self, day: Day) -> u64 {
        self.totals.iter().map(|row| row[day.index()]).sum()
    }

    #[must_use]
    pub fn meal_total(&self, meal: MealType) -> u64 {
        self.totals[meal.index()].iter().sum()
    }

    #[must_use]
    pub fn grand_total(&self) -> u64 {
        self.totals.iter().flatten().sum()
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.grand_total() == 0
    }

    /// Per-meal rows in day order, one per stacked-bar dataset.
    #[must_use]
    pub fn series(&self) -> Vec<MealSeries> {
        MEAL_TYPES
            .iter()
            .map(|&meal| MealSeries {
                label: meal.label(),
                color: meal.color(),
                data: self.totals[meal.index()].to_vec(),
            })
            .collect()
    }

    #[must_use]
    pub fn chart(&self) -> WeeklyChart {
        WeeklyChart {
            title: CHART_TITLE,
            labels: DAYS_OF_WEEK.iter().map(|d| d.label()).collect(),
            datasets: self.series(),
        }
    }
}
