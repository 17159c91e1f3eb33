use serde::{Deserialize, Serialize};
use sqlx::{query_builder::Separated, FromRow, Postgres};

use super::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Workout {
    pub id: i64,
    pub workout_type: String,
    pub duration_minutes: i64,
    pub calories_burned: i64,
    pub date: String, // ISO date, e.g. "2025-08-06"
}

impl Record for Workout {
    const TABLE: &'static str = "workouts";
    const COLUMNS: &'static [&'static str] =
        &["id", "workout_type", "duration_minutes", "calories_burned", "date"];
    const PATH: &'static str = "/workouts";
    const KEY: &'static str = "workout";
    const CREATED_MSG: &'static str = "Workout added successfully";

    fn push_values(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.id)
            .push_bind(self.workout_type)
            .push_bind(self.duration_minutes)
            .push_bind(self.calories_burned)
            .push_bind(self.date);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Meal {
    pub id: i64,
    pub meal_type: String, // Breakfast, Lunch, Dinner, Snack
    pub calories: i64,
    #[serde(default)]
    pub description: Option<String>,
    pub date: String,
}

impl Record for Meal {
    const TABLE: &'static str = "meals";
    const COLUMNS: &'static [&'static str] = &["id", "meal_type", "calories", "description", "date"];
    const PATH: &'static str = "/meals";
    const KEY: &'static str = "meal";
    const CREATED_MSG: &'static str = "Meal logged successfully";

    fn push_values(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.id)
            .push_bind(self.meal_type)
            .push_bind(self.calories)
            .push_bind(self.description)
            .push_bind(self.date);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WeightEntry {
    pub id: i64,
    pub weight_kg: f64,
    pub date: String,
}

impl Record for WeightEntry {
    const TABLE: &'static str = "weights";
    const COLUMNS: &'static [&'static str] = &["id", "weight_kg", "date"];
    const PATH: &'static str = "/weights";
    const KEY: &'static str = "weight";
    const CREATED_MSG: &'static str = "Weight logged successfully";

    fn push_values(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.id).push_bind(self.weight_kg).push_bind(self.date);
    }
}
