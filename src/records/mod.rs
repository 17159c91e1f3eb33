use serde::{de::DeserializeOwned, Serialize};
use sqlx::{postgres::PgRow, query_builder::Separated, FromRow, Postgres};

use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod repo;

pub use dto::{Meal, WeightEntry, Workout};

/// A per-user log entry kind. Each kind gets its own table, its own store
/// and its own `POST`/`GET` route pair; the payload never names its owner.
pub trait Record:
    Clone + Serialize + DeserializeOwned + Send + Sync + Unpin + for<'r> FromRow<'r, PgRow> + 'static
{
    /// Table name, also used as the log label.
    const TABLE: &'static str;
    /// Payload columns in insert/select order, excluding `user_id`.
    const COLUMNS: &'static [&'static str];
    const PATH: &'static str;
    /// Key the created record is returned under.
    const KEY: &'static str;
    const CREATED_MSG: &'static str;

    /// Bind this record's values in `COLUMNS` order.
    fn push_values(self, row: &mut Separated<'_, '_, Postgres, &'static str>);
}

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::routes::<Workout>())
        .merge(handlers::routes::<Meal>())
        .merge(handlers::routes::<WeightEntry>())
}
