use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::{Map, Value};
use tracing::{info, instrument};

use super::{repo::SharedStore, Record};
use crate::{auth::extractors::CurrentUser, error::ApiError, state::AppState};

/// `POST` and `GET` on `R::PATH`, both behind the auth gate.
pub fn routes<R: Record>() -> Router<AppState>
where
    SharedStore<R>: FromRef<AppState>,
{
    Router::new().route(R::PATH, post(create_record::<R>).get(list_records::<R>))
}

#[instrument(skip_all, fields(kind = R::TABLE, user_id = %user.id))]
pub async fn create_record<R: Record>(
    State(store): State<SharedStore<R>>,
    CurrentUser(user): CurrentUser,
    Json(record): Json<R>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let stored = store.append(user.id, record).await?;
    info!("record added");

    let mut body = Map::new();
    body.insert("msg".into(), Value::from(R::CREATED_MSG));
    body.insert(
        R::KEY.into(),
        serde_json::to_value(stored).map_err(anyhow::Error::from)?,
    );
    Ok((StatusCode::CREATED, Json(Value::Object(body))))
}

#[instrument(skip_all, fields(kind = R::TABLE, user_id = %user.id))]
pub async fn list_records<R: Record>(
    State(store): State<SharedStore<R>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<R>>, ApiError> {
    Ok(Json(store.list(user.id).await?))
}
