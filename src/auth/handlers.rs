use axum::{
    extract::State,
    routing::{get, post},
    Form, Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginForm, MeResponse, MessageResponse, RegisterRequest, TokenResponse},
        extractors::CurrentUser,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .credentials
        .register(&payload.email, &payload.password)
        .await?;
    Ok(Json(MessageResponse {
        msg: "User registered successfully".into(),
    }))
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .credentials
        .authenticate(&form.username, &form.password)
        .await?;
    let access_token = state.tokens.issue(&user.email)?;
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<MeResponse> {
    Json(MeResponse { email: user.email })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_response_serialization() {
        let response = TokenResponse {
            access_token: "abc.def.ghi".into(),
            token_type: "bearer",
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["token_type"], "bearer");
        assert_eq!(json["access_token"], "abc.def.ghi");
    }

    #[test]
    fn me_response_has_only_email() {
        let json = serde_json::to_value(MeResponse {
            email: "test@example.com".into(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "email": "test@example.com" }));
    }
}
