use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use axum::extract::FromRef;
use sqlx::postgres::PgPoolOptions;

use crate::auth::{
    jwt::TokenService,
    password::Hasher,
    repo::{MemoryUserStore, PgUserStore, UserStore},
    services::Credentials,
};
use crate::config::AppConfig;
use crate::records::{
    repo::{MemoryRecordStore, PgRecordStore, SharedStore},
    Meal, WeightEntry, Workout,
};

#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub credentials: Credentials,
    pub workouts: SharedStore<Workout>,
    pub meals: SharedStore<Meal>,
    pub weights: SharedStore<WeightEntry>,
    pub static_dir: PathBuf,
}

/// Storage backends handed to `AppState::from_parts`.
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub workouts: SharedStore<Workout>,
    pub meals: SharedStore<Meal>,
    pub weights: SharedStore<WeightEntry>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(MemoryUserStore::new()),
            workouts: Arc::new(MemoryRecordStore::new()),
            meals: Arc::new(MemoryRecordStore::new()),
            weights: Arc::new(MemoryRecordStore::new()),
        }
    }

    pub fn postgres(db: sqlx::PgPool) -> Self {
        Self {
            users: Arc::new(PgUserStore::new(db.clone())),
            workouts: Arc::new(PgRecordStore::new(db.clone())),
            meals: Arc::new(PgRecordStore::new(db.clone())),
            weights: Arc::new(PgRecordStore::new(db)),
        }
    }
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let stores = match &config.database_url {
            Some(url) => {
                let db = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                // Run migrations if present
                if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                Stores::postgres(db)
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory storage");
                Stores::in_memory()
            }
        };
        Self::from_parts(config, stores)
    }

    pub fn from_parts(config: AppConfig, stores: Stores) -> anyhow::Result<Self> {
        let tokens = Arc::new(TokenService::new(&config.jwt)?);
        let hasher = Arc::new(Hasher::new(&config.hash)?);
        tracing::info!(
            token_ttl_minutes = tokens.ttl().whole_minutes(),
            "auth configured"
        );
        Ok(Self {
            tokens,
            credentials: Credentials::new(stores.users, hasher),
            workouts: stores.workouts,
            meals: stores.meals,
            weights: stores.weights,
            static_dir: config.server.static_dir.clone(),
        })
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = AppConfig {
            database_url: None,
            max_connections: 1,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                ttl_minutes: 30,
            },
            hash: crate::config::HashConfig {
                memory_kib: Some(argon2::Params::MIN_M_COST),
                iterations: Some(1),
                parallelism: Some(1),
            },
            server: crate::config::ServerConfig {
                listen_addr: ([127, 0, 0, 1], 0).into(),
                static_dir: PathBuf::from("static"),
            },
        };
        Self::from_parts(config, Stores::in_memory()).expect("fake state")
    }
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

impl FromRef<AppState> for Credentials {
    fn from_ref(state: &AppState) -> Self {
        state.credentials.clone()
    }
}

impl FromRef<AppState> for SharedStore<Workout> {
    fn from_ref(state: &AppState) -> Self {
        state.workouts.clone()
    }
}

impl FromRef<AppState> for SharedStore<Meal> {
    fn from_ref(state: &AppState) -> Self {
        state.meals.clone()
    }
}

impl FromRef<AppState> for SharedStore<WeightEntry> {
    fn from_ref(state: &AppState) -> Self {
        state.weights.clone()
    }
}
