use crate::auth::{Identity, Role};
use crate::config::AppConfig;
use crate::models::movie::MovieMeta;
use crate::staging::store::UploadStore;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub movies: Arc<DashMap<Uuid, MovieMeta>>,
    pub tokens: Arc<DashMap<String, Identity>>,
    pub store: Arc<UploadStore>,
    pub config: Arc<AppConfig>,
    pub start_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let tokens = DashMap::new();
        tokens.insert(
            config.admin_token.clone(),
            Identity {
                name: "admin".to_string(),
                role: Role::Admin,
            },
        );
        for (i, token) in config.member_tokens.iter().enumerate() {
            tokens.insert(
                token.clone(),
                Identity {
                    name: format!("member-{}", i + 1),
                    role: Role::Member,
                },
            );
        }

        let store = UploadStore::new(config.uploads_root());

        Self {
            movies: Arc::new(DashMap::new()),
            tokens: Arc::new(tokens),
            store: Arc::new(store),
            config: Arc::new(config),
            start_time: chrono::Utc::now(),
        }
    }
}
