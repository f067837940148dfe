//! Fixtures shared by the service tests.

use crate::config::{Config, DatabaseConfig, ServerConfig};
use crate::database::{DbPool, create_pool, run_migrations};
use crate::entities::identity_entity as identities;
use crate::error::{AppError, AppResult};
use crate::external::ArtifactStore;
use crate::utils::issue_link_token;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, Set};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        links: Default::default(),
        artifacts: Default::default(),
        pagination: Default::default(),
        registration: Default::default(),
    }
}

/// In-memory SQLite with the production migrations applied.
pub async fn setup_db() -> DbPool {
    let pool = create_pool(&test_config().database).await.unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}

/// Inserts an identity row directly, bypassing code allocation.
pub async fn seed_identity(
    pool: &DbPool,
    display_name: &str,
    referral_code: &str,
    referred_by: Option<i64>,
    created_at: DateTime<Utc>,
) -> identities::Model {
    identities::ActiveModel {
        uuid: Set(Uuid::new_v4()),
        display_name: Set(display_name.to_string()),
        last_name: Set("Tester".to_string()),
        email: Set(format!("{}@example.com", referral_code.to_lowercase())),
        phone: Set(None),
        gender: Set(None),
        password_hash: Set("not-a-real-hash".to_string()),
        referral_code: Set(referral_code.to_string()),
        referred_by: Set(referred_by),
        link_token: Set(issue_link_token()),
        link_created_at: Set(created_at),
        link_expires_at: Set(None),
        link_click_count: Set(0),
        link_active: Set(true),
        artifact_ref: Set(None),
        created_at: Set(created_at),
        ..Default::default()
    }
    .insert(pool)
    .await
    .unwrap()
}

#[derive(Default)]
pub struct MemoryArtifactStore {
    pub blobs: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> AppResult<String> {
        self.blobs.lock().await.insert(key.to_string(), bytes);
        Ok(key.to_string())
    }

    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        Ok(self.blobs.lock().await.get(key).cloned())
    }
}

/// Store whose writes always fail.
pub struct BrokenArtifactStore;

#[async_trait]
impl ArtifactStore for BrokenArtifactStore {
    async fn put(&self, _key: &str, _bytes: Vec<u8>) -> AppResult<String> {
        Err(AppError::ArtifactError("disk full".to_string()))
    }

    async fn get(&self, _key: &str) -> AppResult<Option<Vec<u8>>> {
        Ok(None)
    }
}
