//! Backing stores for published records.
//!
//! # Responsibilities
//! - Persist records under one namespace key in an external key-value store
//! - Hide the store behind a trait so tests and single-process deployments
//!   can run without the external collaborator
//!
//! # Design Decisions
//! - Records are stored as JSON, one hash field per registration id
//! - Store errors map to the registry taxonomy (Unavailable / NotFound /
//!   Corrupt); an empty namespace is an empty list, never an error

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;
use redis::AsyncCommands;

use crate::config::RegistryConfig;
use crate::registry::record::ServiceRecord;
use crate::registry::RegistryError;

/// The key-value collaborator holding published records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Store a record under its registration id.
    async fn insert(
        &self,
        registration_id: &str,
        record: &ServiceRecord,
    ) -> Result<(), RegistryError>;

    /// Remove the record stored under the registration id.
    async fn remove(&self, registration_id: &str) -> Result<(), RegistryError>;

    /// Fetch every stored record.
    async fn all(&self) -> Result<Vec<ServiceRecord>, RegistryError>;
}

/// Redis-backed store: one hash per namespace key, field = registration id,
/// value = record JSON.
pub struct RedisStore {
    client: redis::Client,
    key: String,
}

impl RedisStore {
    pub fn new(config: &RegistryConfig) -> Result<Self, RegistryError> {
        let url = format!("redis://{}:{}/", config.host, config.port);
        let client = redis::Client::open(url)
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            key: config.key.clone(),
        })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, RegistryError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| RegistryError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl RecordStore for RedisStore {
    async fn insert(
        &self,
        registration_id: &str,
        record: &ServiceRecord,
    ) -> Result<(), RegistryError> {
        let json = serde_json::to_string(record)
            .map_err(|e| RegistryError::Corrupt(e.to_string()))?;
        let mut conn = self.connection().await?;
        let _: () = conn
            .hset(&self.key, registration_id, json)
            .await
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn remove(&self, registration_id: &str) -> Result<(), RegistryError> {
        let mut conn = self.connection().await?;
        let removed: i64 = conn
            .hdel(&self.key, registration_id)
            .await
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?;
        if removed == 0 {
            return Err(RegistryError::NotFound(registration_id.to_string()));
        }
        Ok(())
    }

    async fn all(&self) -> Result<Vec<ServiceRecord>, RegistryError> {
        let mut conn = self.connection().await?;
        let entries: HashMap<String, String> = conn
            .hgetall(&self.key)
            .await
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?;
        entries
            .into_values()
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| RegistryError::Corrupt(e.to_string()))
            })
            .collect()
    }
}

/// In-process store for tests and single-process deployments.
#[derive(Default)]
pub struct MemoryStore {
    records: DashMap<String, ServiceRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(
        &self,
        registration_id: &str,
        record: &ServiceRecord,
    ) -> Result<(), RegistryError> {
        self.records
            .insert(registration_id.to_string(), record.clone());
        Ok(())
    }

    async fn remove(&self, registration_id: &str) -> Result<(), RegistryError> {
        self.records
            .remove(registration_id)
            .map(|_| ())
            .ok_or_else(|| RegistryError::NotFound(registration_id.to_string()))
    }

    async fn all(&self) -> Result<Vec<ServiceRecord>, RegistryError> {
        Ok(self.records.iter().map(|e| e.value().clone()).collect())
    }
}
