//! Registration lifecycle for this gateway's own records.

use std::sync::Arc;

use dashmap::DashMap;
use futures_util::future::join_all;
use thiserror::Error;

use crate::registry::{RegistryClient, RegistryError, ServiceRecord};

/// One or more self-registered records could not be unpublished.
#[derive(Debug, Error)]
#[error("failed to unpublish {failed} of {total} registered records: {details}")]
pub struct ShutdownError {
    pub failed: usize,
    pub total: usize,
    details: String,
}

/// Tracks the records this process has published so they can be removed
/// on clean shutdown. Insertion may happen from concurrent request paths.
pub struct Registrar {
    registry: Arc<RegistryClient>,
    registered: DashMap<String, ServiceRecord>,
}

impl Registrar {
    pub fn new(registry: Arc<RegistryClient>) -> Self {
        Self {
            registry,
            registered: DashMap::new(),
        }
    }

    /// Publish this process's HTTP endpoint and remember the registration.
    pub async fn publish_http_endpoint(
        &self,
        name: &str,
        host: &str,
        port: u16,
        api_name: &str,
    ) -> Result<String, RegistryError> {
        let record = ServiceRecord::http_endpoint(name, host, port, api_name);
        let registration_id = self.registry.publish(record.clone()).await?;
        self.registered.insert(registration_id.clone(), record);
        Ok(registration_id)
    }

    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    /// Unpublish everything this process registered.
    ///
    /// Unregistrations run concurrently and all of them settle before this
    /// returns; individual failures aggregate into one error.
    pub async fn stop(&self) -> Result<(), ShutdownError> {
        let ids: Vec<String> = self.registered.iter().map(|e| e.key().clone()).collect();
        let total = ids.len();

        let results = join_all(ids.into_iter().map(|id| {
            let registry = Arc::clone(&self.registry);
            async move {
                let result = registry.unpublish(&id).await;
                (id, result)
            }
        }))
        .await;

        let mut failures = Vec::new();
        for (id, result) in results {
            match result {
                Ok(()) => {
                    self.registered.remove(&id);
                }
                // already removed elsewhere; the shutdown goal is met
                Err(RegistryError::NotFound(_)) => {
                    self.registered.remove(&id);
                }
                Err(err) => failures.push(format!("[{}]: {}", id, err)),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ShutdownError {
                failed: failures.len(),
                total,
                details: failures.join(", "),
            })
        }
    }
}
