//! Registry client: publish, unpublish, list, and scoped connections.
//!
//! # Responsibilities
//! - Assign registration ids and write records through the backing store
//! - List records for dispatch, filtered by a caller predicate
//! - Hand out pooled HTTP client handles per backend authority
//!
//! # Design Decisions
//! - `get_connection` returns an RAII handle; the lease is released on drop,
//!   so every acquisition is matched by exactly one release on every exit
//!   path, including cancellation
//! - Acquire/release totals are observable, which lets tests prove the
//!   handles balance

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use dashmap::DashMap;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use uuid::Uuid;

use crate::registry::record::ServiceRecord;
use crate::registry::store::RecordStore;
use crate::registry::RegistryError;

#[derive(Default)]
struct LeaseCounters {
    acquired: AtomicU64,
    released: AtomicU64,
}

struct PooledEndpoint {
    client: Client<HttpConnector, Body>,
    leases: AtomicUsize,
}

/// Client over the shared service registry.
pub struct RegistryClient {
    store: Arc<dyn RecordStore>,
    endpoints: DashMap<String, Arc<PooledEndpoint>>,
    counters: Arc<LeaseCounters>,
}

impl RegistryClient {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            endpoints: DashMap::new(),
            counters: Arc::new(LeaseCounters::default()),
        }
    }

    /// Publish a record; on success it becomes visible to `list`.
    pub async fn publish(&self, mut record: ServiceRecord) -> Result<String, RegistryError> {
        let registration_id = Uuid::new_v4().to_string();
        record.registration_id = Some(registration_id.clone());
        self.store.insert(&registration_id, &record).await?;
        tracing::info!(
            service = %record.name,
            api_name = %record.metadata.api_name,
            registration_id = %registration_id,
            "Service published"
        );
        Ok(registration_id)
    }

    /// Remove the record published under `registration_id`.
    pub async fn unpublish(&self, registration_id: &str) -> Result<(), RegistryError> {
        self.store.remove(registration_id).await?;
        tracing::info!(registration_id = %registration_id, "Service unpublished");
        Ok(())
    }

    /// List stored records matching the predicate. An empty result is not
    /// an error.
    pub async fn list<F>(&self, predicate: F) -> Result<Vec<ServiceRecord>, RegistryError>
    where
        F: Fn(&ServiceRecord) -> bool,
    {
        let records = self.store.all().await?;
        Ok(records.into_iter().filter(|r| predicate(r)).collect())
    }

    /// Acquire a pooled connection handle for the record's authority.
    pub fn get_connection(&self, record: &ServiceRecord) -> ConnectionHandle {
        let endpoint = {
            let entry = self
                .endpoints
                .entry(record.authority())
                .or_insert_with(|| {
                    Arc::new(PooledEndpoint {
                        client: Client::builder(TokioExecutor::new()).build(HttpConnector::new()),
                        leases: AtomicUsize::new(0),
                    })
                });
            Arc::clone(entry.value())
        };
        endpoint.leases.fetch_add(1, Ordering::Relaxed);
        self.counters.acquired.fetch_add(1, Ordering::Relaxed);
        ConnectionHandle {
            endpoint,
            record: record.clone(),
            counters: Arc::clone(&self.counters),
        }
    }

    /// Total handles ever acquired.
    pub fn acquired_handles(&self) -> u64 {
        self.counters.acquired.load(Ordering::Relaxed)
    }

    /// Total handles released back.
    pub fn released_handles(&self) -> u64 {
        self.counters.released.load(Ordering::Relaxed)
    }

    /// Outstanding leases for one backend authority.
    pub fn active_leases(&self, authority: &str) -> usize {
        self.endpoints
            .get(authority)
            .map(|e| e.leases.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}

/// Scoped lease on a backend's pooled HTTP client.
pub struct ConnectionHandle {
    endpoint: Arc<PooledEndpoint>,
    record: ServiceRecord,
    counters: Arc<LeaseCounters>,
}

impl ConnectionHandle {
    pub fn client(&self) -> &Client<HttpConnector, Body> {
        &self.endpoint.client
    }

    pub fn record(&self) -> &ServiceRecord {
        &self.record
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.endpoint.leases.fetch_sub(1, Ordering::Relaxed);
        self.counters.released.fetch_add(1, Ordering::Relaxed);
    }
}
