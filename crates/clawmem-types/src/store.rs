//! The storage collaborator seam.
//!
//! The capture pipeline, the lifecycle hooks and the direct actions only ever
//! talk to storage through [`ObservationStore`].  The production
//! implementation is the HTTP worker client in `clawmem-client`; tests use
//! in-memory fakes.

use async_trait::async_trait;

use crate::{MemError, MemoryStats, Observation, ObservationDraft};

/// A remote service that persists and searches observations.
///
/// # Contract
///
/// * `health` – liveness probe; never fails, an unreachable worker is `false`.
/// * `search` – most relevant first, at most `limit` results.
/// * `store` – must make sure the owning session exists before writing.
/// * `get` – `Ok(None)` when the id is unknown.
/// * `delete` – [`MemError::NotFound`] when the id is unknown.
#[async_trait]
pub trait ObservationStore: Send + Sync {
    async fn health(&self) -> bool;

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Observation>, MemError>;

    async fn store(&self, draft: ObservationDraft) -> Result<Observation, MemError>;

    async fn get(&self, id: i64) -> Result<Option<Observation>, MemError>;

    async fn delete(&self, id: i64) -> Result<(), MemError>;

    async fn stats(&self) -> Result<MemoryStats, MemError>;
}
