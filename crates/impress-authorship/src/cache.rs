//! Run-scoped institution id cache
//!
//! Read-through over an [`InstitutionDirectory`]. Keys are cleaned
//! institution names. A name the directory cannot resolve is cached as
//! `None` so it is not looked up again; a lookup that fails after
//! retries is not cached at all.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::InstitutionId;
use crate::error::Capability;
use crate::normalization::clean_institution_name;
use crate::retry::RetryPolicy;
use crate::sources::InstitutionDirectory;

pub struct InstitutionCache {
    directory: Arc<dyn InstitutionDirectory>,
    retry: RetryPolicy,
    entries: RwLock<HashMap<String, Option<InstitutionId>>>,
}

impl InstitutionCache {
    pub fn new(directory: Arc<dyn InstitutionDirectory>, retry: RetryPolicy) -> Self {
        Self {
            directory,
            retry,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve an institution name to an id, populating the cache on miss.
    ///
    /// Returns `None` when the name is blank, unknown to the directory,
    /// or the directory stayed unavailable.
    pub async fn resolve(&self, name: &str) -> Option<InstitutionId> {
        let key = clean_institution_name(name);
        if key.is_empty() {
            return None;
        }

        if let Some(cached) = self.entries.read().await.get(&key) {
            return cached.clone();
        }

        let lookup = self
            .retry
            .run("resolve_institution", || self.directory.resolve_institution(&key))
            .await;

        match lookup {
            Ok(id) => {
                if id.is_none() {
                    tracing::debug!(institution = %key, "Institution needs manual resolution");
                }
                // Concurrent misses resolve to the same id; last write wins
                self.entries.write().await.insert(key, id.clone());
                id
            }
            Err(err) => {
                tracing::warn!(
                    capability = %Capability::InstitutionDirectory,
                    institution = %key,
                    error = %err,
                    "Institution lookup failed, continuing without institution"
                );
                None
            }
        }
    }

    /// Cached value for a name, if any lookup completed for it
    pub async fn cached(&self, name: &str) -> Option<Option<InstitutionId>> {
        let key = clean_institution_name(name);
        self.entries.read().await.get(&key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
