// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Pipeline caches: remembered pipeline signatures that skip revalidation.

use super::descriptor::PipelineDescriptor;
use crate::impl_backend_object;
use crate::renderer::api::core::{BackendBinding, ObjectCore};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

struct PipelineCacheInner {
    core: ObjectCore,
    signatures: Mutex<BTreeSet<String>>,
    hits: AtomicU64,
}

/// A reference-counted handle to a pipeline cache.
#[derive(Clone)]
pub struct PipelineCache {
    inner: Arc<PipelineCacheInner>,
}

impl PipelineCache {
    /// Creates a cache, restoring signatures from a blob returned by [`PipelineCache::blob`].
    ///
    /// A blob that does not parse is ignored and the cache starts empty.
    pub fn new(binding: BackendBinding, initial_blob: &[u8]) -> Self {
        let signatures = if initial_blob.is_empty() {
            BTreeSet::new()
        } else {
            serde_json::from_slice::<BTreeSet<String>>(initial_blob).unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable pipeline cache blob: {e}");
                BTreeSet::new()
            })
        };
        Self {
            inner: Arc::new(PipelineCacheInner {
                core: ObjectCore::new(binding, None),
                signatures: Mutex::new(signatures),
                hits: AtomicU64::new(0),
            }),
        }
    }

    /// The signature under which a descriptor is cached.
    pub fn signature(descriptor: &PipelineDescriptor) -> String {
        format!("{descriptor:?}")
    }

    /// Looks up a signature, counting a hit when found.
    pub fn lookup(&self, signature: &str) -> bool {
        let found = self
            .inner
            .signatures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(signature);
        if found {
            self.inner.hits.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Records a signature that validated successfully.
    pub fn insert(&self, signature: String) {
        self.inner
            .signatures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(signature);
    }

    /// The number of cached signatures.
    pub fn len(&self) -> usize {
        self.inner
            .signatures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of lookups that found their signature.
    pub fn hits(&self) -> u64 {
        self.inner.hits.load(Ordering::Relaxed)
    }

    /// Serializes the cached signatures.
    pub fn blob(&self) -> Vec<u8> {
        let signatures = self
            .inner
            .signatures
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        serde_json::to_vec(&*signatures).unwrap_or_default()
    }
}

impl_backend_object!(PipelineCache);

impl fmt::Debug for PipelineCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineCache")
            .field("entries", &self.len())
            .field("hits", &self.hits())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::core::{ObjectKind, SystemId};

    fn cache(blob: &[u8]) -> PipelineCache {
        PipelineCache::new(
            BackendBinding::detached(ObjectKind::PipelineCache, 1, SystemId(1)),
            blob,
        )
    }

    #[test]
    fn test_blob_restores_signatures() {
        let first = cache(&[]);
        first.insert("a".into());
        first.insert("b".into());
        assert!(first.lookup("a"));
        assert!(!first.lookup("c"));
        assert_eq!(first.hits(), 1);

        let restored = cache(&first.blob());
        assert_eq!(restored.len(), 2);
        assert!(restored.lookup("b"));
    }

    #[test]
    fn test_garbage_blob_is_ignored() {
        assert!(cache(b"not json").is_empty());
    }
}
