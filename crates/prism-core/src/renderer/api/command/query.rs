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

//! Query heaps for timestamps, occlusion and elapsed time.

use crate::impl_backend_object;
use crate::renderer::api::core::{BackendBinding, ObjectCore};
use std::fmt;
use std::ops::Range;
use std::sync::{Arc, Mutex, PoisonError};

/// An opaque, backend-assigned query heap ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryHeapId(pub usize);

/// What a query measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueryType {
    /// A timestamp in nanoseconds, written at `end_query`.
    #[default]
    Timestamp,
    /// The number of samples that passed the depth test.
    Occlusion,
    /// Nanoseconds between `begin_query` and `end_query`.
    TimeElapsed,
}

/// A descriptor used to create a [`QueryHeap`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryHeapDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// The query type.
    pub ty: QueryType,
    /// The number of queries. Must be non-zero.
    pub num_queries: u32,
}

impl Default for QueryHeapDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            ty: QueryType::Timestamp,
            num_queries: 1,
        }
    }
}

struct QueryHeapInner {
    core: ObjectCore,
    descriptor: QueryHeapDescriptor,
    results: Mutex<Vec<Option<u64>>>,
}

/// A reference-counted handle to a heap of queries.
#[derive(Clone)]
pub struct QueryHeap {
    inner: Arc<QueryHeapInner>,
}

impl QueryHeap {
    /// Creates a heap with no available results. Called by backends.
    pub fn new(binding: BackendBinding, descriptor: QueryHeapDescriptor) -> Self {
        let name = descriptor.label.clone();
        let results = vec![None; descriptor.num_queries as usize];
        Self {
            inner: Arc::new(QueryHeapInner {
                core: ObjectCore::new(binding, name),
                descriptor,
                results: Mutex::new(results),
            }),
        }
    }

    /// The backend-assigned ID.
    pub fn id(&self) -> QueryHeapId {
        QueryHeapId(self.inner.core.binding().id())
    }

    /// The descriptor the heap was created with.
    pub fn descriptor(&self) -> &QueryHeapDescriptor {
        &self.inner.descriptor
    }

    /// The query type.
    pub fn ty(&self) -> QueryType {
        self.inner.descriptor.ty
    }

    /// The number of queries.
    pub fn num_queries(&self) -> u32 {
        self.inner.descriptor.num_queries
    }

    /// Invalidates results in `range`. Called by backends when a query begins.
    pub fn reset(&self, range: Range<u32>) {
        let mut results = self.lock();
        let end = (range.end as usize).min(results.len());
        let start = (range.start as usize).min(end);
        results[start..end].fill(None);
    }

    /// Stores the result of query `index`. Called by backends on completion.
    pub fn store(&self, index: u32, value: u64) {
        if let Some(slot) = self.lock().get_mut(index as usize) {
            *slot = Some(value);
        }
    }

    /// Copies results starting at `first` into `out`.
    ///
    /// Returns `false`, leaving `out` untouched, unless every requested result
    /// is available.
    pub fn read(&self, first: u32, out: &mut [u64]) -> bool {
        let results = self.lock();
        let start = first as usize;
        let Some(slice) = results.get(start..start + out.len()) else {
            return false;
        };
        if slice.iter().any(Option::is_none) {
            return false;
        }
        for (dst, src) in out.iter_mut().zip(slice) {
            *dst = src.unwrap_or_default();
        }
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Option<u64>>> {
        self.inner
            .results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl_backend_object!(QueryHeap);

impl fmt::Debug for QueryHeap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryHeap")
            .field("id", &self.id())
            .field("ty", &self.ty())
            .field("num_queries", &self.num_queries())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::core::{ObjectKind, SystemId};

    #[test]
    fn test_results_become_available() {
        let heap = QueryHeap::new(
            BackendBinding::detached(ObjectKind::QueryHeap, 1, SystemId(1)),
            QueryHeapDescriptor {
                ty: QueryType::Occlusion,
                num_queries: 2,
                ..Default::default()
            },
        );
        let mut out = [0u64; 2];
        assert!(!heap.read(0, &mut out));
        heap.store(0, 10);
        assert!(!heap.read(0, &mut out));
        heap.store(1, 20);
        assert!(heap.read(0, &mut out));
        assert_eq!(out, [10, 20]);
        assert!(!heap.read(1, &mut out));
        heap.reset(0..1);
        assert!(!heap.read(0, &mut out[..1]));
    }
}
