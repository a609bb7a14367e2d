//! Community reference embeddings, cached per community.

use std::sync::Arc;

use moka::sync::Cache;

use crate::hashing::fingerprint;
use crate::ids::CommunityId;

#[derive(Debug)]
struct CachedReference {
    fingerprint: [u8; 32],
    embedding: Arc<[f32]>,
}

/// Embeddings of community descriptions.
///
/// Each entry remembers the BLAKE3 fingerprint of the description it came
/// from, so a lookup with an edited description misses.
#[derive(Clone)]
pub struct ReferenceEmbeddingCache {
    entries: Cache<CommunityId, Arc<CachedReference>>,
}

impl std::fmt::Debug for ReferenceEmbeddingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceEmbeddingCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

impl ReferenceEmbeddingCache {
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// Cached embedding for `id`, if it was computed from this exact `description`.
    pub fn get(&self, id: &CommunityId, description: &str) -> Option<Arc<[f32]>> {
        let cached = self.entries.get(id)?;
        if cached.fingerprint == fingerprint(description) {
            Some(Arc::clone(&cached.embedding))
        } else {
            None
        }
    }

    pub fn insert(&self, id: CommunityId, description: &str, embedding: Vec<f32>) -> Arc<[f32]> {
        let embedding: Arc<[f32]> = embedding.into();
        self.entries.insert(
            id,
            Arc::new(CachedReference {
                fingerprint: fingerprint(description),
                embedding: Arc::clone(&embedding),
            }),
        );
        embedding
    }

    pub fn invalidate(&self, id: &CommunityId) {
        self.entries.invalidate(id);
    }

    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }

    /// Entry count after pending maintenance has run.
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_requires_same_description() {
        let cache = ReferenceEmbeddingCache::with_capacity(16);
        let id = CommunityId::new("dev");
        cache.insert(id.clone(), "code and git", vec![1.0, 0.0]);

        assert_eq!(cache.get(&id, "code and git").unwrap().as_ref(), &[1.0, 0.0]);
        assert!(cache.get(&id, "code, git and rust").is_none());
        assert!(cache.get(&CommunityId::new("games"), "code and git").is_none());
    }

    #[test]
    fn test_invalidate() {
        let cache = ReferenceEmbeddingCache::with_capacity(16);
        let id = CommunityId::new("dev");
        cache.insert(id.clone(), "code", vec![1.0]);
        assert_eq!(cache.len(), 1);

        cache.invalidate(&id);
        assert!(cache.get(&id, "code").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_reinsert_replaces_stale_entry() {
        let cache = ReferenceEmbeddingCache::with_capacity(16);
        let id = CommunityId::new("dev");
        cache.insert(id.clone(), "old", vec![1.0, 0.0]);
        cache.insert(id.clone(), "new", vec![0.0, 1.0]);

        assert!(cache.get(&id, "old").is_none());
        assert_eq!(cache.get(&id, "new").unwrap().as_ref(), &[0.0, 1.0]);
    }
}
