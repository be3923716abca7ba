//! Cache storage: path-keyed response entries with LRU eviction.

use std::num::NonZeroUsize;
use std::sync::RwLock;

use axum::body::Bytes;
use lru::LruCache;

use super::lock::{rw_read, rw_write};
use super::registry::{self, Resource};

const SOURCE: &str = "cache::store";

/// A cached 200 response body.
#[derive(Clone)]
pub struct CachedResponse {
    pub content_type: String,
    pub body: Bytes,
}

/// In-memory response cache keyed by request path (+ query string).
///
/// Distinct query strings occupy distinct entries, so paginated and
/// filtered listings never collide. Invalidation is strong within the
/// process: once an invalidating call returns, a subsequent `get` for an
/// affected key misses.
pub struct ResponseCache {
    entries: RwLock<LruCache<String, CachedResponse>>,
}

impl ResponseCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .unwrap_or_else(|| NonZeroUsize::new(1024).expect("nonzero default"));
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, key: &str) -> Option<CachedResponse> {
        rw_write(&self.entries, SOURCE, "get").get(key).cloned()
    }

    pub fn set(&self, key: String, response: CachedResponse) {
        rw_write(&self.entries, SOURCE, "set").put(key, response);
    }

    /// Remove a single entry (exact key, including any query string).
    pub fn invalidate(&self, key: &str) {
        rw_write(&self.entries, SOURCE, "invalidate").pop(key);
    }

    /// Remove every entry whose key starts with `prefix`.
    ///
    /// Targeting a collection prefix evicts the bare listing key, all of
    /// its query-string variants and all detail keys under the same path.
    pub fn invalidate_prefix(&self, prefix: &str) {
        let mut entries = rw_write(&self.entries, SOURCE, "invalidate_prefix");
        let stale: Vec<String> = entries
            .iter()
            .map(|(key, _)| key)
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        for key in stale {
            entries.pop(&key);
        }
    }

    /// Drop the whole cache. Used where the dependency set is too large to
    /// enumerate precisely (chapter mutations).
    pub fn invalidate_all(&self) {
        rw_write(&self.entries, SOURCE, "invalidate_all").clear();
    }

    /// Invalidate every key affected by a mutation on `resource`, per the
    /// declarative dependency table. Single entry point for all mutating
    /// handlers.
    pub fn invalidate_resource(&self, resource: Resource) {
        if registry::flushes_everything(resource) {
            tracing::debug!(resource = ?resource, "flushing entire response cache");
            self.invalidate_all();
            return;
        }
        for prefix in registry::dependent_prefixes(resource) {
            self.invalidate_prefix(prefix);
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(body: &str) -> CachedResponse {
        CachedResponse {
            content_type: "application/json".to_string(),
            body: Bytes::from(body.to_string()),
        }
    }

    #[test]
    fn roundtrip_and_exact_invalidation() {
        let cache = ResponseCache::new(16);

        assert!(cache.get("/api/quizzes").is_none());

        cache.set("/api/quizzes".to_string(), entry("[]"));
        let hit = cache.get("/api/quizzes").expect("cached");
        assert_eq!(hit.body, Bytes::from("[]"));

        cache.invalidate("/api/quizzes");
        assert!(cache.get("/api/quizzes").is_none());
    }

    #[test]
    fn query_strings_occupy_distinct_entries() {
        let cache = ResponseCache::new(16);

        cache.set("/api/chapters?page=1".to_string(), entry("page1"));
        cache.set("/api/chapters?page=2".to_string(), entry("page2"));

        // Evicting one page must not touch the other.
        cache.invalidate("/api/chapters?page=1");
        assert!(cache.get("/api/chapters?page=1").is_none());
        assert_eq!(
            cache.get("/api/chapters?page=2").expect("still cached").body,
            Bytes::from("page2")
        );
    }

    #[test]
    fn prefix_invalidation_targets_the_whole_collection() {
        let cache = ResponseCache::new(16);

        cache.set("/api/chapters?page=1".to_string(), entry("page1"));
        cache.set("/api/chapters?page=2".to_string(), entry("page2"));
        cache.set("/api/chapters/7".to_string(), entry("detail"));
        cache.set("/api/subjects".to_string(), entry("subjects"));

        cache.invalidate_prefix("/api/chapters");

        assert!(cache.get("/api/chapters?page=1").is_none());
        assert!(cache.get("/api/chapters?page=2").is_none());
        assert!(cache.get("/api/chapters/7").is_none());
        assert!(cache.get("/api/subjects").is_some());
    }

    #[test]
    fn resource_invalidation_covers_aggregates() {
        let cache = ResponseCache::new(16);

        cache.set("/api/quizzes".to_string(), entry("quizzes"));
        cache.set("/api/dashboard/stats".to_string(), entry("stats"));
        cache.set("/api/classes".to_string(), entry("classes"));

        cache.invalidate_resource(Resource::Quizzes);

        assert!(cache.get("/api/quizzes").is_none());
        assert!(cache.get("/api/dashboard/stats").is_none());
        // Unrelated listings survive a quiz mutation.
        assert!(cache.get("/api/classes").is_some());
    }

    #[test]
    fn question_mutations_evict_embedded_quiz_views() {
        let cache = ResponseCache::new(16);

        // The quiz-by-chapter view embeds the category's question set.
        cache.set("/api/quizzes/chapter/5".to_string(), entry("quiz+questions"));
        cache.set("/api/questions?page=1".to_string(), entry("questions"));
        cache.set("/api/categories".to_string(), entry("categories"));

        cache.invalidate_resource(Resource::Questions);

        assert!(cache.get("/api/quizzes/chapter/5").is_none());
        assert!(cache.get("/api/questions?page=1").is_none());
        assert!(cache.get("/api/categories").is_some());
    }

    #[test]
    fn category_mutations_evict_cascaded_collections() {
        let cache = ResponseCache::new(16);

        // categories -> quizzes and categories -> questions cascade on
        // delete, so their listings cannot survive a category mutation.
        cache.set("/api/quizzes".to_string(), entry("quizzes"));
        cache.set("/api/questions".to_string(), entry("questions"));
        cache.set("/api/classes".to_string(), entry("classes"));

        cache.invalidate_resource(Resource::Categories);

        assert!(cache.get("/api/quizzes").is_none());
        assert!(cache.get("/api/questions").is_none());
        assert!(cache.get("/api/classes").is_some());
    }

    #[test]
    fn class_mutations_evict_views_joining_class_names() {
        let cache = ResponseCache::new(16);

        // User listings and the new-users panel join the class name in.
        cache.set("/api/auth/users?page=1".to_string(), entry("users"));
        cache.set("/api/dashboard/new-users".to_string(), entry("new"));
        cache.set("/api/subjects".to_string(), entry("subjects"));
        cache.set("/api/auth/admins".to_string(), entry("admins"));

        cache.invalidate_resource(Resource::Classes);

        assert!(cache.get("/api/auth/users?page=1").is_none());
        assert!(cache.get("/api/dashboard/new-users").is_none());
        assert!(cache.get("/api/subjects").is_none());
        assert!(cache.get("/api/auth/admins").is_some());
    }

    #[test]
    fn chapter_mutations_flush_everything() {
        let cache = ResponseCache::new(16);

        cache.set("/api/subjects".to_string(), entry("subjects"));
        cache.set("/api/quizzes".to_string(), entry("quizzes"));

        cache.invalidate_resource(Resource::Chapters);

        assert!(cache.is_empty());
    }

    #[test]
    fn capacity_is_bounded() {
        let cache = ResponseCache::new(2);

        cache.set("/a".to_string(), entry("a"));
        cache.set("/b".to_string(), entry("b"));
        cache.set("/c".to_string(), entry("c"));

        // LRU: "/a" was the oldest entry.
        assert!(cache.get("/a").is_none());
        assert!(cache.get("/b").is_some());
        assert!(cache.get("/c").is_some());
    }
}
