//! In-memory cache of generated plans.
//!
//! Identical requests (same model, description, answers and rule-based
//! result) reuse the earlier plan instead of paying for another call.

use moka::future::Cache;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use feasibility_core::{Answers, AssessmentResult};

/// Cache key for one plan request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlanKey(u64);

impl PlanKey {
    pub fn new(
        model: &str,
        description: &str,
        answers: &Answers,
        result: &AssessmentResult,
    ) -> Self {
        let mut hasher = DefaultHasher::new();
        model.hash(&mut hasher);
        description.trim().hash(&mut hasher);
        for (question_id, value) in answers.iter() {
            question_id.hash(&mut hasher);
            value.hash(&mut hasher);
        }
        // Result fields hold JSON values, so hash their serialized form
        serde_json::to_string(result)
            .unwrap_or_default()
            .hash(&mut hasher);
        Self(hasher.finish())
    }
}

/// Plan cache using moka.
pub struct PlanCache {
    cache: Cache<PlanKey, String>,
}

impl PlanCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub async fn get(&self, key: &PlanKey) -> Option<String> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: PlanKey, plan: String) {
        self.cache.insert(key, plan).await;
    }
}

impl Default for PlanCache {
    fn default() -> Self {
        Self::new(128, Duration::from_secs(3600))
    }
}
