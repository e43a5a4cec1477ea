//! Invalidation planning.
//!
//! Turns a mutation's [`Invalidation`] tree into the flat set of patterns
//! and exact keys that may now hold stale data.

use std::collections::BTreeSet;
use std::fmt;

use super::keys::{CacheKey, Family};

/// Resource namespace touched by a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Post,
    SavedPost,
}

impl Namespace {
    pub const fn as_str(self) -> &'static str {
        match self {
            Namespace::Post => "post",
            Namespace::SavedPost => "savedPost",
        }
    }
}

/// What a mutation changed, plus the dependent namespaces it reaches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalidation {
    pub namespace: Namespace,
    /// Owner whose scoped listings and aggregates changed.
    pub owner_id: Option<i64>,
    /// Entity whose singleton changed.
    pub entity_id: Option<i64>,
    /// `false` when reached through another namespace's cascade.
    pub direct: bool,
    pub cascade: Vec<Invalidation>,
}

impl Invalidation {
    /// A post was created (`post_id` is `None`), updated or deleted.
    pub fn post(owner_id: i64, post_id: Option<i64>) -> Self {
        Self {
            namespace: Namespace::Post,
            owner_id: Some(owner_id),
            entity_id: post_id,
            direct: true,
            cascade: Vec::new(),
        }
    }

    /// `saver_id` saved or unsaved `post_id`, which belongs to `post_owner_id`.
    pub fn saved_post(saver_id: i64, post_owner_id: i64, post_id: i64) -> Self {
        let mut invalidation = Self::saved_listing(saver_id);
        invalidation
            .cascade
            .push(Self::post(post_owner_id, Some(post_id)).as_dependent());
        invalidation
    }

    /// Only the saver's listings; used when the bookmarked post is gone.
    pub fn saved_listing(saver_id: i64) -> Self {
        Self {
            namespace: Namespace::SavedPost,
            owner_id: Some(saver_id),
            entity_id: None,
            direct: true,
            cascade: Vec::new(),
        }
    }

    fn as_dependent(mut self) -> Self {
        self.direct = false;
        self
    }
}

/// Deduplicated cache work derived from one or more invalidations.
///
/// Keys and patterns are stored without the configured prefix.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InvalidationPlan {
    /// Glob patterns cleared with scan-then-delete.
    pub patterns: BTreeSet<String>,
    /// Keys deleted directly.
    pub exact_keys: BTreeSet<String>,
}

impl fmt::Display for InvalidationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InvalidationPlan {{ patterns: {}, exact_keys: {} }}",
            self.patterns.len(),
            self.exact_keys.len()
        )
    }
}

impl InvalidationPlan {
    pub fn from_invalidation(invalidation: &Invalidation) -> Self {
        let mut plan = Self::default();
        plan.add(invalidation);
        plan
    }

    /// Fold `invalidation` and its cascade into the plan.
    pub fn add(&mut self, invalidation: &Invalidation) {
        match invalidation.namespace {
            Namespace::Post => self.add_post(invalidation),
            Namespace::SavedPost => self.add_saved_post(invalidation),
        }
        for dependent in &invalidation.cascade {
            self.add(dependent);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty() && self.exact_keys.is_empty()
    }

    fn add_post(&mut self, invalidation: &Invalidation) {
        self.patterns.insert(Family::PostSearch.pattern());

        if let Some(owner_id) = invalidation.owner_id {
            self.patterns.insert(Family::PostOwner.owner_pattern(owner_id));
            self.exact_keys
                .insert(CacheKey::post_stats(owner_id).to_string());
        }

        if let Some(post_id) = invalidation.entity_id {
            self.exact_keys.insert(CacheKey::post(post_id).to_string());
            // Saved listings embed the post body; any saver may be affected.
            if invalidation.direct {
                self.patterns.insert(Family::SavedPostOwner.pattern());
            }
        }
    }

    fn add_saved_post(&mut self, invalidation: &Invalidation) {
        if let Some(saver_id) = invalidation.owner_id {
            self.patterns
                .insert(Family::SavedPostOwner.owner_pattern(saver_id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn created_post_clears_search_owner_and_stats() {
        let plan = InvalidationPlan::from_invalidation(&Invalidation::post(1, None));
        assert_eq!(plan.patterns, set(&["posts:search:*", "posts:user:u1:*"]));
        assert_eq!(plan.exact_keys, set(&["postStats:u1"]));
    }

    #[test]
    fn updated_post_also_clears_singleton_and_saved_listings() {
        let plan = InvalidationPlan::from_invalidation(&Invalidation::post(1, Some(9)));
        assert_eq!(
            plan.patterns,
            set(&["posts:search:*", "posts:user:u1:*", "savedPosts:user:*"])
        );
        assert_eq!(plan.exact_keys, set(&["post:9", "postStats:u1"]));
    }

    #[test]
    fn save_cascades_to_parent_post() {
        let plan = InvalidationPlan::from_invalidation(&Invalidation::saved_post(2, 1, 9));
        assert_eq!(
            plan.patterns,
            set(&["posts:search:*", "posts:user:u1:*", "savedPosts:user:u2:*"])
        );
        assert_eq!(plan.exact_keys, set(&["post:9", "postStats:u1"]));
    }

    #[test]
    fn merged_invalidations_are_deduplicated() {
        let mut plan = InvalidationPlan::default();
        assert!(plan.is_empty());
        plan.add(&Invalidation::post(1, None));
        plan.add(&Invalidation::post(1, None));
        plan.add(&Invalidation::saved_post(2, 1, 9));

        assert_eq!(plan.patterns.len(), 3);
        assert_eq!(plan.exact_keys.len(), 2);
        assert_eq!(plan.to_string(), "InvalidationPlan { patterns: 3, exact_keys: 2 }");
    }
}
