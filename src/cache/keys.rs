//! Cache key definitions.
//!
//! Keys are `:`-separated segments. The leading segments name the family,
//! the rest describe the request. Free text is base64 encoded so user input
//! can never produce a separator or a glob metacharacter.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::application::pagination::{CursorValue, PageWindow, Sort};

const SEPARATOR: &str = ":";
const WILDCARD: &str = "*";
const SEARCH_ALL: &str = "all";

/// The five cache families kept coherent by the invalidation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    /// Namespace-wide post listings, optionally filtered by search.
    PostSearch,
    /// Post listings scoped to one owner.
    PostOwner,
    /// A single post by id.
    PostEntity,
    /// Saved-post listings scoped to the saving user.
    SavedPostOwner,
    /// Per-owner post and save counts.
    PostStats,
}

impl Family {
    const fn segments(self) -> &'static [&'static str] {
        match self {
            Family::PostSearch => &["posts", "search"],
            Family::PostOwner => &["posts", "user"],
            Family::PostEntity => &["post"],
            Family::SavedPostOwner => &["savedPosts", "user"],
            Family::PostStats => &["postStats"],
        }
    }

    /// Label used on cache metrics.
    pub const fn label(self) -> &'static str {
        match self {
            Family::PostSearch => "posts_search",
            Family::PostOwner => "posts_user",
            Family::PostEntity => "post",
            Family::SavedPostOwner => "saved_posts_user",
            Family::PostStats => "post_stats",
        }
    }

    /// Pattern matching every key of the family, e.g. `posts:search:*`.
    pub fn pattern(self) -> String {
        let mut segments: Vec<&str> = self.segments().to_vec();
        segments.push(WILDCARD);
        segments.join(SEPARATOR)
    }

    /// Pattern matching every key of the family scoped to `owner_id`.
    pub fn owner_pattern(self, owner_id: i64) -> String {
        let scope = owner_segment(owner_id);
        let mut segments: Vec<&str> = self.segments().to_vec();
        segments.push(&scope);
        segments.push(WILDCARD);
        segments.join(SEPARATOR)
    }
}

/// A fully-derived cache key, rendered without the configured prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    family: Family,
    segments: Vec<String>,
}

impl CacheKey {
    fn new(family: Family, extra: impl IntoIterator<Item = String>) -> Self {
        let mut segments: Vec<String> = family
            .segments()
            .iter()
            .map(|segment| segment.to_string())
            .collect();
        segments.extend(extra);
        Self { family, segments }
    }

    fn listing(family: Family, scope: String, sort: Sort, window: &PageWindow) -> Self {
        let mut extra = vec![
            scope,
            sort.to_string(),
            window_segment(window),
            format!("l{}", window.limit()),
        ];
        if !window.counts_total() {
            extra.push("n".to_string());
        }
        Self::new(family, extra)
    }

    /// `posts:search:{term}:{sort}:{window}:{limit}`
    pub fn post_search(search: Option<&str>, sort: Sort, window: &PageWindow) -> Self {
        Self::listing(Family::PostSearch, search_segment(search), sort, window)
    }

    /// `posts:user:u{owner}:{sort}:{window}:{limit}`
    pub fn post_owner(owner_id: i64, sort: Sort, window: &PageWindow) -> Self {
        Self::listing(Family::PostOwner, owner_segment(owner_id), sort, window)
    }

    /// `savedPosts:user:u{user}:{sort}:{window}:{limit}`
    pub fn saved_owner(user_id: i64, sort: Sort, window: &PageWindow) -> Self {
        Self::listing(Family::SavedPostOwner, owner_segment(user_id), sort, window)
    }

    /// `post:{id}`
    pub fn post(id: i64) -> Self {
        Self::new(Family::PostEntity, [id.to_string()])
    }

    /// `postStats:u{owner}`
    pub fn post_stats(owner_id: i64) -> Self {
        Self::new(Family::PostStats, [owner_segment(owner_id)])
    }

    pub fn family(&self) -> Family {
        self.family
    }

    /// Key string with `prefix` prepended.
    pub fn render(&self, prefix: &str) -> String {
        format!("{prefix}{self}")
    }

    /// Keep the first `keep` segments and replace the rest with `*`.
    pub fn pattern_from(&self, keep: usize) -> String {
        let keep = keep.min(self.segments.len());
        let mut segments: Vec<&str> = self.segments[..keep].iter().map(String::as_str).collect();
        segments.push(WILDCARD);
        segments.join(SEPARATOR)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join(SEPARATOR))
    }
}

fn owner_segment(owner_id: i64) -> String {
    format!("u{owner_id}")
}

fn search_segment(search: Option<&str>) -> String {
    match search.map(str::trim).filter(|term| !term.is_empty()) {
        Some(term) => format!("q.{}", encode_text(&term.to_lowercase())),
        None => SEARCH_ALL.to_string(),
    }
}

fn window_segment(window: &PageWindow) -> String {
    match window {
        PageWindow::Offset(offset) => format!("p{}", offset.page),
        PageWindow::Cursor(cursor) => {
            let value = match &cursor.cursor {
                CursorValue::Int(value) => value.to_string(),
                CursorValue::Text(value) => format!("t{}", encode_text(value)),
            };
            format!("c.{}.{}", cursor.field.as_str(), value)
        }
    }
}

fn encode_text(text: &str) -> String {
    URL_SAFE_NO_PAD.encode(text.as_bytes())
}
