//! In-memory repositories shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};

use socialfeed::application::pagination::{
    CursorValue, Cursorable, ListFilter, ListQuery, SearchField, SortDirection, SortKey,
};
use socialfeed::application::posts::PostService;
use socialfeed::application::repos::{
    CreatePostParams, HealthRepo, ListStore, PostsRepo, PostsWriteRepo, RepoError,
    SavedPostsRepo, SessionsRepo, UpdatePostParams, UsersRepo,
};
use socialfeed::application::saved_posts::SavedPostService;
use socialfeed::application::sessions::{SessionService, hash_token};
use socialfeed::application::users::UserService;
use socialfeed::cache::{CacheConfig, CacheStore, Invalidator, ReadThrough};
use socialfeed::domain::entities::{PostRecord, SavedPostRecord, UserRecord};
use socialfeed::domain::views::{PostStats, PostView, SavedPostView, UserSummary};
use socialfeed::infra::cache::CacheBinding;
use socialfeed::infra::http::ApiState;

#[derive(Default)]
struct Tables {
    users: Vec<UserRecord>,
    posts: Vec<PostRecord>,
    saved: Vec<SavedPostRecord>,
    sessions: HashMap<Vec<u8>, i64>,
    next_id: i64,
}

impl Tables {
    fn next(&mut self) -> (i64, OffsetDateTime) {
        self.next_id += 1;
        let at =
            OffsetDateTime::UNIX_EPOCH + Duration::days(20_000) + Duration::seconds(self.next_id);
        (self.next_id, at)
    }

    fn post_view(&self, post: &PostRecord) -> Option<PostView> {
        let author = self.users.iter().find(|user| user.id == post.user_id)?;
        let saves = self.saved.iter().filter(|s| s.post_id == post.id).count();
        Some(PostView::new(
            post.clone(),
            UserSummary::from(author),
            saves as i64,
        ))
    }

    fn saved_view(&self, saved: &SavedPostRecord) -> Option<SavedPostView> {
        let post = self.posts.iter().find(|post| post.id == saved.post_id)?;
        Some(SavedPostView {
            id: saved.id,
            user_id: saved.user_id,
            post_id: saved.post_id,
            created_at: saved.created_at,
            post: self.post_view(post)?,
        })
    }
}

/// Relational store stand-in. Every listing or entity read bumps [`reads`](Self::reads).
#[derive(Default)]
pub struct MemoryRepositories {
    tables: Mutex<Tables>,
    reads: AtomicUsize,
}

impl MemoryRepositories {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn add_user(&self, name: &str, email: &str) -> UserRecord {
        let mut tables = self.tables.lock().expect("tables lock");
        let (id, at) = tables.next();
        let user = UserRecord {
            id,
            name: name.to_string(),
            email: email.to_string(),
            created_at: at,
            updated_at: at,
        };
        tables.users.push(user.clone());
        user
    }

    pub fn add_session(&self, token: &str, user_id: i64) {
        self.tables
            .lock()
            .expect("tables lock")
            .sessions
            .insert(hash_token(token), user_id);
    }

    fn touch(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }

    fn with<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        let mut tables = self.tables.lock().expect("tables lock");
        f(&mut *tables)
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Apply ordering, keyset bound and window the way the SQL adapter does.
fn window<T: Cursorable>(
    mut rows: Vec<T>,
    query: &ListQuery,
    order: impl Fn(&T) -> (OffsetDateTime, i64),
) -> Vec<T> {
    rows.sort_by(|a, b| {
        let (a_at, a_id) = order(a);
        let (b_at, b_id) = order(b);
        let ordering = match query.sort.key {
            SortKey::CreatedAt => (a_at, a_id).cmp(&(b_at, b_id)),
            SortKey::Id => a_id.cmp(&b_id),
        };
        match query.sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    if let Some(bound) = &query.after {
        match rows
            .iter()
            .position(|row| row.cursor_value(bound.field).as_ref() == Some(&bound.value))
        {
            Some(position) => {
                rows.drain(..=position);
            }
            None => rows.clear(),
        }
    }

    rows.into_iter()
        .skip(query.skip as usize)
        .take(query.take as usize)
        .collect()
}

fn post_matches(post: &PostRecord, filter: &ListFilter) -> bool {
    if filter.owner_id.is_some_and(|owner| owner != post.user_id) {
        return false;
    }
    match &filter.search {
        Some(search) => search.fields.iter().any(|field| match field {
            SearchField::Captions => contains_ci(&post.captions, &search.term),
            SearchField::Name | SearchField::Email => false,
        }),
        None => true,
    }
}

fn user_matches(user: &UserRecord, filter: &ListFilter) -> Result<bool, RepoError> {
    if filter.owner_id.is_some() {
        return Err(RepoError::InvalidInput {
            message: "users cannot be filtered by owner".to_string(),
        });
    }
    Ok(match &filter.search {
        Some(search) => search.fields.iter().any(|field| match field {
            SearchField::Name => contains_ci(&user.name, &search.term),
            SearchField::Email => contains_ci(&user.email, &search.term),
            SearchField::Captions => false,
        }),
        None => true,
    })
}

#[async_trait]
impl ListStore<PostView> for MemoryRepositories {
    async fn find_many(&self, query: &ListQuery) -> Result<Vec<PostView>, RepoError> {
        self.touch();
        let rows = self.with(|tables| {
            tables
                .posts
                .iter()
                .filter(|post| post_matches(post, &query.filter))
                .filter_map(|post| tables.post_view(post))
                .collect::<Vec<_>>()
        });
        Ok(window(rows, query, |post| (post.created_at, post.id)))
    }

    async fn count(&self, filter: &ListFilter) -> Result<u64, RepoError> {
        Ok(self.with(|tables| {
            tables
                .posts
                .iter()
                .filter(|post| post_matches(post, filter))
                .count() as u64
        }))
    }
}

#[async_trait]
impl ListStore<SavedPostView> for MemoryRepositories {
    async fn find_many(&self, query: &ListQuery) -> Result<Vec<SavedPostView>, RepoError> {
        self.touch();
        let rows = self.with(|tables| {
            tables
                .saved
                .iter()
                .filter(|saved| {
                    query
                        .filter
                        .owner_id
                        .is_none_or(|owner| owner == saved.user_id)
                })
                .filter_map(|saved| tables.saved_view(saved))
                .collect::<Vec<_>>()
        });
        Ok(window(rows, query, |saved| (saved.created_at, saved.id)))
    }

    async fn count(&self, filter: &ListFilter) -> Result<u64, RepoError> {
        Ok(self.with(|tables| {
            tables
                .saved
                .iter()
                .filter(|saved| filter.owner_id.is_none_or(|owner| owner == saved.user_id))
                .count() as u64
        }))
    }
}

#[async_trait]
impl ListStore<UserRecord> for MemoryRepositories {
    async fn find_many(&self, query: &ListQuery) -> Result<Vec<UserRecord>, RepoError> {
        self.touch();
        let mut rows = Vec::new();
        for user in self.with(|tables| tables.users.clone()) {
            if user_matches(&user, &query.filter)? {
                rows.push(user);
            }
        }
        Ok(window(rows, query, |user| (user.created_at, user.id)))
    }

    async fn count(&self, filter: &ListFilter) -> Result<u64, RepoError> {
        let mut total = 0;
        for user in self.with(|tables| tables.users.clone()) {
            if user_matches(&user, filter)? {
                total += 1;
            }
        }
        Ok(total)
    }
}

#[async_trait]
impl PostsRepo for MemoryRepositories {
    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        Ok(self.with(|tables| tables.posts.iter().find(|post| post.id == id).cloned()))
    }

    async fn find_post_view(&self, id: i64) -> Result<Option<PostView>, RepoError> {
        self.touch();
        Ok(self.with(|tables| {
            tables
                .posts
                .iter()
                .find(|post| post.id == id)
                .and_then(|post| tables.post_view(post))
        }))
    }

    async fn post_stats(&self, owner_id: i64) -> Result<PostStats, RepoError> {
        self.touch();
        Ok(self.with(|tables| {
            let owned: Vec<i64> = tables
                .posts
                .iter()
                .filter(|post| post.user_id == owner_id)
                .map(|post| post.id)
                .collect();
            let saves = tables
                .saved
                .iter()
                .filter(|saved| owned.contains(&saved.post_id))
                .count();
            PostStats {
                total_posts: owned.len() as u64,
                total_saves: saves as u64,
            }
        }))
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        Ok(self.with(|tables| {
            let (id, at) = tables.next();
            let post = PostRecord {
                id,
                captions: params.captions,
                user_id: params.user_id,
                created_at: at,
                updated_at: at,
            };
            tables.posts.push(post.clone());
            post
        }))
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        self.with(|tables| {
            let (_, at) = tables.next();
            let post = tables
                .posts
                .iter_mut()
                .find(|post| post.id == params.id)
                .ok_or(RepoError::NotFound)?;
            post.captions = params.captions;
            post.updated_at = at;
            Ok(post.clone())
        })
    }

    async fn delete_post(&self, id: i64) -> Result<(), RepoError> {
        self.with(|tables| {
            let before = tables.posts.len();
            tables.posts.retain(|post| post.id != id);
            if tables.posts.len() == before {
                return Err(RepoError::NotFound);
            }
            tables.saved.retain(|saved| saved.post_id != id);
            Ok(())
        })
    }
}

#[async_trait]
impl SavedPostsRepo for MemoryRepositories {
    async fn find_saved(&self, id: i64) -> Result<Option<SavedPostRecord>, RepoError> {
        Ok(self.with(|tables| tables.saved.iter().find(|saved| saved.id == id).cloned()))
    }

    async fn find_saved_for(
        &self,
        user_id: i64,
        post_id: i64,
    ) -> Result<Option<SavedPostRecord>, RepoError> {
        Ok(self.with(|tables| {
            tables
                .saved
                .iter()
                .find(|saved| saved.user_id == user_id && saved.post_id == post_id)
                .cloned()
        }))
    }

    async fn create_saved(
        &self,
        user_id: i64,
        post_id: i64,
    ) -> Result<SavedPostRecord, RepoError> {
        self.with(|tables| {
            if tables
                .saved
                .iter()
                .any(|saved| saved.user_id == user_id && saved.post_id == post_id)
            {
                return Err(RepoError::Duplicate {
                    constraint: "saved_posts_user_post_key".to_string(),
                });
            }
            let (id, at) = tables.next();
            let saved = SavedPostRecord {
                id,
                user_id,
                post_id,
                created_at: at,
            };
            tables.saved.push(saved.clone());
            Ok(saved)
        })
    }

    async fn delete_saved(&self, id: i64) -> Result<(), RepoError> {
        self.with(|tables| {
            let before = tables.saved.len();
            tables.saved.retain(|saved| saved.id != id);
            if tables.saved.len() == before {
                return Err(RepoError::NotFound);
            }
            Ok(())
        })
    }
}

#[async_trait]
impl UsersRepo for MemoryRepositories {
    async fn find_user(&self, id: i64) -> Result<Option<UserRecord>, RepoError> {
        Ok(self.with(|tables| tables.users.iter().find(|user| user.id == id).cloned()))
    }
}

#[async_trait]
impl SessionsRepo for MemoryRepositories {
    async fn find_session_user(&self, token_hash: &[u8]) -> Result<Option<i64>, RepoError> {
        Ok(self.with(|tables| tables.sessions.get(token_hash).copied()))
    }
}

#[async_trait]
impl HealthRepo for MemoryRepositories {
    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

/// Services wired the way `main` wires them, over in-memory repositories.
pub struct Harness {
    pub repos: Arc<MemoryRepositories>,
    pub store: Arc<dyn CacheStore>,
    pub invalidator: Invalidator,
    pub posts: Arc<PostService>,
    pub saved_posts: Arc<SavedPostService>,
    pub users: Arc<UserService>,
    pub sessions: Arc<SessionService>,
}

impl Harness {
    pub fn new(store: Arc<dyn CacheStore>, config: CacheConfig) -> Self {
        let repos = MemoryRepositories::new();
        let config = Arc::new(config);
        let read_through = ReadThrough::new(store.clone(), config.clone());
        let invalidator = Invalidator::new(store.clone(), config);

        let posts = Arc::new(PostService::new(
            repos.clone(),
            repos.clone(),
            read_through.clone(),
            invalidator.clone(),
        ));
        let saved_posts = Arc::new(SavedPostService::new(
            repos.clone(),
            repos.clone(),
            read_through,
            invalidator.clone(),
        ));
        let users = Arc::new(UserService::new(repos.clone()));
        let sessions = Arc::new(SessionService::new(repos.clone()));

        Self {
            repos,
            store,
            invalidator,
            posts,
            saved_posts,
            users,
            sessions,
        }
    }

    pub fn api_state(&self) -> ApiState {
        self.api_state_with(CacheBinding::Ready(self.store.clone()))
    }

    pub fn api_state_with(&self, cache: CacheBinding) -> ApiState {
        ApiState {
            posts: self.posts.clone(),
            saved_posts: self.saved_posts.clone(),
            users: self.users.clone(),
            sessions: self.sessions.clone(),
            database: self.repos.clone(),
            cache,
        }
    }
}

pub fn cursor_int(value: &CursorValue) -> i64 {
    match value {
        CursorValue::Int(id) => *id,
        CursorValue::Text(text) => panic!("expected integer cursor, got {text}"),
    }
}

