use std::sync::Arc;

use tracing::info;

use crate::application::error::AppError;
use crate::application::pagination::{
    ListFilter, ListParams, ListResult, PageWindow, Resource, Sort, paginate,
};
use crate::application::repos::{CreatePostParams, PostsRepo, PostsWriteRepo, UpdatePostParams};
use crate::application::sessions::Actor;
use crate::cache::{CacheKey, Invalidation, Invalidator, ReadThrough, Sourced};
use crate::domain::entities::PostRecord;
use crate::domain::error::normalize_captions;
use crate::domain::views::{PostStats, PostView};

const ENTITY: &str = "post";

#[derive(Clone)]
pub struct PostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    cache: ReadThrough,
    invalidator: Invalidator,
}

impl PostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        cache: ReadThrough,
        invalidator: Invalidator,
    ) -> Self {
        Self {
            reader,
            writer,
            cache,
            invalidator,
        }
    }

    /// All posts, newest first unless `sortBy`/`order` say otherwise, optionally filtered by caption search.
    pub async fn list_posts(
        &self,
        params: &ListParams,
    ) -> Result<Sourced<ListResult<PostView>>, AppError> {
        let search = params.search.as_deref();
        let window = PageWindow::from_params(Resource::Post, params);
        let sort = Sort::from_params(params);
        let key = CacheKey::post_search(search, sort, &window);
        let filter = ListFilter::all().with_search(Resource::Post, search);

        self.list(&key, filter, sort, &window).await
    }

    /// Posts owned by `user_id`. Search terms are not applied to owner listings.
    pub async fn list_user_posts(
        &self,
        user_id: i64,
        params: &ListParams,
    ) -> Result<Sourced<ListResult<PostView>>, AppError> {
        let window = PageWindow::from_params(Resource::Post, params);
        let sort = Sort::from_params(params);
        let key = CacheKey::post_owner(user_id, sort, &window);

        self.list(&key, ListFilter::owned_by(user_id), sort, &window)
            .await
    }

    pub async fn list_my_posts(
        &self,
        actor: Actor,
        params: &ListParams,
    ) -> Result<Sourced<ListResult<PostView>>, AppError> {
        self.list_user_posts(actor.user_id, params).await
    }

    async fn list(
        &self,
        key: &CacheKey,
        filter: ListFilter,
        sort: Sort,
        window: &PageWindow,
    ) -> Result<Sourced<ListResult<PostView>>, AppError> {
        let reader = self.reader.as_ref();
        self.cache
            .fetch(key, move || async move {
                paginate(reader, Resource::Post, filter, sort, window)
                    .await
                    .map_err(AppError::from)
            })
            .await
    }

    pub async fn get_post(&self, id: i64) -> Result<Sourced<PostView>, AppError> {
        let reader = self.reader.as_ref();
        self.cache
            .fetch_optional(&CacheKey::post(id), move || async move {
                reader.find_post_view(id).await.map_err(AppError::from)
            })
            .await?
            .ok_or(AppError::not_found(ENTITY))
    }

    /// Post count and saves received for the actor's posts.
    pub async fn stats(&self, actor: Actor) -> Result<Sourced<PostStats>, AppError> {
        let reader = self.reader.as_ref();
        self.cache
            .fetch(&CacheKey::post_stats(actor.user_id), move || async move {
                reader
                    .post_stats(actor.user_id)
                    .await
                    .map_err(AppError::from)
            })
            .await
    }

    pub async fn create_post(&self, actor: Actor, captions: &str) -> Result<PostRecord, AppError> {
        let captions = normalize_captions(captions)?;

        let post = self
            .writer
            .create_post(CreatePostParams {
                user_id: actor.user_id,
                captions,
            })
            .await?;

        self.invalidator
            .invalidate(&Invalidation::post(post.user_id, None))
            .await;

        info!(post_id = post.id, user_id = post.user_id, "Post created");
        Ok(post)
    }

    pub async fn update_post(
        &self,
        actor: Actor,
        id: i64,
        captions: &str,
    ) -> Result<PostRecord, AppError> {
        let captions = normalize_captions(captions)?;
        let existing = self.owned_post(actor, id).await?;

        let post = self
            .writer
            .update_post(UpdatePostParams { id, captions })
            .await?;

        self.invalidator
            .invalidate(&Invalidation::post(existing.user_id, Some(id)))
            .await;

        info!(post_id = id, "Post updated");
        Ok(post)
    }

    pub async fn delete_post(&self, actor: Actor, id: i64) -> Result<(), AppError> {
        let existing = self.owned_post(actor, id).await?;

        self.writer.delete_post(id).await?;

        self.invalidator
            .invalidate(&Invalidation::post(existing.user_id, Some(id)))
            .await;

        info!(post_id = id, "Post deleted");
        Ok(())
    }

    async fn owned_post(&self, actor: Actor, id: i64) -> Result<PostRecord, AppError> {
        let post = self
            .reader
            .find_post(id)
            .await?
            .ok_or(AppError::not_found(ENTITY))?;

        if post.user_id != actor.user_id {
            return Err(AppError::forbidden(ENTITY));
        }
        Ok(post)
    }
}
