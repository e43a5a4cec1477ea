use std::sync::Arc;

use tracing::info;

use crate::application::error::AppError;
use crate::application::pagination::{
    ListFilter, ListParams, ListResult, PageWindow, Resource, Sort, paginate,
};
use crate::application::repos::{PostsRepo, RepoError, SavedPostsRepo};
use crate::application::sessions::Actor;
use crate::cache::{CacheKey, Invalidation, Invalidator, ReadThrough, Sourced};
use crate::domain::entities::SavedPostRecord;
use crate::domain::views::SavedPostView;

const ENTITY: &str = "saved post";

#[derive(Clone)]
pub struct SavedPostService {
    saved: Arc<dyn SavedPostsRepo>,
    posts: Arc<dyn PostsRepo>,
    cache: ReadThrough,
    invalidator: Invalidator,
}

impl SavedPostService {
    pub fn new(
        saved: Arc<dyn SavedPostsRepo>,
        posts: Arc<dyn PostsRepo>,
        cache: ReadThrough,
        invalidator: Invalidator,
    ) -> Self {
        Self {
            saved,
            posts,
            cache,
            invalidator,
        }
    }

    /// Bookmark `post_id` for the actor. Saving the same post twice is rejected.
    pub async fn save_post(&self, actor: Actor, post_id: i64) -> Result<SavedPostRecord, AppError> {
        let post = self
            .posts
            .find_post(post_id)
            .await?
            .ok_or(AppError::not_found("post"))?;

        if self
            .saved
            .find_saved_for(actor.user_id, post_id)
            .await?
            .is_some()
        {
            return Err(AppError::validation("post is already saved"));
        }

        let saved = match self.saved.create_saved(actor.user_id, post_id).await {
            Ok(saved) => saved,
            Err(RepoError::Duplicate { .. }) => {
                return Err(AppError::validation("post is already saved"));
            }
            Err(err) => return Err(err.into()),
        };

        self.invalidator
            .invalidate(&Invalidation::saved_post(actor.user_id, post.user_id, post_id))
            .await;

        info!(saved_id = saved.id, post_id, user_id = actor.user_id, "Post saved");
        Ok(saved)
    }

    /// Bookmarks created by `user_id`, newest first by default.
    pub async fn list_saved(
        &self,
        user_id: i64,
        params: &ListParams,
    ) -> Result<Sourced<ListResult<SavedPostView>>, AppError> {
        let window = PageWindow::from_params(Resource::SavedPost, params);
        let sort = Sort::from_params(params);
        let key = CacheKey::saved_owner(user_id, sort, &window);
        let saved = self.saved.as_ref();
        let window = &window;

        self.cache
            .fetch(&key, move || async move {
                paginate(
                    saved,
                    Resource::SavedPost,
                    ListFilter::owned_by(user_id),
                    sort,
                    window,
                )
                    .await
                    .map_err(AppError::from)
            })
            .await
    }

    pub async fn list_my_saved(
        &self,
        actor: Actor,
        params: &ListParams,
    ) -> Result<Sourced<ListResult<SavedPostView>>, AppError> {
        self.list_saved(actor.user_id, params).await
    }

    pub async fn remove_saved(&self, actor: Actor, id: i64) -> Result<(), AppError> {
        let saved = self
            .saved
            .find_saved(id)
            .await?
            .ok_or(AppError::not_found(ENTITY))?;

        if saved.user_id != actor.user_id {
            return Err(AppError::forbidden(ENTITY));
        }

        let post = self.posts.find_post(saved.post_id).await?;
        self.saved.delete_saved(id).await?;

        let invalidation = match post {
            Some(post) => Invalidation::saved_post(actor.user_id, post.user_id, post.id),
            None => Invalidation::saved_listing(actor.user_id),
        };
        self.invalidator.invalidate(&invalidation).await;

        info!(saved_id = id, user_id = actor.user_id, "Saved post removed");
        Ok(())
    }
}
