use std::sync::Arc;

use crate::application::posts::PostService;
use crate::application::repos::HealthRepo;
use crate::application::saved_posts::SavedPostService;
use crate::application::sessions::SessionService;
use crate::application::users::UserService;
use crate::infra::cache::CacheBinding;

#[derive(Clone)]
pub struct ApiState {
    pub posts: Arc<PostService>,
    pub saved_posts: Arc<SavedPostService>,
    pub users: Arc<UserService>,
    pub sessions: Arc<SessionService>,
    pub database: Arc<dyn HealthRepo>,
    pub cache: CacheBinding,
}
