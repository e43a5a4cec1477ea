use std::sync::Arc;

use crate::application::error::AppError;
use crate::application::pagination::{
    ListFilter, ListParams, ListResult, PageWindow, Resource, Sort, paginate,
};
use crate::application::repos::UsersRepo;
use crate::application::sessions::Actor;
use crate::cache::Sourced;
use crate::domain::entities::UserRecord;

const ENTITY: &str = "user";

/// User directory reads. Not cached: no mutation in this service touches users.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UsersRepo>,
}

impl UserService {
    pub fn new(users: Arc<dyn UsersRepo>) -> Self {
        Self { users }
    }

    /// Users matching `search` on name or email; cursor paging may use `email`.
    pub async fn list_users(
        &self,
        params: &ListParams,
    ) -> Result<Sourced<ListResult<UserRecord>>, AppError> {
        let window = PageWindow::from_params(Resource::User, params);
        let filter = ListFilter::all().with_search(Resource::User, params.search.as_deref());

        let sort = Sort::from_params(params);

        let page = paginate(self.users.as_ref(), Resource::User, filter, sort, &window).await?;
        Ok(Sourced::loaded(page))
    }

    pub async fn get_user(&self, id: i64) -> Result<Sourced<UserRecord>, AppError> {
        self.users
            .find_user(id)
            .await?
            .map(Sourced::loaded)
            .ok_or(AppError::not_found(ENTITY))
    }

    pub async fn current_user(&self, actor: Actor) -> Result<Sourced<UserRecord>, AppError> {
        self.get_user(actor.user_id).await
    }
}
