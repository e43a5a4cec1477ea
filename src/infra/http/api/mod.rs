pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post, put},
};

/// Routes under `/api`. Post reads are public; everything else needs a session.
pub fn build_api_router(state: ApiState) -> Router<ApiState> {
    let public = Router::new()
        .route("/api/post/posts", get(handlers::list_posts))
        .route("/api/post/posts/{id}", get(handlers::get_post))
        .route(
            "/api/post/posts/user/{user_id}",
            get(handlers::list_user_posts),
        );

    let protected = Router::new()
        .route("/api/post/posts", post(handlers::create_post))
        .route(
            "/api/post/posts/{id}",
            put(handlers::update_post).delete(handlers::delete_post),
        )
        .route("/api/post/my-posts", get(handlers::list_my_posts))
        .route("/api/post/my-posts/stats", get(handlers::my_post_stats))
        .route("/api/savedPosts", post(handlers::save_post))
        .route(
            "/api/savedPosts/user/{user_id}",
            get(handlers::list_user_saved),
        )
        .route("/api/savedPosts/my-posts", get(handlers::list_my_saved))
        .route("/api/savedPosts/{id}", delete(handlers::remove_saved))
        .route("/api/user/me", get(handlers::current_user))
        .route("/api/user/users", get(handlers::list_users))
        .route("/api/user/users/{id}", get(handlers::get_user))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_session,
        ));

    public.merge(protected)
}
