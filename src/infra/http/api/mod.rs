pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use state::{ApiState, Repositories};

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};

pub fn build_api_router(state: ApiState) -> Router {
    let auth_state = state.clone();

    Router::new()
        .route("/api/v1/auth/register", post(handlers::register))
        .route("/api/v1/auth/login", post(handlers::login))
        .route("/api/v1/auth/me", get(handlers::me))
        .route("/api/v1/auth/logout", post(handlers::logout))
        .route(
            "/api/v1/auth/upload-verification-file",
            post(handlers::upload_verification_file),
        )
        .route(
            "/api/forums",
            get(handlers::list_forums).post(handlers::create_forum),
        )
        .route("/api/forums/upload-image", post(handlers::upload_forum_image))
        .route(
            "/api/forums/{id}",
            get(handlers::get_forum)
                .put(handlers::update_forum)
                .delete(handlers::delete_forum),
        )
        .route(
            "/api/forums/{id}/comments",
            get(handlers::list_comments).post(handlers::create_comment),
        )
        .route(
            "/api/forums/comments/{comment_id}",
            put(handlers::update_comment).delete(handlers::delete_comment),
        )
        .route("/api/forums/{id}/like", post(handlers::toggle_like))
        .route("/api/forums/{id}/likes", get(handlers::list_likes))
        .route(
            "/api/jobs",
            get(handlers::list_jobs).post(handlers::create_job),
        )
        .route("/api/jobs/upload-image", post(handlers::upload_job_image))
        .route(
            "/api/jobs/{id}",
            get(handlers::get_job)
                .put(handlers::update_job)
                .delete(handlers::delete_job),
        )
        .route(
            "/api/news",
            get(handlers::list_news).post(handlers::create_news),
        )
        .route("/api/news/upload-image", post(handlers::upload_news_image))
        .route(
            "/api/news/{id}",
            get(handlers::get_news)
                .put(handlers::update_news)
                .delete(handlers::delete_news),
        )
        .route(
            "/api/products",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            "/api/products/upload-image",
            post(handlers::upload_product_image),
        )
        .route(
            "/api/products/{id}",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route(
            "/api/collaborations",
            get(handlers::list_collaborations).post(handlers::create_collaboration),
        )
        .route(
            "/api/collaborations/upload-image",
            post(handlers::upload_collaboration_image),
        )
        .route(
            "/api/collaborations/{id}",
            get(handlers::get_collaboration)
                .put(handlers::update_collaboration)
                .delete(handlers::delete_collaboration),
        )
        .route(
            "/api/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/api/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/api/reference/roles", get(handlers::list_roles))
        .route("/api/reference/provinces", get(handlers::list_provinces))
        .route(
            "/api/reference/provinces/{id}/cities",
            get(handlers::list_cities),
        )
        .route("/api/reference/faculties", get(handlers::list_faculties))
        .route(
            "/api/reference/faculties/{id}/majors",
            get(handlers::list_majors),
        )
        .route("/api/reference/job-fields", get(handlers::list_job_fields))
        .route(
            "/api/reference/collaboration-fields",
            get(handlers::list_collaboration_fields),
        )
        .layer(axum_middleware::from_fn_with_state(
            auth_state,
            middleware::resolve_principal,
        ))
        .with_state(state)
}
