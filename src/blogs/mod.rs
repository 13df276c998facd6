use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub mod files;
mod forms;
pub mod handlers;
pub mod import;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::main_page))
        .route(
            "/create/",
            get(handlers::blog_create_form).post(handlers::blog_create),
        )
        .route("/list/", get(handlers::blog_list))
        .route(
            "/edit/:id/",
            get(handlers::blog_edit_form).post(handlers::blog_edit),
        )
        .route("/detail/:id/", get(handlers::blog_detail))
        .route(
            "/detail/:id/upload/",
            get(handlers::upload_form).post(handlers::upload),
        )
        .route(
            "/entry/:id/create/",
            get(handlers::entry_create_form).post(handlers::entry_create),
        )
        .route("/entry/:id/", get(handlers::entry_detail))
        .route(
            "/entry/:id/edit/",
            get(handlers::entry_edit_form).post(handlers::entry_edit),
        )
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024))
}
