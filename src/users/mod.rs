use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

mod forms;
pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login/", get(handlers::login_form).post(handlers::login))
        .route("/logout/", get(handlers::logout))
        .route(
            "/register/",
            get(handlers::register_form).post(handlers::register),
        )
        .route("/profile/", get(handlers::profile))
        .route(
            "/profile/:id/edit/",
            get(handlers::profile_edit_form).post(handlers::profile_edit),
        )
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024))
}
