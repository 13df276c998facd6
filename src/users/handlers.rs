use axum::{
    extract::{FromRef, Multipart, Path, Query, State},
    response::{Html, IntoResponse, Response},
};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::session::{clear_session, session_cookie, SessionKeys, SessionUser};
use crate::error::AppError;
use crate::forms::{FormData, FormErrors};
use crate::render::{
    self, errors_block, escape, file_input, found, hidden_input, page, password_input, text_input,
};
use crate::state::AppState;
use crate::storage::{self, PRESIGN_TTL_SECS};
use crate::users::forms::{validate_profile, LoginForm, RegisterForm};
use crate::users::repo::{self, Profile, User};

const MAIN_PAGE: &str = "/blogs/";

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    #[serde(default)]
    pub next: Option<String>,
}

fn login_page(username: &str, next: Option<&str>, error: Option<&str>) -> Html<String> {
    let mut inner = String::new();
    if let Some(message) = error {
        inner.push_str(&format!("<p class=\"error\">{}</p>\n", escape(message)));
    }
    inner.push_str(&text_input("Username", "username", username));
    inner.push_str(&password_input("Password", "password"));
    if let Some(next) = next {
        inner.push_str(&hidden_input("next", next));
    }
    page("Log in", &render::form("/users/login/", false, &inner))
}

fn register_page(form: &RegisterForm, errors: &FormErrors) -> Html<String> {
    let mut inner = errors_block(errors);
    inner.push_str(&text_input("Username", "username", &form.username));
    inner.push_str(&password_input("Password", "password1"));
    inner.push_str(&password_input("Password confirmation", "password2"));
    inner.push_str(&text_input("First name", "first_name", &form.first_name));
    inner.push_str(&text_input("Last name", "last_name", &form.last_name));
    page("Register", &render::form("/users/register/", false, &inner))
}

fn profile_edit_page(
    profile_id: Uuid,
    first_name: &str,
    last_name: &str,
    errors: &FormErrors,
) -> Html<String> {
    let action = format!("/users/profile/{}/edit/", profile_id);
    let mut inner = errors_block(errors);
    inner.push_str(&text_input("First name", "first_name", first_name));
    inner.push_str(&text_input("Last name", "last_name", last_name));
    inner.push_str(&file_input("Avatar", "avatar", false));
    page("Edit profile", &render::form(&action, true, &inner))
}

/// Where a successful login lands: the `next` path when one was carried
/// through the form, otherwise the main page. Only relative paths are
/// honored, anything absolute falls back to the main page.
fn login_target(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => MAIN_PAGE,
    }
}

pub async fn login_form(Query(query): Query<NextQuery>) -> Html<String> {
    login_page("", query.next.as_deref(), None)
}

#[instrument(skip(state, jar, form))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let user = User::find_by_username(&state.db, form.username.trim()).await?;

    let verified = match &user {
        Some(u) => verify_password(&form.password, &u.password_hash)?,
        None => false,
    };

    if let (Some(user), true) = (user, verified) {
        let keys = SessionKeys::from_ref(&state);
        let token = keys.sign(user.id)?;
        let jar = jar.add(session_cookie(token));
        info!(user_id = %user.id, username = %user.username, "user logged in");
        return Ok((jar, found(login_target(form.next.as_deref()))).into_response());
    }

    warn!(username = %form.username, "login failed");
    Ok(login_page(
        &form.username,
        form.next.as_deref(),
        Some("Please enter a correct username and password."),
    )
    .into_response())
}

#[instrument(skip(jar))]
pub async fn logout(SessionUser(user_id): SessionUser, jar: CookieJar) -> Response {
    info!(user_id = %user_id, "user logged out");
    (clear_session(jar), found("/users/login/")).into_response()
}

pub async fn register_form() -> Html<String> {
    let form = RegisterForm {
        username: String::new(),
        password1: String::new(),
        password2: String::new(),
        first_name: String::new(),
        last_name: String::new(),
    };
    register_page(&form, &FormErrors::default())
}

#[instrument(skip(state, jar, form), fields(username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let mut errors = form.validate();
    let username = form.username.trim();

    if errors.is_empty() && User::find_by_username(&state.db, username).await?.is_some() {
        errors.add("username", "A user with that username already exists.");
    }

    if !errors.is_empty() {
        return Ok(register_page(&form, &errors).into_response());
    }

    let hash = hash_password(&form.password1)?;
    let (user, profile) = repo::register(
        &state.db,
        username,
        &hash,
        form.first_name.trim(),
        form.last_name.trim(),
    )
    .await?;

    let keys = SessionKeys::from_ref(&state);
    let token = keys.sign(user.id)?;
    let jar = jar.add(session_cookie(token));

    info!(user_id = %user.id, profile_id = %profile.id, "user registered");
    Ok((jar, found(MAIN_PAGE)).into_response())
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Html<String>, AppError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    let profile = Profile::find_by_user(&state.db, user_id)
        .await?
        .ok_or(AppError::NotFound("profile"))?;

    let mut body = format!(
        "<h1>Profile of {}</h1>\n<p>{} {}</p>\n<p>Registered: {}</p>\n",
        escape(&user.username),
        escape(&user.first_name),
        escape(&user.last_name),
        profile.registration_date
    );
    if let Some(key) = &profile.avatar_key {
        let url = state.storage.presign_get(key, PRESIGN_TTL_SECS).await?;
        body.push_str(&format!("<img src=\"{}\" alt=\"avatar\">\n", escape(&url)));
    }
    body.push_str(&format!(
        "<p><a href=\"/users/profile/{}/edit/\">Edit</a></p>",
        profile.id
    ));
    Ok(page("Profile", &body))
}

#[instrument(skip(state))]
pub async fn profile_edit_form(
    State(state): State<AppState>,
    SessionUser(_user_id): SessionUser,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let profile = Profile::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("profile"))?;
    // Name fields come from the account record, not the profile.
    let user = User::find_by_id(&state.db, profile.user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    Ok(profile_edit_page(
        profile.id,
        &user.first_name,
        &user.last_name,
        &FormErrors::default(),
    ))
}

#[instrument(skip(state, multipart))]
pub async fn profile_edit(
    State(state): State<AppState>,
    SessionUser(_user_id): SessionUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let profile = Profile::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("profile"))?;

    let form = FormData::read(multipart).await?;
    let first_name = form.text("first_name").trim().to_string();
    let last_name = form.text("last_name").trim().to_string();

    let errors = validate_profile(&first_name, &last_name);
    if !errors.is_empty() {
        return Ok(profile_edit_page(profile.id, &first_name, &last_name, &errors).into_response());
    }

    User::update_name(&state.db, profile.user_id, &first_name, &last_name).await?;

    if let Some(avatar) = form.files("avatar").next() {
        let key = storage::file_key(Uuid::new_v4(), &avatar.content_type);
        state
            .storage
            .put_object(&key, avatar.body.clone(), &avatar.content_type)
            .await?;
        if let Some(old_key) = &profile.avatar_key {
            if let Err(e) = state.storage.delete_object(old_key).await {
                warn!(error = %e, key = %old_key, "failed to delete replaced avatar");
            }
        }
        Profile::set_avatar(&state.db, profile.id, &key).await?;
        info!(profile_id = %profile.id, key = %key, "avatar replaced");
    }

    Ok(found("/users/profile/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_target_prefers_relative_next() {
        assert_eq!(login_target(Some("/blogs/create/")), "/blogs/create/");
        assert_eq!(login_target(None), MAIN_PAGE);
        assert_eq!(login_target(Some("https://evil.example/")), MAIN_PAGE);
        assert_eq!(login_target(Some("//evil.example/")), MAIN_PAGE);
    }

    #[test]
    fn login_page_keeps_next_in_hidden_field() {
        let Html(html) = login_page("alice", Some("/blogs/list/"), None);
        assert!(html.contains("name=\"next\" value=\"/blogs/list/\""));
        assert!(html.contains("name=\"username\" value=\"alice\""));
    }

    #[test]
    fn login_page_shows_generic_error() {
        let Html(html) = login_page("alice", None, Some("Please enter a correct username and password."));
        assert!(html.contains("Please enter a correct username and password."));
    }

    #[test]
    fn register_page_lists_field_errors() {
        let form = RegisterForm {
            username: String::new(),
            password1: "short".into(),
            password2: "other".into(),
            first_name: String::new(),
            last_name: String::new(),
        };
        let errors = form.validate();
        let Html(html) = register_page(&form, &errors);
        assert!(html.contains("This field is required."));
        assert!(html.contains("didn&#x27;t match"));
    }
}
