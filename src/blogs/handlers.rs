use axum::{
    extract::{Multipart, Path, State},
    response::{Html, IntoResponse, Response},
};
use axum::Form;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::session::SessionUser;
use crate::error::AppError;
use crate::forms::{FormData, FormErrors};
use crate::render::{self, errors_block, escape, file_input, found, page, text_input, textarea};
use crate::state::AppState;

use super::files::{attach_files, presign_all};
use super::forms::{BlogForm, EntryForm};
use super::import::{self, ImportError};
use super::repo::{Blog, Entry, EntryFile};

fn blog_form_page(title: &str, action: &str, name: &str, tags: &str, errors: &FormErrors) -> Html<String> {
    let mut inner = errors_block(errors);
    inner.push_str(&text_input("Name", "name", name));
    inner.push_str(&text_input("Tags", "tags", tags));
    page(title, &render::form(action, false, &inner))
}

fn entry_form_page(
    title: &str,
    action: &str,
    form: &EntryForm,
    errors: &FormErrors,
) -> Html<String> {
    let mut inner = errors_block(errors);
    inner.push_str(&text_input("Title", "title", &form.title));
    inner.push_str(&textarea("Body", "body_text", &form.body_text));
    inner.push_str(&file_input("Files", "file", true));
    inner.push_str(&textarea("Description", "description", &form.description));
    page(title, &render::form(action, true, &inner))
}

fn upload_form_page(blog_id: Uuid, error: Option<&str>) -> Html<String> {
    let action = format!("/blogs/detail/{}/upload/", blog_id);
    let mut inner = String::new();
    if let Some(message) = error {
        inner.push_str(&format!("<p class=\"error\">{}</p>\n", escape(message)));
    }
    inner.push_str(&file_input("Choose file", "file", false));
    page("Upload entries", &render::form(&action, true, &inner))
}

fn entry_list_html(entries: &[Entry]) -> String {
    let mut out = String::from("<ul class=\"entries\">\n");
    for entry in entries {
        out.push_str(&format!(
            "<li><a href=\"/blogs/entry/{}/\">{}</a> <span>{}</span></li>\n",
            entry.id,
            escape(&entry.title),
            entry.pub_date.date()
        ));
    }
    out.push_str("</ul>");
    out
}

/// Every entry across all blogs and users; the only page open to anonymous
/// visitors.
#[instrument(skip(state))]
pub async fn main_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let entries = Entry::list_all(&state.db).await?;
    let body = format!("<h1>All entries</h1>\n{}", entry_list_html(&entries));
    Ok(page("All entries", &body))
}

pub async fn blog_create_form(SessionUser(_user_id): SessionUser) -> Html<String> {
    blog_form_page(
        "New blog",
        "/blogs/create/",
        "",
        "",
        &FormErrors::default(),
    )
}

#[instrument(skip(state, form))]
pub async fn blog_create(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Form(form): Form<BlogForm>,
) -> Result<Response, AppError> {
    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(
            blog_form_page("New blog", "/blogs/create/", &form.name, &form.tags, &errors)
                .into_response(),
        );
    }

    let blog = Blog::create(&state.db, user_id, form.name.trim(), form.tags.trim()).await?;
    info!(blog_id = %blog.id, %user_id, "blog created");
    Ok(found("/blogs/list/"))
}

#[instrument(skip(state))]
pub async fn blog_list(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Html<String>, AppError> {
    let blogs = Blog::list_by_user(&state.db, user_id).await?;
    let mut body = String::from("<h1>My blogs</h1>\n<ul class=\"blogs\">\n");
    for blog in &blogs {
        body.push_str(&format!(
            "<li><a href=\"/blogs/detail/{}/\">{}</a> <a href=\"/blogs/edit/{}/\">edit</a></li>\n",
            blog.id,
            escape(&blog.name),
            blog.id
        ));
    }
    body.push_str("</ul>\n<p><a href=\"/blogs/create/\">New blog</a></p>");
    Ok(page("My blogs", &body))
}

#[instrument(skip(state))]
pub async fn blog_edit_form(
    State(state): State<AppState>,
    SessionUser(_user_id): SessionUser,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let blog = Blog::find(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("blog"))?;
    let action = format!("/blogs/edit/{}/", blog.id);
    Ok(blog_form_page(
        "Edit blog",
        &action,
        &blog.name,
        &blog.tags,
        &FormErrors::default(),
    ))
}

#[instrument(skip(state, form))]
pub async fn blog_edit(
    State(state): State<AppState>,
    SessionUser(_user_id): SessionUser,
    Path(id): Path<Uuid>,
    Form(form): Form<BlogForm>,
) -> Result<Response, AppError> {
    let blog = Blog::find(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("blog"))?;

    let errors = form.validate();
    if !errors.is_empty() {
        let action = format!("/blogs/edit/{}/", blog.id);
        return Ok(
            blog_form_page("Edit blog", &action, &form.name, &form.tags, &errors).into_response(),
        );
    }

    Blog::update(&state.db, blog.id, form.name.trim(), form.tags.trim()).await?;
    info!(blog_id = %blog.id, "blog updated");
    Ok(found("/blogs/list/"))
}

#[instrument(skip(state))]
pub async fn blog_detail(
    State(state): State<AppState>,
    SessionUser(_user_id): SessionUser,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let blog = Blog::find(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("blog"))?;
    let entries = Entry::list_by_blog(&state.db, blog.id).await?;

    let body = format!(
        "<h1>{}</h1>\n<p>Tags: {}</p>\n{}\n<p><a href=\"/blogs/entry/{}/create/\">New entry</a> \
         <a href=\"/blogs/detail/{}/upload/\">Upload entries</a></p>",
        escape(&blog.name),
        escape(&blog.tags),
        entry_list_html(&entries),
        blog.id,
        blog.id
    );
    Ok(page(&blog.name, &body))
}

pub async fn upload_form(
    SessionUser(_user_id): SessionUser,
    Path(id): Path<Uuid>,
) -> Html<String> {
    upload_form_page(id, None)
}

#[instrument(skip(state, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    SessionUser(_user_id): SessionUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let blog = Blog::find(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("blog"))?;

    let form = FormData::read(multipart).await?;
    let Some(file) = form.files("file").next() else {
        return Ok(upload_form_page(blog.id, Some("This field is required.")).into_response());
    };

    let text = match std::str::from_utf8(&file.body) {
        Ok(text) => text,
        Err(_) => {
            warn!(blog_id = %blog.id, filename = %file.filename, "upload is not valid UTF-8");
            return Ok(
                upload_form_page(blog.id, Some("File must be UTF-8 encoded text."))
                    .into_response(),
            );
        }
    };

    match import::import_entries(&state.db, blog.id, text).await {
        Ok(_outcome) => Ok(found(&format!("/blogs/detail/{}/", blog.id))),
        Err(e @ ImportError::BadRow { .. }) => Err(AppError::BadRequest(e.to_string())),
        Err(ImportError::Db(e)) => Err(AppError::Internal(e)),
    }
}

#[instrument(skip(state))]
pub async fn entry_create_form(
    State(state): State<AppState>,
    SessionUser(_user_id): SessionUser,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let blog = Blog::find(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("blog"))?;
    let action = format!("/blogs/entry/{}/create/", blog.id);
    let empty = EntryForm {
        title: String::new(),
        body_text: String::new(),
        description: String::new(),
        files: Vec::new(),
    };
    Ok(entry_form_page("New entry", &action, &empty, &FormErrors::default()))
}

#[instrument(skip(state, multipart))]
pub async fn entry_create(
    State(state): State<AppState>,
    SessionUser(_user_id): SessionUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let blog = Blog::find(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("blog"))?;

    let form = EntryForm::read(multipart).await?;
    let errors = form.validate();
    if !errors.is_empty() {
        let action = format!("/blogs/entry/{}/create/", blog.id);
        return Ok(entry_form_page("New entry", &action, &form, &errors).into_response());
    }

    let entry = Entry::create(&state.db, blog.id, form.title.trim(), &form.body_text).await?;
    attach_files(&state, entry.id, &form.files, &form.description).await?;
    info!(entry_id = %entry.id, blog_id = %blog.id, files = form.files.len(), "entry created");
    Ok(found(&format!("/blogs/detail/{}/", blog.id)))
}

#[instrument(skip(state))]
pub async fn entry_detail(
    State(state): State<AppState>,
    SessionUser(_user_id): SessionUser,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let entry = Entry::find(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("entry"))?;
    let files = EntryFile::list_by_entry(&state.db, entry.id).await?;
    let images = presign_all(&state, &files).await?;

    let mut body = format!(
        "<h1>{}</h1>\n<p>Published {} (modified {})</p>\n<div>{}</div>\n",
        escape(&entry.title),
        entry.pub_date.date(),
        entry.mod_date.date(),
        escape(&entry.body_text)
    );
    for (url, description) in &images {
        body.push_str(&format!(
            "<figure><img src=\"{}\"><figcaption>{}</figcaption></figure>\n",
            escape(url),
            escape(description)
        ));
    }
    body.push_str(&format!(
        "<p><a href=\"/blogs/entry/{}/edit/\">Edit</a> \
         <a href=\"/blogs/detail/{}/\">Back to blog</a></p>",
        entry.id, entry.blog_id
    ));
    Ok(page(&entry.title, &body))
}

#[instrument(skip(state))]
pub async fn entry_edit_form(
    State(state): State<AppState>,
    SessionUser(_user_id): SessionUser,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let entry = Entry::find(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("entry"))?;
    let action = format!("/blogs/entry/{}/edit/", entry.id);
    let form = EntryForm {
        title: entry.title,
        body_text: entry.body_text,
        description: String::new(),
        files: Vec::new(),
    };
    Ok(entry_form_page("Edit entry", &action, &form, &FormErrors::default()))
}

#[instrument(skip(state, multipart))]
pub async fn entry_edit(
    State(state): State<AppState>,
    SessionUser(_user_id): SessionUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let entry = Entry::find(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("entry"))?;

    let form = EntryForm::read(multipart).await?;
    let errors = form.validate();
    if !errors.is_empty() {
        let action = format!("/blogs/entry/{}/edit/", entry.id);
        return Ok(entry_form_page("Edit entry", &action, &form, &errors).into_response());
    }

    Entry::update(&state.db, entry.id, form.title.trim(), &form.body_text).await?;
    // New uploads are appended; attachments from earlier edits stay.
    attach_files(&state, entry.id, &form.files, &form.description).await?;
    info!(entry_id = %entry.id, files = form.files.len(), "entry updated");
    Ok(found(&format!("/blogs/entry/{}/", entry.id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn entry(title: &str) -> Entry {
        Entry {
            id: Uuid::new_v4(),
            blog_id: Uuid::new_v4(),
            title: title.into(),
            body_text: "body".into(),
            pub_date: OffsetDateTime::now_utc(),
            mod_date: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn entry_list_links_each_entry() {
        let entries = vec![entry("first"), entry("second")];
        let html = entry_list_html(&entries);
        assert!(html.contains(">first</a>"));
        assert!(html.contains(">second</a>"));
        assert!(html.contains(&format!("/blogs/entry/{}/", entries[0].id)));
    }

    #[test]
    fn entry_list_escapes_titles() {
        let entries = vec![entry("<script>alert(1)</script>")];
        let html = entry_list_html(&entries);
        assert!(!html.contains("<script>alert(1)"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn blog_form_page_renders_errors_at_top() {
        let form = BlogForm {
            name: String::new(),
            tags: String::new(),
        };
        let errors = form.validate();
        let Html(html) = blog_form_page("New blog", "/blogs/create/", "", "", &errors);
        assert!(html.contains("errorlist"));
        assert!(html.contains("name: This field is required."));
        assert!(html.contains("tags: This field is required."));
    }

    #[test]
    fn upload_form_page_carries_error_message() {
        let blog_id = Uuid::new_v4();
        let Html(html) = upload_form_page(blog_id, Some("File must be UTF-8 encoded text."));
        assert!(html.contains("File must be UTF-8 encoded text."));
        assert!(html.contains(&format!("/blogs/detail/{}/upload/", blog_id)));
    }
}
