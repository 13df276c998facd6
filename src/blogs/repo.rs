use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Blog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub tags: String,
}

/// A post inside a blog. `pub_date` is set once at creation; `mod_date`
/// follows every edit. Listings run newest-first with the id as tiebreak.
#[derive(Debug, Clone, FromRow)]
pub struct Entry {
    pub id: Uuid,
    pub blog_id: Uuid,
    pub title: String,
    pub body_text: String,
    pub pub_date: OffsetDateTime,
    pub mod_date: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct EntryFile {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub file_key: String,
    pub description: String,
}

impl Blog {
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        name: &str,
        tags: &str,
    ) -> anyhow::Result<Blog> {
        let blog = sqlx::query_as::<_, Blog>(
            r#"
            INSERT INTO blogs (user_id, name, tags)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, name, tags
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(tags)
        .fetch_one(db)
        .await?;
        Ok(blog)
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Blog>> {
        let blog = sqlx::query_as::<_, Blog>(
            r#"
            SELECT id, user_id, name, tags
            FROM blogs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(blog)
    }

    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Blog>> {
        let blogs = sqlx::query_as::<_, Blog>(
            r#"
            SELECT id, user_id, name, tags
            FROM blogs
            WHERE user_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(blogs)
    }

    pub async fn update(db: &PgPool, id: Uuid, name: &str, tags: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE blogs SET name = $2, tags = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(tags)
        .execute(db)
        .await?;
        Ok(())
    }
}

impl Entry {
    pub async fn create(
        db: &PgPool,
        blog_id: Uuid,
        title: &str,
        body_text: &str,
    ) -> anyhow::Result<Entry> {
        let entry = sqlx::query_as::<_, Entry>(
            r#"
            INSERT INTO entries (blog_id, title, body_text)
            VALUES ($1, $2, $3)
            RETURNING id, blog_id, title, body_text, pub_date, mod_date
            "#,
        )
        .bind(blog_id)
        .bind(title)
        .bind(body_text)
        .fetch_one(db)
        .await?;
        Ok(entry)
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Entry>> {
        let entry = sqlx::query_as::<_, Entry>(
            r#"
            SELECT id, blog_id, title, body_text, pub_date, mod_date
            FROM entries
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(entry)
    }

    pub async fn find_by_blog_and_title(
        db: &PgPool,
        blog_id: Uuid,
        title: &str,
    ) -> anyhow::Result<Option<Entry>> {
        let entry = sqlx::query_as::<_, Entry>(
            r#"
            SELECT id, blog_id, title, body_text, pub_date, mod_date
            FROM entries
            WHERE blog_id = $1 AND title = $2
            "#,
        )
        .bind(blog_id)
        .bind(title)
        .fetch_optional(db)
        .await?;
        Ok(entry)
    }

    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Entry>> {
        let entries = sqlx::query_as::<_, Entry>(
            r#"
            SELECT id, blog_id, title, body_text, pub_date, mod_date
            FROM entries
            ORDER BY pub_date DESC, id ASC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(entries)
    }

    pub async fn list_by_blog(db: &PgPool, blog_id: Uuid) -> anyhow::Result<Vec<Entry>> {
        let entries = sqlx::query_as::<_, Entry>(
            r#"
            SELECT id, blog_id, title, body_text, pub_date, mod_date
            FROM entries
            WHERE blog_id = $1
            ORDER BY pub_date DESC, id ASC
            "#,
        )
        .bind(blog_id)
        .fetch_all(db)
        .await?;
        Ok(entries)
    }

    /// Rewrites title and body and bumps `mod_date`; `pub_date` never changes.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        title: &str,
        body_text: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE entries SET title = $2, body_text = $3, mod_date = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(body_text)
        .execute(db)
        .await?;
        Ok(())
    }
}

impl EntryFile {
    pub async fn create(
        db: &PgPool,
        entry_id: Uuid,
        file_key: &str,
        description: &str,
    ) -> anyhow::Result<EntryFile> {
        let file = sqlx::query_as::<_, EntryFile>(
            r#"
            INSERT INTO entry_files (entry_id, file_key, description)
            VALUES ($1, $2, $3)
            RETURNING id, entry_id, file_key, description
            "#,
        )
        .bind(entry_id)
        .bind(file_key)
        .bind(description)
        .fetch_one(db)
        .await?;
        Ok(file)
    }

    pub async fn list_by_entry(db: &PgPool, entry_id: Uuid) -> anyhow::Result<Vec<EntryFile>> {
        let files = sqlx::query_as::<_, EntryFile>(
            r#"
            SELECT id, entry_id, file_key, description
            FROM entry_files
            WHERE entry_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(entry_id)
        .fetch_all(db)
        .await?;
        Ok(files)
    }
}
