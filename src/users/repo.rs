use anyhow::Context;
use sqlx::{FromRow, PgPool};
use time::Date;
use uuid::Uuid;

/// Account record. The password is only ever stored as an Argon2 hash.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

/// Per-user metadata created once at registration.
#[derive(Debug, Clone, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub registration_date: Date,
    pub avatar_key: Option<String>,
}

impl User {
    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, first_name, last_name
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, first_name, last_name
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn update_name(
        db: &PgPool,
        id: Uuid,
        first_name: &str,
        last_name: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users SET first_name = $2, last_name = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .execute(db)
        .await?;
        Ok(())
    }
}

impl Profile {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, user_id, registration_date, avatar_key
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(profile)
    }

    pub async fn find_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, user_id, registration_date, avatar_key
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(profile)
    }

    pub async fn set_avatar(db: &PgPool, id: Uuid, avatar_key: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE profiles SET avatar_key = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(avatar_key)
        .execute(db)
        .await?;
        Ok(())
    }
}

/// Create the account and its profile together; both exist or neither does.
pub async fn register(
    db: &PgPool,
    username: &str,
    password_hash: &str,
    first_name: &str,
    last_name: &str,
) -> anyhow::Result<(User, Profile)> {
    let mut tx = db.begin().await.context("begin tx")?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, password_hash, first_name, last_name)
        VALUES ($1, $2, $3, $4)
        RETURNING id, username, password_hash, first_name, last_name
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .bind(first_name)
    .bind(last_name)
    .fetch_one(&mut *tx)
    .await?;

    let profile = sqlx::query_as::<_, Profile>(
        r#"
        INSERT INTO profiles (user_id)
        VALUES ($1)
        RETURNING id, user_id, registration_date, avatar_key
        "#,
    )
    .bind(user.id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await.context("commit tx")?;
    Ok((user, profile))
}
