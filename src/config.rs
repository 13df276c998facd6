use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
    pub s3_endpoint: String,
    pub s3_bucket: String,
    pub s3_access_key: String,
    pub s3_secret_key: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET")?,
            ttl_minutes: std::env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        Ok(Self {
            database_url,
            session,
            s3_endpoint: std::env::var("S3_ENDPOINT")?,
            s3_bucket: std::env::var("S3_BUCKET")?,
            s3_access_key: std::env::var("S3_ACCESS_KEY")?,
            s3_secret_key: std::env::var("S3_SECRET_KEY")?,
        })
    }
}
