//! Attachment handling for entries: upload to blob storage, then link a row
//! per uploaded image.

use anyhow::Context;
use tracing::info;
use uuid::Uuid;

use crate::forms::UploadedFile;
use crate::state::AppState;
use crate::storage::{self, PRESIGN_TTL_SECS};

use super::repo::EntryFile;

/// Store each uploaded image under `files/` and create its attachment record.
/// Every file in one submission carries the same description. Appends only;
/// existing attachments are never touched.
pub async fn attach_files(
    state: &AppState,
    entry_id: Uuid,
    files: &[UploadedFile],
    description: &str,
) -> anyhow::Result<usize> {
    for file in files {
        let key = storage::file_key(Uuid::new_v4(), &file.content_type);
        state
            .storage
            .put_object(&key, file.body.clone(), &file.content_type)
            .await
            .with_context(|| format!("put_object {}", key))?;
        EntryFile::create(&state.db, entry_id, &key, description).await?;
    }
    if !files.is_empty() {
        info!(%entry_id, count = files.len(), "attached files");
    }
    Ok(files.len())
}

/// Presigned view URL for each attachment, paired with its description.
pub async fn presign_all(
    state: &AppState,
    files: &[EntryFile],
) -> anyhow::Result<Vec<(String, String)>> {
    let mut out = Vec::with_capacity(files.len());
    for file in files {
        let url = state
            .storage
            .presign_get(&file.file_key, PRESIGN_TTL_SECS)
            .await?;
        out.push((url, file.description.clone()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn presign_all_pairs_urls_with_descriptions() {
        let state = AppState::fake();
        let entry_id = Uuid::new_v4();
        let files = vec![
            EntryFile {
                id: Uuid::new_v4(),
                entry_id,
                file_key: "files/a.jpg".into(),
                description: "shared".into(),
            },
            EntryFile {
                id: Uuid::new_v4(),
                entry_id,
                file_key: "files/b.png".into(),
                description: "shared".into(),
            },
        ];

        let pairs = presign_all(&state, &files).await.unwrap();
        assert_eq!(pairs.len(), 2);
        assert!(pairs[0].0.contains("files/a.jpg"));
        assert_eq!(pairs[0].1, "shared");
        assert!(pairs[1].0.contains("files/b.png"));
    }
}
