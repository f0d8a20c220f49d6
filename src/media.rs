use std::path::PathBuf;

use crate::error::Result;

/// Persists image bytes fetched from the remote file API under the static
/// directory and constructs the URL the browser loads them from.
#[derive(Debug, Clone)]
pub struct MediaStore {
    image_dir: PathBuf,
    base_url: String,
}

impl MediaStore {
    pub fn new(static_dir: &str, public_base_url: &str) -> Self {
        Self {
            image_dir: PathBuf::from(static_dir).join("images"),
            base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.image_dir).await?;
        Ok(())
    }

    /// Write the image and return its public URL. File ids are remote-issued
    /// opaque tokens, reused as filenames so repeated fetches overwrite
    /// instead of accumulating.
    pub async fn persist_image(&self, file_id: &str, bytes: &[u8]) -> Result<String> {
        let filename = format!("{file_id}.png");
        let path = self.image_dir.join(&filename);
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!("Persisted image {} ({} bytes)", path.display(), bytes.len());
        Ok(format!("{}/static/images/{}", self.base_url, filename))
    }
}
