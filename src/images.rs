use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Id;
use crate::storage::ImageStore;

/// One input file for a multi-upload: the original client filename (only its
/// extension is kept) and the raw bytes.
pub struct ImageFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadedImage {
    pub path: String,
    pub url: String,
}

/// Per-file outcome of a best-effort multi-upload. Sibling failures do not
/// abort the batch.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
    Ok(UploadedImage),
    Failed { filename: String, error: String },
}

#[derive(Clone)]
pub struct ImageManager {
    store: Arc<dyn ImageStore>,
}

impl ImageManager {
    pub fn new(store: Arc<dyn ImageStore>) -> Self {
        Self { store }
    }

    /// Object key under the listing's prefix. A fresh v4 uuid per file means
    /// keys are never reused, so an earlier upload cannot be overwritten.
    fn key_for(listing_id: Id, filename: &str) -> String {
        let ext = filename.rsplit('.').next().filter(|e| *e != filename);
        match ext {
            Some(ext) => format!("{listing_id}/{}.{ext}", Uuid::new_v4()),
            None => format!("{listing_id}/{}", Uuid::new_v4()),
        }
    }

    /// Upload each file independently; one outcome per input, in input order.
    pub async fn upload_many(&self, listing_id: Id, files: Vec<ImageFile>) -> Vec<UploadOutcome> {
        let mut outcomes = Vec::with_capacity(files.len());
        for file in files {
            let key = Self::key_for(listing_id, &file.filename);
            match self.store.save(&key, &file.bytes).await {
                Ok(()) => outcomes.push(UploadOutcome::Ok(UploadedImage {
                    url: self.store.public_url(&key),
                    path: key,
                })),
                Err(e) => {
                    log::warn!("image upload failed for '{}': {e}", file.filename);
                    outcomes.push(UploadOutcome::Failed {
                        filename: file.filename,
                        error: e.to_string(),
                    });
                }
            }
        }
        outcomes
    }

    /// Best-effort delete: false on remote failure so callers can continue
    /// cleaning up sibling images.
    pub async fn delete_one(&self, path: &str) -> bool {
        match self.store.delete(path).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("image delete failed for '{path}': {e}");
                false
            }
        }
    }

    pub fn public_url(&self, path: &str) -> String {
        self.store.public_url(path)
    }
}
