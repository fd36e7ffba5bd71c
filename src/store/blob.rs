//! Object storage for uploaded images and résumé files.
//!
//! Files are addressed by bucket and generated file name; `put` hands back the public
//! URL the editor writes into the draft record.

use async_trait::async_trait;
use std::{collections::HashMap, path::PathBuf, str::FromStr};
use tokio::sync::RwLock;

use super::StoreResult;

/// Storage buckets, one per kind of upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Avatars,
    Resumes,
    ProjectImages,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Avatars, Bucket::Resumes, Bucket::ProjectImages];

    pub fn name(self) -> &'static str {
        match self {
            Bucket::Avatars => "avatars",
            Bucket::Resumes => "resumes",
            Bucket::ProjectImages => "project-images",
        }
    }

    /// Whether the bucket takes documents (PDF) instead of images
    pub fn accepts_documents(self) -> bool {
        matches!(self, Bucket::Resumes)
    }
}

impl FromStr for Bucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Bucket::ALL
            .into_iter()
            .find(|b| b.name() == s)
            .ok_or_else(|| format!("unknown bucket '{}'", s))
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a file and return its public URL
    async fn put(&self, bucket: Bucket, file_name: &str, bytes: Vec<u8>) -> StoreResult<String>;

    /// Remove a file; `false` when it did not exist
    async fn delete(&self, bucket: Bucket, file_name: &str) -> StoreResult<bool>;

    fn public_url(&self, bucket: Bucket, file_name: &str) -> String;
}

/// Files on local disk under `<root>/<bucket>/`, served by the app at `/uploads`
#[derive(Debug, Clone)]
pub struct DiskBlobStore {
    root: PathBuf,
    base_url: String,
}

impl DiskBlobStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

#[async_trait]
impl BlobStore for DiskBlobStore {
    async fn put(&self, bucket: Bucket, file_name: &str, bytes: Vec<u8>) -> StoreResult<String> {
        let dir = self.root.join(bucket.name());
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(file_name), &bytes).await?;
        tracing::info!(
            bucket = bucket.name(),
            file = %file_name,
            size = bytes.len(),
            "blob stored"
        );
        Ok(self.public_url(bucket, file_name))
    }

    async fn delete(&self, bucket: Bucket, file_name: &str) -> StoreResult<bool> {
        let path = self.root.join(bucket.name()).join(file_name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, bucket: Bucket, file_name: &str) -> String {
        format!("{}/uploads/{}/{}", self.base_url, bucket.name(), file_name)
    }
}

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    files: RwLock<HashMap<(Bucket, String), Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn read(&self, bucket: Bucket, file_name: &str) -> Option<Vec<u8>> {
        self.files
            .read()
            .await
            .get(&(bucket, file_name.to_string()))
            .cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, bucket: Bucket, file_name: &str, bytes: Vec<u8>) -> StoreResult<String> {
        self.files
            .write()
            .await
            .insert((bucket, file_name.to_string()), bytes);
        Ok(self.public_url(bucket, file_name))
    }

    async fn delete(&self, bucket: Bucket, file_name: &str) -> StoreResult<bool> {
        Ok(self
            .files
            .write()
            .await
            .remove(&(bucket, file_name.to_string()))
            .is_some())
    }

    fn public_url(&self, bucket: Bucket, file_name: &str) -> String {
        format!("memory://{}/{}", bucket.name(), file_name)
    }
}
