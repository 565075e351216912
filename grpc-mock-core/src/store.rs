//! Mock Store Resolver — locates and loads the per-session artifacts of one
//! method.
//!
//! Layout: `<root>/<session>/grpc/<method>.status` and
//! `<root>/<session>/grpc/<method>.content`, both JSON. Files are never
//! written here.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ArtifactError;
use crate::session::Session;

pub const GRPC_DIR: &str = "grpc";
pub const STATUS_EXT: &str = "status";
pub const CONTENT_EXT: &str = "content";

/// Intentional error injection for a method. Code `0` means success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

impl StatusRecord {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Expected artifact locations for one method in one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub status: PathBuf,
    pub content: PathBuf,
}

impl ArtifactPaths {
    pub fn resolve(session: &Session, method: &str) -> Self {
        let dir = session.dir().join(GRPC_DIR);
        Self {
            status: dir.join(format!("{method}.{STATUS_EXT}")),
            content: dir.join(format!("{method}.{CONTENT_EXT}")),
        }
    }
}

/// Read access to mock artifacts.
///
/// `Ok(None)` means the artifact does not exist; `Err` means it exists but
/// cannot be read or parsed.
#[async_trait]
pub trait MockStore: Send + Sync {
    async fn load_status(
        &self,
        session: &Session,
        method: &str,
    ) -> Result<Option<StatusRecord>, ArtifactError>;

    async fn load_content(
        &self,
        session: &Session,
        method: &str,
    ) -> Result<Option<Value>, ArtifactError>;
}

// ── FsMockStore ──

/// Filesystem-backed store using the session directory layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMockStore;

impl FsMockStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MockStore for FsMockStore {
    async fn load_status(
        &self,
        session: &Session,
        method: &str,
    ) -> Result<Option<StatusRecord>, ArtifactError> {
        let paths = ArtifactPaths::resolve(session, method);
        read_json(&paths.status).await
    }

    async fn load_content(
        &self,
        session: &Session,
        method: &str,
    ) -> Result<Option<Value>, ArtifactError> {
        let paths = ArtifactPaths::resolve(session, method);
        read_json(&paths.content).await
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ArtifactError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ArtifactError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| ArtifactError::Malformed {
            path: path.to_path_buf(),
            source,
        })
}
