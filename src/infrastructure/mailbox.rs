//! Filesystem mailbox shared by requester and watcher
//!
//! Artifacts are staged under a dot-prefixed temporary name and renamed
//! into place, so an observer never sees a final name with partial content.

use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::domain::artifact::{Artifact, ArtifactKind};
use crate::domain::message::{RequestId, RequestMessage, ResultMessage};

/// Mailbox errors
#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("Mailbox I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unparseable artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode artifact: {0}")]
    Encode(#[from] serde_json::Error),
}

impl MailboxError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// The artifact vanished between observation and access
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// The shared mailbox directory
#[derive(Debug, Clone)]
pub struct Mailbox {
    dir: PathBuf,
}

impl Mailbox {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of an artifact
    pub fn path_of(&self, artifact: &Artifact) -> PathBuf {
        self.dir.join(artifact.file_name())
    }

    /// Create the directory (and parents) if missing
    pub async fn ensure(&self) -> Result<(), MailboxError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| MailboxError::io(&self.dir, e))
    }

    pub async fn write_request(&self, request: &RequestMessage) -> Result<PathBuf, MailboxError> {
        self.write_artifact(&Artifact::request(request.request_id), request)
            .await
    }

    pub async fn write_result(&self, result: &ResultMessage) -> Result<PathBuf, MailboxError> {
        self.write_artifact(&Artifact::result(result.request_id), result)
            .await
    }

    pub async fn read_request(&self, path: &Path) -> Result<RequestMessage, MailboxError> {
        read_json(path).await
    }

    /// Read the result for `request_id`, `None` if it has not arrived
    pub async fn read_result(
        &self,
        request_id: RequestId,
    ) -> Result<Option<ResultMessage>, MailboxError> {
        let path = self.path_of(&Artifact::result(request_id));
        match read_json(&path).await {
            Ok(result) => Ok(Some(result)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Delete an artifact. Returns `false` when it was already gone,
    /// which is not an error: a concurrent consumer may have won the race.
    pub async fn remove(&self, path: &Path) -> Result<bool, MailboxError> {
        match fs::remove_file(path).await {
            Ok(()) => {
                debug!(path = %path.display(), "removed artifact");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(MailboxError::io(path, e)),
        }
    }

    pub async fn exists(&self, artifact: &Artifact) -> bool {
        fs::try_exists(self.path_of(artifact)).await.unwrap_or(false)
    }

    /// List every classified artifact currently in the mailbox
    pub async fn list(&self) -> Result<Vec<(Artifact, PathBuf)>, MailboxError> {
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| MailboxError::io(&self.dir, e))?;

        let mut artifacts = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| MailboxError::io(&self.dir, e))?
        {
            let path = entry.path();
            if let Some(artifact) = Artifact::classify_path(&path) {
                artifacts.push((artifact, path));
            }
        }
        Ok(artifacts)
    }

    /// Pending requests currently in the mailbox
    pub async fn pending_requests(&self) -> Result<Vec<(Artifact, PathBuf)>, MailboxError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|(a, _)| a.kind == ArtifactKind::Request)
            .collect())
    }

    async fn write_artifact<T: Serialize>(
        &self,
        artifact: &Artifact,
        payload: &T,
    ) -> Result<PathBuf, MailboxError> {
        let bytes = serde_json::to_vec(payload)?;
        let staging = self.dir.join(artifact.temp_file_name());
        let target = self.path_of(artifact);

        fs::write(&staging, &bytes)
            .await
            .map_err(|e| MailboxError::io(&staging, e))?;
        if let Err(e) = fs::rename(&staging, &target).await {
            let _ = fs::remove_file(&staging).await;
            return Err(MailboxError::io(&target, e));
        }

        debug!(path = %target.display(), "wrote artifact");
        Ok(target)
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, MailboxError> {
    let bytes = fs::read(path).await.map_err(|e| MailboxError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|source| MailboxError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
