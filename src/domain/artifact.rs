//! Mailbox artifact naming
//!
//! A filename alone tells an observer what an artifact is and which
//! request it belongs to, without opening it.

use std::path::Path;

use super::message::RequestId;

const REQUEST_PREFIX: &str = "fileclip_request_";
const RESULT_PREFIX: &str = "fileclip_results_";
const EXTENSION: &str = ".json";

/// Kind of a mailbox artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Request,
    Result,
}

/// A classified mailbox artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub request_id: RequestId,
}

impl Artifact {
    pub const fn request(request_id: RequestId) -> Self {
        Self {
            kind: ArtifactKind::Request,
            request_id,
        }
    }

    pub const fn result(request_id: RequestId) -> Self {
        Self {
            kind: ArtifactKind::Result,
            request_id,
        }
    }

    /// Final filename inside the mailbox
    pub fn file_name(&self) -> String {
        let prefix = match self.kind {
            ArtifactKind::Request => REQUEST_PREFIX,
            ArtifactKind::Result => RESULT_PREFIX,
        };
        format!("{}{}{}", prefix, self.request_id, EXTENSION)
    }

    /// Staging filename used while the payload is being written.
    /// The leading dot keeps it out of [`Artifact::classify`].
    pub fn temp_file_name(&self) -> String {
        format!(".{}.tmp", self.file_name())
    }

    /// Classify a filename; anything that is not a final artifact name yields `None`
    pub fn classify(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(EXTENSION)?;
        if let Some(id) = stem.strip_prefix(REQUEST_PREFIX) {
            return id.parse().ok().map(Self::request);
        }
        if let Some(id) = stem.strip_prefix(RESULT_PREFIX) {
            return id.parse().ok().map(Self::result);
        }
        None
    }

    /// Classify the last component of a path
    pub fn classify_path(path: &Path) -> Option<Self> {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(Self::classify)
    }
}
