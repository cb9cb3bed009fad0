use crate::error::ApiError;
use crate::notify::Message;
use std::fmt;
use std::path::PathBuf;

/// A file collection managed through the dashboard proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    WorkspaceTemplates,
    SharedResources,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::WorkspaceTemplates, Collection::SharedResources];

    pub fn endpoint(self) -> &'static str {
        match self {
            Collection::WorkspaceTemplates => "workspace-templates",
            Collection::SharedResources => "shared-resources",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Collection::WorkspaceTemplates => "Workspace Templates",
            Collection::SharedResources => "Shared Resources",
        }
    }

    pub fn item_label(self) -> &'static str {
        match self {
            Collection::WorkspaceTemplates => "Workspace template",
            Collection::SharedResources => "Shared resource",
        }
    }

    pub fn empty_text(self) -> &'static str {
        match self {
            Collection::WorkspaceTemplates => "No workspace templates uploaded yet.",
            Collection::SharedResources => "No shared resources uploaded yet.",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title().to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchId(pub u64);

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadStatus {
    Uploaded,
    Failed(ApiError),
}

/// Result of uploading one file of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    pub name: String,
    pub status: UploadStatus,
}

impl UploadOutcome {
    pub fn from_result(name: String, result: Result<(), ApiError>) -> Self {
        let status = match result {
            Ok(()) => UploadStatus::Uploaded,
            Err(e) => UploadStatus::Failed(e),
        };
        Self { name, status }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, UploadStatus::Uploaded)
    }

    pub fn notification(&self) -> Message {
        match &self.status {
            UploadStatus::Uploaded => {
                Message::success(format!("{} uploaded successfully!", self.name))
            }
            UploadStatus::Failed(ApiError::Rejected(reason)) => {
                Message::error(format!("Failed to upload {}: {}", self.name, reason))
            }
            UploadStatus::Failed(e) => {
                Message::error(format!("Upload failed for {}: {}", self.name, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Severity;

    #[test]
    fn per_file_messages_distinguish_failure_kinds() {
        let ok = UploadOutcome::from_result("a.ipynb".into(), Ok(()));
        assert_eq!(ok.notification(), Message::success("a.ipynb uploaded successfully!"));

        let rejected = UploadOutcome::from_result(
            "b.ipynb".into(),
            Err(ApiError::Rejected("duplicate name".into())),
        );
        assert_eq!(
            rejected.notification(),
            Message::error("Failed to upload b.ipynb: duplicate name")
        );

        let transport = UploadOutcome::from_result(
            "c.ipynb".into(),
            Err(ApiError::Transport("connection reset".into())),
        );
        let message = transport.notification();
        assert_eq!(message.severity, Severity::Error);
        assert_eq!(message.text, "Upload failed for c.ipynb: connection reset");
    }

    #[test]
    fn endpoints_match_proxy_routes() {
        assert_eq!(Collection::WorkspaceTemplates.endpoint(), "workspace-templates");
        assert_eq!(Collection::SharedResources.endpoint(), "shared-resources");
        assert_eq!(Collection::SharedResources.to_string(), "shared resources");
    }
}
