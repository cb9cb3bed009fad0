use crate::error::ApiError;
use crate::utils::time;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FileListing {
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FileEntry {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified: Option<Modified>,
}

/// Modification time as sent by the backend: epoch milliseconds or an ISO string.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Modified {
    Millis(f64),
    Text(String),
}

impl Modified {
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Modified::Millis(millis) => time::from_epoch_millis(*millis),
            Modified::Text(text) => time::parse_timestamp(text),
        }
    }
}

impl FileEntry {
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.modified.as_ref().and_then(Modified::to_datetime)
    }
}

/// `{ success, error? }` returned by every mutating endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl ActionResponse {
    pub fn into_result(self, fallback: &str) -> Result<(), ApiError> {
        if self.success {
            Ok(())
        } else {
            Err(ApiError::Rejected(
                self.error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| fallback.to_string()),
            ))
        }
    }
}

/// Body of objective and prompt reads/writes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ContentBody {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ReloadResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Tutor,
    Expert,
}

impl PromptKind {
    pub fn slug(self) -> &'static str {
        match self {
            PromptKind::Tutor => "tutor",
            PromptKind::Expert => "expert",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PromptKind::Tutor => "Tutor",
            PromptKind::Expert => "Expert",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            PromptKind::Tutor => "Enter the system prompt for the Tutor Agent (Juno)...",
            PromptKind::Expert => "Enter the system prompt for the Expert Agent...",
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StudentRecord {
    pub username: String,
    #[serde(default)]
    pub message_count: u64,
    /// Epoch seconds.
    #[serde(default)]
    pub first_interaction: Option<f64>,
    /// Epoch seconds.
    #[serde(default)]
    pub last_interaction: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CurrentUser {
    pub name: String,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub teacher_of: Vec<String>,
    #[serde(default)]
    pub enrolled_in: Vec<String>,
}

impl Default for CurrentUser {
    fn default() -> Self {
        Self {
            name: "unknown".to_string(),
            admin: false,
            teacher_of: Vec::new(),
            enrolled_in: Vec::new(),
        }
    }
}

impl CurrentUser {
    pub fn can_assign_teacher(&self) -> bool {
        self.admin
    }

    pub fn can_enroll(&self, course_id: &str) -> bool {
        self.admin || self.teacher_of.iter().any(|id| id == course_id)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Course {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub teachers: Vec<String>,
    #[serde(default)]
    pub students: Vec<String>,
}

impl Course {
    pub fn display_name(&self) -> &str {
        if self.title.is_empty() {
            &self.id
        } else {
            &self.title
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
}

/// Error body of a non-2xx response. FastAPI uses `detail`, Flask handlers `error`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    error: Option<String>,
    detail: Option<serde_json::Value>,
    message: Option<String>,
}

impl ErrorBody {
    pub(crate) fn into_message(self) -> Option<String> {
        self.error
            .or_else(|| {
                self.detail.map(|detail| match detail {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
            })
            .or(self.message)
    }
}
