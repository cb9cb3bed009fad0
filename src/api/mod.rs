//! Typed client for the admin dashboard's REST proxy.
//!
//! Every call maps to exactly one request against `{base_url}/api/proxy/...`.
//! Nothing is retried or cached here.

mod types;

pub use types::{
    ActionResponse, ContentBody, Course, CurrentUser, FileEntry, FileListing, NewCourse,
    PromptKind, ReloadResponse, StudentRecord,
};

use crate::config::AdminConfig;
use crate::error::ApiError;
use crate::upload::{Collection, SelectedFile};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{multipart, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use types::ErrorBody;

const UNKNOWN_ERROR: &str = "Unknown error";

/// The one operation the upload coordinator needs from the backend.
#[async_trait]
pub trait CollectionApi: Send + Sync {
    async fn upload(&self, collection: Collection, file: &SelectedFile) -> Result<(), ApiError>;
}

#[derive(Debug, Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl ProxyClient {
    pub fn new(config: &AdminConfig) -> Result<Self, ApiError> {
        let base = config
            .proxy_base()
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base,
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    pub fn dashboard_url(&self) -> &Url {
        &self.base
    }

    fn endpoint_url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(["api", "proxy"])
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint_url(segments)?;
        tracing::debug!("{} {}", method, url);

        let mut builder = self.http.request(method, url);
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, format!("token {}", token));
        }
        Ok(builder)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Reads a `{ success, error? }` body. A failing status with an `error`
    /// field still counts as an application rejection.
    async fn read_action(response: Response, fallback: &str) -> Result<(), ApiError> {
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            let action: ActionResponse = serde_json::from_str(&body)?;
            return action.into_result(fallback);
        }

        match serde_json::from_str::<ActionResponse>(&body) {
            Ok(action) if action.error.is_some() => action.into_result(fallback),
            _ => Err(status_error(status, &body)),
        }
    }

    pub async fn list_files(&self, collection: Collection) -> Result<Vec<FileEntry>, ApiError> {
        let response = self
            .request(Method::GET, &[collection.endpoint()])?
            .send()
            .await?;
        let listing: FileListing = Self::read_json(response).await?;
        Ok(listing.files)
    }

    pub async fn upload_file(
        &self,
        collection: Collection,
        file: &SelectedFile,
    ) -> Result<(), ApiError> {
        let bytes = tokio::fs::read(&file.path).await?;
        let part = multipart::Part::bytes(bytes).file_name(file.name.clone());
        let form = multipart::Form::new().part("file", part);

        let response = self
            .request(Method::POST, &[collection.endpoint()])?
            .multipart(form)
            .send()
            .await?;
        Self::read_action(response, UNKNOWN_ERROR).await
    }

    pub async fn delete_file(&self, collection: Collection, name: &str) -> Result<(), ApiError> {
        let response = self
            .request(Method::DELETE, &[collection.endpoint(), name])?
            .send()
            .await?;
        Self::read_action(response, "Delete failed").await
    }

    /// Task name to objective text. Tasks without an objective map to `None`.
    pub async fn learning_objectives(&self) -> Result<BTreeMap<String, Option<String>>, ApiError> {
        let response = self
            .request(Method::GET, &["learning-objectives"])?
            .send()
            .await?;
        Self::read_json(response).await
    }

    pub async fn learning_objective(&self, task: &str) -> Result<String, ApiError> {
        let response = self
            .request(Method::GET, &["learning-objectives", task])?
            .send()
            .await?;
        let body: ContentBody = Self::read_json(response).await?;
        Ok(body.content.unwrap_or_default())
    }

    pub async fn save_learning_objective(&self, task: &str, content: &str) -> Result<(), ApiError> {
        let response = self
            .request(Method::PUT, &["learning-objectives", task])?
            .json(&ContentBody {
                content: Some(content.to_string()),
            })
            .send()
            .await?;
        Self::read_action(response, "Save failed").await
    }

    /// Asks the backend to re-read objective files. Returns the backend's message.
    pub async fn reload_learning_objectives(&self) -> Result<Option<String>, ApiError> {
        let response = self
            .request(Method::POST, &["reload-learning-objectives"])?
            .json(&serde_json::json!({}))
            .send()
            .await?;
        let reload: ReloadResponse = Self::read_json(response).await?;
        if reload.status == "success" {
            Ok(reload.message)
        } else {
            Err(ApiError::Rejected(
                reload.message.unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            ))
        }
    }

    pub async fn student_analytics(&self) -> Result<Vec<StudentRecord>, ApiError> {
        let response = self
            .request(Method::GET, &["analytics", "students"])?
            .send()
            .await?;
        Self::read_json(response).await
    }

    pub async fn prompt(&self, kind: PromptKind) -> Result<String, ApiError> {
        let response = self
            .request(Method::GET, &["prompts", kind.slug()])?
            .send()
            .await?;
        let body: ContentBody = Self::read_json(response).await?;
        Ok(body.content.unwrap_or_default())
    }

    pub async fn save_prompt(&self, kind: PromptKind, content: &str) -> Result<(), ApiError> {
        let response = self
            .request(Method::PUT, &["prompts", kind.slug()])?
            .json(&ContentBody {
                content: Some(content.to_string()),
            })
            .send()
            .await?;
        Self::read_action(response, UNKNOWN_ERROR).await
    }

    pub async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        let response = self.request(Method::GET, &["user"])?.send().await?;
        Self::read_json(response).await
    }

    pub async fn courses(&self) -> Result<Vec<Course>, ApiError> {
        let response = self.request(Method::GET, &["courses"])?.send().await?;
        Self::read_json(response).await
    }

    pub async fn create_course(&self, course: &NewCourse) -> Result<Course, ApiError> {
        let response = self
            .request(Method::POST, &["courses"])?
            .json(course)
            .send()
            .await?;
        Self::read_json(response).await
    }

    pub async fn assign_teacher(&self, course_id: &str, teacher: &str) -> Result<(), ApiError> {
        let response = self
            .request(Method::POST, &["courses", course_id, "assign-teacher"])?
            .form(&[("teacher", teacher)])
            .send()
            .await?;
        let _: serde_json::Value = Self::read_json(response).await?;
        Ok(())
    }

    pub async fn enroll_student(&self, course_id: &str, student: &str) -> Result<(), ApiError> {
        let response = self
            .request(Method::POST, &["courses", course_id, "enroll"])?
            .form(&[("student", student)])
            .send()
            .await?;
        let _: serde_json::Value = Self::read_json(response).await?;
        Ok(())
    }
}

#[async_trait]
impl CollectionApi for ProxyClient {
    async fn upload(&self, collection: Collection, file: &SelectedFile) -> Result<(), ApiError> {
        self.upload_file(collection, file).await
    }
}

fn status_error(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.chars().take(200).collect())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });
    ApiError::Status { status, message }
}
