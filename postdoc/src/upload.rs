//! Image upload collaborator
//!
//! The editor never talks to the network itself. Hosts implement
//! [`ImageUploader`] over whatever HTTP client they have; this module builds
//! the request target and interprets the server's JSON reply.

use crate::editor_config::SessionConfig;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Multipart form field carrying the file
pub const FILE_FIELD: &str = "image";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// The server refused the upload; carries its message
    #[error("{0}")]
    Rejected(String),

    #[error("Malformed upload response: {0}")]
    MalformedResponse(String),

    #[error("Upload response has no file path")]
    MissingFilePath,

    #[error("Upload transport failed: {0}")]
    Transport(String),

    /// The session has no project or URL name to attach the image to
    #[error("Images can only be uploaded once the document belongs to a project")]
    NoUploadContext,
}

/// Kind of document an image is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachedType {
    Post,
    Snippet,
}

impl fmt::Display for AttachedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachedType::Post => f.write_str("post"),
            AttachedType::Snippet => f.write_str("snippet"),
        }
    }
}

/// Where an image upload goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub endpoint: String,
    pub project_id: String,
    pub attached_type: AttachedType,
    pub attached_url_name: String,
}

impl UploadRequest {
    /// Build the request for the current editing session
    ///
    /// # Returns
    /// * `Ok(UploadRequest)` - The session names a project and URL name
    /// * `Err(UploadError::NoUploadContext)` - Either is missing
    pub fn for_session(endpoint: &str, session: &SessionConfig) -> Result<Self, UploadError> {
        match (&session.project_id, &session.url_name) {
            (Some(project_id), Some(url_name)) => Ok(Self {
                endpoint: endpoint.to_string(),
                project_id: project_id.clone(),
                attached_type: if session.is_post {
                    AttachedType::Post
                } else {
                    AttachedType::Snippet
                },
                attached_url_name: url_name.clone(),
            }),
            _ => Err(UploadError::NoUploadContext),
        }
    }

    /// The full target URL with percent-encoded query values
    pub fn url(&self) -> String {
        format!(
            "{}?projectId={}&attachedType={}&attachedUrlName={}",
            self.endpoint,
            urlencoding::encode(&self.project_id),
            self.attached_type,
            urlencoding::encode(&self.attached_url_name),
        )
    }
}

/// A file picked by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Host-supplied transport
pub trait ImageUploader {
    /// POST `file` as multipart field [`FILE_FIELD`] to `request.url()`
    ///
    /// # Returns
    /// * `Ok(String)` - The stored file path
    /// * `Err(UploadError)` - Transport failure or server rejection
    fn upload(&self, request: &UploadRequest, file: &ImageFile) -> Result<String, UploadError>;
}

#[derive(Deserialize)]
struct UploadResponse {
    data: Option<UploadData>,
    message: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadData {
    file_path: Option<String>,
}

/// Interpret an upload reply
///
/// Success bodies look like `{"data": {"filePath": "..."}}`; failures carry
/// `{"message": "..."}`, which is passed through unchanged.
pub fn parse_upload_response(status: u16, body: &str) -> Result<String, UploadError> {
    let response: UploadResponse =
        serde_json::from_str(body).map_err(|e| UploadError::MalformedResponse(e.to_string()))?;

    if !(200..300).contains(&status) {
        return Err(UploadError::Rejected(response.message.unwrap_or_else(|| {
            format!("Upload failed with status {}", status)
        })));
    }

    response
        .data
        .and_then(|data| data.file_path)
        .ok_or(UploadError::MissingFilePath)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(is_post: bool) -> SessionConfig {
        SessionConfig {
            project_id: Some("p 1".to_string()),
            url_name: Some("my-post&x".to_string()),
            is_post,
        }
    }

    #[test]
    fn test_request_url_encodes_values() {
        let request = UploadRequest::for_session("/api/upload", &session(true)).unwrap();
        assert_eq!(
            request.url(),
            "/api/upload?projectId=p%201&attachedType=post&attachedUrlName=my-post%26x"
        );
    }

    #[test]
    fn test_snippet_attached_type() {
        let request = UploadRequest::for_session("/api/upload", &session(false)).unwrap();
        assert_eq!(request.attached_type, AttachedType::Snippet);
    }

    #[test]
    fn test_missing_context() {
        let result = UploadRequest::for_session("/api/upload", &SessionConfig::default());
        assert_eq!(result, Err(UploadError::NoUploadContext));
    }

    #[test]
    fn test_parse_success() {
        let body = r#"{"data": {"filePath": "https://cdn.example.com/a.png"}}"#;
        assert_eq!(
            parse_upload_response(200, body),
            Ok("https://cdn.example.com/a.png".to_string())
        );
    }

    #[test]
    fn test_parse_rejection_passes_message() {
        let body = r#"{"message": "File too large"}"#;
        let err = parse_upload_response(413, body).unwrap_err();
        assert_eq!(err.to_string(), "File too large");
    }

    #[test]
    fn test_parse_malformed_and_missing() {
        assert!(matches!(
            parse_upload_response(200, "<html>"),
            Err(UploadError::MalformedResponse(_))
        ));
        assert_eq!(
            parse_upload_response(200, r#"{"data": {}}"#),
            Err(UploadError::MissingFilePath)
        );
    }
}
