//! One typed method per backend route.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::multipart;

use crate::contract::{
    AtsGenerateRequest, AtsGenerateResponse, AtsReport, AuthResponse, CvData,
    ForgotPasswordRequest, LoginRequest, MessageResponse, ParseRequest, ParseResponse,
    RagAnalyzeRequest, RagAnalysis, RagCompareRequest, RagComparison, RegisterRequest,
    RegisterResponse, ResetPasswordRequest, TemplatesResponse, TokenResponse, UploadResponse, User,
};
use crate::errors::{ApiError, ApiResult};

use super::ApiGateway;

/// Binary artifact fetched from the backend, with the server-suggested name
/// when the `Content-Disposition` header carried one.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

impl ApiGateway {
    pub async fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse> {
        self.post_json("/users/login", request).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<RegisterResponse> {
        self.post_json("/users/register", request).await
    }

    pub async fn current_user(&self) -> ApiResult<User> {
        self.get_json("/users/me").await
    }

    /// Rotates the bearer token. The caller is responsible for storing the
    /// replacement.
    pub async fn refresh_token(&self) -> ApiResult<TokenResponse> {
        self.post_json("/users/refresh", &()).await
    }

    pub async fn forgot_password(
        &self,
        request: &ForgotPasswordRequest,
    ) -> ApiResult<MessageResponse> {
        self.post_json("/users/forgot-password", request).await
    }

    pub async fn reset_password(
        &self,
        request: &ResetPasswordRequest,
    ) -> ApiResult<MessageResponse> {
        self.post_json("/users/reset-password", request).await
    }

    /// Uploads a document as the multipart `file` field, MIME type guessed
    /// from the filename.
    pub async fn upload_cv(&self, filename: &str, bytes: Vec<u8>) -> ApiResult<UploadResponse> {
        let mime = mime_guess::from_path(filename).first_or_octet_stream();
        let part = multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime.as_ref())
            .map_err(|e| ApiError::validation(format!("unusable MIME type for '{filename}': {e}")))?;
        let form = multipart::Form::new().part("file", part);
        let request = self.http.post(self.endpoint("/cv/upload/")?).multipart(form);
        self.send_json("/cv/upload/", request).await
    }

    pub async fn parse_cv(&self, filename: &str) -> ApiResult<ParseResponse> {
        let body = ParseRequest {
            filename: filename.to_string(),
        };
        self.post_json("/cv/parse/", &body).await
    }

    pub async fn rag_compare(&self, request: &RagCompareRequest) -> ApiResult<RagComparison> {
        self.post_json("/cv/rag/compare/", request).await
    }

    pub async fn rag_analyze(&self, request: &RagAnalyzeRequest) -> ApiResult<RagAnalysis> {
        self.post_json("/cv/rag/analyze/", request).await
    }

    pub async fn ats_templates(&self) -> ApiResult<TemplatesResponse> {
        self.get_json("/ats/templates/").await
    }

    /// Scores the CV without generating a document. The body is the raw
    /// `CvData`; the job title rides as a query parameter.
    pub async fn ats_analyze(
        &self,
        cv_data: &CvData,
        target_job_title: Option<&str>,
    ) -> ApiResult<AtsReport> {
        let mut request = self.http.post(self.endpoint("/ats/analyze/")?).json(cv_data);
        if let Some(title) = target_job_title {
            request = request.query(&[("target_job_title", title)]);
        }
        self.send_json("/ats/analyze/", request).await
    }

    pub async fn ats_generate(
        &self,
        request: &AtsGenerateRequest,
    ) -> ApiResult<AtsGenerateResponse> {
        self.post_json("/ats/generate/", request).await
    }

    pub async fn ats_download(&self, resume_id: &str) -> ApiResult<DownloadedFile> {
        let path = format!("/ats/download/{resume_id}");
        let request = self.http.get(self.endpoint(&path)?);
        let response = self.execute(&path, request).await?;
        let filename = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(filename_from_disposition);
        let bytes = response.bytes().await.map_err(ApiError::from_transport)?;
        Ok(DownloadedFile {
            filename,
            bytes: bytes.to_vec(),
        })
    }
}

static FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"filename="?([^";]+)"?"#).unwrap());

fn filename_from_disposition(value: &str) -> Option<String> {
    FILENAME_RE
        .captures(value)
        .map(|caps| caps[1].trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_quoted_filename() {
        let value = r#"attachment; filename="ats_20250616_103000.docx""#;
        assert_eq!(
            filename_from_disposition(value).as_deref(),
            Some("ats_20250616_103000.docx")
        );
    }

    #[test]
    fn extracts_unquoted_filename() {
        let value = "attachment; filename=resume.docx";
        assert_eq!(filename_from_disposition(value).as_deref(), Some("resume.docx"));
    }

    #[test]
    fn ignores_disposition_without_filename() {
        assert_eq!(filename_from_disposition("inline"), None);
        assert_eq!(filename_from_disposition("attachment"), None);
    }

    #[test]
    fn stops_at_following_parameters() {
        let value = r#"attachment; filename="resume.docx"; size=1234"#;
        assert_eq!(filename_from_disposition(value).as_deref(), Some("resume.docx"));
    }
}
