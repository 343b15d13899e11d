//! Wire types for the cvtailor backend API.
//!
//! Every endpoint the client talks to has an explicit request/response schema
//! here. Responses deserialize strictly on the fields the client relies on and
//! tolerate extra fields the backend may add; a response missing a required
//! field fails deserialization rather than producing half-populated data.

pub mod ats;
pub mod auth;
pub mod cv;

pub use ats::{
    AtsGenerateRequest, AtsGenerateResponse, AtsReport, AtsTemplate, TemplateKind,
    TemplatesResponse,
};
pub use auth::{
    AuthResponse, AuthUserSummary, ForgotPasswordRequest, LoginRequest, MessageResponse,
    RegisterRequest, RegisterResponse, ResetPasswordRequest, TokenResponse, User,
};
pub use cv::{
    CvData, Education, Experience, ParseRequest, ParseResponse, PersonalInfo, Project,
    RagAnalyzeRequest, RagAnalysis, RagCompareRequest, RagComparison, SkillSet, UploadResponse,
};

use serde::{Deserialize, Serialize};

/// Error body the backend attaches to non-2xx responses.
///
/// The `detail` field carries the human-readable message; anything else in the
/// body is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_parses_backend_shape() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail": "File not found."}"#).unwrap();
        assert_eq!(body.detail, "File not found.");
    }

    #[test]
    fn test_error_body_rejects_missing_detail() {
        let result = serde_json::from_str::<ErrorBody>(r#"{"message": "nope"}"#);
        assert!(result.is_err());
    }
}
