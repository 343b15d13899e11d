//! ATS resume generation and scoring schemas (`/ats/*`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cv::CvData;

/// Resume template identifier accepted by `POST /ats/generate/`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    #[default]
    Clean,
    Minimal,
    Professional,
    Modern,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Clean => "clean",
            TemplateKind::Minimal => "minimal",
            TemplateKind::Professional => "professional",
            TemplateKind::Modern => "modern",
        }
    }
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TemplateKind {
    type Err = UnknownTemplate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clean" => Ok(TemplateKind::Clean),
            "minimal" => Ok(TemplateKind::Minimal),
            "professional" => Ok(TemplateKind::Professional),
            "modern" => Ok(TemplateKind::Modern),
            other => Err(UnknownTemplate(other.to_string())),
        }
    }
}

/// Error for template names the backend does not define.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown template '{0}' (expected clean, minimal, professional, or modern)")]
pub struct UnknownTemplate(String);

/// One entry of the template catalog served by `GET /ats/templates/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtsTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub sections_order: Vec<String>,
    #[serde(default)]
    pub font: String,
    #[serde(default)]
    pub font_size: u32,
    #[serde(default)]
    pub spacing: f64,
}

/// Response of `GET /ats/templates/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesResponse {
    #[serde(default)]
    pub status: String,
    pub templates: BTreeMap<String, AtsTemplate>,
}

/// Body for `POST /ats/generate/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtsGenerateRequest {
    pub cv_data: CvData,
    #[serde(default)]
    pub template_type: TemplateKind,
    #[serde(default = "default_sections")]
    pub include_sections: Vec<String>,
    #[serde(default = "default_keyword_optimization")]
    pub keyword_optimization: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_industry: Option<String>,
}

fn default_sections() -> Vec<String> {
    ["contact", "summary", "experience", "education", "skills"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_keyword_optimization() -> bool {
    true
}

impl AtsGenerateRequest {
    /// Request with the backend's documented defaults for everything but the
    /// CV payload.
    pub fn new(cv_data: CvData) -> Self {
        Self {
            cv_data,
            template_type: TemplateKind::default(),
            include_sections: default_sections(),
            keyword_optimization: default_keyword_optimization(),
            target_job_title: None,
            target_industry: None,
        }
    }
}

/// Response of `POST /ats/generate/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtsGenerateResponse {
    #[serde(default)]
    pub status: String,
    pub resume_id: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub download_url: String,
    #[serde(default)]
    pub preview_text: String,
    #[serde(default)]
    pub ats_score: f64,
    #[serde(default)]
    pub optimization_suggestions: Vec<String>,
    #[serde(default)]
    pub keyword_density: BTreeMap<String, u32>,
}

/// Response of `POST /ats/analyze/`: compatibility score without generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtsReport {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub ats_score: f64,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub keyword_matches: BTreeMap<String, u32>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub missing_keywords: Vec<String>,
}
