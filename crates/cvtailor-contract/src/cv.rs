//! CV upload, parsing, and profile-comparison schemas (`/cv/*`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response of `POST /cv/upload/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
    #[serde(default)]
    pub status: String,
}

/// Body for `POST /cv/parse/`: names a previously uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseRequest {
    pub filename: String,
}

/// Response of `POST /cv/parse/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResponse {
    pub parsed_data: CvData,
    #[serde(default)]
    pub status: String,
}

/// Structured CV extracted by the backend.
///
/// Every field is defaulted: extraction quality varies per document and the
/// backend omits whatever it could not recover.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CvData {
    #[serde(default)]
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub skills: SkillSet,
    #[serde(default)]
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub year: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillSet {
    #[serde(default)]
    pub technical: Vec<String>,
    #[serde(default)]
    pub soft: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
}

/// Body for `POST /cv/rag/compare/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagCompareRequest {
    pub filename: String,
    pub user_id: String,
    pub embedding: Vec<f32>,
}

/// Response of `POST /cv/rag/compare/`: peer matches and a benchmark.
///
/// The benchmark and match payloads are backend-shaped analytics the client
/// renders verbatim, so they stay loosely typed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagComparison {
    #[serde(default)]
    pub upsert: Value,
    #[serde(default)]
    pub similar_professionals: Vec<Value>,
    #[serde(default)]
    pub benchmark: Value,
}

/// Body for `POST /cv/rag/analyze/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagAnalyzeRequest {
    pub cv_data: CvData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_type: Option<String>,
}

/// Response of `POST /cv/rag/analyze/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagAnalysis {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub user_profile: Value,
    #[serde(default)]
    pub benchmark: Value,
    #[serde(default)]
    pub improvement_suggestions: Vec<String>,
    #[serde(default)]
    pub similar_professionals: Vec<Value>,
    #[serde(default)]
    pub industry_insights: Value,
    #[serde(default)]
    pub match_score: f64,
    #[serde(default)]
    pub recommendations: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_response_parses_backend_shape() {
        let resp: UploadResponse =
            serde_json::from_str(r#"{"filename": "cv.pdf", "status": "uploaded"}"#).unwrap();
        assert_eq!(resp.filename, "cv.pdf");
        assert_eq!(resp.status, "uploaded");
    }

    #[test]
    fn test_parse_response_with_partial_extraction() {
        // Only what the extractor recovered; everything else defaults.
        let raw = r#"{
            "parsed_data": {
                "personal_info": {"name": "Jane Doe", "email": "jane@example.com"},
                "experience": [
                    {"title": "Engineer", "company": "Acme", "duration": "2020-2024"}
                ],
                "skills": {"technical": ["Python", "SQL"]}
            },
            "status": "success"
        }"#;
        let resp: ParseResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.parsed_data.personal_info.name, "Jane Doe");
        assert_eq!(resp.parsed_data.experience.len(), 1);
        assert_eq!(resp.parsed_data.experience[0].description, "");
        assert_eq!(resp.parsed_data.skills.technical, vec!["Python", "SQL"]);
        assert!(resp.parsed_data.education.is_empty());
        assert_eq!(resp.parsed_data.summary, "");
    }

    #[test]
    fn test_cv_data_round_trips_through_json() {
        let data = CvData {
            personal_info: PersonalInfo {
                name: "Jane Doe".to_string(),
                email: "jane@example.com".to_string(),
                ..Default::default()
            },
            summary: "Backend engineer.".to_string(),
            ..Default::default()
        };
        let raw = serde_json::to_string(&data).unwrap();
        let back: CvData = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, data);
        // Absent optional links are omitted, not serialized as null.
        assert!(!raw.contains("linkedin"));
    }

    #[test]
    fn test_rag_analysis_tolerates_loose_payloads() {
        let raw = r#"{
            "status": "success",
            "benchmark": {"seniority": "senior", "percentile": 82},
            "improvement_suggestions": ["Quantify achievements"],
            "match_score": 0.78
        }"#;
        let analysis: RagAnalysis = serde_json::from_str(raw).unwrap();
        assert_eq!(analysis.improvement_suggestions.len(), 1);
        assert!((analysis.match_score - 0.78).abs() < f64::EPSILON);
        assert_eq!(analysis.benchmark["seniority"], "senior");
        assert!(analysis.similar_professionals.is_empty());
    }

    #[test]
    fn test_rag_analyze_request_omits_absent_analysis_type() {
        let req = RagAnalyzeRequest {
            cv_data: CvData::default(),
            analysis_type: None,
        };
        let raw = serde_json::to_string(&req).unwrap();
        assert!(!raw.contains("analysis_type"));
    }
}
