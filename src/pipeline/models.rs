//! Pipeline state machine types.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::contract::{AtsGenerateResponse, AtsReport, CvData, RagComparison};

/// Where the document is in the pipeline.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Idle,
    Uploading,
    Uploaded,
    Parsing,
    Parsed,
    Error,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Uploading => "uploading",
            Self::Uploaded => "uploaded",
            Self::Parsing => "parsing",
            Self::Parsed => "parsed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "uploading" => Ok(Self::Uploading),
            "uploaded" => Ok(Self::Uploaded),
            "parsing" => Ok(Self::Parsing),
            "parsed" => Ok(Self::Parsed),
            "error" => Ok(Self::Error),
            _ => Err(format!("Invalid stage: {}", s)),
        }
    }
}

/// Validate that a stage transition is allowed.
///
/// `(Uploading, Uploading)` is the supersede edge: a fresh upload replaces
/// one still in flight. Every stage may reset to `Idle`.
pub fn is_valid_transition(from: Stage, to: Stage) -> bool {
    matches!(
        (from, to),
        (_, Stage::Idle)
            | (Stage::Idle, Stage::Uploading)
            | (Stage::Error, Stage::Uploading)
            | (Stage::Uploading, Stage::Uploading)
            | (Stage::Uploading, Stage::Uploaded)
            | (Stage::Uploading, Stage::Error)
            | (Stage::Uploaded, Stage::Parsing)
            | (Stage::Parsing, Stage::Parsed)
            | (Stage::Parsing, Stage::Error)
    )
}

/// Everything derived from the current document. Filled field by field as
/// operations complete; cleared wholesale by `reset()`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CvArtifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed: Option<CvData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<RagComparison>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AtsReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated: Option<AtsGenerateResponse>,
}

impl CvArtifact {
    pub fn is_empty(&self) -> bool {
        self.parsed.is_none()
            && self.comparison.is_none()
            && self.analysis.is_none()
            && self.generated.is_none()
    }
}

/// Last failure per enrichment operation. Kept apart from the pipeline-level
/// `error` so a failed comparison does not disturb parsed data or the stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichmentErrors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyze: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download: Option<String>,
}

/// Observable pipeline snapshot. Serializable so the CLI can carry it
/// between invocations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineState {
    #[serde(default)]
    pub stage: Stage,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub artifact: CvArtifact,
    #[serde(default)]
    pub enrichment_errors: EnrichmentErrors,
}

impl PipelineState {
    /// Settles a loaded snapshot that still carries an in-flight stage (the
    /// writer died mid-operation). An interrupted upload falls back to
    /// `idle`; an interrupted parse still has a server-side file, so it
    /// falls back to `uploaded`.
    pub fn settle(mut self) -> Self {
        match self.stage {
            Stage::Uploading => {
                self.stage = Stage::Idle;
                self.filename = None;
            }
            Stage::Parsing => {
                self.stage = Stage::Uploaded;
            }
            _ => {}
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_roundtrip() {
        for s in &["idle", "uploading", "uploaded", "parsing", "parsed", "error"] {
            let parsed: Stage = s.parse().unwrap();
            assert_eq!(parsed.as_str(), *s);
        }
        assert!("invalid".parse::<Stage>().is_err());
    }

    #[test]
    fn test_stage_serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&Stage::Parsed).unwrap(), "\"parsed\"");
        assert_eq!(
            serde_json::from_str::<Stage>("\"uploading\"").unwrap(),
            Stage::Uploading
        );
    }

    #[test]
    fn test_valid_transitions() {
        assert!(is_valid_transition(Stage::Idle, Stage::Uploading));
        assert!(is_valid_transition(Stage::Error, Stage::Uploading));
        assert!(is_valid_transition(Stage::Uploading, Stage::Uploading));
        assert!(is_valid_transition(Stage::Uploading, Stage::Uploaded));
        assert!(is_valid_transition(Stage::Uploading, Stage::Error));
        assert!(is_valid_transition(Stage::Uploaded, Stage::Parsing));
        assert!(is_valid_transition(Stage::Parsing, Stage::Parsed));
        assert!(is_valid_transition(Stage::Parsing, Stage::Error));
        // Reset is always allowed.
        assert!(is_valid_transition(Stage::Parsed, Stage::Idle));
        assert!(is_valid_transition(Stage::Uploading, Stage::Idle));
        assert!(is_valid_transition(Stage::Error, Stage::Idle));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!is_valid_transition(Stage::Idle, Stage::Parsing));
        assert!(!is_valid_transition(Stage::Idle, Stage::Parsed));
        assert!(!is_valid_transition(Stage::Uploaded, Stage::Uploading));
        assert!(!is_valid_transition(Stage::Parsed, Stage::Uploading));
        assert!(!is_valid_transition(Stage::Parsed, Stage::Parsing));
        assert!(!is_valid_transition(Stage::Parsing, Stage::Parsing));
        assert!(!is_valid_transition(Stage::Error, Stage::Parsing));
        assert!(!is_valid_transition(Stage::Uploaded, Stage::Parsed));
    }

    #[test]
    fn test_default_state_is_idle_and_empty() {
        let state = PipelineState::default();
        assert_eq!(state.stage, Stage::Idle);
        assert!(state.filename.is_none());
        assert!(state.error.is_none());
        assert!(state.artifact.is_empty());
    }

    #[test]
    fn test_settle_rolls_back_interrupted_stages() {
        let interrupted_upload = PipelineState {
            stage: Stage::Uploading,
            filename: Some("cv.pdf".to_string()),
            ..Default::default()
        };
        let settled = interrupted_upload.settle();
        assert_eq!(settled.stage, Stage::Idle);
        assert!(settled.filename.is_none());

        let interrupted_parse = PipelineState {
            stage: Stage::Parsing,
            filename: Some("cv.pdf".to_string()),
            ..Default::default()
        };
        let settled = interrupted_parse.settle();
        assert_eq!(settled.stage, Stage::Uploaded);
        assert_eq!(settled.filename.as_deref(), Some("cv.pdf"));

        let stable = PipelineState {
            stage: Stage::Parsed,
            filename: Some("cv.pdf".to_string()),
            ..Default::default()
        };
        assert_eq!(stable.settle().stage, Stage::Parsed);
    }

    #[test]
    fn test_state_snapshot_survives_serialization() {
        let mut state = PipelineState {
            stage: Stage::Parsed,
            filename: Some("cv.pdf".to_string()),
            ..Default::default()
        };
        state.artifact.parsed = Some(crate::contract::CvData {
            summary: "Backend engineer.".to_string(),
            ..Default::default()
        });
        state.enrichment_errors.compare = Some("service unavailable".to_string());

        let raw = serde_json::to_string(&state).unwrap();
        let back: PipelineState = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.stage, Stage::Parsed);
        assert_eq!(back.filename.as_deref(), Some("cv.pdf"));
        assert_eq!(
            back.artifact.parsed.as_ref().unwrap().summary,
            "Backend engineer."
        );
        assert_eq!(
            back.enrichment_errors.compare.as_deref(),
            Some("service unavailable")
        );
        // Untouched artifact slots stay out of the serialized form.
        assert!(!raw.contains("generated"));
    }
}
