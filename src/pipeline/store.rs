//! Pipeline operations against the backend.
//!
//! Every operation follows the same shape: validate and transition under the
//! state lock, register a cancellation ticket, run the request, then apply
//! the outcome only if the ticket is still current and the stage still
//! permits it. A completion that lost its ticket resolves to `Aborted` and
//! leaves state untouched.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;

use crate::cancel::{CancellationController, OpKind, OpTicket};
use crate::contract::{
    AtsGenerateRequest, AtsGenerateResponse, AtsReport, CvData, RagCompareRequest, RagComparison,
    TemplateKind,
};
use crate::errors::{ApiError, ApiResult};
use crate::gateway::{ApiGateway, DownloadedFile};
use crate::pipeline::models::{PipelineState, Stage, is_valid_transition};

const ALLOWED_EXTENSIONS: [&str; 3] = ["pdf", "docx", "txt"];

/// Caller-tunable knobs for resume generation. Unset fields fall back to the
/// backend's documented defaults.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub template: TemplateKind,
    pub target_job_title: Option<String>,
    pub target_industry: Option<String>,
    pub sections: Option<Vec<String>>,
    pub keyword_optimization: Option<bool>,
}

/// Drives one document through the pipeline and owns its observable state.
pub struct PipelineStore {
    gateway: Arc<ApiGateway>,
    cancel: CancellationController,
    state: watch::Sender<PipelineState>,
}

impl PipelineStore {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self::with_state(gateway, PipelineState::default())
    }

    /// Resumes from a previously captured snapshot. Callers loading from
    /// disk should [`settle`] it first.
    ///
    /// [`settle`]: PipelineState::settle
    pub fn with_state(gateway: Arc<ApiGateway>, state: PipelineState) -> Self {
        let (state, _) = watch::channel(state);
        Self {
            gateway,
            cancel: CancellationController::new(),
            state,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    /// Reads the file, validates its extension client-side, and uploads it.
    /// Starting a second upload while one is in flight supersedes the first;
    /// the superseded call resolves to `Aborted`.
    pub async fn upload(&self, path: &Path) -> ApiResult<String> {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                ApiError::validation(format!("'{}' has no usable filename", path.display()))
            })?
            .to_string();
        validate_extension(&filename)?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::validation(format!("could not read '{}': {e}", path.display())))?;

        self.begin_upload(&filename)?;
        let mut ticket = self.cancel.begin(OpKind::Upload).await;

        let result = self
            .run_cancellable(&mut ticket, self.gateway.upload_cv(&filename, bytes))
            .await;

        if !self.cancel.finish(OpKind::Upload, ticket.id).await {
            tracing::debug!(op = "upload", "discarding superseded completion");
            return Err(ApiError::Aborted);
        }

        match result {
            Ok(response) => {
                let confirmed = response.filename;
                let mut applied = false;
                self.state.send_if_modified(|state| {
                    if !is_valid_transition(state.stage, Stage::Uploaded) {
                        return false;
                    }
                    state.stage = Stage::Uploaded;
                    state.filename = Some(confirmed.clone());
                    state.error = None;
                    applied = true;
                    true
                });
                if !applied {
                    return Err(ApiError::Aborted);
                }
                tracing::info!(filename = %confirmed, "upload complete");
                Ok(confirmed)
            }
            Err(err) => {
                if !err.is_aborted() {
                    self.fail(OpKind::Upload, err.to_string());
                }
                Err(err)
            }
        }
    }

    /// Parses the uploaded file on the backend and caches the structured CV.
    pub async fn parse(&self) -> ApiResult<CvData> {
        let filename = self.begin_parse()?;
        let mut ticket = self.cancel.begin(OpKind::Parse).await;

        let result = self
            .run_cancellable(&mut ticket, self.gateway.parse_cv(&filename))
            .await;

        if !self.cancel.finish(OpKind::Parse, ticket.id).await {
            tracing::debug!(op = "parse", "discarding superseded completion");
            return Err(ApiError::Aborted);
        }

        match result {
            Ok(response) => {
                let parsed = response.parsed_data;
                let mut applied = false;
                self.state.send_if_modified(|state| {
                    if !is_valid_transition(state.stage, Stage::Parsed) {
                        return false;
                    }
                    state.stage = Stage::Parsed;
                    state.error = None;
                    state.artifact.parsed = Some(parsed.clone());
                    applied = true;
                    true
                });
                if !applied {
                    return Err(ApiError::Aborted);
                }
                tracing::info!(filename = %filename, "parse complete");
                Ok(parsed)
            }
            Err(err) => {
                if !err.is_aborted() {
                    self.fail(OpKind::Parse, err.to_string());
                }
                Err(err)
            }
        }
    }

    /// Compares the parsed CV against stored professional profiles. The
    /// backend computes the embedding server-side; the client sends the
    /// uploaded filename and identity only.
    pub async fn compare(&self, user_id: &str) -> ApiResult<RagComparison> {
        let filename = {
            let state = self.state.borrow();
            if state.stage != Stage::Parsed {
                return Err(not_parsed(state.stage));
            }
            state
                .filename
                .clone()
                .ok_or_else(|| ApiError::validation("no uploaded filename recorded"))?
        };

        let request = RagCompareRequest {
            filename,
            user_id: user_id.to_string(),
            embedding: Vec::new(),
        };

        let mut ticket = self.cancel.begin(OpKind::Compare).await;
        let result = self
            .run_cancellable(&mut ticket, self.gateway.rag_compare(&request))
            .await;
        if !self.cancel.finish(OpKind::Compare, ticket.id).await {
            return Err(ApiError::Aborted);
        }

        match result {
            Ok(comparison) => {
                self.apply_enrichment(|artifact_state| {
                    artifact_state.artifact.comparison = Some(comparison.clone());
                    artifact_state.enrichment_errors.compare = None;
                });
                Ok(comparison)
            }
            Err(err) => {
                if !err.is_aborted() {
                    self.record_enrichment_error(OpKind::Compare, err.to_string());
                }
                Err(err)
            }
        }
    }

    /// Scores the parsed CV for ATS compatibility, optionally against a
    /// target job title.
    pub async fn analyze(&self, target_job_title: Option<&str>) -> ApiResult<AtsReport> {
        let cv_data = self.parsed_cv()?;

        let mut ticket = self.cancel.begin(OpKind::Analyze).await;
        let result = self
            .run_cancellable(
                &mut ticket,
                self.gateway.ats_analyze(&cv_data, target_job_title),
            )
            .await;
        if !self.cancel.finish(OpKind::Analyze, ticket.id).await {
            return Err(ApiError::Aborted);
        }

        match result {
            Ok(report) => {
                self.apply_enrichment(|state| {
                    state.artifact.analysis = Some(report.clone());
                    state.enrichment_errors.analyze = None;
                });
                Ok(report)
            }
            Err(err) => {
                if !err.is_aborted() {
                    self.record_enrichment_error(OpKind::Analyze, err.to_string());
                }
                Err(err)
            }
        }
    }

    /// Generates an ATS-optimized resume from the parsed CV.
    pub async fn generate(&self, options: GenerateOptions) -> ApiResult<AtsGenerateResponse> {
        let cv_data = self.parsed_cv()?;

        let mut request = AtsGenerateRequest::new(cv_data);
        request.template_type = options.template;
        request.target_job_title = options.target_job_title;
        request.target_industry = options.target_industry;
        if let Some(sections) = options.sections {
            request.include_sections = sections;
        }
        if let Some(keyword_optimization) = options.keyword_optimization {
            request.keyword_optimization = keyword_optimization;
        }

        let mut ticket = self.cancel.begin(OpKind::Generate).await;
        let result = self
            .run_cancellable(&mut ticket, self.gateway.ats_generate(&request))
            .await;
        if !self.cancel.finish(OpKind::Generate, ticket.id).await {
            return Err(ApiError::Aborted);
        }

        match result {
            Ok(response) => {
                self.apply_enrichment(|state| {
                    state.artifact.generated = Some(response.clone());
                    state.enrichment_errors.generate = None;
                });
                tracing::info!(resume_id = %response.resume_id, "resume generated");
                Ok(response)
            }
            Err(err) => {
                if !err.is_aborted() {
                    self.record_enrichment_error(OpKind::Generate, err.to_string());
                }
                Err(err)
            }
        }
    }

    /// Fetches the document produced by the last [`generate`] call.
    ///
    /// [`generate`]: PipelineStore::generate
    pub async fn download(&self) -> ApiResult<DownloadedFile> {
        let resume_id = {
            let state = self.state.borrow();
            if state.stage != Stage::Parsed {
                return Err(not_parsed(state.stage));
            }
            state
                .artifact
                .generated
                .as_ref()
                .map(|generated| generated.resume_id.clone())
                .ok_or_else(|| {
                    ApiError::validation("no generated resume to download; run generate first")
                })?
        };

        let mut ticket = self.cancel.begin(OpKind::Download).await;
        let result = self
            .run_cancellable(&mut ticket, self.gateway.ats_download(&resume_id))
            .await;
        if !self.cancel.finish(OpKind::Download, ticket.id).await {
            return Err(ApiError::Aborted);
        }

        match result {
            Ok(file) => {
                self.apply_enrichment(|state| {
                    state.enrichment_errors.download = None;
                });
                Ok(file)
            }
            Err(err) => {
                if !err.is_aborted() {
                    self.record_enrichment_error(OpKind::Download, err.to_string());
                }
                Err(err)
            }
        }
    }

    /// Cancels anything in flight and returns to a pristine idle state.
    pub async fn reset(&self) {
        self.cancel.cancel_all().await;
        self.state.send_modify(|state| *state = PipelineState::default());
        tracing::info!("pipeline reset");
    }

    fn begin_upload(&self, filename: &str) -> ApiResult<()> {
        let mut outcome = Ok(());
        self.state.send_if_modified(|state| {
            if !is_valid_transition(state.stage, Stage::Uploading) {
                outcome = Err(ApiError::validation(format!(
                    "cannot upload while {}; reset the pipeline first",
                    state.stage
                )));
                return false;
            }
            // A new upload starts a new run; stale artifacts go with it.
            *state = PipelineState {
                stage: Stage::Uploading,
                filename: Some(filename.to_string()),
                ..Default::default()
            };
            true
        });
        outcome
    }

    fn begin_parse(&self) -> ApiResult<String> {
        let mut outcome = Err(ApiError::validation("nothing uploaded yet"));
        self.state.send_if_modified(|state| {
            if !is_valid_transition(state.stage, Stage::Parsing) {
                outcome = Err(ApiError::validation(format!(
                    "cannot parse while {}",
                    state.stage
                )));
                return false;
            }
            match &state.filename {
                Some(filename) => {
                    outcome = Ok(filename.clone());
                    state.stage = Stage::Parsing;
                    state.error = None;
                    true
                }
                None => {
                    outcome = Err(ApiError::validation("no uploaded file to parse"));
                    false
                }
            }
        });
        outcome
    }

    /// Snapshot of the parsed CV, or a `Validation` error naming the actual
    /// stage.
    fn parsed_cv(&self) -> ApiResult<CvData> {
        let state = self.state.borrow();
        if state.stage != Stage::Parsed {
            return Err(not_parsed(state.stage));
        }
        state
            .artifact
            .parsed
            .clone()
            .ok_or_else(|| ApiError::validation("no parsed CV data available"))
    }

    /// Applies an artifact mutation only while the pipeline is still parsed;
    /// a reset that happened mid-flight wins.
    fn apply_enrichment(&self, mutate: impl FnOnce(&mut PipelineState)) {
        self.state.send_if_modified(|state| {
            if state.stage != Stage::Parsed {
                tracing::debug!("discarding enrichment result for settled pipeline");
                return false;
            }
            mutate(state);
            true
        });
    }

    fn record_enrichment_error(&self, op: OpKind, message: String) {
        self.apply_enrichment(|state| {
            let slot = match op {
                OpKind::Compare => &mut state.enrichment_errors.compare,
                OpKind::Analyze => &mut state.enrichment_errors.analyze,
                OpKind::Generate => &mut state.enrichment_errors.generate,
                OpKind::Download => &mut state.enrichment_errors.download,
                OpKind::Upload | OpKind::Parse => return,
            };
            *slot = Some(message);
        });
    }

    /// Moves the pipeline to `error`, unless it already settled elsewhere.
    fn fail(&self, op: OpKind, message: String) {
        self.state.send_if_modified(|state| {
            if !is_valid_transition(state.stage, Stage::Error) {
                tracing::debug!(op = %op, "discarding failure for settled pipeline");
                return false;
            }
            state.stage = Stage::Error;
            state.error = Some(message);
            true
        });
    }

    async fn run_cancellable<T>(
        &self,
        ticket: &mut OpTicket,
        operation: impl Future<Output = ApiResult<T>>,
    ) -> ApiResult<T> {
        tokio::select! {
            _ = &mut ticket.cancelled => Err(ApiError::Aborted),
            result = operation => result,
        }
    }
}

fn not_parsed(stage: Stage) -> ApiError {
    ApiError::validation(format!("no parsed CV yet (pipeline is {stage})"))
}

fn validate_extension(filename: &str) -> ApiResult<()> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());
    match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(ApiError::validation(format!(
            "unsupported file type '{filename}' (allowed: pdf, docx, txt)"
        ))),
    }
}
