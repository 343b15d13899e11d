//! Document pipeline commands: `cvtailor upload`, `parse`, `status`,
//! `reset`, `compare`, and `analyze`.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use cvtailor::client;
use cvtailor::config::Config;
use cvtailor::ui;

use super::{pipeline_client, save_pipeline};

pub async fn cmd_upload(config: &Config, file: &Path) -> Result<()> {
    let client = pipeline_client(config)?;

    let spinner = ui::spinner(&format!("Uploading {}...", file.display()));
    let result = client.pipeline.upload(file).await;
    spinner.finish_and_clear();
    save_pipeline(config, &client)?;

    let filename = result.context("Upload failed")?;
    ui::success(format!("Uploaded {}", filename));
    ui::note("run 'cvtailor parse' to extract the structured CV");
    Ok(())
}

pub async fn cmd_parse(config: &Config) -> Result<()> {
    let client = pipeline_client(config)?;

    let spinner = ui::spinner("Parsing CV...");
    let result = client.pipeline.parse().await;
    spinner.finish_and_clear();
    save_pipeline(config, &client)?;

    let cv = result.context("Parse failed")?;
    if config.json {
        println!("{}", serde_json::to_string_pretty(&cv)?);
        return Ok(());
    }
    ui::success("CV parsed");
    if !cv.personal_info.name.is_empty() {
        ui::note(format!("name: {}", cv.personal_info.name));
    }
    ui::note(format!(
        "{} roles, {} education entries, {} technical skills",
        cv.experience.len(),
        cv.education.len(),
        cv.skills.technical.len()
    ));
    Ok(())
}

/// Renders the persisted snapshot; never touches the network.
pub fn cmd_status(config: &Config) -> Result<()> {
    let state = client::load_pipeline_state(&config.pipeline_cache_path());
    if config.json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    println!();
    println!("Pipeline status");
    println!("===============");
    println!();
    println!("  stage: {}", style(state.stage).cyan());
    if let Some(ref filename) = state.filename {
        println!("  file:  {}{}", ui::DOC, filename);
    }
    if let Some(ref error) = state.error {
        println!("  error: {}", style(error).red());
    }

    println!();
    println!(
        "  parsed: {}   comparison: {}   analysis: {}   resume: {}",
        mark(state.artifact.parsed.is_some()),
        mark(state.artifact.comparison.is_some()),
        mark(state.artifact.analysis.is_some()),
        mark(state.artifact.generated.is_some()),
    );

    let failures = [
        ("compare", &state.enrichment_errors.compare),
        ("analyze", &state.enrichment_errors.analyze),
        ("generate", &state.enrichment_errors.generate),
        ("download", &state.enrichment_errors.download),
    ];
    if failures.iter().any(|(_, error)| error.is_some()) {
        println!();
        for (op, error) in failures {
            if let Some(error) = error {
                println!("  {} {}: {}", style("!").yellow(), op, style(error).yellow());
            }
        }
    }
    println!();
    Ok(())
}

pub async fn cmd_reset(config: &Config) -> Result<()> {
    let client = pipeline_client(config)?;
    client.pipeline.reset().await;
    save_pipeline(config, &client)?;
    ui::success("Pipeline reset");
    Ok(())
}

pub async fn cmd_compare(config: &Config) -> Result<()> {
    let client = pipeline_client(config)?;
    let user_id = config.user_id();

    let spinner = ui::spinner("Comparing against stored profiles...");
    let result = client.pipeline.compare(&user_id).await;
    spinner.finish_and_clear();
    save_pipeline(config, &client)?;

    let comparison = result.context("Comparison failed")?;
    if config.json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
        return Ok(());
    }
    ui::success("Comparison complete");
    ui::note(format!(
        "{} similar professionals found",
        comparison.similar_professionals.len()
    ));
    if !comparison.benchmark.is_null() {
        ui::note("benchmark available; rerun with --json for details");
    }
    Ok(())
}

pub async fn cmd_analyze(config: &Config, job_title: Option<String>) -> Result<()> {
    let client = pipeline_client(config)?;

    let spinner = ui::spinner("Scoring for ATS compatibility...");
    let result = client.pipeline.analyze(job_title.as_deref()).await;
    spinner.finish_and_clear();
    save_pipeline(config, &client)?;

    let report = result.context("Analysis failed")?;
    if config.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    ui::success(format!("ATS score: {:.0}/100", report.ats_score));
    if !report.industry.is_empty() {
        ui::note(format!("industry: {}", report.industry));
    }
    if !report.suggestions.is_empty() {
        println!();
        println!("Suggestions:");
        for suggestion in &report.suggestions {
            println!("  - {}", suggestion);
        }
    }
    if !report.missing_keywords.is_empty() {
        println!();
        ui::note(format!(
            "missing keywords: {}",
            report.missing_keywords.join(", ")
        ));
    }
    Ok(())
}

fn mark(present: bool) -> String {
    if present {
        style("yes").green().to_string()
    } else {
        style("-").dim().to_string()
    }
}
