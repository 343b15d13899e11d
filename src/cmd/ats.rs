//! Resume template and generation commands: `cvtailor templates`,
//! `generate`, `download`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;

use cvtailor::client::Client;
use cvtailor::config::Config;
use cvtailor::contract::TemplateKind;
use cvtailor::pipeline::GenerateOptions;
use cvtailor::ui;

use super::{pipeline_client, save_pipeline};

pub async fn cmd_templates(config: &Config) -> Result<()> {
    let client = Client::new(config)?;

    let spinner = ui::spinner("Fetching templates...");
    let result = client.gateway.ats_templates().await;
    spinner.finish_and_clear();

    let response = result.context("Could not fetch templates")?;
    if config.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!();
    for (id, template) in &response.templates {
        println!("{}  {}", style(id).cyan().bold(), template.name);
        if !template.description.is_empty() {
            println!("    {}", style(&template.description).dim());
        }
        if !template.features.is_empty() {
            println!("    {}", template.features.join(", "));
        }
        println!();
    }
    Ok(())
}

pub async fn cmd_generate(
    config: &Config,
    template: &str,
    job_title: Option<String>,
    industry: Option<String>,
    sections: Option<Vec<String>>,
    no_keyword_optimization: bool,
) -> Result<()> {
    let template: TemplateKind = template.parse()?;
    let client = pipeline_client(config)?;

    let options = GenerateOptions {
        template,
        target_job_title: job_title,
        target_industry: industry,
        sections,
        keyword_optimization: no_keyword_optimization.then_some(false),
    };

    let spinner = ui::spinner("Generating resume...");
    let result = client.pipeline.generate(options).await;
    spinner.finish_and_clear();
    save_pipeline(config, &client)?;

    let resume = result.context("Generation failed")?;
    if config.json {
        println!("{}", serde_json::to_string_pretty(&resume)?);
        return Ok(());
    }
    ui::success(format!(
        "Resume {} generated (ATS score {:.0}/100)",
        resume.resume_id, resume.ats_score
    ));
    if !resume.optimization_suggestions.is_empty() {
        println!();
        println!("Suggestions:");
        for suggestion in &resume.optimization_suggestions {
            println!("  - {}", suggestion);
        }
    }
    ui::note("run 'cvtailor download' to save the document");
    Ok(())
}

pub async fn cmd_download(
    config: &Config,
    resume_id: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let client = pipeline_client(config)?;

    let spinner = ui::spinner("Downloading resume...");
    let result = match resume_id.as_deref() {
        // Explicit id: a direct fetch that skips pipeline bookkeeping.
        Some(id) => client.gateway.ats_download(id).await,
        None => client.pipeline.download().await,
    };
    spinner.finish_and_clear();
    save_pipeline(config, &client)?;

    let file = result.context("Download failed")?;
    let path = output.unwrap_or_else(|| {
        PathBuf::from(
            file.filename
                .clone()
                .unwrap_or_else(|| "resume.docx".to_string()),
        )
    });
    std::fs::write(&path, &file.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    ui::success(format!(
        "Saved {} ({} bytes)",
        path.display(),
        file.bytes.len()
    ));
    Ok(())
}
