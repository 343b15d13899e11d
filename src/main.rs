use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use cvtailor::config::Config;

mod cmd;

#[derive(Parser)]
#[command(name = "cvtailor")]
#[command(
    version,
    about = "Upload, parse, and tailor your CV into ATS-ready resumes from the terminal"
)]
pub struct Cli {
    /// Backend API base URL (overrides config file and CVTAILOR_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print machine-readable JSON instead of styled text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the session token
    Login {
        /// Account email (prompted if omitted)
        email: Option<String>,
    },
    /// Create an account and sign in
    Register {
        /// Account email (prompted if omitted)
        email: Option<String>,

        /// Display name (the server derives one from the email if omitted)
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Discard the stored session token
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Upload a CV (pdf, docx, or txt)
    Upload { file: PathBuf },
    /// Parse the uploaded CV into structured data
    Parse,
    /// Show the pipeline stage and cached artifacts
    Status,
    /// Cancel in-flight work and clear the pipeline
    Reset,
    /// Compare the parsed CV against stored professional profiles
    Compare,
    /// Score the parsed CV for ATS compatibility
    Analyze {
        /// Target job title to score against
        #[arg(long)]
        job_title: Option<String>,
    },
    /// List available resume templates
    Templates,
    /// Generate an ATS-optimized resume from the parsed CV
    Generate {
        /// Template: clean, minimal, professional, or modern
        #[arg(long, default_value = "clean")]
        template: String,

        /// Target job title for keyword optimization
        #[arg(long)]
        job_title: Option<String>,

        /// Target industry for keyword optimization
        #[arg(long)]
        industry: Option<String>,

        /// Sections to include (comma-separated)
        #[arg(long, value_delimiter = ',')]
        sections: Option<Vec<String>>,

        /// Disable keyword optimization
        #[arg(long)]
        no_keyword_optimization: bool,
    },
    /// Download a generated resume as DOCX
    Download {
        /// Resume id (defaults to the last generated resume)
        resume_id: Option<String>,

        /// Output path (defaults to the server-provided filename)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default config.toml file
    Init,
}

/// Logs go to stderr so stdout stays clean for command output.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "cvtailor=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::with_cli_args(cli.api_url.clone(), cli.verbose, cli.json)
        .context("Failed to load configuration")?;

    match &cli.command {
        Commands::Login { email } => cmd::cmd_login(&config, email.clone()).await?,
        Commands::Register { email, username } => {
            cmd::cmd_register(&config, email.clone(), username.clone()).await?
        }
        Commands::Logout => cmd::cmd_logout(&config)?,
        Commands::Whoami => cmd::cmd_whoami(&config).await?,
        Commands::Upload { file } => cmd::cmd_upload(&config, file).await?,
        Commands::Parse => cmd::cmd_parse(&config).await?,
        Commands::Status => cmd::cmd_status(&config)?,
        Commands::Reset => cmd::cmd_reset(&config).await?,
        Commands::Compare => cmd::cmd_compare(&config).await?,
        Commands::Analyze { job_title } => cmd::cmd_analyze(&config, job_title.clone()).await?,
        Commands::Templates => cmd::cmd_templates(&config).await?,
        Commands::Generate {
            template,
            job_title,
            industry,
            sections,
            no_keyword_optimization,
        } => {
            cmd::cmd_generate(
                &config,
                template,
                job_title.clone(),
                industry.clone(),
                sections.clone(),
                *no_keyword_optimization,
            )
            .await?
        }
        Commands::Download { resume_id, output } => {
            cmd::cmd_download(&config, resume_id.clone(), output.clone()).await?
        }
        Commands::Config { command } => cmd::cmd_config(&config, command.clone())?,
    }

    Ok(())
}
