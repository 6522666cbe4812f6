//! repo-seeder — 批量创建 Issue、项目与讨论的命令行工具
//!
//! Usage:
//!   repo-seeder issues [--kinds <file>] [--data-dir <dir>] [--project-ids <file>] [--output <file>] [--only <kind>]
//!   repo-seeder projects [--plan <file>] [--output <file>]
//!   repo-seeder discussions [--dir <dir>] [--category <name>]
//!   repo-seeder readme-links [--plan <file>] [--readme <file>] [--output <file>]
//!   repo-seeder rate-limit
//!
//! Credentials come from `TEAM_SETUP_TOKEN` (or the OS keyring) and
//! `GITHUB_REPOSITORY`. Exit code 1 on a fatal error.

use anyhow::Context;
use clap::{Parser, Subcommand};
use repo_seeder::client::check_initial_rate_limit;
use repo_seeder::config::{IssueKindsConfig, PipelineSettings, SeederConfig};
use repo_seeder::transport::HttpTransport;
use repo_seeder::workflow::{
    discussions, issues, projects, readme, DiscussionsOptions, IssuesOptions, LinkPlan, ProjectPlan,
    ProjectsOptions, ReadmeOptions,
};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "repo-seeder")]
#[command(version)]
#[command(about = "Seed a GitHub repository with issues, projects and discussions")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Pipeline settings file (.json, .yaml, .yml)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create issues from CSV files in rate-limited batches
    Issues {
        /// Issue kinds file; defaults to task / test / kpt
        #[arg(long)]
        kinds: Option<PathBuf>,
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        #[arg(long, default_value = "project_ids.txt")]
        project_ids: PathBuf,
        #[arg(long, default_value = "issue_creation_result.txt")]
        output: PathBuf,
        /// Only create issues of this kind
        #[arg(long)]
        only: Option<String>,
    },
    /// Create or reuse projects and their fields
    Projects {
        #[arg(long)]
        plan: Option<PathBuf>,
        #[arg(long, default_value = "project_ids.txt")]
        output: PathBuf,
    },
    /// Publish markdown files as discussions
    Discussions {
        #[arg(long, default_value = "wiki")]
        dir: PathBuf,
        #[arg(long, default_value = "General")]
        category: String,
    },
    /// Fill `[text](#)` placeholders in the README with project, issue and discussion URLs
    ReadmeLinks {
        /// Link rules file; defaults to the kickoff board and issue links
        #[arg(long)]
        plan: Option<PathBuf>,
        #[arg(long, default_value = "README.md")]
        readme: PathBuf,
        #[arg(long, default_value = "readme_links_result.txt")]
        output: PathBuf,
    },
    /// Show the remaining REST quota
    RateLimit,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = SeederConfig::from_env().context("loading credentials")?;
    if let Some(path) = &cli.settings {
        let settings = PipelineSettings::from_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?;
        config = config.with_settings(settings)?;
    }

    match cli.command {
        Commands::Issues {
            kinds,
            data_dir,
            project_ids,
            output,
            only,
        } => {
            let mut kinds = match kinds {
                Some(path) => IssueKindsConfig::from_file_or_default(path)?,
                None => IssueKindsConfig::default(),
            };
            if let Some(name) = only {
                kinds = kinds.only(&name)?;
            }
            let options = IssuesOptions {
                kinds,
                data_dir,
                project_ids,
                output,
            };
            issues::run(&config, &options).await?;
        }
        Commands::Projects { plan, output } => {
            let plan = ProjectPlan::from_file_or_default(plan.as_deref())?;
            projects::run(&config, &ProjectsOptions { plan, output }).await?;
        }
        Commands::Discussions { dir, category } => {
            discussions::run(&config, &DiscussionsOptions { dir, category }).await?;
        }
        Commands::ReadmeLinks {
            plan,
            readme: path,
            output,
        } => {
            let plan = LinkPlan::from_file_or_default(plan.as_deref())?;
            let options = ReadmeOptions {
                plan,
                readme: path,
                output,
            };
            readme::run(&config, &options).await?;
        }
        Commands::RateLimit => {
            let transport = HttpTransport::new(&config)?;
            let snapshot = check_initial_rate_limit(&transport).await?;
            snapshot.report();
        }
    }
    Ok(())
}
