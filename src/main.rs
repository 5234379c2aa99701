//! git-issue-tracker
//!
//! Main entry point: serve the REST facade or run one issue operation.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use git_issue_tracker::config::{validate_config, validate_config_result, TrackerConfig};
use git_issue_tracker::server::IssueServer;
use git_issue_tracker::{
    GitHubAdapter, GitLabAdapter, IssueLister, IssueRequest, IssueTracker, Provider,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process;

/// Create, update, close and list issues on GitHub and GitLab
#[derive(Parser, Debug)]
#[command(name = "git-issue-tracker")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/git-issue-tracker/config.yaml)
    #[arg(short, long, env = "GIT_ISSUE_TRACKER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the REST dispatch server
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Create an issue
    Create {
        /// Provider (github, gitlab)
        provider: Provider,

        /// "owner/repo" for GitHub, project id or URL-encoded path for GitLab
        repository: String,

        #[arg(short, long)]
        title: String,

        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Replace the title and description of an issue
    Update {
        /// Provider (github, gitlab)
        provider: Provider,

        repository: String,

        /// Issue number (GitHub `number`, GitLab `iid`)
        issue_number: u64,

        #[arg(short, long)]
        title: String,

        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Close an issue
    Close {
        /// Provider (github, gitlab)
        provider: Provider,

        repository: String,

        issue_number: u64,
    },

    /// List the first page of a GitLab project's issues
    List {
        /// Project id or URL-encoded path
        repository: String,
    },

    /// Validate the configuration and report every problem found
    Check,

    /// Write a default configuration file
    Init,
}

fn main() {
    if let Err(e) = git_issue_tracker::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match (&cli.command, &cli.config) {
        (Commands::Init, _) => return handle_init(cli.config.clone()),
        (_, Some(path)) => TrackerConfig::load(path)?,
        (_, None) => TrackerConfig::load_or_default()?,
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    match cli.command {
        Commands::Serve { bind } => {
            validate_config_result(&config)?;
            let addr = bind.unwrap_or_else(|| config.server.bind.clone());
            let server = IssueServer::from_config(&config)?;
            runtime.block_on(server.run(&addr))?;
        }

        Commands::Create {
            provider,
            repository,
            title,
            description,
        } => {
            let request = IssueRequest::new(title, description);
            request.validate()?;
            let tracker = tracker_for(provider, &config)?;
            let response = runtime.block_on(tracker.create_issue(&repository, &request))?;
            print_json(&response)?;
        }

        Commands::Update {
            provider,
            repository,
            issue_number,
            title,
            description,
        } => {
            let request = IssueRequest::new(title, description);
            request.validate()?;
            let tracker = tracker_for(provider, &config)?;
            let response =
                runtime.block_on(tracker.update_issue(&repository, issue_number, &request))?;
            print_json(&response)?;
        }

        Commands::Close {
            provider,
            repository,
            issue_number,
        } => {
            let tracker = tracker_for(provider, &config)?;
            if !runtime.block_on(tracker.close_issue(&repository, issue_number)) {
                bail!(
                    "Could not close {} issue {}#{} (see log for details)",
                    provider,
                    repository,
                    issue_number
                );
            }
            println!("Closed {}#{}", repository, issue_number);
        }

        Commands::List { repository } => {
            let gitlab = GitLabAdapter::from_config(&config)?;
            let issues = runtime.block_on(gitlab.list_issues(&repository))?;
            print_json(&issues)?;
        }

        Commands::Check => match validate_config(&config) {
            Ok(()) => println!("Configuration OK"),
            Err(errors) => {
                for error in &errors {
                    eprintln!("  - {}", error);
                }
                bail!("{} configuration problem(s) found", errors.len());
            }
        },

        // Handled before the config is loaded
        Commands::Init => {}
    }

    Ok(())
}

fn tracker_for(provider: Provider, config: &TrackerConfig) -> anyhow::Result<Box<dyn IssueTracker>> {
    let tracker: Box<dyn IssueTracker> = match provider {
        Provider::GitHub => Box::new(GitHubAdapter::from_config(config)?),
        Provider::GitLab => Box::new(GitLabAdapter::from_config(config)?),
    };
    Ok(tracker)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_init(path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(TrackerConfig::default_path);

    if path.exists() {
        bail!("Config file already exists: {}", path.display());
    }

    TrackerConfig::new()
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Created {}", path.display());
    println!("Set GITHUB_TOKEN and GITLAB_TOKEN, or add tokens under git_services.");
    Ok(())
}
