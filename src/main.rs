use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use release_cycle::cli::{run_release_workflow, ReleaseWorkflowArgs, WorkflowResult};
use release_cycle::config;
use release_cycle::git::Git2Repository;
use release_cycle::hosting::GitHubClient;
use release_cycle::ui;

#[derive(clap::Parser)]
#[command(
    name = "release-cycle",
    version,
    about = "Bump, tag and draft prereleases, then advance the default branch after a release"
)]
struct Args {
    #[arg(long, env = "INPUT_ACTION", help = "Release action: prerelease or postrelease")]
    action: String,

    #[arg(
        long,
        env = "INPUT_VERSION-FILE",
        help = "JSON file holding the version, relative to the working directory"
    )]
    version_file: PathBuf,

    #[arg(
        long,
        env = "INPUT_REPO-TOKEN",
        hide_env_values = true,
        help = "Token used for pushes and GitHub API requests"
    )]
    repo_token: String,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(result) => ui::display_outcome(&result),
        Err(e) => {
            let message = format!("{:#}", e);
            ui::display_error(&message);
            if std::env::var("GITHUB_ACTIONS").as_deref() == Ok("true") {
                println!("{}", ui::github_error_annotation(&message));
            }
            std::process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<WorkflowResult> {
    let config = config::load_config(args.config.as_deref())?;

    let mut repo = Git2Repository::open(".")
        .context("Not inside a git repository")?
        .with_token(args.repo_token.clone());
    let hosting = GitHubClient::new(args.repo_token, config.github.api_base.clone());

    let workflow_args = ReleaseWorkflowArgs {
        action: args.action,
        version_file: args.version_file,
    };

    ui::display_status(&format!("Running {}", workflow_args.action));
    let result = run_release_workflow(&mut repo, &hosting, &workflow_args, &config)?;
    Ok(result)
}
