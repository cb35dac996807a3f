use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use org_onboarding::config::ClientConfig;
use org_onboarding::directory::{
    DirectoryClient, HttpDirectoryClient, ListLoader, snapshot_from_record,
};
use org_onboarding::gateway::{Gateway, HttpTransport};
use org_onboarding::persistence::PersistenceBridge;
use org_onboarding::store::LibSqlStore;
use org_onboarding::wizard::{Answers, ProceedOutcome, WizardShell};

#[derive(Parser, Debug)]
#[command(
    name = "org-onboard",
    version,
    about = "Drive the organization onboarding wizard against the backend",
    subcommand_required = true,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Submit all five steps from an answers file
    Run {
        /// JSON answers file (field groups plus an `attachments` map)
        #[arg(value_name = "ANSWERS")]
        answers: PathBuf,

        /// Pre-fill from the stored edit snapshot and update in place
        #[arg(long)]
        edit: bool,

        /// Discard recorded progress and start again from basic info
        #[arg(long)]
        restart: bool,
    },
    /// Fetch an existing organization and resubmit it in edit mode
    Edit {
        #[arg(value_name = "ORGANIZATION_ID")]
        organization_id: String,

        #[arg(value_name = "ANSWERS")]
        answers: PathBuf,

        /// Discard recorded progress and start again from basic info
        #[arg(long)]
        restart: bool,
    },
    /// Show the merged organization list
    List,
    /// Fetch one organization's full record
    Show {
        #[arg(value_name = "ORGANIZATION_ID")]
        organization_id: String,
    },
    /// Clear session-scoped state (edit snapshot, setup progress, selection)
    Reset,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = ClientConfig::from_env().context("reading configuration")?;

    let store = LibSqlStore::new_local(&config.db_path)
        .await
        .with_context(|| format!("opening database at {}", config.db_path.display()))?;
    let bridge = PersistenceBridge::new(Arc::new(store));

    match cli.command {
        Commands::Run {
            answers,
            edit,
            restart,
        } => run_wizard(&config, bridge, &answers, edit, restart).await,
        Commands::Edit {
            organization_id,
            answers,
            restart,
        } => {
            let directory = HttpDirectoryClient::new(&config);
            let record = directory.get_organization(&organization_id).await?;
            let mut snapshot = snapshot_from_record(&record);
            if snapshot.organization_id.is_none() {
                snapshot.organization_id = Some(organization_id);
            }
            bridge.save_edit_snapshot(&snapshot).await?;
            run_wizard(&config, bridge, &answers, true, restart).await
        }
        Commands::List => {
            let loader = ListLoader::new(Arc::new(HttpDirectoryClient::new(&config)), bridge);
            let Some(view) = loader.load().await? else {
                return Ok(ExitCode::SUCCESS);
            };
            if let Some(error) = &view.api_error {
                eprintln!("(backend unavailable, showing local entries: {error})");
            }
            if view.entries.is_empty() {
                println!("No organizations.");
            }
            for entry in &view.entries {
                println!(
                    "{:<14} {:<30} {:<30} {:<10} {:?}",
                    entry.organization_id, entry.name, entry.email, entry.status, entry.source
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Show { organization_id } => {
            let directory = HttpDirectoryClient::new(&config);
            let record = directory.get_organization(&organization_id).await?;
            bridge.select_organization(&record).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Reset => {
            let removed = bridge.clear_session().await?;
            println!("Cleared {removed} session entries.");
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_wizard(
    config: &ClientConfig,
    bridge: PersistenceBridge,
    answers: &Path,
    edit: bool,
    restart: bool,
) -> Result<ExitCode> {
    let answers = Answers::read(answers)
        .await
        .with_context(|| format!("loading answers from {}", answers.display()))?;
    if restart {
        bridge.clear_setup_progress().await?;
    }

    let gateway = Gateway::new(Arc::new(HttpTransport::new(config)));
    let mut shell = WizardShell::start(gateway, bridge, edit, config.pacing).await?;
    answers.apply_to(shell.fields_mut()).await?;

    eprintln!(
        "Onboarding {} ({}, from {})",
        shell.session().organization_id(),
        if edit { "edit" } else { "new" },
        shell.current_step().title()
    );

    loop {
        let step = shell.current_step();
        eprintln!(
            "[{}/5] {} {}",
            step.number(),
            step.title(),
            shell.session().current_path()
        );
        match shell.proceed().await? {
            ProceedOutcome::Advanced { message, .. } => eprintln!("  {message}"),
            ProceedOutcome::Completed { message, summary } => {
                eprintln!("  {message}");
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(ExitCode::SUCCESS);
            }
            ProceedOutcome::Rejected { message } => {
                eprintln!("  {message}");
                return Ok(ExitCode::FAILURE);
            }
        }
    }
}
