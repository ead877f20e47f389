//! Standalone CLI for KMS grant reconciliation.
//!
//! Binds `apply`/`revoke` to the host's grant commands and lifecycle events:
//! grants are created after a deploy and revoked before a removal.

mod hooks;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kms_grants_core::aws::arn::extract_account_from_arn;
use kms_grants_core::{
    AwsSettings, ContextOverrides, FailurePolicy, GrantDeclaration, GrantOutcome,
    GrantReconciler, Operation, ReconcileReport, ReconciliationResult, ServerlessDescriptor,
};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "kms-grants",
    version,
    about = "Creates and revokes KMS key grants for deployment roles"
)]
struct Cli {
    /// Deployment descriptor declaring custom.kmsGrants
    #[arg(short, long, global = true, default_value = "serverless.yml")]
    config: PathBuf,

    /// Stage, overriding provider.stage
    #[arg(short, long, global = true)]
    stage: Option<String>,

    /// Region, overriding provider.region
    #[arg(short, long, global = true)]
    region: Option<String>,

    /// Named AWS profile to load credentials from
    #[arg(long, global = true, env = "AWS_PROFILE")]
    profile: Option<String>,

    /// Attempts per AWS request, including retries on throttling
    #[arg(long, global = true, default_value_t = 3)]
    max_attempts: u32,

    /// Keep reconciling remaining declarations after one fails
    #[arg(long, global = true)]
    continue_on_error: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Creates a KMS grant for a lambda
    CreateKmsGrant,
    /// Revokes a KMS grant for a lambda
    RevokeKmsGrant,
    /// Show the matching grant for each declaration without changing anything
    Plan {
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the operation bound to a deployment lifecycle event
    Hook {
        /// Event name, e.g. after:deploy:deploy
        event: String,
    },
    /// List lifecycle events and the operations bound to them
    ListHooks,
}

#[derive(Serialize)]
struct PlanEntry<'a> {
    #[serde(flatten)]
    result: &'a ReconciliationResult,
    account: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_target(false)
        .format_timestamp(None)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let operation = match &cli.command {
        Commands::CreateKmsGrant => Operation::Apply,
        Commands::RevokeKmsGrant => Operation::Revoke,
        Commands::Plan { json } => return plan(&cli, *json).await,
        Commands::Hook { event } => match hooks::operation_for_event(event) {
            Some(op) => op,
            None => {
                log::debug!("No grant operation bound to lifecycle event '{event}'");
                return Ok(());
            }
        },
        Commands::ListHooks => {
            for (command, usage, event) in hooks::COMMANDS {
                println!("{command:<28} {usage} (fires {command}:{event})");
            }
            for (event, op) in hooks::HOOKS {
                println!("{event:<28} {}", hooks::describe(op));
            }
            return Ok(());
        }
    };

    let (reconciler, declarations) = load(&cli)?;
    let report = match operation {
        Operation::Apply => reconciler.apply(&declarations).await,
        Operation::Revoke => reconciler.revoke(&declarations).await,
    }
    .with_context(|| format!("KMS grant {} failed", hooks::describe(operation)))?;

    log_summary(operation, &report);
    Ok(())
}

fn load(cli: &Cli) -> Result<(GrantReconciler, Vec<GrantDeclaration>)> {
    let descriptor = ServerlessDescriptor::from_path(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    let context = descriptor.context(&ContextOverrides {
        stage: cli.stage.clone(),
        region: cli.region.clone(),
    });

    let settings = AwsSettings {
        region: context.region.clone(),
        profile: cli.profile.clone(),
        max_attempts: cli.max_attempts,
        ..AwsSettings::default()
    }
    .with_endpoints_from_env();

    let failure_policy = if cli.continue_on_error {
        FailurePolicy::ContinueOnError
    } else {
        FailurePolicy::HaltOnError
    };

    let reconciler =
        GrantReconciler::from_aws(settings, context).with_failure_policy(failure_policy);
    Ok((reconciler, descriptor.declarations()))
}

async fn plan(cli: &Cli, json: bool) -> Result<()> {
    let (reconciler, declarations) = load(cli)?;
    let results = reconciler
        .plan(&declarations)
        .await
        .context("KMS grant plan failed")?;

    if json {
        let entries: Vec<PlanEntry<'_>> = results
            .iter()
            .map(|result| PlanEntry {
                result,
                account: extract_account_from_arn(&result.key_arn),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for result in &results {
        let status = match &result.grant_id {
            Some(id) => format!("granted ({id})"),
            None => "missing".to_string(),
        };
        println!("{} -> {}: {status}", result.principal_arn, result.key_arn);
    }
    Ok(())
}

fn log_summary(operation: Operation, report: &ReconcileReport) {
    if report.is_empty() {
        return;
    }
    for entry in &report.entries {
        match &entry.outcome {
            GrantOutcome::Created { grant_id } => {
                log::debug!("[{}] created {} on {}", entry.index, grant_id, entry.result.key_arn);
            }
            GrantOutcome::Revoked { grant_ids } => {
                log::debug!(
                    "[{}] revoked {} on {}",
                    entry.index,
                    grant_ids.join(", "),
                    entry.result.key_arn
                );
            }
            GrantOutcome::AlreadyPresent { .. } | GrantOutcome::AlreadyAbsent => {}
        }
    }
    log::info!(
        "KMS grant {} finished: {} of {} declaration(s) changed",
        hooks::describe(operation),
        report.changed_count(),
        report.entries.len()
    );
}
