use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    cancellation, load_settings, PredictionClient, PredictionService, ResultsReport, Route,
    SubmitOutcome, ValidationMode, WorkflowController,
};
use shared::schema::FieldKey;
use storage::{SessionStore, SqliteSessionStore};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Chronic kidney disease risk assessment client")]
struct Cli {
    /// Overrides the configured prediction service URL.
    #[arg(long)]
    api_base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Checks that the prediction service is up and has a model loaded.
    Health,
    ModelInfo,
    /// Validates the seven lab values, requests a prediction and stores the result.
    Submit(SubmitArgs),
    /// Prints the results of the last successful submission.
    Report,
    /// Forgets the stored assessment and prediction.
    Clear,
}

#[derive(Args, Debug)]
struct SubmitArgs {
    #[arg(long, default_value = "")]
    serum_creatinine: String,
    #[arg(long, default_value = "")]
    gfr: String,
    #[arg(long, default_value = "")]
    itching: String,
    #[arg(long, default_value = "")]
    fasting_blood_sugar: String,
    #[arg(long, default_value = "")]
    bun_levels: String,
    #[arg(long, default_value = "")]
    protein_in_urine: String,
    #[arg(long, default_value = "")]
    muscle_cramps: String,
    /// Rejects values outside the documented clinical ranges.
    #[arg(long)]
    strict: bool,
}

impl SubmitArgs {
    fn values(&self) -> [(FieldKey, &str); 7] {
        [
            (FieldKey::SerumCreatinine, self.serum_creatinine.as_str()),
            (FieldKey::Gfr, self.gfr.as_str()),
            (FieldKey::Itching, self.itching.as_str()),
            (FieldKey::FastingBloodSugar, self.fasting_blood_sugar.as_str()),
            (FieldKey::BunLevels, self.bun_levels.as_str()),
            (FieldKey::ProteinInUrine, self.protein_in_urine.as_str()),
            (FieldKey::MuscleCramps, self.muscle_cramps.as_str()),
        ]
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings().context("invalid assessment configuration")?;
    if let Some(raw) = cli.api_base_url.as_deref() {
        settings.api_base_url = client_core::config::normalize_base_url(raw)
            .with_context(|| format!("invalid --api-base-url '{raw}'"))?;
    }
    info!(api_base_url = %settings.api_base_url, "loaded settings");

    let client = Arc::new(PredictionClient::from_settings(&settings));

    match cli.command {
        Command::Health => {
            let health = client.health_check().await?;
            println!(
                "status={} model_loaded={}",
                health.status, health.model_loaded
            );
        }
        Command::ModelInfo => {
            let model = client.model_info().await?;
            println!("{}", serde_json::to_string_pretty(&model)?);
        }
        Command::Submit(args) => {
            let store = open_store(&settings.session_database_url).await?;
            let mode = if args.strict {
                ValidationMode::Strict
            } else {
                settings.validation_mode
            };
            submit(client, store, mode, &args).await?;
        }
        Command::Report => {
            let store = open_store(&settings.session_database_url).await?;
            print_report(store.as_ref()).await?;
        }
        Command::Clear => {
            let store = open_store(&settings.session_database_url).await?;
            store.clear().await?;
            println!("cleared stored assessment");
        }
    }

    Ok(())
}

async fn open_store(database_url: &str) -> Result<Arc<SqliteSessionStore>> {
    let store = SqliteSessionStore::new(database_url)
        .await
        .with_context(|| format!("failed to open session store at {database_url}"))?;
    Ok(Arc::new(store))
}

async fn submit(
    client: Arc<PredictionClient>,
    store: Arc<SqliteSessionStore>,
    mode: ValidationMode,
    args: &SubmitArgs,
) -> Result<()> {
    let (route_tx, mut route_rx) = mpsc::unbounded_channel();
    let mut controller = WorkflowController::new(client, store.clone(), Arc::new(route_tx), mode);
    for (key, value) in args.values() {
        controller.set_field(key, value);
    }

    let (cancel, signal) = cancellation();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; cancelling submission");
            cancel.cancel();
        }
    });
    let outcome = controller.submit_with_cancel(signal).await;
    ctrl_c.abort();

    match outcome {
        SubmitOutcome::Submitted => {}
        SubmitOutcome::Invalid => {
            for (key, message) in controller.form().errors().iter() {
                eprintln!("{}: {message}", key.spec().label);
            }
            bail!("assessment form has invalid fields");
        }
        SubmitOutcome::Failed(err) => return Err(err).context("assessment submission failed"),
        SubmitOutcome::Ignored => bail!("a submission is already in progress"),
    }

    if let Ok(Route::Results) = route_rx.try_recv() {
        print_report(store.as_ref()).await?;
    }
    Ok(())
}

async fn print_report(store: &dyn SessionStore) -> Result<()> {
    match ResultsReport::from_session(store).await? {
        Some(report) => println!("{report}"),
        None => println!("No assessment results stored. Run `assess submit` first."),
    }
    Ok(())
}
