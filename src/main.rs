use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use mentorhub_core::booking::{BookingRequest, MeetingPlatform, Requester};
use mentorhub_core::ids::{SessionTypeId, UserId};
use mentorhub_core::ports::{MessageKind, UserMessage, UserMessenger};
use mentorhub_core::steps::StepObserver;
use mentorhub_engine::{
    BookingWorkflow, FanoutObserver, LogMessenger, MetricsObserver, TracingObserver, WorkflowConfig,
};
use mentorhub_settings::{MentorhubSettings, WorkflowSettings};
use mentorhub_store::Database;
use mentorhub_telemetry::{MetricsRecorder, TelemetryConfig};

#[derive(Parser)]
#[command(name = "mentorhub", about = "Mentoring session booking service")]
struct Cli {
    /// Settings file. Defaults to ~/.mentorhub/settings.json.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve {
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Book one session and print the outcome as JSON.
    Book {
        #[arg(long)]
        mentor: String,
        #[arg(long)]
        requester: String,
        #[arg(long)]
        requester_name: Option<String>,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        time: String,
        #[arg(long)]
        session_type: String,
        #[arg(long, default_value = "google_meet")]
        platform: MeetingPlatform,
        #[arg(long, default_value = "")]
        note: String,
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

/// Prints user-facing messages to stderr so stdout stays machine-readable.
struct ConsoleMessenger;

impl UserMessenger for ConsoleMessenger {
    fn show(&self, message: &UserMessage) {
        match message.kind {
            MessageKind::Info => eprintln!("{}", message.text),
            MessageKind::Destructive => eprintln!("warning: {}", message.text),
        }
    }
}

fn workflow_config(s: &WorkflowSettings) -> WorkflowConfig {
    WorkflowConfig {
        step_timeout: Duration::from_millis(s.step_timeout_ms),
        fallback_session_label: s.fallback_session_label.clone(),
        confirmation_text: s.confirmation_text.clone(),
    }
}

fn open_database(settings: &MentorhubSettings, override_path: Option<PathBuf>) -> anyhow::Result<Database> {
    let path = override_path.unwrap_or_else(|| {
        let configured = PathBuf::from(&settings.database.path);
        if configured.is_absolute() {
            configured
        } else {
            mentorhub_settings::mentorhub_home().join(configured)
        }
    });
    Database::open(&path).with_context(|| format!("opening database at {}", path.display()))
}

fn build_workflow(
    settings: &MentorhubSettings,
    db: &Database,
    messenger: Arc<dyn UserMessenger>,
    metrics: Arc<MetricsRecorder>,
) -> anyhow::Result<BookingWorkflow> {
    let (meetings, email) = mentorhub_server::clients_from_settings(&settings.integrations)?;
    let collaborators = mentorhub_server::sqlite_collaborators(db, Arc::new(meetings), Arc::new(email));
    let observers: Vec<Arc<dyn StepObserver>> = vec![
        Arc::new(TracingObserver),
        Arc::new(MetricsObserver::new(metrics)),
    ];
    Ok(
        BookingWorkflow::new(collaborators, messenger, workflow_config(&settings.workflow))
            .with_observer(Arc::new(FanoutObserver::new(observers))),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => mentorhub_settings::load_settings_from_path(path)?,
        None => mentorhub_settings::load_settings()?,
    };
    let guard = mentorhub_telemetry::init_telemetry(TelemetryConfig::from_level_str(
        &settings.logging.level,
        settings.logging.json,
    ));

    match cli.command {
        Command::Serve { port, db } => {
            let db = open_database(&settings, db)?;
            let workflow = build_workflow(&settings, &db, Arc::new(LogMessenger), guard.metrics())?;

            let mut config = mentorhub_server::ServerConfig::from(&settings.server);
            if let Some(port) = port {
                config.port = port;
            }
            let state = mentorhub_server::AppState::new(Arc::new(workflow), db, guard.metrics());
            let handle = mentorhub_server::start(config, state).await?;
            tracing::info!(port = handle.port, "mentorhub ready");

            tokio::signal::ctrl_c()
                .await
                .context("listening for ctrl-c")?;
            tracing::info!("shutting down");
            handle.shutdown();
        }
        Command::Book {
            mentor,
            requester,
            requester_name,
            date,
            time,
            session_type,
            platform,
            note,
            db,
        } => {
            let db = open_database(&settings, db)?;
            let workflow = build_workflow(&settings, &db, Arc::new(ConsoleMessenger), guard.metrics())?;

            let mut requester = Requester::new(UserId::from_raw(requester));
            if let Some(name) = requester_name {
                requester = requester.with_display_name(name);
            }
            let request = BookingRequest {
                mentor_id: UserId::from_raw(mentor),
                requester: Some(requester),
                date: Some(date),
                time_slot: Some(time),
                session_type_id: Some(SessionTypeId::from_raw(session_type)),
                note,
                platform,
                ..Default::default()
            };

            let outcome = workflow.book(&request).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}
