use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use df_config::FlowConfig;
use df_core::clock::{Clock, SystemClock};
use df_core::events::{PipelineEvent, Severity};
use df_core::monitor::{EventSink, HttpEventSink, NullEventSink};
use df_core::notify::{HttpNotifier, Notifier};
use df_runtime::lifecycle::{Pipeline, wait_for_signal};
use df_runtime::tracing_init::init_tracing;

#[derive(Parser)]
#[command(name = "dicoflow", about = "DicoFlow DICOM routing and dispatch pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the routing and dispatch service
    Run {
        /// Path to dicoflow.toml config file
        #[arg(short, long)]
        config: PathBuf,
        /// Instance name reported to the bookkeeper
        #[arg(long, default_value = "main")]
        instance: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, instance } => {
            let config_path = config
                .canonicalize()
                .map_err(|e| anyhow::anyhow!("config path '{}': {e}", config.display()))?;
            // Startup-time configuration failure is the one case where the
            // process exits with code 1.
            let flow_config = FlowConfig::load(&config_path)?;
            let base_dir = config_path
                .parent()
                .expect("config path must have a parent directory");

            let _guard = init_tracing(&flow_config.logging, base_dir)?;

            let sink: Arc<dyn EventSink> = match flow_config.bookkeeper.as_deref() {
                Some(address) => Arc::new(HttpEventSink::new(address, "dicoflow", &instance)),
                None => Arc::new(NullEventSink),
            };
            let notifier: Arc<dyn Notifier> = Arc::new(HttpNotifier::new());
            let clock: Arc<dyn Clock> = Arc::new(SystemClock);

            sink.send_event(
                PipelineEvent::Boot,
                Severity::Info,
                &format!("PID = {}", std::process::id()),
            )
            .await;

            let pipeline = Pipeline::start(config_path, sink.clone(), notifier, clock)
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            tracing::info!(domain = "sys", instance = %instance, "DicoFlow pipeline started");

            wait_for_signal(pipeline.cancel_token(), sink.clone()).await;
            pipeline.shutdown();
            pipeline.wait().await.map_err(|e| anyhow::anyhow!("{e}"))?;

            sink.send_event(PipelineEvent::Shutdown, Severity::Info, "").await;
            tracing::info!(domain = "sys", "going down now");
        }
    }

    Ok(())
}
