use std::io::Read;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{eyre, Result, WrapErr};
use lambda_runtime::{service_fn, LambdaEvent};

use event_ingest::config::{Cli, Command, ConfigFile, Settings};
use event_ingest::domain::RequestEnvelope;
use event_ingest::store::{DynamoEventStore, EventStore, InMemoryEventStore};
use event_ingest::EventHandler;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = Settings::resolve(cli, ConfigFile::load())?;

    // Set up logging
    let _log_guard = event_ingest::logging::init(settings.log_format, settings.log_file.as_deref())
        .wrap_err("failed to initialize logging")?;

    match settings.command.clone() {
        Some(Command::Invoke { event, dry_run }) => invoke(&settings, &event, dry_run).await,
        None => serve(&settings).await,
    }
}

async fn connect_store(settings: &Settings) -> Arc<dyn EventStore> {
    Arc::new(
        DynamoEventStore::connect(
            settings.table.clone(),
            settings.region.clone(),
            settings.endpoint_url.clone(),
        )
        .await,
    )
}

async fn serve(settings: &Settings) -> Result<()> {
    let handler = Arc::new(EventHandler::new(connect_store(settings).await));

    tracing::info!("Starting Lambda runtime for table {}", settings.table);
    lambda_runtime::run(service_fn(move |event: LambdaEvent<RequestEnvelope>| {
        let handler = handler.clone();
        async move { Ok::<_, lambda_runtime::Error>(handler.handle(event.payload).await) }
    }))
    .await
    .map_err(|e| eyre!("lambda runtime failed: {}", e))
}

async fn invoke(settings: &Settings, event_path: &str, dry_run: bool) -> Result<()> {
    let raw = if event_path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .wrap_err("failed to read event from stdin")?;
        buf
    } else {
        std::fs::read_to_string(event_path)
            .wrap_err_with(|| format!("failed to read event file {}", event_path))?
    };
    let envelope: RequestEnvelope =
        serde_json::from_str(&raw).wrap_err("event is not a valid invocation envelope")?;

    let store: Arc<dyn EventStore> = if dry_run {
        Arc::new(InMemoryEventStore::new(settings.table.clone()))
    } else {
        connect_store(settings).await
    };

    let response = EventHandler::new(store).handle(envelope).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
