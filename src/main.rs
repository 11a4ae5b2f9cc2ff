use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use recording_upload::{
    fallback, create_router, AppState, Config, HttpRecordingsApi, ProgressUpdate,
    RecordingArtifact, RecordingsApi, UploadRegistry, UploadSession,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "recording-upload")]
#[command(about = "Upload finished recordings to the recordings API")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, global = true, default_value = "config/recording-upload")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload one recording, saving it locally if the upload fails
    Upload {
        /// Recording file
        file: PathBuf,

        /// Remote filename (default: the local file name)
        #[arg(short, long)]
        filename: Option<String>,

        /// Bearer token (default: api.auth_token from config)
        #[arg(short, long)]
        token: Option<String>,
    },

    /// Run the upload status API
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Recordings API: {}", cfg.api.base_url);

    let api: Arc<dyn RecordingsApi> =
        Arc::new(HttpRecordingsApi::new(cfg.api.base_url.clone(), cfg.api_timeouts())?);

    match cli.command {
        Command::Upload {
            file,
            filename,
            token,
        } => upload(&cfg, api, file, filename, token).await,
        Command::Serve => serve(&cfg, api).await,
    }
}

async fn upload(
    cfg: &Config,
    api: Arc<dyn RecordingsApi>,
    file: PathBuf,
    filename: Option<String>,
    token: Option<String>,
) -> Result<()> {
    let artifact = RecordingArtifact::open(&file, &cfg.upload.content_type)?;

    let filename = filename
        .or_else(|| file.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| fallback::default_filename(Utc::now()));

    let auth_token = token
        .or_else(|| cfg.api.auth_token.clone())
        .unwrap_or_default();

    let observer = Arc::new(|update: &ProgressUpdate| {
        info!("[{}%] {}", update.percent, update.status);
    });

    let mut session = UploadSession::new(artifact, filename, auth_token, api, cfg.upload_config())
        .with_observer(observer);

    match session.run().await {
        Ok(response) => {
            info!("Recording uploaded successfully!");
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(e) => {
            error!("Upload failed: {}", e);
            let path = fallback::save_locally(&cfg.fallback.directory, session.filename(), session.artifact())
                .context("Upload failed and the recording could not be saved locally")?;
            info!("Recording saved to {}", path.display());
            anyhow::bail!("Upload failed: {} (saved locally to {})", e, path.display())
        }
    }
}

async fn serve(cfg: &Config, api: Arc<dyn RecordingsApi>) -> Result<()> {
    let registry = Arc::new(UploadRegistry::new(cfg.registry.capacity));

    let state = AppState::new(
        api,
        registry,
        cfg.recordings.directory.clone(),
        cfg.fallback.directory.clone(),
    )
        .with_upload_config(cfg.upload_config())
        .with_auth_token(cfg.api.auth_token.clone())
        .with_default_content_type(cfg.upload.content_type.clone());

    let app = create_router(state);
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Status API listening on {}", addr);

    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
