use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use batik_classifier::classifier::Classifier;
use batik_classifier::config::{self, ServerConfig};
use batik_classifier::labels::LabelSet;
use batik_classifier::logging::init_logging;
use batik_classifier::server::{self, AppState};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "HTTP service that classifies batik patterns in uploaded images", long_about = None)]
struct Args {
    #[arg(long, default_value = config::DEFAULT_HOST, help = "Host address to bind the server to")]
    host: String,

    #[arg(long, default_value_t = config::DEFAULT_PORT, help = "Port number to listen on")]
    port: u16,

    #[arg(
        long,
        default_value = config::DEFAULT_MODEL_PATH,
        help = "Path to the ONNX classifier model"
    )]
    model_path: PathBuf,

    #[arg(
        long,
        help = "Optional JSON file with the label codes, one per class index"
    )]
    labels_path: Option<PathBuf>,

    #[arg(
        long,
        default_value_t = config::DEFAULT_MAX_PAYLOAD_SIZE,
        help = "Maximum size of an uploaded image in bytes"
    )]
    max_payload_size: usize,

    #[arg(long, default_value_t = 1, help = "Threads used by a single inference")]
    intra_threads: usize,

    #[arg(long, help = "Number of HTTP worker threads (defaults to the CPU count)")]
    workers: Option<usize>,

    #[arg(
        long,
        default_value = "info",
        value_parser = config::parse_log_level,
        help = "Log level (error, warn, info, debug, trace); RUST_LOG takes precedence when set"
    )]
    log_level: log::LevelFilter,
}

impl Args {
    fn into_config(self) -> anyhow::Result<ServerConfig> {
        let config = ServerConfig {
            host: self.host,
            port: self.port,
            model_path: self.model_path,
            labels_path: self.labels_path,
            max_payload_size: self.max_payload_size,
            intra_threads: self.intra_threads,
            workers: self.workers,
            log_level: self.log_level,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "onnx")]
fn load_classifier(path: &Path, intra_threads: usize) -> anyhow::Result<Arc<dyn Classifier>> {
    let classifier = batik_classifier::classifier::OnnxClassifier::load(path, intra_threads)?;
    Ok(Arc::new(classifier))
}

#[cfg(not(feature = "onnx"))]
fn load_classifier(path: &Path, _intra_threads: usize) -> anyhow::Result<Arc<dyn Classifier>> {
    anyhow::bail!(
        "cannot load {}: built without the `onnx` feature",
        path.display()
    )
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config()?;
    init_logging(config.log_level);

    let labels = match &config.labels_path {
        Some(path) => LabelSet::from_json_file(path)?,
        None => LabelSet::default(),
    };
    let classifier = load_classifier(&config.model_path, config.intra_threads)
        .inspect_err(|e| log::error!("{:#}", e))?;

    let app_state = AppState::new(classifier, labels, config.max_payload_size);
    server::startup(config, app_state)
        .await
        .context("server terminated with an error")
}
