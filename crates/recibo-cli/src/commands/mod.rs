//! CLI subcommands and the helpers they share.

pub mod amount;
pub mod batch;
pub mod config;
pub mod output;
pub mod process;
pub mod text;

use std::path::{Path, PathBuf};

use tracing::debug;

use recibo_core::models::config::ReciboConfig;
use recibo_core::DocumentIngestor;

/// Load configuration from `--config`, else the default file, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ReciboConfig> {
    let path = match config_path {
        Some(path) => PathBuf::from(path),
        None => {
            let default = config::default_config_path();
            if !default.exists() {
                debug!("No config file at {}, using defaults", default.display());
                return Ok(ReciboConfig::default());
            }
            default
        }
    };

    debug!("Loading config from {}", path.display());
    ReciboConfig::from_file(&path)
        .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path.display(), e))
}

/// Build an ingestor, attaching the OCR engine when its models are present.
pub fn build_ingestor(
    config: ReciboConfig,
    model_dir: Option<&Path>,
) -> anyhow::Result<DocumentIngestor> {
    let model_dir = model_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.ocr.model_dir.clone());

    attach_recognizer(DocumentIngestor::from_config(config), &model_dir)
}

#[cfg(feature = "native")]
fn attach_recognizer(
    ingestor: DocumentIngestor,
    model_dir: &Path,
) -> anyhow::Result<DocumentIngestor> {
    use recibo_core::PureOcrEngine;
    use tracing::warn;

    if !model_dir.join("det.onnx").exists() {
        warn!(
            "OCR models not found at {}, only embedded PDF text is available",
            model_dir.display()
        );
        return Ok(ingestor);
    }

    let engine = PureOcrEngine::from_dir(model_dir, &ingestor.config().ocr)
        .map_err(|e| anyhow::anyhow!("Failed to load OCR models: {}", e))?;
    Ok(ingestor.with_recognizer(Box::new(engine)))
}

#[cfg(not(feature = "native"))]
fn attach_recognizer(
    ingestor: DocumentIngestor,
    model_dir: &Path,
) -> anyhow::Result<DocumentIngestor> {
    debug!(
        "Built without OCR support, ignoring models at {}",
        model_dir.display()
    );
    Ok(ingestor)
}
