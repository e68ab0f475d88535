mod config;
mod response;
mod routes;

use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use finger_count_core::counting::domain::finger_counter::FingerCounter;
use finger_count_core::detection::infrastructure::model_resolver::{self, ProgressFn};
use finger_count_core::detection::infrastructure::onnx_hand_landmark_detector::OnnxHandLandmarkDetector;
use finger_count_core::detection::infrastructure::onnx_palm_detector::OnnxPalmDetector;
use finger_count_core::imaging::infrastructure::image_file_reader::ImageFileReader;
use finger_count_core::imaging::infrastructure::transient_image_store::TransientImageStore;
use finger_count_core::pipeline::count_fingers_use_case::CountFingersUseCase;
use finger_count_core::shared::constants::{HAND_LANDMARK_MODEL_NAME, PALM_MODEL_NAME};

use config::{ServerConfig, ThumbRuleSetting};
use routes::AppState;

/// Counts extended fingers in uploaded hand images.
#[derive(Parser)]
#[command(name = "finger-count-server")]
struct Cli {
    /// JSON config file (defaults to <config dir>/FingerCount/server.json if present).
    #[arg(long, env = "FINGER_COUNT_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind.
    #[arg(long, env = "FINGER_COUNT_HOST")]
    host: Option<String>,

    /// Port to listen on.
    #[arg(long, env = "FINGER_COUNT_PORT")]
    port: Option<u16>,

    /// Directory for transient uploads.
    #[arg(long, env = "FINGER_COUNT_UPLOAD_DIR")]
    upload_dir: Option<PathBuf>,

    /// Directory searched first for model files.
    #[arg(long, env = "FINGER_COUNT_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// Download URL for the palm detection model.
    #[arg(long, env = "FINGER_COUNT_PALM_MODEL_URL")]
    palm_model_url: Option<String>,

    /// Download URL for the hand landmark model.
    #[arg(long, env = "FINGER_COUNT_LANDMARK_MODEL_URL")]
    landmark_model_url: Option<String>,

    /// Palm detection confidence threshold (0.0-1.0).
    #[arg(long, env = "FINGER_COUNT_PALM_CONFIDENCE")]
    palm_confidence: Option<f64>,

    /// Minimum hand presence score (0.0-1.0).
    #[arg(long, env = "FINGER_COUNT_PRESENCE_THRESHOLD")]
    presence_threshold: Option<f64>,

    /// Thumb rule: fixed-right or handedness-aware.
    #[arg(long, value_enum, env = "FINGER_COUNT_THUMB_RULE")]
    thumb_rule: Option<ThumbRuleSetting>,

    /// Largest accepted image in bytes.
    #[arg(long, env = "FINGER_COUNT_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<usize>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(cli)?;

    // Model downloads use blocking HTTP, so they happen before the runtime starts.
    let use_case = build_use_case(&config)?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(config, use_case))
}

fn resolve_config(cli: Cli) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = ServerConfig::load_or_default(cli.config.as_deref())?;
    apply_overrides(&mut config, cli);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(config: &mut ServerConfig, cli: Cli) {
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(dir) = cli.upload_dir {
        config.upload_dir = dir;
    }
    if cli.model_dir.is_some() {
        config.model_dir = cli.model_dir;
    }
    if cli.palm_model_url.is_some() {
        config.palm_model_url = cli.palm_model_url;
    }
    if cli.landmark_model_url.is_some() {
        config.landmark_model_url = cli.landmark_model_url;
    }
    if let Some(confidence) = cli.palm_confidence {
        config.palm_confidence = confidence;
    }
    if let Some(threshold) = cli.presence_threshold {
        config.presence_threshold = threshold;
    }
    if let Some(rule) = cli.thumb_rule {
        config.thumb_rule = rule;
    }
    if let Some(max) = cli.max_upload_bytes {
        config.max_upload_bytes = max;
    }
}

fn build_use_case(
    config: &ServerConfig,
) -> Result<CountFingersUseCase, Box<dyn std::error::Error>> {
    let palm_path = model_resolver::resolve(
        PALM_MODEL_NAME,
        config.palm_model_url.as_deref(),
        config.model_dir.as_deref(),
        Some(download_progress(PALM_MODEL_NAME)),
    )?;
    let landmark_path = model_resolver::resolve(
        HAND_LANDMARK_MODEL_NAME,
        config.landmark_model_url.as_deref(),
        config.model_dir.as_deref(),
        Some(download_progress(HAND_LANDMARK_MODEL_NAME)),
    )?;
    log::info!(
        "Using models {} and {}",
        palm_path.display(),
        landmark_path.display()
    );

    let palm_detector = OnnxPalmDetector::new(&palm_path, config.palm_confidence)?;
    let detector =
        OnnxHandLandmarkDetector::new(palm_detector, &landmark_path, config.presence_threshold)?;

    Ok(CountFingersUseCase::new(
        Box::new(ImageFileReader::new()),
        Box::new(detector),
        FingerCounter::new(config.thumb_rule.into()),
        TransientImageStore::new(&config.upload_dir),
        config.max_upload_bytes,
    ))
}

fn download_progress(name: &'static str) -> ProgressFn {
    Box::new(move |downloaded, total| {
        if total > 0 {
            let pct = downloaded * 100 / total;
            eprint!("\rDownloading {name}: {pct}%");
            if downloaded >= total {
                eprintln!();
            }
        } else {
            eprint!("\rDownloading {name}: {} KB", downloaded / 1024);
        }
        let _ = std::io::stderr().flush();
    })
}

async fn serve(
    config: ServerConfig,
    use_case: CountFingersUseCase,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = routes::router(AppState::new(use_case), config.body_limit());
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["finger-count-server"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_overrides_file_values() {
        let mut config = ServerConfig {
            port: 8080,
            host: "127.0.0.1".to_string(),
            ..ServerConfig::default()
        };
        apply_overrides(
            &mut config,
            parse(&["--port", "9000", "--thumb-rule", "handedness-aware"]),
        );
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.thumb_rule, ThumbRuleSetting::HandednessAware);
    }

    #[test]
    fn test_absent_flags_leave_config_untouched() {
        let mut config = ServerConfig {
            model_dir: Some(PathBuf::from("/models")),
            ..ServerConfig::default()
        };
        let before = config.clone();
        apply_overrides(&mut config, parse(&[]));
        assert_eq!(config, before);
    }

    #[test]
    fn test_invalid_thumb_rule_is_rejected() {
        let argv = ["finger-count-server", "--thumb-rule", "sideways"];
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
