use std::fs::OpenOptions;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use live_detect::app::{self, AppError, AppSettings};
use live_detect::cli::{self, Args, Command};
use live_detect::config::{self, Config};
use live_detect::media::{MediaDevices, NativeDevices, TestPattern};
use live_detect::model::{ConfiguredProvider, ModelCache};
use live_detect::overlay::ConsoleSurface;

/// Set up env_logger from the config level; `RUST_LOG` wins when set.
///
/// The interactive preview owns the terminal, so its logs go to a file.
fn init_logging(config: &Config, to_file: bool) {
    let env = env_logger::Env::default().default_filter_or(config.log.level.as_str());
    let mut builder = env_logger::Builder::from_env(env);

    if to_file {
        let path = config.log_file();
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => {
                eprintln!("Warning: could not open log file {}: {}", path.display(), e);
                builder.filter_level(log::LevelFilter::Off);
            }
        }
    }

    let _ = builder.try_init();
}

fn runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to create async runtime: {}", e))
}

fn provider(config: &Config) -> ConfiguredProvider {
    ConfiguredProvider::new(
        config.model_source(),
        config.yolo_params(),
        ModelCache::with_default_dir(),
    )
}

fn run_interactive(config: &Config, test_pattern: bool) -> Result<(), String> {
    let settings = AppSettings::from(config);
    let rt = runtime()?;
    let result = if test_pattern {
        let devices = TestPattern::new(config.resolution(), config.camera.fps);
        rt.block_on(app::run_tui(settings, devices, provider(config)))
    } else {
        let devices = NativeDevices::new(config.camera_settings());
        rt.block_on(app::run_tui(settings, devices, provider(config)))
    };
    result.map_err(|e| e.to_string())
}

fn run_headless(config: &Config, test_pattern: bool) -> Result<(), String> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        eprintln!("Warning: Could not set up Ctrl+C handler: {}", e);
    }

    let rt = runtime()?;
    let report = if test_pattern {
        let devices = TestPattern::new(config.resolution(), config.camera.fps);
        rt.block_on(headless(config, devices, shutdown))
    } else {
        let devices = NativeDevices::new(config.camera_settings());
        rt.block_on(headless(config, devices, shutdown))
    }
    .map_err(|e| e.to_string())?;

    eprintln!(
        "{} frames, {:.1} fps, {} shown on the last frame",
        report.stats.iterations, report.stats.fps, report.stats.retained
    );
    Ok(())
}

async fn headless<D: MediaDevices>(
    config: &Config,
    devices: D,
    shutdown: Arc<AtomicBool>,
) -> Result<app::HeadlessReport, AppError> {
    app::run_headless(
        AppSettings::from(config),
        devices,
        provider(config),
        ConsoleSurface::stdout(),
        shutdown,
    )
    .await
}

fn run(args: &Args, config: &Config, config_path: &Path) -> Result<(), String> {
    match args.command() {
        Command::Run => run_interactive(config, args.test_pattern),
        Command::Headless => run_headless(config, args.test_pattern),
        Command::ListCameras => cli::list_cameras().map_err(|e| e.to_string()),
        Command::FetchModel { url, sha256 } => {
            let rt = runtime()?;
            rt.block_on(cli::fetch_model(config, url.as_deref(), sha256.as_deref()))
                .map(|_| ())
                .map_err(|e| e.to_string())
        }
        Command::Config { action } => {
            cli::handle_config_action(&action, config, config_path).map_err(|e| e.to_string())
        }
    }
}

fn main() {
    // A missing .env is fine
    let _ = dotenv::dotenv();

    let args = Args::parse();
    let config_path = args.config.clone().unwrap_or_else(config::default_path);

    let loaded = Config::load(Some(config_path.as_path())).and_then(|mut config| {
        args.apply(&mut config)?;
        Ok(config)
    });
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config, args.command() == Command::Run);

    if let Err(e) = run(&args, &config, &config_path) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
