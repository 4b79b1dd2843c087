use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use moodlens_core::{
    Analyzer, CameraSource, CapturedImage, HttpAnalysisClient, Transition, Workflow, WorkflowState,
};
use moodlens_hw::{Camera, LiveCamera};
use std::path::PathBuf;

mod config;
mod files;
mod render;

use config::Config;
use files::PathFile;

#[derive(Parser)]
#[command(name = "moodlens", about = "Detect the emotion on a face with a remote inference service")]
struct Cli {
    /// Inference service base URL (overrides MOODLENS_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Print the analysis as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an image file
    Analyze {
        /// Image file to upload
        file: PathBuf,
    },
    /// Capture a camera frame and analyze it
    Capture {
        /// V4L2 device (overrides MOODLENS_CAMERA_DEVICE)
        #[arg(short, long)]
        device: Option<String>,
    },
    /// List camera devices
    Devices,
    /// Check that the inference service is reachable
    Status,
}

/// Camera stand-in for file-only sessions: switchable, never has a frame.
#[derive(Default)]
struct NoCamera {
    enabled: bool,
}

impl CameraSource for NoCamera {
    fn enable(&mut self) {
        self.enabled = true;
    }
    fn disable(&mut self) {
        self.enabled = false;
    }
    fn is_enabled(&self) -> bool {
        self.enabled
    }
    fn frame(&mut self) -> Option<CapturedImage> {
        None
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }

    match cli.command {
        Commands::Analyze { file } => {
            let client = HttpAnalysisClient::new(config.client_config())?;
            let mut workflow =
                Workflow::new(NoCamera::default(), client).with_order(config.distribution_order);
            workflow.disable_camera();

            let mut source = PathFile::open(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            log_ignored("upload", workflow.upload_from(&mut source));
            log_ignored("analyze", workflow.analyze().await);
            report(&workflow, cli.json)?;
        }
        Commands::Capture { device } => {
            if let Some(device) = device {
                config.camera_device = device;
            }
            let client = HttpAnalysisClient::new(config.client_config())?;
            let mut workflow = Workflow::new(LiveCamera::new(config.camera_settings()), client)
                .with_order(config.distribution_order);
            if !workflow.camera().is_available() {
                bail!("camera {} is unavailable", config.camera_device);
            }

            if let Transition::Ignored(reason) = workflow.capture() {
                bail!("no frame captured from {} ({reason:?})", config.camera_device);
            }
            workflow.disable_camera();
            log_ignored("analyze", workflow.analyze().await);
            report(&workflow, cli.json)?;
        }
        Commands::Devices => {
            let devices = Camera::list_devices();
            if devices.is_empty() {
                println!("No capture devices found");
            }
            for dev in devices {
                println!("{}  {} ({}, {})", dev.path, dev.name, dev.driver, dev.bus);
            }
        }
        Commands::Status => {
            let client = HttpAnalysisClient::new(config.client_config())?;
            match client.status().await {
                Ok(message) => println!("{}: {message}", client.base_url()),
                Err(err) => bail!("{}: {err}", client.base_url()),
            }
        }
    }

    Ok(())
}

fn log_ignored(action: &str, transition: Transition) {
    if let Transition::Ignored(reason) = transition {
        tracing::debug!(action, ?reason, "action ignored");
    }
}

fn report<C: CameraSource, A: Analyzer>(workflow: &Workflow<C, A>, json: bool) -> Result<()> {
    match (workflow.state(), workflow.result(), workflow.error()) {
        (WorkflowState::ResultReady, Some(result), _) => {
            if json {
                let out = serde_json::json!({
                    "headline": result.headline(),
                    "result": result,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print!("{}", render::render_result(result));
            }
            Ok(())
        }
        (WorkflowState::Failed, _, Some(error)) => {
            eprintln!("{}", render::render_error(error));
            bail!("analysis failed")
        }
        (state, _, _) => bail!("analysis did not run (state: {state:?})"),
    }
}
