use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use photo_poetry::capture::{CameraSource, FileSource, ImageSource, capture_image};
use photo_poetry::config::{ClientConfig, DEFAULT_BACKEND_URL};
use photo_poetry::{HttpBackend, PoetryBackend, PoetryError, PoetrySession, Stage, logging};

/// Turn a photo into a poem:
/// capture → upload → caption → poem, printing each result as it arrives.
#[derive(Parser, Debug)]
#[command(name = "poetize")]
#[command(about = "📷 Turn a photo into a poem with a photo-to-poetry backend")]
#[command(long_about = "Capture a photo from a camera or load one from disk, upload it to a \
photo-to-poetry backend, fetch the generated caption and convert it into a poem.")]
struct Cli {
    /// Backend base URL
    #[arg(long, env = "POETRY_BACKEND_URL", default_value = DEFAULT_BACKEND_URL,
          help = "Base URL of the photo-to-poetry backend")]
    backend_url: String,

    /// Per-request timeout in seconds
    #[arg(long, help = "Give up on a request after this many seconds (default: wait)")]
    timeout: Option<u64>,

    /// Downscale limit
    #[arg(long, help = "Downscale images so their longest side is at most this many pixels")]
    max_side: Option<u32>,

    /// Camera device
    #[arg(long, help = "Camera device (/dev/video0 on Linux, 0 on macOS, device name on Windows)")]
    camera_device: Option<String>,

    /// ffmpeg program used for camera snapshots
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: String,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the whole workflow: capture, upload, caption, poem
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Also save the uploaded image as served by the backend
        #[arg(long)]
        save_image: Option<PathBuf>,
    },
    /// Upload an image and print its server-assigned name
    Upload {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print the caption generated for an uploaded image
    Caption { image_name: String },
    /// Convert a caption into a poem
    Convert { caption: String },
    /// Download an uploaded image
    FetchImage {
        image_name: String,

        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct SourceArgs {
    /// Image file to upload
    #[arg(long)]
    file: Option<PathBuf>,

    /// Take a snapshot from the camera instead
    #[arg(long)]
    camera: bool,
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        let mut config =
            ClientConfig::new(self.backend_url.clone(), self.timeout, self.max_side);
        config.camera.ffmpeg = self.ffmpeg.clone();
        if let Some(device) = &self.camera_device {
            config.camera.device = device.clone();
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let config = cli.client_config();
    config.validate().map_err(anyhow::Error::msg)?;
    let backend = HttpBackend::new(&config)?;

    match cli.command {
        Command::Run { source, save_image } => {
            run_workflow(&config, &backend, &source, save_image).await
        }
        Command::Upload { source } => {
            let mut session = PoetrySession::new();
            capture_into(&mut session, &config, &source).await?;
            session.upload(&backend).await.map_err(alert)?;
            println!("{}", session.image_name().unwrap_or_default());
            Ok(())
        }
        Command::Caption { image_name } => {
            require_text(&image_name, Stage::Caption, photo_poetry::session::UPLOAD_FIRST)?;
            println!("{}", backend.caption(&image_name).await.map_err(alert)?);
            Ok(())
        }
        Command::Convert { caption } => {
            require_text(&caption, Stage::Poetry, photo_poetry::session::CAPTION_FIRST)?;
            println!("{}", backend.convert(&caption).await.map_err(alert)?);
            Ok(())
        }
        Command::FetchImage { image_name, output } => {
            save_uploaded_image(&backend, &image_name, &output).await
        }
    }
}

async fn run_workflow(
    config: &ClientConfig,
    backend: &HttpBackend,
    source: &SourceArgs,
    save_image: Option<PathBuf>,
) -> Result<()> {
    let mut session = PoetrySession::new();
    capture_into(&mut session, config, source).await?;

    session.upload(backend).await.map_err(alert)?;
    let image_name = session.image_name().unwrap_or_default().to_string();
    println!("Image name: {}", image_name);
    if let Some(url) = session.upload_receipt().and_then(|r| r.image_url.as_deref()) {
        println!("Image URL:  {}", url);
    }
    if let Some(path) = save_image {
        save_uploaded_image(backend, &image_name, &path).await?;
    }

    session.generate_caption(backend).await.map_err(alert)?;
    println!("\nCaption:\n{}", session.caption());

    session.convert_to_poem(backend).await.map_err(alert)?;
    println!("\nPoem:\n{}", session.poem());
    Ok(())
}

async fn capture_into(
    session: &mut PoetrySession,
    config: &ClientConfig,
    source: &SourceArgs,
) -> Result<()> {
    let mut image_source: Box<dyn ImageSource> = match (&source.file, source.camera) {
        (Some(path), _) => Box::new(FileSource::new(path)),
        (None, true) => Box::new(CameraSource::new(config.camera.clone())),
        (None, false) => return Err(anyhow!("Choose an image with --file or --camera")),
    };
    let image = capture_image(image_source.as_mut(), config.max_long_side)
        .await
        .map_err(|e| {
            alert(e).context(format!("Could not capture from {}", image_source.describe()))
        })?;
    session.capture(image);
    Ok(())
}

async fn save_uploaded_image(
    backend: &HttpBackend,
    image_name: &str,
    output: &Path,
) -> Result<()> {
    let bytes = backend.fetch_image(image_name).await.map_err(alert)?;
    tokio::fs::write(output, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Saved {} ({} bytes)", output.display(), bytes.len());
    Ok(())
}

fn require_text(value: &str, stage: Stage, notice: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(alert(PoetryError::precondition(stage, notice)));
    }
    Ok(())
}

/// The terminal's equivalent of a blocking alert: the notice, then exit.
fn alert(error: PoetryError) -> anyhow::Error {
    anyhow!(error.alert_text())
}
