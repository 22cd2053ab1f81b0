// # Camera Snapshot
//
// Takes a single still from a live camera by asking `ffmpeg` for one frame
// from the platform's capture input and reading it back as PNG on stdout.
//
// | Platform | ffmpeg input | Device example |
// |----------|--------------|----------------|
// | Linux    | `v4l2`        | `/dev/video0` |
// | macOS    | `avfoundation`| `0` |
// | Windows  | `dshow`       | `video=Integrated Camera` |

use std::process::{Command, Stdio};

use async_trait::async_trait;
use tokio::task::spawn_blocking;

use super::ImageSource;
use crate::config::CameraConfig;
use crate::error::{PoetryError, PoetryResult};

/// Snapshots from a live camera through an `ffmpeg` subprocess.
#[derive(Debug, Clone)]
pub struct CameraSource {
    config: CameraConfig,
}

impl CameraSource {
    pub fn new(config: CameraConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }
}

/// ffmpeg arguments that read one frame from `config.device` and write it
/// to stdout as PNG.
pub fn snapshot_args(config: &CameraConfig) -> Vec<String> {
    let size = format!("{}x{}", config.width, config.height);
    let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    if cfg!(target_os = "macos") {
        // avfoundation refuses to open without an explicit frame rate.
        args.extend(
            ["-f", "avfoundation", "-framerate", "30", "-video_size"]
                .iter()
                .map(|s| s.to_string()),
        );
        args.push(size);
        args.push("-i".to_string());
        args.push(config.device.clone());
    } else if cfg!(target_os = "windows") {
        args.extend(["-f", "dshow", "-video_size"].iter().map(|s| s.to_string()));
        args.push(size);
        args.push("-i".to_string());
        args.push(format!("video={}", config.device));
    } else {
        args.extend(["-f", "v4l2", "-video_size"].iter().map(|s| s.to_string()));
        args.push(size);
        args.push("-i".to_string());
        args.push(config.device.clone());
    }

    args.extend(
        ["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "-"]
            .iter()
            .map(|s| s.to_string()),
    );
    args
}

fn run_ffmpeg(config: CameraConfig) -> PoetryResult<Vec<u8>> {
    let output = Command::new(&config.ffmpeg)
        .args(snapshot_args(&config))
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            PoetryError::capture(
                "camera",
                format!("failed to start '{}': {}", config.ffmpeg, e),
            )
            .with_recovery_suggestion("Install ffmpeg and make sure it is on PATH")
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PoetryError::capture(
            "camera",
            format!("ffmpeg exited with {}: {}", output.status, stderr.trim()),
        ));
    }
    if output.stdout.is_empty() {
        return Err(PoetryError::capture("camera", "ffmpeg produced no frame"));
    }
    Ok(output.stdout)
}

#[async_trait]
impl ImageSource for CameraSource {
    async fn grab(&mut self) -> PoetryResult<Vec<u8>> {
        let config = self.config.clone();
        tracing::debug!("Taking camera snapshot from {}", config.device);
        spawn_blocking(move || run_ffmpeg(config))
            .await
            .map_err(|e| PoetryError::capture("camera", e.to_string()))?
    }

    fn describe(&self) -> String {
        format!("camera {}", self.config.device)
    }
}
