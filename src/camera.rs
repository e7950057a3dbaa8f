use anyhow::{Context, Result, bail};
use log::{error, info, warn};
use opencv::{
    prelude::*,
    videoio::{self, VideoCapture},
};

pub struct CameraConfig {
    pub index: i32,
    pub width: i32,
    pub height: i32,
    pub fps: i32,
}

/// Open and configure the capture device.
///
/// Tries the requested index first and falls back to the next one, the
/// usual fix when another application grabbed the default device. The
/// requested resolution and frame rate are best-effort; the negotiated
/// values are logged.
pub fn open_camera(config: &CameraConfig) -> Result<VideoCapture> {
    let mut capture = VideoCapture::new(config.index, videoio::CAP_ANY)
        .with_context(|| format!("failed to open camera index {}", config.index))?;

    if !capture.is_opened()? {
        warn!(
            "Camera {} unavailable, trying index {}",
            config.index,
            config.index + 1
        );
        capture = VideoCapture::new(config.index + 1, videoio::CAP_ANY)?;
    }

    if !capture.is_opened()? {
        error!("Cannot access any camera. Things to check:");
        error!("  1. A camera is connected");
        error!("  2. The application has camera permission");
        error!("  3. No other application is holding the camera");
        error!("  4. On Linux: the user can read /dev/video*");
        bail!("no usable camera device");
    }

    // Best-effort requests; drivers are free to pick something else.
    let _ = capture.set(videoio::CAP_PROP_FRAME_WIDTH, f64::from(config.width));
    let _ = capture.set(videoio::CAP_PROP_FRAME_HEIGHT, f64::from(config.height));
    let _ = capture.set(videoio::CAP_PROP_FPS, f64::from(config.fps));

    let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as i32;
    let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as i32;
    let fps = capture.get(videoio::CAP_PROP_FPS)? as i32;
    info!("Camera opened: {width}x{height} @ {fps}fps");

    Ok(capture)
}
