use anyhow::Result;
use clap::Parser;
use log::{debug, error, info};
use opencv::{core::Mat, prelude::*};
use platewatch::{
    ocr::tesseract_ocr::TesseractOcrEngine,
    pipeline::PlateRecognizer,
    session::{self, SessionTracker},
};
use std::path::PathBuf;

mod camera;
mod display;

/// Real-time license plate localization and OCR on a live camera feed
#[derive(Parser, Debug)]
#[command(name = "platewatch")]
#[command(about = "License plate detection and recognition from a camera", long_about = None)]
struct Args {
    /// Camera device index (the next index is tried when this one fails)
    #[arg(short = 'c', long, default_value_t = 0)]
    camera_index: i32,

    /// Requested capture width in pixels
    #[arg(long, default_value_t = 1280)]
    width: i32,

    /// Requested capture height in pixels
    #[arg(long, default_value_t = 720)]
    height: i32,

    /// Requested capture frame rate
    #[arg(long, default_value_t = 30)]
    fps: i32,

    /// Directory where plate crops are written
    #[arg(short = 'o', long, default_value = ".")]
    output_dir: PathBuf,

    /// Tesseract data directory (system default when unset)
    #[arg(long)]
    tessdata: Option<String>,

    /// Tesseract language
    #[arg(long, default_value = "eng")]
    language: String,

    /// Run without display windows
    #[arg(long)]
    headless: bool,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter(None, log::LevelFilter::Info)
        .filter(Some("platewatch"), log::LevelFilter::Debug)
        .init();

    let args = Args::parse();

    let mut recognizer = PlateRecognizer::new()?;
    let mut engine = TesseractOcrEngine::new(args.tessdata.clone(), &args.language)?;
    let mut tracker = SessionTracker::new(&args.output_dir)?;

    let mut capture = camera::open_camera(&camera::CameraConfig {
        index: args.camera_index,
        width: args.width,
        height: args.height,
        fps: args.fps,
    })?;
    let display = display::Display::new(args.headless);

    info!("Waiting for license plates... press 'q' to quit");

    let mut frame = Mat::default();
    loop {
        if !capture.read(&mut frame)? || frame.empty() {
            error!("Failed to read frame from camera");
            break;
        }
        let frame_index = tracker.begin_frame();

        let detections = recognizer.process(&frame, &mut engine)?;

        for detection in &detections {
            debug!(
                "frame {}: {} at ({}, {}) {}x{}",
                frame_index,
                detection.text,
                detection.bbox.x,
                detection.bbox.y,
                detection.bbox.width,
                detection.bbox.height
            );

            if tracker.observe(&detection.text) {
                info!("Detected plate {} (frame {})", detection.text, frame_index);
                match session::render_plate_card(&frame, detection)? {
                    Some(card) => {
                        let path = tracker.persist_card(&card, &detection.text)?;
                        info!("Saved: {}", path.display());
                        display.show_plate(&card)?;
                    }
                    None => debug!("plate region for {} was empty", detection.text),
                }
            }
        }

        if display.enabled() {
            let mut display_frame = frame.clone();
            display::draw_detections(&mut display_frame, &detections)?;
            display::draw_hud(&mut display_frame, frame_index, tracker.unique_plates())?;
            display.show_frame(&display_frame)?;

            if display.poll_quit()? {
                info!("Stopping detection...");
                break;
            }
        }
    }

    tracker.log_summary();
    Ok(())
}
