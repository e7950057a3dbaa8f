use crate::consts::CARD_UPSCALE;
use crate::ocr::clamp_to_image;
use crate::pipeline::PlateDetection;
use anyhow::{Context, Result};
use log::info;
use opencv::{
    core::{self, AlgorithmHint, Mat, Point, Scalar, Size, Vector},
    imgcodecs, imgproc,
    prelude::*,
};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

/// Cross-frame accumulation of plate sightings for one run.
///
/// Counts grow monotonically for the life of the session. A plate is
/// announced and persisted only on its first sighting; the upstream
/// behavior of re-reporting a plate whenever it differed from the most
/// recently reported one double-counted plates seen non-consecutively.
pub struct SessionTracker {
    counts: HashMap<String, u32>,
    last_reported: Option<String>,
    frames: u64,
    output_dir: PathBuf,
}

impl SessionTracker {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir).with_context(|| {
            format!("failed to create output directory {}", output_dir.display())
        })?;

        Ok(Self {
            counts: HashMap::new(),
            last_reported: None,
            frames: 0,
            output_dir,
        })
    }

    /// Advance the frame counter; returns the index of the new frame.
    pub fn begin_frame(&mut self) -> u64 {
        self.frames += 1;
        self.frames
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn unique_plates(&self) -> usize {
        self.counts.len()
    }

    pub fn last_reported(&self) -> Option<&str> {
        self.last_reported.as_deref()
    }

    /// Record one detection of `text`. Returns `true` exactly when this is
    /// the first sighting of that plate in the session.
    pub fn observe(&mut self, text: &str) -> bool {
        let count = self.counts.entry(text.to_string()).or_insert(0);
        *count += 1;
        let first = *count == 1;
        self.last_reported = Some(text.to_string());
        first
    }

    /// Write a plate card to `plate_detected_<TEXT>_<FRAME>.jpg` in the
    /// output directory. An existing file of the same name is overwritten.
    pub fn persist_card(&self, card: &Mat, text: &str) -> Result<PathBuf> {
        let path = self
            .output_dir
            .join(format!("plate_detected_{}_{}.jpg", text, self.frames));
        let path_str = path
            .to_str()
            .with_context(|| format!("output path {} is not valid UTF-8", path.display()))?;
        imgcodecs::imwrite(path_str, card, &Vector::new())
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Log the end-of-session totals, plates sorted by text.
    pub fn log_summary(&self) {
        info!("Total frames processed: {}", self.frames);
        if self.counts.is_empty() {
            info!("No license plates detected in this session.");
            return;
        }

        info!("Unique plates detected: {}", self.counts.len());
        let mut plates: Vec<_> = self.counts.iter().collect();
        plates.sort_by(|a, b| a.0.cmp(b.0));
        for (plate, count) in plates {
            info!("  {plate}: {count} detection(s)");
        }
    }
}

/// Render the grayscale crop of a detection as a presentation card: the
/// region enlarged by [`CARD_UPSCALE`], a white border, and the plate text
/// captioned on top. `None` when the region is degenerate.
pub fn render_plate_card(frame: &Mat, detection: &PlateDetection) -> Result<Option<Mat>> {
    let mut gray = Mat::default();
    imgproc::cvt_color(
        frame,
        &mut gray,
        imgproc::COLOR_BGR2GRAY,
        0,
        AlgorithmHint::ALGO_HINT_DEFAULT,
    )?;

    let Some(region_rect) = clamp_to_image(detection.bbox, gray.cols(), gray.rows()) else {
        return Ok(None);
    };
    let region = Mat::roi(&gray, region_rect)?.try_clone()?;

    let mut enlarged = Mat::default();
    imgproc::resize(
        &region,
        &mut enlarged,
        Size::default(),
        CARD_UPSCALE,
        CARD_UPSCALE,
        imgproc::INTER_CUBIC,
    )?;

    let mut card = Mat::default();
    core::copy_make_border(
        &enlarged,
        &mut card,
        40,
        40,
        10,
        10,
        core::BORDER_CONSTANT,
        Scalar::all(255.0),
    )?;

    imgproc::put_text(
        &mut card,
        &format!("PLATE: {}", detection.text),
        Point::new(15, 25),
        imgproc::FONT_HERSHEY_SIMPLEX,
        1.2,
        Scalar::all(0.0),
        3,
        imgproc::LINE_8,
        false,
    )?;

    Ok(Some(card))
}
