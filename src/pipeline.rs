use crate::consts::{
    ADAPTIVE_BLOCK_SIZE, ADAPTIVE_OFFSET, BILATERAL_DIAMETER, BILATERAL_SIGMA, CANNY_HIGH,
    CANNY_LOW, CLAHE_CLIP_LIMIT, CLAHE_TILE_GRID, MAX_ASPECT_RATIO, MAX_CONTOURS, MAX_CORNERS,
    MIN_ASPECT_RATIO, MIN_CONTOUR_AREA, MIN_CORNERS, MIN_PLATE_LEN, POLY_EPSILON_FACTOR,
};
use crate::ocr::{self, OcrEngine};
use anyhow::Result;
use log::debug;
use opencv::{
    core::{self, AlgorithmHint, Mat, Point, Ptr, Rect, Size, Vector},
    imgproc::{self, CLAHE},
    prelude::*,
};
use std::collections::HashSet;

/// A contour that survived the geometric plate filters.
#[derive(Debug, Clone)]
pub struct PlateCandidate {
    pub bbox: Rect,
    pub area: f64,
    pub corners: usize,
}

/// A recognized plate within one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateDetection {
    pub bbox: Rect,
    pub text: String,
}

/// Per-frame plate localization and recognition.
///
/// The only state carried between frames is the CLAHE contrast profile;
/// `process` is deterministic for a fixed frame and OCR engine.
pub struct PlateRecognizer {
    clahe: Ptr<CLAHE>,
}

impl PlateRecognizer {
    pub fn new() -> Result<Self> {
        let clahe = imgproc::create_clahe(
            CLAHE_CLIP_LIMIT,
            Size::new(CLAHE_TILE_GRID, CLAHE_TILE_GRID),
        )?;
        Ok(Self { clahe })
    }

    /// Preprocess a BGR frame and extract the largest contours.
    ///
    /// Returns the contours sorted by enclosed area, largest first, capped
    /// at [`MAX_CONTOURS`], together with the contrast-enhanced grayscale
    /// image used for downstream cropping. An empty frame or one that is
    /// not 3-channel 8-bit yields no contours rather than an error.
    pub fn extract_contours(&mut self, frame: &Mat) -> Result<(Vector<Vector<Point>>, Mat)> {
        if frame.empty() || frame.channels() != 3 || frame.depth() != core::CV_8U {
            return Ok((Vector::new(), Mat::default()));
        }

        let mut gray = Mat::default();
        imgproc::cvt_color(
            frame,
            &mut gray,
            imgproc::COLOR_BGR2GRAY,
            0,
            AlgorithmHint::ALGO_HINT_DEFAULT,
        )?;

        let mut equalized = Mat::default();
        self.clahe.apply(&gray, &mut equalized)?;

        let mut blur = Mat::default();
        imgproc::bilateral_filter(
            &equalized,
            &mut blur,
            BILATERAL_DIAMETER,
            BILATERAL_SIGMA,
            BILATERAL_SIGMA,
            core::BORDER_DEFAULT,
        )?;

        let mut thresh = Mat::default();
        imgproc::adaptive_threshold(
            &blur,
            &mut thresh,
            255.0,
            imgproc::ADAPTIVE_THRESH_GAUSSIAN_C,
            imgproc::THRESH_BINARY,
            ADAPTIVE_BLOCK_SIZE,
            ADAPTIVE_OFFSET,
        )?;

        let mut edges = Mat::default();
        imgproc::canny(&blur, &mut edges, CANNY_LOW, CANNY_HIGH, 3, false)?;

        // Threshold catches uniformly lit plates, Canny the high-contrast
        // rims; either signal is enough to trace a boundary.
        let mut combined = Mat::default();
        core::bitwise_or(&thresh, &edges, &mut combined, &core::no_array())?;

        let mut contours: Vector<Vector<Point>> = Vector::new();
        imgproc::find_contours(
            &combined,
            &mut contours,
            imgproc::RETR_TREE,
            imgproc::CHAIN_APPROX_SIMPLE,
            Point::new(0, 0),
        )?;

        let mut ranked: Vec<(f64, Vector<Point>)> = Vec::with_capacity(contours.len());
        for contour in &contours {
            let area = imgproc::contour_area(&contour, false)?;
            ranked.push((area, contour));
        }
        ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(MAX_CONTOURS);

        Ok((ranked.into_iter().map(|(_, c)| c).collect(), equalized))
    }

    /// Keep the contours shaped like license plates.
    ///
    /// A contour passes when its enclosed area reaches [`MIN_CONTOUR_AREA`],
    /// its polygon approximation has [`MIN_CORNERS`]..=[`MAX_CORNERS`]
    /// corners, and its bounding box aspect ratio falls within
    /// [`MIN_ASPECT_RATIO`]..=[`MAX_ASPECT_RATIO`]. Input order is kept.
    pub fn filter_candidates(&self, contours: &Vector<Vector<Point>>) -> Result<Vec<PlateCandidate>> {
        let mut candidates = Vec::new();

        for contour in contours {
            let area = imgproc::contour_area(&contour, false)?;
            if area < MIN_CONTOUR_AREA {
                continue;
            }

            let perimeter = imgproc::arc_length(&contour, true)?;
            let mut approx: Vector<Point> = Vector::new();
            imgproc::approx_poly_dp(&contour, &mut approx, POLY_EPSILON_FACTOR * perimeter, true)?;
            let corners = approx.len();
            if !(MIN_CORNERS..=MAX_CORNERS).contains(&corners) {
                continue;
            }

            let bbox = imgproc::bounding_rect(&contour)?;
            let aspect = f64::from(bbox.width) / f64::from(bbox.height);
            if !(MIN_ASPECT_RATIO..=MAX_ASPECT_RATIO).contains(&aspect) {
                continue;
            }

            candidates.push(PlateCandidate { bbox, area, corners });
        }

        Ok(candidates)
    }

    /// Run the full per-frame pipeline: contour extraction, geometric
    /// filtering, per-candidate OCR, text normalization, and per-frame
    /// deduplication. A failing OCR call or unusable text drops that one
    /// candidate, never the frame.
    pub fn process<E: OcrEngine>(&mut self, frame: &Mat, engine: &mut E) -> Result<Vec<PlateDetection>> {
        let (contours, gray) = self.extract_contours(frame)?;
        let candidates = self.filter_candidates(&contours)?;

        let mut detections = Vec::new();
        for candidate in candidates {
            let raw = ocr::read_plate_text(&gray, candidate.bbox, engine)?;
            let Some(text) = normalize_plate_text(&raw) else {
                if !raw.is_empty() {
                    debug!("discarding unusable OCR text {raw:?}");
                }
                continue;
            };
            detections.push(PlateDetection {
                bbox: candidate.bbox,
                text,
            });
        }

        Ok(dedupe_detections(detections))
    }
}

/// Uppercase the raw OCR output and strip everything outside `A-Z0-9`.
/// Results shorter than [`MIN_PLATE_LEN`] characters are rejected.
pub fn normalize_plate_text(raw: &str) -> Option<String> {
    let clean: String = raw
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect();
    (clean.len() >= MIN_PLATE_LEN).then_some(clean)
}

/// Collapse detections that read the same text; first occurrence wins.
/// The seen-set is scoped to a single frame's detections.
pub fn dedupe_detections(detections: Vec<PlateDetection>) -> Vec<PlateDetection> {
    let mut seen = HashSet::new();
    detections
        .into_iter()
        .filter(|d| seen.insert(d.text.clone()))
        .collect()
}
