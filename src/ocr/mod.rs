// OCR engine trait and the ROI normalization in front of it

use crate::consts::OCR_UPSCALE;
use anyhow::Result;
use log::debug;
use opencv::{
    core::{Mat, Rect, Size},
    imgproc,
    prelude::*,
};

pub mod tesseract_ocr;

/// Trait for OCR engines that read text out of a prepared plate region.
///
/// Implementations receive a binarized single-channel image and are expected
/// to treat it as a single line of text drawn from `A-Z0-9`.
pub trait OcrEngine {
    fn recognize(&mut self, binary: &Mat) -> Result<String>;
}

/// Clamp `bbox` to the image bounds. `None` when nothing is left.
pub fn clamp_to_image(bbox: Rect, cols: i32, rows: i32) -> Option<Rect> {
    let x = bbox.x.clamp(0, cols);
    let y = bbox.y.clamp(0, rows);
    let width = (bbox.x + bbox.width).min(cols) - x;
    let height = (bbox.y + bbox.height).min(rows) - y;
    (width > 0 && height > 0).then(|| Rect::new(x, y, width, height))
}

/// Normalize a candidate region for recognition: crop, upscale by
/// [`OCR_UPSCALE`] with cubic interpolation, then binarize with Otsu's
/// method. `None` for a degenerate crop.
pub fn prepare_roi(gray: &Mat, bbox: Rect) -> Result<Option<Mat>> {
    let Some(roi_rect) = clamp_to_image(bbox, gray.cols(), gray.rows()) else {
        return Ok(None);
    };
    let roi = Mat::roi(gray, roi_rect)?.try_clone()?;

    let mut enlarged = Mat::default();
    imgproc::resize(
        &roi,
        &mut enlarged,
        Size::default(),
        OCR_UPSCALE,
        OCR_UPSCALE,
        imgproc::INTER_CUBIC,
    )?;

    let mut binary = Mat::default();
    imgproc::threshold(
        &enlarged,
        &mut binary,
        0.0,
        255.0,
        imgproc::THRESH_BINARY | imgproc::THRESH_OTSU,
    )?;

    Ok(Some(binary))
}

/// Read the raw plate text for one candidate region.
///
/// Empty crops and engine failures both come back as an empty string; a
/// single bad candidate must not abort the rest of the frame.
pub fn read_plate_text<E: OcrEngine>(gray: &Mat, bbox: Rect, engine: &mut E) -> Result<String> {
    let Some(binary) = prepare_roi(gray, bbox)? else {
        return Ok(String::new());
    };

    match engine.recognize(&binary) {
        Ok(text) => Ok(text.trim().to_string()),
        Err(err) => {
            debug!(
                "OCR failed for region at ({}, {}): {err:#}",
                bbox.x, bbox.y
            );
            Ok(String::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{CV_8UC1, Scalar};

    fn gray(cols: i32, rows: i32) -> Mat {
        Mat::new_rows_cols_with_default(rows, cols, CV_8UC1, Scalar::all(128.0)).unwrap()
    }

    #[test]
    fn clamp_rejects_degenerate_regions() {
        assert!(clamp_to_image(Rect::new(0, 0, 0, 10), 100, 100).is_none());
        assert!(clamp_to_image(Rect::new(200, 0, 10, 10), 100, 100).is_none());
        assert!(clamp_to_image(Rect::new(-20, 0, 10, 10), 100, 100).is_none());
    }

    #[test]
    fn clamp_trims_overhanging_regions() {
        let trimmed = clamp_to_image(Rect::new(90, 90, 50, 50), 100, 100).unwrap();
        assert_eq!(trimmed, Rect::new(90, 90, 10, 10));

        let inside = clamp_to_image(Rect::new(10, 10, 30, 20), 100, 100).unwrap();
        assert_eq!(inside, Rect::new(10, 10, 30, 20));
    }

    #[test]
    fn prepare_roi_upscales_by_three() {
        let img = gray(200, 100);
        let binary = prepare_roi(&img, Rect::new(10, 10, 60, 20)).unwrap().unwrap();
        assert_eq!(binary.cols(), 180);
        assert_eq!(binary.rows(), 60);
        assert_eq!(binary.channels(), 1);
    }

    #[test]
    fn prepare_roi_skips_empty_crop() {
        let img = gray(200, 100);
        assert!(prepare_roi(&img, Rect::new(300, 0, 50, 50)).unwrap().is_none());
        assert!(prepare_roi(&Mat::default(), Rect::new(0, 0, 10, 10)).unwrap().is_none());
    }

    #[test]
    fn read_plate_text_swallows_engine_failures() {
        struct Broken;
        impl OcrEngine for Broken {
            fn recognize(&mut self, _: &Mat) -> Result<String> {
                anyhow::bail!("engine unavailable")
            }
        }

        let img = gray(200, 100);
        let text = read_plate_text(&img, Rect::new(10, 10, 60, 20), &mut Broken).unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn read_plate_text_trims_whitespace() {
        struct Noisy;
        impl OcrEngine for Noisy {
            fn recognize(&mut self, _: &Mat) -> Result<String> {
                Ok(" AB1234 \n".to_string())
            }
        }

        let img = gray(200, 100);
        let text = read_plate_text(&img, Rect::new(10, 10, 60, 20), &mut Noisy).unwrap();
        assert_eq!(text, "AB1234");
    }
}
