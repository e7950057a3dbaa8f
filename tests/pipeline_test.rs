use anyhow::Result;
use opencv::{
    core::{CV_8UC3, Mat, Point, Rect, Scalar},
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
};
use platewatch::{
    ocr::OcrEngine,
    pipeline::{PlateDetection, PlateRecognizer},
};

/// OCR stand-in that answers every recognition with the same string, so
/// the geometric pipeline can be exercised without installed tessdata.
struct FixedOcr(&'static str);

impl OcrEngine for FixedOcr {
    fn recognize(&mut self, _binary: &Mat) -> Result<String> {
        Ok(self.0.to_string())
    }
}

/// OCR stand-in that fails on every call.
struct BrokenOcr;

impl OcrEngine for BrokenOcr {
    fn recognize(&mut self, _binary: &Mat) -> Result<String> {
        anyhow::bail!("engine crashed")
    }
}

fn blank_frame(value: f64) -> Result<Mat> {
    Ok(Mat::new_rows_cols_with_default(
        480,
        640,
        CV_8UC3,
        Scalar::all(value),
    )?)
}

/// Dark frame with one bright plate-shaped rectangle carrying dark text.
fn plate_frame(label: &str, rect: Rect) -> Result<Mat> {
    let mut frame = blank_frame(30.0)?;
    draw_plate(&mut frame, label, rect)?;
    Ok(frame)
}

fn draw_plate(frame: &mut Mat, label: &str, rect: Rect) -> Result<()> {
    imgproc::rectangle(frame, rect, Scalar::all(255.0), imgproc::FILLED, LINE_8, 0)?;
    imgproc::put_text(
        frame,
        label,
        Point::new(rect.x + 20, rect.y + rect.height - 30),
        FONT_HERSHEY_SIMPLEX,
        1.5,
        Scalar::all(0.0),
        3,
        LINE_8,
        false,
    )?;
    Ok(())
}

#[test]
fn blank_frame_yields_no_detections() -> Result<()> {
    let frame = blank_frame(128.0)?;
    let mut recognizer = PlateRecognizer::new()?;

    // Even an eager OCR engine cannot produce a detection when no contour
    // passes the geometric filters.
    let detections = recognizer.process(&frame, &mut FixedOcr("ZZ99"))?;
    assert!(detections.is_empty());
    Ok(())
}

#[test]
fn high_contrast_plate_is_detected_once() -> Result<()> {
    // Aspect ratio 3.0, area well above the minimum.
    let plate = Rect::new(170, 190, 300, 100);
    let frame = plate_frame("AB1234", plate)?;
    let mut recognizer = PlateRecognizer::new()?;

    let detections = recognizer.process(&frame, &mut FixedOcr("AB 1234\n"))?;

    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].text, "AB1234");
    // The reported box outlines the drawn plate.
    let bbox = detections[0].bbox;
    assert!(bbox.x >= plate.x - 10 && bbox.x <= plate.x + 20);
    assert!(bbox.y >= plate.y - 10 && bbox.y <= plate.y + 20);
    Ok(())
}

#[test]
fn same_text_in_two_regions_is_reported_once() -> Result<()> {
    let mut frame = blank_frame(30.0)?;
    draw_plate(&mut frame, "XY9999", Rect::new(60, 80, 240, 80))?;
    draw_plate(&mut frame, "XY9999", Rect::new(340, 320, 240, 80))?;
    let mut recognizer = PlateRecognizer::new()?;

    let detections = recognizer.process(&frame, &mut FixedOcr("XY9999"))?;

    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].text, "XY9999");
    Ok(())
}

#[test]
fn process_is_deterministic_for_a_fixed_frame() -> Result<()> {
    let frame = plate_frame("AB1234", Rect::new(170, 190, 300, 100))?;
    let mut recognizer = PlateRecognizer::new()?;

    let first: Vec<PlateDetection> = recognizer.process(&frame, &mut FixedOcr("AB1234"))?;
    let second: Vec<PlateDetection> = recognizer.process(&frame, &mut FixedOcr("AB1234"))?;

    assert_eq!(first, second);
    Ok(())
}

#[test]
fn detection_text_is_clean_uppercase_alphanumeric() -> Result<()> {
    let frame = plate_frame("AB1234", Rect::new(170, 190, 300, 100))?;
    let mut recognizer = PlateRecognizer::new()?;

    // Raw OCR output with noise the normalizer must strip.
    let detections = recognizer.process(&frame, &mut FixedOcr(" ab-12.34 xy "))?;

    for detection in &detections {
        assert!(detection.text.len() >= 4);
        assert!(
            detection
                .text
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
            "unexpected text {:?}",
            detection.text
        );
    }
    assert!(!detections.is_empty());
    assert_eq!(detections[0].text, "AB1234XY");
    Ok(())
}

#[test]
fn short_ocr_text_is_dropped() -> Result<()> {
    let frame = plate_frame("AB1234", Rect::new(170, 190, 300, 100))?;
    let mut recognizer = PlateRecognizer::new()?;

    let detections = recognizer.process(&frame, &mut FixedOcr("A1!"))?;
    assert!(detections.is_empty());
    Ok(())
}

#[test]
fn failing_ocr_engine_does_not_abort_the_frame() -> Result<()> {
    let frame = plate_frame("AB1234", Rect::new(170, 190, 300, 100))?;
    let mut recognizer = PlateRecognizer::new()?;

    // Every candidate fails recognition; the frame still completes with an
    // empty result instead of an error.
    let detections = recognizer.process(&frame, &mut BrokenOcr)?;
    assert!(detections.is_empty());
    Ok(())
}
