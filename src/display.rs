use anyhow::Result;
use log::warn;
use opencv::{
    core::{Mat, Point, Scalar},
    highgui,
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
};
use platewatch::pipeline::PlateDetection;

const FEED_WINDOW: &str = "Camera Feed - License Plate Detection";
const PLATE_WINDOW: &str = "Detected License Plate";

fn green() -> Scalar {
    Scalar::new(0.0, 255.0, 0.0, 0.0)
}

/// Live display windows; degrades to headless when no display is usable.
pub struct Display {
    enabled: bool,
}

impl Display {
    pub fn new(headless: bool) -> Self {
        if headless {
            return Self { enabled: false };
        }
        match highgui::named_window(FEED_WINDOW, highgui::WINDOW_AUTOSIZE) {
            Ok(()) => Self { enabled: true },
            Err(err) => {
                warn!("Failed to open display window: {err}. Running headless.");
                Self { enabled: false }
            }
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn show_frame(&self, frame: &Mat) -> Result<()> {
        if self.enabled {
            highgui::imshow(FEED_WINDOW, frame)?;
        }
        Ok(())
    }

    /// Popup with the enlarged crop of a newly seen plate.
    pub fn show_plate(&self, card: &Mat) -> Result<()> {
        if self.enabled {
            highgui::imshow(PLATE_WINDOW, card)?;
        }
        Ok(())
    }

    /// Pump the window event loop; `true` when the user pressed `q` or ESC.
    pub fn poll_quit(&self) -> Result<bool> {
        if !self.enabled {
            return Ok(false);
        }
        let key = highgui::wait_key(1)?;
        Ok(key == i32::from(b'q') || key == 27)
    }
}

/// Draw a green box and the recognized text for every detection.
pub fn draw_detections(frame: &mut Mat, detections: &[PlateDetection]) -> Result<()> {
    for detection in detections {
        imgproc::rectangle(frame, detection.bbox, green(), 2, LINE_8, 0)?;
        imgproc::put_text(
            frame,
            &detection.text,
            Point::new(detection.bbox.x, detection.bbox.y - 10),
            FONT_HERSHEY_SIMPLEX,
            0.8,
            green(),
            2,
            LINE_8,
            false,
        )?;
    }
    Ok(())
}

/// Frame counter and unique-plate tally in the top-left corner.
pub fn draw_hud(frame: &mut Mat, frame_index: u64, unique_plates: usize) -> Result<()> {
    let text = format!("Frame: {frame_index} | Plates: {unique_plates} unique");
    imgproc::put_text(
        frame,
        &text,
        Point::new(20, 40),
        FONT_HERSHEY_SIMPLEX,
        1.0,
        green(),
        2,
        LINE_8,
        false,
    )?;
    Ok(())
}
