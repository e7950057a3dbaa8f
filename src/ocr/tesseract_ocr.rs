// Tesseract-backed plate reader

use super::OcrEngine;
use crate::consts::PLATE_CHAR_WHITELIST;
use anyhow::{Context, Result};
use opencv::{core::Mat, prelude::*};
use tesseract::Tesseract;

/// Plate reader backed by libtesseract.
///
/// The `tesseract` crate's handle is consumed by its builder-style call
/// chain, so a fresh engine is initialized for every recognition. The
/// engine runs in its default mode, restricted to the plate character
/// whitelist and single-line page segmentation.
pub struct TesseractOcrEngine {
    datapath: Option<String>,
    language: String,
}

impl TesseractOcrEngine {
    /// `datapath` overrides the tessdata directory; `None` uses the system
    /// default. Fails when the language data cannot be loaded.
    pub fn new(datapath: Option<String>, language: &str) -> Result<Self> {
        Tesseract::new(datapath.as_deref(), Some(language)).with_context(|| {
            format!("failed to initialize tesseract for language {language:?}")
        })?;

        Ok(Self {
            datapath,
            language: language.to_string(),
        })
    }
}

impl OcrEngine for TesseractOcrEngine {
    fn recognize(&mut self, binary: &Mat) -> Result<String> {
        let width = binary.cols();
        let height = binary.rows();
        if width == 0 || height == 0 {
            return Ok(String::new());
        }

        // `prepare_roi` hands over a freshly allocated single-channel Mat,
        // so the data is continuous with one byte per pixel.
        let data = binary.data_bytes()?;

        // PSM 7 treats the crop as a single line of text.
        let text = Tesseract::new(self.datapath.as_deref(), Some(&self.language))?
            .set_variable("tessedit_char_whitelist", PLATE_CHAR_WHITELIST)?
            .set_variable("tessedit_pageseg_mode", "7")?
            .set_frame(data, width, height, 1, width)?
            .recognize()?
            .get_text()?;
        Ok(text)
    }
}
