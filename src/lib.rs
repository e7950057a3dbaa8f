pub mod consts {
    //! Fixed tuning profile of the detection pipeline.

    /// Contrast-limited adaptive histogram equalization, applied before
    /// thresholding to compensate for uneven lighting and shadow.
    pub const CLAHE_CLIP_LIMIT: f64 = 3.0;
    pub const CLAHE_TILE_GRID: i32 = 8;

    /// Edge-preserving noise suppression ahead of threshold/edge extraction.
    pub const BILATERAL_DIAMETER: i32 = 11;
    pub const BILATERAL_SIGMA: f64 = 17.0;

    pub const ADAPTIVE_BLOCK_SIZE: i32 = 11;
    pub const ADAPTIVE_OFFSET: f64 = 2.0;

    pub const CANNY_LOW: f64 = 30.0;
    pub const CANNY_HIGH: f64 = 200.0;

    /// Only the largest contours are considered per frame.
    pub const MAX_CONTOURS: usize = 30;
    pub const MIN_CONTOUR_AREA: f64 = 300.0;

    /// Plate outlines approximate to a handful of corners.
    pub const POLY_EPSILON_FACTOR: f64 = 0.02;
    pub const MIN_CORNERS: usize = 4;
    pub const MAX_CORNERS: usize = 8;

    /// Bounding-box width/height range of plausible plates, inclusive.
    pub const MIN_ASPECT_RATIO: f64 = 1.5;
    pub const MAX_ASPECT_RATIO: f64 = 8.0;

    /// Candidate regions are enlarged before OCR; small glyphs read poorly.
    pub const OCR_UPSCALE: f64 = 3.0;

    pub const PLATE_CHAR_WHITELIST: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    pub const MIN_PLATE_LEN: usize = 4;

    /// Saved plate crops are enlarged for readability.
    pub const CARD_UPSCALE: f64 = 4.0;
}

pub mod ocr;
pub mod pipeline;
pub mod session;
