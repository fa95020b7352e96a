/// Minimum confidence a detection must exceed to be kept in the response.
pub const CONFIDENCE_THRESHOLD: f32 = 0.15;

/// Largest side, in pixels, of an image handed to the layout model.
///
/// Uploads exceeding this on either axis are scaled down proportionally.
pub const MAX_DIMENSION: u32 = 2000;

/// Stroke width of the bounding boxes drawn on the annotated image.
pub const BOX_STROKE_WIDTH: i32 = 3;

/// Pixel height used to render detection labels.
pub const LABEL_FONT_SCALE: f32 = 20.0;

/// Vertical padding between the label background and its text.
pub const LABEL_PADDING: i32 = 10;

/// Color of the label text drawn over the background bar.
pub const LABEL_TEXT_COLOR: [u8; 3] = [255, 255, 255];

/// Fallback box color for detection types without an entry in the color table.
pub const DEFAULT_BOX_COLOR: [u8; 3] = [255, 255, 0];

/// Approximate glyph advance, relative to the font scale, used to size the
/// label background when no font is available.
pub const GLYPH_WIDTH_ESTIMATE: f32 = 0.55;

/// The number of values representing bounding box coordinates in YOLO format.
///
/// YOLO format uses 4 values: [center_x, center_y, width, height]
/// This constant defines the offset where class probability data begins
/// in the model output tensor.
pub const CXYWH_OFFSET: usize = 4;

/// Required square input side for the bundled YOLO layout models.
pub const REQUIRED_SIZE: usize = 1024;

/// Number of color channels in the input tensor.
pub const INPUT_CHANNELS: usize = 3;

/// Batch size for model inference.
pub const BATCH_SIZE: usize = 1;

/// Padding value for the part of the input tensor not covered by the image
/// (144/255, a neutral gray).
pub const BACKGROUND_FILL_VALUE: f32 = 144.0 / 255.0;

/// Class probability below which raw model predictions are discarded before
/// overlap merging. Kept under [`CONFIDENCE_THRESHOLD`] so the response
/// filter stays the one that decides what is returned.
pub const PROBA_THRESHOLD: f32 = 0.05;

/// Overlap ratio above which two predictions are merged into one box.
pub const NMS_IOU_THRESHOLD: f32 = 0.45;

/// Default ONNX Runtime intra-op thread count.
pub const INTRA_THREADS: usize = 4;

/// Default request body limit for uploads, in MiB.
pub const MAX_UPLOAD_MB: usize = 64;

/// Font locations probed when no font is configured.
pub const FONT_CANDIDATES: &[&str] = &[
    "fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];
