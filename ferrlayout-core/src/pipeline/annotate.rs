use std::{
    io::Cursor,
    path::{Path, PathBuf},
};

use ab_glyph::{FontVec, PxScale};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use glam::Vec2;
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size},
    rect::Rect,
};
use snafu::ResultExt;
use tracing::*;

use crate::{
    analysis::labels::box_color,
    consts::*,
    error::{EncodeSnafu, FontReadSnafu, FontSnafu, LayoutError},
    layout::element::Detection,
};

/// Draws detections onto images for human review.
pub struct Annotator {
    font: Option<FontVec>,
    font_scale: PxScale,
}

impl Annotator {
    /// An annotator rendering label text with `font`. Without a font only
    /// the boxes and label backgrounds are drawn.
    pub fn new(font: Option<FontVec>) -> Self {
        Self {
            font,
            font_scale: PxScale::from(LABEL_FONT_SCALE),
        }
    }

    pub fn from_font_file(path: &Path) -> Result<Self, LayoutError> {
        let bytes = std::fs::read(path).context(FontReadSnafu {
            path: path.to_string_lossy(),
        })?;
        let font = FontVec::try_from_vec(bytes).context(FontSnafu)?;
        info!("Loaded label font {}", path.display());
        Ok(Self::new(Some(font)))
    }

    /// Uses `configured` when given, otherwise the first readable font of
    /// [`FONT_CANDIDATES`].
    pub fn discover(configured: Option<&Path>) -> Result<Self, LayoutError> {
        if let Some(path) = configured {
            return Self::from_font_file(path);
        }

        for candidate in FONT_CANDIDATES.iter().map(PathBuf::from) {
            if !candidate.is_file() {
                continue;
            }
            match Self::from_font_file(&candidate) {
                Ok(annotator) => return Ok(annotator),
                Err(err) => debug!("skipping font {}: {}", candidate.display(), err),
            }
        }

        warn!("No label font found, annotated images will carry boxes without label text");
        Ok(Self::new(None))
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Pixel size of `text` as it will be drawn.
    fn measure(&self, text: &str) -> (u32, u32) {
        match &self.font {
            Some(font) => text_size(self.font_scale, font, text),
            None => {
                let glyph = self.font_scale.x * GLYPH_WIDTH_ESTIMATE;
                (
                    (text.chars().count() as f32 * glyph).ceil() as u32,
                    self.font_scale.y.ceil() as u32,
                )
            }
        }
    }

    /// Returns a copy of `image` with every detection drawn in list order,
    /// so later entries paint over earlier ones.
    pub fn draw(&self, image: &RgbImage, detections: &[Detection]) -> RgbImage {
        let mut canvas = image.clone();
        let bounds = Vec2::new(canvas.width() as f32, canvas.height() as f32);

        for detection in detections {
            let (x1, y1, x2, y2) = detection.bbox().clamp(Vec2::ZERO, bounds).rounded();
            let (width, height) = (x2 - x1, y2 - y1);
            if width <= 0 || height <= 0 {
                debug!("skipping degenerate {} box at ({x1}, {y1})", detection.kind());
                continue;
            }

            let color = Rgb(box_color(detection.kind()));

            // stroke centered on the box edge
            for offset in -(BOX_STROKE_WIDTH / 2)..=(BOX_STROKE_WIDTH - 1) / 2 {
                let (w, h) = (width + 2 * offset, height + 2 * offset);
                if w <= 0 || h <= 0 {
                    continue;
                }
                let rect = Rect::at(x1 - offset, y1 - offset).of_size(w as u32, h as u32);
                draw_hollow_rect_mut(&mut canvas, rect, color);
            }

            let caption = detection.caption();
            let (text_width, text_height) = self.measure(&caption);
            let background =
                Rect::at(x1, y1 - text_height as i32 - LABEL_PADDING).of_size(
                    text_width.max(1),
                    text_height + LABEL_PADDING as u32,
                );
            draw_filled_rect_mut(&mut canvas, background, color);

            if let Some(font) = &self.font {
                draw_text_mut(
                    &mut canvas,
                    Rgb(LABEL_TEXT_COLOR),
                    x1,
                    y1 - text_height as i32 - LABEL_PADDING / 2,
                    self.font_scale,
                    font,
                    &caption,
                );
            }
        }

        canvas
    }

    /// Draws the detections and returns the result as base64 encoded PNG.
    pub fn annotate(&self, image: &RgbImage, detections: &[Detection]) -> Result<String, LayoutError> {
        encode_png_base64(&self.draw(image, detections))
    }
}

pub fn encode_png_base64(image: &RgbImage) -> Result<String, LayoutError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .context(EncodeSnafu)?;
    Ok(STANDARD.encode(buffer))
}
