/*!
 * Rendering of translated text onto region canvases.
 */

use std::path::Path;

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use log::debug;

use crate::app_config::{FontConfig, FontsConfig};
use crate::errors::AppError;
use crate::language_utils::Script;

/// Draws wrapped text onto a canvas the size of a region
pub trait TextPainter: Send + Sync {
    /// Font size in pixels used for a script
    fn font_size(&self, script: Script) -> u32;

    /// Draw `text` (lines separated by `\n`) from the top-left corner
    fn paint(&self, canvas: &mut RgbImage, text: &str, script: Script);
}

struct LoadedFont {
    font: FontVec,
    size: u32,
}

impl LoadedFont {
    fn load(config: &FontConfig) -> Result<Self, AppError> {
        let path = Path::new(&config.path);
        let data = std::fs::read(path).map_err(|e| {
            AppError::Startup(format!("Cannot read font {}: {}", path.display(), e))
        })?;
        let font = FontVec::try_from_vec(data).map_err(|e| {
            AppError::Startup(format!("Invalid font {}: {}", path.display(), e))
        })?;
        Ok(Self { font, size: config.size })
    }

    fn scale(&self) -> PxScale {
        PxScale::from(self.size as f32)
    }

    fn line_height(&self) -> i32 {
        let scaled = self.font.as_scaled(self.scale());
        (scaled.ascent() - scaled.descent() + scaled.line_gap()).ceil() as i32
    }
}

/// Painter backed by one OpenType font per script
pub struct GlyphPainter {
    fullwidth: LoadedFont,
    latin: LoadedFont,
}

impl GlyphPainter {
    /// Load both fonts. A missing or unreadable font is a startup error.
    pub fn load(config: &FontsConfig) -> Result<Self, AppError> {
        Ok(Self {
            fullwidth: LoadedFont::load(&config.fullwidth)?,
            latin: LoadedFont::load(&config.latin)?,
        })
    }

    fn font(&self, script: Script) -> &LoadedFont {
        match script {
            Script::Fullwidth => &self.fullwidth,
            Script::Latin => &self.latin,
        }
    }
}

impl TextPainter for GlyphPainter {
    fn font_size(&self, script: Script) -> u32 {
        self.font(script).size
    }

    fn paint(&self, canvas: &mut RgbImage, text: &str, script: Script) {
        let face = self.font(script);
        let line_height = face.line_height();
        let mut y = 0;

        for line in text.lines() {
            draw_text_mut(canvas, Rgb([0, 0, 0]), 0, y, face.scale(), &face.font, line);
            y += line_height;
        }

        if y > canvas.height() as i32 {
            debug!(
                "Text overflows region by {}px ({} lines)",
                y - canvas.height() as i32,
                text.lines().count()
            );
        }
    }
}
