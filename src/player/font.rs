//! The text back-end seam. The core tracks text content and rendering
//! properties; turning them into pixels and metrics is the host's job.

use super::bitmap::Bitmap;

#[derive(Clone, Debug, PartialEq)]
pub struct TextRenderSpec {
    pub font_name: String,
    pub font_size: u16,
    pub styles: Vec<String>,
    pub alignment: String,
    pub fore_color: (u8, u8, u8),
    pub back_color: (u8, u8, u8),
    pub word_wrap: bool,
    pub anti_alias: bool,
    pub fixed_line_space: u16,
    pub width: i32,
}

impl Default for TextRenderSpec {
    fn default() -> TextRenderSpec {
        TextRenderSpec {
            font_name: "System".to_string(),
            font_size: 12,
            styles: vec![],
            alignment: "left".to_string(),
            fore_color: (0, 0, 0),
            back_color: (255, 255, 255),
            word_wrap: true,
            anti_alias: false,
            fixed_line_space: 0,
            width: 0,
        }
    }
}

pub trait TextRenderer {
    /// Rasterize `text` with `spec`. Unknown font names resolve to the
    /// renderer's default face.
    fn render(&mut self, text: &str, spec: &TextRenderSpec) -> Bitmap;

    /// Width in pixels of a single line (no wrapping).
    fn measure_line(&mut self, line: &str, spec: &TextRenderSpec) -> i32;

    fn line_height(&mut self, spec: &TextRenderSpec) -> i32;
}

/// Fixed-advance stand-in used when the host wires no renderer. Keeps the
/// geometry queries deterministic, which the tests rely on.
pub struct NullTextRenderer;

const GLYPH_WIDTH: i32 = 7;

impl TextRenderer for NullTextRenderer {
    fn render(&mut self, text: &str, spec: &TextRenderSpec) -> Bitmap {
        let lines: Vec<&str> = text.split('\r').collect();
        let width = lines
            .iter()
            .map(|line| line.chars().count() as i32 * GLYPH_WIDTH)
            .max()
            .unwrap_or(0)
            .max(spec.width);
        let height = lines.len() as i32 * self.line_height(spec);
        Bitmap::new(width.max(1), height.max(1), 32)
    }

    fn measure_line(&mut self, line: &str, spec: &TextRenderSpec) -> i32 {
        let _ = spec;
        line.chars().count() as i32 * GLYPH_WIDTH
    }

    fn line_height(&mut self, spec: &TextRenderSpec) -> i32 {
        if spec.fixed_line_space > 0 {
            spec.fixed_line_space as i32
        } else {
            spec.font_size as i32 + 3
        }
    }
}
