//! Text rendering utilities

use crate::Align;

/// Context for rendering text
pub struct TextRenderContext {
    /// PDF font resource name (e.g., "F1")
    pub font_name: String,
    /// Font size in points
    pub font_size: f32,
    /// Text width in points (for alignment)
    pub text_width: f64,
}

/// Generate PDF operators for black text
///
/// `x` is the alignment anchor: the left edge, centre, or right edge of the
/// run depending on `align`. `y` is the baseline, both in PDF points from
/// the bottom-left corner.
pub fn generate_text_operators(
    text_hex: &str,
    x: f64,
    y: f64,
    align: Align,
    ctx: &TextRenderContext,
) -> Vec<u8> {
    let final_x = match align {
        Align::Left => x,
        Align::Center => x - ctx.text_width / 2.0,
        Align::Right => x - ctx.text_width,
    };

    let mut ops = String::new();
    ops.push_str("BT\n0 0 0 rg\n");
    ops.push_str(&format!("/{} {} Tf\n", ctx.font_name, ctx.font_size));
    ops.push_str(&format!("{final_x} {y} Td\n"));
    ops.push_str(&format!("{text_hex} Tj\n"));
    ops.push_str("ET\n");

    ops.into_bytes()
}

/// Operators stroking a black rectangle (PDF bottom-origin points)
pub fn generate_rect_operators(x: f64, y: f64, width: f64, height: f64, line_width: f64) -> Vec<u8> {
    format!("q\n0 0 0 RG\n{line_width} w\n{x} {y} {width} {height} re\nS\nQ\n").into_bytes()
}
