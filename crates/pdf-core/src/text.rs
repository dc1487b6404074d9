//! Text rendering utilities

use crate::graphics::Color;
use crate::Align;

/// Context for rendering one run of text
pub struct TextRenderContext {
    /// PDF font resource name (e.g., "F1")
    pub font_name: String,
    /// Font size in points
    pub font_size: f32,
    /// Text width in points (for alignment)
    pub text_width: f64,
    /// Fill color
    pub color: Color,
    /// Stroke glyph outlines to embolden a face that has no bold variant
    pub synthetic_bold: bool,
}

/// X offset that aligns text of `text_width` at an anchor point
pub fn align_offset(text_width: f64, align: Align) -> f64 {
    match align {
        Align::Left => 0.0,
        Align::Center => -text_width / 2.0,
        Align::Right => -text_width,
    }
}

/// Generate the BT/ET block showing `text_hex` with its baseline at `x`,`y`
/// (PDF coordinates, from bottom-left)
pub fn generate_text_operators(
    text_hex: &str,
    x: f64,
    y: f64,
    align: Align,
    ctx: &TextRenderContext,
) -> Vec<u8> {
    let x = x + align_offset(ctx.text_width, align);
    let mut ops = String::from("BT\n");

    ops.push_str(&ctx.color.fill_operator());
    if ctx.synthetic_bold {
        ops.push_str(&ctx.color.stroke_operator());
        ops.push_str(&format!("2 Tr {:.3} w\n", ctx.font_size / 30.0));
    }
    ops.push_str(&format!("/{} {} Tf\n", ctx.font_name, ctx.font_size));
    ops.push_str(&format!("{x:.2} {y:.2} Td\n"));
    ops.push_str(&format!("{text_hex} Tj\n"));
    ops.push_str("ET\n");

    ops.into_bytes()
}
