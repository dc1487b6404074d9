//! Colors and vector drawing operators

/// RGB color with components in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
        }
    }

    /// From 8-bit components
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }

    /// Gray level, 0.0 black to 1.0 white
    pub fn gray(level: f32) -> Self {
        Self::rgb(level, level, level)
    }

    pub(crate) fn fill_operator(&self) -> String {
        format!("{} {} {} rg\n", fmt(self.r), fmt(self.g), fmt(self.b))
    }

    pub(crate) fn stroke_operator(&self) -> String {
        format!("{} {} {} RG\n", fmt(self.r), fmt(self.g), fmt(self.b))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Compact number formatting for content streams (`0.5`, `1`, `0.333`)
fn fmt(value: f32) -> String {
    let text = format!("{value:.3}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Stroke settings for lines and rectangle borders
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub width: f64,
    pub color: Color,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            width: 0.5,
            color: Color::black(),
        }
    }
}

/// Rectangle paint: optional fill and optional border
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectStyle {
    pub fill: Option<Color>,
    pub stroke: Option<LineStyle>,
}

impl RectStyle {
    pub fn filled(color: Color) -> Self {
        Self {
            fill: Some(color),
            stroke: None,
        }
    }

    pub fn outlined(style: LineStyle) -> Self {
        Self {
            fill: None,
            stroke: Some(style),
        }
    }
}

/// Operators for a straight line between two points (PDF coordinates)
pub fn generate_line_operators(x1: f64, y1: f64, x2: f64, y2: f64, style: &LineStyle) -> Vec<u8> {
    let mut ops = String::from("q\n");
    ops.push_str(&style.color.stroke_operator());
    ops.push_str(&format!("{:.2} w\n", style.width));
    ops.push_str(&format!("{x1:.2} {y1:.2} m\n{x2:.2} {y2:.2} l\nS\nQ\n"));
    ops.into_bytes()
}

/// Operators for a rectangle with its lower-left corner at `x`,`y`
/// (PDF coordinates). Empty when the style paints nothing.
pub fn generate_rect_operators(x: f64, y: f64, width: f64, height: f64, style: &RectStyle) -> Vec<u8> {
    let paint = match (style.fill.is_some(), style.stroke.is_some()) {
        (true, true) => "B",
        (true, false) => "f",
        (false, true) => "S",
        (false, false) => return Vec::new(),
    };

    let mut ops = String::from("q\n");
    if let Some(fill) = style.fill {
        ops.push_str(&fill.fill_operator());
    }
    if let Some(stroke) = style.stroke {
        ops.push_str(&stroke.color.stroke_operator());
        ops.push_str(&format!("{:.2} w\n", stroke.width));
    }
    ops.push_str(&format!("{x:.2} {y:.2} {width:.2} {height:.2} re\n{paint}\nQ\n"));
    ops.into_bytes()
}
