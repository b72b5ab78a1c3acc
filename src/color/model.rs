use crate::foundation::core::Rgba;

/// 8-bit RGB triple. Derived forms (hex, CSS) are computed on demand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ColorRgb {
    #[serde(rename = "R")]
    pub r: u8,
    #[serde(rename = "G")]
    pub g: u8,
    #[serde(rename = "B")]
    pub b: u8,
}

/// Fallback color used whenever no better color is known.
pub const NEUTRAL_GRAY: ColorRgb = ColorRgb::new(150, 150, 150);

/// Channel deltas for the five frame-gradient tints (light, mid, dark, mid, deep-dark).
pub const GRADIENT_TINT_DELTAS: [i16; 5] = [80, 0, -80, 0, -120];

impl Default for ColorRgb {
    fn default() -> Self {
        NEUTRAL_GRAY
    }
}

impl ColorRgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Add `delta` to every channel, clamping to `0..=255`.
    pub fn adjust(self, delta: i16) -> Self {
        let f = |c: u8| (i32::from(c) + i32::from(delta)).clamp(0, 255) as u8;
        Self::new(f(self.r), f(self.g), f(self.b))
    }

    /// `#RRGGBB`, uppercase.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Parse `RRGGBB` or `#RRGGBB` (any case). Malformed input yields [`NEUTRAL_GRAY`].
    pub fn from_hex(hex: &str) -> Self {
        Self::parse_hex(hex).unwrap_or(NEUTRAL_GRAY)
    }

    /// Strict variant of [`ColorRgb::from_hex`].
    pub fn parse_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let n = u32::from_str_radix(digits, 16).ok()?;
        Some(Self::new(
            ((n >> 16) & 0xFF) as u8,
            ((n >> 8) & 0xFF) as u8,
            (n & 0xFF) as u8,
        ))
    }

    pub fn to_css(self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }

    pub fn to_css_alpha(self, alpha: f32) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
    }

    /// Perceptual luminance in `0..=1`.
    pub fn luminance(self) -> f64 {
        (0.299 * f64::from(self.r) + 0.587 * f64::from(self.g) + 0.114 * f64::from(self.b))
            / 255.0
    }

    /// Embed accent integer `(R << 16) | (G << 8) | B`.
    pub fn accent_int(self) -> u32 {
        (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }

    pub fn with_alpha(self, a: f32) -> Rgba {
        Rgba::new(self.r, self.g, self.b, a)
    }

    /// The five gradient tints, light to deep-dark.
    pub fn gradient_tints(self) -> [ColorRgb; 5] {
        GRADIENT_TINT_DELTAS.map(|d| self.adjust(d))
    }

    /// Human-readable `RGB(r, g, b) • #HEX` used in status lines.
    pub fn describe(self) -> String {
        format!("RGB({}, {}, {}) • {}", self.r, self.g, self.b, self.to_hex())
    }
}

impl From<[u8; 3]> for ColorRgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl std::fmt::Display for ColorRgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Darkened, legibility-floored backdrop for text bands.
///
/// Lighter base colors are darkened more (`(1 - L) * darken_factor` is applied to every
/// channel) and the opacity is mapped into `0.35..=1.0`.
pub fn translucent_background(color: ColorRgb, opacity: f32, darken_factor: f64) -> Rgba {
    let factor = (1.0 - color.luminance()) * darken_factor;
    let darken = |c: u8| (f64::from(c) * (1.0 - factor)).clamp(0.0, 255.0).floor() as u8;
    let opacity = if opacity.is_finite() { opacity } else { 0.0 };
    let effective = (opacity * 1.15).clamp(0.35, 1.0);
    Rgba::new(darken(color.r), darken(color.g), darken(color.b), effective)
}

#[cfg(test)]
#[path = "../../tests/unit/color/model.rs"]
mod tests;
