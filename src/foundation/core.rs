use crate::foundation::error::{CardError, CardResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Logical card width in layout units.
pub const CARD_W: f64 = 290.0;
/// Logical card height in layout units.
pub const CARD_H: f64 = 416.0;

/// Largest accepted scale. Every plan surface is a full-card RGBA8 buffer, so this
/// bounds memory per render (about 31 MB per surface at 8x).
pub const MAX_SCALE: f64 = 8.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

/// Uniform logical-to-device scale applied before drawing a card.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, serde::Serialize)]
pub struct RenderScale(f64);

impl RenderScale {
    pub const ONE: Self = Self(1.0);

    pub fn new(scale: f64) -> CardResult<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(CardError::validation("render scale must be finite and > 0"));
        }
        if scale > MAX_SCALE {
            return Err(CardError::validation(format!(
                "render scale must be <= {MAX_SCALE}"
            )));
        }
        Ok(Self(scale))
    }

    pub fn get(self) -> f64 {
        self.0
    }

    /// Output surface size for the fixed card at this scale.
    pub fn canvas(self) -> Canvas {
        Canvas {
            width: (CARD_W * self.0).round().max(1.0) as u32,
            height: (CARD_H * self.0).round().max(1.0) as u32,
        }
    }

    pub fn to_affine(self) -> Affine {
        Affine::scale(self.0)
    }
}

impl Default for RenderScale {
    fn default() -> Self {
        Self::ONE
    }
}

impl std::fmt::Display for RenderScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> serde::Deserialize<'de> for RenderScale {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8Premul {
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }
}

/// Straight (non-premultiplied) RGBA color with a float alpha, as used by draw ops.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn white(a: f32) -> Self {
        Self::new(255, 255, 255, a)
    }

    pub const fn black(a: f32) -> Self {
        Self::new(0, 0, 0, a)
    }

    pub fn alpha_u8(self) -> u8 {
        (self.a.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    pub fn to_premul(self) -> Rgba8Premul {
        Rgba8Premul::from_straight_rgba(self.r, self.g, self.b, self.alpha_u8())
    }
}
