use crate::error::InvalidValue;

/// Straight-alpha RGBA color, each channel nominally in `[0, 1]`.
///
/// Fed verbatim to the `uColor` uniform (or baked into legacy fragment
/// sources), so no premultiplication or clamping is applied.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const RED: Self = Self::new(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Self = Self::new(0.0, 1.0, 0.0, 1.0);
    pub const YELLOW: Self = Self::new(1.0, 1.0, 0.0, 1.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a color, rejecting NaN or infinite channels.
    pub fn try_new(r: f32, g: f32, b: f32, a: f32) -> Result<Self, InvalidValue> {
        Ok(Self {
            r: InvalidValue::check_finite("color.r", r)?,
            g: InvalidValue::check_finite("color.g", g)?,
            b: InvalidValue::check_finite("color.b", b)?,
            a: InvalidValue::check_finite("color.a", a)?,
        })
    }

    /// Creates a color from straight sRGB bytes (`0`–`255`).
    #[inline]
    pub fn from_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a as f32 / 255.0)
    }

    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[f32; 4]> for Rgba {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}
