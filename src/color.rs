use crate::error::{Result, StarchartError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Colour with a fixed hue and a separately adjustable alpha.
///
/// Stars keep their channels for life; alpha is recomputed every frame for
/// twinkle and glow falloff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0.0);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 1.0);

    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Same hue, new alpha (clamped to 0..=1).
    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Multiply the current alpha.
    pub fn fade(self, factor: f32) -> Self {
        self.with_alpha(self.a * factor)
    }

    pub fn channels(self) -> (f32, f32, f32) {
        (self.r as f32, self.g as f32, self.b as f32)
    }

    /// Linear blend of channels and alpha, `t` in 0..=1.
    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgba {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: self.a + (other.a - self.a) * t,
        }
    }

    pub fn parse_hex(hex: &str) -> Result<Rgba> {
        let invalid = || StarchartError::InvalidColor {
            value: hex.to_string(),
        };
        let digits = hex.trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(invalid());
        }

        let r = u8::from_str_radix(&digits[0..2], 16).map_err(|_| invalid())?;
        let g = u8::from_str_radix(&digits[2..4], 16).map_err(|_| invalid())?;
        let b = u8::from_str_radix(&digits[4..6], 16).map_err(|_| invalid())?;

        Ok(Rgba::rgb(r, g, b))
    }

    pub fn to_hex(self) -> String {
        format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

// Config files carry colours as "RRGGBB" strings.
impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Rgba::parse_hex(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_with_and_without_hash() {
        assert_eq!(Rgba::parse_hex("001428").unwrap(), Rgba::rgb(0, 20, 40));
        assert_eq!(Rgba::parse_hex("#1a1b26").unwrap(), Rgba::rgb(26, 27, 38));
    }

    #[test]
    fn test_parse_hex_rejects_bad_input() {
        assert!(Rgba::parse_hex("12345").is_err());
        assert!(Rgba::parse_hex("zz0000").is_err());
        assert!(Rgba::parse_hex("ééé").is_err());
    }

    #[test]
    fn test_with_alpha_keeps_hue() {
        let c = Rgba::new(14, 165, 233, 0.8).with_alpha(1.7);
        assert_eq!((c.r, c.g, c.b), (14, 165, 233));
        assert_eq!(c.a, 1.0);
        assert_eq!(c.fade(0.25).a, 0.25);
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = Rgba::new(0, 20, 40, 0.1);
        let b = Rgba::new(40, 40, 20, 0.1);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5).r, 20);
    }
}
