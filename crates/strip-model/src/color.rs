//! 8-bit RGBA colors with the subset of CSS color syntax the catalog uses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// A straight (non-premultiplied) 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Color with a CSS-style alpha in `[0.0, 1.0]`.
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    /// Linear interpolation in sRGB space, matching how browsers paint
    /// gradients without an explicit interpolation space.
    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgba {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Parse a CSS color: `white`, `black`, `transparent`, `#rgb`, `#rrggbb`,
    /// `rgb(r, g, b)` or `rgba(r, g, b, a)`.
    pub fn parse(input: &str) -> Result<Self, ModelError> {
        let s = input.trim();
        let invalid = |reason: &str| ModelError::InvalidColor {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        match s.to_ascii_lowercase().as_str() {
            "white" => return Ok(Self::WHITE),
            "black" => return Ok(Self::BLACK),
            "transparent" => return Ok(Self::TRANSPARENT),
            _ => {}
        }

        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| invalid("expected #rgb or #rrggbb"));
        }

        let lower = s.to_ascii_lowercase();
        let (args, has_alpha) = if let Some(rest) = lower.strip_prefix("rgba(") {
            (rest, true)
        } else if let Some(rest) = lower.strip_prefix("rgb(") {
            (rest, false)
        } else {
            return Err(invalid("unsupported color syntax"));
        };
        let args = args
            .strip_suffix(')')
            .ok_or_else(|| invalid("missing closing parenthesis"))?;

        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        let expected = if has_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return Err(invalid(&format!("expected {expected} components")));
        }

        let channel = |p: &str| {
            p.parse::<u8>()
                .map_err(|_| invalid(&format!("channel `{p}` is not in 0..=255")))
        };
        let mut color = Rgba::rgb(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?);
        if has_alpha {
            let alpha: f32 = parts[3]
                .parse()
                .map_err(|_| invalid(&format!("alpha `{}` is not a number", parts[3])))?;
            color = color.with_alpha(alpha);
        }
        Ok(color)
    }

    /// CSS representation that [`Rgba::parse`] accepts.
    pub fn to_css(self) -> String {
        if self.a == 255 {
            format!("rgb({}, {}, {})", self.r, self.g, self.b)
        } else {
            let alpha = self.a as f32 / 255.0;
            format!("rgba({}, {}, {}, {:.3})", self.r, self.g, self.b, alpha)
        }
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    let nibble = |c: u8| (c as char).to_digit(16).map(|d| d as u8);
    let bytes = hex.as_bytes();
    match bytes.len() {
        3 => {
            let r = nibble(bytes[0])?;
            let g = nibble(bytes[1])?;
            let b = nibble(bytes[2])?;
            Some(Rgba::rgb(r * 17, g * 17, b * 17))
        }
        6 => {
            let byte = |i: usize| Some(nibble(bytes[i])? * 16 + nibble(bytes[i + 1])?);
            Some(Rgba::rgb(byte(0)?, byte(2)?, byte(4)?))
        }
        _ => None,
    }
}

impl FromStr for Rgba {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rgba::parse(s)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_and_rgb() {
        assert_eq!(Rgba::parse("white").unwrap(), Rgba::WHITE);
        assert_eq!(
            Rgba::parse("rgb(251, 207, 232)").unwrap(),
            Rgba::rgb(251, 207, 232)
        );
        assert_eq!(Rgba::parse("  RGB(1,2,3) ").unwrap(), Rgba::rgb(1, 2, 3));
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(Rgba::parse("#000").unwrap(), Rgba::BLACK);
        assert_eq!(Rgba::parse("#4c1d95").unwrap(), Rgba::rgb(0x4c, 0x1d, 0x95));
        assert!(Rgba::parse("#12345").is_err());
    }

    #[test]
    fn test_parse_rgba_alpha() {
        let shadow = Rgba::parse("rgba(0, 0, 0, 0.3)").unwrap();
        assert_eq!(shadow.a, 77);
    }

    #[test]
    fn test_parse_rejects_out_of_range_channel() {
        let err = Rgba::parse("rgb(256, 0, 0)").unwrap_err();
        assert!(matches!(err, ModelError::InvalidColor { .. }));
    }

    #[test]
    fn test_lerp_endpoints_and_midpoint() {
        let a = Rgba::rgb(0, 0, 0);
        let b = Rgba::rgb(200, 100, 50);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Rgba::rgb(100, 50, 25));
    }

    #[test]
    fn test_css_output_parses_back() {
        let color = Rgba::rgb(59, 130, 246);
        assert_eq!(color.to_css(), "rgb(59, 130, 246)");
        assert_eq!(Rgba::parse(&color.to_css()).unwrap(), color);
    }
}
