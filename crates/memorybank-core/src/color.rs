//! Serializable ink color.

use peniko::Color;
use serde::{Deserialize, Serialize};

/// RGBA8 color used for ink and raster pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InkColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl InkColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    pub const fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Same color with a different alpha.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    /// Format as `#rrggbb`, appending the alpha byte only when not opaque.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for InkColor {
    fn default() -> Self {
        Self::black()
    }
}

impl From<Color> for InkColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self::new(rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

impl From<InkColor> for Color {
    fn from(color: InkColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let red = InkColor::from_hex("#FF0000").unwrap();
        assert_eq!(red, InkColor::rgb(255, 0, 0));
        assert_eq!(red.to_hex(), "#ff0000");

        let translucent = InkColor::from_hex("0000ff4d").unwrap();
        assert_eq!(translucent.a, 0x4d);
        assert_eq!(translucent.to_hex(), "#0000ff4d");
    }

    #[test]
    fn test_invalid_hex() {
        assert!(InkColor::from_hex("#12").is_none());
        assert!(InkColor::from_hex("#gg0000").is_none());
        assert!(InkColor::from_hex("#ééé").is_none());
    }

    #[test]
    fn test_peniko_conversion() {
        let ink = InkColor::new(10, 20, 30, 40);
        let color: Color = ink.into();
        assert_eq!(InkColor::from(color), ink);
    }
}
