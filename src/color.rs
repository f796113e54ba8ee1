//! 24-bit RGB colour used for vertex tinting.
//!
//! Alpha is tracked separately as a float so that it can be premultiplied into the
//! colour channels (or not) depending on the owning vertex data.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from `0xRRGGBB`. The top byte is ignored.
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as u8,
            g: ((hex >> 8) & 0xFF) as u8,
            b: (hex & 0xFF) as u8,
        }
    }

    pub const fn to_hex(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Channels as floats in `0.0..=1.0`.
    pub fn to_f32(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }

    pub const WHITE: Color = Color::from_hex(0xffffff);
    pub const SILVER: Color = Color::from_hex(0xc0c0c0);
    pub const GRAY: Color = Color::from_hex(0x808080);
    pub const BLACK: Color = Color::from_hex(0x000000);
    pub const RED: Color = Color::from_hex(0xff0000);
    pub const MAROON: Color = Color::from_hex(0x800000);
    pub const YELLOW: Color = Color::from_hex(0xffff00);
    pub const OLIVE: Color = Color::from_hex(0x808000);
    pub const LIME: Color = Color::from_hex(0x00ff00);
    pub const GREEN: Color = Color::from_hex(0x008000);
    pub const AQUA: Color = Color::from_hex(0x00ffff);
    pub const TEAL: Color = Color::from_hex(0x008080);
    pub const BLUE: Color = Color::from_hex(0x0000ff);
    pub const NAVY: Color = Color::from_hex(0x000080);
    pub const FUCHSIA: Color = Color::from_hex(0xff00ff);
    pub const PURPLE: Color = Color::from_hex(0x800080);
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<u32> for Color {
    fn from(hex: u32) -> Self {
        Self::from_hex(hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let c = Color::from_hex(0x12ab34);
        assert_eq!(c, Color::rgb(0x12, 0xab, 0x34));
        assert_eq!(c.to_hex(), 0x12ab34);
        assert_eq!(Color::from_hex(0xff00ff00), Color::LIME);
    }

    #[test]
    fn test_to_f32() {
        assert_eq!(Color::WHITE.to_f32(), [1.0, 1.0, 1.0]);
        assert_eq!(Color::BLACK.to_f32(), [0.0, 0.0, 0.0]);
    }
}
