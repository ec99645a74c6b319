//! Display colours.

use std::fmt;

use rand::Rng;

/// A 24-bit RGB display colour, written on the wire as `"#RRGGBB"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u32);

impl Rgb {
    /// Sky blue, used until a pastel is assigned.
    pub const DEFAULT: Rgb = Rgb(0x39A9F9);

    /// Parses `"#RRGGBB"` (the `#` is optional). Returns `None` for
    /// anything else.
    pub fn parse(s: &str) -> Option<Rgb> {
        let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(hex, 16).ok().map(Rgb)
    }

    /// A random pastel: every channel in `0x30..0xE0`.
    pub fn pastel<R: Rng>(rng: &mut R) -> Rgb {
        let r: u32 = rng.random_range(0x30..0xE0);
        let g: u32 = rng.random_range(0x30..0xE0);
        let b: u32 = rng.random_range(0x30..0xE0);
        Rgb(r << 16 | g << 8 | b)
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06X}", self.0 & 0xFF_FFFF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_and_without_hash() {
        assert_eq!(Rgb::parse("#A0b0C0"), Some(Rgb(0xA0B0C0)));
        assert_eq!(Rgb::parse("112233"), Some(Rgb(0x112233)));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(Rgb::parse(""), None);
        assert_eq!(Rgb::parse("#12345"), None);
        assert_eq!(Rgb::parse("#12345G"), None);
        assert_eq!(Rgb::parse("#+12345"), None);
    }

    #[test]
    fn test_display_is_uppercase_padded() {
        assert_eq!(Rgb(0x0A0B0C).to_string(), "#0A0B0C");
    }

    #[test]
    fn test_pastel_channels_in_range() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let Rgb(c) = Rgb::pastel(&mut rng);
            for shift in [16, 8, 0] {
                let ch = (c >> shift) & 0xFF;
                assert!((0x30..0xE0).contains(&ch), "channel {ch:#x}");
            }
        }
    }
}
