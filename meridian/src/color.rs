use serde::{Deserialize, Serialize};

/// RGBA color.
///
/// Serialized as a hex string (`#RRGGBBAA`), so styles can be written by hand in configuration files.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from_hex(&value).ok_or_else(|| format!("invalid color: {value}"))
    }
}

impl From<Color> for String {
    fn from(val: Color) -> Self {
        val.to_hex()
    }
}

impl Color {
    /// Transparent color: `#00000000`
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    /// Red color: `#FF0000FF`
    pub const RED: Color = Color::rgba(255, 0, 0, 255);
    /// Blue color: `#0000FFFF`
    pub const BLUE: Color = Color::rgba(0, 0, 255, 255);
    /// White color: `#FFFFFFFF`
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    /// Black color: `#000000FF`
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
    /// Ocean blue used for the map background: `#006994FF`
    pub const OCEAN: Color = Color::rgba(0, 105, 148, 255);
    /// Dark green used for land polygons: `#006400FF`
    pub const LAND: Color = Color::rgba(0, 100, 0, 255);
    /// Orange: `#FFA500FF`
    pub const ORANGE: Color = Color::rgba(255, 165, 0, 255);

    /// Constructs color from its RGBA channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Constructs an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Converts the color into u8 array (RGBA).
    pub fn to_u8_array(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Converts the color into HEX8 string: `#RRGGBBAA`.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }

    /// CSS color string without alpha: `#RRGGBB`.
    pub fn to_hex_rgb(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Parses a color from the hex string. Hex string can be either HEX6 (`#RRGGBB`) or HEX8 (`#RRGGBBAA`).
    pub fn try_from_hex(hex_string: &str) -> Option<Self> {
        if hex_string.len() != 7 && hex_string.len() != 9 || !hex_string.starts_with('#') {
            return None;
        }

        let r = u8::from_str_radix(hex_string.get(1..3)?, 16).ok()?;
        let g = u8::from_str_radix(hex_string.get(3..5)?, 16).ok()?;
        let b = u8::from_str_radix(hex_string.get(5..7)?, 16).ok()?;
        let a = if hex_string.len() == 9 {
            u8::from_str_radix(hex_string.get(7..9)?, 16).ok()?
        } else {
            255
        };

        Some(Self { r, g, b, a })
    }

    /// Returns a new color instance, copied from the base one but with the given alpha channel.
    pub fn with_alpha(&self, a: u8) -> Self {
        Self { a, ..*self }
    }

    /// Returns true if the color is fully transparent (`a == 0`).
    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Red component of the color in RGBA space.
    pub fn r(&self) -> u8 {
        self.r
    }

    /// Green component of the color in RGBA space.
    pub fn g(&self) -> u8 {
        self.g
    }

    /// Blue component of the color in RGBA space.
    pub fn b(&self) -> u8 {
        self.b
    }

    /// Opacity component of the color.
    pub fn a(&self) -> u8 {
        self.a
    }

    /// Opacity as a fraction in `[0, 1]`.
    pub fn opacity(&self) -> f64 {
        self.a as f64 / 255.0
    }

    /// Composes `fore` color over `self` (source-over alpha compositing).
    pub fn blend(&self, fore: Color) -> Color {
        let fore_a = fore.a as f32 / 255.0;
        let back_a = self.a as f32 / 255.0;
        let out_a = fore_a + back_a * (1.0 - fore_a);
        if out_a <= 0.0 {
            return Color::TRANSPARENT;
        }

        let channel = |back: u8, fore: u8| {
            let value =
                (fore as f32 * fore_a + back as f32 * back_a * (1.0 - fore_a)) / out_a;
            value.round().clamp(0.0, 255.0) as u8
        };

        Color {
            r: channel(self.r, fore.r),
            g: channel(self.g, fore.g),
            b: channel(self.b, fore.b),
            a: (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_serialization() {
        let hex = "#FF1000AA";
        let color = Color::try_from_hex(hex).expect("valid hex");
        assert_eq!(&color.to_hex(), hex);
        assert_eq!(Color::try_from_hex("#006994"), Some(Color::OCEAN));
        assert_eq!(Color::try_from_hex("006994"), None);
        assert_eq!(Color::try_from_hex("#00699G"), None);

        let json = serde_json::to_string(&Color::LAND).expect("serializes");
        assert_eq!(json, "\"#006400FF\"");
        let parsed: Color = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(parsed, Color::LAND);
        assert!(serde_json::from_str::<Color>("\"green\"").is_err());
    }

    #[test]
    fn blending() {
        assert_eq!(Color::WHITE.blend(Color::RED), Color::RED);
        assert_eq!(Color::WHITE.blend(Color::TRANSPARENT), Color::WHITE);
        assert_eq!(Color::TRANSPARENT.blend(Color::BLUE), Color::BLUE);

        let half = Color::WHITE.blend(Color::BLACK.with_alpha(128));
        assert!(half.r() > 120 && half.r() < 135);
        assert_eq!(half.a(), 255);
    }
}
