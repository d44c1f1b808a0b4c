use ratatui::style::Color;

use murmur_core::settings::Settings;

/// The two render palettes behind the theme toggle.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub text: Color,
    pub text_secondary: Color,
    pub primary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub border: Color,
    pub surface: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            text: Color::Rgb(0xF9, 0xFA, 0xFB),
            text_secondary: Color::Rgb(0x9C, 0xA3, 0xAF),
            primary: Color::Rgb(0x63, 0x66, 0xF1),
            success: Color::Rgb(0x10, 0xB9, 0x81),
            warning: Color::Rgb(0xF5, 0x9E, 0x0B),
            error: Color::Rgb(0xEF, 0x44, 0x44),
            border: Color::Rgb(0x37, 0x41, 0x51),
            surface: Color::Rgb(0x1F, 0x29, 0x37),
        }
    }

    pub fn light() -> Self {
        Self {
            text: Color::Rgb(0x11, 0x18, 0x27),
            text_secondary: Color::Rgb(0x6B, 0x72, 0x80),
            primary: Color::Rgb(0x63, 0x66, 0xF1),
            success: Color::Rgb(0x05, 0x96, 0x69),
            warning: Color::Rgb(0xD9, 0x77, 0x06),
            error: Color::Rgb(0xDC, 0x26, 0x26),
            border: Color::Rgb(0xD1, 0xD5, 0xDB),
            surface: Color::Rgb(0xF3, 0xF4, 0xF6),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        if settings.dark_theme { Self::dark() } else { Self::light() }
    }
}

/// Tag swatches arrive as `#RRGGBB` strings from the palette.
pub fn hex_color(hex: &str) -> Color {
    let raw = hex.trim_start_matches('#');
    if raw.len() != 6 || !raw.is_ascii() {
        return Color::Gray;
    }
    match (
        u8::from_str_radix(&raw[0..2], 16),
        u8::from_str_radix(&raw[2..4], 16),
        u8::from_str_radix(&raw[4..6], 16),
    ) {
        (Ok(r), Ok(g), Ok(b)) => Color::Rgb(r, g, b),
        _ => Color::Gray,
    }
}

#[cfg(test)]
mod tests {
    use ratatui::style::Color;

    use super::hex_color;

    #[test]
    fn parses_palette_swatches() {
        assert_eq!(hex_color("#6366F1"), Color::Rgb(0x63, 0x66, 0xF1));
        assert_eq!(hex_color("#10b981"), Color::Rgb(0x10, 0xB9, 0x81));
    }

    #[test]
    fn malformed_values_fall_back() {
        assert_eq!(hex_color("red"), Color::Gray);
        assert_eq!(hex_color("#12"), Color::Gray);
    }
}
