use eframe::egui::Color32;

pub const INFO_HEX: &str = "#1976d2";
pub const SUCCESS_HEX: &str = "#388e3c";
pub const ERROR_HEX: &str = "#d32f2f";
pub const ACCENT_HEX: &str = "#a159e1";

pub trait ColorExt {
    fn from_hex(hex: &str) -> Option<Self>
    where
        Self: Sized;

    fn from_hex_or(hex: &str, fallback: Self) -> Self
    where
        Self: Sized,
    {
        Self::from_hex(hex).unwrap_or(fallback)
    }
}

impl ColorExt for Color32 {
    fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

        Some(Color32::from_rgb(r, g, b))
    }
}
