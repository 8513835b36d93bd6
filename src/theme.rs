use serde::{Deserialize, Serialize};

/// Five-color UI palette, stored as `#rrggbb` strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub success: String,
    pub error: String,
}

pub const PRESET_NAMES: [&str; 6] = ["default", "ocean", "sunset", "forest", "purple", "rose"];

impl Default for Palette {
    fn default() -> Self {
        Self::preset("default")
    }
}

impl Palette {
    fn from_hex(colors: [&str; 5]) -> Self {
        let [primary, secondary, accent, success, error] = colors.map(String::from);
        Self {
            primary,
            secondary,
            accent,
            success,
            error,
        }
    }

    /// Named preset; unknown names give the default palette.
    pub fn preset(name: &str) -> Self {
        let colors = match name.trim().to_lowercase().as_str() {
            "ocean" => ["#0ea5e9", "#0284c7", "#06b6d4", "#10b981", "#ef4444"],
            "sunset" => ["#f97316", "#ea580c", "#fbbf24", "#84cc16", "#dc2626"],
            "forest" => ["#059669", "#047857", "#10b981", "#22c55e", "#ef4444"],
            "purple" => ["#8b5cf6", "#7c3aed", "#a855f7", "#22c55e", "#ef4444"],
            "rose" => ["#e11d48", "#be185d", "#f43f5e", "#10b981", "#dc2626"],
            _ => ["#667eea", "#764ba2", "#f093fb", "#4ade80", "#f87171"],
        };
        Self::from_hex(colors)
    }

    /// Replaces every invalid color with the matching default color.
    pub fn sanitized(self) -> Self {
        let fallback = Palette::default();
        let pick = |color: String, default: String| {
            if parse_hex(&color).is_some() {
                color
            } else {
                tracing::debug!(color = %color, "invalid palette color");
                default
            }
        };
        Self {
            primary: pick(self.primary, fallback.primary),
            secondary: pick(self.secondary, fallback.secondary),
            accent: pick(self.accent, fallback.accent),
            success: pick(self.success, fallback.success),
            error: pick(self.error, fallback.error),
        }
    }
}

/// Parses `#rrggbb` (the `#` is optional) into its components.
pub fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
