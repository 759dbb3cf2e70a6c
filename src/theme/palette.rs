use super::ThemeMode;

/// Color tokens consumed by every screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTokens {
    pub background: &'static str,
    pub surface: &'static str,
    pub primary: &'static str,
    pub secondary: &'static str,
    pub text: &'static str,
    pub text_secondary: &'static str,
    pub border: &'static str,
    pub shadow: &'static str,
    pub error: &'static str,
    pub success: &'static str,
    pub warning: &'static str,
}

pub const LIGHT_TOKENS: ColorTokens = ColorTokens {
    background: "#f8fafc",
    surface: "#ffffff",
    primary: "#22c55e",
    secondary: "#16a34a",
    text: "#1f2937",
    text_secondary: "#6b7280",
    border: "#e5e7eb",
    shadow: "#000000",
    error: "#ef4444",
    success: "#22c55e",
    warning: "#f59e0b",
};

pub const DARK_TOKENS: ColorTokens = ColorTokens {
    background: "#0f172a",
    surface: "#1e293b",
    primary: "#22c55e",
    secondary: "#16a34a",
    text: "#f1f5f9",
    text_secondary: "#94a3b8",
    border: "#334155",
    shadow: "#000000",
    error: "#ef4444",
    success: "#22c55e",
    warning: "#f59e0b",
};

pub const fn color_tokens(mode: ThemeMode) -> ColorTokens {
    match mode {
        ThemeMode::Light => LIGHT_TOKENS,
        ThemeMode::Dark => DARK_TOKENS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_share_brand_colors_but_differ_in_surfaces() {
        let light = color_tokens(ThemeMode::Light);
        let dark = color_tokens(ThemeMode::Dark);
        assert_eq!(light.primary, dark.primary);
        assert_eq!(light.error, dark.error);
        assert_ne!(light.background, dark.background);
        assert_ne!(light.text, dark.text);
    }
}
