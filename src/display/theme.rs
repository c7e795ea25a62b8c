//! Kiosk theme and styling
//!
//! High-contrast dark theme with large touch-friendly buttons.

use egui::{Color32, FontFamily, FontId, Rounding, Stroke, TextStyle, Visuals};

/// Kiosk color palette
pub struct ThemeColors;

impl ThemeColors {
    // Background colors
    pub const BG_DARK: Color32 = Color32::from_rgb(18, 18, 24);
    pub const BG_MEDIUM: Color32 = Color32::from_rgb(28, 28, 36);
    pub const BG_LIGHT: Color32 = Color32::from_rgb(38, 38, 48);
    pub const BG_HOVER: Color32 = Color32::from_rgb(48, 48, 60);

    // Accent colors
    pub const ACCENT_PRIMARY: Color32 = Color32::from_rgb(88, 166, 255);
    pub const ACCENT_SUCCESS: Color32 = Color32::from_rgb(46, 204, 113);
    pub const ACCENT_ERROR: Color32 = Color32::from_rgb(231, 76, 60);

    // Text colors
    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(240, 240, 245);
    pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(160, 160, 175);
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(100, 100, 115);
}

/// Apply the kiosk theme to egui
pub fn apply_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    let mut visuals = Visuals::dark();

    visuals.window_fill = ThemeColors::BG_MEDIUM;
    visuals.panel_fill = ThemeColors::BG_DARK;
    visuals.extreme_bg_color = ThemeColors::BG_DARK;

    visuals.widgets.inactive.bg_fill = ThemeColors::BG_LIGHT;
    visuals.widgets.inactive.weak_bg_fill = ThemeColors::BG_LIGHT;
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, ThemeColors::TEXT_PRIMARY);
    visuals.widgets.inactive.rounding = Rounding::same(8.0);

    visuals.widgets.hovered.bg_fill = ThemeColors::BG_HOVER;
    visuals.widgets.hovered.weak_bg_fill = ThemeColors::BG_HOVER;
    visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, ThemeColors::TEXT_PRIMARY);
    visuals.widgets.hovered.rounding = Rounding::same(8.0);

    visuals.widgets.active.bg_fill = ThemeColors::ACCENT_PRIMARY;
    visuals.widgets.active.fg_stroke = Stroke::new(1.0, ThemeColors::TEXT_PRIMARY);
    visuals.widgets.active.rounding = Rounding::same(8.0);

    style.visuals = visuals;

    style.spacing.item_spacing = egui::vec2(12.0, 10.0);
    style.spacing.button_padding = egui::vec2(20.0, 12.0);

    // Readable from a step back
    style.text_styles = [
        (TextStyle::Small, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(18.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(16.0, FontFamily::Monospace)),
        (TextStyle::Button, FontId::new(22.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(28.0, FontFamily::Proportional)),
    ]
    .into();

    ctx.set_style(style);
}
