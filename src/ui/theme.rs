use egui::{Color32, Context, CornerRadius, Frame, Margin, RichText, Stroke, Ui};

pub const PAGE_BG: Color32 = Color32::from_rgb(0x0f, 0x0f, 0x23);
pub const CARD_BG: Color32 = Color32::from_rgb(0x1a, 0x1a, 0x35);
pub const CARD_BORDER: Color32 = Color32::from_rgb(0x2e, 0x2e, 0x55);
pub const ACCENT: Color32 = Color32::from_rgb(0x3b, 0x82, 0xf6);
pub const ACCENT_PURPLE: Color32 = Color32::from_rgb(0x8b, 0x5c, 0xf6);
pub const ACCENT_CYAN: Color32 = Color32::from_rgb(0x22, 0xd3, 0xee);
pub const SUCCESS: Color32 = Color32::from_rgb(0x22, 0xc5, 0x5e);
pub const DANGER: Color32 = Color32::from_rgb(0xef, 0x44, 0x44);
pub const WARNING: Color32 = Color32::from_rgb(0xf5, 0x9e, 0x0b);
pub const TEXT: Color32 = Color32::from_rgb(0xf1, 0xf5, 0xf9);
pub const TEXT_MUTED: Color32 = Color32::from_rgb(0xa0, 0xa8, 0xc0);

/// Max width of the centered page column.
pub const CONTENT_WIDTH: f32 = 960.0;

/// Dark page visuals with the blue accent.
pub fn apply(ctx: &Context) {
    let mut visuals = egui::Visuals::dark();
    visuals.panel_fill = PAGE_BG;
    visuals.window_fill = CARD_BG;
    visuals.window_stroke = Stroke::new(1.0, CARD_BORDER);
    visuals.extreme_bg_color = Color32::from_rgb(0x0a, 0x0a, 0x1a);
    visuals.selection.bg_fill = ACCENT;
    visuals.hyperlink_color = ACCENT_CYAN;
    visuals.override_text_color = Some(TEXT);
    ctx.set_visuals(visuals);
}

/// Rounded translucent card used by every section.
pub fn card() -> Frame {
    Frame::new()
        .fill(CARD_BG)
        .stroke(Stroke::new(1.0, CARD_BORDER))
        .corner_radius(CornerRadius::same(16))
        .inner_margin(Margin::same(24))
}

/// Card outline in `color`, for highlighted states.
pub fn card_with_border(color: Color32) -> Frame {
    card().stroke(Stroke::new(2.0, color))
}

/// Large centered title with a muted subtitle below it.
pub fn section_heading(ui: &mut Ui, title: &str, subtitle: &str) {
    ui.vertical_centered(|ui| {
        ui.add_space(48.0);
        ui.label(RichText::new(title).size(40.0).strong().color(TEXT));
        ui.add_space(8.0);
        ui.label(RichText::new(subtitle).size(18.0).color(TEXT_MUTED));
        ui.add_space(32.0);
    });
}

/// Interpolates `a` to `b` in sRGB space.
pub fn mix(a: Color32, b: Color32, t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Color32::from_rgba_unmultiplied(
        lerp(a.r(), b.r()),
        lerp(a.g(), b.g()),
        lerp(a.b(), b.b()),
        lerp(a.a(), b.a()),
    )
}

#[cfg(test)]
mod tests {
    use super::{ACCENT, ACCENT_PURPLE, mix};

    #[test]
    fn mix_hits_both_ends() {
        assert_eq!(mix(ACCENT, ACCENT_PURPLE, 0.0), ACCENT);
        assert_eq!(mix(ACCENT, ACCENT_PURPLE, 1.0), ACCENT_PURPLE);
        assert_eq!(mix(ACCENT, ACCENT_PURPLE, 7.0), ACCENT_PURPLE);
    }
}
