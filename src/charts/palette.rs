//! Fixed label-to-color lookup shared by every chart.

use plotters::style::RGBColor;

use crate::analyzers::risk::RiskTier;

/// Default series color when a chart has no color field.
pub const PRIMARY: RGBColor = RGBColor(0x1F, 0xB8, 0xCD);

/// Parses `#RRGGBB` (leading `#` optional).
pub fn hex_to_rgb(hex: &str) -> Option<RGBColor> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    Some(RGBColor(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Color for a category label. Risk tiers resolve through [`RiskTier::hex`].
pub fn color_for(label: &str) -> Option<RGBColor> {
    if let Ok(tier) = label.parse::<RiskTier>() {
        return hex_to_rgb(tier.hex());
    }

    let hex = match label.trim() {
        "Historical" => "#1FB8CD",
        "Prediction" => "#DB4545",
        "COVID Impact" => "#2E8B57",
        "Low-Medium" => "#5D878F",
        "City-wide" => "#964325",
        "Mobile" => "#944454",
        _ => return None,
    };
    hex_to_rgb(hex)
}
