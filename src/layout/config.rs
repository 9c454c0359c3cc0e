use serde::{Deserialize, Serialize};

use crate::canvas::Color;

/// Every position, size and colour the stages use. Millimetres unless noted;
/// font sizes are points. Defaults describe an A4 portrait page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_left: f32,
    /// Right edge used for right-aligned text.
    pub content_right: f32,

    pub logo_x: f32,
    pub logo_y: f32,
    pub logo_size: f32,
    pub date_x: f32,
    pub date_y: f32,
    pub date_font_size: f32,
    #[serde(with = "rgb")]
    pub secondary_text: Color,

    pub title_y: f32,
    /// Minimum gap between the header block and the title baseline.
    pub title_clearance: f32,
    pub title_font_size: f32,
    pub number_line_offset: f32,
    pub number_font_size: f32,

    pub party_top: f32,
    pub party_gap: f32,
    pub from_x: f32,
    pub to_x: f32,
    pub party_font_size: f32,
    pub party_label_gap: f32,
    pub party_line_height: f32,

    pub table_top: f32,
    pub table_gap: f32,
    pub table_width: f32,
    pub table_font_size: f32,
    pub header_band_height: f32,
    pub header_text_offset: f32,
    pub row_height: f32,
    pub row_text_offset: f32,
    /// Text x-offsets for Description, Qty, Price, Discount, Total.
    pub column_x: [f32; 5],
    #[serde(with = "rgb")]
    pub header_fill: Color,
    #[serde(with = "rgb")]
    pub stripe_fill: Color,
    #[serde(with = "rgb")]
    pub table_border: Color,

    pub totals_min_top: f32,
    pub totals_gap: f32,
    pub totals_label_right: f32,
    pub totals_value_right: f32,
    pub totals_row_height: f32,
    pub totals_font_size: f32,
    pub grand_total_font_size: f32,

    /// Footer anchor, measured up from the bottom edge.
    pub footer_anchor_offset: f32,
    pub signature_width: f32,
    pub signature_height: f32,
    pub signature_caption_offset: f32,
    /// Baseline of the thank-you line, measured up from the bottom edge.
    pub footer_text_offset: f32,
    pub footer_font_size: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            page_width: 210.0,
            page_height: 297.0,
            margin_left: 15.0,
            content_right: 193.0,

            logo_x: 15.0,
            logo_y: 15.0,
            logo_size: 30.0,
            date_x: 150.0,
            date_y: 20.0,
            date_font_size: 10.0,
            secondary_text: Color::gray(100),

            title_y: 60.0,
            title_clearance: 10.0,
            title_font_size: 24.0,
            number_line_offset: 10.0,
            number_font_size: 12.0,

            party_top: 85.0,
            party_gap: 15.0,
            from_x: 15.0,
            to_x: 110.0,
            party_font_size: 12.0,
            party_label_gap: 10.0,
            party_line_height: 7.0,

            table_top: 150.0,
            table_gap: 10.0,
            table_width: 180.0,
            table_font_size: 10.0,
            header_band_height: 10.0,
            header_text_offset: 7.0,
            row_height: 10.0,
            row_text_offset: 6.5,
            column_x: [20.0, 120.0, 140.0, 160.0, 180.0],
            header_fill: Color::gray(240),
            stripe_fill: Color::rgb(248, 249, 250),
            table_border: Color::gray(200),

            totals_min_top: 220.0,
            totals_gap: 25.0,
            totals_label_right: 170.0,
            totals_value_right: 193.0,
            totals_row_height: 10.0,
            totals_font_size: 10.0,
            grand_total_font_size: 12.0,

            footer_anchor_offset: 40.0,
            signature_width: 40.0,
            signature_height: 20.0,
            signature_caption_offset: 5.0,
            footer_text_offset: 15.0,
            footer_font_size: 8.0,
        }
    }
}

impl LayoutConfig {
    pub fn load(path: &std::path::Path) -> Result<Self, crate::Error> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| crate::Error::Settings(format!("{}: {}", path.display(), e)))
    }
}

/// Colours as `[r, g, b]` in JSON.
mod rgb {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::canvas::Color;

    pub(super) fn serialize<S: Serializer>(c: &Color, s: S) -> Result<S::Ok, S::Error> {
        [c.r, c.g, c.b].serialize(s)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Color, D::Error> {
        let [r, g, b] = <[u8; 3]>::deserialize(d)?;
        Ok(Color::rgb(r, g, b))
    }
}
