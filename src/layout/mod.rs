//! Page layout for business documents.
//!
//! Each stage writes one visual block to a [`Canvas`]. Vertical stages take
//! the running [`Cursor`] from the previous stage and return the next one;
//! a stage starts at the lower of its configured offset and the cursor plus
//! its gap, so blocks never overlap and never float above their baseline.

mod config;
mod table;

use std::sync::Arc;

use crate::assets::RasterImage;
use crate::canvas::{Canvas, Metadata, Rect, TextStyle};
use crate::model::{Currency, DocumentData, DocumentKind};

pub use config::LayoutConfig;
pub use table::{COLUMN_LABELS, line_items, row_cells, table_height, totals, totals_top};

pub const CREATOR: &str = "Business Documents Generator";
pub const SIGNATURE_CAPTION: &str = "Authorized Signature";
pub const THANK_YOU: &str = "Thank you for your patronage!";
pub const PAGE_INDICATOR: &str = "Page 1 of 1";

/// Vertical position (mm from the top edge) where the previous block ended.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Cursor(pub f32);

impl Cursor {
    pub const TOP: Cursor = Cursor(0.0);

    /// Start of the next block: `gap` below the cursor, but never above `floor`.
    pub fn next_start(self, gap: f32, floor: f32) -> f32 {
        (self.0 + gap).max(floor)
    }
}

/// Display heading for a raw document type string.
pub fn document_title(kind: &str) -> &'static str {
    DocumentKind::from(kind).title()
}

/// Currency symbol for an ISO code; unknown codes map to `$`.
pub fn currency_symbol(code: &str) -> &'static str {
    Currency::from(code).symbol()
}

pub fn format_money(amount: f64, currency: &Currency) -> String {
    format!("{}{}", currency.symbol(), to_fixed_2(amount))
}

/// Two decimals, with exact half-cent ties rounded away from zero.
///
/// `{:.2}` already rounds the exact binary value correctly; it only differs
/// on true ties, where it picks the even digit. A tie at the third decimal is
/// an odd multiple of 1/8, the only ones a binary float can hold exactly.
fn to_fixed_2(amount: f64) -> String {
    // -0.0 would print as "-0.00"
    if amount == 0.0 || !amount.is_finite() {
        return format!("{:.2}", if amount == 0.0 { 0.0 } else { amount });
    }
    let abs = amount.abs();
    let eighths = abs * 8.0;
    let is_tie = eighths.fract() == 0.0 && eighths % 2.0 == 1.0;
    if !is_tie {
        return format!("{amount:.2}");
    }
    let whole = abs.trunc();
    let cents = ((abs - whole) * 100.0).round();
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}{whole:.0}.{cents:02.0}")
}

pub fn format_amount(amount: f64, code: &str) -> String {
    format_money(amount, &Currency::from(code))
}

/// Shortest decimal form of a percentage: `0` → "0%", `7.5` → "7.5%".
pub fn format_percent(value: f64) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{value}%")
}

pub fn metadata<C: Canvas + ?Sized>(canvas: &mut C, data: &DocumentData) {
    let title = data.title();
    let subject = match data.client.name() {
        Some(name) => format!("{title} for {name}"),
        None => title.to_string(),
    };
    canvas.set_metadata(Metadata {
        title: format!("{title} {}", data.number),
        subject,
        author: data.business.name().unwrap_or(CREATOR).to_string(),
        creator: CREATOR.to_string(),
    });
}

/// Logo slot and date stamp. The cursor ends below the logo slot whether or
/// not a logo was drawn, so a failed load never moves later blocks.
pub fn header<C: Canvas + ?Sized>(
    canvas: &mut C,
    cfg: &LayoutConfig,
    data: &DocumentData,
    logo: Option<Arc<RasterImage>>,
) -> Cursor {
    if let Some(logo) = logo {
        canvas.image(
            logo,
            Rect::new(cfg.logo_x, cfg.logo_y, cfg.logo_size, cfg.logo_size),
        );
    }
    canvas.text(
        cfg.date_x,
        cfg.date_y,
        &format!("Date: {}", data.date),
        TextStyle::regular(cfg.date_font_size).color(cfg.secondary_text),
    );
    Cursor((cfg.logo_y + cfg.logo_size).max(cfg.date_y))
}

pub fn title<C: Canvas + ?Sized>(
    canvas: &mut C,
    cfg: &LayoutConfig,
    data: &DocumentData,
    cursor: Cursor,
) -> Cursor {
    let heading = data.title();
    let y = cursor.next_start(cfg.title_clearance, cfg.title_y);
    canvas.text(cfg.margin_left, y, heading, TextStyle::bold(cfg.title_font_size));

    let number_y = y + cfg.number_line_offset;
    canvas.text(
        cfg.margin_left,
        number_y,
        &format!("{heading} #: {}", data.number),
        TextStyle::regular(cfg.number_font_size),
    );
    Cursor(number_y)
}

/// Lines of the "From:" block, in render order. Absent fields yield nothing.
pub fn business_lines(data: &DocumentData) -> Vec<String> {
    let b = &data.business;
    let mut lines = Vec::new();
    if let Some(name) = b.name() {
        lines.push(name.to_string());
    }
    if let Some(address) = b.address() {
        lines.extend(address_lines(address));
    }
    if let Some(phone) = b.phone() {
        lines.push(format!("Phone: {phone}"));
    }
    if let Some(email) = b.email() {
        lines.push(format!("Email: {email}"));
    }
    lines
}

/// Lines of the "To:" block, in render order.
pub fn client_lines(data: &DocumentData) -> Vec<String> {
    let c = &data.client;
    let mut lines = Vec::new();
    if let Some(name) = c.name() {
        lines.push(name.to_string());
    }
    if let Some(address) = c.address() {
        lines.extend(address_lines(address));
    }
    if let Some(email) = c.email() {
        lines.push(format!("Email: {email}"));
    }
    lines
}

fn address_lines(address: &str) -> impl Iterator<Item = String> + '_ {
    address
        .split('\n')
        .map(|line| line.trim_end_matches('\r').to_string())
}

/// Height of a party block with `lines` text lines under its label.
pub fn party_block_height(cfg: &LayoutConfig, lines: usize) -> f32 {
    cfg.party_label_gap + lines as f32 * cfg.party_line_height
}

/// "From:" and "To:" side by side from a shared top. The columns advance
/// independently; the returned cursor is the end of the taller one.
pub fn parties<C: Canvas + ?Sized>(
    canvas: &mut C,
    cfg: &LayoutConfig,
    data: &DocumentData,
    cursor: Cursor,
) -> Cursor {
    let top = cursor.next_start(cfg.party_gap, cfg.party_top);
    let from_end = party_block(canvas, cfg, cfg.from_x, top, "From:", &business_lines(data));
    let to_end = party_block(canvas, cfg, cfg.to_x, top, "To:", &client_lines(data));
    log::debug!("parties: top={top:.1} from_end={from_end:.1} to_end={to_end:.1}");
    Cursor(from_end.max(to_end))
}

fn party_block<C: Canvas + ?Sized>(
    canvas: &mut C,
    cfg: &LayoutConfig,
    x: f32,
    top: f32,
    label: &str,
    lines: &[String],
) -> f32 {
    canvas.text(x, top, label, TextStyle::bold(cfg.party_font_size));
    let style = TextStyle::regular(cfg.party_font_size);
    let mut y = top + cfg.party_label_gap;
    for line in lines {
        canvas.text(x, y, line, style);
        y += cfg.party_line_height;
    }
    y
}

/// Signature, thank-you line and page indicator, anchored to the page bottom.
/// Footer text positions do not depend on whether the signature loaded.
pub fn footer<C: Canvas + ?Sized>(
    canvas: &mut C,
    cfg: &LayoutConfig,
    signature: Option<Arc<RasterImage>>,
    cursor: Cursor,
) {
    let h = canvas.page_height();
    let anchor = h - cfg.footer_anchor_offset;
    let secondary = TextStyle::regular(cfg.footer_font_size).color(cfg.secondary_text);

    if cursor.0 > anchor {
        log::warn!(
            "Content ends at {:.1}mm, below the footer anchor at {anchor:.1}mm; it will overlap the footer",
            cursor.0,
        );
    }

    if let Some(signature) = signature {
        canvas.image(
            signature,
            Rect::new(
                cfg.margin_left,
                anchor - cfg.signature_height,
                cfg.signature_width,
                cfg.signature_height,
            ),
        );
        canvas.text(
            cfg.margin_left,
            anchor + cfg.signature_caption_offset,
            SIGNATURE_CAPTION,
            secondary,
        );
    }

    let y = h - cfg.footer_text_offset;
    canvas.text(cfg.margin_left, y, THANK_YOU, secondary);
    canvas.text(cfg.content_right, y, PAGE_INDICATOR, secondary.right());
}
