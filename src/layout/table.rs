use crate::canvas::{Canvas, Rect, TextStyle};
use crate::model::{Currency, DocumentData, LineItem};

use super::{Cursor, LayoutConfig, format_money, format_percent};

pub const COLUMN_LABELS: [&str; 5] = ["Description", "Qty", "Price", "Discount", "Total"];

/// Header band plus one fixed-height row per item.
pub fn table_height(rows: usize, cfg: &LayoutConfig) -> f32 {
    cfg.header_band_height + rows as f32 * cfg.row_height
}

/// First totals baseline: below the table by `totals_gap`, never above
/// `totals_min_top`.
pub fn totals_top(items_end: Cursor, cfg: &LayoutConfig) -> f32 {
    items_end.next_start(cfg.totals_gap, cfg.totals_min_top)
}

/// Cell texts for one row, in column order.
pub fn row_cells(item: &LineItem, currency: &Currency) -> [String; 5] {
    [
        item.description.clone(),
        item.quantity.to_string(),
        format_money(item.price, currency),
        format_percent(item.discount),
        format_money(item.total, currency),
    ]
}

/// Shaded header band, one row per item with odd rows striped, and a single
/// border around band and rows. Returns the bottom edge of the border.
pub fn line_items<C: Canvas + ?Sized>(
    canvas: &mut C,
    cfg: &LayoutConfig,
    data: &DocumentData,
    cursor: Cursor,
) -> Cursor {
    let top = cursor.next_start(cfg.table_gap, cfg.table_top);
    let x = cfg.margin_left;
    let currency = data.currency();

    canvas.fill_rect(
        Rect::new(x, top, cfg.table_width, cfg.header_band_height),
        cfg.header_fill,
    );
    let label_style = TextStyle::bold(cfg.table_font_size);
    for (col_x, label) in cfg.column_x.iter().zip(COLUMN_LABELS) {
        canvas.text(*col_x, top + cfg.header_text_offset, label, label_style);
    }

    let cell_style = TextStyle::regular(cfg.table_font_size);
    for (i, item) in data.items.iter().enumerate() {
        let row_top = top + cfg.header_band_height + i as f32 * cfg.row_height;
        if i % 2 == 1 {
            canvas.fill_rect(
                Rect::new(x, row_top, cfg.table_width, cfg.row_height),
                cfg.stripe_fill,
            );
        }
        let baseline = row_top + cfg.row_text_offset;
        for (col_x, cell) in cfg.column_x.iter().zip(row_cells(item, &currency)) {
            canvas.text(*col_x, baseline, &cell, cell_style);
        }
    }

    let height = table_height(data.items.len(), cfg);
    let border = Rect::new(x, top, cfg.table_width, height);
    canvas.stroke_rect(border, cfg.table_border);
    log::debug!(
        "line_items: {} rows, top={top:.1} bottom={:.1}",
        data.items.len(),
        border.bottom()
    );
    Cursor(border.bottom())
}

/// Subtotal, tax and grand total as right-aligned label/value pairs.
pub fn totals<C: Canvas + ?Sized>(
    canvas: &mut C,
    cfg: &LayoutConfig,
    data: &DocumentData,
    cursor: Cursor,
) -> Cursor {
    let currency = data.currency();
    let t = &data.totals;
    let regular = TextStyle::regular(cfg.totals_font_size);
    let rows = [
        ("Subtotal:".to_string(), t.subtotal, regular),
        (
            format!("Tax ({}):", format_percent(t.tax_rate)),
            t.tax_amount,
            regular,
        ),
        (
            "Total:".to_string(),
            t.grand_total,
            TextStyle::bold(cfg.grand_total_font_size),
        ),
    ];

    let top = totals_top(cursor, cfg);
    let mut y = top;
    for (i, (label, amount, style)) in rows.into_iter().enumerate() {
        if i > 0 {
            y += cfg.totals_row_height;
        }
        canvas.text(cfg.totals_label_right, y, &label, style.right());
        canvas.text(
            cfg.totals_value_right,
            y,
            &format_money(amount, &currency),
            style.right(),
        );
    }
    log::debug!("totals: top={top:.1} last baseline={y:.1}");
    Cursor(y)
}
