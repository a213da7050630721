use crate::fonts::text_width;
use crate::model::{DrawOp, FontVariant, LineItem};

use super::layout::{
    BORDER, CONTENT_WIDTH, INK, MARGIN_LEFT, MUTED, ORANGE_DARK, ORANGE_LIGHT, PageCursor,
    ROW_SHADE, format_brl, format_int,
};

/// Hard cap on rows rendered in the itemized table. Bounds page count for
/// very large proposals; aggregate totals and the location rollup always
/// cover the full item set. A notice row is emitted when the cap truncates.
pub const MAX_ITEM_ROWS: usize = 25;

pub(super) const TABLE_ROW_H: f32 = 28.0;
pub(super) const TABLE_HEADER_H: f32 = 20.0;
const CELL_PAD: f32 = 4.0;
const CELL_FONT_SIZE: f32 = 8.0;

#[derive(Clone, Copy)]
pub enum ColumnAlign {
    Left,
    Right,
}

pub struct Column {
    pub title: &'static str,
    pub width: f32,
    pub align: ColumnAlign,
}

/// Fixed schema; widths sum to `CONTENT_WIDTH`.
pub const COLUMNS: [Column; 7] = [
    Column { title: "Código", width: 62.0, align: ColumnAlign::Left },
    Column { title: "Tela", width: 150.28, align: ColumnAlign::Left },
    Column { title: "Cidade/UF", width: 92.0, align: ColumnAlign::Left },
    Column { title: "Classe", width: 46.0, align: ColumnAlign::Left },
    Column { title: "Aud./dia", width: 55.0, align: ColumnAlign::Right },
    Column { title: "CPM", width: 50.0, align: ColumnAlign::Right },
    Column { title: "Valor", width: 60.0, align: ColumnAlign::Right },
];

fn cell_x(col: &Column, col_left: f32, text: &str, size: f32) -> f32 {
    match col.align {
        ColumnAlign::Left => col_left + CELL_PAD,
        ColumnAlign::Right => col_left + col.width - CELL_PAD - text_width(text, size),
    }
}

/// Header band: shaded rect, column titles, bottom rule. Re-emitted at the
/// top of every page that receives rows.
fn emit_header(cursor: &mut PageCursor) {
    let top = cursor.y();
    cursor.push(DrawOp::FilledRect {
        x: MARGIN_LEFT,
        y: top - TABLE_HEADER_H,
        w: CONTENT_WIDTH,
        h: TABLE_HEADER_H,
        color: ORANGE_LIGHT,
    });

    let baseline = top - TABLE_HEADER_H + 6.0;
    let mut col_left = MARGIN_LEFT;
    for col in &COLUMNS {
        cursor.push(DrawOp::Text {
            x: cell_x(col, col_left, col.title, CELL_FONT_SIZE),
            y: baseline,
            size: CELL_FONT_SIZE,
            font: FontVariant::Bold,
            color: ORANGE_DARK,
            text: col.title.to_string(),
        });
        col_left += col.width;
    }

    cursor.push(DrawOp::Line {
        x1: MARGIN_LEFT,
        y1: top - TABLE_HEADER_H,
        x2: MARGIN_LEFT + CONTENT_WIDTH,
        y2: top - TABLE_HEADER_H,
        width: 0.75,
        color: BORDER,
    });
    cursor.advance(TABLE_HEADER_H);
}

fn emit_row(cursor: &mut PageCursor, item: &LineItem, row_idx: usize) {
    let top = cursor.y();

    // Shading parity follows the global row index, not the row's position
    // on the page, so a mid-table break does not restart the stripes.
    if row_idx % 2 == 1 {
        cursor.push(DrawOp::FilledRect {
            x: MARGIN_LEFT,
            y: top - TABLE_ROW_H,
            w: CONTENT_WIDTH,
            h: TABLE_ROW_H,
            color: ROW_SHADE,
        });
    }

    let cells: [String; 7] = [
        item.code.clone(),
        item.name.clone(),
        format!("{}/{}", item.city, item.state),
        item.class.clone(),
        format_int(item.daily_audience),
        format_brl(item.effective_cpm),
        format_brl(item.screen_value),
    ];

    let baseline = top - TABLE_ROW_H + 10.0;
    let mut col_left = MARGIN_LEFT;
    for (col, text) in COLUMNS.iter().zip(cells) {
        cursor.push(DrawOp::Text {
            x: cell_x(col, col_left, &text, CELL_FONT_SIZE),
            y: baseline,
            size: CELL_FONT_SIZE,
            font: FontVariant::Regular,
            color: INK,
            text,
        });
        col_left += col.width;
    }

    cursor.push(DrawOp::Line {
        x1: MARGIN_LEFT,
        y1: top - TABLE_ROW_H,
        x2: MARGIN_LEFT + CONTENT_WIDTH,
        y2: top - TABLE_ROW_H,
        width: 0.4,
        color: BORDER,
    });
    cursor.advance(TABLE_ROW_H);
}

/// Render the itemized table: header band, then one row per line item up
/// to `MAX_ITEM_ROWS`. Overflow checks run per row so mid-table page
/// breaks are transparent to the caller; the header band repeats after
/// each break.
pub(super) fn render_items(cursor: &mut PageCursor, items: &[LineItem]) {
    emit_header(cursor);

    for (idx, item) in items.iter().take(MAX_ITEM_ROWS).enumerate() {
        if cursor.ensure(TABLE_ROW_H) {
            emit_header(cursor);
        }
        emit_row(cursor, item, idx);
    }

    let hidden = items.len().saturating_sub(MAX_ITEM_ROWS);
    if hidden > 0 {
        cursor.ensure(TABLE_ROW_H + 4.0);
        cursor.advance(4.0);
        let notice = format!(
            "+ {hidden} telas adicionais incluídas no investimento e na cobertura, não listadas acima."
        );
        cursor.push(DrawOp::Text {
            x: MARGIN_LEFT,
            y: cursor.y() - 8.0,
            size: 8.0,
            font: FontVariant::Regular,
            color: MUTED,
            text: notice,
        });
        cursor.advance(TABLE_ROW_H);
    }
}
