use chrono::NaiveDate;

use crate::finance::Metrics;
use crate::fonts::text_width;
use crate::model::{
    DrawOp, FontVariant, Page, PAGE_HEIGHT, PAGE_WIDTH, ProposalHeader, ProposalStatus,
    RenderedDocument, Rgb, Snapshot,
};

use super::table;

pub(crate) const MARGIN_LEFT: f32 = 40.0;
pub(crate) const MARGIN_RIGHT: f32 = 40.0;
pub(crate) const CONTENT_WIDTH: f32 = PAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;

/// Vertical band reserved for the page header; content starts below it.
const HEADER_BAND_H: f32 = 46.0;
const CONTENT_TOP: f32 = PAGE_HEIGHT - HEADER_BAND_H - 16.0;
/// Content may not descend past this; the footer lives below.
const MARGIN_BOTTOM: f32 = 48.0;

const LINE_H: f32 = 14.0;
const BODY_SIZE: f32 = 9.5;

const LOGO_W: f32 = 84.0;
const LOGO_H: f32 = 30.0;

pub(crate) const ORANGE: Rgb = [234, 88, 12];
pub(crate) const ORANGE_LIGHT: Rgb = [255, 247, 237];
pub(crate) const ORANGE_DARK: Rgb = [154, 52, 18];
pub(crate) const INK: Rgb = [15, 23, 42];
pub(crate) const MUTED: Rgb = [100, 116, 139];
pub(crate) const ROW_SHADE: Rgb = [248, 250, 252];
pub(crate) const BORDER: Rgb = [226, 232, 240];
const WHITE: Rgb = [255, 255, 255];

/// Layout cursor: the current page's ops and the vertical offset, threaded
/// by `&mut` through every section. Opening a page draws the header band
/// and resets the offset; closing one draws the footer. `ensure` is the
/// only place a content-driven page break can happen.
pub struct PageCursor {
    doc_ref: String,
    watermark: Option<String>,
    pages: Vec<Page>,
    ops: Vec<DrawOp>,
    y: f32,
}

impl PageCursor {
    pub fn new(header: &ProposalHeader) -> Self {
        let watermark = (header.status == ProposalStatus::Draft)
            .then(|| header.status.label().to_uppercase());
        let mut cursor = Self {
            doc_ref: format!("Proposta #{}", header.id),
            watermark,
            pages: Vec::new(),
            ops: Vec::new(),
            y: CONTENT_TOP,
        };
        cursor.open_page();
        cursor
    }

    /// Top of the space still free on the current page.
    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn remaining(&self) -> f32 {
        self.y - MARGIN_BOTTOM
    }

    pub fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    pub fn advance(&mut self, dy: f32) {
        self.y -= dy;
    }

    /// Break the page if `needed` points do not fit above the bottom
    /// margin. Returns true when a break happened, so table callers can
    /// re-emit their header band.
    pub fn ensure(&mut self, needed: f32) -> bool {
        if self.y - needed < MARGIN_BOTTOM {
            self.break_page();
            true
        } else {
            false
        }
    }

    /// Close the current page and open a fresh one. Also used for the
    /// forced break at every section boundary.
    pub fn break_page(&mut self) {
        self.close_page();
        self.open_page();
    }

    fn open_page(&mut self) {
        let band_bottom = PAGE_HEIGHT - HEADER_BAND_H;
        self.ops.push(DrawOp::FilledRect {
            x: 0.0,
            y: band_bottom,
            w: PAGE_WIDTH,
            h: HEADER_BAND_H,
            color: ORANGE,
        });
        self.ops.push(DrawOp::Text {
            x: MARGIN_LEFT,
            y: band_bottom + 18.0,
            size: 13.0,
            font: FontVariant::Bold,
            color: WHITE,
            text: "Proposta Comercial — Mídia Digital Out-of-Home".into(),
        });
        self.ops.push(DrawOp::Logo {
            x: PAGE_WIDTH - MARGIN_RIGHT - LOGO_W,
            y: band_bottom + (HEADER_BAND_H - LOGO_H) / 2.0,
            w: LOGO_W,
            h: LOGO_H,
        });
        if let Some(text) = &self.watermark {
            self.ops.push(DrawOp::Watermark {
                x: 130.0,
                y: 260.0,
                size: 72.0,
                angle_deg: 45.0,
                alpha: 0.08,
                text: text.clone(),
            });
        }
        self.y = CONTENT_TOP;
    }

    fn close_page(&mut self) {
        let number = self.pages.len() + 1;
        self.ops.push(DrawOp::Line {
            x1: MARGIN_LEFT,
            y1: 40.0,
            x2: PAGE_WIDTH - MARGIN_RIGHT,
            y2: 40.0,
            width: 0.5,
            color: BORDER,
        });
        self.ops.push(DrawOp::Text {
            x: MARGIN_LEFT,
            y: 28.0,
            size: 8.0,
            font: FontVariant::Regular,
            color: MUTED,
            text: self.doc_ref.clone(),
        });
        let page_label = format!("Página {number}");
        self.ops.push(DrawOp::Text {
            x: PAGE_WIDTH - MARGIN_RIGHT - text_width(&page_label, 8.0),
            y: 28.0,
            size: 8.0,
            font: FontVariant::Regular,
            color: MUTED,
            text: page_label,
        });
        let ops = std::mem::take(&mut self.ops);
        self.pages.push(Page { number, ops });
    }

    pub fn finish(mut self) -> RenderedDocument {
        self.close_page();
        RenderedDocument { pages: self.pages }
    }
}

/// Lay the fixed section sequence out onto pages. Pure and deterministic:
/// the same snapshot and metrics always produce the same op stream.
pub fn render(snapshot: &Snapshot, metrics: &Metrics) -> RenderedDocument {
    let mut cursor = PageCursor::new(&snapshot.header);

    cover(&mut cursor, snapshot, metrics);
    cursor.break_page();
    executive_summary(&mut cursor, snapshot, metrics);
    cursor.break_page();
    section_title(&mut cursor, "Investimento Detalhado");
    table::render_items(&mut cursor, &snapshot.items);
    totals_block(&mut cursor, snapshot, metrics);
    cursor.break_page();
    location_rollup(&mut cursor, metrics);
    cursor.break_page();
    schedule_sla(&mut cursor, snapshot);
    cursor.break_page();
    terms_and_signature(&mut cursor, snapshot);

    cursor.finish()
}

fn section_title(cursor: &mut PageCursor, title: &str) {
    cursor.push(DrawOp::Text {
        x: MARGIN_LEFT,
        y: cursor.y() - 12.0,
        size: 12.0,
        font: FontVariant::Bold,
        color: ORANGE_DARK,
        text: title.to_string(),
    });
    cursor.push(DrawOp::Line {
        x1: MARGIN_LEFT,
        y1: cursor.y() - 17.0,
        x2: MARGIN_LEFT + CONTENT_WIDTH,
        y2: cursor.y() - 17.0,
        width: 1.0,
        color: ORANGE,
    });
    cursor.advance(26.0);
}

fn body_line(cursor: &mut PageCursor, text: &str, font: FontVariant, color: Rgb) {
    cursor.ensure(LINE_H);
    cursor.push(DrawOp::Text {
        x: MARGIN_LEFT,
        y: cursor.y() - BODY_SIZE,
        size: BODY_SIZE,
        font,
        color,
        text: text.to_string(),
    });
    cursor.advance(LINE_H);
}

/// Label on the left, value right of a fixed gutter. Single line, no wrap.
fn field_line(cursor: &mut PageCursor, label: &str, value: &str) {
    cursor.ensure(LINE_H);
    let baseline = cursor.y() - BODY_SIZE;
    cursor.push(DrawOp::Text {
        x: MARGIN_LEFT,
        y: baseline,
        size: BODY_SIZE,
        font: FontVariant::Bold,
        color: INK,
        text: label.to_string(),
    });
    cursor.push(DrawOp::Text {
        x: MARGIN_LEFT + 150.0,
        y: baseline,
        size: BODY_SIZE,
        font: FontVariant::Regular,
        color: INK,
        text: value.to_string(),
    });
    cursor.advance(LINE_H);
}

fn kpi_box(cursor: &mut PageCursor, x: f32, w: f32, label: &str, value: &str) {
    let top = cursor.y();
    let h = 52.0;
    cursor.push(DrawOp::FilledRect {
        x,
        y: top - h,
        w,
        h,
        color: ORANGE,
    });
    cursor.push(DrawOp::Text {
        x: x + 12.0,
        y: top - 18.0,
        size: 8.0,
        font: FontVariant::Bold,
        color: ORANGE_LIGHT,
        text: label.to_string(),
    });
    cursor.push(DrawOp::Text {
        x: x + 12.0,
        y: top - 40.0,
        size: 16.0,
        font: FontVariant::Bold,
        color: WHITE,
        text: value.to_string(),
    });
}

fn cover(cursor: &mut PageCursor, snapshot: &Snapshot, metrics: &Metrics) {
    let h = &snapshot.header;

    cursor.advance(18.0);
    cursor.push(DrawOp::Text {
        x: MARGIN_LEFT,
        y: cursor.y(),
        size: 24.0,
        font: FontVariant::Bold,
        color: INK,
        text: "Proposta Comercial".into(),
    });
    cursor.advance(20.0);
    cursor.push(DrawOp::Text {
        x: MARGIN_LEFT,
        y: cursor.y(),
        size: 11.0,
        font: FontVariant::Regular,
        color: MUTED,
        text: format!("{} • Emitida em {}", cursor_doc_ref(h), format_date_time(h)),
    });
    cursor.advance(34.0);

    let half = (CONTENT_WIDTH - 12.0) / 2.0;
    kpi_box(
        cursor,
        MARGIN_LEFT,
        half,
        "INVESTIMENTO TOTAL",
        &format_brl(metrics.net_value),
    );
    kpi_box(
        cursor,
        MARGIN_LEFT + half + 12.0,
        half,
        "TELAS SELECIONADAS",
        &metrics.total_screens.to_string(),
    );
    cursor.advance(52.0 + 24.0);

    section_title(cursor, "Informações do Cliente");
    field_line(cursor, "Cliente", &h.customer_name);
    field_line(cursor, "Email", &h.customer_email);
    field_line(cursor, "Agência", &h.agency_name);
    field_line(cursor, "Projeto", &h.project_name);
    field_line(cursor, "Cliente final", &h.final_client);
    field_line(cursor, "Cidade", &h.city);
    field_line(cursor, "Período", &format_period(h.start_date, h.end_date));
    field_line(cursor, "Status", h.status.label());
}

fn executive_summary(cursor: &mut PageCursor, snapshot: &Snapshot, metrics: &Metrics) {
    let h = &snapshot.header;

    section_title(cursor, "Resumo Executivo");
    field_line(cursor, "Investimento total", &format_brl(metrics.net_value));
    field_line(cursor, "Valor bruto", &format_brl(metrics.gross_value));
    field_line(cursor, "Telas", &metrics.total_screens.to_string());
    field_line(
        cursor,
        "Audiência diária estimada",
        &format_int(metrics.total_daily_audience),
    );
    field_line(cursor, "CPM médio", &format_brl(metrics.average_cpm));
    field_line(cursor, "Modo CPM", &h.cpm_mode);
    field_line(
        cursor,
        "Valor médio por tela",
        &format_brl(metrics.average_value_per_screen),
    );
    field_line(
        cursor,
        "Inserções por hora",
        &h.insertions_per_hour.to_string(),
    );
    field_line(
        cursor,
        "Duração do filme",
        &format!("{}s", h.film_seconds),
    );
    field_line(
        cursor,
        "Desconto percentual",
        &format!("{:.1}%", h.discount_pct),
    );
    field_line(cursor, "Desconto fixo", &format_brl(h.discount_fixed));
    field_line(cursor, "Período", &format_period(h.start_date, h.end_date));
}

/// Height the totals block needs in one piece; it is not split across pages.
const TOTALS_H: f32 = 5.0 * LINE_H + 20.0;

fn totals_block(cursor: &mut PageCursor, snapshot: &Snapshot, metrics: &Metrics) {
    let h = &snapshot.header;

    // Continues on the table's last page when space remains, otherwise
    // moves whole to a fresh page.
    if cursor.remaining() < TOTALS_H {
        cursor.break_page();
    }
    cursor.advance(10.0);

    let value_right = MARGIN_LEFT + CONTENT_WIDTH;
    let mut totals_line = |cursor: &mut PageCursor, label: &str, value: String, bold: bool| {
        let baseline = cursor.y() - BODY_SIZE;
        let font = if bold { FontVariant::Bold } else { FontVariant::Regular };
        let size = if bold { 11.0 } else { BODY_SIZE };
        cursor.push(DrawOp::Text {
            x: MARGIN_LEFT + 260.0,
            y: baseline,
            size,
            font,
            color: if bold { ORANGE_DARK } else { INK },
            text: label.to_string(),
        });
        cursor.push(DrawOp::Text {
            x: value_right - text_width(&value, size),
            y: baseline,
            size,
            font,
            color: if bold { ORANGE_DARK } else { INK },
            text: value,
        });
        cursor.advance(LINE_H);
    };

    totals_line(cursor, "Valor bruto", format_brl(metrics.gross_value), false);
    totals_line(
        cursor,
        "Desconto percentual",
        format!("-{:.1}%", h.discount_pct),
        false,
    );
    totals_line(
        cursor,
        "Desconto fixo",
        format!("-{}", format_brl(h.discount_fixed)),
        false,
    );
    cursor.push(DrawOp::Line {
        x1: MARGIN_LEFT + 260.0,
        y1: cursor.y() - 2.0,
        x2: value_right,
        y2: cursor.y() - 2.0,
        width: 0.75,
        color: INK,
    });
    cursor.advance(8.0);
    totals_line(
        cursor,
        "Investimento líquido",
        format_brl(metrics.net_value),
        true,
    );
}

fn location_rollup(cursor: &mut PageCursor, metrics: &Metrics) {
    section_title(cursor, "Cobertura por Praça");

    if metrics.locations.is_empty() {
        body_line(cursor, "Nenhuma tela vinculada.", FontVariant::Regular, MUTED);
        return;
    }

    for (idx, loc) in metrics.locations.iter().enumerate() {
        cursor.ensure(LINE_H);
        let top = cursor.y();
        if idx % 2 == 1 {
            cursor.push(DrawOp::FilledRect {
                x: MARGIN_LEFT,
                y: top - LINE_H,
                w: CONTENT_WIDTH,
                h: LINE_H,
                color: ROW_SHADE,
            });
        }
        let baseline = top - BODY_SIZE;
        cursor.push(DrawOp::Text {
            x: MARGIN_LEFT + 4.0,
            y: baseline,
            size: BODY_SIZE,
            font: FontVariant::Regular,
            color: INK,
            text: format!("{}/{}", loc.city, loc.state),
        });
        let count = format!(
            "{} {}",
            loc.screens,
            if loc.screens == 1 { "tela" } else { "telas" }
        );
        cursor.push(DrawOp::Text {
            x: MARGIN_LEFT + CONTENT_WIDTH - 4.0 - text_width(&count, BODY_SIZE),
            y: baseline,
            size: BODY_SIZE,
            font: FontVariant::Regular,
            color: INK,
            text: count,
        });
        cursor.advance(LINE_H);
    }

    cursor.advance(6.0);
    let summary = format!(
        "Total: {} telas em {} praças.",
        metrics.total_screens,
        metrics.locations.len()
    );
    body_line(cursor, &summary, FontVariant::Bold, INK);
}

fn schedule_sla(cursor: &mut PageCursor, snapshot: &Snapshot) {
    let h = &snapshot.header;

    section_title(cursor, "Cronograma e SLA");
    field_line(
        cursor,
        "Veiculação",
        &format_period(h.start_date, h.end_date),
    );
    field_line(
        cursor,
        "Entrega de materiais",
        "até 5 dias úteis antes do início da veiculação",
    );
    field_line(
        cursor,
        "Ativação da campanha",
        "até 2 dias úteis após a aprovação da proposta",
    );
    field_line(
        cursor,
        "Substituição de filme",
        "até 3 dias úteis após o recebimento do novo material",
    );
    field_line(
        cursor,
        "SLA de atendimento",
        "resposta em até 24 horas úteis",
    );
    field_line(
        cursor,
        "Relatório de veiculação",
        "até 7 dias úteis após o término da campanha",
    );
}

fn terms_and_signature(cursor: &mut PageCursor, snapshot: &Snapshot) {
    let h = &snapshot.header;

    section_title(cursor, "Termos e Condições");
    body_line(
        cursor,
        "1. Esta proposta é válida por 30 dias a partir da data de emissão.",
        FontVariant::Regular,
        INK,
    );
    body_line(
        cursor,
        "2. Os valores apresentados não incluem a produção do material publicitário.",
        FontVariant::Regular,
        INK,
    );
    body_line(
        cursor,
        "3. A veiculação está condicionada à aprovação do material pela rede.",
        FontVariant::Regular,
        INK,
    );
    body_line(
        cursor,
        "4. Faturamento mediante pedido de inserção assinado.",
        FontVariant::Regular,
        INK,
    );
    body_line(
        cursor,
        "5. Cancelamentos devem ser comunicados com 15 dias de antecedência.",
        FontVariant::Regular,
        INK,
    );

    cursor.advance(70.0);
    let half = (CONTENT_WIDTH - 40.0) / 2.0;
    let sig_y = cursor.y();
    for (x, name) in [
        (MARGIN_LEFT, "Rede de Mídia"),
        (MARGIN_LEFT + half + 40.0, h.customer_name.as_str()),
    ] {
        cursor.push(DrawOp::Line {
            x1: x,
            y1: sig_y,
            x2: x + half,
            y2: sig_y,
            width: 0.75,
            color: INK,
        });
        cursor.push(DrawOp::Text {
            x,
            y: sig_y - 12.0,
            size: 8.5,
            font: FontVariant::Regular,
            color: MUTED,
            text: name.to_string(),
        });
    }
    cursor.advance(30.0);
}

fn cursor_doc_ref(h: &ProposalHeader) -> String {
    format!("Proposta #{}", h.id)
}

fn format_date_time(h: &ProposalHeader) -> String {
    h.created_at.format("%d/%m/%Y").to_string()
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub(crate) fn format_period(start: Option<NaiveDate>, end: Option<NaiveDate>) -> String {
    match (start, end) {
        (Some(s), Some(e)) => format!("{} a {}", format_date(s), format_date(e)),
        (Some(s), None) => format!("a partir de {}", format_date(s)),
        (None, Some(e)) => format!("até {}", format_date(e)),
        (None, None) => "—".into(),
    }
}

/// pt-BR currency: `R$ 1.234,56`. Values here are non-negative by
/// construction; the clamp guards rounding artifacts only.
pub(crate) fn format_brl(value: f64) -> String {
    let cents = (value.max(0.0) * 100.0).round() as u64;
    format!("R$ {},{:02}", group_thousands(cents / 100), cents % 100)
}

/// Integer with pt-BR thousand separators.
pub(crate) fn format_int(value: f64) -> String {
    group_thousands(value.max(0.0).round() as u64)
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let offset = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - offset) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}
