use chrono::{DateTime, NaiveDate, Utc};

/// ISO A4 in PostScript points.
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;

/// Fallback CPM when neither the line item nor the proposal carries one.
pub const DEFAULT_CPM: f64 = 25.0;

/// Impression block (in thousands) a screen value is quoted against.
/// `screen_value = effective_cpm * IMPRESSION_UNIT_THOUSANDS`.
pub const IMPRESSION_UNIT_THOUSANDS: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProposalStatus {
    Draft,
    Sent,
    UnderReview,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "enviada" => Self::Sent,
            "em_analise" => Self::UnderReview,
            "aceita" => Self::Accepted,
            "rejeitada" => Self::Rejected,
            _ => Self::Draft,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Draft => "Rascunho",
            Self::Sent => "Enviada",
            Self::UnderReview => "Em Análise",
            Self::Accepted => "Aceita",
            Self::Rejected => "Rejeitada",
        }
    }
}

/// Proposal-level fields, with every optional already resolved to a default.
#[derive(Clone, Debug)]
pub struct ProposalHeader {
    pub id: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub city: String,
    pub created_at: DateTime<Utc>,
    pub status: ProposalStatus,
    pub discount_pct: f64,
    pub discount_fixed: f64,
    pub cpm_mode: String,
    pub cpm_value: f64,
    pub insertions_per_hour: u32,
    pub film_seconds: u32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub agency_name: String,
    pub project_name: String,
    pub final_client: String,
}

/// One proposal line item. `effective_cpm` and `screen_value` are resolved
/// at snapshot construction; downstream code never re-checks optionals.
#[derive(Clone, Debug)]
pub struct LineItem {
    pub screen_id: i64,
    pub code: String,
    pub name: String,
    pub city: String,
    pub state: String,
    pub class: String,
    pub daily_audience: f64,
    pub custom_cpm: Option<f64>,
    pub effective_cpm: f64,
    pub screen_value: f64,
}

/// Immutable input to rendering. Built once per generation request; no
/// component downstream re-queries external state.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub header: ProposalHeader,
    pub items: Vec<LineItem>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontVariant {
    Regular,
    Bold,
}

pub type Rgb = [u8; 3];

/// A single drawing operation on a page. The layout engine emits these;
/// the encoder serializes them. Coordinates are PDF points, origin at the
/// bottom-left corner; `y` is the text baseline for `Text`.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        size: f32,
        font: FontVariant,
        color: Rgb,
        text: String,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
        color: Rgb,
    },
    FilledRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgb,
    },
    /// Reserved box for the raster logo; skipped by the encoder when no
    /// logo was fetched.
    Logo { x: f32, y: f32, w: f32, h: f32 },
    /// Rotated translucent text drawn across the page body.
    Watermark {
        x: f32,
        y: f32,
        size: f32,
        angle_deg: f32,
        alpha: f32,
        text: String,
    },
}

#[derive(Clone, Debug)]
pub struct Page {
    pub number: usize,
    pub ops: Vec<DrawOp>,
}

/// The finished page/op structure. Built once, encoded once.
#[derive(Clone, Debug)]
pub struct RenderedDocument {
    pub pages: Vec<Page>,
}

impl RenderedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}
