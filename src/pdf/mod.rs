pub mod layout;
pub mod table;

pub use layout::{PageCursor, render};
pub use table::{COLUMNS, Column, ColumnAlign, MAX_ITEM_ROWS};

use std::collections::HashMap;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};

use crate::fonts::{FontSet, register_fonts, to_winansi_bytes};
use crate::model::{DrawOp, PAGE_HEIGHT, PAGE_WIDTH, RenderedDocument};

/// Raster logo bytes as fetched, plus decoded pixel dimensions.
#[derive(Clone, Debug)]
pub struct Logo {
    pub data: Vec<u8>,
    pub format: LogoFormat,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogoFormat {
    Png,
    Jpeg,
}

/// Structural serialization failure. Logo problems never reach this: they
/// are absorbed upstream and the document renders without the asset.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct EncodeError(pub String);

const LOGO_NAME: &[u8] = b"Im1";

/// Serialize the finished page/op structure into PDF bytes. One Flate
/// content stream per page, base fonts registered once, the logo XObject
/// (when present) embedded once and referenced from every page.
pub fn encode(doc: &RenderedDocument, logo: Option<&Logo>) -> Result<Vec<u8>, EncodeError> {
    if doc.pages.is_empty() {
        return Err(EncodeError("document has no pages".into()));
    }

    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();

    let fonts = register_fonts(&mut pdf, &mut alloc);

    let logo_ref = match logo {
        Some(logo) => embed_logo(&mut pdf, logo, &mut alloc),
        None => None,
    };

    // One ExtGState per distinct watermark alpha, shared across pages.
    let mut gs_states: HashMap<u32, (String, Ref)> = HashMap::new();
    for page in &doc.pages {
        for op in &page.ops {
            if let DrawOp::Watermark { alpha, .. } = op {
                let key = (alpha * 1000.0) as u32;
                if !gs_states.contains_key(&key) {
                    let gs_ref = alloc();
                    let name = format!("GS{}", gs_states.len() + 1);
                    pdf.ext_graphics(gs_ref)
                        .non_stroking_alpha(*alpha)
                        .stroking_alpha(*alpha);
                    gs_states.insert(key, (name, gs_ref));
                }
            }
        }
    }

    let n = doc.pages.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, page) in doc.pages.iter().enumerate() {
        let mut content = Content::new();
        for op in &page.ops {
            write_op(&mut content, op, logo_ref.is_some(), &gs_states);
        }
        let raw = content.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed)
            .filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        {
            let mut font_dict = resources.fonts();
            font_dict.pair(
                Name(FontSet::pdf_name(crate::model::FontVariant::Regular).as_bytes()),
                fonts.regular,
            );
            font_dict.pair(
                Name(FontSet::pdf_name(crate::model::FontVariant::Bold).as_bytes()),
                fonts.bold,
            );
        }
        if let Some(logo_ref) = logo_ref {
            resources.x_objects().pair(Name(LOGO_NAME), logo_ref);
        }
        if !gs_states.is_empty() {
            let mut gs_dict = resources.ext_g_states();
            for (name, gs_ref) in gs_states.values() {
                gs_dict.pair(Name(name.as_bytes()), *gs_ref);
            }
        }
    }

    Ok(pdf.finish())
}

fn set_fill(content: &mut Content, color: [u8; 3]) {
    content.set_fill_rgb(
        color[0] as f32 / 255.0,
        color[1] as f32 / 255.0,
        color[2] as f32 / 255.0,
    );
}

fn write_op(
    content: &mut Content,
    op: &DrawOp,
    has_logo: bool,
    gs_states: &HashMap<u32, (String, Ref)>,
) {
    match op {
        DrawOp::Text {
            x,
            y,
            size,
            font,
            color,
            text,
        } => {
            set_fill(content, *color);
            content
                .begin_text()
                .set_font(Name(FontSet::pdf_name(*font).as_bytes()), *size)
                .next_line(*x, *y)
                .show(Str(&to_winansi_bytes(text)))
                .end_text();
        }
        DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            width,
            color,
        } => {
            content.save_state();
            content.set_line_width(*width);
            content.set_stroke_rgb(
                color[0] as f32 / 255.0,
                color[1] as f32 / 255.0,
                color[2] as f32 / 255.0,
            );
            content.move_to(*x1, *y1);
            content.line_to(*x2, *y2);
            content.stroke();
            content.restore_state();
        }
        DrawOp::FilledRect { x, y, w, h, color } => {
            content.save_state();
            set_fill(content, *color);
            content.rect(*x, *y, *w, *h);
            content.fill_nonzero();
            content.restore_state();
        }
        DrawOp::Logo { x, y, w, h } => {
            // Reserved box only; nothing to draw without a fetched logo.
            if has_logo {
                content.save_state();
                content.transform([*w, 0.0, 0.0, *h, *x, *y]);
                content.x_object(Name(LOGO_NAME));
                content.restore_state();
            }
        }
        DrawOp::Watermark {
            x,
            y,
            size,
            angle_deg,
            alpha,
            text,
        } => {
            let key = (alpha * 1000.0) as u32;
            let (rad_cos, rad_sin) = {
                let rad = angle_deg.to_radians();
                (rad.cos(), rad.sin())
            };
            content.save_state();
            if let Some((name, _)) = gs_states.get(&key) {
                content.set_parameters(Name(name.as_bytes()));
            }
            content.transform([rad_cos, rad_sin, -rad_sin, rad_cos, *x, *y]);
            set_fill(content, [100, 116, 139]);
            content
                .begin_text()
                .set_font(
                    Name(FontSet::pdf_name(crate::model::FontVariant::Bold).as_bytes()),
                    *size,
                )
                .next_line(0.0, 0.0)
                .show(Str(&to_winansi_bytes(text)))
                .end_text();
            content.restore_state();
        }
    }
}

/// Embed the logo as an image XObject. PNG goes through a full decode so
/// transparency lands in an SMask; JPEG bytes pass straight through with
/// DctDecode. Returns None (and logs) when the bytes do not decode — the
/// document is still valid without the asset.
fn embed_logo(pdf: &mut Pdf, logo: &Logo, alloc: &mut impl FnMut() -> Ref) -> Option<Ref> {
    let xobj_ref = alloc();
    match logo.format {
        LogoFormat::Jpeg => {
            let mut xobj = pdf.image_xobject(xobj_ref, &logo.data);
            xobj.filter(Filter::DctDecode);
            xobj.width(logo.pixel_width as i32);
            xobj.height(logo.pixel_height as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            Some(xobj_ref)
        }
        LogoFormat::Png => {
            let decoded = match image::load_from_memory_with_format(
                &logo.data,
                image::ImageFormat::Png,
            ) {
                Ok(img) => img,
                Err(e) => {
                    log::warn!("logo PNG decode failed: {e} — rendering without logo");
                    return None;
                }
            };
            let rgba: image::RgbaImage = decoded.to_rgba8();
            let (w, h) = (rgba.width(), rgba.height());
            let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);

            let rgb_data: Vec<u8> = rgba
                .pixels()
                .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
                .collect();
            let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6);

            let smask_ref = if has_alpha {
                let alpha_data: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
                let compressed_alpha =
                    miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6);
                let mask_ref = alloc();
                let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(w as i32);
                mask.height(h as i32);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                Some(mask_ref)
            } else {
                None
            };

            let mut xobj = pdf.image_xobject(xobj_ref, &compressed_rgb);
            xobj.filter(Filter::FlateDecode);
            xobj.width(w as i32);
            xobj.height(h as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
            Some(xobj_ref)
        }
    }
}
