mod common;

use std::io::Cursor;

use proposal_pdf::finance;
use proposal_pdf::model::RenderedDocument;
use proposal_pdf::pdf;
use proposal_pdf::{Logo, LogoFormat};

fn sample_bytes(id: i64, logo: Option<&Logo>) -> Vec<u8> {
    let screens = (1..=5)
        .map(|i| common::screen(i, "São Paulo", "SP", 1000.0))
        .collect();
    let snap = proposal_pdf::snapshot::build(common::record(id, screens));
    let metrics = finance::compute(&snap);
    let doc = pdf::render(&snap, &metrics);
    pdf::encode(&doc, logo).unwrap()
}

fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| w == &needle).count()
}

#[test]
fn output_is_a_pdf() {
    let bytes = sample_bytes(1, None);
    assert!(bytes.starts_with(b"%PDF-"));
    assert!(bytes.ends_with(b"%%EOF\n") || bytes.ends_with(b"%%EOF"));
}

#[test]
fn one_page_object_per_rendered_page() {
    let screens = (1..=5)
        .map(|i| common::screen(i, "São Paulo", "SP", 1000.0))
        .collect();
    let snap = proposal_pdf::snapshot::build(common::record(2, screens));
    let metrics = finance::compute(&snap);
    let doc = pdf::render(&snap, &metrics);
    let bytes = pdf::encode(&doc, None).unwrap();

    assert_eq!(count_occurrences(&bytes, b"/MediaBox"), doc.page_count());
}

#[test]
fn empty_document_is_rejected() {
    let doc = RenderedDocument { pages: vec![] };
    assert!(pdf::encode(&doc, None).is_err());
}

#[test]
fn base_fonts_are_registered() {
    let bytes = sample_bytes(3, None);
    assert!(count_occurrences(&bytes, b"/Helvetica-Bold") >= 1);
    assert!(count_occurrences(&bytes, b"/Helvetica") >= 1);
    assert!(count_occurrences(&bytes, b"/WinAnsiEncoding") >= 1);
}

#[test]
fn png_logo_is_embedded_once() {
    let mut png = Vec::new();
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([234, 88, 12, 255]));
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

    let logo = Logo {
        data: png,
        format: LogoFormat::Png,
        pixel_width: 4,
        pixel_height: 4,
    };
    let bytes = sample_bytes(4, Some(&logo));

    assert!(bytes.starts_with(b"%PDF-"));
    // A single image XObject, referenced from every page's resources.
    assert_eq!(count_occurrences(&bytes, b"/Image"), 1);
}

#[test]
fn garbage_logo_bytes_do_not_abort_encoding() {
    let logo = Logo {
        data: vec![0xDE, 0xAD, 0xBE, 0xEF],
        format: LogoFormat::Png,
        pixel_width: 4,
        pixel_height: 4,
    };
    let bytes = sample_bytes(5, Some(&logo));
    assert!(bytes.starts_with(b"%PDF-"));
}
