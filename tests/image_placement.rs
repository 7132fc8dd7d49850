mod common;

use artifact_report::pdf::{ImageBox, Placed, Section, fit_image};
use artifact_report::{PageGeometry, ReportOptions, generate_report};

fn placed_images(items: &[Placed]) -> Vec<(usize, usize, f32, f32, f32, f32)> {
    items
        .iter()
        .filter_map(|p| match p {
            Placed::Image {
                index,
                page,
                x,
                y,
                width,
                height,
            } => Some((*index, *page, *x, *y, *width, *height)),
            _ => None,
        })
        .collect()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[test]
fn fitted_images_keep_aspect_ratio_and_height_limit() {
    let bx = ImageBox::for_page(&PageGeometry::A4);
    let sizes = [
        (4000, 3000),
        (3000, 4000),
        (1, 1),
        (5000, 200),
        (200, 5000),
        (1920, 1080),
        (1080, 1920),
        (640, 641),
        (641, 640),
    ];
    for (w, h) in sizes {
        let (fw, fh) = fit_image(w, h, &bx);
        let ratio = w as f32 / h as f32;
        assert!((fw / fh - ratio).abs() < 1e-3 * ratio.max(1.0), "{w}×{h}");
        assert!(fh <= bx.max_height + 1e-4, "{w}×{h} height {fh}");
        assert!(fw <= bx.max_width + 1e-4, "{w}×{h} width {fw}");
        if ratio < 1.0 {
            assert!(fw <= bx.max_portrait_width + 1e-4, "{w}×{h} portrait width {fw}");
        }
    }
}

#[test]
fn landscape_and_portrait_photos_share_a_row() {
    common::init_logging();
    let images = vec![common::png(400, 300), common::jpeg(300, 400)];
    let report = generate_report(&common::minimal_record(), &images, &ReportOptions::default())
        .expect("report renders");

    let placed = placed_images(&report.layout.items);
    assert_eq!(placed.len(), 2);

    let (index, page, x, y, w, h) = placed[0];
    assert_eq!((index, page), (0, 0));
    assert_eq!((x, y), (15.0, 50.0));
    assert!((h - 40.0).abs() < 1e-4);
    assert!((w / h - 4.0 / 3.0).abs() < 1e-4);
    assert!(w <= 85.0);

    let (index, page, x, y, w, h) = placed[1];
    assert_eq!((index, page), (1, 0));
    assert_eq!((x, y), (110.0, 50.0));
    assert!(w <= 30.0);
    assert!(h <= 40.0);
    assert!((w / h - 0.75).abs() < 1e-4);
}

#[test]
fn four_images_fill_two_rows() {
    let images: Vec<Vec<u8>> = (0..4).map(|_| common::png(64, 48)).collect();
    let report = generate_report(&common::minimal_record(), &images, &ReportOptions::default())
        .expect("report renders");
    let placed = placed_images(&report.layout.items);
    let cells: Vec<(usize, f32, f32)> = placed.iter().map(|p| (p.0, p.2, p.3)).collect();
    assert_eq!(
        cells,
        [(0, 15.0, 50.0), (1, 110.0, 50.0), (2, 15.0, 95.0), (3, 110.0, 95.0)]
    );

    // Two rows of 45 mm plus 10 mm gap before the first section band.
    let first_header = report.layout.items.iter().find_map(|p| match p {
        Placed::SectionHeader { top, .. } => Some(*top),
        _ => None,
    });
    assert_eq!(first_header, Some(150.0));
}

#[test]
fn extra_images_are_ignored() {
    let images: Vec<Vec<u8>> = (0..6).map(|_| common::png(32, 32)).collect();
    let report = generate_report(&common::minimal_record(), &images, &ReportOptions::default())
        .expect("report renders");
    let indices: Vec<usize> = placed_images(&report.layout.items)
        .iter()
        .map(|p| p.0)
        .collect();
    assert_eq!(indices, [0, 1, 2, 3]);
}

#[test]
fn corrupt_image_is_skipped_and_keeps_its_cell() {
    common::init_logging();
    let images = vec![b"definitely not an image".to_vec(), common::png(200, 100)];
    let report = generate_report(&common::minimal_record(), &images, &ReportOptions::default())
        .expect("corrupt image must not fail the report");

    let placed = placed_images(&report.layout.items);
    assert_eq!(placed.len(), 1);
    let (index, _, x, _, _, _) = placed[0];
    assert_eq!(index, 1);
    assert_eq!(x, 110.0);
    assert_eq!(
        report.layout.section_headers(),
        [Section::Identity, Section::Evolution, Section::Narrative]
    );
}

#[test]
fn no_decodable_images_leaves_no_gap() {
    let images = vec![vec![0u8; 16], b"\x89PNG\r\n\x1a\nbroken".to_vec()];
    let report = generate_report(&common::minimal_record(), &images, &ReportOptions::default())
        .expect("report renders");
    assert!(placed_images(&report.layout.items).is_empty());
    let first_header = report.layout.items.iter().find_map(|p| match p {
        Placed::SectionHeader { top, .. } => Some(*top),
        _ => None,
    });
    assert_eq!(first_header, Some(50.0));
}

#[test]
fn jpeg_is_embedded_without_reencoding() {
    let report = generate_report(
        &common::minimal_record(),
        &[common::jpeg(120, 80)],
        &ReportOptions::default(),
    )
    .expect("report renders");
    assert!(contains(&report.bytes, b"/DCTDecode"));
    assert!(!contains(&report.bytes, b"/SMask"));
}

#[test]
fn translucent_png_gets_a_soft_mask() {
    let report = generate_report(
        &common::minimal_record(),
        &[common::translucent_png(40, 40)],
        &ReportOptions::default(),
    )
    .expect("report renders");
    assert!(contains(&report.bytes, b"/SMask"));
    assert!(!contains(&report.bytes, b"/DCTDecode"));
}
