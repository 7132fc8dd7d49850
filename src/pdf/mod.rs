mod canvas;
mod cursor;
mod images;
mod layout;
mod sections;

use std::collections::HashSet;
use std::time::Instant;

use crate::config::ReportOptions;
use crate::error::Error;
use crate::fonts::FontStyle;
use crate::model::AnalysisRecord;

pub use canvas::{Canvas, LayoutTrace, Placed};
pub use cursor::LayoutCursor;
pub use images::{DecodedImage, ImageBox, decode_all, fit_image, grid_position, place_images};
pub use layout::{Flow, LINE_HEIGHT_FACTOR, TextStyle, WrappedLines, line_pitch, wrap_lines};
pub use sections::{ScoreTier, Section, bar_fill_width, render_section, render_sections};

/// Photos beyond this count are ignored.
pub const MAX_IMAGES: usize = 4;

const HEADER_BAND_HEIGHT: f32 = 40.0;
const HEADER_BAND_COLOR: [u8; 3] = [45, 45, 45];
const CONTENT_TOP: f32 = 50.0;
const FOOTER_OFFSET: f32 = 10.0;
const FOOTER_COLOR: [u8; 3] = [100, 100, 100];

/// A finished report: PDF bytes plus the layout that produced them.
#[derive(Debug)]
pub struct Report {
    /// Base name without extension, e.g. `Messing_Hammer__3_Analyse`.
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub layout: LayoutTrace,
}

/// Replace every character outside `[A-Za-z0-9]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

pub fn report_file_name(artifact_name: &str) -> String {
    format!("{}_Analyse", sanitize_file_name(artifact_name))
}

/// Every character the report may draw: record text, fixed labels and the
/// Latin-1 range they are written in.
pub(crate) fn used_chars(record: &AnalysisRecord, options: &ReportOptions) -> HashSet<char> {
    let mut chars: HashSet<char> = (' '..='~').chain('\u{A0}'..='\u{FF}').collect();
    chars.extend(['•', '„', '“', '”', '–']);
    for text in record
        .texts()
        .into_iter()
        .chain([options.title.as_str(), options.footer.as_str()])
    {
        chars.extend(text.chars().filter(|c| !c.is_control()));
    }
    chars
}

fn document_header(canvas: &mut Canvas, title: &str, name: &str) {
    let geometry = canvas.cursor().geometry();
    canvas.fill_rect(0.0, 0.0, geometry.width, HEADER_BAND_HEIGHT, HEADER_BAND_COLOR);
    canvas.text_at(geometry.margin, 20.0, title, FontStyle::Bold, 24.0, [255, 255, 255]);
    canvas.text_at(geometry.margin, 30.0, name, FontStyle::Regular, 12.0, [255, 255, 255]);
    canvas.record(Placed::DocumentHeader {
        title: title.to_string(),
        name: name.to_string(),
    });
    canvas.cursor_mut().move_to(CONTENT_TOP);
}

/// Credit line at a fixed position near the bottom of the last page.
fn footer(canvas: &mut Canvas, text: &str) {
    let geometry = canvas.cursor().geometry();
    canvas.text_at(
        geometry.margin,
        geometry.height - FOOTER_OFFSET,
        text,
        FontStyle::Italic,
        8.0,
        FOOTER_COLOR,
    );
    let page = canvas.cursor().page_index();
    canvas.record(Placed::Footer {
        page,
        text: text.to_string(),
    });
}

pub fn render(
    record: &AnalysisRecord,
    images: &[Vec<u8>],
    options: &ReportOptions,
) -> Result<Report, Error> {
    let t0 = Instant::now();

    if images.len() > MAX_IMAGES {
        log::warn!(
            "{} images supplied, using the first {MAX_IMAGES}",
            images.len()
        );
    }
    let decoded = decode_all(&images[..images.len().min(MAX_IMAGES)]);
    let t_decode = t0.elapsed();

    let mut canvas = Canvas::new(options, &used_chars(record, options));
    let t_fonts = t0.elapsed();

    document_header(&mut canvas, &options.title, &record.identity.name);
    place_images(&mut canvas, &decoded);
    let sections = render_sections(&mut canvas, record);
    footer(&mut canvas, &options.footer);
    let t_layout = t0.elapsed();

    let title = format!("{} - {}", options.title, record.identity.name);
    let (bytes, layout) = canvas.finish(&title)?;
    let t_total = t0.elapsed();

    log::info!(
        "Render: decode={:.1}ms, fonts={:.1}ms, layout={:.1}ms, assemble={:.1}ms, total={:.1}ms ({} sections, {} pages)",
        t_decode.as_secs_f64() * 1000.0,
        (t_fonts - t_decode).as_secs_f64() * 1000.0,
        (t_layout - t_fonts).as_secs_f64() * 1000.0,
        (t_total - t_layout).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        sections,
        layout.pages,
    );

    Ok(Report {
        file_name: report_file_name(&record.identity.name),
        bytes,
        layout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_replaces_non_alphanumerics() {
        assert_eq!(
            report_file_name("Messing-Hammer #3"),
            "Messing_Hammer__3_Analyse"
        );
        assert_eq!(sanitize_file_name("Bügeleisen"), "B_geleisen");
    }

    #[test]
    fn sanitizing_twice_changes_nothing() {
        for name in ["Messing-Hammer #3", "Öllampe (um 1900)", "", "plain"] {
            let once = sanitize_file_name(name);
            assert_eq!(sanitize_file_name(&once), once);
        }
    }
}
