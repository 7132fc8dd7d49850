pub mod config;
mod error;
pub mod fonts;
pub mod model;
pub mod pdf;
pub mod record;

pub use config::{PageGeometry, ReportOptions};
pub use error::Error;
pub use model::AnalysisRecord;
pub use pdf::{LayoutTrace, Placed, Report, Section, report_file_name, sanitize_file_name};
pub use record::{extract_json, parse_analysis};

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Render one analysis record and its photos into a PDF report.
///
/// Images that fail to decode are skipped; any other failure returns an
/// error and no bytes.
pub fn generate_report(
    record: &AnalysisRecord,
    images: &[Vec<u8>],
    options: &ReportOptions,
) -> Result<Report, Error> {
    pdf::render(record, images, options)
}

/// Write `report` into `dir` as `<file_name>.pdf`.
///
/// The bytes go to a `.part` file first and are renamed into place, so an
/// interrupted write never leaves a truncated report behind.
pub fn write_report(report: &Report, dir: &Path) -> Result<PathBuf, Error> {
    let t0 = Instant::now();
    let target = dir.join(format!("{}.pdf", report.file_name));
    let partial = dir.join(format!("{}.pdf.part", report.file_name));

    let written = std::fs::File::create(&partial)
        .and_then(|mut f| {
            f.write_all(&report.bytes)?;
            f.sync_all()
        })
        .and_then(|()| std::fs::rename(&partial, &target));

    if let Err(e) = written {
        let _ = std::fs::remove_file(&partial);
        return Err(Error::Io(e));
    }

    log::info!(
        "Wrote {} ({} bytes) in {:.1}ms",
        target.display(),
        report.bytes.len(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );
    Ok(target)
}

/// Parse an AI response, render it and write the report into `dir`.
pub fn render_response_to_dir(
    response: &str,
    images: &[Vec<u8>],
    options: &ReportOptions,
    dir: &Path,
) -> Result<PathBuf, Error> {
    let t0 = Instant::now();

    let record = parse_analysis(response)?;
    let t_parse = t0.elapsed();

    let report = generate_report(&record, images, options)?;
    let t_render = t0.elapsed();

    let path = write_report(&report, dir)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: parse={:.1}ms, render={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_parse.as_secs_f64() * 1000.0,
        (t_render - t_parse).as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        report.bytes.len(),
    );

    Ok(path)
}
