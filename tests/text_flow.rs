mod common;

use artifact_report::fonts::{FontMetrics, FontStyle};
use artifact_report::pdf::{Canvas, TextStyle, line_pitch, wrap_lines};
use artifact_report::{PageGeometry, ReportOptions};

const CONTENT_WIDTH: f32 = 180.0;

fn canvas() -> Canvas {
    Canvas::for_record(&ReportOptions::default(), &common::minimal_record())
}

#[test]
fn wrapped_lines_fit_the_width() {
    let metrics = FontMetrics::helvetica(FontStyle::Regular);
    let text = common::long_narrative(2000);
    let lines: Vec<String> = wrap_lines(&text, &metrics, 9.0, CONTENT_WIDTH).collect();
    assert!(lines.len() > 5);
    for line in &lines {
        let width = metrics.text_width_mm(line, 9.0);
        assert!(width <= CONTENT_WIDTH + 0.01, "{width:.2}mm: {line}");
    }
}

#[test]
fn wrapping_keeps_every_word_in_order() {
    let metrics = FontMetrics::helvetica(FontStyle::Bold);
    let text = common::long_narrative(1500);
    let rejoined = wrap_lines(&text, &metrics, 11.0, 120.0)
        .collect::<Vec<_>>()
        .join(" ");
    let original: Vec<&str> = text.split_whitespace().collect();
    let wrapped: Vec<&str> = rejoined.split_whitespace().collect();
    assert_eq!(original, wrapped);
}

#[test]
fn bold_text_wraps_earlier_than_regular() {
    let text = "Wolfgang Mühlbauer schmiedete Werkzeuge für das ganze Almtal";
    let regular = FontMetrics::helvetica(FontStyle::Regular);
    let bold = FontMetrics::helvetica(FontStyle::Bold);
    assert!(bold.text_width_mm(text, 10.0) > regular.text_width_mm(text, 10.0));
}

#[test]
fn overlong_word_is_broken_between_characters() {
    let metrics = FontMetrics::helvetica(FontStyle::Regular);
    let word = "Donaudampfschifffahrtsgesellschaftskapitänsmützenabzeichen";
    let lines: Vec<String> = wrap_lines(word, &metrics, 12.0, 30.0).collect();
    assert!(lines.len() > 1);
    assert_eq!(lines.concat(), word);
}

#[test]
fn explicit_newlines_start_new_lines() {
    let metrics = FontMetrics::helvetica(FontStyle::Regular);
    let lines: Vec<String> = wrap_lines("Erste Zeile\n\nDritte Zeile", &metrics, 10.0, 180.0).collect();
    assert_eq!(lines, ["Erste Zeile", "", "Dritte Zeile"]);
}

#[test]
fn empty_text_consumes_no_space() {
    let mut canvas = canvas();
    canvas.cursor_mut().move_to(120.0);
    for text in ["", "   ", "\n\t"] {
        assert_eq!(canvas.text(text, TextStyle::regular(10.0)), 0);
    }
    assert_eq!(canvas.cursor().y(), 120.0);
    assert!(canvas.trace().is_empty());
}

#[test]
fn block_height_and_padding_are_advanced() {
    let mut canvas = canvas();
    canvas.cursor_mut().move_to(100.0);
    let n = canvas.text("Kurzer Absatz", TextStyle::regular(10.0));
    assert_eq!(n, 1);
    let expected = 100.0 + line_pitch(10.0) + 3.0;
    assert!((canvas.cursor().y() - expected).abs() < 1e-4);
}

#[test]
fn kept_block_moves_whole_to_next_page() {
    let mut canvas = canvas();
    canvas.cursor_mut().move_to(276.0);
    let text = common::long_narrative(400);
    let n = canvas.text(&text, TextStyle::regular(10.0));
    assert!(n > 1);
    let lines = common::text_lines(canvas.trace());
    assert!(lines.iter().all(|(page, _, _)| *page == 1));
    assert!((lines[0].1 - PageGeometry::A4.margin).abs() < 1e-4);
}

#[test]
fn long_narrative_splits_across_pages_without_loss() {
    common::init_logging();
    let mut canvas = canvas();
    canvas.cursor_mut().move_to(150.0);
    let narrative = common::long_narrative(5000);
    let style = TextStyle::regular(9.0).split();
    let n = canvas.text(&narrative, style);

    let metrics = FontMetrics::helvetica(FontStyle::Regular);
    let expected: Vec<String> = wrap_lines(&narrative, &metrics, 9.0, CONTENT_WIDTH).collect();
    let drawn = common::text_lines(canvas.trace());
    assert_eq!(n, expected.len());

    let drawn_text: Vec<String> = drawn.iter().map(|(_, _, t)| t.clone()).collect();
    assert_eq!(drawn_text, expected);

    let last_page = drawn.last().map(|(p, _, _)| *p).unwrap_or(0);
    assert!(last_page >= 1, "5000 characters at 9pt should break the page");
    assert!(drawn.iter().any(|(p, _, _)| *p == 0));

    let pitch = line_pitch(9.0);
    for (_, top, text) in &drawn {
        assert!(
            top + pitch <= PageGeometry::A4.bottom() + 1e-3,
            "line below bottom margin at {top}: {text}"
        );
    }
}

#[test]
fn lines_on_a_page_are_evenly_spaced() {
    let mut canvas = canvas();
    canvas.cursor_mut().move_to(200.0);
    canvas.text(&common::long_narrative(3000), TextStyle::regular(9.0).split());
    let drawn = common::text_lines(canvas.trace());
    let pitch = line_pitch(9.0);
    for pair in drawn.windows(2) {
        let ((p0, y0, _), (p1, y1, _)) = (&pair[0], &pair[1]);
        if p0 == p1 {
            assert!((y1 - y0 - pitch).abs() < 1e-3);
        } else {
            assert_eq!(*p1, p0 + 1);
            assert!((y1 - PageGeometry::A4.margin).abs() < 1e-4);
        }
    }
}
