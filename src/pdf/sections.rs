use std::borrow::Cow;

use crate::fonts::FontStyle;
use crate::model::{AnalysisRecord, format_number, has_text};

use super::canvas::{Canvas, Placed};
use super::layout::TextStyle;

const BAND_HEIGHT: f32 = 10.0;
const BAND_ADVANCE: f32 = 15.0;
const TITLE_SIZE: f32 = 14.0;
const SECTION_GAP: f32 = 5.0;
const WHITE: [u8; 3] = [255, 255, 255];

const BAR_ROW_PITCH: f32 = 8.0;
const BAR_LABEL_WIDTH: f32 = 40.0;
const BAR_HEIGHT: f32 = 4.0;
const BAR_TRACK_COLOR: [u8; 3] = [200, 200, 200];

/// The report's sections, in document order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Section {
    Identity,
    Deductions,
    DetailHighlights,
    RarityScores,
    ModernComparison,
    SocialEconomicContext,
    VisualAnalysis,
    Timeline,
    Evolution,
    Narrative,
    LongNarrative,
    Summary,
}

struct SectionSpec {
    section: Section,
    band_color: [u8; 3],
    /// Extra height reserved with the band so it never sits alone at a page bottom.
    keep_with_next: f32,
    is_present: fn(&AnalysisRecord) -> bool,
    body: fn(&mut Canvas, &AnalysisRecord),
}

static SECTIONS: [SectionSpec; 12] = [
    SectionSpec {
        section: Section::Identity,
        band_color: [212, 175, 55],
        keep_with_next: 30.0,
        is_present: always,
        body: identity_body,
    },
    SectionSpec {
        section: Section::Deductions,
        band_color: [180, 120, 20],
        keep_with_next: 20.0,
        is_present: |r| non_empty(&r.story.deductions),
        body: deductions_body,
    },
    SectionSpec {
        section: Section::DetailHighlights,
        band_color: [212, 175, 55],
        keep_with_next: 20.0,
        is_present: |r| non_empty(&r.story.detail_highlights),
        body: highlights_body,
    },
    SectionSpec {
        section: Section::RarityScores,
        band_color: [212, 175, 55],
        keep_with_next: 40.0,
        is_present: |r| r.rarity_scores.is_some(),
        body: rarity_body,
    },
    SectionSpec {
        section: Section::ModernComparison,
        band_color: [128, 90, 150],
        keep_with_next: 30.0,
        is_present: |r| r.modern_comparison.is_some(),
        body: comparison_body,
    },
    SectionSpec {
        section: Section::SocialEconomicContext,
        band_color: [45, 125, 115],
        keep_with_next: 40.0,
        is_present: has_context,
        body: context_body,
    },
    SectionSpec {
        section: Section::VisualAnalysis,
        band_color: [125, 70, 150],
        keep_with_next: 40.0,
        is_present: has_visual_analysis,
        body: visual_body,
    },
    SectionSpec {
        section: Section::Timeline,
        band_color: [50, 80, 150],
        keep_with_next: 40.0,
        is_present: |r| r.timeline.as_ref().is_some_and(|t| !t.is_empty()),
        body: timeline_body,
    },
    SectionSpec {
        section: Section::Evolution,
        band_color: [80, 80, 80],
        keep_with_next: 30.0,
        is_present: always,
        body: evolution_body,
    },
    SectionSpec {
        section: Section::Narrative,
        band_color: [100, 60, 120],
        keep_with_next: 40.0,
        is_present: always,
        body: narrative_body,
    },
    SectionSpec {
        section: Section::LongNarrative,
        band_color: [80, 40, 100],
        keep_with_next: 40.0,
        is_present: |r| has_text(&r.story.long_narrative),
        body: long_narrative_body,
    },
    SectionSpec {
        section: Section::Summary,
        band_color: [160, 130, 40],
        keep_with_next: 10.0,
        is_present: |r| has_text(&r.story.summary),
        body: summary_body,
    },
];

impl Section {
    pub const ORDER: [Section; 12] = [
        Section::Identity,
        Section::Deductions,
        Section::DetailHighlights,
        Section::RarityScores,
        Section::ModernComparison,
        Section::SocialEconomicContext,
        Section::VisualAnalysis,
        Section::Timeline,
        Section::Evolution,
        Section::Narrative,
        Section::LongNarrative,
        Section::Summary,
    ];

    fn spec(self) -> &'static SectionSpec {
        &SECTIONS[self as usize]
    }

    pub fn is_present(self, record: &AnalysisRecord) -> bool {
        (self.spec().is_present)(record)
    }

    pub fn title(self, record: &AnalysisRecord) -> Cow<'static, str> {
        match self {
            Section::Identity => "Identität".into(),
            Section::Deductions => "Die Deduktion".into(),
            Section::DetailHighlights => "Besondere Details".into(),
            Section::RarityScores => "Bewertung".into(),
            Section::ModernComparison => {
                let name = record
                    .modern_comparison
                    .as_ref()
                    .map(|m| m.modern_name.as_str())
                    .unwrap_or_default();
                format!("Damals vs. Heute: {name}").into()
            }
            Section::SocialEconomicContext => "Soziale & Wirtschaftliche Dimension".into(),
            Section::VisualAnalysis => "Bildanalyse & Kontext".into(),
            Section::Timeline => "Zeitreise".into(),
            Section::Evolution => "Wandel der Zeit".into(),
            Section::Narrative => "Meine Geschichte (Ich-Perspektive)".into(),
            Section::LongNarrative => "Zeitgeschichte (Historische Erzählung)".into(),
            Section::Summary => "Fazit".into(),
        }
    }
}

fn always(_: &AnalysisRecord) -> bool {
    true
}

fn non_empty(list: &Option<Vec<String>>) -> bool {
    list.as_ref()
        .is_some_and(|l| l.iter().any(|s| !s.trim().is_empty()))
}

fn has_context(r: &AnalysisRecord) -> bool {
    let social = r
        .social_context
        .as_ref()
        .is_some_and(|s| has_text(&s.gender_role) || has_text(&s.social_class));
    let economic = r
        .economic_context
        .as_ref()
        .is_some_and(|e| has_text(&e.historical_price) || has_text(&e.modern_equivalent));
    social || economic
}

fn has_visual_analysis(r: &AnalysisRecord) -> bool {
    r.visual_analysis.as_ref().is_some_and(|v| {
        has_text(&v.composition)
            || has_text(&v.clothing)
            || has_text(&v.background)
            || has_text(&v.representation_change)
            || v.invisible_context.as_ref().is_some_and(|ic| {
                has_text(&ic.missing) || has_text(&ic.creator) || has_text(&ic.purpose)
            })
    })
}

/// Draw `section` at the cursor if the record has content for it.
/// Returns false (and draws nothing) when the section is absent.
pub fn render_section(canvas: &mut Canvas, section: Section, record: &AnalysisRecord) -> bool {
    let spec = section.spec();
    if !(spec.is_present)(record) {
        log::debug!("section {section:?}: absent");
        return false;
    }
    let title = section.title(record);
    header_band(canvas, spec, &title);
    (spec.body)(canvas, record);
    canvas.advance(SECTION_GAP);
    true
}

pub fn render_sections(canvas: &mut Canvas, record: &AnalysisRecord) -> usize {
    let mut rendered = 0;
    for section in Section::ORDER {
        if render_section(canvas, section, record) {
            rendered += 1;
        }
    }
    rendered
}

fn header_band(canvas: &mut Canvas, spec: &SectionSpec, title: &str) {
    canvas.reserve(BAND_HEIGHT + spec.keep_with_next);
    let geometry = canvas.cursor().geometry();
    let top = canvas.cursor().y();
    canvas.fill_rect(
        geometry.margin,
        top,
        geometry.content_width(),
        BAND_HEIGHT,
        spec.band_color,
    );
    canvas.text_at(
        geometry.margin + 3.0,
        top + 7.0,
        title,
        FontStyle::Bold,
        TITLE_SIZE,
        WHITE,
    );
    let page = canvas.cursor().page_index();
    canvas.record(Placed::SectionHeader {
        section: spec.section,
        title: title.to_string(),
        page,
        top,
    });
    canvas.advance(BAND_ADVANCE);
}

/// `"{icon} {text}"` when the active font can draw the icon, else `text`.
fn with_icon(canvas: &Canvas, icon: &str, text: &str, font: FontStyle) -> String {
    let icon = icon.trim();
    if !icon.is_empty() && canvas.fonts().get(font).metrics.can_encode(icon) {
        format!("{icon} {text}")
    } else {
        text.to_string()
    }
}

fn labelled(canvas: &mut Canvas, label: &str, value: &Option<String>, value_style: TextStyle) {
    if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
        canvas.text(label, TextStyle::bold(10.0).padding(1.0));
        canvas.text(value, value_style);
    }
}

fn identity_body(canvas: &mut Canvas, r: &AnalysisRecord) {
    let id = &r.identity;
    canvas.text(&format!("Name: {}", id.name), TextStyle::bold(11.0));
    canvas.text(&format!("Kategorie: {}", id.category), TextStyle::regular(10.0));
    canvas.text(&format!("Zeitraum: {}", id.time_period), TextStyle::regular(10.0));
    canvas.text(&format!("Datierung: {}", id.creation_date), TextStyle::regular(10.0));
    canvas.text(
        &format!("Ursprünglicher Zweck: {}", id.original_purpose),
        TextStyle::regular(10.0),
    );
}

fn numbered(canvas: &mut Canvas, items: &[String], style: TextStyle) {
    for (i, item) in items.iter().filter(|s| !s.trim().is_empty()).enumerate() {
        canvas.text(&format!("{}. {}", i + 1, item.trim()), style);
    }
}

fn bulleted(canvas: &mut Canvas, items: &[String], style: TextStyle) {
    for item in items.iter().filter(|s| !s.trim().is_empty()) {
        canvas.text(&format!("• {}", item.trim()), style);
    }
}

fn deductions_body(canvas: &mut Canvas, r: &AnalysisRecord) {
    numbered(
        canvas,
        r.story.deductions.as_deref().unwrap_or_default(),
        TextStyle::regular(9.0),
    );
}

fn highlights_body(canvas: &mut Canvas, r: &AnalysisRecord) {
    bulleted(
        canvas,
        r.story.detail_highlights.as_deref().unwrap_or_default(),
        TextStyle::regular(9.0),
    );
}

/// Score bar colour band.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreTier {
    Warning,
    Caution,
    Success,
}

impl ScoreTier {
    pub fn for_value(value: f64) -> ScoreTier {
        if value >= 8.0 {
            ScoreTier::Success
        } else if value >= 5.0 {
            ScoreTier::Caution
        } else {
            ScoreTier::Warning
        }
    }

    pub fn color(self) -> [u8; 3] {
        match self {
            ScoreTier::Warning => [200, 60, 50],
            ScoreTier::Caution => [230, 160, 30],
            ScoreTier::Success => [60, 150, 70],
        }
    }
}

/// Filled part of a bar track for a 0–10 score. Out-of-range scores are
/// drawn as an empty or full bar.
pub fn bar_fill_width(track_width: f32, value: f64) -> f32 {
    let fraction = (value / 10.0).clamp(0.0, 1.0) as f32;
    track_width * fraction
}

fn score_bar(canvas: &mut Canvas, label: &str, value: f64) {
    canvas.reserve(BAR_ROW_PITCH);
    let geometry = canvas.cursor().geometry();
    let top = canvas.cursor().y();
    let text = format!("{label}: {}/10", format_number(value));
    canvas.text_at(geometry.margin, top + 4.0, &text, FontStyle::Bold, 10.0, [0, 0, 0]);

    let track_x = geometry.margin + BAR_LABEL_WIDTH;
    let track_width = geometry.content_width() - BAR_LABEL_WIDTH;
    let fill_width = bar_fill_width(track_width, value);
    let tier = ScoreTier::for_value(value);
    let bar_top = top + 1.0;
    if fill_width > 0.0 {
        canvas.fill_rect(track_x, bar_top, fill_width, BAR_HEIGHT, tier.color());
    }
    canvas.stroke_rect(track_x, bar_top, track_width, BAR_HEIGHT, BAR_TRACK_COLOR);

    let page = canvas.cursor().page_index();
    canvas.record(Placed::ScoreBar {
        label: label.to_string(),
        value,
        page,
        top,
        track_width,
        fill_width,
        tier,
    });
    canvas.advance(BAR_ROW_PITCH);
}

fn rarity_body(canvas: &mut Canvas, r: &AnalysisRecord) {
    let Some(scores) = r.rarity_scores else {
        return;
    };
    score_bar(canvas, "Seltenheit", scores.rarity);
    score_bar(canvas, "Erhaltung", scores.condition);
    score_bar(canvas, "Historischer Wert", scores.historical_value);
    canvas.text(
        &format!("Gesamtwert: {}/10", one_decimal(scores.overall)),
        TextStyle::bold(12.0),
    );
}

/// One decimal place, with ties rounded away from zero (`8.25` → `8.3`).
fn one_decimal(value: f64) -> String {
    format!("{:.1}", (value * 10.0).round() / 10.0)
}

fn comparison_body(canvas: &mut Canvas, r: &AnalysisRecord) {
    let Some(mc) = &r.modern_comparison else {
        return;
    };
    for c in &mc.comparisons {
        let heading = with_icon(canvas, &c.icon, &c.category, FontStyle::Bold);
        let heading_style = TextStyle::bold(10.0).padding(1.0);
        let detail = TextStyle::regular(10.0).indent(5.0).padding(1.0);
        let historical = format!("Historisch: {}", c.historical);
        let height =
            canvas.text_height(&heading, &heading_style) + canvas.text_height(&historical, &detail);
        canvas.keep_together(height);
        canvas.text(&heading, heading_style);
        canvas.text(&historical, detail);
        canvas.text(&format!("Modern: {}", c.modern), detail.padding(3.0));
    }
}

fn context_body(canvas: &mut Canvas, r: &AnalysisRecord) {
    let value = TextStyle::regular(10.0).indent(5.0);
    if let Some(sc) = &r.social_context {
        labelled(canvas, "Geschlechterrollen:", &sc.gender_role, value);
        labelled(canvas, "Soziale Schicht:", &sc.social_class, value);
    }
    if let Some(ec) = &r.economic_context {
        labelled(canvas, "Damaliger Preis:", &ec.historical_price, value);
        labelled(canvas, "Heutige Kaufkraft:", &ec.modern_equivalent, value);
    }
}

fn visual_body(canvas: &mut Canvas, r: &AnalysisRecord) {
    let Some(va) = &r.visual_analysis else {
        return;
    };
    let value = TextStyle::regular(9.0);
    labelled(canvas, "Komposition & Technik:", &va.composition, value);
    labelled(canvas, "Kleidung & Status:", &va.clothing, value);
    labelled(canvas, "Hintergrund & Umgebung:", &va.background, value);

    if let Some(ic) = &va.invisible_context {
        let lines: Vec<String> = [
            ("Was fehlt?", &ic.missing),
            ("Fotograf/Maler:", &ic.creator),
            ("Zweck:", &ic.purpose),
        ]
        .into_iter()
        .filter(|(_, v)| has_text(v))
        .map(|(label, v)| format!("{label} {}", v.as_deref().unwrap_or_default()))
        .collect();
        if !lines.is_empty() {
            canvas.text("Der unsichtbare Kontext:", TextStyle::bold(10.0).padding(1.0));
            for line in &lines {
                canvas.text(line, value);
            }
        }
    }

    labelled(canvas, "Darstellungswandel:", &va.representation_change, value);
}

fn timeline_body(canvas: &mut Canvas, r: &AnalysisRecord) {
    for m in r.timeline.iter().flatten() {
        let heading = with_icon(
            canvas,
            &m.icon,
            &format!("{} - {}", m.year, m.label),
            FontStyle::Bold,
        );
        let heading_style = TextStyle::bold(11.0).padding(1.0);
        let description = TextStyle::regular(9.0).indent(5.0);
        let height = canvas.text_height(&heading, &heading_style)
            + canvas.text_height(&m.description, &description);
        canvas.keep_together(height);
        canvas.text(&heading, heading_style);
        canvas.text(&m.description, description);
    }
}

fn evolution_body(canvas: &mut Canvas, r: &AnalysisRecord) {
    let ev = &r.evolution;
    canvas.text(
        &format!("Status heute: {}", ev.modern_status.label()),
        TextStyle::bold(10.0),
    );
    if let Some(replaced_by) = ev.replaced_by.as_deref().filter(|s| !s.trim().is_empty()) {
        canvas.text(
            &format!("Ersetzt durch: {replaced_by}"),
            TextStyle::regular(10.0),
        );
    }
    if ev.historical_changes.iter().any(|c| !c.trim().is_empty()) {
        canvas.text("Historische Entwicklung:", TextStyle::bold(10.0));
        numbered(canvas, &ev.historical_changes, TextStyle::regular(9.0));
    }
    if !ev.cultural_significance.trim().is_empty() {
        canvas.text(
            &format!("Kulturelle Bedeutung: {}", ev.cultural_significance),
            TextStyle::regular(10.0),
        );
    }
}

fn narrative_body(canvas: &mut Canvas, r: &AnalysisRecord) {
    let story = &r.story;
    if !story.title.trim().is_empty() {
        canvas.text(
            &format!("\"{}\"", story.title.trim()),
            TextStyle::italic(12.0).padding(5.0),
        );
    }
    canvas.text(&story.narrative, TextStyle::regular(9.0).split().padding(5.0));

    if story.key_moments.iter().any(|m| !m.trim().is_empty()) {
        canvas.text("Schlüsselmomente:", TextStyle::bold(10.0).padding(1.0));
        bulleted(canvas, &story.key_moments, TextStyle::regular(9.0).indent(5.0));
    }
}

fn long_narrative_body(canvas: &mut Canvas, r: &AnalysisRecord) {
    if let Some(text) = &r.story.long_narrative {
        canvas.text(text, TextStyle::regular(9.0).split().padding(5.0));
    }
}

fn summary_body(canvas: &mut Canvas, r: &AnalysisRecord) {
    if let Some(text) = &r.story.summary {
        canvas.text(text, TextStyle::italic(9.0).indent(2.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_follows_document_order() {
        for (i, section) in Section::ORDER.iter().enumerate() {
            assert_eq!(SECTIONS[i].section, *section);
        }
    }

    #[test]
    fn tiers_have_three_bands() {
        assert_eq!(ScoreTier::for_value(0.0), ScoreTier::Warning);
        assert_eq!(ScoreTier::for_value(4.9), ScoreTier::Warning);
        assert_eq!(ScoreTier::for_value(5.0), ScoreTier::Caution);
        assert_eq!(ScoreTier::for_value(7.9), ScoreTier::Caution);
        assert_eq!(ScoreTier::for_value(8.0), ScoreTier::Success);
        assert_eq!(ScoreTier::for_value(10.0), ScoreTier::Success);
    }

    #[test]
    fn one_decimal_rounds_ties_up() {
        assert_eq!(one_decimal(8.25), "8.3");
        assert_eq!(one_decimal(7.25), "7.3");
        assert_eq!(one_decimal(8.0), "8.0");
        assert_eq!(one_decimal(8.24), "8.2");
    }

    #[test]
    fn bar_width_is_proportional_to_score() {
        assert_eq!(bar_fill_width(140.0, 0.0), 0.0);
        assert_eq!(bar_fill_width(140.0, 5.0), 70.0);
        assert_eq!(bar_fill_width(140.0, 10.0), 140.0);
        let mut last = 0.0;
        for step in 0..=100 {
            let w = bar_fill_width(140.0, step as f64 / 10.0);
            assert!(w >= last);
            last = w;
        }
    }
}
