#![allow(dead_code)]

use std::io::Cursor;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use artifact_report::model::AnalysisRecord;
use artifact_report::pdf::Placed;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Only identity, evolution and narrative: every optional section absent.
pub const MINIMAL_JSON: &str = r#"{
  "identity": {
    "name": "Messing-Hammer #3",
    "category": "Werkzeug",
    "timePeriod": "Spätes 19. Jahrhundert",
    "creationDate": "um 1880",
    "originalPurpose": "Treiben von Blech in der Dorfschmiede"
  },
  "evolution": {
    "historicalChanges": [],
    "modernStatus": "verdrängt",
    "culturalSignificance": "Zeugnis des ländlichen Handwerks"
  },
  "story": {
    "title": "Der Klang der Schmiede",
    "narrative": "Ich lag jahrzehntelang in der Hand des Schmieds und formte Kessel, Beschläge und Pflugscharen."
  }
}"#;

/// Every section populated.
pub const FULL_JSON: &str = r#"{
  "identity": {
    "name": "Kaffeemühle",
    "category": "Haushaltsgerät",
    "timePeriod": "1900-1920",
    "creationDate": "ca. 1910",
    "originalPurpose": "Mahlen von Kaffeebohnen"
  },
  "evolution": {
    "historicalChanges": ["Handkurbel aus Gusseisen", "Holzgehäuse mit Schublade"],
    "modernStatus": "vergessen",
    "replacedBy": "Elektrische Kaffeemühle",
    "culturalSignificance": "Symbol bürgerlicher Gastlichkeit"
  },
  "story": {
    "title": "Das Mahlwerk",
    "narrative": "Jeden Morgen drehte die Großmutter meine Kurbel.",
    "longNarrative": "Im Jahr 1910 kam ich aus einer Fabrik in Thüringen nach Vorchdorf.",
    "keyMoments": ["Ankunft im Haushalt", "Letzte Benutzung 1965"],
    "deductions": ["Abnutzung an der Kurbel deutet auf tägliche Nutzung", "Stempel auf dem Boden"],
    "detailHighlights": ["Messingbeschlag", "Handgeschnitzte Schublade"],
    "summary": "Ein Alltagsgegenstand, der eine ganze Epoche erzählt."
  },
  "timeline": [
    {"year": 1910, "label": "Herstellung", "description": "Gefertigt in Thüringen.", "icon": "⚙️"},
    {"year": "um 1965", "label": "Ruhestand", "description": "Ersetzt durch ein elektrisches Gerät.", "icon": ""}
  ],
  "rarityScores": {"rarity": 8, "condition": 9, "historicalValue": 7, "overall": 8.0},
  "modernComparison": {
    "modernName": "Espressomaschine",
    "comparisons": [
      {"category": "Bedienung", "historical": "Handkurbel", "modern": "Knopfdruck", "icon": "☕"}
    ]
  },
  "socialContext": {"genderRole": "Von Frauen bedient", "socialClass": "Bürgerliche Haushalte"},
  "economicContext": {"historicalPrice": "3 Mark", "modernEquivalent": "etwa 25 Euro"},
  "visualAnalysis": {
    "composition": "Frontale Aufnahme",
    "invisibleContext": {"missing": "Die Küche", "creator": null, "purpose": "Dokumentation"}
  },
  "needsClarification": {"question": "Gibt es eine Seriennummer?", "options": ["Ja", "Nein"]},
  "confidence": 85
}"#;

pub fn minimal_record() -> AnalysisRecord {
    AnalysisRecord::from_json(MINIMAL_JSON).expect("minimal record parses")
}

pub fn full_record() -> AnalysisRecord {
    AnalysisRecord::from_json(FULL_JSON).expect("full record parses")
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format)
        .expect("encode test image");
    buf
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([180, 140, 60]));
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Png)
}

/// PNG whose left half is semi-transparent.
pub fn translucent_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, _| {
        let alpha = if x < width / 2 { 128 } else { 255 };
        Rgba([40, 90, 160, alpha])
    });
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

/// Fresh, empty directory under the system temp dir.
pub fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let dir = std::env::temp_dir().join(format!("artifact-report-{name}-{nanos}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

/// `(page, top, text)` of every wrapped text line, in drawing order.
pub fn text_lines(items: &[Placed]) -> Vec<(usize, f32, String)> {
    items
        .iter()
        .filter_map(|p| match p {
            Placed::TextLine {
                page, top, text, ..
            } => Some((*page, *top, text.clone())),
            _ => None,
        })
        .collect()
}

/// A narrative of at least `min_chars` characters.
pub fn long_narrative(min_chars: usize) -> String {
    let sentences = [
        "Ich wurde in einer kleinen Werkstatt am Rande des Dorfes gefertigt.",
        "Der Schmied prüfte mein Gewicht mit der flachen Hand und nickte zufrieden.",
        "Über Jahrzehnte hörte ich das Klirren von Eisen und das Zischen des Wassers.",
        "Als die Fabriken kamen, wurde es still um mich, doch vergessen war ich nie.",
    ];
    let mut text = String::new();
    let mut i = 0;
    while text.chars().count() < min_chars {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(sentences[i % sentences.len()]);
        i += 1;
    }
    text
}
