use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

use crate::config::PT_TO_MM;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

impl FontStyle {
    pub(crate) const ALL: [FontStyle; 3] = [FontStyle::Regular, FontStyle::Bold, FontStyle::Italic];

    fn index(self) -> usize {
        match self {
            FontStyle::Regular => 0,
            FontStyle::Bold => 1,
            FontStyle::Italic => 2,
        }
    }

    fn is_bold(self) -> bool {
        self == FontStyle::Bold
    }

    fn is_italic(self) -> bool {
        self == FontStyle::Italic
    }

    fn builtin_name(self) -> &'static [u8] {
        match self {
            FontStyle::Regular => b"Helvetica",
            FontStyle::Bold => b"Helvetica-Bold",
            FontStyle::Italic => b"Helvetica-Oblique",
        }
    }
}

/// Glyph advance widths for one face, in 1000-units per em.
pub struct FontMetrics {
    /// WinAnsi bytes 32..=255.
    widths_1000: Vec<f32>,
    char_to_gid: Option<HashMap<char, u16>>,
    char_widths_1000: Option<HashMap<char, f32>>,
}

impl FontMetrics {
    /// AFM metrics of the standard-14 Helvetica faces (Oblique shares Regular widths).
    pub fn helvetica(style: FontStyle) -> Self {
        let bold = style.is_bold();
        FontMetrics {
            widths_1000: (32u8..=255u8)
                .map(|b| builtin_width(winansi_to_char(b), bold))
                .collect(),
            char_to_gid: None,
            char_widths_1000: None,
        }
    }

    /// Width of a single character. Uses the per-char cache of an embedded face,
    /// falls back to the WinAnsi table (0 for characters WinAnsi cannot encode).
    pub fn char_width_1000(&self, ch: char) -> f32 {
        if let Some(ref map) = self.char_widths_1000
            && let Some(&w) = map.get(&ch)
        {
            return w;
        }
        match char_to_winansi(ch) {
            Some(b) if b >= 32 => self.widths_1000[(b - 32) as usize],
            _ => 0.0,
        }
    }

    /// Width in points.
    pub fn word_width(&self, word: &str, font_size: f32) -> f32 {
        word.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    pub fn space_width(&self, font_size: f32) -> f32 {
        self.char_width_1000(' ') * font_size / 1000.0
    }

    /// Width in millimetres.
    pub fn text_width_mm(&self, text: &str, font_size: f32) -> f32 {
        self.word_width(text, font_size) * PT_TO_MM
    }

    /// True when every character of `text` has a glyph in this face's encoding.
    pub fn can_encode(&self, text: &str) -> bool {
        match &self.char_to_gid {
            Some(map) => text.chars().all(|ch| map.contains_key(&ch)),
            None => text.chars().all(|ch| char_to_winansi(ch).is_some()),
        }
    }

    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

pub struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    pub metrics: FontMetrics,
}

/// Regular, bold and italic faces registered in one PDF.
pub struct FontSet {
    entries: [FontEntry; 3],
}

impl FontSet {
    pub fn get(&self, style: FontStyle) -> &FontEntry {
        &self.entries[style.index()]
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &FontEntry> {
        self.entries.iter()
    }
}

// Helvetica and Helvetica-Bold widths for ASCII 32..=126.
#[rustfmt::skip]
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Accented Latin-1 letters share the advance of their base letter.
fn base_letter(ch: char) -> Option<char> {
    Some(match ch {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    })
}

fn builtin_width(ch: char, bold: bool) -> f32 {
    let table = if bold {
        &HELVETICA_BOLD_ASCII
    } else {
        &HELVETICA_ASCII
    };
    let ascii = |c: char| table[c as usize - 32] as f32;
    match ch {
        ' '..='~' => ascii(ch),
        '\u{00A0}' => 278.0,
        'ß' => 611.0,
        '•' => 350.0,
        '–' => 556.0,
        '—' | '…' | 'Æ' | '‰' => 1000.0,
        '°' => 400.0,
        '×' => 584.0,
        '·' => 278.0,
        '„' | '“' | '”' => if bold { 500.0 } else { 333.0 },
        '‚' | '‘' | '’' => if bold { 278.0 } else { 222.0 },
        _ => base_letter(ch).map(ascii).unwrap_or(556.0),
    }
}

/// Windows-1252 code points that differ from Latin-1 (0x80-0x9F).
const WINANSI_HIGH: [(u8, char); 27] = [
    (0x80, '\u{20AC}'),
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'),
    (0x8A, '\u{0160}'),
    (0x8B, '\u{2039}'),
    (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201C}'),
    (0x94, '\u{201D}'),
    (0x95, '\u{2022}'), // bullet
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'),
    (0x99, '\u{2122}'),
    (0x9A, '\u{0161}'),
    (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'),
    (0x9E, '\u{017E}'),
    (0x9F, '\u{0178}'),
];

fn winansi_to_char(byte: u8) -> char {
    WINANSI_HIGH
        .iter()
        .find(|(b, _)| *b == byte)
        .map(|&(_, c)| c)
        .unwrap_or(byte as char)
}

fn char_to_winansi(c: char) -> Option<u8> {
    match c as u32 {
        0x0020..=0x007E | 0x00A0..=0x00FF => Some(c as u8),
        _ => WINANSI_HIGH.iter().find(|(_, ch)| *ch == c).map(|&(b, _)| b),
    }
}

/// Convert a UTF-8 string to WinAnsi bytes, dropping what the encoding lacks.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars().filter_map(char_to_winansi).collect()
}

/// Encode UTF-8 text as big-endian 2-byte glyph IDs for CIDFont content streams.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.extend_from_slice(&gid.to_be_bytes());
    }
    out
}

/// (lowercase family name, bold, italic) -> (file path, face index within TTC)
type FontLookup = HashMap<(String, bool, bool), (PathBuf, u32)>;

static FONT_INDEX: OnceLock<FontLookup> = OnceLock::new();

fn font_family_name(face: &Face) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|name| name.name_id == ttf_parser::name_id::FAMILY && name.is_unicode())
        .find_map(|name| name.to_string())
}

fn font_directories() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    if let Ok(val) = std::env::var("ARTIFACT_REPORT_FONTS") {
        let sep = if cfg!(windows) { ';' } else { ':' };
        dirs.extend(
            val.split(sep)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        );
    }

    #[cfg(target_os = "macos")]
    {
        dirs.extend([
            "/Library/Fonts".into(),
            "/System/Library/Fonts".into(),
            "/System/Library/Fonts/Supplemental".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.extend(["/usr/share/fonts".into(), "/usr/local/share/fonts".into()]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        let windir = std::env::var("WINDIR").unwrap_or_else(|_| "C:\\Windows".into());
        dirs.push(PathBuf::from(windir).join("Fonts"));
    }

    dirs
}

fn has_extension(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| exts.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

fn scan_font_dirs() -> FontLookup {
    let t0 = std::time::Instant::now();
    let mut index = FontLookup::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut files_scanned = 0u32;

    let mut stack = font_directories();
    while let Some(dir) = stack.pop() {
        if !visited.insert(dir.clone()) {
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if !has_extension(&path, &["ttf", "otf", "ttc"]) {
                continue;
            }
            let Ok(file) = std::fs::File::open(&path) else {
                continue;
            };
            // SAFETY: font files are opened read-only and only parsed during the scan.
            let Ok(data) = (unsafe { Mmap::map(&file) }) else {
                continue;
            };
            files_scanned += 1;
            let face_count = if has_extension(&path, &["ttc"]) {
                ttf_parser::fonts_in_collection(&data).unwrap_or(1)
            } else {
                1
            };
            for face_idx in 0..face_count {
                let Ok(face) = Face::parse(&data, face_idx) else {
                    continue;
                };
                if let Some(family) = font_family_name(&face) {
                    index
                        .entry((family.to_lowercase(), face.is_bold(), face.is_italic()))
                        .or_insert((path.clone(), face_idx));
                }
            }
        }
    }

    log::info!(
        "Font scan: {:.1}ms, {} dirs, {} files parsed → {} entries",
        t0.elapsed().as_secs_f64() * 1000.0,
        visited.len(),
        files_scanned,
        index.len(),
    );
    index
}

/// Look up a font file by family name and style. Italic falls back to regular;
/// bold does not, so a missing bold face is reported rather than faked.
fn find_font_file(family: &str, style: FontStyle) -> Option<(PathBuf, u32)> {
    let index = FONT_INDEX.get_or_init(scan_font_dirs);
    let key = family.to_lowercase();
    index
        .get(&(key.clone(), style.is_bold(), style.is_italic()))
        .or_else(|| {
            style
                .is_italic()
                .then(|| index.get(&(key, false, false)))
                .flatten()
        })
        .cloned()
}

fn identity_system_info() -> pdf_writer::types::SystemInfo<'static> {
    pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    }
}

/// Character → glyph id and width tables for the embedded face. With a
/// remapper the ids point into the subset, otherwise into the full font.
fn glyph_ids(
    used_glyphs: &[(char, u16, f32)],
    remapper: Option<&subsetter::GlyphRemapper>,
) -> (HashMap<char, u16>, HashMap<char, f32>, Vec<(u16, f32)>) {
    let mut char_to_gid = HashMap::new();
    let mut char_widths_1000 = HashMap::new();
    let mut gid_widths: Vec<(u16, f32)> = Vec::new();
    for &(ch, gid, w) in used_glyphs {
        let gid = match remapper {
            Some(r) => r.get(gid).unwrap_or(0),
            None => gid,
        };
        char_to_gid.insert(ch, gid);
        char_widths_1000.insert(ch, w);
        gid_widths.push((gid, w));
    }
    gid_widths.sort_by_key(|&(gid, _)| gid);
    gid_widths.dedup_by_key(|&mut (gid, _)| gid);
    (char_to_gid, char_widths_1000, gid_widths)
}

/// Embed a TrueType/OpenType face as a CIDFont (Type0 composite) with Identity-H
/// encoding, subset to the characters the report uses.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    ps_name: &str,
    font_data: &[u8],
    face_index: u32,
    used_chars: &HashSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Option<FontMetrics> {
    let face = Face::parse(font_data, face_index).ok()?;
    let units = face.units_per_em() as f32;
    let to_1000 = |v: f32| v / units * 1000.0;
    let advance = |ch: char| {
        face.glyph_index(ch)
            .and_then(|gid| face.glyph_hor_advance(gid))
            .map(|adv| to_1000(adv as f32))
    };

    let widths_1000: Vec<f32> = (32u8..=255u8)
        .map(|b| advance(winansi_to_char(b)).unwrap_or(0.0))
        .collect();

    let mut remapper = subsetter::GlyphRemapper::new();
    let used_glyphs: Vec<(char, u16, f32)> = used_chars
        .iter()
        .filter_map(|&ch| {
            let gid = face.glyph_index(ch)?;
            remapper.remap(gid.0);
            let w = face
                .glyph_hor_advance(gid)
                .map(|adv| to_1000(adv as f32))
                .unwrap_or(0.0);
            Some((ch, gid.0, w))
        })
        .collect();

    let (subset_data, remapped) = match subsetter::subset(font_data, face_index, &remapper) {
        Ok(data) => (data, true),
        Err(e) => {
            log::warn!("Font subsetting failed for {ps_name}: {e}, embedding full font");
            (font_data.to_vec(), false)
        }
    };

    let (char_to_gid, char_widths_1000, gid_widths) =
        glyph_ids(&used_glyphs, remapped.then_some(&remapper));

    let data_len = i32::try_from(subset_data.len()).ok()?;

    let descriptor_ref = alloc();
    let data_ref = alloc();
    let cid_font_ref = alloc();
    let tounicode_ref = alloc();

    pdf.stream(data_ref, &subset_data)
        .pair(Name(b"Length1"), data_len);

    let bb = face.global_bounding_box();
    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(Rect::new(
            to_1000(bb.x_min as f32),
            to_1000(bb.y_min as f32),
            to_1000(bb.x_max as f32),
            to_1000(bb.y_max as f32),
        ))
        .italic_angle(0.0)
        .ascent(to_1000(face.ascender() as f32))
        .descent(to_1000(face.descender() as f32))
        .cap_height(face.capital_height().map(|h| to_1000(h as f32)).unwrap_or(700.0))
        .stem_v(80.0)
        .font_file2(data_ref);

    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(identity_system_info());
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let cmap_name = format!("{ps_name}-UTF16");
    let mut cmap = pdf_writer::types::UnicodeCmap::new(Name(cmap_name.as_bytes()), identity_system_info());
    for (&ch, &new_gid) in &char_to_gid {
        cmap.pair(new_gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Some(FontMetrics {
        widths_1000,
        char_to_gid: Some(char_to_gid),
        char_widths_1000: Some(char_widths_1000),
    })
}

fn register_font(
    pdf: &mut Pdf,
    alloc: &mut impl FnMut() -> Ref,
    family: Option<&str>,
    style: FontStyle,
    used_chars: &HashSet<char>,
) -> FontEntry {
    let t0 = std::time::Instant::now();
    let font_ref = alloc();
    let pdf_name = format!("F{}", style.index() + 1);

    let embedded = family.and_then(|family| {
        let metrics = find_font_file(family, style).and_then(|(path, face_index)| {
            let data = std::fs::read(&path).ok()?;
            let suffix = match style {
                FontStyle::Regular => "",
                FontStyle::Bold => "-Bold",
                FontStyle::Italic => "-Italic",
            };
            let ps_name = format!("{}{suffix}", family.replace(' ', ""));
            embed_truetype(pdf, font_ref, &ps_name, &data, face_index, used_chars, alloc)
        });
        if metrics.is_none() {
            log::warn!("Font not found: {family} {style:?}, using Helvetica");
        }
        metrics
    });

    let metrics = embedded.unwrap_or_else(|| {
        pdf.type1_font(font_ref)
            .base_font(Name(style.builtin_name()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
        FontMetrics::helvetica(style)
    });

    log::debug!(
        "register_font: {style:?} as {pdf_name} → {:.1}ms",
        t0.elapsed().as_secs_f64() * 1000.0,
    );

    FontEntry {
        pdf_name,
        font_ref,
        metrics,
    }
}

pub(crate) fn register_fonts(
    pdf: &mut Pdf,
    alloc: &mut impl FnMut() -> Ref,
    family: Option<&str>,
    used_chars: &HashSet<char>,
) -> FontSet {
    FontSet {
        entries: FontStyle::ALL.map(|style| register_font(pdf, alloc, family, style, used_chars)),
    }
}
