use std::collections::HashSet;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::config::{MM_TO_PT, ReportOptions};
use crate::error::Error;
use crate::fonts::{FontSet, FontStyle, register_fonts};
use crate::model::AnalysisRecord;

use super::cursor::LayoutCursor;
use super::layout::{BASELINE_RATIO, Flow, TextStyle, line_pitch, wrap_lines};
use super::sections::{ScoreTier, Section};

/// One item placed on a page, in millimetres from the page's top-left corner.
#[derive(Clone, Debug, PartialEq)]
pub enum Placed {
    DocumentHeader {
        title: String,
        name: String,
    },
    SectionHeader {
        section: Section,
        title: String,
        page: usize,
        top: f32,
    },
    TextLine {
        page: usize,
        top: f32,
        x: f32,
        text: String,
        font: FontStyle,
        size: f32,
    },
    ScoreBar {
        label: String,
        value: f64,
        page: usize,
        top: f32,
        track_width: f32,
        fill_width: f32,
        tier: ScoreTier,
    },
    Image {
        index: usize,
        page: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Footer {
        page: usize,
        text: String,
    },
}

/// Everything placed while rendering one report, in drawing order.
#[derive(Clone, Debug, Default)]
pub struct LayoutTrace {
    pub pages: usize,
    pub items: Vec<Placed>,
}

impl LayoutTrace {
    pub fn section_headers(&self) -> Vec<Section> {
        self.items
            .iter()
            .filter_map(|p| match p {
                Placed::SectionHeader { section, .. } => Some(*section),
                _ => None,
            })
            .collect()
    }

    pub fn text_lines(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|p| match p {
            Placed::TextLine { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.text_lines().any(|l| l.contains(needle))
    }
}

fn rgb(content: &mut Content, [r, g, b]: [u8; 3], stroke: bool) {
    let (r, g, b) = (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    if stroke {
        content.set_stroke_rgb(r, g, b);
    } else {
        content.set_fill_rgb(r, g, b);
    }
}

/// The drawing surface of one report: PDF objects, finished page content
/// streams, the page being written and the cursor that walks down it.
pub struct Canvas {
    pdf: Pdf,
    next_id: i32,
    catalog_id: Ref,
    pages_id: Ref,
    fonts: FontSet,
    cursor: LayoutCursor,
    finished_pages: Vec<Content>,
    current: Content,
    image_xobjects: Vec<(String, Ref)>,
    trace: Vec<Placed>,
}

impl Canvas {
    pub fn new(options: &ReportOptions, used_chars: &HashSet<char>) -> Canvas {
        let mut pdf = Pdf::new();
        let mut next_id = 1i32;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };
        let catalog_id = alloc();
        let pages_id = alloc();
        let fonts = register_fonts(
            &mut pdf,
            &mut alloc,
            options.font_family.as_deref(),
            used_chars,
        );

        Canvas {
            pdf,
            next_id,
            catalog_id,
            pages_id,
            fonts,
            cursor: LayoutCursor::new(options.page),
            finished_pages: Vec::new(),
            current: Content::new(),
            image_xobjects: Vec::new(),
            trace: Vec::new(),
        }
    }

    /// Canvas with fonts covering everything `record` may draw.
    pub fn for_record(options: &ReportOptions, record: &AnalysisRecord) -> Canvas {
        Canvas::new(options, &super::used_chars(record, options))
    }

    pub fn cursor(&self) -> &LayoutCursor {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut LayoutCursor {
        &mut self.cursor
    }

    pub fn fonts(&self) -> &FontSet {
        &self.fonts
    }

    pub fn trace(&self) -> &[Placed] {
        &self.trace
    }

    pub(crate) fn record(&mut self, item: Placed) {
        self.trace.push(item);
    }

    /// PDF writer plus an object-id allocator, for embedding resources.
    pub(crate) fn writer(&mut self) -> (&mut Pdf, impl FnMut() -> Ref + '_) {
        let next_id = &mut self.next_id;
        let alloc = move || {
            let r = Ref::new(*next_id);
            *next_id += 1;
            r
        };
        (&mut self.pdf, alloc)
    }

    pub(crate) fn add_image_xobject(&mut self, xobj_ref: Ref) -> String {
        let name = format!("Im{}", self.image_xobjects.len() + 1);
        self.image_xobjects.push((name.clone(), xobj_ref));
        name
    }

    /// Reserve `height` below the cursor, flushing the page when it must break.
    pub fn reserve(&mut self, height: f32) -> bool {
        let broke = self.cursor.reserve(height);
        if broke {
            self.finished_pages
                .push(std::mem::replace(&mut self.current, Content::new()));
            log::debug!("page break → page {}", self.cursor.page_index() + 1);
        }
        broke
    }

    pub fn advance(&mut self, height: f32) {
        self.cursor.advance(height);
    }

    fn page_y(&self, y_mm: f32) -> f32 {
        (self.cursor.geometry().height - y_mm) * MM_TO_PT
    }

    /// Filled rectangle; `y` is the top edge.
    pub(crate) fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: [u8; 3]) {
        let bottom = self.page_y(y + h);
        let c = &mut self.current;
        c.save_state();
        rgb(c, color, false);
        c.rect(x * MM_TO_PT, bottom, w * MM_TO_PT, h * MM_TO_PT);
        c.fill_nonzero();
        c.restore_state();
    }

    pub(crate) fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: [u8; 3]) {
        let bottom = self.page_y(y + h);
        let c = &mut self.current;
        c.save_state();
        rgb(c, color, true);
        c.set_line_width(0.5);
        c.rect(x * MM_TO_PT, bottom, w * MM_TO_PT, h * MM_TO_PT);
        c.stroke();
        c.restore_state();
    }

    pub(crate) fn draw_xobject(&mut self, name: &str, x: f32, y: f32, w: f32, h: f32) {
        let bottom = self.page_y(y + h);
        let c = &mut self.current;
        c.save_state();
        c.transform([w * MM_TO_PT, 0.0, 0.0, h * MM_TO_PT, x * MM_TO_PT, bottom]);
        c.x_object(Name(name.as_bytes()));
        c.restore_state();
    }

    /// Single line of text with its baseline at `baseline` (mm from the top).
    /// Does not touch the cursor.
    pub(crate) fn text_at(
        &mut self,
        x: f32,
        baseline: f32,
        text: &str,
        font: FontStyle,
        size: f32,
        color: [u8; 3],
    ) {
        let entry = self.fonts.get(font);
        let bytes = entry.metrics.encode(text);
        if bytes.is_empty() {
            return;
        }
        let y = self.page_y(baseline);
        let c = &mut self.current;
        c.begin_text();
        rgb(c, color, false);
        c.set_font(Name(entry.pdf_name.as_bytes()), size);
        c.next_line(x * MM_TO_PT, y);
        c.show(Str(&bytes));
        c.end_text();
    }

    fn line_at(&mut self, top: f32, line: &str, style: &TextStyle) {
        let x = self.cursor.geometry().margin + style.indent;
        let baseline = top + line_pitch(style.size) * BASELINE_RATIO;
        self.text_at(x, baseline, line, style.font, style.size, style.color);
        self.trace.push(Placed::TextLine {
            page: self.cursor.page_index(),
            top,
            x,
            text: line.to_string(),
            font: style.font,
            size: style.size,
        });
    }

    fn wrap(&self, text: &str, style: &TextStyle) -> Vec<String> {
        let width = self.cursor.content_width() - style.indent;
        wrap_lines(text, &self.fonts.get(style.font).metrics, style.size, width).collect()
    }

    /// Height `text` takes as a kept block, padding included.
    pub(crate) fn text_height(&self, text: &str, style: &TextStyle) -> f32 {
        let text = text.trim();
        if text.is_empty() {
            return 0.0;
        }
        self.wrap(text, style).len() as f32 * line_pitch(style.size) + style.padding
    }

    /// Break the page unless the next `height` mm fit below the cursor. Heights
    /// beyond one page are capped, so the block starts on a fresh page.
    pub(crate) fn keep_together(&mut self, height: f32) {
        let geometry = self.cursor.geometry();
        self.reserve(height.min(geometry.bottom() - geometry.margin));
    }

    /// Wrap `text` to the content width (less the indent) and flow it down the
    /// page. Returns the number of lines drawn; empty text draws nothing and
    /// leaves the cursor where it was.
    pub fn text(&mut self, text: &str, style: TextStyle) -> usize {
        let text = text.trim();
        if text.is_empty() {
            return 0;
        }
        let lines = self.wrap(text, &style);

        let pitch = line_pitch(style.size);
        let block = lines.len() as f32 * pitch;
        let geometry = self.cursor.geometry();
        let page_capacity = geometry.bottom() - geometry.margin;

        if style.flow == Flow::Keep && block + style.padding <= page_capacity {
            self.reserve(block + style.padding);
            let top = self.cursor.y();
            for (i, line) in lines.iter().enumerate() {
                self.line_at(top + i as f32 * pitch, line, &style);
            }
            self.advance(block + style.padding);
        } else {
            let last = lines.len() - 1;
            for (i, line) in lines.iter().enumerate() {
                let need = if i == last { pitch + style.padding } else { pitch };
                self.reserve(need);
                let top = self.cursor.y();
                self.line_at(top, line, &style);
                self.advance(pitch);
            }
            self.advance(style.padding);
        }
        lines.len()
    }

    pub fn page_count(&self) -> usize {
        self.finished_pages.len() + 1
    }

    /// Assemble catalog, page tree and per-page resources. Consumes the canvas.
    pub fn finish(mut self, title: &str) -> Result<(Vec<u8>, LayoutTrace), Error> {
        let t0 = std::time::Instant::now();
        let current = std::mem::replace(&mut self.current, Content::new());
        self.finished_pages.push(current);
        let pages = std::mem::take(&mut self.finished_pages);
        let n = pages.len();

        let (page_ids, content_ids, info_id) = {
            let (_, mut alloc) = self.writer();
            let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
            let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
            (page_ids, content_ids, alloc())
        };
        let page_count =
            i32::try_from(n).map_err(|_| Error::Pdf(format!("too many pages: {n}")))?;

        let pdf = &mut self.pdf;
        for (i, c) in pages.into_iter().enumerate() {
            let raw = c.finish();
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
            pdf.stream(content_ids[i], &compressed)
                .filter(Filter::FlateDecode);
        }

        pdf.catalog(self.catalog_id).pages(self.pages_id);
        pdf.pages(self.pages_id)
            .kids(page_ids.iter().copied())
            .count(page_count);

        let geometry = self.cursor.geometry();
        let media_box = Rect::new(
            0.0,
            0.0,
            geometry.width * MM_TO_PT,
            geometry.height * MM_TO_PT,
        );
        for (&page_id, &content_id) in page_ids.iter().zip(&content_ids) {
            let mut page = pdf.page(page_id);
            page.media_box(media_box)
                .parent(self.pages_id)
                .contents(content_id);
            let mut resources = page.resources();
            {
                let mut fonts = resources.fonts();
                for entry in self.fonts.iter() {
                    fonts.pair(Name(entry.pdf_name.as_bytes()), entry.font_ref);
                }
            }
            if !self.image_xobjects.is_empty() {
                let mut xobjects = resources.x_objects();
                for (name, xobj_ref) in &self.image_xobjects {
                    xobjects.pair(Name(name.as_bytes()), *xobj_ref);
                }
            }
        }

        pdf.document_info(info_id)
            .title(TextStr(title))
            .producer(TextStr(concat!("artifact-report ", env!("CARGO_PKG_VERSION"))));

        log::debug!(
            "assembly: {n} pages in {:.1}ms ({:.0}mm content height)",
            t0.elapsed().as_secs_f64() * 1000.0,
            (geometry.bottom() - geometry.margin),
        );

        let trace = LayoutTrace {
            pages: n,
            items: std::mem::take(&mut self.trace),
        };
        Ok((self.pdf.finish(), trace))
    }
}
