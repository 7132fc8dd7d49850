use std::str::{Split, SplitWhitespace};

use crate::config::MM_TO_PT;
use crate::fonts::{FontMetrics, FontStyle};

/// Millimetres of line pitch per point of font size.
pub const LINE_HEIGHT_FACTOR: f32 = 0.35;

/// Baseline offset below the top of a line box, as a fraction of the pitch.
pub(crate) const BASELINE_RATIO: f32 = 0.8;

pub const DEFAULT_PADDING: f32 = 3.0;

pub fn line_pitch(font_size: f32) -> f32 {
    font_size * LINE_HEIGHT_FACTOR
}

/// How a wrapped block reacts to the end of a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Move the whole block to the next page when it does not fit
    /// (falls back to `Split` for blocks taller than a page).
    Keep,
    /// Break between any two lines.
    Split,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub font: FontStyle,
    pub size: f32,
    pub color: [u8; 3],
    /// Left indent from the content margin, mm.
    pub indent: f32,
    /// Space after the block, mm.
    pub padding: f32,
    pub flow: Flow,
}

impl TextStyle {
    pub const fn regular(size: f32) -> Self {
        TextStyle {
            font: FontStyle::Regular,
            size,
            color: [0, 0, 0],
            indent: 0.0,
            padding: DEFAULT_PADDING,
            flow: Flow::Keep,
        }
    }

    pub const fn bold(size: f32) -> Self {
        TextStyle {
            font: FontStyle::Bold,
            ..TextStyle::regular(size)
        }
    }

    pub const fn italic(size: f32) -> Self {
        TextStyle {
            font: FontStyle::Italic,
            ..TextStyle::regular(size)
        }
    }

    pub const fn indent(self, indent: f32) -> Self {
        TextStyle { indent, ..self }
    }

    pub const fn padding(self, padding: f32) -> Self {
        TextStyle { padding, ..self }
    }

    pub const fn split(self) -> Self {
        TextStyle {
            flow: Flow::Split,
            ..self
        }
    }

    pub const fn color(self, color: [u8; 3]) -> Self {
        TextStyle { color, ..self }
    }
}

/// Lazily wraps text into lines no wider than a target width.
///
/// Words are measured with the face's advance widths and joined by single
/// spaces. `\n` starts a new paragraph; an empty paragraph yields an empty
/// line. A word wider than the line is broken between characters.
pub struct WrappedLines<'a> {
    metrics: &'a FontMetrics,
    font_size: f32,
    max_width: f32, // points
    paragraphs: Split<'a, char>,
    words: Option<SplitWhitespace<'a>>,
    carry: Option<&'a str>,
    paragraph_started: bool,
}

pub fn wrap_lines<'a>(
    text: &'a str,
    metrics: &'a FontMetrics,
    font_size: f32,
    max_width_mm: f32,
) -> WrappedLines<'a> {
    WrappedLines {
        metrics,
        font_size,
        max_width: max_width_mm * MM_TO_PT,
        paragraphs: text.split('\n'),
        words: None,
        carry: None,
        paragraph_started: false,
    }
}

impl<'a> WrappedLines<'a> {
    /// Longest char-boundary prefix of `word` that fits; always at least one char.
    fn split_word(&self, word: &'a str) -> (&'a str, &'a str) {
        let mut width = 0.0f32;
        let mut cut = word.len();
        for (i, ch) in word.char_indices() {
            width += self.metrics.char_width_1000(ch) * self.font_size / 1000.0;
            if width > self.max_width && i > 0 {
                cut = i;
                break;
            }
        }
        word.split_at(cut)
    }
}

impl<'a> Iterator for WrappedLines<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if self.words.is_none() {
                let paragraph = self.paragraphs.next()?;
                self.words = Some(paragraph.split_whitespace());
                self.paragraph_started = false;
            }

            let space_w = self.metrics.space_width(self.font_size);
            let mut line = String::new();
            let mut current_x = 0.0f32;

            loop {
                let word = match self.carry.take() {
                    Some(w) => w,
                    None => match self.words.as_mut().and_then(|w| w.next()) {
                        Some(w) => w,
                        None => break,
                    },
                };
                let ww = self.metrics.word_width(word, self.font_size);
                let proposed_x = if line.is_empty() {
                    current_x
                } else {
                    current_x + space_w
                };

                if proposed_x + ww <= self.max_width {
                    if !line.is_empty() {
                        line.push(' ');
                    }
                    line.push_str(word);
                    current_x = proposed_x + ww;
                    continue;
                }

                if line.is_empty() {
                    let (head, tail) = self.split_word(word);
                    line.push_str(head);
                    if !tail.is_empty() {
                        self.carry = Some(tail);
                    }
                } else {
                    self.carry = Some(word);
                }
                break;
            }

            if line.is_empty() {
                let blank_paragraph = !self.paragraph_started;
                self.words = None;
                if blank_paragraph {
                    return Some(line);
                }
                continue;
            }

            self.paragraph_started = true;
            return Some(line);
        }
    }
}
