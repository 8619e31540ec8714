//! Document layout: word-wrap and pagination of free-form text into
//! fixed-size pages.
//!
//! This is a pure, deterministic function of its inputs. It knows nothing
//! about payments, users, or email; the RTI fulfillment handler and the
//! on-demand document endpoint both call through here so the two paths
//! can never drift apart.

pub mod font;
pub mod pdf;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.45;

/// Footer font size, fixed regardless of body size.
pub const FOOTER_FONT_SIZE: f32 = 8.0;

/// Distance of the footer baseline from the bottom page edge, in points.
const FOOTER_OFFSET: f32 = 28.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub font_size: f32,
}

impl PageGeometry {
    /// A4 portrait in points, 2cm margins, 12pt body text.
    pub fn a4() -> Self {
        Self {
            width: 595.28,
            height: 841.89,
            margin_left: 56.69,
            margin_right: 56.69,
            margin_top: 56.69,
            margin_bottom: 56.69,
            font_size: 12.0,
        }
    }

    pub fn usable_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn line_height(&self) -> f32 {
        self.font_size * LINE_HEIGHT_FACTOR
    }
}

/// A positioned line of text. `y` is measured from the top page edge to
/// the text baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub x: f32,
    pub y: f32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub lines: Vec<TextLine>,
    /// Fixed disclosure line, present on every page independent of flow.
    pub footer: TextLine,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
}

/// Lay out `text` into pages.
///
/// Paragraphs are delimited by blank lines. Within a paragraph, words are
/// greedily accumulated onto a line while the measured candidate width
/// stays within the usable width; a word that would overflow starts a new
/// line. A single word wider than the usable width gets a line of its
/// own (it cannot be wrapped further). One blank separator line is kept
/// between paragraphs; trailing blanks are trimmed.
pub fn layout(text: &str, geometry: PageGeometry, footer_text: &str) -> Document {
    let wrapped = wrap_paragraphs(text, &geometry);

    let footer = TextLine {
        x: geometry.margin_left,
        y: geometry.height - FOOTER_OFFSET,
        text: footer_text.to_string(),
    };

    let top = geometry.margin_top + geometry.font_size;
    let bottom = geometry.height - geometry.margin_bottom;
    let line_height = geometry.line_height();

    let mut pages: Vec<Page> = Vec::new();
    let mut lines: Vec<TextLine> = Vec::new();
    let mut y = top;

    for item in wrapped {
        match item {
            WrapItem::Line(text) => {
                if y > bottom {
                    pages.push(Page {
                        lines: std::mem::take(&mut lines),
                        footer: footer.clone(),
                    });
                    y = top;
                }
                lines.push(TextLine {
                    x: geometry.margin_left,
                    y,
                    text,
                });
                y += line_height;
            }
            // Separator between paragraphs: advance the cursor without
            // drawing. Page-break decisions belong to real lines, so a
            // separator never opens a page that starts blank.
            WrapItem::Separator => {
                y += line_height;
            }
        }
    }

    if !lines.is_empty() || pages.is_empty() {
        pages.push(Page { lines, footer });
    }

    Document { geometry, pages }
}

enum WrapItem {
    Line(String),
    Separator,
}

fn wrap_paragraphs(text: &str, geometry: &PageGeometry) -> Vec<WrapItem> {
    let usable = geometry.usable_width();
    let mut out = Vec::new();

    for (i, paragraph) in split_paragraphs(text).into_iter().enumerate() {
        if i > 0 {
            out.push(WrapItem::Separator);
        }

        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if line.is_empty() {
                line = word.to_string();
                continue;
            }
            let candidate = format!("{} {}", line, word);
            if font::measure(&candidate, geometry.font_size) <= usable {
                line = candidate;
            } else {
                out.push(WrapItem::Line(std::mem::take(&mut line)));
                line = word.to_string();
            }
        }
        if !line.is_empty() {
            out.push(WrapItem::Line(line));
        }
    }

    out
}

/// Group consecutive non-blank input lines into paragraphs. Internal
/// newlines within a paragraph are treated as word separators. Leading
/// and trailing blank lines disappear here, which is what trims trailing
/// blanks from the rendered output.
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line.trim());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOOTER: &str = "Generated by Janhit. Not legal advice.";

    fn long_text(words: usize) -> String {
        (0..words)
            .map(|i| format!("word{}", i % 17))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_layout_is_deterministic() {
        let text = format!("{}\n\n{}", long_text(300), long_text(500));
        let a = layout(&text, PageGeometry::a4(), FOOTER);
        let b = layout(&text, PageGeometry::a4(), FOOTER);
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_line_exceeds_usable_width() {
        let geometry = PageGeometry::a4();
        let text = long_text(2000);
        let doc = layout(&text, geometry, FOOTER);

        for page in &doc.pages {
            for line in &page.lines {
                assert!(
                    font::measure(&line.text, geometry.font_size) <= geometry.usable_width(),
                    "line wider than usable width: {:?}",
                    line.text
                );
            }
        }
    }

    #[test]
    fn test_long_text_paginates() {
        let geometry = PageGeometry::a4();
        let doc = layout(&long_text(2000), geometry, FOOTER);
        assert!(doc.pages.len() > 1, "2000 words should not fit one A4 page");

        let bottom = geometry.height - geometry.margin_bottom;
        let top = geometry.margin_top;
        for page in &doc.pages {
            assert!(!page.lines.is_empty());
            for line in &page.lines {
                assert!(line.y > top);
                // The break check runs before drawing, so no drawn
                // baseline ever passes the bottom margin.
                assert!(line.y <= bottom);
            }
        }
    }

    #[test]
    fn test_every_page_has_footer() {
        let geometry = PageGeometry::a4();
        let doc = layout(&long_text(2000), geometry, FOOTER);
        for page in &doc.pages {
            assert_eq!(page.footer.text, FOOTER);
            assert_eq!(page.footer.y, geometry.height - FOOTER_OFFSET);
        }
    }

    #[test]
    fn test_paragraph_separator_advances_one_blank_line() {
        let geometry = PageGeometry::a4();
        let doc = layout("first paragraph\n\nsecond paragraph", geometry, FOOTER);
        let lines = &doc.pages[0].lines;
        assert_eq!(lines.len(), 2);
        let gap = lines[1].y - lines[0].y;
        assert!((gap - 2.0 * geometry.line_height()).abs() < 1e-3);
    }

    #[test]
    fn test_trailing_blank_lines_trimmed() {
        let geometry = PageGeometry::a4();
        let with_trailing = layout("only paragraph\n\n\n\n", geometry, FOOTER);
        let without = layout("only paragraph", geometry, FOOTER);
        assert_eq!(with_trailing, without);
    }

    #[test]
    fn test_empty_text_gives_single_page_with_footer() {
        let doc = layout("", PageGeometry::a4(), FOOTER);
        assert_eq!(doc.pages.len(), 1);
        assert!(doc.pages[0].lines.is_empty());
        assert_eq!(doc.pages[0].footer.text, FOOTER);
    }

    #[test]
    fn test_oversized_single_word_gets_own_line() {
        let geometry = PageGeometry::a4();
        let wide = "W".repeat(200);
        let doc = layout(&format!("small {} small", wide), geometry, FOOTER);
        let texts: Vec<&str> = doc.pages[0].lines.iter().map(|l| l.text.as_str()).collect();
        assert!(texts.contains(&wide.as_str()));
    }
}
