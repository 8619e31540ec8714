//! Minimal deterministic PDF serializer for laid-out documents.
//!
//! Emits PDF 1.4 with the built-in Helvetica face, one content stream
//! per page. Output is a pure function of the `Document`: object order,
//! float formatting, and the xref table are all fixed, so identical
//! layout input reproduces byte-identical files.

use super::{Document, Page, TextLine, FOOTER_FONT_SIZE};

/// Serialize a laid-out document to PDF bytes.
pub fn to_pdf_bytes(doc: &Document) -> Vec<u8> {
    let page_count = doc.pages.len();

    // Object numbering: 1 catalog, 2 page tree, 3 font, then for page i
    // (0-based): 4+2i page, 5+2i content stream.
    let mut objects: Vec<Vec<u8>> = Vec::with_capacity(3 + 2 * page_count);

    let kids: Vec<String> = (0..page_count)
        .map(|i| format!("{} 0 R", 4 + 2 * i))
        .collect();

    objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());
    objects.push(
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            page_count
        )
        .into_bytes(),
    );
    objects.push(b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_vec());

    for (i, page) in doc.pages.iter().enumerate() {
        let content_obj = 5 + 2 * i;
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                doc.geometry.width, doc.geometry.height, content_obj
            )
            .into_bytes(),
        );

        let stream = page_content(doc, page);
        let mut content = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        content.extend_from_slice(&stream);
        content.extend_from_slice(b"\nendstream");
        objects.push(content);
    }

    assemble(objects)
}

fn page_content(doc: &Document, page: &Page) -> Vec<u8> {
    let mut out = String::from("BT\n");

    out.push_str(&format!("/F1 {:.2} Tf\n", doc.geometry.font_size));
    for line in &page.lines {
        out.push_str(&text_op(doc, line));
    }

    out.push_str(&format!("/F1 {:.2} Tf\n", FOOTER_FONT_SIZE));
    out.push_str(&text_op(doc, &page.footer));

    out.push_str("ET");
    out.into_bytes()
}

fn text_op(doc: &Document, line: &TextLine) -> String {
    // Layout measures y downward from the top edge; PDF user space is
    // bottom-up.
    let y = doc.geometry.height - line.y;
    format!(
        "1 0 0 1 {:.2} {:.2} Tm ({}) Tj\n",
        line.x,
        y,
        escape_text(&line.text)
    )
}

/// Escape a line for a PDF literal string. Glyphs outside printable
/// ASCII fall back to '?', matching the width table's coverage.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            ' '..='~' => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// Wrap numbered objects with header, xref table, and trailer.
fn assemble(objects: Vec<Vec<u8>>) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");

    let mut offsets: Vec<usize> = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }

    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        )
        .as_bytes(),
    );

    out
}
