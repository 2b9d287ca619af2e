/// Minimal PDF 1.4 writer for report documents.
///
/// Uses only the standard Helvetica and Helvetica-Bold fonts (no embedding),
/// WinAnsi text encoding, and one uncompressed content stream per page.
///
/// Object layout:
/// - 1: catalog, 2: page tree, 3: Helvetica, 4: Helvetica-Bold, 5: info
/// - 6 + 2i: page i, 7 + 2i: its content stream
use crate::report::{DrawOp, Font, ReportDocument, Rgb, PAGE_HEIGHT, PAGE_WIDTH};

const PRODUCER: &str = "advice-report";
const FIRST_PAGE_OBJECT: usize = 6;
/// Bezier control-point factor for approximating a circle with four curves.
const KAPPA: f32 = 0.552_284_8;

/// Helvetica advance widths (1/1000 em) for ASCII 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];
const DEFAULT_WIDTH: u16 = 556;

/// Width of `text` in points when set in Helvetica at `size`.
pub fn text_width(text: &str, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(c))).sum();
    units as f32 * size / 1000.0
}

fn char_width(c: char) -> u16 {
    match c as u32 {
        code @ 32..=126 => HELVETICA_WIDTHS[(code - 32) as usize],
        _ => DEFAULT_WIDTH,
    }
}

/// Serialize a laid-out report into PDF bytes.
pub fn render_pdf(document: &ReportDocument) -> Vec<u8> {
    let page_count = document.pages.len();
    let mut objects: Vec<Vec<u8>> = Vec::with_capacity(5 + 2 * page_count);

    let kids: Vec<String> = (0..page_count)
        .map(|i| format!("{} 0 R", FIRST_PAGE_OBJECT + 2 * i))
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
    objects.push(font_object("Helvetica"));
    objects.push(font_object("Helvetica-Bold"));
    objects.push(
        format!(
            "<< /Title ({}) /Producer ({}) >>",
            escape_text(&document.title),
            PRODUCER
        )
        .into_bytes(),
    );

    for (i, page) in document.pages.iter().enumerate() {
        let content_id = FIRST_PAGE_OBJECT + 2 * i + 1;
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH:.2} {PAGE_HEIGHT:.2}] \
                 /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {content_id} 0 R >>"
            )
            .into_bytes(),
        );

        let stream = content_stream(&page.ops);
        let mut body = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        body.extend_from_slice(stream.as_bytes());
        body.extend_from_slice(b"\nendstream");
        objects.push(body);
    }

    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in &offsets {
        xref.push_str(&format!("{offset:010} 00000 n \n"));
    }
    xref.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R /Info 5 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));
    out.extend_from_slice(xref.as_bytes());
    out
}

fn font_object(base_font: &str) -> Vec<u8> {
    format!(
        "<< /Type /Font /Subtype /Type1 /BaseFont /{base_font} /Encoding /WinAnsiEncoding >>"
    )
    .into_bytes()
}

/// Build a page's content stream. Layout y grows downward; PDF y grows upward.
fn content_stream(ops: &[DrawOp]) -> String {
    let mut s = String::new();
    for op in ops {
        match op {
            DrawOp::Text {
                x,
                y,
                size,
                font,
                color,
                text,
            } => {
                let font_name = match font {
                    Font::Regular => "F1",
                    Font::Bold => "F2",
                };
                s.push_str(&format!(
                    "BT /{font_name} {size:.2} Tf {} rg {x:.2} {:.2} Td ({}) Tj ET\n",
                    fill_components(*color),
                    PAGE_HEIGHT - y,
                    escape_text(text)
                ));
            }
            DrawOp::Rect {
                x,
                y,
                width,
                height,
                fill,
            } => {
                s.push_str(&format!(
                    "{} rg {x:.2} {:.2} {width:.2} {height:.2} re f\n",
                    fill_components(*fill),
                    PAGE_HEIGHT - y - height
                ));
            }
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                width,
                color,
            } => {
                s.push_str(&format!(
                    "{} RG {width:.2} w {x1:.2} {:.2} m {x2:.2} {:.2} l S\n",
                    fill_components(*color),
                    PAGE_HEIGHT - y1,
                    PAGE_HEIGHT - y2
                ));
            }
            DrawOp::Bullet {
                x,
                y,
                radius,
                color,
            } => {
                s.push_str(&format!("{} rg\n", fill_components(*color)));
                s.push_str(&circle_path(*x, PAGE_HEIGHT - y, *radius));
                s.push_str("f\n");
            }
        }
    }
    s
}

fn fill_components(Rgb(r, g, b): Rgb) -> String {
    format!(
        "{:.3} {:.3} {:.3}",
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0
    )
}

fn circle_path(cx: f32, cy: f32, r: f32) -> String {
    let k = r * KAPPA;
    format!(
        "{:.2} {:.2} m\n\
         {:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c\n\
         {:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c\n\
         {:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c\n\
         {:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c\n",
        cx + r, cy,
        cx + r, cy + k, cx + k, cy + r, cx, cy + r,
        cx - k, cy + r, cx - r, cy + k, cx - r, cy,
        cx - r, cy - k, cx - k, cy - r, cx, cy - r,
        cx + k, cy - r, cx + r, cy - k, cx + r, cy,
    )
}

/// Encode text as a PDF literal string body in WinAnsi.
///
/// Characters outside WinAnsi become `?`; bytes above 127 are written as octal
/// escapes so the stream stays ASCII.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            _ => match win_ansi(c) {
                Some(byte) => out.push_str(&format!("\\{byte:03o}")),
                None => out.push('?'),
            },
        }
    }
    out
}

fn win_ansi(c: char) -> Option<u8> {
    match c {
        '€' => Some(0x80),
        '…' => Some(0x85),
        '‘' => Some(0x91),
        '’' => Some(0x92),
        '“' => Some(0x93),
        '”' => Some(0x94),
        '•' => Some(0x95),
        '–' => Some(0x96),
        '—' => Some(0x97),
        '\u{a0}'..='\u{ff}' => Some(c as u8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Page;

    fn document(pages: usize) -> ReportDocument {
        ReportDocument {
            title: "EcoOyster (test)".to_string(),
            pages: (1..=pages)
                .map(|number| Page {
                    number,
                    ops: vec![
                        DrawOp::Text {
                            x: 40.0,
                            y: 60.0,
                            size: 10.0,
                            font: Font::Regular,
                            color: Rgb(0, 0, 0),
                            text: format!("Page {number} of {pages}"),
                        },
                        DrawOp::Bullet {
                            x: 45.0,
                            y: 80.0,
                            radius: 1.8,
                            color: Rgb(0, 0, 0),
                        },
                    ],
                })
                .collect(),
        }
    }

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn pdf_structure() {
        let bytes = render_pdf(&document(3));
        assert!(bytes.starts_with(b"%PDF-1.4\n"));
        assert!(bytes.ends_with(b"%%EOF\n"));

        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 3"));
        assert_eq!(count(&text, "/Type /Page "), 3);
        assert!(text.contains("(Page 2 of 3) Tj"));
        assert!(text.contains("/Title (EcoOyster \\(test\\))"));
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let bytes = render_pdf(&document(2));
        let text = String::from_utf8_lossy(&bytes).to_string();
        let xref_start = text.find("\nxref\n").unwrap() + 1;
        let offsets: Vec<usize> = text[xref_start..]
            .lines()
            .skip(3)
            .take_while(|l| l.ends_with(" n "))
            .map(|l| l[..10].parse().unwrap())
            .collect();
        assert_eq!(offsets.len(), 5 + 2 * 2);
        for (index, offset) in offsets.iter().enumerate() {
            let expected = format!("{} 0 obj", index + 1);
            assert_eq!(&bytes[*offset..*offset + expected.len()], expected.as_bytes());
        }
    }

    #[test]
    fn text_escaping() {
        assert_eq!(escape_text("a(b)c\\d"), "a\\(b\\)c\\\\d");
        assert_eq!(escape_text("• item"), "\\225 item");
        assert_eq!(escape_text("café"), "caf\\351");
        assert_eq!(escape_text("牡蛎"), "??");
    }

    #[test]
    fn helvetica_widths() {
        assert_eq!(text_width(" ", 1000.0), 278.0);
        assert_eq!(text_width("A", 10.0), 6.67);
        assert_eq!(text_width("@", 1000.0), 1015.0);
        assert_eq!(text_width("~", 1000.0), 584.0);
    }
}
