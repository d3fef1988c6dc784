//! Minimal PDF writer for the confirmation certificate.
//!
//! Writes PDF 1.4 by hand: built-in Helvetica fonts with WinAnsi encoding,
//! uncompressed content streams, and the branding JPEG embedded untouched
//! through `DCTDecode`. Keeping the streams uncompressed makes the output
//! reproducible byte-for-byte and lets tests grep rendered text straight
//! out of the document.

use super::layout::CertificateLine;
use super::BrandingAsset;

// A4 geometry in points, margins as in the original certificate.
const PAGE_WIDTH: i32 = 595;
const PAGE_HEIGHT: i32 = 842;
const MARGIN: i32 = 72;

const TITLE_SIZE: i32 = 16;
const BODY_SIZE: i32 = 11;
const FOOTER_SIZE: i32 = 9;

const TITLE_BASELINE: i32 = 700;
const FIRST_PAGE_BODY_TOP: i32 = 668;
const LATER_PAGE_BODY_TOP: i32 = 700;
const BODY_BOTTOM: i32 = 100;
const LINE_HEIGHT: i32 = 15;
const FIELD_GAP: i32 = 4;
const FOOTER_BASELINE: i32 = 54;

// Logo box: 1in x 0.5in at the top-left of every page.
const LOGO_X: i32 = MARGIN;
const LOGO_Y: i32 = PAGE_HEIGHT - MARGIN - 36;
const LOGO_WIDTH: i32 = 72;
const LOGO_HEIGHT: i32 = 36;

// Column fits roughly this many 11pt Helvetica characters.
const MAX_LINE_CHARS: usize = 82;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "/F1",
            Font::Bold => "/F2",
        }
    }
}

/// One baseline: absolute position plus styled segments shown in sequence.
struct TextRun {
    x: i32,
    y: i32,
    size: i32,
    segments: Vec<(Font, String)>,
}

/// Lay out the document and serialize it. Deterministic for identical
/// inputs.
pub(super) fn write_document(
    title: &str,
    lines: &[CertificateLine],
    footer_prefix: &str,
    branding: &BrandingAsset,
) -> Vec<u8> {
    let pages = paginate(title, lines);
    serialize(&pages, footer_prefix, branding)
}

fn paginate(title: &str, lines: &[CertificateLine]) -> Vec<Vec<TextRun>> {
    let mut pages: Vec<Vec<TextRun>> = Vec::new();
    let mut current: Vec<TextRun> = vec![TextRun {
        x: MARGIN,
        y: TITLE_BASELINE,
        size: TITLE_SIZE,
        segments: vec![(Font::Bold, title.to_string())],
    }];
    let mut y = FIRST_PAGE_BODY_TOP;

    for line in lines {
        for (index, chunk) in wrap_field(&line.label, &line.value).into_iter().enumerate() {
            if y < BODY_BOTTOM {
                pages.push(std::mem::take(&mut current));
                y = LATER_PAGE_BODY_TOP;
            }
            let segments = if index == 0 {
                let mut segments = vec![(Font::Bold, format!("{}:", line.label))];
                if !chunk.is_empty() {
                    segments.push((Font::Regular, format!(" {chunk}")));
                }
                segments
            } else {
                vec![(Font::Regular, chunk)]
            };
            current.push(TextRun {
                x: MARGIN,
                y,
                size: BODY_SIZE,
                segments,
            });
            y -= LINE_HEIGHT;
        }
        y -= FIELD_GAP;
    }

    pages.push(current);
    pages
}

/// Greedy word wrap for a label/value pair. The first returned chunk
/// shares its line with the label; continuations get the full column.
fn wrap_field(label: &str, value: &str) -> Vec<String> {
    let first_budget = MAX_LINE_CHARS.saturating_sub(label.chars().count() + 2);
    let mut chunks = Vec::new();
    let mut budget = first_budget.max(1);
    let mut line = String::new();

    let flush = |line: &mut String, chunks: &mut Vec<String>| {
        chunks.push(std::mem::take(line));
    };

    for paragraph in value.split('\n') {
        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            let line_len = line.chars().count();
            let needed = if line.is_empty() {
                word_len
            } else {
                line_len + 1 + word_len
            };
            if needed > budget && !line.is_empty() {
                flush(&mut line, &mut chunks);
                budget = MAX_LINE_CHARS;
            }
            if !line.is_empty() {
                line.push(' ');
            }
            if word_len > budget {
                // Hard-break a word that cannot fit any line on its own.
                let mut remaining: Vec<char> = word.chars().collect();
                while !remaining.is_empty() {
                    let take = budget.saturating_sub(line.chars().count()).max(1);
                    let piece: String = remaining.drain(..take.min(remaining.len())).collect();
                    line.push_str(&piece);
                    if !remaining.is_empty() {
                        flush(&mut line, &mut chunks);
                        budget = MAX_LINE_CHARS;
                    }
                }
            } else {
                line.push_str(word);
            }
        }
        if !line.is_empty() {
            flush(&mut line, &mut chunks);
            budget = MAX_LINE_CHARS;
        }
    }

    if chunks.is_empty() {
        chunks.push(String::new());
    }
    chunks
}

/// Encode text as a WinAnsi PDF string literal, escapes included.
fn encode_literal(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 2);
    out.push(b'(');
    for ch in text.chars() {
        match ch {
            '(' => out.extend_from_slice(b"\\("),
            ')' => out.extend_from_slice(b"\\)"),
            '\\' => out.extend_from_slice(b"\\\\"),
            c if (c as u32) < 0x20 => out.push(b' '),
            c if (c as u32) <= 0x7E => out.push(c as u8),
            // Latin-1 range matches WinAnsi for 0xA0 and above.
            c if (0xA0..=0xFF).contains(&(c as u32)) => out.push(c as u32 as u8),
            '\u{2018}' => out.push(0x91),
            '\u{2019}' => out.push(0x92),
            '\u{201C}' => out.push(0x93),
            '\u{201D}' => out.push(0x94),
            '\u{2013}' => out.push(0x96),
            '\u{2014}' => out.push(0x97),
            _ => out.push(b'?'),
        }
    }
    out.push(b')');
    out
}

fn content_stream(runs: &[TextRun], footer_prefix: &str, page_number: usize) -> Vec<u8> {
    let mut stream = Vec::new();
    // Branding image, fixed position on every page.
    stream.extend_from_slice(
        format!("q\n{LOGO_WIDTH} 0 0 {LOGO_HEIGHT} {LOGO_X} {LOGO_Y} cm\n/Im1 Do\nQ\n").as_bytes(),
    );

    for run in runs {
        stream.extend_from_slice(format!("BT\n{} {} Td\n", run.x, run.y).as_bytes());
        for (font, text) in &run.segments {
            stream.extend_from_slice(format!("{} {} Tf\n", font.resource(), run.size).as_bytes());
            stream.extend_from_slice(&encode_literal(text));
            stream.extend_from_slice(b" Tj\n");
        }
        stream.extend_from_slice(b"ET\n");
    }

    let footer = format!("{footer_prefix} - Página: {page_number}");
    stream.extend_from_slice(
        format!("BT\n/F1 {FOOTER_SIZE} Tf\n{MARGIN} {FOOTER_BASELINE} Td\n").as_bytes(),
    );
    stream.extend_from_slice(&encode_literal(&footer));
    stream.extend_from_slice(b" Tj\nET\n");
    stream
}

fn serialize(pages: &[Vec<TextRun>], footer_prefix: &str, branding: &BrandingAsset) -> Vec<u8> {
    let page_count = pages.len();
    let first_page_obj = 6;
    let object_count = 5 + 2 * page_count;

    let mut buf: Vec<u8> = Vec::new();
    buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let mut offsets: Vec<usize> = Vec::with_capacity(object_count);
    let write_obj = |buf: &mut Vec<u8>, offsets: &mut Vec<usize>, id: usize, body: &[u8]| {
        offsets.push(buf.len());
        buf.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
        buf.extend_from_slice(body);
        buf.extend_from_slice(b"\nendobj\n");
    };

    write_obj(
        &mut buf,
        &mut offsets,
        1,
        b"<< /Type /Catalog /Pages 2 0 R >>",
    );

    let kids: Vec<String> = (0..page_count)
        .map(|i| format!("{} 0 R", first_page_obj + 2 * i))
        .collect();
    write_obj(
        &mut buf,
        &mut offsets,
        2,
        format!(
            "<< /Type /Pages /Kids [{}] /Count {page_count} >>",
            kids.join(" ")
        )
        .as_bytes(),
    );

    write_obj(
        &mut buf,
        &mut offsets,
        3,
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
    );
    write_obj(
        &mut buf,
        &mut offsets,
        4,
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>",
    );

    let (width, height) = branding.dimensions();
    let color_space = if branding.is_grayscale() {
        "/DeviceGray"
    } else {
        "/DeviceRGB"
    };
    let mut image = format!(
        "<< /Type /XObject /Subtype /Image /Width {width} /Height {height} \
         /ColorSpace {color_space} /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
        branding.bytes().len()
    )
    .into_bytes();
    image.extend_from_slice(branding.bytes());
    image.extend_from_slice(b"\nendstream");
    write_obj(&mut buf, &mut offsets, 5, &image);

    for (index, runs) in pages.iter().enumerate() {
        let page_obj = first_page_obj + 2 * index;
        let content_obj = page_obj + 1;
        write_obj(
            &mut buf,
            &mut offsets,
            page_obj,
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /F1 3 0 R /F2 4 0 R >> /XObject << /Im1 5 0 R >> >> \
                 /Contents {content_obj} 0 R >>"
            )
            .as_bytes(),
        );

        let stream = content_stream(runs, footer_prefix, index + 1);
        let mut body = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        body.extend_from_slice(&stream);
        body.extend_from_slice(b"\nendstream");
        write_obj(&mut buf, &mut offsets, content_obj, &body);
    }

    let xref_offset = buf.len();
    buf.extend_from_slice(format!("xref\n0 {}\n", object_count + 1).as_bytes());
    buf.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        buf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    buf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            object_count + 1
        )
        .as_bytes(),
    );
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contest::render::tiny_jpeg;

    fn branding() -> BrandingAsset {
        BrandingAsset::from_jpeg_bytes(tiny_jpeg()).expect("fixture jpeg parses")
    }

    fn lines(count: usize) -> Vec<CertificateLine> {
        (0..count)
            .map(|i| CertificateLine {
                label: format!("Campo {i}"),
                value: format!("valor {i}"),
            })
            .collect()
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn output_is_byte_stable() {
        let lines = lines(5);
        let first = write_document("Titulo", &lines, "Data/Hora: 2024-06-01 12:00:00", &branding());
        let second =
            write_document("Titulo", &lines, "Data/Hora: 2024-06-01 12:00:00", &branding());
        assert_eq!(first, second);
    }

    #[test]
    fn rendered_text_is_greppable() {
        let lines = vec![CertificateLine {
            label: "Código de inscrição".to_string(),
            value: "CNA-0042".to_string(),
        }];
        let bytes = write_document("Titulo", &lines, "Data/Hora: x", &branding());
        assert!(contains(&bytes, b"CNA-0042"));
    }

    #[test]
    fn long_documents_paginate() {
        let bytes = write_document("Titulo", &lines(80), "Data/Hora: x", &branding());
        assert!(contains(&bytes, b"/Count 3"));
        assert!(contains(&bytes, b"(Data/Hora: x - P\xE1gina: 3)"));
    }

    #[test]
    fn literal_encoding_escapes_and_transliterates() {
        assert_eq!(encode_literal("a(b)c"), b"(a\\(b\\)c)".to_vec());
        assert_eq!(encode_literal("ã"), vec![b'(', 0xE3, b')']);
        assert_eq!(encode_literal("\u{1F600}"), b"(?)".to_vec());
    }

    #[test]
    fn wrap_field_respects_budgets() {
        let chunks = wrap_field("Rótulo", &"palavra ".repeat(40));
        assert!(chunks.len() > 1);
        assert!(chunks
            .iter()
            .all(|chunk| chunk.chars().count() <= MAX_LINE_CHARS));
    }
}
