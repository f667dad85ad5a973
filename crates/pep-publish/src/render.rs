//! Fixed-layout document rendering.
//!
//! [`PdfRenderer`] writes a plain PDF 1.4 file using the standard Helvetica
//! fonts (no embedding): title, a coloured evidence-grade badge, summary,
//! sections with lay summaries, references and disclaimers. Output depends
//! only on the record, so identical records render to identical bytes.

use std::fmt::Write as _;

use pep_core::{EvidenceGrade, PageRecord, Study};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("record for '{0}' has no content to render")]
    NoContent(String),
}

/// Turns a page record into document bytes.
pub trait DocumentRenderer: Send + Sync {
    /// # Errors
    ///
    /// Returns [`RenderError`] when the record cannot be laid out.
    fn render(&self, record: &PageRecord) -> Result<Vec<u8>, RenderError>;

    /// MIME type of the rendered bytes.
    fn content_type(&self) -> &'static str;
}

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 54.0;
const BODY_SIZE: f32 = 10.5;
/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

#[derive(Clone, Copy)]
enum Font {
    Regular,
    Bold,
    Italic,
}

impl Font {
    const fn resource(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
            Self::Italic => "F3",
        }
    }
}

/// Badge fill colour per grade, as RGB in 0..=1.
#[must_use]
pub const fn badge_color(grade: EvidenceGrade) -> (f32, f32, f32) {
    match grade {
        EvidenceGrade::High => (0.13, 0.55, 0.13),
        EvidenceGrade::Moderate => (0.16, 0.42, 0.75),
        EvidenceGrade::Low => (0.90, 0.55, 0.10),
        EvidenceGrade::VeryLow => (0.75, 0.15, 0.15),
    }
}

/// Default renderer producing `application/pdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

impl DocumentRenderer for PdfRenderer {
    fn render(&self, record: &PageRecord) -> Result<Vec<u8>, RenderError> {
        if record.sections.is_empty() && strip_markup(&record.summary_html).is_empty() {
            return Err(RenderError::NoContent(record.peptide.slug.clone()));
        }

        let mut layout = Layout::new();
        layout.text_line(&record.peptide.name, Font::Bold, 22.0);
        layout.badge(record.grade);
        layout.text_line(
            &format!(
                "Version {}  |  Updated {}  |  {} studies ({} human controlled, {} animal)",
                record.version,
                record.last_updated.format("%Y-%m-%d"),
                record.study_count(),
                record.human_controlled_count,
                record.animal_count
            ),
            Font::Regular,
            9.0,
        );
        layout.gap(10.0);

        layout.heading("Summary");
        layout.html(&record.summary_html);

        for section in &record.sections {
            layout.heading(&section.title);
            layout.html(&section.content_html);
            if let Some(plain) = &section.plain_summary {
                layout.paragraph(&format!("In plain terms: {plain}"), Font::Italic, BODY_SIZE);
            }
        }

        if !record.studies.is_empty() {
            layout.heading("References");
            for study in &record.studies {
                layout.paragraph(&reference_line(study), Font::Regular, 8.5);
            }
        }

        layout.heading("Disclaimers");
        for disclaimer in &record.disclaimers {
            layout.paragraph(disclaimer, Font::Italic, 8.5);
        }

        Ok(write_pdf(&record.peptide.name, &layout.finish()))
    }

    fn content_type(&self) -> &'static str {
        "application/pdf"
    }
}

fn reference_line(study: &Study) -> String {
    let year = study.year().map_or_else(|| "n.d.".to_string(), |y| y.to_string());
    match study {
        Study::Literature(article) => {
            let authors = match article.authors.as_slice() {
                [] => String::new(),
                [one] => format!("{one}. "),
                [first, ..] => format!("{first} et al. "),
            };
            format!(
                "[{}] {authors}{} {}. {year}.",
                article.id, article.title, article.journal
            )
        }
        Study::Trial(trial) => format!("[{}] {} ({}, {year}).", trial.id, trial.title, trial.status),
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Accumulates content-stream operators, breaking pages as needed.
struct Layout {
    pages: Vec<String>,
    current: String,
    y: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: String::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.pages.push(std::mem::take(&mut self.current));
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn text_line(&mut self, text: &str, font: Font, size: f32) {
        let leading = size * 1.35;
        self.ensure_room(leading);
        self.y -= leading;
        let _ = writeln!(
            self.current,
            "BT /{} {size:.1} Tf {MARGIN:.1} {:.1} Td ({}) Tj ET",
            font.resource(),
            self.y,
            escape_pdf_text(text)
        );
    }

    fn paragraph(&mut self, text: &str, font: Font, size: f32) {
        for line in wrap(text, size) {
            self.text_line(&line, font, size);
        }
        self.gap(size * 0.5);
    }

    fn heading(&mut self, text: &str) {
        self.gap(6.0);
        self.ensure_room(40.0);
        self.text_line(text, Font::Bold, 13.0);
        self.gap(2.0);
    }

    fn html(&mut self, html: &str) {
        for block in html_blocks(html) {
            self.paragraph(&block, Font::Regular, BODY_SIZE);
        }
    }

    fn badge(&mut self, grade: EvidenceGrade) {
        let height = 20.0;
        self.ensure_room(height + 8.0);
        self.y -= height + 6.0;
        let label = format!("Evidence grade: {}", grade.label());
        #[allow(clippy::cast_precision_loss)]
        let width = (label.len() as f32).mul_add(10.0 * 0.55, 16.0);
        let (r, g, b) = badge_color(grade);
        let _ = writeln!(
            self.current,
            "q {r:.2} {g:.2} {b:.2} rg {MARGIN:.1} {:.1} {width:.1} {height:.1} re f Q",
            self.y
        );
        let _ = writeln!(
            self.current,
            "BT 1 1 1 rg /F2 10.0 Tf {:.1} {:.1} Td ({}) Tj ET",
            MARGIN + 8.0,
            self.y + 6.0,
            escape_pdf_text(&label)
        );
        self.gap(4.0);
    }

    fn finish(mut self) -> Vec<String> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

/// Greedy word wrap using an average glyph width.
fn wrap(text: &str, size: f32) -> Vec<String> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let max_chars = ((PAGE_WIDTH - 2.0 * MARGIN) / (size * AVG_GLYPH_WIDTH)) as usize;
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.len() + 1 + word.len() > max_chars {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Split HTML into plain-text blocks: one per paragraph, heading or list item.
fn html_blocks(html: &str) -> Vec<String> {
    let mut marked = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = rest.find('<') {
        marked.push_str(&rest[..start]);
        let Some(end) = rest[start..].find('>') else {
            rest = "";
            break;
        };
        let tag = rest[start + 1..start + end].trim().to_ascii_lowercase();
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or_default();
        match name {
            "li" if !tag.starts_with('/') => marked.push_str("\n- "),
            "p" | "li" | "ul" | "ol" | "h1" | "h2" | "h3" | "h4" | "br" | "div" => {
                marked.push('\n');
            }
            _ => {}
        }
        rest = &rest[start + end + 1..];
    }
    marked.push_str(rest);

    decode_entities(&marked)
        .lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|l| !l.is_empty() && l != "-")
        .collect()
}

fn strip_markup(html: &str) -> String {
    html_blocks(html).join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Escape a string for a PDF literal, folding text to the ASCII subset the
/// standard fonts render reliably.
fn escape_pdf_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2264}' => out.push_str("<="),
            '\u{2265}' => out.push_str(">="),
            '\u{00B5}' | '\u{03BC}' => out.push('u'),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// PDF serialization
// ---------------------------------------------------------------------------

/// Serialize pages into a PDF 1.4 file with a correct cross-reference table.
fn write_pdf(title: &str, pages: &[String]) -> Vec<u8> {
    // 1 catalog, 2 pages, 3-5 fonts, 6 info, then (page, content) pairs.
    let first_page_obj = 7;
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| first_page_obj + i * 2).collect();

    let mut objects: Vec<String> = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            page_ids
                .iter()
                .map(|id| format!("{id} 0 R"))
                .collect::<Vec<_>>()
                .join(" "),
            pages.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".into(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .into(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Oblique /Encoding /WinAnsiEncoding >>"
            .into(),
        format!(
            "<< /Title ({}) /Producer (pep-publish) >>",
            escape_pdf_text(title)
        ),
    ];
    for (content, page_id) in pages.iter().zip(&page_ids) {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH:.0} {PAGE_HEIGHT:.0}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R /F3 5 0 R >> >> /Contents {} 0 R >>",
            page_id + 1
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{content}endstream",
            content.len()
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        let _ = write!(out, "{} 0 obj\n{body}\nendobj\n", i + 1);
    }
    let xref_offset = out.len();
    let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = write!(out, "{offset:010} 00000 n \n");
    }
    let _ = write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R /Info 6 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    );
    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use pep_core::{LiteratureStudy, PeptideIdentity, Section, StudyDesign};
    use pretty_assertions::assert_eq;

    use super::*;

    fn record(sections: usize) -> PageRecord {
        PageRecord::draft(
            PeptideIdentity::from_name("BPC-157", vec![]).unwrap(),
            EvidenceGrade::Low,
            "<p>BPC-157 (a pentadecapeptide) is studied in rodents [PMID:1].</p>".into(),
            (0..sections)
                .map(|i| Section {
                    title: format!("Section {i}"),
                    content_html: "<p>Rat studies reported faster healing [PMID:1].</p><ul><li>Tendon</li><li>Gut</li></ul>"
                        .into(),
                    plain_summary: Some("Rats healed faster.".into()),
                    display_order: u32::try_from(i).unwrap(),
                })
                .collect(),
            vec![Study::Literature(LiteratureStudy {
                id: "PMID:1".into(),
                title: "Tendon healing".into(),
                abstract_text: None,
                authors: vec!["Sikiric P".into(), "Seiwerth S".into()],
                journal: "J Orthop Res".into(),
                year: Some(2011),
                doc_id: None,
                study_design: StudyDesign::AnimalInVivo,
            })],
        )
    }

    #[test]
    fn renders_valid_pdf_envelope() {
        let bytes = PdfRenderer.render(&record(2)).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("%PDF-1.4\n"));
        assert!(text.ends_with("%%EOF\n"));
        assert!(text.contains("(Evidence grade: Low) Tj"));
        assert!(text.contains("0.90 0.55 0.10 rg"));
        assert!(text.contains("BPC-157 \\(a pentadecapeptide\\)"));
        assert!(text.contains("[PMID:1] Sikiric P et al. Tendon healing J Orthop Res. 2011."));
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let bytes = PdfRenderer.render(&record(1)).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let xref_start: usize = text
            .rsplit("startxref\n")
            .next()
            .unwrap()
            .lines()
            .next()
            .unwrap()
            .parse()
            .unwrap();
        assert!(text[xref_start..].starts_with("xref\n"));

        let entries: Vec<usize> = text[xref_start..]
            .lines()
            .skip(3)
            .take_while(|l| l.ends_with(" n "))
            .map(|l| l[..10].parse().unwrap())
            .collect();
        for (i, offset) in entries.iter().enumerate() {
            assert!(text[*offset..].starts_with(&format!("{} 0 obj", i + 1)));
        }
    }

    #[test]
    fn long_records_span_pages() {
        let bytes = PdfRenderer.render(&record(40)).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.matches("/Type /Page ").count() > 1);
    }

    #[test]
    fn rendering_is_deterministic() {
        let record = record(3);
        assert_eq!(
            PdfRenderer.render(&record).unwrap(),
            PdfRenderer.render(&record).unwrap()
        );
    }

    #[test]
    fn empty_record_is_rejected() {
        let mut empty = record(0);
        empty.summary_html = "<p></p>".into();
        assert!(matches!(PdfRenderer.render(&empty), Err(RenderError::NoContent(_))));
    }

    #[test]
    fn html_blocks_split_paragraphs_and_items() {
        assert_eq!(
            html_blocks("<p>A &amp; B</p><ul><li>one</li><li>two</li></ul>"),
            vec!["A & B", "- one", "- two"]
        );
    }

    #[test]
    fn non_ascii_is_folded() {
        assert_eq!(escape_pdf_text("10 \u{00B5}g \u{2264} 5 \u{2014} ok\u{2122}"), "10 ug <= 5 - ok?");
    }
}
