//! Turning raw generated text into a summary and titled sections.
//!
//! Generated text arrives in many shapes: wrapped in a code fence, preceded
//! by chatty commentary, in HTML or markdown, with or without headings. The
//! parser normalizes all of these into HTML blocks. A level-1 heading before
//! any content is the document title and is dropped. When no heading is found
//! the whole body becomes a single `Overview` section and its first
//! paragraph doubles as the summary.

use std::sync::LazyLock;

use pep_core::Section;
use regex::Regex;

pub const FALLBACK_SECTION_TITLE: &str = "Overview";

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)```").expect("valid fence regex")
});

/// Puts every `<h1>`..`<h3>` element on its own line.
static HTML_HEADING_INLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(<h[1-3][^>]*>.*?</h[1-3]>)").expect("valid heading regex")
});

static HTML_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^<h([1-3])[^>]*>(.*?)</h[1-3]>$").expect("valid heading regex")
});

static MD_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,3})\s+(.+?)\s*#*$").expect("valid markdown heading regex"));

static FIRST_PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p[^>]*>.*?</p>").expect("valid paragraph regex"));

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid bold regex"));

/// Summary plus ordered sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub summary_html: String,
    pub sections: Vec<Section>,
}

/// Parse generated text. Returns `None` when there is no content at all.
#[must_use]
pub fn parse_synthesis(raw: &str) -> Option<ParsedDocument> {
    let body = strip_commentary(&strip_fences(raw));
    if body.trim().is_empty() {
        return None;
    }

    let mut preamble: Vec<&str> = Vec::new();
    let mut blocks: Vec<(String, Vec<&str>)> = Vec::new();
    let spaced = HTML_HEADING_INLINE_RE.replace_all(&body, "\n$1\n");
    for line in spaced.lines() {
        let trimmed = line.trim();
        match heading(trimmed) {
            Some((1, _)) if blocks.is_empty() && preamble.iter().all(|l| l.trim().is_empty()) => {}
            Some((_, title)) => blocks.push((title, Vec::new())),
            None => match blocks.last_mut() {
                Some((_, lines)) => lines.push(line),
                None => preamble.push(line),
            },
        }
    }

    let mut sections: Vec<Section> = blocks
        .into_iter()
        .map(|(title, lines)| (title, to_html(&lines.join("\n"))))
        .filter(|(_, html)| !html.is_empty())
        .zip(0u32..)
        .map(|((title, content_html), display_order)| Section {
            title,
            content_html,
            plain_summary: None,
            display_order,
        })
        .collect();

    let mut summary_html = to_html(&preamble.join("\n"));

    if sections.is_empty() {
        if summary_html.is_empty() {
            return None;
        }
        let overview = summary_html;
        summary_html = first_paragraph(&overview);
        sections.push(Section {
            title: FALLBACK_SECTION_TITLE.to_string(),
            content_html: overview,
            plain_summary: None,
            display_order: 0,
        });
    } else if summary_html.is_empty() {
        summary_html = first_paragraph(&sections[0].content_html);
    }

    Some(ParsedDocument {
        summary_html,
        sections,
    })
}

/// Take the body of the first fenced block, if any.
fn strip_fences(raw: &str) -> String {
    FENCE_RE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| raw.to_string(), |m| m.as_str().to_string())
}

/// Drop lines before the first line that looks like content (markup or a
/// markdown heading). Plain prose without any markup is kept whole.
fn strip_commentary(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    lines
        .iter()
        .position(|l| {
            let t = l.trim_start();
            t.starts_with('<') || t.starts_with('#')
        })
        .map_or_else(|| text.trim().to_string(), |start| lines[start..].join("\n"))
}

/// `(level, title)` for a heading line.
fn heading(line: &str) -> Option<(usize, String)> {
    if let Some(caps) = HTML_HEADING_RE.captures(line) {
        let level = caps[1].parse().unwrap_or(2);
        let title = TAG_RE.replace_all(&caps[2], "").trim().to_string();
        return (!title.is_empty()).then_some((level, title));
    }
    MD_HEADING_RE
        .captures(line)
        .map(|caps| (caps[1].len(), caps[2].trim().to_string()))
}

/// Normalize a block to HTML. Blocks that already contain block-level markup
/// are kept; plain or markdown text is wrapped in `<p>`/`<ul>`.
fn to_html(block: &str) -> String {
    let block = block.trim();
    if block.is_empty() {
        return String::new();
    }
    if block.starts_with('<') {
        return block.to_string();
    }

    let mut out = Vec::new();
    for para in block.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let lines: Vec<&str> = para.lines().map(str::trim).collect();
        let is_list = lines
            .iter()
            .all(|l| l.starts_with("- ") || l.starts_with("* "));
        if is_list {
            let items: String = lines
                .iter()
                .map(|l| format!("<li>{}</li>", inline_markdown(&l[2..])))
                .collect();
            out.push(format!("<ul>{items}</ul>"));
        } else {
            out.push(format!("<p>{}</p>", inline_markdown(&lines.join(" "))));
        }
    }
    out.join("\n")
}

fn inline_markdown(text: &str) -> String {
    BOLD_RE.replace_all(text, "<strong>$1</strong>").into_owned()
}

/// First `<p>` element of `html`, or the whole block when there is none.
fn first_paragraph(html: &str) -> String {
    FIRST_PARAGRAPH_RE
        .find(html)
        .map_or_else(|| html.to_string(), |m| m.as_str().to_string())
}

/// Remove markup, leaving plain text.
#[must_use]
pub fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, " ").split_whitespace().collect::<Vec<_>>().join(" ")
}
