//! Report documents: a title, the summary body and the sales table.
//!
//! Three renderers are provided, [`PdfReport`], [`HtmlReport`] and
//! [`TextReport`], all behind the [`ReportRenderer`] trait so the pipeline
//! does not care which one it writes with.

use std::fmt::Write as _;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use printpdf::{BuiltinFont, Mm, PdfDocument};
use sales_core::error::{ReportError, Result};
use sales_core::formatting::TableRow;
use tracing::{debug, info};
use unicode_width::UnicodeWidthStr;

// ── ReportFormat ──────────────────────────────────────────────────────────────

/// Document format of the generated report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Pdf,
    Html,
    Text,
}

impl ReportFormat {
    /// File extension used for default output paths.
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Html => "html",
            ReportFormat::Text => "txt",
        }
    }

    /// The renderer producing this format.
    pub fn renderer(self) -> Box<dyn ReportRenderer> {
        match self {
            ReportFormat::Pdf => Box::new(PdfReport),
            ReportFormat::Html => Box::new(HtmlReport),
            ReportFormat::Text => Box::new(TextReport),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(ReportFormat::Pdf),
            "html" => Ok(ReportFormat::Html),
            "text" | "txt" => Ok(ReportFormat::Text),
            other => Err(ReportError::Config(format!(
                "unknown report format: {other}"
            ))),
        }
    }
}

// ── ReportRenderer ────────────────────────────────────────────────────────────

/// Writes a report document to disk.
pub trait ReportRenderer {
    /// Write `title`, `body` and `table` to `destination` and return the
    /// path written. `body` lines are separated by `\n`; the first table
    /// row is the header.
    fn render(&self, destination: &Path, title: &str, body: &str, table: &[TableRow])
        -> Result<PathBuf>;
}

/// Standalone HTML document with an escaped table.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlReport;

impl HtmlReport {
    /// Build the HTML text without touching the filesystem.
    pub fn document(title: &str, body: &str, table: &[TableRow]) -> String {
        let title = escape_html(title);
        let mut html = String::new();

        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        let _ = writeln!(html, "<title>{title}</title>");
        html.push_str("</head>\n<body>\n");
        let _ = writeln!(html, "<h1>{title}</h1>");

        let paragraph: Vec<String> = body.lines().map(escape_html).collect();
        let _ = writeln!(html, "<p>{}</p>", paragraph.join("<br/>"));

        if let Some((header, rows)) = table.split_first() {
            html.push_str("<table border=\"1\" cellpadding=\"4\">\n");
            push_html_row(&mut html, "th", header);
            for row in rows {
                push_html_row(&mut html, "td", row);
            }
            html.push_str("</table>\n");
        }

        html.push_str("</body>\n</html>\n");
        html
    }
}

impl ReportRenderer for HtmlReport {
    fn render(
        &self,
        destination: &Path,
        title: &str,
        body: &str,
        table: &[TableRow],
    ) -> Result<PathBuf> {
        write_document(destination, Self::document(title, body, table).as_bytes())
    }
}

/// Plain-text document with a column-aligned table.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextReport;

impl TextReport {
    /// Build the text document without touching the filesystem.
    pub fn document(title: &str, body: &str, table: &[TableRow]) -> String {
        let mut text = String::new();
        let _ = writeln!(text, "{title}");
        let _ = writeln!(text, "{}", "=".repeat(title.width()));
        text.push('\n');
        text.push_str(&Self::content(body, table));
        text
    }

    /// Body lines followed by the aligned table, without the title block.
    fn content(body: &str, table: &[TableRow]) -> String {
        let mut text = String::new();
        for line in body.lines() {
            let _ = writeln!(text, "{line}");
        }

        let Some((header, rows)) = table.split_first() else {
            return text;
        };
        text.push('\n');

        let columns = table.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![0usize; columns];
        for row in table {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.width());
            }
        }

        push_text_row(&mut text, header, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_text_row(&mut text, &rule, &widths);
        for row in rows {
            push_text_row(&mut text, row, &widths);
        }
        text
    }
}

impl ReportRenderer for TextReport {
    fn render(
        &self,
        destination: &Path,
        title: &str,
        body: &str,
        table: &[TableRow],
    ) -> Result<PathBuf> {
        write_document(destination, Self::document(title, body, table).as_bytes())
    }
}

// ── PdfReport ─────────────────────────────────────────────────────────────────

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const MARGIN_MM: f32 = 20.0;
const TITLE_SIZE: f32 = 18.0;
const TEXT_SIZE: f32 = 10.0;
const LINE_HEIGHT_MM: f32 = 5.0;
/// Space the title takes on the first page, in body lines.
const TITLE_LINES: usize = 3;

/// A4 PDF document. The title is set in Helvetica Bold; body and table use
/// Courier so the table keeps the [`TextReport`] column alignment.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfReport;

impl PdfReport {
    /// Encode the PDF in memory.
    pub fn document(title: &str, body: &str, table: &[TableRow]) -> Result<Vec<u8>> {
        let content = TextReport::content(body, table);
        let lines: Vec<&str> = content.lines().collect();
        let pages = paginate(&lines);

        let (doc, first_page, first_layer) =
            PdfDocument::new(title, PAGE_WIDTH, PAGE_HEIGHT, "Report");
        let title_font = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ReportError::Render(e.to_string()))?;
        let text_font = doc
            .add_builtin_font(BuiltinFont::Courier)
            .map_err(|e| ReportError::Render(e.to_string()))?;

        let top = PAGE_HEIGHT.0 - MARGIN_MM;
        for (number, page_lines) in pages.iter().enumerate() {
            let layer = if number == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page, layer) = doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Report");
                doc.get_page(page).get_layer(layer)
            };

            let mut row = 0;
            if number == 0 {
                layer.use_text(title, TITLE_SIZE, Mm(MARGIN_MM), Mm(top), &title_font);
                row = TITLE_LINES;
            }
            for line in page_lines {
                if !line.trim().is_empty() {
                    let y = top - row as f32 * LINE_HEIGHT_MM;
                    layer.use_text(*line, TEXT_SIZE, Mm(MARGIN_MM), Mm(y), &text_font);
                }
                row += 1;
            }
        }
        debug!("Laid out PDF report on {} pages", pages.len());

        let mut writer = BufWriter::new(Vec::new());
        doc.save(&mut writer)
            .map_err(|e| ReportError::Render(e.to_string()))?;
        writer
            .into_inner()
            .map_err(|e| ReportError::Render(e.to_string()))
    }
}

impl ReportRenderer for PdfReport {
    fn render(
        &self,
        destination: &Path,
        title: &str,
        body: &str,
        table: &[TableRow],
    ) -> Result<PathBuf> {
        write_document(destination, &Self::document(title, body, table)?)
    }
}

/// Number of body lines that fit between the top and bottom margins.
fn lines_per_page() -> usize {
    ((PAGE_HEIGHT.0 - 2.0 * MARGIN_MM) / LINE_HEIGHT_MM) as usize
}

/// Split `lines` into pages; the first page loses room to the title.
/// Always yields at least one page.
fn paginate<'a>(lines: &[&'a str]) -> Vec<Vec<&'a str>> {
    let per_page = lines_per_page();
    let first = per_page - TITLE_LINES;

    let mut pages = vec![lines.iter().take(first).copied().collect::<Vec<_>>()];
    if lines.len() > first {
        pages.extend(lines[first..].chunks(per_page).map(<[&str]>::to_vec));
    }
    pages
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn write_document(destination: &Path, contents: &[u8]) -> Result<PathBuf> {
    let write_err = |source| ReportError::FileWrite {
        path: destination.to_path_buf(),
        source,
    };

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(destination, contents).map_err(write_err)?;

    info!("Report written to {}", destination.display());
    Ok(destination.to_path_buf())
}

fn push_html_row(html: &mut String, tag: &str, cells: &[String]) {
    html.push_str("<tr>");
    for cell in cells {
        let _ = write!(html, "<{tag}>{}</{tag}>", escape_html(cell));
    }
    html.push_str("</tr>\n");
}

fn push_text_row(text: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        line.push_str(cell);
        let pad = widths[i].saturating_sub(cell.width());
        line.extend(std::iter::repeat(' ').take(pad));
    }
    text.push_str(line.trim_end());
    text.push('\n');
}

/// Escape the five characters with special meaning in HTML text and
/// attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
