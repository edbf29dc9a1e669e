//! Minimal Office Open XML workbook writer for styled exports
//!
//! Produces a single-sheet `.xlsx` package with inline strings and a fixed
//! style table. Archive timestamps are pinned so the same result always
//! yields the same bytes.

use crate::error::Result;
use crate::export::header;
use crate::result::{ComparisonResult, OutputRow, PrePost, RowStatus};
use std::fmt::Write as _;
use std::io::{Seek, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const SHEET_NAME: &str = "Reconciliation Results";
const EMPTY_NOTE: &str = "No discrepancies found - data matches perfectly!";
const MAX_COLUMN_WIDTH: usize = 40;
const WIDTH_SAMPLE_ROWS: usize = 100;

/// Cell formats, indices into `cellXfs` of the style sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    Plain = 0,
    Header = 1,
    Pre = 2,
    Post = 3,
    MismatchCell = 4,
    OnlyInSql = 5,
    OnlyInFile = 6,
    Note = 7,
}

impl CellStyle {
    fn id(self) -> u32 {
        self as u32
    }
}

/// Style of one data cell
///
/// A mismatching cell is highlighted regardless of whether it sits on the
/// pre or the post row.
pub fn cell_style(row: &OutputRow, column: &str) -> CellStyle {
    if row.status == RowStatus::Mismatch && row.is_mismatch_cell(column) {
        return CellStyle::MismatchCell;
    }
    row_style(row)
}

fn row_style(row: &OutputRow) -> CellStyle {
    match (row.status, row.pre_post) {
        (_, PrePost::Pre) => CellStyle::Pre,
        (_, PrePost::Post) => CellStyle::Post,
        (RowStatus::OnlyInSql, _) => CellStyle::OnlyInSql,
        (RowStatus::OnlyInFile, _) => CellStyle::OnlyInFile,
        (RowStatus::Mismatch, PrePost::Absent) => CellStyle::Plain,
    }
}

/// Styled workbook over one comparison result
pub struct StyledWorkbook<'a> {
    result: &'a ComparisonResult,
}

impl<'a> StyledWorkbook<'a> {
    pub fn new(result: &'a ComparisonResult) -> Self {
        Self { result }
    }

    /// Write the complete `.xlsx` package
    pub fn write<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        let mut zip = ZipWriter::new(writer);
        let parts: [(&str, String); 6] = [
            ("[Content_Types].xml", CONTENT_TYPES.to_string()),
            ("_rels/.rels", ROOT_RELS.to_string()),
            ("xl/workbook.xml", workbook_xml()),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
            ("xl/styles.xml", STYLES.to_string()),
            ("xl/worksheets/sheet1.xml", self.sheet_xml()),
        ];

        for (name, content) in parts.iter() {
            zip.start_file(*name, options)?;
            zip.write_all(content.as_bytes())?;
        }

        zip.finish()?;
        Ok(())
    }

    /// Worksheet part: header row, one row per output row
    pub fn sheet_xml(&self) -> String {
        let header = header(self.result);
        let mut xml = String::with_capacity(256 + self.result.rows.len() * 64 * header.len());

        xml.push_str(XML_DECL);
        xml.push_str(r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
        xml.push_str(r#"<sheetViews><sheetView workbookViewId="0"><pane ySplit="1" topLeftCell="A2" activePane="bottomLeft" state="frozen"/></sheetView></sheetViews>"#);

        xml.push_str("<cols>");
        for (idx, width) in self.column_widths().iter().enumerate() {
            let _ = write!(
                xml,
                r#"<col min="{n}" max="{n}" width="{w}" customWidth="1"/>"#,
                n = idx + 1,
                w = width
            );
        }
        xml.push_str("</cols><sheetData>");

        xml.push_str(r#"<row r="1">"#);
        for (col, name) in header.iter().enumerate() {
            push_cell(&mut xml, col, 1, name, CellStyle::Header);
        }
        xml.push_str("</row>");

        for (idx, row) in self.result.rows.iter().enumerate() {
            let r = idx + 2;
            let base = row_style(row);
            let _ = write!(xml, r#"<row r="{}">"#, r);
            push_cell(&mut xml, 0, r, row.status.as_str(), base);
            push_cell(&mut xml, 1, r, row.pre_post.as_str(), base);
            for (offset, column) in self.result.columns.iter().enumerate() {
                let value = row.values.get(column).map(String::as_str).unwrap_or("");
                push_cell(&mut xml, offset + 2, r, value, cell_style(row, column));
            }
            xml.push_str("</row>");
        }

        if self.result.rows.is_empty() {
            xml.push_str(r#"<row r="2">"#);
            push_cell(&mut xml, 0, 2, EMPTY_NOTE, CellStyle::Note);
            xml.push_str("</row>");
        }

        xml.push_str("</sheetData></worksheet>");
        xml
    }

    /// Character widths sized from the header and the first rows, capped
    fn column_widths(&self) -> Vec<usize> {
        let header = header(self.result);
        let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();

        for row in self.result.rows.iter().take(WIDTH_SAMPLE_ROWS) {
            widths[0] = widths[0].max(row.status.as_str().len());
            widths[1] = widths[1].max(row.pre_post.as_str().len());
            for (offset, column) in self.result.columns.iter().enumerate() {
                let len = row.values.get(column).map(|v| v.chars().count()).unwrap_or(0);
                widths[offset + 2] = widths[offset + 2].max(len);
            }
        }

        widths
            .into_iter()
            .map(|w| (w + 3).min(MAX_COLUMN_WIDTH))
            .collect()
    }
}

fn push_cell(xml: &mut String, col: usize, row: usize, text: &str, style: CellStyle) {
    let _ = write!(
        xml,
        r#"<c r="{}{}" s="{}" t="inlineStr"><is>"#,
        column_letter(col),
        row,
        style.id()
    );
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        xml.push_str(r#"<t xml:space="preserve">"#);
    } else {
        xml.push_str("<t>");
    }
    escape_into(xml, text);
    xml.push_str("</t></is></c>");
}

/// Zero-based column index to spreadsheet letters (0 → A, 26 → AA)
pub fn column_letter(mut idx: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (idx % 26) as u8);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// XML text escaping; characters XML 1.0 cannot carry are dropped
fn escape_into(xml: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => xml.push_str("&amp;"),
            '<' => xml.push_str("&lt;"),
            '>' => xml.push_str("&gt;"),
            '"' => xml.push_str("&quot;"),
            '\t' | '\n' | '\r' => xml.push(ch),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => xml.push(c),
        }
    }
}

fn workbook_xml() -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name=""#);
    escape_into(&mut xml, SHEET_NAME);
    xml.push_str(r#"" sheetId="1" r:id="rId1"/></sheets></workbook>"#);
    xml
}

const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

const CONTENT_TYPES: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
    r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
    "</Types>"
);

const ROOT_RELS: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    "</Relationships>"
);

const WORKBOOK_RELS: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
    "</Relationships>"
);

// Fill colors: header slate, pre yellow, post green, mismatch red,
// SQL-only amber, file-only rose. cellXfs order matches `CellStyle`.
const STYLES: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<fonts count="4">"#,
    r#"<font><sz val="11"/><name val="Calibri"/></font>"#,
    r#"<font><b/><sz val="10"/><color rgb="FFFFFFFF"/><name val="Calibri"/></font>"#,
    r#"<font><b/><sz val="11"/><color rgb="FF7F1D1D"/><name val="Calibri"/></font>"#,
    r#"<font><b/><sz val="12"/><color rgb="FF16A34A"/><name val="Calibri"/></font>"#,
    "</fonts>",
    r#"<fills count="8">"#,
    r#"<fill><patternFill patternType="none"/></fill>"#,
    r#"<fill><patternFill patternType="gray125"/></fill>"#,
    r#"<fill><patternFill patternType="solid"><fgColor rgb="FF334155"/><bgColor indexed="64"/></patternFill></fill>"#,
    r#"<fill><patternFill patternType="solid"><fgColor rgb="FFFEF9C3"/><bgColor indexed="64"/></patternFill></fill>"#,
    r#"<fill><patternFill patternType="solid"><fgColor rgb="FFDCFCE7"/><bgColor indexed="64"/></patternFill></fill>"#,
    r#"<fill><patternFill patternType="solid"><fgColor rgb="FFFECACA"/><bgColor indexed="64"/></patternFill></fill>"#,
    r#"<fill><patternFill patternType="solid"><fgColor rgb="FFFDE68A"/><bgColor indexed="64"/></patternFill></fill>"#,
    r#"<fill><patternFill patternType="solid"><fgColor rgb="FFFECDD3"/><bgColor indexed="64"/></patternFill></fill>"#,
    "</fills>",
    r#"<borders count="2">"#,
    r#"<border><left/><right/><top/><bottom/><diagonal/></border>"#,
    r#"<border><left style="thin"><color rgb="FFD1D5DB"/></left><right style="thin"><color rgb="FFD1D5DB"/></right><top style="thin"><color rgb="FFD1D5DB"/></top><bottom style="thin"><color rgb="FFD1D5DB"/></bottom><diagonal/></border>"#,
    "</borders>",
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="8">"#,
    r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="1" xfId="0" applyBorder="1"/>"#,
    r#"<xf numFmtId="0" fontId="1" fillId="2" borderId="1" xfId="0" applyFont="1" applyFill="1" applyBorder="1" applyAlignment="1"><alignment horizontal="center"/></xf>"#,
    r#"<xf numFmtId="0" fontId="0" fillId="3" borderId="1" xfId="0" applyFill="1" applyBorder="1"/>"#,
    r#"<xf numFmtId="0" fontId="0" fillId="4" borderId="1" xfId="0" applyFill="1" applyBorder="1"/>"#,
    r#"<xf numFmtId="0" fontId="2" fillId="5" borderId="1" xfId="0" applyFont="1" applyFill="1" applyBorder="1"/>"#,
    r#"<xf numFmtId="0" fontId="0" fillId="6" borderId="1" xfId="0" applyFill="1" applyBorder="1"/>"#,
    r#"<xf numFmtId="0" fontId="0" fillId="7" borderId="1" xfId="0" applyFill="1" applyBorder="1"/>"#,
    r#"<xf numFmtId="0" fontId="3" fillId="0" borderId="0" xfId="0" applyFont="1"/>"#,
    "</cellXfs>",
    r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
    "</styleSheet>"
);
