//! Whole-file XLSX row table.
//!
//! The two tabular stores (marksheet, assignment sheet) are small spreadsheets
//! treated as key-value row stores: the first row holds column headers, every
//! later row is one record. Reads load the entire workbook; writes rebuild the
//! entire workbook and atomically replace the file (load → mutate → replace),
//! so a later rewrite can add locking without changing this contract. There is
//! no partial update and no transactional guarantee across concurrent writers.

use anyhow::{bail, Context, Result};
use std::io::{Read, Write};
use std::path::Path;

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// An in-memory spreadsheet table keyed by its header row.
#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    /// One vector per data row, aligned with `headers`. Short rows read as
    /// empty cells.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Case-insensitive header lookup.
    fn column(&self, header: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(header))
    }

    /// Cell value for `header` in row `row`, empty cells as `None`.
    pub fn get(&self, row: usize, header: &str) -> Option<&str> {
        let col = self.column(header)?;
        let value = self.rows.get(row)?.get(col)?.as_str();
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// Set a cell, growing the row if it is shorter than the header count.
    /// Returns false when the header or row does not exist.
    pub fn set(&mut self, row: usize, header: &str, value: &str) -> bool {
        let Some(col) = self.column(header) else {
            return false;
        };
        let Some(cells) = self.rows.get_mut(row) else {
            return false;
        };
        if cells.len() <= col {
            cells.resize(col + 1, String::new());
        }
        cells[col] = value.to_string();
        true
    }
}

/// Read the first worksheet of an XLSX file into a [`Table`].
///
/// Handles shared strings, inline strings, and raw numeric cells. An empty
/// worksheet yields a table with no headers and no rows.
pub fn read_table(path: &Path) -> Result<Table> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read spreadsheet: {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.as_slice()))
        .with_context(|| format!("Not a valid XLSX file: {}", path.display()))?;

    let shared_strings = read_shared_strings(&mut archive)?;
    let sheet_name = first_worksheet_name(&mut archive)?;
    let sheet_xml = read_zip_entry_bounded(&mut archive, &sheet_name, MAX_XML_ENTRY_BYTES)?;

    let mut all_rows = parse_sheet_rows(&sheet_xml, &shared_strings)?;
    if all_rows.is_empty() {
        return Ok(Table::new(Vec::new()));
    }

    let headers = all_rows.remove(0);
    Ok(Table {
        headers,
        rows: all_rows,
    })
}

/// Rebuild the workbook and atomically replace `path`.
///
/// The new file is written next to the target and renamed over it, so readers
/// never observe a half-written spreadsheet.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let tmp = tempfile::NamedTempFile::new_in(parent)?;
    write_workbook(tmp.as_file(), table)?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace spreadsheet: {}", path.display()))?;
    Ok(())
}

// ============ XLSX reading ============

fn read_zip_entry_bounded(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>> {
    let entry = archive
        .by_name(name)
        .with_context(|| format!("Missing workbook entry: {}", name))?;
    let mut out = Vec::new();
    entry.take(max_bytes).read_to_end(&mut out)?;
    if out.len() as u64 >= max_bytes {
        bail!("Workbook entry {} exceeds size limit ({} bytes)", name, max_bytes);
    }
    Ok(out)
}

fn read_shared_strings(archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>) -> Result<Vec<String>> {
    // Workbooks written with inline strings only have no sharedStrings part
    if archive.by_name("xl/sharedStrings.xml").is_err() {
        return Ok(Vec::new());
    }
    let xml = read_zip_entry_bounded(archive, "xl/sharedStrings.xml", MAX_XML_ENTRY_BYTES)?;

    let mut strings = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_si = false;
    let mut in_t = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"si" {
                    in_si = true;
                } else if in_si && e.local_name().as_ref() == b"t" {
                    in_t = true;
                }
            }
            Ok(quick_xml::events::Event::Text(te)) if in_t => {
                strings.push(te.unescape().unwrap_or_default().into_owned());
                in_t = false;
            }
            Ok(quick_xml::events::Event::Empty(e)) if in_si && e.local_name().as_ref() == b"t" => {
                strings.push(String::new());
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = false;
                    in_t = false;
                }
                b"t" => {
                    // <t></t> with no text still occupies a shared-string slot
                    if in_t {
                        strings.push(String::new());
                    }
                    in_t = false;
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => bail!("sharedStrings parse error: {}", e),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

fn first_worksheet_name(archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>) -> Result<String> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    names.sort_by_key(|name| {
        name.trim_start_matches("xl/worksheets/sheet")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    names
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Workbook contains no worksheets"))
}

/// Cell value type, from the `t` attribute on `<c>`.
#[derive(Clone, Copy, PartialEq)]
enum CellType {
    SharedString,
    InlineString,
    Other,
}

fn parse_sheet_rows(xml: &[u8], shared_strings: &[String]) -> Result<Vec<Vec<String>>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut current: Vec<String> = Vec::new();
    let mut in_row = false;
    let mut cell_type = CellType::Other;
    let mut cell_col: usize = 0;
    let mut in_v = false;
    let mut in_is_t = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    in_row = true;
                    current = Vec::new();
                }
                b"c" if in_row => {
                    cell_type = CellType::Other;
                    cell_col = current.len();
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"t" => {
                                cell_type = match attr.value.as_ref() {
                                    b"s" => CellType::SharedString,
                                    b"inlineStr" => CellType::InlineString,
                                    _ => CellType::Other,
                                };
                            }
                            b"r" => {
                                let r = String::from_utf8_lossy(&attr.value);
                                cell_col = column_index(&r);
                            }
                            _ => {}
                        }
                    }
                }
                b"v" => in_v = true,
                b"t" if cell_type == CellType::InlineString => in_is_t = true,
                _ => {}
            },
            Ok(quick_xml::events::Event::Text(te)) if in_v || in_is_t => {
                let raw = te.unescape().unwrap_or_default().into_owned();
                let value = if in_v && cell_type == CellType::SharedString {
                    raw.trim()
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| shared_strings.get(i).cloned())
                        .unwrap_or_default()
                } else {
                    raw
                };
                set_cell(&mut current, cell_col, value);
                in_v = false;
                in_is_t = false;
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"row" => {
                    in_row = false;
                    rows.push(std::mem::take(&mut current));
                }
                b"v" => in_v = false,
                b"t" => in_is_t = false,
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => bail!("worksheet parse error: {}", e),
            _ => {}
        }
        buf.clear();
    }

    // Drop trailing fully-empty rows that some writers emit
    while rows
        .last()
        .is_some_and(|r| r.iter().all(|c| c.is_empty()))
    {
        rows.pop();
    }

    Ok(rows)
}

fn set_cell(row: &mut Vec<String>, col: usize, value: String) {
    if row.len() <= col {
        row.resize(col + 1, String::new());
    }
    row[col] = value;
}

/// Zero-based column index from a cell reference like `"B12"`.
fn column_index(cell_ref: &str) -> usize {
    let mut idx: usize = 0;
    for c in cell_ref.chars().take_while(|c| c.is_ascii_alphabetic()) {
        idx = idx * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    idx.saturating_sub(1)
}

// ============ XLSX writing ============

/// Column letters for a zero-based index (`0 -> "A"`, `27 -> "AB"`).
fn column_letters(mut col: usize) -> String {
    let mut out = String::new();
    col += 1;
    while col > 0 {
        let rem = (col - 1) % 26;
        out.insert(0, (b'A' + rem as u8) as char);
        col = (col - 1) / 26;
    }
    out
}

fn write_workbook(file: &std::fs::File, table: &Table) -> Result<()> {
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#,
    )?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#,
    )?;

    zip.start_file("xl/workbook.xml", options)?;
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#,
    )?;

    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#,
    )?;

    zip.start_file("xl/worksheets/sheet1.xml", options)?;
    let mut sheet = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    let mut write_row = |row_num: usize, cells: &[String], sheet: &mut String| {
        sheet.push_str(&format!("<row r=\"{}\">", row_num));
        for (col, value) in cells.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            sheet.push_str(&format!(
                "<c r=\"{}{}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
                column_letters(col),
                row_num,
                quick_xml::escape::escape(value.as_str())
            ));
        }
        sheet.push_str("</row>");
    };
    write_row(1, &table.headers, &mut sheet);
    for (i, row) in table.rows.iter().enumerate() {
        write_row(i + 2, row, &mut sheet);
    }
    sheet.push_str("</sheetData></worksheet>");
    zip.write_all(sheet.as_bytes())?;

    zip.finish()?;
    Ok(())
}
