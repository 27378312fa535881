//! Forward-only worksheet with a bounded in-memory row window
//!
//! Only the most recent `rows_in_memory` rows are held as [`Row`] values and
//! can still be modified. Creating a row beyond the window serializes the
//! oldest one into a compressed [`RowSpill`]. Column widths are kept aside
//! and emitted ahead of the rows when the sheet is finished, so they can be
//! decided after the last row has been seen.

use super::spill::RowSpill;
use super::xml_writer::XmlWriter;
use crate::error::{ExcelError, Result};
use crate::types::{push_column_letter, Cell, CellValue, Row};
use std::collections::{BTreeMap, VecDeque};
use std::io::Write;

/// Excel worksheet maximum row count
pub const MAX_ROWS: u32 = 1_048_576;
/// Excel worksheet maximum column count
pub const MAX_COLUMNS: u32 = 16_384;

/// Hyperlink collected while rows are serialized
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Hyperlink {
    pub(crate) row: u32,
    pub(crate) col: u32,
    pub(crate) target: String,
}

/// A sheet being filled row by row
pub struct Worksheet {
    id: u32,
    name: String,
    rows_in_memory: usize,
    window: VecDeque<Row>,
    spill: Option<RowSpill>,
    last_row: Option<u32>,
    column_widths: BTreeMap<u32, u32>,
    hyperlinks: Vec<Hyperlink>,
}

impl Worksheet {
    pub(crate) fn new(id: u32, name: &str, rows_in_memory: usize) -> Self {
        Worksheet {
            id,
            name: name.to_string(),
            rows_in_memory: rows_in_memory.max(1),
            window: VecDeque::with_capacity(rows_in_memory.clamp(1, 1024)),
            spill: None,
            last_row: None,
            column_widths: BTreeMap::new(),
            hyperlinks: Vec::new(),
        }
    }

    /// 1-based position of the sheet in its workbook
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create the row at `index`, which must be above every row created so far
    pub fn create_row(&mut self, index: u32) -> Result<&mut Row> {
        if index >= MAX_ROWS {
            return Err(ExcelError::LimitExceeded(format!(
                "row {} in sheet '{}' is beyond the {} row limit",
                index + 1,
                self.name,
                MAX_ROWS
            )));
        }
        if let Some(last) = self.last_row {
            if index <= last {
                return Err(ExcelError::RowOutOfOrder {
                    sheet: self.name.clone(),
                    row: index,
                    last,
                });
            }
        }

        self.window.push_back(Row::new(index));
        self.last_row = Some(index);
        while self.window.len() > self.rows_in_memory {
            self.flush_oldest()?;
        }

        self.window
            .back_mut()
            .ok_or_else(|| ExcelError::WriteError("row window is empty".to_string()))
    }

    fn flush_oldest(&mut self) -> Result<()> {
        let Some(row) = self.window.pop_front() else {
            return Ok(());
        };
        if self.spill.is_none() {
            log::debug!(
                "Sheet '{}' exceeded {} rows in memory, spilling older rows",
                self.name,
                self.rows_in_memory
            );
            self.spill = Some(RowSpill::new()?);
        }
        if let Some(spill) = self.spill.as_mut() {
            spill.append(&row, &mut self.hyperlinks)?;
        }
        Ok(())
    }

    /// Row still held in memory, `None` once flushed or never created
    pub fn row(&self, index: u32) -> Option<&Row> {
        self.window
            .binary_search_by_key(&index, Row::index)
            .ok()
            .and_then(|pos| self.window.get(pos))
    }

    /// Mutable access to a row still held in memory
    pub fn row_mut(&mut self, index: u32) -> Option<&mut Row> {
        let pos = self.window.binary_search_by_key(&index, Row::index).ok()?;
        self.window.get_mut(pos)
    }

    /// Set a column width in 1/256 character units
    pub fn set_column_width(&mut self, col: u32, units: u32) -> Result<()> {
        if col >= MAX_COLUMNS {
            return Err(ExcelError::LimitExceeded(format!(
                "column {} in sheet '{}' is beyond the {} column limit",
                col + 1,
                self.name,
                MAX_COLUMNS
            )));
        }
        self.column_widths.insert(col, units);
        Ok(())
    }

    /// Column width in 1/256 character units, if one was set
    pub fn column_width(&self, col: u32) -> Option<u32> {
        self.column_widths.get(&col).copied()
    }

    /// Index of the last created row
    pub fn last_row_index(&self) -> Option<u32> {
        self.last_row
    }

    /// Rows created so far (in memory and flushed)
    pub fn row_count(&self) -> u32 {
        self.flushed_row_count() + self.window.len() as u32
    }

    /// Rows currently held in memory
    pub fn rows_in_window(&self) -> usize {
        self.window.len()
    }

    /// Rows already serialized to the spill
    pub fn flushed_row_count(&self) -> u32 {
        self.spill.as_ref().map_or(0, RowSpill::rows)
    }

    /// Write the complete worksheet XML; returns hyperlink targets in
    /// relationship order (`rId1`, `rId2`, ...)
    pub(crate) fn write_xml<W: Write>(mut self, xml: &mut XmlWriter<W>) -> Result<Vec<String>> {
        xml.declaration()?;
        xml.start_element("worksheet")?;
        xml.attribute(
            "xmlns",
            "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
        )?;
        xml.attribute(
            "xmlns:r",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships",
        )?;
        xml.close_start_tag()?;

        if !self.column_widths.is_empty() {
            xml.start_element("cols")?;
            xml.close_start_tag()?;
            for (col, units) in &self.column_widths {
                let width = *units as f64 / 256.0;
                xml.start_element("col")?;
                xml.attribute_int("min", col + 1)?;
                xml.attribute_int("max", col + 1)?;
                xml.attribute("width", &width.to_string())?;
                xml.attribute("customWidth", "1")?;
                xml.close_empty()?;
            }
            xml.end_element("cols")?;
        }

        xml.start_element("sheetData")?;
        xml.close_start_tag()?;
        if let Some(spill) = self.spill.take() {
            spill.copy_into(xml)?;
        }
        for row in &self.window {
            write_row_xml(xml, row, &mut self.hyperlinks)?;
        }
        xml.end_element("sheetData")?;

        if !self.hyperlinks.is_empty() {
            xml.start_element("hyperlinks")?;
            xml.close_start_tag()?;
            for (i, link) in self.hyperlinks.iter().enumerate() {
                let mut reference = Vec::with_capacity(8);
                push_column_letter(&mut reference, link.col);
                xml.start_element("hyperlink")?;
                xml.write_str(" ref=\"")?;
                xml.write_raw(&reference)?;
                xml.write_int(link.row + 1)?;
                xml.write_str("\"")?;
                xml.attribute("r:id", &format!("rId{}", i + 1))?;
                xml.close_empty()?;
            }
            xml.end_element("hyperlinks")?;
        }

        xml.end_element("worksheet")?;
        Ok(self.hyperlinks.into_iter().map(|link| link.target).collect())
    }
}

/// Serialize one `<row>`; absent cells are not emitted
pub(crate) fn write_row_xml<W: Write>(
    xml: &mut XmlWriter<W>,
    row: &Row,
    hyperlinks: &mut Vec<Hyperlink>,
) -> Result<()> {
    let row_number = row.index() + 1;
    xml.start_element("row")?;
    xml.attribute_int("r", row_number)?;
    if row.is_empty() {
        return xml.close_empty();
    }
    xml.close_start_tag()?;

    let mut reference = Vec::with_capacity(8);
    for (col, cell) in row.cells() {
        reference.clear();
        push_column_letter(&mut reference, col);

        xml.write_str("<c r=\"")?;
        xml.write_raw(&reference)?;
        xml.write_int(row_number)?;
        xml.write_str("\"")?;
        if cell.style.index() > 0 {
            xml.attribute_int("s", cell.style.index())?;
        }
        write_cell_value(xml, cell)?;

        if let Some(target) = &cell.hyperlink {
            hyperlinks.push(Hyperlink {
                row: row.index(),
                col,
                target: target.clone(),
            });
        }
    }

    xml.end_element("row")
}

fn write_cell_value<W: Write>(xml: &mut XmlWriter<W>, cell: &Cell) -> Result<()> {
    match &cell.value {
        CellValue::String(s) => write_inline_string(xml, s),
        CellValue::Number(n) if n.is_finite() => {
            xml.write_str("><v>")?;
            xml.write_str(&n.to_string())?;
            xml.write_str("</v></c>")
        }
        CellValue::Number(_) => xml.write_str(" t=\"e\"><v>#NUM!</v></c>"),
        CellValue::Bool(b) => {
            xml.write_str(" t=\"b\"><v>")?;
            xml.write_str(if *b { "1" } else { "0" })?;
            xml.write_str("</v></c>")
        }
        CellValue::Date(d) => match CellValue::excel_serial(*d) {
            Some(serial) => {
                xml.write_str("><v>")?;
                xml.write_str(&serial.to_string())?;
                xml.write_str("</v></c>")
            }
            // no serial before 1900
            None => write_inline_string(xml, &d.format("%d.%m.%Y").to_string()),
        },
    }
}

fn write_inline_string<W: Write>(xml: &mut XmlWriter<W>, s: &str) -> Result<()> {
    xml.write_str(" t=\"inlineStr\"><is><t")?;
    if s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) {
        xml.write_str(" xml:space=\"preserve\"")?;
    }
    xml.write_str(">")?;
    xml.write_escaped(s)?;
    xml.write_str("</t></is></c>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StyleId;
    use chrono::NaiveDate;

    fn render(sheet: Worksheet) -> (String, Vec<String>) {
        let mut out = Vec::new();
        let mut xml = XmlWriter::new(&mut out);
        let links = sheet.write_xml(&mut xml).unwrap();
        xml.flush().unwrap();
        (String::from_utf8(out).unwrap(), links)
    }

    #[test]
    fn test_rows_must_increase() {
        let mut sheet = Worksheet::new(1, "Data", 10);
        sheet.create_row(0).unwrap();
        sheet.create_row(2).unwrap();

        let err = sheet.create_row(2).unwrap_err();
        assert!(matches!(err, ExcelError::RowOutOfOrder { row: 2, last: 2, .. }));
        assert!(sheet.create_row(1).is_err());
        assert_eq!(sheet.row_count(), 2);
    }

    #[test]
    fn test_window_is_bounded() {
        let mut sheet = Worksheet::new(1, "Data", 2);
        for i in 0..5 {
            let row = sheet.create_row(i).unwrap();
            row.set_cell(0, Cell::new(CellValue::Number(i as f64)));
        }

        assert_eq!(sheet.rows_in_window(), 2);
        assert_eq!(sheet.flushed_row_count(), 3);
        assert!(sheet.row(2).is_none());
        assert!(sheet.row(3).is_some());
        assert!(sheet.row_mut(4).is_some());

        let (xml, _) = render(sheet);
        for i in 1..=5 {
            assert!(xml.contains(&format!("<row r=\"{}\"><c r=\"A{}\"><v>{}</v></c></row>", i, i, i - 1)));
        }
        assert!(xml.find("<row r=\"3\"").unwrap() < xml.find("<row r=\"4\"").unwrap());
    }

    #[test]
    fn test_row_limit() {
        let mut sheet = Worksheet::new(1, "Data", 10);
        assert!(matches!(
            sheet.create_row(MAX_ROWS),
            Err(ExcelError::LimitExceeded(_))
        ));
        assert!(sheet.create_row(MAX_ROWS - 1).is_ok());
    }

    #[test]
    fn test_columns_precede_rows_even_when_set_last() {
        let mut sheet = Worksheet::new(1, "Data", 10);
        sheet
            .create_row(0)
            .unwrap()
            .set_cell(0, Cell::new(CellValue::String("x".into())));
        sheet.set_column_width(0, 2816).unwrap();
        sheet.set_column_width(2, 300).unwrap();

        let (xml, _) = render(sheet);
        let cols = xml.find("<cols>").unwrap();
        assert!(cols < xml.find("<sheetData>").unwrap());
        assert!(xml.contains("<col min=\"1\" max=\"1\" width=\"11\" customWidth=\"1\"/>"));
        assert!(xml.contains("<col min=\"3\" max=\"3\" width=\"1.171875\" customWidth=\"1\"/>"));
    }

    #[test]
    fn test_cell_encodings() {
        let mut sheet = Worksheet::new(1, "Data", 10);
        let row = sheet.create_row(0).unwrap();
        row.set_cell(0, Cell::new(CellValue::String(" a<b ".into())));
        row.set_cell(1, Cell::new(CellValue::Bool(false)));
        row.set_cell(
            3,
            Cell::new(CellValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()))
                .with_style(StyleId(1)),
        );
        row.set_cell(4, Cell::new(CellValue::Number(f64::NAN)));
        row.set_cell(
            5,
            Cell::new(CellValue::Date(NaiveDate::from_ymd_opt(1900, 2, 28).unwrap())),
        );
        row.set_cell(
            6,
            Cell::new(CellValue::Date(NaiveDate::from_ymd_opt(1899, 12, 31).unwrap())),
        );
        sheet.create_row(1).unwrap();

        let (xml, links) = render(sheet);
        assert!(xml.contains(
            "<c r=\"A1\" t=\"inlineStr\"><is><t xml:space=\"preserve\"> a&lt;b </t></is></c>"
        ));
        assert!(xml.contains("<c r=\"B1\" t=\"b\"><v>0</v></c>"));
        assert!(!xml.contains("r=\"C1\""));
        assert!(xml.contains("<c r=\"D1\" s=\"1\"><v>45351</v></c>"));
        assert!(xml.contains("<c r=\"E1\" t=\"e\"><v>#NUM!</v></c>"));
        assert!(xml.contains("<c r=\"F1\"><v>59</v></c>"));
        assert!(xml.contains("<c r=\"G1\" t=\"inlineStr\"><is><t>31.12.1899</t></is></c>"));
        assert!(xml.contains("<row r=\"2\"/>"));
        assert!(links.is_empty());
    }

    #[test]
    fn test_hyperlinks_from_window_and_spill() {
        let mut sheet = Worksheet::new(1, "Links", 1);
        sheet.create_row(0).unwrap().set_cell(
            0,
            Cell::new(CellValue::String("http://a.example/".into()))
                .with_hyperlink("http://a.example/"),
        );
        sheet.create_row(1).unwrap().set_cell(
            1,
            Cell::new(CellValue::String("http://b.example/".into()))
                .with_hyperlink("http://b.example/"),
        );

        let (xml, links) = render(sheet);
        assert_eq!(links, vec!["http://a.example/", "http://b.example/"]);
        assert!(xml.contains("<hyperlink ref=\"A1\" r:id=\"rId1\"/>"));
        assert!(xml.contains("<hyperlink ref=\"B2\" r:id=\"rId2\"/>"));
        assert!(xml.find("</sheetData>").unwrap() < xml.find("<hyperlinks>").unwrap());
    }
}
