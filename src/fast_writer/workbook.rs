//! Streaming workbook: package parts around the worksheets
//!
//! Worksheets are serialized into the archive as soon as they are finished.
//! Workbook-level parts (`workbook.xml`, relationships, styles, document
//! properties) depend on every sheet and are written by [`StreamingWorkbook::into_bytes`].

use super::streaming_zip_writer::StreamingZipWriter;
use super::styles::StyleSheet;
use super::worksheet::Worksheet;
use super::xml_writer::XmlWriter;
use crate::error::{ExcelError, Result};
use chrono::Utc;
use std::io::Write;

/// Longest sheet name Excel accepts
pub const MAX_SHEET_NAME_LEN: usize = 31;

const FORBIDDEN_SHEET_NAME_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const DOC_RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

struct SheetEntry {
    name: String,
    finished: bool,
}

/// Workbook that writes each sheet into a compressed in-memory archive
pub struct StreamingWorkbook {
    zip: StreamingZipWriter<Vec<u8>>,
    sheets: Vec<SheetEntry>,
    styles: StyleSheet,
    rows_in_memory: usize,
}

impl StreamingWorkbook {
    /// `rows_in_memory` bounds every sheet's row window;
    /// `compression_level` is a deflate level (0-9)
    pub fn new(rows_in_memory: usize, compression_level: u32) -> Self {
        StreamingWorkbook {
            zip: StreamingZipWriter::new(Vec::with_capacity(64 * 1024), compression_level),
            sheets: Vec::new(),
            styles: StyleSheet::new(),
            rows_in_memory: rows_in_memory.max(1),
        }
    }

    /// Add a sheet at the end of the workbook
    pub fn create_sheet(&mut self, name: &str) -> Result<Worksheet> {
        validate_sheet_name(name, self.sheets.iter().map(|s| s.name.as_str()))?;

        self.sheets.push(SheetEntry {
            name: name.to_string(),
            finished: false,
        });
        let id = self.sheets.len() as u32;
        log::debug!("Added sheet {} '{}'", id, name);
        Ok(Worksheet::new(id, name, self.rows_in_memory))
    }

    pub fn styles(&self) -> &StyleSheet {
        &self.styles
    }

    pub fn styles_mut(&mut self) -> &mut StyleSheet {
        &mut self.styles
    }

    /// Names of the sheets created so far, in workbook order
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }

    /// Serialize a finished worksheet into the archive
    pub fn finish_sheet(&mut self, sheet: Worksheet) -> Result<()> {
        let id = sheet.id();
        let entry = self
            .sheets
            .get_mut(id as usize - 1)
            .filter(|entry| entry.name == sheet.name() && !entry.finished)
            .ok_or_else(|| {
                ExcelError::WriteError(format!(
                    "sheet '{}' does not belong to this workbook or is already finished",
                    sheet.name()
                ))
            })?;
        entry.finished = true;

        log::debug!(
            "Writing sheet '{}' ({} rows, {} spilled)",
            sheet.name(),
            sheet.row_count(),
            sheet.flushed_row_count()
        );

        self.zip
            .start_entry(&format!("xl/worksheets/sheet{}.xml", id))?;
        let hyperlinks = {
            let mut xml = XmlWriter::with_capacity(&mut self.zip, 64 * 1024);
            let hyperlinks = sheet.write_xml(&mut xml)?;
            xml.into_inner()?;
            hyperlinks
        };

        if !hyperlinks.is_empty() {
            self.zip
                .start_entry(&format!("xl/worksheets/_rels/sheet{}.xml.rels", id))?;
            let mut xml = XmlWriter::new(&mut self.zip);
            write_hyperlink_rels(&mut xml, &hyperlinks)?;
            xml.into_inner()?;
        }
        Ok(())
    }

    /// Write the workbook-level parts and return the finished `.xlsx` bytes
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        if let Some(open) = self.sheets.iter().find(|s| !s.finished) {
            return Err(ExcelError::WriteError(format!(
                "sheet '{}' was never finished",
                open.name
            )));
        }

        self.write_part("[Content_Types].xml", |xml, wb| wb.write_content_types(xml))?;
        self.write_part("_rels/.rels", |xml, _| write_root_rels(xml))?;
        self.write_part("docProps/app.xml", |xml, wb| wb.write_app_props(xml))?;
        self.write_part("docProps/core.xml", |xml, _| write_core_props(xml))?;
        self.write_part("xl/workbook.xml", |xml, wb| wb.write_workbook_xml(xml))?;
        self.write_part("xl/_rels/workbook.xml.rels", |xml, wb| {
            wb.write_workbook_rels(xml)
        })?;

        self.zip.start_entry("xl/styles.xml")?;
        {
            let mut xml = XmlWriter::new(&mut self.zip);
            self.styles.write_xml(&mut xml)?;
            xml.into_inner()?;
        }

        self.zip.finish()
    }

    fn write_part<F>(&mut self, name: &str, body: F) -> Result<()>
    where
        F: FnOnce(&mut XmlWriter<Vec<u8>>, &StreamingWorkbook) -> Result<()>,
    {
        let mut xml = XmlWriter::new(Vec::with_capacity(1024));
        body(&mut xml, self)?;
        let bytes = xml.into_inner()?;
        self.zip.start_entry(name)?;
        self.zip.write_data(&bytes)
    }

    fn write_content_types<W: Write>(&self, xml: &mut XmlWriter<W>) -> Result<()> {
        xml.declaration()?;
        xml.start_element("Types")?;
        xml.attribute(
            "xmlns",
            "http://schemas.openxmlformats.org/package/2006/content-types",
        )?;
        xml.close_start_tag()?;
        xml.write_str(
            "<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
             <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
             <Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>",
        )?;
        for id in 1..=self.sheets.len() {
            xml.start_element("Override")?;
            xml.attribute("PartName", &format!("/xl/worksheets/sheet{}.xml", id))?;
            xml.attribute(
                "ContentType",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml",
            )?;
            xml.close_empty()?;
        }
        xml.write_str(
            "<Override PartName=\"/xl/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml\"/>\
             <Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>\
             <Override PartName=\"/docProps/app.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.extended-properties+xml\"/>",
        )?;
        xml.end_element("Types")
    }

    fn write_app_props<W: Write>(&self, xml: &mut XmlWriter<W>) -> Result<()> {
        xml.declaration()?;
        xml.start_element("Properties")?;
        xml.attribute(
            "xmlns",
            "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties",
        )?;
        xml.attribute(
            "xmlns:vt",
            "http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes",
        )?;
        xml.close_start_tag()?;
        xml.text_element("Application", "queryexcel")?;
        xml.text_element("DocSecurity", "0")?;
        xml.text_element("ScaleCrop", "false")?;

        xml.write_str("<TitlesOfParts><vt:vector size=\"")?;
        xml.write_int(self.sheets.len())?;
        xml.write_str("\" baseType=\"lpstr\">")?;
        for sheet in &self.sheets {
            xml.text_element("vt:lpstr", &sheet.name)?;
        }
        xml.write_str("</vt:vector></TitlesOfParts>")?;

        xml.text_element("LinksUpToDate", "false")?;
        xml.text_element("SharedDoc", "false")?;
        xml.text_element("HyperlinksChanged", "false")?;
        xml.text_element("AppVersion", "1.0")?;
        xml.end_element("Properties")
    }

    fn write_workbook_xml<W: Write>(&self, xml: &mut XmlWriter<W>) -> Result<()> {
        xml.declaration()?;
        xml.start_element("workbook")?;
        xml.attribute("xmlns", SPREADSHEET_NS)?;
        xml.attribute("xmlns:r", DOC_RELATIONSHIPS_NS)?;
        xml.close_start_tag()?;

        xml.start_element("sheets")?;
        xml.close_start_tag()?;
        for (i, sheet) in self.sheets.iter().enumerate() {
            let sheet_id = i + 1;
            xml.start_element("sheet")?;
            xml.attribute("name", &sheet.name)?;
            xml.attribute_int("sheetId", sheet_id)?;
            xml.attribute("r:id", &format!("rId{}", sheet_id))?;
            xml.close_empty()?;
        }
        xml.end_element("sheets")?;
        xml.end_element("workbook")
    }

    fn write_workbook_rels<W: Write>(&self, xml: &mut XmlWriter<W>) -> Result<()> {
        xml.declaration()?;
        xml.start_element("Relationships")?;
        xml.attribute("xmlns", RELATIONSHIPS_NS)?;
        xml.close_start_tag()?;

        for i in 1..=self.sheets.len() {
            xml.start_element("Relationship")?;
            xml.attribute("Id", &format!("rId{}", i))?;
            xml.attribute(
                "Type",
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet",
            )?;
            xml.attribute("Target", &format!("worksheets/sheet{}.xml", i))?;
            xml.close_empty()?;
        }

        xml.start_element("Relationship")?;
        xml.attribute("Id", &format!("rId{}", self.sheets.len() + 1))?;
        xml.attribute(
            "Type",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles",
        )?;
        xml.attribute("Target", "styles.xml")?;
        xml.close_empty()?;

        xml.end_element("Relationships")
    }
}

fn write_root_rels<W: Write>(xml: &mut XmlWriter<W>) -> Result<()> {
    xml.declaration()?;
    xml.start_element("Relationships")?;
    xml.attribute("xmlns", RELATIONSHIPS_NS)?;
    xml.close_start_tag()?;
    xml.write_str(
        "<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"xl/workbook.xml\"/>\
         <Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties\" Target=\"docProps/core.xml\"/>\
         <Relationship Id=\"rId3\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties\" Target=\"docProps/app.xml\"/>",
    )?;
    xml.end_element("Relationships")
}

fn write_core_props<W: Write>(xml: &mut XmlWriter<W>) -> Result<()> {
    let now = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    xml.declaration()?;
    xml.write_str(
        "<cp:coreProperties \
         xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
         xmlns:dc=\"http://purl.org/dc/elements/1.1/\" \
         xmlns:dcterms=\"http://purl.org/dc/terms/\" \
         xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">",
    )?;
    xml.text_element("dc:creator", "queryexcel")?;
    xml.write_str("<dcterms:created xsi:type=\"dcterms:W3CDTF\">")?;
    xml.write_str(&now)?;
    xml.write_str("</dcterms:created><dcterms:modified xsi:type=\"dcterms:W3CDTF\">")?;
    xml.write_str(&now)?;
    xml.write_str("</dcterms:modified>")?;
    xml.end_element("cp:coreProperties")
}

fn write_hyperlink_rels<W: Write>(xml: &mut XmlWriter<W>, targets: &[String]) -> Result<()> {
    xml.declaration()?;
    xml.start_element("Relationships")?;
    xml.attribute("xmlns", RELATIONSHIPS_NS)?;
    xml.close_start_tag()?;
    for (i, target) in targets.iter().enumerate() {
        xml.start_element("Relationship")?;
        xml.attribute("Id", &format!("rId{}", i + 1))?;
        xml.attribute(
            "Type",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink",
        )?;
        xml.attribute("Target", target)?;
        xml.attribute("TargetMode", "External")?;
        xml.close_empty()?;
    }
    xml.end_element("Relationships")
}

/// Check a sheet name against Excel's rules and the names already in use
pub fn validate_sheet_name<'a, I>(name: &str, existing: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let invalid = |reason: &str| ExcelError::InvalidSheetName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(invalid("name is longer than 31 characters"));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_SHEET_NAME_CHARS.contains(c)) {
        return Err(invalid(&format!("name contains '{}'", c)));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(invalid("name starts or ends with an apostrophe"));
    }
    let lower = name.to_lowercase();
    if existing.into_iter().any(|other| other.to_lowercase() == lower) {
        return Err(invalid("a sheet with this name already exists"));
    }
    Ok(())
}
