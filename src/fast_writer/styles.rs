//! Workbook-scoped cell formats (`xl/styles.xml`)
//!
//! A `StyleSheet` belongs to exactly one workbook; the [`StyleId`]s it hands
//! out are only meaningful for cells of that workbook.

use super::xml_writer::XmlWriter;
use crate::error::Result;
use crate::types::StyleId;
use indexmap::IndexSet;
use std::io::Write;

/// Display format applied to date cells
pub const DATE_FORMAT: &str = "dd.MM.yyyy";

/// First id available for custom number formats
const FIRST_CUSTOM_NUM_FMT: u32 = 164;

/// Font attributes of a cell format
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FontStyle {
    pub bold: bool,
    /// ARGB hex color, e.g. `FFFF0000`
    pub color: Option<String>,
    /// Size in points, Calibri 11 when unset
    pub size: Option<u16>,
}

/// A cell format: optional number format plus font
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CellFormat {
    pub num_format: Option<String>,
    pub font: FontStyle,
}

impl CellFormat {
    pub fn with_num_format(mut self, format: &str) -> Self {
        self.num_format = Some(format.to_string());
        self
    }

    pub fn with_font(mut self, font: FontStyle) -> Self {
        self.font = font;
        self
    }
}

/// Registry of the formats used by one workbook
#[derive(Debug)]
pub struct StyleSheet {
    formats: IndexSet<CellFormat>,
    date_style: Option<StyleId>,
    hint_style: Option<StyleId>,
}

impl StyleSheet {
    pub fn new() -> Self {
        let mut formats = IndexSet::new();
        formats.insert(CellFormat::default());
        StyleSheet {
            formats,
            date_style: None,
            hint_style: None,
        }
    }

    /// Register a format, returning the id of an equal one if already known
    pub fn register(&mut self, format: CellFormat) -> StyleId {
        let (index, _) = self.formats.insert_full(format);
        StyleId(index as u32)
    }

    /// `dd.MM.yyyy` date format, created on first use
    pub fn date_style(&mut self) -> StyleId {
        if let Some(id) = self.date_style {
            return id;
        }
        let id = self.register(CellFormat::default().with_num_format(DATE_FORMAT));
        self.date_style = Some(id);
        id
    }

    /// Red, bold, 14pt emphasis used by hint rows
    pub fn hint_style(&mut self) -> StyleId {
        if let Some(id) = self.hint_style {
            return id;
        }
        let id = self.register(CellFormat::default().with_font(FontStyle {
            bold: true,
            color: Some("FFFF0000".to_string()),
            size: Some(14),
        }));
        self.hint_style = Some(id);
        id
    }

    pub fn get(&self, id: StyleId) -> Option<&CellFormat> {
        self.formats.get_index(id.index() as usize)
    }

    /// Number of registered formats, the default included
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// Write `xl/styles.xml`
    pub fn write_xml<W: Write>(&self, xml: &mut XmlWriter<W>) -> Result<()> {
        let mut num_formats: IndexSet<&str> = IndexSet::new();
        let mut fonts: IndexSet<&FontStyle> = IndexSet::new();
        fonts.insert(&self.formats[0].font);
        for format in &self.formats {
            if let Some(code) = format.num_format.as_deref() {
                num_formats.insert(code);
            }
            fonts.insert(&format.font);
        }

        xml.declaration()?;
        xml.start_element("styleSheet")?;
        xml.attribute(
            "xmlns",
            "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
        )?;
        xml.close_start_tag()?;

        if !num_formats.is_empty() {
            xml.start_element("numFmts")?;
            xml.attribute_int("count", num_formats.len())?;
            xml.close_start_tag()?;
            for (i, code) in num_formats.iter().enumerate() {
                xml.start_element("numFmt")?;
                xml.attribute_int("numFmtId", FIRST_CUSTOM_NUM_FMT + i as u32)?;
                xml.attribute("formatCode", code)?;
                xml.close_empty()?;
            }
            xml.end_element("numFmts")?;
        }

        xml.start_element("fonts")?;
        xml.attribute_int("count", fonts.len())?;
        xml.close_start_tag()?;
        for font in &fonts {
            xml.write_str("<font>")?;
            if font.bold {
                xml.write_str("<b/>")?;
            }
            xml.start_element("sz")?;
            xml.attribute_int("val", font.size.unwrap_or(11))?;
            xml.close_empty()?;
            if let Some(color) = font.color.as_deref() {
                xml.start_element("color")?;
                xml.attribute("rgb", color)?;
                xml.close_empty()?;
            }
            xml.write_str("<name val=\"Calibri\"/><family val=\"2\"/></font>")?;
        }
        xml.end_element("fonts")?;

        xml.write_str(
            "<fills count=\"2\"><fill><patternFill patternType=\"none\"/></fill>\
             <fill><patternFill patternType=\"gray125\"/></fill></fills>",
        )?;
        xml.write_str(
            "<borders count=\"1\"><border><left/><right/><top/><bottom/><diagonal/></border></borders>",
        )?;
        xml.write_str(
            "<cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>",
        )?;

        xml.start_element("cellXfs")?;
        xml.attribute_int("count", self.formats.len())?;
        xml.close_start_tag()?;
        for format in &self.formats {
            let num_fmt_id = format
                .num_format
                .as_deref()
                .and_then(|code| num_formats.get_index_of(code))
                .map(|i| FIRST_CUSTOM_NUM_FMT + i as u32)
                .unwrap_or(0);
            let font_id = fonts.get_index_of(&format.font).unwrap_or(0);

            xml.start_element("xf")?;
            xml.attribute_int("numFmtId", num_fmt_id)?;
            xml.attribute_int("fontId", font_id)?;
            xml.attribute_int("fillId", 0u32)?;
            xml.attribute_int("borderId", 0u32)?;
            xml.attribute_int("xfId", 0u32)?;
            if num_fmt_id != 0 {
                xml.attribute("applyNumberFormat", "1")?;
            }
            if font_id != 0 {
                xml.attribute("applyFont", "1")?;
            }
            xml.close_empty()?;
        }
        xml.end_element("cellXfs")?;

        xml.write_str(
            "<cellStyles count=\"1\"><cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/></cellStyles>",
        )?;
        xml.end_element("styleSheet")?;
        Ok(())
    }
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(styles: &StyleSheet) -> String {
        let mut out = Vec::new();
        let mut xml = XmlWriter::new(&mut out);
        styles.write_xml(&mut xml).unwrap();
        xml.flush().unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_date_style_created_once() {
        let mut styles = StyleSheet::new();
        let first = styles.date_style();
        let second = styles.date_style();

        assert_eq!(first, second);
        assert_eq!(first, StyleId(1));
        assert_eq!(styles.len(), 2);
        assert_eq!(
            styles.get(first).and_then(|f| f.num_format.as_deref()),
            Some(DATE_FORMAT)
        );
    }

    #[test]
    fn test_register_deduplicates() {
        let mut styles = StyleSheet::new();
        let hint = styles.hint_style();
        let again = styles.register(CellFormat::default().with_font(FontStyle {
            bold: true,
            color: Some("FFFF0000".to_string()),
            size: Some(14),
        }));
        assert_eq!(hint, again);
        assert_eq!(styles.register(CellFormat::default()), StyleId::DEFAULT);
    }

    #[test]
    fn test_styles_xml() {
        let mut styles = StyleSheet::new();
        styles.date_style();
        styles.hint_style();
        let xml = render(&styles);

        assert!(xml.contains("<numFmt numFmtId=\"164\" formatCode=\"dd.MM.yyyy\"/>"));
        assert!(xml.contains("<cellXfs count=\"3\">"));
        assert!(xml.contains("<xf numFmtId=\"164\" fontId=\"0\""));
        assert!(xml.contains("<font><b/><sz val=\"14\"/><color rgb=\"FFFF0000\"/>"));
        assert!(xml.contains("fontId=\"1\" fillId=\"0\" borderId=\"0\" xfId=\"0\" applyFont=\"1\"/>"));
    }

    #[test]
    fn test_default_only_has_no_num_fmts() {
        let xml = render(&StyleSheet::new());
        assert!(!xml.contains("<numFmts"));
        assert!(xml.contains("<fonts count=\"1\">"));
    }
}
