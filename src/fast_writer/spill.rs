//! Compressed on-disk spill for rows that left the in-memory window

use super::worksheet::{write_row_xml, Hyperlink};
use super::xml_writer::XmlWriter;
use crate::error::Result;
use crate::types::Row;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};

const COPY_CHUNK: usize = 64 * 1024;

/// Serialized `<row>` elements, deflated into an anonymous temp file.
///
/// The file has no name on disk and disappears when the spill is dropped.
pub(crate) struct RowSpill {
    xml: XmlWriter<DeflateEncoder<BufWriter<File>>>,
    rows: u32,
}

impl RowSpill {
    pub(crate) fn new() -> Result<Self> {
        let file = tempfile::tempfile()?;
        let encoder = DeflateEncoder::new(
            BufWriter::with_capacity(COPY_CHUNK, file),
            Compression::fast(),
        );
        Ok(RowSpill {
            xml: XmlWriter::with_capacity(encoder, 16 * 1024),
            rows: 0,
        })
    }

    /// Serialize a row; hyperlinks found on it are appended to `hyperlinks`
    pub(crate) fn append(&mut self, row: &Row, hyperlinks: &mut Vec<Hyperlink>) -> Result<()> {
        write_row_xml(&mut self.xml, row, hyperlinks)?;
        self.rows += 1;
        Ok(())
    }

    /// Number of rows spilled so far
    pub(crate) fn rows(&self) -> u32 {
        self.rows
    }

    /// Inflate the spilled rows, in order, into `out`
    pub(crate) fn copy_into<W: Write>(self, out: &mut XmlWriter<W>) -> Result<()> {
        let encoder = self.xml.into_inner()?;
        let buffered = encoder.finish()?;
        let mut file = buffered.into_inner().map_err(|e| e.into_error())?;
        file.seek(SeekFrom::Start(0))?;

        let mut decoder = DeflateDecoder::new(BufReader::with_capacity(COPY_CHUNK, file));
        let mut buffer = vec![0u8; COPY_CHUNK];
        loop {
            let bytes_read = decoder.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            out.write_raw(&buffer[..bytes_read])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cell, CellValue};

    #[test]
    fn test_spill_round_trip() {
        let mut spill = RowSpill::new().unwrap();
        let mut links = Vec::new();
        for i in 0..3u32 {
            let mut row = Row::new(i);
            row.set_cell(0, Cell::new(CellValue::Number(i as f64)));
            spill.append(&row, &mut links).unwrap();
        }
        assert_eq!(spill.rows(), 3);

        let mut out = Vec::new();
        let mut xml = XmlWriter::new(&mut out);
        spill.copy_into(&mut xml).unwrap();
        xml.flush().unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<row r=\"1\"><c r=\"A1\"><v>0</v></c></row>\
             <row r=\"2\"><c r=\"A2\"><v>1</v></c></row>\
             <row r=\"3\"><c r=\"A3\"><v>2</v></c></row>"
        );
        assert!(links.is_empty());
    }
}
