//! Streaming ZIP writer that compresses entries on-the-fly
//!
//! Entries use data descriptors (general purpose bit 3), so nothing has to be
//! seeked back into: the archive can target any `Write`, including the
//! in-memory buffer an export returns.

use crate::error::{ExcelError, Result};
use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use crc32fast::Hasher as Crc32;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{self, Write};

/// Entry already written, kept for the central directory
struct ZipEntry {
    name: String,
    local_header_offset: u32,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
}

/// Entry currently receiving data
struct CurrentEntry<W: Write> {
    name: String,
    local_header_offset: u32,
    encoder: DeflateEncoder<CrcCountingWriter<W>>,
    crc: Crc32,
    uncompressed_count: u64,
}

/// Output wrapper that tracks the archive offset
struct CountingWriter<W: Write> {
    inner: W,
    position: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Receives the compressed stream of one entry and counts it
struct CrcCountingWriter<W: Write> {
    output: CountingWriter<W>,
    compressed_count: u64,
}

impl<W: Write> Write for CrcCountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.output.write(buf)?;
        self.compressed_count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.output.flush()
    }
}

/// Streaming ZIP writer that compresses data on-the-fly
pub struct StreamingZipWriter<W: Write> {
    // `None` while an entry's encoder owns the output
    output: Option<CountingWriter<W>>,
    entries: Vec<ZipEntry>,
    current_entry: Option<CurrentEntry<W>>,
    compression_level: u32,
    dos_time: u16,
    dos_date: u16,
}

impl<W: Write> StreamingZipWriter<W> {
    pub fn new(output: W, compression_level: u32) -> Self {
        let (dos_time, dos_date) = dos_timestamp(Local::now().naive_local());
        Self {
            output: Some(CountingWriter {
                inner: output,
                position: 0,
            }),
            entries: Vec::new(),
            current_entry: None,
            compression_level: compression_level.min(9),
            dos_time,
            dos_date,
        }
    }

    fn output_mut(&mut self) -> Result<&mut CountingWriter<W>> {
        self.output
            .as_mut()
            .ok_or_else(|| ExcelError::WriteError("ZIP output is owned by an open entry".into()))
    }

    /// Start a new entry (file) in the ZIP
    pub fn start_entry(&mut self, name: &str) -> Result<()> {
        self.finish_current_entry()?;

        let (dos_time, dos_date) = (self.dos_time, self.dos_date);
        let mut output = self
            .output
            .take()
            .ok_or_else(|| ExcelError::WriteError("ZIP output is owned by an open entry".into()))?;
        let local_header_offset = checked_u32(output.position, "archive offset")?;

        output.write_all(&[0x50, 0x4b, 0x03, 0x04])?; // signature
        output.write_all(&20u16.to_le_bytes())?; // version needed
        output.write_all(&8u16.to_le_bytes())?; // flags: data descriptor
        output.write_all(&8u16.to_le_bytes())?; // deflate
        output.write_all(&dos_time.to_le_bytes())?;
        output.write_all(&dos_date.to_le_bytes())?;
        output.write_all(&0u32.to_le_bytes())?; // crc32, in descriptor
        output.write_all(&0u32.to_le_bytes())?; // compressed size, in descriptor
        output.write_all(&0u32.to_le_bytes())?; // uncompressed size, in descriptor
        output.write_all(&(name.len() as u16).to_le_bytes())?;
        output.write_all(&0u16.to_le_bytes())?; // extra len
        output.write_all(name.as_bytes())?;

        let counting_writer = CrcCountingWriter {
            output,
            compressed_count: 0,
        };
        let encoder =
            DeflateEncoder::new(counting_writer, Compression::new(self.compression_level));

        self.current_entry = Some(CurrentEntry {
            name: name.to_string(),
            local_header_offset,
            encoder,
            crc: Crc32::new(),
            uncompressed_count: 0,
        });

        Ok(())
    }

    /// Write uncompressed data to the current entry
    pub fn write_data(&mut self, data: &[u8]) -> Result<()> {
        match self.current_entry.as_mut() {
            Some(entry) => {
                entry.crc.update(data);
                entry.uncompressed_count += data.len() as u64;
                entry.encoder.write_all(data)?;
                Ok(())
            }
            None => Err(ExcelError::WriteError("No ZIP entry started".to_string())),
        }
    }

    /// Finish the current entry and write its data descriptor
    fn finish_current_entry(&mut self) -> Result<()> {
        if let Some(entry) = self.current_entry.take() {
            let counting_writer = entry.encoder.finish()?;
            let mut output = counting_writer.output;

            let crc = entry.crc.finalize();
            let compressed_size = checked_u32(counting_writer.compressed_count, "entry size")?;
            let uncompressed_size = checked_u32(entry.uncompressed_count, "entry size")?;

            output.write_all(&[0x50, 0x4b, 0x07, 0x08])?;
            output.write_all(&crc.to_le_bytes())?;
            output.write_all(&compressed_size.to_le_bytes())?;
            output.write_all(&uncompressed_size.to_le_bytes())?;
            self.output = Some(output);

            self.entries.push(ZipEntry {
                name: entry.name,
                local_header_offset: entry.local_header_offset,
                crc32: crc,
                compressed_size,
                uncompressed_size,
            });
        }
        Ok(())
    }

    /// Finish the archive (central directory) and return the output
    pub fn finish(mut self) -> Result<W> {
        self.finish_current_entry()?;

        let (dos_time, dos_date) = (self.dos_time, self.dos_date);
        let entry_count = self.entries.len() as u16;
        let entries = std::mem::take(&mut self.entries);
        let output = self.output_mut()?;
        let central_dir_offset = checked_u32(output.position, "archive offset")?;

        for entry in &entries {
            output.write_all(&[0x50, 0x4b, 0x01, 0x02])?; // central dir sig
            output.write_all(&20u16.to_le_bytes())?; // version made by
            output.write_all(&20u16.to_le_bytes())?; // version needed
            output.write_all(&8u16.to_le_bytes())?; // flags: data descriptor
            output.write_all(&8u16.to_le_bytes())?; // deflate
            output.write_all(&dos_time.to_le_bytes())?;
            output.write_all(&dos_date.to_le_bytes())?;
            output.write_all(&entry.crc32.to_le_bytes())?;
            output.write_all(&entry.compressed_size.to_le_bytes())?;
            output.write_all(&entry.uncompressed_size.to_le_bytes())?;
            output.write_all(&(entry.name.len() as u16).to_le_bytes())?;
            output.write_all(&0u16.to_le_bytes())?; // extra len
            output.write_all(&0u16.to_le_bytes())?; // comment len
            output.write_all(&0u16.to_le_bytes())?; // disk number start
            output.write_all(&0u16.to_le_bytes())?; // internal attrs
            output.write_all(&0u32.to_le_bytes())?; // external attrs
            output.write_all(&entry.local_header_offset.to_le_bytes())?;
            output.write_all(entry.name.as_bytes())?;
        }

        let central_dir_size =
            checked_u32(output.position - central_dir_offset as u64, "central directory")?;

        output.write_all(&[0x50, 0x4b, 0x05, 0x06])?;
        output.write_all(&0u16.to_le_bytes())?; // disk number
        output.write_all(&0u16.to_le_bytes())?; // disk with central dir
        output.write_all(&entry_count.to_le_bytes())?;
        output.write_all(&entry_count.to_le_bytes())?;
        output.write_all(&central_dir_size.to_le_bytes())?;
        output.write_all(&central_dir_offset.to_le_bytes())?;
        output.write_all(&0u16.to_le_bytes())?; // comment len
        output.flush()?;

        let output = self
            .output
            .take()
            .ok_or_else(|| ExcelError::WriteError("ZIP output missing".to_string()))?;
        Ok(output.inner)
    }
}

/// Bytes written through `Write` go to the current entry.
impl<W: Write> Write for StreamingZipWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_data(buf)
            .map_err(|e| io::Error::other(e.to_string()))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn checked_u32(value: u64, what: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| ExcelError::LimitExceeded(format!("{} exceeds 4 GiB (no ZIP64 support)", what)))
}

/// MS-DOS (time, date) pair; years before 1980 clamp to 1980-01-01
fn dos_timestamp(at: NaiveDateTime) -> (u16, u16) {
    if at.year() < 1980 {
        return (0, (1 << 5) | 1);
    }
    let time = ((at.hour() as u16) << 11) | ((at.minute() as u16) << 5) | (at.second() as u16 / 2);
    let date = (((at.year() - 1980) as u16) << 9) | ((at.month() as u16) << 5) | at.day() as u16;
    (time, date)
}
