//! Buffered XML writer used for every part of the package

use crate::error::Result;
use std::io::Write;

/// XML writer that batches small writes before handing them to the sink
pub struct XmlWriter<W: Write> {
    writer: W,
    buffer: Vec<u8>,
    flush_threshold: usize,
}

impl<W: Write> XmlWriter<W> {
    pub fn new(writer: W) -> Self {
        Self::with_capacity(writer, 8192)
    }

    pub fn with_capacity(writer: W, capacity: usize) -> Self {
        XmlWriter {
            writer,
            buffer: Vec::with_capacity(capacity),
            flush_threshold: capacity / 2,
        }
    }

    #[inline]
    fn drain_if_full(&mut self) -> Result<()> {
        if self.buffer.len() >= self.flush_threshold {
            self.drain()?;
        }
        Ok(())
    }

    /// Move buffered bytes into the sink without flushing the sink itself
    fn drain(&mut self) -> Result<()> {
        if !self.buffer.is_empty() {
            self.writer.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        Ok(())
    }

    #[inline]
    pub fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(data);
        self.drain_if_full()
    }

    #[inline]
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.write_raw(s.as_bytes())
    }

    /// Write the standard XML declaration
    pub fn declaration(&mut self) -> Result<()> {
        self.write_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n")
    }

    /// `<name` (attributes may follow)
    #[inline]
    pub fn start_element(&mut self, name: &str) -> Result<()> {
        self.buffer.push(b'<');
        self.write_str(name)
    }

    /// `>` closing an open start tag
    #[inline]
    pub fn close_start_tag(&mut self) -> Result<()> {
        self.write_raw(b">")
    }

    /// `/>` closing an open start tag as an empty element
    #[inline]
    pub fn close_empty(&mut self) -> Result<()> {
        self.write_raw(b"/>")
    }

    #[inline]
    pub fn end_element(&mut self, name: &str) -> Result<()> {
        self.buffer.extend_from_slice(b"</");
        self.buffer.extend_from_slice(name.as_bytes());
        self.write_raw(b">")
    }

    #[inline]
    pub fn attribute(&mut self, name: &str, value: &str) -> Result<()> {
        self.buffer.push(b' ');
        self.buffer.extend_from_slice(name.as_bytes());
        self.buffer.extend_from_slice(b"=\"");
        self.write_escaped(value)?;
        self.write_raw(b"\"")
    }

    #[inline]
    pub fn attribute_int<I: itoa::Integer>(&mut self, name: &str, value: I) -> Result<()> {
        let mut num = itoa::Buffer::new();
        self.buffer.push(b' ');
        self.buffer.extend_from_slice(name.as_bytes());
        self.buffer.extend_from_slice(b"=\"");
        self.buffer.extend_from_slice(num.format(value).as_bytes());
        self.write_raw(b"\"")
    }

    /// Write an integer as text content
    #[inline]
    pub fn write_int<I: itoa::Integer>(&mut self, value: I) -> Result<()> {
        let mut num = itoa::Buffer::new();
        self.write_str(num.format(value))
    }

    /// `<name>escaped text</name>`
    pub fn text_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.start_element(name)?;
        self.close_start_tag()?;
        self.write_escaped(text)?;
        self.end_element(name)
    }

    /// Write text content with XML escaping
    pub fn write_escaped(&mut self, text: &str) -> Result<()> {
        for ch in text.chars() {
            match ch {
                '&' => self.buffer.extend_from_slice(b"&amp;"),
                '<' => self.buffer.extend_from_slice(b"&lt;"),
                '>' => self.buffer.extend_from_slice(b"&gt;"),
                '"' => self.buffer.extend_from_slice(b"&quot;"),
                '\'' => self.buffer.extend_from_slice(b"&apos;"),
                // Control characters other than tab/LF/CR are not legal XML 1.0
                c if (c as u32) < 0x20 && c != '\t' && c != '\n' && c != '\r' => continue,
                c => {
                    let mut utf8 = [0u8; 4];
                    self.buffer
                        .extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
                }
            }
        }
        self.drain_if_full()
    }

    /// Flush buffer and the underlying writer
    pub fn flush(&mut self) -> Result<()> {
        self.drain()?;
        self.writer.flush()?;
        Ok(())
    }

    /// Drain buffered bytes and give back the underlying writer
    pub fn into_inner(mut self) -> Result<W> {
        self.drain()?;
        Ok(self.writer)
    }
}
