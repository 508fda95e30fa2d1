//! Small helpers over the quick-xml event API.

use std::io::{BufRead, Write};

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{PermitError, Result};

/// Read the text content of the element whose start tag was just consumed,
/// up to and including its end tag. Nested markup is skipped.
pub(crate) fn read_text<R: BufRead>(reader: &mut Reader<R>, buf: &mut Vec<u8>) -> Result<String> {
    let mut text = String::new();
    let mut depth = 0usize;
    loop {
        match reader.read_event_into(buf)? {
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::CData(c) => {
                text.push_str(std::str::from_utf8(&c).map_err(quick_xml::Error::from)?)
            }
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => break,
            Event::End(_) => depth -= 1,
            Event::Eof => {
                return Err(PermitError::MalformedDocument(
                    "unexpected end of document inside an element".into(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }
    buf.clear();
    Ok(text)
}

/// Skip past the end tag of the element whose start tag was just consumed.
pub(crate) fn skip_element<R: BufRead>(reader: &mut Reader<R>, buf: &mut Vec<u8>) -> Result<()> {
    read_text(reader, buf).map(|_| ())
}

/// Write `<name>text</name>`.
pub(crate) fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

pub(crate) fn write_start<W: Write>(writer: &mut Writer<W>, start: BytesStart<'_>) -> Result<()> {
    writer.write_event(Event::Start(start))?;
    Ok(())
}

pub(crate) fn write_end<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
