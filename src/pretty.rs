use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

use crate::Result;

const INDENT_CHAR: u8 = b' ';
const INDENT_SIZE: usize = 2;

/// Re-indent an XML document for display.
pub fn format_xml(text: &str) -> Result<String> {
    if text.trim().is_empty() {
        return Ok(String::new());
    }

    let mut reader = Reader::from_str(text);
    reader.trim_text(true);
    let mut writer =
        Writer::new_with_indent(Vec::new(), INDENT_CHAR, INDENT_SIZE);

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }

    let mut formatted = String::from_utf8(writer.into_inner())?;
    formatted.push('\n');
    Ok(formatted)
}
