//! OGC exception documents (`ServiceExceptionReport`, `ows:ExceptionReport`).

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::FormatError;

/// True when the body is an XML document rather than a JSON payload.
pub fn looks_like_xml(body: &str) -> bool {
    let head = body.trim_start_matches('\u{feff}').trim_start();
    head.starts_with("<?xml")
        || head.starts_with("<ServiceExceptionReport")
        || head.starts_with("<ows:ExceptionReport")
        || head.starts_with("<ExceptionReport")
}

/// Extracts the exception text(s) from an OGC exception document.
///
/// Returns `Ok(None)` for well-formed XML that carries no exception element.
/// Multiple exceptions are joined with `"; "`.
pub fn exception_message(body: &str) -> Result<Option<String>, FormatError> {
    let mut reader = Reader::from_str(body.trim_start_matches('\u{feff}'));
    reader.config_mut().trim_text(true);

    let mut messages: Vec<String> = Vec::new();
    let mut depth_in_exception = 0usize;
    let mut current = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name();
                if is_exception_text(name.as_ref()) {
                    depth_in_exception += 1;
                }
            }
            Event::End(e) => {
                let name = e.local_name();
                if is_exception_text(name.as_ref()) && depth_in_exception > 0 {
                    depth_in_exception -= 1;
                    if depth_in_exception == 0 {
                        let msg = current.trim().to_string();
                        if !msg.is_empty() {
                            messages.push(msg);
                        }
                        current.clear();
                    }
                }
            }
            Event::Text(t) if depth_in_exception > 0 => {
                let text = t.unescape()?;
                push_text(&mut current, &text);
            }
            Event::CData(c) if depth_in_exception > 0 => {
                let raw = c.into_inner();
                push_text(&mut current, &String::from_utf8_lossy(&raw));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if messages.is_empty() {
        Ok(None)
    } else {
        Ok(Some(messages.join("; ")))
    }
}

fn is_exception_text(local_name: &[u8]) -> bool {
    matches!(local_name, b"ServiceException" | b"ExceptionText")
}

fn push_text(buf: &mut String, text: &str) {
    if !buf.is_empty() {
        buf.push(' ');
    }
    buf.push_str(text.trim());
}
