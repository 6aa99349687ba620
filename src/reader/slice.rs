//! Zero-Copy Slice Reader
//!
//! Lenient pull reader over a string slice. Delimiters are located with
//! memchr; names and raw content borrow from the input.
//!
//! Malformed markup never stops the reader. The first problem seen is
//! recorded and available through [`SliceReader::error`].

use super::events::{decode_entities, Attribute, EndElement, StartElement, XmlEvent};
use memchr::{memchr, memmem};
use std::borrow::Cow;

/// HTML elements whose content is raw text
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Zero-copy markup reader from a string slice
pub struct SliceReader<'a> {
    input: &'a str,
    pos: usize,
    html: bool,
    /// Raw text element whose end tag we are waiting for (HTML only)
    raw_text: Option<&'a str>,
    error: Option<String>,
}

impl<'a> SliceReader<'a> {
    /// Create a reader for XML input
    pub fn new(input: &'a str) -> Self {
        SliceReader {
            input,
            pos: 0,
            html: false,
            raw_text: None,
            error: None,
        }
    }

    /// Create a reader for HTML input (`script`/`style` content is raw text)
    pub fn html(input: &'a str) -> Self {
        SliceReader {
            html: true,
            ..Self::new(input)
        }
    }

    /// First well-formedness problem encountered, if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn record_error(&mut self, msg: String) {
        if self.error.is_none() {
            self.error = Some(msg);
        }
    }

    #[inline]
    fn bytes(&self) -> &'a [u8] {
        self.input.as_bytes()
    }

    #[inline]
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Find `needle` at or after the current position
    fn find_bytes(&self, needle: &[u8]) -> Option<usize> {
        memmem::find(&self.bytes()[self.pos..], needle).map(|i| self.pos + i)
    }

    /// Get the next event
    pub fn next_event(&mut self) -> Option<XmlEvent<'a>> {
        if let Some(element) = self.raw_text.take() {
            if let Some(event) = self.read_raw_text(element) {
                return Some(event);
            }
        }

        if self.pos >= self.input.len() {
            return None;
        }

        let rest = self.rest();
        if !rest.starts_with('<') {
            let end = memchr(b'<', rest.as_bytes()).map_or(self.input.len(), |i| self.pos + i);
            let text = &self.input[self.pos..end];
            self.pos = end;
            return Some(XmlEvent::Text(decode_entities(text)));
        }

        if rest.starts_with("<!--") {
            return Some(self.read_delimited(4, b"-->", "comment", XmlEvent::Comment));
        }
        if rest.starts_with("<![CDATA[") {
            return Some(self.read_delimited(9, b"]]>", "CDATA section", XmlEvent::CData));
        }
        if rest.starts_with("<!") {
            return Some(self.read_doctype());
        }
        if rest.starts_with("<?") {
            return Some(self.read_processing_instruction());
        }
        if rest.starts_with("</") {
            return Some(self.read_end_tag());
        }

        match rest.as_bytes().get(1) {
            Some(&b) if is_name_start(b) => Some(self.read_start_tag()),
            _ => {
                // A lone '<' is text
                self.pos += 1;
                Some(XmlEvent::Text(Cow::Borrowed("<")))
            }
        }
    }

    fn read_delimited(
        &mut self,
        open_len: usize,
        close: &[u8],
        what: &str,
        make: fn(&'a str) -> XmlEvent<'a>,
    ) -> XmlEvent<'a> {
        let start = self.pos + open_len;
        self.pos = start;
        let end = match self.find_bytes(close) {
            Some(end) => end,
            None => {
                self.record_error(format!("Unterminated {}", what));
                self.input.len()
            }
        };
        let content = &self.input[start..end];
        self.pos = (end + close.len()).min(self.input.len());
        make(content)
    }

    fn read_doctype(&mut self) -> XmlEvent<'a> {
        let start = self.pos + 2;
        // An internal subset may contain '>' characters
        let bracket = memchr(b'[', &self.bytes()[start..]).map(|i| start + i);
        let gt = memchr(b'>', &self.bytes()[start..]).map(|i| start + i);
        let end = match (bracket, gt) {
            (Some(b), Some(g)) if b < g => memmem::find(&self.bytes()[b..], b"]>")
                .map(|i| b + i + 1)
                .or(Some(g)),
            _ => gt,
        };
        let end = end.unwrap_or_else(|| {
            self.record_error("Unterminated DOCTYPE".to_string());
            self.input.len()
        });

        let decl = &self.input[start..end];
        self.pos = (end + 1).min(self.input.len());

        let mut words = decl.split_ascii_whitespace();
        let keyword = words.next().unwrap_or("");
        if !keyword.eq_ignore_ascii_case("DOCTYPE") {
            // Other markup declarations are kept as comments-free noise
            return XmlEvent::Comment(decl);
        }
        let name = words.next().unwrap_or("");
        let name = name.split('[').next().unwrap_or(name);
        XmlEvent::DocType(name)
    }

    fn read_processing_instruction(&mut self) -> XmlEvent<'a> {
        let start = self.pos + 2;
        self.pos = start;
        let end = self.find_bytes(b"?>").unwrap_or_else(|| {
            self.record_error("Unterminated processing instruction".to_string());
            self.input.len()
        });
        let body = &self.input[start..end];
        self.pos = (end + 2).min(self.input.len());

        let target_end = body
            .bytes()
            .position(is_whitespace)
            .unwrap_or(body.len());
        let target = &body[..target_end];
        if target.eq_ignore_ascii_case("xml") {
            return XmlEvent::XmlDeclaration;
        }
        let data = body[target_end..].trim();
        XmlEvent::ProcessingInstruction {
            target,
            data: if data.is_empty() { None } else { Some(data) },
        }
    }

    fn read_end_tag(&mut self) -> XmlEvent<'a> {
        let start = self.pos + 2;
        let end = memchr(b'>', &self.bytes()[start..])
            .map(|i| start + i)
            .unwrap_or_else(|| {
                self.record_error("Unterminated end tag".to_string());
                self.input.len()
            });
        let name = self.input[start..end].trim();
        self.pos = (end + 1).min(self.input.len());
        XmlEvent::EndElement(EndElement { name })
    }

    fn read_start_tag(&mut self) -> XmlEvent<'a> {
        let start = self.pos + 1;
        let end = find_tag_end_quoted(self.bytes(), start).unwrap_or_else(|| {
            self.record_error("Unterminated start tag".to_string());
            self.input.len()
        });
        self.pos = (end + 1).min(self.input.len());

        let mut body = &self.input[start..end];
        let is_empty = body.ends_with('/');
        if is_empty {
            body = &body[..body.len() - 1];
        }

        let name_end = body
            .bytes()
            .position(|b| is_whitespace(b) || b == b'/')
            .unwrap_or(body.len());
        let name = &body[..name_end];
        let attributes = parse_attributes(&body[name_end..]);
        let element = StartElement { name, attributes };

        if is_empty {
            return XmlEvent::EmptyElement(element);
        }
        if self.html {
            self.raw_text = RAW_TEXT_ELEMENTS
                .iter()
                .any(|raw| raw.eq_ignore_ascii_case(name))
                .then_some(name);
        }
        XmlEvent::StartElement(element)
    }

    /// Text up to the matching end tag of a raw text element
    fn read_raw_text(&mut self, element: &str) -> Option<XmlEvent<'a>> {
        let start = self.pos;
        let mut search = start;
        let end = loop {
            match memmem::find(&self.bytes()[search..], b"</") {
                Some(i) => {
                    let at = search + i;
                    let candidate = self.input.get(at + 2..at + 2 + element.len());
                    if candidate.is_some_and(|c| c.eq_ignore_ascii_case(element)) {
                        break at;
                    }
                    search = at + 2;
                }
                None => break self.input.len(),
            }
        };
        self.pos = end;
        (end > start).then(|| XmlEvent::Text(Cow::Borrowed(&self.input[start..end])))
    }
}

impl<'a> Iterator for SliceReader<'a> {
    type Item = XmlEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event()
    }
}

/// Find the '>' closing a tag, ignoring any inside quoted attribute values
fn find_tag_end_quoted(input: &[u8], from: usize) -> Option<usize> {
    let mut in_single_quote = false;
    let mut in_double_quote = false;

    for (i, &b) in input.iter().enumerate().skip(from) {
        match b {
            b'"' if !in_single_quote => in_double_quote = !in_double_quote,
            b'\'' if !in_double_quote => in_single_quote = !in_single_quote,
            b'>' if !in_single_quote && !in_double_quote => return Some(i),
            _ => {}
        }
    }
    None
}

/// Parse attributes from raw tag content (after the element name)
fn parse_attributes(input: &str) -> Vec<Attribute<'_>> {
    let bytes = input.as_bytes();
    let mut attrs = Vec::new();
    let mut pos = 0;

    loop {
        while pos < bytes.len() && (is_whitespace(bytes[pos]) || bytes[pos] == b'/') {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }

        let name_start = pos;
        while pos < bytes.len() && !is_whitespace(bytes[pos]) && !matches!(bytes[pos], b'=' | b'/') {
            pos += 1;
        }
        let name = &input[name_start..pos];

        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }

        if bytes.get(pos) != Some(&b'=') {
            // Boolean attribute: <input disabled>
            attrs.push(Attribute { name, value: Cow::Borrowed("") });
            continue;
        }
        pos += 1;
        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }

        let raw = match bytes.get(pos) {
            Some(&quote) if quote == b'"' || quote == b'\'' => {
                let value_start = pos + 1;
                let value_end = memchr(quote, &bytes[value_start..]).map_or(bytes.len(), |i| value_start + i);
                pos = (value_end + 1).min(bytes.len());
                &input[value_start..value_end]
            }
            _ => {
                let value_start = pos;
                while pos < bytes.len() && !is_whitespace(bytes[pos]) {
                    pos += 1;
                }
                &input[value_start..pos]
            }
        };

        attrs.push(Attribute { name, value: decode_entities(raw) });
    }

    attrs
}

#[inline]
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

#[inline]
fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b':' || b >= 0x80
}

/// Read all events from a string slice
pub fn parse_events(input: &str) -> Vec<XmlEvent<'_>> {
    SliceReader::new(input).collect()
}
