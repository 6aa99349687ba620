//! Markup Event Types
//!
//! Event types for pull-parser style processing. Names and raw content
//! borrow from the input; text and attribute values are `Cow` because
//! entity decoding may need to allocate.

use memchr::memchr;
use std::borrow::Cow;

/// Parsing event
#[derive(Debug, Clone, PartialEq)]
pub enum XmlEvent<'a> {
    /// Start of an element: <name attrs...>
    StartElement(StartElement<'a>),
    /// End of an element: </name>
    EndElement(EndElement<'a>),
    /// Empty element: <name attrs.../>
    EmptyElement(StartElement<'a>),
    /// Text content between tags (entities decoded)
    Text(Cow<'a, str>),
    /// CDATA section content
    CData(&'a str),
    /// Comment content
    Comment(&'a str),
    /// Processing instruction: <?target data?>
    ProcessingInstruction {
        target: &'a str,
        data: Option<&'a str>,
    },
    /// XML declaration: <?xml version="1.0"?>
    XmlDeclaration,
    /// DOCTYPE declaration, carrying the declared root name
    DocType(&'a str),
}

/// Start element event data
#[derive(Debug, Clone, PartialEq)]
pub struct StartElement<'a> {
    /// Full element name (may include prefix)
    pub name: &'a str,
    /// Element attributes in source order
    pub attributes: Vec<Attribute<'a>>,
}

impl<'a> StartElement<'a> {
    /// Get an attribute value by name
    pub fn get_attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_ref())
    }
}

/// End element event data
#[derive(Debug, Clone, PartialEq)]
pub struct EndElement<'a> {
    pub name: &'a str,
}

/// A parsed attribute
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute<'a> {
    pub name: &'a str,
    /// Attribute value (entities decoded)
    pub value: Cow<'a, str>,
}

/// Decode the predefined entities and numeric character references.
///
/// Unknown or malformed references are kept verbatim.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    let bytes = input.as_bytes();
    let Some(first) = memchr(b'&', bytes) else {
        return Cow::Borrowed(input);
    };

    let mut out = String::with_capacity(input.len());
    out.push_str(&input[..first]);
    let mut pos = first;

    while pos < bytes.len() {
        if bytes[pos] != b'&' {
            let next = memchr(b'&', &bytes[pos..]).map_or(bytes.len(), |i| pos + i);
            out.push_str(&input[pos..next]);
            pos = next;
            continue;
        }

        let decoded = memchr(b';', &bytes[pos..])
            .filter(|&len| len <= 12)
            .and_then(|len| resolve_entity(&input[pos + 1..pos + len]).map(|c| (c, len)));

        match decoded {
            Some((c, len)) => {
                out.push(c);
                pos += len + 1;
            }
            None => {
                out.push('&');
                pos += 1;
            }
        }
    }

    Cow::Owned(out)
}

fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
