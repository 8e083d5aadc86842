//! Engine data parser
//!
//! Text layers carry their styling in a PostScript-like text blob:
//!
//! ```text
//! <<
//! 	/EngineDict
//! 	<<
//! 		/StyleRun
//! 		<<
//! 			/RunLengthArray [ 5 7 ]
//! 		>>
//! 	>>
//! 	/Text (þÿ...)
//! >>
//! ```
//!
//! The parser is line oriented. `<<`/`>>` open and close dictionaries,
//! `[`/`]` open and close arrays, `/Name value` adds a property and strings
//! are UTF-16BE between `(` + byte order mark and a line ending in `)`.
//! Anything it does not recognize is skipped.

use indexmap::IndexMap;
use serde::Serialize;

use crate::chunk::cursor::decode_utf16_be;
use crate::error::TextEngineError;
use crate::psd::descriptor::split_index;

/// A parsed engine data value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Property {
    Map(MapProperty),
    List(Vec<Property>),
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// Dictionary of named properties in file order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MapProperty(pub IndexMap<String, Property>);

impl Property {
    /// Numeric value, ints widened to floats
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Property::Float(v) => Some(*v),
            Property::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Integer value, floats truncated
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Property::Int(v) => Some(*v),
            Property::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Property::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapProperty> {
        match self {
            Property::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Property]> {
        match self {
            Property::List(items) => Some(items),
            _ => None,
        }
    }
}

impl MapProperty {
    /// Resolve a dotted path such as `ResourceDict.FontSet[0].Name`
    ///
    /// Returns `None` at the first missing key, out-of-range index or
    /// type mismatch.
    pub fn get(&self, path: &str) -> Option<&Property> {
        let mut map = self;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let (name, index) = split_index(segment);
            let mut value = map.0.get(name)?;
            if let Some(index) = index {
                value = value.as_list()?.get(index)?;
            }
            if segments.peek().is_none() {
                return Some(value);
            }
            map = value.as_map()?;
        }
        None
    }

    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.get(path).and_then(Property::as_f64)
    }

    pub fn get_i64(&self, path: &str) -> Option<i64> {
        self.get(path).and_then(Property::as_i64)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Property::as_str)
    }

    pub fn get_map(&self, path: &str) -> Option<&MapProperty> {
        self.get(path).and_then(Property::as_map)
    }

    pub fn get_list(&self, path: &str) -> Option<&[Property]> {
        self.get(path).and_then(Property::as_list)
    }

    /// Numeric list, skipping non-numeric entries
    pub fn get_f64_list(&self, path: &str) -> Vec<f64> {
        self.get_list(path)
            .map(|items| items.iter().filter_map(Property::as_f64).collect())
            .unwrap_or_default()
    }

    /// Integer list, skipping non-numeric entries
    pub fn get_i64_list(&self, path: &str) -> Vec<i64> {
        self.get_list(path)
            .map(|items| items.iter().filter_map(Property::as_i64).collect())
            .unwrap_or_default()
    }
}

const UTF16_BOM: [u8; 2] = [0xFE, 0xFF];

/// Parse an engine data blob into its root dictionary
///
/// Returns an empty map when the blob holds no dictionary.
pub fn parse(data: &[u8]) -> Result<MapProperty, TextEngineError> {
    let mut parser = Parser {
        data,
        pos: 0,
        stack: Vec::new(),
        names: Vec::new(),
        root: None,
    };
    parser.run()?;
    Ok(match parser.root {
        Some(Property::Map(map)) => map,
        _ => MapProperty::default(),
    })
}

struct Parser<'a> {
    data: &'a [u8],
    pos: usize,
    /// Open containers, innermost last
    stack: Vec<Property>,
    /// Names waiting for their value, innermost last
    names: Vec<String>,
    root: Option<Property>,
}

impl<'a> Parser<'a> {
    fn run(&mut self) -> Result<(), TextEngineError> {
        while self.pos < self.data.len() {
            while self.data.get(self.pos) == Some(&b'\t') {
                self.pos += 1;
            }
            let start = self.pos;
            let end = self.line_end(start);
            self.pos = end + 1;
            if end > start {
                self.line(start, end)?;
            }
        }
        Ok(())
    }

    /// Index of the newline ending the line at `start` (or the data length)
    fn line_end(&self, start: usize) -> usize {
        self.data[start.min(self.data.len())..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(self.data.len(), |offset| start + offset)
    }

    fn line(&mut self, start: usize, end: usize) -> Result<(), TextEngineError> {
        let data = self.data;
        match &data[start..end] {
            b"<<" => self.stack.push(Property::Map(MapProperty::default())),
            b">>" | b"]" => self.close(),
            [b'/', ..] => self.named(start, end)?,
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self) {
        if let Some(value) = self.stack.pop() {
            self.add(value);
        }
    }

    fn add(&mut self, value: Property) {
        match self.stack.last_mut() {
            Some(Property::List(items)) => items.push(value),
            Some(Property::Map(map)) => {
                if let Some(name) = self.names.pop() {
                    map.0.insert(name, value);
                }
            }
            Some(_) => {}
            None => self.root = Some(value),
        }
    }

    /// `/Name` optionally followed by a space and a value
    fn named(&mut self, start: usize, end: usize) -> Result<(), TextEngineError> {
        let data = self.data;
        let line = &data[start + 1..end];
        let name_len = line.iter().position(|&b| b == b' ').unwrap_or(line.len());
        self.names
            .push(String::from_utf8_lossy(&line[..name_len]).into_owned());
        if name_len == line.len() {
            // value follows on the next lines
            return Ok(());
        }

        let value_start = start + 1 + name_len + 1;
        let value = &data[value_start..end];
        match value.first() {
            Some(b'[') => {
                self.stack.push(Property::List(Vec::new()));
                if value.len() > 1 && value.ends_with(b"]") {
                    let inner = String::from_utf8_lossy(&value[1..value.len() - 1]).into_owned();
                    for token in inner.split_whitespace() {
                        let item = scalar(token)?;
                        self.add(item);
                    }
                    self.close();
                }
            }
            Some(b'(') if value.get(1..3) == Some(&UTF16_BOM[..]) => {
                let text = self.string(value_start, end);
                self.add(Property::String(text));
            }
            Some(b'(') => {
                tracing::debug!("Skipping non-Unicode engine data string");
                self.names.pop();
            }
            Some(_) => {
                let token = String::from_utf8_lossy(value).into_owned();
                let item = scalar(token.trim())?;
                self.add(item);
            }
            None => {
                self.names.pop();
            }
        }
        Ok(())
    }

    /// UTF-16 string from `(` at `start`, possibly spanning several lines
    ///
    /// The string ends on the first line whose last byte is an unescaped `)`.
    fn string(&mut self, start: usize, mut end: usize) -> String {
        let data = self.data;
        while !ends_string(&data[start + 3..end]) && end < data.len() {
            end = self.line_end(end + 1);
        }
        self.pos = end + 1;

        let content_end = if end > start + 3 && data[end - 1] == b')' {
            end - 1
        } else {
            end
        };
        let raw = unescape(&data[start + 3..content_end]);
        decode_utf16_be(&raw).replace('\r', "\n")
    }
}

fn ends_string(content: &[u8]) -> bool {
    match content {
        [.., b'\\', b')'] => {
            // an even run of backslashes escapes itself, not the paren
            let slashes = content[..content.len() - 1]
                .iter()
                .rev()
                .take_while(|&&b| b == b'\\')
                .count();
            slashes % 2 == 0
        }
        [.., b')'] => true,
        _ => false,
    }
}

/// Drop the backslash in front of escaped bytes
fn unescape(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut bytes = raw.iter();
    while let Some(&b) = bytes.next() {
        if b == b'\\' {
            if let Some(&escaped) = bytes.next() {
                out.push(escaped);
            }
        } else {
            out.push(b);
        }
    }
    out
}

/// Classify a bare token: `t`/`f` booleans, `/Name` literals, `.` floats, otherwise int or float
fn scalar(token: &str) -> Result<Property, TextEngineError> {
    let invalid = || TextEngineError::InvalidNumber(token.to_string());
    match token.as_bytes().first() {
        Some(b't') | Some(b'f') => Ok(Property::Bool(token.eq_ignore_ascii_case("true"))),
        Some(b'/') => Ok(Property::String(token[1..].to_string())),
        _ if token.contains('.') => token.parse().map(Property::Float).map_err(|_| invalid()),
        _ => token.parse().map(Property::Int).map_err(|_| invalid()),
    }
}
