//! Reader for the INI dialect used by the AWS shared config and credentials files
//!
//! The reader is strict: anything that is not a blank line, a comment, a section header or a
//! `key = value` pair is rejected along with its line number. Both `=` and `:` are accepted as
//! delimiters, matching what the AWS tooling accepts.
use thiserror::Error;

/// Name of the section that global defaults are declared under
pub const GLOBAL_DEFAULTS_SECTION: &str = "DEFAULT";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
  #[error("line {line}: unclosed section header")]
  UnclosedSection { line: usize },

  #[error("line {line}: empty section name")]
  EmptySectionName { line: usize },

  #[error("line {line}: unexpected text after section header")]
  TrailingText { line: usize },

  #[error("line {line}: key-value delimiter not found")]
  MissingDelimiter { line: usize },

  #[error("line {line}: empty key name")]
  EmptyKey { line: usize },
}

/// A named section and its properties, in the order they were declared
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Section {
  name: String,
  properties: Vec<(String, String)>,
}

impl Section {
  fn new(name: &str) -> Self {
    Section {
      name: name.to_owned(),
      properties: Vec::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Value of the given key, if declared
  pub fn get(&self, key: &str) -> Option<&str> {
    self
      .properties
      .iter()
      .find(|(k, _)| k == key)
      .map(|(_, v)| v.as_str())
  }

  fn set(&mut self, key: &str, value: &str) {
    match self.properties.iter_mut().find(|(k, _)| k == key) {
      Some(property) => property.1 = value.to_owned(),
      None => self.properties.push((key.to_owned(), value.to_owned())),
    }
  }
}

/// A parsed INI document
///
/// Properties declared before the first section header belong to the unnamed `root` section
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
  root: Section,
  sections: Vec<Section>,
}

impl Document {
  /// Properties declared before any section header
  #[cfg(test)]
  fn root(&self) -> &Section {
    &self.root
  }

  /// Named sections in order of first appearance
  pub fn sections(&self) -> &[Section] {
    &self.sections
  }

  #[cfg(test)]
  fn section(&self, name: &str) -> Option<&Section> {
    self.sections.iter().find(|s| s.name == name)
  }

  /// Index of the named section, creating it when it has not been seen yet
  ///
  /// A repeated header reopens the earlier section rather than shadowing it
  fn open(&mut self, name: &str) -> usize {
    match self.sections.iter().position(|s| s.name == name) {
      Some(idx) => idx,
      None => {
        self.sections.push(Section::new(name));
        self.sections.len() - 1
      }
    }
  }
}

fn is_comment(line: &str) -> bool {
  line.starts_with('#') || line.starts_with(';')
}

/// Remove a trailing inline comment; the marker must be preceded by whitespace
fn strip_inline_comment(value: &str) -> &str {
  let bytes = value.as_bytes();
  for (idx, ch) in value.char_indices() {
    if (ch == '#' || ch == ';') && idx > 0 && bytes[idx - 1].is_ascii_whitespace() {
      return value[..idx].trim_end();
    }
  }
  value
}

fn unquote(value: &str) -> &str {
  for quote in ['"', '\''] {
    if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
      return &value[1..value.len() - 1];
    }
  }
  value
}

fn parse_header(line: &str, line_no: usize) -> Result<&str, ParseError> {
  let inner = &line[1..];
  let end = inner.find(']').ok_or(ParseError::UnclosedSection { line: line_no })?;
  let rest = inner[end + 1..].trim();
  if !rest.is_empty() && !is_comment(rest) {
    return Err(ParseError::TrailingText { line: line_no });
  }

  let name = inner[..end].trim();
  if name.is_empty() {
    return Err(ParseError::EmptySectionName { line: line_no });
  }

  Ok(name)
}

fn parse_property(line: &str, line_no: usize) -> Result<(&str, &str), ParseError> {
  let delim = line
    .find(|c: char| c == '=' || c == ':')
    .ok_or(ParseError::MissingDelimiter { line: line_no })?;

  let key = line[..delim].trim();
  if key.is_empty() {
    return Err(ParseError::EmptyKey { line: line_no });
  }

  let value = unquote(strip_inline_comment(line[delim + 1..].trim()));

  Ok((key, value))
}

/// Byte order mark some editors write at the start of UTF-8 files
const BOM: char = '\u{feff}';

/// Parse the contents of an INI file
pub fn parse(contents: &str) -> Result<Document, ParseError> {
  let contents = contents.strip_prefix(BOM).unwrap_or(contents);
  let mut doc = Document::default();
  let mut current: Option<usize> = None;

  for (idx, raw) in contents.lines().enumerate() {
    let line_no = idx + 1;
    let line = raw.trim();

    if line.is_empty() || is_comment(line) {
      continue;
    }

    if line.starts_with('[') {
      let name = parse_header(line, line_no)?;
      current = Some(doc.open(name));
      continue;
    }

    let (key, value) = parse_property(line, line_no)?;
    match current {
      Some(idx) => doc.sections[idx].set(key, value),
      None => doc.root.set(key, value),
    }
  }

  Ok(doc)
}
