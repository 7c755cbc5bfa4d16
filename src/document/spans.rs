//! Source positions of a parsed YAML document, used to apply edits to the
//! original text instead of re-serializing it.
use crate::document::path::{PathLocation, PathSegment};
use crate::error::Result;
use serde_yaml::{Mapping, Value};
use std::collections::{HashMap, HashSet};
use yaml_rust::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust::scanner::{Marker, TScalarStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
}

/// Byte range of a scalar value, quotes included.
#[derive(Debug, Clone)]
struct ScalarSpan {
    start: usize,
    end: usize,
    style: ScalarStyle,
}

/// Where every node of a document sits in its source text.
///
/// Only block mappings get entry positions; flow collections and block
/// scalars are rewritten as part of their enclosing entry.
#[derive(Debug, Clone, Default)]
pub(crate) struct SourceMap {
    scalars: HashMap<PathLocation, ScalarSpan>,
    /// Byte offset of the key of each block mapping entry, by value path
    keys: HashMap<PathLocation, usize>,
    block_mappings: HashSet<PathLocation>,
}

impl SourceMap {
    /// Returns `None` if the text cannot be scanned.
    pub(crate) fn build(text: &str) -> Option<Self> {
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(text.len()))
            .collect();
        let mut collector = Collector {
            text,
            offsets: &offsets,
            frames: Vec::new(),
            skipped_depth: 0,
            map: SourceMap::default(),
        };
        let mut parser = Parser::new(text.chars());
        parser.load(&mut collector, false).ok()?;
        Some(collector.map)
    }

    /// Rewrites `text`, which parsed to `original`, so that it parses to
    /// `current`. Untouched nodes keep their comments and formatting.
    ///
    /// Returns `None` when some change has no place in the source, e.g. a
    /// different root or a key removed from a flow mapping.
    pub(crate) fn render(
        &self,
        text: &str,
        original: &Value,
        current: &Value,
    ) -> Result<Option<String>> {
        let mut planner = Planner {
            map: self,
            text,
            edits: Vec::new(),
        };
        if !planner.node(&PathLocation::new(), original, current)? {
            return Ok(None);
        }

        let mut edits = planner.edits;
        // stable: inserts sharing an offset keep planning order once applied back to front
        edits.sort_by_key(|edit| edit.start);
        let mut out = text.to_string();
        for edit in edits.iter().rev() {
            out.replace_range(edit.start..edit.end, &edit.text);
        }
        Ok(Some(out))
    }
}

enum Frame {
    Mapping {
        block: bool,
        key: Option<PathSegment>,
        expecting_key: bool,
    },
    Sequence {
        next: usize,
    },
}

struct Collector<'a> {
    text: &'a str,
    /// Byte offset of every char index, plus the end of the text
    offsets: &'a [usize],
    frames: Vec<Frame>,
    /// Nesting depth inside a collection used as a mapping key
    skipped_depth: usize,
    map: SourceMap,
}

impl Collector<'_> {
    fn byte_offset(&self, mark: &Marker) -> usize {
        self.offsets
            .get(mark.index())
            .copied()
            .unwrap_or(self.text.len())
    }

    fn current_path(&self) -> Option<PathLocation> {
        let mut path = PathLocation::new();
        for frame in &self.frames {
            match frame {
                Frame::Mapping {
                    key: Some(key),
                    expecting_key: false,
                    ..
                } => path.push(key.clone()),
                Frame::Mapping { .. } => return None,
                Frame::Sequence { next } => path.push(*next),
            }
        }
        Some(path)
    }

    fn in_key_position(&self) -> bool {
        matches!(
            self.frames.last(),
            Some(Frame::Mapping {
                expecting_key: true,
                ..
            })
        )
    }

    fn key_done(&mut self, name: Option<PathSegment>) {
        if let Some(Frame::Mapping {
            key, expecting_key, ..
        }) = self.frames.last_mut()
        {
            *key = name;
            *expecting_key = false;
        }
    }

    fn value_done(&mut self) {
        match self.frames.last_mut() {
            Some(Frame::Mapping {
                key, expecting_key, ..
            }) => {
                *key = None;
                *expecting_key = true;
            }
            Some(Frame::Sequence { next }) => *next += 1,
            None => {}
        }
    }
}

impl MarkedEventReceiver for Collector<'_> {
    fn on_event(&mut self, event: Event, mark: Marker) {
        if self.skipped_depth > 0 {
            match event {
                Event::MappingStart(_) | Event::SequenceStart(_) => self.skipped_depth += 1,
                Event::MappingEnd | Event::SequenceEnd => {
                    self.skipped_depth -= 1;
                    if self.skipped_depth == 0 {
                        self.key_done(None);
                    }
                }
                _ => {}
            }
            return;
        }

        let start = self.byte_offset(&mark);
        match event {
            Event::MappingStart(_) | Event::SequenceStart(_) if self.in_key_position() => {
                self.skipped_depth = 1;
            }
            Event::MappingStart(_) => {
                let block = !self.text[start..].starts_with('{');
                if block {
                    if let Some(path) = self.current_path() {
                        self.map.block_mappings.insert(path);
                    }
                }
                self.frames.push(Frame::Mapping {
                    block,
                    key: None,
                    expecting_key: true,
                });
            }
            Event::SequenceStart(_) => self.frames.push(Frame::Sequence { next: 0 }),
            Event::MappingEnd | Event::SequenceEnd => {
                self.frames.pop();
                self.value_done();
            }
            Event::Scalar(name, ..) if self.in_key_position() => {
                self.key_done(Some(PathSegment::Key(name)));
                if matches!(self.frames.last(), Some(Frame::Mapping { block: true, .. })) {
                    if let Some(path) = self.current_path() {
                        self.map.keys.insert(path, start);
                    }
                }
            }
            Event::Scalar(value, style, ..) => {
                if let Some(path) = self.current_path() {
                    if let Some(span) = scalar_span(self.text, start, &value, style) {
                        self.map.scalars.insert(path, span);
                    }
                }
                self.value_done();
            }
            Event::Alias(_) if self.in_key_position() => self.key_done(None),
            Event::Alias(_) => self.value_done(),
            _ => {}
        }
    }
}

/// Span of a single-line scalar whose source text decodes to `value`.
fn scalar_span(text: &str, start: usize, value: &str, style: TScalarStyle) -> Option<ScalarSpan> {
    let rest = text.get(start..)?;
    let (len, style) = match style {
        TScalarStyle::Plain => (rest.starts_with(value).then_some(value.len())?, ScalarStyle::Plain),
        TScalarStyle::SingleQuoted => {
            let inner = rest.strip_prefix('\'')?;
            let bytes = inner.as_bytes();
            let mut i = 0;
            let close = loop {
                match *bytes.get(i)? {
                    b'\'' if bytes.get(i + 1) == Some(&b'\'') => i += 2,
                    b'\'' => break i,
                    b'\n' => return None,
                    _ => i += 1,
                }
            };
            if inner[..close].replace("''", "'") != value {
                return None;
            }
            (close + 2, ScalarStyle::SingleQuoted)
        }
        TScalarStyle::DoubleQuoted => {
            let inner = rest.strip_prefix('"')?;
            let close = inner.find(['"', '\\', '\n'])?;
            if !inner[close..].starts_with('"') || &inner[..close] != value {
                return None;
            }
            (close + 2, ScalarStyle::DoubleQuoted)
        }
        _ => return None,
    };
    Some(ScalarSpan {
        start,
        end: start + len,
        style,
    })
}

struct Edit {
    start: usize,
    end: usize,
    text: String,
}

struct Planner<'a> {
    map: &'a SourceMap,
    text: &'a str,
    edits: Vec<Edit>,
}

impl Planner<'_> {
    /// Plans the edits turning `original` into `current` at `path`.
    /// `false` means the node has to be rewritten by its parent.
    fn node(&mut self, path: &PathLocation, original: &Value, current: &Value) -> Result<bool> {
        if same_content(original, current) {
            return Ok(true);
        }
        match (original, current) {
            (Value::String(_), Value::String(new)) => Ok(self.scalar(path, new)),
            (Value::Mapping(old), Value::Mapping(new)) if self.map.block_mappings.contains(path) => {
                self.mapping(path, old, new)
            }
            (Value::Sequence(old), Value::Sequence(new)) if old.len() == new.len() => {
                for (i, (old, new)) in old.iter().zip(new).enumerate() {
                    if !self.child(&path.join(i), old, new)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Like [`Planner::node`], falling back to rewriting the whole entry.
    fn child(&mut self, path: &PathLocation, original: &Value, current: &Value) -> Result<bool> {
        let planned = self.edits.len();
        if self.node(path, original, current)? {
            return Ok(true);
        }
        self.edits.truncate(planned);
        self.replace_entry(path, current)
    }

    fn mapping(&mut self, path: &PathLocation, old: &Mapping, new: &Mapping) -> Result<bool> {
        if old.iter().any(|(key, _)| !new.contains_key(key)) {
            return Ok(false);
        }
        for (key, value) in new.iter() {
            let Value::String(name) = key else {
                return Ok(false);
            };
            let planned = match old.get(key) {
                Some(previous) => self.child(&path.join(name.as_str()), previous, value)?,
                None => self.insert_entry(path, name, value)?,
            };
            if !planned {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn scalar(&mut self, path: &PathLocation, value: &str) -> bool {
        let Some(span) = self.map.scalars.get(path) else {
            return false;
        };
        self.edits.push(Edit {
            start: span.start,
            end: span.end,
            text: render_scalar(value, span.style),
        });
        true
    }

    fn replace_entry(&mut self, path: &PathLocation, value: &Value) -> Result<bool> {
        let (Some(PathSegment::Key(key)), Some(&start)) =
            (path.segments().last(), self.map.keys.get(path))
        else {
            return Ok(false);
        };
        let column = start - line_start(self.text, start);
        self.edits.push(Edit {
            start,
            end: entry_end(self.text, start, column),
            text: render_entry(key, value, column)?,
        });
        Ok(true)
    }

    /// Appends a new entry after the last entry of the block mapping at `parent`.
    fn insert_entry(&mut self, parent: &PathLocation, key: &str, value: &Value) -> Result<bool> {
        let last = self
            .map
            .keys
            .iter()
            .filter(|(path, _)| {
                path.len() == parent.len() + 1 && path.segments().starts_with(parent.segments())
            })
            .map(|(_, &start)| start)
            .max();
        let Some(last) = last else {
            return Ok(false);
        };
        let column = last - line_start(self.text, last);
        let end = entry_end(self.text, last, column);

        let mut text = String::new();
        if !self.text[..end].ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&" ".repeat(column));
        text.push_str(&render_entry(key, value, column)?);
        self.edits.push(Edit {
            start: end,
            end,
            text,
        });
        Ok(true)
    }
}

/// Structural equality that ignores mapping key order.
fn same_content(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Mapping(a), Value::Mapping(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, value)| b.get(key).is_some_and(|other| same_content(value, other)))
        }
        (Value::Sequence(a), Value::Sequence(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| same_content(a, b))
        }
        _ => a == b,
    }
}

fn line_start(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map_or(0, |i| i + 1)
}

fn line_end(text: &str, offset: usize) -> usize {
    text[offset..].find('\n').map_or(text.len(), |i| offset + i + 1)
}

/// End of the entry whose key starts at `key_start`: the last line indented
/// deeper than the key, or an indentless sequence item at the key's column.
/// Trailing comments and blank lines stay with whatever follows.
fn entry_end(text: &str, key_start: usize, column: usize) -> usize {
    let mut end = line_end(text, key_start);
    let mut cursor = end;
    while cursor < text.len() {
        let next = line_end(text, cursor);
        let line = text[cursor..next].trim_end_matches(['\n', '\r']);
        let content = line.trim_start_matches(' ');
        if content.is_empty() || content.starts_with('#') {
            cursor = next;
            continue;
        }
        let indent = line.len() - content.len();
        let nested =
            indent > column || (indent == column && (content == "-" || content.starts_with("- ")));
        if !nested {
            break;
        }
        end = next;
        cursor = next;
    }
    end
}

/// `key: value` as block YAML, continuation lines indented to `column`.
fn render_entry(key: &str, value: &Value, column: usize) -> Result<String> {
    let mut entry = Mapping::new();
    entry.insert(Value::String(key.to_string()), value.clone());
    let body = serde_yaml::to_string(&Value::Mapping(entry))?;
    let body = body.strip_prefix("---\n").unwrap_or(&body);

    let indent = " ".repeat(column);
    let mut out = String::with_capacity(body.len());
    for (i, line) in body.lines().enumerate() {
        if i > 0 {
            out.push_str(&indent);
        }
        out.push_str(line);
        out.push('\n');
    }
    Ok(out)
}

fn render_scalar(value: &str, style: ScalarStyle) -> String {
    match style {
        ScalarStyle::Plain if is_plain_safe(value) => value.to_string(),
        ScalarStyle::SingleQuoted => format!("'{}'", value.replace('\'', "''")),
        _ => format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\"")),
    }
}

/// A plain scalar must read back as the same string in block and flow context.
fn is_plain_safe(value: &str) -> bool {
    !value.contains([',', '[', ']', '{', '}', '\n'])
        && matches!(serde_yaml::from_str::<Value>(value), Ok(Value::String(parsed)) if parsed == value)
}
