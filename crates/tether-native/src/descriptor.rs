//! Native project descriptor (`config.xml`) editing.
//!
//! The descriptor is treated as a mapping from element tag to attributes,
//! restricted to the direct children of the root element. The only mutation
//! is [`NativeDescriptor::upsert`], which keeps at most one element per tag.
//!
//! Edits are spliced into the original text using the byte ranges reported by
//! `roxmltree`, so comments, namespaces, the prolog and the author's formatting
//! survive untouched. Running the same upsert twice yields the same bytes.

use std::ops::Range;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use roxmltree::{Document, Node};

use crate::error::{NativeError, Result};

const DEFAULT_INDENT: &str = "    ";

/// Attributes of one element, in document order.
pub type Attributes = Vec<(String, String)>;

/// A parsed native descriptor bound to the path it was read from.
#[derive(Debug, Clone)]
pub struct NativeDescriptor {
    path: PathBuf,
    source: String,
}

/// One text replacement against the current source.
#[derive(Debug)]
struct Edit {
    range: Range<usize>,
    text: String,
}

impl NativeDescriptor {
    /// Parse descriptor text. The path is kept for error messages and writes.
    pub fn parse(path: impl Into<PathBuf>, source: impl Into<String>) -> Result<Self> {
        let descriptor = Self {
            path: path.into(),
            source: source.into(),
        };
        descriptor.document()?;
        Ok(descriptor)
    }

    /// Read and parse a descriptor from disk.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        Self::parse(path, source)
    }

    /// Write the current text back to the path it was read from.
    pub fn write(&self) -> Result<()> {
        std::fs::write(&self.path, self.source.as_bytes())?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Tag-to-attributes view of the root's children. First occurrence wins.
    pub fn elements(&self) -> Result<IndexMap<String, Attributes>> {
        let doc = self.document()?;
        let mut elements = IndexMap::new();
        for child in doc.root_element().children().filter(Node::is_element) {
            elements
                .entry(child.tag_name().name().to_string())
                .or_insert_with(|| attributes_of(&child));
        }
        Ok(elements)
    }

    /// Attributes of the first root child named `tag`.
    pub fn element(&self, tag: &str) -> Result<Option<Attributes>> {
        Ok(self.elements()?.shift_remove(tag))
    }

    /// Number of root children named `tag`.
    pub fn count(&self, tag: &str) -> Result<usize> {
        let doc = self.document()?;
        Ok(doc
            .root_element()
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == tag)
            .count())
    }

    /// Insert or replace the root child named `tag`.
    ///
    /// An existing element keeps its children but has its attributes replaced
    /// by `attributes`; any further elements with the same tag are removed.
    /// A missing element is added after the last child element.
    pub fn upsert(&mut self, tag: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let mut edits = {
            let doc = self.document()?;
            plan_upsert(&self.source, &doc, tag, attributes)
        };

        // Apply back to front so earlier ranges stay valid.
        edits.sort_by(|a, b| b.range.start.cmp(&a.range.start));
        for edit in edits {
            self.source.replace_range(edit.range, &edit.text);
        }

        tracing::debug!(path = %self.path.display(), tag, "upserted descriptor element");
        Ok(())
    }

    fn document(&self) -> Result<Document<'_>> {
        Document::parse(&self.source).map_err(|source| NativeError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

fn plan_upsert(source: &str, doc: &Document<'_>, tag: &str, attributes: &[(&str, &str)]) -> Vec<Edit> {
    let root = doc.root_element();
    let matches: Vec<Node<'_, '_>> = root
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == tag)
        .collect();

    let Some((first, stale)) = matches.split_first() else {
        return vec![insertion(source, &root, tag, attributes)];
    };

    let start = first.range().start;
    let end = start_tag_end(source, start);
    let self_closing = source[..end].ends_with("/>");
    let name = raw_name(source, start);

    let mut edits = vec![Edit {
        range: start..end,
        text: start_tag(name, attributes, self_closing),
    }];
    edits.extend(stale.iter().map(|node| Edit {
        range: removal_range(source, node.range()),
        text: String::new(),
    }));
    edits
}

fn insertion(source: &str, root: &Node<'_, '_>, tag: &str, attributes: &[(&str, &str)]) -> Edit {
    let newline = if source.contains("\r\n") { "\r\n" } else { "\n" };
    let element = start_tag(tag, attributes, true);

    if let Some(last) = root.children().filter(Node::is_element).last() {
        let indent = line_indent(source, last.range().start).unwrap_or(DEFAULT_INDENT);
        let at = last.range().end;
        return Edit {
            range: at..at,
            text: format!("{newline}{indent}{element}"),
        };
    }

    let root_range = root.range();
    let root_text = &source[root_range.clone()];
    if root_text.ends_with("/>") {
        // `<widget/>` has to grow a body and an end tag.
        let root_name = raw_name(source, root_range.start);
        return Edit {
            range: root_range.end - 2..root_range.end,
            text: format!(">{newline}{DEFAULT_INDENT}{element}{newline}</{root_name}>"),
        };
    }

    let close = root_text
        .rfind("</")
        .map(|offset| root_range.start + offset)
        .unwrap_or(root_range.end);
    let text = if source[..close].ends_with('\n') {
        format!("{DEFAULT_INDENT}{element}{newline}")
    } else {
        format!("{newline}{DEFAULT_INDENT}{element}{newline}")
    };
    Edit {
        range: close..close,
        text,
    }
}

/// Byte offset just past the `>` closing the start tag that begins at `from`.
fn start_tag_end(source: &str, from: usize) -> usize {
    let mut quote: Option<u8> = None;
    for (i, &b) in source.as_bytes().iter().enumerate().skip(from) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => return i + 1,
                _ => {}
            },
        }
    }
    source.len()
}

/// The element name as written, including any namespace prefix.
fn raw_name(source: &str, tag_start: usize) -> &str {
    let rest = &source[tag_start + 1..];
    let len = rest
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .unwrap_or(rest.len());
    &rest[..len]
}

/// Whitespace preceding `pos` on its line, if the line holds nothing else.
fn line_indent(source: &str, pos: usize) -> Option<&str> {
    let line_start = source[..pos].rfind('\n').map(|i| i + 1)?;
    let indent = &source[line_start..pos];
    indent
        .chars()
        .all(|c| c == ' ' || c == '\t')
        .then_some(indent)
}

/// Range covering an element plus the indentation and line break before it.
fn removal_range(source: &str, range: Range<usize>) -> Range<usize> {
    let before = source[..range.start].trim_end_matches([' ', '\t']);
    let start = match before.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest).len(),
        None => range.start,
    };
    start..range.end
}

fn start_tag(name: &str, attributes: &[(&str, &str)], self_closing: bool) -> String {
    let mut tag = format!("<{name}");
    for (key, value) in attributes {
        tag.push(' ');
        tag.push_str(key);
        tag.push_str("=\"");
        tag.push_str(&escape_attribute(value));
        tag.push('"');
    }
    tag.push_str(if self_closing { " />" } else { ">" });
    tag
}

fn attributes_of(node: &Node<'_, '_>) -> Attributes {
    node.attributes()
        .map(|a| (a.name().to_string(), a.value().to_string()))
        .collect()
}

/// Escape a value for use inside a double-quoted XML/HTML attribute.
pub(crate) fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
