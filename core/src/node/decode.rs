//! Text -> `Node` decoding.
//!
//! JSON files go through `serde_json` (so JSON strings never turn into
//! timestamps). Everything else is read from `saphyr-parser` events, which
//! also accept JSON. Reading events rather than a value tree keeps the scalar
//! style and tag: only plain scalars are typed (null, bool, number,
//! timestamp), while quoted, block and `!!str` scalars stay strings. YAML
//! anchors, aliases and `<<` merge keys are expanded here.

use super::{Mapping, Node, Number, Scalar, Timestamp};
use crate::error::{ResolveError, ResolveResult};
use saphyr_parser::{Event, Marker, Parser, ScalarStyle, ScanError};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::iter::Peekable;
use std::path::Path;
use std::vec::IntoIter;

/// The concrete syntax of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    /// Strict JSON.
    Json,
    /// YAML 1.2 (a superset of JSON).
    Yaml,
}

impl Syntax {
    /// Picks the syntax from a file extension. Unknown extensions decode as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Syntax::Json,
            _ => Syntax::Yaml,
        }
    }
}

/// Decodes `text` into a document tree.
///
/// `path` is only used to choose the syntax and to label errors.
pub fn decode_document(text: &str, path: &Path) -> ResolveResult<Node> {
    match Syntax::from_path(path) {
        Syntax::Json => {
            let value: JsonValue =
                serde_json::from_str(text).map_err(|e| ResolveError::Decode {
                    path: path.to_path_buf(),
                    line: Some(e.line()),
                    column: Some(e.column()),
                    message: e.to_string(),
                })?;
            Ok(from_json(value))
        }
        Syntax::Yaml => {
            let mut events = Vec::new();
            for item in Parser::new_from_str(text) {
                let (event, span) = item.map_err(|e| scan_error(path, &e))?;
                events.push((event, span.start));
            }
            YamlReader {
                events: events.into_iter().peekable(),
                anchors: HashMap::new(),
                path,
            }
            .read_stream()
        }
    }
}

fn scan_error(path: &Path, err: &ScanError) -> ResolveError {
    ResolveError::Decode {
        path: path.to_path_buf(),
        line: Some(err.marker().line()),
        column: Some(err.marker().col() + 1),
        message: err.info().to_string(),
    }
}

fn from_json(value: JsonValue) -> Node {
    match value {
        JsonValue::Null => Node::Scalar(Scalar::Null),
        JsonValue::Bool(b) => Node::Scalar(Scalar::Bool(b)),
        JsonValue::Number(n) => Node::Scalar(Scalar::Number(json_number(&n))),
        JsonValue::String(s) => Node::Scalar(Scalar::String(s)),
        JsonValue::Array(items) => Node::Sequence(items.into_iter().map(from_json).collect()),
        JsonValue::Object(map) => Node::Mapping(
            map.into_iter()
                .map(|(k, v)| (k, from_json(v)))
                .collect(),
        ),
    }
}

fn json_number(n: &serde_json::Number) -> Number {
    if let Some(i) = n.as_i64() {
        Number::Int(i)
    } else if let Some(u) = n.as_u64() {
        Number::UInt(u)
    } else {
        Number::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

/// Builds a `Node` from a buffered YAML event stream.
struct YamlReader<'input, 'p> {
    events: Peekable<IntoIter<(Event<'input>, Marker)>>,
    anchors: HashMap<usize, Node>,
    path: &'p Path,
}

/// A mapping key: either the `<<` merge key or a key spelled as text.
enum Key {
    Merge,
    Text(String),
}

impl<'input, 'p> YamlReader<'input, 'p> {
    fn read_stream(mut self) -> ResolveResult<Node> {
        let mut document = None;
        while let Some((event, mark)) = self.events.next() {
            match event {
                Event::DocumentStart(..) => {
                    if document.is_some() {
                        return Err(self.error_at(
                            mark,
                            "more than one document in a single file is not supported",
                        ));
                    }
                    document = Some(self.read_node()?);
                }
                Event::StreamStart | Event::StreamEnd | Event::DocumentEnd => {}
                _ => return Err(self.error_at(mark, "unexpected event outside a document")),
            }
        }
        Ok(document.unwrap_or(Node::Scalar(Scalar::Null)))
    }

    fn read_node(&mut self) -> ResolveResult<Node> {
        let (event, mark) = self.next_event()?;
        match event {
            Event::Scalar(value, style, anchor, tag) => {
                let tag = tag.as_ref().map(|t| (t.handle.to_string(), t.suffix.to_string()));
                let node = Node::Scalar(self.scalar(&value, style, tag, mark)?);
                Ok(self.remember(anchor, node))
            }
            Event::SequenceStart(anchor, ..) => {
                let mut items = Vec::new();
                loop {
                    if matches!(self.events.peek(), Some((Event::SequenceEnd, _))) {
                        self.events.next();
                        break;
                    }
                    items.push(self.read_node()?);
                }
                Ok(self.remember(anchor, Node::Sequence(items)))
            }
            Event::MappingStart(anchor, ..) => {
                let map = self.read_mapping()?;
                Ok(self.remember(anchor, Node::Mapping(map)))
            }
            Event::Alias(id) => self.alias(id, mark),
            _ => Err(self.error_at(mark, "unexpected YAML event")),
        }
    }

    fn read_mapping(&mut self) -> ResolveResult<Mapping> {
        let mut own = Mapping::new();
        let mut merged = Vec::new();
        loop {
            if matches!(self.events.peek(), Some((Event::MappingEnd, _))) {
                self.events.next();
                break;
            }
            let (key, mark) = self.read_key()?;
            let value = self.read_node()?;
            match key {
                Key::Merge => merged.extend(self.merge_sources(value, mark)?),
                Key::Text(key) => {
                    if own.contains_key(&key) {
                        return Err(
                            self.error_at(mark, format!("duplicate mapping key '{}'", key))
                        );
                    }
                    own.insert(key, value);
                }
            }
        }

        // Explicit keys win over merged ones; earlier merge sources win over later.
        for source in merged {
            for (key, value) in source {
                own.entry(key).or_insert(value);
            }
        }
        Ok(own)
    }

    /// Scalar keys are spelled as their source text (`200:` becomes `"200"`).
    fn read_key(&mut self) -> ResolveResult<(Key, Marker)> {
        let (event, mark) = self.next_event()?;
        let key = match event {
            Event::Scalar(value, style, anchor, tag) => {
                let plain = matches!(style, ScalarStyle::Plain);
                if plain && tag.is_none() && value == "<<" {
                    return Ok((Key::Merge, mark));
                }
                let tag = tag.as_ref().map(|t| (t.handle.to_string(), t.suffix.to_string()));
                let scalar = self.scalar(&value, style, tag, mark)?;
                let text = match &scalar {
                    Scalar::Null if plain => "null".to_string(),
                    _ => value.to_string(),
                };
                self.remember(anchor, Node::Scalar(scalar));
                text
            }
            Event::Alias(id) => match self.alias(id, mark)? {
                Node::Scalar(scalar) => scalar_text(&scalar),
                _ => return Err(self.error_at(mark, "complex mapping keys are not supported")),
            },
            _ => return Err(self.error_at(mark, "complex mapping keys are not supported")),
        };
        Ok((Key::Text(key), mark))
    }

    fn merge_sources(&self, value: Node, mark: Marker) -> ResolveResult<Vec<Mapping>> {
        match value {
            Node::Mapping(map) => Ok(vec![map]),
            Node::Sequence(items) => items
                .into_iter()
                .map(|item| match item {
                    Node::Mapping(map) => Ok(map),
                    _ => Err(self.error_at(mark, "merge sequence entries must be mappings")),
                })
                .collect(),
            _ => Err(self.error_at(
                mark,
                "merge value must be a mapping or a sequence of mappings",
            )),
        }
    }

    fn scalar(
        &self,
        value: &str,
        style: ScalarStyle,
        tag: Option<(String, String)>,
        mark: Marker,
    ) -> ResolveResult<Scalar> {
        let plain = matches!(style, ScalarStyle::Plain);
        match tag.as_ref().map(|(handle, suffix)| (handle.as_str(), suffix.as_str())) {
            None if plain => Ok(resolve_plain(value)),
            None => Ok(Scalar::String(value.to_string())),
            Some((handle, suffix)) => match core_tag(handle, suffix) {
                Some("str") => Ok(Scalar::String(value.to_string())),
                Some("timestamp") => Timestamp::parse(value)
                    .map(Scalar::Timestamp)
                    .ok_or_else(|| {
                        self.error_at(mark, format!("'{}' is not a valid timestamp", value))
                    }),
                Some("null") | Some("bool") | Some("int") | Some("float") => {
                    Ok(resolve_plain(value))
                }
                // The non-specific `!` tag forces a string.
                _ if handle == "!" && suffix.is_empty() => Ok(Scalar::String(value.to_string())),
                _ if plain => Ok(resolve_plain(value)),
                _ => Ok(Scalar::String(value.to_string())),
            },
        }
    }

    fn alias(&self, id: usize, mark: Marker) -> ResolveResult<Node> {
        self.anchors
            .get(&id)
            .cloned()
            .ok_or_else(|| self.error_at(mark, "alias refers to an unknown anchor"))
    }

    fn remember(&mut self, anchor: usize, node: Node) -> Node {
        if anchor > 0 {
            self.anchors.insert(anchor, node.clone());
        }
        node
    }

    fn next_event(&mut self) -> ResolveResult<(Event<'input>, Marker)> {
        match self.events.next() {
            Some(next) => Ok(next),
            None => Err(ResolveError::Decode {
                path: self.path.to_path_buf(),
                line: None,
                column: None,
                message: "unexpected end of YAML stream".to_string(),
            }),
        }
    }

    fn error_at(&self, mark: Marker, message: impl Into<String>) -> ResolveError {
        ResolveError::Decode {
            path: self.path.to_path_buf(),
            line: Some(mark.line()),
            column: Some(mark.col() + 1),
            message: message.into(),
        }
    }
}

/// The suffix of a tag in the YAML core namespace (`!!str`, `!<tag:yaml.org,2002:str>`).
fn core_tag<'t>(handle: &str, suffix: &'t str) -> Option<&'t str> {
    const CORE: &str = "tag:yaml.org,2002:";
    match handle {
        "!!" | CORE => Some(suffix),
        "" => suffix.strip_prefix(CORE),
        _ => None,
    }
}

fn scalar_text(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Null => "null".to_string(),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Number(n) => n.to_string(),
        Scalar::String(s) => s.clone(),
        Scalar::Timestamp(ts) => ts.as_str().to_string(),
    }
}

/// Types a plain scalar with the YAML 1.2 core schema plus timestamps.
fn resolve_plain(text: &str) -> Scalar {
    match text {
        "" | "~" | "null" | "Null" | "NULL" => Scalar::Null,
        "true" | "True" | "TRUE" => Scalar::Bool(true),
        "false" | "False" | "FALSE" => Scalar::Bool(false),
        _ => parse_int(text)
            .or_else(|| parse_float(text))
            .map(Scalar::Number)
            .or_else(|| Timestamp::parse(text).map(Scalar::Timestamp))
            .unwrap_or_else(|| Scalar::String(text.to_string())),
    }
}

fn parse_int(text: &str) -> Option<Number> {
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (radix, digits) = if let Some(hex) = unsigned.strip_prefix("0x") {
        (16, hex)
    } else if let Some(oct) = unsigned.strip_prefix("0o") {
        (8, oct)
    } else {
        (10, unsigned)
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    let magnitude = u64::from_str_radix(digits, radix).ok()?;
    if negative {
        i64::try_from(-i128::from(magnitude)).ok().map(Number::Int)
    } else {
        Some(
            i64::try_from(magnitude)
                .map(Number::Int)
                .unwrap_or(Number::UInt(magnitude)),
        )
    }
}

fn parse_float(text: &str) -> Option<Number> {
    match text {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => {
            return Some(Number::Float(f64::INFINITY))
        }
        "-.inf" | "-.Inf" | "-.INF" => return Some(Number::Float(f64::NEG_INFINITY)),
        ".nan" | ".NaN" | ".NAN" => return Some(Number::Float(f64::NAN)),
        _ => {}
    }

    let body = text.strip_prefix(['-', '+']).unwrap_or(text);
    let numeric = body.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && body.chars().any(|c| c.is_ascii_digit())
        && body
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !numeric {
        return None;
    }
    text.parse::<f64>().ok().map(Number::Float)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_yaml_plain_date_is_timestamp() {
        let node = decode_document("created: 2024-01-31\nname: x\n", Path::new("a.yaml")).unwrap();
        assert_eq!(
            node.get("created").and_then(Node::as_timestamp).map(|t| t.as_str()),
            Some("2024-01-31")
        );
        assert_eq!(node.get("name").and_then(Node::as_str), Some("x"));
    }

    #[test]
    fn test_json_date_stays_string() {
        let node = decode_document(r#"{"created": "2024-01-31"}"#, Path::new("a.json")).unwrap();
        assert_eq!(node.get("created").and_then(Node::as_str), Some("2024-01-31"));
    }

    #[test]
    fn test_integer_keys_become_strings() {
        let node = decode_document("responses:\n  200:\n    description: ok\n", Path::new("a.yml"))
            .unwrap();
        let responses = node.get("responses").and_then(Node::as_mapping).unwrap();
        assert!(responses.contains_key("200"));
    }

    #[test]
    fn test_merge_keys_are_applied() {
        let yaml = "base: &base\n  type: object\nderived:\n  <<: *base\n  title: D\n";
        let node = decode_document(yaml, Path::new("a.yaml")).unwrap();
        let derived = node.get("derived").unwrap();
        assert_eq!(derived.get("type").and_then(Node::as_str), Some("object"));
        assert_eq!(derived.get("title").and_then(Node::as_str), Some("D"));
    }

    #[test]
    fn test_yaml_error_has_location() {
        let err = decode_document("a: [1, 2\nb: 3\n", Path::new("broken.yaml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeError);
        match err {
            ResolveError::Decode { path, line, .. } => {
                assert_eq!(path, Path::new("broken.yaml"));
                assert!(line.is_some());
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_json_error_has_location() {
        let err = decode_document("{\n  \"a\": }", Path::new("broken.json")).unwrap_err();
        match err {
            ResolveError::Decode { line, column, .. } => {
                assert_eq!(line, Some(2));
                assert!(column.is_some());
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_key_order_preserved() {
        let node = decode_document("z: 1\na: 2\nm: 3\n", Path::new("a.yaml")).unwrap();
        let keys: Vec<&str> = node
            .as_mapping()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_quoted_and_tagged_dates_stay_strings() {
        let yaml = "a: ' 2024-01-31 '\nb: \"2024-01-31\"\nc: !!str 2024-01-31\nd: 2024-01-31\n";
        let node = decode_document(yaml, Path::new("a.yaml")).unwrap();
        assert_eq!(node.get("a").and_then(Node::as_str), Some(" 2024-01-31 "));
        assert_eq!(node.get("b").and_then(Node::as_str), Some("2024-01-31"));
        assert_eq!(node.get("c").and_then(Node::as_str), Some("2024-01-31"));
        assert!(node.get("d").and_then(Node::as_timestamp).is_some());
        assert_eq!(
            node.to_json(),
            serde_json::json!({
                "a": " 2024-01-31 ",
                "b": "2024-01-31",
                "c": "2024-01-31",
                "d": "2024-01-31"
            })
        );
    }

    #[test]
    fn test_quoted_scalars_are_not_typed() {
        let yaml = "n: 'null'\nb: \"true\"\ni: '42'\nplain_i: 42\nplain_f: 1.5\nplain_n: ~\nhex: 0x1F\n";
        let node = decode_document(yaml, Path::new("a.yaml")).unwrap();
        assert_eq!(node.get("n").and_then(Node::as_str), Some("null"));
        assert_eq!(node.get("b").and_then(Node::as_str), Some("true"));
        assert_eq!(node.get("i").and_then(Node::as_str), Some("42"));
        assert_eq!(node.get("plain_i"), Some(&Node::Scalar(Scalar::Number(Number::Int(42)))));
        assert_eq!(node.get("plain_f"), Some(&Node::Scalar(Scalar::Number(Number::Float(1.5)))));
        assert_eq!(node.get("plain_n"), Some(&Node::Scalar(Scalar::Null)));
        assert_eq!(node.get("hex"), Some(&Node::Scalar(Scalar::Number(Number::Int(31)))));
    }

    #[test]
    fn test_explicit_timestamp_tag() {
        let node = decode_document("t: !!timestamp 2024-01-31\n", Path::new("a.yaml")).unwrap();
        assert!(node.get("t").and_then(Node::as_timestamp).is_some());

        let err = decode_document("t: !!timestamp soon\n", Path::new("a.yaml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeError);
    }

    #[test]
    fn test_aliases_expand_to_copies() {
        let yaml = "base: &id\n  type: string\nother: *id\n";
        let node = decode_document(yaml, Path::new("a.yaml")).unwrap();
        assert_eq!(node.get("base"), node.get("other"));
    }

    #[test]
    fn test_explicit_keys_win_over_merged_keys() {
        let yaml = "a: &a\n  x: 1\n  y: 1\nb: &b\n  y: 2\n  z: 2\nc:\n  x: 0\n  <<: [*a, *b]\n";
        let node = decode_document(yaml, Path::new("a.yaml")).unwrap();
        let c = node.get("c").unwrap().to_json();
        assert_eq!(c, serde_json::json!({"x": 0, "y": 1, "z": 2}));
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let err = decode_document("a: 1\na: 2\n", Path::new("a.yaml")).unwrap_err();
        match err {
            ResolveError::Decode { line, message, .. } => {
                assert_eq!(line, Some(2));
                assert!(message.contains("duplicate"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_empty_document_is_null() {
        let node = decode_document("", Path::new("a.yaml")).unwrap();
        assert_eq!(node, Node::Scalar(Scalar::Null));
    }
}
