// ==============================================================================
// QAPI Reader: Relaxed JSON Decoding and Record Classification
// ==============================================================================
//
// QAPI schema files look like JSON but are not: strings use single quotes, a
// file is a sequence of top-level objects with nothing between them, and `#`
// starts a comment. This module splits a document into its comment lines and
// its content lines, rewrites the content into something `serde_json` accepts,
// stream-decodes the concatenated objects, and classifies each one into a
// typed `SchemaRecord`.
//
// Decoding is strict: a malformed object aborts with a diagnostic. Shape
// problems inside well-formed objects (a `data` that is not an object, an
// unsupported member type) are tolerated and reported as warnings.

use indexmap::IndexMap;
use miette::NamedSource;
use serde_json::{Map, Value};

use crate::doc_comments::CommentIndex;
use crate::error::{DecodeDiagnostic, SchemaWarning};
use crate::model::schema::{
    EnumDecl, EnumMember, Field, SchemaRecord, StructDecl, TypeDescriptor, ValueDescriptor,
};

/// Keys that identify the kinds of definition we translate, in the order
/// they are checked. Anything else (unions, aliases, includes, pragmas) is
/// skipped.
const RECORD_KINDS: [&str; 4] = ["struct", "enum", "event", "command"];

/// A schema document after decoding, ready for translation.
#[derive(Debug)]
pub struct ParsedDocument {
    pub name: String,
    pub comments: CommentIndex,
    pub records: Vec<SchemaRecord>,
    /// Non-fatal problems found while classifying records.
    pub warnings: Vec<SchemaWarning>,
}

/// Parse one QAPI document.
///
/// `name` is used in diagnostics and warnings.
pub fn parse_document(name: &str, source: &str) -> miette::Result<ParsedDocument> {
    let (comment_lines, content_lines) = split_lines(source);
    let comments = CommentIndex::build(&comment_lines);
    let objects = decode_records(name, &content_lines)?;

    let mut messages = Vec::new();
    let records = objects
        .iter()
        .filter_map(|object| classify_record(object, &mut messages))
        .collect();
    let warnings = messages
        .into_iter()
        .map(|message| SchemaWarning::new(name, message))
        .collect();

    Ok(ParsedDocument {
        name: name.to_string(),
        comments,
        records,
        warnings,
    })
}

/// Split a document into trimmed comment lines and trimmed content lines,
/// dropping blank lines.
pub fn split_lines(source: &str) -> (Vec<&str>, Vec<&str>) {
    let mut comments = Vec::new();
    let mut content = Vec::new();
    for line in source.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with('#') {
            comments.push(line);
        } else {
            content.push(line);
        }
    }
    (comments, content)
}

/// Rewrite one content line into strict JSON: single quotes become double
/// quotes and everything from the last `#` onwards is dropped.
pub fn normalize_line(line: &str) -> String {
    let mut fixed = line.replace('\'', "\"");
    if let Some(idx) = fixed.rfind('#') {
        fixed.truncate(idx);
    }
    fixed
}

/// Normalize every content line and join them with no separator.
pub fn normalize_content<S: AsRef<str>>(lines: &[S]) -> String {
    lines
        .iter()
        .map(|line| normalize_line(line.as_ref()))
        .collect()
}

/// Decode a document's content lines as a sequence of back-to-back JSON
/// objects, in document order.
pub fn decode_records<S: AsRef<str>>(
    source_name: &str,
    content_lines: &[S],
) -> miette::Result<Vec<Map<String, Value>>> {
    let normalized = normalize_content(content_lines);
    let mut records = Vec::new();

    let mut stream = serde_json::Deserializer::from_str(&normalized).into_iter::<Value>();
    loop {
        let start = stream.byte_offset();
        let Some(next) = stream.next() else {
            break;
        };
        match next {
            Ok(Value::Object(object)) => records.push(object),
            Ok(other) => {
                let end = stream.byte_offset();
                return Err(DecodeDiagnostic {
                    src: NamedSource::new(source_name, normalized.clone()),
                    span: (start, end - start).into(),
                    message: format!("expected a schema object, found {}", describe(&other)),
                    label: Some("not an object".to_string()),
                    help: Some("every top-level QAPI expression must be an object".to_string()),
                }
                .into());
            }
            Err(e) => return Err(decode_error(source_name, &normalized, &e)),
        }
    }

    Ok(records)
}

fn decode_error(source_name: &str, normalized: &str, err: &serde_json::Error) -> miette::Report {
    // Content lines are joined without newlines, so the column is the offset
    // into the normalized text.
    let offset = err.column().saturating_sub(1).min(normalized.len());
    let len = usize::from(offset < normalized.len());
    let detail = err.to_string();
    let detail = detail.split(" at line ").next().unwrap_or(&detail).to_string();

    DecodeDiagnostic {
        src: NamedSource::new(source_name, normalized.to_string()),
        span: (offset, len).into(),
        message: format!("failed to decode schema document: {detail}"),
        label: Some(detail),
        help: Some(
            "the text shown is the normalized document: single quotes are rewritten to \
             double quotes and inline `#` remarks are removed"
                .to_string(),
        ),
    }
    .into()
}

/// Classify a decoded object by the definition keyword it carries.
///
/// Returns `None` for objects that are not a struct, enum, event, or command,
/// and for definitions whose name is not a string (with a warning).
pub fn classify_record(
    object: &Map<String, Value>,
    warnings: &mut Vec<String>,
) -> Option<SchemaRecord> {
    let (kind, name) = RECORD_KINDS
        .iter()
        .find_map(|kind| object.get(*kind).map(|name| (*kind, name)))?;

    let Some(name) = name.as_str() else {
        warnings.push(format!(
            "skipping {kind} whose name is {} rather than a string",
            describe(name)
        ));
        return None;
    };
    let name = name.to_string();
    let data = object.get("data");

    match kind {
        "struct" => Some(SchemaRecord::Struct(struct_decl(name, data, warnings))),
        "enum" => Some(SchemaRecord::Enum(enum_decl(name, data, warnings))),
        "event" => Some(SchemaRecord::Event(name)),
        "command" => Some(SchemaRecord::Command(name)),
        _ => None,
    }
}

fn struct_decl(name: String, data: Option<&Value>, warnings: &mut Vec<String>) -> StructDecl {
    let mut fields = IndexMap::new();

    match data {
        None => {}
        Some(Value::Object(members)) => {
            for (key, value) in members {
                let (member, optional) = match key.strip_prefix('*') {
                    Some(stripped) => (stripped, true),
                    None => (key.as_str(), false),
                };
                match type_descriptor(value) {
                    Some(ty) => {
                        fields.insert(member.to_string(), Field { optional, ty });
                    }
                    None => warnings.push(format!(
                        "struct `{name}`: skipping member `{key}` whose type is {} \
                         rather than a name, an object with a `type`, or a one-element list",
                        describe(value)
                    )),
                }
            }
        }
        Some(other) => warnings.push(format!(
            "struct `{name}`: `data` is {} rather than an object; emitting an empty message",
            describe(other)
        )),
    }

    StructDecl { name, fields }
}

fn enum_decl(name: String, data: Option<&Value>, warnings: &mut Vec<String>) -> EnumDecl {
    let mut members = Vec::new();

    match data {
        None => {}
        Some(Value::Array(values)) => {
            for (tag, value) in values.iter().enumerate() {
                match value_descriptor(value) {
                    Some(value) => members.push(EnumMember { tag, value }),
                    None => warnings.push(format!(
                        "enum `{name}`: skipping value {tag}, which is {} \
                         rather than a name or an object with a `name`",
                        describe(value)
                    )),
                }
            }
        }
        Some(other) => warnings.push(format!(
            "enum `{name}`: `data` is {} rather than a list; emitting an empty enum",
            describe(other)
        )),
    }

    EnumDecl { name, members }
}

/// Resolve the type of a struct member.
fn type_descriptor(value: &Value) -> Option<TypeDescriptor> {
    match value {
        Value::String(name) => Some(TypeDescriptor::Name(name.clone())),
        Value::Array(items) => single_element(items).map(TypeDescriptor::Repeated),
        Value::Object(object) => match object.get("type")? {
            Value::String(name) => Some(TypeDescriptor::Qualified {
                name: name.clone(),
                qualifiers: without_key(object, "type"),
            }),
            // `{ 'type': [ 'Foo' ], 'if': ... }`
            Value::Array(items) => single_element(items).map(TypeDescriptor::Repeated),
            _ => None,
        },
        _ => None,
    }
}

fn value_descriptor(value: &Value) -> Option<ValueDescriptor> {
    match value {
        Value::String(name) => Some(ValueDescriptor::Name(name.clone())),
        Value::Object(object) => match object.get("name")? {
            Value::String(name) => Some(ValueDescriptor::Qualified {
                name: name.clone(),
                qualifiers: without_key(object, "name"),
            }),
            _ => None,
        },
        _ => None,
    }
}

fn single_element(items: &[Value]) -> Option<String> {
    match items {
        [Value::String(name)] => Some(name.clone()),
        _ => None,
    }
}

fn without_key(object: &Map<String, Value>, key: &str) -> Map<String, Value> {
    object
        .iter()
        .filter(|(k, _)| k.as_str() != key)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
