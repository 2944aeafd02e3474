// ==============================================================================
// Schema Translator: QAPI Records to Protobuf Text
// ==============================================================================
//
// Structs become messages and enums become enums, each preceded by the
// documentation recovered from the document's comment blocks. Commands and
// events produce no text here; their names go into the `NameRegistry` and are
// rendered once all documents have been seen (`render_service`,
// `render_event_enum`).
//
// Field numbers are not assigned: members are emitted as `type name;`, in
// declaration order.

use crate::doc_comments::CommentIndex;
use crate::model::schema::{EnumDecl, SchemaRecord, StructDecl};
use crate::reader::ParsedDocument;
use crate::registry::NameRegistry;

/// The protobuf text produced for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentOutput {
    /// Messages and enums, in declaration order. Does not include the file
    /// header.
    pub text: String,
    /// Names of the messages and enums in `text`.
    pub declarations: Vec<String>,
}

/// Translate every record of a document, registering commands and events.
pub fn translate_document(doc: &ParsedDocument, registry: &mut NameRegistry) -> DocumentOutput {
    let mut output = DocumentOutput::default();

    for record in &doc.records {
        tracing::trace!(kind = record.kind(), name = record.name(), "translating record");
        match record {
            SchemaRecord::Struct(decl) => {
                output.text.push_str(&render_message(decl, &doc.comments));
                output.declarations.push(decl.name.clone());
            }
            SchemaRecord::Enum(decl) => {
                output.text.push_str(&render_enum(decl, &doc.comments));
                output.declarations.push(decl.name.clone());
            }
            SchemaRecord::Event(name) => registry.add_event(name.as_str()),
            SchemaRecord::Command(name) => registry.add_command(name.as_str()),
        }
    }

    output
}

fn push_comments(out: &mut String, indent: &str, lines: &[String]) {
    for line in lines {
        out.push_str(&format!("{indent}// {line}\n"));
    }
}

/// Render a struct as a protobuf message.
pub fn render_message(decl: &StructDecl, comments: &CommentIndex) -> String {
    let mut out = String::new();
    push_comments(&mut out, "", comments.info(&decl.name));

    out.push_str(&format!("message {} {{\n", decl.name));
    for (member, field) in &decl.fields {
        push_comments(&mut out, "\t", comments.lines(&decl.name, member));
        let label = if field.ty.is_repeated() {
            "repeated "
        } else if field.optional {
            "optional "
        } else {
            ""
        };
        out.push_str(&format!("\t{label}{} {member};\n", field.ty.type_name()));
    }
    out.push_str("}\n\n");

    out
}

/// Render an enum, numbering each value by its position in the QAPI list.
pub fn render_enum(decl: &EnumDecl, comments: &CommentIndex) -> String {
    let mut out = String::new();
    push_comments(&mut out, "", comments.info(&decl.name));

    out.push_str(&format!("enum {} {{\n", decl.name));
    for member in &decl.members {
        let value = member.value.name();
        push_comments(&mut out, "\t", comments.lines(&decl.name, value));
        out.push_str(&format!("\t{value} = {};\n", member.tag));
    }
    out.push_str("}\n\n");

    out
}

/// Render the RPC service with one method per command, in registration
/// order. Each method takes `<Name>Request` and returns `<Name>Response`.
pub fn render_service(service: &str, commands: &[String]) -> String {
    let mut out = format!("service {service} {{\n");
    for command in commands {
        out.push_str(&format!(
            "\trpc {command}({command}Request) returns ({command}Response) {{}}\n"
        ));
    }
    out.push_str("}\n");
    out
}

/// Render the event enum. Events are numbered in sorted order; each symbol is
/// the upper-cased event name behind `prefix`, and carries the original name
/// in a `json_name` option.
pub fn render_event_enum(enum_name: &str, prefix: &str, registry: &NameRegistry) -> String {
    let mut out = format!("enum {enum_name} {{\n");
    for (tag, event) in registry.sorted_events().into_iter().enumerate() {
        out.push_str(&format!(
            "\t{prefix}{} = {tag} [ (json_name) = \"{event}\" ];\n",
            event.to_uppercase()
        ));
    }
    out.push_str("}\n");
    out
}
