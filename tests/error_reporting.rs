// ==============================================================================
// Error Reporting Tests
// ==============================================================================
//
// These tests verify the *content* of the diagnostics produced for malformed
// QAPI input: decode errors must point into the normalized document, name the
// document, and explain the normalization; shape warnings must be warnings.
//
// Rendering goes through `miette`'s `GraphicalReportHandler` with Unicode and
// color disabled, so we test what the user actually sees.

mod common;

use common::render_diagnostic;
use miette::{Diagnostic, Severity};
use qapi2proto::Qapi2Proto;
use qapi2proto::reader::decode_records;

/// Translate an inline document and return the rendered error.
fn translate_error(source: &str, name: &str) -> String {
    let err = Qapi2Proto::new()
        .translate_str_named(source, name)
        .expect_err("input should fail to decode");
    render_diagnostic(&err)
}

#[test]
fn trailing_comma_points_into_document() {
    let rendered = translate_error("{ 'struct': 'Foo',\n  'data': { 'x': 'int', } }\n", "foo.json");
    assert!(rendered.contains("failed to decode schema document: trailing comma"), "{rendered}");
    assert!(rendered.contains("foo.json"), "{rendered}");
    // The snippet shows the normalized text: double quotes, joined lines.
    assert!(rendered.contains(r#"{ "struct": "Foo","data": { "x": "int", } }"#), "{rendered}");
    assert!(rendered.contains("the text shown is the normalized"), "{rendered}");
}

#[test]
fn unterminated_document() {
    let rendered = translate_error("{ 'struct': 'Foo', 'data': {\n", "eof.json");
    assert!(rendered.contains("EOF while parsing"), "{rendered}");
    assert!(rendered.contains("eof.json"), "{rendered}");
}

#[test]
fn non_object_expression() {
    let rendered = translate_error("{ 'struct': 'Foo' }\n'just a string'\n", "str.json");
    assert!(rendered.contains("expected a schema object, found a string"), "{rendered}");
    assert!(rendered.contains("not an object"), "{rendered}");
}

#[test]
fn remark_inside_value_breaks_decoding() {
    // The `#` cut does not know about strings.
    let err = decode_records("hash.json", &["{ 'struct': 'C#' }"]).expect_err("should fail");
    assert!(err.to_string().starts_with("failed to decode schema document"));
}

#[test]
fn decode_errors_carry_source_and_labels() {
    let err = decode_records("bad.json", &["{ 'a': }"]).expect_err("should fail");
    let diagnostic: &dyn Diagnostic = err.as_ref();
    assert!(diagnostic.source_code().is_some());
    let labels: Vec<_> = diagnostic.labels().expect("labels").collect();
    assert_eq!(labels.len(), 1);
    assert!(diagnostic.help().is_some());
}

#[test]
fn shape_warnings_have_warning_severity() {
    let output = Qapi2Proto::new()
        .translate_str_named("{ 'enum': 'E', 'data': { 'a': 1 } }", "e.json")
        .expect("translates");
    assert_eq!(output.warnings.len(), 1);
    let warning = &output.warnings[0];
    assert_eq!(warning.severity(), Some(Severity::Warning));
    assert_eq!(
        warning.to_string(),
        "e.json: enum `E`: `data` is an object rather than a list; emitting an empty enum"
    );
}
