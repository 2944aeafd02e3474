// ==============================================================================
// Library API: The `Qapi2Proto` Builder
// ==============================================================================
//
// The builder owns the output settings (package, service name, file
// extensions, ...) and drives a whole run:
//
//   1. enumerate `<qemu-dir>/<schema-dir>/*.json` in file-name order,
//   2. parse and translate each document, threading one `NameRegistry`
//      through all of them,
//   3. render the per-document files plus `descriptor`, `service`, and
//      `events`, all in memory,
//   4. optionally write everything to an output directory.
//
// Rendering completes before anything is written, so a document that fails
// to decode leaves the output directory untouched.
//
// Configuration and terminal methods take `&mut self` so the same builder can
// be reused. All per-run state is created fresh on each call.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use miette::Context;
use tracing::{debug, info};

use crate::error::SchemaWarning;
use crate::reader::parse_document;
use crate::registry::NameRegistry;
use crate::translate::{render_event_enum, render_service, translate_document};

pub const DEFAULT_SCHEMA_DIR: &str = "qapi";
pub const DEFAULT_SCHEMA_EXTENSION: &str = "json";
pub const DEFAULT_IDL_EXTENSION: &str = "proto";
pub const DEFAULT_PACKAGE: &str = "qmp.v1alpha";
pub const DEFAULT_GO_PACKAGE: &str = "kraftkit.sh/machine/qemu/qmp/v1alpha;qmpv1alpha";
pub const DEFAULT_DESCRIPTOR_IMPORT: &str = "machine/qemu/qmp/v1alpha/descriptor.proto";
pub const DEFAULT_SERVICE: &str = "QEMUMachineProtocol";
pub const DEFAULT_EVENT_ENUM: &str = "EventType";
pub const DEFAULT_EVENT_PREFIX: &str = "EVENT_";

/// Stem of the file holding the custom option extensions.
const DESCRIPTOR_STEM: &str = "descriptor";
/// Stem of the file holding the RPC service.
const SERVICE_STEM: &str = "service";
/// Stem of the file holding the event enum.
const EVENTS_STEM: &str = "events";

/// One input document: its file name and full text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDocument {
    /// File name, e.g. `block-core.json`. The part before the first `.`
    /// names the generated file.
    pub name: String,
    pub source: String,
}

impl SchemaDocument {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        SchemaDocument {
            name: name.into(),
            source: source.into(),
        }
    }

    /// The file name up to its first `.`.
    pub fn base_name(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }
}

/// A generated protobuf file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtoFile {
    /// File name relative to the output directory.
    pub name: String,
    pub contents: String,
}

/// Result of translating a set of QAPI documents.
pub struct ProtoOutput {
    /// Per-document files in traversal order, followed by the descriptor,
    /// service, and events files.
    pub files: Vec<ProtoFile>,
    /// Non-fatal warnings (skipped members, duplicate declarations, ...).
    ///
    /// Each warning is a [`miette::Report`] with `Severity::Warning` set.
    pub warnings: Vec<miette::Report>,
}

/// Shows the generated file names and warning count without dumping every
/// file body.
impl std::fmt::Debug for ProtoOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.files.iter().map(|f| f.name.as_str()).collect();
        f.debug_struct("ProtoOutput")
            .field("files", &names)
            .field(
                "warnings",
                &format_args!("[{} warnings]", self.warnings.len()),
            )
            .finish()
    }
}

impl ProtoOutput {
    /// Look up a generated file by name.
    pub fn file(&self, name: &str) -> Option<&ProtoFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Write every file into `out_dir`, creating it if needed.
    pub fn write_to(&self, out_dir: impl AsRef<Path>) -> miette::Result<()> {
        let out_dir = out_dir.as_ref();
        create_output_dir(out_dir)?;

        for file in &self.files {
            let path = out_dir.join(&file.name);
            fs::write(&path, &file.contents)
                .map_err(|e| miette::miette!("{e}"))
                .with_context(|| format!("write {}", path.display()))?;
            info!(path = %path.display(), "wrote protobuf file");
        }

        Ok(())
    }
}

fn create_output_dir(out_dir: &Path) -> miette::Result<()> {
    fs::create_dir_all(out_dir)
        .map_err(|e| miette::miette!("{e}"))
        .with_context(|| format!("create output directory {}", out_dir.display()))
}

/// Builder for translating QAPI schema documents into protobuf files.
///
/// # Examples
///
/// ```no_run
/// use qapi2proto::Qapi2Proto;
///
/// // Translate `qemu/qapi/*.json` and write the results to `out/`.
/// let output = Qapi2Proto::new()
///     .service("QemuMonitor")
///     .generate("qemu/", "out/")?;
/// for warning in &output.warnings {
///     eprintln!("{warning:?}");
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Qapi2Proto {
    schema_dir: String,
    schema_extension: String,
    idl_extension: String,
    package: String,
    go_package: String,
    descriptor_import: String,
    service: String,
    event_enum: String,
    event_prefix: String,
    /// Warnings from the most recent call, kept so they survive an `Err`.
    accumulated_warnings: Vec<miette::Report>,
}

impl Default for Qapi2Proto {
    fn default() -> Self {
        Self::new()
    }
}

impl Qapi2Proto {
    /// Create a builder with the QEMU machine protocol defaults.
    pub fn new() -> Self {
        Qapi2Proto {
            schema_dir: DEFAULT_SCHEMA_DIR.to_string(),
            schema_extension: DEFAULT_SCHEMA_EXTENSION.to_string(),
            idl_extension: DEFAULT_IDL_EXTENSION.to_string(),
            package: DEFAULT_PACKAGE.to_string(),
            go_package: DEFAULT_GO_PACKAGE.to_string(),
            descriptor_import: DEFAULT_DESCRIPTOR_IMPORT.to_string(),
            service: DEFAULT_SERVICE.to_string(),
            event_enum: DEFAULT_EVENT_ENUM.to_string(),
            event_prefix: DEFAULT_EVENT_PREFIX.to_string(),
            accumulated_warnings: Vec::new(),
        }
    }

    /// Subdirectory of the QEMU source tree that holds the schema documents.
    pub fn schema_dir(&mut self, dir: impl Into<String>) -> &mut Self {
        self.schema_dir = dir.into();
        self
    }

    /// Extension (without the dot) of the files to translate.
    pub fn schema_extension(&mut self, ext: impl Into<String>) -> &mut Self {
        self.schema_extension = ext.into();
        self
    }

    /// Extension (without the dot) of the generated files.
    pub fn idl_extension(&mut self, ext: impl Into<String>) -> &mut Self {
        self.idl_extension = ext.into();
        self
    }

    /// Protobuf package of every generated file.
    pub fn package(&mut self, package: impl Into<String>) -> &mut Self {
        self.package = package.into();
        self
    }

    /// Value of the `go_package` option of every generated file.
    pub fn go_package(&mut self, go_package: impl Into<String>) -> &mut Self {
        self.go_package = go_package.into();
        self
    }

    /// Path the generated files use to import the descriptor file.
    pub fn descriptor_import(&mut self, path: impl Into<String>) -> &mut Self {
        self.descriptor_import = path.into();
        self
    }

    /// Name of the generated RPC service.
    pub fn service(&mut self, name: impl Into<String>) -> &mut Self {
        self.service = name.into();
        self
    }

    /// Name of the generated event enum.
    pub fn event_enum(&mut self, name: impl Into<String>) -> &mut Self {
        self.event_enum = name.into();
        self
    }

    /// Prefix of every event enum symbol.
    pub fn event_prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.event_prefix = prefix.into();
        self
    }

    /// Drain warnings accumulated during the most recent call.
    ///
    /// On success the same warnings are in [`ProtoOutput::warnings`]; on
    /// failure this is the only way to get at the ones collected before the
    /// error.
    pub fn drain_warnings(&mut self) -> Vec<miette::Report> {
        std::mem::take(&mut self.accumulated_warnings)
    }

    /// Translate `<qemu_dir>/<schema-dir>` and write the result to `out_dir`,
    /// creating it if missing.
    pub fn generate(
        &mut self,
        qemu_dir: impl AsRef<Path>,
        out_dir: impl AsRef<Path>,
    ) -> miette::Result<ProtoOutput> {
        self.accumulated_warnings.clear();
        let documents = self.read_documents(qemu_dir.as_ref())?;
        create_output_dir(out_dir.as_ref())?;

        let output = self.translate_documents(&documents)?;
        output.write_to(out_dir)?;
        Ok(output)
    }

    /// Translate `<qemu_dir>/<schema-dir>` without writing anything.
    pub fn translate(&mut self, qemu_dir: impl AsRef<Path>) -> miette::Result<ProtoOutput> {
        self.accumulated_warnings.clear();
        let documents = self.read_documents(qemu_dir.as_ref())?;
        self.translate_documents(&documents)
    }

    /// Translate a single document held in memory. `name` is its file name.
    pub fn translate_str_named(&mut self, source: &str, name: &str) -> miette::Result<ProtoOutput> {
        self.translate_documents(&[SchemaDocument::new(name, source)])
    }

    /// Translate documents in the given order.
    ///
    /// Commands appear in the service in this order; events are sorted
    /// regardless.
    pub fn translate_documents(
        &mut self,
        documents: &[SchemaDocument],
    ) -> miette::Result<ProtoOutput> {
        self.accumulated_warnings.clear();
        let header = self.header();

        let mut registry = NameRegistry::new();
        let mut declared: HashMap<String, String> = HashMap::new();
        let mut files = Vec::with_capacity(documents.len() + 3);
        let mut warnings = Vec::new();

        for document in documents {
            let parsed = match parse_document(&document.name, &document.source) {
                Ok(parsed) => parsed,
                Err(e) => {
                    self.accumulated_warnings = warnings;
                    return Err(e);
                }
            };
            debug!(
                document = %document.name,
                records = parsed.records.len(),
                documented = parsed.comments.len(),
                "parsed schema document"
            );

            let output = translate_document(&parsed, &mut registry);
            warnings.extend(parsed.warnings.into_iter().map(miette::Report::new));

            for name in &output.declarations {
                if let Some(previous) = declared.insert(name.clone(), document.name.clone()) {
                    warnings.push(miette::Report::new(SchemaWarning::new(
                        &document.name,
                        format!("`{name}` is also declared in {previous}"),
                    )));
                }
            }

            files.push(ProtoFile {
                name: self.file_name(document.base_name()),
                contents: format!("{header}{}", output.text),
            });
        }

        debug!(
            commands = registry.commands().len(),
            events = registry.events().len(),
            "rendering aggregate files"
        );
        files.push(ProtoFile {
            name: self.file_name(DESCRIPTOR_STEM),
            contents: self.descriptor(),
        });
        files.push(ProtoFile {
            name: self.file_name(SERVICE_STEM),
            contents: format!(
                "{header}{}",
                render_service(&self.service, registry.commands())
            ),
        });
        files.push(ProtoFile {
            name: self.file_name(EVENTS_STEM),
            contents: format!(
                "{header}{}",
                render_event_enum(&self.event_enum, &self.event_prefix, &registry)
            ),
        });

        Ok(ProtoOutput { files, warnings })
    }

    /// Read every regular `*.<schema-extension>` file directly inside
    /// `<qemu_dir>/<schema-dir>`, sorted by file name.
    fn read_documents(&self, qemu_dir: &Path) -> miette::Result<Vec<SchemaDocument>> {
        let schema_dir: PathBuf = qemu_dir.join(&self.schema_dir);
        let metadata = fs::metadata(&schema_dir)
            .map_err(|e| miette::miette!("{e}"))
            .with_context(|| format!("read schema directory {}", schema_dir.display()))?;
        if !metadata.is_dir() {
            return Err(miette::miette!(
                "read schema directory {}: not a directory",
                schema_dir.display()
            ));
        }

        let suffix = format!(".{}", self.schema_extension);
        let mut documents = Vec::new();
        for entry in walkdir::WalkDir::new(&schema_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry
                .map_err(|e| miette::miette!("{e}"))
                .with_context(|| format!("read schema directory {}", schema_dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if !name.ends_with(&suffix) {
                continue;
            }

            let source = fs::read_to_string(entry.path())
                .map_err(|e| miette::miette!("{e}"))
                .with_context(|| format!("read {}", entry.path().display()))?;
            documents.push(SchemaDocument::new(name, source));
        }

        debug!(
            dir = %schema_dir.display(),
            documents = documents.len(),
            "collected schema documents"
        );
        Ok(documents)
    }

    fn file_name(&self, stem: &str) -> String {
        format!("{stem}.{}", self.idl_extension)
    }

    /// Preamble of every generated file except the descriptor.
    fn header(&self) -> String {
        format!(
            "syntax = \"proto3\";\n\
             \n\
             package {};\n\
             \n\
             import \"{}\";\n\
             \n\
             option go_package = \"{}\";\n\
             \n",
            self.package, self.descriptor_import, self.go_package
        )
    }

    /// The file declaring the `execute`, `json_name`, and `map_message`
    /// options used by generated code.
    fn descriptor(&self) -> String {
        format!(
            "syntax = \"proto3\";\n\
             \n\
             package {};\n\
             \n\
             import \"google/protobuf/any.proto\";\n\
             import \"google/protobuf/descriptor.proto\";\n\
             \n\
             option go_package = \"{}\";\n\
             \n\
             extend google.protobuf.MessageOptions {{\n\
             \tstring execute = 51000;\n\
             }}\n\
             \n\
             extend google.protobuf.EnumValueOptions {{\n\
             \tstring json_name   = 51001;\n\
             \tstring map_message = 51002;\n\
             }}\n",
            self.package, self.go_package
        )
    }
}
