use miette::{LabeledSpan, NamedSource, Severity, SourceSpan};

/// A decode error with source location information for rich diagnostics.
///
/// The source is the *normalized* document text (quotes rewritten, inline
/// remarks removed, lines joined), since that is what the JSON decoder sees.
#[derive(Debug)]
pub struct DecodeDiagnostic {
    pub src: NamedSource<String>,
    pub span: SourceSpan,
    pub message: String,
    pub label: Option<String>,
    pub help: Option<String>,
}

impl std::fmt::Display for DecodeDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DecodeDiagnostic {}

impl miette::Diagnostic for DecodeDiagnostic {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let label = self.label.clone().unwrap_or_else(|| self.message.clone());
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some(label),
            self.span,
        ))))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }
}

/// A non-fatal problem in a schema document that decoded fine but has a shape
/// the translator had to work around.
#[derive(Debug)]
pub struct SchemaWarning {
    /// Name of the document the problem was found in.
    pub document: String,
    pub message: String,
}

impl SchemaWarning {
    pub fn new(document: impl Into<String>, message: impl Into<String>) -> Self {
        SchemaWarning {
            document: document.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.document, self.message)
    }
}

impl std::error::Error for SchemaWarning {}

impl miette::Diagnostic for SchemaWarning {
    fn severity(&self) -> Option<Severity> {
        Some(Severity::Warning)
    }
}
