// ==============================================================================
// QAPI Documentation Comments
// ==============================================================================
//
// QAPI documents each definition with a `#`-comment block fenced by `##`
// lines:
//
//   ##
//   # @BlockInfo:
//   #
//   # Block device information.
//   #
//   # @device: The device name.
//   ##
//
// The first `@label:` in a block names the definition it documents (the
// "root"); every later label documents one of its members. This module turns
// those blocks into a per-document `CommentIndex`.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

/// Line that opens and closes a documentation block.
pub const SENTINEL: &str = "##";

/// Key under which the root label's own description is stored.
pub const INFO_KEY: &str = "Info";

/// Blocks starting with this prefix are section banners, not documentation.
const BANNER_PREFIX: &str = "# =";

/// A label may appear anywhere in the line; the leftmost one wins. Label
/// characters are ASCII only.
static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@?([A-Za-z0-9_-]+?): ?(.*)").expect("label pattern is valid"));

/// The parsed form of a single documentation block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    /// The first label in the block, i.e. the documented definition. Empty if
    /// the block has no labels at all.
    pub root: String,
    /// Label → description lines, in the order the labels appear. The root's
    /// own description lives under [`INFO_KEY`].
    pub entries: IndexMap<String, Vec<String>>,
}

impl Annotation {
    fn close(&mut self, label: Option<String>, text: Vec<String>) {
        let Some(label) = label else {
            // Text before the first label has nothing to attach to.
            return;
        };
        if self.root.is_empty() {
            self.root = label;
            if !text.is_empty() {
                self.entries.insert(INFO_KEY.to_string(), text);
            }
        } else {
            self.entries.insert(label, text);
        }
    }
}

/// Strip `#` markers and surrounding whitespace from both ends of a line.
fn strip_comment_markers(line: &str) -> &str {
    line.trim_matches(|c: char| c == '#' || c.is_whitespace())
}

/// Parse the lines of one documentation block (without its `##` fences).
///
/// A line containing `@name: text` or `name: text` starts a new label, with
/// `text` as its first description line. Text before the label on that line
/// is dropped. Any other non-empty line continues the description of the
/// current label.
pub fn parse_comment_block<S: AsRef<str>>(lines: &[S]) -> Annotation {
    let mut annotation = Annotation::default();
    let mut current: Option<String> = None;
    let mut text: Vec<String> = Vec::new();

    let stripped = lines
        .iter()
        .map(|line| strip_comment_markers(line.as_ref()))
        .filter(|line| !line.is_empty());

    for line in stripped {
        if let Some(caps) = LABEL_RE.captures(line) {
            annotation.close(current.take(), std::mem::take(&mut text));
            current = Some(caps[1].to_string());
            let inline = &caps[2];
            if !inline.is_empty() {
                text.push(inline.to_string());
            }
        } else {
            text.push(line.to_string());
        }
    }
    annotation.close(current, text);

    annotation
}

/// Documentation for every definition in one document, keyed by definition
/// name and then by label.
#[derive(Debug, Clone, Default)]
pub struct CommentIndex {
    entries: IndexMap<String, IndexMap<String, Vec<String>>>,
}

impl CommentIndex {
    /// Build the index from a document's comment lines.
    ///
    /// Each line is expected to be trimmed and to start with `#`. Blocks with
    /// no content and section banners are skipped. If two blocks document the
    /// same name, the later one wins.
    pub fn build<S: AsRef<str>>(comment_lines: &[S]) -> Self {
        let mut index = CommentIndex::default();
        let mut open: Option<usize> = None;

        for (i, line) in comment_lines.iter().enumerate() {
            if line.as_ref().trim() != SENTINEL {
                continue;
            }
            let Some(start) = open.take() else {
                open = Some(i);
                continue;
            };

            let block = &comment_lines[start + 1..i];
            let Some(first) = block.first() else {
                continue;
            };
            if first.as_ref().trim_start().starts_with(BANNER_PREFIX) {
                continue;
            }

            let annotation = parse_comment_block(block);
            index.entries.insert(annotation.root, annotation.entries);
        }

        index
    }

    /// Description lines for `label` in the documentation of `name`.
    ///
    /// Returns an empty slice when either is undocumented.
    pub fn lines(&self, name: &str, label: &str) -> &[String] {
        self.entries
            .get(name)
            .and_then(|labels| labels.get(label))
            .map_or(&[], Vec::as_slice)
    }

    /// The description of `name` itself.
    pub fn info(&self, name: &str) -> &[String] {
        self.lines(name, INFO_KEY)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    // =========================================================================
    // parse_comment_block
    // =========================================================================

    #[test]
    fn root_and_member_labels() {
        let annotation = parse_comment_block(&["# @Foo: bar", "# baz: qux"]);
        assert_eq!(annotation.root, "Foo");
        assert_eq!(annotation.entries[INFO_KEY], strings(&["bar"]));
        assert_eq!(annotation.entries["baz"], strings(&["qux"]));
        assert!(!annotation.entries.contains_key("Foo"));
    }

    #[test]
    fn no_labels_yields_empty_annotation() {
        let annotation = parse_comment_block(&["# just some prose", "# and more"]);
        assert_eq!(annotation, Annotation::default());
    }

    #[test]
    fn empty_block() {
        let annotation = parse_comment_block::<&str>(&[]);
        assert!(annotation.root.is_empty());
        assert!(annotation.entries.is_empty());
    }

    #[test]
    fn continuation_lines_join_current_label() {
        let annotation = parse_comment_block(&[
            "# @BlockInfo:",
            "#",
            "# Block device information.",
            "# Spans two lines.",
            "#",
            "# @device: The device name",
            "#     used by the monitor.",
            "# @locked: true if locked",
        ]);
        assert_eq!(annotation.root, "BlockInfo");
        assert_eq!(
            annotation.entries[INFO_KEY],
            strings(&["Block device information.", "Spans two lines."])
        );
        assert_eq!(
            annotation.entries["device"],
            strings(&["The device name", "used by the monitor."])
        );
        assert_eq!(annotation.entries["locked"], strings(&["true if locked"]));
    }

    #[test]
    fn root_without_description_has_no_info() {
        let annotation = parse_comment_block(&["# @Foo:", "# @bar: a field"]);
        assert_eq!(annotation.root, "Foo");
        assert!(!annotation.entries.contains_key(INFO_KEY));
        assert_eq!(annotation.entries["bar"], strings(&["a field"]));
    }

    #[test]
    fn member_label_without_text_is_kept_empty() {
        let annotation = parse_comment_block(&["# @Foo: x", "# @bar:"]);
        assert_eq!(annotation.entries["bar"], Vec::<String>::new());
    }

    #[test]
    fn text_before_first_label_is_dropped() {
        let annotation = parse_comment_block(&["# preamble", "# @Foo: x"]);
        assert_eq!(annotation.root, "Foo");
        assert_eq!(annotation.entries.len(), 1);
        assert_eq!(annotation.entries[INFO_KEY], strings(&["x"]));
    }

    #[test]
    fn hyphenated_and_plain_labels() {
        let annotation = parse_comment_block(&[
            "# @query-block:",
            "# Get the list of block devices.",
            "# Since: 0.14",
            "# @x-perf-flag: experimental",
        ]);
        assert_eq!(annotation.root, "query-block");
        assert_eq!(annotation.entries["Since"], strings(&["0.14"]));
        assert_eq!(annotation.entries["x-perf-flag"], strings(&["experimental"]));
    }

    #[test]
    fn label_in_the_middle_of_a_line() {
        let annotation = parse_comment_block(&[
            "# @Foo: x",
            "# - @cpu-index: the cpu",
            "# .. note:: careful",
            "# The format is: key=value",
        ]);
        assert_eq!(annotation.root, "Foo");
        assert_eq!(annotation.entries[INFO_KEY], strings(&["x"]));
        assert_eq!(annotation.entries["cpu-index"], strings(&["the cpu"]));
        assert_eq!(annotation.entries["note"], strings(&[": careful"]));
        assert_eq!(annotation.entries["is"], strings(&["key=value"]));
    }

    #[test]
    fn leftmost_label_wins() {
        let annotation = parse_comment_block(&["# @Foo: x", "# see http://example.com: a site"]);
        assert_eq!(annotation.entries["http"], strings(&["//example.com: a site"]));
    }

    #[test]
    fn labels_are_ascii_words() {
        let annotation = parse_comment_block(&["# @Foo: x", "# café: au lait"]);
        assert_eq!(annotation.entries.len(), 1);
        assert_eq!(annotation.entries[INFO_KEY], strings(&["x", "café: au lait"]));
    }

    #[test]
    fn label_order_is_preserved() {
        let annotation = parse_comment_block(&[
            "# @Foo: x",
            "# @zeta: z",
            "# @alpha: a",
            "# @mid: m",
        ]);
        insta::assert_debug_snapshot!(annotation.entries, @r#"
        {
            "Info": [
                "x",
            ],
            "zeta": [
                "z",
            ],
            "alpha": [
                "a",
            ],
            "mid": [
                "m",
            ],
        }
        "#);
    }

    // =========================================================================
    // CommentIndex
    // =========================================================================

    #[test]
    fn index_keys_blocks_by_root() {
        let index = CommentIndex::build(&[
            "##",
            "# @Foo: a struct",
            "# @bar: a field",
            "##",
            "##",
            "# @Color: an enum",
            "# @RED: warm",
            "##",
        ]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.info("Foo"), strings(&["a struct"]).as_slice());
        assert_eq!(index.lines("Foo", "bar"), strings(&["a field"]).as_slice());
        assert_eq!(index.lines("Color", "RED"), strings(&["warm"]).as_slice());
    }

    #[test]
    fn banner_blocks_are_skipped() {
        let index = CommentIndex::build(&[
            "##",
            "# = Block devices",
            "# @NotADefinition: banner text",
            "##",
            "##",
            "# @Foo: real",
            "##",
        ]);
        assert!(!index.entries.contains_key("NotADefinition"));
        assert!(index.entries.contains_key("Foo"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn adjacent_sentinels_are_ignored() {
        let index = CommentIndex::build(&["##", "##", "##", "# @Foo: x", "##"]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.info("Foo"), strings(&["x"]).as_slice());
    }

    #[test]
    fn comments_outside_blocks_are_ignored() {
        let index = CommentIndex::build(&["# @Stray: outside", "##", "# @Foo: x", "##"]);
        assert!(!index.entries.contains_key("Stray"));
        assert!(index.entries.contains_key("Foo"));
    }

    #[test]
    fn unterminated_block_is_ignored() {
        let index = CommentIndex::build(&["##", "# @Foo: x"]);
        assert!(index.is_empty());
    }

    #[test]
    fn later_duplicate_wins() {
        let index = CommentIndex::build(&[
            "##", "# @Foo: first", "##", "##", "# @Foo: second", "##",
        ]);
        assert_eq!(index.info("Foo"), strings(&["second"]).as_slice());
    }

    #[test]
    fn missing_entries_are_empty() {
        let index = CommentIndex::build::<&str>(&[]);
        assert!(index.info("Nope").is_empty());
        assert!(index.lines("Nope", "field").is_empty());
    }
}
