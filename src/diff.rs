//! Unified diff handling for the commit detail panel.
//!
//! Whole-commit diffs are split per file on their `diff --git` headers; single
//! file diffs are rendered line by line as escaped HTML.

use std::collections::HashMap;

use serde::Serialize;

/// Shown when a commit's diff has no section for the requested file.
pub const NO_CHANGES: &str = "No changes found for this file";

/// Shown when the diff could not be fetched.
pub const DIFF_UNAVAILABLE: &str = "Failed to load diff.";

/// Diff the host should fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffRequest {
    pub id: u64,
    pub generation: u64,
    pub owner: String,
    pub repo: String,
    pub commit: String,
    pub file: String,
}

/// Split a whole-commit diff into sections keyed by each file's `b/` path.
///
/// Each section keeps its own `diff --git` header line. Anything before the
/// first header is ignored.
pub fn split_files(diff: &str) -> HashMap<String, String> {
    let mut files = HashMap::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in diff.split('\n') {
        if line.starts_with("diff --git") {
            if let Some((path, lines)) = current.take() {
                files.insert(path, lines.join("\n"));
            }
            let path = line.rsplit(" b/").next().unwrap_or(line).to_string();
            current = Some((path, vec![line]));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
    }
    if let Some((path, lines)) = current {
        files.insert(path, lines.join("\n"));
    }
    files
}

/// The section of `diff` for `file`, or [`NO_CHANGES`].
pub fn file_diff(diff: &str, file: &str) -> String {
    split_files(diff)
        .remove(file)
        .filter(|section| !section.is_empty())
        .unwrap_or_else(|| NO_CHANGES.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Addition,
    Deletion,
    Context,
}

impl LineKind {
    pub fn classify(line: &str) -> Self {
        if line.starts_with('+') {
            LineKind::Addition
        } else if line.starts_with('-') {
            LineKind::Deletion
        } else {
            LineKind::Context
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            LineKind::Addition => "diff-addition",
            LineKind::Deletion => "diff-deletion",
            LineKind::Context => "diff-context",
        }
    }
}

/// Escape the characters HTML treats specially.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Render diff text as one `<div>` per line.
pub fn render_html(diff: &str) -> String {
    diff.lines()
        .map(|line| {
            format!(
                "<div class=\"diff-line {}\">{}</div>",
                LineKind::classify(line).css_class(),
                escape_html(line)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMIT_DIFF: &str = "\
diff --git a/src/a.rs b/src/a.rs
index 1..2 100644
--- a/src/a.rs
+++ b/src/a.rs
@@ -1 +1 @@
-old
+new
diff --git a/README.md b/README.md
@@ -0,0 +1 @@
+<hello> & \"bye\"";

    #[test]
    fn test_split_by_b_path() {
        let files = split_files(COMMIT_DIFF);
        assert_eq!(files.len(), 2);
        assert!(files["src/a.rs"].starts_with("diff --git a/src/a.rs"));
        assert!(files["src/a.rs"].ends_with("+new"));
        assert!(files["README.md"].contains("+<hello>"));
    }

    #[test]
    fn test_missing_file_message() {
        assert_eq!(file_diff(COMMIT_DIFF, "nope.txt"), NO_CHANGES);
        assert_eq!(file_diff("", "src/a.rs"), NO_CHANGES);
        assert!(file_diff(COMMIT_DIFF, "README.md").starts_with("diff --git"));
    }

    #[test]
    fn test_classify_lines() {
        assert_eq!(LineKind::classify("+added"), LineKind::Addition);
        assert_eq!(LineKind::classify("-removed"), LineKind::Deletion);
        assert_eq!(LineKind::classify(" same"), LineKind::Context);
        assert_eq!(LineKind::classify("@@ -1 +1 @@"), LineKind::Context);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#039;");
    }

    #[test]
    fn test_render_html() {
        let html = render_html("+<b>\n-x\n ctx");
        let lines: Vec<&str> = html.lines().collect();
        assert_eq!(lines[0], "<div class=\"diff-line diff-addition\">+&lt;b&gt;</div>");
        assert_eq!(lines[1], "<div class=\"diff-line diff-deletion\">-x</div>");
        assert_eq!(lines[2], "<div class=\"diff-line diff-context\"> ctx</div>");
    }
}
