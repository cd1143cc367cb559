//! Common utility functions shared across the codebase.

/// Maps byte offsets of a source fragment to 1-based line numbers.
///
/// Nested fragments (a `<script>` block inside a template, an expression
/// inside an attribute) are parsed on their own, so every offset a parser
/// reports is fragment-local. The index re-bases those offsets onto the line
/// the fragment starts at in the containing file.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offsets where each line starts. Line 1 starts at offset 0.
    offsets: Vec<usize>,
    /// Line number of the fragment's first line in the containing file.
    start_line: usize,
}

impl LineIndex {
    pub fn new(text: &str, start_line: usize) -> Self {
        let mut offsets = vec![0];
        for (i, c) in text.char_indices() {
            if c == '\n' {
                offsets.push(i + 1);
            }
        }
        Self {
            offsets,
            start_line,
        }
    }

    /// Line number of `offset`: the start line plus the count of line breaks
    /// preceding the offset.
    pub fn line_of(&self, offset: usize) -> usize {
        let preceding = match self.offsets.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line - 1,
        };
        self.start_line + preceding
    }

    pub fn start_line(&self) -> usize {
        self.start_line
    }
}

/// Returns true when the text is empty or whitespace only.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Shortens a snippet for log output, keeping the first line only.
pub fn snippet(text: &str) -> String {
    const MAX_CHARS: usize = 80;
    let first_line = text.lines().next().unwrap_or_default().trim();
    if first_line.chars().count() > MAX_CHARS {
        let cut: String = first_line.chars().take(MAX_CHARS).collect();
        format!("{}...", cut)
    } else {
        first_line.to_string()
    }
}
