//! Diagnostics produced by the rule engine, and the textual fixes they may
//! carry.

/// A zero-indexed `(row, col)` .. `(row, col)` span within a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceRange {
    /// Start row (0-indexed, inclusive).
    pub start_row: u32,
    /// Start column, in bytes (0-indexed, inclusive).
    pub start_col: u32,
    /// End row (0-indexed, inclusive).
    pub end_row: u32,
    /// End column, in bytes (0-indexed, exclusive).
    pub end_col: u32,
}

impl SourceRange {
    /// Whether this range overlaps `other`.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let (a_start, a_end) = (self.start_row, self.end_row);
        let (b_start, b_end) = (other.start_row, other.end_row);
        if a_end < b_start || b_end < a_start {
            return false;
        }
        if a_start == b_end && self.start_col >= other.end_col {
            return false;
        }
        if b_start == a_end && other.start_col >= self.end_col {
            return false;
        }
        true
    }

    fn to_byte_offsets(self, line_starts: &[usize]) -> Option<(usize, usize)> {
        let start = *line_starts.get(self.start_row as usize)? + self.start_col as usize;
        let end = *line_starts.get(self.end_row as usize)? + self.end_col as usize;
        if end < start {
            return None;
        }
        Some((start, end))
    }
}

/// One textual replacement: delete the bytes in `range` and splice in
/// `replacement` (an empty string is a pure deletion).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixEdit {
    /// The span being replaced.
    pub range: SourceRange,
    /// The replacement text.
    pub replacement: String,
}

/// A diagnostic-carried fix: a set of edits applied atomically.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fix {
    /// The edits making up this fix, in no particular order.
    pub edits: Vec<FixEdit>,
}

/// The result of attempting to apply a `Fix` to a source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixApplyOutcome {
    /// The fix produced new text.
    Applied(String),
    /// The fix's edits, applied, produce byte-identical text to the input.
    Unchanged,
    /// Two or more edits in the fix overlap.
    OverlappingFixRanges,
    /// A range in the fix falls outside the source text.
    SourceCodeInvalid(String),
}

impl Fix {
    /// Apply this fix's edits to `original`, splicing from the end backwards
    /// so earlier offsets stay valid.
    #[must_use]
    pub fn apply(&self, original: &str) -> FixApplyOutcome {
        if self.edits.is_empty() {
            return FixApplyOutcome::Unchanged;
        }

        for (i, a) in self.edits.iter().enumerate() {
            for b in &self.edits[i + 1..] {
                if a.range.overlaps(&b.range) {
                    return FixApplyOutcome::OverlappingFixRanges;
                }
            }
        }

        let line_starts = line_start_offsets(original);
        let mut spans = Vec::with_capacity(self.edits.len());
        for edit in &self.edits {
            match edit.range.to_byte_offsets(&line_starts) {
                Some((start, end)) if end <= original.len() => {
                    spans.push((start, end, edit.replacement.as_str()));
                }
                _ => {
                    return FixApplyOutcome::SourceCodeInvalid(format!(
                        "fix range {:?} falls outside the source text",
                        edit.range
                    ))
                }
            }
        }
        spans.sort_by(|a, b| b.0.cmp(&a.0));

        let mut text = original.to_string();
        for (start, end, replacement) in spans {
            if !original.is_char_boundary(start) || !original.is_char_boundary(end) {
                return FixApplyOutcome::SourceCodeInvalid(
                    "fix range does not fall on a character boundary".to_string(),
                );
            }
            text.replace_range(start..end, replacement);
        }

        if text == original {
            FixApplyOutcome::Unchanged
        } else {
            FixApplyOutcome::Applied(text)
        }
    }
}

fn line_start_offsets(text: &str) -> Vec<usize> {
    let mut starts = vec![0usize];
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

/// A single diagnostic emitted by the rule engine for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Human-readable message.
    pub message: String,
    /// The rule that produced this diagnostic (e.g. `"NoUnused.Dependencies"`).
    pub rule_name: String,
    /// The file this diagnostic concerns, relative to the project root.
    pub file_path: String,
    /// Extra detail lines shown alongside the message.
    pub details: Vec<String>,
    /// Where in the file the diagnostic applies.
    pub range: SourceRange,
    /// A fix the diagnostic carries, if the rule can propose one.
    pub fix: Option<Fix>,
}
