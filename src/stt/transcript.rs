use super::messages::Segment;

/// Lines of transcript kept on screen
pub const DISPLAY_TAIL: usize = 3;

/// Wrap width for the on-screen transcript
pub const DISPLAY_WIDTH: usize = 60;

/// Displayed transcript buffer
///
/// A segment is dropped when its text equals the most recently appended
/// entry. Only the last entry is compared, never the full history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    entries: Vec<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from one batch of server segments
    pub fn from_segments(segments: &[Segment]) -> Self {
        let mut transcript = Self::new();
        for segment in segments {
            transcript.push(&segment.text);
        }
        transcript
    }

    /// Append unless identical to the last entry; returns whether it was kept
    pub fn push(&mut self, text: &str) -> bool {
        if self.entries.last().map(String::as_str) == Some(text) {
            return false;
        }
        self.entries.push(text.to_string());
        true
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Full text, segments concatenated as the server spaced them
    pub fn text(&self) -> String {
        self.entries.concat()
    }

    /// Last `tail` entries wrapped to `width` columns
    pub fn display_lines(&self, width: usize, tail: usize) -> Vec<String> {
        let start = self.entries.len().saturating_sub(tail);
        let text = self.entries[start..].concat();
        if text.trim().is_empty() {
            return Vec::new();
        }
        textwrap::wrap(text.trim(), width)
            .into_iter()
            .map(|line| line.into_owned())
            .collect()
    }
}
