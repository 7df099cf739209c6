use serde::{Deserialize, Serialize};

/// Aggregated results of a query block run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    pub files: Vec<FileMatch>,
    /// Number of matching lines, plus one per path-only match.
    pub match_count: usize,
    /// The result limit was reached before the search finished.
    pub limit_hit: bool,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Matches within a single file. Empty `line_matches` means the path itself matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMatch {
    pub path: String,
    pub line_matches: Vec<LineMatch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineMatch {
    /// 1-based line number.
    pub line_number: usize,
    pub preview: String,
    /// Byte ranges into `preview`.
    pub offsets: Vec<(usize, usize)>,
}
