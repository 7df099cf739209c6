use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::{debug, warn};

use notebook::{ExecutionError, FileMatch, LineMatch, SearchBackend, SearchResults};

use crate::query::{self, SearchQuery};

/// Match limit when a query does not set `count:`.
pub const DEFAULT_COUNT: usize = 500;

/// Searches the files under a root directory, honouring ignore files.
#[derive(Debug, Clone)]
pub struct FsSearch {
    root: PathBuf,
    default_count: usize,
}

impl FsSearch {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsSearch {
            root: root.into(),
            default_count: DEFAULT_COUNT,
        }
    }

    pub fn with_default_count(mut self, count: usize) -> Self {
        self.default_count = count.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn search(&self, query: &SearchQuery) -> Result<SearchResults, ExecutionError> {
        if !self.root.is_dir() {
            return Err(ExecutionError::Search(format!(
                "search root '{}' is not a directory",
                self.root.display()
            )));
        }

        let limit = query.count.unwrap_or(self.default_count);
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(true)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut results = SearchResults::default();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "search walk error");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = relative_path(&self.root, entry.path());
            if !query.matches_path(&path) {
                continue;
            }

            let Some(matcher) = query.matcher() else {
                if results.match_count == limit {
                    results.limit_hit = true;
                    break;
                }
                results.files.push(FileMatch {
                    path,
                    line_matches: Vec::new(),
                });
                results.match_count += 1;
                continue;
            };

            let text = match std::fs::read_to_string(entry.path()) {
                Ok(text) => text,
                Err(err) => {
                    debug!(error = %err, path = %entry.path().display(), "skipping unreadable file");
                    continue;
                }
            };

            let mut line_matches = Vec::new();
            for (index, line) in text.lines().enumerate() {
                let offsets: Vec<(usize, usize)> = matcher
                    .find_iter(line)
                    .map(|m| (m.start(), m.end()))
                    .collect();
                if offsets.is_empty() {
                    continue;
                }
                if results.match_count == limit {
                    results.limit_hit = true;
                    break;
                }
                line_matches.push(LineMatch {
                    line_number: index + 1,
                    preview: line.to_string(),
                    offsets,
                });
                results.match_count += 1;
            }

            if !line_matches.is_empty() {
                results.files.push(FileMatch { path, line_matches });
            }
            if results.limit_hit {
                break;
            }
        }

        debug!(
            root = %self.root.display(),
            pattern = %query.pattern,
            matches = results.match_count,
            limit_hit = results.limit_hit,
            "search finished"
        );
        Ok(results)
    }
}

impl SearchBackend for FsSearch {
    fn execute(&self, input: &str) -> Result<SearchResults, ExecutionError> {
        let query = query::parse(input).map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ExecutionError::InvalidQuery(messages.join("; "))
        })?;
        self.search(&query)
    }
}

fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
