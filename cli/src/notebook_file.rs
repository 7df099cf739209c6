use std::ops::Range;
use std::path::Path;

use serde::Deserialize;

use notebook::BlockInitializer;

/// On-disk notebook: an ordered list of block initializers.
#[derive(Debug, Deserialize)]
pub struct NotebookFile {
    /// Optional human-readable title, shown by `blocks`.
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub blocks: Vec<BlockInitializer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    /// `.json` files are JSON, everything else is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Toml,
        }
    }
}

/// A notebook file that failed to deserialize.
#[derive(Debug)]
pub struct LoadError {
    pub message: String,
    pub span: Option<Range<usize>>,
}

pub fn parse(source: &str, format: Format) -> Result<NotebookFile, LoadError> {
    match format {
        Format::Toml => toml::from_str(source).map_err(|e| LoadError {
            message: e.message().to_string(),
            span: e.span(),
        }),
        Format::Json => {
            // A bare array is accepted as shorthand for `{"blocks": [...]}`.
            let result = if source.trim_start().starts_with('[') {
                serde_json::from_str::<Vec<BlockInitializer>>(source).map(|blocks| NotebookFile {
                    title: None,
                    blocks,
                })
            } else {
                serde_json::from_str::<NotebookFile>(source)
            };
            result.map_err(|e| {
                let offset = line_column_offset(source, e.line(), e.column());
                LoadError {
                    message: e.to_string(),
                    span: Some(offset..next_char_boundary(source, offset)),
                }
            })
        }
    }
}

/// Byte offset of a 1-based line and column, clamped to the source and
/// moved back onto a character boundary.
fn line_column_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    let mut offset = (line_start + column.saturating_sub(1)).min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// End of the character starting at `offset`, or `offset` at the end of the source.
fn next_char_boundary(source: &str, offset: usize) -> usize {
    source[offset..]
        .chars()
        .next()
        .map_or(offset, |c| offset + c.len_utf8())
}

#[cfg(test)]
mod tests {
    use notebook::BlockType;

    use super::*;

    #[test]
    fn toml_notebook() {
        let file = parse(
            "title = \"t\"\n[[blocks]]\ntype = \"md\"\ninput = \"# A\"\n[[blocks]]\ntype = \"query\"\n",
            Format::Toml,
        )
        .unwrap();
        assert_eq!(file.title.as_deref(), Some("t"));
        assert_eq!(file.blocks.len(), 2);
        assert_eq!(file.blocks[1].block_type, BlockType::Query);
        assert_eq!(file.blocks[1].input, "");
    }

    #[test]
    fn toml_error_has_span() {
        let source = "[[blocks]]\ntype = \"code\"\n";
        let err = parse(source, Format::Toml).unwrap_err();
        let span = err.span.unwrap();
        assert!(source[span].contains("code"));
    }

    #[test]
    fn json_object_and_bare_array() {
        let file = parse(r#"{"blocks": [{"type": "md", "input": "x"}]}"#, Format::Json).unwrap();
        assert_eq!(file.blocks.len(), 1);
        let file = parse(r#"[{"type": "query", "input": "y"}]"#, Format::Json).unwrap();
        assert_eq!(file.blocks[0].input, "y");
    }

    #[test]
    fn json_error_offset() {
        let source = "{\n  \"blocks\": [\n    {\"type\": 3}\n  ]\n}";
        let err = parse(source, Format::Json).unwrap_err();
        let span = err.span.unwrap();
        assert!(span.start > source.find("type").unwrap());
        assert!(span.end <= source.len());
    }

    #[test]
    fn json_error_span_covers_whole_character() {
        let source = r#"{"blocks": é}"#;
        let err = parse(source, Format::Json).unwrap_err();
        let span = err.span.unwrap();
        assert!(source.is_char_boundary(span.start));
        assert!(source.is_char_boundary(span.end));
        assert_eq!(&source[span], "é");
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::from_path(Path::new("a.JSON")), Format::Json);
        assert_eq!(Format::from_path(Path::new("a.toml")), Format::Toml);
        assert_eq!(Format::from_path(Path::new("notebook")), Format::Toml);
    }
}
