pub mod error;

use std::ops::Range;

use regex::{Regex, RegexBuilder};

pub use error::QueryError;

/// How the free-text part of a query is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternType {
    #[default]
    Literal,
    Regexp,
}

/// A parsed query block input.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Free text, tokens joined by single spaces. Empty for path-only queries.
    pub pattern: String,
    pub pattern_type: PatternType,
    pub case_sensitive: bool,
    /// Maximum number of matches, if given with `count:`.
    pub count: Option<usize>,
    include_files: Vec<Regex>,
    exclude_files: Vec<Regex>,
    matcher: Option<Regex>,
}

impl SearchQuery {
    /// Compiled content matcher. `None` when the query only filters paths.
    pub fn matcher(&self) -> Option<&Regex> {
        self.matcher.as_ref()
    }

    /// Whether a `/`-separated relative path passes the `file:` and `-file:` filters.
    pub fn matches_path(&self, path: &str) -> bool {
        self.include_files.iter().all(|re| re.is_match(path))
            && !self.exclude_files.iter().any(|re| re.is_match(path))
    }
}

/// Parse a query. All errors found are reported, not just the first.
pub fn parse(input: &str) -> Result<SearchQuery, Vec<QueryError>> {
    let tokens = tokenize(input)?;
    QueryBuilder::default().build(input, tokens)
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Token {
    text: String,
    span: Range<usize>,
    quoted: bool,
}

fn tokenize(input: &str) -> Result<Vec<Token>, Vec<QueryError>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c == '"' {
            chars.next();
            let mut text = String::new();
            let mut end = None;
            while let Some((i, c)) = chars.next() {
                match c {
                    '"' => {
                        end = Some(i + 1);
                        break;
                    }
                    '\\' => match chars.next() {
                        Some((_, escaped)) => text.push(escaped),
                        None => break,
                    },
                    other => text.push(other),
                }
            }
            let Some(end) = end else {
                return Err(vec![QueryError::new(
                    "unterminated quoted string",
                    start..input.len(),
                )
                .with_note("close the string with a matching `\"`")]);
            };
            tokens.push(Token {
                text,
                span: start..end,
                quoted: true,
            });
            continue;
        }

        let mut end = start;
        while let Some(&(i, c)) = chars.peek() {
            if c.is_whitespace() {
                break;
            }
            end = i + c.len_utf8();
            chars.next();
        }
        tokens.push(Token {
            text: input[start..end].to_string(),
            span: start..end,
            quoted: false,
        });
    }

    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    File,
    ExcludeFile,
    Case,
    PatternType,
    Count,
}

impl Field {
    fn lookup(name: &str) -> Option<Field> {
        match name.to_ascii_lowercase().as_str() {
            "file" | "f" => Some(Field::File),
            "-file" | "-f" => Some(Field::ExcludeFile),
            "case" => Some(Field::Case),
            "patterntype" => Some(Field::PatternType),
            "count" => Some(Field::Count),
            _ => None,
        }
    }
}

#[derive(Default)]
struct QueryBuilder {
    pattern_parts: Vec<String>,
    pattern_span: Option<Range<usize>>,
    pattern_type: PatternType,
    case_sensitive: bool,
    count: Option<usize>,
    include_files: Vec<(String, Range<usize>)>,
    exclude_files: Vec<(String, Range<usize>)>,
    errors: Vec<QueryError>,
}

impl QueryBuilder {
    fn build(mut self, input: &str, tokens: Vec<Token>) -> Result<SearchQuery, Vec<QueryError>> {
        for token in tokens {
            self.token(token);
        }

        if self.pattern_parts.is_empty()
            && self.include_files.is_empty()
            && self.exclude_files.is_empty()
            && self.errors.is_empty()
        {
            self.errors.push(
                QueryError::new("empty query", 0..input.len())
                    .with_note("enter a search pattern or a `file:` filter"),
            );
        }

        let include_sources = std::mem::take(&mut self.include_files);
        let include_files = self.compile_all(include_sources);
        let exclude_sources = std::mem::take(&mut self.exclude_files);
        let exclude_files = self.compile_all(exclude_sources);

        let pattern = self.pattern_parts.join(" ");
        let matcher = match self.pattern_span.clone() {
            Some(span) if !pattern.is_empty() => {
                let source = match self.pattern_type {
                    PatternType::Literal => regex::escape(&pattern),
                    PatternType::Regexp => pattern.clone(),
                };
                self.compile(&source, span)
            }
            _ => None,
        };

        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        Ok(SearchQuery {
            pattern,
            pattern_type: self.pattern_type,
            case_sensitive: self.case_sensitive,
            count: self.count,
            include_files,
            exclude_files,
            matcher,
        })
    }

    fn token(&mut self, token: Token) {
        if !token.quoted {
            if let Some((name, value)) = token.text.split_once(':') {
                if let Some(field) = Field::lookup(name) {
                    let value_start = token.span.start + name.len() + 1;
                    self.field(field, value, value_start..token.span.end);
                    return;
                }
            }
        }

        self.pattern_span = Some(match self.pattern_span.take() {
            Some(span) => span.start..token.span.end,
            None => token.span.clone(),
        });
        self.pattern_parts.push(token.text);
    }

    fn field(&mut self, field: Field, value: &str, span: Range<usize>) {
        if value.is_empty() && field != Field::File && field != Field::ExcludeFile {
            self.errors.push(QueryError::new("missing field value", span));
            return;
        }
        match field {
            Field::File => self.include_files.push((value.to_string(), span)),
            Field::ExcludeFile => self.exclude_files.push((value.to_string(), span)),
            Field::Case => match value.to_ascii_lowercase().as_str() {
                "yes" => self.case_sensitive = true,
                "no" => self.case_sensitive = false,
                _ => self.errors.push(
                    QueryError::new(format!("invalid value for case: `{}`", value), span)
                        .with_note("expected `yes` or `no`"),
                ),
            },
            Field::PatternType => match value.to_ascii_lowercase().as_str() {
                "literal" => self.pattern_type = PatternType::Literal,
                "regexp" | "regex" => self.pattern_type = PatternType::Regexp,
                _ => self.errors.push(
                    QueryError::new(format!("invalid value for patterntype: `{}`", value), span)
                        .with_note("expected `literal` or `regexp`"),
                ),
            },
            Field::Count => match value.parse::<usize>() {
                Ok(count) if count > 0 => self.count = Some(count),
                _ => self.errors.push(
                    QueryError::new(format!("invalid value for count: `{}`", value), span)
                        .with_note("expected a positive integer"),
                ),
            },
        }
    }

    fn compile_all(&mut self, sources: Vec<(String, Range<usize>)>) -> Vec<Regex> {
        sources
            .into_iter()
            .filter_map(|(source, span)| self.compile(&source, span))
            .collect()
    }

    fn compile(&mut self, source: &str, span: Range<usize>) -> Option<Regex> {
        match RegexBuilder::new(source)
            .case_insensitive(!self.case_sensitive)
            .build()
        {
            Ok(regex) => Some(regex),
            Err(err) => {
                self.errors.push(
                    QueryError::new("invalid regular expression", span).with_note(err.to_string()),
                );
                None
            }
        }
    }
}
