//! Marker expansion
//!
//! Scans a source file for trigger markers (`//ai add input validation`), asks the
//! generator for subtasks and inserts them as comment lines right after the marker:
//!
//! ```text
//! // ai add input validation
//!
//! // 1. Check null input
//! // 2. Check type
//!
//! ```
//!
//! The file is rewritten at most once per pass, atomically, and only if something was
//! inserted. A failed generation inserts a single `// Error: ...` line instead.

use crate::config::Config;
use crate::error::ProcessError;
use crate::fsutil::atomic_write;
use crate::generator::{GenerateError, Generator};
use crate::metrics::Metrics;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Trigger marker, split into the comment prefix and the keyword.
///
/// `//ai` becomes prefix `//` and keyword `ai`. Whitespace between the two is tolerated
/// and the keyword must be followed by whitespace, `:`, `-` or the end of the line, so
/// `// ai fix this` triggers while `//aim` and `http://ai.example` do not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    prefix: String,
    keyword: String,
}

impl Marker {
    pub fn parse(marker: &str) -> Self {
        let marker = marker.trim();
        let split = marker
            .find(|c: char| c.is_alphanumeric())
            .unwrap_or(marker.len());
        Self {
            prefix: marker[..split].to_string(),
            keyword: marker[split..].to_string(),
        }
    }

    /// Comment prefix used for inserted lines
    pub fn comment_prefix(&self) -> &str {
        if self.prefix.is_empty() {
            "//"
        } else {
            &self.prefix
        }
    }

    /// Task description following the first marker on `line`, trimmed.
    ///
    /// Returns `None` when the line has no marker. `Some("")` means a bare marker.
    pub fn find<'a>(&self, line: &'a str) -> Option<&'a str> {
        let mut from = 0;
        while from <= line.len() {
            let found = if self.prefix.is_empty() {
                line[from..].find(self.keyword.as_str())
            } else {
                line[from..].find(self.prefix.as_str())
            };
            let idx = from + found?;
            let after_prefix = &line[idx + self.prefix.len()..];
            let candidate = after_prefix.trim_start_matches([' ', '\t']);

            if let Some(rest) = candidate.strip_prefix(self.keyword.as_str()) {
                let at_boundary = rest
                    .chars()
                    .next()
                    .map_or(true, |c| c.is_whitespace() || c == ':' || c == '-');
                if at_boundary {
                    return Some(rest.trim().trim_start_matches([':', '-']).trim());
                }
            }

            from = idx + self.prefix.len().max(1);
            while from < line.len() && !line.is_char_boundary(from) {
                from += 1;
            }
        }
        None
    }
}

/// What one pass over a file did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Markers with a non-empty description
    pub markers: usize,
    /// Markers expanded into subtasks
    pub expanded: usize,
    /// Markers that got an inline error comment
    pub failed: usize,
    /// Markers skipped because an annotation block already follows them
    pub skipped: usize,
    /// Whether the file was rewritten
    pub written: bool,
}

/// Result of annotating a text buffer in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotated {
    pub text: String,
    pub outcome: Outcome,
}

impl Annotated {
    pub fn modified(&self) -> bool {
        self.outcome.expanded + self.outcome.failed > 0
    }
}

/// Expands markers in files using a [`Generator`]
pub struct Annotator<G> {
    generator: G,
    marker: Marker,
    skip_annotated: bool,
    metrics: Arc<Metrics>,
}

impl<G: Generator> Annotator<G> {
    pub fn new(config: &Config, generator: G, metrics: Arc<Metrics>) -> Self {
        Self {
            generator,
            marker: Marker::parse(&config.marker),
            skip_annotated: config.skip_annotated,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Process one file: expand its markers and rewrite it once if anything changed
    pub async fn process(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<Outcome, ProcessError> {
        let _timer = self
            .metrics
            .start_operation(format!("Processing {}", path.display()));

        let original = read_source(path).await?;

        let annotated = self
            .annotate_text(&original, cancel)
            .await
            .map_err(|_| ProcessError::Cancelled(path.to_path_buf()))?;

        if !annotated.modified() {
            debug!("No changes for {}", path.display());
            return Ok(annotated.outcome);
        }

        let Annotated { text, mut outcome } = annotated;
        let target = path.to_path_buf();
        tokio::task::spawn_blocking(move || atomic_write(&target, text.as_bytes()))
            .await
            .unwrap_or_else(|e| Err(io::Error::new(io::ErrorKind::Other, e)))
            .map_err(|source| ProcessError::Write {
                path: path.to_path_buf(),
                source,
            })?;

        outcome.written = true;
        info!(
            "Updated {} ({} expanded, {} failed)",
            path.display(),
            outcome.expanded,
            outcome.failed
        );
        Ok(outcome)
    }

    /// Expand every marker in `text`.
    ///
    /// The only error is cancellation; generation failures become inline comments.
    pub async fn annotate_text(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Annotated, GenerateError> {
        let newline = dominant_newline(text);
        let comment = self.marker.comment_prefix();
        let lines: Vec<&str> = text.split_inclusive('\n').collect();

        let mut out = String::with_capacity(text.len());
        let mut outcome = Outcome::default();

        for (idx, line) in lines.iter().enumerate() {
            out.push_str(line);

            let description = match self.description(line) {
                Some(d) => d,
                None => continue,
            };
            outcome.markers += 1;

            if self.skip_annotated && is_annotation_start(&lines[idx + 1..], comment) {
                debug!("Marker already expanded: {}", description);
                outcome.skipped += 1;
                continue;
            }

            if cancel.is_cancelled() {
                return Err(GenerateError::Cancelled);
            }

            // A marker on an unterminated last line needs its own line ending first
            if !line.ends_with('\n') {
                out.push_str(newline);
            }

            match self.generator.generate(description, cancel).await {
                Ok(generation) => {
                    out.push_str(newline);
                    for subtask in &generation.subtasks {
                        out.push_str(comment);
                        out.push(' ');
                        out.push_str(subtask);
                        out.push_str(newline);
                    }
                    out.push_str(newline);
                    outcome.expanded += 1;
                    self.metrics
                        .record_tasks(generation.subtasks.len(), generation.tokens);
                }
                Err(GenerateError::Cancelled) => return Err(GenerateError::Cancelled),
                Err(e) => {
                    out.push_str(comment);
                    out.push_str(" Error: ");
                    out.push_str(&e.to_string());
                    out.push_str(newline);
                    outcome.failed += 1;
                    self.metrics.record_error(&format_args!(
                        "Generation failed for '{}': {}",
                        description, e
                    ));
                }
            }
        }

        Ok(Annotated { text: out, outcome })
    }

    /// Count markers that would trigger a generation, without calling the generator
    pub async fn pending_markers(&self, path: &Path) -> Result<usize, ProcessError> {
        let text = read_source(path).await?;
        Ok(self.pending_in_text(&text))
    }

    pub fn pending_in_text(&self, text: &str) -> usize {
        let comment = self.marker.comment_prefix();
        let lines: Vec<&str> = text.split_inclusive('\n').collect();

        lines
            .iter()
            .enumerate()
            .filter(|(idx, line)| {
                self.description(line).is_some()
                    && !(self.skip_annotated && is_annotation_start(&lines[idx + 1..], comment))
            })
            .count()
    }

    /// Non-empty task description on `line`. Lines this tool inserted never count, even
    /// when their text happens to contain the marker (an endpoint URL like `http://ai:11434`).
    fn description<'a>(&self, line: &'a str) -> Option<&'a str> {
        let body = line.trim_end_matches(['\n', '\r']);
        if is_inserted_line(body, self.marker.comment_prefix()) {
            return None;
        }
        self.marker.find(body).filter(|d| !d.is_empty())
    }
}

async fn read_source(path: &Path) -> Result<String, ProcessError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ProcessError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// `\r\n` when it is the majority line ending, `\n` otherwise
fn dominant_newline(text: &str) -> &'static str {
    let total = text.matches('\n').count();
    let crlf = text.matches("\r\n").count();
    if crlf > 0 && crlf * 2 >= total {
        "\r\n"
    } else {
        "\n"
    }
}

/// Whether `following` begins with a block this tool inserted: an error comment, or a
/// blank line followed by a numbered comment.
fn is_annotation_start(following: &[&str], comment: &str) -> bool {
    let mut iter = following.iter().map(|l| l.trim());
    match iter.next() {
        Some(first) if is_comment_with(first, comment, |rest| rest.starts_with("Error:")) => true,
        Some("") => iter
            .next()
            .map_or(false, |second| is_comment_with(second, comment, starts_numbered)),
        _ => false,
    }
}

/// An error comment or a numbered subtask comment
fn is_inserted_line(line: &str, comment: &str) -> bool {
    is_comment_with(line.trim(), comment, |rest| {
        rest.starts_with("Error:") || starts_numbered(rest)
    })
}

fn is_comment_with(line: &str, comment: &str, check: impl Fn(&str) -> bool) -> bool {
    line.strip_prefix(comment)
        .map_or(false, |rest| check(rest.trim_start()))
}

fn starts_numbered(text: &str) -> bool {
    let digits = text.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && text[digits..].starts_with('.')
}
