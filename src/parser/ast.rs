//! Block-level AST for parsed documentation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Source location span, 1-indexed lines and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start_line: usize,
    pub end_line: usize,
    pub start_col: usize,
    pub end_col: usize,
}

impl Span {
    /// Span covering a contiguous run of whole lines.
    pub fn lines(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
            start_col: 1,
            end_col: 1,
        }
    }

    /// Whether the span covers the given line.
    pub fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }

    /// Smallest span covering both `self` and `other`.
    pub fn union(&self, other: &Span) -> Span {
        Span {
            start_line: self.start_line.min(other.start_line),
            end_line: self.end_line.max(other.end_line),
            start_col: if self.start_line <= other.start_line {
                self.start_col
            } else {
                other.start_col
            },
            end_col: if self.end_line >= other.end_line {
                self.end_col
            } else {
                other.end_col
            },
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// One block-level node of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    pub span: Span,
}

/// Block kinds recognized by the parser.
///
/// Anything the line classifier cannot place lands in `Paragraph`, so the
/// parser never rejects input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Heading {
        level: u8,
        text: String,
    },
    /// Fenced code block. `tag` is the info string's first word, lowercased.
    /// `closed` is false when the fence ran to end-of-input unterminated.
    CodeFence {
        tag: Option<String>,
        content: String,
        closed: bool,
    },
    Paragraph {
        text: String,
    },
    Blockquote {
        text: String,
    },
    List {
        items: Vec<String>,
        ordered: bool,
    },
    Table {
        rows: Vec<Vec<String>>,
    },
}

impl Block {
    /// Plain text carried by the block, for evidence scanning.
    pub fn text(&self) -> String {
        match &self.kind {
            BlockKind::Heading { text, .. } => text.clone(),
            BlockKind::CodeFence { content, .. } => content.clone(),
            BlockKind::Paragraph { text } => text.clone(),
            BlockKind::Blockquote { text } => text.clone(),
            BlockKind::List { items, .. } => items.join("\n"),
            BlockKind::Table { rows } => rows
                .iter()
                .map(|r| r.join(" "))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn is_code_fence(&self) -> bool {
        matches!(self.kind, BlockKind::CodeFence { .. })
    }

    pub fn is_heading(&self) -> bool {
        matches!(self.kind, BlockKind::Heading { .. })
    }
}

/// A recoverable problem found while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    pub line: usize,
}

/// The parsed document: ordered blocks plus recovery diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub blocks: Vec<Block>,
    pub diagnostics: Vec<Diagnostic>,
    /// Total number of source lines.
    pub line_count: usize,
}

impl ParsedDocument {
    /// The first heading at the given level, if any.
    pub fn first_heading(&self, level: u8) -> Option<(&str, Span)> {
        self.blocks.iter().find_map(|b| match &b.kind {
            BlockKind::Heading { level: l, text } if *l == level => Some((text.as_str(), b.span)),
            _ => None,
        })
    }

    /// All code fences, in document order.
    pub fn code_fences(&self) -> impl Iterator<Item = (&Block, Option<&str>, &str)> {
        self.blocks.iter().filter_map(|b| match &b.kind {
            BlockKind::CodeFence { tag, content, .. } => Some((b, tag.as_deref(), content.as_str())),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_contains_line() {
        let span = Span::lines(3, 7);
        assert!(span.contains_line(3));
        assert!(span.contains_line(7));
        assert!(!span.contains_line(2));
        assert!(!span.contains_line(8));
    }

    #[test]
    fn test_span_union() {
        let a = Span::lines(2, 4);
        let b = Span::lines(6, 9);
        let u = a.union(&b);
        assert_eq!(u.start_line, 2);
        assert_eq!(u.end_line, 9);
    }

    #[test]
    fn test_block_text_for_table() {
        let block = Block {
            kind: BlockKind::Table {
                rows: vec![vec!["Var".into(), "Default".into()]],
            },
            span: Span::lines(1, 1),
        };
        assert_eq!(block.text(), "Var Default");
    }
}
