//! Line classifier and block builder.
//!
//! The parser is deliberately line-oriented: README markdown is too messy
//! for strict grammar parsing, and recovery matters more than fidelity.
//! Each line is classified independently, then a small state machine folds
//! consecutive lines into blocks. Anything unrecognized becomes paragraph
//! text, so `build_blocks` cannot fail.

use once_cell::sync::Lazy;
use regex::Regex;

use super::ast::{Block, BlockKind, Diagnostic, Span};

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.*?)\s*#*\s*$").unwrap());
static FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(```+|~~~+)\s*(\S*)").unwrap());
static UNORDERED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[-*+]\s+(.*)$").unwrap());
static ORDERED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+[.)]\s+(.*)$").unwrap());
static TABLE_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\|.*\|\s*$").unwrap());
static TABLE_RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\|?[\s:|-]+\|?\s*$").unwrap());
static BLOCKQUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*>\s?(.*)$").unwrap());

/// How a single line was classified.
#[derive(Debug, Clone, PartialEq)]
enum LineKind {
    Blank,
    Heading { level: u8, text: String },
    FenceDelimiter { tag: Option<String> },
    UnorderedItem(String),
    OrderedItem(String),
    TableRow(Vec<String>),
    TableRule,
    Blockquote(String),
    Text(String),
}

fn classify(line: &str) -> LineKind {
    if line.trim().is_empty() {
        return LineKind::Blank;
    }
    if let Some(caps) = FENCE.captures(line) {
        let tag = caps.get(2).map(|m| m.as_str()).filter(|s| !s.is_empty());
        return LineKind::FenceDelimiter {
            tag: tag.map(|t| t.to_ascii_lowercase()),
        };
    }
    if let Some(caps) = HEADING.captures(line) {
        return LineKind::Heading {
            level: caps[1].len() as u8,
            text: caps[2].to_string(),
        };
    }
    if TABLE_ROW.is_match(line) {
        if TABLE_RULE.is_match(line) {
            return LineKind::TableRule;
        }
        let cells = line
            .trim()
            .trim_matches('|')
            .split('|')
            .map(|c| c.trim().to_string())
            .collect();
        return LineKind::TableRow(cells);
    }
    if let Some(caps) = BLOCKQUOTE.captures(line) {
        return LineKind::Blockquote(caps[1].to_string());
    }
    if let Some(caps) = UNORDERED_ITEM.captures(line) {
        return LineKind::UnorderedItem(caps[1].to_string());
    }
    if let Some(caps) = ORDERED_ITEM.captures(line) {
        return LineKind::OrderedItem(caps[1].to_string());
    }
    LineKind::Text(line.trim().to_string())
}

/// In-progress multi-line block.
enum Pending {
    None,
    Paragraph {
        start: usize,
        lines: Vec<String>,
    },
    Fence {
        start: usize,
        tag: Option<String>,
        lines: Vec<String>,
    },
    List {
        start: usize,
        last: usize,
        ordered: bool,
        items: Vec<String>,
    },
    Table {
        start: usize,
        last: usize,
        rows: Vec<Vec<String>>,
    },
    Blockquote {
        start: usize,
        last: usize,
        lines: Vec<String>,
    },
}

/// Fold classified lines into blocks. Never fails; problems that required
/// recovery are reported as diagnostics.
pub fn build_blocks(text: &str) -> (Vec<Block>, Vec<Diagnostic>, usize) {
    let mut blocks = Vec::new();
    let mut diagnostics = Vec::new();
    let mut pending = Pending::None;
    let mut line_count = 0;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        line_count = line_no;

        // Inside an open fence everything is literal until the closing marker.
        if let Pending::Fence { start, tag, lines } = &mut pending {
            if let LineKind::FenceDelimiter { tag: t } = classify(raw) {
                if t.is_none() {
                    blocks.push(Block {
                        kind: BlockKind::CodeFence {
                            tag: tag.clone(),
                            content: lines.join("\n"),
                            closed: true,
                        },
                        span: Span::lines(*start, line_no),
                    });
                    pending = Pending::None;
                    continue;
                }
            }
            lines.push(raw.to_string());
            continue;
        }

        match classify(raw) {
            LineKind::Blank => flush(&mut pending, &mut blocks),
            LineKind::Heading { level, text } => {
                flush(&mut pending, &mut blocks);
                blocks.push(Block {
                    kind: BlockKind::Heading { level, text },
                    span: Span::lines(line_no, line_no),
                });
            }
            LineKind::FenceDelimiter { tag } => {
                flush(&mut pending, &mut blocks);
                pending = Pending::Fence {
                    start: line_no,
                    tag,
                    lines: Vec::new(),
                };
            }
            LineKind::UnorderedItem(item) | LineKind::OrderedItem(item)
                if matches!(pending, Pending::List { .. }) =>
            {
                if let Pending::List { last, items, .. } = &mut pending {
                    *last = line_no;
                    items.push(item);
                }
            }
            LineKind::UnorderedItem(item) => {
                flush(&mut pending, &mut blocks);
                pending = Pending::List {
                    start: line_no,
                    last: line_no,
                    ordered: false,
                    items: vec![item],
                };
            }
            LineKind::OrderedItem(item) => {
                flush(&mut pending, &mut blocks);
                pending = Pending::List {
                    start: line_no,
                    last: line_no,
                    ordered: true,
                    items: vec![item],
                };
            }
            LineKind::TableRule => {
                // Separator row carries no content; keep the table open.
                if !matches!(pending, Pending::Table { .. }) {
                    flush(&mut pending, &mut blocks);
                }
            }
            LineKind::TableRow(cells) => {
                if let Pending::Table { last, rows, .. } = &mut pending {
                    *last = line_no;
                    rows.push(cells);
                } else {
                    flush(&mut pending, &mut blocks);
                    pending = Pending::Table {
                        start: line_no,
                        last: line_no,
                        rows: vec![cells],
                    };
                }
            }
            LineKind::Blockquote(text) => {
                if let Pending::Blockquote { last, lines, .. } = &mut pending {
                    *last = line_no;
                    lines.push(text);
                } else {
                    flush(&mut pending, &mut blocks);
                    pending = Pending::Blockquote {
                        start: line_no,
                        last: line_no,
                        lines: vec![text],
                    };
                }
            }
            LineKind::Text(text) => {
                if let Pending::Paragraph { lines, .. } = &mut pending {
                    lines.push(text);
                } else {
                    flush(&mut pending, &mut blocks);
                    pending = Pending::Paragraph {
                        start: line_no,
                        lines: vec![text],
                    };
                }
            }
        }
    }

    // Unterminated fence at end of input: keep the content, flag it.
    if let Pending::Fence { start, tag, lines } = &pending {
        diagnostics.push(Diagnostic {
            message: format!("unterminated code fence opened at line {}", start),
            line: *start,
        });
        blocks.push(Block {
            kind: BlockKind::CodeFence {
                tag: tag.clone(),
                content: lines.join("\n"),
                closed: false,
            },
            span: Span::lines(*start, line_count.max(*start)),
        });
        pending = Pending::None;
    }
    flush(&mut pending, &mut blocks);

    // A one-row "table" is usually a broken pipe-decorated line, not a table.
    for block in &blocks {
        if let BlockKind::Table { rows } = &block.kind {
            if rows.len() == 1 {
                diagnostics.push(Diagnostic {
                    message: "table with a single row; possibly malformed".to_string(),
                    line: block.span.start_line,
                });
            }
        }
    }

    (blocks, diagnostics, line_count)
}

fn flush(pending: &mut Pending, blocks: &mut Vec<Block>) {
    match std::mem::replace(pending, Pending::None) {
        Pending::None => {}
        Pending::Paragraph { start, lines } => {
            let end = start + lines.len().saturating_sub(1);
            blocks.push(Block {
                kind: BlockKind::Paragraph {
                    text: lines.join(" "),
                },
                span: Span::lines(start, end),
            });
        }
        Pending::Fence { start, tag, lines } => {
            // Open fences are normally closed in the main loop or at EOF;
            // this arm keeps the content if control ever reaches it.
            let end = start + lines.len();
            blocks.push(Block {
                kind: BlockKind::CodeFence {
                    tag,
                    content: lines.join("\n"),
                    closed: false,
                },
                span: Span::lines(start, end),
            });
        }
        Pending::List {
            start,
            last,
            ordered,
            items,
        } => {
            blocks.push(Block {
                kind: BlockKind::List { items, ordered },
                span: Span::lines(start, last),
            });
        }
        Pending::Table { start, last, rows } => {
            blocks.push(Block {
                kind: BlockKind::Table { rows },
                span: Span::lines(start, last),
            });
        }
        Pending::Blockquote { start, last, lines } => {
            blocks.push(Block {
                kind: BlockKind::Blockquote {
                    text: lines.join(" "),
                },
                span: Span::lines(start, last),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_and_paragraph() {
        let (blocks, diags, _) = build_blocks("# Title\n\nSome description text.\n");
        assert!(diags.is_empty());
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0].kind,
            BlockKind::Heading {
                level: 1,
                text: "Title".to_string()
            }
        );
        match &blocks[1].kind {
            BlockKind::Paragraph { text } => assert_eq!(text, "Some description text."),
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_tagged_fence() {
        let input = "```rust\nfn main() {}\n```\n";
        let (blocks, diags, _) = build_blocks(input);
        assert!(diags.is_empty());
        match &blocks[0].kind {
            BlockKind::CodeFence { tag, content, closed } => {
                assert_eq!(tag.as_deref(), Some("rust"));
                assert_eq!(content, "fn main() {}");
                assert!(closed);
            }
            other => panic!("expected fence, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_fence_recovers() {
        let input = "# Docs\n\n```bash\nnpm install\n";
        let (blocks, diags, _) = build_blocks(input);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("unterminated"));
        let fence = blocks.iter().find(|b| b.is_code_fence()).unwrap();
        match &fence.kind {
            BlockKind::CodeFence { content, closed, .. } => {
                assert_eq!(content, "npm install");
                assert!(!closed);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_fence_tag_is_lowercased() {
        let (blocks, _, _) = build_blocks("```Rust\nlet x = 1;\n```\n");
        match &blocks[0].kind {
            BlockKind::CodeFence { tag, .. } => assert_eq!(tag.as_deref(), Some("rust")),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_list_grouping() {
        let input = "- one\n- two\n- three\n\n1. first\n2. second\n";
        let (blocks, _, _) = build_blocks(input);
        assert_eq!(blocks.len(), 2);
        match &blocks[0].kind {
            BlockKind::List { items, ordered } => {
                assert_eq!(items.len(), 3);
                assert!(!ordered);
            }
            _ => unreachable!(),
        }
        match &blocks[1].kind {
            BlockKind::List { items, ordered } => {
                assert_eq!(items, &["first".to_string(), "second".to_string()]);
                assert!(ordered);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_table_with_separator() {
        let input = "| Var | Default |\n|-----|---------|\n| PORT | 8080 |\n";
        let (blocks, diags, _) = build_blocks(input);
        assert!(diags.is_empty());
        match &blocks[0].kind {
            BlockKind::Table { rows } => {
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[1], vec!["PORT".to_string(), "8080".to_string()]);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_single_row_table_diagnostic() {
        let (_, diags, _) = build_blocks("| orphan | row |\n");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("single row"));
    }

    #[test]
    fn test_blockquote_merging() {
        let (blocks, _, _) = build_blocks("> A CLI for widgets.\n> Fast and small.\n");
        match &blocks[0].kind {
            BlockKind::Blockquote { text } => {
                assert_eq!(text, "A CLI for widgets. Fast and small.")
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_empty_input() {
        let (blocks, diags, lines) = build_blocks("");
        assert!(blocks.is_empty());
        assert!(diags.is_empty());
        assert_eq!(lines, 0);
    }
}
