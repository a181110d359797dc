//! Snippet axis: every verbatim-delimited block is parsed as Python,
//! whether or not it is the designated executable fragment. Syntax failures
//! are accumulated as data, never raised.

use anyhow::{Context, Result};
use regex::Regex;
use std::sync::LazyLock;
use tree_sitter::{Node, Parser};

use quizforge_common::{SnippetMetrics, SyntaxIssue};

static CODE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\begin\{verbatim\}(.*?)\\end\{verbatim\}").unwrap());

/// All verbatim block bodies, in document order.
pub fn verbatim_blocks(text: &str) -> Vec<&str> {
    CODE_BLOCK_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Parse every verbatim block as Python and record per-block syntax issues.
pub fn scan(text: &str) -> Result<SnippetMetrics> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .context("Failed to load Python grammar")?;

    let blocks = verbatim_blocks(text);
    let mut valid_blocks = 0;
    let mut invalid_blocks = 0;
    let mut issues = Vec::new();

    for (index, block) in blocks.iter().enumerate() {
        let code = block.trim();
        match first_syntax_issue(&mut parser, code) {
            None => valid_blocks += 1,
            Some((line, message)) => {
                invalid_blocks += 1;
                issues.push(SyntaxIssue {
                    block: index + 1,
                    line,
                    message,
                });
            }
        }
    }

    let blocks_found = blocks.len();
    Ok(SnippetMetrics {
        blocks_found,
        valid_blocks,
        invalid_blocks,
        issues,
        ok: blocks_found > 0 && invalid_blocks == 0,
    })
}

/// First syntax problem in `code`, as (1-based line, message), or None when
/// the block parses cleanly.
fn first_syntax_issue(parser: &mut Parser, code: &str) -> Option<(Option<usize>, String)> {
    let tree = match parser.parse(code, None) {
        Some(tree) => tree,
        None => return Some((None, "parser produced no tree".to_string())),
    };
    let root = tree.root_node();
    if !root.has_error() {
        return None;
    }
    match find_error_node(root) {
        Some(node) => {
            let line = node.start_position().row + 1;
            let message = if node.is_missing() {
                format!("missing {}", node.kind())
            } else {
                "invalid syntax".to_string()
            };
            Some((Some(line), message))
        }
        None => Some((None, "invalid syntax".to_string())),
    }
}

fn find_error_node(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(find_error_node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(code: &str) -> String {
        format!("\\begin{{verbatim}}\n{code}\n\\end{{verbatim}}")
    }

    #[test]
    fn valid_python_block_is_ok() {
        let text = wrap("class Student:\n    def __init__(self, name):\n        self.name = name");
        let metrics = scan(&text).unwrap();
        assert_eq!(metrics.blocks_found, 1);
        assert_eq!(metrics.valid_blocks, 1);
        assert!(metrics.ok);
        assert!(metrics.issues.is_empty());
    }

    #[test]
    fn broken_block_records_an_issue_with_a_line() {
        let text = wrap("x = 1\nclass Student(\n    pass");
        let metrics = scan(&text).unwrap();
        assert_eq!(metrics.invalid_blocks, 1);
        assert!(!metrics.ok);
        let issue = &metrics.issues[0];
        assert_eq!(issue.block, 1);
        assert!(issue.line.is_some());
    }

    #[test]
    fn no_blocks_means_not_ok() {
        let metrics = scan("prose without any code").unwrap();
        assert_eq!(metrics.blocks_found, 0);
        assert!(!metrics.ok);
    }

    #[test]
    fn one_bad_block_spoils_the_axis() {
        let text = format!("{}\n{}", wrap("x = 1"), wrap("def broken(:"));
        let metrics = scan(&text).unwrap();
        assert_eq!(metrics.blocks_found, 2);
        assert_eq!(metrics.valid_blocks, 1);
        assert_eq!(metrics.invalid_blocks, 1);
        assert!(!metrics.ok);
        assert_eq!(metrics.issues[0].block, 2);
    }
}
