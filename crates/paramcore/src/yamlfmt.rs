// Text-level YAML formatting. Descriptions never travel as a `desc:` key on
// the wire: the writer injects them as `#` comment blocks immediately before
// each entry's `dtype:` line, and the reader collects such blocks back into
// a single description string. Comment pairing is ordinal: the Nth dtype
// line belongs to the Nth leaf in document order.

use crate::doc::{self, DocNode, DocTree};
use crate::error::Result;
use crate::value::DType;

const DESC_WRAP: usize = 60;

pub fn write_document(tree: &DocTree) -> Result<String> {
    let text = serde_yaml::to_string(&doc::to_yaml(tree))?;
    let descs = leaf_descs(tree);
    Ok(inject_desc_comments(&text, &descs))
}

pub fn read_document(text: &str) -> Result<DocTree> {
    let value: serde_yaml::Value = serde_yaml::from_str(text)?;
    let mut tree = doc::from_yaml(&value)?;
    let comments = collect_comment_descs(text);
    apply_descs(&mut tree, &comments, &mut 0);
    Ok(tree)
}

fn leaf_descs(tree: &DocTree) -> Vec<String> {
    let mut out = Vec::new();
    collect_leaf_descs(tree, &mut out);
    out
}

fn collect_leaf_descs(tree: &DocTree, out: &mut Vec<String>) {
    for node in tree.values() {
        match node {
            DocNode::Leaf { desc, .. } => out.push(desc.clone()),
            DocNode::Scope(m) => collect_leaf_descs(m, out),
        }
    }
}

fn inject_desc_comments(text: &str, descs: &[String]) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut n = 0;
    for line in text.lines() {
        if let Some(indent) = dtype_line_indent(line) {
            if let Some(desc) = descs.get(n) {
                if !desc.is_empty() {
                    for chunk in wrap_words(desc, DESC_WRAP) {
                        out.push(format!("{indent}# {chunk}"));
                    }
                }
            }
            n += 1;
        }
        out.push(line.to_string());
    }
    let mut s = out.join("\n");
    s.push('\n');
    s
}

// leading whitespace of a `dtype: <tag>` line, None for anything else
fn dtype_line_indent(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let rest = trimmed.strip_prefix("dtype: ")?;
    DType::from_tag(rest.trim_end())?;
    Some(&line[..line.len() - trimmed.len()])
}

fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        if cur.is_empty() {
            cur.push_str(word);
        } else if cur.len() + 1 + word.len() <= width {
            cur.push(' ');
            cur.push_str(word);
        } else {
            lines.push(std::mem::take(&mut cur));
            cur.push_str(word);
        }
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}

// One slot per dtype line in file order: the joined comment block directly
// above it, if any.
fn collect_comment_descs(text: &str) -> Vec<Option<String>> {
    let mut out = Vec::new();
    let mut acc: Vec<String> = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix('#') {
            let rest = rest.strip_prefix(' ').unwrap_or(rest);
            acc.push(rest.trim_end().to_string());
            continue;
        }
        if dtype_line_indent(line).is_some() {
            if acc.iter().all(|s| s.is_empty()) {
                out.push(None);
            } else {
                out.push(Some(acc.join(" ")));
            }
        }
        acc.clear();
    }
    out
}

fn apply_descs(tree: &mut DocTree, comments: &[Option<String>], n: &mut usize) {
    for node in tree.values_mut() {
        match node {
            DocNode::Leaf { desc, .. } => {
                // the comment block wins over an explicit desc key
                if let Some(Some(c)) = comments.get(*n) {
                    *desc = c.clone();
                }
                *n += 1;
            }
            DocNode::Scope(m) => apply_descs(m, comments, n),
        }
    }
}
