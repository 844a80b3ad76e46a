//! Sample snippets, both as definitions and as snippet file contents.

use crate::snippet::text::append_lines;
use crate::snippet::{ArgRef, Lines, NodeDefinition as N, SnippetDefinition};

/// Concatenate every argument, joining the last line of one with the first of the next.
pub fn concat_lines(args: &[Lines]) -> anyhow::Result<Lines> {
    let mut out = Lines::new();
    for arg in args {
        if out.is_empty() {
            out = arg.clone();
        } else {
            append_lines(&mut out, arg);
        }
    }
    Ok(out)
}

/// `a -> a == a`: one insert mirrored by two function nodes.
pub fn arrow_definition() -> SnippetDefinition {
    SnippetDefinition::new(
        "arrow",
        vec![
            N::insert(1, "a"),
            N::text(" -> "),
            N::function([ArgRef::rel(1)], |args| Ok(args[0].clone())),
            N::text(" == "),
            N::function([ArgRef::rel(1)], |args| Ok(args[0].clone())),
        ],
    )
}

/// A function reading an insert that only exists in the second branch of a choice.
pub fn choice_definition() -> SnippetDefinition {
    SnippetDefinition::new(
        "choice",
        vec![
            N::insert(1, "cccc"),
            N::text(" "),
            N::choice(2, vec![N::text("aaaa"), N::branch_insert("bbbb")]),
            N::function([ArgRef::abs([2, 2]), ArgRef::rel(1)], concat_lines),
        ],
    )
}

/// Test fixture for snippet file contents
#[derive(Clone, Debug)]
pub struct SnippetFixture {
    pub name: String,
    pub content: String,
}

impl SnippetFixture {
    /// The arrow snippet written with the `copy` transform.
    pub fn arrow() -> Self {
        Self {
            name: "arrow".to_string(),
            content: r#"
[[snippet]]
trigger = "arrow"
description = "mirrored tabstop"
nodes = [
    { type = "insert", index = 1, text = "a" },
    { type = "text", text = " -> " },
    { type = "function", transform = "copy", args = [1] },
    { type = "text", text = " == " },
    { type = "function", transform = "copy", args = [1] },
]
"#
            .trim()
            .to_string(),
        }
    }

    /// The choice snippet written with the `concat` transform.
    pub fn choice() -> Self {
        Self {
            name: "choice".to_string(),
            content: r#"
[[snippet]]
trigger = "choice"
nodes = [
    { type = "insert", index = 1, text = "cccc" },
    { type = "text", text = " " },
    { type = "choice", index = 2, branches = [
        { type = "text", text = "aaaa" },
        { type = "insert", text = "bbbb" },
    ] },
    { type = "function", transform = "concat", args = [[2, 2], 1] },
]
"#
            .trim()
            .to_string(),
        }
    }

    /// A nested snippet whose function reads both its own and the outer tabstop 1.
    pub fn nested() -> Self {
        Self {
            name: "nested".to_string(),
            content: r#"
[[snippet]]
trigger = "nested"
nodes = [
    { type = "insert", index = 1, text = "outer" },
    { type = "text", text = "(" },
    { type = "snippet", index = 2, nodes = [
        { type = "insert", index = 1, text = "inner" },
        { type = "text", text = ":" },
        { type = "function", transform = "join", separator = "/", args = [1, "1"] },
    ] },
    { type = "text", text = ")" },
]
"#
            .trim()
            .to_string(),
        }
    }

    /// Several snippets in one file, one of them broken.
    pub fn mixed() -> Self {
        let content = format!(
            "{}\n\n{}\n\n{}",
            Self::arrow().content,
            Self::choice().content,
            r#"
[[snippet]]
trigger = "broken"
nodes = [
    { type = "function", transform = "copy", args = [7] },
]
"#
            .trim()
        );
        Self {
            name: "mixed".to_string(),
            content,
        }
    }

    /// A file that is not valid TOML.
    pub fn invalid_syntax() -> Self {
        Self {
            name: "invalid".to_string(),
            content: "[[snippet]\ntrigger = ".to_string(),
        }
    }
}
