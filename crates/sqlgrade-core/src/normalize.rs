//! SQL answer normalization.
//!
//! Canonicalizes a SQL string so that superficial differences between a
//! candidate answer and a reference solution (letter case, whitespace,
//! `AS` aliases, single-word table aliases, SELECT column order, trailing
//! terminators) disappear. This is a heuristic over a token stream, not a
//! parser: it never fails and never validates its input.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lexer::{render, tokenize, Token, TokenKind};

/// Clause keywords that can never be a table alias or an `AS` target.
const RESERVED: &[&str] = &[
    "as",
    "cross",
    "except",
    "fetch",
    "for",
    "from",
    "full",
    "group",
    "having",
    "inner",
    "intersect",
    "into",
    "join",
    "left",
    "limit",
    "natural",
    "offset",
    "on",
    "order",
    "outer",
    "right",
    "select",
    "union",
    "using",
    "where",
    "window",
];

fn is_reserved(token: &Token) -> bool {
    token.kind == TokenKind::Word && RESERVED.contains(&token.text.as_str())
}

/// The canonical form of a SQL string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedSql(String);

impl NormalizedSql {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NormalizedSql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedSql {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize a raw SQL string.
///
/// Steps, in order:
/// 1. lowercase everything (string literals included);
/// 2. drop comments and collapse whitespace runs to one space, inside
///    string literals and quoted identifiers too;
/// 3. remove `AS <name>` aliases;
/// 4. remove a single-word alias after `FROM <table>`;
/// 5. drop trailing `;` terminators;
/// 6. for statements starting with `SELECT`, sort the select-list entries.
///
/// Reordering is skipped when the input contains an unterminated quote,
/// since moving such a token would change how the text re-lexes.
///
/// Stripping only ever matches whole tokens, so text inside string literals
/// and quoted identifiers is never altered beyond case folding and
/// whitespace collapsing.
pub fn normalize(raw: &str) -> NormalizedSql {
    let lowered = raw.to_lowercase();
    let mut tokens = tokenize(&lowered);
    for token in &mut tokens {
        if token.kind != TokenKind::Word && token.kind != TokenKind::Punct {
            token.text = collapse_whitespace(&token.text);
        }
    }

    // One removal can expose another (`as as x`), so strip to a fixpoint.
    loop {
        let before = tokens.len();
        tokens = strip_from_aliases(strip_as_aliases(tokens));
        strip_terminators(&mut tokens);
        if tokens.len() == before {
            break;
        }
    }

    let reorderable = tokens.first().is_some_and(|t| t.is_word("select"))
        && !tokens.iter().any(|t| t.kind == TokenKind::Unterminated);
    let text = if reorderable {
        reorder_select_list(&tokens)
    } else {
        render(&tokens)
    };
    NormalizedSql(text)
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

/// Removes `as <name>` pairs. The token following a removed pair is marked
/// as space-separated so neighbours can never fuse into a new token.
fn strip_as_aliases(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter().peekable();
    let mut removed = false;

    while let Some(mut token) = iter.next() {
        if token.is_word("as")
            && iter
                .peek()
                .is_some_and(|next| next.is_name() && !is_reserved(next))
        {
            iter.next();
            removed = true;
            continue;
        }
        if removed {
            token.space_before = true;
            removed = false;
        }
        out.push(token);
    }
    out
}

/// Length of a possibly qualified name (`t`, `dbo.t`, `[db].[t]`) starting
/// at `start`, in tokens.
fn qualified_name_len(tokens: &[Token], start: usize) -> usize {
    if !tokens.get(start).is_some_and(Token::is_name) {
        return 0;
    }
    let mut len = 1;
    while tokens.get(start + len).is_some_and(|t| t.is_punct('.'))
        && tokens.get(start + len + 1).is_some_and(Token::is_name)
    {
        len += 2;
    }
    len
}

/// Removes `x` from every `from <table> x` where `x` is a plain word, not a
/// clause keyword, and is followed by the end of input, punctuation other
/// than `.`, or a clause keyword.
fn strip_from_aliases(tokens: Vec<Token>) -> Vec<Token> {
    let mut aliases = vec![false; tokens.len()];
    let mut i = 0;

    while i < tokens.len() {
        if !tokens[i].is_word("from") {
            i += 1;
            continue;
        }
        let table_len = qualified_name_len(&tokens, i + 1);
        if table_len == 0 {
            i += 1;
            continue;
        }
        let alias = i + 1 + table_len;
        let is_alias = tokens
            .get(alias)
            .is_some_and(|t| t.kind == TokenKind::Word && !is_reserved(t));
        let at_boundary = match tokens.get(alias + 1) {
            None => true,
            Some(next) => {
                (next.kind == TokenKind::Punct && !next.is_punct('.')) || is_reserved(next)
            }
        };
        if is_alias && at_boundary {
            aliases[alias] = true;
        }
        i = alias;
    }

    tokens
        .into_iter()
        .zip(aliases)
        .filter_map(|(token, is_alias)| (!is_alias).then_some(token))
        .collect()
}

fn strip_terminators(tokens: &mut Vec<Token>) {
    while tokens.last().is_some_and(|t| t.is_punct(';')) {
        tokens.pop();
    }
}

/// Number of leading select-modifier tokens (`distinct`, `all`, `top <n>`)
/// at the start of `tokens`.
fn modifier_len(tokens: &[Token]) -> usize {
    match tokens.first() {
        Some(t) if t.is_word("distinct") || t.is_word("all") => 1,
        Some(t) if t.is_word("top") => {
            let counted = tokens.get(1).is_some_and(|n| {
                n.kind == TokenKind::Word && n.text.starts_with(|c: char| c.is_ascii_digit())
            });
            if counted {
                2
            } else {
                0
            }
        }
        _ => 0,
    }
}

/// Sorts the select list of a statement that starts with `select`.
///
/// The select list runs up to the first `from` (or `;`) outside
/// parentheses and is split on commas outside parentheses. Leading
/// modifiers stay in front. Entries that themselves start with a modifier
/// word sort after the others so they can never be mistaken for the
/// statement's own modifiers.
fn reorder_select_list(tokens: &[Token]) -> String {
    let mut start = 1;
    let mut modifiers = Vec::new();
    loop {
        let len = modifier_len(&tokens[start..]);
        if len == 0 {
            break;
        }
        modifiers.push(render(&tokens[start..start + len]));
        start += len;
    }

    let mut depth = 0usize;
    let mut end = tokens.len();
    let mut columns: Vec<&[Token]> = Vec::new();
    let mut column_start = start;
    for (offset, token) in tokens[start..].iter().enumerate() {
        let i = start + offset;
        if token.is_punct('(') {
            depth += 1;
        } else if token.is_punct(')') {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && (token.is_word("from") || token.is_punct(';')) {
            end = i;
            break;
        } else if depth == 0 && token.is_punct(',') {
            columns.push(&tokens[column_start..i]);
            column_start = i + 1;
        }
    }
    columns.push(&tokens[column_start..end]);

    let mut columns: Vec<(bool, String)> = columns
        .into_iter()
        .map(|column| (modifier_len(column) > 0, render(column)))
        .collect();
    columns.sort();

    let list = columns
        .into_iter()
        .map(|(_, text)| text)
        .collect::<Vec<_>>()
        .join(", ");
    let remainder = render(&tokens[end..]);

    let mut parts = vec!["select".to_string()];
    parts.extend(modifiers);
    parts.push(list);
    parts.push(remainder);
    parts.retain(|p| !p.is_empty());
    parts.join(" ")
}
