//! Minimal SQL lexer.
//!
//! Splits SQL text into words, string literals, quoted identifiers, and
//! single-character punctuation. Comments are dropped. The lexer is lossless
//! apart from whitespace and comments: every token keeps its exact source
//! text plus a flag recording whether whitespace preceded it, so a token
//! stream can be rendered back to text with runs of whitespace collapsed.

use std::fmt;

/// Classification of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A run of alphanumeric characters or underscores (keywords,
    /// identifiers, and numbers alike).
    Word,
    /// A single-quoted string literal, quotes included.
    StringLiteral,
    /// A `"double"`, `` `backtick` `` or `[bracket]` quoted identifier.
    QuotedIdent,
    /// Any other single non-whitespace character.
    Punct,
    /// A literal or quoted identifier whose closing quote never appears; it
    /// runs to the end of input.
    Unterminated,
}

/// A token with its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Whether whitespace (or a comment) separated this token from the
    /// previous one.
    pub space_before: bool,
}

impl Token {
    fn new(kind: TokenKind, text: String, space_before: bool) -> Self {
        Self {
            kind,
            text,
            space_before,
        }
    }

    /// Returns `true` if this is the bare word `word`.
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Word && self.text == word
    }

    /// Returns `true` if this is the punctuation character `ch`.
    pub fn is_punct(&self, ch: char) -> bool {
        self.kind == TokenKind::Punct
            && self.text.len() == ch.len_utf8()
            && self.text.starts_with(ch)
    }

    /// Returns `true` for tokens that can name something: bare words and
    /// quoted identifiers.
    pub fn is_name(&self) -> bool {
        matches!(self.kind, TokenKind::Word | TokenKind::QuotedIdent)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) -> bool {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.position += rest.len() - trimmed.len();
        rest.len() != trimmed.len()
    }

    /// Skips a `--` or `/* */` comment at the cursor. Unterminated block
    /// comments run to the end of input.
    fn skip_comment(&mut self) -> bool {
        let rest = self.rest();
        if rest.starts_with("--") {
            let end = rest.find('\n').unwrap_or(rest.len());
            self.position += end;
            true
        } else if let Some(body) = rest.strip_prefix("/*") {
            let end = body.find("*/").map(|i| i + 4).unwrap_or(rest.len());
            self.position += end;
            true
        } else {
            false
        }
    }

    /// Consumes text up to and including `close`. A doubled `close` inside
    /// the quoted region is an escape when `doubled_escape` is set.
    /// Unterminated quotes run to the end of input and come back as
    /// [`TokenKind::Unterminated`].
    fn read_quoted(
        &mut self,
        kind: TokenKind,
        close: char,
        doubled_escape: bool,
    ) -> (TokenKind, String) {
        let start = self.position;
        let mut chars = self.rest().char_indices().skip(1).peekable();
        let mut end = None;
        while let Some((i, ch)) = chars.next() {
            if ch == close {
                if doubled_escape && chars.peek().is_some_and(|&(_, next)| next == close) {
                    chars.next();
                    continue;
                }
                end = Some(i + ch.len_utf8());
                break;
            }
        }
        let (kind, len) = match end {
            Some(len) => (kind, len),
            None => (TokenKind::Unterminated, self.rest().len()),
        };
        self.position += len;
        (kind, self.input[start..self.position].to_string())
    }

    fn read_word(&mut self) -> String {
        let rest = self.rest();
        let end = rest
            .char_indices()
            .find(|&(_, ch)| !is_word_char(ch))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.position += end;
        rest[..end].to_string()
    }

    fn next_token(&mut self) -> Option<Token> {
        let mut space_before = false;
        loop {
            space_before |= self.skip_whitespace();
            if self.skip_comment() {
                space_before = true;
            } else {
                break;
            }
        }

        let ch = self.peek()?;
        let (kind, text) = match ch {
            '\'' => self.read_quoted(TokenKind::StringLiteral, '\'', true),
            '"' => self.read_quoted(TokenKind::QuotedIdent, '"', true),
            '`' => self.read_quoted(TokenKind::QuotedIdent, '`', true),
            '[' => self.read_quoted(TokenKind::QuotedIdent, ']', false),
            _ if is_word_char(ch) => (TokenKind::Word, self.read_word()),
            _ => {
                self.position += ch.len_utf8();
                (TokenKind::Punct, ch.to_string())
            }
        };
        Some(Token::new(kind, text, space_before))
    }
}

/// Split SQL text into tokens. Never fails; malformed input (unterminated
/// quotes or comments) is consumed to the end of the string.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    std::iter::from_fn(|| lexer.next_token()).collect()
}

/// Render tokens back to text, separating tokens with a single space where
/// the source had whitespace. The first token's leading space is dropped.
pub fn render(tokens: &[Token]) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 && token.space_before {
            out.push(' ');
        }
        out.push_str(&token.text);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<String> {
        tokenize(input).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn simple_select() {
        let tokens = tokenize("SELECT * FROM users WHERE id = 1");
        assert!(tokens[0].is_word("SELECT"));
        assert!(tokens[1].is_punct('*'));
        assert!(tokens[2].is_word("FROM"));
        assert_eq!(tokens.len(), 8);
        assert!(!tokens[0].space_before);
        assert!(tokens[1].space_before);
    }

    #[test]
    fn string_literals_keep_quotes_and_escapes() {
        let tokens = tokenize("x = 'it''s as from'");
        assert_eq!(tokens[2].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[2].text, "'it''s as from'");
    }

    #[test]
    fn quoted_identifiers() {
        assert_eq!(
            texts(r#""Full Name" `tbl` [dbo].[x]"#),
            vec!["\"Full Name\"", "`tbl`", "[dbo]", ".", "[x]"]
        );
        assert!(tokenize("[a b]")[0].is_name());
    }

    #[test]
    fn unterminated_quote_runs_to_end() {
        let tokens = tokenize("select 'abc from t");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].kind, TokenKind::Unterminated);
        assert_eq!(tokens[1].text, "'abc from t");

        let tokens = tokenize("[open 'x'");
        assert_eq!(tokens.len(), 1);
        assert!(!tokens[0].is_name());
    }

    #[test]
    fn comments_act_as_whitespace() {
        let tokens = tokenize("select a--note\n,b/* x */c /* open");
        assert_eq!(
            texts("select a--note\n,b/* x */c /* open"),
            vec!["select", "a", ",", "b", "c"]
        );
        assert!(tokens[2].space_before);
        assert!(tokens[4].space_before);
    }

    #[test]
    fn operators_are_single_chars() {
        let tokens = tokenize("a<=b");
        assert_eq!(texts("a<=b"), vec!["a", "<", "=", "b"]);
        assert_eq!(render(&tokens), "a<=b");
    }

    #[test]
    fn render_collapses_whitespace() {
        let tokens = tokenize("  select\n\t a ,b   from  t  ");
        assert_eq!(render(&tokens), "select a ,b from t");
    }

    #[test]
    fn empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \n ").is_empty());
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn unicode_words() {
        assert_eq!(texts("sélect naïve_1"), vec!["sélect", "naïve_1"]);
    }
}
