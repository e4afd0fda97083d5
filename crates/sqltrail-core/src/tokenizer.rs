//! Token-tree construction on top of the `sqlparser` lexer.
//!
//! The dependency extractor does not consume `sqlparser`'s flat token stream
//! directly. It walks a small hierarchical token tree in which parenthesized
//! runs and CTE definition lists are grouped, comments are first-class, and
//! keywords carry a normalized (upper-cased, whitespace-collapsed) form.
//! Any tokenizer producing this shape is substitutable; this module is the
//! default implementation.

use crate::error::TokenizeError;
use crate::types::Dialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer, Whitespace};
use std::fmt;

/// One node of the statement token tree.
///
/// Grouping is intentionally shallow: only parenthesized runs and CTE
/// definition lists become [`SqlToken::Group`]. Dotted names stay flat; the
/// extractor reassembles them by raw-text accumulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlToken {
    /// An unquoted SQL keyword. `normalized` is upper-cased, with interior
    /// whitespace collapsed to single spaces (`LEFT  OUTER JOIN` becomes
    /// `LEFT OUTER JOIN`).
    Keyword { text: String, normalized: String },
    /// Any other atomic token: identifiers, literals, operators,
    /// punctuation. Carries the raw source text, quoting included.
    Word(String),
    /// Spaces, tabs and newlines.
    Whitespace(String),
    /// Line or block comment, raw text included.
    Comment(String),
    /// An ordered run of child tokens: a parenthesized subquery (first
    /// child is the `(` word) or a CTE definition list.
    Group(Vec<SqlToken>),
}

impl SqlToken {
    /// True for a group whose raw text begins with `(`.
    pub fn is_parenthesized(&self) -> bool {
        match self {
            SqlToken::Group(children) => {
                matches!(children.first(), Some(SqlToken::Word(w)) if w == "(")
            }
            _ => false,
        }
    }
}

impl fmt::Display for SqlToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlToken::Keyword { text, .. } => f.write_str(text),
            SqlToken::Word(text)
            | SqlToken::Whitespace(text)
            | SqlToken::Comment(text) => f.write_str(text),
            SqlToken::Group(children) => {
                for child in children {
                    write!(f, "{child}")?;
                }
                Ok(())
            }
        }
    }
}

/// Tokenizes one statement into a token tree.
pub fn tokenize(sql: &str, dialect: Dialect) -> Result<Vec<SqlToken>, TokenizeError> {
    let sqlparser_dialect = dialect.to_sqlparser_dialect();
    let raw = Tokenizer::new(sqlparser_dialect.as_ref(), sql).tokenize()?;
    let flat = flatten(raw);
    Ok(TreeBuilder { flat, pos: 0 }.build())
}

/// Maps `sqlparser` tokens onto flat [`SqlToken`]s: comments split out of
/// whitespace, keywords normalized, join phrases merged.
fn flatten(raw: Vec<Token>) -> Vec<SqlToken> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < raw.len() {
        match &raw[i] {
            Token::EOF => i += 1,
            Token::Whitespace(ws) => {
                out.push(convert_whitespace(ws));
                i += 1;
            }
            Token::Word(word) if is_keyword(word) => {
                if let Some((token, consumed)) = merge_join_phrase(&raw, i) {
                    out.push(token);
                    i += consumed;
                } else {
                    out.push(SqlToken::Keyword {
                        text: raw[i].to_string(),
                        normalized: word.value.to_uppercase(),
                    });
                    i += 1;
                }
            }
            other => {
                out.push(SqlToken::Word(other.to_string()));
                i += 1;
            }
        }
    }
    out
}

fn convert_whitespace(ws: &Whitespace) -> SqlToken {
    match ws {
        Whitespace::SingleLineComment { .. } | Whitespace::MultiLineComment(_) => {
            SqlToken::Comment(ws.to_string())
        }
        _ => SqlToken::Whitespace(ws.to_string()),
    }
}

fn is_keyword(word: &sqlparser::tokenizer::Word) -> bool {
    word.quote_style.is_none() && word.keyword != Keyword::NoKeyword
}

fn is_join_modifier(keyword: Keyword) -> bool {
    matches!(
        keyword,
        Keyword::LEFT
            | Keyword::RIGHT
            | Keyword::FULL
            | Keyword::INNER
            | Keyword::OUTER
            | Keyword::CROSS
            | Keyword::NATURAL
    )
}

/// Merges `[modifier]* JOIN` keyword runs into one keyword token so the
/// extractor can match on the whole phrase. Returns the merged token and the
/// number of raw tokens consumed, or `None` when the run at `start` is not a
/// join phrase.
fn merge_join_phrase(raw: &[Token], start: usize) -> Option<(SqlToken, usize)> {
    let mut words: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut i = start;
    loop {
        match raw.get(i) {
            Some(token @ Token::Word(word)) if is_keyword(word) => {
                if word.keyword == Keyword::JOIN {
                    words.push(word.value.to_uppercase());
                    text.push_str(&token.to_string());
                    return Some((
                        SqlToken::Keyword {
                            text,
                            normalized: words.join(" "),
                        },
                        i + 1 - start,
                    ));
                }
                if !is_join_modifier(word.keyword) {
                    return None;
                }
                words.push(word.value.to_uppercase());
                text.push_str(&token.to_string());
                i += 1;
            }
            Some(Token::Whitespace(ws)) if !is_comment(ws) && !words.is_empty() => {
                text.push_str(&ws.to_string());
                i += 1;
            }
            _ => return None,
        }
    }
}

fn is_comment(ws: &Whitespace) -> bool {
    matches!(
        ws,
        Whitespace::SingleLineComment { .. } | Whitespace::MultiLineComment(_)
    )
}

/// Structures a flat token run into a tree: parenthesized groups plus CTE
/// definition-list groups after `WITH`.
struct TreeBuilder {
    flat: Vec<SqlToken>,
    pos: usize,
}

impl TreeBuilder {
    fn build(mut self) -> Vec<SqlToken> {
        let mut out = Vec::new();
        while self.pos < self.flat.len() {
            self.step(&mut out);
        }
        out
    }

    /// Consumes one node at the cursor, appending it (and, after `WITH`,
    /// the grouped CTE definition list) to `out`.
    fn step(&mut self, out: &mut Vec<SqlToken>) {
        if self.at_word("(") {
            let group = self.group();
            out.push(group);
        } else if self.at_keyword("WITH") {
            out.push(self.advance());
            self.cte_list(out);
        } else {
            out.push(self.advance());
        }
    }

    /// Consumes a parenthesized run, `(` and `)` included, recursing for
    /// nested parentheses and `WITH` clauses. An unbalanced `(` swallows the
    /// rest of the statement; that can only under-extract, never fail.
    fn group(&mut self) -> SqlToken {
        let mut children = vec![self.advance()];
        while self.pos < self.flat.len() {
            if self.at_word(")") {
                children.push(self.advance());
                break;
            }
            self.step(&mut children);
        }
        SqlToken::Group(children)
    }

    /// After a `WITH` keyword: passes layout and an optional `RECURSIVE`
    /// through verbatim, then tries to shape the comma-separated CTE
    /// definitions into one group whose immediate children are per-CTE
    /// groups, each led by the CTE name token. Token runs that do not look
    /// like a CTE list are left ungrouped.
    fn cte_list(&mut self, out: &mut Vec<SqlToken>) {
        loop {
            if self.at_layout() || self.at_keyword("RECURSIVE") {
                out.push(self.advance());
            } else {
                break;
            }
        }
        let start = self.pos;
        match self.cte_definitions() {
            Some(children) => out.push(SqlToken::Group(children)),
            None => self.pos = start,
        }
    }

    fn cte_definitions(&mut self) -> Option<Vec<SqlToken>> {
        let mut children = Vec::new();
        loop {
            children.push(self.cte_definition()?);
            // Only a comma (past layout) continues the list.
            let mark = self.pos;
            let mut layout = Vec::new();
            self.take_layout(&mut layout);
            if self.at_word(",") {
                children.extend(layout);
                children.push(self.advance());
                self.take_layout(&mut children);
            } else {
                self.pos = mark;
                return Some(children);
            }
        }
    }

    /// One `name [ ( columns ) ] AS ( body )` definition.
    fn cte_definition(&mut self) -> Option<SqlToken> {
        let mut children = Vec::new();
        // Unreserved keywords are legal CTE names, so keyword tokens other
        // than AS are accepted here.
        let name_ok = match self.flat.get(self.pos) {
            Some(SqlToken::Word(w)) => is_identifier(w),
            Some(SqlToken::Keyword { normalized, .. }) => normalized != "AS",
            _ => false,
        };
        if !name_ok {
            return None;
        }
        children.push(self.advance());
        self.take_layout(&mut children);
        if self.at_word("(") {
            children.push(self.group());
            self.take_layout(&mut children);
        }
        if !self.at_keyword("AS") {
            return None;
        }
        children.push(self.advance());
        self.take_layout(&mut children);
        if !self.at_word("(") {
            return None;
        }
        children.push(self.group());
        Some(SqlToken::Group(children))
    }

    fn take_layout(&mut self, children: &mut Vec<SqlToken>) {
        while self.at_layout() {
            children.push(self.advance());
        }
    }

    fn advance(&mut self) -> SqlToken {
        let token = self.flat[self.pos].clone();
        self.pos += 1;
        token
    }

    fn at_word(&self, text: &str) -> bool {
        matches!(self.flat.get(self.pos), Some(SqlToken::Word(w)) if w == text)
    }

    fn at_keyword(&self, target: &str) -> bool {
        matches!(
            self.flat.get(self.pos),
            Some(SqlToken::Keyword { normalized, .. }) if normalized == target
        )
    }

    fn at_layout(&self) -> bool {
        matches!(
            self.flat.get(self.pos),
            Some(SqlToken::Whitespace(_) | SqlToken::Comment(_))
        )
    }
}

fn is_identifier(text: &str) -> bool {
    text.starts_with('"')
        || text
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
}
