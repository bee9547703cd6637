//! Filename filter patterns
//!
//! A pattern is literal text with bracketed placeholders, e.g.
//! `js/[name].js`. Each placeholder matches one path segment fragment: one
//! or more characters, none of them `/`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Segment(String),
}

/// A compiled filename filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenamePattern {
    source: String,
    tokens: Vec<Token>,
}

impl FilenamePattern {
    /// Compile `pattern`. Brackets that do not enclose ASCII letters are
    /// taken literally.
    pub fn compile(pattern: &str) -> Self {
        let body = pattern.strip_prefix('/').unwrap_or(pattern);
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut rest = body;

        while let Some(open) = rest.find('[') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find(']') {
                Some(close)
                    if close > 0 && after[..close].chars().all(|c| c.is_ascii_alphabetic()) =>
                {
                    if !literal.is_empty() {
                        tokens.push(Token::Literal(std::mem::take(&mut literal)));
                    }
                    tokens.push(Token::Segment(after[..close].to_string()));
                    rest = &after[close + 1..];
                }
                _ => {
                    literal.push('[');
                    rest = after;
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        Self {
            source: pattern.to_string(),
            tokens,
        }
    }

    /// Whether `path` matches the whole pattern; a leading `/` is ignored
    pub fn is_match(&self, path: &str) -> bool {
        let path = path.strip_prefix('/').unwrap_or(path);
        match_tokens(&self.tokens, path)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Names of the placeholders, in order
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|token| match token {
            Token::Segment(name) => Some(name.as_str()),
            Token::Literal(_) => None,
        })
    }
}

fn match_tokens(tokens: &[Token], input: &str) -> bool {
    let Some((first, rest)) = tokens.split_first() else {
        return input.is_empty();
    };

    match first {
        Token::Literal(text) => input
            .strip_prefix(text.as_str())
            .is_some_and(|remaining| match_tokens(rest, remaining)),
        Token::Segment(_) => {
            // Longest segment fragment first, shrinking on failure.
            let limit = input.find('/').unwrap_or(input.len());
            input[..limit]
                .char_indices()
                .map(|(i, c)| i + c.len_utf8())
                .rev()
                .any(|end| match_tokens(rest, &input[end..]))
        }
    }
}

impl fmt::Display for FilenamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
