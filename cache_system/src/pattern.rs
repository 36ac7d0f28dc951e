//! Glob matching for bulk cache invalidation
//!
//! Supported syntax: `*` (any run, including empty), `?` (exactly one
//! character), `[abc]`, `[a-z]`, `[!a]` / `[^a]` classes and `\` escapes.
//! Everything else is literal.

use crate::errors::CacheError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyChar,
    AnyRun,
    Class {
        negated: bool,
        ranges: Vec<(char, char)>,
    },
}

impl Token {
    fn matches_char(&self, c: char) -> bool {
        match self {
            Token::Literal(l) => *l == c,
            Token::AnyChar => true,
            Token::AnyRun => false,
            Token::Class { negated, ranges } => {
                let hit = ranges.iter().any(|(lo, hi)| *lo <= c && c <= *hi);
                hit != *negated
            }
        }
    }

    fn is_wildcard(&self) -> bool {
        !matches!(self, Token::Literal(_))
    }
}

/// A parsed glob pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    tokens: Vec<Token>,
}

impl Pattern {
    /// Strict parse; unclosed classes, empty classes, inverted ranges and a
    /// trailing escape are rejected.
    pub fn parse(pattern: &str) -> Result<Self, CacheError> {
        let chars: Vec<char> = pattern.chars().collect();
        let mut tokens = Vec::with_capacity(chars.len());
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            i += 1;
            match c {
                '*' => {
                    // Collapse runs of stars, they are equivalent to one
                    if tokens.last() != Some(&Token::AnyRun) {
                        tokens.push(Token::AnyRun);
                    }
                }
                '?' => tokens.push(Token::AnyChar),
                '\\' => {
                    let escaped = chars.get(i).copied().ok_or_else(|| {
                        CacheError::invalid_pattern(pattern, "trailing escape character")
                    })?;
                    i += 1;
                    tokens.push(Token::Literal(escaped));
                }
                '[' => {
                    let (class, next) = parse_class(pattern, &chars, i)?;
                    tokens.push(class);
                    i = next;
                }
                other => tokens.push(Token::Literal(other)),
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            tokens,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True when the pattern contains no wildcard and names exactly one key
    pub fn is_literal(&self) -> bool {
        !self.tokens.iter().any(Token::is_wildcard)
    }

    /// The key a literal pattern names, with escapes resolved
    pub fn literal_key(&self) -> Option<String> {
        if !self.is_literal() {
            return None;
        }
        Some(
            self.tokens
                .iter()
                .filter_map(|t| match t {
                    Token::Literal(c) => Some(*c),
                    _ => None,
                })
                .collect(),
        )
    }

    /// Match `key` against the pattern. The empty pattern matches nothing.
    pub fn is_match(&self, key: &str) -> bool {
        if self.tokens.is_empty() {
            return false;
        }

        let text: Vec<char> = key.chars().collect();
        let (mut t, mut p) = (0usize, 0usize);
        // Token index after the most recent star, and the text position it
        // is currently assumed to have consumed up to.
        let mut star: Option<(usize, usize)> = None;

        while t < text.len() {
            match self.tokens.get(p) {
                Some(Token::AnyRun) => {
                    p += 1;
                    star = Some((p, t));
                    continue;
                }
                Some(token) if token.matches_char(text[t]) => {
                    p += 1;
                    t += 1;
                    continue;
                }
                _ => {}
            }

            match star {
                Some((after_star, consumed)) => {
                    p = after_star;
                    t = consumed + 1;
                    star = Some((after_star, consumed + 1));
                }
                None => return false,
            }
        }

        self.tokens[p..].iter().all(|t| *t == Token::AnyRun)
    }
}

fn parse_class(pattern: &str, chars: &[char], start: usize) -> Result<(Token, usize), CacheError> {
    let unclosed = || CacheError::invalid_pattern(pattern, "unclosed character class");
    let mut i = start;
    let negated = matches!(chars.get(i), Some('!' | '^'));
    if negated {
        i += 1;
    }

    let mut ranges = Vec::new();
    loop {
        let c = *chars.get(i).ok_or_else(unclosed)?;
        i += 1;
        let lo = match c {
            ']' if ranges.is_empty() => {
                return Err(CacheError::invalid_pattern(pattern, "empty character class"));
            }
            ']' => break,
            '\\' => {
                let escaped = *chars.get(i).ok_or_else(unclosed)?;
                i += 1;
                escaped
            }
            other => other,
        };

        let is_range = chars.get(i) == Some(&'-') && chars.get(i + 1).is_some_and(|c| *c != ']');
        if is_range {
            let mut hi = chars[i + 1];
            i += 2;
            if hi == '\\' {
                hi = *chars.get(i).ok_or_else(unclosed)?;
                i += 1;
            }
            if hi < lo {
                return Err(CacheError::invalid_pattern(pattern, "inverted character range"));
            }
            ranges.push((lo, hi));
        } else {
            ranges.push((lo, lo));
        }
    }

    Ok((Token::Class { negated, ranges }, i))
}

/// Total matching function: never fails. A pattern that does not parse is
/// compared to the key as a plain string.
pub fn matches(key: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }
    match Pattern::parse(pattern) {
        Ok(compiled) => compiled.is_match(key),
        Err(_) => key == pattern,
    }
}

/// Escape glob metacharacters so `value` matches only itself
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
