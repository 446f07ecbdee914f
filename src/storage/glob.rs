//! Glob matching for the KEYS command.
//!
//! Patterns are anchored: they must match the whole key.
//!
//! - `*` matches zero or more characters
//! - `?` matches exactly one character
//! - `[ae]`, `[a-z]`, `[^x]` match one character from (or not from) a class
//! - `\x` matches `x` literally
//!
//! Matching works on `char`s, so `?` consumes one Unicode scalar, not one byte.

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: Vec<char>,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.chars().collect(),
        }
    }

    /// Returns true if `text` matches the whole pattern.
    ///
    /// Runs in O(pattern × text): on a mismatch only the most recent `*` is
    /// retried, one character further along the text.
    pub fn matches(&self, text: &str) -> bool {
        let text: Vec<char> = text.chars().collect();
        let pattern = self.pattern.as_slice();

        let (mut p, mut t) = (0, 0);
        // Pattern position after the last `*`, and the text position it
        // currently absorbs up to.
        let mut star: Option<(usize, usize)> = None;

        while t < text.len() {
            if pattern.get(p) == Some(&'*') {
                while pattern.get(p) == Some(&'*') {
                    p += 1;
                }
                star = Some((p, t));
                continue;
            }

            if let Some(width) = match_one(&pattern[p..], text[t]) {
                p += width;
                t += 1;
                continue;
            }

            match star {
                Some((after_star, absorbed)) => {
                    p = after_star;
                    t = absorbed + 1;
                    star = Some((after_star, t));
                }
                None => return false,
            }
        }

        pattern[p..].iter().all(|&c| c == '*')
    }
}

/// Matches one text character against the token at the start of `pattern`.
///
/// Returns how many pattern characters the token spans, or `None` if it does
/// not match (or the pattern is exhausted).
fn match_one(pattern: &[char], c: char) -> Option<usize> {
    let (&first, rest) = pattern.split_first()?;
    match first {
        '?' => Some(1),
        '[' => match match_class(rest, c)? {
            (true, after) => Some(pattern.len() - after.len()),
            (false, _) => None,
        },
        '\\' if !rest.is_empty() => (rest[0] == c).then_some(2),
        literal => (literal == c).then_some(1),
    }
}

/// Matches `c` against the class body that follows `[`.
///
/// Returns whether `c` is in the class and the pattern after the closing `]`,
/// or `None` if the class is never closed (which then matches nothing).
fn match_class(body: &[char], c: char) -> Option<(bool, &[char])> {
    let mut i = 0;
    let negate = body.first() == Some(&'^');
    if negate {
        i += 1;
    }

    let mut matched = false;
    while i < body.len() && body[i] != ']' {
        if body[i] == '\\' && i + 1 < body.len() {
            i += 1;
            if body[i] == c {
                matched = true;
            }
        } else if i + 2 < body.len() && body[i + 1] == '-' && body[i + 2] != ']' {
            let (lo, hi) = if body[i] <= body[i + 2] {
                (body[i], body[i + 2])
            } else {
                (body[i + 2], body[i])
            };
            if (lo..=hi).contains(&c) {
                matched = true;
            }
            i += 2;
        } else if body[i] == c {
            matched = true;
        }
        i += 1;
    }

    if i >= body.len() {
        return None;
    }

    Some((matched != negate, &body[i + 1..]))
}
