//! Path template compiler.
//!
//! Templates are compiled once, at registration time, into an anchored
//! regular expression plus the ordered list of parameter keys it captures.
//!
//! Supported syntax:
//!
//! | Template          | Captures                                          |
//! |-------------------|---------------------------------------------------|
//! | `/users/:id`      | `id`, one segment                                 |
//! | `/hello/:name?`   | `name`, optional together with its leading `/`   |
//! | `/files/:path*`   | `path`, zero or more segments                     |
//! | `/files/:path+`   | `path`, one or more segments                      |
//! | `/item/:id(\d+)`  | `id`, custom pattern                              |
//! | `/page/(\d+)`     | positional key `"0"`                              |
//! | `/static/*`       | positional key, the rest of the path              |
//!
//! Matching is case-insensitive, tolerates a trailing `/` and a trailing
//! query string, and percent-decodes captured values.

use std::collections::HashMap;
use std::fmt;

use percent_encoding::percent_decode_str;
use regex::Regex;

/// Parameters bound by a successful match.
pub type Params = HashMap<String, String>;

const DEFAULT_SEGMENT: &str = "[^/#?]+?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// `:` not followed by a parameter name
    MissingName { position: usize },
    /// `(` without its closing `)`
    UnbalancedGroup { position: usize },
    /// Custom patterns may not open capturing groups of their own
    NestedCapture { position: usize },
    /// The generated expression was rejected by the regex engine
    Regex(String),
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::MissingName { position } => {
                write!(f, "missing parameter name at {position}")
            }
            PatternError::UnbalancedGroup { position } => {
                write!(f, "unbalanced group starting at {position}")
            }
            PatternError::NestedCapture { position } => {
                write!(f, "capturing group inside pattern at {position}, use (?:...)")
            }
            PatternError::Regex(err) => write!(f, "invalid pattern: {err}"),
        }
    }
}

impl std::error::Error for PatternError {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Key {
    Named(String),
    Index(usize),
}

impl Key {
    fn as_param_name(&self) -> String {
        match self {
            Key::Named(name) => name.clone(),
            Key::Index(i) => i.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    One,
    Optional,
    ZeroOrMore,
    OneOrMore,
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    template: String,
    regex: Regex,
    keys: Vec<Key>,
}

impl PathMatcher {
    /// Compiles `template`.
    ///
    /// ```
    /// # use expresso::router::matcher::PathMatcher;
    /// let m = PathMatcher::compile("/users/:id").unwrap();
    /// let params = m.matches("/users/42/").unwrap();
    /// assert_eq!(params["id"], "42");
    /// assert!(m.matches("/posts/42/").is_none());
    /// ```
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let chars: Vec<char> = template.chars().collect();
        let mut source = String::from("(?i)^");
        let mut keys = Vec::new();
        let mut next_index = 0;
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                ':' => {
                    let start = i;
                    i += 1;
                    let name_len = chars[i..]
                        .iter()
                        .take_while(|c| c.is_ascii_alphanumeric() || **c == '_')
                        .count();
                    if name_len == 0 {
                        return Err(PatternError::MissingName { position: start });
                    }
                    let name: String = chars[i..i + name_len].iter().collect();
                    i += name_len;

                    let pattern = if chars.get(i) == Some(&'(') {
                        let (pattern, end) = read_group(&chars, i)?;
                        i = end;
                        pattern
                    } else {
                        DEFAULT_SEGMENT.to_string()
                    };
                    let modifier = read_modifier(&chars, &mut i);
                    let prefixed = take_trailing_slash(&mut source);
                    push_capture(&mut source, &pattern, modifier, prefixed);
                    keys.push(Key::Named(name));
                }
                '(' => {
                    let (pattern, end) = read_group(&chars, i)?;
                    i = end;
                    let modifier = read_modifier(&chars, &mut i);
                    let prefixed = take_trailing_slash(&mut source);
                    push_capture(&mut source, &pattern, modifier, prefixed);
                    keys.push(Key::Index(next_index));
                    next_index += 1;
                }
                '*' => {
                    i += 1;
                    source.push_str("(.*?)");
                    keys.push(Key::Index(next_index));
                    next_index += 1;
                }
                c => {
                    i += 1;
                    source.push_str(&regex::escape(&c.to_string()));
                }
            }
        }

        // Optional trailing slash, optional query string.
        source.push_str(r"/?(?:\?.*)?$");

        let regex = Regex::new(&source).map_err(|e| PatternError::Regex(e.to_string()))?;
        Ok(Self {
            template: template.to_string(),
            regex,
            keys,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Applies the matcher to a concrete path.
    ///
    /// Returns `None` when the path does not match. Optional captures that
    /// matched nothing are left out of the returned map.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let captures = self.regex.captures(path)?;
        let params = self
            .keys
            .iter()
            .enumerate()
            .filter_map(|(i, key)| {
                let value = captures.get(i + 1)?;
                let decoded = percent_decode_str(value.as_str()).decode_utf8_lossy();
                Some((key.as_param_name(), decoded.into_owned()))
            })
            .collect();
        Some(params)
    }
}

/// Reads `( ... )` starting at `open`, returning the inner pattern and the
/// index just past the closing parenthesis.
fn read_group(chars: &[char], open: usize) -> Result<(String, usize), PatternError> {
    let mut depth = 0;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '(' => {
                if depth > 0 && chars.get(i + 1) != Some(&'?') {
                    return Err(PatternError::NestedCapture { position: i });
                }
                depth += 1;
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    let pattern: String = chars[open + 1..i].iter().collect();
                    return Ok((pattern, i + 1));
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(PatternError::UnbalancedGroup { position: open })
}

fn read_modifier(chars: &[char], i: &mut usize) -> Modifier {
    let modifier = match chars.get(*i) {
        Some('?') => Modifier::Optional,
        Some('*') => Modifier::ZeroOrMore,
        Some('+') => Modifier::OneOrMore,
        _ => return Modifier::One,
    };
    *i += 1;
    modifier
}

/// Pulls a literal trailing `/` back out of the generated source so an
/// optional or repeated capture can own its separator.
fn take_trailing_slash(source: &mut String) -> bool {
    if source.ends_with('/') {
        source.pop();
        true
    } else {
        false
    }
}

fn push_capture(source: &mut String, pattern: &str, modifier: Modifier, prefixed: bool) {
    let prefix = if prefixed { "/" } else { "" };
    let repeated = format!("(?:{pattern})(?:{prefix}(?:{pattern}))*");
    let fragment = match modifier {
        Modifier::One => format!("{prefix}({pattern})"),
        Modifier::Optional => format!("(?:{prefix}({pattern}))?"),
        Modifier::ZeroOrMore => format!("(?:{prefix}({repeated}))?"),
        Modifier::OneOrMore => format!("{prefix}({repeated})"),
    };
    source.push_str(&fragment);
}
