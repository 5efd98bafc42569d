/*
 * directives.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Scanner for LaTeX control sequences with a braced argument.
 */

//! Directive scanning.
//!
//! A directive is a control sequence from a known set followed by an optional
//! `*`, up to a fixed number of `[...]` optional arguments, and one mandatory
//! `{...}` argument:
//!
//! ```text
//! \includegraphics[width=\linewidth]{figures/plot.pdf}
//! ^start           ^optional         ^arg_open        ^end
//! ```
//!
//! Directives on a line after an unescaped `%` are comments and never match.
//! Every rewrite pass in this crate is a loop over [`find_directive`] that
//! splices a replacement and resumes scanning after it.

use std::ops::Range;

/// Which control sequences a pass looks for.
#[derive(Debug, Clone, Copy)]
pub struct DirectiveSpec {
    /// Names without the backslash, matched exactly (`cite` does not match
    /// `citep`).
    pub names: &'static [&'static str],
    pub max_optional: usize,
}

impl DirectiveSpec {
    pub const fn new(names: &'static [&'static str], max_optional: usize) -> Self {
        Self {
            names,
            max_optional,
        }
    }

    fn matches(&self, name: &str) -> bool {
        self.names.contains(&name)
    }
}

/// One directive occurrence, as byte offsets into the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub starred: bool,
    /// Offset of the backslash.
    pub start: usize,
    /// Offset of the `{` opening the mandatory argument.
    pub arg_open: usize,
    /// The mandatory argument without its braces.
    pub arg: Range<usize>,
    /// One past the closing `}`.
    pub end: usize,
}

impl Directive {
    /// Everything before the mandatory argument: name, star, optional args.
    pub fn head<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start..self.arg_open]
    }

    pub fn argument<'t>(&self, text: &'t str) -> &'t str {
        &text[self.arg.clone()]
    }

    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The directive with its mandatory argument replaced.
    pub fn with_argument(&self, text: &str, argument: &str) -> String {
        format!("{}{{{}}}", self.head(text), argument)
    }
}

/// First directive matching `spec` at or after byte offset `from`.
pub fn find_directive(text: &str, from: usize, spec: &DirectiveSpec) -> Option<Directive> {
    let bytes = text.as_bytes();
    let mut i = from;

    while i < bytes.len() {
        if bytes[i] != b'\\' {
            i += 1;
            continue;
        }

        let name_start = i + 1;
        let mut name_end = name_start;
        while name_end < bytes.len() && bytes[name_end].is_ascii_alphabetic() {
            name_end += 1;
        }
        if name_end == name_start {
            // `\\`, `\%`, ... : skip the escaped character too
            i += 2;
            continue;
        }

        let name = &text[name_start..name_end];
        if !spec.matches(name) || is_commented(text, i) {
            i = name_end;
            continue;
        }

        if let Some(directive) = parse_arguments(text, i, name_end, spec) {
            return Some(directive);
        }
        i = name_end;
    }

    None
}

/// Every directive matching `spec`, in order.
pub fn find_all(text: &str, spec: &DirectiveSpec) -> Vec<Directive> {
    let mut found = Vec::new();
    let mut cursor = 0;
    while let Some(directive) = find_directive(text, cursor, spec) {
        cursor = directive.end;
        found.push(directive);
    }
    found
}

/// Run the find / resolve / splice loop over `text`.
///
/// `resolve` returns the byte range to replace (normally the directive's own
/// span) and its replacement, or `None` to leave the directive alone.
/// Scanning resumes right after each replacement. Returns how many splices
/// changed the text.
pub fn try_rewrite<E, F>(text: &mut String, spec: &DirectiveSpec, mut resolve: F) -> Result<usize, E>
where
    F: FnMut(&Directive, &str) -> Result<Option<(Range<usize>, String)>, E>,
{
    let mut cursor = 0;
    let mut rewrites = 0;

    while let Some(directive) = find_directive(text, cursor, spec) {
        match resolve(&directive, text)? {
            Some((range, replacement)) => {
                if text[range.clone()] != replacement {
                    rewrites += 1;
                }
                cursor = range.start + replacement.len();
                text.replace_range(range, &replacement);
            }
            None => cursor = directive.end,
        }
    }

    Ok(rewrites)
}

/// Infallible form of [`try_rewrite`].
pub fn rewrite<F>(text: &mut String, spec: &DirectiveSpec, mut resolve: F) -> usize
where
    F: FnMut(&Directive, &str) -> Option<(Range<usize>, String)>,
{
    match try_rewrite::<std::convert::Infallible, _>(text, spec, |d, t| Ok(resolve(d, t))) {
        Ok(rewrites) => rewrites,
        Err(never) => match never {},
    }
}

/// Whether byte offset `pos` sits after an unescaped `%` on its line.
pub fn is_commented(text: &str, pos: usize) -> bool {
    let line_start = text[..pos].rfind('\n').map_or(0, |i| i + 1);
    let line = &text.as_bytes()[line_start..pos];

    let mut backslashes = 0;
    for &b in line {
        match b {
            b'%' if backslashes % 2 == 0 => return true,
            b'\\' => {
                backslashes += 1;
                continue;
            }
            _ => {}
        }
        backslashes = 0;
    }
    false
}

/// Strip one pair of surrounding double quotes and whitespace.
pub fn unquote(value: &str) -> &str {
    let trimmed = value.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim()
}

fn parse_arguments(
    text: &str,
    start: usize,
    name_end: usize,
    spec: &DirectiveSpec,
) -> Option<Directive> {
    let bytes = text.as_bytes();
    let mut pos = name_end;

    let starred = bytes.get(pos) == Some(&b'*');
    if starred {
        pos += 1;
    }
    pos = skip_whitespace(bytes, pos);

    let mut optional = 0;
    while optional < spec.max_optional && bytes.get(pos) == Some(&b'[') {
        pos = closing_delimiter(bytes, pos, b'[', b']')? + 1;
        pos = skip_whitespace(bytes, pos);
        optional += 1;
    }

    if bytes.get(pos) != Some(&b'{') {
        return None;
    }
    let close = closing_delimiter(bytes, pos, b'{', b'}')?;

    Some(Directive {
        name: text[start + 1..name_end].to_string(),
        starred,
        start,
        arg_open: pos,
        arg: pos + 1..close,
        end: close + 1,
    })
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

/// Offset of the delimiter closing the one at `open`, honoring nesting of
/// both brace and bracket pairs and backslash escapes.
fn closing_delimiter(bytes: &[u8], open: usize, left: u8, right: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut braces = 0usize;
    let mut i = open;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b if b == left && (left == b'{' || braces == 0) => depth += 1,
            b if b == right && (right == b'}' || braces == 0) => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            b'{' => braces += 1,
            b'}' => braces = braces.saturating_sub(1),
            _ => {}
        }
        i += 1;
    }
    None
}
