//! Binding-expression scanning for ZUL attribute values and script text.
//!
//! Works on plain strings and returns fragments with byte offsets into the
//! scanned text; the caller turns offsets into lines and attaches scopes.

use regex::Regex;
use std::sync::OnceLock;

/// Names that look like aliases but are implicit EL/zscript objects
const IMPLICIT_OBJECTS: &[&str] = &[
    "arg",
    "application",
    "applicationScope",
    "componentScope",
    "desktop",
    "desktopScope",
    "each",
    "event",
    "execution",
    "forEachStatus",
    "header",
    "labels",
    "page",
    "pageContext",
    "pageScope",
    "param",
    "requestScope",
    "self",
    "session",
    "sessionScope",
    "spaceOwner",
    "spaceScope",
    "status",
];

/// A command or member name as the template wrote it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameExpr {
    Literal(String),
    /// Every alternative of a finite choice between literals
    Enumerated(Vec<String>),
    /// Anything computed at runtime; holds the raw expression
    Opaque(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// `@command(...)`, `@global-command(...)`, `before=`/`after=` arguments
    Command {
        global: bool,
        name: NameExpr,
        offset: usize,
    },
    /// `alias.member`, `alias.member(...)`, `alias['x']`, `alias[expr]`
    Access {
        alias: String,
        member: NameExpr,
        offset: usize,
    },
}

fn annotation_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"@([A-Za-z][A-Za-z-]*)\s*\(").expect("Hardcoded regex pattern is valid")
    })
}

fn access_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"\b([a-z_][A-Za-z0-9_]*)\s*(?:\.\s*([A-Za-z_][A-Za-z0-9_]*)|\[)")
            .expect("Hardcoded regex pattern is valid")
    })
}

fn viewmodel_id_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r#"@id\(\s*['"]([^'"]*)['"]\s*\)"#).expect("Hardcoded regex pattern is valid")
    })
}

fn viewmodel_init_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r#"@init\(\s*['"]?([A-Za-z_$][\w.$]*)['"]?\s*\)"#)
            .expect("Hardcoded regex pattern is valid")
    })
}

/// Parse a `viewModel` attribute into (alias, class name); the alias defaults to `vm`
pub fn parse_viewmodel(value: &str) -> Option<(String, String)> {
    let class_name = viewmodel_init_regex().captures(value)?.get(1)?.as_str().to_string();
    let alias = viewmodel_id_regex()
        .captures(value)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| "vm".to_string());
    Some((alias, class_name))
}

pub fn is_candidate_alias(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && !IMPLICIT_OBJECTS.contains(&name)
}

/// Classify a name expression by how precisely it can be known statically
pub fn classify_name(expr: &str) -> NameExpr {
    let trimmed = strip_parens(expr.trim());

    if let Some(literal) = as_literal(trimmed) {
        return NameExpr::Literal(literal.to_string());
    }

    let mut names = Vec::new();
    if enumerate_literals(trimmed, &mut names) {
        let mut unique = Vec::new();
        for name in names {
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        return NameExpr::Enumerated(unique);
    }

    NameExpr::Opaque(trimmed.to_string())
}

/// Collect literal alternatives of a ternary tree or `{'a','b'}` list
fn enumerate_literals(expr: &str, names: &mut Vec<String>) -> bool {
    let expr = strip_parens(expr.trim());

    if let Some(literal) = as_literal(expr) {
        names.push(literal.to_string());
        return true;
    }

    if let Some(inner) = expr.strip_prefix('{').and_then(|e| e.strip_suffix('}')) {
        let items = split_top_level(inner, ',');
        if items.is_empty() {
            return false;
        }
        return items.iter().all(|item| match as_literal(item.trim()) {
            Some(literal) => {
                names.push(literal.to_string());
                true
            }
            None => false,
        });
    }

    if let Some((_, when_true, when_false)) = split_ternary(expr) {
        return enumerate_literals(when_true, names) && enumerate_literals(when_false, names);
    }

    false
}

fn as_literal(expr: &str) -> Option<&str> {
    let quote = expr.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let inner = expr.strip_prefix(quote)?.strip_suffix(quote)?;
    if expr.len() < 2 || inner.contains(quote) {
        return None;
    }
    Some(inner)
}

fn strip_parens(mut expr: &str) -> &str {
    while let Some(inner) = expr.strip_prefix('(').and_then(|e| e.strip_suffix(')')) {
        // Only when the outer pair encloses everything: `(a) ? (b) : (c)` stays intact
        if matching_close(expr, 0) != Some(expr.len() - 1) {
            break;
        }
        expr = inner.trim();
    }
    expr
}

/// Split `cond ? a : b` at its top-level operators
fn split_ternary(expr: &str) -> Option<(&str, &str, &str)> {
    let question = find_top_level(expr, '?', 0)?;
    let rest = question + 1;
    let mut depth = 0usize;
    // nested ternaries in the true branch consume their own colon
    let mut pending = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in expr[rest..].char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(' | '[' | '{') => depth += 1,
            (None, ')' | ']' | '}') => depth = depth.saturating_sub(1),
            (None, '?') if depth == 0 => pending += 1,
            (None, ':') if depth == 0 => {
                if pending == 0 {
                    let colon = rest + i;
                    return Some((&expr[..question], &expr[rest..colon], &expr[colon + 1..]));
                }
                pending -= 1;
            }
            _ => {}
        }
    }
    None
}

fn find_top_level(expr: &str, target: char, from: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in expr[from..].char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(' | '[' | '{') => depth += 1,
            (None, ')' | ']' | '}') => depth = depth.saturating_sub(1),
            (None, c) if c == target && depth == 0 => return Some(i + from),
            _ => {}
        }
    }
    None
}

/// Split on `sep` outside quotes and brackets
pub fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    while let Some(at) = find_top_level(text, sep, start) {
        parts.push(&text[start..at]);
        start = at + sep.len_utf8();
    }
    if !text[start..].trim().is_empty() || !parts.is_empty() {
        parts.push(&text[start..]);
    }
    parts
}

/// Index of the bracket closing the one at `open`
fn matching_close(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let (opening, closing) = match bytes.get(open)? {
        b'(' => (b'(', b')'),
        b'[' => (b'[', b']'),
        b'{' => (b'{', b'}'),
        _ => return None,
    };
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'\'' || b == b'"' => quote = Some(b),
            None if b == opening => depth += 1,
            None if b == closing => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            None => {}
        }
    }
    None
}

/// Replace the contents of string literals with spaces, keeping offsets
fn blank_strings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    for c in text.chars() {
        match quote {
            Some(q) if c == q => {
                quote = None;
                out.push(c);
            }
            Some(_) => out.extend(std::iter::repeat(' ').take(c.len_utf8())),
            None => {
                if c == '\'' || c == '"' {
                    quote = Some(c);
                }
                out.push(c);
            }
        }
    }
    out
}

/// Raw `alias.member` / `alias[...]` accesses outside string literals
pub fn scan_accesses(text: &str, base: usize, fragments: &mut Vec<Fragment>) {
    let blanked = blank_strings(text);
    for caps in access_regex().captures_iter(&blanked) {
        let Some(whole) = caps.get(0) else { continue };
        let Some(alias) = caps.get(1) else { continue };

        // `a.b.c` yields only `a.b`
        let preceded_by_dot = blanked[..whole.start()].trim_end().ends_with('.');
        if preceded_by_dot || !is_candidate_alias(alias.as_str()) {
            continue;
        }

        let member = match caps.get(2) {
            Some(member) => NameExpr::Literal(member.as_str().to_string()),
            None => {
                let open = whole.end() - 1;
                let Some(close) = matching_close(text, open) else {
                    continue;
                };
                classify_name(&text[open + 1..close])
            }
        };

        fragments.push(Fragment::Access {
            alias: alias.as_str().to_string(),
            member,
            offset: base + whole.start(),
        });
    }
}

/// Every `${...}` EL expression as (offset of its body, body)
fn el_expressions(text: &str) -> Vec<(usize, &str)> {
    let mut found = Vec::new();
    let mut from = 0;
    while let Some(start) = text[from..].find("${").map(|i| i + from) {
        let open = start + 1;
        match matching_close(text, open) {
            Some(close) => {
                found.push((open + 1, &text[open + 1..close]));
                from = close + 1;
            }
            None => break,
        }
    }
    found
}

/// Scan an attribute value (or `<attribute>` text) for binding annotations and EL
pub fn scan_binding_value(value: &str) -> Vec<Fragment> {
    let mut fragments = Vec::new();

    for caps in annotation_regex().captures_iter(value) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let open = whole.end() - 1;
        let Some(close) = matching_close(value, open) else {
            continue;
        };
        let args_start = open + 1;
        let args = &value[args_start..close];

        match name.as_str() {
            "id" => {}
            "command" | "global-command" => {
                scan_command(args, args_start, name.as_str() == "global-command", &mut fragments);
            }
            _ => scan_property_annotation(args, args_start, &mut fragments),
        }
    }

    for (offset, body) in el_expressions(value) {
        scan_accesses(body, offset, &mut fragments);
    }

    fragments
}

fn scan_command(args: &str, base: usize, global: bool, fragments: &mut Vec<Fragment>) {
    let parts = split_top_level(args, ',');
    let mut offset = base;
    for (i, part) in parts.iter().enumerate() {
        if i == 0 {
            fragments.push(Fragment::Command {
                global,
                name: classify_name(part),
                offset,
            });
            scan_accesses(part, offset, fragments);
        } else {
            // `key=expr` parameters; only the value side can reference the ViewModel
            let value_at = find_top_level(part, '=', 0).map(|eq| eq + 1).unwrap_or(0);
            scan_accesses(&part[value_at..], offset + value_at, fragments);
        }
        offset += part.len() + 1;
    }
}

/// `@load`, `@save`, `@bind`, `@init`, `@ref`, `@converter`, `@validator`, `@template`, ...
fn scan_property_annotation(args: &str, base: usize, fragments: &mut Vec<Fragment>) {
    let parts = split_top_level(args, ',');
    let mut offset = base;
    for part in &parts {
        match find_top_level(part, '=', 0) {
            Some(eq) if is_command_key(part[..eq].trim()) => {
                fragments.push(Fragment::Command {
                    global: false,
                    name: classify_name(&part[eq + 1..]),
                    offset: offset + eq + 1,
                });
                scan_accesses(&part[eq + 1..], offset + eq + 1, fragments);
            }
            Some(eq) if is_parameter_key(part[..eq].trim()) => {
                scan_accesses(&part[eq + 1..], offset + eq + 1, fragments);
            }
            _ => scan_accesses(part, offset, fragments),
        }
        offset += part.len() + 1;
    }
}

fn is_command_key(key: &str) -> bool {
    key == "before" || key == "after"
}

fn is_parameter_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Extract the name expression of an include `src`: `${expr}`, `@load(expr)` or literal
pub fn include_source(value: &str) -> NameExpr {
    let trimmed = value.trim();

    if let Some(body) = trimmed.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
        return classify_name(body);
    }

    if let Some(caps) = annotation_regex().captures(trimmed) {
        if let Some(whole) = caps.get(0) {
            let open = whole.end() - 1;
            if whole.start() == 0 && matching_close(trimmed, open) == Some(trimmed.len() - 1) {
                let args = &trimmed[open + 1..trimmed.len() - 1];
                let first = split_top_level(args, ',').first().copied().unwrap_or("");
                return classify_name(first);
            }
        }
        return NameExpr::Opaque(trimmed.to_string());
    }

    if trimmed.contains("${") {
        return NameExpr::Opaque(trimmed.to_string());
    }

    NameExpr::Literal(trimmed.to_string())
}
