//! Display-name handling and reply templates.
//!
//! Trust lookups go through [`normalize`]. Target lookups only collapse
//! whitespace, see [`collapse_whitespace`].

use crate::error::TemplateError;
use std::collections::BTreeMap;

/// Bracketed suffixes people add to their display name to show a role.
const ROLE_SUFFIXES: &[&str] = &["usher", "dl", "chair", "speaker"];

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical form of a display name for trust lookups.
///
/// Lowercases, drops periods, collapses whitespace and removes trailing
/// role suffixes such as `(Usher)`. Idempotent.
pub fn normalize(name: &str) -> String {
    let lowered = name.to_lowercase().replace('.', "");
    let mut out = collapse_whitespace(&lowered);
    while let Some(stripped) = strip_role_suffix(&out) {
        out = stripped.trim_end().to_string();
    }
    out
}

fn strip_role_suffix(s: &str) -> Option<&str> {
    let body = s.strip_suffix(')')?;
    let open = body.rfind('(')?;
    let role = body[open + 1..].trim();
    ROLE_SUFFIXES.contains(&role).then(|| &s[..open])
}

/// First name used to greet someone.
///
/// Takes the first word, drops possessives and non-letters (phone
/// numbers, "John's iPhone"), and title-cases names typed in one case.
pub fn first_name(display: &str) -> String {
    let word = display
        .split_whitespace()
        .find(|w| !w.starts_with('('))
        .unwrap_or("");
    let word = word.split(['\'', '\u{2019}']).next().unwrap_or("");
    let letters: String = word.chars().filter(|c| c.is_alphabetic() || *c == '-').collect();
    let letters = letters.trim_matches('-');
    if letters.is_empty() {
        return collapse_whitespace(display);
    }

    let all_lower = letters.chars().all(|c| !c.is_uppercase());
    let all_upper = letters.chars().all(|c| !c.is_lowercase());
    if all_lower || all_upper {
        let mut chars = letters.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => String::new(),
        }
    } else {
        letters.to_string()
    }
}

/// Part of the day for `{1}` in greetings.
pub fn daytime(hour: u32) -> &'static str {
    match hour {
        0..=11 => "morning",
        12..=16 => "afternoon",
        _ => "evening",
    }
}

/// Prefix for topic announcements.
pub fn day_label(hour: u32) -> &'static str {
    if hour < 17 { "Today's" } else { "Tonight's" }
}

/// Values available to a reply template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateVars<'a> {
    /// `{0}`
    pub first_name: &'a str,
    /// `{1}`
    pub daytime: &'a str,
    /// `{key}` for every broadcast command.
    pub broadcasts: &'a BTreeMap<String, String>,
}

/// Render a template with `{0}`, `{1}` and `{broadcast}` placeholders.
///
/// `{{` and `}}` produce literal braces.
pub fn render(template: &str, vars: &TemplateVars<'_>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template.char_indices().peekable();

    while let Some((pos, c)) = rest.next() {
        match c {
            '{' if matches!(rest.peek(), Some((_, '{'))) => {
                rest.next();
                out.push('{');
            }
            '}' if matches!(rest.peek(), Some((_, '}'))) => {
                rest.next();
                out.push('}');
            }
            '{' => {
                let mut key = String::new();
                loop {
                    match rest.next() {
                        Some((_, '}')) => break,
                        Some((_, '{')) | None => return Err(TemplateError::Unclosed(pos)),
                        Some((_, k)) => key.push(k),
                    }
                }
                match key.trim() {
                    "0" => out.push_str(vars.first_name),
                    "1" => out.push_str(vars.daytime),
                    other => match vars.broadcasts.get(other) {
                        Some(text) => out.push_str(text),
                        None => return Err(TemplateError::UnknownKey(other.to_string())),
                    },
                }
            }
            '}' => return Err(TemplateError::StrayClose(pos)),
            _ => out.push(c),
        }
    }

    Ok(out)
}

/// Check that `template` renders against the given broadcast keys.
pub fn check_template(
    template: &str,
    broadcasts: &BTreeMap<String, String>,
) -> Result<(), TemplateError> {
    let vars = TemplateVars {
        first_name: "",
        daytime: "",
        broadcasts,
    };
    render(template, &vars).map(|_| ())
}

/// Replace `{0}` with a command argument, as used by email templates.
pub fn substitute_arg(template: &str, arg: &str) -> String {
    template.replace("{0}", arg)
}
