use std::{borrow::Cow, sync::OnceLock};

use regex::{Captures, Regex};

/// Failure while substituting `{{ env.VAR }}` placeholders
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExpandError {
    /// Placeholder references an unset variable and carries no default
    #[error("environment variable not found: `{0}`")]
    MissingVariable(String),

    /// Placeholder is not scoped with `env.`
    #[error("only variables scoped with 'env.' are supported: `{0}`")]
    UnsupportedScope(String),
}

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Group 1 is the dotted key, group 2 the optional default("...") value
    RE.get_or_init(|| {
        Regex::new(r#"\{\{\s*([a-zA-Z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#)
            .expect("must be valid regex")
    })
}

/// Expand `{{ env.VAR }}` and `{{ env.VAR | default("fallback") }}`
/// placeholders in raw TOML text
///
/// Runs before deserialization so config structs hold plain values.
/// Comment lines are copied through untouched, so a commented-out
/// secret never has to be present in the environment.
pub fn expand_env(input: &str) -> Result<String, ExpandError> {
    let mut expanded = input
        .lines()
        .map(|line| {
            if line.trim_start().starts_with('#') {
                Ok(Cow::Borrowed(line))
            } else {
                expand_line(line)
            }
        })
        .collect::<Result<Vec<_>, _>>()?
        .join("\n");

    if input.ends_with('\n') {
        expanded.push('\n');
    }

    Ok(expanded)
}

fn expand_line(line: &str) -> Result<Cow<'_, str>, ExpandError> {
    if !placeholder().is_match(line) {
        return Ok(Cow::Borrowed(line));
    }

    let mut out = String::with_capacity(line.len());
    let mut cursor = 0;

    for captures in placeholder().captures_iter(line) {
        let Some(whole) = captures.get(0) else {
            continue;
        };

        out.push_str(&line[cursor..whole.start()]);
        out.push_str(&resolve(&captures)?);
        cursor = whole.end();
    }

    out.push_str(&line[cursor..]);
    Ok(Cow::Owned(out))
}

fn resolve(captures: &Captures<'_>) -> Result<String, ExpandError> {
    let key = captures.get(1).map_or("", |m| m.as_str());
    let fallback = captures.get(2).map(|m| m.as_str());

    let Some(var_name) = key.strip_prefix("env.").filter(|name| !name.contains('.')) else {
        return Err(ExpandError::UnsupportedScope(key.to_owned()));
    };

    match (std::env::var(var_name), fallback) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(default)) => Ok(default.to_owned()),
        (Err(_), None) => Err(ExpandError::MissingVariable(var_name.to_owned())),
    }
}
