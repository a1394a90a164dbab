// ABOUTME: Placeholder substitution for the SSH config templates.
// ABOUTME: `{name}` is replaced, `{{` and `}}` are literal braces.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// `{name}` with no value supplied for `name`.
    UnknownPlaceholder(String),
    /// A `{` without a matching `}`, or a lone `}`.
    UnmatchedBrace { offset: usize },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPlaceholder(name) => write!(f, "unknown placeholder {{{name}}}"),
            Self::UnmatchedBrace { offset } => write!(f, "unmatched brace at byte {offset}"),
        }
    }
}

impl std::error::Error for TemplateError {}

/// Substitute `{name}` placeholders in `template` with values from `vars`.
///
/// Values are inserted verbatim and are not themselves scanned for
/// placeholders. Unused entries in `vars` are ignored.
pub fn render(template: &str, vars: &[(&str, &str)]) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        match ch {
            '{' if chars.next_if(|&(_, c)| c == '{').is_some() => out.push('{'),
            '}' if chars.next_if(|&(_, c)| c == '}').is_some() => out.push('}'),
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, '{')) | None => {
                            return Err(TemplateError::UnmatchedBrace { offset })
                        }
                        Some((_, c)) => name.push(c),
                    }
                }
                let value = vars
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| *value)
                    .ok_or(TemplateError::UnknownPlaceholder(name))?;
                out.push_str(value);
            }
            '}' => return Err(TemplateError::UnmatchedBrace { offset }),
            c => out.push(c),
        }
    }

    Ok(out)
}
