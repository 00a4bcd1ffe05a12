use super::{ParseError, MAX_TAG_LEN};

/// Verdict on a buffered `<…` prefix against the tags valid in the current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TagMatch {
    Partial,
    Complete,
    NoMatch,
    Overflow,
    /// A `<` arrived before the tag closed; the tag is malformed and the `<` starts a new candidate.
    Interrupted,
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}

fn inside_quotes(input: &str) -> bool {
    let mut quote: Option<char> = None;
    for c in input.chars() {
        match quote {
            Some(open) if c == open => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None => {}
        }
    }
    quote.is_some()
}

fn ends_tag(buf: &str) -> bool {
    buf.ends_with('>') && !inside_quotes(&buf[..buf.len() - 1])
}

pub(super) fn match_literal(buf: &str, tag: &str) -> TagMatch {
    if buf == tag {
        TagMatch::Complete
    } else if tag.starts_with(buf) {
        TagMatch::Partial
    } else {
        TagMatch::NoMatch
    }
}

/// `<tool` followed by whitespace, `/` or `>`, read through the closing `>`.
pub(super) fn match_tool_open(buf: &str) -> TagMatch {
    const PREFIX: &str = "<tool";

    if buf.len() <= PREFIX.len() {
        return match_literal(buf, PREFIX).or_partial();
    }
    let Some(rest) = buf.strip_prefix(PREFIX) else {
        return TagMatch::NoMatch;
    };
    match rest.chars().next() {
        Some(c) if c.is_whitespace() || c == '/' || c == '>' => {}
        _ => return TagMatch::NoMatch,
    }
    if buf.ends_with('<') {
        TagMatch::Interrupted
    } else if buf.len() > MAX_TAG_LEN {
        TagMatch::Overflow
    } else if ends_tag(buf) {
        TagMatch::Complete
    } else {
        TagMatch::Partial
    }
}

/// `<NAME>`, `<NAME/>` or `<NAME attr…>` (the last one is rejected later).
pub(super) fn match_arg_open(buf: &str) -> TagMatch {
    let mut chars = buf.chars().skip(1).peekable();
    match chars.next() {
        None => return TagMatch::Partial,
        Some(c) if is_name_start(c) => {}
        Some(_) => return TagMatch::NoMatch,
    }
    while chars.next_if(|c| is_name_char(*c)).is_some() {}

    match chars.next() {
        None => TagMatch::Partial,
        Some('>') => match chars.next() {
            None => TagMatch::Complete,
            Some(_) => TagMatch::NoMatch,
        },
        Some('/') => match (chars.next(), chars.next()) {
            (None, _) => TagMatch::Partial,
            (Some('>'), None) => TagMatch::Complete,
            _ => TagMatch::NoMatch,
        },
        Some(c) if c.is_whitespace() => {
            if buf.ends_with('<') {
                TagMatch::Interrupted
            } else if buf.len() > MAX_TAG_LEN {
                TagMatch::Overflow
            } else if ends_tag(buf) {
                TagMatch::Complete
            } else {
                TagMatch::Partial
            }
        }
        Some(_) => TagMatch::NoMatch,
    }
}

/// Any `</NAME>`.
pub(super) fn match_close_tag(buf: &str) -> TagMatch {
    if buf.len() > MAX_TAG_LEN {
        return TagMatch::Overflow;
    }
    let Some(rest) = buf.strip_prefix("</") else {
        return match_literal(buf, "</");
    };
    let mut chars = rest.chars().peekable();
    match chars.next() {
        None => return TagMatch::Partial,
        Some(c) if is_name_start(c) => {}
        Some(_) => return TagMatch::NoMatch,
    }
    while chars.next_if(|c| is_name_char(*c)).is_some() {}

    match (chars.next(), chars.next()) {
        (None, _) => TagMatch::Partial,
        (Some('>'), None) => TagMatch::Complete,
        _ => TagMatch::NoMatch,
    }
}

impl TagMatch {
    fn or_partial(self) -> TagMatch {
        match self {
            TagMatch::Complete => TagMatch::Partial,
            other => other,
        }
    }
}

/// Returns the tool name and whether the tag was self-closing.
pub(super) fn parse_tool_tag(tag: &str) -> Result<(String, bool), ParseError> {
    let inner = tag
        .strip_prefix("<tool")
        .and_then(|rest| rest.strip_suffix('>'))
        .ok_or_else(|| ParseError::MalformedToolTag(tag.to_string()))?;
    let (inner, self_closing) = match inner.trim_end().strip_suffix('/') {
        Some(stripped) => (stripped, true),
        None => (inner, false),
    };

    let name = parse_attributes(inner)?
        .into_iter()
        .find(|(key, _)| key == "name")
        .map(|(_, value)| value.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or(ParseError::MissingToolName)?;

    Ok((name, self_closing))
}

fn parse_attributes(input: &str) -> Result<Vec<(String, String)>, ParseError> {
    let mut attributes = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != '=') {
            key.push(c);
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if key.is_empty() || chars.next_if_eq(&'=').is_none() {
            return Err(ParseError::MalformedToolTag(format!(
                "attribute '{}' has no value",
                key
            )));
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let quote = match chars.next() {
            Some(quote @ ('"' | '\'')) => quote,
            _ => {
                return Err(ParseError::MalformedToolTag(format!(
                    "value of '{}' must be quoted",
                    key
                )))
            }
        };
        let mut value = String::new();
        loop {
            match chars.next() {
                Some(c) if c == quote => break,
                Some(c) => value.push(c),
                None => {
                    return Err(ParseError::MalformedToolTag(format!(
                        "unterminated value for '{}'",
                        key
                    )))
                }
            }
        }
        attributes.push((key, value));
    }

    Ok(attributes)
}

/// Returns the argument name and whether the tag was self-closing.
pub(super) fn parse_arg_tag(tag: &str) -> Result<(String, bool), ParseError> {
    let inner = &tag[1..tag.len() - 1];
    let name_len = inner
        .char_indices()
        .find(|(_, c)| !is_name_char(*c))
        .map(|(index, _)| index)
        .unwrap_or(inner.len());
    let (name, remainder) = inner.split_at(name_len);

    match remainder.trim() {
        "" => Ok((name.to_string(), false)),
        "/" => Ok((name.to_string(), true)),
        _ => Err(ParseError::ArgumentAttributes(name.to_string())),
    }
}
