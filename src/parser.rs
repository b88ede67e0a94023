//! Functions for parsing classic command text.

use crate::commands::{CommandError, CommandResult};
use crate::utils::{self, consts};

/// Returns `Some((prefix, unprefixed))`,
/// where `prefix` is the matched prefix and `unprefixed` is everything after.
/// Otherwise, returns `None` if no prefix was matched from `prefixes`.
pub fn unprefix_with<I, T>(prefixes: I, text: &str) -> Option<(&str, &str)>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    prefixes.into_iter().find_map(|prefix| {
        let prefix = prefix.as_ref();
        text.strip_prefix(prefix)
            .map(|stripped| (&text[..prefix.len()], stripped))
    })
}

/// Returns a tuple of `(next, rest)`, where `next` is the part before any whitespaces
/// and `rest` is everything after any whitespaces.
pub fn split_once_whitespace(text: &str) -> (&str, Option<&str>) {
    text.split_once(char::is_whitespace)
        .map_or((text, None), |(n, r)| (n, Some(r)))
}

/// Parse text and return a tuple `(arg, Option<rest>)`,
/// where `arg` is either the first quoted part, the first whitespace separated part
/// or the whole input (after `trim_start`).
/// The `Option` will contain the remaining text, if any.
/// # Notes
/// - Escape characters are **not** handled.
/// - If a quoted argument is followed by any character (whitespace or not),
/// those characters will be in the remaining `Option`.
pub fn maybe_quoted_arg(input: &str) -> CommandResult<(&str, Option<&str>)> {
    let input = input.trim_start();

    let initial = input.chars().next().ok_or(CommandError::MissingArgs)?;

    if !consts::DELIMITERS.contains(&initial) {
        // Did not start with a delimiter, split by whitespace instead.
        return Ok(split_once_whitespace(input));
    }

    // Delimiters are one byte wide, so the closing one can be searched from index 1.
    let idx = input[1..]
        .find(initial)
        .map(|i| i + 1)
        .ok_or_else(|| {
            let input = utils::escape_discord_chars(input);
            CommandError::ParseError(format!(
                "Missing matching delimiter: '{input}', expected one of: {}.",
                utils::nice_list(consts::DELIMITERS)
            ))
        })?;

    Ok((&input[1..idx], input.get(idx + 1..).filter(|s| !s.is_empty())))
}

/// Consumes the rest of the input as one argument.
/// Surrounding whitespace is trimmed and a single matching pair of delimiters is stripped.
pub fn greedy_arg(input: &str) -> CommandResult<&str> {
    let input = input.trim();

    if input.is_empty() {
        return Err(CommandError::MissingArgs);
    }

    Ok(strip_delimits(input))
}

/// Returns a string-slice without delimiters,
/// or returns `input` if no delimiters are found or can be stripped.
pub fn strip_delimits(input: &str) -> &str {
    let mut chars = input.chars();
    match (chars.next(), chars.next_back()) {
        (Some(left), Some(right)) if left == right && consts::DELIMITERS.contains(&left) => {
            &input[left.len_utf8()..input.len() - right.len_utf8()]
        },
        _ => input,
    }
}

/// Make sure there's nothing else by mistake.
pub fn ensure_rest_is_empty(rest: Option<&str>) -> CommandResult<()> {
    match rest {
        Some(rest) if !rest.trim().is_empty() => {
            Err(CommandError::UnexpectedArgs(format!("Unexpected '{rest}'")))
        },
        _ => Ok(()),
    }
}
