//! Metavariable parsing helpers shared by patterns and templates.
//!
//! Patterns and templates use `$NAME` and `$$$NAME` metavariables. Before the
//! text is handed to a grammar, every metavariable is replaced by a sentinel
//! identifier so that the parser produces an ordinary leaf at that position.

use crate::error::SyntaxError;

pub(crate) const METAVAR_PLACEHOLDER_PREFIX: &str = "__MENDER_CAPTURE_";
pub(crate) const METAVAR_PLACEHOLDER_SUFFIX: &str = "__";

/// Name reserved for the non-capturing wildcard `$_`.
pub(crate) const WILDCARD: &str = "_";

/// Whether a metavariable stands for one node or a run of sibling nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaVarKind {
    /// Matches a single node (`$VAR`).
    Single,
    /// Matches zero or more sibling nodes (`$$$VAR`).
    Multiple,
}

/// One metavariable occurrence found while normalising source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Occurrence {
    pub(crate) name: String,
    pub(crate) kind: MetaVarKind,
    pub(crate) offset: usize,
}

/// Returns whether `c` is a valid first character for a metavariable name.
#[must_use]
pub(crate) const fn is_valid_metavar_start_char(c: char) -> bool {
    c.is_ascii_uppercase() || c == '_'
}

/// Returns whether `c` is a valid continuation character for a metavariable name.
#[must_use]
pub(crate) const fn is_valid_metavar_continuation_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'
}

/// Extracts a metavariable name from a character stream.
///
/// The stream is expected to be positioned at the first character after the `$`
/// prefix. Returns an empty string if the next character is not a valid start.
pub(crate) fn extract_metavar_name(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) -> String {
    let mut name = String::new();

    let Some((_, first_char)) = chars.peek().copied() else {
        return name;
    };

    if !is_valid_metavar_start_char(first_char) {
        return name;
    }

    name.push(first_char);
    chars.next();

    while let Some((_, c)) = chars.peek().copied() {
        if !is_valid_metavar_continuation_char(c) {
            break;
        }
        name.push(c);
        chars.next();
    }

    name
}

/// Builds the identifier used to represent a metavariable in normalised text.
#[must_use]
pub(crate) fn placeholder_for_metavar(name: &str) -> String {
    format!("{METAVAR_PLACEHOLDER_PREFIX}{name}{METAVAR_PLACEHOLDER_SUFFIX}")
}

/// Extracts the metavariable name from a normalised placeholder identifier.
#[must_use]
pub(crate) fn metavar_name_from_placeholder(text: &str) -> Option<&str> {
    text.strip_prefix(METAVAR_PLACEHOLDER_PREFIX)
        .and_then(|rest| rest.strip_suffix(METAVAR_PLACEHOLDER_SUFFIX))
}

/// Replaces every metavariable with its sentinel identifier.
///
/// Returns the normalised text together with each occurrence in source order.
///
/// # Errors
///
/// Returns an error for `$$` prefixes, prefixes longer than three dollars, or a
/// dollar sign that is not followed by a valid name.
pub(crate) fn normalise_metavariables(
    source: &str,
) -> Result<(String, Vec<Occurrence>), SyntaxError> {
    let mut out = String::with_capacity(source.len());
    let mut occurrences = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }

        let mut dollar_count = 1;
        while chars.peek().is_some_and(|(_, c)| *c == '$') {
            chars.next();
            dollar_count += 1;
        }

        if dollar_count == 2 || dollar_count > 3 {
            return Err(SyntaxError::invalid_metavariable(format!(
                "metavariable at offset {offset} has invalid '$' prefix length ({dollar_count})"
            )));
        }

        let name = extract_metavar_name(&mut chars);
        if name.is_empty() {
            return Err(SyntaxError::invalid_metavariable(format!(
                "metavariable at offset {offset} has no valid name"
            )));
        }

        let kind = if dollar_count == 3 {
            MetaVarKind::Multiple
        } else {
            MetaVarKind::Single
        };

        out.push_str(&placeholder_for_metavar(&name));
        occurrences.push(Occurrence { name, kind, offset });
    }

    Ok((out, occurrences))
}
