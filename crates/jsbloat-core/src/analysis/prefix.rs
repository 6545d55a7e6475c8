//! Shortening of bundle source paths that share a long common prefix.

/// Marker that replaces a trimmed prefix
pub const ELLIPSIS: char = '…';

/// Longest string that is a prefix of every input.
///
/// Only the lexicographically smallest and largest inputs need comparing:
/// every other string sorts between them and so shares at least their common
/// prefix.
pub fn common_prefix<'a, I>(strings: I) -> &'a str
where
    I: IntoIterator<Item = &'a str>,
{
    let mut iter = strings.into_iter();
    let Some(first) = iter.next() else {
        return "";
    };
    let (min, max) = iter.fold((first, first), |(min, max), s| (min.min(s), max.max(s)));

    let mut prefix = min;
    while !max.starts_with(prefix) {
        let mut chars = prefix.chars();
        chars.next_back();
        prefix = chars.as_str();
    }
    prefix
}

/// Replace `prefix` at the start of `s` with an ellipsis
pub fn trim_common_prefix(s: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        return s.to_string();
    }
    match s.strip_prefix(prefix) {
        Some(rest) => format!("{}{}", ELLIPSIS, rest),
        None => s.to_string(),
    }
}
