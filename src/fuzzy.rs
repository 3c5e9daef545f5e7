/// Case-insensitive subsequence match: every character of `needle` must
/// appear in `haystack` in the same order, not necessarily adjacent.
///
/// A needle longer than the haystack never matches; equal lengths require
/// equality.
pub fn fuzzy(needle: &str, haystack: &str) -> bool {
    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    let haystack: Vec<char> = haystack.chars().flat_map(char::to_lowercase).collect();
    fuzzy_lowered(&needle, &haystack)
}

/// [`fuzzy`] for inputs that are already lowercased.
pub(crate) fn fuzzy_lowered(needle: &[char], haystack: &[char]) -> bool {
    if needle.len() > haystack.len() {
        return false;
    }
    if needle.len() == haystack.len() {
        return needle == haystack;
    }

    let mut rest = haystack.iter();
    needle.iter().all(|n| rest.any(|h| h == n))
}
