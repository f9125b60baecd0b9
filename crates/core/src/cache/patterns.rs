//! Glob matching for cache key patterns.
//!
//! Only `*` is special: it matches any run of characters, including `:` and
//! the empty string. This is the subset of Redis `KEYS` syntax the
//! invalidation topology emits.

/// Checks if a cache key matches a glob pattern.
///
/// # Examples
///
/// ```
/// use collabcache_core::cache::pattern_matches;
///
/// assert!(pattern_matches("user:*", "user:GetAll:0:10"));
/// assert!(pattern_matches("comment:GetAllBelongsTo:*", "comment:GetAllBelongsTo:issue_1:0:10"));
/// assert!(!pattern_matches("issue:*", "comment:GetAllBelongsTo:issue_1:0:10"));
/// ```
pub fn pattern_matches(pattern: &str, key: &str) -> bool {
    let mut parts = pattern.split('*');

    // Text before the first wildcard is anchored at the start.
    let Some(head) = parts.next() else {
        return key.is_empty();
    };
    let Some(mut remaining) = key.strip_prefix(head) else {
        return false;
    };

    let rest: Vec<&str> = parts.collect();
    let Some((tail, middle)) = rest.split_last() else {
        // No wildcard at all.
        return remaining.is_empty();
    };

    for segment in middle {
        match remaining.find(segment) {
            Some(pos) => remaining = &remaining[pos + segment.len()..],
            None => return false,
        }
    }

    // Text after the last wildcard is anchored at the end.
    remaining.ends_with(tail)
}

/// Returns true if the pattern contains a wildcard.
pub fn is_pattern(candidate: &str) -> bool {
    candidate.contains('*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(pattern_matches("user:u1", "user:u1"));
        assert!(!pattern_matches("user:u1", "user:u2"));
        assert!(!pattern_matches("user:u1", "user:u1:extra"));
    }

    #[test]
    fn test_trailing_wildcard() {
        assert!(pattern_matches("user:*", "user:GetAll:0:10"));
        assert!(pattern_matches("user:*", "user:"));
        assert!(!pattern_matches("user:*", "user"));
        assert!(!pattern_matches("user:*", "organization:o1"));
    }

    #[test]
    fn test_leading_wildcard() {
        assert!(pattern_matches("*:0:10", "user:GetAll:0:10"));
        assert!(!pattern_matches("*:0:10", "user:GetAll:0:20"));
    }

    #[test]
    fn test_middle_wildcard() {
        assert!(pattern_matches(
            "todo:GetByOwner:*:true",
            "todo:GetByOwner:user_1:0:10:true"
        ));
        assert!(!pattern_matches(
            "todo:GetByOwner:*:true",
            "todo:GetByOwner:user_1:0:10:false"
        ));
    }

    #[test]
    fn test_multiple_wildcards() {
        assert!(pattern_matches("*:GetAll:*", "namespace:GetAll:org_1:0:10"));
        assert!(pattern_matches("*:*:*", "a:b:c"));
        assert!(!pattern_matches("*:GetAll:*", "namespace:GetAllBelongsTo"));
    }

    #[test]
    fn test_wildcard_only() {
        assert!(pattern_matches("*", ""));
        assert!(pattern_matches("*", "anything:at:all"));
    }

    #[test]
    fn test_adjacent_wildcards_behave_like_one() {
        assert!(pattern_matches("user:**", "user:u1"));
        assert!(pattern_matches("a:**:b", "a:x:y:b"));
    }

    #[test]
    fn test_empty_pattern_and_key() {
        assert!(pattern_matches("", ""));
        assert!(!pattern_matches("", "user:u1"));
        assert!(!pattern_matches("user:*", ""));
    }

    #[test]
    fn test_tail_must_not_overlap_middle() {
        // "ab" is consumed by the middle segment, leaving nothing for the tail.
        assert!(!pattern_matches("*ab*ab", "xab"));
        assert!(pattern_matches("*ab*ab", "xabab"));
    }

    #[test]
    fn test_is_pattern() {
        assert!(is_pattern("user:*"));
        assert!(!is_pattern("user:u1"));
    }
}
