//! Longest common substring.
//!
//! Classic suffix-extension dynamic programming over characters: cell
//! `(i, j)` holds the length of the longest common suffix of `a[..i]` and
//! `b[..j]`, growing by one on a match and resetting to zero otherwise.
//! Only two rows are kept. Ties go to the first maximum met in row-major
//! order, i.e. the earliest-ending run in `a`.

/// Longest contiguous run of characters shared by `a` and `b`.
pub fn longest_common_substring(a: &str, b: &str) -> String {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return String::new();
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    let mut best_len = 0;
    let mut best_end = 0;

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            if a[i - 1] == b[j - 1] {
                cur[j] = prev[j - 1] + 1;
                if cur[j] > best_len {
                    best_len = cur[j];
                    best_end = i;
                }
            } else {
                cur[j] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    a[best_end - best_len..best_end].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn shared_suffix() {
        assert_eq!(longest_common_substring("abcdef", "zcdef"), "cdef");
    }

    #[test]
    fn disjoint_strings() {
        assert_eq!(longest_common_substring("abc", "xyz"), "");
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(longest_common_substring("", "x"), "");
        assert_eq!(longest_common_substring("x", ""), "");
        assert_eq!(longest_common_substring("", ""), "");
    }

    #[test]
    fn contiguous_not_subsequence() {
        // "ace" is a common subsequence but the longest common run is one char
        assert_eq!(longest_common_substring("abcde", "ace").chars().count(), 1);
    }

    #[test]
    fn ties_resolve_to_first_in_scan_order() {
        // "ab" and "xy" both have length 2; "ab" ends first in `a`
        assert_eq!(longest_common_substring("ab--xy", "xy..ab"), "ab");
    }

    #[test]
    fn query_value_against_stored_value() {
        assert_eq!(
            longest_common_substring("track=ID123", "stored:ID123"),
            "ID123"
        );
    }

    #[test]
    fn multibyte_characters() {
        assert_eq!(longest_common_substring("héllo wörld", "wörld!"), "wörld");
    }

    proptest! {
        #[test]
        fn result_is_substring_of_both(a in "[a-d]{0,12}", b in "[a-d]{0,12}") {
            let lcs = longest_common_substring(&a, &b);
            prop_assert!(a.contains(&lcs));
            prop_assert!(b.contains(&lcs));
        }

        #[test]
        fn no_longer_common_run_exists(a in "[a-c]{0,10}", b in "[a-c]{0,10}") {
            let len = longest_common_substring(&a, &b).chars().count();
            let chars: Vec<char> = a.chars().collect();
            for start in 0..chars.len() {
                for end in (start + len + 1)..=chars.len() {
                    let run: String = chars[start..end].iter().collect();
                    prop_assert!(!b.contains(&run));
                }
            }
        }

        #[test]
        fn self_overlap_is_whole_string(a in "[a-z]{0,16}") {
            prop_assert_eq!(longest_common_substring(&a, &a), a);
        }
    }
}
