//! Name-based similarity signals
//!
//! Lexical, structural, phonetic and semantic-category signals over field
//! name strings. All functions return a score in [0.0, 1.0] where 1.0 means
//! identical; functions returning `Option` signal "no basis to score" with
//! `None` rather than a misleading zero.

use ahash::AHashSet;
use once_cell::sync::Lazy;
use regex::Regex;

/// Fixed bonus for two names sharing a recognized naming convention
const SAME_CONVENTION_SCORE: f32 = 0.8;

/// Lexical similarity over normalized names.
///
/// Takes the best of four heuristics: exact match, substring containment,
/// edit-distance ratio, and word overlap.
pub fn lexical_similarity(a: &str, b: &str) -> f32 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let containment: f32 = if a.contains(b) || b.contains(a) {
        0.85
    } else {
        0.0
    };
    let edit_ratio = {
        let max_len = a.chars().count().max(b.chars().count());
        1.0 - levenshtein(a, b) as f32 / max_len as f32
    };
    let word_overlap = token_jaccard(a, b);

    containment.max(edit_ratio).max(word_overlap)
}

/// Naming conventions recognized by the structural signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingConvention {
    Snake,
    Camel,
    Pascal,
    Kebab,
    Upper,
    Unknown,
}

/// Detect the naming convention of a raw (non-normalized) name
pub fn detect_convention(name: &str) -> NamingConvention {
    if name.is_empty() {
        return NamingConvention::Unknown;
    }
    let has_upper = name.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = name.chars().any(|c| c.is_ascii_lowercase());
    let has_underscore = name.contains('_');
    let has_dash = name.contains('-');

    if has_dash && !has_underscore && !has_upper {
        NamingConvention::Kebab
    } else if has_upper && !has_lower {
        NamingConvention::Upper
    } else if has_underscore && !has_upper {
        NamingConvention::Snake
    } else if !has_underscore && !has_dash && has_upper && has_lower {
        let starts_upper = name
            .chars()
            .next()
            .map(|c| c.is_ascii_uppercase())
            .unwrap_or(false);
        if starts_upper {
            NamingConvention::Pascal
        } else {
            NamingConvention::Camel
        }
    } else if !has_upper && !has_underscore && !has_dash {
        // Flat lowercase reads as degenerate snake_case
        NamingConvention::Snake
    } else {
        NamingConvention::Unknown
    }
}

/// Structural similarity over raw names.
///
/// Same recognized convention earns a fixed bonus; otherwise falls back to a
/// blend of length-difference similarity and character-class-set overlap.
pub fn structural_similarity(a: &str, b: &str) -> f32 {
    let conv_a = detect_convention(a);
    let conv_b = detect_convention(b);
    if conv_a == conv_b && conv_a != NamingConvention::Unknown {
        return SAME_CONVENTION_SCORE;
    }

    let len_a = a.chars().count();
    let len_b = b.chars().count();
    let max_len = len_a.max(len_b);
    let length_sim = if max_len == 0 {
        1.0
    } else {
        1.0 - (len_a as f32 - len_b as f32).abs() / max_len as f32
    };

    let class_sim = class_set_jaccard(a, b);
    0.5 * length_sim + 0.5 * class_sim
}

/// Phonetic similarity: simplified Soundex equality, binary
pub fn phonetic_similarity(a: &str, b: &str) -> f32 {
    let code_a = soundex(a);
    let code_b = soundex(b);
    if !code_a.is_empty() && code_a == code_b {
        1.0
    } else {
        0.0
    }
}

/// Semantic field categories recognized by the pattern signal
static CATEGORY_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        (
            "identifier",
            Regex::new(r"(^id$|_id$|^id_|identifier|^key$|_key$|guid|uuid|serial)").expect("static regex"),
        ),
        (
            "name",
            Regex::new(r"(name|title|label|^nm$|_nm$|hostname)").expect("static regex"),
        ),
        (
            "date",
            Regex::new(r"(date|time|_at$|timestamp|created|updated|modified|expir)").expect("static regex"),
        ),
        (
            "address",
            Regex::new(r"(address|addr|street|city|state|zip|postal|country|location|_ip$|^ip_|^ip$)").expect("static regex"),
        ),
        (
            "contact",
            Regex::new(r"(email|phone|contact|mobile|fax)").expect("static regex"),
        ),
        (
            "status",
            Regex::new(r"(status|condition|active|enabled|^state$)").expect("static regex"),
        ),
        (
            "type",
            Regex::new(r"(type|kind|category|class|model)").expect("static regex"),
        ),
        (
            "count",
            Regex::new(r"(count|total|^num_|_num$|qty|quantity|amount|size|capacity)").expect("static regex"),
        ),
    ]
});

/// Categories a normalized name maps to under the fixed catalog
pub fn semantic_categories(normalized: &str) -> AHashSet<&'static str> {
    CATEGORY_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(normalized))
        .map(|(cat, _)| *cat)
        .collect()
}

/// Pattern signal: Jaccard overlap of matched semantic categories.
///
/// `None` when neither name maps to any category - no information either way.
pub fn pattern_similarity(a: &str, b: &str) -> Option<f32> {
    let cats_a = semantic_categories(a);
    let cats_b = semantic_categories(b);
    if cats_a.is_empty() && cats_b.is_empty() {
        return None;
    }
    let intersection = cats_a.intersection(&cats_b).count();
    let union = cats_a.union(&cats_b).count();
    Some(intersection as f32 / union as f32)
}

/// Jaccard over underscore-separated tokens
pub fn token_jaccard(a: &str, b: &str) -> f32 {
    let tokens_a: AHashSet<&str> = a.split('_').filter(|t| !t.is_empty()).collect();
    let tokens_b: AHashSet<&str> = b.split('_').filter(|t| !t.is_empty()).collect();
    if tokens_a.is_empty() && tokens_b.is_empty() {
        return 1.0;
    }
    let union = tokens_a.union(&tokens_b).count();
    if union == 0 {
        return 0.0;
    }
    tokens_a.intersection(&tokens_b).count() as f32 / union as f32
}

/// Jaccard over the character classes present (letters, digits, separators)
fn class_set_jaccard(a: &str, b: &str) -> f32 {
    let classes = |s: &str| -> AHashSet<&'static str> {
        let mut set = AHashSet::new();
        for ch in s.chars() {
            if ch.is_ascii_alphabetic() {
                set.insert("letter");
            } else if ch.is_ascii_digit() {
                set.insert("digit");
            } else {
                set.insert("separator");
            }
        }
        set
    };
    let set_a = classes(a);
    let set_b = classes(b);
    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    set_a.intersection(&set_b).count() as f32 / union as f32
}

/// Classic Levenshtein distance, single-row DP
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut row: Vec<usize> = (0..=b_chars.len()).collect();
    for (i, ca) in a_chars.iter().enumerate() {
        let mut prev_diag = row[0];
        row[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            let next = (prev_diag + cost).min(row[j] + 1).min(row[j + 1] + 1);
            prev_diag = row[j + 1];
            row[j + 1] = next;
        }
    }
    row[b_chars.len()]
}

/// Simplified Soundex: first letter plus up to three consonant codes
pub fn soundex(s: &str) -> String {
    let letters: Vec<char> = s
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let Some(&first) = letters.first() else {
        return String::new();
    };

    let code = |c: char| -> Option<char> {
        match c {
            'b' | 'f' | 'p' | 'v' => Some('1'),
            'c' | 'g' | 'j' | 'k' | 'q' | 's' | 'x' | 'z' => Some('2'),
            'd' | 't' => Some('3'),
            'l' => Some('4'),
            'm' | 'n' => Some('5'),
            'r' => Some('6'),
            _ => None,
        }
    };

    let mut out = String::with_capacity(4);
    out.push(first.to_ascii_uppercase());
    let mut last_code = code(first);
    for &c in &letters[1..] {
        let current = code(c);
        match current {
            Some(digit) if current != last_code => {
                out.push(digit);
                if out.len() == 4 {
                    break;
                }
            }
            _ => {}
        }
        // 'h' and 'w' are transparent; vowels reset the run
        if c != 'h' && c != 'w' {
            last_code = current;
        }
    }
    while out.len() < 4 {
        out.push('0');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexical_identity() {
        assert_eq!(lexical_similarity("hostname", "hostname"), 1.0);
    }

    #[test]
    fn test_lexical_bounds() {
        for (a, b) in [
            ("srvr_nm", "hostname"),
            ("ip", "ip_address"),
            ("", "os_version"),
            ("a", "zzzzzz"),
        ] {
            let s = lexical_similarity(a, b);
            assert!((0.0..=1.0).contains(&s), "{} vs {} gave {}", a, b, s);
        }
    }

    #[test]
    fn test_lexical_containment() {
        // Containment dominates edit ratio and word overlap for this pair
        assert_eq!(lexical_similarity("ip", "ip_address"), 0.85);
        assert!(lexical_similarity("host_name", "name") >= 0.85);
    }

    #[test]
    fn test_lexical_word_overlap() {
        // Shared tokens in a different order still score well
        let s = lexical_similarity("name_host", "host_name");
        assert!(s >= 0.9);
    }

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("host", "host"), 0);
    }

    #[test]
    fn test_convention_detection() {
        assert_eq!(detect_convention("host_name"), NamingConvention::Snake);
        assert_eq!(detect_convention("hostName"), NamingConvention::Camel);
        assert_eq!(detect_convention("HostName"), NamingConvention::Pascal);
        assert_eq!(detect_convention("host-name"), NamingConvention::Kebab);
        assert_eq!(detect_convention("SRVR_NM"), NamingConvention::Upper);
        assert_eq!(detect_convention("hostname"), NamingConvention::Snake);
    }

    #[test]
    fn test_structural_same_convention_bonus() {
        assert_eq!(structural_similarity("host_name", "ip_address"), 0.8);
    }

    #[test]
    fn test_structural_fallback_blend() {
        let s = structural_similarity("SRVR_NM", "hostname");
        assert!((0.0..=1.0).contains(&s));
        assert!(s < 0.8);
    }

    #[test]
    fn test_phonetic_equality_is_binary() {
        assert_eq!(phonetic_similarity("color", "colour"), 1.0);
        assert_eq!(phonetic_similarity("host", "memory"), 0.0);
    }

    #[test]
    fn test_phonetic_empty_never_matches() {
        assert_eq!(phonetic_similarity("", ""), 0.0);
    }

    #[test]
    fn test_semantic_categories() {
        assert!(semantic_categories("asset_id").contains("identifier"));
        assert!(semantic_categories("created_at").contains("date"));
        assert!(semantic_categories("hostname").contains("name"));
        assert!(semantic_categories("xyzzy").is_empty());
    }

    #[test]
    fn test_pattern_overlap() {
        let s = pattern_similarity("srvr_nm", "hostname");
        assert_eq!(s, Some(1.0));
        assert_eq!(pattern_similarity("qqq", "zzz"), None);
        let partial = pattern_similarity("status_type", "device_type");
        assert!(partial.is_some());
        let value = partial.unwrap_or_default();
        assert!(value > 0.0 && value < 1.0);
    }
}
