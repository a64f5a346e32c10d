use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static RE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:https?://.)?(?:www\.)?[-a-zA-Z0-9@%._+~#=]{2,256}\.[a-z]{2,6}\b(?:[-a-zA-Z0-9@:%_+.~#?&/=]*)",
    )
    .unwrap()
});

static RE_HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

static RE_NON_ALPHA: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z ]").unwrap());

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any",
        "are", "as", "at", "be", "because", "been", "before", "being", "below", "between",
        "both", "but", "by", "can", "did", "do", "does", "doing", "down", "during", "each",
        "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here",
        "hers", "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it",
        "its", "itself", "just", "me", "more", "most", "my", "myself", "no", "nor", "not",
        "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves",
        "out", "over", "own", "same", "she", "should", "so", "some", "such", "than", "that",
        "the", "their", "theirs", "them", "themselves", "then", "there", "these", "they",
        "this", "those", "through", "to", "too", "under", "until", "up", "very", "was", "we",
        "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will",
        "with", "you", "your", "yours", "yourself", "yourselves",
    ]
    .into_iter()
    .collect()
});

// Letters that double before -ing/-ed ("running", "planned"). l/s/z are
// excluded so "rolling" keeps its stem intact.
const DOUBLING_CONSONANTS: [char; 8] = ['b', 'd', 'g', 'm', 'n', 'p', 'r', 't'];

/// Heuristic verb lemmatizer: strips -s/-es/-ed/-ing style suffixes with
/// restore rules. Lexicon-free, so irregular verbs pass through unchanged.
fn lemmatize_verb(word: &str) -> String {
    let len = word.len();
    if len < 4 {
        return word.to_string();
    }

    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{stem}y");
    }
    if let Some(stem) = word.strip_suffix("ied") {
        return format!("{stem}y");
    }
    if len > 5 {
        if let Some(stem) = word.strip_suffix("ing") {
            return undouble(stem);
        }
    }
    if len > 4 {
        if let Some(stem) = word.strip_suffix("ed") {
            return undouble(stem);
        }
    }
    if let Some(stem) = word.strip_suffix("es") {
        if len > 4 {
            return match stem.chars().last() {
                Some('s') | Some('x') | Some('z') | Some('h') => stem.to_string(),
                _ => format!("{stem}e"),
            };
        }
    }
    if word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") && !word.ends_with("is")
    {
        return word[..len - 1].to_string();
    }

    word.to_string()
}

fn undouble(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    if n >= 2 && chars[n - 1] == chars[n - 2] && DOUBLING_CONSONANTS.contains(&chars[n - 1]) {
        return chars[..n - 1].iter().collect();
    }
    stem.to_string()
}

/// Clean free text into the token stream the text encoder consumes:
/// lowercase, strip URLs and HTML tags, drop non-alphabetic characters,
/// collapse whitespace, drop stop words and single-letter tokens, then
/// lemmatize verb suffixes.
pub fn preprocess(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let lowered = text.to_lowercase();
    let no_urls = RE_URL.replace_all(&lowered, "");
    let no_tags = RE_HTML_TAG.replace_all(&no_urls, "");
    let alpha_only = RE_NON_ALPHA.replace_all(&no_tags, "");
    let collapsed = RE_WHITESPACE.replace_all(&alpha_only, " ");

    collapsed
        .split_whitespace()
        .filter(|token| token.len() > 1 && !STOP_WORDS.contains(token))
        .map(lemmatize_verb)
        .collect()
}

/// Preprocess and rejoin with single spaces. Empty input yields an empty
/// string, not an error.
pub fn clean(text: &str) -> String {
    preprocess(text).join(" ")
}
