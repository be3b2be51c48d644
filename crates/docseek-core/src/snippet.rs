//! Snippet windows around query matches.
//!
//! One snippet per distinct query term, anchored on the term's first
//! case-insensitive occurrence in the document. The window extends a fixed
//! `radius` of characters either side of the match and carries one highlight
//! range. All offsets are in characters.

use crate::index::query_terms;
use crate::models::SearchSnippet;

#[derive(Debug, Clone, PartialEq)]
pub struct SnippetOptions {
    /// Characters of context on each side of a match.
    pub radius: usize,
    /// Cap on snippets per document, however many terms match.
    pub max_snippets: usize,
}

impl Default for SnippetOptions {
    fn default() -> Self {
        Self {
            radius: 50,
            max_snippets: 3,
        }
    }
}

/// Build snippets for `query` over `text`. Empty when nothing matches.
pub fn build_snippets(text: &str, query: &str, options: &SnippetOptions) -> Vec<SearchSnippet> {
    let terms = query_terms(query);
    if terms.is_empty() || options.max_snippets == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let folded: Vec<char> = chars.iter().map(|c| fold(*c)).collect();

    let mut snippets = Vec::new();
    for term in terms {
        if snippets.len() >= options.max_snippets {
            break;
        }
        let needle: Vec<char> = term.chars().collect();
        let Some(pos) = find(&folded, &needle) else {
            continue;
        };
        let start = pos.saturating_sub(options.radius);
        let end = (pos + needle.len() + options.radius).min(chars.len());
        snippets.push(SearchSnippet {
            text: chars[start..end].iter().collect(),
            positions: vec![pos],
            highlights: vec![(pos - start, pos - start + needle.len())],
        });
    }
    snippets
}

/// Lowercase a char when that keeps it a single char, so folded and
/// original text stay offset-aligned.
fn fold(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

fn find(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
