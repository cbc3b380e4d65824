//! Word-list profanity masking

use regex::{Captures, Regex, RegexBuilder};
use tracing::debug;

use crate::error::Result;

const BUILTIN_WORDS: &[&str] = &[
    "arse", "ass", "asshole", "bitch", "bitches", "bollocks", "bullshit", "cock", "crap", "cunt",
    "damn", "dick", "dickhead", "douche", "fag", "faggot", "fuck", "fucked", "fucker", "fucking",
    "motherfucker", "nigger", "piss", "prick", "pussy", "shit", "shitty", "slut", "twat", "wank",
    "wanker", "whore",
];

/// Words the portal adds on top of the built-in list
const PORTAL_WORDS: &[&str] = &["paki", "hentai", "bastard", "hutto"];

/// Replaces listed words with `*` of the same length
///
/// Matching is case-insensitive and only on whole words, so "class" is left
/// alone even though it contains a listed word.
#[derive(Debug, Clone)]
pub struct ProfanityFilter {
    pattern: Regex,
}

impl ProfanityFilter {
    pub fn new<S: AsRef<str>>(extra_words: &[S]) -> Result<Self> {
        let mut words: Vec<String> = BUILTIN_WORDS
            .iter()
            .chain(PORTAL_WORDS)
            .map(|word| word.to_string())
            .chain(
                extra_words
                    .iter()
                    .map(|word| word.as_ref().trim().to_lowercase())
                    .filter(|word| !word.is_empty()),
            )
            .collect();
        // Longest first so alternation prefers "fucking" over "fuck"
        words.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        words.dedup();

        let alternation = words
            .iter()
            .map(|word| regex::escape(word))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = RegexBuilder::new(&format!(r"\b(?:{})\b", alternation))
            .case_insensitive(true)
            .build()?;

        debug!("Profanity filter loaded with {} words", words.len());
        Ok(Self { pattern })
    }

    pub fn is_profane(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    pub fn clean(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &Captures| "*".repeat(caps[0].chars().count()))
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> ProfanityFilter {
        ProfanityFilter::new::<&str>(&[]).unwrap()
    }

    #[test]
    fn test_masks_whole_words_only() {
        let filter = filter();
        assert_eq!(filter.clean("what the SHIT"), "what the ****");
        assert_eq!(filter.clean("see you in class"), "see you in class");
        assert!(!filter.is_profane("Scunthorpe"));
    }

    #[test]
    fn test_portal_words() {
        let filter = filter();
        assert_eq!(filter.clean("you Bastard"), "you *******");
        assert_eq!(filter.clean("hutto!"), "*****!");
    }

    #[test]
    fn test_extra_words() {
        let filter = ProfanityFilter::new(&["  Gobshite "]).unwrap();
        assert_eq!(filter.clean("gobshite again"), "******** again");
        assert!(filter.is_profane("fucking hell"));
        assert_eq!(filter.clean("fucking hell"), "******* hell");
    }
}
