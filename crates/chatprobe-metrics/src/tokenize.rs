//! Word tokenization and keyword extraction.

use lazy_static::lazy_static;
use std::collections::{BTreeSet, HashSet};
use unicode_segmentation::UnicodeSegmentation;

lazy_static! {
    /// English function words, including common contractions.
    static ref STOPWORDS: HashSet<&'static str> = [
        "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and",
        "any", "are", "aren't", "as", "at", "be", "because", "been", "before", "being", "below",
        "between", "both", "but", "by", "can", "can't", "cannot", "could", "couldn't", "did",
        "didn't", "do", "does", "doesn't", "doing", "don't", "down", "during", "each", "either",
        "else", "ever", "few", "for", "from", "further", "had", "hadn't", "has", "hasn't",
        "have", "haven't", "having", "he", "he's", "her", "here", "hers", "herself", "him",
        "himself", "his", "how", "however", "i", "i'd", "i'll", "i'm", "i've", "if", "in",
        "into", "is", "isn't", "it", "it's", "its", "itself", "just", "let's", "may", "me",
        "might", "more", "most", "must", "mustn't", "my", "myself", "neither", "no", "nor",
        "not", "now", "of", "off", "often", "on", "once", "only", "or", "other", "ought", "our",
        "ours", "ourselves", "out", "over", "own", "per", "please", "quite", "rather", "really",
        "same", "shall", "shan't", "she", "she's", "should", "shouldn't", "so", "some", "such",
        "than", "that", "that's", "the", "their", "theirs", "them", "themselves", "then",
        "there", "there's", "these", "they", "they're", "this", "those", "though", "through",
        "thus", "to", "too", "under", "until", "up", "upon", "us", "very", "was", "wasn't",
        "we", "we're", "were", "weren't", "what", "what's", "when", "where", "whether", "which",
        "while", "who", "who's", "whom", "whose", "why", "will", "with", "within", "without",
        "won't", "would", "wouldn't", "yet", "you", "you'd", "you'll", "you're", "you've",
        "your", "yours", "yourself", "yourselves",
    ]
    .into_iter()
    .collect();
}

/// Lowercased Unicode words, in order. Punctuation and whitespace are dropped.
pub fn words(text: &str) -> Vec<String> {
    text.unicode_words()
        .map(|w| w.to_lowercase().replace('\u{2019}', "'"))
        .collect()
}

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

fn strip_possessive(word: &str) -> &str {
    word.strip_suffix("'s").unwrap_or(word)
}

/// Content-bearing words: no stopwords, no single characters, possessives folded.
pub fn keywords(text: &str) -> BTreeSet<String> {
    words(text)
        .iter()
        .filter(|w| !is_stopword(w))
        .map(|w| strip_possessive(w))
        .filter(|w| w.chars().count() > 1 && !is_stopword(w))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_are_lowercased_without_punctuation() {
        assert_eq!(
            words("Paris is the capital of France."),
            vec!["paris", "is", "the", "capital", "of", "france"]
        );
    }

    #[test]
    fn contractions_stay_whole_and_are_stopwords() {
        assert_eq!(words("I don’t know."), vec!["i", "don't", "know"]);
        let k: Vec<String> = keywords("I don't know.").into_iter().collect();
        assert_eq!(k, vec!["know"]);
    }

    #[test]
    fn possessives_fold_onto_the_noun() {
        let k = keywords("France's capital");
        assert!(k.contains("france"));
        assert!(k.contains("capital"));
        assert_eq!(k.len(), 2);
    }

    #[test]
    fn single_characters_are_dropped() {
        assert!(keywords("x y z").is_empty());
        assert_eq!(keywords("Plan B works").len(), 2);
    }
}
