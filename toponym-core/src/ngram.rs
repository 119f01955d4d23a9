//! Character n-gram language model over the distinct corpus names.
//!
//! Each name is padded as `$$name##`. Letters are counted over the name
//! itself, bigrams over every adjacent pair from `$c0` to `c{n-1}#`, and
//! trigrams over every adjacent triple from `$$c0` to `c{n-1}##`. A name of
//! `n` characters therefore contributes `n` letter tokens, `n + 1` bigram
//! tokens and `n + 2` trigram tokens.

use std::{cmp::Reverse, collections::BTreeMap, fmt};

use tracing::{debug, instrument};

use crate::{error::NGramError, trie::SuffixTrie};

/// Padding character placed before every name.
pub const START_SENTINEL: char = '$';
/// Padding character placed after every name.
pub const END_SENTINEL: char = '#';

/// Which n-gram table a query addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NGramKind {
    /// Single characters.
    Letter,
    /// Adjacent character pairs.
    Bigram,
    /// Adjacent character triples.
    Trigram,
}

impl NGramKind {
    /// Returns a stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Letter => "letter",
            Self::Bigram => "bigram",
            Self::Trigram => "trigram",
        }
    }
}

impl fmt::Display for NGramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Letter, bigram and trigram counts with their token totals.
///
/// The model is immutable once built.
///
/// # Examples
/// ```
/// use toponym_core::NGramModel;
///
/// let model = NGramModel::from_names(["ab", "b"]);
/// assert_eq!(model.letter_count('b')?, 2);
/// assert_eq!(model.bigram_count("b#")?, 2);
/// assert_eq!(model.trigram_tokens(), 7);
/// assert!(model.bigram_count("##").is_err());
/// # Ok::<(), toponym_core::NGramError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NGramModel {
    letters: BTreeMap<char, u64>,
    bigrams: BTreeMap<String, u64>,
    trigrams: BTreeMap<String, u64>,
    letter_tokens: u64,
    bigram_tokens: u64,
    trigram_tokens: u64,
}

impl NGramModel {
    /// Counts the n-grams of every name yielded by `names`.
    #[must_use]
    pub fn from_names<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut model = Self::default();
        for name in names {
            model.add_name(name);
        }
        model
    }

    /// Counts the n-grams of the distinct names stored in `trie`.
    #[must_use]
    #[instrument(name = "ngram.build", skip(trie), fields(names = tracing::field::Empty))]
    pub fn from_trie(trie: &SuffixTrie) -> Self {
        let model = Self::from_names(trie.names());
        tracing::Span::current().record("names", trie.name_nodes().count());
        debug!(
            letters = model.letters.len(),
            bigrams = model.bigrams.len(),
            trigrams = model.trigrams.len(),
            "n-gram tables built"
        );
        model
    }

    fn add_name(&mut self, name: &str) {
        let padded: Vec<char> = [START_SENTINEL, START_SENTINEL]
            .into_iter()
            .chain(name.chars())
            .chain([END_SENTINEL, END_SENTINEL])
            .collect();
        let length = padded.len() as u64 - 4;

        for &letter in padded.iter().skip(2).take(padded.len() - 4) {
            *self.letters.entry(letter).or_default() += 1;
        }
        // The final window `##` is not a bigram.
        for pair in padded.windows(2).skip(1).take(padded.len() - 3) {
            *self.bigrams.entry(pair.iter().collect()).or_default() += 1;
        }
        for triple in padded.windows(3) {
            *self.trigrams.entry(triple.iter().collect()).or_default() += 1;
        }

        self.letter_tokens += length;
        self.bigram_tokens += length + 1;
        self.trigram_tokens += length + 2;
    }

    /// Returns how often `letter` occurs in the corpus names.
    ///
    /// # Errors
    /// Returns [`NGramError::Unknown`] when the letter never occurs.
    pub fn letter_count(&self, letter: char) -> Result<u64, NGramError> {
        self.letters
            .get(&letter)
            .copied()
            .ok_or_else(|| unknown(NGramKind::Letter, letter.to_string()))
    }

    /// Returns how often `bigram` occurs in the padded names.
    ///
    /// # Errors
    /// Returns [`NGramError::Unknown`] when the bigram never occurs.
    pub fn bigram_count(&self, bigram: &str) -> Result<u64, NGramError> {
        self.bigrams
            .get(bigram)
            .copied()
            .ok_or_else(|| unknown(NGramKind::Bigram, bigram.to_owned()))
    }

    /// Returns how often `trigram` occurs in the padded names.
    ///
    /// # Errors
    /// Returns [`NGramError::Unknown`] when the trigram never occurs.
    pub fn trigram_count(&self, trigram: &str) -> Result<u64, NGramError> {
        self.trigrams
            .get(trigram)
            .copied()
            .ok_or_else(|| unknown(NGramKind::Trigram, trigram.to_owned()))
    }

    /// Returns `count(letter) / letter_tokens`.
    ///
    /// # Errors
    /// Returns [`NGramError::Unknown`] when the letter never occurs.
    pub fn letter_probability(&self, letter: char) -> Result<f64, NGramError> {
        Ok(ratio(self.letter_count(letter)?, self.letter_tokens))
    }

    /// Returns `count(bigram) / bigram_tokens`.
    ///
    /// # Errors
    /// Returns [`NGramError::Unknown`] when the bigram never occurs.
    pub fn bigram_probability(&self, bigram: &str) -> Result<f64, NGramError> {
        Ok(ratio(self.bigram_count(bigram)?, self.bigram_tokens))
    }

    /// Returns `count(trigram) / trigram_tokens`.
    ///
    /// # Errors
    /// Returns [`NGramError::Unknown`] when the trigram never occurs.
    pub fn trigram_probability(&self, trigram: &str) -> Result<f64, NGramError> {
        Ok(ratio(self.trigram_count(trigram)?, self.trigram_tokens))
    }

    /// Total number of letter tokens.
    #[rustfmt::skip]
    #[must_use]
    pub fn letter_tokens(&self) -> u64 { self.letter_tokens }

    /// Total number of bigram tokens.
    #[rustfmt::skip]
    #[must_use]
    pub fn bigram_tokens(&self) -> u64 { self.bigram_tokens }

    /// Total number of trigram tokens.
    #[rustfmt::skip]
    #[must_use]
    pub fn trigram_tokens(&self) -> u64 { self.trigram_tokens }

    /// Total number of tokens in the `kind` table.
    #[must_use]
    pub fn tokens(&self, kind: NGramKind) -> u64 {
        match kind {
            NGramKind::Letter => self.letter_tokens,
            NGramKind::Bigram => self.bigram_tokens,
            NGramKind::Trigram => self.trigram_tokens,
        }
    }

    /// Number of distinct entries in the `kind` table.
    #[must_use]
    pub fn types(&self, kind: NGramKind) -> usize {
        match kind {
            NGramKind::Letter => self.letters.len(),
            NGramKind::Bigram => self.bigrams.len(),
            NGramKind::Trigram => self.trigrams.len(),
        }
    }

    /// Letters ordered by descending count, then ascending letter.
    #[must_use]
    pub fn sorted_letters(&self) -> Vec<(char, u64)> {
        sort_by_count(self.letters.iter().map(|(&letter, &count)| (letter, count)))
    }

    /// Bigrams ordered by descending count, then ascending bigram.
    #[must_use]
    pub fn sorted_bigrams(&self) -> Vec<(&str, u64)> {
        sort_by_count(self.bigrams.iter().map(|(gram, &count)| (gram.as_str(), count)))
    }

    /// Trigrams ordered by descending count, then ascending trigram.
    #[must_use]
    pub fn sorted_trigrams(&self) -> Vec<(&str, u64)> {
        sort_by_count(self.trigrams.iter().map(|(gram, &count)| (gram.as_str(), count)))
    }

    /// The `kind` table ordered by descending count with keys as strings.
    #[must_use]
    pub fn sorted(&self, kind: NGramKind) -> Vec<(String, u64)> {
        match kind {
            NGramKind::Letter => self
                .sorted_letters()
                .into_iter()
                .map(|(letter, count)| (letter.to_string(), count))
                .collect(),
            NGramKind::Bigram => owned(self.sorted_bigrams()),
            NGramKind::Trigram => owned(self.sorted_trigrams()),
        }
    }
}

fn unknown(kind: NGramKind, gram: String) -> NGramError {
    NGramError::Unknown { kind, gram }
}

fn ratio(count: u64, tokens: u64) -> f64 {
    count as f64 / tokens as f64
}

fn sort_by_count<K: Ord>(entries: impl Iterator<Item = (K, u64)>) -> Vec<(K, u64)> {
    let mut sorted: Vec<(K, u64)> = entries.collect();
    sorted.sort_by(|(left_key, left), (right_key, right)| {
        (Reverse(left), left_key).cmp(&(Reverse(right), right_key))
    });
    sorted
}

fn owned(entries: Vec<(&str, u64)>) -> Vec<(String, u64)> {
    entries
        .into_iter()
        .map(|(gram, count)| (gram.to_owned(), count))
        .collect()
}
