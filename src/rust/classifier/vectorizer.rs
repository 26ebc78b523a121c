use std::collections::{BTreeMap, HashMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"\b\w\w+\b").unwrap();
}

/// Sparse document row: `(feature index, value)` pairs sorted by index.
pub type SparseRow = Vec<(usize, f64)>;

/// Vectorizer hyper-parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Inclusive n-gram range over word tokens
    pub ngram_range: (usize, usize),
    /// Drop terms seen in fewer documents than this
    pub min_df: usize,
    /// Drop terms seen in more than this fraction of documents
    pub max_df: f64,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            ngram_range: (1, 2),
            min_df: 2,
            max_df: 0.9,
        }
    }
}

/// TF-IDF over word n-grams with document-frequency pruning.
///
/// IDF is smoothed (`ln((1 + n) / (1 + df)) + 1`) and every output row is
/// L2-normalised. Term indices follow the lexical order of the vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    config: VectorizerConfig,
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn fit(documents: &[String], config: VectorizerConfig) -> Result<Self, ClassifierError> {
        let (min_n, max_n) = config.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ClassifierError::Validation(format!(
                "Invalid n-gram range ({}, {})",
                min_n, max_n
            )));
        }
        if documents.is_empty() {
            return Err(ClassifierError::Training("Cannot fit a vectorizer on an empty corpus".into()));
        }

        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            let unique: HashSet<String> = Self::analyze(doc, config.ngram_range).into_iter().collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let n_docs = documents.len();
        let max_doc_count = config.max_df * n_docs as f64;
        let kept: BTreeMap<String, usize> = doc_freq
            .into_iter()
            .filter(|(_, df)| *df >= config.min_df && (*df as f64) <= max_doc_count)
            .collect();

        if kept.is_empty() {
            return Err(ClassifierError::Training(format!(
                "No terms remain after pruning (min_df={}, max_df={}, documents={})",
                config.min_df, config.max_df, n_docs
            )));
        }

        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(kept.len());
        for (index, (term, df)) in kept.into_iter().enumerate() {
            idf.push(((1.0 + n_docs as f64) / (1.0 + df as f64)).ln() + 1.0);
            vocabulary.insert(term, index);
        }

        log::info!("Fitted TF-IDF vocabulary: {} terms from {} documents", idf.len(), n_docs);
        Ok(Self { config, vocabulary, idf })
    }

    pub fn transform(&self, document: &str) -> SparseRow {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in Self::analyze(document, self.config.ngram_range) {
            if let Some(&index) = self.vocabulary.get(&term) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut row: SparseRow = counts
            .into_iter()
            .map(|(index, tf)| (index, tf * self.idf[index]))
            .collect();
        row.sort_unstable_by_key(|&(index, _)| index);

        let norm = row.iter().map(|&(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for entry in &mut row {
                entry.1 /= norm;
            }
        }
        row
    }

    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    pub fn config(&self) -> VectorizerConfig {
        self.config
    }

    pub fn contains(&self, term: &str) -> bool {
        self.vocabulary.contains_key(term)
    }

    /// Word tokens of two or more characters, expanded to n-grams.
    fn analyze(document: &str, (min_n, max_n): (usize, usize)) -> Vec<String> {
        let tokens: Vec<&str> = TOKEN.find_iter(document).map(|m| m.as_str()).collect();
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            if n > tokens.len() {
                break;
            }
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "python machine learning pandas".to_string(),
            "python machine learning statistics".to_string(),
            "recruiting payroll onboarding".to_string(),
            "recruiting payroll employee relations".to_string(),
            "python recruiting".to_string(),
        ]
    }

    #[test]
    fn test_min_df_prunes_rare_terms() {
        let vectorizer = TfidfVectorizer::fit(&corpus(), VectorizerConfig::default()).unwrap();
        assert!(vectorizer.contains("machine learning"));
        assert!(vectorizer.contains("payroll"));
        assert!(!vectorizer.contains("pandas"));
        assert!(!vectorizer.contains("onboarding"));
    }

    #[test]
    fn test_max_df_prunes_ubiquitous_terms() {
        let docs = vec![
            "common alpha".to_string(),
            "common alpha".to_string(),
            "common beta".to_string(),
            "common beta".to_string(),
        ];
        let vectorizer = TfidfVectorizer::fit(&docs, VectorizerConfig::default()).unwrap();
        assert!(!vectorizer.contains("common"));
        assert!(vectorizer.contains("alpha"));
        assert!(vectorizer.contains("common beta"));
    }

    #[test]
    fn test_rows_are_unit_length_and_sorted() {
        let vectorizer = TfidfVectorizer::fit(&corpus(), VectorizerConfig::default()).unwrap();
        let row = vectorizer.transform("python machine learning and payroll");
        let norm: f64 = row.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
        assert!(row.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_unknown_text_yields_empty_row() {
        let vectorizer = TfidfVectorizer::fit(&corpus(), VectorizerConfig::default()).unwrap();
        assert!(vectorizer.transform("zzz qqq").is_empty());
        assert!(vectorizer.transform("").is_empty());
    }

    #[test]
    fn test_single_character_tokens_are_ignored() {
        let docs = vec!["a b c".to_string(), "a b c".to_string()];
        let result = TfidfVectorizer::fit(&docs, VectorizerConfig::default());
        assert!(matches!(result, Err(ClassifierError::Training(_))));
    }
}
