use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::ClassifierError;

/// One labelled training example.
///
/// Corpus files are JSON Lines; the `Resume` / `Category` column names of the
/// public résumé dataset are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledResume {
    #[serde(alias = "Resume", alias = "resume")]
    pub text: String,
    #[serde(alias = "Category", alias = "label")]
    pub category: String,
}

impl LabeledResume {
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
        }
    }
}

/// Reads a JSON Lines corpus, skipping blank lines.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<LabeledResume>, ClassifierError> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);

    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: LabeledResume = serde_json::from_str(&line).map_err(|e| {
            ClassifierError::Validation(format!("{}:{}: {}", path.display(), line_no + 1, e))
        })?;
        records.push(record);
    }

    log::info!("Loaded {} corpus records from {:?}", records.len(), path);
    Ok(records)
}

/// Drops records whose raw text was already seen, keeping the first one.
pub fn dedup_by_text(records: Vec<LabeledResume>) -> Vec<LabeledResume> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.text.clone()))
        .collect()
}
