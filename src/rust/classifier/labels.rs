use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::error::ClassifierError;

/// Maps category strings to dense class indices.
///
/// The vocabulary is the sorted set of labels seen at fit time and never
/// changes afterwards; index `i` always names the same category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Result<Self, ClassifierError> {
        let classes: BTreeSet<&str> = labels.iter().map(AsRef::as_ref).collect();
        if classes.len() < 2 {
            return Err(ClassifierError::Training(format!(
                "At least two categories are required, found {}",
                classes.len()
            )));
        }
        Ok(Self {
            classes: classes.into_iter().map(str::to_string).collect(),
        })
    }

    pub fn transform<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>, ClassifierError> {
        labels
            .iter()
            .map(|label| {
                let label = label.as_ref();
                self.index_of(label).ok_or_else(|| {
                    ClassifierError::Validation(format!("Unknown category '{}'", label))
                })
            })
            .collect()
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.classes.binary_search_by(|probe| probe.as_str().cmp(label)).ok()
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
