// src/scoring/remediation.rs

use std::{collections::HashMap, fmt, fs, path::Path};

use url::Url;

use super::evaluator::Difficulty;

/// Topic -> (difficulty -> video URL).
/// Same shape as the JSON file accepted by `RemediationCatalog::from_json`.
type CatalogTable = HashMap<String, HashMap<Difficulty, String>>;

/// Static lookup of remedial video resources per topic and difficulty.
#[derive(Debug, Clone, PartialEq)]
pub struct RemediationCatalog {
    entries: CatalogTable,
}

#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    /// Topic, difficulty and the offending value.
    InvalidUrl(String, Difficulty, String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Io(e) => write!(f, "cannot read remediation catalog: {}", e),
            CatalogError::Parse(e) => write!(f, "malformed remediation catalog: {}", e),
            CatalogError::InvalidUrl(topic, difficulty, value) => write!(
                f,
                "invalid URL for {} / {}: {}",
                topic,
                difficulty.as_str(),
                value
            ),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Io(err)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Parse(err)
    }
}

impl Default for RemediationCatalog {
    fn default() -> Self {
        let mut entries = CatalogTable::new();
        for (topic, slug) in [
            ("Percentage", "percentage"),
            ("Algebra", "algebra"),
            ("Geometry", "geometry"),
        ] {
            let levels = [
                (Difficulty::Hard, "hard"),
                (Difficulty::Medium, "medium"),
                (Difficulty::Basic, "basic"),
            ]
            .into_iter()
            .map(|(difficulty, level)| {
                (difficulty, format!("https://example.com/{}-{}", slug, level))
            })
            .collect();
            entries.insert(topic.to_string(), levels);
        }
        Self { entries }
    }
}

impl RemediationCatalog {
    /// Parses and validates a catalog from its JSON form:
    /// `{"Algebra": {"Basic": "https://...", "Hard": "https://..."}}`.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let entries: CatalogTable = serde_json::from_str(raw)?;

        for (topic, levels) in &entries {
            for (difficulty, link) in levels {
                if Url::parse(link).is_err() {
                    return Err(CatalogError::InvalidUrl(
                        topic.clone(),
                        *difficulty,
                        link.clone(),
                    ));
                }
            }
        }

        Ok(Self { entries })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Returns the resource for `(topic, difficulty)`, or `None` when nothing is
    /// catalogued so the caller can show a placeholder.
    pub fn lookup(&self, topic: &str, difficulty: Difficulty) -> Option<&str> {
        self.entries
            .get(topic)
            .and_then(|levels| levels.get(&difficulty))
            .map(String::as_str)
    }

    pub fn topic_count(&self) -> usize {
        self.entries.len()
    }
}
