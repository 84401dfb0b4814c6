//! Input and output records plus their flat-file persistence.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::QuizError;

/// One passage to generate a question from.
///
/// Unknown fields (embeddings, token counts) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    #[serde(alias = "Id")]
    pub id: String,
    #[serde(alias = "Title")]
    pub title: String,
    #[serde(alias = "Text")]
    pub text: String,
}

/// A passage together with the question generated from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    #[serde(alias = "Id")]
    pub id: String,
    #[serde(alias = "Title")]
    pub title: String,
    #[serde(alias = "Text")]
    pub text: String,
    #[serde(alias = "Question", alias = "SampleQuestion")]
    pub question: String,
}

impl GeneratedQuestion {
    pub fn from_source(record: SourceRecord, question: String) -> Self {
        Self {
            id: record.id,
            title: record.title,
            text: record.text,
            question,
        }
    }
}

/// Answer text and server creation time for one question. Not persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedAnswer {
    pub id: String,
    pub answer: String,
    pub created: DateTime<Utc>,
}

impl GeneratedAnswer {
    /// Seconds between server side creation and `now`.
    pub fn duration_until(&self, now: DateTime<Utc>) -> f64 {
        let elapsed = now.signed_duration_since(self.created);
        elapsed.num_microseconds().map_or_else(
            || elapsed.num_milliseconds() as f64 / 1_000.0,
            |us| us as f64 / 1_000_000.0,
        )
    }
}

/// Loads a JSON array of records.
pub fn load_records<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>, QuizError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| QuizError::io(path, e))?;
    serde_json::from_str(&contents).map_err(|e| {
        QuizError::Json(format!(
            "{}: {} at line {} column {}",
            path.display(),
            e,
            e.line(),
            e.column()
        ))
    })
}

/// Writes questions as a compact JSON array, in the given order.
pub fn save_questions(path: impl AsRef<Path>, questions: &[GeneratedQuestion]) -> Result<(), QuizError> {
    let path = path.as_ref();
    let json = serde_json::to_string(questions)?;
    create_parent(path)?;
    fs::write(path, json).map_err(|e| QuizError::io(path, e))
}

/// Writes one duration in seconds per line.
pub fn write_durations(path: impl AsRef<Path>, samples: &[f64]) -> Result<(), QuizError> {
    let path = path.as_ref();
    let mut contents = String::with_capacity(samples.len() * 8);
    for sample in samples {
        let _ = writeln!(contents, "{sample}");
    }
    create_parent(path)?;
    fs::write(path, contents).map_err(|e| QuizError::io(path, e))
}

/// `sampleDurationResults-{count}-{label}.txt` inside `dir`.
pub fn durations_file(dir: impl AsRef<Path>, count: usize, label: &str) -> PathBuf {
    let label: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_') { c } else { '_' })
        .collect();
    dir.as_ref()
        .join(format!("sampleDurationResults-{count}-{label}.txt"))
}

fn create_parent(path: &Path) -> Result<(), QuizError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| QuizError::io(parent, e))
        }
        _ => Ok(()),
    }
}
