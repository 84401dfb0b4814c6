use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::DEFAULT_QUESTION_LIMIT;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Passages to generate questions from.
    pub source_file: PathBuf,
    /// Where mode 1 writes its questions.
    pub questions_output: PathBuf,
    /// Where modes 2 and 3 read questions from.
    pub questions_input: PathBuf,
    pub results_dir: PathBuf,
    /// Number of questions answered per run.
    pub limit: usize,
    /// In-flight cap for mode 3; defaults to the available parallelism.
    pub concurrency: Option<usize>,
    pub continue_on_error: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            source_file: PathBuf::from("dbpedias.json"),
            questions_output: PathBuf::from("dbPediasSampleQuestions.json"),
            questions_input: PathBuf::from("DbPediaQuestions").join("dbPediasSampleQuestions.json"),
            results_dir: PathBuf::from("."),
            limit: DEFAULT_QUESTION_LIMIT,
            concurrency: None,
            continue_on_error: false,
        }
    }
}
