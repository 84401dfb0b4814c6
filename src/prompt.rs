//! Fixed prompts for the question and answer stages.

use crate::client::Prompt;

const QUESTION_SYSTEM: &str = "You write quiz questions. Given a titled paragraph, \
reply with exactly one question that the paragraph answers. Reply with the question only.";

const ANSWER_SYSTEM: &str = "You answer quiz questions. Use only the paragraph provided. \
Reply with a short, direct answer.";

/// Prompt asking the model for one question about a passage.
pub fn question_prompt(title: &str, text: &str) -> Prompt {
    Prompt {
        system: QUESTION_SYSTEM.to_string(),
        user: format!("Title: {title}\nParagraph: {text}"),
    }
}

/// Prompt asking the model to answer `question` from a passage.
pub fn answer_prompt(title: &str, text: &str, question: &str) -> Prompt {
    Prompt {
        system: ANSWER_SYSTEM.to_string(),
        user: format!("Title: {title}\nParagraph: {text}\nQuestion: {question}"),
    }
}
