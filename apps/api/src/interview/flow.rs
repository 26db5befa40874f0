//! Interview flow: Idle → QuestionsGenerated → Evaluated.
//!
//! Submission and evaluation happen in one call; there is no separate
//! "answers submitted" state.

use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::interview::sessions::{InterviewSession, InterviewSessions};
use crate::llm_client::{Evaluation, LlmGateway, QaPair};

/// Topic used when the client does not name one.
pub const DEFAULT_TOPIC: &str = "general software engineering";

/// Placeholder sent to the model for a question the candidate skipped.
pub const MISSING_ANSWER: &str = "(no answer provided)";

#[derive(Debug, Clone, Serialize)]
pub struct StartedInterview {
    pub session_id: String,
    pub topic: String,
    pub questions: Vec<String>,
}

/// Generates questions for `topic` (or the default) and opens a session for them.
pub async fn start_interview(
    llm: &LlmGateway,
    sessions: &InterviewSessions,
    topic: Option<&str>,
) -> Result<StartedInterview, AppError> {
    let topic = topic
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TOPIC)
        .to_string();

    let questions = llm.generate_questions(&topic).await?;
    let session_id = sessions.create(topic.clone(), questions.clone());

    info!("Interview session {session_id} started on topic '{topic}'");

    Ok(StartedInterview {
        session_id,
        topic,
        questions,
    })
}

/// Evaluates the answers for a known session. An unknown session id fails
/// before the model is called.
pub async fn submit_answers(
    llm: &LlmGateway,
    sessions: &InterviewSessions,
    session_id: &str,
    answers: &HashMap<String, String>,
) -> Result<Evaluation, AppError> {
    let session = sessions.get(session_id)?;
    let transcript = build_transcript(&session, answers);

    let evaluation = llm.evaluate_transcript(&transcript).await?;
    info!(
        "Interview session {session_id} evaluated (score: {:?})",
        evaluation.score
    );
    Ok(evaluation)
}

/// Pairs each generated question with its answer, in the order they were generated.
/// Answers keyed by unknown questions are ignored.
pub fn build_transcript(session: &InterviewSession, answers: &HashMap<String, String>) -> Vec<QaPair> {
    session
        .questions
        .iter()
        .map(|question| QaPair {
            question: question.clone(),
            answer: answers
                .get(question)
                .map(|a| a.trim())
                .filter(|a| !a.is_empty())
                .unwrap_or(MISSING_ANSWER)
                .to_string(),
        })
        .collect()
}
