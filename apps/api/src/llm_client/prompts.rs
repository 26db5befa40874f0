// Prompt templates for the interview flow.
//
// The question template is the wire contract with the model: `parsing::parse_questions`
// expects the marker line followed by exactly QUESTION_COUNT numbered lines.

use crate::llm_client::QaPair;

/// Literal line that precedes the numbered questions in a model reply.
pub const QUESTIONS_MARKER: &str = "QUESTIONS:";

/// Number of questions requested per interview.
pub const QUESTION_COUNT: usize = 5;

/// Interview question prompt. Replace `{topic}` before sending.
pub const INTERVIEW_PROMPT_TEMPLATE: &str = r#"You are an experienced HR interviewer.
Write EXACTLY 5 interview questions about the topic: {topic}.

Reply strictly in this format and nothing else:

QUESTIONS:
1. <question>
2. <question>
3. <question>
4. <question>
5. <question>
"#;

/// Evaluation prompt. Replace `{transcript}` before sending.
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"You are an experienced HR interviewer reviewing a mock interview.
Below is the transcript of questions and the candidate's answers.

{transcript}

Evaluate the candidate and reply with:
Summary: a 3-sentence summary of the performance.
Strengths: the main strengths shown.
Weaknesses: the main weaknesses and how to improve them.
Score: an overall score from 1 to 10, written as "Score: N/10".
"#;

/// Renders the question-generation prompt for `topic`. Pure and deterministic.
pub fn build_interview_prompt(topic: &str) -> String {
    INTERVIEW_PROMPT_TEMPLATE.replace("{topic}", topic.trim())
}

/// Renders the evaluation prompt for a transcript kept in question order.
pub fn build_evaluation_prompt(pairs: &[QaPair]) -> String {
    let transcript = pairs
        .iter()
        .enumerate()
        .map(|(i, pair)| {
            format!(
                "Question {n}: {q}\nAnswer {n}: {a}",
                n = i + 1,
                q = pair.question,
                a = pair.answer
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    EVALUATION_PROMPT_TEMPLATE.replace("{transcript}", &transcript)
}
