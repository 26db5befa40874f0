// Mock-interview flow: generate questions for a topic, hold them in a
// session, then evaluate the submitted answers.
// All model calls go through llm_client::LlmGateway.

pub mod flow;
pub mod handlers;
pub mod sessions;
