//! Reusable prompts using Handlebars for templating. Strict mode is
//! on so a template referencing a missing field fails loudly instead
//! of rendering an empty string.

use std::fmt;

use anyhow::Result;
use handlebars::{Handlebars, no_escape};
use serde_json::json;

use crate::core::KnowledgeBase;

#[derive(Debug)]
pub enum Prompt {
    CollegeAssistant,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<Prompt> for String {
    fn from(item: Prompt) -> String {
        format!("{:?}", item)
    }
}

const COLLEGE_ASSISTANT_PROMPT: &str = r"You are a helpful and knowledgeable assistant for Amrita Vishwa Vidyapeetham, Coimbatore campus.

Use this knowledge base to answer questions accurately:
{{knowledge}}

Guidelines:
- Be friendly, helpful, and informative
- Provide specific details when available
- If you don't know something specific, say so and suggest contacting the college directly
- Keep responses concise but comprehensive
- Always maintain a positive and welcoming tone";

/// Questions offered to new users as conversation starters.
pub const SUGGESTED_QUESTIONS: [&str; 3] = [
    "What academic programs are available at Amrita College?",
    "Tell me about the campus facilities and hostels",
    "How can I contact Amrita College?",
];

pub fn templates<'a>() -> Result<Handlebars<'a>> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    // Prompts are plain text, HTML escaping would mangle the
    // knowledge base (e.g. `&` in "AI & Data Science")
    registry.register_escape_fn(no_escape);
    registry.register_template_string(
        &Prompt::CollegeAssistant.to_string(),
        COLLEGE_ASSISTANT_PROMPT,
    )?;
    Ok(registry)
}

/// Render the system prompt with the full knowledge base text
/// interpolated verbatim.
pub fn system_prompt(templates: &Handlebars, knowledge: &KnowledgeBase) -> Result<String> {
    let rendered = templates.render(
        &Prompt::CollegeAssistant.to_string(),
        &json!({ "knowledge": knowledge.text() }),
    )?;
    Ok(rendered)
}
