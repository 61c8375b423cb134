use async_trait::async_trait;

use crate::Result;

pub mod gemini;

/// Opaque text generator: prompt in, text out. No side effects.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Wraps a short topic in the structural instructions for a full article body.
pub fn draft_prompt(topic: &str) -> String {
    format!(
        r#"Write a clean blog article about: "{topic}".
- Start with a headline
- Then a 2-3 line intro paragraph
- Then sections with headings and short paragraphs
- Use bullet points and numbered lists where appropriate
- Include a conclusion paragraph summarizing the article
- Give the result in HTML format with proper tags
- Do NOT wrap the content in backticks or any code block formatting such as ```html
- No prefixes like "Here is your content" or "As requested"
- Use a conversational, engaging and informative tone with proper grammar and spelling"#
    )
}

/// Trims the generated text and drops a wrapping Markdown fence, if any.
pub fn clean_generated(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };

    // the info string (e.g. "html") ends at whitespace or the first tag
    let body = rest
        .trim_start_matches(|c: char| !c.is_whitespace() && c != '<')
        .trim();
    body.strip_suffix("```").unwrap_or(body).trim().to_string()
}
