//! Prompt construction and reply cleanup.

use std::sync::OnceLock;

use regex::Regex;

use autofix_core::FixRequest;

/// Build the fix prompt for one attempt.
pub fn build_prompt(request: &FixRequest) -> String {
    let language = request.language.label();
    format!(
        "You are an expert {language} developer. I need your help fixing errors in a file.\n\
         \n\
         File Path: {path}\n\
         File Type: {language}\n\
         Attempt: {attempt}/{max}\n\
         \n\
         The file has the following errors:\n\
         {errors}\n\
         \n\
         Here is the current content of the file:\n\
         ```\n\
         {content}\n\
         ```\n\
         \n\
         Please provide ONLY the fixed version of the file with no explanation. \
         Your response should be the complete file content that resolves the errors.",
        language = language,
        path = request.path,
        attempt = request.attempt,
        max = request.max_attempts,
        errors = request.error_text(),
        content = request.content,
    )
}

fn fenced_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```\w*\n(.+?)```").expect("valid fence regex"))
}

/// Strip a markdown code fence from a model reply.
///
/// The body of the first complete fenced block is returned. A reply whose
/// fences do not form such a block yields the lines after the first fence
/// line up to the next one (or to the end). Replies without fences are
/// returned unchanged.
pub fn unwrap_code_fence(reply: &str) -> String {
    if !reply.contains("```") {
        return reply.to_string();
    }

    if let Some(body) = fenced_block().captures(reply).and_then(|c| c.get(1)) {
        return body.as_str().to_string();
    }

    let lines: Vec<&str> = reply.split('\n').collect();
    let Some(start) = lines.iter().position(|l| l.starts_with("```")) else {
        return reply.to_string();
    };
    let end = lines[start + 1..]
        .iter()
        .position(|l| l.starts_with("```"))
        .map(|offset| start + 1 + offset)
        .unwrap_or(lines.len());

    lines[start + 1..end].join("\n")
}
