//! Integration tests for the LLM fix requester using a scripted client.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use autofix_core::{CoreError, ErrorDescriptor, FixRequest, FixRequester, FixSuggestion, Language};
use autofix_llm::{CompletionClient, LlmError, LlmFixRequester, LlmResult};

/// Replays canned replies and keeps every prompt it was sent.
struct ScriptedClient {
    replies: Mutex<VecDeque<LlmResult<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    fn new(replies: Vec<LlmResult<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, prompt: &str) -> LlmResult<String> {
        self.prompts.lock().push(prompt.to_string());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }
}

fn request() -> FixRequest {
    FixRequest {
        path: "src/app.js".to_string(),
        language: Language::JavaScriptTypeScript,
        content: "const x = 1\n".to_string(),
        errors: vec![ErrorDescriptor::lint("Missing semicolon", Some(1), Some(12))],
        attempt: 1,
        max_attempts: 3,
    }
}

#[tokio::test]
async fn test_fenced_reply_becomes_replacement() {
    let client = ScriptedClient::new(vec![Ok(
        "Sure! Here is the fix:\n```javascript\nconst x = 1;\n```".to_string(),
    )]);
    let requester = LlmFixRequester::new(client);

    let suggestion = requester.request_fix(&request()).await.unwrap();
    assert_eq!(suggestion, FixSuggestion::Replacement("const x = 1;\n".to_string()));

    let prompts = requester.client().prompts.lock();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("File Type: JavaScript/TypeScript"));
    assert!(prompts[0].contains("Lint error at line 1, column 12: Missing semicolon"));
}

#[tokio::test]
async fn test_plain_reply_is_used_verbatim() {
    let client = ScriptedClient::new(vec![Ok("const x = 1;\n".to_string())]);
    let suggestion = LlmFixRequester::new(client)
        .request_fix(&request())
        .await
        .unwrap();
    assert_eq!(suggestion, FixSuggestion::Replacement("const x = 1;\n".to_string()));
}

#[tokio::test]
async fn test_empty_reply_is_no_suggestion() {
    let client = ScriptedClient::new(vec![Ok("  \n".to_string())]);
    let suggestion = LlmFixRequester::new(client)
        .request_fix(&request())
        .await
        .unwrap();
    assert_eq!(suggestion, FixSuggestion::NoSuggestion);
}

#[tokio::test]
async fn test_client_error_maps_to_fix_request_failed() {
    let client = ScriptedClient::new(vec![Err(LlmError::Api {
        provider: "OpenAI".to_string(),
        status: 401,
        body: "invalid api key".to_string(),
    })]);
    let err = LlmFixRequester::new(client)
        .request_fix(&request())
        .await
        .unwrap_err();

    match err {
        CoreError::FixRequestFailed(message) => assert!(message.contains("invalid api key")),
        other => panic!("unexpected error: {}", other),
    }
}
