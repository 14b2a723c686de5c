//! Fix requester backed by a completion client.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use autofix_core::{CoreError, CoreResult, FixRequest, FixRequester, FixSuggestion};

use crate::client::CompletionClient;
use crate::prompt::{build_prompt, unwrap_code_fence};

/// Asks a model for the complete fixed content of a file.
pub struct LlmFixRequester<C: CompletionClient> {
    client: C,
}

impl<C: CompletionClient> LlmFixRequester<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

#[async_trait]
impl<C: CompletionClient> FixRequester for LlmFixRequester<C> {
    async fn request_fix(&self, request: &FixRequest) -> CoreResult<FixSuggestion> {
        info!(
            "Requesting fix for {} (Attempt {})",
            request.path, request.attempt
        );

        let prompt = build_prompt(request);
        debug!("Prompt for {}: {} bytes, {} errors", request.path, prompt.len(), request.errors.len());

        let reply = self.client.complete(&prompt).await.map_err(|e| {
            warn!("Error getting fix for {}: {}", request.path, e);
            CoreError::FixRequestFailed(e.to_string())
        })?;

        let content = unwrap_code_fence(&reply);
        if content.trim().is_empty() {
            return Ok(FixSuggestion::NoSuggestion);
        }
        Ok(FixSuggestion::Replacement(content))
    }
}
