//! Recording adapter for the `LlmClient` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{CompletionFuture, CompletionRequest, LlmClient};

/// Records LLM requests and completions while delegating to an inner client.
pub struct RecordingLlmClient {
    inner: Box<dyn LlmClient>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingLlmClient {
    /// Wraps `inner`, recording into `recorder`.
    pub fn new(inner: Box<dyn LlmClient>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl LlmClient for RecordingLlmClient {
    fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let result = self.inner.complete(&request).await;
            record_result(&self.recorder, "llm", "complete", &request, &result);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::tests::ScriptedLlm;

    #[tokio::test]
    async fn records_request_and_completion() {
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new("unused.yaml", "t")));
        let scripted = ScriptedLlm::new(vec![Ok("{}".into())]);
        let client = RecordingLlmClient::new(Box::new(scripted), Arc::clone(&recorder));
        let request = CompletionRequest {
            model: "gpt-4o".into(),
            system: "sys".into(),
            prompt: "classify".into(),
            max_tokens: 10,
            temperature: 0.0,
        };

        let response = client.complete(&request).await.unwrap();
        assert_eq!(response.text, "{}");

        let guard = recorder.lock().unwrap();
        let interaction = &guard.interactions()[0];
        assert_eq!((interaction.port.as_str(), interaction.method.as_str()), ("llm", "complete"));
        assert_eq!(interaction.input["prompt"], "classify");
        assert_eq!(interaction.output["Ok"]["text"], "{}");
    }
}
