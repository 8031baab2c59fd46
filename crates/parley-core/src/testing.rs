//! Shared test fixtures: a scripted provider and a pinned clock.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};
use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};

use crate::clock::FixedClock;
use crate::llm::provider::LlmProvider;

/// What the mock returns for one call.
#[derive(Debug, Clone)]
pub enum Scripted {
    Reply(String),
    Status(u16),
    Empty,
}

#[derive(Default)]
struct MockState {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

/// Provider that replays a script and records every request.
///
/// Clone the handle before boxing it to inspect requests afterwards. Once
/// the script runs out every call answers `"ok"`.
#[derive(Clone, Default)]
pub struct MockProvider {
    state: Arc<MockState>,
}

impl MockProvider {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        let provider = Self::default();
        provider
            .state
            .script
            .lock()
            .unwrap()
            .extend(script);
        provider
    }

    pub fn replying(text: &str) -> Self {
        Self::new([Scripted::Reply(text.to_string())])
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, LlmError>> + Send {
        self.state.requests.lock().unwrap().push(request.clone());
        let next = self
            .state
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Scripted::Reply("ok".to_string()));
        let model = request.model.clone();

        async move {
            match next {
                Scripted::Reply(content) => Ok(CompletionResponse {
                    id: "resp-mock".to_string(),
                    content,
                    model,
                    usage: Usage::default(),
                }),
                Scripted::Status(status) => Err(LlmError::Http {
                    status,
                    body: String::new(),
                }),
                Scripted::Empty => Err(LlmError::EmptyResponse),
            }
        }
    }
}

pub fn noon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, 19)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(noon()))
}
