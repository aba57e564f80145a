//! Shared test helpers for router, executor, and orchestrator tests.

use hospinav_core::error::ProviderError;
use hospinav_core::provider::{
    ClassifyRequest, ClassifyResponse, GenerateRequest, GenerateResponse, Provider, RawCitation,
};
use hospinav_core::tool::ToolCall;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One scripted reaction of the mock provider.
pub enum Step<T> {
    Reply(T),
    Fail(ProviderError),
    /// Never resolves; use with a paused clock to trigger timeouts
    Hang,
    Panic(&'static str),
}

/// A mock provider that plays back scripted classification and generation
/// steps in sequence, and records every request it receives.
///
/// Panics if more calls are made than steps provided.
#[derive(Default)]
pub struct ScriptedProvider {
    classifications: Mutex<VecDeque<Step<ClassifyResponse>>>,
    generations: Mutex<VecDeque<Step<GenerateResponse>>>,
    classify_requests: Mutex<Vec<ClassifyRequest>>,
    generate_requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(self, step: Step<ClassifyResponse>) -> Self {
        self.classifications.lock().unwrap().push_back(step);
        self
    }

    pub fn generate(self, step: Step<GenerateResponse>) -> Self {
        self.generations.lock().unwrap().push_back(step);
        self
    }

    /// Classification that selects the given tools, in order.
    pub fn selects(self, tools: &[&str]) -> Self {
        self.classify(Step::Reply(selection(tools)))
    }

    /// Generation that returns plain text.
    pub fn replies(self, text: &str) -> Self {
        self.generate(Step::Reply(text_response(text)))
    }

    pub fn classify_requests(&self) -> Vec<ClassifyRequest> {
        self.classify_requests.lock().unwrap().clone()
    }

    pub fn generate_requests(&self) -> Vec<GenerateRequest> {
        self.generate_requests.lock().unwrap().clone()
    }

    async fn play<T>(queue: &Mutex<VecDeque<Step<T>>>, what: &str) -> Result<T, ProviderError> {
        let step = queue.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(value)) => Ok(value),
            Some(Step::Fail(err)) => Err(err),
            Some(Step::Hang) => std::future::pending().await,
            Some(Step::Panic(message)) => panic!("{message}"),
            None => panic!("ScriptedProvider: no more {what} steps"),
        }
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn classify(&self, request: ClassifyRequest) -> Result<ClassifyResponse, ProviderError> {
        self.classify_requests.lock().unwrap().push(request);
        Self::play(&self.classifications, "classification").await
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        self.generate_requests.lock().unwrap().push(request);
        Self::play(&self.generations, "generation").await
    }
}

pub fn selection(tools: &[&str]) -> ClassifyResponse {
    ClassifyResponse {
        selected_tools: tools.iter().map(|t| t.to_string()).collect(),
    }
}

pub fn text_response(text: &str) -> GenerateResponse {
    GenerateResponse {
        text: text.into(),
        ..GenerateResponse::default()
    }
}

pub fn tool_response(text: &str, tool_calls: Vec<ToolCall>) -> GenerateResponse {
    GenerateResponse {
        text: text.into(),
        tool_calls,
        citations: vec![],
    }
}

pub fn cited_response(text: &str, citations: Vec<(Option<&str>, Option<&str>)>) -> GenerateResponse {
    GenerateResponse {
        text: text.into(),
        tool_calls: vec![],
        citations: citations
            .into_iter()
            .map(|(title, url)| RawCitation {
                title: title.map(str::to_string),
                url: url.map(str::to_string),
            })
            .collect(),
    }
}
