//! Agent executor for running one chat turn
//!
//! A turn is an explicit state machine:
//!
//! ```text
//! AwaitingModelReply --(function calls)--> ExecutingTools --> AwaitingFinalReply
//!        |                                       ^                   |
//!        |                                       +--(function calls)-+
//!        +--(text)--> Done <--------------------------(text)---------+
//! ```
//!
//! Every model call counts against `max_iterations`; running out is an error
//! rather than a canned answer.

use async_trait::async_trait;
use finchat_core::{Error, Result};
use finchat_llm::{
    CompletionRequest, CompletionResponse, FunctionCall, FunctionResponse, LLMProvider, Message,
};
use finchat_tools::ToolRegistry;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Event handler for executor events
///
/// Implement this trait to observe tool calls as they happen.
#[async_trait]
pub trait ExecutorEventHandler: Send + Sync {
    /// Called when a tool execution starts
    async fn on_tool_start(&self, _name: &str, _args: &Value) {}

    /// Called when a tool execution completes
    async fn on_tool_done(
        &self,
        _name: &str,
        _result: std::result::Result<&Value, &str>,
        _duration_ms: u64,
    ) {
    }

    /// Called when the turn completes with a final answer
    async fn on_complete(&self, _text: &str) {}

    /// Called when the turn fails
    async fn on_error(&self, _error: &str) {}
}

/// Gemini model used when none is configured
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Configuration for turn execution
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of model calls in one turn
    pub max_iterations: usize,

    /// Model to use
    pub model: String,

    /// System instruction
    pub system_prompt: Option<String>,

    /// Max output tokens per completion
    pub max_tokens: usize,

    /// Temperature (provider default when unset)
    pub temperature: Option<f32>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 8,
            model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
            max_tokens: 2048,
            temperature: None,
        }
    }
}

/// Result of a completed turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Final answer text (empty if the model returned no text)
    pub text: String,

    /// The model response that ended the turn
    pub response: CompletionResponse,

    /// The whole conversation after the turn, tool rounds included
    pub transcript: Vec<Message>,
}

enum TurnState {
    AwaitingModelReply,
    ExecutingTools(Vec<FunctionCall>),
    AwaitingFinalReply,
    Done(CompletionResponse),
}

/// Runs turns: model → tool calls → execution → model, until a text answer
pub struct AgentExecutor {
    provider: Arc<dyn LLMProvider>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
    event_handler: Option<Arc<dyn ExecutorEventHandler>>,
}

impl AgentExecutor {
    /// Create a new agent executor
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        tool_registry: Arc<ToolRegistry>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            provider,
            tool_registry,
            config,
            event_handler: None,
        }
    }

    /// Create a new builder
    pub fn builder() -> AgentExecutorBuilder {
        AgentExecutorBuilder::new()
    }

    /// Set the event handler for receiving execution events
    pub fn with_event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Get the executor configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Get the tool registry
    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tool_registry
    }

    /// Run a turn with no prior history
    pub async fn run(&self, user_message: &str) -> Result<TurnOutcome> {
        self.run_with_history(Vec::new(), user_message).await
    }

    /// Run a turn on top of the given history
    pub async fn run_with_history(
        &self,
        history: Vec<Message>,
        user_message: &str,
    ) -> Result<TurnOutcome> {
        let handler = self.event_handler.clone();
        let outcome = self.run_turn(history, user_message, handler.as_ref()).await;

        match &outcome {
            Ok(turn) => {
                if let Some(handler) = &handler {
                    handler.on_complete(&turn.text).await;
                }
            }
            Err(e) => {
                if let Some(handler) = &handler {
                    handler.on_error(&e.to_string()).await;
                }
            }
        }

        outcome
    }

    async fn run_turn(
        &self,
        history: Vec<Message>,
        user_message: &str,
        event_handler: Option<&Arc<dyn ExecutorEventHandler>>,
    ) -> Result<TurnOutcome> {
        let mut conversation = history;
        conversation.push(Message::user(user_message));

        let mut state = TurnState::AwaitingModelReply;
        let mut model_calls = 0;

        loop {
            state = match state {
                TurnState::AwaitingModelReply | TurnState::AwaitingFinalReply => {
                    model_calls += 1;
                    if model_calls > self.config.max_iterations {
                        warn!(
                            max_iterations = self.config.max_iterations,
                            "Max iterations reached, abandoning turn"
                        );
                        return Err(Error::ProcessingFailed(format!(
                            "no final answer after {} model calls",
                            self.config.max_iterations
                        )));
                    }

                    info!(iteration = model_calls, "Calling model");
                    let response = self.call_model(&conversation).await?;

                    let calls: Vec<FunctionCall> = response
                        .message
                        .function_calls_requested()
                        .into_iter()
                        .cloned()
                        .collect();

                    if calls.is_empty() {
                        TurnState::Done(response)
                    } else {
                        info!(tool_count = calls.len(), "Model requested tool use");
                        conversation.push(response.message);
                        TurnState::ExecutingTools(calls)
                    }
                }

                TurnState::ExecutingTools(calls) => {
                    let responses = self.execute_tools(calls, event_handler).await;
                    conversation.push(Message::function_responses(responses));
                    TurnState::AwaitingFinalReply
                }

                TurnState::Done(response) => {
                    let text = response.message.text().unwrap_or_default();
                    info!(
                        iteration = model_calls,
                        response_length = text.len(),
                        "Turn completed"
                    );
                    conversation.push(response.message.clone());

                    return Ok(TurnOutcome {
                        text,
                        response,
                        transcript: conversation,
                    });
                }
            };
        }
    }

    async fn call_model(&self, conversation: &[Message]) -> Result<CompletionResponse> {
        let tools = self.tool_registry.definitions();
        debug!(tool_count = tools.len(), messages = conversation.len(), "Building request");

        let mut builder = CompletionRequest::builder(&self.config.model)
            .messages(conversation.to_vec())
            .max_tokens(self.config.max_tokens);

        if let Some(system) = &self.config.system_prompt {
            builder = builder.system(system.clone());
        }
        if let Some(temperature) = self.config.temperature {
            builder = builder.temperature(temperature);
        }
        if !tools.is_empty() {
            builder = builder.tools(tools);
        }

        let response = self.provider.complete(builder.build()).await?;

        info!(
            stop_reason = ?response.stop_reason,
            prompt_tokens = response.usage.prompt_tokens,
            candidates_tokens = response.usage.candidates_tokens,
            "Model response received"
        );

        Ok(response)
    }

    /// Execute function calls in order, one response per call
    async fn execute_tools(
        &self,
        calls: Vec<FunctionCall>,
        event_handler: Option<&Arc<dyn ExecutorEventHandler>>,
    ) -> Vec<FunctionResponse> {
        let mut responses = Vec::with_capacity(calls.len());

        for FunctionCall { name, args } in calls {
            let args_preview: String = args.to_string().chars().take(500).collect();
            info!(tool_name = %name, args_preview = %args_preview, "Executing tool");

            if let Some(handler) = event_handler {
                handler.on_tool_start(&name, &args).await;
            }

            let start_time = Instant::now();
            let outcome = match self.tool_registry.get(&name) {
                Some(tool) => tool.execute(args).await.map_err(|e| e.to_string()),
                None => Err(Error::ToolNotFound(name.clone()).to_string()),
            };
            let duration_ms = start_time.elapsed().as_millis() as u64;

            let response = match outcome {
                Ok(result) => {
                    debug!(tool_name = %name, duration_ms, "Tool execution succeeded");
                    if let Some(handler) = event_handler {
                        handler.on_tool_done(&name, Ok(&result), duration_ms).await;
                    }
                    wrap_result(result)
                }
                Err(error) => {
                    warn!(tool_name = %name, duration_ms, error = %error, "Tool execution failed");
                    if let Some(handler) = event_handler {
                        handler.on_tool_done(&name, Err(&error), duration_ms).await;
                    }
                    json!({ "dataFound": false, "error": error })
                }
            };

            responses.push(FunctionResponse { name, response });
        }

        responses
    }
}

/// Function responses must be JSON objects
fn wrap_result(result: Value) -> Value {
    if result.is_object() {
        result
    } else {
        json!({ "result": result })
    }
}

/// Builder for AgentExecutor
pub struct AgentExecutorBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
    event_handler: Option<Arc<dyn ExecutorEventHandler>>,
}

impl AgentExecutorBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            provider: None,
            tool_registry: Arc::new(ToolRegistry::new()),
            config: ExecutorConfig::default(),
            event_handler: None,
        }
    }

    /// Set the LLM provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the tool registry
    pub fn tool_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tool_registry = registry;
        self
    }

    /// Set the full configuration
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set maximum iterations
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Set max tokens
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Set temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    /// Set the event handler
    pub fn event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Build the executor
    pub fn build(self) -> Result<AgentExecutor> {
        let provider = self
            .provider
            .ok_or_else(|| Error::InitializationFailed("Provider not set".to_string()))?;

        let mut executor = AgentExecutor::new(provider, self.tool_registry, self.config);
        executor.event_handler = self.event_handler;
        Ok(executor)
    }
}

impl Default for AgentExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use finchat_llm::{
        CandidateMetadata, CompletionRequest, CompletionResponse, FunctionCall, LLMProvider,
        Message, StopReason, TokenUsage,
    };
    use mockall::mock;
    use serde_json::Value;

    mock! {
        pub Provider {}

        #[async_trait]
        impl LLMProvider for Provider {
            async fn complete(
                &self,
                request: CompletionRequest,
            ) -> finchat_llm::Result<CompletionResponse>;
            fn name(&self) -> &str;
        }
    }

    pub fn text_response(text: &str) -> CompletionResponse {
        CompletionResponse {
            message: Message::model(text),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage {
                prompt_tokens: 40,
                candidates_tokens: 10,
                cached_content_tokens: 0,
            },
            candidate: CandidateMetadata {
                finish_reason: "STOP".to_string(),
                ..CandidateMetadata::default()
            },
        }
    }

    pub fn call_response(name: &str, args: Value) -> CompletionResponse {
        CompletionResponse {
            message: Message::function_calls(vec![FunctionCall {
                name: name.to_string(),
                args,
            }]),
            stop_reason: StopReason::ToolUse,
            usage: TokenUsage::default(),
            candidate: CandidateMetadata {
                finish_reason: "STOP".to_string(),
                ..CandidateMetadata::default()
            },
        }
    }
}
