//! Tool-calling support agent: the production [`ReplyGenerator`].

use async_trait::async_trait;
use isp_chat_core::Role;
use isp_chat_isp::{IspClient, IspTool};
use serde_json::Value;

use crate::ai_types::{ChatMessage, ChatRequest, FunctionDefinition, ToolCall, ToolDefinition};
use crate::client::LlmClient;
use crate::error::LlmError;
use crate::generator::{GeneratedReply, ReplyGenerator, ReplyRequest};
use crate::prompt::{SYSTEM_PROMPT, build_user_turn};

/// Upper bound on model round-trips that request tools.
pub const MAX_TOOL_ROUNDS: usize = 5;

const TEMPERATURE: f32 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 300;

fn tool_definitions() -> Vec<ToolDefinition> {
    IspTool::ALL
        .into_iter()
        .map(|tool| ToolDefinition {
            kind: "function",
            function: FunctionDefinition {
                name: tool.name(),
                description: tool.description(),
                parameters: tool.parameters(),
            },
        })
        .collect()
}

#[derive(Debug)]
pub struct IspAgent {
    llm: LlmClient,
    isp: IspClient,
    max_tool_rounds: usize,
}

impl IspAgent {
    #[must_use]
    pub const fn new(llm: LlmClient, isp: IspClient) -> Self {
        Self { llm, isp, max_tool_rounds: MAX_TOOL_ROUNDS }
    }

    #[must_use]
    pub const fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    fn initial_messages(request: &ReplyRequest) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(request.history.len().saturating_add(2));
        messages.push(ChatMessage::system(SYSTEM_PROMPT));
        messages.extend(request.history.iter().map(|turn| match turn.role {
            Role::User => ChatMessage::user(turn.content.clone()),
            Role::Assistant => ChatMessage::assistant(turn.content.clone()),
        }));
        messages.push(ChatMessage::user(build_user_turn(
            &request.message,
            request.user_id.as_deref(),
            &request.language,
        )));
        messages
    }

    /// Execute one requested call. The tool is returned only when it actually ran.
    async fn run_tool_call(&self, call: &ToolCall) -> (Option<IspTool>, Value) {
        let Some(tool) = IspTool::from_name(&call.function.name) else {
            tracing::warn!(tool = %call.function.name, "Model requested an unknown tool");
            return (
                None,
                serde_json::json!({"status": "error", "message": format!("Unknown tool: {}", call.function.name)}),
            );
        };
        let args = if call.function.arguments.trim().is_empty() {
            Value::Object(serde_json::Map::new())
        } else {
            match serde_json::from_str(&call.function.arguments) {
                Ok(args) => args,
                Err(e) => {
                    tracing::warn!(tool = %tool, error = %e, "Unparseable tool arguments");
                    return (
                        None,
                        serde_json::json!({"status": "error", "message": "Invalid tool arguments"}),
                    );
                },
            }
        };
        tracing::debug!(tool = %tool, "Running ISP tool");
        (Some(tool), self.isp.run_tool(tool, &args).await)
    }
}

#[async_trait]
impl ReplyGenerator for IspAgent {
    async fn generate(&self, request: &ReplyRequest) -> Result<GeneratedReply, LlmError> {
        let tools = tool_definitions();
        let mut messages = Self::initial_messages(request);
        let mut tools_used: Vec<String> = Vec::new();
        let mut api_calls_made: u32 = 0;

        for round in 0..=self.max_tool_rounds {
            let chat_request = ChatRequest {
                model: self.llm.model().to_owned(),
                messages: messages.clone(),
                tools: if round < self.max_tool_rounds { tools.clone() } else { Vec::new() },
                temperature: Some(TEMPERATURE),
                max_tokens: Some(MAX_OUTPUT_TOKENS),
            };
            let reply = self.llm.chat_completion(&chat_request).await?;

            if reply.tool_calls.is_empty() {
                tracing::debug!(rounds = round, tools = tools_used.len(), "Model produced final answer");
                return Ok(GeneratedReply {
                    raw_text: reply.content.unwrap_or_default(),
                    tools_used,
                    api_calls_made,
                });
            }

            let calls = reply.tool_calls.clone();
            messages.push(reply);
            for call in &calls {
                let (tool, result) = self.run_tool_call(call).await;
                if let Some(tool) = tool {
                    api_calls_made = api_calls_made.saturating_add(1);
                    if !tools_used.iter().any(|t| t == tool.name()) {
                        tools_used.push(tool.name().to_owned());
                    }
                }
                messages.push(ChatMessage::tool(call.id.clone(), result.to_string()));
            }
        }

        Err(LlmError::ToolLoopExhausted(self.max_tool_rounds))
    }
}
