//! FailureTrace — immutable description of an agent failure event.
//!
//! Produced by the upstream detection pipeline; read-only input to the
//! rubric and the skill mapper.

use serde::{Deserialize, Serialize};

/// How the agent failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureType {
    /// The agent did something unsafe (acted when it should not have).
    CommissionSafety,
    /// The agent gave up or under-delivered (did not act when it should have).
    OmissionLaziness,
}

/// Blast radius of the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    NonCritical,
}

/// A structured tool call captured in the trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Name of the tool the agent invoked.
    pub tool: String,

    /// Arguments as a JSON value.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// A single failure event, captured in full.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureTrace {
    /// Unique trace ID assigned by the detection pipeline.
    pub trace_id: String,

    /// The original user request.
    pub user_prompt: String,

    /// The agent's reasoning leading up to the failure.
    pub agent_reasoning: String,

    /// The tool call that failed, if the agent got that far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolInvocation>,

    /// Output (usually an error) from the tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_output: Option<String>,

    /// Failure classification.
    pub failure_type: FailureType,

    /// Failure severity.
    pub severity: Severity,
}

impl FailureTrace {
    /// Build a trace with no tool call, for failures that never reached a tool.
    pub fn without_tool(
        trace_id: impl Into<String>,
        user_prompt: impl Into<String>,
        agent_reasoning: impl Into<String>,
        failure_type: FailureType,
        severity: Severity,
    ) -> Self {
        Self {
            trace_id: trace_id.into(),
            user_prompt: user_prompt.into(),
            agent_reasoning: agent_reasoning.into(),
            tool_call: None,
            tool_output: None,
            failure_type,
            severity,
        }
    }
}
