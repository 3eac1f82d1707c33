//! Customer-support pipeline runtime.
//!
//! An inquiry moves through seven generation stages that share one case record:
//! 1. **Intake** (`stages::GREETER`) - classify intent, sentiment, priority
//! 2. **Research** - knowledge base, customer directory, shipment lookups (`tools`)
//! 3. **Tone** - customer-facing message
//! 4. **Resolve** - refunds and notifications, gated by `guardrails`
//! 5. **Quality**, **Escalation check**, **Follow-up** - scored and flagged via `extraction`
//!
//! A refund over the automatic limit suspends the case at the human gate (`approval`).
//!
//! # Key Types
//!
//! - `PipelineOrchestrator` - sequences the stages (see `runtime`)
//! - `LlmClient` - pluggable generation capability, with an OpenAI-compatible HTTP client
//! - `ToolGateway` - the only path to side effects
//!
//! # Safety Principle
//!
//! Generated text never decides whether money moves. Refund amounts come from the refund-terms
//! strategy and the approval threshold is a deterministic policy in `caredesk-core`.

pub mod approval;
pub mod extraction;
pub mod guardrails;
pub mod llm;
pub mod refund_terms;
pub mod runner;
pub mod runtime;
pub mod stages;
pub mod tools;

pub use approval::{ApprovalChannel, FixedApproval, HumanGate};
pub use llm::{ChatCompletionsClient, LlmClient, ServiceError};
pub use runtime::PipelineOrchestrator;
