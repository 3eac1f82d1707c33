pub mod audit;
pub mod case;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod knowledge;
pub mod policy;

pub use audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
pub use case::{CaseId, CaseRecord, LogEntry};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use domain::approval::{ApprovalDecision, ApprovalRequest};
pub use domain::customer::{CustomerProfile, OrderId, RecentOrder};
pub use domain::outcome::{CaseOutcome, CaseStatus};
pub use domain::shipment::ShipmentStatus;
pub use errors::{ApplicationError, DomainError, ErrorClass, InterfaceError};
pub use flows::{FlowTransitionError, PipelineFlow, PipelineStage, StageTransition};
pub use policy::{DeterministicRefundPolicy, RefundPolicy, RefundPolicyDecision, RefundPolicyInput};
