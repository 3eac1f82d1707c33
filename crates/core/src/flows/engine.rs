use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::flows::states::{PipelineStage, StageTransition};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("no transition out of terminal stage {stage:?}")]
    Terminal { stage: PipelineStage },
}

/// The fixed stage ordering. There is no branching other than the conditional human gate.
#[derive(Clone, Debug, Default)]
pub struct PipelineFlow;

impl PipelineFlow {
    pub fn initial_stage(&self) -> PipelineStage {
        PipelineStage::Intake
    }

    pub fn apply(
        &self,
        current: PipelineStage,
        requires_human: bool,
    ) -> Result<StageTransition, FlowTransitionError> {
        let to = current
            .next(requires_human)
            .ok_or(FlowTransitionError::Terminal { stage: current })?;

        Ok(StageTransition { from: current, to })
    }

    pub fn apply_with_audit<S>(
        &self,
        current: PipelineStage,
        requires_human: bool,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<StageTransition, FlowTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, requires_human);
        match &result {
            Ok(transition) => sink.emit(
                AuditEvent::new(
                    audit.case_id.clone(),
                    "flow.transition_applied",
                    AuditCategory::Flow,
                    audit.actor.clone(),
                    AuditOutcome::Success,
                )
                .with_metadata("from", transition.from.as_str())
                .with_metadata("to", transition.to.as_str()),
            ),
            Err(error) => sink.emit(
                AuditEvent::new(
                    audit.case_id.clone(),
                    "flow.transition_rejected",
                    AuditCategory::Flow,
                    audit.actor.clone(),
                    AuditOutcome::Rejected,
                )
                .with_metadata("error", error.to_string()),
            ),
        }
        result
    }
}
