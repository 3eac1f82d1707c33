use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStage {
    Intake,
    Research,
    Tone,
    Resolve,
    Quality,
    EscalationCheck,
    Followup,
    HumanGate,
    Done,
}

impl PipelineStage {
    pub const GENERATIVE: [PipelineStage; 7] = [
        PipelineStage::Intake,
        PipelineStage::Research,
        PipelineStage::Tone,
        PipelineStage::Resolve,
        PipelineStage::Quality,
        PipelineStage::EscalationCheck,
        PipelineStage::Followup,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Intake => "INTAKE",
            Self::Research => "RESEARCH",
            Self::Tone => "TONE",
            Self::Resolve => "RESOLVE",
            Self::Quality => "QUALITY",
            Self::EscalationCheck => "ESCALATION_CHECK",
            Self::Followup => "FOLLOWUP",
            Self::HumanGate => "HUMAN_GATE",
            Self::Done => "DONE",
        }
    }

    /// Successor stage; `None` once the case is done. The human gate is visited only when
    /// `requires_human` is set.
    pub fn next(self, requires_human: bool) -> Option<Self> {
        let next = match self {
            Self::Intake => Self::Research,
            Self::Research => Self::Tone,
            Self::Tone => Self::Resolve,
            Self::Resolve => Self::Quality,
            Self::Quality => Self::EscalationCheck,
            Self::EscalationCheck => Self::Followup,
            Self::Followup if requires_human => Self::HumanGate,
            Self::Followup | Self::HumanGate => Self::Done,
            Self::Done => return None,
        };
        Some(next)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTransition {
    pub from: PipelineStage,
    pub to: PipelineStage,
}
