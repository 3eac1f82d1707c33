use caredesk_core::flows::PipelineStage;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageDefinition {
    pub stage: PipelineStage,
    pub name: &'static str,
    pub role: &'static str,
    pub goal: &'static str,
    pub instructions: &'static str,
}

impl StageDefinition {
    /// Role description sent as the system message for this stage.
    pub fn preamble(&self, context: &str) -> String {
        format!(
            "You are {role}.\n\nYour goal: {goal}\n\nInstructions: {instructions}\n\n\
             Context from previous agents:\n{context}\n\n\
             Be concise but thorough. Format your response clearly.",
            role = self.role,
            goal = self.goal,
            instructions = self.instructions,
        )
    }
}

pub const GREETER: StageDefinition = StageDefinition {
    stage: PipelineStage::Intake,
    name: "Greeter",
    role: "Customer Greeter and Intent Classifier",
    goal: "Welcome customers and understand their needs",
    instructions: "Analyze the customer query and provide:
- GREETING: Warm welcome
- INTENT: (REFUND, RETURN, SHIPPING, TRACKING, ACCOUNT, BILLING, OTHER)
- SENTIMENT: (POSITIVE, NEUTRAL, NEGATIVE, URGENT)
- PRIORITY: (LOW, MEDIUM, HIGH, CRITICAL)
- SUMMARY: What customer needs in 1-2 sentences
Finish with a single line of JSON: {\"intent\": \"...\", \"sentiment\": \"...\", \"priority\": \"...\"}",
};

pub const RESEARCHER: StageDefinition = StageDefinition {
    stage: PipelineStage::Research,
    name: "Researcher",
    role: "Knowledge Researcher",
    goal: "Find accurate information to support resolution",
    instructions: "Use these tools to gather information:
- Search knowledge base for policies
- Look up customer details
- Track shipments if relevant
Provide relevant findings to support the solution.",
};

pub const TONE_ADAPTER: StageDefinition = StageDefinition {
    stage: PipelineStage::Tone,
    name: "Tone Adapter",
    role: "Empathy and Tone Specialist",
    goal: "Craft empathetic, appropriately-toned responses",
    instructions: "Create a customer-ready response that:
- Matches the customer's sentiment
- Shows genuine empathy
- Is professional and clear
- Uses customer's name if available",
};

pub const RESOLVER: StageDefinition = StageDefinition {
    stage: PipelineStage::Resolve,
    name: "Resolver",
    role: "Problem Resolver",
    goal: "Execute solutions and take actions",
    instructions: "Determine what actions to take:
- Process refunds (flag if over $100)
- Send emails
- Track packages
List specific actions needed.",
};

pub const QUALITY: StageDefinition = StageDefinition {
    stage: PipelineStage::Quality,
    name: "Quality Reviewer",
    role: "Quality Assurance",
    goal: "Ensure accuracy and completeness",
    instructions: "Review the entire interaction:
- Was the issue properly addressed?
- Is information accurate?
- Is tone appropriate?
- Are all steps complete?
Provide: APPROVED/NEEDS_REVISION and score (1-10)
Finish with a single line of JSON: {\"verdict\": \"...\", \"score\": N}",
};

pub const ESCALATION: StageDefinition = StageDefinition {
    stage: PipelineStage::EscalationCheck,
    name: "Escalation Coordinator",
    role: "Escalation Manager",
    goal: "Identify when human intervention is needed",
    instructions: "Check if human escalation needed for:
- High-value transactions (>$100)
- Policy exceptions
- VIP customers
- Complex issues
Provide: ESCALATE/NO_ESCALATION and reason
Finish with a single line of JSON: {\"escalate\": true|false}",
};

pub const FOLLOWUP: StageDefinition = StageDefinition {
    stage: PipelineStage::Followup,
    name: "Follow-up Scheduler",
    role: "Follow-up Coordinator",
    goal: "Plan future customer touchpoints",
    instructions: "Determine if follow-up needed for:
- Delivery confirmations
- Satisfaction checks
- VIP relationship building
Provide: FOLLOW_UP/NO_FOLLOW_UP with timing
Finish with a single line of JSON: {\"follow_up\": true|false}",
};
