use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use caredesk_agent::approval::ApprovalChannel;
use caredesk_core::domain::approval::{ApprovalDecision, ApprovalRequest};
use tracing::warn;

/// Asks the operator on the terminal. The prompt goes to stderr; the answer is read from stdin.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleApproval;

#[async_trait]
impl ApprovalChannel for ConsoleApproval {
    async fn request(&self, request: &ApprovalRequest) -> ApprovalDecision {
        let prompt = render_prompt(request);
        let answer = tokio::task::spawn_blocking(move || read_reply(&prompt)).await;

        match answer {
            Ok(Ok(Some(reply))) => ApprovalDecision::from_reply(&reply),
            Ok(Ok(None)) => ApprovalDecision::Declined,
            Ok(Err(error)) => {
                warn!(
                    event_name = "approval.console.read_failed",
                    correlation_id = %request.case_id,
                    error = %error,
                    "could not read approval reply"
                );
                ApprovalDecision::Declined
            }
            Err(error) => {
                warn!(
                    event_name = "approval.console.join_failed",
                    correlation_id = %request.case_id,
                    error = %error,
                    "approval prompt task failed"
                );
                ApprovalDecision::Declined
            }
        }
    }
}

fn render_prompt(request: &ApprovalRequest) -> String {
    let mut prompt = format!(
        "\nHUMAN ESCALATION REQUIRED (case {})\nReason: {}\n",
        request.case_id, request.reason
    );
    if !request.actions_taken.is_empty() {
        prompt.push_str("Actions already taken:\n");
        for action in &request.actions_taken {
            prompt.push_str(&format!("  - {action}\n"));
        }
    }
    prompt.push_str("Approve? (yes/no): ");
    prompt
}

/// `None` on end of input.
fn read_reply(prompt: &str) -> io::Result<Option<String>> {
    let mut stderr = io::stderr().lock();
    stderr.write_all(prompt.as_bytes())?;
    stderr.flush()?;

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    Ok((read > 0).then_some(line))
}
