use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Scenario {
    pub number: u8,
    pub title: &'static str,
    pub query: &'static str,
    pub customer_id: &'static str,
}

pub const SCENARIOS: [Scenario; 6] = [
    Scenario {
        number: 1,
        title: "Standard refund (defective product)",
        query: "Hi, I received my order yesterday but the product is completely defective. The screen has lines through it. I'd like a full refund for order ORD-789.",
        customer_id: "12345",
    },
    Scenario {
        number: 2,
        title: "High-value refund (requires approval)",
        query: "I purchased a gaming laptop last week (order ORD-321) for $1,500 but it keeps crashing. I want a full refund ASAP!",
        customer_id: "67890",
    },
    Scenario {
        number: 3,
        title: "Shipping delay + billing issue",
        query: "My package was supposed to arrive 3 days ago but it's stuck in transit. Plus I was charged TWICE - $89.99 twice! This is urgent!",
        customer_id: "12345",
    },
    Scenario {
        number: 4,
        title: "Password reset request",
        query: "I can't log into my account. I tried resetting my password but I'm not receiving the email. I need to check my order status urgently.",
        customer_id: "11111",
    },
    Scenario {
        number: 5,
        title: "Track my package",
        query: "Where is my package? Order ORD-555 was supposed to be here by now and I'm getting worried.",
        customer_id: "11111",
    },
    Scenario {
        number: 6,
        title: "Product exchange",
        query: "I ordered a medium blue shirt but received a large red one. I'd like to exchange it for the correct item please.",
        customer_id: "12345",
    },
];

pub fn find(number: u8) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|scenario| scenario.number == number)
}

pub fn run() -> CommandResult {
    let mut lines = vec!["built-in scenarios (run with `caredesk run --scenario <n>`):".to_string()];
    for scenario in &SCENARIOS {
        lines.push(format!(
            "{}. {} [customer {}]\n   {}",
            scenario.number, scenario.title, scenario.customer_id, scenario.query
        ));
    }
    CommandResult { exit_code: 0, output: lines.join("\n") }
}

#[cfg(test)]
mod tests {
    use super::{find, SCENARIOS};

    #[test]
    fn scenarios_are_numbered_one_through_six() {
        let numbers = SCENARIOS.iter().map(|scenario| scenario.number).collect::<Vec<_>>();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
        assert!(find(7).is_none());
    }

    #[test]
    fn refund_scenarios_carry_order_tokens() {
        assert!(find(1).is_some_and(|scenario| scenario.query.contains("ORD-789")));
        assert!(find(2).is_some_and(|scenario| {
            scenario.query.contains("ORD-321") && scenario.query.contains("$1,500")
        }));
    }
}
