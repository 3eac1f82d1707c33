use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentOrder {
    pub order_id: OrderId,
    pub amount: Decimal,
}

/// Directory record for a customer. Unknown customers resolve to [`CustomerProfile::default`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub tier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime_value: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recent_orders: Vec<RecentOrder>,
    pub notes: String,
}

impl Default for CustomerProfile {
    fn default() -> Self {
        Self {
            name: "Valued Customer".to_string(),
            email: None,
            tier: "Standard".to_string(),
            lifetime_value: None,
            recent_orders: Vec::new(),
            notes: "New customer".to_string(),
        }
    }
}

impl CustomerProfile {
    pub fn order_amount(&self, order_id: &OrderId) -> Option<Decimal> {
        self.recent_orders.iter().find(|order| &order.order_id == order_id).map(|order| order.amount)
    }
}
