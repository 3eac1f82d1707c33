use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ShipmentStatus {
    InTransit { location: String, eta: String },
    Delivered { date: String },
    NotFound { message: String },
}

impl ShipmentStatus {
    pub fn summary(&self) -> String {
        match self {
            Self::InTransit { location, eta } => format!("In Transit (at {location}, ETA {eta})"),
            Self::Delivered { date } => format!("Delivered on {date}"),
            Self::NotFound { message } => format!("Not Found. {message}"),
        }
    }
}
