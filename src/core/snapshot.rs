use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::core::catalog::Measurement;

/// Decoded measurement value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Float(f64),
    Int(i64),
    Bool(bool),
    Text(String),
}

impl Value {
    #[expect(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Int(value) => Some(*value as f64),
            Self::Bool(_) | Self::Text(_) => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Float(value) => write!(f, "{value:.2}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{}", if *value { "on" } else { "off" }),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// Result of one poll cycle.
#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub fetched_at: DateTime<Local>,
    pub connected: bool,
    pub status: String,
    pub status_code: u16,
    pub lock: Option<String>,
    pub lock_code: Option<u16>,
    pub error_code: Option<u16>,
    pub sensor_error_code: Option<u16>,
    pub cop: Option<f64>,

    #[serde(flatten)]
    pub measurements: BTreeMap<Measurement, Value>,
}

impl Snapshot {
    const RUNNING_STATUSES: [&str; 11] = [
        "heating",
        "pool",
        "hot_water",
        "cooling",
        "heat_pump_on_heating",
        "heat_pump_on_pool",
        "heat_pump_on_hot_water",
        "heat_pump_on_heating_auxiliary",
        "heat_pump_on_pool_auxiliary",
        "heat_pump_on_hot_water_auxiliary",
        "heat_pump_on_defrost",
    ];

    pub fn get(&self, measurement: Measurement) -> Option<&Value> {
        self.measurements.get(&measurement)
    }

    pub fn get_float(&self, measurement: Measurement) -> Option<f64> {
        self.get(measurement).and_then(Value::as_f64)
    }

    pub fn is_error_active(&self) -> bool {
        self.error_code.is_some_and(|code| code > 0)
    }

    pub fn is_lock_active(&self) -> bool {
        self.lock_code.is_some_and(|code| code > 0)
    }

    /// Whether the compressor is producing heat or cold.
    pub fn is_running(&self) -> bool {
        Self::RUNNING_STATUSES.contains(&self.status.as_str())
    }

    pub fn is_defrosting(&self) -> bool {
        matches!(self.status.as_str(), "defrost" | "heat_pump_on_defrost")
    }
}
