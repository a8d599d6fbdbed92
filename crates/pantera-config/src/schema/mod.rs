//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

mod schema_policy;
mod schema_runtime;

pub use schema_policy::*;
pub use schema_runtime::*;

/// Shared default helper used by submodules.
pub(crate) fn default_true() -> bool {
    true
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,

    #[serde(default)]
    pub markers: MarkerConfig,

    #[serde(default)]
    pub pricing: PricingPolicy,

    #[serde(default)]
    pub filters: FilterPolicy,

    #[serde(default)]
    pub action: ActionConfig,

    #[serde(default)]
    pub supervisor: SupervisorConfig,
}

/// Application being observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Package identifier; events from any other package are dropped.
    #[serde(default = "default_package")]
    pub package: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            package: default_package(),
        }
    }
}

fn default_package() -> String {
    "sinet.startup.inDriver".to_string()
}

/// Text markers used to recognise elements. Matching is case-insensitive
/// substring containment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerConfig {
    /// Marks text that looks like a trip offer.
    #[serde(default = "default_trip_markers")]
    pub trip: Vec<String>,

    /// Marks the control that submits an offer.
    #[serde(default = "default_confirm_markers")]
    pub confirm: Vec<String>,

    /// Marks trips with intermediate stops.
    #[serde(default = "default_stop_markers")]
    pub multiple_stops: Vec<String>,

    /// Marks passengers without ride history.
    #[serde(default = "default_new_client_markers")]
    pub new_client: Vec<String>,

    /// Class-name fragments of input-capable elements.
    #[serde(default = "default_input_classes")]
    pub input_classes: Vec<String>,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            trip: default_trip_markers(),
            confirm: default_confirm_markers(),
            multiple_stops: default_stop_markers(),
            new_client: default_new_client_markers(),
            input_classes: default_input_classes(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_trip_markers() -> Vec<String> {
    strings(&["km", "$", "precio", "destino"])
}

fn default_confirm_markers() -> Vec<String> {
    strings(&["ofertar", "confirmar", "enviar", "offer", "confirm"])
}

fn default_stop_markers() -> Vec<String> {
    strings(&["paradas", "parada", "stops", "stop"])
}

fn default_new_client_markers() -> Vec<String> {
    strings(&["cliente nuevo", "nuevo cliente", "new client", "new rider"])
}

fn default_input_classes() -> Vec<String> {
    strings(&["EditText"])
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
