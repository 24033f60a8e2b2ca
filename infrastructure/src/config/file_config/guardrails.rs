//! Guardrail configuration (`[guardrails]` section)
//!
//! The flow description is flattened into the section, so a custom storefront
//! only overrides the keys it needs:
//!
//! ```toml
//! [guardrails]
//! enabled = true
//! discovery_view = "/find"
//! verification_view = "/basket"
//!
//! [[guardrails.prerequisites]]
//! target = "#minPrice"
//! value = "5"
//! ```

use committee_domain::{FlowGuardrailConfig, GuardrailChain};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGuardrailsConfig {
    pub enabled: bool,
    #[serde(flatten)]
    pub flow: FlowGuardrailConfig,
}

impl Default for FileGuardrailsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            flow: FlowGuardrailConfig::default(),
        }
    }
}

impl FileGuardrailsConfig {
    /// Build the rule chain, or an empty one when disabled
    pub fn to_chain(&self) -> GuardrailChain {
        if self.enabled {
            GuardrailChain::new(self.flow.clone())
        } else {
            GuardrailChain::disabled()
        }
    }
}
