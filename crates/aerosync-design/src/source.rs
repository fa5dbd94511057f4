use std::fmt;

use serde::{Deserialize, Serialize};

/// The interaction a mutation came from. Selects the transmit timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeSource {
    /// Continuous input such as a slider drag. Throttled.
    Drag,
    /// Typed input confirmed by the user. Debounced.
    Text,
    /// Discrete selection: dropdown, toggle, preset load. Sent at once.
    #[default]
    Immediate,
}

impl ChangeSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Drag => "drag",
            Self::Text => "text",
            Self::Immediate => "immediate",
        }
    }
}

impl fmt::Display for ChangeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
