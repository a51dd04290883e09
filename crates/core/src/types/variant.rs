//! Product variant attributes selected at add-to-cart time.

use serde::{Deserialize, Serialize};

/// Variant attributes that are part of a cart line's identity.
///
/// Two cart lines for the same product merge only when every attribute here
/// matches exactly (an absent attribute only matches another absent one).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantAttributes {
    /// Keyboard switch type (e.g. "Gateron Brown").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub switch_type: Option<String>,
    /// Keyboard layout (e.g. "ANSI 75%").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
}

impl VariantAttributes {
    /// Attributes with only a switch type.
    #[must_use]
    pub fn switch(switch_type: impl Into<String>) -> Self {
        Self {
            switch_type: Some(switch_type.into()),
            layout: None,
        }
    }

    /// Set the layout.
    #[must_use]
    pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    /// Returns `true` if no attribute is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.switch_type.is_none() && self.layout.is_none()
    }
}
