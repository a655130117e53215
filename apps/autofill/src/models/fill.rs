use serde::{Deserialize, Serialize};

/// A proposed write of `value` into the control identified by `selector`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillAssignment {
    pub selector: String,
    pub value: String,
}

impl FillAssignment {
    pub fn new(selector: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            value: value.into(),
        }
    }
}
