//! Parser configuration.

/// What a driver does with a line that fails to decode
/// (bad number, missing argument).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Report the line to the diagnostic sink and carry on.
    #[default]
    Skip,
    /// Stop at the first bad line and return its error.
    Abort,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub error_policy: ErrorPolicy,
}

impl ParseOptions {
    pub fn strict() -> Self {
        Self {
            error_policy: ErrorPolicy::Abort,
        }
    }
}
