/// Result of evaluating a start request against a rule snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// A rule matched; its detail payload is released verbatim.
    Granted { detail: String },
    Denied,
}

impl Decision {
    pub fn is_granted(&self) -> bool {
        matches!(self, Decision::Granted { .. })
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            Decision::Granted { detail } => Some(detail),
            Decision::Denied => None,
        }
    }
}

impl Default for Decision {
    fn default() -> Self {
        Decision::Denied
    }
}
