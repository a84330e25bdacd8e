/// Per-walker listing session state
///
/// Owned by one frontier walker for its whole lifetime, so the consent dialog
/// is handled once per session no matter how many pages follow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Set after the first dismissal attempt, successful or not
    pub consent_handled: bool,

    /// Listing pages opened through the session so far
    pub pages_opened: u32,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True until the first dismissal attempt has been made
    pub fn needs_consent(&self) -> bool {
        !self.consent_handled
    }

    pub fn mark_consent_handled(&mut self) {
        self.consent_handled = true;
    }

    pub fn record_page(&mut self) {
        self.pages_opened += 1;
    }
}
