//! Per-session navigation state.
//!
//! The surrounding runtime creates one [`SessionState`] per user session and
//! passes it by `&mut` into the [`Navigator`](crate::Navigator). The navigator
//! only ever writes three keys ([`KEY_EXPRESSION`], [`KEY_FILE`],
//! [`KEY_BLOCK`]) and the breadcrumb trail; any other variables belong to the
//! runtime.
//!
//! All mutation happens in the `commit_*` methods, which are synchronous.
//! Either the whole commit applies or none of it does.

use std::collections::HashMap;

use signpost_types::{BlockId, FileId, NavigationContext, NavigationTarget, SessionId};

use crate::breadcrumbs::{BreadcrumbEntry, BreadcrumbStack};
use crate::error::StateError;

/// Raw expression of the last successful navigation (diagnostic only).
pub const KEY_EXPRESSION: &str = "nav.expression";
/// Current file identifier.
pub const KEY_FILE: &str = "nav.file";
/// Current block identifier.
pub const KEY_BLOCK: &str = "nav.block";
/// Written to [`KEY_EXPRESSION`] after a back navigation.
pub const BACK_MARKER: &str = "<back>";

/// Session record: runtime variables plus the breadcrumb trail.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Session ID.
    pub id: SessionId,
    vars: HashMap<String, String>,
    breadcrumbs: BreadcrumbStack,
}

impl SessionState {
    /// Create an empty session that has not landed anywhere yet.
    pub fn new() -> Self {
        Self::with_id(SessionId::new())
    }

    pub fn with_id(id: SessionId) -> Self {
        Self {
            id,
            vars: HashMap::new(),
            breadcrumbs: BreadcrumbStack::new(),
        }
    }

    // ========================================================================
    // Variables
    // ========================================================================

    pub fn get_var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(|s| s.as_str())
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn unset_var(&mut self, name: &str) -> Option<String> {
        self.vars.remove(name)
    }

    pub fn vars(&self) -> &HashMap<String, String> {
        &self.vars
    }

    // ========================================================================
    // Navigation keys
    // ========================================================================

    pub fn current_expression(&self) -> Option<&str> {
        self.get_var(KEY_EXPRESSION)
    }

    pub fn current_file(&self) -> Option<&str> {
        self.get_var(KEY_FILE)
    }

    pub fn current_block(&self) -> Option<&str> {
        self.get_var(KEY_BLOCK)
    }

    /// Context for resolving the next link: the top of the trail.
    pub fn context(&self) -> Option<NavigationContext> {
        self.breadcrumbs.peek().map(BreadcrumbEntry::context)
    }

    /// Current location, if landed.
    pub fn location(&self) -> Option<NavigationTarget> {
        self.breadcrumbs.peek().map(BreadcrumbEntry::target)
    }

    pub fn breadcrumbs(&self) -> &BreadcrumbStack {
        &self.breadcrumbs
    }

    pub fn is_landed(&self) -> bool {
        self.breadcrumbs.is_landed()
    }

    // ========================================================================
    // Commit points
    // ========================================================================

    /// Record a successful forward navigation.
    pub(crate) fn commit_forward(&mut self, expression: &str, target: &NavigationTarget) {
        self.breadcrumbs.push(BreadcrumbEntry::from(target.clone()));
        self.write_location(expression, &target.file, &target.block);
    }

    /// Discard the trail and land at `target`.
    pub(crate) fn commit_landing(&mut self, expression: &str, target: &NavigationTarget) {
        self.breadcrumbs.reset(BreadcrumbEntry::from(target.clone()));
        self.write_location(expression, &target.file, &target.block);
    }

    /// Pop the trail and point the session at the newly exposed entry.
    ///
    /// On underflow nothing is written.
    pub(crate) fn commit_back(&mut self) -> Result<NavigationTarget, StateError> {
        let target = self.breadcrumbs.pop()?.target();
        self.write_location(BACK_MARKER, &target.file, &target.block);
        Ok(target)
    }

    fn write_location(&mut self, expression: &str, file: &FileId, block: &BlockId) {
        self.set_var(KEY_EXPRESSION, expression);
        self.set_var(KEY_FILE, file.as_str());
        self.set_var(KEY_BLOCK, block.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(file: &str, block: &str) -> NavigationTarget {
        NavigationTarget::new(FileId::parse(file).unwrap(), BlockId::new(block).unwrap())
    }

    #[test]
    fn test_new_session_is_not_landed() {
        let session = SessionState::new();
        assert!(!session.is_landed());
        assert!(session.context().is_none());
        assert!(session.current_file().is_none());
    }

    #[test]
    fn test_commit_forward_writes_keys() {
        let mut session = SessionState::new();
        session.commit_landing("~.menu", &target("main/menu", "main"));
        session.commit_forward("./settings", &target("main/settings", "display"));

        assert_eq!(session.current_expression(), Some("./settings"));
        assert_eq!(session.current_file(), Some("main/settings"));
        assert_eq!(session.current_block(), Some("display"));
        assert_eq!(session.breadcrumbs().depth(), 2);
    }

    #[test]
    fn test_commit_back_restores_previous() {
        let mut session = SessionState::new();
        session.commit_landing("~.menu", &target("main/menu", "main"));
        session.commit_forward("./settings", &target("main/settings", "display"));

        let back = session.commit_back().unwrap();
        assert_eq!(back, target("main/menu", "main"));
        assert_eq!(session.current_expression(), Some(BACK_MARKER));
        assert_eq!(session.current_file(), Some("main/menu"));
        assert_eq!(session.current_block(), Some("main"));
    }

    #[test]
    fn test_underflow_leaves_keys_untouched() {
        let mut session = SessionState::new();
        session.commit_landing("~.menu", &target("main/menu", "main"));
        let before = session.vars().clone();

        assert_eq!(session.commit_back(), Err(StateError::Underflow { depth: 1 }));
        assert_eq!(session.vars(), &before);
    }

    #[test]
    fn test_runtime_vars_are_preserved() {
        let mut session = SessionState::new();
        session.set_var("locale", "en");
        session.commit_landing("~.menu", &target("main/menu", "main"));
        assert_eq!(session.get_var("locale"), Some("en"));
        assert_eq!(session.unset_var("locale"), Some("en".into()));
    }
}
