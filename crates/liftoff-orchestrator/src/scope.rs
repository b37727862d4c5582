//! Scope stack used to compose command text

/// Joins scope prefixes and the final command
pub const CONJUNCTION: &str = " && ";

/// Prefix commands currently in effect, outermost first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeStack {
    prefixes: Vec<String>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, prefix: impl Into<String>) {
        self.prefixes.push(prefix.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.prefixes.pop()
    }

    pub fn depth(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Prepend every active prefix to `command`.
    ///
    /// `["cd /app", "source env"]` + `"make"` gives `cd /app && source env && make`.
    pub fn compose(&self, command: &str) -> String {
        if self.prefixes.is_empty() {
            return command.to_string();
        }
        let mut composed = self.prefixes.join(CONJUNCTION);
        composed.push_str(CONJUNCTION);
        composed.push_str(command);
        composed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_without_scope_is_identity() {
        let stack = ScopeStack::new();
        assert_eq!(stack.compose("uptime"), "uptime");
    }

    #[test]
    fn test_push_pop_is_lifo() {
        let mut stack = ScopeStack::new();
        stack.push("a");
        stack.push("b");
        assert_eq!(stack.compose("c"), "a && b && c");
        assert_eq!(stack.pop().as_deref(), Some("b"));
        assert_eq!(stack.compose("c"), "a && c");
        assert_eq!(stack.pop().as_deref(), Some("a"));
        assert!(stack.is_empty());
        assert_eq!(stack.pop(), None);
    }
}
