//! Session state: the current compilation handle and global variable values.

use std::sync::Arc;

use kiln_core::Variables;

#[derive(Debug)]
pub struct SessionState<C> {
    handle: Option<Arc<C>>,
    variables: Variables,
}

impl<C> Default for SessionState<C> {
    fn default() -> Self {
        Self {
            handle: None,
            variables: Variables::new(),
        }
    }
}

impl<C> SessionState<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The compilation of the last accepted submission, if any.
    pub fn current_handle(&self) -> Option<&Arc<C>> {
        self.handle.as_ref()
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut Variables {
        &mut self.variables
    }

    /// Makes `handle` current. Variable values are left alone.
    pub fn commit(&mut self, handle: Arc<C>) {
        self.handle = Some(handle);
    }

    /// Drops the handle and every variable value.
    pub fn reset(&mut self) {
        self.handle = None;
        self.variables.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::{Value, VariableId};

    #[test]
    fn test_commit_keeps_variables() {
        let mut state: SessionState<u32> = SessionState::new();
        let id = VariableId {
            generation: 1,
            ordinal: 0,
        };
        state.variables_mut().insert(id, Value::Integer(1));
        state.commit(Arc::new(7));

        assert_eq!(state.current_handle().map(|h| **h), Some(7));
        assert_eq!(state.variables().get(&id), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut state: SessionState<u32> = SessionState::new();
        state.commit(Arc::new(1));
        state.reset();
        state.reset();
        assert!(state.current_handle().is_none());
        assert!(state.variables().is_empty());
    }
}
