//! Per-run mission context
//!
//! A `MissionContext` is created by the orchestrator for exactly one run and
//! handed to the mission body. It owns the command queue and the scope stack,
//! so nothing queued in one run can leak into another.

use crate::command::QueuedCommand;
use crate::scope::ScopeStack;
use liftoff_types::CommandKind;
use std::ops::{Deref, DerefMut};
use tracing::debug;

/// Command queue and scope stack for the mission body of one run
#[derive(Debug)]
pub struct MissionContext {
    /// Name of the target selected for this run
    target: String,
    /// Commands in execution order
    queue: Vec<QueuedCommand>,
    /// Active scope prefixes
    scopes: ScopeStack,
}

impl MissionContext {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            queue: Vec::new(),
            scopes: ScopeStack::new(),
        }
    }

    /// Target the current run was started against
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Queue a command for every host of the target
    pub fn remote(&mut self, cmd: impl AsRef<str>) {
        self.enqueue(CommandKind::Remote, cmd.as_ref());
    }

    /// Queue a command that runs once on the local machine
    pub fn local(&mut self, cmd: impl AsRef<str>) {
        self.enqueue(CommandKind::Local, cmd.as_ref());
    }

    /// `cmd` with every active scope prefix prepended
    pub fn compose(&self, cmd: &str) -> String {
        self.scopes.compose(cmd)
    }

    /// Enter a scope; it is left when the returned guard is dropped.
    ///
    /// Useful in async mission bodies where the scope has to stay active
    /// across `.await` points.
    pub fn scope(&mut self, prefix: impl Into<String>) -> ScopeGuard<'_> {
        let prefix = prefix.into();
        debug!(prefix = %prefix, depth = self.scopes.depth() + 1, "Entering scope");
        self.scopes.push(prefix);
        ScopeGuard { ctx: self }
    }

    /// Run `f` with `prefix` prepended to every command it queues.
    ///
    /// The prefix is popped on every exit path of `f`, including an early
    /// return of an `Err`.
    pub fn with_scope<F, R>(&mut self, prefix: impl Into<String>, f: F) -> R
    where
        F: FnOnce(&mut MissionContext) -> R,
    {
        let mut guard = self.scope(prefix);
        f(&mut *guard)
    }

    /// Commands queued so far, in execution order
    pub fn queued(&self) -> &[QueuedCommand] {
        &self.queue
    }

    /// Number of scopes currently entered
    pub fn scope_depth(&self) -> usize {
        self.scopes.depth()
    }

    pub(crate) fn into_queue(self) -> Vec<QueuedCommand> {
        self.queue
    }

    fn enqueue(&mut self, kind: CommandKind, cmd: &str) {
        let command = QueuedCommand::new(kind, self.scopes.compose(cmd));
        debug!(
            kind = %kind,
            command = %command.text(),
            position = self.queue.len(),
            "Queued command"
        );
        self.queue.push(command);
    }
}

/// Keeps a scope entered for as long as it is alive
pub struct ScopeGuard<'a> {
    ctx: &'a mut MissionContext,
}

impl Deref for ScopeGuard<'_> {
    type Target = MissionContext;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        if let Some(prefix) = self.ctx.scopes.pop() {
            debug!(prefix = %prefix, depth = self.ctx.scopes.depth(), "Leaving scope");
        }
    }
}
