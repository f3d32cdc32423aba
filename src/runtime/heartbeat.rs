use std::sync::Mutex;

use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::lock;
use crate::page::context::ComponentContext;
use crate::runtime::environment::Capability;

/// Work scheduled to run when the innermost heartbeat ends.
pub type Deferred = Box<dyn FnOnce(&mut ComponentContext<'_>) -> TapestryResult<()> + Send>;

/// Nested scopes of deferred commands. Commands run synchronously, in the order they were
/// deferred, when their frame ends.
#[derive(Default)]
pub struct Heartbeat {
    frames: Mutex<Vec<Vec<Deferred>>>,
}

impl Capability for Heartbeat {
    const NAME: &'static str = "Heartbeat";
}

impl Heartbeat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) {
        lock(&self.frames).push(Vec::new());
    }

    pub fn is_active(&self) -> bool {
        !lock(&self.frames).is_empty()
    }

    pub fn defer(&self, command: Deferred) -> TapestryResult<()> {
        let mut frames = lock(&self.frames);
        let frame = frames
            .last_mut()
            .ok_or_else(|| TapestryError::environment("defer called outside of a heartbeat"))?;
        frame.push(command);
        Ok(())
    }

    /// Closes the innermost frame and runs its commands. Commands deferred while these run
    /// land in the enclosing frame.
    pub fn end(&self, ctx: &mut ComponentContext<'_>) -> TapestryResult<()> {
        let commands = lock(&self.frames)
            .pop()
            .ok_or_else(|| TapestryError::environment("heartbeat end without begin"))?;
        tracing::trace!(count = commands.len(), "heartbeat end");
        for command in commands {
            command(ctx)?;
        }
        Ok(())
    }
}
