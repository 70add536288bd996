// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Graphics-context contracts and context-bound task hand-off.
//!
//! A [`GraphicsContext`] represents one GPU/rendering-surface association,
//! identified by an integer id. Capability queries (GL version, extension
//! strings) may only be answerable with the context current on a particular
//! thread, so a context may own a dedicated [`GraphicsThread`] to which
//! context-bound operations are funneled. Callers that just need the answer
//! "eventually" submit a [`GraphicsOperation`] through
//! [`GraphicsContext::run_or_enqueue`] and poll for the result.

mod thread;

pub use thread::GraphicsThread;

use std::sync::Arc;

/// Identifies one rendering context.
pub type ContextId = u32;

/// Answers GPU capability queries for a context.
///
/// Implemented by the host toolkit over its GL state; tests substitute a
/// fixed table.
pub trait GlCapabilities: Send + Sync {
    /// Returns the numeric driver/API version for the context.
    fn gl_version(&self, context: ContextId) -> f32;

    /// Returns whether the named extension string is present for the context.
    fn is_extension_supported(&self, context: ContextId, extension: &str) -> bool;
}

/// A unit of work bound to a graphics context, executed once.
pub trait GraphicsOperation: Send + Sync {
    /// A short name for logging.
    fn name(&self) -> &str;

    /// Runs the operation with the owning context.
    fn run(&self, context: &GraphicsContext);
}

/// A handle to one rendering context.
///
/// Owns the context id, the capability source, and optionally the dedicated
/// worker thread for context-bound operations. Contexts are shared through
/// `Arc` so deferred operations can keep them alive while queued.
pub struct GraphicsContext {
    id: ContextId,
    capabilities: Arc<dyn GlCapabilities>,
    graphics_thread: Option<GraphicsThread>,
}

impl GraphicsContext {
    /// Creates a context without a dedicated worker thread.
    ///
    /// Operations handed to [`run_or_enqueue`](Self::run_or_enqueue) execute
    /// inline on the calling thread.
    pub fn new(id: ContextId, capabilities: Arc<dyn GlCapabilities>) -> Arc<Self> {
        Arc::new(Self {
            id,
            capabilities,
            graphics_thread: None,
        })
    }

    /// Creates a context with a dedicated worker thread.
    ///
    /// The worker holds only a weak back-reference, so dropping the last
    /// external `Arc` shuts the thread down.
    pub fn with_graphics_thread(id: ContextId, capabilities: Arc<dyn GlCapabilities>) -> Arc<Self> {
        Arc::new_cyclic(|context| Self {
            id,
            capabilities,
            graphics_thread: Some(GraphicsThread::spawn(id, context.clone())),
        })
    }

    /// Returns the context id.
    pub fn context_id(&self) -> ContextId {
        self.id
    }

    /// Returns the capability source for this context.
    pub fn capabilities(&self) -> &dyn GlCapabilities {
        self.capabilities.as_ref()
    }

    /// Returns the dedicated worker thread, if the context has one.
    pub fn graphics_thread(&self) -> Option<&GraphicsThread> {
        self.graphics_thread.as_ref()
    }

    /// Hands an operation to the context.
    ///
    /// With a dedicated worker thread the operation is enqueued and this call
    /// returns immediately; otherwise the operation runs inline before the
    /// call returns.
    pub fn run_or_enqueue(&self, operation: Box<dyn GraphicsOperation>) {
        match &self.graphics_thread {
            Some(thread) => thread.enqueue(operation),
            None => {
                log::trace!(
                    "running '{}' inline on context {}",
                    operation.name(),
                    self.id
                );
                operation.run(self);
            }
        }
    }
}

impl std::fmt::Debug for GraphicsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsContext")
            .field("id", &self.id)
            .field("has_graphics_thread", &self.graphics_thread.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    struct NullCaps;

    impl GlCapabilities for NullCaps {
        fn gl_version(&self, _context: ContextId) -> f32 {
            0.0
        }

        fn is_extension_supported(&self, _context: ContextId, _extension: &str) -> bool {
            false
        }
    }

    struct CountingOp {
        runs: Arc<AtomicUsize>,
    }

    impl GraphicsOperation for CountingOp {
        fn name(&self) -> &str {
            "CountingOp"
        }

        fn run(&self, context: &GraphicsContext) {
            assert_eq!(context.context_id(), 7);
            self.runs.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_inline_execution_without_thread() {
        let context = GraphicsContext::new(7, Arc::new(NullCaps));
        let runs = Arc::new(AtomicUsize::new(0));
        context.run_or_enqueue(Box::new(CountingOp { runs: runs.clone() }));
        // No thread: the operation already ran.
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_enqueue_on_graphics_thread() {
        let context = GraphicsContext::with_graphics_thread(7, Arc::new(NullCaps));
        assert!(context.graphics_thread().is_some());
        let runs = Arc::new(AtomicUsize::new(0));
        context.run_or_enqueue(Box::new(CountingOp { runs: runs.clone() }));

        let deadline = Instant::now() + Duration::from_secs(5);
        while runs.load(Ordering::SeqCst) == 0 {
            assert!(Instant::now() < deadline, "operation never ran");
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
