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

//! The dedicated worker thread of a graphics context.

use super::{ContextId, GraphicsContext, GraphicsOperation};
use std::sync::Weak;
use std::thread::{self, JoinHandle};

/// A worker thread bound to one graphics context.
///
/// Operations are fed through an unbounded channel and executed in submission
/// order. The worker keeps only a `Weak` reference to its context, so the
/// thread winds down once the context is dropped.
pub struct GraphicsThread {
    context_id: ContextId,
    sender: Option<flume::Sender<Box<dyn GraphicsOperation>>>,
    worker: Option<JoinHandle<()>>,
}

impl GraphicsThread {
    /// Spawns the worker for the given context.
    ///
    /// Called from `Arc::new_cyclic` while the owning context is being
    /// constructed, which is why the back-reference arrives as a `Weak`.
    pub(super) fn spawn(context_id: ContextId, context: Weak<GraphicsContext>) -> Self {
        let (sender, receiver) = flume::unbounded::<Box<dyn GraphicsOperation>>();
        let worker = thread::spawn(move || {
            while let Ok(operation) = receiver.recv() {
                match context.upgrade() {
                    Some(context) => {
                        log::trace!(
                            "running '{}' on graphics thread of context {}",
                            operation.name(),
                            context.context_id()
                        );
                        operation.run(&context);
                    }
                    None => {
                        log::debug!(
                            "context {context_id} is gone; dropping queued operation '{}'",
                            operation.name()
                        );
                        break;
                    }
                }
            }
        });
        Self {
            context_id,
            sender: Some(sender),
            worker: Some(worker),
        }
    }

    /// Submits an operation to the worker.
    ///
    /// Operations submitted after shutdown are dropped with a warning; the
    /// caller is expected to poll for results rather than rely on delivery.
    pub fn enqueue(&self, operation: Box<dyn GraphicsOperation>) {
        let Some(sender) = &self.sender else {
            return;
        };
        if let Err(err) = sender.send(operation) {
            log::warn!(
                "graphics thread for context {} is shut down; dropping operation: {err}",
                self.context_id
            );
        }
    }
}

impl Drop for GraphicsThread {
    fn drop(&mut self) {
        // Disconnect the channel so the worker drains and exits.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            // An operation can drop the last Arc of its own context, in which
            // case this drop runs on the worker itself and must not join it.
            if worker.thread().id() != thread::current().id() {
                let _ = worker.join();
            }
        }
    }
}

impl std::fmt::Debug for GraphicsThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsThread")
            .field("context_id", &self.context_id)
            .finish()
    }
}
