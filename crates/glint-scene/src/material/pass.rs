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

//! Render-state sets and technique passes.
//!
//! A [`StateSet`] is an ordered list of named render-state attributes plus
//! the per-context GPU object slots the host compiles them into. A [`Pass`]
//! applies one state set as a single step of a technique. Both are opaque to
//! the validity machinery; the technique only forwards GPU buffer
//! resize/release calls and pushes passes during cull traversal.

use glint_core::context::ContextId;
use std::sync::RwLock;

/// An ordered collection of named render-state attributes.
#[derive(Debug, Default)]
pub struct StateSet {
    name: Option<String>,
    attributes: Vec<(String, String)>,
    /// One compiled GPU object handle per context, populated by the host.
    gl_objects: RwLock<Vec<Option<u32>>>,
}

impl StateSet {
    /// Creates an empty state set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty, named state set.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Returns the state set's name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Appends or replaces a named attribute.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.attributes.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.attributes.push((name, value));
        }
    }

    /// Looks up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the attributes in insertion order.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Records the compiled GPU object handle for a context.
    pub fn set_gl_object(&self, context: ContextId, handle: u32) {
        let mut objects = self.gl_objects.write().unwrap();
        let index = context as usize;
        if objects.len() <= index {
            objects.resize(index + 1, None);
        }
        objects[index] = Some(handle);
    }

    /// Returns the compiled GPU object handle for a context, if any.
    pub fn gl_object(&self, context: ContextId) -> Option<u32> {
        let objects = self.gl_objects.read().unwrap();
        objects.get(context as usize).copied().flatten()
    }

    /// Grows the per-context object table to `len` slots. Never shrinks.
    pub fn resize_gl_object_buffers(&self, len: usize) {
        let mut objects = self.gl_objects.write().unwrap();
        if objects.len() < len {
            objects.resize(len, None);
        }
    }

    /// Drops the compiled object for one context, or for all contexts when
    /// `context` is `None`.
    pub fn release_gl_objects(&self, context: Option<ContextId>) {
        let mut objects = self.gl_objects.write().unwrap();
        match context {
            Some(id) => {
                if let Some(slot) = objects.get_mut(id as usize) {
                    *slot = None;
                }
            }
            None => {
                for slot in objects.iter_mut() {
                    *slot = None;
                }
            }
        }
    }
}

impl Clone for StateSet {
    /// Deep copy: attributes are carried over, compiled per-context objects
    /// are not (they belong to the original's contexts).
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            gl_objects: RwLock::new(Vec::new()),
        }
    }
}

/// One configured render-state application step within a technique.
#[derive(Debug, Default, Clone)]
pub struct Pass {
    state: StateSet,
}

impl Pass {
    /// Creates a pass around a state set.
    pub fn new(state: StateSet) -> Self {
        Self { state }
    }

    /// Returns the pass's state set.
    pub fn state(&self) -> &StateSet {
        &self.state
    }

    /// Returns the pass's state set mutably, for configuration.
    pub fn state_mut(&mut self) -> &mut StateSet {
        &mut self.state
    }

    /// Forwards a buffer resize to the state set.
    pub fn resize_gl_object_buffers(&self, len: usize) {
        self.state.resize_gl_object_buffers(len);
    }

    /// Forwards a GPU object release to the state set.
    pub fn release_gl_objects(&self, context: Option<ContextId>) {
        self.state.release_gl_objects(context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_replacement() {
        let mut state = StateSet::new();
        state.set_attribute("blend", "add");
        state.set_attribute("blend", "alpha");
        state.set_attribute("cull-face", "back");
        assert_eq!(state.attribute("blend"), Some("alpha"));
        assert_eq!(state.attributes().len(), 2);
    }

    #[test]
    fn test_gl_object_release() {
        let state = StateSet::new();
        state.set_gl_object(0, 10);
        state.set_gl_object(2, 12);
        state.release_gl_objects(Some(0));
        assert_eq!(state.gl_object(0), None);
        assert_eq!(state.gl_object(2), Some(12));
        state.release_gl_objects(None);
        assert_eq!(state.gl_object(2), None);
    }

    #[test]
    fn test_clone_drops_compiled_objects() {
        let mut state = StateSet::with_name("glass");
        state.set_attribute("blend", "alpha");
        state.set_gl_object(1, 99);
        let copy = state.clone();
        assert_eq!(copy.name(), Some("glass"));
        assert_eq!(copy.attribute("blend"), Some("alpha"));
        assert_eq!(copy.gl_object(1), None);
    }

    #[test]
    fn test_resize_never_shrinks() {
        let state = StateSet::new();
        state.set_gl_object(5, 1);
        state.resize_gl_object_buffers(2);
        assert_eq!(state.gl_object(5), Some(1));
    }
}
