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

//! GPU-capability predicate expressions.
//!
//! A technique decides whether it is usable on a given graphics context by
//! evaluating a small boolean expression over that context's capabilities:
//! the numeric GL version and the set of supported extension strings. The
//! expression tree is immutable once built and is evaluated read-only against
//! a [`Binding`] carrying the concrete slot values for one context, plus a
//! [`GlCapabilities`] source answering version/extension queries.

mod error;
pub mod parser;

pub use error::ExpressionError;

use crate::context::GlCapabilities;

/// The name under which the rendering context id is bound for evaluation.
pub const CONTEXT_ID_BINDING: &str = "__contextId";

/// The kind of value a binding slot can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// A 32-bit signed integer.
    Int,
    /// A 32-bit float.
    Float,
    /// A boolean.
    Bool,
}

/// A concrete value stored in a binding slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// An integer value.
    Int(i32),
    /// A float value.
    Float(f32),
    /// A boolean value.
    Bool(bool),
}

impl Value {
    fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Bool(_) => ValueKind::Bool,
        }
    }

    fn zero_of(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Int => Value::Int(0),
            ValueKind::Float => Value::Float(0.0),
            ValueKind::Bool => Value::Bool(false),
        }
    }
}

/// One named slot in a [`BindingLayout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableBinding {
    /// The symbolic name of the input (e.g. [`CONTEXT_ID_BINDING`]).
    pub name: String,
    /// The kind of value the slot holds.
    pub kind: ValueKind,
    /// The slot index assigned to the name.
    pub location: usize,
}

/// Maps symbolic input names to slot indices and value kinds.
///
/// The layout is built while parsing or constructing an expression and
/// consumed when building the [`Binding`] the expression is evaluated
/// against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingLayout {
    bindings: Vec<VariableBinding>,
}

impl BindingLayout {
    /// Creates an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named input and returns its slot location.
    ///
    /// Adding a name that is already bound returns the existing location
    /// instead of allocating a second slot.
    pub fn add_binding(&mut self, name: &str, kind: ValueKind) -> usize {
        if let Some(binding) = self.find_binding(name) {
            return binding.location;
        }
        let location = self.bindings.len();
        self.bindings.push(VariableBinding {
            name: name.to_owned(),
            kind,
            location,
        });
        location
    }

    /// Looks up a named input.
    pub fn find_binding(&self, name: &str) -> Option<&VariableBinding> {
        self.bindings.iter().find(|b| b.name == name)
    }

    /// Returns the number of slots in the layout.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` when the layout has no slots.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// A fixed-slot set of concrete values an expression is evaluated against.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    values: Vec<Value>,
}

impl Binding {
    /// Creates a binding with one zero-initialized slot per layout entry.
    pub fn from_layout(layout: &BindingLayout) -> Self {
        Self {
            values: layout
                .bindings
                .iter()
                .map(|b| Value::zero_of(b.kind))
                .collect(),
        }
    }

    /// Stores an integer into a slot.
    pub fn set_int(&mut self, location: usize, value: i32) -> Result<(), ExpressionError> {
        self.set(location, Value::Int(value))
    }

    /// Stores a float into a slot.
    pub fn set_float(&mut self, location: usize, value: f32) -> Result<(), ExpressionError> {
        self.set(location, Value::Float(value))
    }

    /// Reads an integer out of a slot.
    pub fn int(&self, location: usize) -> Result<i32, ExpressionError> {
        match self.get(location)? {
            Value::Int(v) => Ok(v),
            other => Err(ExpressionError::KindMismatch {
                location,
                expected: ValueKind::Int,
                found: other.kind(),
            }),
        }
    }

    fn set(&mut self, location: usize, value: Value) -> Result<(), ExpressionError> {
        let len = self.values.len();
        let slot = self
            .values
            .get_mut(location)
            .ok_or(ExpressionError::SlotOutOfRange { location, len })?;
        if slot.kind() != value.kind() {
            return Err(ExpressionError::KindMismatch {
                location,
                expected: slot.kind(),
                found: value.kind(),
            });
        }
        *slot = value;
        Ok(())
    }

    fn get(&self, location: usize) -> Result<Value, ExpressionError> {
        self.values
            .get(location)
            .copied()
            .ok_or(ExpressionError::SlotOutOfRange {
                location,
                len: self.values.len(),
            })
    }
}

/// A float-valued leaf of the predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FloatExpr {
    /// A constant.
    Const(f32),
    /// The numeric driver/API version for the bound context.
    GlVersion {
        /// The binding slot carrying the context id.
        context_slot: usize,
    },
}

impl FloatExpr {
    /// Evaluates the leaf against one context's capabilities.
    pub fn evaluate(
        &self,
        caps: &dyn GlCapabilities,
        binding: &Binding,
    ) -> Result<f32, ExpressionError> {
        match self {
            FloatExpr::Const(value) => Ok(*value),
            FloatExpr::GlVersion { context_slot } => {
                let context_id = binding.int(*context_slot)? as u32;
                Ok(caps.gl_version(context_id))
            }
        }
    }
}

/// A boolean node of the predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum BoolExpr {
    /// True when every operand is true. An empty operand list is true.
    And(Vec<BoolExpr>),
    /// True when any operand is true. An empty operand list is false.
    Or(Vec<BoolExpr>),
    /// True when the left operand is less than or equal to the right one.
    LessEqual(FloatExpr, FloatExpr),
    /// True when the named GL extension is present for the bound context.
    ExtensionSupported {
        /// The extension string to look for.
        extension: String,
        /// The binding slot carrying the context id.
        context_slot: usize,
    },
}

impl BoolExpr {
    /// Evaluates the predicate against one context's capabilities.
    ///
    /// Evaluation is read-only; the same tree can be evaluated concurrently
    /// for different contexts.
    pub fn evaluate(
        &self,
        caps: &dyn GlCapabilities,
        binding: &Binding,
    ) -> Result<bool, ExpressionError> {
        match self {
            BoolExpr::And(operands) => {
                for operand in operands {
                    if !operand.evaluate(caps, binding)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            BoolExpr::Or(operands) => {
                for operand in operands {
                    if operand.evaluate(caps, binding)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            BoolExpr::LessEqual(lhs, rhs) => {
                Ok(lhs.evaluate(caps, binding)? <= rhs.evaluate(caps, binding)?)
            }
            BoolExpr::ExtensionSupported {
                extension,
                context_slot,
            } => {
                let context_id = binding.int(*context_slot)? as u32;
                Ok(caps.is_extension_supported(context_id, extension))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextId;
    use std::collections::HashSet;

    struct FakeCaps {
        version: f32,
        extensions: HashSet<String>,
    }

    impl GlCapabilities for FakeCaps {
        fn gl_version(&self, _context: ContextId) -> f32 {
            self.version
        }

        fn is_extension_supported(&self, _context: ContextId, extension: &str) -> bool {
            self.extensions.contains(extension)
        }
    }

    fn caps(version: f32, extensions: &[&str]) -> FakeCaps {
        FakeCaps {
            version,
            extensions: extensions.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn context_binding() -> (BindingLayout, Binding, usize) {
        let mut layout = BindingLayout::new();
        let slot = layout.add_binding(CONTEXT_ID_BINDING, ValueKind::Int);
        let mut binding = Binding::from_layout(&layout);
        binding.set_int(slot, 0).unwrap();
        (layout, binding, slot)
    }

    #[test]
    fn test_layout_dedupes_names() {
        let mut layout = BindingLayout::new();
        let a = layout.add_binding(CONTEXT_ID_BINDING, ValueKind::Int);
        let b = layout.add_binding(CONTEXT_ID_BINDING, ValueKind::Int);
        assert_eq!(a, b);
        assert_eq!(layout.len(), 1);
    }

    #[test]
    fn test_binding_kind_mismatch() {
        let (_, mut binding, slot) = context_binding();
        let err = binding.set_float(slot, 1.0).unwrap_err();
        assert!(matches!(err, ExpressionError::KindMismatch { .. }));
    }

    #[test]
    fn test_binding_slot_out_of_range() {
        let (_, binding, _) = context_binding();
        let err = binding.int(7).unwrap_err();
        assert_eq!(
            err,
            ExpressionError::SlotOutOfRange {
                location: 7,
                len: 1
            }
        );
    }

    #[test]
    fn test_version_comparison() {
        let (_, binding, slot) = context_binding();
        let expr = BoolExpr::LessEqual(
            FloatExpr::Const(5.0),
            FloatExpr::GlVersion { context_slot: slot },
        );
        assert!(expr.evaluate(&caps(5.0, &[]), &binding).unwrap());
        assert!(!expr.evaluate(&caps(4.9, &[]), &binding).unwrap());
    }

    #[test]
    fn test_extension_leaf() {
        let (_, binding, slot) = context_binding();
        let expr = BoolExpr::ExtensionSupported {
            extension: "GL_ARB_shader_objects".to_owned(),
            context_slot: slot,
        };
        assert!(expr
            .evaluate(&caps(1.1, &["GL_ARB_shader_objects"]), &binding)
            .unwrap());
        assert!(!expr.evaluate(&caps(1.1, &[]), &binding).unwrap());
    }

    #[test]
    fn test_empty_combinators() {
        let (_, binding, _) = context_binding();
        let c = caps(1.0, &[]);
        assert!(BoolExpr::And(vec![]).evaluate(&c, &binding).unwrap());
        assert!(!BoolExpr::Or(vec![]).evaluate(&c, &binding).unwrap());
    }
}
