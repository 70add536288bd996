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

//! Builds predicate expression trees from property-tree configuration.
//!
//! A predicate is written as a tree of single-operator objects:
//!
//! ```json
//! {
//!   "or": [
//!     { "less-equal": [2.0, { "glversion": {} }] },
//!     { "and": [
//!         { "extension-supported": "GL_ARB_shader_objects" },
//!         { "extension-supported": "GL_ARB_vertex_shader" }
//!     ] }
//!   ]
//! }
//! ```
//!
//! Parsing fails fast: a malformed node yields an [`ExpressionError`] and no
//! partial tree. Context-dependent leaves register the
//! [`CONTEXT_ID_BINDING`] slot in the caller-supplied [`BindingLayout`].

use super::{BindingLayout, BoolExpr, ExpressionError, FloatExpr, ValueKind, CONTEXT_ID_BINDING};
use serde_json::Value;

/// Parses a boolean predicate from a property tree.
pub fn parse_predicate(
    node: &Value,
    layout: &mut BindingLayout,
) -> Result<BoolExpr, ExpressionError> {
    let (operator, operand) = single_operator(node)?;
    match operator {
        "and" => Ok(BoolExpr::And(parse_operands(operator, operand, layout)?)),
        "or" => Ok(BoolExpr::Or(parse_operands(operator, operand, layout)?)),
        "less-equal" => {
            let operands = operand
                .as_array()
                .ok_or_else(|| parse_error(operator, "expected an array of two operands"))?;
            if operands.len() != 2 {
                return Err(parse_error(operator, "expected exactly two operands"));
            }
            Ok(BoolExpr::LessEqual(
                parse_float(&operands[0], layout)?,
                parse_float(&operands[1], layout)?,
            ))
        }
        "extension-supported" => {
            // The configuration input must be the extension string itself.
            let extension = operand
                .as_str()
                .ok_or_else(|| parse_error(operator, "expression has wrong type, expected a string"))?;
            let context_slot = layout.add_binding(CONTEXT_ID_BINDING, ValueKind::Int);
            Ok(BoolExpr::ExtensionSupported {
                extension: extension.to_owned(),
                context_slot,
            })
        }
        other => Err(ExpressionError::UnknownOperator(other.to_owned())),
    }
}

/// Parses a float operand: a literal number, a `float` wrapper, or the
/// `glversion` leaf.
pub fn parse_float(node: &Value, layout: &mut BindingLayout) -> Result<FloatExpr, ExpressionError> {
    if let Some(value) = node.as_f64() {
        return Ok(FloatExpr::Const(value as f32));
    }
    let (operator, operand) = single_operator(node)?;
    match operator {
        "float" => operand
            .as_f64()
            .map(|v| FloatExpr::Const(v as f32))
            .ok_or_else(|| parse_error(operator, "expected a number")),
        // The version leaf takes no configuration; whatever payload the
        // property tree carries is ignored, matching the loader's tolerance
        // for empty element bodies.
        "glversion" => {
            let context_slot = layout.add_binding(CONTEXT_ID_BINDING, ValueKind::Int);
            Ok(FloatExpr::GlVersion { context_slot })
        }
        other => Err(ExpressionError::UnknownOperator(other.to_owned())),
    }
}

fn parse_operands(
    operator: &str,
    operand: &Value,
    layout: &mut BindingLayout,
) -> Result<Vec<BoolExpr>, ExpressionError> {
    let nodes = operand
        .as_array()
        .ok_or_else(|| parse_error(operator, "expected an array of operands"))?;
    nodes
        .iter()
        .map(|n| parse_predicate(n, layout))
        .collect()
}

fn single_operator(node: &Value) -> Result<(&str, &Value), ExpressionError> {
    let object = node
        .as_object()
        .ok_or_else(|| parse_error("expression", "expected a single-operator object"))?;
    let mut entries = object.iter();
    match (entries.next(), entries.next()) {
        (Some((key, value)), None) => Ok((key.as_str(), value)),
        _ => Err(parse_error(
            "expression",
            "expected exactly one operator per node",
        )),
    }
}

fn parse_error(what: &str, details: &str) -> ExpressionError {
    ExpressionError::Parse {
        what: what.to_owned(),
        details: details.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_version_or_extensions() {
        let node = json!({
            "or": [
                { "less-equal": [2.0, { "glversion": {} }] },
                { "and": [
                    { "extension-supported": "GL_ARB_shader_objects" },
                    { "extension-supported": "GL_ARB_vertex_shader" }
                ] }
            ]
        });
        let mut layout = BindingLayout::new();
        let expr = parse_predicate(&node, &mut layout).unwrap();
        // All context-dependent leaves share one slot.
        assert_eq!(layout.len(), 1);
        assert!(layout.find_binding(CONTEXT_ID_BINDING).is_some());
        match expr {
            BoolExpr::Or(operands) => assert_eq!(operands.len(), 2),
            other => panic!("expected an Or node, got {other:?}"),
        }
    }

    #[test]
    fn test_extension_supported_requires_string() {
        let node = json!({ "extension-supported": 42 });
        let mut layout = BindingLayout::new();
        let err = parse_predicate(&node, &mut layout).unwrap_err();
        assert!(matches!(err, ExpressionError::Parse { .. }));
        // Fail fast: nothing was registered for the broken leaf.
        assert!(layout.is_empty());
    }

    #[test]
    fn test_unknown_operator() {
        let node = json!({ "greater": [1.0, 2.0] });
        let mut layout = BindingLayout::new();
        let err = parse_predicate(&node, &mut layout).unwrap_err();
        assert_eq!(err, ExpressionError::UnknownOperator("greater".to_owned()));
    }

    #[test]
    fn test_float_literal_operand() {
        let mut layout = BindingLayout::new();
        let expr = parse_float(&json!(1.5), &mut layout).unwrap();
        assert_eq!(expr, FloatExpr::Const(1.5));
        let expr = parse_float(&json!({ "float": 2.5 }), &mut layout).unwrap();
        assert_eq!(expr, FloatExpr::Const(2.5));
    }
}
