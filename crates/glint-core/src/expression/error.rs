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

//! Error types for predicate expression parsing and evaluation.

use super::ValueKind;
use std::fmt;

/// An error raised while building or evaluating a capability predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    /// A configuration node could not be parsed into an expression.
    ///
    /// Parse errors are fatal for the technique being built: no partial
    /// expression tree is kept.
    Parse {
        /// The operator or node being parsed.
        what: String,
        /// What was wrong with it.
        details: String,
    },
    /// The configuration used an operator this interpreter does not know.
    UnknownOperator(String),
    /// A binding slot index was outside the layout the binding was built from.
    SlotOutOfRange {
        /// The requested slot location.
        location: usize,
        /// The number of slots in the binding.
        len: usize,
    },
    /// A binding slot held a value of a different kind than requested.
    KindMismatch {
        /// The slot location that was accessed.
        location: usize,
        /// The kind the caller asked for.
        expected: ValueKind,
        /// The kind actually stored in the slot.
        found: ValueKind,
    },
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionError::Parse { what, details } => {
                write!(f, "Failed to parse '{what}' expression: {details}")
            }
            ExpressionError::UnknownOperator(name) => {
                write!(f, "Unknown expression operator: '{name}'")
            }
            ExpressionError::SlotOutOfRange { location, len } => {
                write!(f, "Binding slot {location} out of range (layout has {len} slots)")
            }
            ExpressionError::KindMismatch {
                location,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Binding slot {location} holds a {found:?} value, expected {expected:?}"
                )
            }
        }
    }
}

impl std::error::Error for ExpressionError {}
