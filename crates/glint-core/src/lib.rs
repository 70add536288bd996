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

//! # Glint Core
//!
//! Foundational crate for the Glint scene toolkit extensions: math types,
//! GPU-capability predicate expressions, and the graphics-context contracts
//! used to funnel context-bound work onto the right thread.

#![warn(missing_docs)]

pub mod context;
pub mod expression;
pub mod math;

pub use context::{ContextId, GlCapabilities, GraphicsContext, GraphicsOperation};
pub use expression::{Binding, BindingLayout, BoolExpr, ExpressionError, FloatExpr};
