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

//! Scene-level rendering building blocks.
//!
//! This crate layers on top of `glint-core`'s graphics contexts and
//! capability expressions:
//!
//! * [`material`] holds render techniques, their passes, and the
//!   per-context validity cache that gates a technique on the capabilities
//!   of each graphics context.
//! * [`cull`] holds the cull traversal state used while collecting
//!   drawables into depth-sorted render bins.
//! * [`model`] holds model animations, currently the light animation that
//!   instantiates shared light effects from model configuration.
//! * [`node`] holds the minimal scene node the animations operate on.

#![warn(missing_docs)]

pub mod cull;
pub mod material;
pub mod model;
pub mod node;

pub use cull::{CullContext, Drawable, RenderLeaf};
pub use material::{Pass, StateSet, Technique, ValidityStatus};
pub use model::{Effect, EffectCache, LightAnimation, LightConfig};
