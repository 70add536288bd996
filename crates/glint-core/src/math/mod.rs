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

//! Math primitives shared by the scene-side crates.
//!
//! Only the types the technique and light-effect code actually consume live
//! here: vectors, a column-major 4x4 matrix, a linear color, and an axis
//! aligned bounding box.

mod color;
mod geometry;
mod matrix;
mod vector;

pub use color::LinearRgba;
pub use geometry::Aabb;
pub use matrix::Mat4;
pub use vector::{Vec3, Vec4};

/// A small tolerance used for floating point comparisons.
pub const EPSILON: f32 = 1e-6;
