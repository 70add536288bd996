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

//! Axis-aligned bounding boxes.

use super::Vec3;

/// An axis-aligned bounding box defined by its minimum and maximum corners.
///
/// A box is *valid* when every `min` component is less than or equal to the
/// corresponding `max` component. Freshly constructed drawables may report an
/// inverted (invalid) box to signal "no bound available".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// The corner with the smallest coordinates.
    pub min: Vec3,
    /// The corner with the largest coordinates.
    pub max: Vec3,
}

impl Aabb {
    /// Creates a new `Aabb` from explicit corners.
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Creates an inverted, invalid box.
    #[inline]
    pub const fn invalid() -> Self {
        Self {
            min: Vec3::new(f32::MAX, f32::MAX, f32::MAX),
            max: Vec3::new(f32::MIN, f32::MIN, f32::MIN),
        }
    }

    /// Returns `true` when the box encloses at least one point.
    #[inline]
    pub fn valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Calculates the center point of the box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns the distance from the center to a corner.
    #[inline]
    pub fn radius(&self) -> f32 {
        ((self.max - self.min) * 0.5).length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::EPSILON;
    use approx::assert_relative_eq;

    #[test]
    fn test_center_and_radius() {
        let bb = Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(bb.center(), Vec3::ZERO);
        assert_relative_eq!(bb.radius(), 3.0_f32.sqrt(), epsilon = EPSILON);
    }

    #[test]
    fn test_invalid_box() {
        assert!(!Aabb::invalid().valid());
        assert!(Aabb::new(Vec3::ZERO, Vec3::ZERO).valid());
    }
}
