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

//! Cull-traversal support for drawable batching.
//!
//! A [`CullContext`] carries the state a technique needs while batching
//! drawables: the model-view matrix, the running near/far estimate, the pass
//! state stack, and the render bin the non-culled drawables are submitted
//! into with their eye-space depths.

use crate::material::Pass;
use glint_core::math::{Aabb, Mat4, Vec3};
use std::sync::Arc;

/// Something a technique can submit for drawing.
pub trait Drawable {
    /// The drawable's bounding box, when one is available.
    ///
    /// `None` (or an invalid box) means "no bound": such drawables are never
    /// frustum-culled and are submitted at depth zero.
    fn bound(&self) -> Option<Aabb>;

    /// A custom cull test. Returning `true` excludes the drawable from every
    /// pass of the current batch.
    fn cull(&self, _cull: &CullContext) -> bool {
        false
    }
}

/// One submission into the depth-sorted render bin.
#[derive(Debug, Clone)]
pub struct RenderLeaf {
    /// The pass the drawable is rendered with.
    pub pass: Arc<Pass>,
    /// The index of the drawable within the submitted batch.
    pub drawable: usize,
    /// The model-view matrix in effect at submission time.
    pub model_view: Mat4,
    /// The eye-space depth used for sorting.
    pub depth: f32,
}

/// Per-traversal state for culling and depth-sorted submission.
#[derive(Debug)]
pub struct CullContext {
    model_view: Mat4,
    compute_near_far: bool,
    calculated_znear: f32,
    calculated_zfar: f32,
    state_stack: Vec<Arc<Pass>>,
    render_bin: Vec<RenderLeaf>,
}

impl CullContext {
    /// Creates a traversal state for the given model-view matrix, with
    /// near/far computation enabled.
    pub fn new(model_view: Mat4) -> Self {
        Self {
            model_view,
            compute_near_far: true,
            calculated_znear: f32::INFINITY,
            calculated_zfar: f32::NEG_INFINITY,
            state_stack: Vec::new(),
            render_bin: Vec::new(),
        }
    }

    /// Returns the model-view matrix.
    pub fn model_view(&self) -> &Mat4 {
        &self.model_view
    }

    /// Enables or disables near/far tracking for this traversal.
    pub fn set_compute_near_far(&mut self, compute: bool) {
        self.compute_near_far = compute;
    }

    /// Returns whether near/far tracking is enabled.
    pub fn compute_near_far(&self) -> bool {
        self.compute_near_far
    }

    /// Returns the running near/far estimate, when one has been computed.
    pub fn calculated_near_far(&self) -> Option<(f32, f32)> {
        (self.calculated_znear <= self.calculated_zfar)
            .then_some((self.calculated_znear, self.calculated_zfar))
    }

    /// Computes the eye-space depth of a world-space point.
    ///
    /// The view looks down negative z in eye space, so depth grows positive
    /// in front of the eye.
    pub fn eye_depth(&self, point: Vec3) -> f32 {
        -self.model_view.transform_point(point).z
    }

    /// A conservative frustum test: a bound entirely behind the eye is
    /// culled. Invalid bounds are never culled.
    pub fn is_culled(&self, bound: &Aabb) -> bool {
        if !bound.valid() {
            return false;
        }
        self.eye_depth(bound.center()) + bound.radius() < 0.0
    }

    /// Merges a bound into the near/far estimate.
    ///
    /// Returns `false` when the bound lies entirely behind the eye, in which
    /// case the drawable should be excluded from submission.
    pub fn update_calculated_near_far(&mut self, bound: &Aabb) -> bool {
        let center_depth = self.eye_depth(bound.center());
        let radius = bound.radius();
        let zfar = center_depth + radius;
        if zfar < 0.0 {
            return false;
        }
        let znear = (center_depth - radius).max(0.0);
        self.calculated_znear = self.calculated_znear.min(znear);
        self.calculated_zfar = self.calculated_zfar.max(zfar);
        true
    }

    /// Pushes a pass onto the state stack; subsequent submissions use it.
    pub fn push_state(&mut self, pass: Arc<Pass>) {
        self.state_stack.push(pass);
    }

    /// Pops the top pass off the state stack.
    pub fn pop_state(&mut self) {
        if self.state_stack.pop().is_none() {
            log::warn!("pop_state on an empty state stack");
        }
    }

    /// Submits a drawable with its depth under the current pass.
    ///
    /// Submissions outside any pushed pass are dropped.
    pub fn add_drawable_and_depth(&mut self, drawable: usize, depth: f32) {
        let Some(pass) = self.state_stack.last() else {
            log::warn!("drawable {drawable} submitted outside any pass; dropped");
            return;
        };
        self.render_bin.push(RenderLeaf {
            pass: Arc::clone(pass),
            drawable,
            model_view: self.model_view,
            depth,
        });
    }

    /// Returns the submissions collected so far.
    pub fn render_bin(&self) -> &[RenderLeaf] {
        &self.render_bin
    }

    /// Drains the render bin sorted back-to-front for draw submission.
    pub fn drain_sorted_bin(&mut self) -> Vec<RenderLeaf> {
        let mut bin = std::mem::take(&mut self.render_bin);
        bin.sort_by(|a, b| b.depth.total_cmp(&a.depth));
        bin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glint_core::math::EPSILON;

    fn unit_box_at(z: f32) -> Aabb {
        Aabb::new(Vec3::new(-0.5, -0.5, z - 0.5), Vec3::new(0.5, 0.5, z + 0.5))
    }

    #[test]
    fn test_eye_depth() {
        let cull = CullContext::new(Mat4::IDENTITY);
        assert_relative_eq!(
            cull.eye_depth(Vec3::new(0.0, 0.0, -5.0)),
            5.0,
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_behind_eye_is_culled() {
        let cull = CullContext::new(Mat4::IDENTITY);
        assert!(cull.is_culled(&unit_box_at(5.0)));
        assert!(!cull.is_culled(&unit_box_at(-5.0)));
        assert!(!cull.is_culled(&Aabb::invalid()));
    }

    #[test]
    fn test_near_far_tracking() {
        let mut cull = CullContext::new(Mat4::IDENTITY);
        assert!(cull.update_calculated_near_far(&unit_box_at(-5.0)));
        assert!(cull.update_calculated_near_far(&unit_box_at(-10.0)));
        let (znear, zfar) = cull.calculated_near_far().unwrap();
        assert!(znear < 5.0 && znear > 0.0);
        assert!(zfar > 10.0);
        // Entirely behind the eye.
        assert!(!cull.update_calculated_near_far(&unit_box_at(5.0)));
    }

    #[test]
    fn test_submission_requires_pass() {
        let mut cull = CullContext::new(Mat4::IDENTITY);
        cull.add_drawable_and_depth(0, 1.0);
        assert!(cull.render_bin().is_empty());

        cull.push_state(Arc::new(Pass::default()));
        cull.add_drawable_and_depth(0, 1.0);
        cull.pop_state();
        assert_eq!(cull.render_bin().len(), 1);
    }

    #[test]
    fn test_drain_sorted_back_to_front() {
        let mut cull = CullContext::new(Mat4::IDENTITY);
        cull.push_state(Arc::new(Pass::default()));
        cull.add_drawable_and_depth(0, 1.0);
        cull.add_drawable_and_depth(1, 9.0);
        cull.add_drawable_and_depth(2, 4.0);
        cull.pop_state();
        let depths: Vec<f32> = cull.drain_sorted_bin().iter().map(|l| l.depth).collect();
        assert_eq!(depths, vec![9.0, 4.0, 1.0]);
        assert!(cull.render_bin().is_empty());
    }
}
