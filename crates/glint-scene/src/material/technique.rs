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

//! The technique façade.
//!
//! A [`Technique`] gates an ordered sequence of rendering [`Pass`]es behind a
//! GPU-capability predicate. Whether the predicate holds is cached per
//! rendering context; the render thread queries the cache with
//! [`Technique::valid`], which never blocks, and the actual capability check
//! runs as a deferred [`GraphicsOperation`] on the context's own thread.

use super::pass::{Pass, StateSet};
use super::validity::{ValidityCache, ValidityStatus};
use glint_core::context::{ContextId, GraphicsContext, GraphicsOperation};
use glint_core::expression::{
    Binding, BindingLayout, BoolExpr, FloatExpr, ValueKind, CONTEXT_ID_BINDING,
};
use std::sync::Arc;

/// The largest number of drawables one `process_drawables` call batches.
const MAX_DRAWABLES_PER_BATCH: usize = 128;

/// Sentinel depth marking a drawable as excluded from the batch.
const EXCLUDED_DEPTH: f32 = f32::MAX;

/// A unit of shading configuration gating rendering passes behind a
/// per-context validity predicate.
#[derive(Debug, Default)]
pub struct Technique {
    passes: Vec<Arc<Pass>>,
    shadowing_state: Option<Arc<StateSet>>,
    valid_expression: Option<Arc<BoolExpr>>,
    binding_layout: BindingLayout,
    context_id_slot: Option<usize>,
    always_valid: bool,
    contexts: ValidityCache,
}

/// The deferred capability check, executed once on the context's thread.
struct ValidateOperation {
    technique: Arc<Technique>,
}

impl GraphicsOperation for ValidateOperation {
    fn name(&self) -> &str {
        "ValidateOperation"
    }

    fn run(&self, context: &GraphicsContext) {
        self.technique.validate_in_context(context);
    }
}

impl Technique {
    /// Creates a technique. An `always_valid` technique skips the predicate
    /// and the cache entirely.
    pub fn new(always_valid: bool) -> Self {
        Self {
            always_valid,
            ..Self::default()
        }
    }

    /// Returns whether the technique is unconditionally valid.
    pub fn always_valid(&self) -> bool {
        self.always_valid
    }

    /// Marks the technique unconditionally valid.
    pub fn set_always_valid(&mut self, always_valid: bool) {
        self.always_valid = always_valid;
    }

    /// Appends a pass.
    pub fn add_pass(&mut self, pass: Pass) {
        self.passes.push(Arc::new(pass));
    }

    /// Returns the passes in application order.
    pub fn passes(&self) -> &[Arc<Pass>] {
        &self.passes
    }

    /// Returns the state set applied while this technique shadows others.
    pub fn shadowing_state(&self) -> Option<&Arc<StateSet>> {
        self.shadowing_state.as_ref()
    }

    /// Sets the shadowing state set.
    pub fn set_shadowing_state(&mut self, state: Arc<StateSet>) {
        self.shadowing_state = Some(state);
    }

    /// Returns the validity predicate, if one is set.
    pub fn valid_expression(&self) -> Option<&Arc<BoolExpr>> {
        self.valid_expression.as_ref()
    }

    /// Installs the validity predicate and resolves the context-id slot from
    /// the layout the predicate was built against.
    pub fn set_valid_expression(&mut self, expression: BoolExpr, layout: &BindingLayout) {
        self.valid_expression = Some(Arc::new(expression));
        self.binding_layout = layout.clone();
        self.context_id_slot = layout
            .find_binding(CONTEXT_ID_BINDING)
            .map(|binding| binding.location);
    }

    /// Installs the standard applicability predicate:
    /// `(min_version <= glversion) OR (ext1 AND ext2 AND ...)`.
    ///
    /// With no extensions the predicate is just the version test.
    pub fn set_gl_extensions_pred(&mut self, min_version: f32, extensions: &[String]) {
        let mut layout = BindingLayout::new();
        let context_slot = layout.add_binding(CONTEXT_ID_BINDING, ValueKind::Int);
        let version_test = BoolExpr::LessEqual(
            FloatExpr::Const(min_version),
            FloatExpr::GlVersion { context_slot },
        );
        let predicate = if extensions.is_empty() {
            version_test
        } else {
            let extension_tests = extensions
                .iter()
                .map(|extension| BoolExpr::ExtensionSupported {
                    extension: extension.clone(),
                    context_slot,
                })
                .collect();
            BoolExpr::Or(vec![version_test, BoolExpr::And(extension_tests)])
        };
        self.set_valid_expression(predicate, &layout);
    }

    /// Queries whether the technique is usable on the given context.
    ///
    /// Never blocks. When the cached answer is unknown, the caller that wins
    /// the compare-and-swap schedules the deferred check (on the context's
    /// graphics thread when it has one, inline otherwise) and gets
    /// [`ValidityStatus::QueryInProgress`] back; losers re-read the slot.
    /// `QueryInProgress` means "not decided yet, poll again later".
    pub fn valid(self: &Arc<Self>, context: &GraphicsContext) -> ValidityStatus {
        if self.always_valid {
            return ValidityStatus::Valid;
        }
        let slot = self.contexts.slot(context.context_id());
        let status = slot.load();
        if status != ValidityStatus::Unknown {
            return status;
        }
        let new_status = ValidityStatus::QueryInProgress;
        if !slot.compare_and_swap(status, new_status) {
            // Lost the race with another caller spawning the check.
            return slot.load();
        }
        log::debug!(
            "scheduling validity check for context {}",
            context.context_id()
        );
        context.run_or_enqueue(Box::new(ValidateOperation {
            technique: Arc::clone(self),
        }));
        new_status
    }

    /// Reads the cached status without triggering validation.
    pub fn get_valid_status(&self, context: ContextId) -> ValidityStatus {
        if self.always_valid {
            return ValidityStatus::Valid;
        }
        self.contexts.status(context)
    }

    /// Evaluates the predicate on the context's thread and publishes the
    /// result.
    ///
    /// The publish is a compare-and-swap from the previously observed slot
    /// value; losing it (a concurrent invalidation moved the slot first)
    /// discards this result silently and the next query re-validates.
    pub fn validate_in_context(&self, context: &GraphicsContext) {
        let context_id = context.context_id();
        let slot = self.contexts.slot(context_id);
        let old = slot.load();
        let new = if self.evaluate_predicate(context) {
            ValidityStatus::Valid
        } else {
            ValidityStatus::Invalid
        };
        if !slot.compare_and_swap(old, new) {
            log::debug!("validity result for context {context_id} raced and was discarded");
        }
    }

    fn evaluate_predicate(&self, context: &GraphicsContext) -> bool {
        let Some(expression) = &self.valid_expression else {
            // No predicate and not always-valid: nothing can vouch for the
            // technique on this context.
            return false;
        };
        let mut binding = Binding::from_layout(&self.binding_layout);
        if let Some(location) = self.context_id_slot {
            if let Err(err) = binding.set_int(location, context.context_id() as i32) {
                log::warn!("failed to bind context id for validity check: {err}");
                return false;
            }
        }
        match expression.evaluate(context.capabilities(), &binding) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("validity predicate evaluation failed: {err}");
                false
            }
        }
    }

    /// Forces all contexts back to `Unknown` so the next query re-validates.
    pub fn refresh_validity(&self) {
        self.contexts.reset_all();
    }

    /// Grows per-context buffers on the shadowing state, every pass, and the
    /// validity cache.
    pub fn resize_gl_object_buffers(&self, len: usize) {
        if let Some(state) = &self.shadowing_state {
            state.resize_gl_object_buffers(len);
        }
        for pass in &self.passes {
            pass.resize_gl_object_buffers(len);
        }
        self.contexts.resize(len);
    }

    /// Releases GPU objects and invalidates the affected validity slots.
    ///
    /// `None` broadcasts to every context.
    pub fn release_gl_objects(&self, context: Option<&GraphicsContext>) {
        let context_id = context.map(|c| c.context_id());
        if let Some(state) = &self.shadowing_state {
            state.release_gl_objects(context_id);
        }
        for pass in &self.passes {
            pass.release_gl_objects(context_id);
        }
        match context_id {
            Some(id) => self.contexts.reset(id),
            None => self.contexts.reset_all(),
        }
    }

    /// Batches up to `MAX_DRAWABLES_PER_BATCH` (128) drawables through every
    /// pass of the technique.
    ///
    /// First computes each drawable's eye-space depth (custom cull test,
    /// frustum cull, or a failed near/far update exclude a drawable; an
    /// absent or invalid bound pins it at depth zero; NaN depths are
    /// excluded). Then, per pass, pushes the pass state and submits every
    /// non-excluded drawable with its depth. Returns the exclusive end of
    /// the processed prefix so the caller can advance and repeat.
    pub fn process_drawables(
        &self,
        drawables: &[&dyn crate::cull::Drawable],
        cull: &mut crate::cull::CullContext,
        culling_active: bool,
    ) -> usize {
        let mut depths = [EXCLUDED_DEPTH; MAX_DRAWABLES_PER_BATCH];
        let end = drawables.len().min(MAX_DRAWABLES_PER_BATCH);
        let compute_near_far = cull.compute_near_far();
        for (index, drawable) in drawables[..end].iter().enumerate() {
            let bound = drawable.bound().filter(|bb| bb.valid());
            if drawable.cull(cull)
                || (culling_active && bound.as_ref().is_some_and(|bb| cull.is_culled(bb)))
            {
                continue;
            }
            if compute_near_far {
                if let Some(bb) = &bound {
                    if !cull.update_calculated_near_far(bb) {
                        continue;
                    }
                }
            }
            let depth = bound.map_or(0.0, |bb| cull.eye_depth(bb.center()));
            depths[index] = if depth.is_nan() { EXCLUDED_DEPTH } else { depth };
        }
        for pass in &self.passes {
            cull.push_state(Arc::clone(pass));
            for (index, depth) in depths[..end].iter().enumerate() {
                if *depth != EXCLUDED_DEPTH {
                    cull.add_drawable_and_depth(index, *depth);
                }
            }
            cull.pop_state();
        }
        end
    }
}

impl Clone for Technique {
    /// Deep-copies the passes, shares the shadowing state and the predicate,
    /// and snapshots the current validity cache.
    fn clone(&self) -> Self {
        Self {
            passes: self
                .passes
                .iter()
                .map(|pass| Arc::new(Pass::clone(pass)))
                .collect(),
            shadowing_state: self.shadowing_state.clone(),
            valid_expression: self.valid_expression.clone(),
            binding_layout: self.binding_layout.clone(),
            context_id_slot: self.context_id_slot,
            always_valid: self.always_valid,
            contexts: self.contexts.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cull::{CullContext, Drawable};
    use glint_core::context::GlCapabilities;
    use glint_core::math::{Aabb, Mat4, Vec3};
    use std::collections::HashSet;

    struct FakeCaps {
        version: f32,
        extensions: HashSet<String>,
    }

    impl FakeCaps {
        fn new(version: f32, extensions: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                version,
                extensions: extensions.iter().map(|s| s.to_string()).collect(),
            })
        }
    }

    impl GlCapabilities for FakeCaps {
        fn gl_version(&self, _context: ContextId) -> f32 {
            self.version
        }

        fn is_extension_supported(&self, _context: ContextId, extension: &str) -> bool {
            self.extensions.contains(extension)
        }
    }

    /// Drives an inline (threadless) context to a terminal status.
    fn resolve(technique: &Arc<Technique>, context: &GraphicsContext) -> ValidityStatus {
        let first = technique.valid(context);
        if first == ValidityStatus::QueryInProgress {
            technique.valid(context)
        } else {
            first
        }
    }

    fn technique_with_pred(min_version: f32, extensions: &[&str]) -> Arc<Technique> {
        let mut technique = Technique::new(false);
        let extensions: Vec<String> = extensions.iter().map(|s| s.to_string()).collect();
        technique.set_gl_extensions_pred(min_version, &extensions);
        Arc::new(technique)
    }

    #[test]
    fn test_always_valid_skips_cache() {
        let technique = Arc::new(Technique::new(true));
        let context = GraphicsContext::new(0, FakeCaps::new(0.0, &[]));
        assert_eq!(technique.valid(&context), ValidityStatus::Valid);
        assert_eq!(technique.get_valid_status(5), ValidityStatus::Valid);
    }

    #[test]
    fn test_winner_gets_query_in_progress() {
        let technique = technique_with_pred(2.0, &[]);
        let context = GraphicsContext::new(0, FakeCaps::new(3.0, &[]));
        // The swap winner is told the query is pending, even though the
        // threadless context resolved it inline.
        assert_eq!(technique.valid(&context), ValidityStatus::QueryInProgress);
        assert_eq!(technique.valid(&context), ValidityStatus::Valid);
    }

    #[test]
    fn test_version_satisfies_or_branch() {
        let technique = technique_with_pred(5.0, &["GL_X"]);
        let context = GraphicsContext::new(0, FakeCaps::new(6.0, &[]));
        assert_eq!(resolve(&technique, &context), ValidityStatus::Valid);
    }

    #[test]
    fn test_extension_satisfies_or_branch() {
        let technique = technique_with_pred(5.0, &["GL_X"]);
        let context = GraphicsContext::new(0, FakeCaps::new(4.0, &["GL_X"]));
        assert_eq!(resolve(&technique, &context), ValidityStatus::Valid);
    }

    #[test]
    fn test_neither_branch_is_invalid() {
        let technique = technique_with_pred(5.0, &["GL_X"]);
        let context = GraphicsContext::new(0, FakeCaps::new(4.0, &[]));
        assert_eq!(resolve(&technique, &context), ValidityStatus::Invalid);
    }

    #[test]
    fn test_version_only_boundary() {
        let technique = technique_with_pred(5.0, &[]);
        let at = GraphicsContext::new(0, FakeCaps::new(5.0, &[]));
        assert_eq!(resolve(&technique, &at), ValidityStatus::Valid);

        let technique = technique_with_pred(5.0, &[]);
        let below = GraphicsContext::new(0, FakeCaps::new(4.9, &[]));
        assert_eq!(resolve(&technique, &below), ValidityStatus::Invalid);
    }

    #[test]
    fn test_no_predicate_resolves_invalid() {
        let technique = Arc::new(Technique::new(false));
        let context = GraphicsContext::new(0, FakeCaps::new(9.0, &[]));
        assert_eq!(resolve(&technique, &context), ValidityStatus::Invalid);
    }

    #[test]
    fn test_refresh_validity_forces_requery() {
        let technique = technique_with_pred(2.0, &[]);
        let context = GraphicsContext::new(0, FakeCaps::new(3.0, &[]));
        assert_eq!(resolve(&technique, &context), ValidityStatus::Valid);
        technique.refresh_validity();
        assert_eq!(technique.get_valid_status(0), ValidityStatus::Unknown);
        assert_eq!(technique.valid(&context), ValidityStatus::QueryInProgress);
    }

    #[test]
    fn test_release_gl_objects_broadcast() {
        let mut technique = Technique::new(false);
        technique.set_gl_extensions_pred(2.0, &[]);
        let mut pass = Pass::default();
        pass.state_mut().set_attribute("blend", "add");
        pass.state().set_gl_object(0, 42);
        technique.add_pass(pass);
        let technique = Arc::new(technique);

        let c0 = GraphicsContext::new(0, FakeCaps::new(3.0, &[]));
        let c1 = GraphicsContext::new(1, FakeCaps::new(3.0, &[]));
        assert_eq!(resolve(&technique, &c0), ValidityStatus::Valid);
        assert_eq!(resolve(&technique, &c1), ValidityStatus::Valid);

        technique.release_gl_objects(Some(&c1));
        assert_eq!(technique.get_valid_status(0), ValidityStatus::Valid);
        assert_eq!(technique.get_valid_status(1), ValidityStatus::Unknown);

        technique.release_gl_objects(None);
        assert_eq!(technique.get_valid_status(0), ValidityStatus::Unknown);
        assert_eq!(technique.passes()[0].state().gl_object(0), None);
    }

    #[test]
    fn test_clone_deep_copies_passes() {
        let mut technique = Technique::new(false);
        let mut pass = Pass::default();
        pass.state_mut().set_attribute("blend", "add");
        technique.add_pass(pass);
        let copy = technique.clone();
        assert_eq!(copy.passes().len(), 1);
        assert!(!Arc::ptr_eq(&technique.passes()[0], &copy.passes()[0]));
        assert_eq!(copy.passes()[0].state().attribute("blend"), Some("add"));
    }

    // --- process_drawables ---

    struct TestDrawable {
        bound: Option<Aabb>,
        culled: bool,
    }

    impl Drawable for TestDrawable {
        fn bound(&self) -> Option<Aabb> {
            self.bound
        }

        fn cull(&self, _cull: &CullContext) -> bool {
            self.culled
        }
    }

    fn box_at(z: f32) -> Aabb {
        Aabb::new(Vec3::new(-0.5, -0.5, z - 0.5), Vec3::new(0.5, 0.5, z + 0.5))
    }

    fn two_pass_technique() -> Technique {
        let mut technique = Technique::new(true);
        technique.add_pass(Pass::default());
        technique.add_pass(Pass::default());
        technique
    }

    #[test]
    fn test_process_drawables_depths_and_exclusion() {
        let technique = two_pass_technique();
        let visible = TestDrawable {
            bound: Some(box_at(-5.0)),
            culled: false,
        };
        let unbounded = TestDrawable {
            bound: None,
            culled: false,
        };
        let rejected = TestDrawable {
            bound: Some(box_at(-2.0)),
            culled: true,
        };
        let drawables: Vec<&dyn Drawable> = vec![&visible, &unbounded, &rejected];
        let mut cull = CullContext::new(Mat4::IDENTITY);

        let end = technique.process_drawables(&drawables, &mut cull, true);
        assert_eq!(end, 3);
        // Two passes, two non-excluded drawables each.
        assert_eq!(cull.render_bin().len(), 4);
        let depths: Vec<(usize, f32)> = cull
            .render_bin()
            .iter()
            .map(|leaf| (leaf.drawable, leaf.depth))
            .collect();
        assert_eq!(depths[0], (0, 5.0));
        // Invalid/absent bound sits at depth zero but is still submitted.
        assert_eq!(depths[1], (1, 0.0));
        assert!(depths.iter().all(|(drawable, _)| *drawable != 2));
    }

    #[test]
    fn test_process_drawables_frustum_cull() {
        let technique = two_pass_technique();
        let behind = TestDrawable {
            bound: Some(box_at(5.0)),
            culled: false,
        };
        let drawables: Vec<&dyn Drawable> = vec![&behind];
        let mut cull = CullContext::new(Mat4::IDENTITY);
        cull.set_compute_near_far(false);
        technique.process_drawables(&drawables, &mut cull, true);
        assert!(cull.render_bin().is_empty());

        // With culling inactive and no near/far tracking, it is submitted.
        let mut cull = CullContext::new(Mat4::IDENTITY);
        cull.set_compute_near_far(false);
        technique.process_drawables(&drawables, &mut cull, false);
        assert_eq!(cull.render_bin().len(), 2);
    }

    #[test]
    fn test_process_drawables_nan_depth_excluded() {
        let technique = two_pass_technique();
        let item = TestDrawable {
            bound: Some(box_at(-3.0)),
            culled: false,
        };
        let drawables: Vec<&dyn Drawable> = vec![&item];
        // A degenerate model-view matrix makes the eye depth NaN.
        let mut cull = CullContext::new(Mat4::from_translation(Vec3::new(0.0, 0.0, f32::NAN)));
        cull.set_compute_near_far(false);
        let end = technique.process_drawables(&drawables, &mut cull, false);
        assert_eq!(end, 1);
        assert!(cull.render_bin().is_empty());
    }

    #[test]
    fn test_process_drawables_bounded_batch() {
        let technique = two_pass_technique();
        let item = TestDrawable {
            bound: Some(box_at(-3.0)),
            culled: false,
        };
        let drawables: Vec<&dyn Drawable> = (0..200).map(|_| &item as &dyn Drawable).collect();
        let mut cull = CullContext::new(Mat4::IDENTITY);
        let end = technique.process_drawables(&drawables, &mut cull, false);
        assert_eq!(end, 128);
        assert_eq!(cull.render_bin().len(), 128 * 2);
    }
}
