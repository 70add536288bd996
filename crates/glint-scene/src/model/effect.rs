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

//! Light effects and the effect cache.
//!
//! An [`Effect`] is the parameter tree a light animation hands to the host's
//! effect system: the base effect it inherits from plus the concrete light
//! parameters. Identical light configurations across multiple model
//! references share one effect through an [`EffectCache`], which is owned by
//! the scene loader and passed down to each animation's `install` — entries
//! are created on first use and never evicted.

use ahash::AHashMap;
use glint_core::math::{LinearRgba, Vec3, Vec4};
use serde::Serialize;
use std::sync::Arc;

/// Concrete light parameters for an effect.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct LightParameters {
    /// The light position in model space (`w == 1`).
    pub position: Vec4,
    /// The spot direction (`w == 0`); absent for point lights.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Vec4>,
    /// The ambient color contribution.
    pub ambient: LinearRgba,
    /// The diffuse color contribution.
    pub diffuse: LinearRgba,
    /// The specular color contribution.
    pub specular: LinearRgba,
    /// Constant, linear, and quadratic attenuation coefficients.
    pub attenuation: Vec3,
    /// Spot exponent; absent for point lights.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exponent: Option<f32>,
    /// Spot cutoff angle in degrees; absent for point lights.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cutoff: Option<f32>,
    /// Cosine of the cutoff angle; absent for point lights.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cos_cutoff: Option<f32>,
    /// Near fade distance in meters.
    pub near: f32,
    /// Far fade distance in meters.
    pub far: f32,
}

/// The effect a light animation assigns to its geodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Effect {
    /// The base effect this one inherits from (e.g. `Effects/light-spot`).
    pub inherits_from: String,
    /// The concrete light parameters, when the effect carries any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<LightParameters>,
}

impl Effect {
    /// Creates an effect that inherits from a base effect, with no
    /// parameters yet.
    pub fn inheriting(base: impl Into<String>) -> Self {
        Self {
            inherits_from: base.into(),
            parameters: None,
        }
    }

    /// Creates an effect with concrete light parameters.
    pub fn with_parameters(base: impl Into<String>, parameters: LightParameters) -> Self {
        Self {
            inherits_from: base.into(),
            parameters: Some(parameters),
        }
    }
}

/// Shares identical light effects across model references.
///
/// Keyed by the composite `"<model path>;<instance index>"` key. Owned by
/// whoever loads models and passed down to each animation.
#[derive(Debug, Default)]
pub struct EffectCache {
    entries: AHashMap<String, Arc<Effect>>,
}

impl EffectCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached effect for `key`, building and inserting it on
    /// first use.
    pub fn get_or_insert_with(
        &mut self,
        key: &str,
        build: impl FnOnce() -> Effect,
    ) -> Arc<Effect> {
        if let Some(effect) = self.entries.get(key) {
            return Arc::clone(effect);
        }
        log::debug!("building light effect for '{key}'");
        let effect = Arc::new(build());
        self.entries.insert(key.to_owned(), Arc::clone(&effect));
        effect
    }

    /// Returns the number of cached effects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns whether an effect is cached under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}
