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

//! Light animation nodes.
//!
//! A [`LightAnimation`] reads a light description out of a model's
//! configuration, wraps the animated subtree in a group carrying the model
//! light mask bit, and installs a spot or point light [`Effect`] on every
//! effect geode below it. Effects are deduplicated through the shared
//! [`EffectCache`] keyed by model path and animation index.

use glint_core::math::{LinearRgba, Vec3, Vec4};
use serde::Deserialize;
use std::sync::Arc;

use crate::model::{Effect, EffectCache, LightParameters};
use crate::node::{mask, Node};

/// A small direction still counts as "no direction" for normalization.
const DIRECTION_EPSILON: f32 = 1e-3;

/// Errors produced while building a light animation.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The animation configuration could not be deserialized.
    #[error("invalid light animation config: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

/// A color component triple with alpha, all defaulting to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct ColorConfig {
    /// Red component.
    #[serde(default)]
    pub r: f32,
    /// Green component.
    #[serde(default)]
    pub g: f32,
    /// Blue component.
    #[serde(default)]
    pub b: f32,
    /// Alpha component.
    #[serde(default)]
    pub a: f32,
}

impl From<ColorConfig> for LinearRgba {
    fn from(c: ColorConfig) -> Self {
        LinearRgba::new(c.r, c.g, c.b, c.a)
    }
}

/// A vector component triple, all defaulting to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct VectorConfig {
    /// X component.
    #[serde(default)]
    pub x: f32,
    /// Y component.
    #[serde(default)]
    pub y: f32,
    /// Z component.
    #[serde(default)]
    pub z: f32,
}

impl From<VectorConfig> for Vec3 {
    fn from(v: VectorConfig) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

/// Attenuation coefficients, all defaulting to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct AttenuationConfig {
    /// Constant coefficient.
    #[serde(default)]
    pub c: f32,
    /// Linear coefficient.
    #[serde(default)]
    pub l: f32,
    /// Quadratic coefficient.
    #[serde(default)]
    pub q: f32,
}

impl From<AttenuationConfig> for Vec3 {
    fn from(a: AttenuationConfig) -> Self {
        Vec3::new(a.c, a.l, a.q)
    }
}

/// The light description read from a model's animation configuration.
///
/// Every field defaults to zero (or the zero vector) when absent, so a
/// partial configuration still produces a usable light.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LightConfig {
    /// `"spot"` or `"point"`. Any other value installs nothing.
    #[serde(default)]
    pub light_type: String,
    /// Light position in model space.
    #[serde(default)]
    pub position: VectorConfig,
    /// Spot direction; normalized when long enough to carry one.
    #[serde(default)]
    pub direction: VectorConfig,
    /// Ambient color contribution.
    #[serde(default)]
    pub ambient: ColorConfig,
    /// Diffuse color contribution.
    #[serde(default)]
    pub diffuse: ColorConfig,
    /// Specular color contribution.
    #[serde(default)]
    pub specular: ColorConfig,
    /// Attenuation coefficients.
    #[serde(default)]
    pub attenuation: AttenuationConfig,
    /// Spot exponent.
    #[serde(default)]
    pub exponent: f32,
    /// Spot cutoff angle in degrees.
    #[serde(default)]
    pub cutoff: f32,
    /// Near fade distance in meters.
    #[serde(default, rename = "near-m")]
    pub near: f32,
    /// Far fade distance in meters.
    #[serde(default, rename = "far-m")]
    pub far: f32,
}

/// Instantiates light effects for one animation entry of a model.
#[derive(Debug, Clone)]
pub struct LightAnimation {
    config: LightConfig,
    direction: Vec3,
    key: String,
}

impl LightAnimation {
    /// Builds a light animation from its configuration.
    ///
    /// `path` is the model file the animation belongs to and `index` its
    /// position among the model's animations; together they form the cache
    /// key shared by every reference to the same model.
    pub fn new(config: LightConfig, path: &str, index: usize) -> Self {
        let mut direction = Vec3::from(config.direction);
        if direction.length() > DIRECTION_EPSILON {
            direction = direction.normalize();
        }
        let key = format!("{path};{index}");
        Self {
            config,
            direction,
            key,
        }
    }

    /// Parses the configuration out of a property tree value.
    pub fn from_value(
        value: &serde_json::Value,
        path: &str,
        index: usize,
    ) -> Result<Self, ModelError> {
        let config: LightConfig = serde_json::from_value(value.clone())?;
        Ok(Self::new(config, path, index))
    }

    /// Returns the effect cache key for this animation.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the normalized spot direction.
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Appends a group carrying the model light bit under `parent` and
    /// returns it; the animated subtree goes inside.
    pub fn create_animation_group<'a>(&self, parent: &'a mut Node) -> &'a mut Node {
        let mut group = Node::group();
        group.set_node_mask(mask::MODEL_LIGHT_BIT | group.node_mask());
        parent.add_child(group)
    }

    /// Installs the light effect on `node` and every effect geode below it,
    /// and marks the node for the model-light traversal.
    ///
    /// Unknown light types install nothing.
    pub fn install(&self, node: &mut Node, cache: &mut EffectCache) {
        let effect = match self.config.light_type.as_str() {
            "spot" => cache.get_or_insert_with(&self.key, || self.spot_effect()),
            "point" => cache.get_or_insert_with(&self.key, || self.point_effect()),
            other => {
                log::warn!("unknown light type '{other}', no effect installed");
                return;
            }
        };
        node.set_node_mask(node.node_mask() | mask::MODEL_LIGHT_BIT);
        Self::set_effect_recursive(node, &effect);
    }

    fn set_effect_recursive(node: &mut Node, effect: &Arc<Effect>) {
        node.set_effect(Arc::clone(effect));
        for child in node.children_mut() {
            Self::set_effect_recursive(child, effect);
        }
    }

    fn base_parameters(&self) -> LightParameters {
        let position = Vec3::from(self.config.position);
        LightParameters {
            position: Vec4::from_vec3(position, 1.0),
            direction: None,
            ambient: self.config.ambient.into(),
            diffuse: self.config.diffuse.into(),
            specular: self.config.specular.into(),
            attenuation: self.config.attenuation.into(),
            exponent: None,
            cutoff: None,
            cos_cutoff: None,
            near: self.config.near,
            far: self.config.far,
        }
    }

    fn spot_effect(&self) -> Effect {
        let mut parameters = self.base_parameters();
        parameters.direction = Some(Vec4::from_vec3(self.direction, 0.0));
        parameters.exponent = Some(self.config.exponent);
        parameters.cutoff = Some(self.config.cutoff);
        parameters.cos_cutoff = Some(self.config.cutoff.to_radians().cos());
        Effect::with_parameters("Effects/light-spot", parameters)
    }

    fn point_effect(&self) -> Effect {
        Effect::with_parameters("Effects/light-point", self.base_parameters())
    }
}
