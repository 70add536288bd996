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

//! A minimal scene-graph node model.
//!
//! Animations operate on a small subset of the host toolkit's node types:
//! groups (which carry children) and effect geodes (drawable leaves that can
//! have an [`Effect`] assigned). Every node carries a traversal mask word;
//! traversals visit a node only when their own mask intersects it.

use crate::model::Effect;
use std::sync::Arc;

/// Traversal mask bits.
pub mod mask {
    /// Terrain geometry.
    pub const TERRAIN_BIT: u32 = 1 << 0;
    /// The main model of a scene entity.
    pub const MAIN_MODEL_BIT: u32 = 1 << 1;
    /// Geometry that casts shadows.
    pub const CAST_SHADOW_BIT: u32 = 1 << 2;
    /// Geometry that receives shadows.
    pub const RECEIVE_SHADOW_BIT: u32 = 1 << 3;
    /// Light-emitting model effects.
    pub const MODEL_LIGHT_BIT: u32 = 1 << 4;
    /// Geometry eligible for picking.
    pub const PICK_BIT: u32 = 1 << 5;
}

/// What a node is, beyond its mask.
#[derive(Debug, Clone, Default)]
pub enum NodeKind {
    /// An interior node carrying children.
    #[default]
    Group,
    /// A drawable leaf that can carry an effect.
    EffectGeode {
        /// The effect assigned to the geode, if any.
        effect: Option<Arc<Effect>>,
    },
}

/// One node of the scene graph.
#[derive(Debug, Clone)]
pub struct Node {
    mask: u32,
    kind: NodeKind,
    children: Vec<Node>,
}

impl Node {
    /// Creates a group node visible to all traversals.
    pub fn group() -> Self {
        Self {
            mask: u32::MAX,
            kind: NodeKind::Group,
            children: Vec::new(),
        }
    }

    /// Creates an effect geode with no effect assigned.
    pub fn effect_geode() -> Self {
        Self {
            mask: u32::MAX,
            kind: NodeKind::EffectGeode { effect: None },
            children: Vec::new(),
        }
    }

    /// Returns the traversal mask.
    pub fn node_mask(&self) -> u32 {
        self.mask
    }

    /// Replaces the traversal mask.
    pub fn set_node_mask(&mut self, mask: u32) {
        self.mask = mask;
    }

    /// Returns `true` for effect geodes.
    pub fn is_effect_geode(&self) -> bool {
        matches!(self.kind, NodeKind::EffectGeode { .. })
    }

    /// Appends a child and returns a mutable reference to it.
    pub fn add_child(&mut self, child: Node) -> &mut Node {
        self.children.push(child);
        let index = self.children.len() - 1;
        &mut self.children[index]
    }

    /// Returns the node's children.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Returns the node's children mutably.
    pub fn children_mut(&mut self) -> &mut [Node] {
        &mut self.children
    }

    /// Assigns an effect when the node is an effect geode.
    ///
    /// Returns `true` when the effect was taken.
    pub fn set_effect(&mut self, effect: Arc<Effect>) -> bool {
        match &mut self.kind {
            NodeKind::EffectGeode { effect: slot } => {
                *slot = Some(effect);
                true
            }
            NodeKind::Group => false,
        }
    }

    /// Returns the assigned effect, if the node is a geode carrying one.
    pub fn effect(&self) -> Option<&Arc<Effect>> {
        match &self.kind {
            NodeKind::EffectGeode { effect } => effect.as_ref(),
            NodeKind::Group => None,
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::group()
    }
}
