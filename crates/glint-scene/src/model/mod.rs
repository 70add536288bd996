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

//! Model-level animations and their shared resources.

mod effect;
mod light_animation;

pub use effect::{Effect, EffectCache, LightParameters};
pub use light_animation::{
    AttenuationConfig, ColorConfig, LightAnimation, LightConfig, ModelError, VectorConfig,
};
