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

//! Write-only text serialization of techniques.
//!
//! External tooling persists technique parameters as line-oriented key/value
//! pairs, one per scene-object field, with nested objects wrapped in braces.
//! The matching reader lives in the host toolkit and is not part of this
//! crate.

use super::{StateSet, Technique};
use std::fmt::{self, Write};

/// Writes a technique's fields as line-oriented key/value pairs.
pub fn write_technique(technique: &Technique, out: &mut dyn Write) -> fmt::Result {
    let mut writer = IndentWriter::new(out);
    writer.line(&format!(
        "alwaysValid {}",
        if technique.always_valid() { "TRUE" } else { "FALSE" }
    ))?;
    if let Some(state) = technique.shadowing_state() {
        writer.line("shadowingStateSet")?;
        write_state_set(state, &mut writer)?;
    }
    writer.line(&format!("num_passes {}", technique.passes().len()))?;
    for pass in technique.passes() {
        writer.line("Pass {")?;
        writer.indented(|writer| write_attributes(pass.state(), writer))?;
        writer.line("}")?;
    }
    Ok(())
}

fn write_state_set(state: &StateSet, writer: &mut IndentWriter<'_>) -> fmt::Result {
    writer.line("StateSet {")?;
    writer.indented(|writer| {
        if let Some(name) = state.name() {
            writer.line(&format!("name \"{name}\""))?;
        }
        write_attributes(state, writer)
    })?;
    writer.line("}")
}

fn write_attributes(state: &StateSet, writer: &mut IndentWriter<'_>) -> fmt::Result {
    for (name, value) in state.attributes() {
        writer.line(&format!("attribute {name} {value}"))?;
    }
    Ok(())
}

/// Emits one line per call, indented by nesting depth.
struct IndentWriter<'a> {
    out: &'a mut dyn Write,
    depth: usize,
}

impl<'a> IndentWriter<'a> {
    fn new(out: &'a mut dyn Write) -> Self {
        Self { out, depth: 0 }
    }

    fn line(&mut self, content: &str) -> fmt::Result {
        for _ in 0..self.depth {
            self.out.write_str("  ")?;
        }
        self.out.write_str(content)?;
        self.out.write_char('\n')
    }

    fn indented(
        &mut self,
        body: impl FnOnce(&mut IndentWriter<'_>) -> fmt::Result,
    ) -> fmt::Result {
        self.depth += 1;
        let result = body(self);
        self.depth -= 1;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Pass;
    use std::sync::Arc;

    #[test]
    fn test_write_minimal_technique() {
        let technique = Technique::new(true);
        let mut out = String::new();
        write_technique(&technique, &mut out).unwrap();
        assert_eq!(out, "alwaysValid TRUE\nnum_passes 0\n");
    }

    #[test]
    fn test_write_full_technique() {
        let mut technique = Technique::new(false);
        let mut shadow = StateSet::with_name("shadow");
        shadow.set_attribute("depth-func", "lequal");
        technique.set_shadowing_state(Arc::new(shadow));
        let mut pass = Pass::default();
        pass.state_mut().set_attribute("blend", "add");
        technique.add_pass(pass);

        let mut out = String::new();
        write_technique(&technique, &mut out).unwrap();
        let expected = "alwaysValid FALSE\n\
                        shadowingStateSet\n\
                        StateSet {\n  name \"shadow\"\n  attribute depth-func lequal\n}\n\
                        num_passes 1\n\
                        Pass {\n  attribute blend add\n}\n";
        assert_eq!(out, expected);
    }
}
