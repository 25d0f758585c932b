//! Deterministic textual rendering of analysis results.
//!
//! Roots are sorted by (qualified type name, variant name), children by
//! (field index, variant name). Fields render as `Name (json_tag_name)`:
//! the json tag's name part, the field's own name when the tag is empty,
//! and nothing at all when the tag is `-`. Verbose mode additionally
//! lists the source position of every access point under each field.

use crate::direct_usage::StructDirectUsageMap;
use crate::full_usage::{
    StructFieldFullUsage, StructFieldFullUsageKey, StructFullUsageKey, StructFullUsages,
};
use usedtype_ir::{FieldDef, Program, position, tag_lookup};

pub struct Renderer<'a> {
    program: &'a Program,
    verbose: bool,
}

impl<'a> Renderer<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self {
            program,
            verbose: false,
        }
    }

    pub fn verbose(mut self, on: bool) -> Self {
        self.verbose = on;
        self
    }

    /// Serialize the full-usage trees. Lines use `\n` and carry no
    /// trailing whitespace; the result has no final newline.
    pub fn render(&self, usages: &StructFullUsages) -> String {
        let mut roots: Vec<&StructFullUsageKey> = usages.usages.keys().collect();
        roots.sort_by_key(|k| self.root_sort_key(k));

        let mut lines = Vec::new();
        for key in roots {
            let usage = &usages.usages[key];
            if usage.nested.is_empty() {
                continue;
            }
            lines.push(self.root_label(key));
            self.render_nested(&usage.nested, 1, &mut lines);
        }
        lines.join("\n")
    }

    /// Deterministic dump of the direct-usage map, used by debug logging
    /// and tests.
    pub fn render_direct_usage(&self, dm: &StructDirectUsageMap) -> String {
        let types = &self.program.types;
        let mut lines = Vec::new();
        for named in dm.sorted_types(types) {
            lines.push(types.qualified_name(named));
            let usage = dm.get(named).expect("sorted keys come from the map");
            for (field, points) in usage.sorted_fields() {
                let def = types.struct_def(named).expect("canonical struct");
                let f = &def.fields[field.index];
                lines.push(format!("  {} ({})", f.name, field_tag_name(f)));
                for p in points {
                    lines.push(format!("    {}", position::display_opt(p.pos.as_ref())));
                }
            }
        }
        lines.join("\n")
    }

    fn root_sort_key(&self, key: &StructFullUsageKey) -> (String, String) {
        let types = &self.program.types;
        (
            types.qualified_name(key.named),
            key.variant.map_or_else(String::new, |v| types.qualified_name(v)),
        )
    }

    fn root_label(&self, key: &StructFullUsageKey) -> String {
        let types = &self.program.types;
        match key.variant {
            Some(v) => format!(
                "{} [{}]",
                types.qualified_name(key.named),
                types.qualified_name(v)
            ),
            None => types.qualified_name(key.named),
        }
    }

    fn render_nested(
        &self,
        nested: &rustc_hash::FxHashMap<StructFieldFullUsageKey, StructFieldFullUsage>,
        depth: usize,
        lines: &mut Vec<String>,
    ) {
        let types = &self.program.types;
        let mut children: Vec<&StructFieldFullUsage> = nested.values().collect();
        children.sort_by_key(|c| {
            (
                c.key.field.index,
                c.key
                    .variant
                    .map_or_else(String::new, |v| types.qualified_name(v)),
            )
        });

        for child in children {
            let Some(label) = self.field_label(&child.key) else {
                // A json tag of "-" omits the field entirely.
                continue;
            };
            let indent = "    ".repeat(depth);
            lines.push(format!("{indent}{label}"));
            if self.verbose {
                let mut positions: Vec<_> = child
                    .points
                    .iter()
                    .map(|p| position::display_opt(p.pos.as_ref()))
                    .collect();
                positions.sort();
                for p in positions {
                    lines.push(format!("{indent}  {p}"));
                }
            }
            self.render_nested(&child.nested, depth + 1, lines);
        }
    }

    fn field_label(&self, key: &StructFieldFullUsageKey) -> Option<String> {
        let types = &self.program.types;
        let def = types.struct_def(key.field.named)?;
        let f = &def.fields[key.field.index];
        if tag_lookup(&f.tag, "json").as_deref() == Some("-") {
            return None;
        }
        let base = format!("{} ({})", f.name, field_tag_name(f));
        Some(match key.variant {
            Some(v) => format!("{} [{}]", base, types.qualified_name(v)),
            None => base,
        })
    }
}

/// The name a field renders under: the json tag's name part, falling
/// back to the field's own name when the tag (or its name part) is empty.
fn field_tag_name(f: &FieldDef) -> String {
    match tag_lookup(&f.tag, "json") {
        Some(tag) => {
            let name = tag.split(',').next().unwrap_or("");
            if name.is_empty() {
                f.name.clone()
            } else {
                name.to_string()
            }
        }
        None => f.name.clone(),
    }
}
