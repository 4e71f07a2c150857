use std::collections::{BTreeSet, HashSet};

use crate::shape::{InterfaceDescriptor, ShapeId, ShapeTable, TypeShape};

/// Packages never imported even when reachable. `time` is typically only
/// reached through copied fields and never named in generated code.
pub const DEFAULT_IMPORT_DENYLIST: &[&str] = &["time"];

/// Every package reachable from the interface's parameter and result shapes,
/// minus the interface's own package and the denylist. Sorted.
pub fn collect_imports(table: &ShapeTable, iface: &InterfaceDescriptor, denylist: &[String]) -> BTreeSet<String> {
    let mut seen = HashSet::new();
    let mut out = BTreeSet::new();
    for method in &iface.methods {
        for id in method.params.iter().chain(&method.results) {
            walk(table, *id, &mut seen, &mut out);
        }
    }
    out.retain(|pkg| pkg != &iface.package && !denylist.iter().any(|d| d == pkg));
    out
}

fn walk(table: &ShapeTable, id: ShapeId, seen: &mut HashSet<ShapeId>, out: &mut BTreeSet<String>) {
    // visited set: struct graphs may be cyclic
    if !seen.insert(id) {
        return;
    }
    match table.get(id) {
        TypeShape::Primitive { package, .. } => {
            if let Some(p) = package {
                out.insert(p.clone());
            }
        }
        TypeShape::Pointer(inner) | TypeShape::Slice(inner) => walk(table, *inner, seen, out),
        TypeShape::Struct(s) => {
            out.insert(s.package.clone());
            for f in &s.fields {
                walk(table, f.shape, seen, out);
            }
        }
    }
}
