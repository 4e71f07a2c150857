//! Field mapping synthesizer.
//!
//! Walks a (source, target) struct pair field by field, classifies each
//! same-named pair and writes the Go statements for it. Nested struct pairs go
//! through the helper registry, which may recurse back in here to build the
//! helper's own body.
pub mod classify;
pub mod registry;

use serde::Serialize;

use crate::emit::GoWriter;
use crate::shape::{MethodShape, ShapeId, ShapeTable};
use classify::{ConversionPlan, Element, Scalar, SliceElement, classify};
use registry::{HelperRegistry, Reservation};

const SOURCE: &str = "objSource";
const TARGET: &str = "objTarget";

/// A field pair no rule could map; marked TODO in the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedField {
    pub function: String,
    pub field: String,
    pub source: String,
    pub target: String,
}

/// Per-run state. Never shared between runs.
pub struct GenerationContext<'a> {
    pub table: &'a ShapeTable,
    pub local_package: &'a str,
    pub receiver: &'a str,
    /// Packages left out of the import block.
    pub import_denylist: &'a [String],
    pub registry: HelperRegistry,
    pub unresolved: Vec<UnresolvedField>,
}

impl<'a> GenerationContext<'a> {
    pub fn new(table: &'a ShapeTable, local_package: &'a str, receiver: &'a str) -> Self {
        Self {
            table,
            local_package,
            receiver,
            import_denylist: &[],
            registry: HelperRegistry::new(),
            unresolved: Vec::new(),
        }
    }

    pub fn with_import_denylist(mut self, denylist: &'a [String]) -> Self {
        self.import_denylist = denylist;
        self
    }

    fn is_denied(&self, id: ShapeId) -> bool {
        self.table
            .package_of(id)
            .is_some_and(|p| self.import_denylist.iter().any(|d| d == p))
    }

    fn ty(&self, id: ShapeId) -> String {
        self.table.type_expr(id, self.local_package)
    }

    /// Name of the helper converting `source` to `target`, synthesizing it on
    /// first request. Both ids must be structs.
    pub fn request_helper(&mut self, source: ShapeId, target: ShapeId) -> String {
        let table = self.table;
        let (Some(s), Some(t)) = (table.as_struct(source), table.as_struct(target)) else {
            unreachable!("helpers are only requested for struct pairs");
        };
        match self.registry.reserve(s, t) {
            Reservation::Existing(name) => name,
            Reservation::New { name, slot } => {
                tracing::debug!(helper = %name, source = %s.name, target = %t.name, "registered helper");
                let body = self.helper_function(&name, source, target);
                self.registry.fill(slot, body);
                name
            }
        }
    }

    fn signature(&self, name: &str, source: ShapeId, target: ShapeId) -> String {
        format!(
            "func (impl *{}) {name}({SOURCE} {}) {} {{",
            self.receiver,
            self.ty(source),
            self.ty(target)
        )
    }

    fn helper_function(&mut self, name: &str, source: ShapeId, target: ShapeId) -> String {
        let mut w = GoWriter::new();
        w.open(self.signature(name, source, target));
        self.struct_body(&mut w, name, source, target);
        w.close("}");
        w.into_string()
    }

    /// Entry function for one interface method. Arity is checked by the caller.
    pub fn entry_function(&mut self, method: &MethodShape) -> String {
        let (source, target) = (method.params[0], method.results[0]);
        let mut w = GoWriter::new();
        w.open(self.signature(&method.name, source, target));
        if self.table.is_struct(source) && self.table.is_struct(target) {
            self.struct_body(&mut w, &method.name, source, target);
        } else {
            // pointer / slice wrapped parameters convert as one value
            w.line(format!("var {TARGET} {}", self.ty(target)));
            self.convert(&mut w, &method.name, "Target", source, target, SOURCE, TARGET);
            w.line(format!("return {TARGET}"));
        }
        w.close("}");
        w.into_string()
    }

    /// Zero target, one conversion per same-named field, return.
    fn struct_body(&mut self, w: &mut GoWriter, function: &str, source: ShapeId, target: ShapeId) {
        let table = self.table;
        let (Some(s), Some(t)) = (table.as_struct(source), table.as_struct(target)) else {
            return;
        };
        w.line(format!("{TARGET} := {}{{}}", self.ty(target)));
        for sf in &s.fields {
            // exact, case-sensitive name match; unmatched fields on either side are skipped
            let Some(tf) = t.fields.iter().find(|tf| tf.name == sf.name) else {
                continue;
            };
            let src = format!("{SOURCE}.{}", sf.name);
            let dst = format!("{TARGET}.{}", tf.name);
            self.convert(w, function, &sf.name, sf.shape, tf.shape, &src, &dst);
        }
        w.line(format!("return {TARGET}"));
    }

    #[allow(clippy::too_many_arguments)]
    fn convert(
        &mut self,
        w: &mut GoWriter,
        function: &str,
        label: &str,
        source: ShapeId,
        target: ShapeId,
        src: &str,
        dst: &str,
    ) {
        match classify(self.table, source, target) {
            ConversionPlan::Direct => w.line(format!("{dst} = {src}")),
            ConversionPlan::Cast { target } => w.line(format!("{dst} = {}({src})", self.ty(target))),
            ConversionPlan::StructToStruct { source, target } => {
                let helper = self.request_helper(source, target);
                w.line(format!("{dst} = impl.{helper}({src})"));
            }
            ConversionPlan::PointerToPointer(element) => {
                let value = self.element_expr(element, &format!("*{src}"));
                let tmp = format!("mapped{label}");
                w.open(format!("if {src} != nil {{"));
                w.line(format!("{tmp} := {value}"));
                w.line(format!("{dst} = &{tmp}"));
                w.reopen("} else {");
                w.line(format!("{dst} = nil"));
                w.close("}");
            }
            ConversionPlan::ValueToPointer(element) => {
                let value = self.element_expr(element, src);
                let tmp = format!("mapped{label}");
                w.line(format!("{tmp} := {value}"));
                w.line(format!("{dst} = &{tmp}"));
            }
            ConversionPlan::PointerToValue(element) => {
                let value = self.element_expr(element, &format!("*{src}"));
                w.open(format!("if {src} != nil {{"));
                w.line(format!("{dst} = {value}"));
                if self.is_denied(target) {
                    // dst is already zero and its type's package is not imported
                    w.close("}");
                } else {
                    w.reopen("} else {");
                    w.line(format!("var zeroValue {}", self.ty(target)));
                    w.line(format!("{dst} = zeroValue"));
                    w.close("}");
                }
            }
            ConversionPlan::SliceToSlice(element) => self.convert_slice(w, element, target, src, dst),
            ConversionPlan::Unresolved => {
                let (source_ty, target_ty) = (self.ty(source), self.ty(target));
                tracing::warn!(function, field = label, source = %source_ty, target = %target_ty, "unresolved field mapping");
                w.line(format!("// TODO: map {label} manually ({source_ty} -> {target_ty})"));
                self.unresolved.push(UnresolvedField {
                    function: function.to_owned(),
                    field: label.to_owned(),
                    source: source_ty,
                    target: target_ty,
                });
            }
        }
    }

    /// Length-guarded, element-wise copy. Nil source elements leave the
    /// target element at its zero value.
    fn convert_slice(&mut self, w: &mut GoWriter, element: SliceElement, target: ShapeId, src: &str, dst: &str) {
        let value = if element.source_ptr { "*v" } else { "v" };
        let value = self.element_expr(element.convert, value);
        w.open(format!("if len({src}) > 0 {{"));
        w.line(format!("{dst} = make({}, len({src}))", self.ty(target)));
        w.open(format!("for i, v := range {src} {{"));
        if element.source_ptr {
            w.open("if v != nil {");
        }
        if element.target_ptr {
            w.line(format!("mapped := {value}"));
            w.line(format!("{dst}[i] = &mapped"));
        } else {
            w.line(format!("{dst}[i] = {value}"));
        }
        if element.source_ptr {
            w.close("}");
        }
        w.close("}");
        w.close("}");
    }

    /// Expression converting the value `expr` per `element`. Registers the
    /// helper before the returned text references it.
    fn element_expr(&mut self, element: Element, expr: &str) -> String {
        match element {
            Element::Struct { source, target } => {
                let helper = self.request_helper(source, target);
                format!("impl.{helper}({expr})")
            }
            Element::Scalar(Scalar::Copy) => expr.to_owned(),
            Element::Scalar(Scalar::Cast(target)) => format!("{}({expr})", self.ty(target)),
        }
    }
}
