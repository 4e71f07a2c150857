//! Shape pair → conversion category. Pure; first matching rule wins.
use crate::shape::{ShapeId, ShapeTable, TypeShape};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionPlan {
    /// Identical shapes.
    Direct,
    /// Distinct primitives over the same basic type: `T(x)`.
    Cast { target: ShapeId },
    PointerToPointer(Element),
    ValueToPointer(Element),
    PointerToValue(Element),
    SliceToSlice(SliceElement),
    StructToStruct { source: ShapeId, target: ShapeId },
    /// Left for manual completion.
    Unresolved,
}

/// Conversion of the values behind pointers / inside slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Struct { source: ShapeId, target: ShapeId },
    Scalar(Scalar),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    Copy,
    Cast(ShapeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceElement {
    pub source_ptr: bool,
    pub target_ptr: bool,
    pub convert: Element,
}

pub fn classify(table: &ShapeTable, source: ShapeId, target: ShapeId) -> ConversionPlan {
    use TypeShape::*;

    if source == target {
        return ConversionPlan::Direct;
    }
    let plan = match (table.get(source), table.get(target)) {
        (Primitive { .. }, Primitive { .. }) => scalar(table, source, target).map(|s| match s {
            Scalar::Copy => ConversionPlan::Direct,
            Scalar::Cast(t) => ConversionPlan::Cast { target: t },
        }),
        // pointer arms come before the struct arm so `*S` never reads as a scalar
        (Pointer(a), Pointer(b)) => element(table, *a, *b).map(ConversionPlan::PointerToPointer),
        (_, Pointer(b)) => element(table, source, *b).map(ConversionPlan::ValueToPointer),
        (Pointer(a), _) => element(table, *a, target).map(ConversionPlan::PointerToValue),
        (Slice(a), Slice(b)) => slice_element(table, *a, *b).map(ConversionPlan::SliceToSlice),
        (Struct(_), Struct(_)) => Some(ConversionPlan::StructToStruct { source, target }),
        _ => None,
    };
    plan.unwrap_or(ConversionPlan::Unresolved)
}

fn element(table: &ShapeTable, source: ShapeId, target: ShapeId) -> Option<Element> {
    if let Some(s) = scalar(table, source, target) {
        return Some(Element::Scalar(s));
    }
    if table.is_struct(source) && table.is_struct(target) {
        return Some(Element::Struct { source, target });
    }
    None
}

fn scalar(table: &ShapeTable, source: ShapeId, target: ShapeId) -> Option<Scalar> {
    if source == target {
        return Some(Scalar::Copy);
    }
    match (table.get(source), table.get(target)) {
        (
            TypeShape::Primitive { underlying: Some(a), .. },
            TypeShape::Primitive { underlying: Some(b), .. },
        ) if a == b => Some(Scalar::Cast(target)),
        _ => None,
    }
}

fn slice_element(table: &ShapeTable, source: ShapeId, target: ShapeId) -> Option<SliceElement> {
    let (source, source_ptr) = unwrap_pointer(table, source);
    let (target, target_ptr) = unwrap_pointer(table, target);
    let convert = element(table, source, target)?;
    Some(SliceElement { source_ptr, target_ptr, convert })
}

fn unwrap_pointer(table: &ShapeTable, id: ShapeId) -> (ShapeId, bool) {
    match table.pointee(id) {
        Some(inner) => (inner, true),
        None => (id, false),
    }
}
