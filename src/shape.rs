// Structural type shapes. No catalog/serde types here.
//! Shapes are hash-consed into a [`ShapeTable`]: two structurally identical
//! shapes always get the same [`ShapeId`], so shape identity is id equality.
//! Structs are keyed by their qualified name and may be reserved before their
//! fields are known, which lets a struct refer to itself through its fields.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// a possibly package-qualified name inside a composite spelling
static QUALIFIED_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\w.~/-]+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(usize);

impl ShapeId {
    pub fn index(self) -> usize { self.0 }
}

#[derive(Debug, Clone)]
pub enum TypeShape {
    /// Basic, named-basic, or opaque type. `underlying` is the Go basic type
    /// (`string`, `int`, ...) or `None` for opaque types such as `time.Time`.
    Primitive {
        name: String,
        package: Option<String>,
        underlying: Option<String>,
    },
    Pointer(ShapeId),
    Slice(ShapeId),
    Struct(StructShape),
}

#[derive(Debug, Clone)]
pub struct StructShape {
    pub name: String,
    pub package: String,
    pub fields: Vec<Field>,  // declaration order
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub shape: ShapeId,
}

/// An interface whose methods each convert one shape into another.
#[derive(Debug, Clone)]
pub struct InterfaceDescriptor {
    pub name: String,
    pub package: String,
    pub methods: Vec<MethodShape>,
}

#[derive(Debug, Clone)]
pub struct MethodShape {
    pub name: String,
    pub params: Vec<ShapeId>,
    pub results: Vec<ShapeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ShapeKey {
    Named { package: Option<String>, name: String },
    Pointer(ShapeId),
    Slice(ShapeId),
}

// ————————————————————————————————————————————————————————————————————————————
// TABLE
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Default)]
pub struct ShapeTable {
    shapes: IndexMap<ShapeKey, TypeShape>,
}

impl ShapeTable {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.shapes.len() }

    pub fn is_empty(&self) -> bool { self.shapes.is_empty() }

    fn intern(&mut self, key: ShapeKey, shape: impl FnOnce() -> TypeShape) -> ShapeId {
        if let Some(index) = self.shapes.get_index_of(&key) {
            return ShapeId(index);
        }
        let (index, _) = self.shapes.insert_full(key, shape());
        ShapeId(index)
    }

    pub fn primitive(&mut self, package: Option<&str>, name: &str, underlying: Option<&str>) -> ShapeId {
        let key = ShapeKey::Named {
            package: package.map(str::to_owned),
            name: name.to_owned(),
        };
        self.intern(key, || TypeShape::Primitive {
            name: name.to_owned(),
            package: package.map(str::to_owned),
            underlying: underlying.map(str::to_owned),
        })
    }

    pub fn pointer(&mut self, elem: ShapeId) -> ShapeId {
        self.intern(ShapeKey::Pointer(elem), || TypeShape::Pointer(elem))
    }

    pub fn slice(&mut self, elem: ShapeId) -> ShapeId {
        self.intern(ShapeKey::Slice(elem), || TypeShape::Slice(elem))
    }

    /// Reserve a struct slot with no fields yet.
    /// Returns `true` alongside the id when the slot was created by this call.
    pub fn reserve_struct(&mut self, package: &str, name: &str) -> (ShapeId, bool) {
        let key = ShapeKey::Named { package: Some(package.to_owned()), name: name.to_owned() };
        if let Some(index) = self.shapes.get_index_of(&key) {
            return (ShapeId(index), false);
        }
        let shape = TypeShape::Struct(StructShape {
            name: name.to_owned(),
            package: package.to_owned(),
            fields: Vec::new(),
        });
        let (index, _) = self.shapes.insert_full(key, shape);
        (ShapeId(index), true)
    }

    /// Fill in the fields of a previously reserved struct. No-op for non-structs.
    pub fn set_fields(&mut self, id: ShapeId, fields: Vec<Field>) {
        if let Some((_, TypeShape::Struct(s))) = self.shapes.get_index_mut(id.0) {
            s.fields = fields;
        }
    }

    pub fn lookup(&self, package: Option<&str>, name: &str) -> Option<ShapeId> {
        let key = ShapeKey::Named { package: package.map(str::to_owned), name: name.to_owned() };
        self.shapes.get_index_of(&key).map(ShapeId)
    }

    pub fn get(&self, id: ShapeId) -> &TypeShape {
        &self.shapes[id.0]
    }

    pub fn as_struct(&self, id: ShapeId) -> Option<&StructShape> {
        match self.get(id) {
            TypeShape::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_struct(&self, id: ShapeId) -> bool {
        self.as_struct(id).is_some()
    }

    pub fn pointee(&self, id: ShapeId) -> Option<ShapeId> {
        match self.get(id) {
            TypeShape::Pointer(inner) => Some(*inner),
            _ => None,
        }
    }

    /// The package a shape is declared in, looking through pointers and slices.
    pub fn package_of(&self, id: ShapeId) -> Option<&str> {
        match self.get(id) {
            TypeShape::Primitive { package, .. } => package.as_deref(),
            TypeShape::Pointer(inner) | TypeShape::Slice(inner) => self.package_of(*inner),
            TypeShape::Struct(s) => Some(&s.package),
        }
    }

    /// Go type expression for `id` as written from inside `local_package`.
    pub fn type_expr(&self, id: ShapeId, local_package: &str) -> String {
        match self.get(id) {
            // composite spellings such as `map[string]example.com/app/source.Role`
            TypeShape::Primitive { name, package: None, .. } => shorten_paths(name, local_package),
            TypeShape::Primitive { name, package, .. } => qualify(package.as_deref(), name, local_package),
            TypeShape::Pointer(inner) => format!("*{}", self.type_expr(*inner, local_package)),
            TypeShape::Slice(inner) => format!("[]{}", self.type_expr(*inner, local_package)),
            TypeShape::Struct(s) => qualify(Some(&s.package), &s.name, local_package),
        }
    }
}

fn qualify(package: Option<&str>, name: &str, local_package: &str) -> String {
    match package {
        Some(p) if p != local_package => format!("{}.{name}", package_alias(p)),
        _ => name.to_owned(),
    }
}

fn shorten_paths(spelling: &str, local_package: &str) -> String {
    QUALIFIED_TOKEN
        .replace_all(spelling, |caps: &Captures| match caps[0].rsplit_once('.') {
            Some((package, name)) if !package.is_empty() => qualify(Some(package), name, local_package),
            _ => caps[0].to_owned(),
        })
        .into_owned()
}

/// Last path segment of a package path, which is what Go code refers to it by.
pub fn package_alias(package: &str) -> &str {
    package.rsplit('/').next().unwrap_or(package)
}
