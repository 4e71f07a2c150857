//! Descriptor catalog → shapes.
//!
//! A catalog is a JSON document listing, per package path, the structs, named
//! basic types and interfaces a generation run needs. Type references inside it
//! use Go spelling with fully qualified package paths:
//! `*T`, `[]T`, `string`, `example.com/app/source.User`.
use std::collections::HashSet;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{GenerateError, ResolveError};
use crate::shape::{Field, InterfaceDescriptor, MethodShape, ShapeId, ShapeTable, TypeShape};

// ————————————————————————————————————————————————————————————————————————————
// CATALOG
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// Qualified reference to the interface to implement.
    pub root: String,
    #[serde(default)]
    pub packages: IndexMap<String, IndexMap<String, TypeDecl>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDecl {
    Struct {
        #[serde(default)]
        fields: Vec<FieldDecl>,
    },
    /// `type Name <underlying>`
    Named { underlying: String },
    Interface {
        #[serde(default)]
        methods: Vec<MethodDecl>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub results: Vec<String>,
}

impl Catalog {
    pub fn from_json(src: &str) -> Result<Self, ResolveError> {
        crate::path_de::from_str_with_path(src)
    }
}

impl TypeDecl {
    fn kind(&self) -> &'static str {
        match self {
            TypeDecl::Struct { .. } => "struct",
            TypeDecl::Named { .. } => "named",
            TypeDecl::Interface { .. } => "interface",
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// RESOLVER
// ————————————————————————————————————————————————————————————————————————————

/// Source of structural type descriptions for the generator.
pub trait TypeDescriptorResolver {
    /// Resolve a type reference to its shape id.
    fn describe(&mut self, type_ref: &str) -> Result<ShapeId, ResolveError>;
    /// Resolve a qualified reference that must name an interface.
    fn describe_interface(&mut self, type_ref: &str) -> Result<InterfaceDescriptor, ResolveError>;
    fn shapes(&self) -> &ShapeTable;
}

const BASIC_TYPES: &[&str] = &[
    "bool", "string", "byte", "rune", "uintptr",
    "int", "int8", "int16", "int32", "int64",
    "uint", "uint8", "uint16", "uint32", "uint64",
    "float32", "float64", "complex64", "complex128",
];

// builtins with no basic underlying type; copied only when identical
const OPAQUE_BUILTINS: &[&str] = &["error", "any"];

// composite spellings kept as opaque shapes
const OPAQUE_PREFIXES: &[&str] = &["map[", "[", "chan ", "<-chan ", "chan<- ", "func(", "interface{", "struct{"];

static IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\p{L}_][\p{L}\p{Nd}_]*$").unwrap());

pub fn is_identifier(s: &str) -> bool {
    IDENT.is_match(s)
}

fn is_composite(type_ref: &str) -> bool {
    let r = type_ref.trim();
    r.starts_with('*') || OPAQUE_PREFIXES.iter().any(|p| r.starts_with(p))
}

#[derive(Debug)]
pub struct CatalogResolver {
    catalog: Catalog,
    table: ShapeTable,
    // named types whose underlying type is being resolved
    in_progress: HashSet<String>,
}

impl CatalogResolver {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog, table: ShapeTable::new(), in_progress: HashSet::new() }
    }

    pub fn from_json(src: &str) -> Result<Self, ResolveError> {
        Ok(Self::new(Catalog::from_json(src)?))
    }

    pub fn root(&self) -> &str {
        &self.catalog.root
    }

    /// Resolve the catalog's root interface.
    pub fn resolve_root(&mut self) -> Result<InterfaceDescriptor, ResolveError> {
        let root = self.catalog.root.clone();
        self.describe_interface(&root)
    }

    pub fn into_table(self) -> ShapeTable {
        self.table
    }

    fn decl(&self, package: &str, name: &str) -> Option<TypeDecl> {
        self.catalog.packages.get(package).and_then(|types| types.get(name)).cloned()
    }

    fn describe_named(&mut self, package: &str, name: &str) -> Result<ShapeId, ResolveError> {
        if let Some(id) = self.table.lookup(Some(package), name) {
            return Ok(id);
        }
        match self.decl(package, name) {
            // not declared: an external type we can only copy as-is
            None => Ok(self.table.primitive(Some(package), name, None)),
            Some(TypeDecl::Named { underlying }) => self.describe_named_type(package, name, &underlying),
            Some(TypeDecl::Struct { fields }) => {
                // reserve first so fields may point back at this struct
                let (id, _) = self.table.reserve_struct(package, name);
                let mut resolved = Vec::with_capacity(fields.len());
                for f in &fields {
                    if !is_identifier(&f.name) {
                        return Err(ResolveError::InvalidIdentifier(f.name.clone()));
                    }
                    let shape = self.describe(&f.ty)?;
                    resolved.push(Field { name: f.name.clone(), shape });
                }
                self.table.set_fields(id, resolved);
                tracing::trace!(package, name, fields = fields.len(), "resolved struct");
                Ok(id)
            }
            // only the root has to be an interface; as a value it is opaque
            Some(TypeDecl::Interface { .. }) => Ok(self.table.primitive(Some(package), name, None)),
        }
    }

    /// `type Name <underlying>`. A basic underlying type is kept so the named
    /// type can be cast; anything else makes it opaque.
    fn describe_named_type(&mut self, package: &str, name: &str, underlying: &str) -> Result<ShapeId, ResolveError> {
        if is_composite(underlying) {
            // registered before the underlying type: `type Tree []*Tree` is legal
            let id = self.table.primitive(Some(package), name, None);
            self.describe(underlying)?;
            return Ok(id);
        }
        let qualified = format!("{package}.{name}");
        if !self.in_progress.insert(qualified.clone()) {
            return Err(ResolveError::CyclicNamedType(qualified));
        }
        let inner = self.describe(underlying);
        self.in_progress.remove(&qualified);
        match self.table.get(inner?) {
            TypeShape::Primitive { underlying: Some(basic), .. } => {
                let basic = basic.clone();
                Ok(self.table.primitive(Some(package), name, Some(&basic)))
            }
            TypeShape::Struct(_) => Err(ResolveError::UnsupportedUnderlying {
                name: qualified,
                underlying: underlying.to_owned(),
            }),
            _ => Ok(self.table.primitive(Some(package), name, None)),
        }
    }
}

impl TypeDescriptorResolver for CatalogResolver {
    fn describe(&mut self, type_ref: &str) -> Result<ShapeId, ResolveError> {
        let r = type_ref.trim();
        if r.is_empty() {
            return Err(ResolveError::MalformedTypeRef(type_ref.to_owned()));
        }
        if let Some(rest) = r.strip_prefix('*') {
            let inner = self.describe(rest)?;
            return Ok(self.table.pointer(inner));
        }
        if let Some(rest) = r.strip_prefix("[]") {
            let inner = self.describe(rest)?;
            return Ok(self.table.slice(inner));
        }
        if OPAQUE_PREFIXES.iter().any(|p| r.starts_with(p)) {
            // kept as spelled; package paths inside are shortened by `type_expr`
            return Ok(self.table.primitive(None, r, None));
        }
        match split_qualified(r)? {
            None if BASIC_TYPES.contains(&r) => Ok(self.table.primitive(None, r, Some(r))),
            None if OPAQUE_BUILTINS.contains(&r) => Ok(self.table.primitive(None, r, None)),
            None if is_identifier(r) => Err(ResolveError::UnknownBuiltin(r.to_owned())),
            None => Err(ResolveError::MalformedTypeRef(r.to_owned())),
            Some((package, name)) => self.describe_named(package, name),
        }
    }

    fn describe_interface(&mut self, type_ref: &str) -> Result<InterfaceDescriptor, ResolveError> {
        let r = type_ref.trim();
        let Some((_, name)) = r.rsplit_once('.') else {
            return Err(ResolveError::MalformedTypeRef(r.to_owned()));
        };
        if name.is_empty() {
            return Err(GenerateError::UnnamedInterface.into());
        }
        let Some((package, name)) = split_qualified(r)? else {
            return Err(ResolveError::MalformedTypeRef(r.to_owned()));
        };
        let methods = match self.decl(package, name) {
            Some(TypeDecl::Interface { methods }) => methods,
            Some(other) => {
                return Err(GenerateError::InvalidInterfaceShape(format!(
                    "expected an interface, got {} `{r}`",
                    other.kind()
                ))
                .into());
            }
            None => return Err(ResolveError::UndeclaredType(r.to_owned())),
        };

        let mut out = Vec::with_capacity(methods.len());
        for m in methods {
            let params = m.params.iter().map(|p| self.describe(p)).collect::<Result<Vec<_>, _>>()?;
            let results = m.results.iter().map(|p| self.describe(p)).collect::<Result<Vec<_>, _>>()?;
            out.push(MethodShape { name: m.name, params, results });
        }
        Ok(InterfaceDescriptor {
            name: name.to_owned(),
            package: package.to_owned(),
            methods: out,
        })
    }

    fn shapes(&self) -> &ShapeTable {
        &self.table
    }
}

/// Split `pkg/path.Name` into its package path and name.
/// Returns `None` for unqualified refs.
fn split_qualified(r: &str) -> Result<Option<(&str, &str)>, ResolveError> {
    let Some((package, name)) = r.rsplit_once('.') else {
        return Ok(None);
    };
    if package.is_empty() || package.ends_with('/') || !is_identifier(name) {
        return Err(ResolveError::MalformedTypeRef(r.to_owned()));
    }
    Ok(Some((package, name)))
}
