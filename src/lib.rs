//! Generates Go struct-to-struct conversion code from structural type
//! descriptions, without reflection at conversion time.
pub mod shape;
pub mod resolve;
pub mod synth;
pub mod imports;
pub mod emit;
pub mod generate;
pub mod locate;
pub mod error;
pub mod cli;
mod path_de;

pub use error::{GenerateError, LocateError, ResolveError, WriteError};
pub use generate::{GenerateOptions, GeneratedUnit, GenerationReport, generate, generate_from_json};
pub use resolve::{CatalogResolver, TypeDescriptorResolver};
pub use shape::{InterfaceDescriptor, MethodShape, ShapeId, ShapeTable, TypeShape};
