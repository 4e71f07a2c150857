use std::path::PathBuf;
use thiserror::Error;

/// Fatal generation failures. Nothing is emitted when one of these is returned.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("invalid interface shape: {0}")]
    InvalidInterfaceShape(String),
    #[error("interface must have a name")]
    UnnamedInterface,
}

/// Failures while turning a descriptor catalog into shapes.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to parse descriptor catalog: {0}")]
    Parse(String),
    #[error("malformed type reference `{0}`")]
    MalformedTypeRef(String),
    #[error("unknown builtin type `{0}`")]
    UnknownBuiltin(String),
    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),
    #[error("type `{0}` is not declared in the catalog")]
    UndeclaredType(String),
    #[error("named type `{name}` cannot have struct type `{underlying}` as its underlying type")]
    UnsupportedUnderlying { name: String, underlying: String },
    #[error("named type `{0}` is defined in terms of itself")]
    CyclicNamedType(String),
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("unable to locate package directory for {package} (module {module})")]
    PackageResolutionFailure { package: String, module: String },
    #[error("no `module` line in {0}")]
    MissingModuleLine(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}

#[derive(Debug, Error)]
#[error("failed to write {path}: {source}")]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}
