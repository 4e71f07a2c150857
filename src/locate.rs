//! Where generated units go: package path → directory, and the file write.
use std::path::{Path, PathBuf};

use crate::error::{LocateError, WriteError};
use crate::generate::GeneratedUnit;

pub trait PackageLocator {
    fn locate(&self, package: &str) -> Result<PathBuf, LocateError>;
}

/// Maps packages of one Go module onto directories under the module root.
#[derive(Debug, Clone)]
pub struct ModuleLocator {
    module_path: String,
    root: PathBuf,
}

impl ModuleLocator {
    pub fn new(module_path: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self { module_path: module_path.into(), root: root.into() }
    }

    /// Read the module path from `<root>/go.mod`.
    pub fn from_go_mod(root: &Path) -> Result<Self, LocateError> {
        let go_mod = root.join("go.mod");
        let text = std::fs::read_to_string(&go_mod).map_err(|source| LocateError::Io {
            path: go_mod.clone(),
            source,
        })?;
        let module = text
            .lines()
            .filter_map(|line| line.trim().strip_prefix("module"))
            .map(|rest| rest.trim().trim_matches('"'))
            .find(|rest| !rest.is_empty())
            .ok_or(LocateError::MissingModuleLine(go_mod))?;
        Ok(Self::new(module, root))
    }

    pub fn module_path(&self) -> &str {
        &self.module_path
    }
}

impl PackageLocator for ModuleLocator {
    fn locate(&self, package: &str) -> Result<PathBuf, LocateError> {
        if package == self.module_path {
            return Ok(self.root.clone());
        }
        package
            .strip_prefix(self.module_path.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .map(|rest| self.root.join(rest))
            .ok_or_else(|| LocateError::PackageResolutionFailure {
                package: package.to_owned(),
                module: self.module_path.clone(),
            })
    }
}

/// Write `unit` into `dir`, creating the directory if needed.
pub fn write_unit(unit: &GeneratedUnit, dir: &Path) -> Result<PathBuf, WriteError> {
    let path = dir.join(&unit.file_name);
    let wrap = |source: std::io::Error| WriteError { path: path.clone(), source };
    std::fs::create_dir_all(dir).map_err(wrap)?;
    std::fs::write(&path, &unit.source).map_err(wrap)?;
    tracing::info!(path = %path.display(), "wrote generated unit");
    Ok(path)
}
