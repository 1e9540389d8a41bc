//! Locating and reading imported modules.
//!
//! The resolver only sees [`ModuleLoader`]; the filesystem probing
//! rules live in [`FsLoader`] and tests swap in [`HashMapLoader`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::{fs, io};

/// File extension of Thor source files.
pub const SOURCE_EXTENSION: &str = "thor";

/// A module's contents plus the path it was loaded from.
///
/// `path` is canonical for filesystem loaders, so two imports of the
/// same file always compare equal regardless of how they were spelled.
#[derive(Debug, Clone)]
pub struct LoadedModule {
    pub path: PathBuf,
    pub source: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ModuleLoaderError {
    #[error("could not find module `{module}`")]
    NotFound { module: String },

    #[error("error reading `{}`: {io_error}", path.display())]
    Io {
        path: PathBuf,
        io_error: io::Error,
    },
}

pub trait ModuleLoader {
    /// Load `module` as imported from the directory `importer_dir`.
    fn load(
        &self,
        module: &str,
        importer_dir: Option<&Path>,
    ) -> Result<LoadedModule, ModuleLoaderError>;
}

/// Loads modules from disk.
///
/// Probes, in order: the importing file's directory, then each search
/// path. In each base directory the module name is tried as given,
/// with `.thor` appended, and as a subdirectory containing any `.thor`
/// file.
#[derive(Debug, Clone, Default)]
pub struct FsLoader {
    pub search_paths: Vec<PathBuf>,
}

impl FsLoader {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    fn probe_dir(&self, dir: &Path, module: &str) -> Option<PathBuf> {
        let direct = dir.join(module);
        if direct.is_file() {
            return Some(direct);
        }

        let with_ext = dir.join(format!("{module}.{SOURCE_EXTENSION}"));
        if with_ext.is_file() {
            return Some(with_ext);
        }

        // A directory named after the module: take any source file in
        // it, in name order so probing is deterministic.
        let subdir = dir.join(module);
        if subdir.is_dir() {
            let mut candidates: Vec<PathBuf> = fs::read_dir(&subdir)
                .ok()?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| {
                    path.extension().and_then(|ext| ext.to_str()) == Some(SOURCE_EXTENSION)
                })
                .collect();

            candidates.sort();
            return candidates.into_iter().next();
        }

        None
    }

    fn probe(&self, module: &str, importer_dir: Option<&Path>) -> Option<PathBuf> {
        if let Some(dir) = importer_dir {
            if let Some(path) = self.probe_dir(dir, module) {
                return Some(path);
            }
        }

        self.search_paths
            .iter()
            .find_map(|dir| self.probe_dir(dir, module))
    }
}

impl ModuleLoader for FsLoader {
    fn load(
        &self,
        module: &str,
        importer_dir: Option<&Path>,
    ) -> Result<LoadedModule, ModuleLoaderError> {
        let path = self
            .probe(module, importer_dir)
            .ok_or_else(|| ModuleLoaderError::NotFound {
                module: module.to_owned(),
            })?;

        let path = fs::canonicalize(&path).map_err(|io_error| ModuleLoaderError::Io {
            path: path.clone(),
            io_error,
        })?;

        let source = fs::read_to_string(&path).map_err(|io_error| ModuleLoaderError::Io {
            path: path.clone(),
            io_error,
        })?;

        Ok(LoadedModule { path, source })
    }
}

/// In-memory loader for tests; the module name doubles as its path.
#[derive(Debug, Clone, Default)]
pub struct HashMapLoader {
    pub modules: HashMap<String, String>,
}

impl ModuleLoader for HashMapLoader {
    fn load(
        &self,
        module: &str,
        _importer_dir: Option<&Path>,
    ) -> Result<LoadedModule, ModuleLoaderError> {
        let source = self
            .modules
            .get(module)
            .cloned()
            .ok_or_else(|| ModuleLoaderError::NotFound {
                module: module.to_owned(),
            })?;

        Ok(LoadedModule {
            path: PathBuf::from(module),
            source,
        })
    }
}
