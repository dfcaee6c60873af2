//! Resolution of dotted unit names to files under the search folders.

use std::fs;
use std::path::{Path, PathBuf};

use paramcore::record::unit_rel_path;
use paramcore::{ParamError, Result};
use walkdir::WalkDir;

/// Resolves `a.b.c` to the single `<dir>/a/b/c.py` under any directory of
/// any search folder, the folders themselves included. Zero hits and more
/// than one distinct hit are both errors; a folder listed twice still
/// counts its files once.
pub fn find_unit_file(dotted: &str, roots: &[PathBuf]) -> Result<PathBuf> {
    let rel = unit_rel_path(dotted);
    let mut matches: Vec<PathBuf> = Vec::new();
    for root in roots {
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_dir() {
                continue;
            }
            let candidate = entry.path().join(&rel);
            if candidate.is_file() && !matches.contains(&candidate) {
                matches.push(candidate);
            }
        }
    }
    match matches.len() {
        0 => Err(ParamError::ModuleNotFound {
            path: dotted.to_string(),
            searched: roots.to_vec(),
        }),
        1 => Ok(matches.remove(0)),
        _ => Err(ParamError::AmbiguousModule {
            path: dotted.to_string(),
            matches,
        }),
    }
}

/// The resolved unit's source text.
pub fn find_unit_source(dotted: &str, roots: &[PathBuf]) -> Result<String> {
    let path = find_unit_file(dotted, roots)?;
    read_source(&path)
}

pub fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| ParamError::Io {
        path: path.to_path_buf(),
        source,
    })
}
