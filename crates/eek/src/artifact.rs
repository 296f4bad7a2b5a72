//! Built programs and their on-disk cache.
//!
//! Every build writes the assembled source next to a JSON encoding of the
//! compiled program. Files are named after the evaluator and a SHA-256 digest
//! of the source, so a later build of identical source under the same
//! directory loads the program instead of compiling it again.

use crate::compiler::{Compilation, CompilationOptions, Compiler};
use crate::error::BuildError;
use crate::registry::Var;
use crate::source::SourceMap;
use crate::types::Type;
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const DIGEST_PREFIX_LEN: usize = 12;

/// An immutable, successfully built evaluator program.
#[derive(Debug)]
pub struct Artifact {
    source: String,
    digest: String,
    compilation: Compilation,
    variables: Vec<Var>,
    source_path: PathBuf,
    program_path: PathBuf,
    cached: bool,
}

impl Artifact {
    /// The assembled program text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Hex SHA-256 of [`Artifact::source`].
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn compilation(&self) -> &Compilation {
        &self.compilation
    }

    /// Result type of the formula, as inferred when it was compiled.
    pub fn result_type(&self) -> Option<&Type> {
        self.compilation.type_info.entry_return.as_ref()
    }

    /// Variables as they were declared when this artifact was built.
    pub fn variables(&self) -> &[Var] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Var> {
        self.variables.iter().find(|var| var.name == name)
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn program_path(&self) -> &Path {
        &self.program_path
    }

    /// Whether the program was loaded from a previous build.
    pub fn was_cached(&self) -> bool {
        self.cached
    }
}

#[derive(Serialize, Deserialize)]
struct PersistedProgram {
    digest: String,
    compilation: Compilation,
}

/// Builds `source`, reusing a persisted program under `dir` when one exists
/// for the same digest.
pub fn build(
    name: &str,
    source: String,
    variables: Vec<Var>,
    dir: &Path,
) -> Result<Artifact, BuildError> {
    fs::create_dir_all(dir).map_err(|err| BuildError::io(dir, err))?;

    let digest = hex::encode(Sha256::digest(source.as_bytes()));
    let stem = format!("{}-{}", slug(name), &digest[..DIGEST_PREFIX_LEN]);
    let source_path = dir.join(format!("{stem}.eek"));
    let program_path = dir.join(format!("{stem}.json"));

    if let Some(compilation) = load_cached(&source_path, &program_path, &source, &digest) {
        debug!("reusing compiled program {}", program_path.display());
        return Ok(Artifact {
            source,
            digest,
            compilation,
            variables,
            source_path,
            program_path,
            cached: true,
        });
    }

    fs::write(&source_path, &source).map_err(|err| BuildError::io(&source_path, err))?;
    let file_name = source_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| stem.clone());
    let sources = SourceMap::single(file_name, source.as_str());
    let compilation = Compiler::with_options(CompilationOptions::default()).compile(&sources)?;

    let persisted = PersistedProgram { digest, compilation };
    let encoded = serde_json::to_vec(&persisted)?;
    fs::write(&program_path, encoded).map_err(|err| BuildError::io(&program_path, err))?;
    debug!(
        "compiled {} bytes of source into {}",
        source.len(),
        program_path.display()
    );

    let PersistedProgram { digest, compilation } = persisted;
    Ok(Artifact {
        source,
        digest,
        compilation,
        variables,
        source_path,
        program_path,
        cached: false,
    })
}

fn load_cached(source_path: &Path, program_path: &Path, source: &str, digest: &str) -> Option<Compilation> {
    let on_disk = fs::read_to_string(source_path).ok()?;
    if on_disk != source {
        return None;
    }
    let bytes = fs::read(program_path).ok()?;
    let persisted: PersistedProgram = serde_json::from_slice(&bytes).ok()?;
    (persisted.digest == digest).then_some(persisted.compilation)
}

/// File-name friendly form of an evaluator name.
fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "evaluator".to_string()
    } else {
        trimmed.to_string()
    }
}

/// A private build directory under the system temp dir, removed on drop.
#[derive(Debug)]
pub struct TempBuildDir {
    path: PathBuf,
}

impl TempBuildDir {
    pub fn new() -> Self {
        Self {
            path: std::env::temp_dir().join(format!("eek-{}", Uuid::new_v4())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for TempBuildDir {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TempBuildDir {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(err) = fs::remove_dir_all(&self.path) {
                debug!("could not remove {}: {err}", self.path.display());
            }
        }
    }
}
