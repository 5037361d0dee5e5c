//! The incremental build cache (§4.6): a persistent `__sushi_cache__/`
//! directory the driver consults before recompiling a unit, and repopulates
//! after. This crate only knows about bytes and fingerprints — it has no
//! dependency on `slangc_sema`/`slangc_lir`, so the driver is responsible
//! for assembling the byte streams that go into [`fingerprint_unit`] (source
//! bytes, a canonical serialization of depended-on public symbols,
//! structural declaration hashes, sorted import paths).
//!
//! Cancellation safety (§5) is the whole reason for this crate's shape:
//! every object file is written to a sibling `.tmp` path and renamed into
//! place only once fully flushed, and [`Cache::open`] only writes
//! `cache.json` after [`Cache::ensure_dirs`] has created `units/`,
//! `stdlib/`, and `libs/` — a process killed mid-compile never leaves
//! behind a manifest that claims objects which were never finished.

pub mod libfmt;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

const MANIFEST_FILE: &str = "cache.json";
const FINGERPRINT_EXT: &str = "fingerprint";
const OBJECT_EXT: &str = "o";

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cache manifest at {path} is malformed: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A hex-encoded SHA-256 digest, opaque outside this crate except for
/// comparison and on-disk storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hashes the per-source-unit fingerprint inputs named in §4.6, in the
/// fixed order the contract requires: source bytes, then the caller's
/// canonical serialization of every public symbol exported by every
/// transitively-depended unit, then structural hashes of all
/// struct/enum/extension/perk declarations, then sorted import paths.
///
/// The caller owns producing `dep_symbols` and `decl_hashes` in a stable,
/// canonical form (e.g. by serializing sorted AST fragments) — this
/// function only folds the pieces together, it does not know what a
/// struct or a perk is.
pub fn fingerprint_unit(source: &[u8], dep_symbols: &[u8], decl_hashes: &[u8], sorted_imports: &[String]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(source);
    hasher.update(dep_symbols);
    hasher.update(decl_hashes);
    for import in sorted_imports {
        hasher.update(import.as_bytes());
        hasher.update(b"\0");
    }
    Fingerprint(hex_digest(hasher))
}

/// Hashes raw bitcode bytes for a stdlib module or library, per §4.6's
/// "Stdlib and library object caches use SHA-256 over their own bitcode
/// bytes."
pub fn fingerprint_bytes(bitcode: &[u8]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(bitcode);
    Fingerprint(hex_digest(hasher))
}

fn hex_digest(hasher: Sha256) -> String {
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}

/// The `cache.json` contents: the three values that, together, decide
/// whether the whole cache is still trustworthy (§4.6's "if the manifest
/// does not match current ..., the cache is wiped").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub compiler_version: String,
    pub target_triple: String,
    pub opt_level: String,
}

/// Which kind of object this is, determining where it lives under the
/// cache root and how its name is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// A user source unit, e.g. `helpers.math` → `units/helpers/math.o`.
    Unit,
    /// A precompiled stdlib module, e.g. `io/stdio` → `stdlib/io_stdio.o`.
    Stdlib,
    /// An external library, flattened the same way as stdlib.
    Library,
}

impl ObjectKind {
    fn subdir(self) -> &'static str {
        match self {
            ObjectKind::Unit => "units",
            ObjectKind::Stdlib => "stdlib",
            ObjectKind::Library => "libs",
        }
    }
}

/// A handle onto `__sushi_cache__/` for one compilation run.
pub struct Cache {
    root: PathBuf,
}

impl Cache {
    /// Opens (or freshly creates) the cache at `root`, wiping it first if
    /// its recorded manifest doesn't match `current` — compiler version,
    /// target triple, or opt level drift all invalidate the whole cache
    /// rather than any finer-grained subset, since every cached object was
    /// produced under the stale configuration.
    #[instrument(level = "debug", skip(current))]
    pub fn open(root: impl Into<PathBuf> + std::fmt::Debug, current: &Manifest) -> Result<Self, CacheError> {
        let root = root.into();
        let cache = Cache { root };

        match cache.read_manifest() {
            Ok(Some(existing)) if &existing == current => {
                debug!("cache manifest matches, reusing existing cache");
            }
            Ok(Some(_)) => {
                warn!("cache manifest stale, wiping cache");
                cache.wipe()?;
                cache.write_manifest(current)?;
            }
            Ok(None) => {
                cache.write_manifest(current)?;
            }
            Err(_) => {
                warn!("cache manifest unreadable, wiping cache");
                cache.wipe()?;
                cache.write_manifest(current)?;
            }
        }

        Ok(cache)
    }

    /// Deletes the whole cache directory, if present. Used both by `open`
    /// when the manifest is stale and by the CLI's explicit wipe flag (§6).
    pub fn wipe(&self) -> Result<(), CacheError> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root).map_err(|source| CacheError::Io { path: self.root.clone(), source })?;
        }
        Ok(())
    }

    /// Creates `units/`, `stdlib/`, and `libs/` under the cache root. Must
    /// run before the manifest is written (§4.6) — see the module doc for
    /// why the ordering matters.
    pub fn ensure_dirs(&self) -> Result<(), CacheError> {
        for kind in [ObjectKind::Unit, ObjectKind::Stdlib, ObjectKind::Library] {
            let dir = self.root.join(kind.subdir());
            fs::create_dir_all(&dir).map_err(|source| CacheError::Io { path: dir, source })?;
        }
        Ok(())
    }

    fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    fn read_manifest(&self) -> Result<Option<Manifest>, CacheError> {
        let path = self.manifest_path();
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|source| CacheError::Io { path: path.clone(), source })?;
        let manifest = serde_json::from_slice(&bytes).map_err(|source| CacheError::Manifest { path, source })?;
        Ok(Some(manifest))
    }

    fn write_manifest(&self, manifest: &Manifest) -> Result<(), CacheError> {
        self.ensure_dirs()?;
        let path = self.manifest_path();
        let bytes = serde_json::to_vec_pretty(manifest).map_err(|source| CacheError::Manifest { path: path.clone(), source })?;
        atomic_write(&path, &bytes)
    }

    /// The path an object of this kind/name would live at, whether or not
    /// it currently exists.
    fn object_path(&self, kind: ObjectKind, name: &str) -> PathBuf {
        match kind {
            ObjectKind::Unit => {
                let mut path = self.root.join(kind.subdir());
                let mut parts = name.split('.').peekable();
                while let Some(part) = parts.next() {
                    if parts.peek().is_none() {
                        path.push(format!("{part}.{OBJECT_EXT}"));
                    } else {
                        path.push(part);
                    }
                }
                path
            }
            ObjectKind::Stdlib | ObjectKind::Library => {
                let flattened = name.replace(['/', '\\'], "_");
                self.root.join(kind.subdir()).join(format!("{flattened}.{OBJECT_EXT}"))
            }
        }
    }

    fn fingerprint_path(&self, kind: ObjectKind, name: &str) -> PathBuf {
        self.object_path(kind, name).with_extension(FINGERPRINT_EXT)
    }

    /// Returns the cached object's path iff its fingerprint sidecar matches
    /// `expected` and the object itself exists — the §4.6 rebuild contract
    /// ("a unit is rebuilt iff its fingerprint mismatches or its `.o` is
    /// missing") lives entirely in this one check.
    #[instrument(level = "debug", skip(self, expected))]
    pub fn lookup(&self, kind: ObjectKind, name: &str, expected: &Fingerprint) -> Option<PathBuf> {
        let object_path = self.object_path(kind, name);
        if !object_path.exists() {
            return None;
        }
        let fp_path = self.fingerprint_path(kind, name);
        let recorded = fs::read_to_string(&fp_path).ok()?;
        if recorded.trim() == expected.as_str() {
            debug!(name, "cache hit");
            Some(object_path)
        } else {
            debug!(name, "cache miss: fingerprint mismatch");
            None
        }
    }

    /// Writes `object_bytes` to its cache slot and records `fingerprint`
    /// alongside it, both via the write-temp-then-rename sequence required
    /// for cancellation safety. Returns the final object path.
    #[instrument(level = "debug", skip(self, object_bytes, fingerprint))]
    pub fn store(&self, kind: ObjectKind, name: &str, fingerprint: &Fingerprint, object_bytes: &[u8]) -> Result<PathBuf, CacheError> {
        let object_path = self.object_path(kind, name);
        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent).map_err(|source| CacheError::Io { path: parent.to_path_buf(), source })?;
        }
        atomic_write(&object_path, object_bytes)?;
        let fp_path = self.fingerprint_path(kind, name);
        atomic_write(&fp_path, fingerprint.as_str().as_bytes())?;
        Ok(object_path)
    }
}

/// Writes `bytes` to a sibling `.tmp` path, flushes and closes it, then
/// renames it over `path`. The compiler is single-threaded and
/// non-reentrant (§5), so a fixed `.tmp` suffix per final path is safe —
/// two writers never race for the same slot.
fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    use std::io::Write;

    let tmp_path = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&tmp_path).map_err(|source| CacheError::Io { path: tmp_path.clone(), source })?;
        file.write_all(bytes).map_err(|source| CacheError::Io { path: tmp_path.clone(), source })?;
        file.sync_all().map_err(|source| CacheError::Io { path: tmp_path.clone(), source })?;
    }
    fs::rename(&tmp_path, path).map_err(|source| CacheError::Io { path: path.to_path_buf(), source })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manifest() -> Manifest {
        Manifest {
            compiler_version: "0.1.0".to_string(),
            target_triple: "x86_64-unknown-linux-gnu".to_string(),
            opt_level: "mem2reg".to_string(),
        }
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let a = fingerprint_unit(b"source", b"deps", b"decls", &["a".to_string(), "b".to_string()]);
        let b = fingerprint_unit(b"source", b"deps", b"decls", &["a".to_string(), "b".to_string()]);
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_changes_with_source() {
        let a = fingerprint_unit(b"source one", b"deps", b"decls", &[]);
        let b = fingerprint_unit(b"source two", b"deps", b"decls", &[]);
        assert_ne!(a, b);
    }

    #[test]
    fn store_then_lookup_round_trips() {
        let dir = TempDir::new().unwrap();
        let cache = Cache::open(dir.path().join("__sushi_cache__"), &manifest()).unwrap();
        let fp = fingerprint_unit(b"fn main() {}", b"", b"", &[]);

        assert!(cache.lookup(ObjectKind::Unit, "helpers.math", &fp).is_none());

        let stored = cache.store(ObjectKind::Unit, "helpers.math", &fp, b"object bytes").unwrap();
        assert!(stored.ends_with("units/helpers/math.o"));

        let found = cache.lookup(ObjectKind::Unit, "helpers.math", &fp).unwrap();
        assert_eq!(found, stored);
        assert_eq!(fs::read(&found).unwrap(), b"object bytes");
    }

    #[test]
    fn mismatched_fingerprint_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = Cache::open(dir.path().join("__sushi_cache__"), &manifest()).unwrap();
        let fp_a = fingerprint_unit(b"version a", b"", b"", &[]);
        let fp_b = fingerprint_unit(b"version b", b"", b"", &[]);

        cache.store(ObjectKind::Unit, "helpers.math", &fp_a, b"stale object").unwrap();
        assert!(cache.lookup(ObjectKind::Unit, "helpers.math", &fp_b).is_none());
    }

    #[test]
    fn stdlib_names_are_flattened() {
        let dir = TempDir::new().unwrap();
        let cache = Cache::open(dir.path().join("__sushi_cache__"), &manifest()).unwrap();
        let fp = fingerprint_bytes(b"bitcode");
        let stored = cache.store(ObjectKind::Stdlib, "io/stdio", &fp, b"bc").unwrap();
        assert!(stored.ends_with("stdlib/io_stdio.o"));
    }

    #[test]
    fn stale_manifest_wipes_existing_objects() {
        let dir = TempDir::new().unwrap();
        let cache_dir = dir.path().join("__sushi_cache__");
        let cache = Cache::open(&cache_dir, &manifest()).unwrap();
        let fp = fingerprint_unit(b"fn main() {}", b"", b"", &[]);
        cache.store(ObjectKind::Unit, "a", &fp, b"obj").unwrap();
        assert!(cache.lookup(ObjectKind::Unit, "a", &fp).is_some());

        let mut stale = manifest();
        stale.opt_level = "O3".to_string();
        let reopened = Cache::open(&cache_dir, &stale).unwrap();
        assert!(reopened.lookup(ObjectKind::Unit, "a", &fp).is_none());
    }
}
