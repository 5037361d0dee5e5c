//! The binary library artifact format and its JSON sidecar (§6). A library
//! artifact is what `--library` mode (§6, §4.9) emits instead of an
//! executable, and what the two-phase linker's library-resolution step
//! (§4.5) reads back when a unit imports `lib/name`.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

const MAGIC: [u8; 16] = [
    0xF0, 0x9F, 0x8D, 0xA3, b'S', b'U', b'S', b'H', b'I', b'L', b'I', b'B', 0xF0, 0x9F, 0x8D, 0xA3,
];
const FORMAT_VERSION: u32 = 1;
const RESERVED_LEN: usize = 24;
const MAX_ARTIFACT_SIZE: u64 = 1 << 30; // 1 GiB, per §6.

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("I/O error reading/writing library artifact at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("library artifact at {path} is truncated")]
    Truncated { path: std::path::PathBuf },
    #[error("library artifact at {path} has a bad magic number")]
    BadMagic { path: std::path::PathBuf },
    #[error("library artifact at {path} has unsupported format version {found}")]
    UnsupportedVersion { path: std::path::PathBuf, found: u32 },
    #[error("library artifact at {path} exceeds the maximum size of 1 GiB")]
    TooLarge { path: std::path::PathBuf },
    #[error("library artifact metadata at {path} is malformed MessagePack: {source}")]
    MalformedMetadata {
        path: std::path::PathBuf,
        #[source]
        source: rmp_serde::decode::Error,
    },
    #[error("library sidecar manifest at {path} is malformed JSON: {source}")]
    MalformedSidecar {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicFunction {
    pub name: String,
    pub params: Vec<String>,
    pub return_type: String,
    pub is_generic: bool,
    pub type_params: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicConstant {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryMetadata {
    pub sushi_lib_version: u32,
    pub library_name: String,
    pub compiled_at: String,
    pub platform: String,
    pub compiler_version: String,
    pub public_functions: Vec<PublicFunction>,
    pub public_constants: Vec<PublicConstant>,
    pub structs: Vec<String>,
    pub enums: Vec<String>,
    pub dependencies: Vec<String>,
}

/// The plain-JSON companion manifest (§4.5, §6) a library linker's own
/// resolution step reads for a quick platform/version compatibility check,
/// without having to parse the full binary artifact and its bitcode tail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySidecar {
    pub sushi_lib_version: u32,
    pub library_name: String,
    pub platform: String,
    pub public_functions: Vec<PublicFunction>,
    pub structs: Vec<String>,
    pub enums: Vec<String>,
}

impl From<&LibraryMetadata> for LibrarySidecar {
    fn from(meta: &LibraryMetadata) -> Self {
        LibrarySidecar {
            sushi_lib_version: meta.sushi_lib_version,
            library_name: meta.library_name.clone(),
            platform: meta.platform.clone(),
            public_functions: meta.public_functions.clone(),
            structs: meta.structs.clone(),
            enums: meta.enums.clone(),
        }
    }
}

/// Writes a library artifact (binary) and its sidecar (JSON) as a sibling
/// pair: `path` gets the binary artifact, `path` with a `.sushilib`
/// extension gets the sidecar.
pub fn write_library_artifact(path: &Path, metadata: &LibraryMetadata, bitcode: &[u8]) -> Result<(), LibraryError> {
    let encoded_metadata = rmp_serde::to_vec(metadata).expect("LibraryMetadata serialization cannot fail");

    let mut buf = Vec::with_capacity(MAGIC.len() + 4 + RESERVED_LEN + 8 + encoded_metadata.len() + 8 + bitcode.len());
    buf.extend_from_slice(&MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&[0u8; RESERVED_LEN]);
    buf.extend_from_slice(&(encoded_metadata.len() as u64).to_le_bytes());
    buf.extend_from_slice(&encoded_metadata);
    buf.extend_from_slice(&(bitcode.len() as u64).to_le_bytes());
    buf.extend_from_slice(bitcode);

    let mut file = fs::File::create(path).map_err(|source| LibraryError::Io { path: path.to_path_buf(), source })?;
    file.write_all(&buf).map_err(|source| LibraryError::Io { path: path.to_path_buf(), source })?;

    let sidecar_path = path.with_extension("sushilib");
    let sidecar = LibrarySidecar::from(metadata);
    let sidecar_json = serde_json::to_vec_pretty(&sidecar).map_err(|source| LibraryError::MalformedSidecar { path: sidecar_path.clone(), source })?;
    fs::write(&sidecar_path, sidecar_json).map_err(|source| LibraryError::Io { path: sidecar_path, source })?;

    Ok(())
}

/// Parses a binary library artifact back into its metadata and raw bitcode,
/// detecting truncation, bad magic, and an unsupported version distinctly
/// as §6 requires.
pub fn read_library_artifact(path: &Path) -> Result<(LibraryMetadata, Vec<u8>), LibraryError> {
    let size = fs::metadata(path).map_err(|source| LibraryError::Io { path: path.to_path_buf(), source })?.len();
    if size > MAX_ARTIFACT_SIZE {
        return Err(LibraryError::TooLarge { path: path.to_path_buf() });
    }

    let mut file = fs::File::open(path).map_err(|source| LibraryError::Io { path: path.to_path_buf(), source })?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).map_err(|source| LibraryError::Io { path: path.to_path_buf(), source })?;

    let header_len = MAGIC.len() + 4 + RESERVED_LEN + 8;
    if buf.len() < header_len {
        return Err(LibraryError::Truncated { path: path.to_path_buf() });
    }
    if buf[..MAGIC.len()] != MAGIC {
        return Err(LibraryError::BadMagic { path: path.to_path_buf() });
    }

    let mut offset = MAGIC.len();
    let version = u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap());
    offset += 4;
    if version != FORMAT_VERSION {
        return Err(LibraryError::UnsupportedVersion { path: path.to_path_buf(), found: version });
    }
    offset += RESERVED_LEN;

    let metadata_len = u64::from_le_bytes(buf[offset..offset + 8].try_into().unwrap()) as usize;
    offset += 8;
    if buf.len() < offset + metadata_len + 8 {
        return Err(LibraryError::Truncated { path: path.to_path_buf() });
    }
    let metadata_bytes = &buf[offset..offset + metadata_len];
    offset += metadata_len;

    let metadata: LibraryMetadata = rmp_serde::from_slice(metadata_bytes).map_err(|source| LibraryError::MalformedMetadata { path: path.to_path_buf(), source })?;

    let bitcode_len = u64::from_le_bytes(buf[offset..offset + 8].try_into().unwrap()) as usize;
    offset += 8;
    if buf.len() < offset + bitcode_len {
        return Err(LibraryError::Truncated { path: path.to_path_buf() });
    }
    let bitcode = buf[offset..offset + bitcode_len].to_vec();

    Ok((metadata, bitcode))
}

/// Reads just the sidecar, for the linker's quick platform/version check
/// (§4.5) without touching the (potentially large) binary artifact.
pub fn read_sidecar(path: &Path) -> Result<LibrarySidecar, LibraryError> {
    let bytes = fs::read(path).map_err(|source| LibraryError::Io { path: path.to_path_buf(), source })?;
    serde_json::from_slice(&bytes).map_err(|source| LibraryError::MalformedSidecar { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_metadata() -> LibraryMetadata {
        LibraryMetadata {
            sushi_lib_version: 1,
            library_name: "collections".to_string(),
            compiled_at: "2026-08-01T00:00:00Z".to_string(),
            platform: "linux".to_string(),
            compiler_version: "0.1.0".to_string(),
            public_functions: vec![PublicFunction {
                name: "make_pair".to_string(),
                params: vec!["i32".to_string(), "i32".to_string()],
                return_type: "Pair".to_string(),
                is_generic: false,
                type_params: vec![],
            }],
            public_constants: vec![],
            structs: vec!["Pair".to_string()],
            enums: vec![],
            dependencies: vec![],
        }
    }

    #[test]
    fn round_trips_metadata_and_bitcode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("collections.sulib");
        let metadata = sample_metadata();
        write_library_artifact(&path, &metadata, b"fake bitcode").unwrap();

        let (read_meta, read_bitcode) = read_library_artifact(&path).unwrap();
        assert_eq!(read_meta, metadata);
        assert_eq!(read_bitcode, b"fake bitcode");
    }

    #[test]
    fn sidecar_is_written_alongside() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("collections.sulib");
        write_library_artifact(&path, &sample_metadata(), b"bc").unwrap();

        let sidecar = read_sidecar(&path.with_extension("sushilib")).unwrap();
        assert_eq!(sidecar.library_name, "collections");
        assert_eq!(sidecar.structs, vec!["Pair".to_string()]);
    }

    #[test]
    fn rejects_bad_magic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.sulib");
        fs::write(&path, b"not a real library artifact at all, padded").unwrap();
        assert!(matches!(read_library_artifact(&path), Err(LibraryError::BadMagic { .. })));
    }

    #[test]
    fn rejects_truncated_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.sulib");
        fs::write(&path, &MAGIC).unwrap();
        assert!(matches!(read_library_artifact(&path), Err(LibraryError::Truncated { .. })));
    }
}
