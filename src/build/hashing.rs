//! Content hashing for build inputs.
//!
//! The artifact id is a SHA-256 digest over every build input in a fixed
//! order, so identical inputs always produce the same id and store path.

use super::descriptor::BuildDescriptor;
use super::source::SourceFile;
use crate::error::{Result, VoxError};
use sha2::{Digest, Sha256};

/// Domain separator mixed into every artifact digest.
const ARTIFACT_HASH_DOMAIN: &[u8] = b"voxdeploy-artifact-v1";

/// Compute the artifact id for `descriptor` built from `sources`.
pub fn artifact_id(descriptor: &BuildDescriptor, sources: &[SourceFile]) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(ARTIFACT_HASH_DOMAIN);

    update_field(&mut hasher, descriptor.name.as_bytes());
    update_field(&mut hasher, descriptor.binary.as_bytes());
    update_field(&mut hasher, descriptor.entry_point.as_bytes());
    update_field(&mut hasher, descriptor.interpreter.as_bytes());

    for pin in descriptor.dependencies.pins() {
        update_field(&mut hasher, pin.as_bytes());
    }

    let steps = serde_json::to_vec(&descriptor.post_build)
        .map_err(|e| VoxError::Build(format!("failed to encode post-build steps: {}", e)))?;
    update_field(&mut hasher, &steps);

    for file in sources {
        update_field(&mut hasher, file.relative.as_bytes());
        update_field(&mut hasher, &file.contents);
    }

    Ok(hex_encode(&hasher.finalize()))
}

/// Length-prefix each field so adjacent fields cannot alias.
fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
