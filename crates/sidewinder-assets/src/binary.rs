//! Module binary preamble check.
//!
//! Only the 8-byte preamble is inspected. Anything past it is the module's
//! business and is left to the host's instantiation step.

use crate::error::BinaryError;

/// `\0asm`
pub const MODULE_MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6d];

/// Binary format version accepted by the host.
pub const MODULE_VERSION: u32 = 1;

/// Verifies that `bytes` starts with a version-1 WebAssembly preamble.
pub fn check_module_header(bytes: &[u8]) -> Result<(), BinaryError> {
    if bytes.len() < 8 {
        return Err(BinaryError::Truncated { len: bytes.len() });
    }

    let magic = [bytes[0], bytes[1], bytes[2], bytes[3]];
    if magic != MODULE_MAGIC {
        return Err(BinaryError::BadMagic(magic));
    }

    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != MODULE_VERSION {
        return Err(BinaryError::UnsupportedVersion(version));
    }

    Ok(())
}
