/// Highest TZX major version this decoder understands.
pub const SUPPORTED_MAJOR_VERSION: u8 = 1;

/// Configuration for [`TzxFile::decode_with`] and [`TapFile::decode_with`].
///
/// [`TzxFile::decode_with`]: crate::container::TzxFile::decode_with
/// [`TapFile::decode_with`]: crate::tap::TapFile::decode_with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Images with a higher major version are rejected.
    pub max_major_version: u8,
    /// Check every embedded header and standard data unit XORs to zero.
    pub verify_checksums:  bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_major_version: SUPPORTED_MAJOR_VERSION,
            verify_checksums:  false,
        }
    }
}

impl DecodeOptions {
    pub fn with_max_major_version(mut self, major: u8) -> Self {
        self.max_major_version = major;
        self
    }

    pub fn with_verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }
}
