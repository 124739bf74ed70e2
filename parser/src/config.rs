/// Largest class file accepted by default (100 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Oldest class file major version accepted by default (Java 8).
pub const DEFAULT_MIN_MAJOR_VERSION: u16 = 52;

/// Limits applied while opening and reading a class file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Files above this size are rejected before any byte is read.
    pub max_file_size: u64,
    pub min_major_version: u16,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            min_major_version: DEFAULT_MIN_MAJOR_VERSION,
        }
    }
}

impl ReaderConfig {
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn with_min_major_version(mut self, min_major_version: u16) -> Self {
        self.min_major_version = min_major_version;
        self
    }
}
