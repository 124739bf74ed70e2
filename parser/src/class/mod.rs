use std::{
    fmt,
    fs::{self, File},
    io::{self, BufReader, Read},
    path::Path,
};

use tracing::debug;

use crate::{
    class::constant_pool::ConstantPool,
    config::ReaderConfig,
    cursor::ByteCursor,
    error::{ParseError, Result},
};

pub mod constant_pool;

pub const MAGIC: u32 = 0xCAFEBABE;

/// Header and constant pool of a class, interface or module
#[derive(Clone, Debug, PartialEq)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
}

impl ClassFile {
    pub fn new<R: Read>(reader: &mut ClassFileReader<R>) -> Result<Self> {
        reader.read_magic()?;
        let version = reader.read_version()?;
        let constant_pool = reader.read_constant_pool()?;

        Ok(Self {
            minor_version: version.minor,
            major_version: version.major,
            constant_pool,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// How far a [`ClassFileReader`] got through the file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReaderState {
    Created,
    MagicValidated,
    VersionValidated,
    ConstantPoolRead,
    /// A read failed, the byte stream is no longer at a known position.
    Failed,
}

impl fmt::Display for ReaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::MagicValidated => "past the magic number",
            Self::VersionValidated => "past the version",
            Self::ConstantPoolRead => "past the constant pool",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Reads a class file front to back: magic, version, then constant pool.
///
/// The reader owns its byte source, which is closed when the reader is
/// dropped or [`closed`](Self::close). Calls must follow file order, any
/// other order fails with [`ParseError::OutOfOrder`].
pub struct ClassFileReader<R> {
    cursor: ByteCursor<R>,
    config: ReaderConfig,
    state: ReaderState,
}

impl ClassFileReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, ReaderConfig::default())
    }

    /// Opens the file at `path`, rejecting empty and oversized files before
    /// reading from them.
    pub fn open_with(path: impl AsRef<Path>, config: ReaderConfig) -> Result<Self> {
        let path = path.as_ref();

        let metadata = fs::metadata(path).map_err(|err| source_error(path, err))?;
        if metadata.is_dir() {
            return Err(ParseError::SourceNotFound {
                path: path.to_path_buf(),
            });
        }

        let size = metadata.len();
        if size == 0 {
            return Err(ParseError::malformed(format!(
                "empty class file {}",
                path.display()
            )));
        }
        if size > config.max_file_size {
            return Err(ParseError::malformed(format!(
                "class file size {size} exceeds maximum of {} bytes",
                config.max_file_size
            )));
        }

        let file = File::open(path).map_err(|err| source_error(path, err))?;
        debug!("opened class file {} ({size} bytes)", path.display());

        Ok(Self::with_config(BufReader::new(file), config))
    }
}

impl<R: Read> ClassFileReader<R> {
    pub fn new(r: R) -> Self {
        Self::with_config(r, ReaderConfig::default())
    }

    pub fn with_config(r: R, config: ReaderConfig) -> Self {
        Self {
            cursor: ByteCursor::new(r),
            config,
            state: ReaderState::Created,
        }
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Bytes consumed from the source so far.
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    pub fn read_magic(&mut self) -> Result<()> {
        self.step(
            "read_magic",
            ReaderState::Created,
            ReaderState::MagicValidated,
            |r, _| {
                let magic = r.read_u32_be()?;
                if magic != MAGIC {
                    return Err(ParseError::malformed(format!(
                        "invalid magic number 0x{magic:08X}"
                    )));
                }

                debug!("magic number ok");
                Ok(())
            },
        )
    }

    /// Minor version comes first on disk, then major.
    pub fn read_version(&mut self) -> Result<Version> {
        self.step(
            "read_version",
            ReaderState::MagicValidated,
            ReaderState::VersionValidated,
            |r, config| {
                let minor = r.read_u16_be()?;
                let major = r.read_u16_be()?;
                let version = Version { major, minor };

                if major < config.min_major_version {
                    return Err(ParseError::malformed(format!(
                        "unsupported class file version {version}, major version must be at least {}",
                        config.min_major_version
                    )));
                }

                debug!("class file version {version}");
                Ok(version)
            },
        )
    }

    pub fn read_constant_pool(&mut self) -> Result<ConstantPool> {
        self.step(
            "read_constant_pool",
            ReaderState::VersionValidated,
            ReaderState::ConstantPoolRead,
            |r, _| {
                let count = r.read_u16_be()?;
                let constant_pool = ConstantPool::new(r, count)?;

                debug!("read constant pool with {count} slots");
                Ok(constant_pool)
            },
        )
    }

    /// Releases the byte source.
    pub fn close(self) {
        debug!("closing class file reader at offset {}", self.position());
    }

    fn step<T>(
        &mut self,
        operation: &'static str,
        from: ReaderState,
        to: ReaderState,
        read: impl FnOnce(&mut ByteCursor<R>, &ReaderConfig) -> Result<T>,
    ) -> Result<T> {
        if self.state != from {
            return Err(ParseError::OutOfOrder {
                operation,
                state: self.state,
            });
        }

        match read(&mut self.cursor, &self.config) {
            Ok(value) => {
                self.state = to;
                Ok(value)
            }
            Err(err) => {
                self.state = ReaderState::Failed;
                Err(err)
            }
        }
    }
}

fn source_error(path: &Path, err: io::Error) -> ParseError {
    if err.kind() == io::ErrorKind::NotFound {
        ParseError::SourceNotFound {
            path: path.to_path_buf(),
        }
    } else {
        ParseError::SourceUnavailable {
            path: path.to_path_buf(),
            source: err,
        }
    }
}
