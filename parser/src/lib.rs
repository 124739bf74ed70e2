//! Reads the header and constant pool of Java class files.
//!
//! ```no_run
//! use parser::class::ClassFileReader;
//!
//! let mut reader = ClassFileReader::open("Hello.class")?;
//! reader.read_magic()?;
//! let version = reader.read_version()?;
//! let constant_pool = reader.read_constant_pool()?;
//! reader.close();
//!
//! println!("{version}: {} constant pool slots", constant_pool.len());
//! # Ok::<(), parser::error::ParseError>(())
//! ```

use std::{io::Read, path::Path};

use tracing::debug;

use crate::class::{ClassFile, ClassFileReader};

pub mod class;
pub mod config;
pub mod cursor;
pub mod error;

pub use crate::{
    config::ReaderConfig,
    error::{ParseError, Result},
};

/// Parses the header and constant pool from any byte source.
pub fn parse(r: impl Read) -> Result<ClassFile> {
    ClassFile::new(&mut ClassFileReader::new(r))
}

pub fn parse_file(path: impl AsRef<Path>) -> Result<ClassFile> {
    let path = path.as_ref();
    debug!("parsing class file {}", path.display());

    let mut reader = ClassFileReader::open(path)?;
    let class_file = ClassFile::new(&mut reader)?;
    reader.close();

    Ok(class_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_slice() {
        let bytes: &[u8] = &[
            0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34, 0x00, 0x02, 0x01, 0x00, 0x01, b'x',
        ];
        let class_file = parse(bytes).unwrap();

        assert_eq!(class_file.major_version, 52);
        assert_eq!(class_file.constant_pool.get(1).unwrap().as_utf8(), Some("x"));
    }

    #[test]
    fn parse_rejects_java_7() {
        let bytes: &[u8] = &[0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x33];
        assert!(matches!(
            parse(bytes),
            Err(ParseError::MalformedClassFile(_))
        ));
    }
}
