use std::io::{self, Read};

use crate::error::{ParseError, Result};

/// Forward-only big-endian reader over a byte source.
///
/// Every read either returns the full value or fails, a short read is never
/// turned into a truncated result.
pub struct ByteCursor<R> {
    inner: R,
    position: u64,
}

impl<R: Read> ByteCursor<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let [b] = self.array::<1>()?;
        Ok(b)
    }

    pub fn read_u16_be(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    pub fn read_u32_be(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    pub fn read_i32_be(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    pub fn read_i64_be(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.array()?))
    }

    pub fn read_f32_be(&mut self) -> Result<f32> {
        Ok(f32::from_be_bytes(self.array()?))
    }

    pub fn read_f64_be(&mut self) -> Result<f64> {
        Ok(f64::from_be_bytes(self.array()?))
    }

    pub fn read_exact(&mut self, length: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0; length];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.position += buf.len() as u64;
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                Err(ParseError::UnexpectedEndOfInput {
                    offset: self.position,
                    needed: buf.len(),
                })
            }
            Err(source) => Err(ParseError::Io {
                offset: self.position,
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn cursor(bytes: &[u8]) -> ByteCursor<Cursor<Vec<u8>>> {
        ByteCursor::new(Cursor::new(bytes.to_vec()))
    }

    #[test]
    fn test_big_endian_widths() {
        let mut c = cursor(&[0x01, 0x02, 0x03, 0xCA, 0xFE, 0xBA, 0xBE]);
        assert_eq!(c.read_u8().unwrap(), 0x01);
        assert_eq!(c.read_u16_be().unwrap(), 0x0203);
        assert_eq!(c.read_u32_be().unwrap(), 0xCAFEBABE);
        assert_eq!(c.position(), 7);
    }

    #[test]
    fn test_signed_and_float() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-2i32).to_be_bytes());
        bytes.extend_from_slice(&i64::MIN.to_be_bytes());
        bytes.extend_from_slice(&1.5f32.to_be_bytes());
        bytes.extend_from_slice(&(-0.25f64).to_be_bytes());

        let mut c = cursor(&bytes);
        assert_eq!(c.read_i32_be().unwrap(), -2);
        assert_eq!(c.read_i64_be().unwrap(), i64::MIN);
        assert_eq!(c.read_f32_be().unwrap(), 1.5);
        assert_eq!(c.read_f64_be().unwrap(), -0.25);
    }

    #[test]
    fn test_empty_source() {
        let mut c = cursor(&[]);
        assert!(matches!(
            c.read_u8(),
            Err(ParseError::UnexpectedEndOfInput {
                offset: 0,
                needed: 1
            })
        ));
    }

    #[test]
    fn test_partial_u16_is_failure() {
        let mut c = cursor(&[0xFF]);
        assert!(c.read_u16_be().unwrap_err().is_unexpected_end());
    }

    #[test]
    fn test_partial_u32_reports_offset() {
        let mut c = cursor(&[0x00, 0xCA, 0xFE, 0xBA]);
        c.read_u8().unwrap();
        assert!(matches!(
            c.read_u32_be(),
            Err(ParseError::UnexpectedEndOfInput {
                offset: 1,
                needed: 4
            })
        ));
    }

    #[test]
    fn test_read_exact() {
        let mut c = cursor(b"Test!");
        assert_eq!(c.read_exact(4).unwrap(), b"Test");
        assert_eq!(c.read_exact(0).unwrap(), b"");
        assert_eq!(c.position(), 4);
    }

    #[test]
    fn test_short_read_exact_is_failure() {
        let mut c = cursor(b"Tes");
        assert!(c.read_exact(4).unwrap_err().is_unexpected_end());
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk on fire"))
        }
    }

    #[test]
    fn test_io_error_is_not_end_of_input() {
        let mut c = ByteCursor::new(Broken);
        assert!(matches!(c.read_u8(), Err(ParseError::Io { offset: 0, .. })));
    }
}
