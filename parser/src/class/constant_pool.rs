use std::{fmt, io::Read};

use tracing::trace;

use crate::{
    cursor::ByteCursor,
    error::{ParseError, Result},
};

/// One-based index into the constant pool, stored exactly as read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CpIndex(pub u16);

impl From<u16> for CpIndex {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for CpIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A table of structures representing various string constants,
/// class and interface names, field names, and other constant structures.
///
/// Slot 0 is always empty, as is the slot following a long or double.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstantPool {
    infos: Vec<Option<CpInfo>>,
}

impl ConstantPool {
    /// Decodes `count - 1` entries. `count` is the slot count from the file,
    /// including the unused slot 0.
    pub fn new<R: Read>(r: &mut ByteCursor<R>, count: u16) -> Result<Self> {
        if count == 0 {
            return Err(ParseError::malformed(format!(
                "invalid constant pool count {count}"
            )));
        }

        let count = usize::from(count);
        let mut infos = vec![None; count];

        let mut index = 1;
        while index < count {
            let info = CpInfo::new(r, index, count)?;
            let slots = info.slots();

            if index + slots > count {
                return Err(ParseError::malformed(format!(
                    "8-byte constant at index {index} overruns constant pool of {count} slots"
                )));
            }

            trace!("constant pool #{index}: {info:?}");
            infos[index] = Some(info);
            index += slots;
        }

        Ok(Self { infos })
    }

    /// Number of slots, including the unused slot 0.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// The entry stored at `index`, `None` for empty or out of range slots.
    pub fn get(&self, index: u16) -> Option<&CpInfo> {
        self.infos.get(usize::from(index))?.as_ref()
    }

    pub fn slots(&self) -> &[Option<CpInfo>] {
        &self.infos
    }

    /// Populated entries in pool order.
    pub fn iter(&self) -> impl Iterator<Item = (CpIndex, &CpInfo)> {
        self.infos.iter().enumerate().filter_map(|(index, info)| {
            let info = info.as_ref()?;
            // slots never exceed u16::MAX, the count was read as a u16
            Some((CpIndex(index as u16), info))
        })
    }
}

pub const UTF8_TAG: u8 = 1;
pub const INTEGER_TAG: u8 = 3;
pub const FLOAT_TAG: u8 = 4;
pub const LONG_TAG: u8 = 5;
pub const DOUBLE_TAG: u8 = 6;
pub const CLASS_TAG: u8 = 7;
pub const STRING_TAG: u8 = 8;
pub const FIELD_REF_TAG: u8 = 9;
pub const METHOD_REF_TAG: u8 = 10;
pub const INTERFACE_METHOD_REF_TAG: u8 = 11;
pub const NAME_AND_TYPE_TAG: u8 = 12;
pub const METHOD_HANDLE_TAG: u8 = 15;
pub const METHOD_TYPE_TAG: u8 = 16;
pub const DYNAMIC_TAG: u8 = 17;
pub const INVOKE_DYNAMIC_TAG: u8 = 18;
pub const MODULE_TAG: u8 = 19;
pub const PACKAGE_TAG: u8 = 20;

#[derive(Clone, Debug, PartialEq)]
pub enum CpInfo {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class {
        name_index: CpIndex,
    },
    String {
        string_index: CpIndex,
    },
    FieldRef {
        class_index: CpIndex,
        name_and_type_index: CpIndex,
    },
    MethodRef {
        class_index: CpIndex,
        name_and_type_index: CpIndex,
    },
    InterfaceMethodRef {
        class_index: CpIndex,
        name_and_type_index: CpIndex,
    },
    NameAndType {
        name_index: CpIndex,
        descriptor_index: CpIndex,
    },
    MethodHandle {
        reference_kind: u8,
        reference_index: CpIndex,
    },
    MethodType {
        descriptor_index: CpIndex,
    },
    Dynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: CpIndex,
    },
    InvokeDynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: CpIndex,
    },
    Module {
        name_index: CpIndex,
    },
    Package {
        name_index: CpIndex,
    },
}

impl CpInfo {
    fn new<R: Read>(r: &mut ByteCursor<R>, index: usize, count: usize) -> Result<Self> {
        let tag = r.read_u8().map_err(|err| {
            truncated(
                err,
                format!("constant pool entry {index} of {} is missing", count - 1),
            )
        })?;

        let info = match tag {
            UTF8_TAG => Self::utf8(r, index),
            INTEGER_TAG => r.read_i32_be().map(Self::Integer),
            FLOAT_TAG => r.read_f32_be().map(Self::Float),
            LONG_TAG => r.read_i64_be().map(Self::Long),
            DOUBLE_TAG => r.read_f64_be().map(Self::Double),
            CLASS_TAG => Self::class(r),
            STRING_TAG => Self::string(r),
            FIELD_REF_TAG => Self::field_ref(r),
            METHOD_REF_TAG => Self::method_ref(r),
            INTERFACE_METHOD_REF_TAG => Self::interface_method_ref(r),
            NAME_AND_TYPE_TAG => Self::name_and_type(r),
            METHOD_HANDLE_TAG => Self::method_handle(r),
            METHOD_TYPE_TAG => Self::method_type(r),
            DYNAMIC_TAG => Self::dynamic(r),
            INVOKE_DYNAMIC_TAG => Self::invoke_dynamic(r),
            MODULE_TAG => Self::module(r),
            PACKAGE_TAG => Self::package(r),
            _ => {
                return Err(ParseError::malformed(format!(
                    "invalid constant pool tag {tag} at index {index}"
                )));
            }
        };

        info.map_err(|err| truncated(err, format!("in constant pool entry {index} (tag {tag})")))
    }

    /// The tag byte this entry was decoded from.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Utf8(_) => UTF8_TAG,
            Self::Integer(_) => INTEGER_TAG,
            Self::Float(_) => FLOAT_TAG,
            Self::Long(_) => LONG_TAG,
            Self::Double(_) => DOUBLE_TAG,
            Self::Class { .. } => CLASS_TAG,
            Self::String { .. } => STRING_TAG,
            Self::FieldRef { .. } => FIELD_REF_TAG,
            Self::MethodRef { .. } => METHOD_REF_TAG,
            Self::InterfaceMethodRef { .. } => INTERFACE_METHOD_REF_TAG,
            Self::NameAndType { .. } => NAME_AND_TYPE_TAG,
            Self::MethodHandle { .. } => METHOD_HANDLE_TAG,
            Self::MethodType { .. } => METHOD_TYPE_TAG,
            Self::Dynamic { .. } => DYNAMIC_TAG,
            Self::InvokeDynamic { .. } => INVOKE_DYNAMIC_TAG,
            Self::Module { .. } => MODULE_TAG,
            Self::Package { .. } => PACKAGE_TAG,
        }
    }

    pub fn as_utf8(&self) -> Option<&str> {
        match self {
            Self::Utf8(value) => Some(value),
            _ => None,
        }
    }

    /// Pool slots taken by this entry, longs and doubles take two.
    pub fn slots(&self) -> usize {
        match self {
            Self::Long(_) | Self::Double(_) => 2,
            _ => 1,
        }
    }

    /// Class files store text as modified UTF-8: NUL is `C0 80` and
    /// characters outside the BMP are surrogate pairs of three bytes each.
    fn utf8<R: Read>(r: &mut ByteCursor<R>, index: usize) -> Result<Self> {
        let length = r.read_u16_be()?;
        let bytes = r.read_exact(length.into())?;
        let value = cesu8::from_java_cesu8(&bytes).map_err(|err| {
            ParseError::malformed(format!(
                "constant pool entry {index} is not valid modified utf-8: {err}"
            ))
        })?;
        Ok(Self::Utf8(value.into_owned()))
    }

    fn class<R: Read>(r: &mut ByteCursor<R>) -> Result<Self> {
        Ok(Self::Class {
            name_index: r.read_u16_be()?.into(),
        })
    }

    fn string<R: Read>(r: &mut ByteCursor<R>) -> Result<Self> {
        Ok(Self::String {
            string_index: r.read_u16_be()?.into(),
        })
    }

    fn field_ref<R: Read>(r: &mut ByteCursor<R>) -> Result<Self> {
        Ok(Self::FieldRef {
            class_index: r.read_u16_be()?.into(),
            name_and_type_index: r.read_u16_be()?.into(),
        })
    }

    fn method_ref<R: Read>(r: &mut ByteCursor<R>) -> Result<Self> {
        Ok(Self::MethodRef {
            class_index: r.read_u16_be()?.into(),
            name_and_type_index: r.read_u16_be()?.into(),
        })
    }

    fn interface_method_ref<R: Read>(r: &mut ByteCursor<R>) -> Result<Self> {
        Ok(Self::InterfaceMethodRef {
            class_index: r.read_u16_be()?.into(),
            name_and_type_index: r.read_u16_be()?.into(),
        })
    }

    fn name_and_type<R: Read>(r: &mut ByteCursor<R>) -> Result<Self> {
        Ok(Self::NameAndType {
            name_index: r.read_u16_be()?.into(),
            descriptor_index: r.read_u16_be()?.into(),
        })
    }

    fn method_handle<R: Read>(r: &mut ByteCursor<R>) -> Result<Self> {
        Ok(Self::MethodHandle {
            reference_kind: r.read_u8()?,
            reference_index: r.read_u16_be()?.into(),
        })
    }

    fn method_type<R: Read>(r: &mut ByteCursor<R>) -> Result<Self> {
        Ok(Self::MethodType {
            descriptor_index: r.read_u16_be()?.into(),
        })
    }

    fn dynamic<R: Read>(r: &mut ByteCursor<R>) -> Result<Self> {
        Ok(Self::Dynamic {
            bootstrap_method_attr_index: r.read_u16_be()?,
            name_and_type_index: r.read_u16_be()?.into(),
        })
    }

    fn invoke_dynamic<R: Read>(r: &mut ByteCursor<R>) -> Result<Self> {
        Ok(Self::InvokeDynamic {
            bootstrap_method_attr_index: r.read_u16_be()?,
            name_and_type_index: r.read_u16_be()?.into(),
        })
    }

    fn module<R: Read>(r: &mut ByteCursor<R>) -> Result<Self> {
        Ok(Self::Module {
            name_index: r.read_u16_be()?.into(),
        })
    }

    fn package<R: Read>(r: &mut ByteCursor<R>) -> Result<Self> {
        Ok(Self::Package {
            name_index: r.read_u16_be()?.into(),
        })
    }
}

/// End of input inside the pool is a format error, the count promised more
/// entries than the file holds.
fn truncated(err: ParseError, context: String) -> ParseError {
    if err.is_unexpected_end() {
        ParseError::malformed(format!("unexpected end of input, {context}"))
    } else {
        err
    }
}
