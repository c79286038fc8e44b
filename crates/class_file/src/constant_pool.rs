use crate::{class_file::ConstantValue, error::ConstantPoolError};

macro_rules! matches_cp_info {
    ($cp:expr, $index:expr, $i:ident) => {
        match $cp.get($index)? {
            $crate::constant_pool::CpInfo::$i(ref n) => Ok(n),
            c => Err($crate::error::ConstantPoolError::UnexpectedEntry {
                index: $index,
                expected: stringify!($i),
                found: c.kind(),
            }),
        }
    };
}

type Result<T, E = ConstantPoolError> = std::result::Result<T, E>;

/// The table of constants a class file refers to by 1-based index.
///
/// Only lives for the duration of a parse; nothing in the decoded model points back into it.
#[derive(Debug, Default)]
pub(crate) struct ConstantPool {
    cp_infos: Vec<CpInfo>,
}
impl ConstantPool {
    pub(crate) fn new(cp_infos: Vec<CpInfo>) -> Self {
        Self { cp_infos }
    }

    /// Number of logical slots, padding included.
    pub(crate) fn len(&self) -> usize {
        self.cp_infos.len()
    }

    pub(crate) fn get(&self, index: u16) -> Result<&CpInfo> {
        let slot = index
            .checked_sub(1)
            .and_then(|i| self.cp_infos.get(i as usize));

        match slot {
            None => Err(ConstantPoolError::IndexOutOfRange(index)),
            Some(CpInfo::Unusable) => Err(ConstantPoolError::PaddingSlot(index)),
            Some(cp_info) => Ok(cp_info),
        }
    }

    pub(crate) fn utf8(&self, index: u16) -> Result<&str> {
        matches_cp_info!(self, index, Utf8).map(String::as_str)
    }

    /// Resolves a `Class` entry to the internal name it points at.
    pub(crate) fn class_name(&self, index: u16) -> Result<&str> {
        let ClassInfo { name_index } = matches_cp_info!(self, index, Class)?;
        self.utf8(*name_index)
    }

    /// Like [`class_name`](Self::class_name), with index 0 meaning "none".
    pub(crate) fn optional_class_name(&self, index: u16) -> Result<Option<&str>> {
        match index {
            0 => Ok(None),
            _ => self.class_name(index).map(Some),
        }
    }

    pub(crate) fn constant_value(&self, index: u16) -> Result<ConstantValue> {
        Ok(match self.get(index)? {
            CpInfo::Integer(i) => ConstantValue::Int(*i),
            CpInfo::Float(f) => ConstantValue::Float(*f),
            CpInfo::Long(l) => ConstantValue::Long(*l),
            CpInfo::Double(d) => ConstantValue::Double(*d),
            CpInfo::String { string_index } => {
                ConstantValue::String(self.utf8(*string_index)?.to_owned())
            }
            c => {
                return Err(ConstantPoolError::UnexpectedEntry {
                    index,
                    expected: "constant value",
                    found: c.kind(),
                })
            }
        })
    }
}

#[derive(Debug, PartialEq, Clone)]
pub(crate) enum CpInfo {
    MethodRef(RefInfo),
    FieldRef(RefInfo),
    Float(f32),
    InterfaceMethodRef(RefInfo),
    Class(ClassInfo),
    NameAndType(NameAndTypeInfo),
    Utf8(String),
    String { string_index: u16 },
    Dynamic(DynamicInfo),
    InvokeDynamic(DynamicInfo),
    Integer(i32),
    MethodHandle(MethodHandleInfo),
    MethodType(MethodTypeInfo),
    Long(i64),
    Double(f64),
    Module(NamedInfo),
    Package(NamedInfo),
    /// The slot following a `Long` or `Double`.
    Unusable,
}
impl CpInfo {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            CpInfo::MethodRef(_) => "MethodRef",
            CpInfo::FieldRef(_) => "FieldRef",
            CpInfo::Float(_) => "Float",
            CpInfo::InterfaceMethodRef(_) => "InterfaceMethodRef",
            CpInfo::Class(_) => "Class",
            CpInfo::NameAndType(_) => "NameAndType",
            CpInfo::Utf8(_) => "Utf8",
            CpInfo::String { .. } => "String",
            CpInfo::Dynamic(_) => "Dynamic",
            CpInfo::InvokeDynamic(_) => "InvokeDynamic",
            CpInfo::Integer(_) => "Integer",
            CpInfo::MethodHandle(_) => "MethodHandle",
            CpInfo::MethodType(_) => "MethodType",
            CpInfo::Long(_) => "Long",
            CpInfo::Double(_) => "Double",
            CpInfo::Module(_) => "Module",
            CpInfo::Package(_) => "Package",
            CpInfo::Unusable => "Unusable",
        }
    }

    /// Long and double constants take up two slots.
    pub(crate) fn is_wide(&self) -> bool {
        matches!(self, CpInfo::Long(_) | CpInfo::Double(_))
    }
}

#[derive(Debug, PartialEq, Clone)]
pub(crate) struct RefInfo {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub(crate) struct ClassInfo {
    pub name_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub(crate) struct NameAndTypeInfo {
    pub name_index: u16,
    pub descriptor_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub(crate) struct DynamicInfo {
    pub bootstrap_method_attr_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub(crate) struct MethodHandleInfo {
    pub reference_kind: u8,
    pub reference_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub(crate) struct MethodTypeInfo {
    pub descriptor_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub(crate) struct NamedInfo {
    pub name_index: u16,
}

/// Decodes the JVM's modified UTF-8.
///
/// NUL arrives as `C0 80` and characters outside the BMP as two encoded surrogates, so the
/// bytes are rebuilt as UTF-16 code units first. Returns `None` on any malformed sequence.
pub(crate) fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    if bytes.iter().all(|b| (0x01..0x80).contains(b)) {
        return String::from_utf8(bytes.to_vec()).ok();
    }

    let continuation = |i: usize| match bytes.get(i) {
        Some(b @ 0x80..=0xBF) => Some((b & 0x3F) as u16),
        _ => None,
    };

    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let a = bytes[i];
        match a {
            0x01..=0x7F => {
                units.push(a as u16);
                i += 1;
            }
            0xC0..=0xDF => {
                let b = continuation(i + 1)?;
                units.push(((a & 0x1F) as u16) << 6 | b);
                i += 2;
            }
            0xE0..=0xEF => {
                let b = continuation(i + 1)?;
                let c = continuation(i + 2)?;
                units.push(((a & 0x0F) as u16) << 12 | b << 6 | c);
                i += 3;
            }
            _ => return None,
        }
    }

    String::from_utf16(&units).ok()
}
