use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassFileError {
    #[error("Not a class file, magic identifier: 0x{0:08X}")]
    NotAClassFile(u32),
    #[error("Input ended before a declared length was satisfied")]
    TruncatedInput,
    #[error(transparent)]
    IOError(io::Error),
    #[error("Malformed constant pool: {0}")]
    MalformedConstantPool(#[from] ConstantPoolError),
    #[error("Malformed {0} attribute: {1}")]
    MalformedAttribute(String, &'static str),
}

impl From<io::Error> for ClassFileError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => ClassFileError::TruncatedInput,
            _ => ClassFileError::IOError(e),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConstantPoolError {
    #[error("Invalid cp info tag {tag} at #{index}")]
    UnknownTag { index: u16, tag: u8 },
    #[error("Invalid modified UTF-8 at #{0}")]
    InvalidUtf8(u16),
    #[error("Index #{0} is out of range")]
    IndexOutOfRange(u16),
    #[error("Index #{0} is the unusable slot after a long or double")]
    PaddingSlot(u16),
    #[error("Expected {expected} at #{index}, found {found}")]
    UnexpectedEntry {
        index: u16,
        expected: &'static str,
        found: &'static str,
    },
}
