// https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html

mod access_flags;
pub mod attributes;
mod class_file;
#[macro_use]
mod constant_pool;
pub mod descriptor;
mod error;
mod parser;

use std::io::Read;

pub use self::class_file::{ClassFile, ConstantValue, Field, Method, Version};
pub use access_flags::AccessFlags;
pub use attributes::{Attribute, Code, ExceptionHandler, LocalVariable};
pub use error::{ClassFileError, ConstantPoolError};
pub use parser::Parser;

pub type Result<T, E = ClassFileError> = std::result::Result<T, E>;

/// Decodes a single class file from `r`.
///
/// Either the whole class decodes or an error is returned; the reader is left wherever
/// decoding stopped.
pub fn parse(r: impl Read) -> Result<ClassFile> {
    Parser::new(r).parse()
}
