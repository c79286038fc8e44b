use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt};
use log::{debug, trace, warn};

use crate::{
    attributes::{Attribute, Code, ExceptionHandler, LocalVariable},
    class_file::{Field, Method, Version},
    constant_pool::{
        decode_modified_utf8, ClassInfo, ConstantPool, CpInfo, DynamicInfo, MethodHandleInfo,
        MethodTypeInfo, NameAndTypeInfo, NamedInfo, RefInfo,
    },
    error::ConstantPoolError,
    AccessFlags, ClassFile, ClassFileError,
};

type Result<T, E = ClassFileError> = std::result::Result<T, E>;
type Endian = BigEndian;

const MAGIC_IDENTIFIER: u32 = 0xCAFEBABE;

/// Reads one class file from the front of a reader.
///
/// The reader is only ever read forward and is not buffered: nothing past the end of the
/// class file is consumed.
pub struct Parser<R> {
    r: R,
}
impl<R: Read> Parser<R> {
    pub fn new(r: R) -> Self {
        Self { r }
    }

    pub fn parse(&mut self) -> Result<ClassFile> {
        self.parse_magic_identifier()?;
        let version = self.parse_version()?;

        let constant_pool = self.parse_constant_pool()?;
        debug!(
            "Class file version {}, {} constant pool slots",
            version,
            constant_pool.len()
        );

        let access_flags = AccessFlags::from_bits_truncate(self.read_u16()?);
        let this_class = constant_pool.class_name(self.read_u16()?)?.to_owned();
        let super_class = constant_pool
            .optional_class_name(self.read_u16()?)?
            .map(str::to_owned);

        let interfaces = self.parse_class_names(&constant_pool)?;

        let fields_count = self.read_u16()?;
        let fields = (0..fields_count)
            .map(|_| self.parse_field_info(&constant_pool))
            .collect::<Result<Vec<_>>>()?;

        let methods_count = self.read_u16()?;
        let methods = (0..methods_count)
            .map(|_| self.parse_method_info(&constant_pool, &this_class))
            .collect::<Result<Vec<_>>>()?;

        let mut source_file = None;
        let mut deprecated = false;
        let mut attributes = vec![];
        let attributes_count = self.read_u16()?;
        for _ in 0..attributes_count {
            let (name, info) = self.parse_attribute(&constant_pool)?;
            match name {
                "SourceFile" => {
                    let index = parse_attribute_body(name, &info, |p| p.read_u16())?;
                    source_file = Some(constant_pool.utf8(index)?.to_owned());
                }
                "Deprecated" => {
                    parse_attribute_body(name, &info, |_| Ok(()))?;
                    deprecated = true;
                }
                _ => attributes.push(Attribute::new(name.to_owned(), info)),
            }
        }

        debug!(
            "Parsed {}: {} interfaces, {} fields, {} methods, {} other attributes",
            this_class,
            interfaces.len(),
            fields.len(),
            methods.len(),
            attributes.len()
        );

        Ok(ClassFile::new(
            version,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
            source_file,
            deprecated,
        ))
    }

    fn parse_field_info(&mut self, cp: &ConstantPool) -> Result<Field> {
        let access_flags = AccessFlags::from_bits_truncate(self.read_u16()?);
        let name = cp.utf8(self.read_u16()?)?.to_owned();
        let descriptor = cp.utf8(self.read_u16()?)?.to_owned();

        let mut constant_value = None;
        let mut synthetic = false;
        let mut deprecated = false;
        let mut attributes = vec![];
        let attributes_count = self.read_u16()?;
        for _ in 0..attributes_count {
            let (attribute_name, info) = self.parse_attribute(cp)?;
            match attribute_name {
                "ConstantValue" => {
                    if constant_value.is_some() {
                        warn!("Field {} has more than one ConstantValue", name);
                    }
                    let index = parse_attribute_body(attribute_name, &info, |p| p.read_u16())?;
                    constant_value = Some(cp.constant_value(index)?);
                }
                "Synthetic" => {
                    parse_attribute_body(attribute_name, &info, |_| Ok(()))?;
                    synthetic = true;
                }
                "Deprecated" => {
                    parse_attribute_body(attribute_name, &info, |_| Ok(()))?;
                    deprecated = true;
                }
                _ => attributes.push(Attribute::new(attribute_name.to_owned(), info)),
            }
        }

        trace!("Field {} {}", name, descriptor);

        Ok(Field::new(
            access_flags,
            name,
            descriptor,
            constant_value,
            synthetic,
            deprecated,
            attributes,
        ))
    }

    fn parse_method_info(&mut self, cp: &ConstantPool, owner: &str) -> Result<Method> {
        let access_flags = AccessFlags::from_bits_truncate(self.read_u16()?);
        let name = cp.utf8(self.read_u16()?)?.to_owned();
        let descriptor = cp.utf8(self.read_u16()?)?.to_owned();

        let mut code = None;
        let mut exceptions = vec![];
        let mut synthetic = false;
        let mut deprecated = false;
        let mut attributes = vec![];
        let attributes_count = self.read_u16()?;
        for _ in 0..attributes_count {
            let (attribute_name, info) = self.parse_attribute(cp)?;
            match attribute_name {
                "Code" => {
                    if code.is_some() {
                        warn!("Method {}{} has more than one Code attribute", name, descriptor);
                    }
                    code = Some(parse_attribute_body(attribute_name, &info, |p| {
                        p.parse_code_attribute(cp)
                    })?);
                }
                "Exceptions" => {
                    exceptions = parse_attribute_body(attribute_name, &info, |p| {
                        p.parse_class_names(cp)
                    })?;
                }
                "Synthetic" => {
                    parse_attribute_body(attribute_name, &info, |_| Ok(()))?;
                    synthetic = true;
                }
                "Deprecated" => {
                    parse_attribute_body(attribute_name, &info, |_| Ok(()))?;
                    deprecated = true;
                }
                _ => attributes.push(Attribute::new(attribute_name.to_owned(), info)),
            }
        }

        trace!(
            "Method {}{}: {} bytes of code",
            name,
            descriptor,
            code.as_ref().map_or(0, |c: &Code| c.bytecode().len())
        );

        Ok(Method::new(
            access_flags,
            name,
            descriptor,
            exceptions,
            code,
            synthetic,
            deprecated,
            attributes,
            owner.to_owned(),
        ))
    }

    /// A short stream is only truncated if what is there still looks like a class file.
    fn parse_magic_identifier(&mut self) -> Result<()> {
        let mut bytes = Vec::with_capacity(4);
        self.r.by_ref().take(4).read_to_end(&mut bytes)?;

        if !MAGIC_IDENTIFIER.to_be_bytes().starts_with(&bytes) {
            let mut magic_identifier = [0u8; 4];
            magic_identifier[..bytes.len()].copy_from_slice(&bytes);
            return Err(ClassFileError::NotAClassFile(u32::from_be_bytes(
                magic_identifier,
            )));
        }
        if bytes.len() < 4 {
            return Err(ClassFileError::TruncatedInput);
        }
        Ok(())
    }

    fn parse_version(&mut self) -> Result<Version> {
        let minor = self.read_u16()?;
        let major = self.read_u16()?;
        Ok(Version { major, minor })
    }

    pub(crate) fn parse_constant_pool(&mut self) -> Result<ConstantPool> {
        let constant_pool_count = self.read_u16()? as u32;

        let mut res = Vec::with_capacity(constant_pool_count as usize);
        let mut index = 1;
        while index < constant_pool_count {
            let cp_info = self.parse_cp_info(index as u16)?;
            trace!("#{} = {:?}", index, cp_info);

            let wide = cp_info.is_wide();
            res.push(cp_info);
            if wide && index + 1 < constant_pool_count {
                res.push(CpInfo::Unusable);
                index += 1;
            }
            index += 1;
        }

        Ok(ConstantPool::new(res))
    }

    fn parse_cp_info(&mut self, index: u16) -> Result<CpInfo> {
        let tag = self.read_u8()?;
        let cp_info = match tag {
            1 => self.parse_utf8(index)?,
            3 => CpInfo::Integer(self.read_i32()?),
            4 => CpInfo::Float(self.r.read_f32::<Endian>()?),
            5 => CpInfo::Long(self.r.read_i64::<Endian>()?),
            6 => CpInfo::Double(self.r.read_f64::<Endian>()?),
            7 => CpInfo::Class(ClassInfo {
                name_index: self.read_u16()?,
            }),
            8 => CpInfo::String {
                string_index: self.read_u16()?,
            },
            9 => CpInfo::FieldRef(self.parse_ref_info()?),
            10 => CpInfo::MethodRef(self.parse_ref_info()?),
            11 => CpInfo::InterfaceMethodRef(self.parse_ref_info()?),
            12 => CpInfo::NameAndType(NameAndTypeInfo {
                name_index: self.read_u16()?,
                descriptor_index: self.read_u16()?,
            }),
            15 => CpInfo::MethodHandle(MethodHandleInfo {
                reference_kind: self.read_u8()?,
                reference_index: self.read_u16()?,
            }),
            16 => CpInfo::MethodType(MethodTypeInfo {
                descriptor_index: self.read_u16()?,
            }),
            17 => CpInfo::Dynamic(self.parse_dynamic_info()?),
            18 => CpInfo::InvokeDynamic(self.parse_dynamic_info()?),
            19 => CpInfo::Module(NamedInfo {
                name_index: self.read_u16()?,
            }),
            20 => CpInfo::Package(NamedInfo {
                name_index: self.read_u16()?,
            }),
            _ => return Err(ConstantPoolError::UnknownTag { index, tag }.into()),
        };

        Ok(cp_info)
    }

    fn parse_utf8(&mut self, index: u16) -> Result<CpInfo> {
        let length = self.read_u16()?;
        let bytes = self.read_bytes(length as usize)?;

        let s = decode_modified_utf8(&bytes).ok_or(ConstantPoolError::InvalidUtf8(index))?;
        Ok(CpInfo::Utf8(s))
    }

    fn parse_ref_info(&mut self) -> Result<RefInfo> {
        let class_index = self.read_u16()?;
        let name_and_type_index = self.read_u16()?;

        Ok(RefInfo {
            class_index,
            name_and_type_index,
        })
    }

    fn parse_dynamic_info(&mut self) -> Result<DynamicInfo> {
        let bootstrap_method_attr_index = self.read_u16()?;
        let name_and_type_index = self.read_u16()?;

        Ok(DynamicInfo {
            bootstrap_method_attr_index,
            name_and_type_index,
        })
    }

    /// Reads an attribute's header and payload without interpreting the payload.
    fn parse_attribute<'cp>(&mut self, cp: &'cp ConstantPool) -> Result<(&'cp str, Vec<u8>)> {
        let attribute_name_index = self.read_u16()?;
        let attribute_length = self.read_u32()?;
        let name = cp.utf8(attribute_name_index)?;
        let info = self.read_bytes(attribute_length as usize)?;

        trace!("Attribute {} ({} bytes)", name, attribute_length);
        Ok((name, info))
    }

    fn parse_code_attribute(&mut self, cp: &ConstantPool) -> Result<Code> {
        let max_stack = self.read_u16()?;
        let max_locals = self.read_u16()?;
        let code_length = self.read_u32()?;
        let code = self.read_bytes(code_length as usize)?;

        let exception_table_length = self.read_u16()?;
        let exception_handlers = (0..exception_table_length)
            .map(|_| self.parse_exception_handler(cp))
            .collect::<Result<Vec<_>>>()?;

        let mut local_variables = vec![];
        let mut attributes = vec![];
        let attributes_count = self.read_u16()?;
        for _ in 0..attributes_count {
            let (name, info) = self.parse_attribute(cp)?;
            match name {
                "LocalVariableTable" => local_variables.extend(parse_attribute_body(
                    name,
                    &info,
                    |p| p.parse_local_variable_table(cp),
                )?),
                _ => attributes.push(Attribute::new(name.to_owned(), info)),
            }
        }

        Ok(Code::new(
            max_stack,
            max_locals,
            code,
            exception_handlers,
            local_variables,
            attributes,
        ))
    }

    fn parse_exception_handler(&mut self, cp: &ConstantPool) -> Result<ExceptionHandler> {
        let start_pc = self.read_u16()?;
        let end_pc = self.read_u16()?;
        let handler_pc = self.read_u16()?;
        let catch_type = cp.optional_class_name(self.read_u16()?)?.map(str::to_owned);

        Ok(ExceptionHandler::new(start_pc, end_pc, handler_pc, catch_type))
    }

    fn parse_local_variable_table(&mut self, cp: &ConstantPool) -> Result<Vec<LocalVariable>> {
        let local_variable_table_length = self.read_u16()?;
        (0..local_variable_table_length)
            .map(|_| self.parse_local_variable(cp))
            .collect()
    }

    fn parse_local_variable(&mut self, cp: &ConstantPool) -> Result<LocalVariable> {
        let start_pc = self.read_u16()?;
        let length = self.read_u16()?;
        let name = cp.utf8(self.read_u16()?)?.to_owned();
        let descriptor = cp.utf8(self.read_u16()?)?.to_owned();
        let index = self.read_u16()?;

        Ok(LocalVariable::new(start_pc, length, index, name, descriptor))
    }

    /// A `u2` count followed by that many `Class` indices, as in `interfaces` and
    /// `Exceptions`.
    fn parse_class_names(&mut self, cp: &ConstantPool) -> Result<Vec<String>> {
        let count = self.read_u16()?;

        let mut names = Vec::with_capacity(count as usize);
        for _ in 0..count {
            names.push(cp.class_name(self.read_u16()?)?.to_owned());
        }
        Ok(names)
    }

    /// Reads exactly `len` bytes, growing the buffer only as data actually arrives.
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.r.by_ref().take(len as u64).read_to_end(&mut bytes)?;

        if bytes.len() != len {
            return Err(ClassFileError::TruncatedInput);
        }
        Ok(bytes)
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(self.r.read_u32::<Endian>()?)
    }

    fn read_u16(&mut self) -> Result<u16> {
        Ok(self.r.read_u16::<Endian>()?)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.r.read_u8()?)
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(self.r.read_i32::<Endian>()?)
    }
}

/// Decodes an intercepted attribute's payload, which must be consumed exactly.
fn parse_attribute_body<'a, T>(
    name: &str,
    info: &'a [u8],
    f: impl FnOnce(&mut Parser<Cursor<&'a [u8]>>) -> Result<T>,
) -> Result<T> {
    let mut parser = Parser::new(Cursor::new(info));

    let value = f(&mut parser).map_err(|e| match e {
        ClassFileError::TruncatedInput => ClassFileError::MalformedAttribute(
            name.to_owned(),
            "contents run past the declared length",
        ),
        e => e,
    })?;

    if parser.r.position() != info.len() as u64 {
        return Err(ClassFileError::MalformedAttribute(
            name.to_owned(),
            "declared length is longer than its contents",
        ));
    }
    Ok(value)
}
