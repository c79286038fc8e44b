use std::{collections::BTreeSet, fmt, io::Read};

use crate::{
    attributes::{find_by_name, Attribute, Code},
    descriptor,
    parser::Parser,
    AccessFlags, Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
}
impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A decoded class or interface.
///
/// Every name has already been resolved out of the constant pool, which is not kept.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    version: Version,
    access_flags: AccessFlags,
    this_class: String,
    super_class: Option<String>,
    interfaces: Vec<String>,
    fields: Vec<Field>,
    methods: Vec<Method>,
    attributes: Vec<Attribute>,
    source_file: Option<String>,
    deprecated: bool,
}
impl ClassFile {
    pub fn parse(bytes: impl Read) -> Result<ClassFile> {
        Parser::new(bytes).parse()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        version: Version,
        access_flags: AccessFlags,
        this_class: String,
        super_class: Option<String>,
        interfaces: Vec<String>,
        fields: Vec<Field>,
        methods: Vec<Method>,
        attributes: Vec<Attribute>,
        source_file: Option<String>,
        deprecated: bool,
    ) -> Self {
        Self {
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
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn access_flags(&self) -> AccessFlags {
        self.access_flags
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags.contains(AccessFlags::INTERFACE)
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags.contains(AccessFlags::ABSTRACT)
    }

    pub fn is_enum(&self) -> bool {
        self.access_flags.contains(AccessFlags::ENUM)
    }

    /// Internal name of this class, e.g. `java/lang/String`.
    pub fn class_name(&self) -> &str {
        &self.this_class
    }

    /// This class as a Java type name, e.g. `java.lang.String`.
    pub fn display_name(&self) -> String {
        descriptor::class_type_name(&self.this_class)
    }

    pub fn simple_name(&self) -> &str {
        descriptor::simple_name(&self.this_class)
    }

    /// Internal name of the direct superclass.
    ///
    /// Only `java/lang/Object` and `module-info` have none.
    pub fn super_class(&self) -> Option<&str> {
        self.super_class.as_deref()
    }

    pub fn super_type(&self) -> Option<String> {
        self.super_class().map(descriptor::class_type_name)
    }

    /// Internal names of the direct superinterfaces, in declaration order.
    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    pub fn interface_types(&self) -> Vec<String> {
        self.interfaces
            .iter()
            .map(|i| descriptor::class_type_name(i))
            .collect()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// The first method called `name`; use [`methods`](Self::methods) to see overloads.
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn constructors(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter().filter(|m| m.is_constructor())
    }

    /// Everything but constructors and the static initializer, ordered by name then
    /// descriptor.
    pub fn sorted_methods(&self) -> Vec<&Method> {
        let mut methods = self
            .methods
            .iter()
            .filter(|m| !m.is_constructor() && !m.is_static_initializer())
            .collect::<Vec<_>>();
        methods.sort_by(|a, b| (&a.name, &a.descriptor).cmp(&(&b.name, &b.descriptor)));
        methods
    }

    /// Class-level attributes other than `SourceFile` and `Deprecated`.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        find_by_name(&self.attributes, name)
    }

    pub fn source_file(&self) -> Option<&str> {
        self.source_file.as_deref()
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// Internal names of every other class this one mentions through its super class,
    /// interfaces, member signatures, thrown and caught exceptions and local variables.
    pub fn referenced_classes(&self) -> BTreeSet<&str> {
        let mut classes = BTreeSet::new();
        classes.extend(self.super_class());
        classes.extend(self.interfaces.iter().map(String::as_str));

        for field in &self.fields {
            classes.extend(descriptor::referenced_class(&field.descriptor));
        }

        for method in &self.methods {
            classes.extend(
                descriptor::parameter_descriptors(&method.descriptor)
                    .filter_map(descriptor::referenced_class),
            );
            if let Some((_, ret)) = method.descriptor.split_once(')') {
                classes.extend(descriptor::referenced_class(ret));
            }
            classes.extend(method.exceptions.iter().map(String::as_str));

            if let Some(code) = &method.code {
                classes.extend(code.exception_handlers().iter().filter_map(|h| h.catch_type()));
                classes.extend(
                    code.local_variables()
                        .iter()
                        .filter_map(|v| descriptor::referenced_class(v.descriptor())),
                );
            }
        }

        classes.remove(self.this_class.as_str());
        classes
    }
}

/// The value of a `ConstantValue` attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Int(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    String(String),
}
impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Int(i) => write!(f, "{}", i),
            ConstantValue::Float(v) => write!(f, "{}f", v),
            ConstantValue::Long(l) => write!(f, "{}L", l),
            ConstantValue::Double(d) => write!(f, "{}d", d),
            ConstantValue::String(s) => write!(f, "{:?}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    access_flags: AccessFlags,
    name: String,
    descriptor: String,
    constant_value: Option<ConstantValue>,
    synthetic: bool,
    deprecated: bool,
    attributes: Vec<Attribute>,
}
impl Field {
    pub(crate) fn new(
        access_flags: AccessFlags,
        name: String,
        descriptor: String,
        constant_value: Option<ConstantValue>,
        synthetic: bool,
        deprecated: bool,
        attributes: Vec<Attribute>,
    ) -> Self {
        Self {
            access_flags,
            name,
            descriptor,
            constant_value,
            synthetic,
            deprecated,
            attributes,
        }
    }

    pub fn access_flags(&self) -> AccessFlags {
        self.access_flags
    }

    pub fn is_static(&self) -> bool {
        self.access_flags.contains(AccessFlags::STATIC)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn field_type(&self) -> String {
        descriptor::type_name(&self.descriptor)
    }

    pub fn constant_value(&self) -> Option<&ConstantValue> {
        self.constant_value.as_ref()
    }

    /// Marked synthetic either by attribute or by access flag.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic || self.access_flags.contains(AccessFlags::SYNTHETIC)
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// Attributes other than `ConstantValue`, `Synthetic` and `Deprecated`.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        find_by_name(&self.attributes, name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    access_flags: AccessFlags,
    name: String,
    descriptor: String,
    exceptions: Vec<String>,
    code: Option<Code>,
    synthetic: bool,
    deprecated: bool,
    attributes: Vec<Attribute>,
    owner: String,
}
impl Method {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        access_flags: AccessFlags,
        name: String,
        descriptor: String,
        exceptions: Vec<String>,
        code: Option<Code>,
        synthetic: bool,
        deprecated: bool,
        attributes: Vec<Attribute>,
        owner: String,
    ) -> Self {
        Self {
            access_flags,
            name,
            descriptor,
            exceptions,
            code,
            synthetic,
            deprecated,
            attributes,
            owner,
        }
    }

    pub fn access_flags(&self) -> AccessFlags {
        self.access_flags
    }

    pub fn is_static(&self) -> bool {
        self.access_flags.contains(AccessFlags::STATIC)
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags.contains(AccessFlags::ABSTRACT)
    }

    pub fn is_native(&self) -> bool {
        self.access_flags.contains(AccessFlags::NATIVE)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    pub fn is_static_initializer(&self) -> bool {
        self.name == "<clinit>"
    }

    /// The name as it reads in source: constructors take the simple name of their class.
    pub fn display_name(&self) -> &str {
        match self.is_constructor() {
            true => descriptor::simple_name(&self.owner),
            false => &self.name,
        }
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn parameter_types(&self) -> Vec<String> {
        descriptor::parameter_types(&self.descriptor)
    }

    pub fn return_type(&self) -> String {
        descriptor::return_type(&self.descriptor)
    }

    /// Internal names from the `Exceptions` attribute.
    pub fn exceptions(&self) -> &[String] {
        &self.exceptions
    }

    pub fn exception_types(&self) -> Vec<String> {
        self.exceptions
            .iter()
            .map(|e| descriptor::class_type_name(e))
            .collect()
    }

    /// `None` for abstract and native methods.
    pub fn code(&self) -> Option<&Code> {
        self.code.as_ref()
    }

    /// Source names of the parameters, where the local variable table records them.
    ///
    /// Slot 0 holds `this` for instance methods, and `long`/`double` parameters take two slots.
    pub fn parameter_names(&self) -> Vec<Option<&str>> {
        let mut slot = match self.is_static() {
            true => 0,
            false => 1,
        };

        descriptor::parameter_descriptors(&self.descriptor)
            .map(|param| {
                let name = self
                    .code
                    .as_ref()
                    .and_then(|code| code.local_variable_at(slot, 0))
                    .map(|v| v.name());
                slot += if descriptor::is_wide(param) { 2 } else { 1 };
                name
            })
            .collect()
    }

    /// Marked synthetic either by attribute or by access flag.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic || self.access_flags.contains(AccessFlags::SYNTHETIC)
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// Attributes other than `Code`, `Exceptions`, `Synthetic` and `Deprecated`.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        find_by_name(&self.attributes, name)
    }
}
