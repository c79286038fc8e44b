use std::{fmt, ops::Range};

use crate::descriptor;

/// An attribute the decoder does not interpret, kept as its name and raw payload.
#[derive(Clone, PartialEq, Eq)]
pub struct Attribute {
    name: String,
    info: Vec<u8>,
}
impl Attribute {
    pub(crate) fn new(name: String, info: Vec<u8>) -> Self {
        Self { name, info }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn info(&self) -> &[u8] {
        &self.info
    }
}
impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("info", &format!("({} bytes)", self.info.len()))
            .finish()
    }
}

pub(crate) fn find_by_name<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
    attributes.iter().find(|a| a.name == name)
}

/// The body of a method: its bytecode plus the tables describing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    max_stack: u16,
    max_locals: u16,
    code: Vec<u8>,
    exception_handlers: Vec<ExceptionHandler>,
    local_variables: Vec<LocalVariable>,
    attributes: Vec<Attribute>,
}
impl Code {
    /// Local variables are stored ordered by slot, whatever order they were declared in.
    pub(crate) fn new(
        max_stack: u16,
        max_locals: u16,
        code: Vec<u8>,
        exception_handlers: Vec<ExceptionHandler>,
        mut local_variables: Vec<LocalVariable>,
        attributes: Vec<Attribute>,
    ) -> Self {
        local_variables.sort_by_key(|v| v.index);

        Self {
            max_stack,
            max_locals,
            code,
            exception_handlers,
            local_variables,
            attributes,
        }
    }

    pub fn max_stack(&self) -> u16 {
        self.max_stack
    }

    pub fn max_locals(&self) -> u16 {
        self.max_locals
    }

    /// The raw bytecode. Never decoded into instructions.
    pub fn bytecode(&self) -> &[u8] {
        &self.code
    }

    /// Handlers in the order they were declared, which is the order the JVM tries them in.
    pub fn exception_handlers(&self) -> &[ExceptionHandler] {
        &self.exception_handlers
    }

    /// Entries of every `LocalVariableTable`, sorted ascending by slot.
    pub fn local_variables(&self) -> &[LocalVariable] {
        &self.local_variables
    }

    /// The variable occupying `slot` at program counter `pc`, if the table names one.
    pub fn local_variable_at(&self, slot: u16, pc: u32) -> Option<&LocalVariable> {
        self.local_variables
            .iter()
            .find(|v| v.index == slot && v.is_live_at(pc))
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        find_by_name(&self.attributes, name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionHandler {
    start_pc: u16,
    end_pc: u16,
    handler_pc: u16,
    catch_type: Option<String>,
}
impl ExceptionHandler {
    pub(crate) fn new(start_pc: u16, end_pc: u16, handler_pc: u16, catch_type: Option<String>) -> Self {
        Self {
            start_pc,
            end_pc,
            handler_pc,
            catch_type,
        }
    }

    pub fn start_pc(&self) -> u16 {
        self.start_pc
    }

    /// Exclusive.
    pub fn end_pc(&self) -> u16 {
        self.end_pc
    }

    pub fn handler_pc(&self) -> u16 {
        self.handler_pc
    }

    /// Internal name of the caught class; `None` for `finally` and other catch-all handlers.
    pub fn catch_type(&self) -> Option<&str> {
        self.catch_type.as_deref()
    }

    pub fn catch_type_name(&self) -> Option<String> {
        self.catch_type().map(descriptor::class_type_name)
    }

    pub fn is_catch_all(&self) -> bool {
        self.catch_type.is_none()
    }

    pub fn covers(&self, pc: u16) -> bool {
        (self.start_pc..self.end_pc).contains(&pc)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariable {
    start_pc: u16,
    length: u16,
    index: u16,
    name: String,
    descriptor: String,
}
impl LocalVariable {
    pub(crate) fn new(start_pc: u16, length: u16, index: u16, name: String, descriptor: String) -> Self {
        Self {
            start_pc,
            length,
            index,
            name,
            descriptor,
        }
    }

    pub fn start_pc(&self) -> u16 {
        self.start_pc
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    /// The slot in the frame's local variable array.
    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn type_name(&self) -> String {
        descriptor::type_name(&self.descriptor)
    }

    /// Program counters at which the variable holds a value, `[start_pc, start_pc + length)`.
    pub fn pc_range(&self) -> Range<u32> {
        let start = self.start_pc as u32;
        start..start + self.length as u32
    }

    pub fn is_live_at(&self, pc: u32) -> bool {
        self.pc_range().contains(&pc)
    }
}
