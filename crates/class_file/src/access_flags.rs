use bitflags::bitflags;

bitflags! {
    /// Modifier bits shared by classes, fields and methods.
    ///
    /// Several bits mean different things depending on where they appear, so they are
    /// declared twice under both names.
    pub struct AccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        /// Classes only.
        const SUPER = 0x0020;
        /// Methods only.
        const SYNCHRONIZED = 0x0020;
        /// Fields only.
        const VOLATILE = 0x0040;
        /// Methods only.
        const BRIDGE = 0x0040;
        /// Fields only.
        const TRANSIENT = 0x0080;
        /// Methods only.
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const MODULE = 0x8000;
    }
}
