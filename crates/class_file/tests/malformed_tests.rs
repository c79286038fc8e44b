mod common;

use classpeek_class_file::{ClassFile, ClassFileError, ConstantPoolError, ConstantValue};

use common::{u2s, ClassBytes};

const FOO: &[u8] = include_bytes!("classes/Foo.class");

fn parse(bytes: &[u8]) -> ClassFile {
    common::init_logger();
    classpeek_class_file::parse(bytes).unwrap()
}

fn parse_err(bytes: &[u8]) -> ClassFileError {
    common::init_logger();
    classpeek_class_file::parse(bytes).unwrap_err()
}

fn constant_pool_error(bytes: &[u8]) -> ConstantPoolError {
    match parse_err(bytes) {
        ClassFileError::MalformedConstantPool(e) => e,
        e => panic!("unexpected error: {:?}", e),
    }
}

fn malformed_attribute(bytes: &[u8]) -> (String, &'static str) {
    match parse_err(bytes) {
        ClassFileError::MalformedAttribute(name, reason) => (name, reason),
        e => panic!("unexpected error: {:?}", e),
    }
}

/// Pool entries for a class `Bar extends java.lang.Object`, with flags, names and an empty
/// interface list already written to the body.
fn bar(c: &mut ClassBytes) -> &mut ClassBytes {
    let this = c.class("Bar");
    let object = c.class("java/lang/Object");
    c.u2(0x21).u2(this).u2(object).u2(0)
}

fn code_info(bytecode: &[u8], handlers: &[u16], attributes: &[(u16, &[u8])]) -> Vec<u8> {
    let mut info = u2s(&[2, 1]);
    info.extend_from_slice(&(bytecode.len() as u32).to_be_bytes());
    info.extend_from_slice(bytecode);
    info.extend(u2s(&[(handlers.len() / 4) as u16]));
    info.extend(u2s(handlers));
    info.extend(u2s(&[attributes.len() as u16]));
    for (name_index, payload) in attributes {
        info.extend(u2s(&[*name_index]));
        info.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        info.extend_from_slice(payload);
    }
    info
}

#[test]
fn test_not_a_class_file() {
    assert!(matches!(
        parse_err(b"PK\x03\x04\x14\x00"),
        ClassFileError::NotAClassFile(0x504B0304)
    ));
    assert!(matches!(
        parse_err(&[0xCA, 0x00]),
        ClassFileError::NotAClassFile(0xCA000000)
    ));
}

#[test]
fn test_short_magic_is_truncated() {
    assert!(matches!(parse_err(&[]), ClassFileError::TruncatedInput));
    assert!(matches!(parse_err(&[0xCA, 0xFE]), ClassFileError::TruncatedInput));
}

#[test]
fn test_every_prefix_is_truncated() {
    for len in 4..FOO.len() {
        let e = parse_err(&FOO[..len]);
        assert!(
            matches!(e, ClassFileError::TruncatedInput),
            "prefix of {} bytes: {:?}",
            len,
            e
        );
    }
}

#[test]
fn test_unknown_tag() {
    let mut bytes = FOO.to_vec();
    bytes[10] = 2;

    assert_eq!(
        ConstantPoolError::UnknownTag { index: 1, tag: 2 },
        constant_pool_error(&bytes)
    );
}

#[test]
fn test_this_class_out_of_range() {
    let mut bytes = FOO.to_vec();
    bytes[0x99..0x9B].copy_from_slice(&[0x00, 0x40]);

    assert_eq!(
        ConstantPoolError::IndexOutOfRange(0x40),
        constant_pool_error(&bytes)
    );
}

#[test]
fn test_source_file_length_mismatch() {
    let length_at = FOO.len() - 6;

    let mut longer = FOO.to_vec();
    longer[length_at..length_at + 4].copy_from_slice(&3u32.to_be_bytes());
    longer.push(0);
    assert_eq!(
        ("SourceFile".to_owned(), "declared length is longer than its contents"),
        malformed_attribute(&longer)
    );

    let mut shorter = FOO.to_vec();
    shorter[length_at..length_at + 4].copy_from_slice(&1u32.to_be_bytes());
    assert_eq!(
        ("SourceFile".to_owned(), "contents run past the declared length"),
        malformed_attribute(&shorter)
    );
}

#[test]
fn test_huge_attribute_length_is_truncated() {
    let mut c = ClassBytes::new();
    let custom = c.utf8("Custom");
    bar(&mut c).u2(0).u2(0).u2(1).u2(custom).u4(u32::MAX).bytes(&[1, 2]);

    assert!(matches!(parse_err(&c.build()), ClassFileError::TruncatedInput));
}

#[test]
fn test_padding_slot() {
    let mut c = ClassBytes::new();
    let big = c.long(7);
    let object = c.class("java/lang/Object");
    c.u2(0x21).u2(big + 1).u2(object).u2(0);

    assert_eq!(
        ConstantPoolError::PaddingSlot(big + 1),
        constant_pool_error(&c.build())
    );
}

#[test]
fn test_entries_after_wide_constants() {
    let mut c = ClassBytes::new();
    let big = c.double(1.5);
    let name = c.string("after");
    let value = c.utf8("NAME");
    let string = c.utf8("Ljava/lang/String;");
    let cv = c.utf8("ConstantValue");
    bar(&mut c)
        .u2(1)
        .u2(0x18)
        .u2(value)
        .u2(string)
        .u2(1)
        .attribute(cv, &u2s(&[name]))
        .u2(0)
        .u2(0);

    assert_eq!(1, big);
    assert_eq!(4, name);

    let class_file = parse(&c.build());
    assert_eq!("Bar", class_file.class_name());
    assert_eq!(
        Some(&ConstantValue::String("after".to_owned())),
        class_file.fields()[0].constant_value()
    );
}

#[test]
fn test_wide_constant_at_end_of_pool() {
    let mut c = ClassBytes::new();
    bar(&mut c).u2(0).u2(0).u2(0);
    c.long(-1);

    assert_eq!("Bar", parse(&c.build()).class_name());
}

#[test]
fn test_constant_value_of_wrong_kind() {
    let mut c = ClassBytes::new();
    let value = c.utf8("X");
    let int = c.utf8("I");
    let cv = c.utf8("ConstantValue");
    bar(&mut c)
        .u2(1)
        .u2(0x18)
        .u2(value)
        .u2(int)
        .u2(1)
        .attribute(cv, &u2s(&[value]))
        .u2(0)
        .u2(0);

    assert_eq!(
        ConstantPoolError::UnexpectedEntry {
            index: value,
            expected: "constant value",
            found: "Utf8",
        },
        constant_pool_error(&c.build())
    );
}

#[test]
fn test_invalid_utf8() {
    let mut c = ClassBytes::new();
    let bad = c.raw_utf8(&[b'a', 0xFF]);
    bar(&mut c).u2(0).u2(0).u2(0);

    assert_eq!(ConstantPoolError::InvalidUtf8(bad), constant_pool_error(&c.build()));
}

#[test]
fn test_no_super_class() {
    let mut c = ClassBytes::new();
    let this = c.class("java/lang/Object");
    c.u2(0x21).u2(this).u2(0).u2(0).u2(0).u2(0).u2(0);

    let class_file = parse(&c.build());
    assert_eq!(None, class_file.super_class());
    assert!(class_file.referenced_classes().is_empty());
}

#[test]
fn test_unknown_attributes_kept_verbatim() {
    let mut c = ClassBytes::new();
    let custom = c.utf8("Custom");
    let code = c.utf8("Code");
    let field_name = c.utf8("f");
    let int = c.utf8("I");
    let method_name = c.utf8("run");
    let void = c.utf8("()V");
    bar(&mut c)
        .u2(1)
        .u2(0x2)
        .u2(field_name)
        .u2(int)
        .u2(1)
        .attribute(custom, &[1])
        .u2(1)
        .u2(0x1)
        .u2(method_name)
        .u2(void)
        .u2(2)
        .attribute(code, &code_info(&[0xB1], &[], &[(custom, &[3, 3][..])]))
        .attribute(custom, &[2, 2])
        .u2(1)
        .attribute(custom, &[]);

    let class_file = parse(&c.build());
    assert_eq!(&[1], class_file.fields()[0].attribute("Custom").unwrap().info());

    let run = &class_file.methods()[0];
    assert_eq!(1, run.attributes().len());
    assert_eq!(&[2, 2], run.attribute("Custom").unwrap().info());

    let code = run.code().unwrap();
    assert_eq!(&[0xB1], code.bytecode());
    assert_eq!(2, code.max_stack());
    assert_eq!(&[3, 3], code.attribute("Custom").unwrap().info());

    assert!(class_file.attribute("Custom").unwrap().info().is_empty());
}

#[test]
fn test_flag_attributes_and_exceptions() {
    let mut c = ClassBytes::new();
    let synthetic = c.utf8("Synthetic");
    let deprecated = c.utf8("Deprecated");
    let exceptions = c.utf8("Exceptions");
    let io = c.class("java/io/IOException");
    let field_name = c.utf8("f");
    let int = c.utf8("I");
    let method_name = c.utf8("run");
    let void = c.utf8("()V");
    bar(&mut c)
        .u2(1)
        .u2(0)
        .u2(field_name)
        .u2(int)
        .u2(1)
        .attribute(synthetic, &[])
        .u2(1)
        .u2(0x401)
        .u2(method_name)
        .u2(void)
        .u2(3)
        .attribute(deprecated, &[])
        .attribute(exceptions, &u2s(&[1, io]))
        .attribute(synthetic, &[])
        .u2(0);

    let class_file = parse(&c.build());
    let field = &class_file.fields()[0];
    assert!(field.is_synthetic());
    assert!(!field.is_deprecated());
    assert!(field.attributes().is_empty());

    let run = &class_file.methods()[0];
    assert!(run.is_deprecated());
    assert!(run.is_synthetic());
    assert!(run.is_abstract());
    assert!(run.code().is_none());
    assert_eq!(vec!["java/io/IOException"], run.exceptions());
    assert!(run.attributes().is_empty());
    assert!(!class_file.is_deprecated());
}

#[test]
fn test_flag_attribute_with_payload() {
    let mut c = ClassBytes::new();
    let synthetic = c.utf8("Synthetic");
    let field_name = c.utf8("f");
    let int = c.utf8("I");
    bar(&mut c)
        .u2(1)
        .u2(0)
        .u2(field_name)
        .u2(int)
        .u2(1)
        .attribute(synthetic, &[0])
        .u2(0)
        .u2(0);

    assert_eq!(
        ("Synthetic".to_owned(), "declared length is longer than its contents"),
        malformed_attribute(&c.build())
    );
}

#[test]
fn test_exception_that_is_not_a_class() {
    let mut c = ClassBytes::new();
    let exceptions = c.utf8("Exceptions");
    let method_name = c.utf8("run");
    let void = c.utf8("()V");
    bar(&mut c)
        .u2(0)
        .u2(1)
        .u2(0x401)
        .u2(method_name)
        .u2(void)
        .u2(1)
        .attribute(exceptions, &u2s(&[1, void]))
        .u2(0);

    assert_eq!(
        ConstantPoolError::UnexpectedEntry {
            index: void,
            expected: "Class",
            found: "Utf8",
        },
        constant_pool_error(&c.build())
    );
}

#[test]
fn test_code_overruns_its_attribute() {
    let mut c = ClassBytes::new();
    let code = c.utf8("Code");
    let method_name = c.utf8("run");
    let void = c.utf8("()V");

    let mut info = u2s(&[1, 1]);
    info.extend_from_slice(&100u32.to_be_bytes());
    info.push(0xB1);

    bar(&mut c)
        .u2(0)
        .u2(1)
        .u2(0x1)
        .u2(method_name)
        .u2(void)
        .u2(1)
        .attribute(code, &info)
        .u2(0);

    assert_eq!(
        ("Code".to_owned(), "contents run past the declared length"),
        malformed_attribute(&c.build())
    );
}

#[test]
fn test_local_variable_table_length_mismatch() {
    let mut c = ClassBytes::new();
    let code = c.utf8("Code");
    let lvt = c.utf8("LocalVariableTable");
    let method_name = c.utf8("run");
    let void = c.utf8("()V");
    let this = c.utf8("this");
    let bar_type = c.utf8("LBar;");

    let mut table = u2s(&[1, 0, 1, this, bar_type, 0]);
    table.extend_from_slice(&[0, 0]);

    bar(&mut c)
        .u2(0)
        .u2(1)
        .u2(0x1)
        .u2(method_name)
        .u2(void)
        .u2(1)
        .attribute(code, &code_info(&[0xB1], &[], &[(lvt, &table[..])]))
        .u2(0);

    assert_eq!(
        (
            "LocalVariableTable".to_owned(),
            "declared length is longer than its contents"
        ),
        malformed_attribute(&c.build())
    );
}

#[test]
fn test_local_variable_tables_merged_and_sorted() {
    let mut c = ClassBytes::new();
    let code = c.utf8("Code");
    let lvt = c.utf8("LocalVariableTable");
    let method_name = c.utf8("run");
    let descriptor = c.utf8("(I)V");
    let this = c.utf8("this");
    let bar_type = c.utf8("LBar;");
    let a = c.utf8("a");
    let b = c.utf8("b");
    let int = c.utf8("I");
    let catch_type = c.class("java/lang/Exception");

    let first = u2s(&[1, 5, 1, b, int, 1]);
    let second = u2s(&[2, 0, 6, this, bar_type, 0, 0, 5, a, int, 1]);
    let bytecode = [0x1B, 0x3C, 0xB1, 0x4C, 0xB1, 0x00];

    bar(&mut c)
        .u2(0)
        .u2(1)
        .u2(0x1)
        .u2(method_name)
        .u2(descriptor)
        .u2(1)
        .attribute(
            code,
            &code_info(
                &bytecode,
                &[0, 3, 3, catch_type, 0, 3, 3, 0],
                &[(lvt, &first[..]), (lvt, &second[..])],
            ),
        )
        .u2(0);

    let class_file = parse(&c.build());
    let run = &class_file.methods()[0];
    let code = run.code().unwrap();

    let locals = code
        .local_variables()
        .iter()
        .map(|v| (v.index(), v.name()))
        .collect::<Vec<_>>();
    assert_eq!(vec![(0, "this"), (1, "b"), (1, "a")], locals);
    assert_eq!("a", code.local_variable_at(1, 0).unwrap().name());
    assert_eq!("b", code.local_variable_at(1, 5).unwrap().name());
    assert_eq!(vec![Some("a")], run.parameter_names());
    assert!(code.attribute("LocalVariableTable").is_none());

    let handlers = code.exception_handlers();
    assert_eq!(Some("java/lang/Exception"), handlers[0].catch_type());
    assert!(handlers[1].is_catch_all());
    assert_eq!(3, handlers[1].handler_pc());
}
