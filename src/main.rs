use std::{env, fs::File, io::BufReader, path::Path, process};

use classpeek_class_file::{AccessFlags, ClassFile, ClassFileError, Field, Method};

fn main() {
    pretty_env_logger::init();

    let paths = env::args().skip(1).collect::<Vec<_>>();
    if paths.is_empty() {
        eprintln!("usage: classpeek <file.class>...");
        process::exit(2);
    }

    let mut failed = 0;
    for path in &paths {
        match load(Path::new(path)) {
            Ok(class_file) => print_class(path, &class_file),
            Err(e) => {
                log::error!("{}: {}", path, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        log::warn!("{} of {} files could not be read", failed, paths.len());
        process::exit(1);
    }
}

fn load(path: &Path) -> Result<ClassFile, ClassFileError> {
    let file = File::open(path)?;
    classpeek_class_file::parse(BufReader::new(file))
}

fn print_class(path: &str, class_file: &ClassFile) {
    println!("{}:", path);
    println!("  version {}", class_file.version());
    if let Some(source_file) = class_file.source_file() {
        println!("  compiled from {}", source_file);
    }
    if class_file.is_deprecated() {
        println!("  @Deprecated");
    }

    let mut header = format!(
        "  {}{}",
        class_modifiers(class_file.access_flags()),
        class_file.display_name()
    );
    match class_file.super_type() {
        Some(super_type) if super_type != "java.lang.Object" => {
            header.push_str(&format!(" extends {}", super_type));
        }
        _ => {}
    }
    let interfaces = class_file.interface_types();
    if !interfaces.is_empty() {
        let keyword = match class_file.is_interface() {
            true => "extends",
            false => "implements",
        };
        header.push_str(&format!(" {} {}", keyword, interfaces.join(", ")));
    }
    println!("{}", header);

    if !class_file.fields().is_empty() {
        println!("  fields:");
        for field in class_file.fields() {
            println!("    {}", field_line(field));
        }
    }

    let methods = class_file
        .constructors()
        .chain(class_file.sorted_methods())
        .collect::<Vec<_>>();
    if !methods.is_empty() {
        println!("  methods:");
        for method in methods {
            println!("    {}", method_line(method));
        }
    }
    println!();
}

fn field_line(field: &Field) -> String {
    let mut line = format!(
        "{}{} {}",
        member_modifiers(field.access_flags(), FIELD_MODIFIERS),
        field.field_type(),
        field.name()
    );
    if let Some(value) = field.constant_value() {
        line.push_str(&format!(" = {}", value));
    }
    line
}

fn method_line(method: &Method) -> String {
    let parameters = method
        .parameter_types()
        .into_iter()
        .zip(method.parameter_names())
        .map(|(ty, name)| match name {
            Some(name) => format!("{} {}", ty, name),
            None => ty,
        })
        .collect::<Vec<_>>();

    let mut line = member_modifiers(method.access_flags(), METHOD_MODIFIERS);
    if !method.is_constructor() {
        line.push_str(&method.return_type());
        line.push(' ');
    }
    line.push_str(&format!("{}({})", method.display_name(), parameters.join(", ")));

    let exceptions = method.exception_types();
    if !exceptions.is_empty() {
        line.push_str(&format!(" throws {}", exceptions.join(", ")));
    }
    line
}

const FIELD_MODIFIERS: &[(AccessFlags, &str)] = &[
    (AccessFlags::PUBLIC, "public"),
    (AccessFlags::PRIVATE, "private"),
    (AccessFlags::PROTECTED, "protected"),
    (AccessFlags::STATIC, "static"),
    (AccessFlags::FINAL, "final"),
    (AccessFlags::VOLATILE, "volatile"),
    (AccessFlags::TRANSIENT, "transient"),
];

const METHOD_MODIFIERS: &[(AccessFlags, &str)] = &[
    (AccessFlags::PUBLIC, "public"),
    (AccessFlags::PRIVATE, "private"),
    (AccessFlags::PROTECTED, "protected"),
    (AccessFlags::STATIC, "static"),
    (AccessFlags::FINAL, "final"),
    (AccessFlags::SYNCHRONIZED, "synchronized"),
    (AccessFlags::NATIVE, "native"),
    (AccessFlags::ABSTRACT, "abstract"),
    (AccessFlags::STRICT, "strictfp"),
];

/// Source-order modifier keywords, each followed by a space.
fn member_modifiers(flags: AccessFlags, table: &[(AccessFlags, &str)]) -> String {
    table
        .iter()
        .filter(|(flag, _)| flags.contains(*flag))
        .map(|(_, keyword)| format!("{} ", keyword))
        .collect()
}

fn class_modifiers(flags: AccessFlags) -> String {
    let mut modifiers = String::new();
    if flags.contains(AccessFlags::PUBLIC) {
        modifiers.push_str("public ");
    }
    if flags.contains(AccessFlags::FINAL) {
        modifiers.push_str("final ");
    }

    let kind = if flags.contains(AccessFlags::ANNOTATION) {
        "@interface"
    } else if flags.contains(AccessFlags::INTERFACE) {
        "interface"
    } else if flags.contains(AccessFlags::ENUM) {
        "enum"
    } else if flags.contains(AccessFlags::MODULE) {
        "module"
    } else {
        if flags.contains(AccessFlags::ABSTRACT) {
            modifiers.push_str("abstract ");
        }
        "class"
    };
    modifiers.push_str(kind);
    modifiers.push(' ');
    modifiers
}
