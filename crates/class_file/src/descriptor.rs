//! Conversion of JVM descriptors into the type names used in Java source.
//!
//! `Ljava/lang/String;` becomes `java.lang.String`, `[I` becomes `int[]`, and a method
//! descriptor such as `(J[Ljava/lang/Object;)V` splits into `["long", "java.lang.Object[]"]`
//! and `void`.

/// Translates a single field descriptor.
///
/// Anything that is not a well-formed descriptor is returned unchanged.
pub fn type_name(descriptor: &str) -> String {
    if let Some(component) = descriptor.strip_prefix('[') {
        return format!("{}[]", type_name(component));
    }

    if let Some(name) = descriptor
        .strip_prefix('L')
        .and_then(|d| d.strip_suffix(';'))
    {
        return class_type_name(name);
    }

    match primitive_name(descriptor) {
        Some(name) => name.to_owned(),
        None => descriptor.to_owned(),
    }
}

/// Converts an internal class name (`java/util/Map$Entry`) to its dotted form.
pub fn class_type_name(internal_name: &str) -> String {
    internal_name.replace('/', ".")
}

/// The name of a class without its package (`java/util/Map$Entry` gives `Map$Entry`).
pub fn simple_name(internal_name: &str) -> &str {
    internal_name
        .rsplit(|c: char| c == '/' || c == '.')
        .next()
        .unwrap_or(internal_name)
}

/// The translated parameter types of a method descriptor, left to right.
pub fn parameter_types(method_descriptor: &str) -> Vec<String> {
    parameter_descriptors(method_descriptor)
        .map(type_name)
        .collect()
}

/// The translated return type of a method descriptor.
pub fn return_type(method_descriptor: &str) -> String {
    match method_descriptor.split_once(')') {
        Some((_, ret)) => type_name(ret),
        None => type_name(method_descriptor),
    }
}

/// Splits the parameter list of a method descriptor into one raw descriptor per parameter.
///
/// Tokenizing stops at the first thing that is not a descriptor.
pub fn parameter_descriptors(method_descriptor: &str) -> ParameterDescriptors<'_> {
    let params = method_descriptor
        .strip_prefix('(')
        .and_then(|d| d.split_once(')'))
        .map(|(params, _)| params)
        .unwrap_or("");

    ParameterDescriptors { rest: params }
}

pub struct ParameterDescriptors<'a> {
    rest: &'a str,
}
impl<'a> Iterator for ParameterDescriptors<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let len = descriptor_len(self.rest)?;
        let (token, rest) = self.rest.split_at(len);
        self.rest = rest;
        Some(token)
    }
}

/// The internal name of the class a field descriptor mentions, arrays unwrapped.
pub fn referenced_class(descriptor: &str) -> Option<&str> {
    descriptor
        .trim_start_matches('[')
        .strip_prefix('L')
        .and_then(|d| d.strip_suffix(';'))
}

/// Whether a field descriptor occupies two local variable slots.
pub fn is_wide(descriptor: &str) -> bool {
    matches!(descriptor, "J" | "D")
}

/// Length of the leading `[*` primitive-or-reference token of `s`.
fn descriptor_len(s: &str) -> Option<usize> {
    let dims = s.len() - s.trim_start_matches('[').len();
    let element = &s[dims..];

    let element_len = match element.chars().next()? {
        'L' => element.find(';')? + 1,
        'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z' => 1,
        _ => return None,
    };

    Some(dims + element_len)
}

fn primitive_name(code: &str) -> Option<&'static str> {
    Some(match code {
        "B" => "byte",
        "C" => "char",
        "D" => "double",
        "F" => "float",
        "I" => "int",
        "J" => "long",
        "S" => "short",
        "V" => "void",
        "Z" => "boolean",
        _ => return None,
    })
}
