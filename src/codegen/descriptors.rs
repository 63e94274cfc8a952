//! JVM type descriptor formatting: the uniform-boxing default plus the
//! narrow primitive descriptors the int-local-promotion pass and field/static
//! typing need.

use crate::ast::TypeRef;
use crate::mir::MirType;
use crate::string_interning::StringTable;

pub const OBJECT_DESC: &str = "Ljava/lang/Object;";
pub const OBJECT_INTERNAL: &str = "java/lang/Object";
pub const STRING_INTERNAL: &str = "java/lang/String";
pub const THROWABLE_INTERNAL: &str = "java/lang/Throwable";

/// Maps a source-level simple type name to its JVM internal class name,
/// slashing dots and special-casing the small set of names the front end
/// treats as built in.
pub fn internal_name_of(simple: &str) -> String {
    match simple {
        "Int" | "Long" | "Float" | "Double" | "Boolean" | "Char" => simple.to_string(),
        "String" => STRING_INTERNAL.to_string(),
        "Any" | "Object" => OBJECT_INTERNAL.to_string(),
        "Unit" => "V".to_string(),
        other => other.replace('.', "/"),
    }
}

/// `MirType` (the emitter's decided representation class) to its JVM
/// descriptor. Always a primitive or `Ljava/lang/Object;`, never a concrete
/// class, since `MirType` only tracks representation, not identity.
pub fn mir_type_descriptor(ty: MirType) -> &'static str {
    match ty {
        MirType::Object => OBJECT_DESC,
        MirType::Int => "I",
        MirType::Long => "J",
        MirType::Float => "F",
        MirType::Double => "D",
        MirType::Boolean => "Z",
    }
}

/// Best-effort descriptor for a declared source type, used for static/
/// instance field descriptors outside the uniform-boxing default and for
/// resolving explicit `owner|name|desc` overrides. Unresolved generics and
/// function types degrade to `Object`, matching the "defaulting to Object"
/// fallback the field/method-op lowering rules describe throughout §4.3.
pub fn type_ref_descriptor(ty: &TypeRef, table: &StringTable) -> String {
    match ty {
        TypeRef::Nullable(inner, _) => type_ref_descriptor(inner, table),
        TypeRef::Simple(name, _) => simple_name_descriptor(name.resolve(table)),
        TypeRef::Generic(name, _, _) => simple_name_descriptor(name.resolve(table)),
        TypeRef::Function(_, _, _) => OBJECT_DESC.to_string(),
    }
}

fn simple_name_descriptor(name: &str) -> String {
    match name {
        "Int" => "I".to_string(),
        "Long" => "J".to_string(),
        "Float" => "F".to_string(),
        "Double" => "D".to_string(),
        "Boolean" => "Z".to_string(),
        "Char" => "C".to_string(),
        "Unit" => "V".to_string(),
        "String" => format!("L{STRING_INTERNAL};"),
        "Any" | "Object" => format!("L{OBJECT_INTERNAL};"),
        other => format!("L{};", other.replace('.', "/")),
    }
}

/// True when a descriptor names a JVM primitive (one of `IJFDZCB S`), as
/// opposed to a reference descriptor.
pub fn is_primitive_descriptor(desc: &str) -> bool {
    matches!(desc, "I" | "J" | "F" | "D" | "Z" | "C" | "B" | "S")
}

/// Builds a `(params)return` method descriptor string.
pub fn method_descriptor(params: &[&str], ret: &str) -> String {
    let mut s = String::from("(");
    for p in params {
        s.push_str(p);
    }
    s.push(')');
    s.push_str(ret);
    s
}

/// The uniform-boxing default descriptor for a function with `arity`
/// parameters and a non-`void` return: all-`Object` params, `Object` return.
pub fn default_method_descriptor(arity: usize, is_void: bool) -> String {
    let params: Vec<&str> = std::iter::repeat(OBJECT_DESC).take(arity).collect();
    method_descriptor(&params, if is_void { "V" } else { OBJECT_DESC })
}

/// The uniform-boxing default descriptor for a constructor: all-`Object`
/// params, `void` return.
pub fn default_ctor_descriptor(arity: usize) -> String {
    default_method_descriptor(arity, true)
}
