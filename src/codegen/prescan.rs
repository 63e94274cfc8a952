//! Module-wide pre-scan (§4.3 Pre-scan): builds the lookup tables class
//! emission and method emission both need before any single class can be
//! emitted, since field/constructor resolution can reach across classes.

use rustc_hash::FxHashMap;

use crate::codegen::descriptors::{self, OBJECT_DESC};
use crate::codegen_log;
use crate::mir::{MirClass, MirModule};
use crate::string_interning::StringId;

#[derive(Debug, Default)]
pub struct PreScan {
    /// `class → field → descriptor`, walked up the superclass chain on miss.
    field_descriptors: FxHashMap<StringId, FxHashMap<StringId, String>>,
    /// `(class, arity) → constructor descriptor`, used by `NEW_OBJECT` to
    /// decide between a direct `NEW+INVOKESPECIAL` and the method-handle
    /// fallback.
    ctor_descriptors: FxHashMap<(StringId, usize), String>,
    /// Declared superclass of every class defined in this module, for
    /// walking the inheritance chain during field resolution.
    superclasses: FxHashMap<StringId, StringId>,
}

impl PreScan {
    pub fn build(module: &MirModule, table: &crate::string_interning::StringTable) -> Self {
        codegen_log!("pre-scanning {} classes", module.classes.len());
        let mut scan = PreScan::default();

        for class in &module.classes {
            let mut fields = FxHashMap::default();
            for f in &class.fields {
                let declared = match &f.ty {
                    Some(ty) => descriptors::type_ref_descriptor(ty, table),
                    None => OBJECT_DESC.to_string(),
                };
                // Representation contract: instance fields of reference type
                // are always stored as `Object`; only static fields keep
                // their exact declared descriptor. Primitive descriptors are
                // the natural JVM type either way.
                let is_static = f.modifiers.contains(&crate::ast::Modifier::Static);
                let desc = if is_static || descriptors::is_primitive_descriptor(&declared) {
                    declared
                } else {
                    OBJECT_DESC.to_string()
                };
                fields.insert(f.name, desc);
            }
            scan.field_descriptors.insert(class.name, fields);

            if let Some(super_ty) = &class.superclass {
                if let crate::ast::TypeRef::Simple(name, _) = super_ty {
                    scan.superclasses.insert(class.name, *name);
                }
            }

            for ctor in class.methods.iter().filter(|m| m.is_constructor) {
                let arity = ctor.params.len();
                let desc = ctor
                    .descriptor_override
                    .clone()
                    .unwrap_or_else(|| descriptors::default_ctor_descriptor(arity));
                scan.ctor_descriptors.insert((class.name, arity), desc);
            }
        }

        scan
    }

    /// Resolves a field's descriptor by walking `class`'s superclass chain
    /// within this module, falling back to `Object` when the field is
    /// declared in an external (non-module) class (§4.3: "falling back to
    /// reflection... then defaulting to Object" — the reflective step lives
    /// in the semantic index's Java class resolver, not here, so the emitter
    /// takes the conservative `Object` default directly).
    pub fn resolve_field_descriptor(&self, mut class: StringId, field: StringId) -> String {
        loop {
            if let Some(fields) = self.field_descriptors.get(&class) {
                if let Some(desc) = fields.get(&field) {
                    return desc.clone();
                }
            }
            match self.superclasses.get(&class) {
                Some(&sup) => class = sup,
                None => return OBJECT_DESC.to_string(),
            }
        }
    }

    /// Looks up a pre-scanned constructor descriptor for `(class, arity)`;
    /// `None` means the class is external to this module or no constructor
    /// of that arity was declared, in which case `NEW_OBJECT` falls back to
    /// the method-handle cache.
    pub fn constructor_descriptor(&self, class: StringId, arity: usize) -> Option<&str> {
        self.ctor_descriptors.get(&(class, arity)).map(String::as_str)
    }

    pub fn is_module_class(&self, class: StringId) -> bool {
        self.field_descriptors.contains_key(&class)
    }

    pub fn superclass_of(&self, class: StringId) -> Option<StringId> {
        self.superclasses.get(&class).copied()
    }
}

pub fn class_by_name<'a>(module: &'a MirModule, name: StringId) -> Option<&'a MirClass> {
    module.classes.iter().find(|c| c.name == name)
}
