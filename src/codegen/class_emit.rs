//! Per-class bytecode emission (§4.3 Class emission): dispatches on class
//! kind and runtime annotations to assemble one or more complete class
//! files, delegating every method body to `method_emit`. A class carrying
//! the `builder` annotation emits a second, nested class file alongside its
//! own, so every public entry point here returns a list rather than a
//! single `(name, bytes)` pair.

use crate::ast::{ClassKind, Modifier, TypeRef};
use crate::codegen::class_file::{
    Attribute, AttributeData, ClassFileWriter, MemberInfo, ACC_ABSTRACT, ACC_ANNOTATION, ACC_ENUM, ACC_FINAL,
    ACC_INTERFACE, ACC_PRIVATE, ACC_PROTECTED, ACC_PUBLIC, ACC_STATIC, ACC_SUPER,
};
use crate::codegen::descriptors::{self, OBJECT_DESC, OBJECT_INTERNAL};
use crate::codegen::method_emit::{self, MethodBody};
use crate::codegen::prescan::PreScan;
use crate::codegen::synth;
use crate::codegen_log;
use crate::compiler_messages::compiler_errors::Diagnostic;
use crate::mir::{BlockId, LocalId, MirBlock, MirClass, MirField, MirFunction, MirInst, Operand, Terminator};
use crate::string_interning::{StringId, StringTable};

/// Dispatches on `class.kind`, returning every class file this one class
/// contributes to the output (more than one only for `builder`).
pub fn emit_class(class: &MirClass, prescan: &PreScan, table: &mut StringTable) -> Result<Vec<(String, Vec<u8>)>, Diagnostic> {
    codegen_log!("emit_class: kind {:?}, {} methods", class.kind, class.methods.len());
    match class.kind {
        ClassKind::Annotation => Ok(vec![emit_annotation_class(class, table)?]),
        _ => emit_ordinary_class(class, prescan, table),
    }
}

fn class_file_name(internal: &str) -> String {
    format!("{internal}.class")
}

fn has_method_named(class: &MirClass, table: &StringTable, name: &str) -> bool {
    class.methods.iter().any(|m| !m.is_constructor && m.name.resolve(table) == name)
}

fn has_annotation(class: &MirClass, table: &StringTable, name: &str) -> bool {
    class.annotations.iter().any(|a| a.resolve(table) == name)
}

fn class_access_flags(class: &MirClass) -> u16 {
    let mut flags = if class.modifiers.contains(&Modifier::Private) { 0 } else { ACC_PUBLIC };
    match class.kind {
        ClassKind::Interface => flags |= ACC_INTERFACE | ACC_ABSTRACT,
        ClassKind::Enum => flags |= ACC_SUPER | ACC_ENUM,
        ClassKind::Object => flags |= ACC_SUPER | ACC_FINAL,
        ClassKind::Class => {
            flags |= ACC_SUPER;
            if class.modifiers.contains(&Modifier::Final) {
                flags |= ACC_FINAL;
            }
            if class.modifiers.contains(&Modifier::Abstract) {
                flags |= ACC_ABSTRACT;
            }
        }
        ClassKind::Annotation => unreachable!("handled by emit_annotation_class"),
    }
    flags
}

fn field_access_flags(field: &MirField) -> u16 {
    let mut flags = ACC_PUBLIC;
    if field.modifiers.contains(&Modifier::Private) {
        flags &= !ACC_PUBLIC;
        flags |= ACC_PRIVATE;
    }
    if field.modifiers.contains(&Modifier::Protected) {
        flags &= !ACC_PUBLIC;
        flags |= ACC_PROTECTED;
    }
    if field.modifiers.contains(&Modifier::Static) {
        flags |= ACC_STATIC;
    }
    if field.modifiers.contains(&Modifier::Final) || field.modifiers.contains(&Modifier::Val) {
        flags |= ACC_FINAL;
    }
    flags
}

fn superclass_internal(class: &MirClass, table: &StringTable) -> String {
    match &class.superclass {
        Some(TypeRef::Simple(name, _)) | Some(TypeRef::Generic(name, _, _)) => {
            descriptors::internal_name_of(name.resolve(table))
        }
        _ => OBJECT_INTERNAL.to_string(),
    }
}

fn is_empty_body(f: &MirFunction) -> bool {
    f.blocks.len() == 1 && f.blocks[0].instructions.is_empty() && matches!(f.blocks[0].terminator, Terminator::Unreachable)
}

// ----------------------------------------------------------- <clinit> splicing

fn shift_operand(op: Operand, lo: u32) -> Operand {
    match op {
        Operand::Local(id) => Operand::Local(LocalId(id.0 + lo)),
        other => other,
    }
}

fn shift_inst(inst: MirInst, lo: u32) -> MirInst {
    match inst {
        MirInst::Nop => MirInst::Nop,
        MirInst::Assign { dst, src } => MirInst::Assign { dst: LocalId(dst.0 + lo), src: shift_operand(src, lo) },
        MirInst::BinOp { dst, op, lhs, rhs } => {
            MirInst::BinOp { dst: LocalId(dst.0 + lo), op, lhs: shift_operand(lhs, lo), rhs: shift_operand(rhs, lo) }
        }
        MirInst::UnOp { dst, op, operand } => MirInst::UnOp { dst: LocalId(dst.0 + lo), op, operand: shift_operand(operand, lo) },
        MirInst::Call { dst, receiver, owner, method, args, is_static } => MirInst::Call {
            dst: dst.map(|d| LocalId(d.0 + lo)),
            receiver: receiver.map(|r| shift_operand(r, lo)),
            owner,
            method,
            args: args.into_iter().map(|a| shift_operand(a, lo)).collect(),
            is_static,
        },
        MirInst::New { dst, ty, args } => {
            MirInst::New { dst: LocalId(dst.0 + lo), ty, args: args.into_iter().map(|a| shift_operand(a, lo)).collect() }
        }
        MirInst::GetField { dst, receiver, owner, field } => {
            MirInst::GetField { dst: LocalId(dst.0 + lo), receiver: shift_operand(receiver, lo), owner, field }
        }
        MirInst::SetField { receiver, owner, field, value } => {
            MirInst::SetField { receiver: shift_operand(receiver, lo), owner, field, value: shift_operand(value, lo) }
        }
        MirInst::GetStatic { dst, owner, field } => MirInst::GetStatic { dst: LocalId(dst.0 + lo), owner, field },
        MirInst::SetStatic { owner, field, value } => MirInst::SetStatic { owner, field, value: shift_operand(value, lo) },
        MirInst::ArrayGet { dst, array, index } => {
            MirInst::ArrayGet { dst: LocalId(dst.0 + lo), array: shift_operand(array, lo), index: shift_operand(index, lo) }
        }
        MirInst::ArraySet { array, index, value } => MirInst::ArraySet {
            array: shift_operand(array, lo),
            index: shift_operand(index, lo),
            value: shift_operand(value, lo),
        },
        MirInst::RuntimeCall { dst, helper, args } => MirInst::RuntimeCall {
            dst: dst.map(|d| LocalId(d.0 + lo)),
            helper,
            args: args.into_iter().map(|a| shift_operand(a, lo)).collect(),
        },
        MirInst::InstanceOf { dst, value, ty, negated } => {
            MirInst::InstanceOf { dst: LocalId(dst.0 + lo), value: shift_operand(value, lo), ty, negated }
        }
        MirInst::Cast { dst, value, ty } => MirInst::Cast { dst: LocalId(dst.0 + lo), value: shift_operand(value, lo), ty },
        MirInst::Box { dst, value } => MirInst::Box { dst: LocalId(dst.0 + lo), value: shift_operand(value, lo) },
        MirInst::Unbox { dst, value } => MirInst::Unbox { dst: LocalId(dst.0 + lo), value: shift_operand(value, lo) },
        MirInst::StringConcat { dst, parts } => {
            MirInst::StringConcat { dst: LocalId(dst.0 + lo), parts: parts.into_iter().map(|p| shift_operand(p, lo)).collect() }
        }
        MirInst::BuildCollection { dst, kind, elements } => MirInst::BuildCollection {
            dst: LocalId(dst.0 + lo),
            kind,
            elements: elements.into_iter().map(|e| shift_operand(e, lo)).collect(),
        },
        MirInst::MethodHandle { dst, owner, method } => MirInst::MethodHandle { dst: LocalId(dst.0 + lo), owner, method },
        MirInst::AnnotationTrigger { annotation, target } => MirInst::AnnotationTrigger { annotation, target },
    }
}

fn shift_terminator(term: Terminator, lo: u32, bo: u32) -> Terminator {
    let sb = |b: BlockId| BlockId(b.0 + bo);
    match term {
        Terminator::Return(v) => Terminator::Return(v.map(|v| shift_operand(v, lo))),
        Terminator::Jump(b) => Terminator::Jump(sb(b)),
        Terminator::TailCall(b) => Terminator::TailCall(sb(b)),
        Terminator::Branch { cond, then_block, else_block } => {
            Terminator::Branch { cond: shift_operand(cond, lo), then_block: sb(then_block), else_block: sb(else_block) }
        }
        Terminator::EqualsChain { subject, cases, default } => Terminator::EqualsChain {
            subject: shift_operand(subject, lo),
            cases: cases.into_iter().map(|(v, b)| (shift_operand(v, lo), sb(b))).collect(),
            default: sb(default),
        },
        Terminator::Throw(v) => Terminator::Throw(shift_operand(v, lo)),
        Terminator::Unreachable => Terminator::Unreachable,
    }
}

/// Splices `second` after `first`: `first`'s final block jumps into
/// `second`'s entry instead of returning, and every local/block id in
/// `second` is renumbered past `first`'s own. Used to chain the singleton
/// `<clinit>` prefix, the user's own static initializer statements, and any
/// generic annotation triggers into one method body.
fn splice_functions(first: MirFunction, second: MirFunction) -> MirFunction {
    let local_offset = first.locals.len() as u32;
    let block_offset = first.blocks.len() as u32;

    let mut locals = first.locals;
    locals.extend(second.locals);

    let mut blocks = first.blocks;
    if let Some(last) = blocks.last_mut() {
        last.terminator = Terminator::Jump(BlockId(second.entry.0 + block_offset));
    }
    for block in second.blocks {
        blocks.push(MirBlock {
            id: BlockId(block.id.0 + block_offset),
            instructions: block.instructions.into_iter().map(|i| shift_inst(i, local_offset)).collect(),
            terminator: shift_terminator(block.terminator, local_offset, block_offset),
        });
    }

    MirFunction {
        name: first.name,
        modifiers: first.modifiers,
        params: Vec::new(),
        return_type: None,
        locals,
        blocks,
        entry: first.entry,
        try_table: Vec::new(),
        is_constructor: false,
        descriptor_override: Some("()V".to_string()),
        delegate_args: None,
        super_args: None,
    }
}

/// Assembles a class's `<clinit>`, in order: the `Object`-kind singleton
/// initializer, the user's own static-initializer statements (companion
/// field initializers, enum-entry instantiation), then one `AnnotationTrigger`
/// per class-level annotation other than `data`/`builder`. `None` when none
/// of those contribute anything.
fn build_clinit(class: &MirClass, table: &mut StringTable) -> Option<MirFunction> {
    let mut chain = if class.kind == ClassKind::Object { Some(synth::synth_object_clinit(class, table)) } else { None };

    if let Some(user) = class.static_initializer.clone() {
        chain = Some(match chain {
            Some(c) => splice_functions(c, user),
            None => user,
        });
    }

    let trigger_names: Vec<StringId> = class
        .annotations
        .iter()
        .copied()
        .filter(|&a| {
            let name = a.resolve(table);
            name != "data" && name != "builder"
        })
        .collect();
    for annotation in trigger_names {
        let trigger = synth::synth_annotation_trigger(class.name, annotation, table);
        chain = Some(match chain {
            Some(c) => splice_functions(c, trigger),
            None => trigger,
        });
    }

    chain
}

// -------------------------------------------------------------- builder class

fn build_builder_class(outer: &MirClass, builder_name: StringId, table: &mut StringTable) -> MirClass {
    let instance_fields: Vec<&MirField> = outer.fields.iter().filter(|f| !f.modifiers.contains(&Modifier::Static)).collect();
    let fields: Vec<MirField> = instance_fields
        .iter()
        .map(|f| MirField { name: f.name, ty: None, modifiers: vec![Modifier::Private], constant_value: None })
        .collect();

    let mut methods = vec![synth::synth_default_ctor(table)];
    for field in &fields {
        methods.push(synth::synth_builder_setter(field, builder_name, table));
    }
    methods.push(synth::synth_builder_build(outer, builder_name, table));

    MirClass {
        name: builder_name,
        kind: ClassKind::Class,
        modifiers: vec![Modifier::Public, Modifier::Final],
        annotations: Vec::new(),
        fields,
        methods,
        superclass: None,
        interfaces: Vec::new(),
        enum_entry_names: Vec::new(),
        static_initializer: None,
    }
}

// ------------------------------------------------------------- ordinary class

fn emit_ordinary_class(class: &MirClass, prescan: &PreScan, table: &mut StringTable) -> Result<Vec<(String, Vec<u8>)>, Diagnostic> {
    let this_internal = descriptors::internal_name_of(table.resolve(class.name));
    let super_internal = superclass_internal(class, table);
    let access_flags = class_access_flags(class);

    let mut writer = ClassFileWriter::new(access_flags, &this_internal, &super_internal);

    for iface in &class.interfaces {
        if let TypeRef::Simple(name, _) | TypeRef::Generic(name, _, _) = iface {
            let internal = descriptors::internal_name_of(name.resolve(table));
            writer.add_interface(&internal);
        }
    }

    for field in &class.fields {
        let desc = prescan.resolve_field_descriptor(class.name, field.name);
        let name_idx = writer.pool.utf8(field.name.resolve(table));
        let desc_idx = writer.pool.utf8(&desc);
        writer.fields.push(MemberInfo {
            access_flags: field_access_flags(field),
            name_index: name_idx,
            descriptor_index: desc_idx,
            attributes: Vec::new(),
        });
    }

    if class.kind == ClassKind::Object {
        let desc = format!("L{this_internal};");
        let name_idx = writer.pool.utf8("INSTANCE");
        let desc_idx = writer.pool.utf8(&desc);
        writer.fields.push(MemberInfo {
            access_flags: ACC_PUBLIC | ACC_STATIC | ACC_FINAL,
            name_index: name_idx,
            descriptor_index: desc_idx,
            attributes: Vec::new(),
        });
    }

    let builder_name = if has_annotation(class, table, "builder") {
        Some(table.intern(&format!("{}$Builder", table.resolve(class.name))))
    } else {
        None
    };

    let mut methods: Vec<MirFunction> = class.methods.clone();

    let has_ctor = methods.iter().any(|m| m.is_constructor);
    if !has_ctor && class.kind != ClassKind::Interface {
        methods.push(synth::synth_default_ctor(table));
    }

    if has_annotation(class, table, "data") {
        if !has_method_named(class, table, "toString") {
            methods.push(synth::synth_to_string(class, table));
        }
        if !has_method_named(class, table, "equals") {
            methods.push(synth::synth_equals(class, table));
        }
        if !has_method_named(class, table, "hashCode") {
            methods.push(synth::synth_hash_code(class, table));
        }
        for component in synth::synth_components(class, table) {
            if !has_method_named(class, table, component.name.resolve(table)) {
                methods.push(component);
            }
        }
        if !has_method_named(class, table, "copy") {
            methods.push(synth::synth_copy(class, table));
        }
    }

    if class.kind == ClassKind::Enum {
        if !has_method_named(class, table, "values") {
            methods.push(synth::synth_enum_values(class, table));
        }
        if !has_method_named(class, table, "toString") {
            methods.push(synth::synth_enum_to_string(class, table));
        }
    }

    if let Some(name) = builder_name {
        methods.push(synth::synth_builder_factory(name, table));
    }

    if let Some(mut clinit) = build_clinit(class, table) {
        clinit.name = table.intern("<clinit>");
        methods.push(clinit);
    }

    for f in &methods {
        if class.kind == ClassKind::Interface && is_empty_body(f) {
            push_abstract_method(&mut writer, f, table);
            continue;
        }
        let is_static = !f.is_constructor && f.modifiers.contains(&Modifier::Static);
        let body = method_emit::emit_method(f, &this_internal, class.name, is_static, &mut writer.pool, prescan, table)?;
        push_method_body(&mut writer, body);
    }

    let mut out = vec![(class_file_name(&this_internal), writer.finish())];

    if let Some(name) = builder_name {
        let builder_class = build_builder_class(class, name, table);
        out.extend(emit_ordinary_class(&builder_class, prescan, table)?);
    }

    Ok(out)
}

fn push_abstract_method(writer: &mut ClassFileWriter, f: &MirFunction, table: &StringTable) {
    let name_idx = writer.pool.utf8(f.name.resolve(table));
    let desc = f
        .descriptor_override
        .clone()
        .unwrap_or_else(|| descriptors::default_method_descriptor(f.params.len(), f.return_type.is_none()));
    let desc_idx = writer.pool.utf8(&desc);
    writer.methods.push(MemberInfo {
        access_flags: ACC_PUBLIC | ACC_ABSTRACT,
        name_index: name_idx,
        descriptor_index: desc_idx,
        attributes: Vec::new(),
    });
}

fn push_method_body(writer: &mut ClassFileWriter, body: MethodBody) {
    let access_flags = if body.name == "<clinit>" { ACC_STATIC } else { body.access_flags };
    let name_idx = writer.pool.utf8(&body.name);
    let desc_idx = writer.pool.utf8(&body.descriptor);
    let code_name = writer.pool.utf8("Code");
    writer.methods.push(MemberInfo {
        access_flags,
        name_index: name_idx,
        descriptor_index: desc_idx,
        attributes: vec![Attribute { name_index: code_name, data: AttributeData::Code(body.code) }],
    });
}

// ----------------------------------------------------------- annotation class

/// `@interface` emission: `java.lang.annotation.Annotation` as an implicit
/// interface, `RUNTIME` retention, `{TYPE, FIELD, METHOD}` targets, and one
/// abstract element method per non-static field.
fn emit_annotation_class(class: &MirClass, table: &mut StringTable) -> Result<(String, Vec<u8>), Diagnostic> {
    let this_internal = descriptors::internal_name_of(table.resolve(class.name));
    let access_flags = ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT | ACC_ANNOTATION;
    let mut writer = ClassFileWriter::new(access_flags, &this_internal, OBJECT_INTERNAL);
    writer.add_interface("java/lang/annotation/Annotation");

    let runtime_annotations_name = writer.pool.utf8("RuntimeVisibleAnnotations");
    let runtime_annotations_body = build_runtime_visible_annotations(&mut writer.pool);
    writer.attributes.push(Attribute { name_index: runtime_annotations_name, data: AttributeData::Raw(runtime_annotations_body) });

    for field in class.fields.iter().filter(|f| !f.modifiers.contains(&Modifier::Static)) {
        let ret_desc = match &field.ty {
            Some(ty) => descriptors::type_ref_descriptor(ty, table),
            None => OBJECT_DESC.to_string(),
        };
        let name_idx = writer.pool.utf8(field.name.resolve(table));
        let desc = format!("(){ret_desc}");
        let desc_idx = writer.pool.utf8(&desc);
        writer.methods.push(MemberInfo {
            access_flags: ACC_PUBLIC | ACC_ABSTRACT,
            name_index: name_idx,
            descriptor_index: desc_idx,
            attributes: Vec::new(),
        });
    }

    Ok((class_file_name(&this_internal), writer.finish()))
}

/// Builds a `RuntimeVisibleAnnotations` attribute body (JVMS §4.7.16)
/// carrying `@Retention(RUNTIME)` and `@Target({TYPE, FIELD, METHOD})`, the
/// two meta-annotations every synthesized `@interface` needs.
fn build_runtime_visible_annotations(pool: &mut crate::codegen::class_file::ConstantPool) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&2u16.to_be_bytes()); // num_annotations

    // @Retention(RetentionPolicy.RUNTIME)
    let retention_type = pool.utf8("Ljava/lang/annotation/Retention;");
    body.extend_from_slice(&retention_type.to_be_bytes());
    body.extend_from_slice(&1u16.to_be_bytes()); // num_element_value_pairs
    let value_name = pool.utf8("value");
    body.extend_from_slice(&value_name.to_be_bytes());
    body.push(b'e');
    let policy_type = pool.utf8("Ljava/lang/annotation/RetentionPolicy;");
    body.extend_from_slice(&policy_type.to_be_bytes());
    let runtime_const = pool.utf8("RUNTIME");
    body.extend_from_slice(&runtime_const.to_be_bytes());

    // @Target({ElementType.TYPE, ElementType.FIELD, ElementType.METHOD})
    let target_type = pool.utf8("Ljava/lang/annotation/Target;");
    body.extend_from_slice(&target_type.to_be_bytes());
    body.extend_from_slice(&1u16.to_be_bytes());
    let value_name2 = pool.utf8("value");
    body.extend_from_slice(&value_name2.to_be_bytes());
    body.push(b'[');
    body.extend_from_slice(&3u16.to_be_bytes()); // num_values
    let element_type = pool.utf8("Ljava/lang/annotation/ElementType;");
    for target in ["TYPE", "FIELD", "METHOD"] {
        body.push(b'e');
        body.extend_from_slice(&element_type.to_be_bytes());
        let const_name = pool.utf8(target);
        body.extend_from_slice(&const_name.to_be_bytes());
    }

    body
}
