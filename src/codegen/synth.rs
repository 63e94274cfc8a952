//! Synthesizes the `MirFunction`s generated from class-level annotations and
//! class kinds (§4.3 Class emission): `data`'s `toString`/`equals`/
//! `hashCode`/`componentN`/`copy`, `builder`'s fluent setters, and the
//! `Enum`-kind `values()`/`toString()` pair. Each synthesized function is
//! built as ordinary MIR so it goes through the exact same descriptor,
//! int-local-promotion, and instruction-emission path as user-written code —
//! there is no separate bytecode generator for synthesized members.

use crate::ast::{Literal, Modifier, TypeRef};
use crate::hir::Loc;
use crate::mir::{BlockId, MirBlock, MirClass, MirField, MirFunction, MirInst, MirLocal, MirParam, MirType, Operand, Terminator};
use crate::string_interning::{StringId, StringTable};

/// A minimal single/multi-block function assembler, mirroring the shape of
/// `mir::lower`'s private `FunctionBuilder` closely enough to stay familiar,
/// but scoped to the straight-line and small-branch shapes synthesis needs.
struct SynthBuilder {
    locals: Vec<MirLocal>,
    blocks: Vec<MirBlock>,
    current: BlockId,
}

impl SynthBuilder {
    fn new() -> Self {
        let mut b = SynthBuilder { locals: Vec::new(), blocks: Vec::new(), current: BlockId(0) };
        b.new_block();
        b
    }

    fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(MirBlock { id, instructions: Vec::new(), terminator: Terminator::Unreachable });
        self.current = id;
        id
    }

    fn switch_to(&mut self, b: BlockId) {
        self.current = b;
    }

    fn local(&mut self, ty: MirType) -> crate::mir::LocalId {
        let id = crate::mir::LocalId(self.locals.len() as u32);
        self.locals.push(MirLocal { name: None, ty, declared_type: None });
        id
    }

    fn emit(&mut self, inst: MirInst) {
        self.blocks[self.current.0 as usize].instructions.push(inst);
    }

    fn terminate(&mut self, term: Terminator) {
        self.blocks[self.current.0 as usize].terminator = term;
    }

    fn finish(self, name: StringId, params: Vec<MirParam>, return_type: Option<TypeRef>) -> MirFunction {
        MirFunction {
            name,
            modifiers: vec![Modifier::Public],
            params,
            return_type,
            locals: self.locals,
            blocks: self.blocks,
            entry: BlockId(0),
            try_table: Vec::new(),
            is_constructor: false,
            descriptor_override: None,
            delegate_args: None,
            super_args: None,
        }
    }
}

fn object_ty(table: &mut StringTable) -> TypeRef {
    TypeRef::Simple(table.intern("Object"), Loc::unknown())
}

/// `data` synthesis: `toString` builds `"ClassName(f1=v1, f2=v2)"`.
pub fn synth_to_string(class: &MirClass, table: &mut StringTable) -> MirFunction {
    let mut b = SynthBuilder::new();
    let mut parts = Vec::new();
    let class_name = table.resolve(class.name).to_string();
    let mut header = format!("{class_name}(");
    let instance_fields: Vec<&MirField> = class.fields.iter().filter(|f| !f.modifiers.contains(&Modifier::Static)).collect();
    for (i, field) in instance_fields.iter().enumerate() {
        let field_name = table.resolve(field.name).to_string();
        header.push_str(&field_name);
        header.push('=');
        if i > 0 {
            parts.push(Operand::Const(Literal::String(table.intern(", "))));
        }
        parts.push(Operand::Const(Literal::String(table.intern(&std::mem::take(&mut header)))));
        let dst = b.local(MirType::Object);
        b.emit(MirInst::GetField { dst, receiver: Operand::This, owner: class.name, field: field.name });
        parts.push(Operand::Local(dst));
        header = String::new();
    }
    header.push(')');
    parts.push(Operand::Const(Literal::String(table.intern(&header))));

    let dst = b.local(MirType::Object);
    b.emit(MirInst::StringConcat { dst, parts });
    b.terminate(Terminator::Return(Some(Operand::Local(dst))));
    let ret = string_ty(table);
    b.finish(table.intern("toString"), Vec::new(), Some(ret))
}

fn string_ty(table: &mut StringTable) -> TypeRef {
    TypeRef::Simple(table.intern("String"), Loc::unknown())
}

/// `data` synthesis: `equals` checks `other instanceof ClassName` then
/// `Objects.equals` per non-static field.
pub fn synth_equals(class: &MirClass, table: &mut StringTable) -> MirFunction {
    let mut b = SynthBuilder::new();
    let other_name = table.intern("other");
    let other_param = crate::mir::LocalId(0);
    b.locals.push(MirLocal { name: Some(other_name), ty: MirType::Object, declared_type: None });

    let instance_fields: Vec<&MirField> = class.fields.iter().filter(|f| !f.modifiers.contains(&Modifier::Static)).collect();
    let fail_block = b.new_block();
    let entry = BlockId(0);
    b.switch_to(entry);

    let is_instance = b.local(MirType::Boolean);
    b.emit(MirInst::InstanceOf {
        dst: is_instance,
        value: Operand::Local(other_param),
        ty: TypeRef::Simple(class.name, Loc::unknown()),
        negated: false,
    });
    let body_start = b.new_block();
    b.switch_to(entry);
    b.terminate(Terminator::Branch { cond: Operand::Local(is_instance), then_block: body_start, else_block: fail_block });

    b.switch_to(fail_block);
    b.terminate(Terminator::Return(Some(Operand::Const(Literal::Bool(false)))));

    b.switch_to(body_start);
    let mut current = body_start;
    for field in &instance_fields {
        let lhs = b.local(MirType::Object);
        b.emit(MirInst::GetField { dst: lhs, receiver: Operand::This, owner: class.name, field: field.name });
        let rhs = b.local(MirType::Object);
        b.emit(MirInst::GetField { dst: rhs, receiver: Operand::Local(other_param), owner: class.name, field: field.name });
        let eq = b.local(MirType::Boolean);
        b.emit(MirInst::Call {
            dst: Some(eq),
            receiver: None,
            owner: table.intern("java/util/Objects"),
            method: table.intern("equals"),
            args: vec![Operand::Local(lhs), Operand::Local(rhs)],
            is_static: true,
        });
        let next = b.new_block();
        b.switch_to(current);
        b.terminate(Terminator::Branch { cond: Operand::Local(eq), then_block: next, else_block: fail_block });
        current = next;
        b.switch_to(current);
    }
    b.terminate(Terminator::Return(Some(Operand::Const(Literal::Bool(true)))));

    let param_ty = object_ty(table);
    let ret_ty = boolean_ty(table);
    let params = vec![MirParam { name: other_name, ty: Some(param_ty) }];
    let mut f = b.finish(table.intern("equals"), params, Some(ret_ty));
    f.descriptor_override = Some("(Ljava/lang/Object;)Z".to_string());
    f
}

fn boolean_ty(table: &mut StringTable) -> TypeRef {
    TypeRef::Simple(table.intern("Boolean"), Loc::unknown())
}

/// `data` synthesis: `hashCode` forwards every non-static field to
/// `Objects.hash(Object...)`.
pub fn synth_hash_code(class: &MirClass, table: &mut StringTable) -> MirFunction {
    let mut b = SynthBuilder::new();
    let instance_fields: Vec<&MirField> = class.fields.iter().filter(|f| !f.modifiers.contains(&Modifier::Static)).collect();
    let mut field_locals = Vec::new();
    for field in &instance_fields {
        let dst = b.local(MirType::Object);
        b.emit(MirInst::GetField { dst, receiver: Operand::This, owner: class.name, field: field.name });
        field_locals.push(Operand::Local(dst));
    }
    let array = b.local(MirType::Object);
    b.emit(MirInst::BuildCollection { dst: array, kind: crate::mir::CollectionKind::List, elements: field_locals });
    let dst = b.local(MirType::Int);
    b.emit(MirInst::Call {
        dst: Some(dst),
        receiver: None,
        owner: table.intern("java/util/Objects"),
        method: table.intern("hash"),
        args: vec![Operand::Local(array)],
        is_static: true,
    });
    b.terminate(Terminator::Return(Some(Operand::Local(dst))));
    let ret = int_ty(table);
    let mut f = b.finish(table.intern("hashCode"), Vec::new(), Some(ret));
    f.descriptor_override = Some("()I".to_string());
    f
}

fn int_ty(table: &mut StringTable) -> TypeRef {
    TypeRef::Simple(table.intern("Int"), Loc::unknown())
}

/// `data` synthesis: one `componentN()` accessor per field, 1-indexed.
pub fn synth_components(class: &MirClass, table: &mut StringTable) -> Vec<MirFunction> {
    class
        .fields
        .iter()
        .filter(|f| !f.modifiers.contains(&Modifier::Static))
        .enumerate()
        .map(|(i, field)| {
            let mut b = SynthBuilder::new();
            let dst = b.local(MirType::Object);
            b.emit(MirInst::GetField { dst, receiver: Operand::This, owner: class.name, field: field.name });
            b.terminate(Terminator::Return(Some(Operand::Local(dst))));
            let ret = object_ty(table);
            b.finish(table.intern(&format!("component{}", i + 1)), Vec::new(), Some(ret))
        })
        .collect()
}

/// `data` synthesis: `copy` builds a new instance forwarding its own fields,
/// not its parameters (constructors are the only place parameter-to-field
/// wiring is known; `copy()` here is the zero-arg "clone with current
/// values" form described in §4.3).
pub fn synth_copy(class: &MirClass, table: &mut StringTable) -> MirFunction {
    let mut b = SynthBuilder::new();
    let instance_fields: Vec<&MirField> = class.fields.iter().filter(|f| !f.modifiers.contains(&Modifier::Static)).collect();
    let mut args = Vec::new();
    for field in &instance_fields {
        let dst = b.local(MirType::Object);
        b.emit(MirInst::GetField { dst, receiver: Operand::This, owner: class.name, field: field.name });
        args.push(Operand::Local(dst));
    }
    let dst = b.local(MirType::Object);
    b.emit(MirInst::New { dst, ty: TypeRef::Simple(class.name, Loc::unknown()), args });
    b.terminate(Terminator::Return(Some(Operand::Local(dst))));
    let ret = object_ty(table);
    b.finish(table.intern("copy"), Vec::new(), Some(ret))
}

/// `Enum`-kind synthesis: `values()` returns `Object[]` of every entry field
/// in declaration order (skipped when the user already defined `values`,
/// same gate `class_emit` applies to `toString`).
pub fn synth_enum_values(class: &MirClass, table: &mut StringTable) -> MirFunction {
    let mut b = SynthBuilder::new();
    let mut elements = Vec::new();
    for &name in &class.enum_entry_names {
        let dst = b.local(MirType::Object);
        b.emit(MirInst::GetStatic { dst, owner: class.name, field: name });
        elements.push(Operand::Local(dst));
    }
    let arr = b.local(MirType::Object);
    b.emit(MirInst::BuildCollection { dst: arr, kind: crate::mir::CollectionKind::List, elements });
    b.terminate(Terminator::Return(Some(Operand::Local(arr))));
    let ret = object_ty(table);
    let mut f = b.finish(table.intern("values"), Vec::new(), Some(ret));
    f.modifiers.push(Modifier::Static);
    f
}

/// `Enum`-kind synthesis: `toString()` walks the entry fields comparing
/// `this` to each via reference equality (`==`, i.e. an unfused `Eq`
/// comparison), returning the matching entry's name.
pub fn synth_enum_to_string(class: &MirClass, table: &mut StringTable) -> MirFunction {
    let mut b = SynthBuilder::new();
    let mut current = BlockId(0);
    for &name in &class.enum_entry_names {
        let entry_val = b.local(MirType::Object);
        b.emit(MirInst::GetStatic { dst: entry_val, owner: class.name, field: name });
        let eq = b.local(MirType::Boolean);
        b.emit(MirInst::BinOp { dst: eq, op: crate::ast::BinaryOp::Eq, lhs: Operand::This, rhs: Operand::Local(entry_val) });
        let match_block = b.new_block();
        let next_block = b.new_block();
        b.switch_to(current);
        b.terminate(Terminator::Branch { cond: Operand::Local(eq), then_block: match_block, else_block: next_block });

        b.switch_to(match_block);
        let resolved = table.resolve(name).to_string();
        let literal = table.intern(&resolved);
        b.terminate(Terminator::Return(Some(Operand::Const(Literal::String(literal)))));

        current = next_block;
        b.switch_to(current);
    }
    b.terminate(Terminator::Return(Some(Operand::Const(Literal::Null))));
    let ret = string_ty(table);
    b.finish(table.intern("toString"), Vec::new(), Some(ret))
}

/// `<clinit>` body for the `Object` (singleton) class kind: `INSTANCE = new
/// T()` run before any user `<clinit>` instructions the class already has.
pub fn synth_object_clinit(class: &MirClass, table: &mut StringTable) -> MirFunction {
    let mut b = SynthBuilder::new();
    let dst = b.local(MirType::Object);
    b.emit(MirInst::New { dst, ty: TypeRef::Simple(class.name, Loc::unknown()), args: Vec::new() });
    b.emit(MirInst::SetStatic { owner: class.name, field: table.intern("INSTANCE"), value: Operand::Local(dst) });
    b.terminate(Terminator::Return(None));
    let mut f = b.finish(StringId::from_u32(u32::MAX), Vec::new(), None);
    f.modifiers = vec![Modifier::Static];
    f
}

/// A static body containing a single `AnnotationTrigger`, spliced into
/// `<clinit>` for every class-level annotation that isn't `data`/`builder`
/// (§4.3: "generic runtime-annotation `<clinit>` triggers").
pub fn synth_annotation_trigger(class_name: StringId, annotation: StringId, table: &mut StringTable) -> MirFunction {
    let mut b = SynthBuilder::new();
    b.emit(MirInst::AnnotationTrigger { annotation, target: class_name });
    b.terminate(Terminator::Return(None));
    let mut f = b.finish(StringId::from_u32(u32::MAX), Vec::new(), None);
    f.modifiers = vec![Modifier::Static];
    f
}

/// A synthesized public no-arg constructor chaining to `Object`'s, used for
/// any class (a `builder` inner class, the `$Module` function holder) that
/// would otherwise reach codegen with no constructor at all.
pub fn synth_default_ctor(table: &mut StringTable) -> MirFunction {
    let mut b = SynthBuilder::new();
    b.terminate(Terminator::Return(None));
    let mut f = b.finish(table.intern("<init>"), Vec::new(), None);
    f.is_constructor = true;
    f.descriptor_override = Some("()V".to_string());
    f
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// `builder` synthesis: a static factory on the annotated class returning a
/// fresh instance of its generated `$Builder` inner class.
pub fn synth_builder_factory(builder_name: StringId, table: &mut StringTable) -> MirFunction {
    let mut b = SynthBuilder::new();
    let dst = b.local(MirType::Object);
    b.emit(MirInst::New { dst, ty: TypeRef::Simple(builder_name, Loc::unknown()), args: Vec::new() });
    b.terminate(Terminator::Return(Some(Operand::Local(dst))));
    let ret = TypeRef::Simple(builder_name, Loc::unknown());
    let mut f = b.finish(table.intern("builder"), Vec::new(), Some(ret));
    f.modifiers.push(Modifier::Static);
    f
}

/// `builder` synthesis: one fluent setter per outer-class field on the
/// generated `$Builder` class, returning `this` so calls chain.
pub fn synth_builder_setter(field: &MirField, builder_name: StringId, table: &mut StringTable) -> MirFunction {
    let mut b = SynthBuilder::new();
    let param_name = field.name;
    let param = crate::mir::LocalId(0);
    b.locals.push(MirLocal { name: Some(param_name), ty: MirType::Object, declared_type: None });
    b.emit(MirInst::SetField { receiver: Operand::This, owner: builder_name, field: field.name, value: Operand::Local(param) });
    b.terminate(Terminator::Return(Some(Operand::This)));
    let field_name = table.resolve(field.name).to_string();
    let setter_name = table.intern(&format!("set{}", capitalize(&field_name)));
    let param_ty = object_ty(table);
    let ret_ty = TypeRef::Simple(builder_name, Loc::unknown());
    let params = vec![MirParam { name: param_name, ty: Some(param_ty) }];
    b.finish(setter_name, params, Some(ret_ty))
}

/// `builder` synthesis: `build()` forwards every outer-class field, read off
/// the builder's own fields, to the outer class's primary constructor in
/// field declaration order.
pub fn synth_builder_build(outer: &MirClass, builder_name: StringId, table: &mut StringTable) -> MirFunction {
    let mut b = SynthBuilder::new();
    let instance_fields: Vec<&MirField> = outer.fields.iter().filter(|f| !f.modifiers.contains(&Modifier::Static)).collect();
    let mut args = Vec::new();
    for field in &instance_fields {
        let dst = b.local(MirType::Object);
        b.emit(MirInst::GetField { dst, receiver: Operand::This, owner: builder_name, field: field.name });
        args.push(Operand::Local(dst));
    }
    let dst = b.local(MirType::Object);
    b.emit(MirInst::New { dst, ty: TypeRef::Simple(outer.name, Loc::unknown()), args });
    b.terminate(Terminator::Return(Some(Operand::Local(dst))));
    let ret = TypeRef::Simple(outer.name, Loc::unknown());
    b.finish(table.intern("build"), Vec::new(), Some(ret))
}
