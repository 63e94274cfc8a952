//! JVM bytecode backend: MIR in, `.class` files out. Each submodule owns one
//! slice of §4.3 (Class/Method/Instruction emission); `emit_module` is the
//! single entry point the pipeline driver calls once HIR→MIR lowering is
//! done.

pub mod bytecode;
pub mod class_emit;
pub mod class_file;
pub mod descriptors;
pub mod fusion;
pub mod int_locals;
pub mod method_emit;
pub mod prescan;
pub mod runtime_contract;
pub mod synth;

use crate::codegen::class_file::{ACC_FINAL, ACC_PUBLIC, ACC_SUPER};
use crate::codegen::descriptors::OBJECT_INTERNAL;
use crate::compiler_messages::compiler_errors::Diagnostic;
use crate::mir::MirModule;
use crate::settings::MODULE_CLASS_NAME;
use crate::string_interning::StringTable;

/// Emits every class file a module contributes: one (or more, for `builder`
/// classes) per declared class, plus a synthesized `$Module` class holding
/// any top-level functions, since the JVM has no notion of a free function.
pub fn emit_module(module: &MirModule, table: &mut StringTable) -> Result<Vec<(String, Vec<u8>)>, Diagnostic> {
    let prescan = prescan::PreScan::build(module, table);

    let mut out = Vec::new();
    for class in &module.classes {
        out.extend(class_emit::emit_class(class, &prescan, table)?);
    }

    if !module.functions.is_empty() {
        out.push(emit_module_functions(module, &prescan, table)?);
    }

    Ok(out)
}

/// Collects top-level functions (and a script's implicit `main`) into one
/// `public final` holder class, `$Module`, mirroring how the class-kind
/// dispatch would emit an ordinary final class with only static methods.
fn emit_module_functions(
    module: &MirModule,
    prescan: &prescan::PreScan,
    table: &mut StringTable,
) -> Result<(String, Vec<u8>), Diagnostic> {
    let this_internal = MODULE_CLASS_NAME.to_string();
    let access_flags = ACC_PUBLIC | ACC_FINAL | ACC_SUPER;
    let mut writer = class_file::ClassFileWriter::new(access_flags, &this_internal, OBJECT_INTERNAL);

    let module_class = table.intern(MODULE_CLASS_NAME);
    let ctor = synth::synth_default_ctor(table);
    let ctor_body = method_emit::emit_method(&ctor, &this_internal, module_class, false, &mut writer.pool, prescan, table)?;
    push_method_body(&mut writer, ctor_body);

    for f in &module.functions {
        let body = method_emit::emit_method(f, &this_internal, module_class, true, &mut writer.pool, prescan, table)?;
        push_method_body(&mut writer, body);
    }

    Ok((format!("{this_internal}.class"), writer.finish()))
}

fn push_method_body(writer: &mut class_file::ClassFileWriter, body: method_emit::MethodBody) {
    let name_idx = writer.pool.utf8(&body.name);
    let desc_idx = writer.pool.utf8(&body.descriptor);
    let code_name = writer.pool.utf8("Code");
    writer.methods.push(class_file::MemberInfo {
        access_flags: body.access_flags,
        name_index: name_idx,
        descriptor_index: desc_idx,
        attributes: vec![class_file::Attribute { name_index: code_name, data: class_file::AttributeData::Code(body.code) }],
    });
}
