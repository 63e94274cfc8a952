//! Raw JVM class file byte serialization.
//!
//! `mokapot` (the JVM class-file crate enriching this backend) exposes the
//! read-side data shapes this module's names and field layouts are grounded
//! on (`MethodBody`, `ExceptionTableEntry`, `ProgramCounter`) but its write
//! API could not be confirmed against the pinned version, so the actual
//! byte-level encoding here is hand-rolled directly against the class file
//! format (JVMS §4): constant pool, field/method tables, and the `Code`
//! attribute. See `DESIGN.md` for the full note.

use rustc_hash::FxHashMap;

pub const JAVA_8_MAJOR_VERSION: u16 = 52;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_PROTECTED: u16 = 0x0004;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_SUPER: u16 = 0x0020;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;
pub const ACC_ANNOTATION: u16 = 0x2000;
pub const ACC_ENUM: u16 = 0x4000;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CpEntry {
    Utf8(String),
    Class(u16),
    String(u16),
    Integer(i32),
    Long(i64),
    Float(u32),
    Double(u64),
    NameAndType(u16, u16),
    Fieldref(u16, u16),
    Methodref(u16, u16),
    InterfaceMethodref(u16, u16),
}

/// The constant pool, deduplicating every entry by structural equality so
/// repeated field/method references collapse to one slot.
#[derive(Debug, Default)]
pub struct ConstantPool {
    entries: Vec<CpEntry>,
    index: FxHashMap<CpEntry, u16>,
}

impl ConstantPool {
    fn intern(&mut self, entry: CpEntry) -> u16 {
        if let Some(&idx) = self.index.get(&entry) {
            return idx;
        }
        // Long/Double entries occupy two constant-pool slots (JVMS §4.4.5);
        // every other entry occupies one. Index 0 is reserved, so entries
        // start at 1.
        let widens = matches!(entry, CpEntry::Long(_) | CpEntry::Double(_));
        let idx = (self.entries.len() + 1) as u16;
        self.index.insert(entry.clone(), idx);
        self.entries.push(entry);
        if widens {
            self.entries.push(CpEntry::Utf8(String::new())); // placeholder filling the second slot
        }
        idx
    }

    pub fn utf8(&mut self, s: &str) -> u16 {
        self.intern(CpEntry::Utf8(s.to_string()))
    }

    pub fn class(&mut self, internal_name: &str) -> u16 {
        let name_idx = self.utf8(internal_name);
        self.intern(CpEntry::Class(name_idx))
    }

    pub fn string(&mut self, s: &str) -> u16 {
        let utf8_idx = self.utf8(s);
        self.intern(CpEntry::String(utf8_idx))
    }

    pub fn integer(&mut self, v: i32) -> u16 {
        self.intern(CpEntry::Integer(v))
    }

    pub fn long(&mut self, v: i64) -> u16 {
        self.intern(CpEntry::Long(v))
    }

    pub fn float(&mut self, v: f32) -> u16 {
        self.intern(CpEntry::Float(v.to_bits()))
    }

    pub fn double(&mut self, v: f64) -> u16 {
        self.intern(CpEntry::Double(v.to_bits()))
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_idx = self.utf8(name);
        let desc_idx = self.utf8(descriptor);
        self.intern(CpEntry::NameAndType(name_idx, desc_idx))
    }

    pub fn fieldref(&mut self, owner_internal: &str, name: &str, descriptor: &str) -> u16 {
        let class_idx = self.class(owner_internal);
        let nat_idx = self.name_and_type(name, descriptor);
        self.intern(CpEntry::Fieldref(class_idx, nat_idx))
    }

    pub fn methodref(&mut self, owner_internal: &str, name: &str, descriptor: &str) -> u16 {
        let class_idx = self.class(owner_internal);
        let nat_idx = self.name_and_type(name, descriptor);
        self.intern(CpEntry::Methodref(class_idx, nat_idx))
    }

    pub fn interface_methodref(&mut self, owner_internal: &str, name: &str, descriptor: &str) -> u16 {
        let class_idx = self.class(owner_internal);
        let nat_idx = self.name_and_type(name, descriptor);
        self.intern(CpEntry::InterfaceMethodref(class_idx, nat_idx))
    }

    /// `constant_pool_count` is one greater than the number of real entries,
    /// per JVMS §4.1.
    fn count(&self) -> u16 {
        (self.entries.len() + 1) as u16
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.count().to_be_bytes());
        for entry in &self.entries {
            match entry {
                CpEntry::Utf8(s) => {
                    out.push(1);
                    let bytes = s.as_bytes();
                    out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
                    out.extend_from_slice(bytes);
                }
                CpEntry::Integer(v) => {
                    out.push(3);
                    out.extend_from_slice(&v.to_be_bytes());
                }
                CpEntry::Float(bits) => {
                    out.push(4);
                    out.extend_from_slice(&bits.to_be_bytes());
                }
                CpEntry::Long(v) => {
                    out.push(5);
                    out.extend_from_slice(&v.to_be_bytes());
                }
                CpEntry::Double(bits) => {
                    out.push(6);
                    out.extend_from_slice(&bits.to_be_bytes());
                }
                CpEntry::Class(name_idx) => {
                    out.push(7);
                    out.extend_from_slice(&name_idx.to_be_bytes());
                }
                CpEntry::String(utf8_idx) => {
                    out.push(8);
                    out.extend_from_slice(&utf8_idx.to_be_bytes());
                }
                CpEntry::Fieldref(c, nt) => {
                    out.push(9);
                    out.extend_from_slice(&c.to_be_bytes());
                    out.extend_from_slice(&nt.to_be_bytes());
                }
                CpEntry::Methodref(c, nt) => {
                    out.push(10);
                    out.extend_from_slice(&c.to_be_bytes());
                    out.extend_from_slice(&nt.to_be_bytes());
                }
                CpEntry::InterfaceMethodref(c, nt) => {
                    out.push(11);
                    out.extend_from_slice(&c.to_be_bytes());
                    out.extend_from_slice(&nt.to_be_bytes());
                }
                CpEntry::NameAndType(n, d) => {
                    out.push(12);
                    out.extend_from_slice(&n.to_be_bytes());
                    out.extend_from_slice(&d.to_be_bytes());
                }
            }
        }
    }
}

pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    /// `0` means a `finally`/catch-all entry.
    pub catch_type: u16,
}

pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionTableEntry>,
}

pub enum AttributeData {
    Code(CodeAttribute),
    /// A pre-encoded attribute body (e.g. an empty `Code`-less marker), used
    /// for cases that don't need a dedicated variant.
    Raw(Vec<u8>),
}

pub struct Attribute {
    pub name_index: u16,
    pub data: AttributeData,
}

impl Attribute {
    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.name_index.to_be_bytes());
        match &self.data {
            AttributeData::Raw(bytes) => {
                out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
                out.extend_from_slice(bytes);
            }
            AttributeData::Code(code) => {
                let mut body = Vec::new();
                body.extend_from_slice(&code.max_stack.to_be_bytes());
                body.extend_from_slice(&code.max_locals.to_be_bytes());
                body.extend_from_slice(&(code.code.len() as u32).to_be_bytes());
                body.extend_from_slice(&code.code);
                body.extend_from_slice(&(code.exception_table.len() as u16).to_be_bytes());
                for e in &code.exception_table {
                    body.extend_from_slice(&e.start_pc.to_be_bytes());
                    body.extend_from_slice(&e.end_pc.to_be_bytes());
                    body.extend_from_slice(&e.handler_pc.to_be_bytes());
                    body.extend_from_slice(&e.catch_type.to_be_bytes());
                }
                body.extend_from_slice(&0u16.to_be_bytes()); // no nested attributes
                out.extend_from_slice(&(body.len() as u32).to_be_bytes());
                out.extend_from_slice(&body);
            }
        }
    }
}

pub struct MemberInfo {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<Attribute>,
}

impl MemberInfo {
    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.access_flags.to_be_bytes());
        out.extend_from_slice(&self.name_index.to_be_bytes());
        out.extend_from_slice(&self.descriptor_index.to_be_bytes());
        out.extend_from_slice(&(self.attributes.len() as u16).to_be_bytes());
        for a in &self.attributes {
            a.write(out);
        }
    }
}

/// Accumulates one class file's structure; `pool` is shared mutably while
/// fields/methods are built so constant-pool entries interleave naturally
/// with member emission, then `finish` serializes everything.
pub struct ClassFileWriter {
    pub pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MemberInfo>,
    /// Class-level attributes (e.g. `RuntimeVisibleAnnotations` on a
    /// synthesized `@interface`), empty for every ordinary class/enum.
    pub attributes: Vec<Attribute>,
}

impl ClassFileWriter {
    pub fn new(access_flags: u16, this_internal: &str, super_internal: &str) -> Self {
        let mut pool = ConstantPool::default();
        let this_class = pool.class(this_internal);
        let super_class = pool.class(super_internal);
        ClassFileWriter {
            pool,
            access_flags,
            this_class,
            super_class,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn add_interface(&mut self, internal_name: &str) {
        let idx = self.pool.class(internal_name);
        self.interfaces.push(idx);
    }

    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFEBABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // minor version
        out.extend_from_slice(&JAVA_8_MAJOR_VERSION.to_be_bytes());
        self.pool.write(&mut out);
        out.extend_from_slice(&self.access_flags.to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        out.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
        for i in &self.interfaces {
            out.extend_from_slice(&i.to_be_bytes());
        }
        out.extend_from_slice(&(self.fields.len() as u16).to_be_bytes());
        for f in &self.fields {
            f.write(&mut out);
        }
        out.extend_from_slice(&(self.methods.len() as u16).to_be_bytes());
        for m in &self.methods {
            m.write(&mut out);
        }
        out.extend_from_slice(&(self.attributes.len() as u16).to_be_bytes());
        for a in &self.attributes {
            a.write(&mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_starts_with_cafebabe_and_java8_major_version() {
        let writer = ClassFileWriter::new(ACC_PUBLIC | ACC_SUPER, "Example", "java/lang/Object");
        let bytes = writer.finish();
        assert_eq!(&bytes[0..4], &0xCAFEBABEu32.to_be_bytes());
        assert_eq!(u16::from_be_bytes([bytes[6], bytes[7]]), JAVA_8_MAJOR_VERSION);
    }

    #[test]
    fn constant_pool_dedupes_repeated_utf8_entries() {
        let mut pool = ConstantPool::default();
        let a = pool.utf8("java/lang/Object");
        let b = pool.utf8("java/lang/Object");
        assert_eq!(a, b);
    }
}
