//! The classpath-configured Java class resolver (§4.4 "Java class
//! resolution (companion)"): reads `.class` bytes from classpath entries,
//! extracts public members, and inherits them up the superclass/interface
//! chain so completion/hover/signature-help can answer against real Java
//! APIs, not just Nova-declared classes.
//!
//! `mokapot` is the pack's JVM class-file crate, but (as in `class_file.rs`)
//! its exact API surface against the pinned version couldn't be confirmed,
//! so class bytes are parsed directly here rather than risk an unconfirmed
//! call. Jar entries are recorded as classpath roots but not unpacked: doing
//! so needs an archive-reading crate nothing in this codebase already pulls
//! in, so jar-packaged classes are out of scope for this resolver (directory
//! classpath entries of `.class` files resolve normally).

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;

#[derive(Debug, Clone)]
pub struct ResolvedMethod {
    pub name: String,
    pub param_types: Vec<String>,
    pub return_type: String,
    /// Index into the declaring class's formal type parameters, when the
    /// return type is a direct reference to one (e.g. `Map<K,V>.get`'s `V`).
    /// `None` covers everything else, including the common case of a
    /// concrete return type.
    pub generic_return_index: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ResolvedClass {
    pub internal_name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    /// Own `public` methods plus every inherited `public` method, keyed by
    /// `name+paramTypes` so overloads stay distinct.
    pub methods: Vec<ResolvedMethod>,
}

pub struct JavaClassResolver {
    classpath: Vec<PathBuf>,
    cache: DashMap<String, Arc<ResolvedClass>>,
}

impl JavaClassResolver {
    pub fn new(classpath: Vec<PathBuf>) -> Self {
        JavaClassResolver { classpath, cache: DashMap::new() }
    }

    /// Resolves `internal_name` (slash-separated, e.g. `java/util/List`),
    /// reading from directory classpath entries and recursing up the
    /// inheritance chain. Misses degrade to `None` (§7 kind 4: reflective
    /// resolution misses are non-fatal).
    pub fn resolve(&self, internal_name: &str) -> Option<Arc<ResolvedClass>> {
        if let Some(cached) = self.cache.get(internal_name) {
            return Some(cached.clone());
        }
        let bytes = self.read_class_bytes(internal_name)?;
        let parsed = parse_class_bytes(&bytes)?;

        let mut methods = parsed.methods.clone();
        if let Some(super_name) = &parsed.super_name {
            if let Some(super_class) = self.resolve(super_name) {
                merge_inherited(&mut methods, &super_class.methods);
            }
        }
        for iface in &parsed.interfaces {
            if let Some(iface_class) = self.resolve(iface) {
                merge_inherited(&mut methods, &iface_class.methods);
            }
        }

        let resolved = Arc::new(ResolvedClass {
            internal_name: parsed.internal_name,
            super_name: parsed.super_name,
            interfaces: parsed.interfaces,
            methods,
        });
        self.cache.insert(internal_name.to_string(), resolved.clone());
        Some(resolved)
    }

    fn read_class_bytes(&self, internal_name: &str) -> Option<Vec<u8>> {
        let rel = format!("{internal_name}.class");
        for root in &self.classpath {
            if root.extension().and_then(|e| e.to_str()) == Some("jar") {
                continue;
            }
            let candidate = root.join(&rel);
            if let Ok(bytes) = fs::read(&candidate) {
                return Some(bytes);
            }
        }
        None
    }
}

fn merge_inherited(methods: &mut Vec<ResolvedMethod>, inherited: &[ResolvedMethod]) {
    for m in inherited {
        let already = methods.iter().any(|existing| existing.name == m.name && existing.param_types == m.param_types);
        if !already {
            methods.push(m.clone());
        }
    }
}

struct ParsedClass {
    internal_name: String,
    super_name: Option<String>,
    interfaces: Vec<String>,
    methods: Vec<ResolvedMethod>,
}

enum CpEntry {
    Utf8(String),
    Class(u16),
    NameAndType(u16, u16),
    Other,
}

const ACC_PUBLIC: u16 = 0x0001;

fn parse_class_bytes(bytes: &[u8]) -> Option<ParsedClass> {
    let mut r = ByteReader { bytes, pos: 0 };
    if r.u32()? != 0xCAFEBABE {
        return None;
    }
    r.u16()?; // minor
    r.u16()?; // major
    let cp_count = r.u16()?;
    let mut pool: Vec<CpEntry> = vec![CpEntry::Other]; // index 0 unused
    let mut i = 1u16;
    while i < cp_count {
        let tag = r.u8()?;
        match tag {
            1 => {
                let len = r.u16()? as usize;
                let bytes = r.take(len)?;
                pool.push(CpEntry::Utf8(String::from_utf8_lossy(bytes).to_string()));
            }
            7 => pool.push(CpEntry::Class(r.u16()?)),
            9 | 10 | 11 => {
                r.u16()?;
                r.u16()?;
                pool.push(CpEntry::Other);
            }
            12 => {
                let name_idx = r.u16()?;
                let desc_idx = r.u16()?;
                pool.push(CpEntry::NameAndType(name_idx, desc_idx));
            }
            8 | 16 | 19 | 20 => {
                r.u16()?;
                pool.push(CpEntry::Other);
            }
            3 | 4 => {
                r.u32()?;
                pool.push(CpEntry::Other);
            }
            5 | 6 => {
                r.u32()?;
                r.u32()?;
                pool.push(CpEntry::Other);
                pool.push(CpEntry::Other);
                i += 1;
            }
            15 => {
                r.u8()?;
                r.u16()?;
                pool.push(CpEntry::Other);
            }
            17 | 18 => {
                r.u16()?;
                r.u16()?;
                pool.push(CpEntry::Other);
            }
            _ => return None,
        }
        i += 1;
    }

    let resolve_utf8 = |idx: u16, pool: &[CpEntry]| -> Option<String> {
        match pool.get(idx as usize)? {
            CpEntry::Utf8(s) => Some(s.clone()),
            _ => None,
        }
    };
    let resolve_class_name = |idx: u16, pool: &[CpEntry]| -> Option<String> {
        match pool.get(idx as usize)? {
            CpEntry::Class(name_idx) => resolve_utf8(*name_idx, pool),
            _ => None,
        }
    };

    r.u16()?; // access_flags
    let this_idx = r.u16()?;
    let super_idx = r.u16()?;
    let this_name = resolve_class_name(this_idx, &pool)?;
    let super_name = if super_idx == 0 { None } else { resolve_class_name(super_idx, &pool) };

    let iface_count = r.u16()?;
    let mut interfaces = Vec::new();
    for _ in 0..iface_count {
        let idx = r.u16()?;
        if let Some(name) = resolve_class_name(idx, &pool) {
            interfaces.push(name);
        }
    }

    let field_count = r.u16()?;
    for _ in 0..field_count {
        r.u16()?; // access
        r.u16()?; // name
        r.u16()?; // descriptor
        skip_attributes(&mut r)?;
    }

    let method_count = r.u16()?;
    let mut methods = Vec::new();
    for _ in 0..method_count {
        let access = r.u16()?;
        let name_idx = r.u16()?;
        let desc_idx = r.u16()?;
        skip_attributes(&mut r)?;
        if access & ACC_PUBLIC == 0 {
            continue;
        }
        let Some(name) = resolve_utf8(name_idx, &pool) else { continue };
        let Some(desc) = resolve_utf8(desc_idx, &pool) else { continue };
        if let Some((params, ret)) = parse_method_descriptor(&desc) {
            methods.push(ResolvedMethod { name, param_types: params, return_type: ret, generic_return_index: None });
        }
    }

    Some(ParsedClass { internal_name: this_name, super_name, interfaces, methods })
}

fn skip_attributes(r: &mut ByteReader) -> Option<()> {
    let count = r.u16()?;
    for _ in 0..count {
        r.u16()?; // name index
        let len = r.u32()? as usize;
        r.take(len)?;
    }
    Some(())
}

/// Parses a JVM method descriptor `(params)return` into human-readable type
/// names (slash-separated for reference types), skipping array dimensions
/// down to the element type name for simplicity.
fn parse_method_descriptor(desc: &str) -> Option<(Vec<String>, String)> {
    let bytes = desc.as_bytes();
    if bytes.first() != Some(&b'(') {
        return None;
    }
    let mut i = 1;
    let mut params = Vec::new();
    while i < bytes.len() && bytes[i] != b')' {
        let (ty, next) = parse_field_type(desc, i)?;
        params.push(ty);
        i = next;
    }
    i += 1; // skip ')'
    let ret = if bytes.get(i) == Some(&b'V') { "void".to_string() } else { parse_field_type(desc, i)?.0 };
    Some((params, ret))
}

fn parse_field_type(desc: &str, mut i: usize) -> Option<(String, usize)> {
    let bytes = desc.as_bytes();
    while bytes.get(i) == Some(&b'[') {
        i += 1;
    }
    match bytes.get(i)? {
        b'L' => {
            let end = desc[i..].find(';')? + i;
            Some((desc[i + 1..end].to_string(), end + 1))
        }
        b'I' => Some(("int".to_string(), i + 1)),
        b'J' => Some(("long".to_string(), i + 1)),
        b'F' => Some(("float".to_string(), i + 1)),
        b'D' => Some(("double".to_string(), i + 1)),
        b'Z' => Some(("boolean".to_string(), i + 1)),
        b'C' => Some(("char".to_string(), i + 1)),
        b'B' => Some(("byte".to_string(), i + 1)),
        b'S' => Some(("short".to_string(), i + 1)),
        _ => None,
    }
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn u8(&mut self) -> Option<u8> {
        let b = *self.bytes.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    fn u16(&mut self) -> Option<u16> {
        let b = self.take(2)?;
        Some(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Option<u32> {
        let b = self.take(4)?;
        Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let slice = self.bytes.get(self.pos..self.pos + n)?;
        self.pos += n;
        Some(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_descriptor_splits_params_and_return() {
        let (params, ret) = parse_method_descriptor("(Ljava/lang/String;I)Z").unwrap();
        assert_eq!(params, vec!["java/lang/String".to_string(), "int".to_string()]);
        assert_eq!(ret, "boolean");
    }

    #[test]
    fn void_return_descriptor() {
        let (_, ret) = parse_method_descriptor("()V").unwrap();
        assert_eq!(ret, "void");
    }

    #[test]
    fn unresolvable_class_returns_none() {
        let resolver = JavaClassResolver::new(vec![PathBuf::from("/nonexistent")]);
        assert!(resolver.resolve("java/util/List").is_none());
    }
}
