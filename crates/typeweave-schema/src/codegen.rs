//! Rendering of an extraction result as a Rust module.

use crate::model::is_builtin;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Write;
use typeweave_core::{ExtractedType, ExtractionResult, TypeKind, TypeRef};

/// First line of every generated module.
pub const GENERATED_HEADER: &str = "// @generated by typeweave. Do not edit.";

const RESERVED: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
    "where", "while", "abstract", "become", "box", "do", "final", "macro", "override", "priv",
    "try", "typeof", "unsized", "virtual", "yield",
];

// Cannot be raw identifiers
const UNRAWABLE: &[&str] = &["self", "Self", "super", "crate"];

/// Renders `result` as Rust source.
///
/// Objects become structs and enums become fieldless enums. Fields that would
/// make a type infinitely sized (a by-value cycle back to the owner) are boxed.
pub fn render_module(result: &ExtractionResult) -> String {
    let cycles = CycleIndex::new(result);
    let mut out = String::new();

    out.push_str(GENERATED_HEADER);
    out.push('\n');

    let modules: BTreeSet<&str> = result
        .types
        .iter()
        .filter_map(|ty| ty.module.as_deref())
        .collect();
    if !modules.is_empty() {
        let list: Vec<&str> = modules.into_iter().collect();
        let _ = writeln!(out, "// Source modules: {}", list.join(", "));
    }

    for ty in &result.types {
        out.push('\n');
        match ty.kind {
            TypeKind::Object => render_struct(&mut out, ty, &cycles),
            TypeKind::Enum => render_enum(&mut out, ty),
        }
    }

    out
}

fn render_doc(out: &mut String, ty: &ExtractedType) {
    if let Some(module) = &ty.module {
        let _ = writeln!(out, "/// Declared in `{}`.", module);
    }
}

fn render_struct(out: &mut String, ty: &ExtractedType, cycles: &CycleIndex<'_>) {
    render_doc(out, ty);
    out.push_str("#[derive(Debug, Clone, PartialEq)]\n");
    if ty.fields.is_empty() {
        let _ = writeln!(out, "pub struct {} {{}}", ident(&ty.name));
        return;
    }

    let _ = writeln!(out, "pub struct {} {{", ident(&ty.name));
    for field in &ty.fields {
        let boxed = is_by_value(&field.ty) && cycles.reaches(field.ty.base_name(), &ty.name);
        let _ = writeln!(
            out,
            "    pub {}: {},",
            ident(&field.name),
            rust_type(&field.ty, boxed)
        );
    }
    out.push_str("}\n");
}

fn render_enum(out: &mut String, ty: &ExtractedType) {
    render_doc(out, ty);
    out.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]\n");
    if ty.variants.is_empty() {
        let _ = writeln!(out, "pub enum {} {{}}", ident(&ty.name));
        return;
    }

    let _ = writeln!(out, "pub enum {} {{", ident(&ty.name));
    for variant in &ty.variants {
        let _ = writeln!(out, "    {},", ident(variant));
    }
    out.push_str("}\n");
}

fn rust_type(ty: &TypeRef, boxed: bool) -> String {
    match ty {
        TypeRef::Named { name } => {
            let base = match name.as_str() {
                "Int" => "i64".to_string(),
                "Float" => "f64".to_string(),
                "Bool" => "bool".to_string(),
                "String" => "String".to_string(),
                other => ident(other),
            };
            if boxed {
                format!("Box<{}>", base)
            } else {
                base
            }
        }
        TypeRef::Optional { of } => format!("Option<{}>", rust_type(of, boxed)),
        // Vec already provides indirection
        TypeRef::List { of } => format!("Vec<{}>", rust_type(of, false)),
    }
}

/// Escapes names that collide with Rust keywords.
pub fn ident(name: &str) -> String {
    if UNRAWABLE.contains(&name) {
        format!("{}_", name)
    } else if RESERVED.contains(&name) {
        format!("r#{}", name)
    } else {
        name.to_string()
    }
}

/// True if `ty` holds its target by value (not behind a list).
fn is_by_value(ty: &TypeRef) -> bool {
    match ty {
        TypeRef::Named { .. } => true,
        TypeRef::Optional { of } => is_by_value(of),
        TypeRef::List { .. } => false,
    }
}

/// By-value containment edges between object types.
struct CycleIndex<'a> {
    edges: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> CycleIndex<'a> {
    fn new(result: &'a ExtractionResult) -> Self {
        let objects: HashSet<&str> = result
            .types
            .iter()
            .filter(|t| t.kind == TypeKind::Object)
            .map(|t| t.name.as_str())
            .collect();

        let edges = result
            .types
            .iter()
            .filter(|t| t.kind == TypeKind::Object)
            .map(|t| {
                let targets = t
                    .fields
                    .iter()
                    .filter(|f| is_by_value(&f.ty))
                    .map(|f| f.ty.base_name())
                    .filter(|name| !is_builtin(name) && objects.contains(name))
                    .collect();
                (t.name.as_str(), targets)
            })
            .collect();

        Self { edges }
    }

    /// True if `to` is reachable from `from` (a type reaches itself).
    fn reaches(&self, from: &str, to: &str) -> bool {
        let mut stack = vec![from];
        let mut visited = HashSet::new();

        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(next) = self.edges.get(current) {
                stack.extend(next.iter().copied());
            }
        }
        false
    }
}
