//! Human-readable formatter for extraction results.

use colored::*;
use std::collections::BTreeMap;
use typeweave_core::{ExtractedType, ExtractionResult, TypeKind};
use typeweave_dispatch::ExecutionMode;

pub fn print_summary(result: &ExtractionResult, mode: ExecutionMode) {
    println!("\nTypeweave Extraction Results");
    println!("============================\n");

    let objects = result
        .types
        .iter()
        .filter(|t| t.kind == TypeKind::Object)
        .count();
    println!("Statistics:");
    println!("  Types: {}", result.len());
    println!("  Objects: {}", objects);
    println!("  Enums: {}", result.len() - objects);
    println!("  Execution: {}\n", mode);

    if result.is_empty() {
        println!("{}", "No types found.".dimmed());
        return;
    }

    // Group by declaring module, keeping module order stable
    let mut by_module: BTreeMap<&str, Vec<&ExtractedType>> = BTreeMap::new();
    for ty in &result.types {
        by_module
            .entry(ty.module.as_deref().unwrap_or("<unknown>"))
            .or_default()
            .push(ty);
    }

    for (module, types) in by_module {
        println!("{}", module.bold());
        for ty in types {
            println!("  {}", describe(ty));
        }
        println!();
    }
}

/// One-line description, e.g. `type User { id: Int, name: String? }`.
pub fn describe(ty: &ExtractedType) -> String {
    match ty.kind {
        TypeKind::Object => {
            let fields: Vec<String> = ty
                .fields
                .iter()
                .map(|f| format!("{}: {}", f.name, f.ty))
                .collect();
            format!("type {} {{ {} }}", ty.name, fields.join(", "))
        }
        TypeKind::Enum => format!("enum {} {{ {} }}", ty.name, ty.variants.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typeweave_core::{ExtractedField, TypeRef};

    #[test]
    fn test_describe_object() {
        let mut ty = ExtractedType::named("User");
        ty.fields = vec![
            ExtractedField {
                name: "id".to_string(),
                ty: TypeRef::named("Int"),
            },
            ExtractedField {
                name: "tags".to_string(),
                ty: TypeRef::list(TypeRef::named("String")),
            },
        ];
        assert_eq!(describe(&ty), "type User { id: Int, tags: [String] }");
    }

    #[test]
    fn test_describe_enum() {
        let mut ty = ExtractedType::named("Role");
        ty.kind = TypeKind::Enum;
        ty.variants = vec!["Admin".to_string(), "Member".to_string()];
        assert_eq!(describe(&ty), "enum Role { Admin, Member }");
    }
}
