//! Extraction of type information from a checked schema program.

use crate::model::SchemaProgram;
use crate::parser::DeclarationBody;
use typeweave_core::{
    ExtractedField, ExtractedType, ExtractionResult, Extractor, Result, TypeKind,
};

/// Turns every declaration of a [`SchemaProgram`] into an [`ExtractedType`].
///
/// Pure and deterministic: output order is module order, then source order.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeExtractor;

impl TypeExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor<SchemaProgram> for TypeExtractor {
    fn extract(&self, model: &SchemaProgram) -> Result<ExtractionResult> {
        let types = model
            .declarations()
            .iter()
            .map(|declaration| {
                let mut extracted = ExtractedType::named(declaration.name.clone());
                extracted.module = Some(declaration.module.to_string_lossy().into_owned());

                match &declaration.body {
                    DeclarationBody::Object(fields) => {
                        extracted.fields = fields
                            .iter()
                            .map(|f| ExtractedField {
                                name: f.name.clone(),
                                ty: f.ty.clone(),
                            })
                            .collect();
                    }
                    DeclarationBody::Enum(variants) => {
                        extracted.kind = TypeKind::Enum;
                        extracted.variants = variants.iter().map(|v| v.name.clone()).collect();
                    }
                }
                extracted
            })
            .collect();

        Ok(ExtractionResult::new(types))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_module_at;
    use std::path::PathBuf;
    use typeweave_core::TypeRef;

    fn program(source: &str) -> SchemaProgram {
        let decls = parse_module_at(source, "a.schema").unwrap();
        SchemaProgram::check(vec![(PathBuf::from("a.schema"), decls)]).unwrap()
    }

    #[test]
    fn test_empty_program_extracts_empty_result() {
        let result = TypeExtractor.extract(&SchemaProgram::default()).unwrap();
        assert_eq!(result, ExtractionResult::default());
    }

    #[test]
    fn test_extracts_objects_and_enums() {
        let result = TypeExtractor
            .extract(&program(
                "type Foo { tags: [String]? }\nenum Level { Low, High }",
            ))
            .unwrap();

        assert_eq!(result.len(), 2);

        let foo = result.get("Foo").unwrap();
        assert_eq!(foo.kind, TypeKind::Object);
        assert_eq!(foo.module.as_deref(), Some("a.schema"));
        assert_eq!(
            foo.fields,
            vec![ExtractedField {
                name: "tags".to_string(),
                ty: TypeRef::optional(TypeRef::list(TypeRef::named("String"))),
            }]
        );

        let level = result.get("Level").unwrap();
        assert_eq!(level.kind, TypeKind::Enum);
        assert_eq!(level.variants, vec!["Low", "High"]);
        assert!(level.fields.is_empty());
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let model = program("type B {}\ntype A { b: B }");
        let first = TypeExtractor.extract(&model).unwrap();
        let second = TypeExtractor.extract(&model).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.types[0].name, "B");
    }
}
