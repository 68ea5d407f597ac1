//! Core data types shared by every typeweave execution context.
//!
//! Everything here crosses the isolation boundary between a dispatcher and its
//! worker process, so every type is plain owned data with serde support and
//! structural equality.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Snapshot of the project configuration needed to rebuild a program model.
///
/// A descriptor is immutable once captured and is copied (serialized), never
/// shared, when handed to a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutDescriptor {
    /// Directory that module paths are resolved against.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Schema modules in load order, relative to `root`.
    #[serde(default)]
    pub modules: Vec<PathBuf>,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

impl Default for LayoutDescriptor {
    fn default() -> Self {
        Self {
            root: default_root(),
            modules: Vec::new(),
        }
    }
}

impl LayoutDescriptor {
    /// Creates a descriptor rooted at `root` with no modules.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            modules: Vec::new(),
        }
    }

    /// Adds a module (builder style).
    pub fn with_module(mut self, module: impl Into<PathBuf>) -> Self {
        self.modules.push(module.into());
        self
    }

    /// Resolves a listed module against the layout root.
    pub fn resolve(&self, module: &Path) -> PathBuf {
        self.root.join(module)
    }

    /// Checks that every module path stays inside the layout root.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidPath`] for absolute module paths and
    /// [`crate::Error::PathTraversal`] for paths that climb out of the root.
    pub fn validate(&self) -> crate::Result<()> {
        for module in &self.modules {
            crate::validation::validate_relative_path(module, &self.root)?;
        }
        Ok(())
    }
}

/// Output of one extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Discovered types in module order, then declaration order.
    #[serde(default)]
    pub types: Vec<ExtractedType>,
}

impl ExtractionResult {
    /// Creates a result from a list of types.
    pub fn new(types: Vec<ExtractedType>) -> Self {
        Self { types }
    }

    /// Finds a type by name.
    pub fn get(&self, name: &str) -> Option<&ExtractedType> {
        self.types.iter().find(|ty| ty.name == name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Kind of an extracted type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// Record with named fields
    #[default]
    Object,
    /// Closed set of named variants
    Enum,
}

impl TypeKind {
    fn is_object(&self) -> bool {
        matches!(self, TypeKind::Object)
    }
}

/// A single discovered type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedType {
    pub name: String,

    /// Module that declares the type, as listed in the layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,

    #[serde(default, skip_serializing_if = "TypeKind::is_object")]
    pub kind: TypeKind,

    /// Fields of an object type (empty for enums).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<ExtractedField>,

    /// Variants of an enum type (empty for objects).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<String>,
}

impl ExtractedType {
    /// Creates an object type with only a name, no fields and no module.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: None,
            kind: TypeKind::Object,
            fields: Vec::new(),
            variants: Vec::new(),
        }
    }
}

/// A field of an object type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

/// Reference to a type from a field position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeRef {
    /// A builtin or declared type, by name.
    Named { name: String },
    /// `[T]`
    List { of: Box<TypeRef> },
    /// `T?`
    Optional { of: Box<TypeRef> },
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named { name: name.into() }
    }

    pub fn list(of: TypeRef) -> Self {
        TypeRef::List { of: Box::new(of) }
    }

    pub fn optional(of: TypeRef) -> Self {
        TypeRef::Optional { of: Box::new(of) }
    }

    /// The innermost named type.
    pub fn base_name(&self) -> &str {
        match self {
            TypeRef::Named { name } => name,
            TypeRef::List { of } | TypeRef::Optional { of } => of.base_name(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named { name } => write!(f, "{}", name),
            TypeRef::List { of } => write!(f, "[{}]", of),
            TypeRef::Optional { of } => write!(f, "{}?", of),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_layout_defaults() {
        let layout: LayoutDescriptor = serde_json::from_value(json!({ "modules": [] })).unwrap();
        assert_eq!(layout.root, PathBuf::from("."));
        assert!(layout.modules.is_empty());
        assert_eq!(layout, LayoutDescriptor::default());
    }

    #[test]
    fn test_minimal_type_deserializes() {
        let result: ExtractionResult =
            serde_json::from_value(json!({ "types": [{ "name": "Foo" }] })).unwrap();
        assert_eq!(result, ExtractionResult::new(vec![ExtractedType::named("Foo")]));
    }

    #[test]
    fn test_minimal_type_serializes_compactly() {
        let value = serde_json::to_value(ExtractedType::named("Foo")).unwrap();
        assert_eq!(value, json!({ "name": "Foo" }));
    }

    #[test]
    fn test_nested_type_ref_survives_json() {
        let field = ExtractedField {
            name: "tags".to_string(),
            ty: TypeRef::optional(TypeRef::list(TypeRef::named("String"))),
        };
        let json = serde_json::to_string(&field).unwrap();
        let back: ExtractedField = serde_json::from_str(&json).unwrap();
        assert_eq!(back, field);
        assert_eq!(back.ty.to_string(), "[String]?");
        assert_eq!(back.ty.base_name(), "String");
    }

    #[test]
    fn test_result_lookup() {
        let result = ExtractionResult::new(vec![
            ExtractedType::named("User"),
            ExtractedType::named("Role"),
        ]);
        assert_eq!(result.len(), 2);
        assert!(result.get("Role").is_some());
        assert!(result.get("Missing").is_none());
    }
}
