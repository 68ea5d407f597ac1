//! Type-checked program model built from a layout descriptor.

use crate::parser::{parse_module, Declaration, DeclarationBody};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use typeweave_core::validation::validate_path;
use typeweave_core::{Error, LayoutDescriptor, ModelBuilder, Result};

/// Types every program can reference without declaring them.
pub const BUILTIN_TYPES: &[&str] = &["Int", "Float", "Bool", "String"];

/// Returns true for builtin scalar names.
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_TYPES.contains(&name)
}

/// A declaration together with the module that declares it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    pub name: String,
    /// Module path as listed in the layout.
    pub module: PathBuf,
    pub line: usize,
    pub body: DeclarationBody,
}

/// In-memory, type-checked schema program.
///
/// Construction guarantees that type names are unique, members are unique
/// within their type and every field reference resolves.
#[derive(Debug, Clone, Default)]
pub struct SchemaProgram {
    modules: Vec<PathBuf>,
    declarations: Vec<TypeDeclaration>,
    index: HashMap<String, usize>,
}

impl SchemaProgram {
    /// Type-checks parsed modules, given in load order.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateType`] if a name is declared twice
    /// - [`Error::DuplicateMember`] if a field or variant repeats
    /// - [`Error::UnknownType`] if a field references an undeclared type
    /// - [`Error::Parse`] if a module redeclares a builtin
    pub fn check(modules: Vec<(PathBuf, Vec<Declaration>)>) -> Result<Self> {
        let mut program = SchemaProgram::default();

        for (module, declarations) in modules {
            for declaration in declarations {
                program.declare(&module, declaration)?;
            }
            program.modules.push(module);
        }

        program.resolve_references()?;
        Ok(program)
    }

    fn declare(&mut self, module: &Path, declaration: Declaration) -> Result<()> {
        if is_builtin(&declaration.name) {
            return Err(Error::Parse {
                module: module.to_path_buf(),
                line: declaration.line,
                message: format!("cannot redeclare builtin type `{}`", declaration.name),
            });
        }

        if let Some(&existing) = self.index.get(&declaration.name) {
            return Err(Error::DuplicateType {
                name: declaration.name,
                first: self.declarations[existing].module.clone(),
                second: module.to_path_buf(),
            });
        }

        let mut seen = HashSet::new();
        let members: Vec<&str> = match &declaration.body {
            DeclarationBody::Object(fields) => fields.iter().map(|f| f.name.as_str()).collect(),
            DeclarationBody::Enum(variants) => variants.iter().map(|v| v.name.as_str()).collect(),
        };
        for member in members {
            if !seen.insert(member) {
                return Err(Error::DuplicateMember {
                    owner: declaration.name.clone(),
                    member: member.to_string(),
                });
            }
        }

        self.index
            .insert(declaration.name.clone(), self.declarations.len());
        self.declarations.push(TypeDeclaration {
            name: declaration.name,
            module: module.to_path_buf(),
            line: declaration.line,
            body: declaration.body,
        });
        Ok(())
    }

    fn resolve_references(&self) -> Result<()> {
        for declaration in &self.declarations {
            let DeclarationBody::Object(fields) = &declaration.body else {
                continue;
            };
            for field in fields {
                let target = field.ty.base_name();
                if !is_builtin(target) && !self.index.contains_key(target) {
                    return Err(Error::UnknownType {
                        name: target.to_string(),
                        referenced_by: format!("{}.{}", declaration.name, field.name),
                        module: declaration.module.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// All declarations in module order, then source order.
    pub fn declarations(&self) -> &[TypeDeclaration] {
        &self.declarations
    }

    /// Finds a declared type by name.
    pub fn lookup(&self, name: &str) -> Option<&TypeDeclaration> {
        self.index.get(name).map(|&i| &self.declarations[i])
    }

    /// Modules that make up the program, in load order.
    pub fn modules(&self) -> &[PathBuf] {
        &self.modules
    }

    /// Declared types that `name`'s fields reference, builtins excluded.
    pub fn references(&self, name: &str) -> Vec<&str> {
        let Some(DeclarationBody::Object(fields)) = self.lookup(name).map(|d| &d.body) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = fields
            .iter()
            .map(|f| f.ty.base_name())
            .filter(|n| !is_builtin(n))
            .collect();
        out.dedup();
        out
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

/// Reads, parses and type-checks the modules listed in a layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaModelBuilder;

impl SchemaModelBuilder {
    pub fn new() -> Self {
        Self
    }

    fn load_module(&self, layout: &LayoutDescriptor, module: &Path) -> Result<Vec<Declaration>> {
        let path = layout.resolve(module);
        if !path.is_file() {
            return Err(Error::ModuleNotFound { path });
        }
        // Catches symlinks that leave the root
        validate_path(&path, &layout.root)?;

        let source = std::fs::read_to_string(&path)?;
        parse_module(&source, module)
    }
}

impl ModelBuilder for SchemaModelBuilder {
    type Model = SchemaProgram;

    fn build(&self, layout: &LayoutDescriptor) -> Result<SchemaProgram> {
        layout.validate()?;

        let mut parsed = Vec::with_capacity(layout.modules.len());
        for module in &layout.modules {
            let declarations = self.load_module(layout, module)?;
            tracing::trace!(
                module = %module.display(),
                declarations = declarations.len(),
                "parsed schema module"
            );
            parsed.push((module.clone(), declarations));
        }

        let program = SchemaProgram::check(parsed)?;
        tracing::debug!(
            modules = program.modules().len(),
            types = program.len(),
            "built schema program"
        );
        Ok(program)
    }
}
