//! Compilation unit arena

use serde::{Deserialize, Serialize};
use crate::{AnnotationTypeDecl, MethodDecl, MethodId, TypeDecl, TypeId};

/// One source file as handed over by the host pipeline.
///
/// Types and methods live in flat arenas addressed by [`TypeId`] and
/// [`MethodId`]. Handles stay valid for the lifetime of the unit: nodes are
/// only ever appended, never removed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub path: String,
    pub package: Option<String>,
    pub imports: Vec<String>,
    /// Annotation types declared in this unit
    pub annotation_types: Vec<AnnotationTypeDecl>,
    types: Vec<TypeDecl>,
    methods: Vec<MethodDecl>,
}

impl CompilationUnit {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// Add a type; nested and anonymous types are linked into their
    /// enclosing type's member list.
    pub fn add_type(&mut self, decl: TypeDecl) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        let enclosing = decl.enclosing;
        let anonymous = decl.is_anonymous();
        self.types.push(decl);
        if let (Some(parent), false) = (enclosing, anonymous) {
            if let Some(parent) = self.ty_mut(parent) {
                parent.nested.push(id);
            }
        }
        id
    }

    /// Add a method and register it with its owner
    pub fn add_method(&mut self, decl: MethodDecl) -> MethodId {
        let id = MethodId(self.methods.len() as u32);
        let owner = decl.owner;
        self.methods.push(decl);
        if let Some(owner) = self.ty_mut(owner) {
            owner.methods.push(id);
        }
        id
    }

    pub fn add_annotation_type(&mut self, decl: AnnotationTypeDecl) {
        self.annotation_types.push(decl);
    }

    pub fn ty(&self, id: TypeId) -> Option<&TypeDecl> {
        self.types.get(id.0 as usize)
    }

    pub fn ty_mut(&mut self, id: TypeId) -> Option<&mut TypeDecl> {
        self.types.get_mut(id.0 as usize)
    }

    pub fn method(&self, id: MethodId) -> Option<&MethodDecl> {
        self.methods.get(id.0 as usize)
    }

    pub fn method_mut(&mut self, id: MethodId) -> Option<&mut MethodDecl> {
        self.methods.get_mut(id.0 as usize)
    }

    pub fn types(&self) -> impl Iterator<Item = (TypeId, &TypeDecl)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, t)| (TypeId(i as u32), t))
    }

    pub fn methods(&self) -> impl Iterator<Item = (MethodId, &MethodDecl)> {
        self.methods
            .iter()
            .enumerate()
            .map(|(i, m)| (MethodId(i as u32), m))
    }

    /// Types not declared inside another type
    pub fn top_level_types(&self) -> impl Iterator<Item = (TypeId, &TypeDecl)> {
        self.types().filter(|(_, t)| t.enclosing.is_none())
    }

    /// Every method of the unit in file declaration order
    pub fn candidate_methods(&self) -> Vec<MethodId> {
        let mut ids: Vec<_> = self.methods().map(|(id, m)| (m.span.start, id)).collect();
        ids.sort();
        ids.into_iter().map(|(_, id)| id).collect()
    }

    /// Name of a type as written in source, including enclosing types:
    /// `Outer.Inner`. `None` for anonymous types.
    pub fn source_name(&self, id: TypeId) -> Option<String> {
        let decl = self.ty(id)?;
        let name = decl.name.as_ref()?;
        match decl.enclosing.and_then(|parent| self.source_name(parent)) {
            Some(parent) => Some(format!("{}.{}", parent, name)),
            None => Some(name.clone()),
        }
    }

    /// Fully qualified name of a type: `com.example.Outer.Inner`
    pub fn qualified_name(&self, id: TypeId) -> Option<String> {
        let name = self.source_name(id)?;
        Some(match &self.package {
            Some(package) => format!("{}.{}", package, name),
            None => name,
        })
    }
}
