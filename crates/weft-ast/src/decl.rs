//! Declaration AST nodes (types, fields, methods)

use serde::{Deserialize, Serialize};
use crate::{Annotation, Block, Expr, Span, TypeRef};

/// Stable handle of a type in a [`crate::CompilationUnit`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u32);

/// Stable handle of a method in a [`crate::CompilationUnit`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclKind {
    Class,
    Interface,
    Enum,
}

/// A class, interface or enum declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    /// `None` for anonymous classes
    pub name: Option<String>,
    pub kind: DeclKind,
    pub annotations: Vec<Annotation>,
    pub fields: Vec<FieldDecl>,
    /// Methods in declaration order
    pub methods: Vec<MethodId>,
    /// Member types declared inside this one
    pub nested: Vec<TypeId>,
    /// The type this one is declared in, if any
    pub enclosing: Option<TypeId>,
    pub span: Span,
}

impl TypeDecl {
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            kind: DeclKind::Class,
            annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            nested: Vec::new(),
            enclosing: None,
            span: Span::synthetic(),
        }
    }

    pub fn anonymous(enclosing: TypeId) -> Self {
        Self {
            name: None,
            enclosing: Some(enclosing),
            ..Self::class("")
        }
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn nested_in(mut self, enclosing: TypeId) -> Self {
        self.enclosing = Some(enclosing);
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_none()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A field declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeRef,
    pub is_static: bool,
    pub is_final: bool,
    pub init: Option<Expr>,
    /// Added by a compiler pass rather than written by the user
    pub synthetic: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodKind {
    Method,
    Constructor,
    /// Static or instance initializer block
    Initializer,
}

/// A method parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A method, constructor or initializer declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub kind: MethodKind,
    pub owner: TypeId,
    pub annotations: Vec<Annotation>,
    pub params: Vec<Param>,
    /// Resolved return type; `None` for constructors and initializers or
    /// when the host could not attribute the signature
    pub return_type: Option<TypeRef>,
    pub is_static: bool,
    pub is_abstract: bool,
    /// `None` when the method has no body or the host lost its tree
    pub body: Option<Block>,
    pub span: Span,
}

impl MethodDecl {
    pub fn new(owner: TypeId, name: impl Into<String>, return_type: TypeRef, body: Block) -> Self {
        Self {
            name: name.into(),
            kind: MethodKind::Method,
            owner,
            annotations: Vec::new(),
            params: Vec::new(),
            return_type: Some(return_type),
            is_static: false,
            is_abstract: false,
            body: Some(body),
            span: Span::synthetic(),
        }
    }

    pub fn constructor(owner: TypeId, body: Block) -> Self {
        Self {
            kind: MethodKind::Constructor,
            return_type: None,
            ..Self::new(owner, "<init>", TypeRef::Void, body)
        }
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.params.push(Param::new(name, ty));
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn into_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn is_void(&self) -> bool {
        self.return_type.as_ref().is_some_and(TypeRef::is_void)
    }
}
