//! Annotations and annotation type declarations

use serde::{Deserialize, Serialize};
use crate::{Literal, Span};

/// An annotation applied to a type, method or annotation declaration:
/// `@Aspect(builder = "timing")`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Fully qualified annotation type name
    pub name: String,
    pub args: Vec<AnnotationArg>,
    pub span: Span,
}

/// A named annotation attribute: `builder = "timing"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationArg {
    pub name: String,
    pub value: Literal,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            span: Span::synthetic(),
        }
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: Literal) -> Self {
        self.args.push(AnnotationArg {
            name: name.into(),
            value,
        });
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Look up an attribute value by name
    pub fn arg(&self, name: &str) -> Option<&Literal> {
        self.args.iter().find(|a| a.name == name).map(|a| &a.value)
    }

    /// Last segment of the qualified name
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// Declaration of an annotation type, carrying the meta-annotations
/// placed on it: `@Aspect @interface Timed {}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationTypeDecl {
    /// Fully qualified name of the declared annotation type
    pub name: String,
    pub meta: Vec<Annotation>,
    pub span: Span,
}

impl AnnotationTypeDecl {
    pub fn new(name: impl Into<String>, meta: Vec<Annotation>) -> Self {
        Self {
            name: name.into(),
            meta,
            span: Span::synthetic(),
        }
    }
}
