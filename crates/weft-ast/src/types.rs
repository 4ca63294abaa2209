//! Type references as they appear in signatures and local declarations

use serde::{Deserialize, Serialize};
use crate::Literal;

/// A reference to a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    Void,
    Boolean,
    Char,
    Int,
    Long,
    Double,
    /// Class or interface type, possibly with generic arguments: `List<String>`
    Named(String),
    /// Array type: `int[]`
    Array(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            TypeRef::Boolean | TypeRef::Char | TypeRef::Int | TypeRef::Long | TypeRef::Double
        )
    }

    /// The zero value a variable of this type starts with.
    pub fn default_value(&self) -> Literal {
        match self {
            TypeRef::Boolean => Literal::Bool(false),
            TypeRef::Char => Literal::Char('\0'),
            TypeRef::Int => Literal::Int(0),
            TypeRef::Long => Literal::Long(0),
            TypeRef::Double => Literal::Double(0.0),
            TypeRef::Void | TypeRef::Named(_) | TypeRef::Array(_) => Literal::Null,
        }
    }

    /// The reference type a value of this type is boxed to when it passes
    /// through an `Object`-typed hook.
    pub fn boxed(&self) -> TypeRef {
        match self {
            TypeRef::Boolean => TypeRef::named("Boolean"),
            TypeRef::Char => TypeRef::named("Character"),
            TypeRef::Int => TypeRef::named("Integer"),
            TypeRef::Long => TypeRef::named("Long"),
            TypeRef::Double => TypeRef::named("Double"),
            TypeRef::Void => TypeRef::named("Void"),
            other => other.clone(),
        }
    }

    /// Type with generic arguments stripped, as used in class literals.
    pub fn erasure(&self) -> TypeRef {
        match self {
            TypeRef::Named(name) => match name.find('<') {
                Some(idx) => TypeRef::Named(name[..idx].to_string()),
                None => self.clone(),
            },
            TypeRef::Array(inner) => TypeRef::Array(Box::new(inner.erasure())),
            other => other.clone(),
        }
    }

    pub fn display(&self) -> String {
        match self {
            TypeRef::Void => "void".to_string(),
            TypeRef::Boolean => "boolean".to_string(),
            TypeRef::Char => "char".to_string(),
            TypeRef::Int => "int".to_string(),
            TypeRef::Long => "long".to_string(),
            TypeRef::Double => "double".to_string(),
            TypeRef::Named(name) => name.clone(),
            TypeRef::Array(inner) => format!("{}[]", inner.display()),
        }
    }
}
