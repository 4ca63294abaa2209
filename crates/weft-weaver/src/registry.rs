//! Trigger annotation registry and annotation declaration lookup

use std::collections::{BTreeSet, HashMap};

use weft_ast::{Annotation, AnnotationTypeDecl, CompilationUnit};

/// The set of annotation names that trigger weaving.
///
/// Scoped to one build: seeded from configuration, then grown by the
/// eligibility resolver whenever it proves an annotation is a trigger
/// through one of its meta-annotations. Entries are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerSet {
    names: BTreeSet<String>,
}

impl TriggerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed<I, S>(seed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: seed.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a line-based allow-list: one qualified name per line, `#`
    /// starts a comment, blank lines are ignored.
    pub fn parse_supports(content: &str) -> Vec<String> {
        content
            .lines()
            .map(|line| line.split('#').next().unwrap_or("").trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn from_supports_file(content: &str) -> Self {
        Self::with_seed(Self::parse_supports(content))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Add a trigger; returns `true` if it was not known before
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Trigger names in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Access to annotation type declarations, for meta-annotation lookup
pub trait AnnotationLookup {
    /// Meta-annotations declared on the annotation type `name`, or `None`
    /// when its declaration is not visible to this build.
    fn meta_annotations(&self, name: &str) -> Option<&[Annotation]>;
}

/// Annotation declarations collected from every unit of a build
#[derive(Debug, Clone, Default)]
pub struct AnnotationCatalog {
    decls: HashMap<String, Vec<Annotation>>,
}

impl AnnotationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, decl: &AnnotationTypeDecl) {
        self.decls.insert(decl.name.clone(), decl.meta.clone());
    }

    pub fn register_unit(&mut self, unit: &CompilationUnit) {
        for decl in &unit.annotation_types {
            self.register(decl);
        }
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

impl AnnotationLookup for AnnotationCatalog {
    fn meta_annotations(&self, name: &str) -> Option<&[Annotation]> {
        self.decls.get(name).map(Vec::as_slice)
    }
}
