//! Eligibility resolution
//!
//! Decides whether a method may be woven and which trigger annotation
//! governs it. Method-level annotations take priority; the owning type's
//! annotations are consulted only when the method carries no trigger.
//! Among several annotations, the first one in declaration order that
//! qualifies wins.

use tracing::{debug, info};
use weft_ast::{Annotation, CompilationUnit, Literal, MethodId, MethodKind, TypeId};

use crate::{AnnotationLookup, TriggerSet, WeaveError, WeaveSettings};

/// Where the governing trigger was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingSource {
    Method,
    Owner,
}

/// How the per-invocation aspect context gets built
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    Default,
    Named(String),
}

/// A method paired with the single trigger chosen for it
#[derive(Debug, Clone)]
pub struct AspectBinding {
    pub method: MethodId,
    pub owner: TypeId,
    /// Qualified name of the governing trigger annotation
    pub trigger: String,
    pub source: BindingSource,
    /// Only set when the trigger is the primary marker
    pub strategy: Option<Strategy>,
    /// The trigger was proven through a meta-annotation during this lookup
    pub discovered: bool,
    /// Non-fatal problems found while building the binding
    pub notes: Vec<WeaveError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Neither the method nor its owner carries a trigger
    NoTrigger,
    /// Constructors, initializers, unattributed signatures
    NoReturnType,
    /// Owner is an anonymous class
    AnonymousOwner,
    /// Abstract or interface method
    NoBody,
}

#[derive(Debug, Clone)]
pub enum Eligibility {
    Eligible(AspectBinding),
    Rejected(RejectReason),
}

impl Eligibility {
    pub fn binding(&self) -> Option<&AspectBinding> {
        match self {
            Eligibility::Eligible(binding) => Some(binding),
            Eligibility::Rejected(_) => None,
        }
    }
}

/// Outcome of resolving one annotation list
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'a> {
    pub annotation: &'a Annotation,
    pub discovered: bool,
}

pub struct EligibilityResolver<'a> {
    settings: &'a WeaveSettings,
    lookup: &'a dyn AnnotationLookup,
}

impl<'a> EligibilityResolver<'a> {
    pub fn new(settings: &'a WeaveSettings, lookup: &'a dyn AnnotationLookup) -> Self {
        Self { settings, lookup }
    }

    /// Pick the first annotation that is a trigger, directly or through one
    /// of its meta-annotations. A meta-annotated hit is added to `triggers`
    /// so later lookups in this build find it directly.
    pub fn resolve_annotations<'n>(
        &self,
        annotations: &'n [Annotation],
        triggers: &mut TriggerSet,
    ) -> Option<Resolution<'n>> {
        for annotation in annotations {
            if triggers.contains(&annotation.name) {
                return Some(Resolution {
                    annotation,
                    discovered: false,
                });
            }

            let Some(meta) = self.lookup.meta_annotations(&annotation.name) else {
                continue;
            };
            if let Some(via) = meta.iter().find(|m| triggers.contains(&m.name)) {
                info!(trigger = %annotation.name, via = %via.name, "discovered trigger annotation");
                triggers.insert(annotation.name.clone());
                return Some(Resolution {
                    annotation,
                    discovered: true,
                });
            }
        }
        None
    }

    /// Resolve a method against its own annotations, then its owner's.
    ///
    /// Host inconsistencies (unknown handle, missing owner, missing body
    /// tree on a triggered method) come back as errors; everything else
    /// that keeps the method unwoven is a silent rejection. Trigger
    /// discovery happens before the exclusion checks, so an excluded
    /// element can still grow the set.
    pub fn resolve_method(
        &self,
        unit: &CompilationUnit,
        id: MethodId,
        triggers: &mut TriggerSet,
    ) -> Result<Eligibility, WeaveError> {
        let method = unit.method(id).ok_or(WeaveError::UnknownMethod { id: id.0 })?;
        let owner = unit.ty(method.owner).ok_or_else(|| WeaveError::MissingOwner {
            method: method.name.clone(),
            span: method.span,
        })?;
        let (resolution, source) = match self.resolve_annotations(&method.annotations, triggers) {
            Some(r) => (r, BindingSource::Method),
            None => match self.resolve_annotations(&owner.annotations, triggers) {
                Some(r) => (r, BindingSource::Owner),
                None => return Ok(Eligibility::Rejected(RejectReason::NoTrigger)),
            },
        };

        let reject = if method.kind != MethodKind::Method || method.return_type.is_none() {
            Some(RejectReason::NoReturnType)
        } else if owner.is_anonymous() {
            Some(RejectReason::AnonymousOwner)
        } else if method.body.is_none() {
            if !method.is_abstract {
                return Err(WeaveError::MissingTree {
                    method: method.name.clone(),
                    span: method.span,
                });
            }
            Some(RejectReason::NoBody)
        } else {
            None
        };
        if let Some(reason) = reject {
            debug!(method = %method.name, ?reason, "excluded from weaving");
            return Ok(Eligibility::Rejected(reason));
        }

        let mut notes = Vec::new();
        let strategy = if resolution.annotation.name == self.settings.primary_marker {
            Some(self.strategy_of(resolution.annotation, &mut notes))
        } else {
            None
        };

        Ok(Eligibility::Eligible(AspectBinding {
            method: id,
            owner: method.owner,
            trigger: resolution.annotation.name.clone(),
            source,
            strategy,
            discovered: resolution.discovered,
            notes,
        }))
    }

    /// Read the strategy attribute off the primary marker. Absent means the
    /// default strategy; present but unusable degrades to the default with a
    /// note.
    fn strategy_of(&self, annotation: &Annotation, notes: &mut Vec<WeaveError>) -> Strategy {
        let attribute = &self.settings.strategy_attribute;
        match annotation.arg(attribute) {
            None => Strategy::Default,
            Some(Literal::String(name)) if !name.trim().is_empty() => {
                Strategy::Named(name.trim().to_string())
            }
            Some(_) => {
                notes.push(WeaveError::MalformedStrategy {
                    annotation: annotation.simple_name().to_string(),
                    attribute: attribute.clone(),
                    span: annotation.span,
                });
                Strategy::Default
            }
        }
    }
}
