//! Metadata cache injection
//!
//! Every woven owner gets one static field holding its reflective
//! descriptor, and every woven method one field holding the method's. Both
//! are created the first time a weave needs them and found again by name on
//! later weaves, so repeated weaves never add a second slot.

use weft_ast::{
    CompilationUnit, Expr, ExprKind, FieldDecl, MethodId, Span, TypeId, TypeRef,
};

use crate::{WeaveContext, WeaveError, WeaveSettings, WeaveStage, WeaveState};

/// Names of the cache slots a woven method reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRef {
    pub owner_field: String,
    pub method_field: String,
}

pub struct MetadataCacheInjector<'a> {
    settings: &'a WeaveSettings,
}

impl<'a> MetadataCacheInjector<'a> {
    pub fn new(settings: &'a WeaveSettings) -> Self {
        Self { settings }
    }

    pub fn owner_field_name(&self) -> String {
        format!("{}_owner_meta", self.settings.synthetic_prefix)
    }

    /// Slot name for the method at `index` in its owner's member list
    pub fn method_field_name(&self, index: usize) -> String {
        format!("{}_method_meta_{}", self.settings.synthetic_prefix, index)
    }

    /// Ensure the owner-level slot exists; returns its name and whether it
    /// was created by this call. Inserted ahead of every other field so the
    /// method slots can refer to it in their initializers.
    pub fn ensure_owner_cache(
        &self,
        unit: &mut CompilationUnit,
        owner: TypeId,
    ) -> Result<(String, bool), WeaveError> {
        let name = self.owner_field_name();
        let owner_name = unit.source_name(owner).unwrap_or_default();
        let decl = unit.ty_mut(owner).ok_or_else(|| WeaveError::MissingOwner {
            method: name.clone(),
            span: Span::synthetic(),
        })?;

        if let Some(existing) = decl.field(&name) {
            return if existing.synthetic {
                Ok((name, false))
            } else {
                Err(WeaveError::CacheSlotClash {
                    owner: owner_name,
                    field: name,
                    span: existing.span,
                })
            };
        }

        let init = Expr::static_call(
            self.settings.owner_meta_type.clone(),
            "of",
            vec![Expr::synthetic(ExprKind::ClassLiteral(TypeRef::Named(owner_name)))],
        );
        decl.fields.insert(0, synthetic_field(&name, &self.settings.owner_meta_type, init));
        Ok((name, true))
    }

    /// Ensure the method-level slot exists; returns its name and whether it
    /// was created by this call.
    pub fn ensure_method_cache(
        &self,
        unit: &mut CompilationUnit,
        owner: TypeId,
        method: MethodId,
        owner_field: &str,
    ) -> Result<(String, bool), WeaveError> {
        let decl = unit.method(method).ok_or(WeaveError::UnknownMethod { id: method.0 })?;
        let method_name = decl.name.clone();
        let param_types: Vec<Expr> = decl
            .params
            .iter()
            .map(|p| Expr::synthetic(ExprKind::ClassLiteral(p.ty.erasure())))
            .collect();

        let owner_name = unit.source_name(owner).unwrap_or_default();
        let owner_decl = unit.ty_mut(owner).ok_or_else(|| WeaveError::MissingOwner {
            method: method_name.clone(),
            span: Span::synthetic(),
        })?;
        let index = owner_decl
            .methods
            .iter()
            .position(|m| *m == method)
            .ok_or(WeaveError::UnknownMethod { id: method.0 })?;
        let name = self.method_field_name(index);

        if let Some(existing) = owner_decl.field(&name) {
            return if existing.synthetic {
                Ok((name, false))
            } else {
                Err(WeaveError::CacheSlotClash {
                    owner: owner_name,
                    field: name,
                    span: existing.span,
                })
            };
        }

        let init = Expr::static_call(
            self.settings.method_meta_type.clone(),
            "of",
            vec![
                Expr::var(owner_field),
                Expr::string(method_name),
                Expr::synthetic(ExprKind::NewArray {
                    element: TypeRef::named("Class<?>"),
                    items: param_types,
                }),
            ],
        );
        let field = synthetic_field(&name, &self.settings.method_meta_type, init);
        let insert_at = owner_decl
            .fields
            .iter()
            .rposition(|f| f.synthetic)
            .map(|i| i + 1)
            .unwrap_or(0);
        owner_decl.fields.insert(insert_at, field);
        Ok((name, true))
    }

    pub fn ensure(
        &self,
        unit: &mut CompilationUnit,
        owner: TypeId,
        method: MethodId,
    ) -> Result<CacheRef, WeaveError> {
        // Both slot names are checked before either slot is inserted
        self.check_slot(unit, owner, &self.owner_field_name())?;
        let index = unit
            .ty(owner)
            .and_then(|decl| decl.methods.iter().position(|m| *m == method));
        if let Some(index) = index {
            self.check_slot(unit, owner, &self.method_field_name(index))?;
        }

        let (owner_field, _) = self.ensure_owner_cache(unit, owner)?;
        let (method_field, _) = self.ensure_method_cache(unit, owner, method, &owner_field)?;
        Ok(CacheRef {
            owner_field,
            method_field,
        })
    }

    fn check_slot(
        &self,
        unit: &CompilationUnit,
        owner: TypeId,
        name: &str,
    ) -> Result<(), WeaveError> {
        match unit.ty(owner).and_then(|decl| decl.field(name)) {
            Some(existing) if !existing.synthetic => Err(WeaveError::CacheSlotClash {
                owner: unit.source_name(owner).unwrap_or_default(),
                field: name.to_string(),
                span: existing.span,
            }),
            _ => Ok(()),
        }
    }
}

fn synthetic_field(name: &str, ty: &str, init: Expr) -> FieldDecl {
    FieldDecl {
        name: name.to_string(),
        ty: TypeRef::named(ty),
        is_static: true,
        is_final: true,
        init: Some(init),
        synthetic: true,
        span: Span::synthetic(),
    }
}

impl WeaveStage for MetadataCacheInjector<'_> {
    fn name(&self) -> &'static str {
        "metadata-cache"
    }

    fn completes(&self) -> WeaveState {
        WeaveState::CacheEnsured
    }

    fn run(&self, unit: &mut CompilationUnit, cx: &mut WeaveContext) -> Result<(), WeaveError> {
        cx.cache = Some(self.ensure(unit, cx.binding.owner, cx.binding.method)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_ast::{print_type, Block, MethodDecl, TypeDecl};

    fn unit() -> (CompilationUnit, TypeId, MethodId, MethodId) {
        let mut unit = CompilationUnit::new("Svc.java");
        let ty = unit.add_type(TypeDecl::class("Svc"));
        let a = unit.add_method(
            MethodDecl::new(ty, "a", TypeRef::Int, Block::default())
                .with_param("items", TypeRef::named("List<String>"))
                .with_param("n", TypeRef::Int),
        );
        let b = unit.add_method(MethodDecl::new(ty, "b", TypeRef::Void, Block::default()));
        (unit, ty, a, b)
    }

    #[test]
    fn owner_slot_is_shared_and_method_slots_are_distinct() {
        let settings = WeaveSettings::default();
        let injector = MetadataCacheInjector::new(&settings);
        let (mut unit, ty, a, b) = unit();

        let first = injector.ensure(&mut unit, ty, a).unwrap();
        let second = injector.ensure(&mut unit, ty, b).unwrap();
        assert_eq!(first.owner_field, second.owner_field);
        assert_ne!(first.method_field, second.method_field);

        let names: Vec<_> = unit.ty(ty).unwrap().fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["__weft_owner_meta", "__weft_method_meta_0", "__weft_method_meta_1"]
        );
    }

    #[test]
    fn repeated_ensure_creates_nothing_new() {
        let settings = WeaveSettings::default();
        let injector = MetadataCacheInjector::new(&settings);
        let (mut unit, ty, a, _) = unit();

        let (_, created) = injector.ensure_owner_cache(&mut unit, ty).unwrap();
        assert!(created);
        let (_, created) = injector.ensure_owner_cache(&mut unit, ty).unwrap();
        assert!(!created);
        let owner_field = "__weft_owner_meta";
        let (_, created) = injector.ensure_method_cache(&mut unit, ty, a, owner_field).unwrap();
        assert!(created);
        let (_, created) = injector.ensure_method_cache(&mut unit, ty, a, owner_field).unwrap();
        assert!(!created);
        assert_eq!(unit.ty(ty).unwrap().fields.len(), 2);
    }

    #[test]
    fn slot_initializers_describe_owner_and_signature() {
        let settings = WeaveSettings::default();
        let injector = MetadataCacheInjector::new(&settings);
        let (mut unit, ty, a, _) = unit();
        injector.ensure(&mut unit, ty, a).unwrap();

        let printed = print_type(&unit, ty);
        assert!(printed.contains(
            concat!(
                "private static final weft.aop.OwnerMeta __weft_owner_meta = ",
                "weft.aop.OwnerMeta.of(Svc.class);"
            )
        ));
        assert!(printed.contains(
            concat!(
                "private static final weft.aop.MethodMeta __weft_method_meta_0 = ",
                "weft.aop.MethodMeta.of(__weft_owner_meta, \"a\", ",
                "new Class<?>[] { List.class, int.class });"
            )
        ));
    }

    #[test]
    fn user_field_with_slot_name_is_a_clash() {
        let settings = WeaveSettings::default();
        let injector = MetadataCacheInjector::new(&settings);
        let (mut unit, ty, _, _) = unit();
        unit.ty_mut(ty).unwrap().fields.push(FieldDecl {
            synthetic: false,
            ..synthetic_field("__weft_owner_meta", "Object", Expr::null())
        });

        let err = injector.ensure_owner_cache(&mut unit, ty).unwrap_err();
        assert_eq!(err.code(), "W-WEAVE-003");
    }

    #[test]
    fn method_slot_clash_inserts_no_owner_slot() {
        let settings = WeaveSettings::default();
        let injector = MetadataCacheInjector::new(&settings);
        let (mut unit, ty, a, _) = unit();
        unit.ty_mut(ty).unwrap().fields.push(FieldDecl {
            synthetic: false,
            ..synthetic_field("__weft_method_meta_0", "Object", Expr::null())
        });

        let err = injector.ensure(&mut unit, ty, a).unwrap_err();
        assert_eq!(err.code(), "W-WEAVE-003");
        let names: Vec<_> = unit.ty(ty).unwrap().fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["__weft_method_meta_0"]);
    }
}
