//! Weaving pass orchestration
//!
//! A [`WeaveSession`] is one build: it owns the trigger set, the annotation
//! catalog and the weave ledger, and hands every method through
//! resolution, the guard and the fixed stage sequence. Per-element problems
//! become diagnostics; nothing here aborts the build.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};
use weft_ast::{CompilationUnit, MethodId, TypeId};

use crate::{
    AnnotationCatalog, ConfigError, Eligibility, EligibilityResolver, GuardDecision,
    MetadataCacheInjector, MethodBodyWeaver, MethodKey, RejectReason, ReturnRewriter, TriggerSet,
    WeaveContext, WeaveDiagnostic, WeaveError, WeaveGuard, WeaveLedger, WeaveSettings, WeaveStage,
    WeaveState,
};

/// What happened to one method during this build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodOutcome {
    Woven,
    AlreadyWoven,
    Rejected(RejectReason),
    /// Reported on the diagnostic channel and left untouched
    Skipped,
}

/// Summary of weaving one unit
#[derive(Debug, Clone, Default)]
pub struct UnitReport {
    pub path: String,
    pub outcomes: BTreeMap<MethodId, MethodOutcome>,
    pub diagnostics: Vec<WeaveDiagnostic>,
}

impl UnitReport {
    fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Self::default()
        }
    }

    /// A method visited twice keeps `Woven` once it got there
    fn record(&mut self, id: MethodId, outcome: MethodOutcome) {
        let previous = self.outcomes.insert(id, outcome);
        if previous == Some(MethodOutcome::Woven) {
            self.outcomes.insert(id, MethodOutcome::Woven);
        }
    }

    pub fn woven(&self) -> Vec<MethodId> {
        self.matching(|o| o == MethodOutcome::Woven)
    }

    pub fn already_woven(&self) -> Vec<MethodId> {
        self.matching(|o| o == MethodOutcome::AlreadyWoven)
    }

    pub fn rejected(&self) -> Vec<MethodId> {
        self.matching(|o| matches!(o, MethodOutcome::Rejected(_)))
    }

    fn matching(&self, pred: impl Fn(MethodOutcome) -> bool) -> Vec<MethodId> {
        self.outcomes
            .iter()
            .filter(|(_, o)| pred(**o))
            .map(|(id, _)| *id)
            .collect()
    }
}

pub struct WeaveSession {
    settings: WeaveSettings,
    triggers: TriggerSet,
    catalog: AnnotationCatalog,
    ledger: WeaveLedger,
    diagnostics: Vec<WeaveDiagnostic>,
}

impl WeaveSession {
    /// Start a build seeded from the settings' allow-list
    pub fn new(settings: WeaveSettings) -> Result<Self, ConfigError> {
        let triggers = settings.seed_triggers()?;
        Ok(Self::with_triggers(settings, triggers))
    }

    pub fn with_triggers(settings: WeaveSettings, triggers: TriggerSet) -> Self {
        Self {
            settings,
            triggers,
            catalog: AnnotationCatalog::new(),
            ledger: WeaveLedger::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn settings(&self) -> &WeaveSettings {
        &self.settings
    }

    pub fn triggers(&self) -> &TriggerSet {
        &self.triggers
    }

    pub fn ledger(&self) -> &WeaveLedger {
        &self.ledger
    }

    pub fn diagnostics(&self) -> &[WeaveDiagnostic] {
        &self.diagnostics
    }

    /// Make the annotation declarations of `units` visible to discovery
    pub fn register_units(&mut self, units: &[CompilationUnit]) {
        for unit in units {
            self.catalog.register_unit(unit);
        }
        debug!(annotations = self.catalog.len(), "annotation catalog ready");
    }

    /// Weave every unit of a build in order
    pub fn weave_build(&mut self, units: &mut [CompilationUnit]) -> Vec<UnitReport> {
        self.register_units(units);
        units.iter_mut().map(|unit| self.weave_unit(unit)).collect()
    }

    /// Candidate methods in declaration order, then the types of the unit
    pub fn weave_unit(&mut self, unit: &mut CompilationUnit) -> UnitReport {
        self.catalog.register_unit(unit);
        let first_diagnostic = self.diagnostics.len();
        let mut report = UnitReport::new(&unit.path);

        for id in unit.candidate_methods() {
            let outcome = self.weave_method(unit, id);
            report.record(id, outcome);
        }

        let mut types: Vec<_> = unit.types().map(|(id, decl)| (decl.span.start, id)).collect();
        types.sort();
        for (_, ty) in types {
            // A method already visited through its own annotations keeps that outcome
            for id in self.triggered_methods(unit, ty) {
                if report.outcomes.contains_key(&id) {
                    continue;
                }
                let outcome = self.weave_method(unit, id);
                report.record(id, outcome);
            }
        }

        report.diagnostics = self.diagnostics[first_diagnostic..].to_vec();
        info!(
            unit = %unit.path,
            woven = report.woven().len(),
            already_woven = report.already_woven().len(),
            "unit woven"
        );
        report
    }

    /// Weave every method of `ty` when the type's own annotations resolve
    /// to a trigger. Returns nothing for a type without one.
    pub fn weave_type(
        &mut self,
        unit: &mut CompilationUnit,
        ty: TypeId,
    ) -> Vec<(MethodId, MethodOutcome)> {
        self.triggered_methods(unit, ty)
            .into_iter()
            .map(|id| (id, self.weave_method(unit, id)))
            .collect()
    }

    fn triggered_methods(&mut self, unit: &CompilationUnit, ty: TypeId) -> Vec<MethodId> {
        let Some(decl) = unit.ty(ty) else {
            return Vec::new();
        };
        let resolver = EligibilityResolver::new(&self.settings, &self.catalog);
        if resolver.resolve_annotations(&decl.annotations, &mut self.triggers).is_none() {
            return Vec::new();
        }
        decl.methods.clone()
    }

    /// Resolve, guard and weave a single method
    pub fn weave_method(&mut self, unit: &mut CompilationUnit, id: MethodId) -> MethodOutcome {
        let key = MethodKey::new(unit.path.clone(), id);
        if self.ledger.state(&key).is_terminal() {
            return MethodOutcome::AlreadyWoven;
        }

        let resolver = EligibilityResolver::new(&self.settings, &self.catalog);
        let binding = match resolver.resolve_method(unit, id, &mut self.triggers) {
            Ok(Eligibility::Eligible(binding)) => binding,
            Ok(Eligibility::Rejected(reason)) => {
                if let Err(err) = self.ledger.advance(&key, WeaveState::Rejected) {
                    report(&mut self.diagnostics, unit, id, &err);
                    return MethodOutcome::Skipped;
                }
                return MethodOutcome::Rejected(reason);
            }
            Err(err) => {
                report(&mut self.diagnostics, unit, id, &err);
                return MethodOutcome::Skipped;
            }
        };
        for note in &binding.notes {
            report(&mut self.diagnostics, unit, id, note);
        }

        let guard = WeaveGuard::new(&self.settings);
        let Some(method) = unit.method(id) else {
            report(&mut self.diagnostics, unit, id, &WeaveError::UnknownMethod { id: id.0 });
            return MethodOutcome::Skipped;
        };
        match guard.check(&mut self.ledger, &key, method) {
            Ok(GuardDecision::Proceed) => {}
            Ok(GuardDecision::AlreadyWoven) => {
                debug!(method = %element_name(unit, id), "already woven");
                return MethodOutcome::AlreadyWoven;
            }
            Err(err) => {
                report(&mut self.diagnostics, unit, id, &err);
                return MethodOutcome::Skipped;
            }
        }
        guard.mark(&mut self.ledger, &key);

        let cache = MetadataCacheInjector::new(&self.settings);
        let body = MethodBodyWeaver::new(&self.settings);
        let stages: [&dyn WeaveStage; 3] = [&cache, &body, &ReturnRewriter];

        let trigger = binding.trigger.clone();
        let mut cx = WeaveContext::new(key.clone(), binding);
        for stage in stages {
            let step = stage
                .run(unit, &mut cx)
                .and_then(|()| self.ledger.advance(&key, stage.completes()));
            if let Err(err) = step {
                if let (Some(original), Some(method)) = (cx.original.take(), unit.method_mut(id)) {
                    method.body = Some(original);
                }
                self.ledger.abort(&key);
                report(&mut self.diagnostics, unit, id, &err);
                return MethodOutcome::Skipped;
            }
            debug!(stage = stage.name(), method = %element_name(unit, id), "stage done");
        }

        if let Err(err) = self.ledger.advance(&key, WeaveState::Woven) {
            report(&mut self.diagnostics, unit, id, &err);
            return MethodOutcome::Skipped;
        }
        info!(
            method = %element_name(unit, id),
            %trigger,
            exits = cx.exits_rewritten,
            "woven"
        );
        MethodOutcome::Woven
    }

    /// Run trigger resolution over `units` without touching any tree, and
    /// return the resulting trigger set.
    pub fn discover_triggers(&mut self, units: &[CompilationUnit]) -> &TriggerSet {
        self.register_units(units);
        let resolver = EligibilityResolver::new(&self.settings, &self.catalog);
        for unit in units {
            for id in unit.candidate_methods() {
                if let Some(method) = unit.method(id) {
                    resolver.resolve_annotations(&method.annotations, &mut self.triggers);
                }
            }
            for (_, decl) in unit.types() {
                resolver.resolve_annotations(&decl.annotations, &mut self.triggers);
            }
        }
        &self.triggers
    }
}

fn element_name(unit: &CompilationUnit, id: MethodId) -> String {
    match unit.method(id) {
        Some(method) => {
            let owner = unit
                .source_name(method.owner)
                .unwrap_or_else(|| "<anonymous>".to_string());
            format!("{}.{}", owner, method.name)
        }
        None => format!("<method #{}>", id.0),
    }
}

fn report(
    diagnostics: &mut Vec<WeaveDiagnostic>,
    unit: &CompilationUnit,
    id: MethodId,
    err: &WeaveError,
) {
    let diagnostic = WeaveDiagnostic::from_error(err, &unit.path, &element_name(unit, id));
    warn!(code = diagnostic.code, element = %diagnostic.element, "{}", diagnostic.message);
    diagnostics.push(diagnostic);
}
