//! Weave stages and the per-weave context passed between them

use weft_ast::{Block, CompilationUnit};

use crate::{AspectBinding, CacheRef, MethodKey, SyntheticNames, WeaveError, WeaveState};

/// Transient record for one method's weave. Each stage reads what earlier
/// stages left here and adds its own output; the record is dropped once the
/// method is woven.
#[derive(Debug, Clone)]
pub struct WeaveContext {
    pub key: MethodKey,
    pub binding: AspectBinding,
    /// Set by the metadata cache stage
    pub cache: Option<CacheRef>,
    /// Set by the body stage
    pub names: Option<SyntheticNames>,
    /// The body as it was before weaving, kept for rollback
    pub original: Option<Block>,
    /// Set by the return stage
    pub exits_rewritten: usize,
}

impl WeaveContext {
    pub fn new(key: MethodKey, binding: AspectBinding) -> Self {
        Self {
            key,
            binding,
            cache: None,
            names: None,
            original: None,
            exits_rewritten: 0,
        }
    }
}

/// One step of the weave. Stages run in a fixed order and each moves the
/// method one state further along its lifecycle.
pub trait WeaveStage {
    fn name(&self) -> &'static str;

    /// State the method is in once this stage has run
    fn completes(&self) -> WeaveState;

    fn run(&self, unit: &mut CompilationUnit, cx: &mut WeaveContext) -> Result<(), WeaveError>;
}
