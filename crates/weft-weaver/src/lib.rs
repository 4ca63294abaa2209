//! Weft Weaver - Compile-time aspect weaving pass
//!
//! Given compilation units from the host build, this crate decides which
//! methods carry an aspect trigger and rewrites their bodies so the aspect's
//! hooks run around the original statements, exactly once per activation.
//!
//! # Stages
//!
//! - **Eligibility**: picks the governing trigger annotation (method first,
//!   then owner) and grows the trigger set through meta-annotations
//! - **Guard**: keeps every method to a single weave per build, and
//!   recognises bodies woven by an earlier run
//! - **Metadata cache**: static owner and method metadata fields
//! - **Body**: context creation, `before`, `error` and `after` hooks
//! - **Returns**: funnels every `return` through the shared exit
//!
//! # Usage
//!
//! ```ignore
//! use weft_weaver::{WeaveSession, WeaveSettings};
//!
//! let mut session = WeaveSession::new(WeaveSettings::default())?;
//! for report in session.weave_build(&mut units) {
//!     for diagnostic in &report.diagnostics {
//!         eprintln!("{}", diagnostic);
//!     }
//! }
//! ```

mod body;
mod cache;
mod eligibility;
mod error;
mod names;
mod registry;
mod returns;
mod session;
mod settings;
mod stage;
mod state;

pub use body::MethodBodyWeaver;
pub use cache::{CacheRef, MetadataCacheInjector};
pub use eligibility::{
    AspectBinding, BindingSource, Eligibility, EligibilityResolver, RejectReason, Resolution,
    Strategy,
};
pub use error::{Severity, WeaveDiagnostic, WeaveError};
pub use names::SyntheticNames;
pub use registry::{AnnotationCatalog, AnnotationLookup, TriggerSet};
pub use returns::ReturnRewriter;
pub use session::{MethodOutcome, UnitReport, WeaveSession};
pub use settings::{ConfigError, WeaveSettings, WeftConfig};
pub use stage::{WeaveContext, WeaveStage};
pub use state::{GuardDecision, MethodKey, WeaveGuard, WeaveLedger, WeaveState};
