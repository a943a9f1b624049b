//! Data-driven rule engine for sidereal (Vedic) birth charts.
//!
//! Charts arrive already computed. Rules are JSON definitions naming
//! predicates from a closed registry; evaluation yields weighted verdicts.

pub mod ashtakavarga;
pub mod aspects;
pub mod chart;
pub mod engine;
pub mod error;
pub mod math;
pub mod predicates;
pub mod resolve;
pub mod rules;
pub mod tables;
pub mod timeaware;

pub use chart::{Ascendant, Chart, PlanetPosition};
pub use engine::{EvaluationReport, LoadedRules, ReloadSummary, RuleEngine, RuleFailure};
pub use error::{EngineError, EvalError};
pub use predicates::SignalResult;
pub use resolve::PlanetRef;
pub use rules::{Diagnostic, DiagnosticKind, RawDefinition, Rule, RuleSet, Status, Verdict, DEFAULT_ORB_DEG};
pub use tables::Planet;
