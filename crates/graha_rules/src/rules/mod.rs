//! Rule definitions: loading, validation and evaluation.

pub mod definition;
pub mod evaluator;
pub mod expr;
pub mod loader;

pub use definition::{RawDefinition, Rule, RuleSet, SignalSpec, StatusCondition};
pub use evaluator::{evaluate_rule, SignalOutcome, SignalTable, Status, Verdict, DEFAULT_ORB_DEG};
pub use expr::{ExprError, StatusExpr};
pub use loader::{load_rules, Diagnostic, DiagnosticKind, LoadOutcome};
