//! DSM rule set and the lint driver.

pub mod capability;
mod display_name_logic;
pub mod endpoint;
mod engine;
mod example_methods;
mod executive_capability;
mod masked_assignment;
mod masking_annotations;
mod name_concat;
mod naming_consistency;
mod non_unique_key;
mod output;
mod restricted_accessor;
mod rounding;
mod rules;
mod visit;

pub use display_name_logic::DisplayNameLogicRule;
pub use engine::{all_rules, LintConfig, LintEngine, LintReport, SkippedFile};
pub use example_methods::ExampleMethodRule;
pub use executive_capability::ExecutiveCapabilityRule;
pub use masked_assignment::MaskedAssignmentRule;
pub use masking_annotations::MaskingAnnotationRule;
pub use name_concat::NameConcatenationRule;
pub use naming_consistency::NamingConsistencyRule;
pub use non_unique_key::NonUniqueKeyRule;
pub use output::{
    init_color, palette, print_diagnostics, print_summary, ColorMode, Palette,
    LintSummary, OutputFormat,
};
pub use restricted_accessor::RestrictedAccessorRule;
pub use rounding::RoundingModeRule;
pub use rules::{
    descriptor_registry, print_rules, rules_json, Descriptor, Diagnostic, DiagnosticSeverity,
    Node, NodeKind, Range, Rule, RuleCode, RuleContext,
};
pub use visit::{analyze_file, dispatch_table, DispatchTable};
