//! Diagram validation
//!
//! Runs the configured rules over a diagram, deduplicates their findings
//! and buckets them into errors and warnings.

use std::collections::HashSet;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::canvas::{markers, Canvas};
use crate::rules::{rule_ids, RuleRegistry};
use crate::types::DiagramGraph;

/// Dedup key used for diagram-wide findings
const GLOBAL_KEY: &str = "global";

/// Configured severity of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Off,
}

/// Ordered mapping from rule ID to severity
///
/// Rules run in declaration order. In JSON this is an object; key order
/// is preserved on both read and write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleConfig {
    entries: Vec<(String, Severity)>,
}

impl RuleConfig {
    /// A configuration with no rules enabled
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Set the severity of a rule, keeping its position if already present
    pub fn set(&mut self, rule_id: impl Into<String>, severity: Severity) {
        let rule_id = rule_id.into();
        match self.entries.iter_mut().find(|(id, _)| *id == rule_id) {
            Some(entry) => entry.1 = severity,
            None => self.entries.push((rule_id, severity)),
        }
    }

    /// Builder-style `set`
    pub fn with(mut self, rule_id: impl Into<String>, severity: Severity) -> Self {
        self.set(rule_id, severity);
        self
    }

    pub fn severity_of(&self, rule_id: &str) -> Option<Severity> {
        self.entries
            .iter()
            .find(|(id, _)| id == rule_id)
            .map(|(_, severity)| *severity)
    }

    /// Entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Severity)> {
        self.entries.iter().map(|(id, severity)| (id.as_str(), *severity))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self::empty()
            .with(rule_ids::START_EVENT_REQUIRED, Severity::Error)
            .with(rule_ids::END_EVENT_REQUIRED, Severity::Error)
            .with(rule_ids::NO_ORPHAN_ELEMENTS, Severity::Error)
            .with(rule_ids::TASK_MULTIPLE_OUTGOING, Severity::Warning)
    }
}

impl Serialize for RuleConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (rule_id, severity) in &self.entries {
            map.serialize_entry(rule_id, severity)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RuleConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct RuleConfigVisitor;

        impl<'de> Visitor<'de> for RuleConfigVisitor {
            type Value = RuleConfig;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of rule id to \"error\", \"warning\" or \"off\"")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<RuleConfig, A::Error> {
                let mut config = RuleConfig::empty();
                while let Some((rule_id, severity)) = map.next_entry::<String, Severity>()? {
                    config.set(rule_id, severity);
                }
                Ok(config)
            }
        }

        deserializer.deserialize_map(RuleConfigVisitor)
    }
}

/// Reported severity of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSeverity {
    Error,
    Warning,
}

/// One finding of a validation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub rule_id: String,
    pub severity: ResultSeverity,
    /// `None` for diagram-wide findings
    pub element_id: Option<String>,
    pub message: String,
}

/// Findings of a validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationResult>,
    pub warnings: Vec<ValidationResult>,
    /// All findings in the order they were produced
    pub all: Vec<ValidationResult>,
}

impl ValidationReport {
    /// True when there are no errors (warnings allowed)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Findings attached to a specific element
    pub fn for_element<'a>(
        &'a self,
        element_id: &'a str,
    ) -> impl Iterator<Item = &'a ValidationResult> + 'a {
        self.all
            .iter()
            .filter(move |r| r.element_id.as_deref() == Some(element_id))
    }

    /// Diagram-wide findings
    pub fn global(&self) -> impl Iterator<Item = &ValidationResult> {
        self.all.iter().filter(|r| r.element_id.is_none())
    }
}

/// Validate a diagram with the given rules and configuration
///
/// Rules run in configuration order. Rules switched off or missing from
/// the registry are skipped, and so is a rule that returns an error. A
/// rule reporting the same element twice yields a single finding.
pub fn validate_diagram(
    graph: &DiagramGraph,
    registry: &RuleRegistry,
    config: &RuleConfig,
) -> ValidationReport {
    let mut all = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for (rule_id, severity) in config.iter() {
        let severity = match severity {
            Severity::Error => ResultSeverity::Error,
            Severity::Warning => ResultSeverity::Warning,
            Severity::Off => continue,
        };

        let Some(rule) = registry.get(rule_id) else {
            log::debug!("No rule registered for '{}', skipping", rule_id);
            continue;
        };

        let violations = match rule.check(graph) {
            Ok(violations) => violations,
            Err(e) => {
                log::warn!("Rule '{}' failed, skipping: {}", rule_id, e);
                continue;
            }
        };

        for violation in violations {
            let key = (
                rule_id.to_string(),
                violation
                    .element_id
                    .clone()
                    .unwrap_or_else(|| GLOBAL_KEY.to_string()),
            );
            if !seen.insert(key) {
                continue;
            }
            all.push(ValidationResult {
                rule_id: rule_id.to_string(),
                severity,
                element_id: violation.element_id,
                message: violation.message,
            });
        }
    }

    let (errors, warnings): (Vec<_>, Vec<_>) = all
        .iter()
        .cloned()
        .partition(|r| r.severity == ResultSeverity::Error);

    log::debug!(
        "Validated diagram '{}': {} errors, {} warnings",
        graph.id,
        errors.len(),
        warnings.len()
    );

    ValidationReport {
        errors,
        warnings,
        all,
    }
}

/// Replace validation markers on the canvas with the findings of a report
///
/// An element with both errors and warnings only gets the error marker.
pub fn apply_validation_markers(canvas: &mut Canvas, report: &ValidationReport) {
    canvas.clear_marker(markers::VALIDATION_ERROR);
    canvas.clear_marker(markers::VALIDATION_WARNING);

    for result in &report.errors {
        if let Some(id) = &result.element_id {
            canvas.add_marker(id, markers::VALIDATION_ERROR);
        }
    }
    for result in &report.warnings {
        if let Some(id) = &result.element_id {
            if !canvas.has_marker(id, markers::VALIDATION_ERROR) {
                canvas.add_marker(id, markers::VALIDATION_WARNING);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DiagramBuilder;
    use crate::error::ProcessEngineError;
    use crate::rules::Violation;

    fn valid_diagram() -> DiagramGraph {
        DiagramBuilder::new("d", "Valid")
            .add_start_event("s")
            .add_task("t", "Work")
            .add_end_event("e")
            .connect("s", "t")
            .connect("t", "e")
            .build()
    }

    #[test]
    fn test_valid_diagram() {
        let report = validate_diagram(
            &valid_diagram(),
            &RuleRegistry::with_builtin_rules(),
            &RuleConfig::default(),
        );
        assert!(report.is_valid());
        assert!(report.all.is_empty(), "Expected no findings, got: {:?}", report.all);
    }

    #[test]
    fn test_missing_start_and_end_are_global_errors() {
        let graph = DiagramBuilder::new("d", "Bare")
            .add_task("a", "A")
            .add_task("b", "B")
            .connect("a", "b")
            .build();

        let report = validate_diagram(
            &graph,
            &RuleRegistry::with_builtin_rules(),
            &RuleConfig::default(),
        );

        let global: Vec<_> = report.global().map(|r| r.rule_id.as_str()).collect();
        assert_eq!(
            global,
            vec![rule_ids::START_EVENT_REQUIRED, rule_ids::END_EVENT_REQUIRED]
        );
        assert_eq!(report.errors.len(), 2);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_orphan_task_single_error() {
        let graph = DiagramBuilder::new("d", "Orphan")
            .add_start_event("s")
            .add_end_event("e")
            .connect("s", "e")
            .add_task("lonely", "Lonely")
            .build();

        let report = validate_diagram(
            &graph,
            &RuleRegistry::with_builtin_rules(),
            &RuleConfig::default(),
        );

        assert_eq!(report.errors.len(), 1);
        let error = &report.errors[0];
        assert_eq!(error.rule_id, rule_ids::NO_ORPHAN_ELEMENTS);
        assert_eq!(error.element_id.as_deref(), Some("lonely"));
    }

    #[test]
    fn test_task_fork_single_warning() {
        let graph = DiagramBuilder::new("d", "Fork")
            .add_start_event("s")
            .add_task("t", "Split")
            .add_end_event("e1")
            .add_end_event("e2")
            .connect("s", "t")
            .connect("t", "e1")
            .connect("t", "e2")
            .build();

        let report = validate_diagram(
            &graph,
            &RuleRegistry::with_builtin_rules(),
            &RuleConfig::default(),
        );

        assert!(report.errors.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].rule_id, rule_ids::TASK_MULTIPLE_OUTGOING);
        assert_eq!(report.warnings[0].element_id.as_deref(), Some("t"));
    }

    #[test]
    fn test_duplicate_violations_are_dropped() {
        let mut registry = RuleRegistry::new();
        registry.register_fn("noisy", |_| {
            Ok(vec![
                Violation::at("a", "first"),
                Violation::at("a", "second"),
                Violation::global("one"),
                Violation::global("two"),
            ])
        });
        let config = RuleConfig::empty().with("noisy", Severity::Warning);

        let report = validate_diagram(&DiagramGraph::new("d", "D"), &registry, &config);

        assert_eq!(report.all.len(), 2);
        assert_eq!(report.all[0].message, "first");
        assert_eq!(report.all[1].message, "one");
        let keys: HashSet<_> = report
            .all
            .iter()
            .map(|r| (r.rule_id.clone(), r.element_id.clone()))
            .collect();
        assert_eq!(keys.len(), report.all.len());
    }

    #[test]
    fn test_off_and_unregistered_rules_skipped() {
        let config = RuleConfig::default()
            .with(rule_ids::START_EVENT_REQUIRED, Severity::Off)
            .with("not-a-rule", Severity::Error);

        let report = validate_diagram(
            &DiagramGraph::new("d", "Empty"),
            &RuleRegistry::with_builtin_rules(),
            &config,
        );

        let rules: Vec<_> = report.all.iter().map(|r| r.rule_id.as_str()).collect();
        assert_eq!(rules, vec![rule_ids::END_EVENT_REQUIRED]);
    }

    #[test]
    fn test_failing_rule_does_not_abort_run() {
        let mut registry = RuleRegistry::with_builtin_rules();
        registry.register_fn("broken", |_| {
            Err(ProcessEngineError::rule_failed("broken", "boom"))
        });
        let config = RuleConfig::empty()
            .with("broken", Severity::Error)
            .with(rule_ids::END_EVENT_REQUIRED, Severity::Error);

        let report = validate_diagram(&DiagramGraph::new("d", "Empty"), &registry, &config);

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].rule_id, rule_ids::END_EVENT_REQUIRED);
    }

    #[test]
    fn test_severity_follows_config() {
        let config = RuleConfig::empty().with(rule_ids::START_EVENT_REQUIRED, Severity::Warning);
        let report = validate_diagram(
            &DiagramGraph::new("d", "Empty"),
            &RuleRegistry::with_builtin_rules(),
            &config,
        );
        assert!(report.errors.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].severity, ResultSeverity::Warning);
    }

    #[test]
    fn test_rule_config_preserves_order() {
        let json = r#"{"task-multiple-outgoing":"warning","start-event-required":"error","no-orphan-elements":"off"}"#;
        let config: RuleConfig = serde_json::from_str(json).unwrap();

        let ids: Vec<_> = config.iter().map(|(id, _)| id).collect();
        assert_eq!(
            ids,
            vec![
                rule_ids::TASK_MULTIPLE_OUTGOING,
                rule_ids::START_EVENT_REQUIRED,
                rule_ids::NO_ORPHAN_ELEMENTS,
            ]
        );
        assert_eq!(config.severity_of(rule_ids::NO_ORPHAN_ELEMENTS), Some(Severity::Off));
        assert_eq!(serde_json::to_string(&config).unwrap(), json);
    }

    #[test]
    fn test_rule_config_rejects_unknown_severity() {
        let result: std::result::Result<RuleConfig, _> =
            serde_json::from_str(r#"{"start-event-required":"fatal"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_result_json_shape() {
        let result = ValidationResult {
            rule_id: rule_ids::START_EVENT_REQUIRED.to_string(),
            severity: ResultSeverity::Error,
            element_id: None,
            message: "Process has no start event".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            serde_json::json!({
                "ruleId": "start-event-required",
                "severity": "error",
                "elementId": null,
                "message": "Process has no start event"
            })
        );
    }

    #[test]
    fn test_apply_validation_markers() {
        let mut registry = RuleRegistry::new();
        registry.register_fn("err", |_| Ok(vec![Violation::at("a", "bad")]));
        registry.register_fn("warn", |_| {
            Ok(vec![Violation::at("a", "meh"), Violation::at("b", "meh")])
        });
        let config = RuleConfig::empty()
            .with("err", Severity::Error)
            .with("warn", Severity::Warning);
        let report = validate_diagram(&DiagramGraph::new("d", "D"), &registry, &config);

        let mut canvas = Canvas::new();
        canvas.add_marker("stale", markers::VALIDATION_ERROR);
        apply_validation_markers(&mut canvas, &report);

        assert_eq!(canvas.markers_of("a"), vec![markers::VALIDATION_ERROR]);
        assert_eq!(canvas.markers_of("b"), vec![markers::VALIDATION_WARNING]);
        assert!(canvas.markers_of("stale").is_empty());
    }
}
