//! BOM Audit - Rule/Policy Separation
//!
//! Rules produce structured findings.
//! Policy decides whether findings make a BOM "not clean".
//! Audit never blocks costing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::bom::{component_key, BomLineItem};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditFinding {
    pub rule: String,
    pub severity: AuditSeverity,
    pub message: String,
    pub components: Vec<String>,
    pub remediation: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuditMode {
    /// Warnings make the report unclean
    Strict,
    /// Record everything, always clean
    #[default]
    Warn,
    /// Skip the rules entirely
    Off,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub clean: bool,
    pub mode: AuditMode,
    pub findings: Vec<AuditFinding>,
}

impl AuditReport {
    pub fn has_warnings(&self) -> bool {
        self.findings.iter().any(|f| f.severity == AuditSeverity::Warning)
    }
}

/// Audit rule trait - produces findings
pub trait AuditRule {
    fn name(&self) -> &'static str;
    fn inspect(&self, bom: &[BomLineItem]) -> Vec<AuditFinding>;
}

// --- Concrete Rules ---

/// Same component twice. Legitimate for user duplicates, so only info.
pub struct DuplicateComponentRule;

impl AuditRule for DuplicateComponentRule {
    fn name(&self) -> &'static str { "duplicate_component" }

    fn inspect(&self, bom: &[BomLineItem]) -> Vec<AuditFinding> {
        let mut seen: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for item in bom {
            seen.entry(component_key(&item.component)).or_default().push(&item.component);
        }

        seen.into_values()
            .filter(|names| names.len() > 1)
            .map(|names| AuditFinding {
                rule: self.name().to_string(),
                severity: AuditSeverity::Info,
                message: format!("'{}' appears {} times", names[0], names.len()),
                components: vec![names[0].to_string()],
                remediation: vec!["Remove the extra row if it was not intentional".to_string()],
            })
            .collect()
    }
}

pub struct SortOrderCollisionRule;

impl AuditRule for SortOrderCollisionRule {
    fn name(&self) -> &'static str { "sort_order_collision" }

    fn inspect(&self, bom: &[BomLineItem]) -> Vec<AuditFinding> {
        let mut by_order: BTreeMap<i64, Vec<&str>> = BTreeMap::new();
        for item in bom {
            by_order.entry(item.sort_order).or_default().push(&item.component);
        }

        by_order
            .into_iter()
            .filter(|(_, names)| names.len() > 1)
            .map(|(order, names)| AuditFinding {
                rule: self.name().to_string(),
                severity: AuditSeverity::Warning,
                message: format!("Sort order {} is shared by {} rows", order, names.len()),
                components: names.iter().map(|n| n.to_string()).collect(),
                remediation: vec!["Give each row its own sort order".to_string()],
            })
            .collect()
    }
}

pub struct ZeroConsumptionRule;

impl AuditRule for ZeroConsumptionRule {
    fn name(&self) -> &'static str { "zero_consumption" }

    fn inspect(&self, bom: &[BomLineItem]) -> Vec<AuditFinding> {
        bom.iter()
            .filter(|item| item.gross_consumption() == 0.0)
            .map(|item| AuditFinding {
                rule: self.name().to_string(),
                severity: AuditSeverity::Warning,
                message: format!("'{}' has no consumption and costs nothing", item.component),
                components: vec![item.component.clone()],
                remediation: vec!["Enter consumption per finished garment".to_string()],
            })
            .collect()
    }
}

pub struct UnpricedLineRule;

impl AuditRule for UnpricedLineRule {
    fn name(&self) -> &'static str { "unpriced_line" }

    fn inspect(&self, bom: &[BomLineItem]) -> Vec<AuditFinding> {
        bom.iter()
            .filter(|item| !(item.unit_price.is_finite() && item.unit_price > 0.0))
            .map(|item| AuditFinding {
                rule: self.name().to_string(),
                severity: AuditSeverity::Warning,
                message: format!("'{}' has no unit price", item.component),
                components: vec![item.component.clone()],
                remediation: vec!["Enter a unit price or remove the row".to_string()],
            })
            .collect()
    }
}

/// Auditor runs rules and applies the mode policy
pub struct Auditor {
    rules: Vec<Box<dyn AuditRule + Send + Sync>>,
    mode: AuditMode,
}

impl Auditor {
    pub fn new(mode: AuditMode) -> Self {
        Self {
            rules: vec![
                Box::new(DuplicateComponentRule),
                Box::new(SortOrderCollisionRule),
                Box::new(ZeroConsumptionRule),
                Box::new(UnpricedLineRule),
            ],
            mode,
        }
    }

    pub fn mode(&self) -> AuditMode {
        self.mode
    }

    pub fn audit(&self, bom: &[BomLineItem]) -> AuditReport {
        if self.mode == AuditMode::Off {
            return AuditReport { clean: true, mode: self.mode, findings: vec![] };
        }

        let findings: Vec<AuditFinding> = self.rules.iter().flat_map(|rule| rule.inspect(bom)).collect();
        let has_warnings = findings.iter().any(|f| f.severity == AuditSeverity::Warning);

        AuditReport {
            clean: !(self.mode == AuditMode::Strict && has_warnings),
            mode: self.mode,
            findings,
        }
    }
}

impl Default for Auditor {
    fn default() -> Self {
        Self::new(AuditMode::default())
    }
}
