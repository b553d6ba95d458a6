//! Costing Pipeline - Single Entry Point
//!
//! Template -> cascade -> costing -> audit. The engine calls inside never
//! fail; the only error here is fingerprinting the finished report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use crate::audit::{AuditMode, AuditReport, Auditor};
use crate::bom::BomLineItem;
use crate::cascade::FeatureCascade;
use crate::catalog::{Catalog, GarmentTemplate};
use crate::costing::{CostBreakdown, CostCalculator};
use crate::features::ConfirmedFeatures;
use crate::hashing::{compute_bom_hash, compute_quote_hash, compute_report_hash};
use crate::resolver::TemplateResolver;
use crate::settings::CostSettings;
use crate::ENGINE_VERSION;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub category: String,
    #[serde(default)]
    pub features: ConfirmedFeatures,
    #[serde(default)]
    pub settings: CostSettings,
    /// Current BOM; empty means seed from the template
    #[serde(default)]
    pub bom: Vec<BomLineItem>,
    /// Run the cascade over a supplied BOM too
    #[serde(default)]
    pub reapply_features: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostingReport {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub engine_version: String,
    pub catalog_version: String,
    pub category: String,
    pub sub_type: Option<String>,
    pub seeded: bool,
    pub bom: Vec<BomLineItem>,
    pub breakdown: CostBreakdown,
    pub audit: AuditReport,
    pub bom_hash: String,
    pub quote_hash: String,
    pub report_hash: String,
}

/// The costing pipeline - owns the catalog every stage reads from
pub struct CostingPipeline {
    catalog: Catalog,
    auditor: Auditor,
}

impl CostingPipeline {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            auditor: Auditor::default(),
        }
    }

    pub fn with_audit_mode(mut self, mode: AuditMode) -> Self {
        self.auditor = Auditor::new(mode);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn list_templates(&self) -> Vec<&GarmentTemplate> {
        self.catalog.templates()
    }

    pub fn resolver(&self) -> TemplateResolver<'_> {
        TemplateResolver::new(&self.catalog)
    }

    pub fn cascade(&self) -> FeatureCascade<'_> {
        FeatureCascade::new(&self.catalog)
    }

    /// Baseline BOM for a garment
    pub fn resolve(&self, category: &str, subtype: Option<&str>) -> Vec<BomLineItem> {
        self.resolver().resolve(category, subtype)
    }

    /// Final BOM after a features confirmation: template, then cascade.
    /// The result is meant to fully replace the stored BOM.
    #[instrument(skip(self, features), fields(sub_type = ?features.sub_type))]
    pub fn build_bom(&self, category: &str, features: &ConfirmedFeatures) -> Vec<BomLineItem> {
        let template = self.resolver().select_template(category, features.sub_type.as_deref());
        self.bom_for_template(template, features)
    }

    fn bom_for_template(&self, template: Option<&GarmentTemplate>, features: &ConfirmedFeatures) -> Vec<BomLineItem> {
        match template {
            Some(template) => {
                let baseline = self.resolver().rows_for(template);
                self.cascade().apply_for_family(&baseline, features, template.family)
            }
            None => self.cascade().apply(&[], features),
        }
    }

    /// Settings with an unset `cmt_cost` filled from the template's labor rate
    pub fn effective_settings(&self, settings: &CostSettings, template: Option<&GarmentTemplate>) -> CostSettings {
        settings
            .clone()
            .or_labor_rate(template.and_then(|t| self.catalog.labor_rate(&t.key)))
    }

    pub fn compute(&self, bom: &[BomLineItem], settings: &CostSettings) -> CostBreakdown {
        CostCalculator::compute(bom, settings)
    }

    pub fn audit(&self, bom: &[BomLineItem]) -> AuditReport {
        self.auditor.audit(bom)
    }

    /// Full quote: BOM (seeded or supplied), breakdown, audit, fingerprints.
    #[instrument(skip(self, request), fields(category = %request.category, quantity = request.settings.quantity))]
    pub fn quote(&self, request: &QuoteRequest) -> Result<CostingReport, PipelineError> {
        let template = self
            .resolver()
            .select_template(&request.category, request.features.sub_type.as_deref());

        let seeded = request.bom.is_empty();
        let bom = if seeded {
            self.bom_for_template(template, &request.features)
        } else if request.reapply_features {
            let family = template.map(|t| t.family).unwrap_or_else(|| self.catalog.default_family());
            self.cascade().apply_for_family(&request.bom, &request.features, family)
        } else {
            request.bom.clone()
        };

        let settings = self.effective_settings(&request.settings, template);
        let breakdown = self.compute(&bom, &settings);
        let audit = self.audit(&bom);

        let bom_hash = compute_bom_hash(&bom)?;
        let quote_hash = compute_quote_hash(self.catalog.version(), request, ENGINE_VERSION)?;

        let mut report = CostingReport {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            engine_version: ENGINE_VERSION.to_string(),
            catalog_version: self.catalog.version().to_string(),
            category: request.category.clone(),
            sub_type: request.features.sub_type.clone(),
            seeded,
            bom,
            breakdown,
            audit,
            bom_hash,
            quote_hash,
            report_hash: String::new(),  // Computed after
        };

        report.report_hash = compute_report_hash(&report)?;

        tracing::info!(
            report_id = %report.id,
            rows = report.bom.len(),
            retail = report.breakdown.retail_price,
            "quote computed"
        );

        Ok(report)
    }
}

impl Default for CostingPipeline {
    fn default() -> Self {
        Self::new(Catalog::builtin())
    }
}
