//! Garment BOM Core - Composition and Cost Breakdown Engine
//!
//! # Data Flow
//! Catalog -> Template Resolver -> Feature Cascade -> Cost Calculator -> Breakdown
//!
//! # Ground Rules
//! 1. The Catalog Is Immutable
//! 2. Engine Calls Never Fail
//! 3. Bad Numbers Become Zero
//! 4. Removals Before Additions
//! 5. Layers Accumulate In Order
//! 6. Round Once, At The Boundary

pub mod coerce;
pub mod bom;
pub mod provenance;
pub mod catalog;
pub mod features;
pub mod resolver;
pub mod cascade;
pub mod tiers;
pub mod settings;
pub mod costing;
pub mod records;
pub mod document;
pub mod audit;
pub mod hashing;
pub mod pipeline;
pub mod logging;

pub use bom::{BomCategory, BomLineItem, Unit};
pub use provenance::PriceSource;
pub use catalog::{Catalog, CatalogError, GarmentFamily};
pub use features::ConfirmedFeatures;
pub use resolver::TemplateResolver;
pub use cascade::FeatureCascade;
pub use tiers::multiplier;
pub use settings::CostSettings;
pub use costing::{CostBreakdown, CostCalculator};
pub use document::BomDocument;
pub use audit::{AuditFinding, AuditMode, AuditReport, AuditRule, Auditor};
pub use hashing::{canonical_json, compute_bom_hash, compute_report_hash};
pub use pipeline::{CostingPipeline, CostingReport, PipelineError, QuoteRequest};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const MIN_CATALOG_VERSION: &str = "2024.1.0";
