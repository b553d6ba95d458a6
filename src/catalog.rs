//! Catalog - Versioned, Immutable Component Tables
//!
//! Default materials, trims, labels, thread and packaging keyed by component
//! name, plus the garment templates and feature rules that reference them.
//! A catalog is built once and never mutated; swapping catalogs means
//! constructing a new one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::bom::{component_key, BomCategory, BomLineItem, Unit};
use crate::provenance::PriceSource;
use crate::{ENGINE_VERSION, MIN_CATALOG_VERSION};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid version '{0}': {1}")]
    InvalidVersion(String, String),

    #[error("Catalog {0} requires engine >= {1}, current is {2}")]
    EngineVersionMismatch(String, String, String),

    #[error("Catalog {0} is older than the minimum supported {1}")]
    CatalogTooOld(String, String),

    #[error("{0} references unknown component '{1}'")]
    UnknownComponent(String, String),

    #[error("{0} references unknown template '{1}'")]
    UnknownTemplate(String, String),

    #[error("Template '{0}' is registered under key '{1}'")]
    TemplateKeyMismatch(String, String),

    #[error("Family '{0}' defaults to template '{1}' from another family")]
    FamilyMismatch(String, String),

    #[error("Labor rate for '{0}' must be a non-negative number, got {1}")]
    InvalidLaborRate(String, f64),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarmentFamily {
    #[default]
    Tops,
    Bottoms,
}

/// One catalog component: everything needed to mint a default BOM row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub category: BomCategory,
    pub material: String,
    #[serde(default)]
    pub composition: String,
    #[serde(default)]
    pub specification: Option<String>,
    pub unit: Unit,
    pub unit_price: f64,
    pub consumption: f64,
    /// Per-family consumption, overriding `consumption`
    #[serde(default)]
    pub consumption_by_family: BTreeMap<GarmentFamily, f64>,
    #[serde(default)]
    pub wastage: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CatalogEntry {
    pub fn consumption_for(&self, family: GarmentFamily) -> f64 {
        self.consumption_by_family.get(&family).copied().unwrap_or(self.consumption)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilySpec {
    /// Category names (normalized) that belong to this family
    pub categories: Vec<String>,
    pub default_template: String,
}

/// Baseline BOM for one garment style. Labels, thread and packaging are
/// shared catalog-wide and appended by the resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarmentTemplate {
    pub key: String,
    pub name: String,
    pub family: GarmentFamily,
    pub fabrics: Vec<String>,
    /// Trims the style structurally implies
    #[serde(default)]
    pub trims: Vec<String>,
}

/// What a confirmed feature flag governs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRule {
    /// Dropped when the flag is confirmed absent
    #[serde(default)]
    pub removals: Vec<String>,
    /// Appended when the flag is confirmed present and not already there
    #[serde(default)]
    pub additions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    catalog_version: String,
    engine_min_version: String,
    #[serde(default)]
    default_family: GarmentFamily,
    families: BTreeMap<GarmentFamily, FamilySpec>,
    /// Normalized subtype/category name -> template key
    #[serde(default)]
    aliases: BTreeMap<String, String>,
    templates: BTreeMap<String, GarmentTemplate>,
    components: BTreeMap<String, CatalogEntry>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    thread: Vec<String>,
    #[serde(default)]
    packaging: Vec<String>,
    #[serde(default)]
    feature_rules: BTreeMap<String, FeatureRule>,
    /// Template key -> CMT labor per garment
    #[serde(default)]
    labor_rates: BTreeMap<String, f64>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Normalize a category/subtype name: `"Zip-Hoodie "` -> `"zip_hoodie"`
pub fn normalize_key(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace([' ', '-'], "_")
}

impl Catalog {
    /// Parse and validate a catalog from JSON
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let mut catalog: Catalog = serde_json::from_str(json)?;
        catalog.aliases = std::mem::take(&mut catalog.aliases)
            .into_iter()
            .map(|(alias, key)| (normalize_key(&alias), key))
            .collect();
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog file. This is the only way to replace the built-in tables.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        let catalog = Self::from_json(&content)?;
        tracing::info!(
            path = %path.display(),
            version = %catalog.catalog_version,
            components = catalog.components.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        self.check_versions()?;

        for (flag, rule) in &self.feature_rules {
            for name in rule.removals.iter().chain(&rule.additions) {
                self.require_component(&format!("Feature rule '{}'", flag), name)?;
            }
        }

        for (key, template) in &self.templates {
            if *key != template.key {
                return Err(CatalogError::TemplateKeyMismatch(template.key.clone(), key.clone()));
            }
            for name in template.fabrics.iter().chain(&template.trims) {
                self.require_component(&format!("Template '{}'", template.key), name)?;
            }
        }

        for name in self.labels.iter().chain(&self.thread).chain(&self.packaging) {
            self.require_component("Shared section", name)?;
        }

        for (family, spec) in &self.families {
            match self.templates.get(&spec.default_template) {
                None => {
                    return Err(CatalogError::UnknownTemplate(
                        format!("Family '{:?}'", family),
                        spec.default_template.clone(),
                    ))
                }
                Some(template) if template.family != *family => {
                    return Err(CatalogError::FamilyMismatch(
                        format!("{:?}", family),
                        spec.default_template.clone(),
                    ))
                }
                Some(_) => {}
            }
        }

        if !self.families.contains_key(&self.default_family) {
            return Err(CatalogError::UnknownTemplate(
                "Default family".to_string(),
                format!("{:?}", self.default_family),
            ));
        }

        for (alias, key) in &self.aliases {
            if !self.templates.contains_key(key) {
                return Err(CatalogError::UnknownTemplate(format!("Alias '{}'", alias), key.clone()));
            }
        }

        for (key, rate) in &self.labor_rates {
            if !self.templates.contains_key(key) {
                return Err(CatalogError::UnknownTemplate("Labor rates".to_string(), key.clone()));
            }
            if !rate.is_finite() || *rate < 0.0 {
                return Err(CatalogError::InvalidLaborRate(key.clone(), *rate));
            }
        }

        Ok(())
    }

    fn check_versions(&self) -> Result<(), CatalogError> {
        let parse = |v: &str| {
            semver::Version::parse(v)
                .map_err(|e| CatalogError::InvalidVersion(v.to_string(), e.to_string()))
        };

        let engine_ver = parse(ENGINE_VERSION)?;
        let min_engine = parse(&self.engine_min_version)?;
        if engine_ver < min_engine {
            return Err(CatalogError::EngineVersionMismatch(
                self.catalog_version.clone(),
                self.engine_min_version.clone(),
                ENGINE_VERSION.to_string(),
            ));
        }

        let catalog_ver = parse(&self.catalog_version)?;
        if catalog_ver < parse(MIN_CATALOG_VERSION)? {
            return Err(CatalogError::CatalogTooOld(
                self.catalog_version.clone(),
                MIN_CATALOG_VERSION.to_string(),
            ));
        }

        Ok(())
    }

    fn require_component(&self, owner: &str, name: &str) -> Result<(), CatalogError> {
        if self.component(name).is_none() {
            return Err(CatalogError::UnknownComponent(owner.to_string(), name.to_string()));
        }
        Ok(())
    }

    pub fn version(&self) -> &str {
        &self.catalog_version
    }

    pub fn engine_min_version(&self) -> &str {
        &self.engine_min_version
    }

    pub fn default_family(&self) -> GarmentFamily {
        self.default_family
    }

    pub fn family_spec(&self, family: GarmentFamily) -> Option<&FamilySpec> {
        self.families.get(&family)
    }

    /// Family owning a category name, `None` when the category is unknown.
    /// Template keys and aliases count as categories of their template's family.
    pub fn family_of(&self, category: &str) -> Option<GarmentFamily> {
        let key = normalize_key(category);
        self.families
            .iter()
            .find(|(_, spec)| spec.categories.iter().any(|c| normalize_key(c) == key))
            .map(|(family, _)| *family)
            .or_else(|| self.template_for_alias(category).map(|t| t.family))
    }

    /// Template a subtype or category name points at
    pub fn template_for_alias(&self, name: &str) -> Option<&GarmentTemplate> {
        let key = normalize_key(name);
        self.aliases
            .get(&key)
            .and_then(|k| self.templates.get(k))
            .or_else(|| self.templates.get(&key))
    }

    pub fn template(&self, key: &str) -> Option<&GarmentTemplate> {
        self.templates.get(key)
    }

    pub fn templates(&self) -> Vec<&GarmentTemplate> {
        self.templates.values().collect()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn thread(&self) -> &[String] {
        &self.thread
    }

    pub fn packaging(&self) -> &[String] {
        &self.packaging
    }

    /// Exact name first, then case-insensitive
    pub fn component(&self, name: &str) -> Option<&CatalogEntry> {
        self.components.get(name).or_else(|| {
            let key = component_key(name);
            self.components
                .iter()
                .find(|(k, _)| component_key(k) == key)
                .map(|(_, entry)| entry)
        })
    }

    pub fn component_names(&self) -> Vec<&str> {
        self.components.keys().map(String::as_str).collect()
    }

    /// Mint a default-priced BOM row for a component. `sort_order` is left
    /// at 0 for the caller to place.
    pub fn line_item(&self, name: &str, family: GarmentFamily) -> Option<BomLineItem> {
        let (component, entry) = self.components.get_key_value(name).or_else(|| {
            let key = component_key(name);
            self.components.iter().find(|(k, _)| component_key(k) == key)
        })?;

        Some(BomLineItem {
            id: None,
            category: entry.category,
            component: component.clone(),
            material: entry.material.clone(),
            composition: entry.composition.clone(),
            specification: entry.specification.clone(),
            unit_price: entry.unit_price,
            unit: entry.unit,
            consumption: entry.consumption_for(family),
            wastage: entry.wastage,
            price_source: PriceSource::DefaultAsia,
            sort_order: 0,
            notes: entry.notes.clone(),
        })
    }

    /// CMT labor per garment for a template, if the catalog prices it
    pub fn labor_rate(&self, template_key: &str) -> Option<f64> {
        self.labor_rates.get(template_key).copied()
    }

    pub fn labor_rates(&self) -> &BTreeMap<String, f64> {
        &self.labor_rates
    }

    pub fn feature_rule(&self, flag: &str) -> Option<&FeatureRule> {
        self.feature_rules.get(flag)
    }

    pub fn feature_rules(&self) -> &BTreeMap<String, FeatureRule> {
        &self.feature_rules
    }

    /// Built-in tables: fleece tops and bottoms at Asia factory pricing.
    pub fn builtin() -> Self {
        let mut components = BTreeMap::new();
        let mut add = |name: &str, entry: CatalogEntry| {
            components.insert(name.to_string(), entry);
        };

        add("Body Fabric", CatalogEntry {
            category: BomCategory::Fabric,
            material: "French Terry".to_string(),
            composition: "80% Cotton / 20% Polyester".to_string(),
            specification: Some("330 GSM, brushed back".to_string()),
            unit: Unit::Yard,
            unit_price: 4.20,
            consumption: 1.75,
            consumption_by_family: BTreeMap::from([
                (GarmentFamily::Tops, 1.75),
                (GarmentFamily::Bottoms, 1.95),
            ]),
            wastage: 12.0,
            notes: None,
        });
        add("Rib Fabric", CatalogEntry {
            category: BomCategory::Fabric,
            material: "1x1 Rib".to_string(),
            composition: "95% Cotton / 5% Spandex".to_string(),
            specification: Some("280 GSM, cuffs and hem".to_string()),
            unit: Unit::Yard,
            unit_price: 5.50,
            consumption: 0.25,
            consumption_by_family: BTreeMap::from([
                (GarmentFamily::Tops, 0.25),
                (GarmentFamily::Bottoms, 0.20),
            ]),
            wastage: 8.0,
            notes: None,
        });
        add("Pocket Bag", CatalogEntry {
            category: BomCategory::Fabric,
            material: "Cotton Pocketing".to_string(),
            composition: "100% Cotton".to_string(),
            specification: Some("120 GSM twill".to_string()),
            unit: Unit::Yard,
            unit_price: 1.80,
            consumption: 0.15,
            consumption_by_family: BTreeMap::new(),
            wastage: 5.0,
            notes: None,
        });
        add("Zipper", CatalogEntry {
            category: BomCategory::Trim,
            material: "Metal Zipper".to_string(),
            composition: "Brass teeth / Polyester tape".to_string(),
            specification: Some("#5, 24 in, auto-lock slider".to_string()),
            unit: Unit::Piece,
            unit_price: 1.85,
            consumption: 1.0,
            consumption_by_family: BTreeMap::new(),
            wastage: 2.0,
            notes: None,
        });
        add("Drawcord", CatalogEntry {
            category: BomCategory::Trim,
            material: "Flat Drawcord".to_string(),
            composition: "100% Cotton".to_string(),
            specification: Some("10 mm flat, metal aglets".to_string()),
            unit: Unit::Piece,
            unit_price: 0.35,
            consumption: 1.0,
            consumption_by_family: BTreeMap::new(),
            wastage: 3.0,
            notes: None,
        });
        add("Grommets", CatalogEntry {
            category: BomCategory::Trim,
            material: "Metal Eyelet".to_string(),
            composition: "Brass".to_string(),
            specification: Some("10 mm, antique finish".to_string()),
            unit: Unit::Piece,
            unit_price: 0.04,
            consumption: 2.0,
            consumption_by_family: BTreeMap::new(),
            wastage: 5.0,
            notes: None,
        });
        add("Waistband Elastic", CatalogEntry {
            category: BomCategory::Trim,
            material: "Knitted Elastic".to_string(),
            composition: "Polyester / Rubber".to_string(),
            specification: Some("40 mm".to_string()),
            unit: Unit::Yard,
            unit_price: 0.45,
            consumption: 0.9,
            consumption_by_family: BTreeMap::new(),
            wastage: 5.0,
            notes: None,
        });
        add("Main Label", CatalogEntry {
            category: BomCategory::Label,
            material: "Woven Label".to_string(),
            composition: "100% Polyester".to_string(),
            specification: Some("Damask, end-fold".to_string()),
            unit: Unit::Piece,
            unit_price: 0.12,
            consumption: 1.0,
            consumption_by_family: BTreeMap::new(),
            wastage: 2.0,
            notes: None,
        });
        add("Care Label", CatalogEntry {
            category: BomCategory::Label,
            material: "Printed Satin".to_string(),
            composition: "100% Polyester".to_string(),
            specification: Some("Wash care and fiber content".to_string()),
            unit: Unit::Piece,
            unit_price: 0.05,
            consumption: 1.0,
            consumption_by_family: BTreeMap::new(),
            wastage: 2.0,
            notes: None,
        });
        add("Size Label", CatalogEntry {
            category: BomCategory::Label,
            material: "Woven Size Tab".to_string(),
            composition: "100% Polyester".to_string(),
            specification: None,
            unit: Unit::Piece,
            unit_price: 0.04,
            consumption: 1.0,
            consumption_by_family: BTreeMap::new(),
            wastage: 2.0,
            notes: None,
        });
        add("Sewing Thread", CatalogEntry {
            category: BomCategory::Thread,
            material: "Core-Spun Thread".to_string(),
            composition: "Polyester / Polyester core-spun".to_string(),
            specification: Some("Tex 27, 5000 m cone".to_string()),
            unit: Unit::Cone,
            unit_price: 2.40,
            consumption: 0.06,
            consumption_by_family: BTreeMap::new(),
            wastage: 10.0,
            notes: None,
        });
        add("Poly Bag", CatalogEntry {
            category: BomCategory::Packaging,
            material: "Self-Seal Poly Bag".to_string(),
            composition: "LDPE".to_string(),
            specification: Some("30 x 40 cm, suffocation warning".to_string()),
            unit: Unit::Piece,
            unit_price: 0.06,
            consumption: 1.0,
            consumption_by_family: BTreeMap::new(),
            wastage: 0.0,
            notes: None,
        });
        add("Hang Tag", CatalogEntry {
            category: BomCategory::Packaging,
            material: "Hang Tag".to_string(),
            composition: "350 GSM card".to_string(),
            specification: Some("With string and safety pin".to_string()),
            unit: Unit::Piece,
            unit_price: 0.10,
            consumption: 1.0,
            consumption_by_family: BTreeMap::new(),
            wastage: 0.0,
            notes: None,
        });

        let templates = [
            GarmentTemplate {
                key: "pullover_hoodie".to_string(),
                name: "Pullover Hoodie".to_string(),
                family: GarmentFamily::Tops,
                fabrics: names(&["Body Fabric", "Rib Fabric"]),
                trims: names(&["Drawcord", "Grommets"]),
            },
            GarmentTemplate {
                key: "zip_hoodie".to_string(),
                name: "Zip Hoodie".to_string(),
                family: GarmentFamily::Tops,
                fabrics: names(&["Body Fabric", "Rib Fabric"]),
                trims: names(&["Zipper", "Drawcord", "Grommets"]),
            },
            GarmentTemplate {
                key: "crewneck".to_string(),
                name: "Crewneck Sweatshirt".to_string(),
                family: GarmentFamily::Tops,
                fabrics: names(&["Body Fabric", "Rib Fabric"]),
                trims: vec![],
            },
            GarmentTemplate {
                key: "sweatpants".to_string(),
                name: "Sweatpants".to_string(),
                family: GarmentFamily::Bottoms,
                fabrics: names(&["Body Fabric", "Rib Fabric", "Pocket Bag"]),
                trims: names(&["Waistband Elastic", "Drawcord", "Grommets"]),
            },
        ]
        .into_iter()
        .map(|t| (t.key.clone(), t))
        .collect();

        let families = BTreeMap::from([
            (GarmentFamily::Tops, FamilySpec {
                categories: names(&["hoodie", "sweatshirt", "crewneck", "top"]),
                default_template: "pullover_hoodie".to_string(),
            }),
            (GarmentFamily::Bottoms, FamilySpec {
                categories: names(&["sweatpants", "joggers", "pants", "bottom"]),
                default_template: "sweatpants".to_string(),
            }),
        ]);

        let aliases = [
            ("hoodie", "pullover_hoodie"),
            ("pullover", "pullover_hoodie"),
            ("zip_up", "zip_hoodie"),
            ("full_zip", "zip_hoodie"),
            ("full_zip_hoodie", "zip_hoodie"),
            ("sweatshirt", "crewneck"),
            ("crew", "crewneck"),
            ("crewneck_sweatshirt", "crewneck"),
            ("joggers", "sweatpants"),
            ("jogger", "sweatpants"),
            ("open_hem", "sweatpants"),
        ]
        .into_iter()
        .map(|(a, k)| (a.to_string(), k.to_string()))
        .collect();

        let feature_rules = BTreeMap::from([
            ("hasZipper".to_string(), FeatureRule {
                removals: names(&["Zipper"]),
                additions: names(&["Zipper"]),
            }),
            ("hasDrawcord".to_string(), FeatureRule {
                removals: names(&["Drawcord", "Grommets"]),
                additions: names(&["Drawcord", "Grommets"]),
            }),
            ("hasPockets".to_string(), FeatureRule {
                removals: names(&["Pocket Bag"]),
                additions: names(&["Pocket Bag"]),
            }),
        ]);

        let labor_rates = [
            ("pullover_hoodie", 4.00),
            ("zip_hoodie", 4.60),
            ("crewneck", 3.40),
            ("sweatpants", 3.80),
        ]
        .into_iter()
        .map(|(k, rate)| (k.to_string(), rate))
        .collect();

        Self {
            catalog_version: MIN_CATALOG_VERSION.to_string(),
            engine_min_version: "1.0.0".to_string(),
            default_family: GarmentFamily::Tops,
            families,
            aliases,
            templates,
            components,
            labels: names(&["Main Label", "Care Label", "Size Label"]),
            thread: names(&["Sewing Thread"]),
            packaging: names(&["Poly Bag", "Hang Tag"]),
            feature_rules,
            labor_rates,
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
