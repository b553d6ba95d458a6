//! Garment BOM CLI - Bridge interface for the API layer
//!
//! Commands: templates, resolve, cost, quote, tier, audit
//! Outputs JSON to stdout, logs to stderr
//! Returns 1 on bad input, 2 on an unclean strict audit

use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;
use std::process::ExitCode;

use garmentbom_core::{
    audit::AuditMode,
    logging,
    tiers,
    BomLineItem, Catalog, ConfirmedFeatures, CostSettings, CostingPipeline, QuoteRequest,
};

#[derive(Parser)]
#[command(name = "garmentbom-cli")]
#[command(about = "Garment BOM CLI - BOM composition and cost breakdown")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Catalog JSON file replacing the built-in tables
    #[arg(short, long, env = "GARMENTBOM_CATALOG")]
    catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List garment templates
    Templates,

    /// Resolve the BOM for a garment
    Resolve {
        /// Garment category (hoodie, sweatpants, ...)
        #[arg(long)]
        category: String,

        /// Garment subtype (pullover_hoodie, zip_hoodie, ...)
        #[arg(long)]
        subtype: Option<String>,

        /// JSON payload (ConfirmedFeatures)
        #[arg(long)]
        features: Option<String>,
    },

    /// Cost a BOM
    Cost {
        /// JSON payload: {"bom": [...], "settings": {...}}
        #[arg(short, long)]
        payload: String,
    },

    /// Build, cost and audit a BOM in one go
    Quote {
        /// JSON payload (QuoteRequest)
        #[arg(short, long)]
        payload: String,
    },

    /// Show the pricing tier for a quantity
    Tier {
        #[arg(short, long)]
        quantity: u32,
    },

    /// Audit a BOM
    Audit {
        /// JSON payload: a BOM line-item array
        #[arg(short, long)]
        payload: String,

        /// Treat warnings as failures
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Deserialize)]
struct CostPayload {
    #[serde(default)]
    bom: Vec<BomLineItem>,
    #[serde(default)]
    settings: CostSettings,
}

fn print_json(value: &impl serde::Serialize) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{}", s);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&format!("Serialization failed: {}", e)),
    }
}

fn fail(message: &str) -> ExitCode {
    let output = serde_json::json!({
        "success": false,
        "error": message,
    });
    println!("{}", output);
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    let catalog = match &cli.catalog {
        Some(path) => match Catalog::load(path) {
            Ok(c) => c,
            Err(e) => return fail(&format!("Failed to load catalog: {}", e)),
        },
        None => Catalog::builtin(),
    };

    let pipeline = CostingPipeline::new(catalog);

    match cli.command {
        Commands::Templates => {
            let resolver = pipeline.resolver();
            let templates: Vec<_> = pipeline.list_templates()
                .iter()
                .map(|t| serde_json::json!({
                    "key": t.key,
                    "name": t.name,
                    "family": t.family,
                    "rows": resolver.rows_for(t).len(),
                    "labor_rate": pipeline.catalog().labor_rate(&t.key),
                }))
                .collect();

            print_json(&serde_json::json!({
                "catalog_version": pipeline.catalog().version(),
                "templates": templates,
            }))
        }

        Commands::Resolve { category, subtype, features } => {
            let features: ConfirmedFeatures = match features.as_deref().map(serde_json::from_str::<ConfirmedFeatures>).transpose() {
                Ok(f) => f.unwrap_or_default(),
                Err(e) => return fail(&format!("Invalid features: {}", e)),
            };

            // An explicit --subtype overrides the one in the features record
            let features = match subtype {
                Some(s) => features.with_sub_type(s),
                None => features,
            };

            print_json(&pipeline.build_bom(&category, &features))
        }

        Commands::Cost { payload } => {
            let payload: CostPayload = match serde_json::from_str(&payload) {
                Ok(p) => p,
                Err(e) => return fail(&format!("Invalid payload: {}", e)),
            };

            print_json(&pipeline.compute(&payload.bom, &payload.settings))
        }

        Commands::Quote { payload } => {
            let request: QuoteRequest = match serde_json::from_str(&payload) {
                Ok(r) => r,
                Err(e) => return fail(&format!("Invalid payload: {}", e)),
            };

            match pipeline.quote(&request) {
                Ok(report) => print_json(&serde_json::json!({
                    "success": true,
                    "report": report,
                })),
                Err(e) => fail(&e.to_string()),
            }
        }

        Commands::Tier { quantity } => {
            print_json(&serde_json::json!({
                "quantity": quantity,
                "tier": tiers::tier_for(quantity),
            }))
        }

        Commands::Audit { payload, strict } => {
            let bom: Vec<BomLineItem> = match serde_json::from_str(&payload) {
                Ok(b) => b,
                Err(e) => return fail(&format!("Invalid payload: {}", e)),
            };

            let mode = if strict { AuditMode::Strict } else { AuditMode::Warn };
            let report = pipeline.with_audit_mode(mode).audit(&bom);
            let code = print_json(&report);
            if report.clean {
                code
            } else {
                ExitCode::from(2)  // Audit failure
            }
        }
    }
}
