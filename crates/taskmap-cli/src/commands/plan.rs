//! Plan command implementation

use crate::cli::PlanArgs;
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::output_types::PlanOutput;
use anyhow::Result;
use std::path::Path;
use taskmap_core::models::{ScopeId, SearchCriteria};
use taskmap_retrieval::{BoundedQueryPlanner, QueryDecision};

pub fn execute(args: PlanArgs, config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let config = load_config(config_path, (&args.tuning).into())?;
    let planner = BoundedQueryPlanner::from_config(&config.coordinator_config());

    let mut criteria = SearchCriteria::new(args.zoom);
    if let Some(bbox) = args.bbox {
        criteria = criteria.with_bounding_box(bbox);
    }
    if let Some(scope) = args.scope {
        criteria = criteria.with_scope(ScopeId(scope));
    }

    let decision = planner.decide(&criteria, args.previous_count, args.prefer_clusters);
    let degree_span = args.bbox.map(|bbox| bbox.degree_span());

    let plan = match decision {
        QueryDecision::Refuse(reason) => PlanOutput {
            decision: "refuse".to_string(),
            mode: None,
            reason: Some(reason.to_string()),
            degree_span,
            individual_fetch_limit: planner.individual_fetch_limit(),
        },
        QueryDecision::Fetch(mode) => PlanOutput {
            decision: "fetch".to_string(),
            mode: Some(mode.to_string()),
            reason: None,
            degree_span,
            individual_fetch_limit: planner.individual_fetch_limit(),
        },
    };

    if output.is_json() {
        return output.result(plan);
    }

    output.section("Query Plan");
    output.kv("Zoom", format!("{} (max {})", args.zoom, planner.max_zoom()));
    output.kv(
        "Viewport",
        args.bbox.map(|bbox| bbox.to_string()).unwrap_or_else(|| "None".to_string()),
    );
    if let Some(span) = plan.degree_span {
        output.kv("Span", format!("{:.2}° (limit {}°)", span, planner.max_allowed_degrees()));
    }
    output.kv("Scope", args.scope.map(|s| s.to_string()).unwrap_or_else(|| "None".to_string()));
    output.kv("Previous Count", args.previous_count);

    output.section("Decision");
    match decision {
        QueryDecision::Refuse(reason) => {
            output.kv("Decision", "Refuse");
            output.info(format!("Query refused: {}", reason));
        }
        QueryDecision::Fetch(mode) => {
            output.kv("Decision", "Fetch");
            output.kv("Mode", mode);
            output.kv("Individual Limit", plan.individual_fetch_limit);
        }
    }

    Ok(())
}
