//! Browse command implementation

use crate::cli::BrowseArgs;
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::output_types::{BrowseOutput, ClusterRow, FetchSummary, TaskRow};
use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use serde_json::{Map, Value as JsonValue};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use taskmap_core::models::{LatLng, Priority, ScopeId, SearchCriteria, TaskStatus, WorkItem};
use taskmap_retrieval::{
    FetchCoordinator, FetchOutcome, FilterEngine, FilterKey, MapItems, ReviewStatusKey,
};
use taskmap_store::{HttpTaskBackend, MemoryTaskBackend, TaskSearchBackend};

pub async fn execute(args: BrowseArgs, config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let config = load_config(config_path, (&args.tuning).into())?;

    let backend: Arc<dyn TaskSearchBackend> = match (&args.tasks, &args.endpoint) {
        (Some(path), _) => Arc::new(load_task_file(path)?),
        (None, Some(endpoint)) => Arc::new(HttpTaskBackend::new(endpoint.as_str())),
        (None, None) => anyhow::bail!("Either --tasks or --endpoint is required"),
    };

    let coordinator = FetchCoordinator::new(backend, config.coordinator_config());
    coordinator.set_prefer_clusters(args.prefer_clusters);

    let criteria = build_criteria(&args);
    let outcome = coordinator.fetch(&criteria).await;
    let state = coordinator.state();

    match &outcome {
        FetchOutcome::Refused { reason, .. } => output.info(format!("Query refused: {}", reason)),
        FetchOutcome::Failed { error, .. } => output.warning(format!("Fetch failed: {}", error)),
        _ => {}
    }

    let mut engine = FilterEngine::new();
    apply_filter_args(&mut engine, &args);
    engine.sync_tasks(&state);

    let visible = match &state.items {
        MapItems::Tasks(_) => MapItems::Tasks(engine.filtered().to_vec()),
        MapItems::Clusters(clusters) => MapItems::Clusters(
            clusters
                .iter()
                .filter(|cluster| cluster.declustered().map_or(true, |task| engine.passes(&task)))
                .cloned()
                .collect(),
        ),
    };

    if let Some(path) = &args.geojson {
        let collection = to_feature_collection(&visible);
        fs::write(path, serde_json::to_string_pretty(&collection)?)
            .with_context(|| format!("Failed to write GeoJSON to {}", path.display()))?;
        output.success(format!("Wrote {} features to {}", visible.len(), path.display()));
    }

    if output.is_json() {
        return output.result(BrowseOutput {
            fetch: FetchSummary::from(&outcome),
            mode: state.mode.map(|m| m.to_string()),
            total_count: state.total_count,
            filtering: engine.is_filtering(),
            visible_count: visible.len(),
            items: visible,
        });
    }

    output.section("Fetch");
    output.kv("Sequence", outcome.sequence());
    output.kv("Mode", state.mode.map(|m| m.to_string()).unwrap_or_else(|| "none".to_string()));
    output.kv("Total Tasks", state.total_count);
    if let FetchOutcome::Committed { escalated: true, .. } = outcome {
        output.kv("Escalated", "yes, too many tasks for individual markers");
    }

    output.section(format!("Visible ({} of {})", visible.len(), state.items.len()));
    match &visible {
        MapItems::Tasks(tasks) => {
            output.table(tasks.iter().take(args.limit).map(TaskRow::from).collect());
        }
        MapItems::Clusters(clusters) => {
            output.table(clusters.iter().take(args.limit).map(ClusterRow::from).collect());
        }
    }
    if visible.len() > args.limit {
        output.info(format!("{} more not shown, raise --limit to see them", visible.len() - args.limit));
    }

    Ok(())
}

fn load_task_file(path: &Path) -> Result<MemoryTaskBackend> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read task file {}", path.display()))?;
    let tasks: Vec<WorkItem> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse task file {}", path.display()))?;

    tracing::info!(count = tasks.len(), path = %path.display(), "Loaded tasks");
    Ok(MemoryTaskBackend::with_tasks(tasks))
}

fn build_criteria(args: &BrowseArgs) -> SearchCriteria {
    let mut criteria = SearchCriteria::new(args.zoom);
    if let Some(bbox) = args.bbox {
        criteria = criteria.with_bounding_box(bbox);
    }
    if let Some(scope) = args.scope {
        criteria = criteria.with_scope(ScopeId(scope));
    }
    if let Some(search) = &args.search {
        criteria = criteria.with_search_query(search.as_str());
    }
    criteria
}

/// Listed values become the only included values of their dimension
fn apply_filter_args(engine: &mut FilterEngine, args: &BrowseArgs) {
    if let Some(user) = &args.user {
        engine.set_current_user(Some(user.as_str().into()));
    }

    if !args.status.is_empty() {
        for status in TaskStatus::ALL {
            engine.set_included(FilterKey::Status(status), args.status.contains(&status));
        }
    }

    if !args.priority.is_empty() {
        for priority in Priority::ALL {
            engine.set_included(FilterKey::Priority(priority), args.priority.contains(&priority));
        }
    }

    if !args.review_status.is_empty() {
        for review in ReviewStatusKey::ALL {
            engine.set_included(FilterKey::ReviewStatus(review), args.review_status.contains(&review));
        }
    }

    if args.exclude_locked {
        engine.set_included(FilterKey::Locked, false);
    }
}

fn to_feature_collection(items: &MapItems) -> FeatureCollection {
    let features = match items {
        MapItems::Tasks(tasks) => tasks
            .iter()
            .filter_map(|task| {
                let position = task.position?;
                let mut properties = Map::new();
                properties.insert("id".to_string(), JsonValue::from(task.id.0));
                properties.insert("status".to_string(), JsonValue::from(task.status.as_str()));
                properties.insert("priority".to_string(), JsonValue::from(task.priority.as_str()));
                if let Some(name) = &task.name {
                    properties.insert("name".to_string(), JsonValue::from(name.clone()));
                }
                Some(point_feature(position, properties))
            })
            .collect(),
        MapItems::Clusters(clusters) => clusters
            .iter()
            .map(|cluster| {
                let mut properties = Map::new();
                properties.insert("clusterId".to_string(), JsonValue::from(cluster.cluster_id));
                properties.insert("numberOfPoints".to_string(), JsonValue::from(cluster.number_of_points));
                if let Some(task_id) = cluster.task_id {
                    properties.insert("taskId".to_string(), JsonValue::from(task_id.0));
                }
                point_feature(cluster.point, properties)
            })
            .collect(),
    };

    FeatureCollection { features, bbox: None, foreign_members: None }
}

fn point_feature(position: LatLng, properties: Map<String, JsonValue>) -> Feature {
    Feature {
        geometry: Some(Geometry::new(GeoJsonValue::Point(vec![position.lng, position.lat]))),
        properties: Some(properties),
        id: None,
        bbox: None,
        foreign_members: None,
    }
}
