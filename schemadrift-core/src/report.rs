// schemadrift-core/src/report.rs
// Line-oriented text report

use serde_json::Value;

use crate::audit::CollectionReport;
use crate::reconcile::{ActionKind, IndexOutcome, IndexStatus, RepairAction};

/// Width index names are padded to in index lines
const INDEX_NAME_WIDTH: usize = 30;

/// Line printed before the collection listing is fetched
pub fn fetching_line(source_db: &str, target_db: &str) -> String {
    format!(
        "Fetching collections from source database '{}' and target database '{}'...",
        source_db, target_db
    )
}

/// Header printed once the listing succeeded
pub fn comparison_header(
    source_db: &str,
    source_filter: &Value,
    target_db: &str,
    target_filter: &Value,
) -> Vec<String> {
    vec![
        String::new(),
        "--- Comparison Details ---".to_string(),
        format!(
            "Source DB: {} (Filter: {}) | Target DB: {} (Filter: {})",
            source_db, source_filter, target_db, target_filter
        ),
    ]
}

/// Render one collection report
///
/// With `hide_matching`, matching count and index lines are left out;
/// mismatches, statements and repair actions are always shown.
pub fn render_collection(report: &CollectionReport, hide_matching: bool) -> Vec<String> {
    let mut lines = vec![String::new(), format!("Collection: {}", report.collection)];

    if let Some(counts) = &report.counts {
        if !hide_matching || !counts.matched {
            lines.push(format!(
                "  - Document Count | Match: {} (Source: {}, Target: {})",
                if counts.matched { "Match" } else { "Mismatch" },
                counts.source,
                counts.target
            ));
        }
    }

    for outcome in &report.indexes {
        if hide_matching && outcome.status.is_match() {
            continue;
        }
        render_index(&report.collection, outcome, &mut lines);
    }

    lines
}

fn render_index(collection: &str, outcome: &IndexOutcome, lines: &mut Vec<String>) {
    let verdict = match &outcome.status {
        IndexStatus::Match => "Match".to_string(),
        IndexStatus::Mismatch(reasons) => {
            let reasons: Vec<String> = reasons.iter().map(ToString::to_string).collect();
            format!("Mismatch ({})", reasons.join(", "))
        }
        IndexStatus::NotInSource => "Mismatch (Not in Source)".to_string(),
        IndexStatus::NotInTarget { .. } => "Mismatch (Not in Target)".to_string(),
    };
    lines.push(format!(
        "  - Index: {:<width$} | Match: {}",
        outcome.name,
        verdict,
        width = INDEX_NAME_WIDTH
    ));

    if let IndexStatus::NotInTarget { statement } = &outcome.status {
        lines.push(format!("    - Create Index Statement: {}", statement));
    }

    for action in &outcome.actions {
        lines.push(render_action(collection, action));
    }
}

fn render_action(collection: &str, action: &RepairAction) -> String {
    match (&action.kind, &action.error) {
        (ActionKind::Drop, None) => format!(
            "    - Dropped index '{}' from target collection '{}'",
            action.index, collection
        ),
        (ActionKind::Create, None) => format!(
            "    - Created index '{}' on target collection '{}'",
            action.index, collection
        ),
        (ActionKind::CreateCollection, None) => {
            format!("    - Created collection '{}' on target", collection)
        }
        (ActionKind::CreateCollection, Some(err)) => format!(
            "    - Failed to create collection '{}' on target: {}",
            collection, err
        ),
        (ActionKind::Drop, Some(err)) => format!(
            "    - Failed to drop index '{}' from target collection '{}': {}",
            action.index, collection, err
        ),
        (ActionKind::Create, Some(err)) => format!(
            "    - Failed to create index '{}' on target collection '{}': {}",
            action.index, collection, err
        ),
    }
}
