use crate::desired::DesiredStreamSpec;
use crate::error::Result;
use crate::identity::IdGenerator;
use crate::models::RemoteStream;
use std::collections::HashSet;

/// A desired stream together with its derived identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStream {
    pub stream_id: String,
    pub spec: DesiredStreamSpec,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciliationResult {
    /// In the order the specs were given.
    pub to_create: Vec<PlannedStream>,
    pub to_skip: Vec<String>,
}

/// Split `desired` into streams already on the server and streams to create,
/// matching on derived stream ID.
///
/// Duplicate codes in `desired` are planned once; later duplicates are skipped.
pub fn reconcile(
    desired: Vec<DesiredStreamSpec>,
    inventory: &[RemoteStream],
    ids: &IdGenerator,
) -> Result<ReconciliationResult> {
    let existing: HashSet<&str> = inventory.iter().map(|s| s.stream_id.as_str()).collect();
    let mut planned: HashSet<String> = HashSet::new();
    let mut result = ReconciliationResult::default();

    for spec in desired {
        let stream_id = ids.derive(&spec.code)?;
        if existing.contains(stream_id.as_str()) || planned.contains(&stream_id) {
            tracing::debug!("{} already exists, skipping", stream_id);
            result.to_skip.push(stream_id);
            continue;
        }
        planned.insert(stream_id.clone());
        result.to_create.push(PlannedStream { stream_id, spec });
    }

    tracing::info!(
        "Reconciled: {} to create, {} already present",
        result.to_create.len(),
        result.to_skip.len()
    );
    Ok(result)
}
