use console_logging::{console_info, console_warn};
use fleet_core::{Action, BulkFailure, BulkResult, EntityName};

use crate::{ApiClient, BatchExecutor};

/// Applies `action` to every name, bounded by `executor`. Never stops early:
/// each name ends up in exactly one of `successes` or `failures`.
pub async fn apply_action(
    client: &ApiClient,
    cluster: &str,
    names: &[EntityName],
    action: Action,
    executor: &BatchExecutor,
) -> BulkResult {
    let outcome = executor
        .run(names, |name| client.act(cluster, name, action), |_| {})
        .await;

    let successes: Vec<EntityName> = outcome
        .successes
        .iter()
        .map(|item| names[item.index].clone())
        .collect();
    let failures: Vec<BulkFailure> = outcome
        .failures
        .into_iter()
        .map(|item| {
            let name = names[item.index].clone();
            console_warn!("{action} {name} failed: {}", item.value);
            BulkFailure {
                name,
                error: item.value.user_message(),
            }
        })
        .collect();

    console_info!(
        "{action} on {} connector(s): {} succeeded, {} failed",
        names.len(),
        successes.len(),
        failures.len()
    );
    BulkResult {
        successes,
        failures,
    }
}
