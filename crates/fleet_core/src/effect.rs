use crate::{Action, CycleId, EntityName};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// List the fleet and fetch every connector's details.
    RefreshFleet { cycle: CycleId, silent: bool },
    /// Apply one action to each named connector.
    ApplyAction {
        names: Vec<EntityName>,
        action: Action,
    },
    /// Refetch one connector. `generation` comes back with the result.
    RefreshEntity { name: EntityName, generation: u64 },
}
