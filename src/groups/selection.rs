//! Choosing which groups a run analyses

use tracing::{debug, warn};

use crate::config::ConfigError;
use crate::tree::{GroupId, PhyloTree, TreeError};
use crate::PhyloDivError;

/// Placeholder group assigned to sequences missing from the group table.
///
/// Never analysed, even when requested explicitly.
pub const UNASSIGNED_GROUP: &str = "xxx";

/// Which groups to analyse.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GroupSelection {
    /// Every group with at least one sequence in the tree.
    #[default]
    All,
    /// Only the listed groups, in this order.
    Named(Vec<String>),
}

/// Groups taking part in a run, each assigned a dense slot.
///
/// Slots index the per-group rows of diversity tables and counted marks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveGroups {
    ids: Vec<GroupId>,
    slots: Vec<Option<usize>>,
}

impl ActiveGroups {
    /// Resolve a selection against a tree.
    ///
    /// Requested names absent from the tree are reported and dropped. A
    /// requested group present in the tree without any sequence is a
    /// structural error.
    pub fn select(tree: &PhyloTree, selection: &GroupSelection) -> Result<Self, PhyloDivError> {
        let mut ids = Vec::new();

        match selection {
            GroupSelection::All => {
                for group in tree.group_ids() {
                    let name = tree.group_name(group);
                    if name == UNASSIGNED_GROUP {
                        continue;
                    }
                    if tree.group_total(group) == 0 {
                        debug!(group = name, "skipping group without sequences");
                        continue;
                    }
                    ids.push(group);
                }
            }
            GroupSelection::Named(names) => {
                for name in names {
                    if name == UNASSIGNED_GROUP {
                        continue;
                    }
                    match tree.group_id(name) {
                        Some(group) => {
                            if tree.group_total(group) == 0 {
                                return Err(TreeError::EmptyGroup(name.clone()).into());
                            }
                            ids.push(group);
                        }
                        None => {
                            warn!("{} is not a valid group, and will be disregarded", name);
                        }
                    }
                }
            }
        }

        if ids.is_empty() {
            return Err(ConfigError::NoValidGroups.into());
        }

        Ok(Self::from_ids(tree.group_names().len(), ids))
    }

    /// Build from explicit ids; `num_groups` is the size of the tree's group table.
    pub fn from_ids(num_groups: usize, ids: Vec<GroupId>) -> Self {
        let mut slots = vec![None; num_groups];
        for (slot, group) in ids.iter().enumerate() {
            slots[group.index()] = Some(slot);
        }
        Self { ids, slots }
    }

    /// Keep only groups matching `keep`, reassigning slots.
    pub fn retain(&mut self, mut keep: impl FnMut(GroupId) -> bool) {
        let ids: Vec<GroupId> = self.ids.iter().copied().filter(|&group| keep(group)).collect();
        *self = Self::from_ids(self.slots.len(), ids);
    }

    /// Active group ids in slot order.
    pub fn ids(&self) -> &[GroupId] {
        &self.ids
    }

    /// Slot of `group`, `None` if it is not active.
    #[inline]
    pub fn slot(&self, group: GroupId) -> Option<usize> {
        self.slots.get(group.index()).copied().flatten()
    }

    /// Number of active groups.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no group is active.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
