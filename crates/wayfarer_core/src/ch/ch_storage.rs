use std::ops::Range;

use tracing::{debug, info};

use crate::{
    error::{PreparationError, StorageError},
    storage::{DataAccess, GraphDirectory},
    types::{EdgeId, NodeId},
    weighting::Weight,
};

use super::preparation_graph::PrepShortcut;

// Level row: level and first shortcut of the node. A sentinel row follows the
// last node.
const L_LEVEL: u64 = 0;
const L_FIRST_SHORTCUT: u64 = 4;
const LEVEL_ROW_BYTES: u64 = 8;

// Shortcut row
const S_NODE_A: u64 = 0;
const S_NODE_B: u64 = 4;
const S_WEIGHT: u64 = 8;
const S_FLAGS: u64 = 12;
const S_SKIP1: u64 = 16;
const S_SKIP2: u64 = 20;
const S_ORIG_COUNT: u64 = 24;
const SHORTCUT_ROW_BYTES: u64 = 28;

/// Shortcut may be traveled from `node_a` to `node_b`
pub const SHORTCUT_FORWARD: i32 = 1;
/// Shortcut may be traveled from `node_b` to `node_a`
pub const SHORTCUT_BACKWARD: i32 = 2;

// Header slots of the levels data access
const H_NODE_COUNT: usize = 0;
const H_EDGE_COUNT: usize = 1;
const H_SHORTCUT_COUNT: usize = 2;

/// Smallest `f32` not below `weight`, so stored weights never underestimate
pub(crate) fn round_up_weight(weight: Weight) -> Weight {
    if !weight.is_finite() {
        return weight;
    }

    let rounded = weight as f32;
    if (rounded as f64) < weight {
        f32::from_bits(rounded.to_bits() + 1) as f64
    } else {
        rounded as f64
    }
}

#[derive(Clone, Debug, PartialEq, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
struct CHInfo {
    profile: String,
    weighting: String,
}

/// Stored shortcut. `node_a` has the lower level, `skip1` connects `node_a`
/// to the contracted node and `skip2` the contracted node to `node_b`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CHShortcut {
    pub node_a: NodeId,
    pub node_b: NodeId,
    pub weight: Weight,
    pub flags: i32,
    pub skip1: EdgeId,
    pub skip2: EdgeId,
    pub orig_count: u32,
}

impl CHShortcut {
    pub fn is_forward(&self) -> bool {
        self.flags & SHORTCUT_FORWARD != 0
    }

    pub fn is_backward(&self) -> bool {
        self.flags & SHORTCUT_BACKWARD != 0
    }
}

/// Node levels and shortcuts of a contraction hierarchy.
///
/// Shortcuts are grouped by their lower level node. Skip references below
/// [`CHStorage::edge_count`] are original edges, the others are shortcut
/// `reference - edge_count`.
pub struct CHStorage {
    directory: GraphDirectory,
    info: CHInfo,
    levels: DataAccess,
    shortcuts: DataAccess,
    node_count: usize,
    edge_count: usize,
    shortcut_count: usize,
}

impl CHStorage {
    fn levels_name(profile: &str) -> String {
        format!("ch_levels_{}", profile)
    }

    fn shortcuts_name(profile: &str) -> String {
        format!("ch_shortcuts_{}", profile)
    }

    fn info_name(profile: &str) -> String {
        format!("ch_info_{}", profile)
    }

    /// Writes the levels and the shortcuts found by the preparation.
    /// Shortcut arena ids become `edge_count + index` in the stored order.
    pub(crate) fn create(
        directory: &GraphDirectory,
        profile: &str,
        weighting: &str,
        levels: &[usize],
        edge_count: usize,
        prep_shortcuts: &[PrepShortcut],
    ) -> Result<Self, PreparationError> {
        let node_count = levels.len();

        let mut rows: Vec<CHShortcut> = prep_shortcuts
            .iter()
            .map(|shortcut| {
                if levels[shortcut.from] < levels[shortcut.to] {
                    CHShortcut {
                        node_a: shortcut.from,
                        node_b: shortcut.to,
                        weight: shortcut.weight,
                        flags: SHORTCUT_FORWARD,
                        skip1: shortcut.skip_in,
                        skip2: shortcut.skip_out,
                        orig_count: shortcut.orig_count,
                    }
                } else {
                    CHShortcut {
                        node_a: shortcut.to,
                        node_b: shortcut.from,
                        weight: shortcut.weight,
                        flags: SHORTCUT_BACKWARD,
                        skip1: shortcut.skip_out,
                        skip2: shortcut.skip_in,
                        orig_count: shortcut.orig_count,
                    }
                }
            })
            .collect();

        let mut order: Vec<usize> = (0..rows.len()).collect();
        order.sort_by_key(|&index| rows[index].node_a);
        let mut remapped = vec![0; rows.len()];
        for (position, &index) in order.iter().enumerate() {
            remapped[index] = edge_count + position;
        }
        let remap = |reference: EdgeId| {
            if reference >= edge_count {
                remapped[reference - edge_count]
            } else {
                reference
            }
        };
        for row in rows.iter_mut() {
            row.skip1 = remap(row.skip1);
            row.skip2 = remap(row.skip2);
        }
        let rows: Vec<CHShortcut> = order.iter().map(|&index| rows[index]).collect();

        let mut storage = Self {
            directory: directory.clone(),
            info: CHInfo {
                profile: profile.to_string(),
                weighting: weighting.to_string(),
            },
            levels: directory.create(&Self::levels_name(profile))?,
            shortcuts: directory.create(&Self::shortcuts_name(profile))?,
            node_count,
            edge_count,
            shortcut_count: rows.len(),
        };

        storage.levels.create((node_count as u64 + 1) * LEVEL_ROW_BYTES)?;
        storage
            .shortcuts
            .create((rows.len() as u64).max(1) * SHORTCUT_ROW_BYTES)?;

        let mut next_row = 0;
        for node in 0..node_count {
            let pointer = node as u64 * LEVEL_ROW_BYTES;
            storage.levels.set_int(pointer + L_LEVEL, levels[node] as i32);
            storage
                .levels
                .set_int(pointer + L_FIRST_SHORTCUT, next_row as i32);
            while next_row < rows.len() && rows[next_row].node_a == node {
                next_row += 1;
            }
        }
        storage.levels.set_int(
            node_count as u64 * LEVEL_ROW_BYTES + L_FIRST_SHORTCUT,
            rows.len() as i32,
        );

        for (index, row) in rows.iter().enumerate() {
            let pointer = index as u64 * SHORTCUT_ROW_BYTES;
            let shortcuts = &mut storage.shortcuts;
            shortcuts.set_int(pointer + S_NODE_A, row.node_a as i32);
            shortcuts.set_int(pointer + S_NODE_B, row.node_b as i32);
            shortcuts.set_int(pointer + S_WEIGHT, (row.weight as f32).to_bits() as i32);
            shortcuts.set_int(pointer + S_FLAGS, row.flags);
            shortcuts.set_int(pointer + S_SKIP1, row.skip1 as i32);
            shortcuts.set_int(pointer + S_SKIP2, row.skip2 as i32);
            shortcuts.set_int(pointer + S_ORIG_COUNT, row.orig_count as i32);
        }

        debug!(
            "Created CH storage for {} with {} nodes and {} shortcuts",
            profile, node_count, storage.shortcut_count
        );

        Ok(storage)
    }

    /// Loads the hierarchy prepared for `profile`
    pub fn load(directory: &GraphDirectory, profile: &str) -> Result<Self, PreparationError> {
        let info = match directory.read_file(&Self::info_name(profile))? {
            Some(bytes) => {
                let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(bytes.len());
                aligned.extend_from_slice(&bytes);
                rkyv::from_bytes::<CHInfo, rkyv::rancor::Error>(&aligned)
                    .map_err(|error| StorageError::Serialization(error.to_string()))?
            }
            None => {
                return Err(StorageError::Uninitialized(Self::info_name(profile)).into());
            }
        };

        if info.profile != profile {
            return Err(PreparationError::ProfileMismatch {
                stored: info.profile,
                requested: profile.to_string(),
            });
        }

        let mut levels = directory.create(&Self::levels_name(profile))?;
        let mut shortcuts = directory.create(&Self::shortcuts_name(profile))?;
        if !levels.load_existing()? {
            return Err(StorageError::Uninitialized(Self::levels_name(profile)).into());
        }
        if !shortcuts.load_existing()? {
            return Err(StorageError::Uninitialized(Self::shortcuts_name(profile)).into());
        }

        let node_count = levels.header(H_NODE_COUNT) as usize;
        let edge_count = levels.header(H_EDGE_COUNT) as usize;
        let shortcut_count = levels.header(H_SHORTCUT_COUNT) as usize;

        info!(
            "Loaded CH storage for {} with {} shortcuts",
            profile, shortcut_count
        );

        Ok(Self {
            directory: directory.clone(),
            info,
            levels,
            shortcuts,
            node_count,
            edge_count,
            shortcut_count,
        })
    }

    pub fn flush(&mut self) -> Result<(), StorageError> {
        self.levels.set_header(H_NODE_COUNT, self.node_count as i32);
        self.levels.set_header(H_EDGE_COUNT, self.edge_count as i32);
        self.levels
            .set_header(H_SHORTCUT_COUNT, self.shortcut_count as i32);
        self.levels.flush()?;
        self.shortcuts.flush()?;

        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&self.info)
            .map_err(|error| StorageError::Serialization(error.to_string()))?;
        self.directory
            .write_file(&Self::info_name(&self.info.profile), &bytes)?;

        debug!("Flushed CH storage for {}", self.info.profile);
        Ok(())
    }

    pub fn close(self) -> Result<(), StorageError> {
        let levels = self.levels.close();
        let shortcuts = self.shortcuts.close();
        levels.and(shortcuts)
    }

    pub fn profile(&self) -> &str {
        &self.info.profile
    }

    pub fn weighting_name(&self) -> &str {
        &self.info.weighting
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Original edges of the prepared graph
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn shortcut_count(&self) -> usize {
        self.shortcut_count
    }

    pub fn level(&self, node: NodeId) -> usize {
        self.levels.get_int(node as u64 * LEVEL_ROW_BYTES + L_LEVEL) as usize
    }

    /// Shortcuts whose lower level node is `node`
    pub fn shortcut_range(&self, node: NodeId) -> Range<usize> {
        let pointer = node as u64 * LEVEL_ROW_BYTES + L_FIRST_SHORTCUT;
        let start = self.levels.get_int(pointer) as usize;
        let end = self.levels.get_int(pointer + LEVEL_ROW_BYTES) as usize;
        start..end
    }

    pub fn shortcut(&self, index: usize) -> CHShortcut {
        let pointer = index as u64 * SHORTCUT_ROW_BYTES;
        CHShortcut {
            node_a: self.shortcuts.get_int(pointer + S_NODE_A) as NodeId,
            node_b: self.shortcuts.get_int(pointer + S_NODE_B) as NodeId,
            weight: f32::from_bits(self.shortcuts.get_int(pointer + S_WEIGHT) as u32) as f64,
            flags: self.shortcuts.get_int(pointer + S_FLAGS),
            skip1: self.shortcuts.get_int(pointer + S_SKIP1) as EdgeId,
            skip2: self.shortcuts.get_int(pointer + S_SKIP2) as EdgeId,
            orig_count: self.shortcuts.get_int(pointer + S_ORIG_COUNT) as u32,
        }
    }

    /// Shortcut index of a skip reference, `None` for an original edge
    pub fn shortcut_index(&self, reference: EdgeId) -> Option<usize> {
        reference.checked_sub(self.edge_count)
    }
}
