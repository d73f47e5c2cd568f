use tracing::{debug, info};

use crate::{
    error::{PreparationError, StorageError},
    storage::{DataAccess, GraphDirectory},
    types::NodeId,
    weighting::Weight,
};

/// Stored distance of an unreachable node
pub const LM_INFINITY: u16 = u16::MAX;
/// Stored distance of a node at least `LM_CLAMPED * factor` away
pub const LM_CLAMPED: u16 = u16::MAX - 1;

// Weight row: one slot per landmark, each with the distance from and to the
// landmark
const W_FROM: u64 = 0;
const W_TO: u64 = 2;
const SLOT_BYTES: u64 = 4;

const SUBNETWORK_ROW_BYTES: u64 = 4;

// Header slots of the weights data access
const H_NODE_COUNT: usize = 0;
const H_LANDMARKS: usize = 1;

/// Fixed point value of `weight`, rounded down
pub(crate) fn encode_weight(weight: Weight, factor: f64) -> u16 {
    if !weight.is_finite() {
        return LM_INFINITY;
    }

    let value = (weight / factor).floor();
    if value >= LM_CLAMPED as f64 {
        LM_CLAMPED
    } else {
        value as u16
    }
}

/// Finite and not clamped
#[inline]
pub(crate) fn is_exact(value: u16) -> bool {
    value < LM_CLAMPED
}

#[derive(Clone, Debug, PartialEq, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
struct LandmarkSet {
    subnetwork: u32,
    nodes: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
struct LMInfo {
    profile: String,
    weighting: String,
    factor: f64,
    active_landmarks: u32,
    /// Sorted by subnetwork
    landmark_sets: Vec<LandmarkSet>,
}

/// Landmarks of every prepared subnetwork and the fixed point distances of
/// every node from and to them.
///
/// Slot `i` of a node refers to the `i`th landmark of its subnetwork. Nodes
/// of subnetworks without landmarks only hold [`LM_INFINITY`].
pub struct LandmarkStorage {
    directory: GraphDirectory,
    info: LMInfo,
    weights: DataAccess,
    subnetworks: DataAccess,
    node_count: usize,
    landmark_count: usize,
}

impl LandmarkStorage {
    fn weights_name(profile: &str) -> String {
        format!("landmarks_{}", profile)
    }

    fn subnetworks_name(profile: &str) -> String {
        format!("landmarks_subnetworks_{}", profile)
    }

    fn info_name(profile: &str) -> String {
        format!("landmarks_info_{}", profile)
    }

    pub(crate) fn create(
        directory: &GraphDirectory,
        profile: &str,
        weighting: &str,
        factor: f64,
        landmark_count: usize,
        active_landmarks: usize,
        subnetwork_ids: &[u32],
    ) -> Result<Self, PreparationError> {
        let node_count = subnetwork_ids.len();
        let row_bytes = landmark_count as u64 * SLOT_BYTES;

        let mut storage = Self {
            directory: directory.clone(),
            info: LMInfo {
                profile: profile.to_string(),
                weighting: weighting.to_string(),
                factor,
                active_landmarks: active_landmarks as u32,
                landmark_sets: Vec::new(),
            },
            weights: directory.create(&Self::weights_name(profile))?,
            subnetworks: directory.create(&Self::subnetworks_name(profile))?,
            node_count,
            landmark_count,
        };

        storage.weights.create((node_count as u64 * row_bytes).max(1))?;
        storage
            .subnetworks
            .create((node_count as u64 * SUBNETWORK_ROW_BYTES).max(1))?;

        for (node, &subnetwork) in subnetwork_ids.iter().enumerate() {
            storage
                .subnetworks
                .set_int(node as u64 * SUBNETWORK_ROW_BYTES, subnetwork as i32);
            for slot in 0..landmark_count {
                let pointer = node as u64 * row_bytes + slot as u64 * SLOT_BYTES;
                storage.weights.set_short(pointer + W_FROM, LM_INFINITY as i16);
                storage.weights.set_short(pointer + W_TO, LM_INFINITY as i16);
            }
        }

        debug!(
            "Created landmark storage for {} with {} nodes and {} landmarks per subnetwork",
            profile, node_count, landmark_count
        );

        Ok(storage)
    }

    pub(crate) fn set_landmarks(&mut self, subnetwork: u32, nodes: &[NodeId]) {
        let set = LandmarkSet {
            subnetwork,
            nodes: nodes.iter().map(|&node| node as u32).collect(),
        };
        let sets = &mut self.info.landmark_sets;
        match sets.binary_search_by_key(&subnetwork, |set| set.subnetwork) {
            Ok(index) => sets[index] = set,
            Err(index) => sets.insert(index, set),
        }
    }

    fn pointer(&self, node: NodeId, slot: usize) -> u64 {
        (node * self.landmark_count + slot) as u64 * SLOT_BYTES
    }

    pub(crate) fn set_from_weight(&mut self, node: NodeId, slot: usize, value: u16) {
        let pointer = self.pointer(node, slot) + W_FROM;
        self.weights.set_short(pointer, value as i16);
    }

    pub(crate) fn set_to_weight(&mut self, node: NodeId, slot: usize, value: u16) {
        let pointer = self.pointer(node, slot) + W_TO;
        self.weights.set_short(pointer, value as i16);
    }

    /// Loads the landmarks prepared for `profile`
    pub fn load(directory: &GraphDirectory, profile: &str) -> Result<Self, PreparationError> {
        let info = match directory.read_file(&Self::info_name(profile))? {
            Some(bytes) => {
                let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(bytes.len());
                aligned.extend_from_slice(&bytes);
                rkyv::from_bytes::<LMInfo, rkyv::rancor::Error>(&aligned)
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

        let mut weights = directory.create(&Self::weights_name(profile))?;
        let mut subnetworks = directory.create(&Self::subnetworks_name(profile))?;
        if !weights.load_existing()? {
            return Err(StorageError::Uninitialized(Self::weights_name(profile)).into());
        }
        if !subnetworks.load_existing()? {
            return Err(StorageError::Uninitialized(Self::subnetworks_name(profile)).into());
        }

        let node_count = weights.header(H_NODE_COUNT) as usize;
        let landmark_count = weights.header(H_LANDMARKS) as usize;

        info!(
            "Loaded landmarks for {} with {} prepared subnetworks",
            profile,
            info.landmark_sets.len()
        );

        Ok(Self {
            directory: directory.clone(),
            info,
            weights,
            subnetworks,
            node_count,
            landmark_count,
        })
    }

    pub fn flush(&mut self) -> Result<(), StorageError> {
        self.weights.set_header(H_NODE_COUNT, self.node_count as i32);
        self.weights
            .set_header(H_LANDMARKS, self.landmark_count as i32);
        self.weights.flush()?;
        self.subnetworks.flush()?;

        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&self.info)
            .map_err(|error| StorageError::Serialization(error.to_string()))?;
        self.directory
            .write_file(&Self::info_name(&self.info.profile), &bytes)?;

        debug!("Flushed landmark storage for {}", self.info.profile);
        Ok(())
    }

    pub fn close(self) -> Result<(), StorageError> {
        let weights = self.weights.close();
        let subnetworks = self.subnetworks.close();
        weights.and(subnetworks)
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

    /// Landmarks per prepared subnetwork
    pub fn landmark_count(&self) -> usize {
        self.landmark_count
    }

    /// Landmarks a query uses unless told otherwise
    pub fn active_landmarks(&self) -> usize {
        self.info.active_landmarks as usize
    }

    /// Weight of one fixed point unit
    pub fn factor(&self) -> f64 {
        self.info.factor
    }

    pub fn subnetwork(&self, node: NodeId) -> u32 {
        self.subnetworks.get_int(node as u64 * SUBNETWORK_ROW_BYTES) as u32
    }

    pub fn prepared_subnetworks(&self) -> usize {
        self.info.landmark_sets.len()
    }

    /// Landmarks of `subnetwork`, empty when it was too small
    pub fn landmarks(&self, subnetwork: u32) -> Vec<NodeId> {
        self.info
            .landmark_sets
            .binary_search_by_key(&subnetwork, |set| set.subnetwork)
            .map(|index| {
                self.info.landmark_sets[index]
                    .nodes
                    .iter()
                    .map(|&node| node as NodeId)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Fixed point distance from the landmark in `slot` to `node`
    #[inline]
    pub fn from_weight(&self, node: NodeId, slot: usize) -> u16 {
        self.weights.get_short(self.pointer(node, slot) + W_FROM) as u16
    }

    /// Fixed point distance from `node` to the landmark in `slot`
    #[inline]
    pub fn to_weight(&self, node: NodeId, slot: usize) -> u16 {
        self.weights.get_short(self.pointer(node, slot) + W_TO) as u16
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{DataAccessKind, StorageConfig};

    use super::*;

    #[test]
    fn test_encode_weight() {
        assert_eq!(encode_weight(0.0, 2.0), 0);
        assert_eq!(encode_weight(5.9, 2.0), 2);
        assert_eq!(encode_weight(f64::INFINITY, 2.0), LM_INFINITY);
        assert_eq!(encode_weight(1e12, 2.0), LM_CLAMPED);
        assert!(is_exact(encode_weight(5.9, 2.0)));
        assert!(!is_exact(LM_CLAMPED));
        assert!(!is_exact(LM_INFINITY));
    }

    #[test]
    fn test_rows() {
        let directory = GraphDirectory::in_memory_with_segment_size(128);
        let mut storage =
            LandmarkStorage::create(&directory, "car", "fastest_car", 0.5, 3, 2, &[0, 1, 1, 0, 2])
                .unwrap();
        storage.set_landmarks(1, &[2, 1, 2]);
        storage.set_landmarks(0, &[3, 0, 3]);
        storage.set_from_weight(4, 2, 7);
        storage.set_to_weight(4, 2, LM_CLAMPED);

        assert_eq!(storage.subnetwork(2), 1);
        assert_eq!(storage.subnetwork(4), 2);
        assert_eq!(storage.landmarks(0), vec![3, 0, 3]);
        assert_eq!(storage.landmarks(1), vec![2, 1, 2]);
        assert!(storage.landmarks(2).is_empty());
        assert_eq!(storage.prepared_subnetworks(), 2);
        assert_eq!(storage.active_landmarks(), 2);

        assert_eq!(storage.from_weight(4, 2), 7);
        assert_eq!(storage.to_weight(4, 2), LM_CLAMPED);
        assert_eq!(storage.from_weight(4, 1), LM_INFINITY);
        assert_eq!(storage.to_weight(0, 0), LM_INFINITY);
    }

    #[test]
    fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        let directory = GraphDirectory::new(dir.path(), Default::default());
        assert!(matches!(
            LandmarkStorage::load(&directory, "car"),
            Err(PreparationError::Storage(StorageError::Uninitialized(_)))
        ));
    }

    #[test]
    fn test_close_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            kind: DataAccessKind::Mmap,
            segment_size: 128,
            ..StorageConfig::default()
        };
        let directory = GraphDirectory::new(dir.path(), config);

        let mut storage =
            LandmarkStorage::create(&directory, "car", "shortest_car", 2.0, 2, 1, &[0, 0, 0]).unwrap();
        storage.set_landmarks(0, &[2, 0]);
        storage.set_from_weight(1, 0, 11);
        storage.set_to_weight(1, 1, 12);
        storage.flush().unwrap();
        storage.close().unwrap();

        let loaded = LandmarkStorage::load(&directory, "car").unwrap();
        assert_eq!(loaded.weighting_name(), "shortest_car");
        assert_eq!(loaded.factor(), 2.0);
        assert_eq!(loaded.landmarks(0), vec![2, 0]);
        assert_eq!(loaded.from_weight(1, 0), 11);
        assert_eq!(loaded.to_weight(1, 1), 12);
        assert_eq!(loaded.from_weight(2, 1), LM_INFINITY);
        loaded.close().unwrap();
    }
}
