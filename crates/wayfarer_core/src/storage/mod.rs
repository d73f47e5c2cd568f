mod data_access;
mod directory;

pub use data_access::{DEFAULT_SEGMENT_SIZE, DataAccess, DataAccessKind, HEADER_INTS};
pub use directory::{GraphDirectory, StorageConfig};
