//! Encoded values: named properties packed into the per-edge flags record.

mod encoded_value;
mod encoding_manager;

use smallvec::SmallVec;

pub use encoded_value::{
    BitPosition, BooleanEncodedValue, DecimalEncodedValue, EncodedValueDef, EncodedValueKind,
    EncodedValueLayout, EnumEncodedValue, EnumValue, IntEncodedValue, RoadClass,
};
pub use encoding_manager::{
    EncodingManager, EncodingManagerBuilder, MAX_SPEED, ROUNDABOUT, access_key,
    average_speed_key,
};

/// Raw flags record of one edge, `ints_for_flags` ints long
pub type EdgeFlags = SmallVec<[u32; 4]>;
