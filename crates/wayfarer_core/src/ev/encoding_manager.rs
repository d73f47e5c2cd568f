use fxhash::{FxHashMap, FxHashSet};
use smallvec::smallvec;
use tracing::debug;

use crate::error::{EncodingError, StorageError};

use super::{
    EdgeFlags,
    encoded_value::{
        BitPosition, BooleanEncodedValue, DecimalEncodedValue, EncodedValueDef,
        EncodedValueKind, EncodedValueLayout, EnumEncodedValue, EnumValue, IntEncodedValue,
        RoadClass,
    },
};

pub const ROUNDABOUT: &str = "roundabout";
pub const MAX_SPEED: &str = "max_speed";

pub fn access_key(vehicle: &str) -> String {
    format!("{}_access", vehicle)
}

pub fn average_speed_key(vehicle: &str) -> String {
    format!("{}_average_speed", vehicle)
}

struct Claim {
    name: String,
    int_index: usize,
    mask: u32,
}

/// Hands out bit ranges inside the 32 bit ints of the flags record
#[derive(Default)]
struct BitAllocator {
    used: Vec<u32>,
    claims: Vec<Claim>,
}

impl BitAllocator {
    fn field_mask(bits: u32, shift: u32) -> u32 {
        (((1u64 << bits) - 1) as u32) << shift
    }

    fn claim(&mut self, name: &str, position: BitPosition, bits: u32) -> Result<(), EncodingError> {
        if position.shift + bits > 32 {
            return Err(EncodingError::InvalidPosition {
                name: name.to_string(),
                shift: position.shift,
                bits,
            });
        }

        let int_index = position.int_index as usize;
        let mask = Self::field_mask(bits, position.shift);
        if self.used.len() <= int_index {
            self.used.resize(int_index + 1, 0);
        }

        if self.used[int_index] & mask != 0 {
            let other = self
                .claims
                .iter()
                .find(|claim| claim.int_index == int_index && claim.mask & mask != 0)
                .map(|claim| claim.name.clone())
                .unwrap_or_default();
            return Err(EncodingError::Overlap {
                name: name.to_string(),
                other,
                int_index,
            });
        }

        self.used[int_index] |= mask;
        self.claims.push(Claim {
            name: name.to_string(),
            int_index,
            mask,
        });
        Ok(())
    }

    /// First free range of `bits` bits, never spanning two ints
    fn allocate(&mut self, name: &str, bits: u32) -> Result<BitPosition, EncodingError> {
        let mut int_index = 0;
        loop {
            let used = self.used.get(int_index).copied().unwrap_or(0);
            for shift in 0..=(32 - bits) {
                if used & Self::field_mask(bits, shift) == 0 {
                    let position = BitPosition {
                        int_index: int_index as u32,
                        shift,
                    };
                    self.claim(name, position, bits)?;
                    return Ok(position);
                }
            }
            int_index += 1;
        }
    }

    fn ints(&self) -> usize {
        self.used.len().max(1)
    }
}

#[derive(Default)]
pub struct EncodingManagerBuilder {
    defs: Vec<EncodedValueDef>,
}

impl EncodingManagerBuilder {
    pub fn add(mut self, def: EncodedValueDef) -> Self {
        self.defs.push(def);
        self
    }

    /// Access and average speed in both directions for `vehicle`
    pub fn add_vehicle(self, vehicle: &str, speed_bits: u32, speed_factor: f64) -> Self {
        self.add(EncodedValueDef::boolean(&access_key(vehicle), true))
            .add(EncodedValueDef::decimal(
                &average_speed_key(vehicle),
                speed_bits,
                speed_factor,
                true,
            ))
    }

    /// Car access and speed, road class, roundabout and max speed
    pub fn add_defaults(self) -> Self {
        self.add_vehicle("car", 5, 5.0)
            .add(EncodedValueDef::enumeration::<RoadClass>())
            .add(EncodedValueDef::boolean(ROUNDABOUT, false))
            .add(EncodedValueDef::decimal(MAX_SPEED, 5, 5.0, true).with_infinity())
    }

    pub fn build(self) -> Result<EncodingManager, EncodingError> {
        let mut names = FxHashSet::default();
        for def in self.defs.iter() {
            if def.bits == 0 || def.bits > 31 {
                return Err(EncodingError::InvalidBits {
                    name: def.name.clone(),
                    bits: def.bits,
                });
            }

            if !names.insert(def.name.as_str()) {
                return Err(EncodingError::DuplicateName(def.name.clone()));
            }
        }

        let mut allocator = BitAllocator::default();
        let mut positions: Vec<Option<(BitPosition, Option<BitPosition>)>> =
            vec![None; self.defs.len()];

        // Pinned values claim their bits before anything is allocated around them
        for (index, def) in self.defs.iter().enumerate() {
            if let Some(fwd) = def.pin {
                allocator.claim(&def.name, fwd, def.bits)?;
                let bwd = if def.two_directions {
                    let bwd = BitPosition {
                        int_index: fwd.int_index,
                        shift: fwd.shift + def.bits,
                    };
                    allocator.claim(&def.name, bwd, def.bits)?;
                    Some(bwd)
                } else {
                    None
                };
                positions[index] = Some((fwd, bwd));
            }
        }

        for (index, def) in self.defs.iter().enumerate() {
            if positions[index].is_some() {
                continue;
            }

            let fwd = allocator.allocate(&def.name, def.bits)?;
            let bwd = if def.two_directions {
                Some(allocator.allocate(&def.name, def.bits)?)
            } else {
                None
            };
            positions[index] = Some((fwd, bwd));
        }

        let layouts: Vec<EncodedValueLayout> = self
            .defs
            .into_iter()
            .zip(positions)
            .filter_map(|(def, position)| {
                position.map(|(fwd, bwd)| EncodedValueLayout {
                    name: def.name,
                    bits: def.bits,
                    min_value: def.min_value,
                    negate_reverse: def.negate_reverse,
                    kind: def.kind,
                    fwd,
                    bwd,
                })
            })
            .collect();

        Ok(EncodingManager::from_layouts(layouts, allocator.ints()))
    }
}

/// Frozen registry of encoded values. Shared as `Arc<EncodingManager>`.
#[derive(Debug)]
pub struct EncodingManager {
    layouts: Vec<EncodedValueLayout>,
    by_name: FxHashMap<String, usize>,
    ints_for_flags: usize,
    fingerprint: u64,
}

impl EncodingManager {
    pub fn builder() -> EncodingManagerBuilder {
        EncodingManagerBuilder::default()
    }

    fn from_layouts(layouts: Vec<EncodedValueLayout>, ints_for_flags: usize) -> Self {
        let by_name = layouts
            .iter()
            .enumerate()
            .map(|(index, layout)| (layout.name.clone(), index))
            .collect();
        let fingerprint = fxhash::hash64(&format!("{:?}/{}", layouts, ints_for_flags));

        debug!(
            "Encoding manager with {} values in {} ints",
            layouts.len(),
            ints_for_flags
        );

        Self {
            layouts,
            by_name,
            ints_for_flags,
            fingerprint,
        }
    }

    pub fn ints_for_flags(&self) -> usize {
        self.ints_for_flags
    }

    pub fn bytes_for_flags(&self) -> usize {
        self.ints_for_flags * 4
    }

    /// Hash of the layout, stored with a graph to detect stale offsets
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn layouts(&self) -> &[EncodedValueLayout] {
        &self.layouts
    }

    pub fn has_encoded_value(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn create_edge_flags(&self) -> EdgeFlags {
        smallvec![0; self.ints_for_flags]
    }

    fn layout(&self, name: &str) -> Result<&EncodedValueLayout, EncodingError> {
        self.by_name
            .get(name)
            .map(|&index| &self.layouts[index])
            .ok_or_else(|| EncodingError::UnknownName(name.to_string()))
    }

    fn wrong_type(layout: &EncodedValueLayout, expected: &'static str) -> EncodingError {
        EncodingError::WrongType {
            name: layout.name.clone(),
            expected,
            actual: layout.kind.type_name(),
        }
    }

    pub fn int_encoded_value(&self, name: &str) -> Result<IntEncodedValue, EncodingError> {
        let layout = self.layout(name)?;
        match layout.kind {
            EncodedValueKind::Int => Ok(IntEncodedValue::from_layout(layout)),
            _ => Err(Self::wrong_type(layout, "int")),
        }
    }

    pub fn boolean_encoded_value(&self, name: &str) -> Result<BooleanEncodedValue, EncodingError> {
        let layout = self.layout(name)?;
        match layout.kind {
            EncodedValueKind::Boolean => Ok(BooleanEncodedValue::from_layout(layout)),
            _ => Err(Self::wrong_type(layout, "boolean")),
        }
    }

    pub fn decimal_encoded_value(&self, name: &str) -> Result<DecimalEncodedValue, EncodingError> {
        let layout = self.layout(name)?;
        match layout.kind {
            EncodedValueKind::Decimal {
                factor,
                use_infinity,
            } => Ok(DecimalEncodedValue::from_layout(layout, factor, use_infinity)),
            _ => Err(Self::wrong_type(layout, "decimal")),
        }
    }

    pub fn enum_encoded_value<E: EnumValue>(&self) -> Result<EnumEncodedValue<E>, EncodingError> {
        let layout = self.layout(E::NAME)?;
        match &layout.kind {
            EncodedValueKind::Enum { variants }
                if variants
                    .iter()
                    .map(String::as_str)
                    .eq(E::variants().iter().map(|variant| variant.name())) =>
            {
                Ok(EnumEncodedValue::from_layout(layout))
            }
            _ => Err(Self::wrong_type(layout, "enum")),
        }
    }

    pub fn access_enc(&self, vehicle: &str) -> Result<BooleanEncodedValue, EncodingError> {
        self.boolean_encoded_value(&access_key(vehicle))
    }

    pub fn average_speed_enc(&self, vehicle: &str) -> Result<DecimalEncodedValue, EncodingError> {
        self.decimal_encoded_value(&average_speed_key(vehicle))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, StorageError> {
        rkyv::to_bytes::<rkyv::rancor::Error>(&self.layouts)
            .map(|bytes| bytes.to_vec())
            .map_err(|error| StorageError::Serialization(error.to_string()))
    }

    /// Checks that `bytes` written by [`EncodingManager::to_bytes`] describe this layout
    pub fn check_compatible(&self, bytes: &[u8]) -> Result<(), StorageError> {
        let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);

        let stored = rkyv::from_bytes::<Vec<EncodedValueLayout>, rkyv::rancor::Error>(&aligned)
            .map_err(|error| StorageError::Serialization(error.to_string()))?;

        if stored != self.layouts {
            return Err(StorageError::IncompatibleEncoding);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_allocation() {
        let em = EncodingManager::builder()
            .add(EncodedValueDef::int("a", 20, false))
            .add(EncodedValueDef::int("b", 10, true))
            .build()
            .unwrap();

        let a = &em.layouts()[0];
        let b = &em.layouts()[1];
        assert_eq!(a.fwd, BitPosition { int_index: 0, shift: 0 });
        assert_eq!(b.fwd, BitPosition { int_index: 0, shift: 20 });
        // The backward field does not fit in the first int anymore
        assert_eq!(b.bwd, Some(BitPosition { int_index: 1, shift: 0 }));
        assert_eq!(em.ints_for_flags(), 2);
    }

    #[test]
    fn test_pinned_values_are_skipped_by_allocation() {
        let em = EncodingManager::builder()
            .add(EncodedValueDef::int("free", 4, false))
            .add(EncodedValueDef::int("pinned", 4, false).pinned_at(0, 0))
            .build()
            .unwrap();

        assert_eq!(em.layouts()[1].fwd, BitPosition { int_index: 0, shift: 0 });
        assert_eq!(em.layouts()[0].fwd, BitPosition { int_index: 0, shift: 4 });
    }

    #[test]
    fn test_overlapping_pins_fail() {
        let result = EncodingManager::builder()
            .add(EncodedValueDef::int("first", 8, false).pinned_at(0, 0))
            .add(EncodedValueDef::int("second", 8, false).pinned_at(0, 4))
            .build();

        assert_eq!(
            result.unwrap_err(),
            EncodingError::Overlap {
                name: String::from("second"),
                other: String::from("first"),
                int_index: 0,
            }
        );
    }

    #[test]
    fn test_pin_outside_of_int_fails() {
        let result = EncodingManager::builder()
            .add(EncodedValueDef::int("wide", 8, true).pinned_at(0, 20))
            .build();

        assert!(matches!(
            result,
            Err(EncodingError::InvalidPosition { shift: 28, .. })
        ));
    }

    #[test]
    fn test_invalid_bits_fail() {
        let result = EncodingManager::builder()
            .add(EncodedValueDef::int("huge", 32, false))
            .build();
        assert!(matches!(result, Err(EncodingError::InvalidBits { bits: 32, .. })));

        let result = EncodingManager::builder()
            .add(EncodedValueDef::int("empty", 0, false))
            .build();
        assert!(matches!(result, Err(EncodingError::InvalidBits { bits: 0, .. })));
    }

    #[test]
    fn test_duplicate_names_fail() {
        let result = EncodingManager::builder()
            .add(EncodedValueDef::boolean("car_access", true))
            .add_vehicle("car", 5, 5.0)
            .build();

        assert_eq!(
            result.unwrap_err(),
            EncodingError::DuplicateName(String::from("car_access"))
        );
    }

    #[test]
    fn test_typed_lookup() {
        let em = EncodingManager::builder().add_defaults().build().unwrap();

        assert!(em.access_enc("car").is_ok());
        assert!(em.average_speed_enc("car").is_ok());
        assert!(em.enum_encoded_value::<RoadClass>().is_ok());

        assert!(matches!(
            em.decimal_encoded_value("car_access"),
            Err(EncodingError::WrongType { .. })
        ));
        assert!(matches!(
            em.boolean_encoded_value("bike_access"),
            Err(EncodingError::UnknownName(_))
        ));
    }

    #[test]
    fn test_int_values() {
        let em = EncodingManager::builder()
            .add(EncodedValueDef::int("lanes", 3, true))
            .add(EncodedValueDef::int("offset", 4, false).with_min_value(-8))
            .add(EncodedValueDef::int("incline", 5, false).with_negate_reverse())
            .build()
            .unwrap();
        let mut flags = em.create_edge_flags();

        let lanes = em.int_encoded_value("lanes").unwrap();
        lanes.set_int(false, &mut flags, 3).unwrap();
        lanes.set_int(true, &mut flags, 7).unwrap();
        assert_eq!(lanes.get_int(false, &flags), 3);
        assert_eq!(lanes.get_int(true, &flags), 7);
        assert!(matches!(
            lanes.set_int(false, &mut flags, 8),
            Err(EncodingError::OutOfRange { .. })
        ));

        let offset = em.int_encoded_value("offset").unwrap();
        offset.set_int(false, &mut flags, -5).unwrap();
        assert_eq!(offset.get_int(false, &flags), -5);
        assert_eq!(offset.max_value(), 7);

        let incline = em.int_encoded_value("incline").unwrap();
        incline.set_int(false, &mut flags, 12).unwrap();
        assert_eq!(incline.get_int(true, &flags), -12);

        // Neighbouring fields are untouched
        assert_eq!(lanes.get_int(false, &flags), 3);
        assert_eq!(lanes.get_int(true, &flags), 7);
    }

    #[test]
    fn test_decimal_values() {
        let em = EncodingManager::builder().add_defaults().build().unwrap();
        let mut flags = em.create_edge_flags();

        let speed = em.average_speed_enc("car").unwrap();
        speed.set_decimal(false, &mut flags, 62.0).unwrap();
        speed.set_decimal(true, &mut flags, 30.0).unwrap();
        assert_eq!(speed.get_decimal(false, &flags), 60.0);
        assert_eq!(speed.get_decimal(true, &flags), 30.0);
        assert_eq!(speed.max_storable_decimal(), 155.0);
        assert!(speed.set_decimal(false, &mut flags, 200.0).is_err());
        assert!(speed.set_decimal(false, &mut flags, f64::INFINITY).is_err());

        let max_speed = em.decimal_encoded_value(MAX_SPEED).unwrap();
        max_speed.set_decimal(false, &mut flags, f64::INFINITY).unwrap();
        assert_eq!(max_speed.get_decimal(false, &flags), f64::INFINITY);
        assert_eq!(max_speed.max_storable_decimal(), 150.0);
    }

    #[test]
    fn test_boolean_and_enum_values() {
        let em = EncodingManager::builder().add_defaults().build().unwrap();
        let mut flags = em.create_edge_flags();

        let access = em.access_enc("car").unwrap();
        access.set_bool(false, &mut flags, true);
        assert!(access.get_bool(false, &flags));
        assert!(!access.get_bool(true, &flags));

        let road_class = em.enum_encoded_value::<RoadClass>().unwrap();
        assert_eq!(road_class.get_enum(false, &flags), RoadClass::Other);
        road_class.set_enum(false, &mut flags, RoadClass::Footway);
        assert_eq!(road_class.get_enum(false, &flags), RoadClass::Footway);
        assert!(access.get_bool(false, &flags));
    }

    #[test]
    fn test_layout_persistence() {
        let em = EncodingManager::builder().add_defaults().build().unwrap();
        let bytes = em.to_bytes().unwrap();
        em.check_compatible(&bytes).unwrap();

        let other = EncodingManager::builder()
            .add(EncodedValueDef::enumeration::<RoadClass>())
            .add_vehicle("car", 5, 5.0)
            .build()
            .unwrap();
        assert!(matches!(
            other.check_compatible(&bytes),
            Err(StorageError::IncompatibleEncoding)
        ));
        assert_ne!(em.fingerprint(), other.fingerprint());
    }
}
