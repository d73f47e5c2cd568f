use std::sync::Arc;

use crate::error::EncodingError;

/// Position of one direction field inside the flags record
#[derive(Copy, Clone, Debug, PartialEq, Eq, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct BitPosition {
    pub int_index: u32,
    pub shift: u32,
}

#[derive(Clone, Debug, PartialEq, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub enum EncodedValueKind {
    Int,
    Boolean,
    Decimal { factor: f64, use_infinity: bool },
    Enum { variants: Vec<String> },
}

impl EncodedValueKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            EncodedValueKind::Int => "int",
            EncodedValueKind::Boolean => "boolean",
            EncodedValueKind::Decimal { .. } => "decimal",
            EncodedValueKind::Enum { .. } => "enum",
        }
    }
}

/// Resolved placement of an encoded value, persisted next to the graph
#[derive(Clone, Debug, PartialEq, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct EncodedValueLayout {
    pub name: String,
    pub bits: u32,
    pub min_value: i32,
    pub negate_reverse: bool,
    pub kind: EncodedValueKind,
    pub fwd: BitPosition,
    pub bwd: Option<BitPosition>,
}

/// Registration request of an encoded value, turned into a layout by the
/// [`EncodingManagerBuilder`](super::EncodingManagerBuilder).
#[derive(Clone, Debug)]
pub struct EncodedValueDef {
    pub(crate) name: String,
    pub(crate) bits: u32,
    pub(crate) min_value: i32,
    pub(crate) two_directions: bool,
    pub(crate) negate_reverse: bool,
    pub(crate) kind: EncodedValueKind,
    pub(crate) pin: Option<BitPosition>,
}

impl EncodedValueDef {
    pub fn int(name: &str, bits: u32, two_directions: bool) -> Self {
        Self {
            name: name.to_string(),
            bits,
            min_value: 0,
            two_directions,
            negate_reverse: false,
            kind: EncodedValueKind::Int,
            pin: None,
        }
    }

    pub fn boolean(name: &str, two_directions: bool) -> Self {
        Self {
            kind: EncodedValueKind::Boolean,
            ..Self::int(name, 1, two_directions)
        }
    }

    pub fn decimal(name: &str, bits: u32, factor: f64, two_directions: bool) -> Self {
        Self {
            kind: EncodedValueKind::Decimal {
                factor,
                use_infinity: false,
            },
            ..Self::int(name, bits, two_directions)
        }
    }

    pub fn enumeration<E: EnumValue>() -> Self {
        let variants = E::variants();
        let bits = (usize::BITS - variants.len().saturating_sub(1).leading_zeros()).max(1);
        Self {
            kind: EncodedValueKind::Enum {
                variants: variants.iter().map(|v| v.name().to_string()).collect(),
            },
            ..Self::int(E::NAME, bits, false)
        }
    }

    pub fn with_min_value(mut self, min_value: i32) -> Self {
        self.min_value = min_value;
        self
    }

    /// Stores a single field and reads it negated in reverse direction
    pub fn with_negate_reverse(mut self) -> Self {
        self.negate_reverse = true;
        self.two_directions = false;
        self
    }

    /// Reserves the highest raw value of a decimal for infinity
    pub fn with_infinity(mut self) -> Self {
        if let EncodedValueKind::Decimal { use_infinity, .. } = &mut self.kind {
            *use_infinity = true;
        }
        self
    }

    /// Places the value at a fixed position. A backward field follows the
    /// forward field in the same int.
    pub fn pinned_at(mut self, int_index: u32, shift: u32) -> Self {
        self.pin = Some(BitPosition { int_index, shift });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[inline]
fn mask(bits: u32) -> u32 {
    (1u32 << bits) - 1
}

/// Typed accessor for an integer field of the flags record
#[derive(Clone, Debug)]
pub struct IntEncodedValue {
    name: Arc<str>,
    bits: u32,
    min_value: i32,
    max_value: i32,
    negate_reverse: bool,
    fwd: BitPosition,
    bwd: Option<BitPosition>,
}

impl IntEncodedValue {
    pub(crate) fn from_layout(layout: &EncodedValueLayout) -> Self {
        let max_value = (layout.min_value as i64 + mask(layout.bits) as i64).min(i32::MAX as i64);
        Self {
            name: Arc::from(layout.name.as_str()),
            bits: layout.bits,
            min_value: layout.min_value,
            max_value: max_value as i32,
            negate_reverse: layout.negate_reverse,
            fwd: layout.fwd,
            bwd: layout.bwd,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn min_value(&self) -> i32 {
        self.min_value
    }

    pub fn max_value(&self) -> i32 {
        self.max_value
    }

    pub fn is_stored_both_directions(&self) -> bool {
        self.bwd.is_some()
    }

    #[inline]
    fn position(&self, reverse: bool) -> BitPosition {
        match (reverse, self.bwd) {
            (true, Some(bwd)) => bwd,
            _ => self.fwd,
        }
    }

    #[inline]
    pub fn get_int(&self, reverse: bool, flags: &[u32]) -> i32 {
        let position = self.position(reverse);
        let raw = (flags[position.int_index as usize] >> position.shift) & mask(self.bits);
        let value = raw as i32 + self.min_value;
        if reverse && self.negate_reverse {
            -value
        } else {
            value
        }
    }

    pub fn set_int(&self, reverse: bool, flags: &mut [u32], value: i32) -> Result<(), EncodingError> {
        let value = if reverse && self.negate_reverse {
            -value
        } else {
            value
        };

        if value < self.min_value || value > self.max_value {
            return Err(EncodingError::OutOfRange {
                name: self.name.to_string(),
                value: value as f64,
                min: self.min_value as f64,
                max: self.max_value as f64,
            });
        }

        self.set_raw(reverse, flags, (value - self.min_value) as u32);
        Ok(())
    }

    #[inline]
    fn set_raw(&self, reverse: bool, flags: &mut [u32], raw: u32) {
        let position = self.position(reverse);
        let word = &mut flags[position.int_index as usize];
        let field_mask = mask(self.bits) << position.shift;
        *word = (*word & !field_mask) | ((raw << position.shift) & field_mask);
    }
}

#[derive(Clone, Debug)]
pub struct BooleanEncodedValue(IntEncodedValue);

impl BooleanEncodedValue {
    pub(crate) fn from_layout(layout: &EncodedValueLayout) -> Self {
        Self(IntEncodedValue::from_layout(layout))
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    #[inline]
    pub fn get_bool(&self, reverse: bool, flags: &[u32]) -> bool {
        self.0.get_int(reverse, flags) != 0
    }

    pub fn set_bool(&self, reverse: bool, flags: &mut [u32], value: bool) {
        self.0.set_raw(reverse, flags, value as u32);
    }

    pub fn is_stored_both_directions(&self) -> bool {
        self.0.is_stored_both_directions()
    }
}

/// Fixed-point decimal, `value = raw * factor`
#[derive(Clone, Debug)]
pub struct DecimalEncodedValue {
    int: IntEncodedValue,
    factor: f64,
    use_infinity: bool,
}

impl DecimalEncodedValue {
    pub(crate) fn from_layout(layout: &EncodedValueLayout, factor: f64, use_infinity: bool) -> Self {
        Self {
            int: IntEncodedValue::from_layout(layout),
            factor,
            use_infinity,
        }
    }

    pub fn name(&self) -> &str {
        self.int.name()
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Largest finite value that can be stored
    pub fn max_storable_decimal(&self) -> f64 {
        let max = if self.use_infinity {
            self.int.max_value - 1
        } else {
            self.int.max_value
        };
        max as f64 * self.factor
    }

    #[inline]
    pub fn get_decimal(&self, reverse: bool, flags: &[u32]) -> f64 {
        let value = self.int.get_int(reverse, flags);
        if self.use_infinity && value == self.int.max_value {
            return f64::INFINITY;
        }
        value as f64 * self.factor
    }

    pub fn set_decimal(&self, reverse: bool, flags: &mut [u32], value: f64) -> Result<(), EncodingError> {
        if value == f64::INFINITY && self.use_infinity {
            return self.int.set_int(reverse, flags, self.int.max_value);
        }

        let scaled = (value / self.factor).round();
        let min = self.int.min_value as f64;
        let max = self.max_storable_decimal() / self.factor;
        if !scaled.is_finite() || scaled < min || scaled > max {
            return Err(EncodingError::OutOfRange {
                name: self.name().to_string(),
                value,
                min: min * self.factor,
                max: self.max_storable_decimal(),
            });
        }

        self.int.set_int(reverse, flags, scaled as i32)
    }

    pub fn is_stored_both_directions(&self) -> bool {
        self.int.is_stored_both_directions()
    }
}

/// Closed set of values stored as their index in [`EnumValue::variants`]
pub trait EnumValue: Copy + Default + PartialEq + Send + Sync + 'static {
    const NAME: &'static str;

    fn variants() -> &'static [Self];

    fn name(&self) -> &'static str;
}

#[derive(Clone, Debug)]
pub struct EnumEncodedValue<E: EnumValue> {
    int: IntEncodedValue,
    _marker: std::marker::PhantomData<E>,
}

impl<E: EnumValue> EnumEncodedValue<E> {
    pub(crate) fn from_layout(layout: &EncodedValueLayout) -> Self {
        Self {
            int: IntEncodedValue::from_layout(layout),
            _marker: std::marker::PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        self.int.name()
    }

    #[inline]
    pub fn get_enum(&self, reverse: bool, flags: &[u32]) -> E {
        let ordinal = self.int.get_int(reverse, flags) as usize;
        E::variants().get(ordinal).copied().unwrap_or_default()
    }

    pub fn set_enum(&self, reverse: bool, flags: &mut [u32], value: E) {
        let ordinal = E::variants()
            .iter()
            .position(|variant| *variant == value)
            .unwrap_or(0);
        self.int.set_raw(reverse, flags, ordinal as u32);
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RoadClass {
    #[default]
    Other,
    Motorway,
    Trunk,
    Primary,
    Secondary,
    Tertiary,
    Residential,
    Unclassified,
    Service,
    LivingStreet,
    Track,
    Cycleway,
    Footway,
}

impl EnumValue for RoadClass {
    const NAME: &'static str = "road_class";

    fn variants() -> &'static [Self] {
        &[
            RoadClass::Other,
            RoadClass::Motorway,
            RoadClass::Trunk,
            RoadClass::Primary,
            RoadClass::Secondary,
            RoadClass::Tertiary,
            RoadClass::Residential,
            RoadClass::Unclassified,
            RoadClass::Service,
            RoadClass::LivingStreet,
            RoadClass::Track,
            RoadClass::Cycleway,
            RoadClass::Footway,
        ]
    }

    fn name(&self) -> &'static str {
        match self {
            RoadClass::Other => "other",
            RoadClass::Motorway => "motorway",
            RoadClass::Trunk => "trunk",
            RoadClass::Primary => "primary",
            RoadClass::Secondary => "secondary",
            RoadClass::Tertiary => "tertiary",
            RoadClass::Residential => "residential",
            RoadClass::Unclassified => "unclassified",
            RoadClass::Service => "service",
            RoadClass::LivingStreet => "living_street",
            RoadClass::Track => "track",
            RoadClass::Cycleway => "cycleway",
            RoadClass::Footway => "footway",
        }
    }
}
