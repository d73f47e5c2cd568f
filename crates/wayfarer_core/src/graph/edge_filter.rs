use crate::ev::BooleanEncodedValue;

use super::EdgeState;

pub trait EdgeFilter {
    fn accept(&self, edge: &EdgeState) -> bool;
}

impl<F> EdgeFilter for F
where
    F: Fn(&EdgeState) -> bool,
{
    fn accept(&self, edge: &EdgeState) -> bool {
        self(edge)
    }
}

/// Accepts edges by an access flag, in travel direction (`outgoing`) and/or
/// against it (`incoming`).
pub struct AccessFilter {
    access_enc: BooleanEncodedValue,
    outgoing: bool,
    incoming: bool,
}

impl AccessFilter {
    pub fn outgoing(access_enc: BooleanEncodedValue) -> Self {
        Self {
            access_enc,
            outgoing: true,
            incoming: false,
        }
    }

    pub fn incoming(access_enc: BooleanEncodedValue) -> Self {
        Self {
            access_enc,
            outgoing: false,
            incoming: true,
        }
    }

    pub fn all(access_enc: BooleanEncodedValue) -> Self {
        Self {
            access_enc,
            outgoing: true,
            incoming: true,
        }
    }
}

impl EdgeFilter for AccessFilter {
    fn accept(&self, edge: &EdgeState) -> bool {
        (self.outgoing && edge.get_bool(&self.access_enc, false))
            || (self.incoming && edge.get_bool(&self.access_enc, true))
    }
}
