pub type NodeId = usize;
pub type EdgeId = usize;

/// Direction-disambiguated edge identifier. The stored orientation of edge `e`
/// has key `2 * e`, the reverse orientation `2 * e + 1`.
pub type EdgeKey = usize;

#[inline]
pub fn create_edge_key(edge: EdgeId, reverse: bool) -> EdgeKey {
    (edge << 1) | reverse as usize
}

#[inline]
pub fn edge_from_key(key: EdgeKey) -> EdgeId {
    key >> 1
}

#[inline]
pub fn is_reverse_key(key: EdgeKey) -> bool {
    key & 1 == 1
}

#[inline]
pub fn reverse_edge_key(key: EdgeKey) -> EdgeKey {
    key ^ 1
}
