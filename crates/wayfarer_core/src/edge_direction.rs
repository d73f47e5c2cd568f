#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum EdgeDirection {
    Forward,
    Backward,
}

impl EdgeDirection {
    pub fn opposite(&self) -> Self {
        match self {
            EdgeDirection::Forward => EdgeDirection::Backward,
            EdgeDirection::Backward => EdgeDirection::Forward,
        }
    }

    /// `reverse` flag expected by weightings and encoded values
    pub fn is_reverse(&self) -> bool {
        matches!(self, EdgeDirection::Backward)
    }
}

/// Direction a search expands in. A backward search walks edges against their
/// travel direction, starting at the target.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SearchDirection {
    Forward,
    Backward,
}

impl SearchDirection {
    pub fn opposite(&self) -> Self {
        match self {
            SearchDirection::Forward => SearchDirection::Backward,
            SearchDirection::Backward => SearchDirection::Forward,
        }
    }

    pub fn is_backward(&self) -> bool {
        matches!(self, SearchDirection::Backward)
    }
}
