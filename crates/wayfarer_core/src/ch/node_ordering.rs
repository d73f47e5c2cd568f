use crate::{error::PreparationError, types::NodeId};

/// Checks that `ordering` lists every node of the graph exactly once
pub(crate) fn validate_node_ordering(
    ordering: &[NodeId],
    node_count: usize,
) -> Result<(), PreparationError> {
    if ordering.len() != node_count {
        return Err(PreparationError::InvalidNodeOrdering(format!(
            "ordering has {} nodes, the graph has {}",
            ordering.len(),
            node_count
        )));
    }

    let mut seen = vec![false; node_count];
    for &node in ordering {
        if node >= node_count {
            return Err(PreparationError::InvalidNodeOrdering(format!(
                "node {} is out of range",
                node
            )));
        }
        if seen[node] {
            return Err(PreparationError::InvalidNodeOrdering(format!(
                "node {} appears twice",
                node
            )));
        }
        seen[node] = true;
    }

    Ok(())
}
