use tracing::{debug, info};

use crate::{
    error::PreparationError,
    graph::{BaseGraph, Graph},
    stopwatch::Stopwatch,
    types::NodeId,
    weighting::Weighting,
};

use super::{
    ch_config::CHConfig,
    ch_storage::CHStorage,
    node_contractor::NodeContractor,
    node_ordering::validate_node_ordering,
    preparation_graph::CHPreparationGraph,
    priority_queue::{Priority, PriorityQueue},
};

/// Builds the contraction hierarchy of a frozen graph for one profile
pub struct CHPreparation<'a, W: Weighting> {
    graph: &'a BaseGraph,
    weighting: &'a W,
    profile: String,
    config: CHConfig,
}

impl<'a, W: Weighting> CHPreparation<'a, W> {
    pub fn new(
        graph: &'a BaseGraph,
        weighting: &'a W,
        profile: &str,
        config: CHConfig,
    ) -> Result<Self, PreparationError> {
        config.validate()?;

        if !graph.is_frozen() {
            return Err(PreparationError::NotFrozen);
        }

        if graph.node_count() == 0 {
            return Err(PreparationError::EmptyGraph);
        }

        Ok(Self {
            graph,
            weighting,
            profile: profile.to_string(),
            config,
        })
    }

    /// Contracts the nodes in the order given by the edge difference heuristic
    pub fn prepare(&self) -> Result<CHStorage, PreparationError> {
        let stopwatch = Stopwatch::new("ch/prepare");
        let node_count = self.graph.node_count();

        let mut prep_graph = CHPreparationGraph::new(self.graph, self.weighting);
        let mut contractor = NodeContractor::new(&self.config);
        let mut queue: PriorityQueue<Priority> = PriorityQueue::new(node_count);

        for node in 0..node_count {
            let priority = contractor.calc_priority(&prep_graph, node);
            // Each node is pushed once into a queue sized for all of them
            let _ = queue.push(node, Priority(priority));
        }

        info!(
            profile = %self.profile,
            nodes = node_count,
            "Initialized node priorities in {:?}",
            stopwatch.elapsed()
        );

        let periodic_every = percentage_of(node_count, self.config.periodic_updates);
        let lazy_from = node_count - node_count * self.config.last_lazy_nodes_updates as usize / 100;
        let log_every = percentage_of(node_count, self.config.log_messages);

        let mut levels = vec![0; node_count];
        let mut contracted = vec![false; node_count];
        let mut neighbor_updates = vec![0u32; node_count];
        let mut level = 0;
        let mut shortcuts = 0;
        let mut lazy_updates = 0;

        while let Some((node, _)) = queue.pop() {
            if level >= lazy_from && !queue.is_empty() {
                let priority = Priority(contractor.calc_priority(&prep_graph, node));
                if queue.peek().is_some_and(|&(_, next)| priority > next) {
                    let _ = queue.push(node, priority);
                    lazy_updates += 1;
                    continue;
                }
            }

            let (neighbors, added) = contractor.contract_node(&mut prep_graph, node);
            shortcuts += added;
            levels[node] = level;
            contracted[node] = true;
            level += 1;

            if self.config.neighbor_updates {
                for neighbor in neighbors {
                    if contracted[neighbor]
                        || neighbor_updates[neighbor] >= self.config.neighbor_updates_max
                    {
                        continue;
                    }
                    neighbor_updates[neighbor] += 1;
                    let priority = contractor.calc_priority(&prep_graph, neighbor);
                    queue.update_priority(neighbor, Priority(priority));
                }
            }

            if periodic_every.is_some_and(|every| level % every == 0) && !queue.is_empty() {
                for candidate in 0..node_count {
                    if queue.contains(candidate) {
                        let priority = contractor.calc_priority(&prep_graph, candidate);
                        queue.update_priority(candidate, Priority(priority));
                    }
                }
                neighbor_updates.fill(0);
                debug!(level, "Recomputed all priorities");
            }

            if log_every.is_some_and(|every| level % every == 0) {
                info!(
                    profile = %self.profile,
                    shortcuts,
                    lazy_updates,
                    mean_degree = prep_graph.mean_degree(),
                    "Contracted {}/{} nodes in {:?}",
                    level,
                    node_count,
                    stopwatch.elapsed()
                );
            }
        }

        self.finish(prep_graph, &levels, &stopwatch)
    }

    /// Contracts the nodes in the order of `ordering`, lowest level first
    pub fn prepare_with_ordering(&self, ordering: &[NodeId]) -> Result<CHStorage, PreparationError> {
        let stopwatch = Stopwatch::new("ch/prepare_with_ordering");
        let node_count = self.graph.node_count();
        validate_node_ordering(ordering, node_count)?;

        let mut prep_graph = CHPreparationGraph::new(self.graph, self.weighting);
        let mut contractor = NodeContractor::new(&self.config);
        let mut levels = vec![0; node_count];

        for (level, &node) in ordering.iter().enumerate() {
            contractor.contract_node(&mut prep_graph, node);
            levels[node] = level;
        }

        self.finish(prep_graph, &levels, &stopwatch)
    }

    fn finish(
        &self,
        prep_graph: CHPreparationGraph,
        levels: &[usize],
        stopwatch: &Stopwatch,
    ) -> Result<CHStorage, PreparationError> {
        let edge_count = prep_graph.edge_count();
        let shortcuts = prep_graph.into_shortcuts();

        let storage = CHStorage::create(
            self.graph.directory(),
            &self.profile,
            self.weighting.name(),
            levels,
            edge_count,
            &shortcuts,
        )?;

        info!(
            profile = %self.profile,
            nodes = levels.len(),
            edges = edge_count,
            shortcuts = storage.shortcut_count(),
            "Finished CH preparation in {:?}",
            stopwatch.elapsed()
        );

        Ok(storage)
    }
}

/// Number of nodes making `percent` percent of `node_count`, `None` when
/// disabled
fn percentage_of(node_count: usize, percent: u32) -> Option<usize> {
    if percent == 0 {
        return None;
    }
    Some((node_count * percent as usize / 100).max(1))
}
