use std::collections::BTreeSet;

use slotmap::SecondaryMap;

use crate::config::SolverConfig;
use crate::error::{NetworkError, NodeshapeError, Result};
use crate::network::{NetworkSource, NodeId, SegmentId};

use super::limits::LimitSolver;
use super::node::{NodeGeometry, NodeStatus};
use super::segment_end::SegmentEndGeometry;
use super::state::NodeState;

/// Outcome of one [`JunctionManager::update`] batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    /// Nodes recomputed successfully.
    pub updated: Vec<NodeId>,
    /// Nodes that faulted and are now in the error state.
    pub failed: Vec<NodeId>,
    /// Nodes dropped because their topology is no longer supported.
    pub removed: Vec<NodeId>,
}

/// Owns the geometry of every managed node and recomputes dirty ones in
/// batches.
///
/// A batch runs four phases over the dirty nodes and their neighbours, each
/// phase finishing for all nodes before the next begins:
///
/// 1. sync with the network and rebuild raw geometry
/// 2. minimum limits, offsets and rotations
/// 3. maximum limits shared along each segment
/// 4. corners and centroids
#[derive(Debug, Default)]
pub struct JunctionManager {
    config: SolverConfig,
    nodes: SecondaryMap<NodeId, NodeGeometry>,
    dirty: BTreeSet<NodeId>,
}

impl JunctionManager {
    #[must_use]
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            nodes: SecondaryMap::new(),
            dirty: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&NodeGeometry> {
        self.nodes.get(id)
    }

    /// Mutable access for edits; call [`Self::mark_dirty`] afterwards.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeGeometry> {
        self.nodes.get_mut(id)
    }

    #[must_use]
    pub fn segment_end(&self, segment: SegmentId, node: NodeId) -> Option<&SegmentEndGeometry> {
        self.nodes.get(node)?.segment_end(segment)
    }

    /// Iterates over managed nodes.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &NodeGeometry)> + '_ {
        self.nodes.iter()
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Starts managing a node, or returns the existing geometry.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::Unsupported`] if the solver does not handle
    /// the node's topology.
    pub fn get_or_create<N: NetworkSource>(
        &mut self,
        id: NodeId,
        network: &N,
    ) -> Result<&mut NodeGeometry> {
        if !self.nodes.contains_key(id) {
            let node = NodeGeometry::new(id, network)?;
            self.nodes.insert(id, node);
            self.dirty.insert(id);
        }
        self.nodes
            .get_mut(id)
            .ok_or_else(|| NetworkError::EntityNotFound("node".into()).into())
    }

    /// Stops managing a node.
    pub fn remove(&mut self, id: NodeId) -> Option<NodeGeometry> {
        self.dirty.remove(&id);
        self.nodes.remove(id)
    }

    /// Queues a node for the next batch.
    pub fn mark_dirty(&mut self, id: NodeId) {
        self.dirty.insert(id);
    }

    /// Queues a node whose segments changed, lifting a previous error state.
    pub fn mark_topology_changed(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.set_status(NodeStatus::Ready);
        }
        self.dirty.insert(id);
    }

    /// Marks every managed node dirty and runs a batch.
    pub fn recompute_all<N: NetworkSource>(&mut self, network: &N) -> UpdateReport {
        let ids: Vec<NodeId> = self.nodes.keys().collect();
        self.dirty.extend(ids);
        self.update(network)
    }

    /// Recomputes dirty nodes and their neighbours.
    ///
    /// A fault is logged and confines the node, or both nodes of a faulting
    /// segment, to the error state; the rest of the batch proceeds.
    pub fn update<N: NetworkSource>(&mut self, network: &N) -> UpdateReport {
        let mut report = UpdateReport::default();
        let dirty = std::mem::take(&mut self.dirty);

        let mut affected = BTreeSet::new();
        for &id in &dirty {
            if !self.nodes.contains_key(id) {
                continue;
            }
            affected.insert(id);
            if let Some(info) = network.node(id) {
                for &segment in &info.segments {
                    if let Some(data) = network.segment(segment) {
                        let other = data.other_node(id);
                        if self.nodes.contains_key(other) {
                            affected.insert(other);
                        }
                    }
                }
            }
        }
        affected.retain(|&id| {
            self.nodes
                .get(id)
                .is_some_and(|node| node.status() == NodeStatus::Ready)
        });

        // Phase 1: topology and raw geometry.
        let mut live = BTreeSet::new();
        for &id in &affected {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            let result = node.sync(network).and_then(|()| node.calculate_main(network));
            match result {
                Ok(()) => {
                    live.insert(id);
                }
                Err(NodeshapeError::Network(NetworkError::Unsupported(reason))) => {
                    tracing::debug!(node = ?id, %reason, "dropping unsupported node");
                    self.nodes.remove(id);
                    report.removed.push(id);
                }
                Err(error) => self.fail(id, &error, &mut report),
            }
        }

        // Phase 2: minimum limits.
        let config = self.config;
        for &id in &live.clone() {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            if let Err(error) = node.update_min_limits(&config) {
                self.fail(id, &error, &mut report);
                live.remove(&id);
            }
        }

        // Phase 3: maximum limits, from snapshots of both ends.
        let mut segments = BTreeSet::new();
        for &id in &live {
            if let Some(node) = self.nodes.get(id) {
                segments.extend(node.ends().iter().map(SegmentEndGeometry::segment));
            }
        }
        for segment in segments {
            let Some(data) = network.segment(segment) else {
                continue;
            };
            let (start, end) = (data.start_node, data.end_node);
            let input = |node: NodeId| {
                self.nodes
                    .get(node)
                    .filter(|geometry| geometry.status() == NodeStatus::Ready)
                    .and_then(|geometry| geometry.segment_end(segment))
                    .map(SegmentEndGeometry::max_limit_input)
            };
            let (Some(a), Some(b)) = (input(start), input(end)) else {
                continue;
            };

            let windows = LimitSolver::shared_limits(&a, &b);
            let finite = windows
                .iter()
                .flatten()
                .all(|window| window.min.is_finite() && window.max.is_finite());
            if !finite {
                let error = NodeshapeError::from(crate::error::GeometryError::NonFinite(
                    "segment max limits",
                ));
                for node in [start, end] {
                    if live.remove(&node) {
                        self.fail(node, &error, &mut report);
                    }
                }
                continue;
            }

            for (node, [main, left, right]) in [(start, windows[0]), (end, windows[1])] {
                if !live.contains(&node) {
                    continue;
                }
                if let Some(geometry) = self.nodes.get_mut(node) {
                    if let Some(end) = geometry
                        .ends_mut()
                        .iter_mut()
                        .find(|end| end.segment() == segment)
                    {
                        end.apply_max_limits(main, left, right, &config);
                    }
                }
            }
        }

        // Phase 4: corners.
        for &id in &live {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            match node.after_calculate() {
                Ok(()) => report.updated.push(id),
                Err(error) => self.fail(id, &error, &mut report),
            }
        }

        tracing::debug!(
            updated = report.updated.len(),
            failed = report.failed.len(),
            removed = report.removed.len(),
            "junction batch finished"
        );
        report
    }

    fn fail(&mut self, id: NodeId, error: &NodeshapeError, report: &mut UpdateReport) {
        tracing::error!(node = ?id, %error, "junction calculation failed");
        if let Some(node) = self.nodes.get_mut(id) {
            node.set_status(NodeStatus::Error);
        }
        report.failed.push(id);
    }

    /// Removes segment ends that belong to another node or appear twice.
    ///
    /// Returns the number of removed entries.
    pub fn validate_and_heal(&mut self) -> usize {
        let mut healed = 0;
        for (id, node) in &mut self.nodes {
            let mut seen = BTreeSet::new();
            let before = node.ends().len();
            node.ends_mut()
                .retain(|end| end.id().node == id && seen.insert(end.segment()));
            let removed = before - node.ends().len();
            if removed > 0 {
                tracing::warn!(node = ?id, removed, "healed invalid segment ends");
                self.dirty.insert(id);
                healed += removed;
            }
        }
        healed
    }

    /// Persistable state of a managed node.
    #[must_use]
    pub fn export_state(&self, id: NodeId) -> Option<NodeState> {
        self.nodes.get(id).map(NodeState::capture)
    }

    /// Starts managing a node with previously exported state and queues it.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is unsupported.
    pub fn import_state<N: NetworkSource>(
        &mut self,
        id: NodeId,
        state: &NodeState,
        network: &N,
    ) -> Result<()> {
        let node = self.get_or_create(id, network)?;
        state.apply(node);
        self.mark_topology_changed(id);
        Ok(())
    }
}
