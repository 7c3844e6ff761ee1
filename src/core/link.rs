use crate::node::NodeId;

/// Index of a node in the owning network's node arena.
pub type NodeIndex = usize;

/// A directed, weighted edge.
///
/// Activity and same-layer-ness are decided once at construction and never
/// change afterwards.
#[derive(Debug, Clone)]
pub struct Link {
    source: NodeIndex,
    target: NodeIndex,
    source_id: NodeId,
    target_id: NodeId,
    source_layer: usize,
    target_layer: usize,
    weight: f64,
    is_active: bool,
    is_same_layer: bool,
}

/// One end of a link under construction.
#[derive(Debug, Clone, Copy)]
pub struct Endpoint {
    pub index: NodeIndex,
    pub id: NodeId,
    pub layer: usize,
}

impl Link {
    pub fn new(source: Endpoint, target: Endpoint, weight: f64, active_threshold: f64) -> Self {
        Self {
            source: source.index,
            target: target.index,
            source_id: source.id,
            target_id: target.id,
            source_layer: source.layer,
            target_layer: target.layer,
            weight,
            is_active: weight > active_threshold,
            is_same_layer: source.layer == target.layer,
        }
    }

    /// `"source-target"`, built from node ids.
    pub fn id(&self) -> String {
        format!("{}-{}", self.source_id, self.target_id)
    }

    /// Arena index of the source node.
    pub fn source_index(&self) -> NodeIndex {
        self.source
    }

    pub fn target_index(&self) -> NodeIndex {
        self.target
    }

    pub fn source(&self) -> NodeId {
        self.source_id
    }

    pub fn target(&self) -> NodeId {
        self.target_id
    }

    pub fn source_layer(&self) -> usize {
        self.source_layer
    }

    pub fn target_layer(&self) -> usize {
        self.target_layer
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_same_layer(&self) -> bool {
        self.is_same_layer
    }

    pub fn same_layer(&self) -> bool {
        self.source_layer == self.target_layer
    }
}
