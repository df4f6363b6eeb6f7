//! Build context shared by the orchestrator and every builder call of one build.
//!
//! A [`BuildContext`] is created by [`crate::ScenarioHelper::install`], borrowed
//! mutably by each builder in turn and dropped when the build ends. It carries
//! the loaded documents, the stage and ids of the entry being dispatched, the
//! global-routing flag and, during stage 5 only, the routing accumulator of the
//! node currently being visited.

use crate::domain::Domain;
use crate::entry::Document;
use crate::error::BuildError;
use crate::model::{LinkId, Network, NodeId, PrioritizedProtocol, RoutingProtocol, RoutingStack};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// The ten build stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Stage {
    Config,
    Node,
    Link,
    Internet,
    Network,
    Routing,
    NodeRole,
    Mobility,
    Application,
    Simulator,
}

impl Stage {
    pub const ALL: [Stage; 10] = [
        Stage::Config,
        Stage::Node,
        Stage::Link,
        Stage::Internet,
        Stage::Network,
        Stage::Routing,
        Stage::NodeRole,
        Stage::Mobility,
        Stage::Application,
        Stage::Simulator,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Config => "Load Config",
            Stage::Node => "Create Nodes",
            Stage::Link => "Install Links",
            Stage::Internet => "Internet Stack",
            Stage::Network => "IPv4 / IPv6 Network",
            Stage::Routing => "IPv4 / IPv6 Routing",
            Stage::NodeRole => "Node Roles",
            Stage::Mobility => "Mobility",
            Stage::Application => "Applications",
            Stage::Simulator => "Simulator",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.index(), self.name())
    }
}

/// Routing protocols collected for one node during its stage-5 pass
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingAccumulator {
    node_id: NodeId,
    ipv4: Vec<PrioritizedProtocol>,
    ipv6: Vec<PrioritizedProtocol>,
}

impl RoutingAccumulator {
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            ipv4: Vec::new(),
            ipv6: Vec::new(),
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn add_ipv4(&mut self, priority: i32, protocol: RoutingProtocol) {
        self.ipv4.push(PrioritizedProtocol { priority, protocol });
    }

    pub fn add_ipv6(&mut self, priority: i32, protocol: RoutingProtocol) {
        self.ipv6.push(PrioritizedProtocol { priority, protocol });
    }

    pub fn ipv4(&self) -> &[PrioritizedProtocol] {
        &self.ipv4
    }

    pub fn ipv6(&self) -> &[PrioritizedProtocol] {
        &self.ipv6
    }

    pub fn is_empty(&self) -> bool {
        self.ipv4.is_empty() && self.ipv6.is_empty()
    }

    /// Consume into a list routing stack, highest priority first.
    /// Equal priorities keep the order they were added in.
    pub fn into_routing_stack(mut self) -> RoutingStack {
        self.ipv4.sort_by_key(|p| std::cmp::Reverse(p.priority));
        self.ipv6.sort_by_key(|p| std::cmp::Reverse(p.priority));
        RoutingStack::List {
            ipv4: self.ipv4,
            ipv6: self.ipv6,
        }
    }
}

/// Mutable state of one build
pub struct BuildContext<'a> {
    network: &'a mut Network,
    config_path: PathBuf,
    documents: BTreeMap<Domain, Rc<Document>>,
    stage: Stage,
    domain: Domain,
    node_id: Option<NodeId>,
    link_id: Option<LinkId>,
    entry_index: Option<usize>,
    global_routing: bool,
    routing: Option<RoutingAccumulator>,
}

impl<'a> BuildContext<'a> {
    pub fn new(config_path: impl Into<PathBuf>, network: &'a mut Network) -> Self {
        Self {
            network,
            config_path: config_path.into(),
            documents: BTreeMap::new(),
            stage: Stage::Config,
            domain: Domain::Config,
            node_id: None,
            link_id: None,
            entry_index: None,
            global_routing: false,
            routing: None,
        }
    }

    // ---------------------------------------------------------------------
    // Orchestrator side
    // ---------------------------------------------------------------------

    /// Advance to `stage` and forget the ids of the previous stage's entries.
    /// Stages never go backwards.
    pub fn enter_stage(&mut self, stage: Stage) {
        debug_assert!(stage >= self.stage, "stage {} after {}", stage, self.stage);
        self.stage = stage;
        self.node_id = None;
        self.link_id = None;
        self.entry_index = None;
    }

    pub fn set_domain(&mut self, domain: Domain) {
        self.domain = domain;
    }

    pub fn set_node_id(&mut self, node_id: Option<NodeId>) {
        self.node_id = node_id;
    }

    pub fn set_link_id(&mut self, link_id: Option<LinkId>) {
        self.link_id = link_id;
    }

    /// Position of the entry being applied within its document's list
    pub fn set_entry_index(&mut self, index: Option<usize>) {
        self.entry_index = index;
    }

    /// Open the routing pass of `node_id` with an empty accumulator
    pub fn begin_routing(&mut self, node_id: NodeId) {
        self.node_id = Some(node_id);
        self.routing = Some(RoutingAccumulator::new(node_id));
    }

    /// Close the current routing pass and hand back what it collected
    pub fn finish_routing(&mut self) -> Result<RoutingAccumulator, BuildError> {
        self.routing.take().ok_or(BuildError::NoRoutingAccumulator)
    }

    /// Wrap `err` with the current stage, domain, entry index and ids.
    /// Already annotated errors pass through unchanged.
    pub fn annotate(&self, err: BuildError) -> BuildError {
        match err {
            BuildError::Stage { .. } => err,
            other => BuildError::Stage {
                stage: self.stage,
                domain: self.domain,
                node_id: self.node_id,
                link_id: self.link_id,
                entry_index: self.entry_index,
                source: Box::new(other),
            },
        }
    }

    // ---------------------------------------------------------------------
    // Builder side
    // ---------------------------------------------------------------------

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn current_domain(&self) -> Domain {
        self.domain
    }

    pub fn current_node_id(&self) -> Option<NodeId> {
        self.node_id
    }

    pub fn current_link_id(&self) -> Option<LinkId> {
        self.link_id
    }

    pub fn current_entry_index(&self) -> Option<usize> {
        self.entry_index
    }

    pub fn global_routing_enabled(&self) -> bool {
        self.global_routing
    }

    pub fn enable_global_routing(&mut self) {
        self.global_routing = true;
    }

    /// Accumulator of the node whose routing pass is running
    pub fn routing_accumulator(&mut self) -> Result<&mut RoutingAccumulator, BuildError> {
        self.routing.as_mut().ok_or(BuildError::NoRoutingAccumulator)
    }

    /// Store a loaded document. Only allowed while the Config stage runs.
    pub fn insert_document(&mut self, domain: Domain, document: Document) -> Result<(), BuildError> {
        if self.stage != Stage::Config {
            return Err(BuildError::DocumentsSealed);
        }
        self.documents.insert(domain, Rc::new(document));
        Ok(())
    }

    /// A loaded document, shared so it can be walked while the context is mutated
    pub fn document(&self, domain: Domain) -> Option<Rc<Document>> {
        self.documents.get(&domain).cloned()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Directory sub-document references are resolved against
    pub fn config_dir(&self) -> &Path {
        self.config_path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn network(&self) -> &Network {
        self.network
    }

    pub fn network_mut(&mut self) -> &mut Network {
        self.network
    }
}
