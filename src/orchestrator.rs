//! Scenario orchestrator.
//!
//! This module runs the ten fixed build stages over a [`BuildContext`],
//! dispatching each entry of each domain document to the builder registered
//! for its (domain, type tag) key. The stage order guarantees that every id an
//! entry references was materialized by an earlier stage.

use crate::builders;
use crate::config_loader::load_document;
use crate::context::{BuildContext, Stage};
use crate::domain::Domain;
use crate::entry::{self, Document, Entry};
use crate::error::BuildError;
use crate::model::{Network, NodeId};
use crate::registry::{Builder, HandlerRegistry, DEFAULT_TAG};
use log::{debug, info};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;
use std::rc::Rc;

const TYPE: &str = "type";
const ROLE: &str = "role";
const IPV4_ROUTING_LIST: &str = "ipv4RoutingList";
const IPV6_ROUTING_LIST: &str = "ipv6RoutingList";

/// Builds scenarios from configuration trees.
///
/// The registry persists across builds, so custom builders registered once
/// apply to every later [`install`](ScenarioHelper::install).
#[derive(Debug, Default)]
pub struct ScenarioHelper {
    registry: HandlerRegistry,
}

impl ScenarioHelper {
    /// A helper with an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A helper with every built-in builder registered
    pub fn with_default_builders() -> Self {
        let mut helper = Self::new();
        builders::register_default_builders(&mut helper.registry);
        helper
    }

    pub fn register<B>(&mut self, domain: Domain, type_tag: impl Into<String>, builder: B)
    where
        B: Builder + 'static,
    {
        self.registry.register(domain, type_tag, builder);
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Build a fresh network from the root document at `config_path`
    pub fn build(&self, config_path: &Path) -> Result<Network, BuildError> {
        let mut network = Network::new();
        self.install(config_path, &mut network)?;
        Ok(network)
    }

    /// Run stages 0-9 against `network`.
    ///
    /// On failure the error names the stage, domain and entry ids it happened
    /// at, and `network` is left partially built and must be discarded.
    pub fn install(&self, config_path: &Path, network: &mut Network) -> Result<(), BuildError> {
        let mut ctx = BuildContext::new(config_path, network);
        self.run_stages(&mut ctx).map_err(|e| ctx.annotate(e))?;

        let network = ctx.network();
        info!(
            "Scenario installed: {} nodes, {} channels, {} devices, {} applications",
            network.nodes().count(),
            network.channels().count(),
            network.devices().count(),
            network.applications().count()
        );
        Ok(())
    }

    fn run_stages(&self, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
        self.load_config(ctx)?;
        self.create_nodes(ctx)?;
        self.install_links(ctx)?;
        self.install_internet(ctx)?;
        self.assign_networks(ctx)?;
        self.configure_routing(ctx)?;
        self.apply_node_roles(ctx)?;
        self.install_by_type(ctx, Stage::Mobility, Domain::Mobility)?;
        self.install_by_type(ctx, Stage::Application, Domain::Application)?;
        self.configure_simulator(ctx)
    }

    /// Stage 0: root document, then the Config builder loads the rest
    fn load_config(&self, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
        begin_stage(ctx, Stage::Config, Domain::Config);
        let root = load_document(ctx.config_path())?;
        ctx.insert_document(Domain::Config, root)?;
        let root = whole_document(ctx, Domain::Config);
        self.dispatch(ctx, Domain::Config, DEFAULT_TAG, &root)
    }

    /// Stage 1: every node through the default builder, roles come later
    fn create_nodes(&self, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
        begin_stage(ctx, Stage::Node, Domain::Node);
        let nodes = entry_list(ctx, Domain::Node)?;
        for (index, node) in list_items(&nodes).iter().enumerate() {
            ctx.set_entry_index(Some(index));
            ctx.set_node_id(Some(entry::node_id(node)?));
            self.dispatch(ctx, Domain::Node, DEFAULT_TAG, node)?;
        }
        Ok(())
    }

    /// Stage 2
    fn install_links(&self, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
        begin_stage(ctx, Stage::Link, Domain::Link);
        let links = entry_list(ctx, Domain::Link)?;
        for (index, link) in list_items(&links).iter().enumerate() {
            ctx.set_entry_index(Some(index));
            ctx.set_link_id(Some(entry::link_id(link)?));
            let tag = entry::required_str(link, TYPE)?;
            self.dispatch(ctx, Domain::Link, tag, link)?;
        }
        Ok(())
    }

    /// Stage 3: one call with the whole document
    fn install_internet(&self, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
        begin_stage(ctx, Stage::Internet, Domain::Internet);
        let internet = whole_document(ctx, Domain::Internet);
        self.dispatch(ctx, Domain::Internet, DEFAULT_TAG, &internet)?;
        if ctx.global_routing_enabled() {
            info!("Global routing enabled, per-node routing configuration will be skipped");
        }
        Ok(())
    }

    /// Stage 4: IPv4 entries first, then IPv6
    fn assign_networks(&self, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
        begin_stage(ctx, Stage::Network, Domain::Ipv4Network);
        for domain in [Domain::Ipv4Network, Domain::Ipv6Network] {
            ctx.set_domain(domain);
            ctx.set_entry_index(None);
            let networks = entry_list(ctx, domain)?;
            for (index, network) in list_items(&networks).iter().enumerate() {
                ctx.set_entry_index(Some(index));
                self.dispatch(ctx, domain, DEFAULT_TAG, network)?;
            }
        }
        Ok(())
    }

    /// Stage 5: per-node routing stacks.
    ///
    /// Every node named by either routing document is visited once, in
    /// ascending id order. Its IPv4 lists run before its IPv6 lists and the
    /// collected protocols become the node's routing stack.
    fn configure_routing(&self, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
        begin_stage(ctx, Stage::Routing, Domain::Ipv4RoutingProtocol);
        if ctx.global_routing_enabled() {
            info!("Skipping per-node routing: global routing is enabled");
            return Ok(());
        }

        let families = [
            (Domain::Ipv4RoutingProtocol, IPV4_ROUTING_LIST),
            (Domain::Ipv6RoutingProtocol, IPV6_ROUTING_LIST),
        ];

        let mut documents = Vec::with_capacity(families.len());
        let mut node_ids = BTreeSet::new();
        for (domain, list_key) in families {
            ctx.set_domain(domain);
            let document = entry_list(ctx, domain)?;
            for (index, protocol) in list_items(&document).iter().enumerate() {
                ctx.set_entry_index(Some(index));
                node_ids.insert(entry::node_id(protocol)?);
            }
            documents.push((domain, list_key, document));
        }
        ctx.set_entry_index(None);
        debug!("Routing configuration for nodes {:?}", node_ids);

        for node in node_ids {
            ctx.begin_routing(node);
            for (domain, list_key, document) in &documents {
                ctx.set_domain(*domain);
                for (index, protocol) in list_items(document).iter().enumerate() {
                    if entry::node_id(protocol)? != node {
                        continue;
                    }
                    ctx.set_entry_index(Some(index));
                    for item in entry::required_array(protocol, list_key)? {
                        let tag = entry::required_str(item, TYPE)?;
                        self.dispatch(ctx, *domain, tag, item)?;
                    }
                }
            }
            ctx.set_entry_index(None);
            install_routing_stack(ctx, node)?;
        }
        Ok(())
    }

    /// Stage 6: node entries that declare a role
    fn apply_node_roles(&self, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
        begin_stage(ctx, Stage::NodeRole, Domain::Node);
        let nodes = entry_list(ctx, Domain::Node)?;
        for (index, node) in list_items(&nodes).iter().enumerate() {
            if entry::optional(node, ROLE).is_none() {
                continue;
            }
            ctx.set_entry_index(Some(index));
            ctx.set_node_id(Some(entry::node_id(node)?));
            let role = entry::required_str(node, ROLE)?;
            self.dispatch(ctx, Domain::Node, role, node)?;
        }
        Ok(())
    }

    /// Stages 7 and 8: per-node entries dispatched by `type`
    fn install_by_type(&self, ctx: &mut BuildContext<'_>, stage: Stage, domain: Domain) -> Result<(), BuildError> {
        begin_stage(ctx, stage, domain);
        let document = entry_list(ctx, domain)?;
        for (index, item) in list_items(&document).iter().enumerate() {
            ctx.set_entry_index(Some(index));
            ctx.set_node_id(Some(entry::node_id(item)?));
            let tag = entry::required_str(item, TYPE)?;
            self.dispatch(ctx, domain, tag, item)?;
        }
        Ok(())
    }

    /// Stage 9: one call with the whole document
    fn configure_simulator(&self, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
        begin_stage(ctx, Stage::Simulator, Domain::Simulator);
        let simulator = whole_document(ctx, Domain::Simulator);
        self.dispatch(ctx, Domain::Simulator, DEFAULT_TAG, &simulator)
    }

    fn dispatch(
        &self,
        ctx: &mut BuildContext<'_>,
        domain: Domain,
        type_tag: &str,
        entry: &Entry,
    ) -> Result<(), BuildError> {
        ctx.set_domain(domain);
        let builder = self
            .registry
            .lookup(domain, type_tag)
            .ok_or_else(|| BuildError::NoBuilder {
                domain,
                type_tag: type_tag.to_string(),
            })?;
        debug!(
            "Dispatching ({}, \"{}\") entry={:?} node={:?} link={:?}",
            domain,
            type_tag,
            ctx.current_entry_index(),
            ctx.current_node_id(),
            ctx.current_link_id()
        );
        builder.build(entry, ctx)
    }
}

fn begin_stage(ctx: &mut BuildContext<'_>, stage: Stage, domain: Domain) {
    info!(
        "[{}%] Install stage {}/{}: {}",
        stage.index() * 10,
        stage.index(),
        Stage::ALL.len(),
        stage.name()
    );
    ctx.enter_stage(stage);
    ctx.set_domain(domain);
}

/// A document passed whole to its builder; absent documents are null
fn whole_document(ctx: &BuildContext<'_>, domain: Domain) -> Rc<Document> {
    ctx.document(domain).unwrap_or_else(|| Rc::new(Value::Null))
}

/// A document iterated entry by entry. Absent or null documents are empty,
/// anything other than a list is rejected.
fn entry_list(ctx: &BuildContext<'_>, domain: Domain) -> Result<Rc<Document>, BuildError> {
    let document = whole_document(ctx, domain);
    if entry::entries(&document).is_none() {
        return Err(BuildError::InvalidDocument {
            domain,
            reason: "expected a list of entries".to_string(),
        });
    }
    Ok(document)
}

fn list_items(document: &Document) -> &[Value] {
    entry::entries(document).unwrap_or_default()
}

fn install_routing_stack(ctx: &mut BuildContext<'_>, node: NodeId) -> Result<(), BuildError> {
    let accumulator = ctx.finish_routing()?;
    debug!(
        "Installing routing stack on node {}: {} IPv4 / {} IPv6 protocols",
        node,
        accumulator.ipv4().len(),
        accumulator.ipv6().len()
    );
    ctx.network_mut()
        .set_routing(node, accumulator.into_routing_stack())?;
    Ok(())
}
