//! Internet stack installation.

use crate::context::BuildContext;
use crate::domain::Domain;
use crate::entry::{self, Entry};
use crate::error::BuildError;
use crate::model::{RoutingStack, TimelineEvent};
use crate::utils::SimTime;
use log::info;
use std::collections::BTreeSet;

/// Install IP stacks.
///
/// With `enableGlobalRouting` every node gets a stack with global routing and
/// the routing tables are populated at t=0. Otherwise only the nodes named by
/// a routing-protocol document get a stack; their routing is assembled later,
/// node by node.
pub fn build_internet(entry: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let global = entry::required_bool(entry, "enableGlobalRouting")?;

    if global {
        ctx.enable_global_routing();
        let network = ctx.network_mut();
        for id in network.node_ids() {
            network.install_internet(id, RoutingStack::Global)?;
        }
        network
            .timeline_mut()
            .schedule(SimTime::ZERO, TimelineEvent::PopulateGlobalRoutingTables);
        info!("Installed internet stack with global routing on all nodes");
        return Ok(());
    }

    let mut routed = BTreeSet::new();
    for domain in [Domain::Ipv4RoutingProtocol, Domain::Ipv6RoutingProtocol] {
        let Some(document) = ctx.document(domain) else {
            continue;
        };
        let protocols = entry::entries(&document).ok_or_else(|| BuildError::InvalidDocument {
            domain,
            reason: "expected a list of entries".to_string(),
        })?;
        for protocol in protocols {
            routed.insert(entry::node_id(protocol)?);
        }
    }

    let network = ctx.network_mut();
    for id in &routed {
        network.install_internet(*id, RoutingStack::Unconfigured)?;
    }
    info!("Installed internet stack on {} routed node(s)", routed.len());
    Ok(())
}
