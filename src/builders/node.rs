//! Node creation and node roles.

use crate::context::BuildContext;
use crate::entry::{self, Entry};
use crate::error::BuildError;
use crate::model::{DeviceKey, LinkKind};
use log::{debug, warn};

const ROLE: &str = "role";

/// Create node `nodeId`
pub fn build_node(entry: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let id = entry::node_id(entry)?;
    ctx.network_mut().add_node(id)?;
    Ok(())
}

/// Record the declared role of an existing node
pub fn build_role(entry: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let id = entry::node_id(entry)?;
    let role = entry::required_str(entry, ROLE)?;
    ctx.network_mut().node_mut(id)?.role = Some(role.to_string());
    debug!("Node {} has role {}", id, role);
    Ok(())
}

/// Turn a node into a layer-2 switch: its CSMA ports are bridged and its
/// IP interfaces other than the loopback are taken down.
pub fn build_switch(entry: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    build_role(entry, ctx)?;
    let id = entry::node_id(entry)?;

    let network = ctx.network_mut();
    let mut csma_ports = Vec::new();
    for link in network.node(id)?.devices.clone() {
        if network.device(DeviceKey::new(id, link))?.kind == LinkKind::Csma {
            csma_ports.push(link);
        }
    }

    if csma_ports.len() >= 2 {
        debug!("Bridging links {:?} on switch {}", csma_ports, id);
        network.bridge(id, csma_ports)?;
    } else {
        warn!(
            "Switch {} has {} CSMA port(s), at least 2 are needed to bridge",
            id,
            csma_ports.len()
        );
    }

    network.set_interfaces_down(id)?;
    Ok(())
}
