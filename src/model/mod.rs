//! Scenario object model.
//!
//! This is the simulated network that builders populate: nodes, the channels
//! created for each link id, devices keyed by (node id, link id), IP stacks,
//! routing stacks, mobility, applications, run control and the timeline of
//! events scheduled for after the build.
//!
//! Every mutation validates the ids it is given, so an entry that references
//! an object no earlier stage created is rejected with a [`ModelError`].

pub mod address;
pub mod application;
pub mod link;
pub mod node;
pub mod run;

pub use address::{
    AddressRegistry, Ipv4AddressAllocator, Ipv4InterfaceAddress, Ipv6AddressAllocator,
    Ipv6InterfaceAddress,
};
pub use application::{Application, ApplicationKind};
pub use link::{
    Channel, LinkKind, NetDevice, PropagationLoss, RemoteStationManager, WifiChannel,
    WifiChannelType, WifiDevice, WifiMac, WifiPhy, WifiStandard,
};
pub use node::{
    HnaNetwork, InternetStack, Interface, Ipv4Route, Ipv6Route, Mobility, MobilityKind, Node,
    OlsrConfig, PrioritizedProtocol, RoutingProtocol, RoutingStack, Vector3, Waypoint,
};
pub use run::{DataLinkType, LogLevel, PcapCapture, RunControl, ScheduledEvent, Timeline, TimelineEvent};

use log::debug;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

pub type NodeId = u32;
pub type LinkId = u32;

/// Identifies the device a node has on a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DeviceKey {
    pub node: NodeId,
    pub link: LinkId,
}

impl DeviceKey {
    pub fn new(node: NodeId, link: LinkId) -> Self {
        Self { node, link }
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node{}-link{}", self.node, self.link)
    }
}

/// Rejections raised by the scenario model
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("node {0} already exists")]
    DuplicateNode(NodeId),

    #[error("unknown link {0}")]
    UnknownLink(LinkId),

    #[error("link {0} already exists")]
    DuplicateLink(LinkId),

    #[error("unknown device {0}")]
    UnknownDevice(DeviceKey),

    #[error("device {0} already exists")]
    DuplicateDevice(DeviceKey),

    #[error("node {0} has no internet stack")]
    NoInternetStack(NodeId),

    #[error("node {0} already has an internet stack")]
    InternetStackInstalled(NodeId),

    #[error("device {0} has no {1} interface")]
    DeviceNotAddressed(DeviceKey, &'static str),

    #[error("node {node} has no {family} interface {interface}")]
    NoInterface {
        node: NodeId,
        family: &'static str,
        interface: usize,
    },

    #[error("interface {interface} of node {node} has no {family} address")]
    NoAddress {
        node: NodeId,
        family: &'static str,
        interface: usize,
    },

    #[error("address {address} is already assigned to {owner}")]
    DuplicateAddress { address: IpAddr, owner: DeviceKey },

    #[error("no free addresses left in {network}")]
    AddressPoolExhausted { network: String },

    #[error("node {0} already has a mobility model")]
    MobilityInstalled(NodeId),

    #[error("application {application} already exists on node {node}")]
    DuplicateApplication { node: NodeId, application: u32 },
}

fn serialize_values<K, V, S>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
where
    V: Serialize,
    S: Serializer,
{
    serializer.collect_seq(map.values())
}

/// The simulated network a scenario build populates
#[derive(Debug, Default, Serialize)]
pub struct Network {
    nodes: BTreeMap<NodeId, Node>,
    #[serde(serialize_with = "serialize_values")]
    channels: BTreeMap<LinkId, Channel>,
    #[serde(serialize_with = "serialize_values")]
    devices: BTreeMap<DeviceKey, NetDevice>,
    #[serde(serialize_with = "serialize_values")]
    applications: BTreeMap<(NodeId, u32), Application>,
    #[serde(skip)]
    addresses: AddressRegistry,
    run: RunControl,
    timeline: Timeline,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------------
    // Nodes
    // ---------------------------------------------------------------------

    pub fn add_node(&mut self, id: NodeId) -> Result<&mut Node, ModelError> {
        if self.nodes.contains_key(&id) {
            return Err(ModelError::DuplicateNode(id));
        }
        debug!("Created node {}", id);
        Ok(self.nodes.entry(id).or_insert_with(|| Node::new(id)))
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, ModelError> {
        self.nodes.get(&id).ok_or(ModelError::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, ModelError> {
        self.nodes.get_mut(&id).ok_or(ModelError::UnknownNode(id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    // ---------------------------------------------------------------------
    // Links and devices
    // ---------------------------------------------------------------------

    pub fn add_channel(&mut self, channel: Channel) -> Result<(), ModelError> {
        if self.channels.contains_key(&channel.link) {
            return Err(ModelError::DuplicateLink(channel.link));
        }
        debug!("Created {} channel for link {}", channel.kind, channel.link);
        self.channels.insert(channel.link, channel);
        Ok(())
    }

    pub fn channel(&self, link: LinkId) -> Result<&Channel, ModelError> {
        self.channels.get(&link).ok_or(ModelError::UnknownLink(link))
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    /// Attach a device to its node and to the channel of its link.
    /// Both must already exist.
    pub fn attach_device(&mut self, device: NetDevice) -> Result<(), ModelError> {
        let key = device.key;
        if self.devices.contains_key(&key) {
            return Err(ModelError::DuplicateDevice(key));
        }
        let channel = self
            .channels
            .get_mut(&key.link)
            .ok_or(ModelError::UnknownLink(key.link))?;
        let node = self
            .nodes
            .get_mut(&key.node)
            .ok_or(ModelError::UnknownNode(key.node))?;

        channel.devices.push(key);
        node.devices.push(key.link);
        self.devices.insert(key, device);
        debug!("Attached device {}", key);
        Ok(())
    }

    pub fn device(&self, key: DeviceKey) -> Result<&NetDevice, ModelError> {
        self.devices.get(&key).ok_or(ModelError::UnknownDevice(key))
    }

    pub fn devices(&self) -> impl Iterator<Item = &NetDevice> {
        self.devices.values()
    }

    /// Bridge the given links' devices on a node (all devices must exist)
    pub fn bridge(&mut self, node: NodeId, links: Vec<LinkId>) -> Result<(), ModelError> {
        for link in &links {
            self.device(DeviceKey::new(node, *link))?;
        }
        self.node_mut(node)?.bridge = links;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Internet stack and addressing
    // ---------------------------------------------------------------------

    pub fn install_internet(&mut self, node: NodeId, routing: RoutingStack) -> Result<(), ModelError> {
        let entry = self.node_mut(node)?;
        if entry.internet.is_some() {
            return Err(ModelError::InternetStackInstalled(node));
        }
        entry.internet = Some(InternetStack::new(routing));
        Ok(())
    }

    pub fn internet(&self, node: NodeId) -> Result<&InternetStack, ModelError> {
        self.node(node)?
            .internet
            .as_ref()
            .ok_or(ModelError::NoInternetStack(node))
    }

    fn internet_mut(&mut self, node: NodeId) -> Result<&mut InternetStack, ModelError> {
        self.node_mut(node)?
            .internet
            .as_mut()
            .ok_or(ModelError::NoInternetStack(node))
    }

    /// Add an IPv4 address to the interface bound to `key`, creating the
    /// interface if needed, and bring it up. Returns the interface index.
    pub fn add_ipv4_address(
        &mut self,
        key: DeviceKey,
        address: Ipv4InterfaceAddress,
    ) -> Result<usize, ModelError> {
        self.device(key)?;
        self.internet(key.node)?;
        self.addresses.register(IpAddr::V4(address.local), key)?;

        let stack = self.internet_mut(key.node)?;
        let index = stack.ensure_ipv4_interface(key.link);
        let iface = &mut stack.ipv4[index];
        iface.addresses.push(address);
        iface.up = true;
        debug!("Assigned {} to {} (interface {})", address, key, index);
        Ok(index)
    }

    pub fn add_ipv6_address(
        &mut self,
        key: DeviceKey,
        address: Ipv6InterfaceAddress,
    ) -> Result<usize, ModelError> {
        self.device(key)?;
        self.internet(key.node)?;
        self.addresses.register(IpAddr::V6(address.address), key)?;

        let stack = self.internet_mut(key.node)?;
        let index = stack.ensure_ipv6_interface(key.link);
        let iface = &mut stack.ipv6[index];
        iface.addresses.push(address);
        iface.up = true;
        debug!("Assigned {} to {} (interface {})", address, key, index);
        Ok(index)
    }

    /// IPv4 interface index bound to a device
    pub fn ipv4_interface_for(&self, key: DeviceKey) -> Result<usize, ModelError> {
        self.device(key)?;
        self.internet(key.node)?
            .ipv4_interface_for(key.link)
            .ok_or(ModelError::DeviceNotAddressed(key, "IPv4"))
    }

    pub fn ipv6_interface_for(&self, key: DeviceKey) -> Result<usize, ModelError> {
        self.device(key)?;
        self.internet(key.node)?
            .ipv6_interface_for(key.link)
            .ok_or(ModelError::DeviceNotAddressed(key, "IPv6"))
    }

    /// First IPv4 address of an interface
    pub fn ipv4_address(&self, node: NodeId, interface: usize) -> Result<Ipv4Addr, ModelError> {
        let iface = self
            .internet(node)?
            .ipv4
            .get(interface)
            .ok_or(ModelError::NoInterface { node, family: "IPv4", interface })?;
        iface
            .addresses
            .first()
            .map(|a| a.local)
            .ok_or(ModelError::NoAddress { node, family: "IPv4", interface })
    }

    pub fn ipv6_address(&self, node: NodeId, interface: usize) -> Result<Ipv6Addr, ModelError> {
        let iface = self
            .internet(node)?
            .ipv6
            .get(interface)
            .ok_or(ModelError::NoInterface { node, family: "IPv6", interface })?;
        iface
            .addresses
            .first()
            .map(|a| a.address)
            .ok_or(ModelError::NoAddress { node, family: "IPv6", interface })
    }

    /// Take every non-loopback interface of a node down. Nodes without an
    /// internet stack are left alone.
    pub fn set_interfaces_down(&mut self, node: NodeId) -> Result<(), ModelError> {
        if let Some(stack) = self.node_mut(node)?.internet.as_mut() {
            stack.ipv4.iter_mut().skip(1).for_each(|iface| iface.up = false);
            stack.ipv6.iter_mut().skip(1).for_each(|iface| iface.up = false);
        }
        Ok(())
    }

    /// Device an address is assigned to
    pub fn address_owner(&self, address: &IpAddr) -> Option<DeviceKey> {
        self.addresses.owner_of(address)
    }

    // ---------------------------------------------------------------------
    // Routing
    // ---------------------------------------------------------------------

    pub fn set_routing(&mut self, node: NodeId, routing: RoutingStack) -> Result<(), ModelError> {
        self.internet_mut(node)?.routing = routing;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Mobility and applications
    // ---------------------------------------------------------------------

    pub fn install_mobility(&mut self, node: NodeId, mobility: Mobility) -> Result<(), ModelError> {
        let entry = self.node_mut(node)?;
        if entry.mobility.is_some() {
            return Err(ModelError::MobilityInstalled(node));
        }
        entry.mobility = Some(mobility);
        Ok(())
    }

    pub fn add_application(&mut self, app: Application) -> Result<(), ModelError> {
        self.node(app.node)?;
        let key = (app.node, app.id);
        if self.applications.contains_key(&key) {
            return Err(ModelError::DuplicateApplication {
                node: app.node,
                application: app.id,
            });
        }
        debug!("Installed {} application {} on node {}", app.kind.name(), app.id, app.node);
        self.applications.insert(key, app);
        Ok(())
    }

    pub fn application(&self, node: NodeId, id: u32) -> Option<&Application> {
        self.applications.get(&(node, id))
    }

    pub fn applications(&self) -> impl Iterator<Item = &Application> {
        self.applications.values()
    }

    // ---------------------------------------------------------------------
    // Run control
    // ---------------------------------------------------------------------

    pub fn run_control(&self) -> &RunControl {
        &self.run
    }

    pub fn run_control_mut(&mut self) -> &mut RunControl {
        &mut self.run
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_link() -> Network {
        let mut net = Network::new();
        net.add_node(0).unwrap();
        net.add_node(1).unwrap();
        net.add_channel(Channel::new(5, LinkKind::PointToPoint)).unwrap();
        net.attach_device(NetDevice::new(DeviceKey::new(0, 5), LinkKind::PointToPoint))
            .unwrap();
        net.attach_device(NetDevice::new(DeviceKey::new(1, 5), LinkKind::PointToPoint))
            .unwrap();
        net
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut net = two_node_link();
        assert_eq!(net.add_node(0).unwrap_err(), ModelError::DuplicateNode(0));
        assert_eq!(
            net.add_channel(Channel::new(5, LinkKind::Csma)).unwrap_err(),
            ModelError::DuplicateLink(5)
        );
        assert_eq!(
            net.attach_device(NetDevice::new(DeviceKey::new(0, 5), LinkKind::PointToPoint))
                .unwrap_err(),
            ModelError::DuplicateDevice(DeviceKey::new(0, 5))
        );
    }

    #[test]
    fn test_attach_requires_node_and_channel() {
        let mut net = two_node_link();
        assert_eq!(
            net.attach_device(NetDevice::new(DeviceKey::new(9, 5), LinkKind::PointToPoint))
                .unwrap_err(),
            ModelError::UnknownNode(9)
        );
        assert_eq!(
            net.attach_device(NetDevice::new(DeviceKey::new(0, 6), LinkKind::PointToPoint))
                .unwrap_err(),
            ModelError::UnknownLink(6)
        );
        assert_eq!(net.channel(5).unwrap().devices.len(), 2);
        assert_eq!(net.node(1).unwrap().devices, vec![5]);
    }

    #[test]
    fn test_addressing_needs_internet_stack() {
        let mut net = two_node_link();
        let addr = Ipv4InterfaceAddress {
            local: Ipv4Addr::new(10, 0, 0, 1),
            prefix_len: 24,
        };
        assert_eq!(
            net.add_ipv4_address(DeviceKey::new(0, 5), addr).unwrap_err(),
            ModelError::NoInternetStack(0)
        );

        net.install_internet(0, RoutingStack::Unconfigured).unwrap();
        net.install_internet(1, RoutingStack::Unconfigured).unwrap();
        assert_eq!(net.add_ipv4_address(DeviceKey::new(0, 5), addr).unwrap(), 1);
        assert_eq!(net.ipv4_address(0, 1).unwrap(), Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(net.ipv4_interface_for(DeviceKey::new(0, 5)).unwrap(), 1);
        assert_eq!(net.address_owner(&IpAddr::V4(addr.local)), Some(DeviceKey::new(0, 5)));
        assert_eq!(net.address_owner(&IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2))), None);

        // Same address on another device is a conflict
        assert!(matches!(
            net.add_ipv4_address(DeviceKey::new(1, 5), addr),
            Err(ModelError::DuplicateAddress { .. })
        ));
        assert_eq!(
            net.ipv4_interface_for(DeviceKey::new(1, 5)).unwrap_err(),
            ModelError::DeviceNotAddressed(DeviceKey::new(1, 5), "IPv4")
        );
        assert_eq!(net.address_owner(&IpAddr::V4(addr.local)), Some(DeviceKey::new(0, 5)));
    }

    #[test]
    fn test_set_interfaces_down_keeps_loopback() {
        let mut net = two_node_link();
        net.install_internet(0, RoutingStack::Unconfigured).unwrap();
        net.add_ipv4_address(
            DeviceKey::new(0, 5),
            Ipv4InterfaceAddress {
                local: Ipv4Addr::new(10, 0, 0, 1),
                prefix_len: 24,
            },
        )
        .unwrap();
        net.set_interfaces_down(0).unwrap();
        let stack = net.internet(0).unwrap();
        assert!(stack.ipv4[0].up);
        assert!(!stack.ipv4[1].up);
        // A node without a stack is not an error
        net.set_interfaces_down(1).unwrap();
    }

    #[test]
    fn test_serializes_devices_as_list() {
        let net = two_node_link();
        let value = serde_json::to_value(&net).unwrap();
        assert_eq!(value["devices"].as_array().unwrap().len(), 2);
        assert_eq!(value["nodes"]["0"]["id"], 0);
    }
}
