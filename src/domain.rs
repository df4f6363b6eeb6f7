//! Configuration domains.
//!
//! A domain is one top-level concern of a scenario (nodes, links, routing, ...).
//! The declaration order is the build-dependency order and is relied upon by
//! the orchestrator.

use serde::Serialize;
use std::fmt;

/// A top-level configuration concern
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Domain {
    Config,
    Node,
    Link,
    Internet,
    Ipv4Network,
    Ipv6Network,
    Ipv4RoutingProtocol,
    Ipv6RoutingProtocol,
    Mobility,
    Application,
    Simulator,
}

impl Domain {
    /// Every domain, in build-dependency order
    pub const ALL: [Domain; 11] = [
        Domain::Config,
        Domain::Node,
        Domain::Link,
        Domain::Internet,
        Domain::Ipv4Network,
        Domain::Ipv6Network,
        Domain::Ipv4RoutingProtocol,
        Domain::Ipv6RoutingProtocol,
        Domain::Mobility,
        Domain::Application,
        Domain::Simulator,
    ];

    /// Key under which the root document names this domain's sub-document.
    /// `None` for the root document itself.
    pub fn document_key(self) -> Option<&'static str> {
        match self {
            Domain::Config => None,
            Domain::Node => Some("nodes"),
            Domain::Link => Some("links"),
            Domain::Internet => Some("internet"),
            Domain::Ipv4Network => Some("ipv4Network"),
            Domain::Ipv6Network => Some("ipv6Network"),
            Domain::Ipv4RoutingProtocol => Some("ipv4RoutingProtocol"),
            Domain::Ipv6RoutingProtocol => Some("ipv6RoutingProtocol"),
            Domain::Mobility => Some("mobility"),
            Domain::Application => Some("applications"),
            Domain::Simulator => Some("simulator"),
        }
    }

    /// Domains that have their own sub-document
    pub fn sub_documents() -> impl Iterator<Item = Domain> {
        Domain::ALL.into_iter().filter(|d| d.document_key().is_some())
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Domain::Config => "Config",
            Domain::Node => "Node",
            Domain::Link => "Link",
            Domain::Internet => "Internet",
            Domain::Ipv4Network => "Ipv4Network",
            Domain::Ipv6Network => "Ipv6Network",
            Domain::Ipv4RoutingProtocol => "Ipv4RoutingProtocol",
            Domain::Ipv6RoutingProtocol => "Ipv6RoutingProtocol",
            Domain::Mobility => "Mobility",
            Domain::Application => "Application",
            Domain::Simulator => "Simulator",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_build_order() {
        let mut sorted = Domain::ALL;
        sorted.sort();
        assert_eq!(sorted, Domain::ALL);
        assert!(Domain::Node < Domain::Link);
        assert!(Domain::Link < Domain::Ipv4Network);
        assert!(Domain::Application < Domain::Simulator);
    }

    #[test]
    fn test_sub_document_keys() {
        let keys: Vec<_> = Domain::sub_documents()
            .filter_map(Domain::document_key)
            .collect();
        assert_eq!(keys.len(), 10);
        assert_eq!(keys[0], "nodes");
        assert_eq!(keys[8], "applications");
        assert_eq!(Domain::Config.document_key(), None);
    }
}
