//! # Builder Registry Module
//!
//! This module holds the two-level table that maps a configuration domain and
//! a type tag to the builder that turns one entry into scenario objects.
//!
//! ## Builders
//!
//! A builder is anything implementing [`Builder`]. Plain functions and
//! closures with the signature
//!
//! ```text
//! fn(&Entry, &mut BuildContext<'_>) -> Result<(), BuildError>
//! ```
//!
//! implement it automatically, so most builders are ordinary functions.
//! Builders that need configuration of their own can be structs.
//!
//! ## Lookup Rules
//!
//! - Each (domain, type tag) key holds at most one builder
//! - Registering a key again replaces the earlier builder
//! - [`HandlerRegistry::lookup`] returns `None` for unknown domains and tags
//!   and never panics; the orchestrator turns `None` into
//!   [`BuildError::NoBuilder`]
//!
//! ## Type Tags
//!
//! | Domain | Tag taken from |
//! |---|---|
//! | Link, Mobility, Application | entry `type` |
//! | Ipv4/Ipv6 routing lists | item `type` |
//! | Node (stage 6) | entry `role` |
//! | everything else | the literal `"default"` |

use crate::context::BuildContext;
use crate::domain::Domain;
use crate::entry::Entry;
use crate::error::BuildError;
use std::collections::HashMap;
use std::fmt;

/// Type tag of builders for domains without per-entry variation
pub const DEFAULT_TAG: &str = "default";

/// Turns one entry into mutations of the scenario and/or the build context
pub trait Builder {
    fn build(&self, entry: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError>;
}

impl<F> Builder for F
where
    F: Fn(&Entry, &mut BuildContext<'_>) -> Result<(), BuildError>,
{
    fn build(&self, entry: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
        self(entry, ctx)
    }
}

/// Domain -> type tag -> builder
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<Domain, HashMap<String, Box<dyn Builder>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `builder` under (domain, type_tag), replacing any earlier one
    pub fn register<B>(&mut self, domain: Domain, type_tag: impl Into<String>, builder: B)
    where
        B: Builder + 'static,
    {
        self.handlers
            .entry(domain)
            .or_default()
            .insert(type_tag.into(), Box::new(builder));
    }

    pub fn lookup(&self, domain: Domain, type_tag: &str) -> Option<&dyn Builder> {
        self.handlers
            .get(&domain)
            .and_then(|tags| tags.get(type_tag))
            .map(|builder| builder.as_ref())
    }

    pub fn contains(&self, domain: Domain, type_tag: &str) -> bool {
        self.lookup(domain, type_tag).is_some()
    }

    /// Registered tags of a domain, sorted
    pub fn type_tags(&self, domain: Domain) -> Vec<&str> {
        let mut tags: Vec<&str> = self
            .handlers
            .get(&domain)
            .map(|tags| tags.keys().map(String::as_str).collect())
            .unwrap_or_default();
        tags.sort_unstable();
        tags
    }

    /// Number of registered (domain, type tag) keys
    pub fn len(&self) -> usize {
        self.handlers.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for domain in Domain::ALL {
            let tags = self.type_tags(domain);
            if !tags.is_empty() {
                map.entry(&domain, &tags);
            }
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Network;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn noop(_: &Entry, _: &mut BuildContext<'_>) -> Result<(), BuildError> {
        Ok(())
    }

    /// Records a label every time it runs
    struct Recorder {
        label: &'static str,
        calls: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Builder for Recorder {
        fn build(&self, _: &Entry, _: &mut BuildContext<'_>) -> Result<(), BuildError> {
            self.calls.borrow_mut().push(self.label);
            Ok(())
        }
    }

    #[test]
    fn test_register_overwrites() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut registry = HandlerRegistry::new();
        registry.register(
            Domain::Link,
            "p2p",
            Recorder { label: "first", calls: calls.clone() },
        );
        registry.register(
            Domain::Link,
            "p2p",
            Recorder { label: "second", calls: calls.clone() },
        );
        assert_eq!(registry.len(), 1);

        let mut network = Network::new();
        let mut ctx = BuildContext::new("config.json", &mut network);
        let builder = registry.lookup(Domain::Link, "p2p").unwrap();
        builder.build(&json!({}), &mut ctx).unwrap();
        assert_eq!(*calls.borrow(), vec!["second"]);
    }

    #[test]
    fn test_lookup_absent() {
        let mut registry = HandlerRegistry::new();
        assert!(registry.is_empty());
        // No registrations for the domain at all
        assert!(registry.lookup(Domain::Application, "OnOff").is_none());

        registry.register(Domain::Application, "UdpEchoServer", noop);
        // Domain known, tag not
        assert!(registry.lookup(Domain::Application, "OnOff").is_none());
        assert!(registry.contains(Domain::Application, "UdpEchoServer"));
        assert!(!registry.contains(Domain::Mobility, "UdpEchoServer"));
    }

    #[test]
    fn test_type_tags_sorted() {
        let mut registry = HandlerRegistry::new();
        registry.register(Domain::Node, "switch", noop);
        registry.register(Domain::Node, DEFAULT_TAG, noop);
        registry.register(Domain::Node, "adhoc", noop);
        assert_eq!(registry.type_tags(Domain::Node), vec!["adhoc", "default", "switch"]);
        assert!(registry.type_tags(Domain::Link).is_empty());
        assert!(format!("{:?}", registry).contains("switch"));
    }
}
