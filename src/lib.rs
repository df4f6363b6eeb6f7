//! # netscenario - Declarative builder for network simulation scenarios
//!
//! This library turns a tree of JSON or YAML documents into a fully
//! configured simulated network: nodes, links and their devices, IP stacks,
//! addressing, routing, mobility, traffic applications and run control.
//!
//! ## Overview
//!
//! A scenario is described by a root document naming one sub-document per
//! configuration domain. Each entry of a sub-document carries a `type` tag;
//! the (domain, tag) pair selects the builder that applies the entry to the
//! network. Builders are registered in a [`HandlerRegistry`], so new entry
//! kinds can be supported without touching the orchestrator.
//!
//! ## Build Stages
//!
//! Entries are applied in ten fixed stages so that every id an entry refers
//! to already exists when the entry is applied:
//!
//! 0. Load Config: read the root document and every sub-document
//! 1. Create Nodes
//! 2. Install Links: channels and one device per attached node
//! 3. Internet Stack
//! 4. IPv4 / IPv6 Network: address assignment
//! 5. IPv4 / IPv6 Routing: per-node protocol lists, skipped with global routing
//! 6. Node Roles: switches, gateways, terminals
//! 7. Mobility
//! 8. Applications
//! 9. Simulator: stop time, seeds, log components, pcap, flow monitor
//!
//! ## Architecture
//!
//! - `domain`: configuration domains and their document keys
//! - `entry`: typed field access on document entries
//! - `config_loader`: JSON/YAML document loading
//! - `context`: build stages, the build context and the routing accumulator
//! - `registry`: the [`Builder`] trait and the builder registry
//! - `builders`: the built-in builders
//! - `orchestrator`: stage sequencing and dispatch
//! - `model`: the simulated network being built
//! - `utils`: simulated time, data rates and IP helpers
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use netscenario::ScenarioHelper;
//! use std::path::Path;
//!
//! let helper = ScenarioHelper::with_default_builders();
//! let network = helper.build(Path::new("scenario/config.json"))?;
//! println!("{} node(s)", network.nodes().count());
//! # Ok::<(), netscenario::BuildError>(())
//! ```
//!
//! ## Error Handling
//!
//! Every failure is a [`BuildError`]. Errors raised by a builder are wrapped
//! once with the stage, domain, entry index and node/link ids current when the
//! builder ran; [`BuildError::root_cause`] recovers the underlying error.

pub mod builders;
pub mod config_loader;
pub mod context;
pub mod domain;
pub mod entry;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod registry;
pub mod utils;

pub use context::{BuildContext, RoutingAccumulator, Stage};
pub use domain::Domain;
pub use error::BuildError;
pub use model::Network;
pub use orchestrator::ScenarioHelper;
pub use registry::{Builder, HandlerRegistry};
