//! Scenario fixtures shared by the integration tests.

#![allow(dead_code)]

use netscenario::Domain;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A scenario written to a temporary directory: one JSON file per domain
/// plus a root `config.json` naming them.
pub struct Scenario {
    pub dir: TempDir,
    documents: BTreeMap<Domain, Value>,
}

impl Scenario {
    /// Empty lists everywhere, explicit routing and a 10s run
    pub fn new() -> Self {
        let mut documents = BTreeMap::new();
        for domain in Domain::sub_documents() {
            documents.insert(domain, json!([]));
        }
        documents.insert(Domain::Internet, json!({"enableGlobalRouting": false}));
        documents.insert(Domain::Simulator, json!({"simName": "test", "duration": "10s"}));
        Scenario {
            dir: TempDir::new().unwrap(),
            documents,
        }
    }

    pub fn set(mut self, domain: Domain, document: Value) -> Self {
        self.documents.insert(domain, document);
        self
    }

    /// Write every document and return the root path
    pub fn write(&self) -> PathBuf {
        let mut root = serde_json::Map::new();
        for (domain, document) in &self.documents {
            let key = domain.document_key().unwrap();
            let file = format!("{}.json", key);
            fs::write(self.dir.path().join(&file), document.to_string()).unwrap();
            root.insert(key.to_string(), Value::String(file));
        }
        let root_path = self.dir.path().join("config.json");
        fs::write(&root_path, Value::Object(root).to_string()).unwrap();
        root_path
    }
}

/// Two nodes joined by point-to-point link 1
pub fn two_node_p2p() -> Scenario {
    Scenario::new()
        .set(Domain::Node, json!([{"nodeId": 0}, {"nodeId": 1}]))
        .set(
            Domain::Link,
            json!([{
                "linkId": 1,
                "type": "p2p",
                "channel": {"delay": "2ms"},
                "device": {"dataRate": "5Mbps"},
                "netDevices": [{"nodeId": 0}, {"nodeId": 1}]
            }]),
        )
}
