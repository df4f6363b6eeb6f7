mod common;

use common::{two_node_p2p, Scenario};
use netscenario::entry::Entry;
use netscenario::model::{
    ApplicationKind, DataLinkType, DeviceKey, LinkKind, MobilityKind, ModelError, RoutingProtocol, RoutingStack,
    TimelineEvent,
};
use netscenario::utils::SimTime;
use netscenario::{BuildContext, BuildError, Builder, Domain, ScenarioHelper, Stage};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::fs;
use std::net::Ipv4Addr;
use std::rc::Rc;

/// Records (node, domain) for every routing item it is handed
#[derive(Clone, Default)]
struct RoutingRecorder {
    visits: Rc<RefCell<Vec<(u32, Domain)>>>,
}

impl Builder for RoutingRecorder {
    fn build(&self, _: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
        let node = ctx.routing_accumulator()?.node_id();
        self.visits.borrow_mut().push((node, ctx.current_domain()));
        Ok(())
    }
}

fn reject_routing(_: &Entry, _: &mut BuildContext<'_>) -> Result<(), BuildError> {
    Err(BuildError::invalid("type", "per-node routing ran under global routing"))
}

#[test]
fn test_two_nodes_one_p2p_link() {
    let scenario = two_node_p2p();
    let network = ScenarioHelper::with_default_builders()
        .build(&scenario.write())
        .unwrap();

    assert_eq!(network.nodes().count(), 2);
    let channel = network.channel(1).unwrap();
    assert_eq!(channel.kind, LinkKind::PointToPoint);
    assert_eq!(channel.devices, vec![DeviceKey::new(0, 1), DeviceKey::new(1, 1)]);
    assert_eq!(channel.delay, Some(SimTime::from_nanos(2_000_000)));
    assert_eq!(network.device(DeviceKey::new(1, 1)).unwrap().data_rate.unwrap().bps(), 5_000_000);

    let control = network.run_control();
    assert_eq!(control.sim_name.as_deref(), Some("test"));
    assert_eq!(control.stop_time, Some(SimTime::from_secs(10)));
}

#[test]
fn test_global_routing_skips_routing_stage() {
    let scenario = two_node_p2p()
        .set(Domain::Internet, json!({"enableGlobalRouting": true}))
        .set(
            Domain::Ipv4RoutingProtocol,
            json!([{"nodeId": 0, "ipv4RoutingList": [{"type": "static", "priority": 0}]}]),
        );

    let mut helper = ScenarioHelper::with_default_builders();
    helper.register(Domain::Ipv4RoutingProtocol, "static", reject_routing);
    let network = helper.build(&scenario.write()).unwrap();

    for id in [0, 1] {
        assert_eq!(network.internet(id).unwrap().routing, RoutingStack::Global);
    }
    let first = network.timeline().in_order()[0].clone();
    assert_eq!(first.at, SimTime::ZERO);
    assert_eq!(first.event, TimelineEvent::PopulateGlobalRoutingTables);
}

#[test]
fn test_unregistered_application_type() {
    let scenario = two_node_p2p().set(
        Domain::Application,
        json!([{"nodeId": 0, "applicationId": 0, "type": "BulkSend"}]),
    );
    let err = ScenarioHelper::with_default_builders()
        .build(&scenario.write())
        .unwrap_err();

    match &err {
        BuildError::Stage {
            stage, domain, node_id, ..
        } => {
            assert_eq!(*stage, Stage::Application);
            assert_eq!(*domain, Domain::Application);
            assert_eq!(*node_id, Some(0));
        }
        other => panic!("expected a stage error, got {:?}", other),
    }
    assert!(matches!(
        err.root_cause(),
        BuildError::NoBuilder { domain: Domain::Application, type_tag } if type_tag == "BulkSend"
    ));
    assert!(err.to_string().contains("stage 8"));
}

#[test]
fn test_link_to_undeclared_node_fails_in_link_stage() {
    let scenario = Scenario::new()
        .set(Domain::Node, json!([{"nodeId": 0}]))
        .set(
            Domain::Link,
            json!([{"linkId": 4, "type": "p2p", "netDevices": [{"nodeId": 0}, {"nodeId": 5}]}]),
        );
    let err = ScenarioHelper::with_default_builders()
        .build(&scenario.write())
        .unwrap_err();

    assert!(matches!(
        &err,
        BuildError::Stage { stage: Stage::Link, link_id: Some(4), .. }
    ));
    assert!(matches!(err.root_cause(), BuildError::Model(ModelError::UnknownNode(5))));
}

#[test]
fn test_error_names_failing_entry_index() {
    let scenario = two_node_p2p().set(
        Domain::Ipv4Network,
        json!([
            {"subnet": "10.1.1.0", "mask": "/24", "base": "0.0.0.1"},
            {"subnet": "10.1.2.0", "mask": "/24", "base": "0.0.0.1"},
            {"subnet": "10.1.3.0", "base": "0.0.0.1"}
        ]),
    );
    let err = ScenarioHelper::with_default_builders()
        .build(&scenario.write())
        .unwrap_err();

    match &err {
        BuildError::Stage {
            stage,
            domain,
            entry_index,
            node_id,
            link_id,
            ..
        } => {
            assert_eq!(*stage, Stage::Network);
            assert_eq!(*domain, Domain::Ipv4Network);
            assert_eq!(*entry_index, Some(2));
            assert_eq!(*node_id, None);
            assert_eq!(*link_id, None);
        }
        other => panic!("expected a stage error, got {:?}", other),
    }
    assert!(matches!(err.root_cause(), BuildError::MissingField { field } if field == "mask"));
    assert!(err.to_string().contains("(entry 2)"), "{}", err);
}

#[test]
fn test_simulator_error_has_no_entry_index() {
    let scenario = two_node_p2p().set(Domain::Simulator, json!({"simName": "test"}));
    let err = ScenarioHelper::with_default_builders()
        .build(&scenario.write())
        .unwrap_err();

    assert!(matches!(
        &err,
        BuildError::Stage {
            stage: Stage::Simulator,
            domain: Domain::Simulator,
            entry_index: None,
            ..
        }
    ));
}

#[test]
fn test_helper_reused_across_scenarios() {
    let recorder = RoutingRecorder::default();
    let mut helper = ScenarioHelper::with_default_builders();
    helper.register(Domain::Ipv4RoutingProtocol, "record", recorder.clone());

    let global = two_node_p2p().set(Domain::Internet, json!({"enableGlobalRouting": true}));
    let first = helper.build(&global.write()).unwrap();
    assert!(recorder.visits.borrow().is_empty());

    let explicit = Scenario::new()
        .set(Domain::Node, json!([{"nodeId": 7}, {"nodeId": 8}]))
        .set(
            Domain::Ipv4RoutingProtocol,
            json!([{"nodeId": 8, "ipv4RoutingList": [{"type": "record"}]}]),
        );
    let second = helper.build(&explicit.write()).unwrap();

    // Routing ran for the second scenario only, against its own nodes
    assert_eq!(*recorder.visits.borrow(), vec![(8, Domain::Ipv4RoutingProtocol)]);
    assert!(matches!(
        &second.internet(8).unwrap().routing,
        RoutingStack::List { ipv4, ipv6 } if ipv4.is_empty() && ipv6.is_empty()
    ));
    assert!(second.internet(7).is_err());
    assert!(second.timeline().in_order().iter().all(|e| e.event != TimelineEvent::PopulateGlobalRoutingTables));
    assert!(second.node(0).is_err() && second.node(1).is_err());
    assert!(second.channel(1).is_err());

    // The first network keeps its own global stacks
    for id in [0, 1] {
        assert_eq!(first.internet(id).unwrap().routing, RoutingStack::Global);
    }
    assert!(first.node(7).is_err());
    assert_eq!(first.timeline().in_order()[0].event, TimelineEvent::PopulateGlobalRoutingTables);
}

#[test]
fn test_routing_visits_each_node_once_in_order() {
    let scenario = Scenario::new()
        .set(Domain::Node, json!([{"nodeId": 1}, {"nodeId": 2}, {"nodeId": 3}]))
        .set(
            Domain::Ipv4RoutingProtocol,
            json!([
                {"nodeId": 3, "ipv4RoutingList": [{"type": "record"}]},
                {"nodeId": 1, "ipv4RoutingList": [{"type": "record"}]}
            ]),
        )
        .set(
            Domain::Ipv6RoutingProtocol,
            json!([
                {"nodeId": 2, "ipv6RoutingList": [{"type": "record"}]},
                {"nodeId": 1, "ipv6RoutingList": [{"type": "record"}]}
            ]),
        );

    let recorder = RoutingRecorder::default();
    let mut helper = ScenarioHelper::with_default_builders();
    helper.register(Domain::Ipv4RoutingProtocol, "record", recorder.clone());
    helper.register(Domain::Ipv6RoutingProtocol, "record", recorder.clone());
    let network = helper.build(&scenario.write()).unwrap();

    assert_eq!(
        *recorder.visits.borrow(),
        vec![
            (1, Domain::Ipv4RoutingProtocol),
            (1, Domain::Ipv6RoutingProtocol),
            (2, Domain::Ipv6RoutingProtocol),
            (3, Domain::Ipv4RoutingProtocol),
        ]
    );
    // The recorder adds no protocols, so each visited node ends with empty lists
    for id in [1, 2, 3] {
        assert!(matches!(
            &network.internet(id).unwrap().routing,
            RoutingStack::List { ipv4, ipv6 } if ipv4.is_empty() && ipv6.is_empty()
        ));
    }
}

fn custom_node(entry: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let id = netscenario::entry::node_id(entry)?;
    ctx.network_mut().add_node(id)?.role = Some("custom".to_string());
    Ok(())
}

#[test]
fn test_registered_builder_replaces_default() {
    let scenario = two_node_p2p();
    let mut helper = ScenarioHelper::with_default_builders();
    helper.register(Domain::Node, "default", custom_node);

    let network = helper.build(&scenario.write()).unwrap();
    assert!(network.nodes().all(|n| n.role.as_deref() == Some("custom")));
}

#[test]
fn test_relative_yaml_sub_document() {
    let scenario = two_node_p2p();
    let root_path = scenario.write();

    let docs = scenario.dir.path().join("docs");
    fs::create_dir(&docs).unwrap();
    fs::write(docs.join("nodes.yaml"), "- nodeId: 0\n- nodeId: 1\n  role: terminal\n").unwrap();

    let mut root: Value = serde_json::from_str(&fs::read_to_string(&root_path).unwrap()).unwrap();
    root["nodes"] = json!("docs/nodes.yaml");
    fs::write(&root_path, root.to_string()).unwrap();

    let network = ScenarioHelper::with_default_builders().build(&root_path).unwrap();
    assert_eq!(network.node(1).unwrap().role.as_deref(), Some("terminal"));
    assert!(network.node(0).unwrap().role.is_none());
}

#[test]
fn test_missing_sub_document_key() {
    let scenario = two_node_p2p();
    let root_path = scenario.write();
    let mut root: Value = serde_json::from_str(&fs::read_to_string(&root_path).unwrap()).unwrap();
    root.as_object_mut().unwrap().remove("mobility");
    fs::write(&root_path, root.to_string()).unwrap();

    let err = ScenarioHelper::with_default_builders().build(&root_path).unwrap_err();
    assert!(matches!(&err, BuildError::Stage { stage: Stage::Config, .. }));
    assert!(matches!(err.root_cause(), BuildError::MissingField { field } if field == "mobility"));
}

#[test]
fn test_routed_scenario_with_default_builders() {
    let scenario = Scenario::new()
        .set(
            Domain::Node,
            json!([{"nodeId": 0}, {"nodeId": 1, "role": "router"}, {"nodeId": 2}]),
        )
        .set(
            Domain::Link,
            json!([
                {"linkId": 1, "type": "p2p", "netDevices": [{"nodeId": 0}, {"nodeId": 1}]},
                {
                    "linkId": 2,
                    "type": "csma",
                    "channel": {"dataRate": "100Mbps", "delay": "1ms"},
                    "netDevices": [{"nodeId": 1}, {"nodeId": 2}]
                }
            ]),
        )
        .set(
            Domain::Ipv4Network,
            json!([
                {
                    "subnet": "10.1.1.0", "mask": "255.255.255.0", "base": "0.0.0.1",
                    "netDeviceIds": [{"nodeId": 0, "linkId": 1}, {"nodeId": 1, "linkId": 1}]
                },
                {
                    "subnet": "10.1.2.0", "mask": "/24", "base": "0.0.0.1",
                    "netDeviceIds": [{"nodeId": 1, "linkId": 2}, {"nodeId": 2, "linkId": 2}]
                }
            ]),
        )
        .set(
            Domain::Ipv4RoutingProtocol,
            json!([
                {"nodeId": 0, "ipv4RoutingList": [{
                    "type": "static", "priority": 0,
                    "routes": [{"ipv4Address": "10.1.2.0", "mask": "255.255.255.0", "nextHop": "10.1.1.2", "nextLinkId": 1}]
                }]},
                {"nodeId": 1, "ipv4RoutingList": [{"type": "static", "priority": 0}]},
                {"nodeId": 2, "ipv4RoutingList": [{
                    "type": "static", "priority": 0,
                    "routes": [{"ipv4Address": "10.1.1.0", "mask": "/24", "nextHop": "10.1.2.1", "nextLinkId": 2}]
                }]}
            ]),
        )
        .set(
            Domain::Mobility,
            json!([{"nodeId": 0, "type": "ConstantPositionMobilityModel", "position": {"x": 1.0}}]),
        )
        .set(
            Domain::Application,
            json!([
                {"nodeId": 2, "applicationId": 0, "type": "UdpEchoServer", "socket": {"port": 9}},
                {
                    "nodeId": 0, "applicationId": 0, "type": "UdpEchoClient",
                    "startTime": "1s", "stopTime": "9s",
                    "socket": {"type": "ipv4", "port": 9, "netDeviceId": {"nodeId": 2}}
                }
            ]),
        )
        .set(
            Domain::Simulator,
            json!({"simName": "full", "duration": "10s", "pcapLinkId": [2], "flowMonitorTimes": ["10s"]}),
        );

    let network = ScenarioHelper::with_default_builders()
        .build(&scenario.write())
        .unwrap();

    assert_eq!(network.ipv4_address(1, 2).unwrap(), Ipv4Addr::new(10, 1, 2, 1));
    assert_eq!(network.ipv4_address(2, 1).unwrap(), Ipv4Addr::new(10, 1, 2, 2));
    assert_eq!(network.node(1).unwrap().role.as_deref(), Some("router"));

    match &network.internet(0).unwrap().routing {
        RoutingStack::List { ipv4, .. } => match &ipv4[0].protocol {
            RoutingProtocol::Ipv4Static { routes } => {
                assert_eq!(routes[0].next_hop, Ipv4Addr::new(10, 1, 1, 2));
                assert_eq!(routes[0].interface, 1);
            }
            other => panic!("unexpected protocol {:?}", other),
        },
        other => panic!("unexpected routing {:?}", other),
    }

    let mobility = network.node(0).unwrap().mobility.clone().unwrap();
    assert_eq!(mobility.kind, MobilityKind::ConstantPosition);

    let client = network.application(0, 0).unwrap();
    assert_eq!(client.start, SimTime::from_secs(1));
    assert!(matches!(
        client.kind,
        ApplicationKind::UdpEchoClient { remote, .. } if remote.to_string() == "10.1.2.2:9"
    ));

    let control = network.run_control();
    assert_eq!(control.pcap.len(), 2);
    assert!(control.pcap.iter().all(|p| p.data_link == DataLinkType::Ethernet && !p.promiscuous));
    assert_eq!(control.pcap[0].file_name, "full-link2-node1.pcap");

    let events: Vec<_> = network
        .timeline()
        .in_order()
        .into_iter()
        .map(|e| (e.at, e.event.clone()))
        .collect();
    assert_eq!(
        events,
        vec![
            (SimTime::from_nanos(9_999_999_900), TimelineEvent::FlowMonitorReport),
            (SimTime::from_secs(10), TimelineEvent::Stop),
        ]
    );
}

#[test]
fn test_bundled_p2p_echo_scenario() {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/p2p-echo/config.json");
    let network = ScenarioHelper::with_default_builders().build(&root).unwrap();

    let client = network.application(0, 0).unwrap();
    assert_eq!(client.kind.remote().unwrap().to_string(), "10.1.1.2:9");
    let waypoints = &network.node(1).unwrap().mobility.as_ref().unwrap().waypoints;
    assert_eq!(waypoints.len(), 2);
    assert_eq!(network.run_control().pcap.len(), 2);
    assert_eq!(network.timeline().len(), 3);
}
