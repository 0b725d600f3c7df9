use crate::support::client;
use ironic_mock::{provision_states, IronicMock, Node, StatusCode};
use reqwest::blocking::Client;
use serde_json::Value;
use std::{collections::HashSet, thread};

fn started(mock: IronicMock) -> IronicMock {
    let mut mock = mock;
    mock.start().unwrap();
    mock
}

fn url(mock: &IronicMock, path: &str) -> String {
    format!("{}{}", mock.endpoint().unwrap(), path)
}

fn get(client: &Client, mock: &IronicMock, path: &str) -> (u16, String) {
    let response = client.get(url(mock, path)).send().unwrap();
    (response.status().as_u16(), response.text().unwrap())
}

#[test]
fn endpoint_points_at_the_api_root() {
    let mock = started(IronicMock::new());

    let endpoint = mock.endpoint().unwrap();

    assert!(endpoint.starts_with("http://127.0.0.1:"));
    assert!(endpoint.ends_with("/v1/"));
    assert_eq!(IronicMock::endpoint_or_default(Some(&mock)), endpoint);
}

#[test]
fn ready_state_can_be_toggled() {
    let client = client();
    let mock = started(IronicMock::new().not_ready(StatusCode::SERVICE_UNAVAILABLE));

    let (status, body) = get(&client, &mock, "");
    assert_eq!(status, 503);
    assert_eq!(body, "");

    let mock = mock.ready();
    let (status, body) = get(&client, &mock, "");
    assert_eq!(status, 200);
    assert_eq!(body, "{}");
}

#[test]
fn default_responses_answer_any_node() {
    let client = client();
    let mock = started(IronicMock::new().with_default_responses());

    let (status, body) = get(&client, &mock, "nodes/some-node");
    assert_eq!(status, 200);
    let node: Node = serde_json::from_str(&body).unwrap();
    assert_eq!(node.uuid, "some-node");

    let provision = client
        .put(url(&mock, "nodes/some-node/states/provision"))
        .body(r#"{"target": "manage"}"#)
        .send()
        .unwrap();
    assert_eq!(provision.status().as_u16(), 202);
    assert_eq!(provision.text().unwrap(), "{}");

    let power = client
        .put(url(&mock, "nodes/some-node/states/power"))
        .body(r#"{"target": "power on"}"#)
        .send()
        .unwrap();
    assert_eq!(power.status().as_u16(), 202);

    let (status, _) = get(&client, &mock, "nodes/some-node/validate");
    assert_eq!(status, 200);

    let (status, body) = get(&client, &mock, "");
    assert_eq!((status, body.as_str()), (200, "{}"));
}

#[test]
fn node_is_served_by_uuid_and_name() {
    let client = client();
    let node = Node::new("33ce8659-7400-4c68-9535-d10766f07a58")
        .with_name("worker-0")
        .with_provision_state(provision_states::AVAILABLE);
    let mock = started(IronicMock::new().with_node(&node));

    for path in [
        "nodes/33ce8659-7400-4c68-9535-d10766f07a58",
        "nodes/worker-0",
    ] {
        let (status, body) = get(&client, &mock, path);
        assert_eq!(status, 200);
        let served: Node = serde_json::from_str(&body).unwrap();
        assert_eq!(served, node);
    }

    let patch = client
        .patch(url(&mock, "nodes/worker-0"))
        .body("[]")
        .send()
        .unwrap();
    assert_eq!(patch.status().as_u16(), 404);
}

#[test]
fn node_update_answers_patch() {
    let client = client();
    let node = Node::new("uuid-1").with_name("worker-1");
    let mock = started(IronicMock::new().with_node_update(&node));

    let patch = client
        .patch(url(&mock, "nodes/uuid-1"))
        .body(r#"[{"op": "replace", "path": "/name", "value": "worker-1"}]"#)
        .send()
        .unwrap();
    assert_eq!(patch.status().as_u16(), 200);
    let served: Node = patch.json().unwrap();
    assert_eq!(served.name, "worker-1");

    assert_eq!(get(&client, &mock, "nodes/uuid-1").0, 404);
    assert_eq!(mock.server().request_count(), 2);
}

#[test]
fn nodes_without_name_get_a_single_route() {
    let client = client();
    let mock = started(IronicMock::new().with_node(&Node::new("uuid-only")));

    assert_eq!(get(&client, &mock, "nodes/uuid-only").0, 200);
    assert_eq!(get(&client, &mock, "nodes/").0, 404);
}

#[test]
fn provision_state_routes_answer_accepted() {
    let client = client();
    let mock = started(
        IronicMock::new()
            .with_node_states_provision("uuid-1")
            .with_node_states_provision_update("uuid-1"),
    );

    let (status, body) = get(&client, &mock, "nodes/uuid-1/states/provision");
    assert_eq!((status, body.as_str()), (202, "{}"));

    let put = client
        .put(url(&mock, "nodes/uuid-1/states/provision"))
        .body(r#"{"target": "provide"}"#)
        .send()
        .unwrap();
    assert_eq!(put.status().as_u16(), 202);

    assert_eq!(get(&client, &mock, "nodes/uuid-2/states/provision").0, 404);
}

#[test]
fn power_state_routes_use_the_given_code() {
    let client = client();
    let mock = started(
        IronicMock::new()
            .with_node_states_power("uuid-1", StatusCode::OK)
            .with_node_states_power_update("uuid-1", StatusCode::CONFLICT),
    );

    assert_eq!(get(&client, &mock, "nodes/uuid-1/states/power").0, 200);

    let put = client
        .put(url(&mock, "nodes/uuid-1/states/power"))
        .body(r#"{"target": "power off"}"#)
        .send()
        .unwrap();
    assert_eq!(put.status().as_u16(), 409);
    assert_eq!(put.text().unwrap(), "{}");
}

#[test]
fn validate_route_answers_ok() {
    let client = client();
    let mock = started(IronicMock::new().with_node_validate("uuid-1"));

    let (status, body) = get(&client, &mock, "nodes/uuid-1/validate");

    assert_eq!((status, body.as_str()), (200, "{}"));
}

#[test]
fn missing_and_broken_nodes_override_the_defaults() {
    let client = client();
    let mock = started(
        IronicMock::new()
            .with_default_responses()
            .no_node("gone")
            .node_error("broken", StatusCode::INTERNAL_SERVER_ERROR),
    );

    assert_eq!(get(&client, &mock, "nodes/gone"), (404, String::new()));
    assert_eq!(get(&client, &mock, "nodes/broken").0, 500);
    assert_eq!(get(&client, &mock, "nodes/other").0, 200);
}

#[test]
fn drivers_lists_fake_hardware() {
    let client = client();
    let mock = started(IronicMock::new().with_drivers());

    let (status, body) = get(&client, &mock, "drivers");
    assert_eq!(status, 200);

    let drivers: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(drivers["drivers"][0]["name"], "fake-hardware");
    assert_eq!(drivers["drivers"][0]["links"].as_array().unwrap().len(), 2);
}

#[test]
fn created_nodes_are_recorded_in_order() {
    let client = client();
    let mock = started(IronicMock::new().create_nodes());
    let bodies = [
        r#"{"name": "worker-0", "driver": "ipmi"}"#,
        r#"{"name": "worker-1", "driver": "redfish"}"#,
        r#"{"name": "worker-2"}"#,
    ];

    for (index, body) in bodies.iter().enumerate() {
        let response = client
            .post(url(&mock, "nodes"))
            .header("content-type", "application/json")
            .body(*body)
            .send()
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);

        let text = response.text().unwrap();
        assert!(text.starts_with(&format!(r#"{{"uuid":"node-{}""#, index)));
        let created: Value = serde_json::from_str(&text).unwrap();
        let posted: Value = serde_json::from_str(body).unwrap();
        assert_eq!(created["name"], posted["name"]);
    }

    let created_nodes = mock.created_nodes();
    assert_eq!(created_nodes.len(), bodies.len());
    for (index, (created, body)) in created_nodes.iter().zip(bodies.iter()).enumerate() {
        assert_eq!(created.uuid, format!("node-{}", index));
        assert_eq!(created.body, *body);
    }
}

#[test]
fn concurrent_creates_get_unique_uuids() {
    let mock = started(IronicMock::new().create_nodes());
    let url = url(&mock, "nodes");

    let workers: Vec<_> = (0..10)
        .map(|index| {
            let url = url.clone();
            let client = client();
            thread::spawn(move || {
                let response = client
                    .post(url)
                    .body(format!(r#"{{"name": "worker-{}"}}"#, index))
                    .send()
                    .unwrap();
                response.status().as_u16()
            })
        })
        .collect();
    for worker in workers {
        assert_eq!(worker.join().unwrap(), 201);
    }

    let created_nodes = mock.created_nodes();
    let uuids: HashSet<_> = created_nodes.iter().map(|n| n.uuid.clone()).collect();
    assert_eq!(created_nodes.len(), 10);
    assert_eq!(uuids.len(), 10);
    assert!((0..10).all(|i| uuids.contains(&format!("node-{}", i))));
}

#[test]
fn invalid_create_requests_are_not_recorded() {
    let client = client();
    let mock = started(IronicMock::new().create_nodes());

    let garbage = client
        .post(url(&mock, "nodes"))
        .body("not json")
        .send()
        .unwrap();
    assert_eq!(garbage.status().as_u16(), 400);

    let list = client.get(url(&mock, "nodes")).send().unwrap();
    assert_eq!(list.status().as_u16(), 405);

    assert!(mock.created_nodes().is_empty());
    assert_eq!(mock.server().request_count(), 2);
}

#[test]
fn non_utf8_create_requests_are_rejected() {
    let client = client();
    let mock = started(IronicMock::new().create_nodes());

    let response = client
        .post(url(&mock, "nodes"))
        .body(vec![b'{', 0xff, 0xfe, b'}'])
        .send()
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    assert!(mock.created_nodes().is_empty());
    let requests = mock.server().requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].status_code, StatusCode::BAD_REQUEST);
}
