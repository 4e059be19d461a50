//! Integration tests for building the registry from real-shaped documents.
//!
//! These tests parse an application list and detail documents the way the
//! machine serves them, then drive the registration rule and action
//! extraction through the public API only.

use std::sync::Arc;

use rigsync_core::domain::action::action_set_from_detail;
use rigsync_core::{
    Application, ApplicationRegistry, EntityDocument, HttpMethod, Registration,
};
use serde_json::{json, Map};

fn application_list() -> EntityDocument {
    serde_json::from_value(json!({
        "class": ["applications"],
        "properties": {},
        "entities": [
            {
                "properties": {"name": "camera", "alias": "", "state": "Idle"},
                "href": "http://rig/api/applications/camera"
            },
            {
                "properties": {"name": "audio", "state": "Running"},
                "href": "http://rig/api/applications/audio"
            },
            {
                "properties": {"name": "camera", "alias": "camera-rear", "state": "Idle"},
                "href": "http://rig/api/applications/camera-rear"
            },
            {
                "properties": {"name": "audio"},
                "href": "http://rig/api/applications/audio-dup"
            }
        ]
    }))
    .expect("application list must parse")
}

fn camera_detail() -> EntityDocument {
    serde_json::from_value(json!({
        "properties": {"name": "camera", "state": "Idle"},
        "actions": [
            {
                "name": "capture",
                "method": "POST",
                "href": "http://rig/api/applications/camera/capture",
                "type": "application/json",
                "fields": [
                    {"name": "mode", "value": "auto"},
                    {"name": "exposure"}
                ]
            },
            {
                "name": "preview",
                "method": "GET",
                "href": "http://rig/api/applications/camera/preview",
                "type": "image/png"
            }
        ],
        "blocked_actions": [
            {
                "name": "calibrate",
                "method": "POST",
                "href": "http://rig/api/applications/camera/calibrate",
                "type": "application/json",
                "fields": []
            }
        ]
    }))
    .expect("detail document must parse")
}

#[test]
fn test_registration_walks_list_in_document_order() {
    // Arrange
    let list = application_list();
    let mut registry = ApplicationRegistry::new();
    let mut decisions = Vec::new();

    // Act: decide, then register with an empty action set
    for link in &list.entities {
        let decision = registry.registration_for(link);
        if decision != Registration::Skipped {
            let app = Application::from_link(link, Arc::default()).expect("entity has a name");
            registry.register(app);
        }
        decisions.push(decision);
    }

    // Assert
    assert_eq!(
        decisions,
        vec![
            Registration::Canonical("camera".to_string()),
            Registration::Canonical("audio".to_string()),
            Registration::Alias("camera-rear".to_string()),
            Registration::Skipped,
        ]
    );
    assert_eq!(
        registry.keys().collect::<Vec<_>>(),
        vec!["audio", "camera", "camera-rear"]
    );
    assert_eq!(
        registry.get("camera-rear").map(|a| a.href.as_str()),
        Some("http://rig/api/applications/camera-rear")
    );
}

#[test]
fn test_detail_document_yields_invokable_specs() {
    let set = action_set_from_detail(&camera_detail());

    assert_eq!(set.len(), 3);

    let capture = &set["capture"];
    assert_eq!(capture.method, HttpMethod::Post);
    assert_eq!(capture.static_fields.len(), 1);

    let preview = &set["preview"];
    assert_eq!(preview.method, HttpMethod::Get);
    assert_eq!(preview.content_type, "image/png");

    // Blocked actions are exposed exactly like available ones.
    assert_eq!(set["calibrate"].method, HttpMethod::Post);
}

#[test]
fn test_capture_body_with_and_without_overrides() {
    let set = action_set_from_detail(&camera_detail());
    let capture = &set["capture"];

    assert_eq!(capture.request_body(&Map::new()), json!({"mode": "auto"}));

    let mut overrides = Map::new();
    overrides.insert("mode".to_string(), json!("manual"));
    overrides.insert("exposure".to_string(), json!(0.25));
    assert_eq!(
        capture.request_body(&overrides),
        json!({"mode": "manual", "exposure": 0.25})
    );
}

#[test]
fn test_alias_shares_action_set_allocation() {
    // The canonical and alias keys of one application hold the same Arc.
    let actions = Arc::new(action_set_from_detail(&camera_detail()));
    let list = application_list();
    let mut registry = ApplicationRegistry::new();

    registry.register(Application::from_link(&list.entities[0], Arc::default()).unwrap());
    registry.register(Application::from_link(&list.entities[2], Arc::clone(&actions)).unwrap());

    let aliased = registry.get("camera-rear").unwrap();
    assert!(Arc::ptr_eq(&aliased.actions, &actions));
}
