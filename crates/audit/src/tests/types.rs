// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{Action, Actor, AuditEvent, Cause, EntityRef, StateSnapshot};

fn create_test_event() -> AuditEvent {
    AuditEvent::new(
        Actor::new(String::from("operator-7"), String::from("operator")),
        Cause::new(String::from("req-456"), String::from("Onboarding")),
        Action::new(
            String::from("CreateAssignment"),
            Some(String::from("user 3 -> software 9")),
        ),
        EntityRef::new("license_assignment", 11),
        StateSnapshot::empty(),
        StateSnapshot::new(String::from("{\"assignment_id\":11}")),
    )
}

#[test]
fn test_actor_creation_requires_all_fields() {
    let actor: Actor = Actor::new(String::from("operator-7"), String::from("operator"));

    assert_eq!(actor.id, "operator-7");
    assert_eq!(actor.actor_type, "operator");
}

#[test]
fn test_system_actor() {
    let actor: Actor = Actor::system("directory-sync");

    assert_eq!(actor.id, "directory-sync");
    assert_eq!(actor.actor_type, "system");
}

#[test]
fn test_action_creation_with_details() {
    let action: Action = Action::new(
        String::from("DeleteAssignments"),
        Some(String::from("3 assignments")),
    );

    assert_eq!(action.name, "DeleteAssignments");
    assert_eq!(action.details, Some(String::from("3 assignments")));
}

#[test]
fn test_empty_snapshot_marks_missing_entity() {
    assert!(StateSnapshot::empty().is_empty());
    assert!(!StateSnapshot::new(String::from("{}")).is_empty());
}

#[test]
fn test_entity_ref_many_has_no_id() {
    let target: EntityRef = EntityRef::many("license_assignment");

    assert_eq!(target.entity_type, "license_assignment");
    assert_eq!(target.entity_id, None);
}

#[test]
fn test_new_event_is_not_persisted() {
    let event: AuditEvent = create_test_event();

    assert_eq!(event.event_id, None);
    assert_eq!(event.created_at, None);
    assert!(event.before.is_empty());
}

#[test]
fn test_with_id_keeps_payload() {
    let event: AuditEvent = create_test_event();
    let stored: AuditEvent = event
        .clone()
        .with_id(99, Some(String::from("2026-05-04 09:00:00")));

    assert_eq!(stored.event_id, Some(99));
    assert_eq!(stored.actor, event.actor);
    assert_eq!(stored.action, event.action);
    assert_eq!(stored.target, event.target);
    assert_eq!(stored.after, event.after);
}

#[test]
fn test_audit_event_serializes_to_json() {
    let event: AuditEvent = create_test_event();
    let json: String = serde_json::to_string(&event).unwrap();
    let back: AuditEvent = serde_json::from_str(&json).unwrap();

    assert_eq!(back, event);
}
