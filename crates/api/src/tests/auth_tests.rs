// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{ActorKind, ApiError, AuthError, AuthenticatedActor};

#[test]
fn test_operator_id_is_trimmed() {
    let actor = AuthenticatedActor::operator("  jdoe ").unwrap();

    assert_eq!(actor.id, "jdoe");
    assert_eq!(actor.kind, ActorKind::Operator);
}

#[test]
fn test_blank_operator_is_rejected() {
    let result = AuthenticatedActor::operator("   ");

    assert!(matches!(
        result,
        Err(AuthError::AuthenticationFailed { .. })
    ));
    let api_error: ApiError = result.unwrap_err().into();
    assert!(matches!(api_error, ApiError::AuthenticationFailed { .. }));
}

#[test]
fn test_audit_actor_names_the_kind() {
    let operator = AuthenticatedActor::operator("jdoe").unwrap().to_audit_actor();
    let job = AuthenticatedActor::system("nightly-report").to_audit_actor();

    assert_eq!(operator.actor_type, "operator");
    assert_eq!(job.id, "nightly-report");
    assert_eq!(job.actor_type, "system");
}
