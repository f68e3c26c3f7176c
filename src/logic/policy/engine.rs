//! Policy Evaluation
//!
//! Ordered fail-fast checks over one policy snapshot. Pure function: same
//! (identity, resource, policy, now) always yields the same decision.

use chrono::{DateTime, Utc};

use super::types::{AccessReason, Decision, Policy};

/// Evaluate one access attempt against a policy snapshot.
///
/// Check order is fixed: enablement, allowlist, time window. The first
/// failing check names the deny reason; later checks never run.
pub fn evaluate(
    identity_id: &str,
    resource_id: &str,
    policy: &Policy,
    now: DateTime<Utc>,
) -> Decision {
    if !policy.enabled {
        return Decision::deny(AccessReason::ResourceDisabled)
            .with_identity(identity_id)
            .with_resource(resource_id);
    }

    if !policy.allowed_identities.contains(identity_id) {
        return Decision::deny(AccessReason::IdentityNotAllowed)
            .with_identity(identity_id)
            .with_resource(resource_id);
    }

    if let Some(window) = &policy.time_window {
        let local = now.with_timezone(&window.offset()).time();
        if !window.contains(local) {
            return Decision::deny(AccessReason::OutsideAllowedTime)
                .with_identity(identity_id)
                .with_resource(resource_id);
        }
    }

    Decision::allow(identity_id, resource_id)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::policy::types::TimeWindow;
    use chrono::{NaiveTime, TimeZone};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, h, m, 0).unwrap()
    }

    fn day_policy() -> Policy {
        Policy::new("locker_01")
            .allow_identity("user_001")
            .with_time_window(TimeWindow::new(t(8, 0), t(18, 0), 0).unwrap())
    }

    #[test]
    fn test_disabled_resource_denied_first() {
        // disabled wins even for an allowed identity inside the window
        let decision = evaluate("user_001", "locker_01", &day_policy().disabled(), at(9, 0));
        assert_eq!(decision.reason, AccessReason::ResourceDisabled);
    }

    #[test]
    fn test_identity_not_allowed() {
        let decision = evaluate("user_999", "locker_01", &day_policy(), at(9, 0));
        assert_eq!(decision.reason, AccessReason::IdentityNotAllowed);
    }

    #[test]
    fn test_allowed_in_window() {
        let decision = evaluate("user_001", "locker_01", &day_policy(), at(9, 0));
        assert!(decision.is_allow());
        assert_eq!(decision.reason, AccessReason::AccessGranted);
        assert_eq!(decision.identity_id.as_deref(), Some("user_001"));
        assert_eq!(decision.resource_id.as_deref(), Some("locker_01"));
    }

    #[test]
    fn test_outside_window() {
        let decision = evaluate("user_001", "locker_01", &day_policy(), at(19, 0));
        assert_eq!(decision.reason, AccessReason::OutsideAllowedTime);
    }

    #[test]
    fn test_no_window_means_always_open() {
        let policy = Policy::new("locker_01").allow_identity("user_001");
        let decision = evaluate("user_001", "locker_01", &policy, at(3, 0));
        assert!(decision.is_allow());
    }

    #[test]
    fn test_window_respects_offset() {
        // 09:00 UTC is 16:00 at +07:00 - inside; 12:00 UTC is 19:00 - outside
        let policy = Policy::new("locker_01")
            .allow_identity("user_001")
            .with_time_window(TimeWindow::new(t(8, 0), t(18, 0), 7 * 60).unwrap());

        assert!(evaluate("user_001", "locker_01", &policy, at(9, 0)).is_allow());
        assert_eq!(
            evaluate("user_001", "locker_01", &policy, at(12, 0)).reason,
            AccessReason::OutsideAllowedTime
        );
    }

    #[test]
    fn test_overnight_window() {
        let policy = Policy::new("locker_01")
            .allow_identity("user_001")
            .with_time_window(TimeWindow::new(t(22, 0), t(6, 0), 0).unwrap());

        assert!(evaluate("user_001", "locker_01", &policy, at(23, 0)).is_allow());
        assert!(evaluate("user_001", "locker_01", &policy, at(5, 0)).is_allow());
        assert_eq!(
            evaluate("user_001", "locker_01", &policy, at(12, 0)).reason,
            AccessReason::OutsideAllowedTime
        );
    }

    #[test]
    fn test_deterministic() {
        let policy = day_policy();
        let now = at(9, 0);
        let first = evaluate("user_001", "locker_01", &policy, now);
        for _ in 0..10 {
            assert_eq!(first, evaluate("user_001", "locker_01", &policy, now));
        }
    }
}
