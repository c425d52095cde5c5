//! Property-based tests for interval inference using proptest.
//!
//! These tests check the algebraic invariants of the relation inference:
//!
//! - Swapping two bounded intervals yields the inverse relation for the
//!   before/after, during/contains, starts/started_by and
//!   finishes/finished_by pairs
//! - Every interval equals itself
//! - Inference never fails when both starts are known

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::catalog::TemporalRelation;
    use crate::graph::{Node, TemporalSpan};
    use crate::temporal::interval::{infer_between, infer_relation};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn instant(hours: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hours)
    }

    // Small ranges so equal endpoints come up often
    fn bounded() -> impl Strategy<Value = (DateTime<Utc>, DateTime<Utc>)> {
        (0i64..24, 0i64..12).prop_map(|(start, len)| (instant(start), instant(start + len)))
    }

    fn maybe_ongoing() -> impl Strategy<Value = (DateTime<Utc>, Option<DateTime<Utc>>)> {
        (0i64..24, prop::option::of(0i64..12))
            .prop_map(|(start, len)| (instant(start), len.map(|l| instant(start + l))))
    }

    fn has_paired_inverse(relation: TemporalRelation) -> bool {
        use TemporalRelation::*;
        matches!(
            relation,
            Before | After | During | Contains | Starts | StartedBy | Finishes | FinishedBy
        )
    }

    proptest! {
        /// Swapping bounded intervals inverts the paired relations.
        #[test]
        fn swapped_bounded_intervals_invert(a in bounded(), b in bounded()) {
            let forward = infer_relation(a.0, Some(a.1), b.0, Some(b.1));
            let backward = infer_relation(b.0, Some(b.1), a.0, Some(a.1));
            if has_paired_inverse(forward) {
                prop_assert_eq!(backward, forward.inverse(), "{:?} vs {:?}", a, b);
            }
        }

        /// An interval always equals itself.
        #[test]
        fn interval_equals_itself(a in maybe_ongoing()) {
            prop_assert_eq!(infer_relation(a.0, a.1, a.0, a.1), TemporalRelation::Equals);
        }

        /// Inference is total once both starts are known, and never yields
        /// the relations it leaves to explicit callers.
        #[test]
        fn inference_is_total(a in maybe_ongoing(), b in maybe_ongoing()) {
            let left = Node::temporal("event", TemporalSpan { start: Some(a.0), end: a.1, duration_secs: None, precision: Default::default() });
            let right = Node::temporal("event", TemporalSpan { start: Some(b.0), end: b.1, duration_secs: None, precision: Default::default() });

            let relation = infer_between(&left, &right);
            prop_assert!(relation.is_ok());
            let relation = relation.unwrap();
            prop_assert!(relation != TemporalRelation::MetBy);
            prop_assert!(relation != TemporalRelation::OverlappedBy);
        }

        /// A missing start is always reported, never guessed.
        #[test]
        fn missing_start_is_ambiguous(b in maybe_ongoing()) {
            let left = Node::temporal("event", TemporalSpan::unanchored());
            let right = Node::temporal("event", TemporalSpan::starting(b.0));
            prop_assert!(infer_between(&left, &right).is_err());
            prop_assert!(infer_between(&right, &left).is_err());
        }
    }
}
