//! Input validation: the single gate every inbound `InputCmd` passes
//! through before it is allowed into a session's [`InputQueue`].
//!
//! Pure and total, mirroring the movement evaluator's discipline: no
//! state, no I/O, no panics. The caller decides what to do with a
//! [`RejectReason`] (closing the socket is not this module's job).

use tile_room_sim::Direction;

/// A validated, queueable input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputMessage {
    pub sequence_number: u64,
    pub direction: Direction,
}

/// Why an inbound input was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The wire direction did not decode to a known [`Direction`].
    Malformed,
    /// The session has no corresponding player record in room state.
    NoPlayer,
    /// `sequence_number` is not strictly greater than the session's last
    /// processed sequence number. Still a valid, known session, so the
    /// idle timer still resets (spec §9).
    Stale {
        sequence_number: u64,
        last_processed: u64,
    },
}

/// The result of validating one inbound input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accepted(InputMessage),
    Rejected(RejectReason),
}

/// Validate one inbound input against the session's last processed
/// sequence number, per spec §4.2.
///
/// `direction` is `None` when the wire message failed to decode to a
/// known [`Direction`] (an out-of-range `WireDirection` value).
/// `last_processed` is the session's `lastProcessedSequenceNumber`, which
/// starts at `0` for a fresh session (spec §3) — so a fresh session's
/// first input must carry `sequence_number >= 1` to be accepted.
pub fn validate_input(
    has_player: bool,
    sequence_number: u64,
    direction: Option<Direction>,
    last_processed: u64,
) -> ValidationOutcome {
    let Some(direction) = direction else {
        return ValidationOutcome::Rejected(RejectReason::Malformed);
    };
    // A sequence number must be a positive integer (spec §3/§6); `0` is
    // malformed, not merely stale.
    if sequence_number == 0 {
        return ValidationOutcome::Rejected(RejectReason::Malformed);
    }
    if !has_player {
        return ValidationOutcome::Rejected(RejectReason::NoPlayer);
    }
    if sequence_number <= last_processed {
        return ValidationOutcome::Rejected(RejectReason::Stale {
            sequence_number,
            last_processed,
        });
    }
    ValidationOutcome::Accepted(InputMessage {
        sequence_number,
        direction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_first_input_with_no_prior_sequence() {
        let outcome = validate_input(true, 1, Some(Direction::Up), 0);
        assert_eq!(
            outcome,
            ValidationOutcome::Accepted(InputMessage {
                sequence_number: 1,
                direction: Direction::Up
            })
        );
    }

    #[test]
    fn accepts_strictly_increasing_sequence() {
        let outcome = validate_input(true, 6, Some(Direction::Left), 5);
        assert!(matches!(outcome, ValidationOutcome::Accepted(_)));
    }

    #[test]
    fn rejects_equal_sequence_as_stale() {
        let outcome = validate_input(true, 5, Some(Direction::Left), 5);
        assert_eq!(
            outcome,
            ValidationOutcome::Rejected(RejectReason::Stale {
                sequence_number: 5,
                last_processed: 5
            })
        );
    }

    #[test]
    fn rejects_lower_sequence_as_stale() {
        let outcome = validate_input(true, 3, Some(Direction::Left), 5);
        assert_eq!(
            outcome,
            ValidationOutcome::Rejected(RejectReason::Stale {
                sequence_number: 3,
                last_processed: 5
            })
        );
    }

    #[test]
    fn rejects_zero_sequence_number_as_malformed() {
        // Zero is stale against a fresh session's `lastProcessedSequenceNumber
        // == 0` too, but the spec calls out `sequenceNumber <= 0` as
        // malformed specifically, not merely stale.
        let outcome = validate_input(true, 0, Some(Direction::Up), 0);
        assert_eq!(outcome, ValidationOutcome::Rejected(RejectReason::Malformed));
    }

    #[test]
    fn rejects_malformed_direction_before_checking_player() {
        let outcome = validate_input(false, 1, None, 0);
        assert_eq!(outcome, ValidationOutcome::Rejected(RejectReason::Malformed));
    }

    #[test]
    fn rejects_unknown_session() {
        let outcome = validate_input(false, 1, Some(Direction::Down), 0);
        assert_eq!(outcome, ValidationOutcome::Rejected(RejectReason::NoPlayer));
    }
}
