//! Per-session bookkeeping the room keeps alongside `RoomState`: identity,
//! idle tracking, and the input-queue slot, none of which belong on the
//! broadcast-facing [`crate::state::PlayerRecord`] itself.

use tokio::time::Instant;

use crate::input_queue::InputQueue;
use crate::types::{AccountId, CharacterId};

#[derive(Debug)]
pub struct SessionContext {
    pub account_id: AccountId,
    pub character_id: CharacterId,
    pub queue: InputQueue,
    /// Starts at `0` per spec §3; the first accepted input must carry
    /// `sequence_number >= 1`.
    pub last_processed_sequence_number: u64,
    pub last_input_at: Instant,
    pub idle_warned: bool,
}

impl SessionContext {
    pub fn new(account_id: AccountId, character_id: CharacterId, now: Instant) -> Self {
        Self {
            account_id,
            character_id,
            queue: InputQueue::new(),
            last_processed_sequence_number: 0,
            last_input_at: now,
            idle_warned: false,
        }
    }

    /// Record that a well-formed, known-session input arrived, resetting
    /// the idle timer regardless of whether the input was stale (spec §9:
    /// "any recognized input from a session resets its idle clock, even
    /// a rejected-as-stale one").
    pub fn note_activity(&mut self, now: Instant) {
        self.last_input_at = now;
        self.idle_warned = false;
    }

    pub fn idle_for(&self, now: Instant) -> std::time::Duration {
        now.saturating_duration_since(self.last_input_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn note_activity_resets_idle_warned() {
        let mut ctx = SessionContext::new(1, 1, Instant::now());
        ctx.idle_warned = true;
        tokio::time::advance(std::time::Duration::from_secs(5)).await;
        ctx.note_activity(Instant::now());
        assert!(!ctx.idle_warned);
        assert_eq!(ctx.idle_for(Instant::now()), std::time::Duration::ZERO);
    }
}
