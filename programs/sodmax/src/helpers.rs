use crate::constants::BASIS_POINTS;
use anchor_lang::prelude::*;

/// Source of uniform draws for the level-up roll. Injected into the accrual
/// path so tests can replay fixed sequences.
pub trait RollSource {
    /// One uniform draw in `[0, BASIS_POINTS)`.
    fn roll_bp(&mut self) -> u64;
}

/// xorshift64* generator, seeded per instruction from the clock and the
/// player key.
pub struct XorShiftRolls {
    state: u64,
}

impl XorShiftRolls {
    pub fn new(seed: u64) -> Self {
        // xorshift state must never be zero
        Self { state: seed | 1 }
    }

    pub fn from_clock(slot: u64, unix_timestamp: i64, player: &Pubkey) -> Self {
        let bytes = player.to_bytes();
        let mut key = [0u8; 8];
        key.copy_from_slice(&bytes[..8]);
        Self::new(slot ^ (unix_timestamp as u64).rotate_left(32) ^ u64::from_le_bytes(key))
    }

    fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }
}

impl RollSource for XorShiftRolls {
    fn roll_bp(&mut self) -> u64 {
        self.next() % BASIS_POINTS
    }
}

/// Whole ticks elapsed in `(last_settle, now]`.
pub fn elapsed_ticks(last_settle: i64, now: i64, tick_seconds: i64) -> u64 {
    if now <= last_settle || tick_seconds <= 0 {
        return 0;
    }
    ((now - last_settle) / tick_seconds) as u64
}

/// Of `ticks` ticks following `last_settle`, how many land strictly before
/// `boost_end`. A tick landing exactly at `boost_end` is unboosted, matching
/// the inclusive expiry boundary.
pub fn boosted_tick_split(last_settle: i64, ticks: u64, tick_seconds: i64, boost_end: i64) -> u64 {
    if boost_end <= last_settle || tick_seconds <= 0 {
        return 0;
    }
    let boosted = ((boost_end - last_settle - 1) / tick_seconds) as u64;
    boosted.min(ticks)
}
