use anchor_lang::prelude::*;

use crate::{constants::*, errors::GameError, helpers::*};

#[account]
pub struct GameConfig {
    /* ── governance ─────────────────────────────── */
    pub authority: Pubkey,    // Governance authority
    pub mining_enabled: bool, // Global kill-switch

    /* ── gameplay stats ─────────────────────────── */
    pub total_players: u64,
    pub total_sod_mined: u64,      // Σ SOD credited across all players
    pub total_usdt_converted: u64, // Σ USDT units minted via conversion cycles
    pub total_usdt_claimed: u64,   // Σ USDT units claimed back into SOD
    pub total_referrals: u64,
}

#[account]
pub struct Player {
    pub owner: Pubkey,

    /* ── balances ───────────────────────────────── */
    pub sod_balance: u64,
    pub usdt_balance: u64,  // 4dp fixed point, USDT_SCALE units per 1 USDT
    pub usdt_progress: u64, // SOD accrued toward the next conversion cycle

    /* ── mining ─────────────────────────────────── */
    pub mining_power: u64,
    pub user_level: u32,
    pub total_mined: u64,
    pub today_earnings: u64,

    /* ── boost ──────────────────────────────────── */
    pub boost_active: bool,
    pub boost_end_time: i64, // unix seconds, meaningful only while boost_active

    /* ── auto-mining ────────────────────────────── */
    pub auto_mining_enabled: bool,
    pub last_auto_settle: i64, // settlement cursor, advances by whole ticks

    /* ── referrals ──────────────────────────────── */
    pub referrer: Option<Pubkey>,
    pub referral_count: u32,

    pub created_at: i64,
}

/// What a single accrual moved, for event emission and global bookkeeping.
#[derive(Debug, Default, Clone, Copy)]
pub struct AccrualOutcome {
    pub credited: u64,      // SOD added to the balance
    pub cycles: u64,        // conversion cycles completed
    pub usdt_credited: u64, // USDT units minted by those cycles
    pub levels_gained: u32,
}

impl Player {
    /// Fixed starting values at account creation.
    pub fn initialize(&mut self, owner: Pubkey, referrer: Option<Pubkey>, now: i64) {
        self.owner = owner;
        self.sod_balance = INITIAL_SOD_BALANCE;
        self.usdt_balance = 0;
        self.usdt_progress = 0;
        self.mining_power = BASE_MINING_POWER;
        self.user_level = 1;
        self.total_mined = INITIAL_SOD_BALANCE;
        self.today_earnings = 0;
        self.boost_active = false;
        self.boost_end_time = 0;
        self.auto_mining_enabled = false;
        self.last_auto_settle = now;
        self.referrer = referrer;
        self.referral_count = 0;
        self.created_at = now;
    }

    /// SOD earned by one click: `mining_power`, tripled while a boost is
    /// active. Callers must have expired a due boost first.
    pub fn click_reward(&self) -> u64 {
        let multiplier = if self.boost_active { BOOST_MULTIPLIER } else { 1 };
        self.mining_power.saturating_mul(multiplier)
    }

    /// Credits `amount` SOD and runs the conversion check: every
    /// CONVERSION_THRESHOLD of accumulated progress becomes CONVERSION_REWARD
    /// USDT units, with one independent level-up roll per completed cycle.
    /// A single large credit can complete several cycles.
    pub fn record_earnings(
        &mut self,
        amount: u64,
        rolls: &mut impl RollSource,
    ) -> Result<AccrualOutcome> {
        require!(amount > 0, GameError::InvalidAmount);

        self.sod_balance = self
            .sod_balance
            .checked_add(amount)
            .ok_or(GameError::MathOverflow)?;
        self.total_mined = self
            .total_mined
            .checked_add(amount)
            .ok_or(GameError::MathOverflow)?;
        self.today_earnings = self
            .today_earnings
            .checked_add(amount)
            .ok_or(GameError::MathOverflow)?;
        self.usdt_progress = self
            .usdt_progress
            .checked_add(amount)
            .ok_or(GameError::MathOverflow)?;

        let mut outcome = AccrualOutcome {
            credited: amount,
            ..AccrualOutcome::default()
        };

        while self.usdt_progress >= CONVERSION_THRESHOLD {
            self.usdt_progress -= CONVERSION_THRESHOLD;
            self.usdt_balance = self
                .usdt_balance
                .checked_add(CONVERSION_REWARD)
                .ok_or(GameError::MathOverflow)?;
            outcome.cycles += 1;
            outcome.usdt_credited += CONVERSION_REWARD;

            if rolls.roll_bp() < LEVEL_UP_CHANCE_BP {
                self.user_level = self
                    .user_level
                    .checked_add(1)
                    .ok_or(GameError::MathOverflow)?;
                self.mining_power = BASE_MINING_POWER
                    .checked_mul(self.user_level as u64)
                    .ok_or(GameError::MathOverflow)?;
                outcome.levels_gained += 1;
            }
        }

        Ok(outcome)
    }

    /// Claims the whole USDT balance, destroying SOD at CLAIM_RATE per
    /// 1 USDT. No partial claims. Returns `(usdt_claimed, sod_cost)`.
    pub fn claim_usdt(&mut self) -> Result<(u64, u64)> {
        require!(self.usdt_balance > 0, GameError::NothingToClaim);

        let cost = (self.usdt_balance as u128)
            .checked_mul(CLAIM_RATE as u128)
            .ok_or(GameError::MathOverflow)?
            / USDT_SCALE as u128;
        let sod_cost = u64::try_from(cost).map_err(|_| GameError::MathOverflow)?;
        require!(self.sod_balance >= sod_cost, GameError::InsufficientBalance);

        let usdt_claimed = self.usdt_balance;
        self.usdt_balance = 0;
        self.sod_balance -= sod_cost;

        Ok((usdt_claimed, sod_cost))
    }

    /// Credits a catalog bundle to the balance. The credit counts as mined
    /// but does not feed the conversion cycle. Returns `(base_sod, bonus_sod)`.
    pub fn purchase_bundle(&mut self, bundle_id: u8) -> Result<(u64, u64)> {
        let (base_sod, bonus_sod) =
            get_bundle_by_id(bundle_id).ok_or(GameError::UnknownBundle)?;
        let credit = base_sod
            .checked_add(bonus_sod)
            .ok_or(GameError::MathOverflow)?;

        self.sod_balance = self
            .sod_balance
            .checked_add(credit)
            .ok_or(GameError::MathOverflow)?;
        self.total_mined = self
            .total_mined
            .checked_add(credit)
            .ok_or(GameError::MathOverflow)?;

        Ok((base_sod, bonus_sod))
    }

    /// Debits BOOST_COST and opens (or extends) a boost window ending at
    /// `now + BOOST_DURATION_SECONDS`. Re-activation replaces the end time,
    /// it never stacks the multiplier. Returns the new end time.
    pub fn activate_boost(&mut self, now: i64) -> Result<i64> {
        require!(
            self.sod_balance >= BOOST_COST,
            GameError::InsufficientBalance
        );

        self.sod_balance -= BOOST_COST;
        self.boost_active = true;
        self.boost_end_time = now
            .checked_add(BOOST_DURATION_SECONDS)
            .ok_or(GameError::MathOverflow)?;

        Ok(self.boost_end_time)
    }

    /// Deactivates an elapsed boost. Inclusive boundary: a boost is over the
    /// instant `now == boost_end_time`. Idempotent; `boost_end_time` is left
    /// as-is. Returns whether a transition happened.
    pub fn expire_boost_if_due(&mut self, now: i64) -> bool {
        if self.boost_active && now >= self.boost_end_time {
            self.boost_active = false;
            return true;
        }
        false
    }

    /// Enabling requires AUTO_MINE_MIN_BALANCE and resets the settlement
    /// cursor to `now`; disabling is unconditional.
    pub fn set_auto_mining(&mut self, enable: bool, now: i64) -> Result<()> {
        if enable {
            require!(
                self.sod_balance >= AUTO_MINE_MIN_BALANCE,
                GameError::InsufficientBalance
            );
            self.auto_mining_enabled = true;
            self.last_auto_settle = now;
        } else {
            self.auto_mining_enabled = false;
        }
        Ok(())
    }

    /// Credits all whole auto-mining ticks elapsed since the last settlement,
    /// in bulk through `record_earnings`. Ticks landing strictly before
    /// `boost_end_time` earn the boosted rate; the fractional remainder of
    /// the window carries over. Returns `(ticks, outcome)`.
    pub fn settle_auto_mining(
        &mut self,
        now: i64,
        rolls: &mut impl RollSource,
    ) -> Result<(u64, AccrualOutcome)> {
        if !self.auto_mining_enabled {
            return Ok((0, AccrualOutcome::default()));
        }
        let ticks = elapsed_ticks(self.last_auto_settle, now, AUTO_MINE_TICK_SECONDS);
        if ticks == 0 {
            return Ok((0, AccrualOutcome::default()));
        }

        let boosted = if self.boost_active {
            boosted_tick_split(
                self.last_auto_settle,
                ticks,
                AUTO_MINE_TICK_SECONDS,
                self.boost_end_time,
            )
        } else {
            0
        };
        let unboosted = ticks - boosted;

        let tick_base = self.mining_power / AUTO_MINE_POWER_DIVISOR;
        let credit = tick_base
            .checked_mul(
                boosted
                    .checked_mul(BOOST_MULTIPLIER)
                    .ok_or(GameError::MathOverflow)?
                    .checked_add(unboosted)
                    .ok_or(GameError::MathOverflow)?,
            )
            .ok_or(GameError::MathOverflow)?;

        self.last_auto_settle = self
            .last_auto_settle
            .checked_add((ticks as i64) * AUTO_MINE_TICK_SECONDS)
            .ok_or(GameError::MathOverflow)?;

        if credit == 0 {
            return Ok((ticks, AccrualOutcome::default()));
        }

        let outcome = self.record_earnings(credit, rolls)?;
        Ok((ticks, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays a fixed roll sequence and panics if the engine draws more
    /// rolls than the test provided.
    struct SeqRolls {
        values: Vec<u64>,
        cursor: usize,
    }

    impl SeqRolls {
        fn new(values: &[u64]) -> Self {
            Self {
                values: values.to_vec(),
                cursor: 0,
            }
        }

        fn drawn(&self) -> usize {
            self.cursor
        }
    }

    impl RollSource for SeqRolls {
        fn roll_bp(&mut self) -> u64 {
            let value = self.values[self.cursor];
            self.cursor += 1;
            value
        }
    }

    /// All rolls miss the level-up chance.
    fn no_levels() -> SeqRolls {
        SeqRolls::new(&[BASIS_POINTS - 1; 64])
    }

    fn fresh_player(now: i64) -> Player {
        let mut player = Player {
            owner: Pubkey::default(),
            sod_balance: 0,
            usdt_balance: 0,
            usdt_progress: 0,
            mining_power: 0,
            user_level: 0,
            total_mined: 0,
            today_earnings: 0,
            boost_active: false,
            boost_end_time: 0,
            auto_mining_enabled: false,
            last_auto_settle: 0,
            referrer: None,
            referral_count: 0,
            created_at: 0,
        };
        player.initialize(Pubkey::new_unique(), None, now);
        player
    }

    #[test]
    fn initial_state_matches_signup_grant() {
        let player = fresh_player(1_000);
        assert_eq!(player.sod_balance, 1_000_000);
        assert_eq!(player.total_mined, 1_000_000);
        assert_eq!(player.mining_power, 10);
        assert_eq!(player.user_level, 1);
        assert_eq!(player.usdt_balance, 0);
        assert_eq!(player.usdt_progress, 0);
        assert_eq!(player.today_earnings, 0);
        assert!(!player.boost_active);
        assert!(!player.auto_mining_enabled);
        assert_eq!(player.last_auto_settle, 1_000);
        assert_eq!(player.created_at, 1_000);
    }

    #[test]
    fn record_earnings_rejects_zero() {
        let mut player = fresh_player(0);
        let before = player.clone();
        let err = player.record_earnings(0, &mut no_levels()).unwrap_err();
        assert_eq!(err, GameError::InvalidAmount.into());
        assert_eq!(player.sod_balance, before.sod_balance);
        assert_eq!(player.usdt_progress, before.usdt_progress);
        assert_eq!(player.total_mined, before.total_mined);
    }

    #[test]
    fn progress_stays_below_threshold() {
        for amount in [1, 9_999_999, 10_000_000, 25_000_000, 123_456_789] {
            let mut player = fresh_player(0);
            player.record_earnings(amount, &mut no_levels()).unwrap();
            assert!(
                player.usdt_progress < CONVERSION_THRESHOLD,
                "progress {} after crediting {}",
                player.usdt_progress,
                amount
            );
        }
    }

    #[test]
    fn single_cycle_credits_one_usdt_cent() {
        let mut player = fresh_player(0);
        let outcome = player
            .record_earnings(10_000_000, &mut no_levels())
            .unwrap();
        assert_eq!(outcome.cycles, 1);
        assert_eq!(player.usdt_balance, 100); // 0.01 USDT
        assert_eq!(player.usdt_progress, 0);
    }

    #[test]
    fn bulk_credit_rolls_once_per_cycle() {
        let mut player = fresh_player(0);
        // first roll wins, second misses; straddles the 1_500 bp chance
        let mut rolls = SeqRolls::new(&[LEVEL_UP_CHANCE_BP - 1, LEVEL_UP_CHANCE_BP]);
        let outcome = player.record_earnings(25_000_000, &mut rolls).unwrap();

        assert_eq!(rolls.drawn(), 2);
        assert_eq!(outcome.cycles, 2);
        assert_eq!(outcome.usdt_credited, 200);
        assert_eq!(outcome.levels_gained, 1);
        assert_eq!(player.usdt_balance, 200);
        assert_eq!(player.usdt_progress, 5_000_000);
        assert_eq!(player.user_level, 2);
        assert_eq!(player.mining_power, 20);
    }

    #[test]
    fn total_mined_is_monotonic() {
        let mut player = fresh_player(0);
        let mut last = player.total_mined;

        player.record_earnings(123, &mut no_levels()).unwrap();
        assert!(player.total_mined >= last);
        last = player.total_mined;

        player.purchase_bundle(1).unwrap();
        assert!(player.total_mined >= last);
        last = player.total_mined;

        player.activate_boost(0).unwrap();
        assert!(player.total_mined >= last);
        last = player.total_mined;

        player.record_earnings(30_000_000, &mut no_levels()).unwrap();
        player.claim_usdt().unwrap();
        assert!(player.total_mined >= last);
    }

    #[test]
    fn claim_needs_exact_sod_cost() {
        let mut player = fresh_player(0);
        player.usdt_balance = 200; // 0.02 USDT, costs exactly 20_000_000 SOD
        player.sod_balance = 19_999_999;

        let err = player.claim_usdt().unwrap_err();
        assert_eq!(err, GameError::InsufficientBalance.into());
        assert_eq!(player.usdt_balance, 200);
        assert_eq!(player.sod_balance, 19_999_999);

        player.sod_balance = 20_000_000;
        let (usdt_claimed, sod_cost) = player.claim_usdt().unwrap();
        assert_eq!(usdt_claimed, 200);
        assert_eq!(sod_cost, 20_000_000);
        assert_eq!(player.usdt_balance, 0);
        assert_eq!(player.sod_balance, 0);
    }

    #[test]
    fn claim_with_no_usdt_fails() {
        let mut player = fresh_player(0);
        let err = player.claim_usdt().unwrap_err();
        assert_eq!(err, GameError::NothingToClaim.into());
    }

    #[test]
    fn bundle_two_credits_thirty_three_million() {
        let mut player = fresh_player(0);
        let sod_before = player.sod_balance;
        let mined_before = player.total_mined;

        let (base_sod, bonus_sod) = player.purchase_bundle(2).unwrap();
        assert_eq!(base_sod + bonus_sod, 33_000_000);
        assert_eq!(player.sod_balance, sod_before + 33_000_000);
        assert_eq!(player.total_mined, mined_before + 33_000_000);
        // bundles do not feed the conversion cycle
        assert_eq!(player.usdt_progress, 0);
    }

    #[test]
    fn unknown_bundle_is_rejected() {
        let mut player = fresh_player(0);
        for id in [0, 5, 255] {
            let err = player.purchase_bundle(id).unwrap_err();
            assert_eq!(err, GameError::UnknownBundle.into());
        }
    }

    #[test]
    fn boost_requires_full_cost() {
        let mut player = fresh_player(0);
        player.sod_balance = 4_999;
        let err = player.activate_boost(100).unwrap_err();
        assert_eq!(err, GameError::InsufficientBalance.into());
        assert!(!player.boost_active);
        assert_eq!(player.sod_balance, 4_999);

        player.sod_balance = 5_000;
        let end_time = player.activate_boost(100).unwrap();
        assert_eq!(player.sod_balance, 0);
        assert!(player.boost_active);
        assert_eq!(end_time, 100 + BOOST_DURATION_SECONDS);
    }

    #[test]
    fn boost_reactivation_replaces_end_time() {
        let mut player = fresh_player(0);
        player.sod_balance = 10_000;
        let first = player.activate_boost(100).unwrap();
        let second = player.activate_boost(700).unwrap();
        assert_eq!(second, 700 + BOOST_DURATION_SECONDS);
        assert!(second > first);
        assert!(player.boost_active);
    }

    #[test]
    fn boost_cost_never_counts_as_mined() {
        let mut player = fresh_player(0);
        let mined_before = player.total_mined;
        player.activate_boost(0).unwrap();
        assert_eq!(player.total_mined, mined_before);
    }

    #[test]
    fn boost_expiry_is_inclusive_and_idempotent() {
        let mut player = fresh_player(0);
        player.activate_boost(100).unwrap();
        let end_time = player.boost_end_time;

        assert!(!player.expire_boost_if_due(end_time - 1));
        assert!(player.boost_active);

        assert!(player.expire_boost_if_due(end_time));
        assert!(!player.boost_active);

        let snapshot = player.clone();
        assert!(!player.expire_boost_if_due(end_time));
        assert_eq!(player.sod_balance, snapshot.sod_balance);
        assert_eq!(player.boost_active, snapshot.boost_active);
        assert_eq!(player.boost_end_time, snapshot.boost_end_time);
    }

    #[test]
    fn click_reward_triples_under_boost() {
        let mut player = fresh_player(0);
        assert_eq!(player.click_reward(), 10);
        player.activate_boost(0).unwrap();
        assert_eq!(player.click_reward(), 30);
        player.expire_boost_if_due(player.boost_end_time);
        assert_eq!(player.click_reward(), 10);
    }

    #[test]
    fn auto_mining_enable_guard() {
        let mut player = fresh_player(50);
        player.sod_balance = AUTO_MINE_MIN_BALANCE - 1;
        let err = player.set_auto_mining(true, 60).unwrap_err();
        assert_eq!(err, GameError::InsufficientBalance.into());
        assert!(!player.auto_mining_enabled);

        player.sod_balance = AUTO_MINE_MIN_BALANCE;
        player.set_auto_mining(true, 60).unwrap();
        assert!(player.auto_mining_enabled);
        assert_eq!(player.last_auto_settle, 60);

        player.sod_balance = 0;
        player.set_auto_mining(false, 70).unwrap();
        assert!(!player.auto_mining_enabled);
    }

    #[test]
    fn settle_is_a_noop_while_disabled() {
        let mut player = fresh_player(0);
        let (ticks, outcome) = player
            .settle_auto_mining(1_000, &mut no_levels())
            .unwrap();
        assert_eq!(ticks, 0);
        assert_eq!(outcome.credited, 0);
        assert_eq!(player.last_auto_settle, 0);
    }

    #[test]
    fn settle_credits_whole_ticks_and_keeps_remainder() {
        let mut player = fresh_player(100);
        player.set_auto_mining(true, 100).unwrap();

        // 10 whole ticks at mining_power 10 => 5 SOD each
        let (ticks, outcome) = player.settle_auto_mining(110, &mut no_levels()).unwrap();
        assert_eq!(ticks, 10);
        assert_eq!(outcome.credited, 50);
        assert_eq!(player.last_auto_settle, 110);

        // no full tick yet
        let (ticks, _) = player.settle_auto_mining(110, &mut no_levels()).unwrap();
        assert_eq!(ticks, 0);
        assert_eq!(player.last_auto_settle, 110);
    }

    #[test]
    fn settle_splits_ticks_around_boost_end() {
        let mut player = fresh_player(0);
        player.sod_balance = AUTO_MINE_MIN_BALANCE + BOOST_COST;
        player.set_auto_mining(true, 0).unwrap();
        player.activate_boost(0).unwrap();
        player.boost_end_time = 5; // shrink the window for the test

        // ticks at 1..=10; 1..=4 boosted, the tick at 5 and later unboosted
        let (ticks, outcome) = player.settle_auto_mining(10, &mut no_levels()).unwrap();
        assert_eq!(ticks, 10);
        assert_eq!(outcome.credited, 5 * (4 * 3 + 6));

        // expiry then runs on the synced clock
        assert!(player.expire_boost_if_due(10));
    }

    #[test]
    fn settle_feeds_conversion_cycles() {
        let mut player = fresh_player(0);
        player.sod_balance = AUTO_MINE_MIN_BALANCE;
        player.mining_power = 4_000_000; // tick reward 2_000_000
        player.set_auto_mining(true, 0).unwrap();

        let (ticks, outcome) = player.settle_auto_mining(6, &mut no_levels()).unwrap();
        assert_eq!(ticks, 6);
        assert_eq!(outcome.credited, 12_000_000);
        assert_eq!(outcome.cycles, 1);
        assert_eq!(player.usdt_balance, 100);
        assert_eq!(player.usdt_progress, 2_000_000);
    }
}
