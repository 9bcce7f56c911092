use anchor_lang::prelude::*;

use crate::{constants::*, errors::GameError, helpers::*, state::*};

/// ────────────────────────────────────────────────────────────────────────────
/// INTERNAL: settle pending auto-mining time, then expire a due boost
/// ────────────────────────────────────────────────────────────────────────────
/// Every player-facing handler runs this before its own operation so the
/// boost multiplier is never applied past its end time and idle time is
/// credited on whatever instruction touches the account first.
fn sync_player(
    player: &mut Player,
    config: &mut GameConfig,
    now: i64,
    rolls: &mut impl RollSource,
) -> Result<()> {
    let (ticks, outcome) = player.settle_auto_mining(now, rolls)?;
    if outcome.credited > 0 {
        apply_accrual(config, &outcome);
        emit!(AutoMineSettled {
            player: player.owner,
            ticks,
            amount: outcome.credited,
            timestamp: now,
        });
        emit_conversion_events(player, &outcome, now);
    }
    if player.expire_boost_if_due(now) {
        emit!(BoostExpired {
            player: player.owner,
            timestamp: now,
        });
    }
    Ok(())
}

fn apply_accrual(config: &mut GameConfig, outcome: &AccrualOutcome) {
    config.total_sod_mined = config.total_sod_mined.saturating_add(outcome.credited);
    config.total_usdt_converted = config
        .total_usdt_converted
        .saturating_add(outcome.usdt_credited);
}

fn emit_conversion_events(player: &Player, outcome: &AccrualOutcome, now: i64) {
    if outcome.cycles > 0 {
        emit!(UsdtConverted {
            player: player.owner,
            cycles: outcome.cycles,
            usdt_amount: outcome.usdt_credited,
            timestamp: now,
        });
    }
    if outcome.levels_gained > 0 {
        emit!(LevelUp {
            player: player.owner,
            new_level: player.user_level,
            mining_power: player.mining_power,
            timestamp: now,
        });
    }
}

fn roll_source(player_key: &Pubkey) -> Result<XorShiftRolls> {
    let clock = Clock::get()?;
    Ok(XorShiftRolls::from_clock(
        clock.slot,
        clock.unix_timestamp,
        player_key,
    ))
}

/* ──────────────────────────
INITIALIZE
────────────────────────── */
#[derive(Accounts)]
pub struct InitializeConfig<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,
    #[account(
        init,
        payer = authority,
        space = 8  /* discriminator */
        + 32       /* authority */
        + 1        /* mining_enabled */
        + 8 + 8    /* total_players + total_sod_mined */
        + 8 + 8    /* total_usdt_converted + total_usdt_claimed */
        + 8,       /* total_referrals */
        seeds = [CONFIG_SEED],
        bump
    )]
    pub config: Account<'info, GameConfig>,
    pub system_program: Program<'info, System>,
}

pub fn initialize(ctx: Context<InitializeConfig>) -> Result<()> {
    let config = &mut ctx.accounts.config;

    config.authority = ctx.accounts.authority.key();
    config.mining_enabled = true;
    config.total_players = 0;
    config.total_sod_mined = 0;
    config.total_usdt_converted = 0;
    config.total_usdt_claimed = 0;
    config.total_referrals = 0;

    Ok(())
}

/// ────────────────────────────────────────────────────────────────────────────
///  TOGGLE MINING (admin kill-switch)
/// ────────────────────────────────────────────────────────────────────────────
#[derive(Accounts)]
pub struct ToggleMining<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,
    #[account(
        mut,
        has_one = authority @ GameError::Unauthorized
    )]
    pub config: Account<'info, GameConfig>,
}

pub fn toggle_mining(ctx: Context<ToggleMining>, enable: bool) -> Result<()> {
    let config = &mut ctx.accounts.config;
    config.mining_enabled = enable;
    Ok(())
}

/// ────────────────────────────────────────────────────────────────────────────
///  GRANT BONUS (admin credit, runs the full accrual path)
/// ────────────────────────────────────────────────────────────────────────────
#[derive(Accounts)]
pub struct GrantBonus<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,
    #[account(
        mut,
        has_one = authority @ GameError::Unauthorized,
        seeds = [CONFIG_SEED],
        bump
    )]
    pub config: Account<'info, GameConfig>,
    #[account(mut)]
    pub player: Account<'info, Player>,
}

#[event]
pub struct BonusGranted {
    pub player: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}

pub fn grant_bonus(ctx: Context<GrantBonus>, amount: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let player = &mut ctx.accounts.player;
    let config = &mut ctx.accounts.config;

    let mut rolls = roll_source(&player.key())?;
    sync_player(player, config, now, &mut rolls)?;

    // A large grant can cross the conversion threshold many times in one call.
    let outcome = player.record_earnings(amount, &mut rolls)?;
    apply_accrual(config, &outcome);

    emit!(BonusGranted {
        player: player.owner,
        amount,
        timestamp: now,
    });
    emit_conversion_events(player, &outcome, now);

    msg!("Granted {} SOD bonus to {}", amount, player.owner);
    Ok(())
}

/// ────────────────────────────────────────────────────────────────────────────
///  CREATE PLAYER
/// ────────────────────────────────────────────────────────────────────────────
#[derive(Accounts)]
pub struct CreatePlayer<'info> {
    #[account(mut)]
    pub wallet: Signer<'info>,
    #[account(
        init,
        payer = wallet,
        space = 8  /* discriminator */
        + 32       /* owner */
        + 8 + 8 + 8 /* sod_balance + usdt_balance + usdt_progress */
        + 8 + 4    /* mining_power + user_level */
        + 8 + 8    /* total_mined + today_earnings */
        + 1 + 8    /* boost_active + boost_end_time */
        + 1 + 8    /* auto_mining_enabled + last_auto_settle */
        + 33 + 4   /* referrer: Option<Pubkey> + referral_count */
        + 8,       /* created_at */
        seeds = [PLAYER_SEED, wallet.key().as_ref()],
        bump
    )]
    pub player: Account<'info, Player>,
    #[account(
        mut,
        seeds = [CONFIG_SEED],
        bump
    )]
    pub config: Account<'info, GameConfig>,
    #[account(mut)]
    pub referrer_player: Option<Account<'info, Player>>,
    pub system_program: Program<'info, System>,
}

#[event]
pub struct PlayerCreated {
    pub wallet: Pubkey,
    pub referrer: Option<Pubkey>,
    pub starting_sod: u64,
    pub timestamp: i64,
}

#[event]
pub struct ReferralRegistered {
    pub referrer: Pubkey,
    pub referee: Pubkey,
    pub timestamp: i64,
}

pub fn create_player(ctx: Context<CreatePlayer>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let config = &mut ctx.accounts.config;

    require!(config.mining_enabled, GameError::MiningDisabled);

    let referrer = match ctx.accounts.referrer_player.as_mut() {
        Some(referrer_player) => {
            require!(
                referrer_player.owner != ctx.accounts.wallet.key(),
                GameError::SelfReferral
            );
            referrer_player.referral_count = referrer_player.referral_count.saturating_add(1);
            config.total_referrals = config.total_referrals.saturating_add(1);
            emit!(ReferralRegistered {
                referrer: referrer_player.owner,
                referee: ctx.accounts.wallet.key(),
                timestamp: now,
            });
            Some(referrer_player.owner)
        }
        None => None,
    };

    let player = &mut ctx.accounts.player;
    player.initialize(ctx.accounts.wallet.key(), referrer, now);

    config.total_players = config.total_players.saturating_add(1);
    config.total_sod_mined = config.total_sod_mined.saturating_add(INITIAL_SOD_BALANCE);

    emit!(PlayerCreated {
        wallet: player.owner,
        referrer,
        starting_sod: INITIAL_SOD_BALANCE,
        timestamp: now,
    });

    Ok(())
}

/// ────────────────────────────────────────────────────────────────────────────
///  PLAYER ACTIONS (shared context)
/// ────────────────────────────────────────────────────────────────────────────
#[derive(Accounts)]
pub struct PlayerAction<'info> {
    #[account(mut)]
    pub wallet: Signer<'info>,
    #[account(
        mut,
        constraint = player.owner == wallet.key() @ GameError::Unauthorized,
        seeds = [PLAYER_SEED, wallet.key().as_ref()],
        bump
    )]
    pub player: Account<'info, Player>,
    #[account(
        mut,
        seeds = [CONFIG_SEED],
        bump
    )]
    pub config: Account<'info, GameConfig>,
}

#[event]
pub struct SodMined {
    pub player: Pubkey,
    pub amount: u64,
    pub boosted: bool,
    pub timestamp: i64,
}

#[event]
pub struct AutoMineSettled {
    pub player: Pubkey,
    pub ticks: u64,
    pub amount: u64,
    pub timestamp: i64,
}

#[event]
pub struct UsdtConverted {
    pub player: Pubkey,
    pub cycles: u64,
    pub usdt_amount: u64,
    pub timestamp: i64,
}

#[event]
pub struct LevelUp {
    pub player: Pubkey,
    pub new_level: u32,
    pub mining_power: u64,
    pub timestamp: i64,
}

#[event]
pub struct UsdtClaimed {
    pub player: Pubkey,
    pub usdt_amount: u64,
    pub timestamp: i64,
}

#[event]
pub struct ClaimCostDebited {
    pub player: Pubkey,
    pub sod_amount: u64,
    pub timestamp: i64,
}

#[event]
pub struct BundlePurchased {
    pub player: Pubkey,
    pub bundle_id: u8,
    pub sod_credited: u64,
    pub timestamp: i64,
}

#[event]
pub struct BoostActivated {
    pub player: Pubkey,
    pub cost: u64,
    pub end_time: i64,
    pub timestamp: i64,
}

#[event]
pub struct BoostExpired {
    pub player: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct AutoMiningToggled {
    pub player: Pubkey,
    pub enabled: bool,
    pub timestamp: i64,
}

/// ────────────────────────────────────────────────────────────────────────────
///  MINE (one click)
/// ────────────────────────────────────────────────────────────────────────────
pub fn mine(ctx: Context<PlayerAction>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let player = &mut ctx.accounts.player;
    let config = &mut ctx.accounts.config;

    require!(config.mining_enabled, GameError::MiningDisabled);

    let mut rolls = roll_source(&player.key())?;
    sync_player(player, config, now, &mut rolls)?;

    let reward = player.click_reward();
    let boosted = player.boost_active;
    let outcome = player.record_earnings(reward, &mut rolls)?;
    apply_accrual(config, &outcome);

    emit!(SodMined {
        player: player.owner,
        amount: reward,
        boosted,
        timestamp: now,
    });
    emit_conversion_events(player, &outcome, now);

    Ok(())
}

/// ────────────────────────────────────────────────────────────────────────────
///  SETTLE AUTO-MINING
/// ────────────────────────────────────────────────────────────────────────────
/// The on-chain stand-in for the one-second browser timer: callable anytime,
/// a no-op when nothing is pending. Stays available while mining is paused
/// so already-earned time can always be settled.
pub fn settle_auto_mining(ctx: Context<PlayerAction>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let player = &mut ctx.accounts.player;
    let config = &mut ctx.accounts.config;

    let mut rolls = roll_source(&player.key())?;
    sync_player(player, config, now, &mut rolls)
}

/// ────────────────────────────────────────────────────────────────────────────
///  TOGGLE AUTO-MINING
/// ────────────────────────────────────────────────────────────────────────────
pub fn toggle_auto_mining(ctx: Context<PlayerAction>, enable: bool) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let player = &mut ctx.accounts.player;
    let config = &mut ctx.accounts.config;

    if enable {
        require!(config.mining_enabled, GameError::MiningDisabled);
    }

    let mut rolls = roll_source(&player.key())?;
    sync_player(player, config, now, &mut rolls)?;

    player.set_auto_mining(enable, now)?;

    emit!(AutoMiningToggled {
        player: player.owner,
        enabled: enable,
        timestamp: now,
    });

    Ok(())
}

/// ────────────────────────────────────────────────────────────────────────────
///  CLAIM USDT
/// ────────────────────────────────────────────────────────────────────────────
pub fn claim_usdt(ctx: Context<PlayerAction>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let player = &mut ctx.accounts.player;
    let config = &mut ctx.accounts.config;

    let mut rolls = roll_source(&player.key())?;
    sync_player(player, config, now, &mut rolls)?;

    let (usdt_claimed, sod_cost) = player.claim_usdt()?;
    config.total_usdt_claimed = config.total_usdt_claimed.saturating_add(usdt_claimed);

    // two ledger entries, USDT debit first
    emit!(UsdtClaimed {
        player: player.owner,
        usdt_amount: usdt_claimed,
        timestamp: now,
    });
    emit!(ClaimCostDebited {
        player: player.owner,
        sod_amount: sod_cost,
        timestamp: now,
    });

    msg!("Claimed {} USDT units for {} SOD", usdt_claimed, sod_cost);
    Ok(())
}

/// ────────────────────────────────────────────────────────────────────────────
///  PURCHASE BUNDLE
/// ────────────────────────────────────────────────────────────────────────────
pub fn purchase_bundle(ctx: Context<PlayerAction>, bundle_id: u8) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let player = &mut ctx.accounts.player;
    let config = &mut ctx.accounts.config;

    require!(config.mining_enabled, GameError::MiningDisabled);

    let mut rolls = roll_source(&player.key())?;
    sync_player(player, config, now, &mut rolls)?;

    let (base_sod, bonus_sod) = player.purchase_bundle(bundle_id)?;
    let credited = base_sod + bonus_sod;
    config.total_sod_mined = config.total_sod_mined.saturating_add(credited);

    emit!(BundlePurchased {
        player: player.owner,
        bundle_id,
        sod_credited: credited,
        timestamp: now,
    });

    Ok(())
}

/// ────────────────────────────────────────────────────────────────────────────
///  ACTIVATE BOOST
/// ────────────────────────────────────────────────────────────────────────────
pub fn activate_boost(ctx: Context<PlayerAction>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let player = &mut ctx.accounts.player;
    let config = &mut ctx.accounts.config;

    require!(config.mining_enabled, GameError::MiningDisabled);

    let mut rolls = roll_source(&player.key())?;
    sync_player(player, config, now, &mut rolls)?;

    let end_time = player.activate_boost(now)?;

    emit!(BoostActivated {
        player: player.owner,
        cost: BOOST_COST,
        end_time,
        timestamp: now,
    });

    Ok(())
}
