use anchor_lang::prelude::*;

pub mod constants;
pub mod errors;
pub mod helpers;
pub mod instructions;
pub mod state;

use errors::GameError;
use instructions::*;
use std::str::FromStr;

const ADMIN: &str = "8kvqgxQG77pv6RvEou8f2kHSWi3rtx8F7MksXUqNLGmn";

declare_id!("Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS");

#[program]
pub mod sodmax {
    use super::*;

    #[access_control(enforce_admin(ctx.accounts.authority.key))]
    pub fn initialize(ctx: Context<InitializeConfig>) -> Result<()> {
        instructions::initialize(ctx)
    }
    /// ────────────────────────────────────────────────────────────────────────────
    ///  ALL ADMIN FUNCTIONS ENFORCED BY AUTHORITY SIGNING IXS
    /// ────────────────────────────────────────────────────────────────────────────
    pub fn toggle_mining(ctx: Context<ToggleMining>, enable: bool) -> Result<()> {
        instructions::toggle_mining(ctx, enable)
    }
    pub fn grant_bonus(ctx: Context<GrantBonus>, amount: u64) -> Result<()> {
        instructions::grant_bonus(ctx, amount)
    }

    // ────────────────────────────────────────────────────────────────────────────
    ///  NON ADMIN FUNCTIONS
    // ────────────────────────────────────────────────────────────────────────────
    pub fn create_player(ctx: Context<CreatePlayer>) -> Result<()> {
        instructions::create_player(ctx)
    }

    pub fn mine(ctx: Context<PlayerAction>) -> Result<()> {
        instructions::mine(ctx)
    }

    pub fn settle_auto_mining(ctx: Context<PlayerAction>) -> Result<()> {
        instructions::settle_auto_mining(ctx)
    }

    pub fn toggle_auto_mining(ctx: Context<PlayerAction>, enable: bool) -> Result<()> {
        instructions::toggle_auto_mining(ctx, enable)
    }

    pub fn claim_usdt(ctx: Context<PlayerAction>) -> Result<()> {
        instructions::claim_usdt(ctx)
    }

    pub fn purchase_bundle(ctx: Context<PlayerAction>, bundle_id: u8) -> Result<()> {
        instructions::purchase_bundle(ctx, bundle_id)
    }

    pub fn activate_boost(ctx: Context<PlayerAction>) -> Result<()> {
        instructions::activate_boost(ctx)
    }
}

fn enforce_admin(key: &Pubkey) -> Result<()> {
    #[cfg(not(feature = "test"))]
    require!(
        *key == Pubkey::from_str(ADMIN).unwrap(),
        GameError::Unauthorized
    );
    Ok(())
}
