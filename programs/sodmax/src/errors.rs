use anchor_lang::prelude::*;

#[error_code]
pub enum GameError {
    #[msg("Amount must be greater than zero")]
    InvalidAmount,
    #[msg("Insufficient SOD balance")]
    InsufficientBalance,
    #[msg("No USDT available to claim")]
    NothingToClaim,
    #[msg("Unknown bundle id")]
    UnknownBundle,
    #[msg("Unauthorized access")]
    Unauthorized,
    #[msg("Mining is disabled")]
    MiningDisabled,
    #[msg("Self-referral is not allowed")]
    SelfReferral,
    #[msg("Math overflow")]
    MathOverflow,
}
