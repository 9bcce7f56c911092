pub const CONFIG_SEED: &[u8] = b"config";
pub const PLAYER_SEED: &[u8] = b"player";

// Fixed variables
pub const USDT_SCALE: u64 = 10_000; // 4 decimal places, 1 USDT = 10_000 units
pub const BASIS_POINTS: u64 = 10_000;

// Conversion policy
pub const CONVERSION_THRESHOLD: u64 = 10_000_000; // SOD per conversion cycle
pub const CONVERSION_REWARD: u64 = 100; // 0.01 USDT credited per completed cycle
pub const CLAIM_RATE: u64 = 1_000_000_000; // SOD destroyed per 1 USDT claimed back

// Leveling
pub const LEVEL_UP_CHANCE_BP: u64 = 1_500; // 15%, rolled once per completed cycle
pub const BASE_MINING_POWER: u64 = 10; // mining_power = BASE_MINING_POWER * user_level

// Boost
pub const BOOST_COST: u64 = 5_000;
pub const BOOST_MULTIPLIER: u64 = 3;
pub const BOOST_DURATION_SECONDS: i64 = 1_800; // 30 minutes

// Auto-mining
pub const AUTO_MINE_MIN_BALANCE: u64 = 1_000_000; // balance required to enable
pub const AUTO_MINE_TICK_SECONDS: i64 = 1;
pub const AUTO_MINE_POWER_DIVISOR: u64 = 2; // tick reward = mining_power / 2

// Signup grant, credited to both sod_balance and total_mined
pub const INITIAL_SOD_BALANCE: u64 = 1_000_000;

// === Bundle catalog ==========================================================
// format: (bundle_id, price_in_usdt, base_sod, bonus_sod)
// Prices are informational only; payment processing is not part of this program.
pub const BUNDLE_CONFIGS: [(u8, u64, u64, u64); 4] = [
    (1, 1, 5_000_000, 500_000),       // Starter
    (2, 5, 30_000_000, 3_000_000),    // Pro
    (3, 15, 100_000_000, 10_000_000), // Platinum
    (4, 50, 500_000_000, 50_000_000), // Diamond
];

// Helper function to get bundle data by ID
pub fn get_bundle_by_id(id: u8) -> Option<(u64, u64)> {
    BUNDLE_CONFIGS
        .iter()
        .find(|(bundle_id, _, _, _)| *bundle_id == id)
        .map(|(_, _, base_sod, bonus_sod)| (*base_sod, *bonus_sod))
}
