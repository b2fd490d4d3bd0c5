//! Pair-strategy domain: definition, limits, running status, and briefs.

mod brief;
mod pair_strat;

pub use brief::{PairSideTradingBrief, StratBrief};
pub use pair_strat::{
    CancelRate, MarketTradeVolumeParticipation, PairStrat, Residual, ResidualRestriction,
    StratLeg, StratLimits, StratState, StratStatus,
};
