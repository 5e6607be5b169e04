//! Multiplicative ranking envelope.
//!
//! Every signal is a factor; the final score is base relevance times the
//! product of all factors, so evaluation order never changes the result.

pub mod assembler;
pub mod config;

pub use assembler::{RankingAssembler, RankingEnvelope, SignalFactor, MULTIPLY};
pub use config::{ConditionWeights, LengthTierConfig, RankingConfig};
