//! Channel mini-games that are not casino bets.

pub mod word_chain;

pub use word_chain::{check_connection, Accepted, ChannelState, Language, PlayerStats, WordChain};
