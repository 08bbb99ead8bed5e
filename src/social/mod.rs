//! Social features: pairing between two users, AFK notes and timed mutes.

pub mod afk;
pub mod mute;
pub mod pairing;

pub use afk::{format_away, AfkBoard, AfkDocument, AfkRecord};
pub use mute::{format_remaining, MuteBook, MuteDocument, MuteRecord, MAX_MUTE_MINUTES};
pub use pairing::{PairOutcome, PairingBook, PairingDocument, PairingRecord};
