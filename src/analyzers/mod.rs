pub mod aggregate;
pub mod publications;
pub mod ranking;
pub mod win_tally;
