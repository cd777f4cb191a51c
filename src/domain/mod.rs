pub mod booking;
pub mod wallet;

pub use booking::*;
pub use wallet::*;
