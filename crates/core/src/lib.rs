pub mod anomaly;
pub mod clock;
pub mod config;
pub mod error;
pub mod poll;

pub use anomaly::*;
pub use clock::{Clock, TokioClock, VirtualClock};
pub use config::Config;
pub use error::*;
pub use poll::{poll_until, PollError, PollPolicy, PollState};
