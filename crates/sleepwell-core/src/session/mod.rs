mod clock;
mod controller;

pub use clock::SessionClock;
pub use controller::{SessionConfig, SessionController, SessionState};
