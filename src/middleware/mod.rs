pub mod gate;
pub mod session;

pub use gate::{route_gate_middleware, GateState};
pub use session::{cookie_value, SessionInputs, SessionReader};
