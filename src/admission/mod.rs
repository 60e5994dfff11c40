pub mod gate;

pub use gate::{AdmissionGate, GateSnapshot};
