pub mod policy;
pub mod state;
pub mod transitions;
pub mod verifier;
