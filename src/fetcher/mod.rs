//! Block fetching: a Cue-driven targeted path and a linear cluster-scan fallback.

pub mod linear;
pub mod targeted;
