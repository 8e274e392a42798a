pub mod activity;
pub mod component;
pub mod diagnostics;
pub mod equilibrium;
pub mod gas;
pub mod inhibition;
pub mod numerics;
pub mod process;
pub mod reactor;
pub mod records;
pub mod state;

pub mod errors;
