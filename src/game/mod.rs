pub mod action;
pub mod state;

pub use action::{Action, ALL_ACTIONS, NUM_ACTIONS};
pub use state::{HandContext, HandState, Winner, EPS};
