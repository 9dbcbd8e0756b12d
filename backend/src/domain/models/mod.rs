pub mod behavior;
pub mod celebration;
pub mod child;
pub mod event;
pub mod reward;
pub mod reward_history;
