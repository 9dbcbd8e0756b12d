pub mod behavior_mapper;
pub mod child_mapper;
pub mod reward_mapper;

pub use behavior_mapper::BehaviorMapper;
pub use child_mapper::ChildMapper;
pub use reward_mapper::RewardMapper;
