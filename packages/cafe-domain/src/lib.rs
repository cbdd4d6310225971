pub mod constraint;
pub mod conversation;
pub mod extraction;
pub mod grounding;
pub mod menu;
