//! Local state: the rundown/group mirror, composed identifiers and
//! feedback subscriptions

pub mod identifier;
mod mirror;
mod subscriptions;

pub use identifier::decompose;
pub use mirror::{CombinedGroup, Group, Mirror, StructureSnapshot};

#[cfg(test)]
pub use identifier::{compose, display_rundown_name};
#[cfg(test)]
pub use mirror::PlayingState;
pub use subscriptions::SubscriptionRegistry;
