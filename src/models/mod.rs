mod alert;
mod interaction;

pub use alert::{Notification, Subscription};
pub use interaction::{Interaction, NewInteraction, TopicCount};
