mod matcher;

pub use matcher::{keyword_pattern, match_subscriptions, Matcher};
