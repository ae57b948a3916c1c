//! Type-safe cache key builders

use std::fmt;

pub const VERSION: &str = "v1";

pub mod order_meta {
    use super::*;

    pub const NAMESPACE: &str = "order_meta";

    /// Settlement metadata for one gateway order
    #[derive(Debug, Clone)]
    pub struct OrderMetaKey {
        pub order_id: String,
    }

    impl OrderMetaKey {
        pub fn new(order_id: impl Into<String>) -> Self {
            Self {
                order_id: order_id.into(),
            }
        }
    }

    impl fmt::Display for OrderMetaKey {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}:{}:{}", VERSION, NAMESPACE, self.order_id)
        }
    }
}
