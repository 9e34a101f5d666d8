/// AronxVPN connection links
///
/// Assembles the `vless://` URI a client app imports. The output layout is
/// fixed; only the values change, and every value is percent-encoded.
///
/// A configuration missing any required Reality parameter is rejected
/// outright instead of producing a link the client cannot use.

pub mod builder;
pub mod config;

pub use builder::build_link;
pub use config::{LinkConfig, LinkError, select_short_id};
