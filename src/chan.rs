//! Channel name utilities.
//!
//! # Reference
//! - RFC 2812 Section 1.3: Channel names

/// Characters that may open a channel name.
pub const CHANNEL_PREFIXES: [char; 4] = ['#', '&', '+', '!'];

/// Extension trait for telling channel names apart from nicknames.
pub trait ChannelExt {
    /// Check if this string looks like an IRC channel name.
    ///
    /// A channel name starts with one of [`CHANNEL_PREFIXES`], is at most 50
    /// characters long and holds no space, comma or control character.
    fn is_channel_name(&self) -> bool;
}

impl ChannelExt for str {
    fn is_channel_name(&self) -> bool {
        let mut chars = self.chars();
        match chars.next() {
            Some(first) if CHANNEL_PREFIXES.contains(&first) => {}
            _ => return false,
        }

        self.chars().count() <= 50 && chars.all(|c| c != ' ' && c != ',' && !c.is_control())
    }
}

impl ChannelExt for String {
    fn is_channel_name(&self) -> bool {
        self.as_str().is_channel_name()
    }
}
