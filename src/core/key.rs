use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

const MODULE_PREFIX: &str = "PM";
const CHANNEL_PREFIX: &str = "CH";
const CHANNEL_DIGIT_WIDTH: usize = 2;

/// Canonical `"<MODULE>:<CHANNEL>"` join key shared by mapping files and results.
///
/// Both sides of the join (hand-maintained CSV layouts and analysis output)
/// must go through [`ChannelKey::normalize`]; a mismatch here silently renders
/// a channel at the neutral value instead of its measured one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelKey(String);

impl ChannelKey {
    /// Builds the canonical key for a (module, channel) pair.
    ///
    /// - module: uppercased, a single leading `PM` is stripped
    /// - channel: uppercased; the first `C`/`CH` followed by digits becomes
    ///   `CH` + digits left-padded to two places (never truncated). Labels
    ///   without such a run are kept uppercased as-is.
    #[must_use]
    pub fn normalize(module: &str, channel: &str) -> Self {
        let module = normalize_module(module);
        let channel = normalize_channel(channel);
        Self(format!("{module}:{channel}"))
    }

    /// Normalizes a `PM:Channel` label as written in mapping files.
    ///
    /// A label without a colon is treated as a bare channel with an empty module.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.split_once(':') {
            Some((module, channel)) => Self::normalize(module, channel),
            None => Self::normalize("", label),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the key back into its module and channel parts.
    #[must_use]
    pub fn parts(&self) -> (&str, &str) {
        self.0.split_once(':').unwrap_or(("", self.0.as_str()))
    }

    #[must_use]
    pub fn module(&self) -> &str {
        self.parts().0
    }

    #[must_use]
    pub fn channel(&self) -> &str {
        self.parts().1
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ChannelKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ChannelKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Free-function form of [`ChannelKey::normalize`].
#[must_use]
pub fn normalize_channel_key(module: &str, channel: &str) -> ChannelKey {
    ChannelKey::normalize(module, channel)
}

fn normalize_module(module: &str) -> String {
    let upper = module.to_uppercase();
    match upper.strip_prefix(MODULE_PREFIX) {
        Some(rest) => rest.to_owned(),
        None => upper,
    }
}

fn normalize_channel(channel: &str) -> String {
    let upper = channel.to_uppercase();
    match find_channel_digits(&upper) {
        Some(digits) => format!("{CHANNEL_PREFIX}{digits:0>CHANNEL_DIGIT_WIDTH$}"),
        None => upper,
    }
}

/// Returns the digit run of the leftmost `C[H]<digits>` occurrence.
fn find_channel_digits(upper: &str) -> Option<&str> {
    let bytes = upper.as_bytes();
    for (index, byte) in bytes.iter().enumerate() {
        if *byte != b'C' {
            continue;
        }
        let mut start = index + 1;
        if bytes.get(start) == Some(&b'H') {
            start += 1;
        }
        let digit_len = bytes[start..]
            .iter()
            .take_while(|byte| byte.is_ascii_digit())
            .count();
        if digit_len > 0 {
            return Some(&upper[start..start + digit_len]);
        }
    }
    None
}
