//! Transport-neutral inbound and outbound messages.

/// A text message seen by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEvent {
    pub guild_id: String,
    pub channel_id: String,
    pub author_id: String,
    pub content: String,
}

impl TextEvent {
    pub fn new(
        guild_id: impl Into<String>,
        channel_id: impl Into<String>,
        author_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            guild_id: guild_id.into(),
            channel_id: channel_id.into(),
            author_id: author_id.into(),
            content: content.into(),
        }
    }

    /// Parse a console line of the form `<guild> <channel> <user> <text...>`.
    pub fn from_console_line(line: &str) -> Option<Self> {
        let mut parts = line.trim().splitn(4, char::is_whitespace);
        let guild = parts.next().filter(|s| !s.is_empty())?;
        let channel = parts.next()?;
        let author = parts.next()?;
        let content = parts.next().unwrap_or("").trim();
        if content.is_empty() {
            return None;
        }
        Some(Self::new(guild, channel, author, content))
    }
}

/// Text to post in a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub channel_id: String,
    pub text: String,
}

impl Reply {
    pub fn new(channel_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            text: text.into(),
        }
    }
}
