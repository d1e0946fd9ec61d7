use regex::Regex;

/// A draw request parsed from a mention body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Pick a single winner among `slots` participants.
    Winner { slots: u64 },
    /// Pick `count` escrow spots among `slots` participants.
    Escrow { count: u64, slots: u64 },
}

impl Command {
    /// Number of integers to request from the generator.
    pub fn count(&self) -> u64 {
        match self {
            Command::Winner { .. } => 1,
            Command::Escrow { count, .. } => *count,
        }
    }

    /// Upper bound of the draw range (participant count).
    pub fn slots(&self) -> u64 {
        match self {
            Command::Winner { slots } => *slots,
            Command::Escrow { slots, .. } => *slots,
        }
    }

    /// Header line used in the reply for this command kind.
    pub fn header(&self) -> &'static str {
        match self {
            Command::Winner { .. } => "The winner is:",
            Command::Escrow { .. } => "Your escrow spots:",
        }
    }
}

/// Recognizes the bot's command grammar in free-text mention bodies.
///
/// The grammar is an optional leading slash, the bot's username, then one or
/// two space-separated non-negative integers. Everything else is an ordinary
/// mention and parses to `None`.
pub struct CommandParser {
    pattern: Regex,
}

impl CommandParser {
    pub fn new(bot_username: &str) -> Self {
        let pattern = Regex::new(&format!(
            r"(?i)^/?u/{}[ ]+(?P<param_1>\d+)([ ]+(?P<param_2>\d+))?[ ]*$",
            regex::escape(bot_username)
        ))
        .expect("valid command regex");
        Self { pattern }
    }

    pub fn parse(&self, body: &str) -> Option<Command> {
        let caps = self.pattern.captures(body.trim())?;
        let first: u64 = caps.name("param_1")?.as_str().parse().ok()?;
        match caps.name("param_2") {
            Some(second) => {
                let second: u64 = second.as_str().parse().ok()?;
                // Parameters are accepted in either order.
                Some(Command::Escrow {
                    count: first.min(second),
                    slots: first.max(second),
                })
            }
            None => Some(Command::Winner { slots: first }),
        }
    }
}
