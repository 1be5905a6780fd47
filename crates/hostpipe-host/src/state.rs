use std::fmt;

/// Lifecycle of a native messaging channel.
///
/// States only move forward: `Created → Launching → Running → Closed`, with
/// `Closed` reachable from any of them. Ordering follows that progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HostState {
    Created,
    Launching,
    Running,
    Closed,
}

impl HostState {
    pub fn is_closed(self) -> bool {
        self == Self::Closed
    }
}

impl fmt::Display for HostState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Launching => "launching",
            Self::Running => "running",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}
