use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
    Background,
    Content,
}

impl std::fmt::Display for ContextKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Background => write!(f, "background"),
            Self::Content => write!(f, "content"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u64);

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Destination of a message: a context kind plus the instance within that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub kind: ContextKind,
    pub instance: u64,
}

impl Target {
    pub fn background() -> Self {
        Self {
            kind: ContextKind::Background,
            instance: 0,
        }
    }

    pub fn content(tab: TabId) -> Self {
        Self {
            kind: ContextKind::Content,
            instance: tab.0,
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_targets_are_tab_scoped() {
        assert_ne!(Target::content(TabId(1)), Target::content(TabId(2)));
        assert_eq!(Target::content(TabId(3)).to_string(), "content:3");
        assert_eq!(Target::background().to_string(), "background:0");
    }
}
