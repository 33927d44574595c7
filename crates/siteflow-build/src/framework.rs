use serde::{Deserialize, Serialize};

/// Front-end frameworks siteflow knows how to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameworkKind {
    React,
    Angular,
    NextJS,
    Unknown,
}

impl FrameworkKind {
    /// Client-side routed apps: unknown paths must serve `index.html`
    pub fn is_spa(&self) -> bool {
        matches!(self, FrameworkKind::React | FrameworkKind::Angular)
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, FrameworkKind::Unknown)
    }
}

impl std::fmt::Display for FrameworkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FrameworkKind::React => "React",
            FrameworkKind::Angular => "Angular",
            FrameworkKind::NextJS => "Next.js",
            FrameworkKind::Unknown => "Unknown",
        };
        write!(f, "{}", name)
    }
}
