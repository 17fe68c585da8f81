//! The closed set of dispatchable methods.

/// Every method the dispatcher understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    /// Handshake step one.
    Initialize,
    /// Handshake step two (client notification).
    Initialized,
    /// Liveness check; allowed in any state.
    Ping,
    /// List operations.
    ToolsList,
    /// Invoke an operation.
    ToolsCall,
    /// List resources.
    ResourcesList,
    /// Read a resource.
    ResourcesRead,
    /// List prompts.
    PromptsList,
    /// Render a prompt.
    PromptsGet,
}

impl Method {
    /// Every method, in handshake-then-catalog order.
    pub const ALL: [Self; 9] = [
        Self::Initialize,
        Self::Initialized,
        Self::Ping,
        Self::ToolsList,
        Self::ToolsCall,
        Self::ResourcesList,
        Self::ResourcesRead,
        Self::PromptsList,
        Self::PromptsGet,
    ];

    /// Resolve a wire method name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "initialize" => Some(Self::Initialize),
            "notifications/initialized" | "initialized" => Some(Self::Initialized),
            "ping" => Some(Self::Ping),
            "tools/list" => Some(Self::ToolsList),
            "tools/call" => Some(Self::ToolsCall),
            "resources/list" => Some(Self::ResourcesList),
            "resources/read" => Some(Self::ResourcesRead),
            "prompts/list" => Some(Self::PromptsList),
            "prompts/get" => Some(Self::PromptsGet),
            _ => None,
        }
    }

    /// Canonical wire name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Initialized => "notifications/initialized",
            Self::Ping => "ping",
            Self::ToolsList => "tools/list",
            Self::ToolsCall => "tools/call",
            Self::ResourcesList => "resources/list",
            Self::ResourcesRead => "resources/read",
            Self::PromptsList => "prompts/list",
            Self::PromptsGet => "prompts/get",
        }
    }

    /// Whether the session must have completed the handshake.
    pub const fn requires_ready(self) -> bool {
        !matches!(self, Self::Initialize | Self::Initialized | Self::Ping)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
