//! Reply personas and the system instructions they select.

/// Named style configuration controlling the system instruction sent to the
/// completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentPersona {
    Professional,
    Friendly,
    Concise,
    Custom { prompt: Option<String> },
}

impl AgentPersona {
    /// Resolve a persona from the host's settings strings.
    ///
    /// Unknown or empty agent kinds fall back to `Professional`. The custom
    /// prompt is only consulted for the `custom` kind; an empty prompt counts
    /// as absent.
    pub fn from_settings(agent: &str, custom_prompt: Option<&str>) -> Self {
        match agent.trim() {
            "friendly" => AgentPersona::Friendly,
            "concise" => AgentPersona::Concise,
            "custom" => AgentPersona::Custom {
                prompt: custom_prompt
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string),
            },
            "professional" | "" => AgentPersona::Professional,
            other => {
                tracing::debug!("Unknown auto-reply agent kind {:?}, using professional", other);
                AgentPersona::Professional
            }
        }
    }

    /// The system instruction for this persona.
    pub fn system_instruction(&self) -> String {
        match self {
            AgentPersona::Professional => {
                "You are a professional and formal assistant.".to_string()
            }
            AgentPersona::Friendly => "You are a friendly and casual assistant.".to_string(),
            AgentPersona::Concise => {
                "You are a concise assistant that gives brief, direct answers.".to_string()
            }
            AgentPersona::Custom { prompt } => format!(
                "You are a {} assistant.",
                prompt.as_deref().unwrap_or("professional and helpful")
            ),
        }
    }
}
