//! Wiring-time configuration handed to the handlers at construction.

/// Queue names each stage publishes to, derived once from the subject prefix
/// at startup and cloned into every handler.
#[derive(Debug, Clone)]
pub struct PipelineQueues {
    pub upload: String,
    pub processing: String,
    pub ai: String,
    pub callback: String,
    pub outgoing: String,
}

/// The survey the AI stage runs: the assistant's role description and the
/// ordered list of questions it works through.
#[derive(Debug, Clone)]
pub struct SurveyConfig {
    pub role_context: String,
    pub questions: Vec<String>,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        SurveyConfig {
            role_context: "You are a friendly project-intake assistant. You help new clients \
                           describe the work they need by asking one question at a time, \
                           keeping the tone light and conversational."
                .to_string(),
            questions: vec![
                "What is the name of your project?".to_string(),
                "What problem should the project solve?".to_string(),
                "What is your approximate budget?".to_string(),
                "When would you like to launch?".to_string(),
            ],
        }
    }
}

impl SurveyConfig {
    /// Overrides from the environment; `questions` is semicolon-separated.
    /// Blank entries are dropped, and a `None` keeps the default.
    pub fn from_env_parts(role: Option<String>, questions: Option<String>) -> Self {
        let defaults = SurveyConfig::default();
        SurveyConfig {
            role_context: role
                .filter(|r| !r.trim().is_empty())
                .unwrap_or(defaults.role_context),
            questions: questions
                .map(|raw| {
                    raw.split(';')
                        .map(str::trim)
                        .filter(|q| !q.is_empty())
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                })
                .filter(|qs| !qs.is_empty())
                .unwrap_or(defaults.questions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_questions_split_on_semicolons() {
        let config = SurveyConfig::from_env_parts(
            Some("Collect shipping details".to_string()),
            Some("Where to? ; When? ;;".to_string()),
        );
        assert_eq!(config.role_context, "Collect shipping details");
        assert_eq!(config.questions, vec!["Where to?", "When?"]);
    }

    #[test]
    fn blank_overrides_fall_back_to_defaults() {
        let config = SurveyConfig::from_env_parts(Some("  ".to_string()), Some(";;".to_string()));
        let defaults = SurveyConfig::default();
        assert_eq!(config.role_context, defaults.role_context);
        assert_eq!(config.questions, defaults.questions);
    }
}
