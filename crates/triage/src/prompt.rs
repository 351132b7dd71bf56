use serde::{Deserialize, Serialize};

/// Categories offered to the model when the caller does not supply any.
pub const DEFAULT_CATEGORIES: &str =
    "Electricity, Water Supply, Roads, Waste Management, Health, Security, Education, Other";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of a chat-style prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Builds the two-message prompt asking for a JSON triage of `description`.
///
/// Blank `categories` fall back to [`DEFAULT_CATEGORIES`].
pub fn build_issue_prompt(description: &str, categories: Option<&str>) -> Vec<ChatMessage> {
    let categories = categories
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CATEGORIES);

    let system = format!(
        "You analyze community issue reports. Respond with a single JSON object and nothing else, \
         using exactly these keys:\n\
         \"summary\": a short title of at most 5 words,\n\
         \"category\": one of [{categories}],\n\
         \"urgency\": one of \"low\", \"medium\", \"high\", \"critical\"."
    );
    let user = format!("Issue description: {description}");

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_uses_supplied_categories() {
        let messages = build_issue_prompt("No water", Some("Water, Roads"));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("[Water, Roads]"));
        assert!(messages[1].content.ends_with("No water"));
    }

    #[test]
    fn prompt_defaults_blank_categories() {
        let messages = build_issue_prompt("Pothole", Some("   "));
        assert!(messages[0].content.contains(DEFAULT_CATEGORIES));
        let messages = build_issue_prompt("Pothole", None);
        assert!(messages[0].content.contains(DEFAULT_CATEGORIES));
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(json["role"], "user");
    }
}
