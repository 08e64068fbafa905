use crate::models::chat::{ ConversationTurn, Role };

/// Flattens a conversation into the single prompt sent upstream.
///
/// User turns render as `You: ...`, every other turn as `Bot: ...`, one line
/// each, in order. The prompt grows with the conversation; nothing is trimmed.
pub fn format_history_for_prompt(history: &[ConversationTurn]) -> String {
    let mut result = String::new();
    for turn in history {
        let role_display = match turn.role {
            Role::User => "You",
            Role::Assistant => "Bot",
        };
        result.push_str(&format!("{}: {}\n", role_display, turn.content));
    }

    result
}
