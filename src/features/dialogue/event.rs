use crate::features::dialogue::boundary::{EventKind, InboundEvent};

/// A button token. Raw callback strings are parsed into this enum at the
/// boundary so the engine dispatches on tagged variants, never on strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Users,
    Questions,
    Prompts,
    Exit,
    Add,
    Remove,
    List,
    Back,
    New,
    Edit,
    Name,
    Comment,
    Cancel,
    /// A concrete category picked from a listing keyboard.
    Category(String),
    /// A concrete registered user picked from a listing keyboard.
    User(i64),
}

impl Choice {
    pub fn parse(token: &str) -> Option<Self> {
        if let Some(name) = token.strip_prefix("pick:") {
            return Some(Choice::Category(name.to_string()));
        }
        if let Some(id) = token.strip_prefix("user:") {
            return id.parse::<i64>().ok().map(Choice::User);
        }

        match token {
            "users" => Some(Choice::Users),
            "questions" => Some(Choice::Questions),
            "prompts" => Some(Choice::Prompts),
            "exit" => Some(Choice::Exit),
            "add" => Some(Choice::Add),
            "remove" => Some(Choice::Remove),
            "list" => Some(Choice::List),
            "back" => Some(Choice::Back),
            "new" => Some(Choice::New),
            "edit" => Some(Choice::Edit),
            "name" => Some(Choice::Name),
            "comment" => Some(Choice::Comment),
            "cancel" => Some(Choice::Cancel),
            _ => None,
        }
    }

    pub fn token(&self) -> String {
        match self {
            Choice::Users => "users".to_string(),
            Choice::Questions => "questions".to_string(),
            Choice::Prompts => "prompts".to_string(),
            Choice::Exit => "exit".to_string(),
            Choice::Add => "add".to_string(),
            Choice::Remove => "remove".to_string(),
            Choice::List => "list".to_string(),
            Choice::Back => "back".to_string(),
            Choice::New => "new".to_string(),
            Choice::Edit => "edit".to_string(),
            Choice::Name => "name".to_string(),
            Choice::Comment => "comment".to_string(),
            Choice::Cancel => "cancel".to_string(),
            Choice::Category(name) => format!("pick:{}", name),
            Choice::User(id) => format!("user:{}", id),
        }
    }
}

/// Classified input for one engine step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// `/start` — (re-)enter the dialogue at the main menu.
    Start,
    /// `/cancel` — global cancel, checked before any transition dispatch.
    Cancel,
    Choice(Choice),
    Text(String),
    /// A token no state declares. Always a no-op re-render.
    Unknown,
}

impl Input {
    pub fn from_event(event: &InboundEvent) -> Self {
        match event.kind {
            EventKind::Choice => match Choice::parse(&event.payload) {
                Some(choice) => Input::Choice(choice),
                None => Input::Unknown,
            },
            EventKind::Text => match event.payload.trim() {
                "/start" => Input::Start,
                "/cancel" => Input::Cancel,
                text => Input::Text(text.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_tokens() {
        assert_eq!(Choice::parse("users"), Some(Choice::Users));
        assert_eq!(Choice::parse("back"), Some(Choice::Back));
        assert_eq!(Choice::parse("bogus"), None);
    }

    #[test]
    fn test_parse_category_token() {
        assert_eq!(
            Choice::parse("pick:Стоматология"),
            Some(Choice::Category("Стоматология".to_string()))
        );
    }

    #[test]
    fn test_parse_user_token() {
        assert_eq!(Choice::parse("user:555"), Some(Choice::User(555)));
        assert_eq!(Choice::parse("user:abc"), None);
    }

    #[test]
    fn test_token_round_trip() {
        for choice in [
            Choice::Users,
            Choice::Exit,
            Choice::Category("Clinic".to_string()),
            Choice::User(42),
        ] {
            assert_eq!(Choice::parse(&choice.token()), Some(choice));
        }
    }

    #[test]
    fn test_commands_classified_before_text() {
        let event = InboundEvent {
            identity: 1,
            kind: EventKind::Text,
            payload: " /cancel ".to_string(),
        };
        assert_eq!(Input::from_event(&event), Input::Cancel);
    }
}
