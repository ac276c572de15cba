use crate::features::dialogue::event::Choice;
use crate::features::questions::Question;
use crate::features::users::RegisteredUser;

/// Notice shown whenever a persistence call fails; the dialogue survives.
pub const STORAGE_FAILURE: &str = "❌ Ошибка хранилища. Попробуйте еще раз.";

/// One render instruction for the boundary adapter: message text plus an
/// inline keyboard of `(label, token)` pairs. `end` destroys the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub choices: Vec<(String, String)>,
    pub end: bool,
}

impl Reply {
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            choices: Vec::new(),
            end: false,
        }
    }

    pub fn terminal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            choices: Vec::new(),
            end: true,
        }
    }

    pub fn with_choices(mut self, choices: Vec<(&str, Choice)>) -> Self {
        self.choices = choices
            .into_iter()
            .map(|(label, choice)| (label.to_string(), choice.token()))
            .collect();
        self
    }

    /// Prepends a one-line notice (inline error or success confirmation).
    pub fn with_notice(mut self, notice: &str) -> Self {
        self.text = format!("{}\n\n{}", notice, self.text);
        self
    }
}

pub fn main_menu() -> Reply {
    Reply::message("🔧 Панель администратора:").with_choices(vec![
        ("👥 Управление пользователями", Choice::Users),
        ("❓ Управление вопросами", Choice::Questions),
        ("📝 Управление промптами", Choice::Prompts),
        ("❌ Выход", Choice::Exit),
    ])
}

pub fn user_menu() -> Reply {
    Reply::message("👥 Управление пользователями:").with_choices(vec![
        ("➕ Добавить пользователя", Choice::Add),
        ("➖ Удалить пользователя", Choice::Remove),
        ("📋 Список пользователей", Choice::List),
        ("🔙 Назад", Choice::Back),
    ])
}

pub fn select_category(categories: &[String]) -> Reply {
    if categories.is_empty() {
        return Reply::message("Нет доступных типов бизнеса. Сначала добавьте тип бизнеса:")
            .with_choices(vec![
                ("➕ Добавить тип бизнеса", Choice::New),
                ("🔙 Назад", Choice::Back),
            ]);
    }

    let mut choices: Vec<(&str, Choice)> = categories
        .iter()
        .map(|name| (name.as_str(), Choice::Category(name.clone())))
        .collect();
    choices.push(("➕ Добавить новый тип", Choice::New));
    choices.push(("🔙 Назад", Choice::Back));

    Reply::message("Выберите тип бизнеса для нового пользователя:").with_choices(choices)
}

/// Shown after the add-category flow; offers the shortcut straight into user
/// registration for the category just created.
pub fn category_created(name: &str, created: bool) -> Reply {
    let text = if created {
        format!(
            "✅ Тип бизнеса '{}' успешно добавлен со стандартными вопросами.",
            name
        )
    } else {
        format!("Тип бизнеса '{}' уже существует.", name)
    };
    Reply::message(text).with_choices(vec![
        ("➕ Добавить пользователя", Choice::Add),
        ("🔙 Назад", Choice::Back),
    ])
}

pub fn ask_category_name() -> Reply {
    Reply::message("Введите название нового типа бизнеса:")
}

pub fn ask_user_entry(category: &str) -> Reply {
    Reply::message(format!(
        "Выбран тип бизнеса: {}\nВведите Telegram ID нового пользователя (и, при желании, имя через пробел):",
        category
    ))
}

pub fn ask_remove_id() -> Reply {
    Reply::message("Введите Telegram ID пользователя, которого хотите удалить:")
}

fn user_line(user: &RegisteredUser) -> String {
    let mut line = format!("ID: {}", user.telegram_id);
    if let Some(name) = &user.display_name {
        line.push_str(&format!(" ({})", name));
    }
    if let Some(note) = &user.note {
        line.push_str(&format!(" — {}", note));
    }
    line
}

pub fn users_overview(groups: &[(String, Vec<RegisteredUser>)]) -> Reply {
    if groups.iter().all(|(_, users)| users.is_empty()) {
        return Reply::message("Нет зарегистрированных пользователей.")
            .with_choices(vec![("🔙 Назад", Choice::Back)]);
    }

    let mut text = String::from("📋 Список пользователей по типам бизнеса:\n\n");
    for (category, users) in groups {
        if users.is_empty() {
            continue;
        }
        text.push_str(&format!("📌 {} ({} пользователей):\n", category, users.len()));
        for user in users {
            text.push_str(&format!("   - {}\n", user_line(user)));
        }
        text.push('\n');
    }

    Reply::message(text).with_choices(vec![
        ("✏️ Редактировать пользователя", Choice::Edit),
        ("🔙 Назад", Choice::Back),
    ])
}

pub fn user_pick(users: &[RegisteredUser]) -> Reply {
    if users.is_empty() {
        return Reply::message("Нет зарегистрированных пользователей.")
            .with_choices(vec![("🔙 Назад", Choice::Back)]);
    }

    let labels: Vec<String> = users.iter().map(user_line).collect();
    let mut choices: Vec<(&str, Choice)> = labels
        .iter()
        .zip(users)
        .map(|(label, user)| (label.as_str(), Choice::User(user.telegram_id)))
        .collect();
    choices.push(("🔙 Назад", Choice::Back));

    Reply::message("Выберите пользователя для редактирования:").with_choices(choices)
}

pub fn user_detail(user: &RegisteredUser) -> Reply {
    let text = format!(
        "Пользователь {}\nТип бизнеса: {}\nИмя: {}\nКомментарий: {}",
        user.telegram_id,
        user.category,
        user.display_name.as_deref().unwrap_or("—"),
        user.note.as_deref().unwrap_or("—"),
    );
    Reply::message(text).with_choices(vec![
        ("✏️ Изменить имя", Choice::Name),
        ("💬 Изменить комментарий", Choice::Comment),
        ("🔙 Назад", Choice::Back),
    ])
}

pub fn ask_display_name() -> Reply {
    Reply::message("Введите новое имя пользователя:")
        .with_choices(vec![("❌ Отмена", Choice::Cancel)])
}

pub fn ask_note() -> Reply {
    Reply::message("Введите новый комментарий:")
        .with_choices(vec![("❌ Отмена", Choice::Cancel)])
}

fn category_picker(title: &str, categories: &[String]) -> Reply {
    if categories.is_empty() {
        return Reply::message("Нет доступных типов бизнеса.")
            .with_choices(vec![("🔙 Назад", Choice::Back)]);
    }

    let mut choices: Vec<(&str, Choice)> = categories
        .iter()
        .map(|name| (name.as_str(), Choice::Category(name.clone())))
        .collect();
    choices.push(("🔙 Назад", Choice::Back));

    Reply::message(title).with_choices(choices)
}

pub fn question_categories(categories: &[String]) -> Reply {
    category_picker("Выберите тип бизнеса для управления вопросами:", categories)
}

pub fn question_list(category: &str, questions: &[Question]) -> Reply {
    let mut text = format!("❓ Вопросы для типа бизнеса '{}':\n\n", category);
    if questions.is_empty() {
        text.push_str("Вопросы не найдены.");
    } else {
        for question in questions {
            text.push_str(&format!(
                "{}. {} [ID: {}]\n",
                question.question_order + 1,
                question.question_text,
                question.id
            ));
        }
    }

    Reply::message(text).with_choices(vec![
        ("➕ Добавить вопрос", Choice::Add),
        ("✏️ Редактировать вопрос", Choice::Edit),
        ("🔙 Назад", Choice::Back),
    ])
}

pub fn ask_question_text(category: &str) -> Reply {
    Reply::message(format!(
        "Введите текст нового вопроса для типа бизнеса '{}':",
        category
    ))
}

pub fn ask_question_id() -> Reply {
    Reply::message("Введите ID вопроса, который хотите отредактировать:")
}

pub fn ask_new_question_text() -> Reply {
    Reply::message("Введите новый текст вопроса:")
}

pub fn prompt_categories(categories: &[String]) -> Reply {
    category_picker("Выберите тип бизнеса для управления промптом:", categories)
}

pub fn prompt_view(category: &str, prompt: &str) -> Reply {
    Reply::message(format!(
        "📝 Промпт для типа бизнеса '{}':\n\n{}",
        category, prompt
    ))
    .with_choices(vec![
        ("✏️ Редактировать промпт", Choice::Edit),
        ("🔙 Назад", Choice::Back),
    ])
}

pub fn ask_prompt_text(category: &str, current: &str) -> Reply {
    Reply::message(format!(
        "Введите новый текст промпта для типа бизнеса '{}':\n\nТекущий промпт:\n{}\n\nПримечание: Используйте '{{}}' для вставки ответов пользователя.",
        category, current
    ))
}

pub fn exit_notice() -> Reply {
    Reply::terminal("Выход из панели администратора.")
}

pub fn cancel_notice() -> Reply {
    Reply::terminal("Операция отменена. Диалог завершен.")
}
