use crate::features::dialogue::event::{Choice, Input};
use crate::features::dialogue::render::{self, Reply, STORAGE_FAILURE};
use crate::features::dialogue::session::{Scratch, Session};
use crate::features::dialogue::state::State;
use crate::features::dialogue::store::ReviewStore;
use crate::features::users::RegisteredUser;

/// Which editable user field a text input targets.
#[derive(Debug, Clone, Copy)]
enum UserField {
    DisplayName,
    Note,
}

/// The dialogue state machine. One `handle` call is one deterministic
/// transition: cancel is checked first, then the (state, input) pair is
/// dispatched; anything undeclared re-renders the current state unchanged.
/// Persistence failures never tear the session down.
pub struct Engine<S> {
    store: S,
}

impl<S: ReviewStore> Engine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    pub async fn handle(&self, session: &mut Session, input: Input) -> Reply {
        tracing::debug!(
            identity = session.identity,
            state = ?session.state,
            input = ?input,
            "dialogue step"
        );

        match input {
            Input::Cancel => render::cancel_notice(),
            Input::Start => {
                session.state = State::MainMenu;
                session.scratch = Scratch::default();
                render::main_menu()
            }
            Input::Unknown => self.render_state(session).await,
            Input::Choice(choice) => self.on_choice(session, choice).await,
            Input::Text(text) => self.on_text(session, text).await,
        }
    }

    async fn on_choice(&self, session: &mut Session, choice: Choice) -> Reply {
        use Choice as C;
        use State as St;

        match (session.state, choice) {
            (St::MainMenu, C::Users) => {
                session.state = St::UserMenu;
                render::user_menu()
            }
            (St::MainMenu, C::Questions) => {
                session.state = St::QuestionMenu;
                session.scratch.category = None;
                self.question_menu_view(session).await
            }
            (St::MainMenu, C::Prompts) => {
                session.state = St::PromptMenu;
                session.scratch.category = None;
                self.prompt_menu_view(session).await
            }
            (St::MainMenu, C::Exit) => render::exit_notice(),

            (St::UserMenu, C::Add) => {
                session.state = St::SelectCategory;
                self.select_category_view().await
            }
            (St::UserMenu, C::Remove) => {
                session.state = St::RemoveUser;
                render::ask_remove_id()
            }
            (St::UserMenu, C::List) => {
                session.state = St::ListUsers;
                self.list_users_view().await
            }
            (St::UserMenu, C::Back) => self.to_main_menu(session),

            (St::SelectCategory, C::New) => {
                session.state = St::AddCategory;
                render::ask_category_name()
            }
            (St::SelectCategory, C::Category(name)) => {
                session.scratch.category = Some(name.clone());
                session.state = St::AddUser;
                render::ask_user_entry(&name)
            }
            // Shortcut offered right after a category was created.
            (St::SelectCategory, C::Add) if session.scratch.category.is_some() => {
                session.state = St::AddUser;
                let category = session.scratch.category.clone().unwrap_or_default();
                render::ask_user_entry(&category)
            }
            (St::SelectCategory, C::Back) => {
                session.scratch.category = None;
                session.state = St::UserMenu;
                render::user_menu()
            }

            (St::ListUsers, C::Edit) => {
                session.scratch.user_id = None;
                session.state = St::EditUserSelect;
                self.user_pick_view().await
            }
            (St::ListUsers, C::Back) => {
                session.state = St::UserMenu;
                render::user_menu()
            }

            (St::EditUserSelect, C::User(id)) => match self.store.get_user(id).await {
                Ok(Some(user)) => {
                    session.scratch.user_id = Some(id);
                    render::user_detail(&user)
                }
                Ok(None) => {
                    self.user_pick_view()
                        .await
                        .with_notice("❌ Пользователь не найден.")
                }
                Err(e) => {
                    tracing::warn!(identity = session.identity, "storage failure: {}", e);
                    storage_failure()
                }
            },
            (St::EditUserSelect, C::Name) if session.scratch.user_id.is_some() => {
                session.state = St::EditUsernameInput;
                render::ask_display_name()
            }
            (St::EditUserSelect, C::Comment) if session.scratch.user_id.is_some() => {
                session.state = St::EditCommentInput;
                render::ask_note()
            }
            (St::EditUserSelect, C::Back) => {
                session.scratch.user_id = None;
                session.state = St::ListUsers;
                self.list_users_view().await
            }

            (St::EditUsernameInput | St::EditCommentInput, C::Cancel) => {
                session.state = St::EditUserSelect;
                self.edit_user_view(session).await
            }

            (St::QuestionMenu, C::Category(name)) => {
                session.scratch.category = Some(name);
                self.question_menu_view(session).await
            }
            (St::QuestionMenu, C::Add) if session.scratch.category.is_some() => {
                session.state = St::AddQuestion;
                let category = session.scratch.category.clone().unwrap_or_default();
                render::ask_question_text(&category)
            }
            (St::QuestionMenu, C::Edit) if session.scratch.category.is_some() => {
                session.state = St::EditQuestionSelectId;
                render::ask_question_id()
            }
            (St::QuestionMenu, C::Back) => self.to_main_menu(session),

            (St::PromptMenu, C::Category(name)) => {
                session.scratch.category = Some(name);
                self.prompt_menu_view(session).await
            }
            (St::PromptMenu, C::Edit) if session.scratch.category.is_some() => {
                let category = session.scratch.category.clone().unwrap_or_default();
                match self.store.get_prompt(&category).await {
                    Ok(current) => {
                        session.state = St::EditPromptInput;
                        render::ask_prompt_text(&category, &current)
                    }
                    Err(e) => {
                        tracing::warn!(identity = session.identity, "storage failure: {}", e);
                        storage_failure()
                    }
                }
            }
            (St::PromptMenu, C::Back) => self.to_main_menu(session),

            // Undeclared token for this state: no transition, no scratch
            // change, identical re-render.
            _ => self.render_state(session).await,
        }
    }

    async fn on_text(&self, session: &mut Session, text: String) -> Reply {
        use State as St;

        let text = text.trim().to_string();
        match session.state {
            St::AddCategory => {
                if text.is_empty() {
                    return render::ask_category_name()
                        .with_notice("❌ Название не может быть пустым.");
                }
                match self.store.create_category(&text).await {
                    Ok(created) => {
                        session.scratch.category = Some(text.clone());
                        session.state = St::SelectCategory;
                        render::category_created(&text, created)
                    }
                    Err(e) => {
                        tracing::warn!(identity = session.identity, "storage failure: {}", e);
                        session.state = St::SelectCategory;
                        self.select_category_view().await.with_notice(
                            "❌ Не удалось добавить тип бизнеса. Пожалуйста, попробуйте еще раз.",
                        )
                    }
                }
            }

            St::AddUser => {
                let Some(category) = session.scratch.category.clone() else {
                    session.state = St::UserMenu;
                    return render::user_menu();
                };
                let mut parts = text.split_whitespace();
                let Some(id) = parts.next().and_then(|t| t.parse::<i64>().ok()) else {
                    return render::ask_user_entry(&category).with_notice(
                        "❌ Ошибка: Telegram ID должен быть числом. Пожалуйста, попробуйте еще раз.",
                    );
                };
                let name = {
                    let rest = parts.collect::<Vec<_>>().join(" ");
                    (!rest.is_empty()).then_some(rest)
                };

                session.state = St::UserMenu;
                match self
                    .store
                    .upsert_user(id, &category, name.as_deref(), None)
                    .await
                {
                    Ok(()) => render::user_menu().with_notice(&format!(
                        "✅ Пользователь с ID {} успешно добавлен к типу бизнеса '{}'.",
                        id, category
                    )),
                    Err(e) => {
                        tracing::warn!(identity = session.identity, "storage failure: {}", e);
                        render::user_menu().with_notice(
                            "❌ Не удалось добавить пользователя. Пожалуйста, попробуйте еще раз.",
                        )
                    }
                }
            }

            St::RemoveUser => {
                let Ok(id) = text.parse::<i64>() else {
                    return render::ask_remove_id().with_notice(
                        "❌ Ошибка: Telegram ID должен быть числом. Пожалуйста, попробуйте еще раз.",
                    );
                };

                session.state = St::UserMenu;
                match self.store.delete_user(id).await {
                    Ok(true) => render::user_menu()
                        .with_notice(&format!("✅ Пользователь с ID {} успешно удален.", id)),
                    Ok(false) => render::user_menu()
                        .with_notice(&format!("❌ Пользователь с ID {} не найден.", id)),
                    Err(e) => {
                        tracing::warn!(identity = session.identity, "storage failure: {}", e);
                        render::user_menu().with_notice(STORAGE_FAILURE)
                    }
                }
            }

            St::AddQuestion => {
                let Some(category) = session.scratch.category.clone() else {
                    return self.to_main_menu(session);
                };
                if text.is_empty() {
                    return render::ask_question_text(&category)
                        .with_notice("❌ Текст вопроса не может быть пустым.");
                }
                match self.store.add_question(&category, &text).await {
                    Ok(()) => {
                        session.state = St::QuestionMenu;
                        self.question_menu_view(session).await.with_notice(&format!(
                            "✅ Вопрос успешно добавлен для типа бизнеса '{}'.",
                            category
                        ))
                    }
                    Err(e) => {
                        tracing::warn!(identity = session.identity, "storage failure: {}", e);
                        render::ask_question_text(&category).with_notice(STORAGE_FAILURE)
                    }
                }
            }

            St::EditQuestionSelectId => {
                let Ok(id) = text.parse::<i64>() else {
                    return render::ask_question_id().with_notice(
                        "❌ Ошибка: ID вопроса должен быть числом. Пожалуйста, попробуйте еще раз.",
                    );
                };
                session.scratch.question_id = Some(id);
                session.state = St::EditQuestionText;
                render::ask_new_question_text()
            }

            St::EditQuestionText => {
                let Some(id) = session.scratch.question_id else {
                    return self.to_main_menu(session);
                };
                if text.is_empty() {
                    return render::ask_new_question_text()
                        .with_notice("❌ Текст вопроса не может быть пустым.");
                }
                match self.store.update_question_text(id, &text).await {
                    Ok(matched) => {
                        session.scratch.question_id = None;
                        session.state = St::QuestionMenu;
                        let notice = if matched {
                            format!("✅ Текст вопроса с ID {} успешно обновлен.", id)
                        } else {
                            format!("❌ Вопрос с ID {} не найден.", id)
                        };
                        self.question_menu_view(session).await.with_notice(&notice)
                    }
                    Err(e) => {
                        tracing::warn!(identity = session.identity, "storage failure: {}", e);
                        render::ask_new_question_text().with_notice(STORAGE_FAILURE)
                    }
                }
            }

            St::EditUsernameInput => {
                self.set_user_field(session, &text, UserField::DisplayName)
                    .await
            }
            St::EditCommentInput => self.set_user_field(session, &text, UserField::Note).await,

            St::EditPromptInput => {
                let Some(category) = session.scratch.category.clone() else {
                    return self.to_main_menu(session);
                };
                if text.is_empty() {
                    return Reply::message("❌ Текст промпта не может быть пустым.");
                }
                match self.store.upsert_prompt(&category, &text).await {
                    Ok(()) => {
                        session.state = St::PromptMenu;
                        self.prompt_menu_view(session).await.with_notice(&format!(
                            "✅ Промпт для типа бизнеса '{}' успешно обновлен.",
                            category
                        ))
                    }
                    Err(e) => {
                        tracing::warn!(identity = session.identity, "storage failure: {}", e);
                        Reply::message(STORAGE_FAILURE)
                    }
                }
            }

            // Choice-only states ignore stray text and re-render.
            _ => self.render_state(session).await,
        }
    }

    /// Sets display name or note through the coalescing upsert, so the field
    /// not being edited is preserved.
    async fn set_user_field(&self, session: &mut Session, text: &str, field: UserField) -> Reply {
        let ask = match field {
            UserField::DisplayName => render::ask_display_name,
            UserField::Note => render::ask_note,
        };
        if text.is_empty() {
            return ask().with_notice("❌ Значение не может быть пустым.");
        }
        let Some(id) = session.scratch.user_id else {
            session.state = State::ListUsers;
            return self.list_users_view().await;
        };

        let user = match self.store.get_user(id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                session.scratch.user_id = None;
                session.state = State::ListUsers;
                return self
                    .list_users_view()
                    .await
                    .with_notice("❌ Пользователь не найден.");
            }
            Err(e) => {
                tracing::warn!(identity = session.identity, "storage failure: {}", e);
                return ask().with_notice(STORAGE_FAILURE);
            }
        };

        let (name, note) = match field {
            UserField::DisplayName => (Some(text), None),
            UserField::Note => (None, Some(text)),
        };
        match self.store.upsert_user(id, &user.category, name, note).await {
            Ok(()) => {
                session.scratch.user_id = None;
                session.state = State::ListUsers;
                self.list_users_view()
                    .await
                    .with_notice(&format!("✅ Пользователь {} обновлен.", id))
            }
            Err(e) => {
                tracing::warn!(identity = session.identity, "storage failure: {}", e);
                ask().with_notice(STORAGE_FAILURE)
            }
        }
    }

    fn to_main_menu(&self, session: &mut Session) -> Reply {
        session.state = State::MainMenu;
        session.scratch = Scratch::default();
        render::main_menu()
    }

    /// Projection of the current state (plus scratch) into a render
    /// instruction. Also serves as the no-op re-render for undeclared input.
    async fn render_state(&self, session: &Session) -> Reply {
        match session.state {
            State::MainMenu => render::main_menu(),
            State::UserMenu => render::user_menu(),
            State::QuestionMenu => self.question_menu_view(session).await,
            State::PromptMenu => self.prompt_menu_view(session).await,
            State::SelectCategory => self.select_category_view().await,
            State::AddCategory => render::ask_category_name(),
            State::AddUser => match &session.scratch.category {
                Some(category) => render::ask_user_entry(category),
                None => render::user_menu(),
            },
            State::RemoveUser => render::ask_remove_id(),
            State::ListUsers => self.list_users_view().await,
            State::AddQuestion => match &session.scratch.category {
                Some(category) => render::ask_question_text(category),
                None => render::main_menu(),
            },
            State::EditQuestionSelectId => render::ask_question_id(),
            State::EditQuestionText => render::ask_new_question_text(),
            State::EditUserSelect => self.edit_user_view(session).await,
            State::EditUsernameInput => render::ask_display_name(),
            State::EditCommentInput => render::ask_note(),
            State::EditPromptInput => match &session.scratch.category {
                Some(category) => match self.store.get_prompt(category).await {
                    Ok(current) => render::ask_prompt_text(category, &current),
                    Err(_) => storage_failure(),
                },
                None => render::main_menu(),
            },
        }
    }

    async fn select_category_view(&self) -> Reply {
        match self.store.list_categories().await {
            Ok(categories) => render::select_category(&categories),
            Err(_) => storage_failure(),
        }
    }

    async fn question_menu_view(&self, session: &Session) -> Reply {
        match &session.scratch.category {
            Some(category) => match self.store.list_questions(category).await {
                Ok(questions) => render::question_list(category, &questions),
                Err(_) => storage_failure(),
            },
            None => match self.store.list_categories().await {
                Ok(categories) => render::question_categories(&categories),
                Err(_) => storage_failure(),
            },
        }
    }

    async fn prompt_menu_view(&self, session: &Session) -> Reply {
        match &session.scratch.category {
            Some(category) => match self.store.get_prompt(category).await {
                Ok(prompt) => render::prompt_view(category, &prompt),
                Err(_) => storage_failure(),
            },
            None => match self.store.list_categories().await {
                Ok(categories) => render::prompt_categories(&categories),
                Err(_) => storage_failure(),
            },
        }
    }

    async fn list_users_view(&self) -> Reply {
        match self.users_grouped().await {
            Ok(groups) => render::users_overview(&groups),
            Err(_) => storage_failure(),
        }
    }

    async fn user_pick_view(&self) -> Reply {
        match self.users_grouped().await {
            Ok(groups) => {
                let users: Vec<RegisteredUser> =
                    groups.into_iter().flat_map(|(_, users)| users).collect();
                render::user_pick(&users)
            }
            Err(_) => storage_failure(),
        }
    }

    async fn edit_user_view(&self, session: &Session) -> Reply {
        if let Some(id) = session.scratch.user_id {
            match self.store.get_user(id).await {
                Ok(Some(user)) => return render::user_detail(&user),
                Ok(None) => {}
                Err(_) => return storage_failure(),
            }
        }
        self.user_pick_view().await
    }

    async fn users_grouped(
        &self,
    ) -> Result<Vec<(String, Vec<RegisteredUser>)>, crate::core::error::PersistenceError> {
        let categories = self.store.list_categories().await?;
        let mut groups = Vec::with_capacity(categories.len());
        for category in categories {
            let users = self.store.list_users(&category).await?;
            groups.push((category, users));
        }
        Ok(groups)
    }
}

fn storage_failure() -> Reply {
    Reply::message(STORAGE_FAILURE).with_choices(vec![("🔙 Назад", Choice::Back)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::dialogue::store::memory::MemoryStore;

    fn engine() -> Engine<MemoryStore> {
        Engine::new(MemoryStore::new())
    }

    async fn step(engine: &Engine<MemoryStore>, session: &mut Session, input: Input) -> Reply {
        engine.handle(session, input).await
    }

    fn choice(c: Choice) -> Input {
        Input::Choice(c)
    }

    fn text(t: &str) -> Input {
        Input::Text(t.to_string())
    }

    #[tokio::test]
    async fn test_start_renders_main_menu() {
        let engine = engine();
        let mut session = Session::new(42);
        let reply = step(&engine, &mut session, Input::Start).await;
        assert_eq!(reply, render::main_menu());
        assert_eq!(session.state, State::MainMenu);
    }

    #[tokio::test]
    async fn test_undeclared_token_is_identical_rerender() {
        let engine = engine();
        let mut session = Session::new(42);
        session.state = State::UserMenu;
        let before = session.clone();

        // `name` is not declared in UserMenu.
        let reply = step(&engine, &mut session, choice(Choice::Name)).await;
        assert_eq!(reply, render::user_menu());
        assert_eq!(session, before);
    }

    #[tokio::test]
    async fn test_text_in_choice_only_state_is_ignored() {
        let engine = engine();
        let mut session = Session::new(42);
        let before = session.clone();

        let reply = step(&engine, &mut session, text("hello")).await;
        assert_eq!(reply, render::main_menu());
        assert_eq!(session, before);
    }

    #[tokio::test]
    async fn test_cancel_is_terminal_from_any_state() {
        let engine = engine();
        for state in [
            State::MainMenu,
            State::SelectCategory,
            State::AddUser,
            State::EditQuestionText,
            State::EditPromptInput,
        ] {
            let mut session = Session::new(42);
            session.state = state;
            session.scratch.category = Some("Clinic".to_string());
            let reply = step(&engine, &mut session, Input::Cancel).await;
            assert!(reply.end, "cancel must end the dialogue from {:?}", state);
        }
    }

    #[tokio::test]
    async fn test_exit_from_main_menu_is_terminal() {
        let engine = engine();
        let mut session = Session::new(42);
        let reply = step(&engine, &mut session, choice(Choice::Exit)).await;
        assert!(reply.end);
    }

    #[tokio::test]
    async fn test_numeric_parse_failure_keeps_state_and_store() {
        let engine = engine();
        engine.store.upsert_user(5, "Clinic", None, None).await.unwrap();

        let mut session = Session::new(42);
        session.state = State::RemoveUser;
        let reply = step(&engine, &mut session, text("not-a-number")).await;

        assert_eq!(session.state, State::RemoveUser);
        assert!(reply.text.contains("должен быть числом"));
        assert!(engine.store.get_user(5).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_back_to_main_menu_clears_scratch() {
        let engine = engine();
        engine.store.create_category("Clinic").await.unwrap();

        let mut session = Session::new(42);
        session.state = State::QuestionMenu;
        session.scratch.category = Some("Clinic".to_string());

        step(&engine, &mut session, choice(Choice::Back)).await;
        assert_eq!(session.state, State::MainMenu);
        assert_eq!(session.scratch, Scratch::default());
    }

    #[tokio::test]
    async fn test_category_selection_survives_within_question_menu() {
        let engine = engine();
        engine.store.create_category("Clinic").await.unwrap();

        let mut session = Session::new(42);
        session.state = State::QuestionMenu;
        step(
            &engine,
            &mut session,
            choice(Choice::Category("Clinic".to_string())),
        )
        .await;
        let reply = step(&engine, &mut session, choice(Choice::Add)).await;

        assert_eq!(session.state, State::AddQuestion);
        assert!(reply.text.contains("Clinic"));
        assert_eq!(session.scratch.category.as_deref(), Some("Clinic"));
    }

    #[tokio::test]
    async fn test_add_category_flow_seeds_and_prefills() {
        let engine = engine();
        let mut session = Session::new(42);

        step(&engine, &mut session, choice(Choice::Users)).await;
        let reply = step(&engine, &mut session, choice(Choice::Add)).await;
        // No categories yet, the picker offers creating one.
        assert!(reply.text.contains("Нет доступных типов бизнеса"));

        step(&engine, &mut session, choice(Choice::New)).await;
        assert_eq!(session.state, State::AddCategory);

        let reply = step(&engine, &mut session, text("Clinic")).await;
        assert_eq!(session.state, State::SelectCategory);
        assert_eq!(session.scratch.category.as_deref(), Some("Clinic"));
        assert!(reply.text.contains("успешно добавлен"));

        let questions = engine.store.list_questions("Clinic").await.unwrap();
        assert_eq!(questions.len(), 4);
        assert_eq!(engine.store.list_categories().await.unwrap(), vec!["Clinic"]);
    }

    #[tokio::test]
    async fn test_add_user_parses_id_and_display_name() {
        let engine = engine();
        engine.store.create_category("Clinic").await.unwrap();

        let mut session = Session::new(42);
        session.state = State::SelectCategory;
        step(
            &engine,
            &mut session,
            choice(Choice::Category("Clinic".to_string())),
        )
        .await;
        assert_eq!(session.state, State::AddUser);

        let reply = step(&engine, &mut session, text("555 Ivan")).await;
        assert_eq!(session.state, State::UserMenu);
        assert!(reply.text.contains("✅"));

        let user = engine.store.get_user(555).await.unwrap().unwrap();
        assert_eq!(user.category, "Clinic");
        assert_eq!(user.display_name.as_deref(), Some("Ivan"));
        assert_eq!(user.note, None);
    }

    #[tokio::test]
    async fn test_edit_question_text_flow() {
        let engine = engine();
        engine.store.create_category("Clinic").await.unwrap();
        let id = engine.store.list_questions("Clinic").await.unwrap()[0].id;

        let mut session = Session::new(42);
        session.state = State::QuestionMenu;
        session.scratch.category = Some("Clinic".to_string());

        step(&engine, &mut session, choice(Choice::Edit)).await;
        assert_eq!(session.state, State::EditQuestionSelectId);

        step(&engine, &mut session, text(&id.to_string())).await;
        assert_eq!(session.state, State::EditQuestionText);

        let reply = step(&engine, &mut session, text("Новый текст?")).await;
        assert_eq!(session.state, State::QuestionMenu);
        assert!(reply.text.contains("успешно обновлен"));
        assert_eq!(
            engine.store.list_questions("Clinic").await.unwrap()[0].question_text,
            "Новый текст?"
        );
    }

    #[tokio::test]
    async fn test_edit_missing_question_is_nonfatal() {
        let engine = engine();
        engine.store.create_category("Clinic").await.unwrap();

        let mut session = Session::new(42);
        session.state = State::EditQuestionText;
        session.scratch.category = Some("Clinic".to_string());
        session.scratch.question_id = Some(9999);

        let reply = step(&engine, &mut session, text("x")).await;
        assert_eq!(session.state, State::QuestionMenu);
        assert!(reply.text.contains("не найден"));
        assert!(!reply.end);
    }

    #[tokio::test]
    async fn test_edit_prompt_flow() {
        let engine = engine();
        engine.store.create_category("Clinic").await.unwrap();

        let mut session = Session::new(42);
        session.state = State::PromptMenu;
        step(
            &engine,
            &mut session,
            choice(Choice::Category("Clinic".to_string())),
        )
        .await;

        let reply = step(&engine, &mut session, choice(Choice::Edit)).await;
        assert_eq!(session.state, State::EditPromptInput);
        assert!(reply.text.contains("{}"));

        let reply = step(&engine, &mut session, text("Составь отзыв: {}")).await;
        assert_eq!(session.state, State::PromptMenu);
        assert!(reply.text.contains("Составь отзыв: {}"));
        assert_eq!(
            engine.store.get_prompt("Clinic").await.unwrap(),
            "Составь отзыв: {}"
        );
    }

    #[tokio::test]
    async fn test_edit_user_display_name_preserves_note() {
        let engine = engine();
        engine
            .store
            .upsert_user(555, "Clinic", Some("Ivan"), Some("vip"))
            .await
            .unwrap();

        let mut session = Session::new(42);
        session.state = State::ListUsers;
        step(&engine, &mut session, choice(Choice::Edit)).await;
        assert_eq!(session.state, State::EditUserSelect);

        step(&engine, &mut session, choice(Choice::User(555))).await;
        step(&engine, &mut session, choice(Choice::Name)).await;
        assert_eq!(session.state, State::EditUsernameInput);

        let reply = step(&engine, &mut session, text("Пётр")).await;
        assert_eq!(session.state, State::ListUsers);
        assert!(reply.text.contains("✅"));

        let user = engine.store.get_user(555).await.unwrap().unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Пётр"));
        assert_eq!(user.note.as_deref(), Some("vip"));
    }

    #[tokio::test]
    async fn test_edit_field_cancel_returns_to_user_detail() {
        let engine = engine();
        engine.store.upsert_user(555, "Clinic", None, None).await.unwrap();

        let mut session = Session::new(42);
        session.state = State::EditUsernameInput;
        session.scratch.user_id = Some(555);

        let reply = step(&engine, &mut session, choice(Choice::Cancel)).await;
        assert_eq!(session.state, State::EditUserSelect);
        assert!(reply.text.contains("555"));
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_session_alive() {
        let engine = engine();
        let mut session = Session::new(42);
        session.state = State::UserMenu;

        engine.store.set_failing(true);
        let reply = step(&engine, &mut session, choice(Choice::List)).await;
        assert!(reply.text.contains(STORAGE_FAILURE));
        assert!(!reply.end);

        // The storage recovers and the same session keeps working.
        engine.store.set_failing(false);
        let reply = step(&engine, &mut session, choice(Choice::Back)).await;
        assert_eq!(reply, render::user_menu());
    }

    #[tokio::test]
    async fn test_add_category_failure_renders_error_and_survives() {
        let engine = engine();
        let mut session = Session::new(42);
        session.state = State::AddCategory;

        engine.store.set_failing(true);
        let reply = step(&engine, &mut session, text("Clinic")).await;
        assert_eq!(session.state, State::SelectCategory);
        assert!(reply.text.contains("❌ Не удалось добавить тип бизнеса"));
        assert!(!reply.end);

        engine.store.set_failing(false);
        assert!(engine.store.list_categories().await.unwrap().is_empty());
    }
}
