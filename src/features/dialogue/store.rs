use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::PersistenceError;
use crate::features::categories::CategoryService;
use crate::features::prompts::PromptService;
use crate::features::questions::{Question, QuestionService};
use crate::features::users::{RegisteredUser, UserService};

/// Persistence gateway port consumed by the dialogue engine. Every operation
/// is one transaction; failures come back as `PersistenceError`, never as a
/// panic or a raw driver error.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<String>, PersistenceError>;

    /// Creates a category with its default questions and prompt. Returns
    /// false when the category already existed (nothing is re-seeded).
    async fn create_category(&self, name: &str) -> Result<bool, PersistenceError>;

    async fn list_users(&self, category: &str) -> Result<Vec<RegisteredUser>, PersistenceError>;
    async fn get_user(&self, telegram_id: i64)
        -> Result<Option<RegisteredUser>, PersistenceError>;
    async fn upsert_user(
        &self,
        telegram_id: i64,
        category: &str,
        display_name: Option<&str>,
        note: Option<&str>,
    ) -> Result<(), PersistenceError>;
    /// True iff a row was removed.
    async fn delete_user(&self, telegram_id: i64) -> Result<bool, PersistenceError>;

    async fn list_questions(&self, category: &str) -> Result<Vec<Question>, PersistenceError>;
    async fn add_question(&self, category: &str, text: &str) -> Result<(), PersistenceError>;
    /// True iff a row matched.
    async fn update_question_text(&self, id: i64, text: &str) -> Result<bool, PersistenceError>;

    /// Never errors on a missing row; falls back to the default template.
    async fn get_prompt(&self, category: &str) -> Result<String, PersistenceError>;
    async fn upsert_prompt(&self, category: &str, template: &str)
        -> Result<(), PersistenceError>;
}

/// Production gateway backed by the per-entity services over one shared pool.
pub struct PgReviewStore {
    categories: CategoryService,
    users: UserService,
    questions: QuestionService,
    prompts: PromptService,
}

impl PgReviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            categories: CategoryService::new(pool.clone()),
            users: UserService::new(pool.clone()),
            questions: QuestionService::new(pool.clone()),
            prompts: PromptService::new(pool),
        }
    }
}

#[async_trait]
impl ReviewStore for PgReviewStore {
    async fn list_categories(&self) -> Result<Vec<String>, PersistenceError> {
        self.categories.list().await
    }

    async fn create_category(&self, name: &str) -> Result<bool, PersistenceError> {
        self.categories.create(name).await
    }

    async fn list_users(&self, category: &str) -> Result<Vec<RegisteredUser>, PersistenceError> {
        self.users.list_by_category(category).await
    }

    async fn get_user(
        &self,
        telegram_id: i64,
    ) -> Result<Option<RegisteredUser>, PersistenceError> {
        self.users.get(telegram_id).await
    }

    async fn upsert_user(
        &self,
        telegram_id: i64,
        category: &str,
        display_name: Option<&str>,
        note: Option<&str>,
    ) -> Result<(), PersistenceError> {
        self.users
            .upsert(telegram_id, category, display_name, note)
            .await
    }

    async fn delete_user(&self, telegram_id: i64) -> Result<bool, PersistenceError> {
        self.users.delete(telegram_id).await
    }

    async fn list_questions(&self, category: &str) -> Result<Vec<Question>, PersistenceError> {
        self.questions.list_by_category(category).await
    }

    async fn add_question(&self, category: &str, text: &str) -> Result<(), PersistenceError> {
        self.questions.add(category, text).await
    }

    async fn update_question_text(&self, id: i64, text: &str) -> Result<bool, PersistenceError> {
        self.questions.update_text(id, text).await
    }

    async fn get_prompt(&self, category: &str) -> Result<String, PersistenceError> {
        self.prompts.get(category).await
    }

    async fn upsert_prompt(&self, category: &str, template: &str) -> Result<(), PersistenceError> {
        self.prompts.upsert(category, template).await
    }
}

#[cfg(test)]
pub mod memory {
    //! In-memory gateway with the same row-level semantics as the Postgres
    //! one, for exercising the engine without a database.

    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::shared::constants::{DEFAULT_PROMPT_TEMPLATE, DEFAULT_QUESTIONS};

    #[derive(Default)]
    struct Inner {
        categories: Vec<String>,
        users: BTreeMap<i64, RegisteredUser>,
        questions: Vec<Question>,
        next_question_id: i64,
        prompts: HashMap<String, String>,
    }

    #[derive(Default)]
    pub struct MemoryStore {
        inner: Mutex<Inner>,
        failing: AtomicBool,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// When set, every operation fails the way an exhausted pool would.
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), PersistenceError> {
            if self.failing.load(Ordering::SeqCst) {
                Err(PersistenceError::Database(sqlx::Error::PoolTimedOut))
            } else {
                Ok(())
            }
        }

        fn ensure_category(inner: &mut Inner, name: &str) {
            if !inner.categories.iter().any(|c| c == name) {
                inner.categories.push(name.to_string());
                inner.categories.sort();
            }
        }
    }

    #[async_trait]
    impl ReviewStore for MemoryStore {
        async fn list_categories(&self) -> Result<Vec<String>, PersistenceError> {
            self.check()?;
            Ok(self.inner.lock().unwrap().categories.clone())
        }

        async fn create_category(&self, name: &str) -> Result<bool, PersistenceError> {
            self.check()?;
            let mut inner = self.inner.lock().unwrap();
            if inner.categories.iter().any(|c| c == name) {
                return Ok(false);
            }
            Self::ensure_category(&mut inner, name);
            for (order, question) in DEFAULT_QUESTIONS.iter().enumerate() {
                inner.next_question_id += 1;
                let id = inner.next_question_id;
                inner.questions.push(Question {
                    id,
                    category: name.to_string(),
                    question_text: question.to_string(),
                    question_order: order as i32,
                });
            }
            inner
                .prompts
                .insert(name.to_string(), DEFAULT_PROMPT_TEMPLATE.to_string());
            Ok(true)
        }

        async fn list_users(
            &self,
            category: &str,
        ) -> Result<Vec<RegisteredUser>, PersistenceError> {
            self.check()?;
            Ok(self
                .inner
                .lock()
                .unwrap()
                .users
                .values()
                .filter(|u| u.category == category)
                .cloned()
                .collect())
        }

        async fn get_user(
            &self,
            telegram_id: i64,
        ) -> Result<Option<RegisteredUser>, PersistenceError> {
            self.check()?;
            Ok(self.inner.lock().unwrap().users.get(&telegram_id).cloned())
        }

        async fn upsert_user(
            &self,
            telegram_id: i64,
            category: &str,
            display_name: Option<&str>,
            note: Option<&str>,
        ) -> Result<(), PersistenceError> {
            self.check()?;
            let mut inner = self.inner.lock().unwrap();
            Self::ensure_category(&mut inner, category);
            let existing = inner.users.get(&telegram_id);
            let merged = RegisteredUser {
                telegram_id,
                category: category.to_string(),
                display_name: display_name
                    .map(str::to_string)
                    .or_else(|| existing.and_then(|u| u.display_name.clone())),
                note: note
                    .map(str::to_string)
                    .or_else(|| existing.and_then(|u| u.note.clone())),
            };
            inner.users.insert(telegram_id, merged);
            Ok(())
        }

        async fn delete_user(&self, telegram_id: i64) -> Result<bool, PersistenceError> {
            self.check()?;
            Ok(self.inner.lock().unwrap().users.remove(&telegram_id).is_some())
        }

        async fn list_questions(
            &self,
            category: &str,
        ) -> Result<Vec<Question>, PersistenceError> {
            self.check()?;
            let mut questions: Vec<Question> = self
                .inner
                .lock()
                .unwrap()
                .questions
                .iter()
                .filter(|q| q.category == category)
                .cloned()
                .collect();
            questions.sort_by_key(|q| q.question_order);
            Ok(questions)
        }

        async fn add_question(&self, category: &str, text: &str) -> Result<(), PersistenceError> {
            self.check()?;
            let mut inner = self.inner.lock().unwrap();
            let order = inner
                .questions
                .iter()
                .filter(|q| q.category == category)
                .count() as i32;
            inner.next_question_id += 1;
            let id = inner.next_question_id;
            inner.questions.push(Question {
                id,
                category: category.to_string(),
                question_text: text.to_string(),
                question_order: order,
            });
            Ok(())
        }

        async fn update_question_text(
            &self,
            id: i64,
            text: &str,
        ) -> Result<bool, PersistenceError> {
            self.check()?;
            let mut inner = self.inner.lock().unwrap();
            match inner.questions.iter_mut().find(|q| q.id == id) {
                Some(question) => {
                    question.question_text = text.to_string();
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn get_prompt(&self, category: &str) -> Result<String, PersistenceError> {
            self.check()?;
            Ok(self
                .inner
                .lock()
                .unwrap()
                .prompts
                .get(category)
                .cloned()
                .unwrap_or_else(|| DEFAULT_PROMPT_TEMPLATE.to_string()))
        }

        async fn upsert_prompt(
            &self,
            category: &str,
            template: &str,
        ) -> Result<(), PersistenceError> {
            self.check()?;
            self.inner
                .lock()
                .unwrap()
                .prompts
                .insert(category.to_string(), template.to_string());
            Ok(())
        }
    }
}
