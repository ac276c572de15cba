/// Questions seeded for every newly created business category, in order.
pub const DEFAULT_QUESTIONS: [&str; 4] = [
    "Что именно вас приятно удивило или впечатлило при посещении?",
    "Какие качества персонала вызвали у вас доверие и помогли почувствовать себя комфортно?",
    "Как изменилось ваше состояние или решилась проблема после обращения?",
    "Почему бы вы порекомендовали нас друзьям или родственникам?",
];

/// Template used when a category has no prompt row. `{}` is the slot the
/// downstream generation pipeline fills with collected answers.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "На основе следующих ответов составь отзыв:\n\n{}\n\nСоставь связный, теплый отзыв, будто писал клиент, который остался доволен сервисом.";
