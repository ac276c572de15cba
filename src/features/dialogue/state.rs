/// Dialogue states. Every state accepts exactly two input classes: a finite
/// set of choice tokens, and (for the states that wait for typed data) free
/// text. Exit is not represented here; it is signalled by a terminal reply
/// that destroys the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    MainMenu,
    UserMenu,
    QuestionMenu,
    PromptMenu,
    SelectCategory,
    AddCategory,
    AddUser,
    RemoveUser,
    ListUsers,
    AddQuestion,
    EditQuestionSelectId,
    EditQuestionText,
    EditUserSelect,
    EditUsernameInput,
    EditCommentInput,
    EditPromptInput,
}
