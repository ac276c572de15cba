use std::collections::HashSet;

/// Access guard for the admin console. The allow-list is loaded once at
/// startup and never changes while the process runs.
#[derive(Debug, Clone)]
pub struct AdminGuard {
    admin_ids: HashSet<i64>,
}

impl AdminGuard {
    pub fn new(admin_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            admin_ids: admin_ids.into_iter().collect(),
        }
    }

    /// Pure membership test, no side effects.
    pub fn authorize(&self, identity: i64) -> bool {
        self.admin_ids.contains(&identity)
    }
}
