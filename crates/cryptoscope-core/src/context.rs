/// Identity of the caller on whose behalf an operation runs.
///
/// Passed explicitly into every ownership-scoped operation; nothing reads the
/// current user from ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: i64,
}

impl RequestContext {
    #[must_use]
    pub fn new(user_id: i64) -> Self {
        Self { user_id }
    }
}
