use crate::ports::auth::TokenAuth;

/// Single shared-token authorizer, configured from the environment. Stands
/// in for the real user/session system behind the same port.
pub struct StaticTokenAuth {
    token: String,
}

impl StaticTokenAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl TokenAuth for StaticTokenAuth {
    fn is_authorized(&self, bearer_token: Option<&str>) -> bool {
        match bearer_token {
            Some(presented) => !self.token.is_empty() && presented == self.token,
            None => false,
        }
    }
}
