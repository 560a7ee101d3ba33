/// Authorization collaborator. The HTTP surface asks it before touching the
/// catalog or the file store; issuing and refreshing credentials happens
/// elsewhere.
pub trait TokenAuth: Send + Sync {
    fn is_authorized(&self, bearer_token: Option<&str>) -> bool;
}
