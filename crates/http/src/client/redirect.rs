//! Hook invoked when the session is lost and the user must sign in again

/// Receiver of the "go to login" signal raised by the request pipeline
///
/// Called after the session has been cleared, once per failed refresh.
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self);
}

impl<F> LoginRedirect for F
where
    F: Fn() + Send + Sync,
{
    fn redirect_to_login(&self) {
        self();
    }
}

/// Redirect that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRedirect;

impl LoginRedirect for NoRedirect {
    fn redirect_to_login(&self) {}
}
