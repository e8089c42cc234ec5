/// Middleware module
///
/// Access token and CSRF guards for protected scopes.

mod access_guard;
mod csrf_guard;

pub use access_guard::AccessGuard;
pub use csrf_guard::CsrfGuard;
