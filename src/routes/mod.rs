/// Router Module Index
///
/// Routing is split by access level so the authentication gate is applied once, at
/// the module boundary, and no protected endpoint can be mounted by accident.

/// Routes open to anonymous visitors: contact form, public gallery, login.
pub mod public;

/// Routes behind the bearer-token gate, nested under `/api/admin`.
pub mod admin;
