/// OAuth flow step a request maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    Callback,
    CreateToken,
    CheckToken,
    ResetToken,
    ScopeToken,
    RefreshToken,
    DeleteToken,
    DeleteAuthorization,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Login => "login",
            Operation::Callback => "callback",
            Operation::CreateToken => "createToken",
            Operation::CheckToken => "checkToken",
            Operation::ResetToken => "resetToken",
            Operation::ScopeToken => "scopeToken",
            Operation::RefreshToken => "refreshToken",
            Operation::DeleteToken => "deleteToken",
            Operation::DeleteAuthorization => "deleteAuthorization",
        }
    }
}

/// A recognized (method, path) pair. Paths are relative to the router prefix.
#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub method: &'static str,
    pub path: &'static str,
    pub operation: Operation,
}

pub const ROUTES: &[Route] = &[
    Route {
        method: "GET",
        path: "/login",
        operation: Operation::Login,
    },
    Route {
        method: "GET",
        path: "/callback",
        operation: Operation::Callback,
    },
    Route {
        method: "POST",
        path: "/token",
        operation: Operation::CreateToken,
    },
    Route {
        method: "GET",
        path: "/token",
        operation: Operation::CheckToken,
    },
    Route {
        method: "PATCH",
        path: "/token",
        operation: Operation::ResetToken,
    },
    Route {
        method: "POST",
        path: "/token/scoped",
        operation: Operation::ScopeToken,
    },
    Route {
        method: "PATCH",
        path: "/refresh-token",
        operation: Operation::RefreshToken,
    },
    Route {
        method: "DELETE",
        path: "/token",
        operation: Operation::DeleteToken,
    },
    Route {
        method: "DELETE",
        path: "/grant",
        operation: Operation::DeleteAuthorization,
    },
];

/// Finds the operation for a request.
///
/// The method is compared case-insensitively, the path must equal
/// `prefix + route path` exactly. Query strings are not part of `path`.
pub fn match_route(prefix: &str, method: &str, path: &str) -> Option<Operation> {
    let rest = path.strip_prefix(prefix)?;
    ROUTES
        .iter()
        .find(|route| route.path == rest && route.method.eq_ignore_ascii_case(method))
        .map(|route| route.operation)
}
