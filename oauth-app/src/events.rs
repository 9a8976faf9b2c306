//! Notifications emitted by [`GitHubApp`](crate::GitHubApp) after token operations succeed.

use std::fmt;
use std::sync::Arc;

use crate::types::{Authentication, Scope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    Token,
    Authorization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionName {
    Created,
    Reset,
    Deleted,
    Refreshed,
    Scoped,
}

/// Event a handler can subscribe to. `Token` and `Authorization` match every
/// action of that event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Token,
    TokenCreated,
    TokenReset,
    TokenRefreshed,
    TokenScoped,
    TokenDeleted,
    Authorization,
    AuthorizationDeleted,
}

impl Event {
    pub fn name(self) -> EventName {
        match self {
            Event::Authorization | Event::AuthorizationDeleted => EventName::Authorization,
            _ => EventName::Token,
        }
    }

    /// `None` for the catch-all events
    pub fn action(self) -> Option<ActionName> {
        match self {
            Event::Token | Event::Authorization => None,
            Event::TokenCreated => Some(ActionName::Created),
            Event::TokenReset => Some(ActionName::Reset),
            Event::TokenRefreshed => Some(ActionName::Refreshed),
            Event::TokenScoped => Some(ActionName::Scoped),
            Event::TokenDeleted | Event::AuthorizationDeleted => Some(ActionName::Deleted),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Event::Token => "token",
            Event::TokenCreated => "token.created",
            Event::TokenReset => "token.reset",
            Event::TokenRefreshed => "token.refreshed",
            Event::TokenScoped => "token.scoped",
            Event::TokenDeleted => "token.deleted",
            Event::Authorization => "authorization",
            Event::AuthorizationDeleted => "authorization.deleted",
        }
    }

    fn matches(self, emitted: Event) -> bool {
        self == emitted || (self.action().is_none() && self.name() == emitted.name())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct EventContext {
    pub name: EventName,
    pub action: ActionName,
    pub token: String,
    pub scopes: Option<Vec<Scope>>,
    pub authentication: Option<Authentication>,
}

pub type EventHandler = Arc<dyn Fn(&EventContext) + Send + Sync>;

/// Subscriptions, fixed once the app is built
#[derive(Clone, Default)]
pub(crate) struct EventHandlers {
    handlers: Vec<(Event, EventHandler)>,
}

impl EventHandlers {
    pub(crate) fn add(&mut self, event: Event, handler: EventHandler) {
        self.handlers.push((event, handler));
    }

    /// Runs every handler subscribed to `event`. `event` must carry an action.
    pub(crate) fn emit(
        &self,
        event: Event,
        token: &str,
        authentication: Option<&Authentication>,
    ) {
        let Some(action) = event.action() else {
            return;
        };
        let context = EventContext {
            name: event.name(),
            action,
            token: token.to_string(),
            scopes: authentication.and_then(|auth| auth.scopes.clone()),
            authentication: authentication.cloned(),
        };
        for (subscribed, handler) in &self.handlers {
            if subscribed.matches(event) {
                handler(&context);
            }
        }
    }
}
