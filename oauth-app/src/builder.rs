use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::error::AppError;
use crate::events::{Event, EventContext, EventHandler, EventHandlers};
use crate::github::GitHubApp;
use crate::logger::{LogFacade, Logger};
use crate::types::{AppSettings, ClientType, Scope};

/// Marker types to track whether client credentials have been provided.
pub struct Missing;
pub struct Present;

/// A builder for configuring a [`GitHubApp`].
/// The builder is generic over one type parameter:
/// - Credentials: whether client id and secret have been supplied.
pub struct GitHubAppBuilder<Credentials> {
    pub(crate) settings: AppSettings,
    pub(crate) client_secret: String,
    pub(crate) timeout: Duration,
    pub(crate) log: Arc<dyn Logger>,
    pub(crate) handlers: EventHandlers,
    _credentials: PhantomData<Credentials>,
}

impl GitHubAppBuilder<Missing> {
    /// Creates a new builder for an OAuth app with no credentials set.
    pub fn new() -> Self {
        Self {
            settings: AppSettings::default(),
            client_secret: String::new(),
            timeout: Duration::from_secs(10),
            log: Arc::new(LogFacade),
            handlers: EventHandlers::default(),
            _credentials: PhantomData,
        }
    }

    /// Sets the client id and secret of the app.
    pub fn with_credentials(
        self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> GitHubAppBuilder<Present> {
        GitHubAppBuilder {
            settings: AppSettings {
                client_id: client_id.into(),
                ..self.settings
            },
            client_secret: client_secret.into(),
            timeout: self.timeout,
            log: self.log,
            handlers: self.handlers,
            _credentials: PhantomData,
        }
    }
}

impl Default for GitHubAppBuilder<Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Credentials> GitHubAppBuilder<Credentials> {
    pub fn with_client_type(mut self, client_type: ClientType) -> Self {
        self.settings.client_type = client_type;
        self
    }

    /// Scopes requested on login when the caller passes none (OAuth apps only).
    pub fn with_default_scopes(mut self, scopes: Vec<Scope>) -> Self {
        self.settings.default_scopes = scopes;
        self
    }

    pub fn with_allow_signup(mut self, allow_signup: bool) -> Self {
        self.settings.allow_signup = Some(allow_signup);
        self
    }

    /// Points the app at a GitHub Enterprise Server REST root,
    /// e.g. `https://ghe.example.com/api/v3`.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, AppError> {
        self.settings.base_url = Some(Url::parse(base_url)?);
        Ok(self)
    }

    /// Sets the timeout applied to every request sent to GitHub.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_logger(mut self, log: Arc<dyn Logger>) -> Self {
        self.log = log;
        self
    }

    /// Subscribes `handler` to `event`.
    pub fn on<F>(mut self, event: Event, handler: F) -> Self
    where
        F: Fn(&EventContext) + Send + Sync + 'static,
    {
        self.handlers.add(event, Arc::new(handler));
        self
    }

    /// Subscribes `handler` to each of `events`
    pub fn on_any<I, F>(mut self, events: I, handler: F) -> Self
    where
        I: IntoIterator<Item = Event>,
        F: Fn(&EventContext) + Send + Sync + 'static,
    {
        let handler: EventHandler = Arc::new(handler);
        for event in events {
            self.handlers.add(event, handler.clone());
        }
        self
    }
}

impl GitHubAppBuilder<Present> {
    /// Builds the app and its HTTP client.
    pub fn build(self) -> Result<GitHubApp, AppError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        self.log.debug(&format!(
            "Configured {} client {} against {}",
            self.settings.client_type,
            self.settings.client_id,
            self.settings.api_url()
        ));

        Ok(GitHubApp {
            settings: self.settings,
            client_secret: self.client_secret,
            client,
            log: self.log,
            handlers: self.handlers,
        })
    }
}
