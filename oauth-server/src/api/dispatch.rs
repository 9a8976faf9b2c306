use oauth_app::{AppError, OAuthApp};

use crate::api::extract::Params;
use crate::api::respond::{authorization_url, random_state, Outcome};
use crate::errors::RouterError;

/// Runs a validated operation against the app.
///
/// Login and callback errors are answered without calling the app.
pub async fn dispatch(app: &dyn OAuthApp, params: Params) -> Result<Outcome, RouterError> {
    match params {
        Params::Login {
            state,
            scopes,
            redirect_url,
            allow_signup,
        } => {
            let settings = app.settings();
            let state = state.unwrap_or_else(random_state);
            let scopes = scopes.or_else(|| settings.login_scopes());
            let allow_signup = allow_signup.or(settings.allow_signup);
            let url = authorization_url(
                settings,
                &state,
                scopes.as_deref(),
                redirect_url.as_deref(),
                allow_signup,
            )?;
            Ok(Outcome::Redirect(url))
        }
        Params::CallbackError { error, description } => {
            let message = match description {
                Some(description) => format!("{error} {description}"),
                None => error,
            };
            Err(RouterError::Provider(AppError::Rejected(message)))
        }
        Params::Callback(options) => {
            let created = app.create_token(options).await?;
            Ok(Outcome::TokenPage(created.authentication.token))
        }
        Params::CreateToken(options) => Ok(Outcome::Created(app.create_token(options).await?)),
        Params::CheckToken(options) => Ok(Outcome::Json(app.check_token(options).await?)),
        Params::ResetToken(options) => Ok(Outcome::Json(app.reset_token(options).await?)),
        Params::ScopeToken(options) => Ok(Outcome::Json(app.scope_token(options).await?)),
        Params::RefreshToken(options) => Ok(Outcome::Json(app.refresh_token(options).await?)),
        Params::DeleteToken(options) => {
            app.delete_token(options).await?;
            Ok(Outcome::NoContent)
        }
        Params::DeleteAuthorization(options) => {
            app.delete_authorization(options).await?;
            Ok(Outcome::NoContent)
        }
    }
}
