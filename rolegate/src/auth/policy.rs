//! Access policy evaluation: authentication followed by route authorization.

use tracing::{debug, instrument};

use crate::{
    auth::{
        basic::Credentials,
        credentials::CredentialStore,
        current_user::CurrentUser,
        password::PasswordEncoder,
        rules::{RouteRule, RouteRuleTable},
    },
    config::Config,
    errors::Error,
};

/// What the policy needs to know about a request.
#[derive(Debug, Clone)]
pub struct AccessRequest {
    pub path: String,
    pub credentials: Option<Credentials>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Allow,
    /// No credentials, unknown user or wrong password. The caller should be challenged.
    DenyUnauthenticated,
    /// Valid credentials, but none of the roles the matched rule requires
    DenyForbidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthDecision {
    pub outcome: AuthOutcome,
    /// Rule that governed the request; `None` if authentication failed before rule matching
    pub matched_rule: Option<RouteRule>,
    /// Verified caller, if authentication succeeded
    pub principal: Option<CurrentUser>,
}

impl AuthDecision {
    fn unauthenticated() -> Self {
        Self {
            outcome: AuthOutcome::DenyUnauthenticated,
            matched_rule: None,
            principal: None,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.outcome == AuthOutcome::Allow
    }
}

/// Immutable combination of a credential store and a route rule table. Built once at startup and
/// shared by every request.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    credentials: CredentialStore,
    rules: RouteRuleTable,
}

impl AccessPolicy {
    pub fn new(credentials: CredentialStore, rules: RouteRuleTable) -> Self {
        Self { credentials, rules }
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let encoder = PasswordEncoder::new(&config.password)?;
        let rules = RouteRuleTable::from_config(&config.rules)?;
        let credentials = CredentialStore::from_config(&config.users, encoder)?;
        Ok(Self::new(credentials, rules))
    }

    /// Decide whether `request` may proceed.
    ///
    /// Pure with respect to the static configuration: the same request always yields the same
    /// decision. Password verification is CPU-bound; async callers should run this on a
    /// blocking thread.
    #[instrument(skip_all, fields(path = %request.path))]
    pub fn decide(&self, request: &AccessRequest) -> AuthDecision {
        let Some(credentials) = &request.credentials else {
            debug!("No credentials supplied");
            return AuthDecision::unauthenticated();
        };

        let user = match self.credentials.verify(&credentials.username, &credentials.password) {
            Ok(user) => user,
            Err(failure) => {
                debug!("Authentication failed for {}: {}", credentials.username, failure);
                return AuthDecision::unauthenticated();
            }
        };

        let rule = self.rules.match_path(&request.path);
        let outcome = if rule.permits(&user.roles) {
            AuthOutcome::Allow
        } else {
            AuthOutcome::DenyForbidden
        };
        debug!("User {} on rule '{}': {:?}", user.username, rule.source, outcome);

        AuthDecision {
            outcome,
            matched_rule: Some(rule.clone()),
            principal: Some(CurrentUser::from(user)),
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn rules(&self) -> &RouteRuleTable {
        &self.rules
    }
}
