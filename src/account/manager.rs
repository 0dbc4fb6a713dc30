/// Account manager: seeding, login and profiles
use crate::{
    account::{
        normalize_identity,
        password::{hash_password, verify_password},
        HintTier, LoginOutcome, Profile,
    },
    clock::Clock,
    config::ServerConfig,
    db::UserRepository,
    error::{LuneError, LuneResult},
    session::LoginAttempts,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Account manager service
pub struct AccountManager {
    users: Arc<dyn UserRepository>,
    config: Arc<ServerConfig>,
    clock: Arc<dyn Clock>,
}

impl AccountManager {
    pub fn new(
        users: Arc<dyn UserRepository>,
        config: Arc<ServerConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            config,
            clock,
        }
    }

    /// Make sure both configured accounts exist with their current secrets.
    ///
    /// Missing accounts are created; an account whose stored hash no longer
    /// matches the configured secret is rehashed.
    pub async fn seed_users(&self) -> LuneResult<()> {
        for seed in &self.config.users {
            match self.users.find_user(&seed.name).await? {
                None => {
                    let hash = hash_password(&seed.secret)?;
                    self.users
                        .insert_user(&seed.name, &hash, &seed.favorite_color, self.clock.now())
                        .await?;
                    info!("Seeded account {}", seed.name);
                }
                Some(user) => {
                    let current = verify_password(&seed.secret, &user.password_hash).unwrap_or(false);
                    if !current {
                        let hash = hash_password(&seed.secret)?;
                        self.users.update_password_hash(&seed.name, &hash).await?;
                        info!("Updated secret for account {}", seed.name);
                    }
                }
            }
        }

        Ok(())
    }

    /// Run one login attempt.
    ///
    /// `attempts` is only written back once the attempt has been fully
    /// evaluated, so a storage error leaves the session untouched.
    pub async fn login(
        &self,
        attempts: &mut LoginAttempts,
        identity: &str,
        secret: &str,
    ) -> LuneResult<LoginOutcome> {
        let identity = normalize_identity(identity);
        let mut next = attempts.clone();
        next.begin(&identity);

        if let Some(mut user) = self.users.find_user(&identity).await? {
            if verify_password(secret, &user.password_hash)? {
                let now = self.clock.now();
                self.users.record_login(&identity, now).await?;

                user.visit_count += 1;
                user.last_login = Some(now);

                next.reset(&identity);
                *attempts = next;

                info!("Login succeeded for {}", identity);
                return Ok(LoginOutcome::Success(user));
            }
        }

        let count = next.record_failure(&identity);
        let seed = self.config.user_seed(&identity);
        let hint = seed.and_then(|s| HintTier::from_failures(count).hint_for(s));
        *attempts = next;

        if seed.is_some() {
            debug!("Login failed for {} (attempt {})", identity, count);
        } else {
            warn!("Login attempted for unknown identity (attempt {})", count);
        }

        Ok(LoginOutcome::Failed {
            attempts: count,
            hint,
            known: seed.is_some(),
        })
    }

    /// Hint currently owed to the identity last attempted in this session
    pub fn pending_hint(&self, attempts: &LoginAttempts) -> Option<String> {
        let identity = attempts.last_identity()?;
        let seed = self.config.user_seed(identity)?;
        HintTier::from_failures(attempts.count(identity)).hint_for(seed)
    }

    pub async fn profile(&self, username: &str) -> LuneResult<Profile> {
        let user = self
            .users
            .find_user(username)
            .await?
            .ok_or_else(|| LuneError::NotFound(format!("User {} not found", username)))?;

        Ok(Profile {
            username: user.username,
            favorite_color: user.favorite_color,
            visit_count: user.visit_count,
            last_login: user.last_login,
            partner: self.config.partner_of(username).map(|p| p.name.clone()),
        })
    }
}
