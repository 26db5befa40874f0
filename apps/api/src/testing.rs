//! In-memory doubles for the repositories, the language model and the
//! identity provider, plus a ready-made `AppState` for router tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::accounts::repo::{AccountRepository, NewIdentity};
use crate::auth::identity::{
    IdentityError, IdentityProfile, IdentityProvider, TokenClaims, TokenGrant,
};
use crate::auth::sessions::{generate_token, LoginSessionRepository};
use crate::config::{AuthMode, Config, LlmConfig, OAuthConfig};
use crate::cv::models::{Cv, CvPayload};
use crate::cv::repo::CvRepository;
use crate::errors::AppError;
use crate::interview::sessions::InterviewSessions;
use crate::llm_client::{GenerationParams, LanguageModel, LlmError, LlmGateway};
use crate::models::account::Account;
use crate::state::AppState;

pub const FIVE_QUESTIONS_REPLY: &str = "QUESTIONS:\n\
    1. What is REST?\n\
    2. How do you version a public API?\n\
    3. What is connection pooling?\n\
    4. How do you make a write idempotent?\n\
    5. How would you debug a slow endpoint?";

pub const TEST_CLIENT_ID: &str = "test-client.apps.googleusercontent.com";

// ────────────────────────────────────────────────────────────────────────────
// Repositories
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct MemoryInner {
    accounts: HashMap<Uuid, Account>,
    cvs: HashMap<Uuid, Cv>,
    logins: HashMap<String, (Uuid, chrono::DateTime<Utc>)>,
}

/// Implements every repository trait over one map set, with the same
/// uniqueness and cascade rules as the Postgres schema.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn account_count(&self) -> usize {
        self.inner.lock().unwrap().accounts.len()
    }

    pub fn cv_count(&self) -> usize {
        self.inner.lock().unwrap().cvs.len()
    }

    pub fn login_count(&self) -> usize {
        self.inner.lock().unwrap().logins.len()
    }

    pub fn insert_account(&self, name: &str, email: Option<&str>) -> Account {
        let account = Account {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.map(str::to_string),
            google_id: None,
            created_at: Utc::now(),
        };
        self.inner
            .lock()
            .unwrap()
            .accounts
            .insert(account.id, account.clone());
        account
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        Ok(self.inner.lock().unwrap().accounts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .accounts
            .values()
            .find(|a| a.email.as_deref() == Some(email))
            .cloned())
    }

    async fn create(&self, name: &str) -> Result<Account, AppError> {
        Ok(self.insert_account(name, None))
    }

    async fn find_or_create(&self, identity: &NewIdentity) -> Result<(Account, bool), AppError> {
        let mut inner = self.inner.lock().unwrap();
        let email_taken = inner
            .accounts
            .values()
            .any(|a| a.email.as_deref() == Some(identity.email.as_str()));

        if let Some(google_id) = &identity.google_id {
            if let Some(existing) = inner
                .accounts
                .values_mut()
                .find(|a| a.google_id.as_deref() == Some(google_id.as_str()))
            {
                if !email_taken {
                    existing.email = Some(identity.email.clone());
                }
                return Ok((existing.clone(), false));
            }
        }
        if let Some(existing) = inner
            .accounts
            .values()
            .find(|a| a.email.as_deref() == Some(identity.email.as_str()))
        {
            return Ok((existing.clone(), false));
        }
        let account = Account {
            id: Uuid::new_v4(),
            name: identity.name.clone(),
            email: Some(identity.email.clone()),
            google_id: identity.google_id.clone(),
            created_at: Utc::now(),
        };
        inner.accounts.insert(account.id, account.clone());
        Ok((account, true))
    }

    async fn update_name(&self, id: Uuid, name: &str) -> Result<Account, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let account = inner.accounts.get_mut(&id).ok_or(AppError::AccountNotFound)?;
        account.name = name.to_string();
        Ok(account.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        inner.accounts.remove(&id).ok_or(AppError::AccountNotFound)?;
        inner.cvs.remove(&id);
        inner.logins.retain(|_, (account_id, _)| *account_id != id);
        Ok(())
    }
}

#[async_trait]
impl CvRepository for MemoryStore {
    async fn find_for_account(&self, account_id: Uuid) -> Result<Option<Cv>, AppError> {
        Ok(self.inner.lock().unwrap().cvs.get(&account_id).cloned())
    }

    async fn upsert(&self, account_id: Uuid, payload: &CvPayload) -> Result<Cv, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let previous = inner.cvs.get(&account_id);

        let now = Utc::now();
        let updated_at = match previous {
            Some(prev) if now <= prev.updated_at => {
                prev.updated_at + chrono::Duration::microseconds(1)
            }
            _ => now,
        };

        let cv = Cv {
            id: previous.map(|p| p.id).unwrap_or_else(Uuid::new_v4),
            account_id,
            about_me: payload.about_me.clone(),
            professional_title: payload.professional_title.clone(),
            education: payload.education.clone(),
            experience: payload.experience.clone(),
            skills: payload.skills.clone(),
            updated_at,
        };
        inner.cvs.insert(account_id, cv.clone());
        Ok(cv)
    }
}

#[async_trait]
impl LoginSessionRepository for MemoryStore {
    async fn create(&self, account_id: Uuid, ttl: chrono::Duration) -> Result<String, AppError> {
        let token = generate_token();
        self.inner
            .lock()
            .unwrap()
            .logins
            .insert(token.clone(), (account_id, Utc::now() + ttl));
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Option<Uuid>, AppError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .logins
            .get(token)
            .filter(|(_, expires_at)| *expires_at > Utc::now())
            .map(|(account_id, _)| *account_id))
    }

    async fn revoke(&self, token: &str) -> Result<(), AppError> {
        self.inner.lock().unwrap().logins.remove(token);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.logins.len();
        let now = Utc::now();
        inner.logins.retain(|_, (_, expires_at)| *expires_at > now);
        Ok((before - inner.logins.len()) as u64)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Language model
// ────────────────────────────────────────────────────────────────────────────

/// Replays canned replies in order and records every prompt it receives.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    fail: bool,
}

impl ScriptedModel {
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(str::to_string).collect()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// Every call fails as if the provider returned a 500.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(vec![])
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, prompt: &str, _params: GenerationParams) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail {
            return Err(LlmError::Api {
                status: 500,
                message: "internal error".to_string(),
            });
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(LlmError::EmptyContent)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Identity provider
// ────────────────────────────────────────────────────────────────────────────

pub struct FakeIdentity {
    profile: Mutex<IdentityProfile>,
    id_token: Mutex<Option<String>>,
    claims: Mutex<Option<Result<TokenClaims, IdentityError>>>,
    fail_exchange: Mutex<bool>,
    exchanges: AtomicUsize,
}

impl Default for FakeIdentity {
    fn default() -> Self {
        Self {
            profile: Mutex::new(IdentityProfile {
                subject: Some("google-sub-1".to_string()),
                email: Some("ada@example.com".to_string()),
                name: Some("Ada".to_string()),
            }),
            id_token: Mutex::new(Some("provider-id-token".to_string())),
            claims: Mutex::new(None),
            fail_exchange: Mutex::new(false),
            exchanges: AtomicUsize::new(0),
        }
    }
}

impl FakeIdentity {
    pub fn set_profile(&self, profile: IdentityProfile) {
        *self.profile.lock().unwrap() = profile;
    }

    /// `Ok` claims are returned on every call; an `Err` is returned once.
    pub fn set_claims(&self, claims: Result<TokenClaims, IdentityError>) {
        *self.claims.lock().unwrap() = Some(claims);
    }

    pub fn fail_exchange(&self) {
        *self.fail_exchange.lock().unwrap() = true;
    }

    pub fn exchanges(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn authorization_url(&self, state: &str) -> String {
        format!("https://idp.test/auth?client_id={TEST_CLIENT_ID}&state={state}")
    }

    async fn exchange_code(&self, _code: &str) -> Result<TokenGrant, IdentityError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        if *self.fail_exchange.lock().unwrap() {
            return Err(IdentityError::MissingAccessToken);
        }
        Ok(TokenGrant {
            access_token: "access-token".to_string(),
            id_token: self.id_token.lock().unwrap().clone(),
        })
    }

    async fn fetch_profile(&self, _access_token: &str) -> Result<IdentityProfile, IdentityError> {
        Ok(self.profile.lock().unwrap().clone())
    }

    async fn introspect_id_token(&self, _id_token: &str) -> Result<TokenClaims, IdentityError> {
        let mut guard = self.claims.lock().unwrap();
        match guard.take() {
            Some(Ok(claims)) => {
                *guard = Some(Ok(claims.clone()));
                Ok(claims)
            }
            Some(Err(e)) => Err(e),
            None => Err(IdentityError::Rejected {
                status: 400,
                message: "Invalid Value".to_string(),
            }),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// App state
// ────────────────────────────────────────────────────────────────────────────

pub fn test_config(auth_mode: AuthMode) -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        oauth: OAuthConfig {
            client_id: TEST_CLIENT_ID.to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:8080/auth/callback".to_string(),
            timeout_secs: 5,
        },
        llm: LlmConfig {
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            base_url: "http://localhost:0".to_string(),
            temperature: 0.7,
            top_p: 0.95,
            timeout_secs: 5,
        },
        auth_mode,
        session_ttl_hours: 1,
        cookie_secure: false,
        post_login_redirect: "/profile".to_string(),
        interview_session_ttl_secs: 3600,
        cors_allowed_origins: vec!["http://localhost:5173".to_string()],
        port: 0,
        rust_log: "debug".to_string(),
    }
}

pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub model: Arc<ScriptedModel>,
    pub identity: Arc<FakeIdentity>,
    pub state: AppState,
}

impl TestHarness {
    pub fn new(auth_mode: AuthMode, replies: Vec<&str>) -> Self {
        let store = Arc::new(MemoryStore::default());
        let model = Arc::new(ScriptedModel::new(replies));
        let identity = Arc::new(FakeIdentity::default());
        let config = test_config(auth_mode);

        let state = AppState {
            accounts: store.clone(),
            cvs: store.clone(),
            logins: store.clone(),
            identity: identity.clone(),
            llm: LlmGateway::new(model.clone(), GenerationParams::default()),
            interviews: InterviewSessions::new(Duration::from_secs(
                config.interview_session_ttl_secs,
            )),
            config,
        };

        Self {
            store,
            model,
            identity,
            state,
        }
    }
}
