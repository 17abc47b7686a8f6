//! In-memory collaborators and a seeded fixture for router and gate tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use crate::access::Principal;
use crate::app::{app, AppState};
use crate::config::AppConfig;
use crate::database::models::{
    Establishment, EstablishmentWithOwner, Jammer, JammerOwnership, NewEstablishment, NewJammer,
    NewUser, OwnerSummary, User,
};
use crate::database::{Store, StoreError};
use crate::identity::{Identity, IdentityError, IdentityProvider, Session};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    establishments: BTreeMap<i64, Establishment>,
    jammers: BTreeMap<i64, Jammer>,
    next_establishment: i64,
    next_jammer: i64,
}

/// [`Store`] held in memory. Counts every write so tests can assert
/// that a rejected request touched nothing.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    mutations: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn wrote(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store poisoned")
    }

    pub fn seed_user(&self, email: &str, nome: &str, is_admin: bool) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            nome: nome.to_string(),
            is_admin,
            created_at: Utc::now(),
        };
        self.tables().users.push(user.clone());
        user
    }

    pub fn seed_establishment(&self, owner: Uuid, nome: &str) -> Establishment {
        let mut tables = self.tables();
        tables.next_establishment += 1;
        let establishment = Establishment {
            id: tables.next_establishment,
            user_id: owner,
            nome: nome.to_string(),
            cep: "01001-000".to_string(),
            created_at: Utc::now(),
        };
        tables.establishments.insert(establishment.id, establishment.clone());
        establishment
    }

    pub fn seed_jammer(&self, establishment: i64, estado_jammer: bool) -> Jammer {
        let mut tables = self.tables();
        tables.next_jammer += 1;
        let jammer = Jammer {
            id: tables.next_jammer,
            id_estabelecimento: establishment,
            estado_jammer,
            created_at: Utc::now(),
        };
        tables.jammers.insert(jammer.id, jammer.clone());
        jammer
    }

    /// Jammer whose parent establishment does not exist
    pub fn orphan_jammer(&self, missing_establishment: i64) -> Jammer {
        self.seed_jammer(missing_establishment, false)
    }

    pub fn jammer(&self, id: i64) -> Option<Jammer> {
        self.tables().jammers.get(&id).cloned()
    }

    pub fn establishment(&self, id: i64) -> Option<Establishment> {
        self.tables().establishments.get(&id).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.tables().users.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables();
        if tables.users.iter().any(|u| u.id == user.id || u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }
        let row = User {
            id: user.id,
            email: user.email,
            nome: user.nome,
            is_admin: false,
            created_at: Utc::now(),
        };
        tables.users.push(row.clone());
        drop(tables);
        self.wrote();
        Ok(row)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.tables().users.clone())
    }

    async fn list_establishments(&self, owner: Option<Uuid>) -> Result<Vec<Establishment>, StoreError> {
        Ok(self
            .tables()
            .establishments
            .values()
            .filter(|e| owner.map_or(true, |o| e.user_id == o))
            .cloned()
            .collect())
    }

    async fn list_establishments_with_owner(&self) -> Result<Vec<EstablishmentWithOwner>, StoreError> {
        let tables = self.tables();
        Ok(tables
            .establishments
            .values()
            .map(|e| EstablishmentWithOwner {
                establishment: e.clone(),
                users: tables.users.iter().find(|u| u.id == e.user_id).map(|u| OwnerSummary {
                    id: u.id,
                    email: u.email.clone(),
                    nome: u.nome.clone(),
                }),
            })
            .collect())
    }

    async fn find_establishment(&self, id: i64) -> Result<Option<Establishment>, StoreError> {
        Ok(self.establishment(id))
    }

    async fn insert_establishment(&self, new: NewEstablishment) -> Result<Establishment, StoreError> {
        let mut tables = self.tables();
        if !tables.users.iter().any(|u| u.id == new.user_id) {
            return Err(StoreError::MissingReference("establishment_user_id_fkey".to_string()));
        }
        tables.next_establishment += 1;
        let row = Establishment {
            id: tables.next_establishment,
            user_id: new.user_id,
            nome: new.nome,
            cep: new.cep,
            created_at: Utc::now(),
        };
        tables.establishments.insert(row.id, row.clone());
        drop(tables);
        self.wrote();
        Ok(row)
    }

    async fn delete_establishment(&self, id: i64) -> Result<Option<Establishment>, StoreError> {
        let removed = self.tables().establishments.remove(&id);
        if removed.is_some() {
            self.wrote();
        }
        Ok(removed)
    }

    async fn list_jammers(&self, establishment: Option<i64>) -> Result<Vec<Jammer>, StoreError> {
        Ok(self
            .tables()
            .jammers
            .values()
            .filter(|j| establishment.map_or(true, |e| j.id_estabelecimento == e))
            .cloned()
            .collect())
    }

    async fn find_jammer_ownership(&self, id: i64) -> Result<Option<JammerOwnership>, StoreError> {
        let tables = self.tables();
        Ok(tables.jammers.get(&id).map(|jammer| JammerOwnership {
            jammer: jammer.clone(),
            owner: tables.establishments.get(&jammer.id_estabelecimento).map(|e| e.user_id),
        }))
    }

    async fn insert_jammer(&self, new: NewJammer) -> Result<Jammer, StoreError> {
        let mut tables = self.tables();
        if !tables.establishments.contains_key(&new.id_estabelecimento) {
            return Err(StoreError::MissingReference("jammers_id_estabelecimento_fkey".to_string()));
        }
        tables.next_jammer += 1;
        let row = Jammer {
            id: tables.next_jammer,
            id_estabelecimento: new.id_estabelecimento,
            estado_jammer: new.estado_jammer,
            created_at: Utc::now(),
        };
        tables.jammers.insert(row.id, row.clone());
        drop(tables);
        self.wrote();
        Ok(row)
    }

    async fn update_jammer_state(&self, id: i64, estado_jammer: bool) -> Result<Option<Jammer>, StoreError> {
        let updated = self.tables().jammers.get_mut(&id).map(|j| {
            j.estado_jammer = estado_jammer;
            j.clone()
        });
        if updated.is_some() {
            self.wrote();
        }
        Ok(updated)
    }

    async fn delete_jammer(&self, id: i64) -> Result<Option<Jammer>, StoreError> {
        let removed = self.tables().jammers.remove(&id);
        if removed.is_some() {
            self.wrote();
        }
        Ok(removed)
    }

    async fn delete_jammers_of(&self, establishment: i64) -> Result<u64, StoreError> {
        let mut tables = self.tables();
        let before = tables.jammers.len();
        tables.jammers.retain(|_, j| j.id_estabelecimento != establishment);
        let removed = (before - tables.jammers.len()) as u64;
        drop(tables);
        if removed > 0 {
            self.wrote();
        }
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

struct Account {
    identity: Identity,
    password: String,
}

/// [`IdentityProvider`] that issues opaque `token-<uuid>` strings.
#[derive(Default)]
pub struct MemoryIdentity {
    accounts: Mutex<HashMap<String, Account>>,
    tokens: Mutex<HashMap<String, Identity>>,
    resets: Mutex<Vec<(String, Option<String>)>>,
    resolve_calls: AtomicUsize,
    sign_up_calls: AtomicUsize,
    unreachable: AtomicBool,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account and return a valid access token for it
    pub fn register(&self, id: Uuid, email: &str, password: &str) -> String {
        let identity = Identity {
            id,
            email: email.to_string(),
        };
        self.accounts.lock().expect("identity poisoned").insert(
            email.to_lowercase(),
            Account {
                identity: identity.clone(),
                password: password.to_string(),
            },
        );
        self.issue(identity)
    }

    fn issue(&self, identity: Identity) -> String {
        let token = format!("token-{}", Uuid::new_v4());
        self.tokens.lock().expect("identity poisoned").insert(token.clone(), identity);
        token
    }

    pub fn password_of(&self, email: &str) -> Option<String> {
        self.accounts
            .lock()
            .expect("identity poisoned")
            .get(&email.to_lowercase())
            .map(|a| a.password.clone())
    }

    pub fn resets(&self) -> Vec<(String, Option<String>)> {
        self.resets.lock().expect("identity poisoned").clone()
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn sign_up_calls(&self) -> usize {
        self.sign_up_calls.load(Ordering::SeqCst)
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> Result<(), IdentityError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(IdentityError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        self.check_reachable()?;
        self.sign_up_calls.fetch_add(1, Ordering::SeqCst);
        let mut accounts = self.accounts.lock().expect("identity poisoned");
        if accounts.contains_key(&email.to_lowercase()) {
            return Err(IdentityError::AlreadyRegistered);
        }
        let identity = Identity {
            id: Uuid::new_v4(),
            email: email.to_string(),
        };
        accounts.insert(
            email.to_lowercase(),
            Account {
                identity: identity.clone(),
                password: password.to_string(),
            },
        );
        Ok(identity)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        self.check_reachable()?;
        let identity = {
            let accounts = self.accounts.lock().expect("identity poisoned");
            match accounts.get(&email.to_lowercase()) {
                Some(account) if account.password == password => account.identity.clone(),
                _ => return Err(IdentityError::InvalidCredentials),
            }
        };
        let access_token = self.issue(identity.clone());
        Ok(Session {
            access_token,
            refresh_token: format!("refresh-{}", Uuid::new_v4()),
            token_type: "bearer".to_string(),
            expires_in: 3600,
            user: identity,
        })
    }

    async fn request_password_reset(&self, email: &str, redirect_to: Option<&str>) -> Result<(), IdentityError> {
        self.check_reachable()?;
        self.resets
            .lock()
            .expect("identity poisoned")
            .push((email.to_string(), redirect_to.map(str::to_string)));
        Ok(())
    }

    async fn apply_new_password(&self, access_token: &str, new_password: &str) -> Result<(), IdentityError> {
        self.check_reachable()?;
        let identity = self
            .tokens
            .lock()
            .expect("identity poisoned")
            .get(access_token)
            .cloned()
            .ok_or_else(|| IdentityError::InvalidToken("unknown token".to_string()))?;
        let mut accounts = self.accounts.lock().expect("identity poisoned");
        match accounts.get_mut(&identity.email.to_lowercase()) {
            Some(account) => {
                account.password = new_password.to_string();
                Ok(())
            }
            None => Err(IdentityError::InvalidToken("account gone".to_string())),
        }
    }

    async fn resolve(&self, token: &str) -> Result<Identity, IdentityError> {
        self.check_reachable()?;
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .lock()
            .expect("identity poisoned")
            .get(token)
            .cloned()
            .ok_or_else(|| IdentityError::InvalidToken("unknown token".to_string()))
    }
}

/// Owner with one establishment holding one jammer, an unrelated user,
/// and an administrator. Each user has a valid token.
pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub identity: Arc<MemoryIdentity>,
    pub owner: User,
    pub stranger: User,
    pub admin: User,
    pub establishment: Establishment,
    pub jammer: Jammer,
    tokens: HashMap<Uuid, String>,
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(MemoryIdentity::new());

        let owner = store.seed_user("dono@example.com", "Dono", false);
        let stranger = store.seed_user("outro@example.com", "Outro", false);
        let admin = store.seed_user("admin@example.com", "Admin", true);

        let mut tokens = HashMap::new();
        for user in [&owner, &stranger, &admin] {
            tokens.insert(user.id, identity.register(user.id, &user.email, "senha-segura"));
        }

        let establishment = store.seed_establishment(owner.id, "Loja Centro");
        let jammer = store.seed_jammer(establishment.id, false);

        Self {
            store,
            identity,
            owner,
            stranger,
            admin,
            establishment,
            jammer,
            tokens,
        }
    }

    pub fn principal(&self, user: &User) -> Principal {
        Principal {
            id: user.id,
            email: user.email.clone(),
        }
    }

    pub fn token(&self, user: &User) -> String {
        self.tokens.get(&user.id).cloned().unwrap_or_default()
    }

    pub fn state(&self) -> AppState {
        AppState::new(
            self.identity.clone(),
            self.store.clone(),
            Arc::new(AppConfig::for_tests()),
        )
    }

    pub fn app(&self) -> Router {
        app(self.state())
    }
}

/// Drive one request through the router and decode the JSON envelope.
pub async fn call(app: Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request builds");

    let response = app.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body reads").to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body is JSON")
    };
    (status, json)
}
