//! In-memory test doubles for the core ports.
//!
//! Every fake appends to a shared [`Journal`] so tests can assert the exact
//! order in which the orchestrators touched each subsystem. Failures are
//! injected per fake through the `fail_*` setters.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use chatdocs_types::chatbot::{Chatbot, ChatbotId, DocumentUpload, ProcessingAck};
use chatdocs_types::error::{RepositoryError, StorageError, UpstreamError};
use chatdocs_types::user::{NewUser, User, UserId};
use chrono::{DateTime, Utc};

use crate::processing::ProcessingService;
use crate::repository::chatbot::ChatbotRepository;
use crate::repository::token::AccessTokenRepository;
use crate::repository::user::UserRepository;
use crate::service::creation::CreationOrchestrator;
use crate::service::credentials::CredentialHasher;
use crate::service::deletion::DeletionOrchestrator;
use crate::storage::ObjectStore;

/// Ordered log of side-effecting calls across all fakes.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Entries starting with `prefix`, in order.
    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.starts_with(prefix))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Record store
// ---------------------------------------------------------------------------

pub struct FakeChatbots {
    rows: Mutex<BTreeMap<ChatbotId, Chatbot>>,
    next_id: AtomicI64,
    fail_create: Mutex<Option<RepositoryError>>,
    fail_delete: Mutex<HashSet<ChatbotId>>,
    journal: Journal,
}

impl FakeChatbots {
    pub fn new(journal: Journal) -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            fail_create: Mutex::new(None),
            fail_delete: Mutex::new(HashSet::new()),
            journal,
        }
    }

    /// Insert a row directly, bypassing the journal.
    pub fn seed(&self, owner_id: UserId, name: &str) -> Chatbot {
        let id = ChatbotId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let now = Utc::now();
        let chatbot = Chatbot {
            id,
            name: name.to_string(),
            owner_id,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().insert(id, chatbot.clone());
        chatbot
    }

    pub fn contains(&self, id: ChatbotId) -> bool {
        self.rows.lock().unwrap().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn fail_create(&self, err: RepositoryError) {
        *self.fail_create.lock().unwrap() = Some(err);
    }

    pub fn fail_delete_of(&self, id: ChatbotId) {
        self.fail_delete.lock().unwrap().insert(id);
    }
}

impl ChatbotRepository for FakeChatbots {
    async fn create(&self, name: &str, owner_id: UserId) -> Result<Chatbot, RepositoryError> {
        self.journal.record("record.create");
        if let Some(err) = self.fail_create.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.seed(owner_id, name))
    }

    async fn find_by_id(&self, id: ChatbotId) -> Result<Option<Chatbot>, RepositoryError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_owner(&self, owner_id: UserId) -> Result<Vec<Chatbot>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list_ids_by_owner(&self, owner_id: UserId) -> Result<Vec<ChatbotId>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.owner_id == owner_id)
            .map(|c| c.id)
            .collect())
    }

    async fn delete(&self, id: ChatbotId) -> Result<(), RepositoryError> {
        self.journal.record(format!("record.delete:{id}"));
        if self.fail_delete.lock().unwrap().contains(&id) {
            return Err(RepositoryError::Query("database is locked".to_string()));
        }
        match self.rows.lock().unwrap().remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound),
        }
    }
}

// ---------------------------------------------------------------------------
// Object store
// ---------------------------------------------------------------------------

pub struct FakeObjects {
    objects: Mutex<BTreeMap<String, Bytes>>,
    puts: AtomicUsize,
    fail_put_at: Mutex<Option<usize>>,
    fail_deletes: Mutex<bool>,
    fail_prefix: Mutex<HashSet<String>>,
    journal: Journal,
}

impl FakeObjects {
    pub fn new(journal: Journal) -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            puts: AtomicUsize::new(0),
            fail_put_at: Mutex::new(None),
            fail_deletes: Mutex::new(false),
            fail_prefix: Mutex::new(HashSet::new()),
            journal,
        }
    }

    pub fn seed(&self, key: &str, content: &'static [u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), Bytes::from_static(content));
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn keys_under(&self, prefix: &str) -> Vec<String> {
        self.keys()
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect()
    }

    /// Make the `n`th put (1-based, counted across the fake's lifetime) fail.
    pub fn fail_put_at(&self, n: usize) {
        *self.fail_put_at.lock().unwrap() = Some(n);
    }

    /// Make `delete_many` fail.
    pub fn fail_deletes(&self) {
        *self.fail_deletes.lock().unwrap() = true;
    }

    /// Make `delete_by_prefix` fail for this exact prefix.
    pub fn fail_prefix(&self, prefix: &str) {
        self.fail_prefix.lock().unwrap().insert(prefix.to_string());
    }
}

impl ObjectStore for FakeObjects {
    async fn put(
        &self,
        key: &str,
        content: Bytes,
        _content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        let n = self.puts.fetch_add(1, Ordering::SeqCst) + 1;
        self.journal.record(format!("objects.put:{key}"));
        if *self.fail_put_at.lock().unwrap() == Some(n) {
            return Err(StorageError::Transport {
                operation: "put_object",
                message: "connection reset".to_string(),
            });
        }
        self.objects.lock().unwrap().insert(key.to_string(), content);
        Ok(key.to_string())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<(), StorageError> {
        self.journal.record(format!("objects.delete_many:{}", keys.join(",")));
        if *self.fail_deletes.lock().unwrap() {
            return Err(StorageError::PermissionDenied {
                operation: "delete_objects",
                message: "access denied".to_string(),
            });
        }
        let mut objects = self.objects.lock().unwrap();
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<usize, StorageError> {
        self.journal.record(format!("objects.delete_prefix:{prefix}"));
        if self.fail_prefix.lock().unwrap().contains(prefix) {
            return Err(StorageError::Transport {
                operation: "list_objects_v2",
                message: "timed out".to_string(),
            });
        }
        let mut objects = self.objects.lock().unwrap();
        let doomed: Vec<String> = objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        for key in &doomed {
            objects.remove(key);
        }
        Ok(doomed.len())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self.keys_under(prefix))
    }
}

// ---------------------------------------------------------------------------
// Processing service
// ---------------------------------------------------------------------------

pub struct FakeProcessing {
    /// External state: chatbot id -> (owner header, filenames).
    ingested: Mutex<HashMap<ChatbotId, (UserId, Vec<String>)>>,
    fail_submit: Mutex<Option<UpstreamError>>,
    submit_status: Mutex<u16>,
    fail_delete: Mutex<HashSet<ChatbotId>>,
    journal: Journal,
}

impl FakeProcessing {
    pub fn new(journal: Journal) -> Self {
        Self {
            ingested: Mutex::new(HashMap::new()),
            fail_submit: Mutex::new(None),
            submit_status: Mutex::new(200),
            fail_delete: Mutex::new(HashSet::new()),
            journal,
        }
    }

    pub fn seed(&self, chatbot_id: ChatbotId, owner_id: UserId) {
        self.ingested
            .lock()
            .unwrap()
            .insert(chatbot_id, (owner_id, Vec::new()));
    }

    pub fn holds(&self, chatbot_id: ChatbotId) -> bool {
        self.ingested.lock().unwrap().contains_key(&chatbot_id)
    }

    pub fn ingested_files(&self, chatbot_id: ChatbotId) -> Option<Vec<String>> {
        self.ingested
            .lock()
            .unwrap()
            .get(&chatbot_id)
            .map(|(_, files)| files.clone())
    }

    pub fn fail_submit(&self, err: UpstreamError) {
        *self.fail_submit.lock().unwrap() = Some(err);
    }

    /// Acknowledge submissions with this status instead of 200.
    pub fn submit_status(&self, status: u16) {
        *self.submit_status.lock().unwrap() = status;
    }

    pub fn fail_delete_of(&self, chatbot_id: ChatbotId) {
        self.fail_delete.lock().unwrap().insert(chatbot_id);
    }
}

impl ProcessingService for FakeProcessing {
    async fn submit_documents(
        &self,
        chatbot_id: ChatbotId,
        owner_id: UserId,
        _name: &str,
        documents: &[DocumentUpload],
    ) -> Result<ProcessingAck, UpstreamError> {
        self.journal.record(format!("processing.submit:{chatbot_id}"));
        if let Some(err) = self.fail_submit.lock().unwrap().clone() {
            return Err(err);
        }
        let status = *self.submit_status.lock().unwrap();
        if (200..300).contains(&status) {
            let files = documents.iter().map(|d| d.filename.clone()).collect();
            self.ingested
                .lock()
                .unwrap()
                .insert(chatbot_id, (owner_id, files));
        }
        Ok(ProcessingAck { status, body: None })
    }

    async fn delete_chatbot_data(
        &self,
        chatbot_id: ChatbotId,
        _owner_id: UserId,
    ) -> Result<ProcessingAck, UpstreamError> {
        self.journal.record(format!("processing.delete:{chatbot_id}"));
        if self.fail_delete.lock().unwrap().contains(&chatbot_id) {
            return Err(UpstreamError::Status {
                endpoint: "/delete".to_string(),
                status: 500,
                body: "internal error".to_string(),
            });
        }
        self.ingested.lock().unwrap().remove(&chatbot_id);
        Ok(ProcessingAck {
            status: 200,
            body: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Users, tokens, credentials
// ---------------------------------------------------------------------------

pub struct FakeUsers {
    rows: Mutex<BTreeMap<UserId, User>>,
    next_id: AtomicI64,
    fail_delete: Mutex<bool>,
    journal: Journal,
}

impl FakeUsers {
    pub fn new(journal: Journal) -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            fail_delete: Mutex::new(false),
            journal,
        }
    }

    pub fn contains(&self, id: UserId) -> bool {
        self.rows.lock().unwrap().contains_key(&id)
    }

    pub fn fail_deletes(&self) {
        *self.fail_delete.lock().unwrap() = true;
    }
}

impl UserRepository for FakeUsers {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(format!(
                "email '{}' already exists",
                user.email
            )));
        }
        let id = UserId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let created = User {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            roles: user.roles.clone(),
            created_at: Utc::now(),
        };
        rows.insert(id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        self.journal.record(format!("user.delete:{id}"));
        if *self.fail_delete.lock().unwrap() {
            return Err(RepositoryError::Connection);
        }
        match self.rows.lock().unwrap().remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound),
        }
    }
}

#[derive(Default)]
pub struct FakeTokens {
    tokens: Mutex<HashMap<String, (UserId, DateTime<Utc>)>>,
}

impl FakeTokens {
    pub fn count(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }

    /// Move every token's issue time back by `age`.
    pub fn age_all(&self, age: chrono::Duration) {
        for (_, issued_at) in self.tokens.lock().unwrap().values_mut() {
            *issued_at -= age;
        }
    }
}

impl AccessTokenRepository for FakeTokens {
    async fn insert(&self, user_id: UserId, token_hash: &str) -> Result<(), RepositoryError> {
        self.tokens
            .lock()
            .unwrap()
            .insert(token_hash.to_string(), (user_id, Utc::now()));
        Ok(())
    }

    async fn resolve(
        &self,
        token_hash: &str,
        issued_after: DateTime<Utc>,
    ) -> Result<Option<UserId>, RepositoryError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .get(token_hash)
            .filter(|(_, issued_at)| *issued_at >= issued_after)
            .map(|(user_id, _)| *user_id))
    }

    async fn purge_issued_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut tokens = self.tokens.lock().unwrap();
        let before = tokens.len();
        tokens.retain(|_, (_, issued_at)| *issued_at >= cutoff);
        Ok((before - tokens.len()) as u64)
    }

    async fn revoke_all(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let mut tokens = self.tokens.lock().unwrap();
        let before = tokens.len();
        tokens.retain(|_, (owner, _)| *owner != user_id);
        Ok((before - tokens.len()) as u64)
    }
}

/// Reversible "hashing" so tests can read what was stored.
#[derive(Default)]
pub struct PlainHasher {
    minted: AtomicUsize,
}

impl CredentialHasher for PlainHasher {
    fn hash_password(&self, password: &str) -> Result<String, chatdocs_types::error::UserError> {
        Ok(format!("plain:{password}"))
    }

    fn verify_password(&self, password: &str, hash: &str) -> bool {
        hash == format!("plain:{password}")
    }

    fn new_access_token(&self) -> String {
        format!("token-{}", self.minted.fetch_add(1, Ordering::SeqCst))
    }

    fn hash_access_token(&self, token: &str) -> String {
        format!("digest:{token}")
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// All three subsystems sharing one journal.
pub struct Harness {
    pub journal: Journal,
    pub chatbots: Arc<FakeChatbots>,
    pub objects: Arc<FakeObjects>,
    pub processing: Arc<FakeProcessing>,
}

impl Harness {
    pub fn new() -> Self {
        let journal = Journal::default();
        Self {
            chatbots: Arc::new(FakeChatbots::new(journal.clone())),
            objects: Arc::new(FakeObjects::new(journal.clone())),
            processing: Arc::new(FakeProcessing::new(journal.clone())),
            journal,
        }
    }

    pub fn creation(&self) -> CreationOrchestrator<FakeChatbots, FakeObjects, FakeProcessing> {
        CreationOrchestrator::new(
            self.chatbots.clone(),
            self.objects.clone(),
            self.processing.clone(),
        )
    }

    pub fn deletion(&self) -> DeletionOrchestrator<FakeChatbots, FakeObjects, FakeProcessing> {
        DeletionOrchestrator::new(
            self.chatbots.clone(),
            self.objects.clone(),
            self.processing.clone(),
        )
    }

    /// A chatbot that exists in all three subsystems with the given files.
    pub fn seed_chatbot(&self, owner_id: UserId, name: &str, files: &[&str]) -> Chatbot {
        let chatbot = self.chatbots.seed(owner_id, name);
        for file in files {
            let key = chatdocs_types::chatbot::document_key(owner_id, chatbot.id, file);
            self.objects.seed(&key, b"seeded");
        }
        self.processing.seed(chatbot.id, owner_id);
        chatbot
    }
}

pub fn doc(name: &str) -> DocumentUpload {
    DocumentUpload::new(name, Some("text/plain"), format!("contents of {name}").into_bytes())
}
