//! Client-side synchronization of the user collection.
//!
//! [`UserCollectionSync`] is the single writer for the record list, the form draft,
//! the notification banner and the loading flag. Every mutating operation is split
//! in three steps so the network round trip never holds a borrow of the state:
//!
//! 1. *prepare* (`begin_load`, `prepare_save`, `prepare_delete`) validates and
//!    returns the [`Request`] to issue, or `None` when nothing should be sent;
//! 2. [`Request::execute`] talks to a [`UserApi`] and yields a [`Completion`];
//! 3. [`UserCollectionSync::apply`] folds the completion back into the state.
//!
//! Completions are applied in the order they arrive, not the order their requests
//! were issued. The record list only ever changes on a confirmed success.
//!
use tracing::{debug, info, warn};

use crate::api::{UserApi, UserPayload, UserRecord};
use crate::error::{RequestError, ValidationError};

pub const MSG_FETCH_ERROR: &str = "Error fetching data.";
pub const MSG_FIELDS_REQUIRED: &str = "All fields are required.";
pub const MSG_ADDED: &str = "User added successfully!";
pub const MSG_SAVE_ERROR: &str = "Error saving data.";
pub const MSG_UPDATED: &str = "User updated successfully!";
pub const MSG_UPDATE_ERROR: &str = "Error updating data.";
pub const MSG_DELETED: &str = "User deleted successfully!";
pub const MSG_DELETE_ERROR: &str = "Error deleting data.";
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this user?";

/// Draft behind the add/update form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditBuffer {
    /// `None` while creating a new record.
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub is_update: bool,
}

impl EditBuffer {
    pub fn from_record(rec: &UserRecord) -> Self {
        Self {
            id: Some(rec.id),
            name: rec.name.clone(),
            email: rec.email.clone(),
            phone: rec.phone.clone(),
            is_update: true,
        }
    }

    /// Presence check only; whitespace counts as a value.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.email.is_empty() {
            return Err(ValidationError::MissingField("email"));
        }
        if self.phone.is_empty() {
            return Err(ValidationError::MissingField("phone"));
        }
        Ok(())
    }

    fn payload(&self, id: Option<i64>) -> UserPayload {
        UserPayload {
            id,
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Blocking yes/no prompt consulted before a delete is issued.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// A network call that has been validated and is ready to be issued.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    LoadAll,
    Create {
        /// Locally computed `max(id) + 1`; the id returned by the server wins.
        candidate_id: i64,
        payload: UserPayload,
    },
    Update {
        id: i64,
        payload: UserPayload,
    },
    Delete {
        id: i64,
    },
}

/// Outcome of an executed [`Request`].
#[derive(Debug)]
pub enum Completion {
    Loaded(Result<Vec<UserRecord>, RequestError>),
    Created(Result<UserRecord, RequestError>),
    Updated {
        id: i64,
        result: Result<UserRecord, RequestError>,
    },
    Deleted {
        id: i64,
        result: Result<(), RequestError>,
    },
}

impl Request {
    pub async fn execute(self, api: &dyn UserApi) -> Completion {
        match self {
            Request::LoadAll => {
                debug!("fetching user collection");
                Completion::Loaded(api.list().await)
            }
            Request::Create {
                candidate_id,
                payload,
            } => {
                debug!(candidate_id, name = %payload.name, "creating user");
                Completion::Created(api.create(&payload).await)
            }
            Request::Update { id, payload } => {
                debug!(id, "updating user");
                Completion::Updated {
                    id,
                    result: api.update(id, &payload).await,
                }
            }
            Request::Delete { id } => {
                debug!(id, "deleting user");
                Completion::Deleted {
                    id,
                    result: api.delete(id).await,
                }
            }
        }
    }
}

/// Owns the in-memory mirror of the remote user collection.
#[derive(Debug, Default)]
pub struct UserCollectionSync {
    records: Vec<UserRecord>,
    buffer: EditBuffer,
    editing: bool,
    notification: String,
    loading: bool,
}

impl UserCollectionSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already known collection. Duplicate ids keep their first occurrence.
    pub fn with_records(records: Vec<UserRecord>) -> Self {
        Self {
            records: dedup_by_id(records),
            ..Self::default()
        }
    }

    pub fn records(&self) -> &[UserRecord] {
        &self.records
    }

    pub fn record(&self, id: i64) -> Option<&UserRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn buffer(&self) -> &EditBuffer {
        &self.buffer
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Current banner text; empty means nothing to show.
    pub fn notification(&self) -> &str {
        &self.notification
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        self.buffer.name = value.into();
    }

    pub fn set_email(&mut self, value: impl Into<String>) {
        self.buffer.email = value.into();
    }

    pub fn set_phone(&mut self, value: impl Into<String>) {
        self.buffer.phone = value.into();
    }

    /// Mutable access to the draft for character-level editing in the form.
    pub fn buffer_mut(&mut self) -> &mut EditBuffer {
        &mut self.buffer
    }

    /// Candidate id for a new record: one past the largest known id, or 1.
    pub fn next_candidate_id(&self) -> i64 {
        self.records
            .iter()
            .map(|r| r.id)
            .max()
            .map_or(1, |max| max.saturating_add(1))
    }

    /// Mark the collection as loading and return the request that fetches it.
    pub fn begin_load(&mut self) -> Request {
        self.loading = true;
        Request::LoadAll
    }

    /// Open the form on an existing record. Unknown ids are ignored.
    pub fn begin_edit(&mut self, id: i64) {
        if let Some(rec) = self.records.iter().find(|r| r.id == id) {
            self.buffer = EditBuffer::from_record(rec);
            self.editing = true;
        }
    }

    /// Open an empty form for a new record.
    pub fn begin_create(&mut self) {
        self.buffer = EditBuffer::default();
        self.editing = true;
    }

    /// Drop the draft, close the form and clear the banner.
    pub fn clear(&mut self) {
        self.buffer = EditBuffer::default();
        self.editing = false;
        self.notification.clear();
    }

    /// Validate the draft and build the create or update request for it.
    pub fn prepare_save(&mut self) -> Option<Request> {
        if let Err(e) = self.buffer.validate() {
            debug!(error = %e, "save rejected");
            self.notification = MSG_FIELDS_REQUIRED.to_string();
            return None;
        }
        match (self.buffer.is_update, self.buffer.id) {
            (true, Some(id)) => Some(Request::Update {
                id,
                payload: self.buffer.payload(Some(id)),
            }),
            _ => Some(Request::Create {
                candidate_id: self.next_candidate_id(),
                payload: self.buffer.payload(None),
            }),
        }
    }

    /// Guard and confirm a delete. Non-positive ids are rejected before prompting.
    pub fn prepare_delete<C>(&mut self, id: i64, confirm: &mut C) -> Option<Request>
    where
        C: Confirm + ?Sized,
    {
        if id <= 0 {
            return None;
        }
        if !confirm.confirm(DELETE_PROMPT) {
            debug!(id, "delete declined");
            return None;
        }
        Some(Request::Delete { id })
    }

    /// Fold a finished request into the state.
    pub fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Loaded(Ok(records)) => {
                info!(count = records.len(), "user collection loaded");
                self.records = dedup_by_id(records);
                self.loading = false;
            }
            Completion::Loaded(Err(e)) => {
                warn!(error = %e, "fetching user collection failed");
                self.loading = false;
                self.notification = MSG_FETCH_ERROR.to_string();
            }
            Completion::Created(Ok(rec)) => {
                info!(id = rec.id, "user created");
                match self.position(rec.id) {
                    Some(pos) => {
                        warn!(id = rec.id, "server returned an id already present; replacing entry");
                        self.place(pos, rec);
                    }
                    None => self.records.push(rec),
                }
                self.clear();
                self.notification = MSG_ADDED.to_string();
            }
            Completion::Created(Err(e)) => {
                warn!(error = %e, "creating user failed");
                self.notification = MSG_SAVE_ERROR.to_string();
            }
            Completion::Updated { id, result: Ok(rec) } => {
                info!(id, "user updated");
                match self.position(id) {
                    Some(pos) => self.place(pos, rec),
                    None => warn!(id, "updated user no longer present locally"),
                }
                self.clear();
                self.notification = MSG_UPDATED.to_string();
            }
            Completion::Updated { id, result: Err(e) } => {
                warn!(id, error = %e, "updating user failed");
                self.notification = MSG_UPDATE_ERROR.to_string();
            }
            Completion::Deleted { id, result: Ok(()) } => {
                info!(id, "user deleted");
                if let Some(pos) = self.position(id) {
                    self.records.remove(pos);
                }
                self.notification = MSG_DELETED.to_string();
            }
            Completion::Deleted { id, result: Err(e) } => {
                warn!(id, error = %e, "deleting user failed");
                self.notification = MSG_DELETE_ERROR.to_string();
            }
        }
    }

    /// Fetch the whole collection and apply the result.
    pub async fn load(&mut self, api: &dyn UserApi) {
        let req = self.begin_load();
        let done = req.execute(api).await;
        self.apply(done);
    }

    /// Save the draft (create or update) and apply the result.
    pub async fn save(&mut self, api: &dyn UserApi) {
        if let Some(req) = self.prepare_save() {
            let done = req.execute(api).await;
            self.apply(done);
        }
    }

    /// Confirm, delete and apply the result.
    pub async fn delete<C>(&mut self, id: i64, api: &dyn UserApi, confirm: &mut C)
    where
        C: Confirm + ?Sized,
    {
        if let Some(req) = self.prepare_delete(id, confirm) {
            let done = req.execute(api).await;
            self.apply(done);
        }
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    /// Overwrite the entry at `pos` and drop any other entry sharing the new id.
    fn place(&mut self, pos: usize, rec: UserRecord) {
        let id = rec.id;
        self.records[pos] = rec;
        let mut idx = 0;
        self.records.retain(|r| {
            let keep = idx == pos || r.id != id;
            idx += 1;
            keep
        });
    }
}

fn dedup_by_id(records: Vec<UserRecord>) -> Vec<UserRecord> {
    let mut seen = std::collections::HashSet::new();
    records.into_iter().filter(|r| seen.insert(r.id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: i64, name: &str) -> UserRecord {
        UserRecord {
            id,
            name: name.to_string(),
            email: format!("{}@x.com", name.to_lowercase()),
            phone: "555".to_string(),
        }
    }

    fn err() -> RequestError {
        RequestError::Status {
            status: 500,
            url: "http://test/users".into(),
        }
    }

    fn fill(sync: &mut UserCollectionSync, name: &str, email: &str, phone: &str) {
        sync.set_name(name);
        sync.set_email(email);
        sync.set_phone(phone);
    }

    #[test]
    fn begin_edit_copies_record_and_opens_form() {
        let mut sync = UserCollectionSync::with_records(vec![rec(1, "Ann"), rec(2, "Bo")]);
        sync.begin_edit(2);
        assert!(sync.is_editing());
        assert_eq!(sync.buffer(), &EditBuffer::from_record(&rec(2, "Bo")));
        assert!(sync.buffer().is_update);
    }

    #[test]
    fn begin_edit_unknown_id_is_a_no_op() {
        let mut sync = UserCollectionSync::with_records(vec![rec(1, "Ann")]);
        sync.begin_create();
        sync.set_name("draft");
        let before = sync.buffer().clone();
        sync.begin_edit(99);
        assert_eq!(sync.buffer(), &before);
        assert!(sync.is_editing());

        let mut closed = UserCollectionSync::with_records(vec![rec(1, "Ann")]);
        closed.begin_edit(99);
        assert!(!closed.is_editing());
        assert_eq!(closed.buffer(), &EditBuffer::default());
    }

    #[test]
    fn clear_resets_everything_and_is_idempotent() {
        let mut sync = UserCollectionSync::with_records(vec![rec(1, "Ann")]);
        sync.begin_edit(1);
        sync.set_name("");
        assert!(sync.prepare_save().is_none());
        assert_eq!(sync.notification(), MSG_FIELDS_REQUIRED);

        sync.clear();
        assert!(!sync.is_editing());
        assert_eq!(sync.buffer(), &EditBuffer::default());
        assert_eq!(sync.notification(), "");
        sync.clear();
        assert_eq!(sync.buffer(), &EditBuffer::default());
    }

    #[test]
    fn save_with_empty_field_keeps_form_open() {
        for (n, e, p) in [("", "a@x", "1"), ("A", "", "1"), ("A", "a@x", "")] {
            let mut sync = UserCollectionSync::new();
            sync.begin_create();
            fill(&mut sync, n, e, p);
            assert!(sync.prepare_save().is_none());
            assert_eq!(sync.notification(), MSG_FIELDS_REQUIRED);
            assert!(sync.is_editing());
        }
    }

    #[test]
    fn whitespace_counts_as_present() {
        let mut sync = UserCollectionSync::new();
        sync.begin_create();
        fill(&mut sync, " ", " ", " ");
        assert!(sync.prepare_save().is_some());
    }

    #[test]
    fn create_candidate_is_max_plus_one() {
        let mut sync = UserCollectionSync::with_records(vec![rec(3, "C"), rec(10, "J"), rec(4, "D")]);
        sync.begin_create();
        fill(&mut sync, "A", "a@x.com", "123");
        match sync.prepare_save() {
            Some(Request::Create { candidate_id, payload }) => {
                assert_eq!(candidate_id, 11);
                assert_eq!(payload.id, None);
                assert_eq!(payload.name, "A");
            }
            other => panic!("unexpected request: {other:?}"),
        }

        assert_eq!(UserCollectionSync::new().next_candidate_id(), 1);
    }

    #[test]
    fn created_record_uses_server_id_and_closes_form() {
        let mut sync = UserCollectionSync::with_records(vec![rec(1, "Ann")]);
        sync.begin_create();
        fill(&mut sync, "A", "a@x.com", "123");
        assert!(sync.prepare_save().is_some());

        sync.apply(Completion::Created(Ok(rec(42, "A"))));
        let ids: Vec<i64> = sync.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 42]);
        assert_eq!(sync.notification(), MSG_ADDED);
        assert!(!sync.is_editing());
        assert_eq!(sync.buffer(), &EditBuffer::default());
    }

    #[test]
    fn created_record_with_existing_id_replaces_in_place() {
        let mut sync = UserCollectionSync::with_records(vec![rec(1, "Ann"), rec(11, "Old")]);
        sync.apply(Completion::Created(Ok(rec(11, "New"))));
        assert_eq!(sync.records().len(), 2);
        assert_eq!(sync.record(11).map(|r| r.name.as_str()), Some("New"));
    }

    #[test]
    fn failed_create_keeps_draft() {
        let mut sync = UserCollectionSync::new();
        sync.begin_create();
        fill(&mut sync, "A", "a@x.com", "123");
        let draft = sync.buffer().clone();
        sync.apply(Completion::Created(Err(err())));
        assert_eq!(sync.notification(), MSG_SAVE_ERROR);
        assert!(sync.is_editing());
        assert_eq!(sync.buffer(), &draft);
        assert!(sync.records().is_empty());
    }

    #[test]
    fn update_replaces_matching_record() {
        let mut sync = UserCollectionSync::with_records(vec![rec(1, "Ann"), rec(2, "Bo")]);
        sync.begin_edit(2);
        sync.set_name("Bob");
        let req = sync.prepare_save();
        assert!(matches!(req, Some(Request::Update { id: 2, ref payload }) if payload.id == Some(2)));

        sync.apply(Completion::Updated { id: 2, result: Ok(rec(2, "Bob")) });
        assert_eq!(sync.records()[1].name, "Bob");
        assert_eq!(sync.notification(), MSG_UPDATED);
        assert!(!sync.is_editing());
    }

    #[test]
    fn update_returning_other_id_keeps_ids_unique() {
        let mut sync = UserCollectionSync::with_records(vec![rec(1, "Ann"), rec(2, "Bo")]);
        sync.apply(Completion::Updated { id: 2, result: Ok(rec(1, "Moved")) });
        assert_eq!(sync.records(), &[rec(1, "Moved")]);
    }

    #[test]
    fn failed_update_leaves_state() {
        let mut sync = UserCollectionSync::with_records(vec![rec(1, "Ann")]);
        sync.begin_edit(1);
        sync.set_name("Zed");
        sync.apply(Completion::Updated { id: 1, result: Err(err()) });
        assert_eq!(sync.notification(), MSG_UPDATE_ERROR);
        assert_eq!(sync.records(), &[rec(1, "Ann")]);
        assert!(sync.is_editing());
        assert_eq!(sync.buffer().name, "Zed");
    }

    #[test]
    fn delete_guard_never_prompts_for_non_positive_ids() {
        let mut sync = UserCollectionSync::with_records(vec![rec(1, "Ann")]);
        let mut prompted = 0;
        for id in [0, -1, i64::MIN] {
            let req = sync.prepare_delete(id, &mut |_: &str| {
                prompted += 1;
                true
            });
            assert!(req.is_none());
        }
        assert_eq!(prompted, 0);
    }

    #[test]
    fn delete_asks_with_prompt_and_respects_answer() {
        let mut sync = UserCollectionSync::with_records(vec![rec(1, "Ann")]);
        let mut seen = String::new();
        let declined = sync.prepare_delete(1, &mut |p: &str| {
            seen = p.to_string();
            false
        });
        assert!(declined.is_none());
        assert_eq!(seen, DELETE_PROMPT);

        let accepted = sync.prepare_delete(1, &mut |_: &str| true);
        assert_eq!(accepted, Some(Request::Delete { id: 1 }));
    }

    #[test]
    fn delete_success_removes_only_that_record() {
        let mut sync = UserCollectionSync::with_records(vec![rec(1, "Ann")]);
        sync.apply(Completion::Deleted { id: 1, result: Ok(()) });
        assert!(sync.records().is_empty());
        assert_eq!(sync.notification(), MSG_DELETED);
    }

    #[test]
    fn delete_failure_keeps_collection() {
        let mut sync = UserCollectionSync::with_records(vec![rec(1, "Ann"), rec(2, "Bo")]);
        sync.apply(Completion::Deleted { id: 1, result: Err(err()) });
        assert_eq!(sync.records().len(), 2);
        assert_eq!(sync.notification(), MSG_DELETE_ERROR);
    }

    #[test]
    fn load_failure_clears_loading_and_reports() {
        let mut sync = UserCollectionSync::new();
        assert_eq!(sync.begin_load(), Request::LoadAll);
        assert!(sync.is_loading());
        sync.apply(Completion::Loaded(Err(err())));
        assert!(!sync.is_loading());
        assert!(sync.records().is_empty());
        assert_eq!(sync.notification(), MSG_FETCH_ERROR);
    }

    #[test]
    fn load_success_replaces_and_dedups() {
        let mut sync = UserCollectionSync::with_records(vec![rec(9, "Old")]);
        sync.begin_load();
        sync.apply(Completion::Loaded(Ok(vec![rec(1, "Ann"), rec(2, "Bo"), rec(1, "Dup")])));
        assert!(!sync.is_loading());
        assert_eq!(sync.records(), &[rec(1, "Ann"), rec(2, "Bo")]);
    }

    #[test]
    fn completions_apply_in_arrival_order() {
        let mut sync = UserCollectionSync::with_records(vec![rec(1, "Ann"), rec(2, "Bo"), rec(3, "Cy")]);
        // Issued: delete 1, then delete 3. Arrived: 3 failed first, then 1 succeeded.
        sync.apply(Completion::Deleted { id: 3, result: Err(err()) });
        sync.apply(Completion::Deleted { id: 1, result: Ok(()) });
        assert_eq!(sync.records(), &[rec(2, "Bo"), rec(3, "Cy")]);
        assert_eq!(sync.notification(), MSG_DELETED);
    }
}
