//! List view controller.
//!
//! Owns the form fields, the edit target, the displayed list, and the notice
//! banner. Each user action is one awaited store request followed by a full
//! refresh of the list. Store calls run on the blocking pool and are bounded
//! by a timeout; every failure ends up in the notice instead of escaping.
//!
//! A timed-out call cannot be cancelled. Its task is kept and the next store
//! call waits for it first, so requests never overlap. A change that timed out
//! may still land, so further changes are refused until a refresh shows the
//! outcome.

use std::sync::Arc;
use std::time::Duration;

use domain::service::FriendService;
use domain::{CoreError, Friend, FriendId, FriendRepository};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What the list is doing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Editing {
        id: FriendId,
        name: String,
        age: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Dismissible.
    Error,
    /// Storage is gone for this session; stays up and mutations are disabled.
    Fatal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("storage did not respond within {} ms", .0.as_millis())]
    Timeout(Duration),
    #[error("storage task failed: {0}")]
    Task(String),
    #[error("storage is unavailable, changes are disabled")]
    Disabled,
    #[error("no friend is being edited")]
    NotEditing,
    #[error("friend {0} is not in the list")]
    UnknownRecord(FriendId),
    #[error("the previous `{0}` request is still running, try again shortly")]
    Busy(&'static str),
    #[error("an earlier change may still have been saved; refresh before making more changes")]
    Unconfirmed,
}

// Store call abandoned by a timeout but still running on the blocking pool.
struct InFlight {
    op: &'static str,
    task: JoinHandle<()>,
}

/// Everything the presentation layer renders.
#[derive(Debug)]
pub struct View<'a> {
    pub friends: &'a [Friend],
    pub mode: &'a Mode,
    pub add_name: &'a str,
    pub add_age: &'a str,
    pub notice: Option<&'a Notice>,
    pub disabled: bool,
}

pub struct ListController<R: FriendRepository + 'static> {
    service: Arc<FriendService<R>>,
    timeout: Duration,
    add_name: String,
    add_age: String,
    mode: Mode,
    friends: Vec<Friend>,
    notice: Option<Notice>,
    disabled: bool,
    in_flight: Option<InFlight>,
    unconfirmed_write: bool,
}

impl<R: FriendRepository + 'static> ListController<R> {
    pub fn new(service: FriendService<R>, timeout: Duration) -> Self {
        Self {
            service: Arc::new(service),
            timeout,
            add_name: String::new(),
            add_age: String::new(),
            mode: Mode::Idle,
            friends: Vec::new(),
            notice: None,
            disabled: false,
            in_flight: None,
            unconfirmed_write: false,
        }
    }

    pub fn view(&self) -> View<'_> {
        View {
            friends: &self.friends,
            mode: &self.mode,
            add_name: &self.add_name,
            add_age: &self.add_age,
            notice: self.notice.as_ref(),
            disabled: self.disabled,
        }
    }

    /// Initial load of the list.
    pub async fn mount(&mut self) -> Result<(), ActionError> {
        self.refresh().await
    }

    /// Re-read every record and replace the displayed list. On failure the
    /// previous list stays, being the last successful read.
    pub async fn refresh(&mut self) -> Result<(), ActionError> {
        match self.run("list_all", |svc| svc.list_all()).await {
            Ok(friends) => {
                debug!(count = friends.len(), "list refreshed");
                self.friends = friends;
                self.unconfirmed_write = false;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    pub fn set_add_name(&mut self, name: impl Into<String>) {
        self.add_name = name.into();
    }

    pub fn set_add_age(&mut self, age: impl Into<String>) {
        self.add_age = age.into();
    }

    /// Insert the add form as a new friend, clear the form, refresh.
    pub async fn add(&mut self) -> Result<(), ActionError> {
        self.ensure_enabled()?;
        self.ensure_confirmed()?;
        let (name, age) = (self.add_name.clone(), self.add_age.clone());
        match self.run("insert", move |svc| svc.add(&name, &age)).await {
            Ok(id) => {
                info!(%id, "friend added");
                self.add_name.clear();
                self.add_age.clear();
                self.clear_error();
                self.refresh().await
            }
            Err(e) => Err(self.fail_write(e)),
        }
    }

    /// Remove a friend and refresh. Removing an unknown id is not an error.
    pub async fn delete(&mut self, id: FriendId) -> Result<(), ActionError> {
        self.ensure_enabled()?;
        self.ensure_confirmed()?;
        match self.run("remove", move |svc| svc.remove(id)).await {
            Ok(()) => {
                info!(%id, "friend deleted");
                if matches!(self.mode, Mode::Editing { id: editing, .. } if editing == id) {
                    self.mode = Mode::Idle;
                }
                self.clear_error();
                self.refresh().await
            }
            Err(e) => Err(self.fail_write(e)),
        }
    }

    /// Enter edit mode for a listed friend. The edit fields are pre-filled
    /// from the stored record, which may be newer than the displayed row.
    pub async fn begin_edit(&mut self, id: FriendId) -> Result<(), ActionError> {
        self.ensure_enabled()?;
        if !self.friends.iter().any(|f| f.id == id) {
            return Err(self.fail(ActionError::UnknownRecord(id)));
        }
        match self.run("get", move |svc| svc.get(id)).await {
            Ok(Some(friend)) => {
                self.mode = Mode::Editing {
                    id,
                    name: friend.name,
                    age: friend.age.to_string(),
                };
                Ok(())
            }
            Ok(None) => {
                warn!(%id, "friend to edit no longer exists");
                self.mode = Mode::Idle;
                let _ = self.refresh().await;
                Err(self.fail(ActionError::Core(CoreError::NotFound)))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    pub fn set_edit_name(&mut self, value: impl Into<String>) -> Result<(), ActionError> {
        if let Mode::Editing { name, .. } = &mut self.mode {
            *name = value.into();
            return Ok(());
        }
        Err(self.fail(ActionError::NotEditing))
    }

    pub fn set_edit_age(&mut self, value: impl Into<String>) -> Result<(), ActionError> {
        if let Mode::Editing { age, .. } = &mut self.mode {
            *age = value.into();
            return Ok(());
        }
        Err(self.fail(ActionError::NotEditing))
    }

    /// Leave edit mode without touching the store.
    pub fn cancel_edit(&mut self) -> Result<(), ActionError> {
        match self.mode {
            Mode::Editing { .. } => {
                self.mode = Mode::Idle;
                Ok(())
            }
            Mode::Idle => Err(self.fail(ActionError::NotEditing)),
        }
    }

    /// Save the edit fields.
    ///
    /// Success returns to `Idle` and refreshes. A record that vanished in the
    /// meantime also returns to `Idle` and refreshes. Any other failure keeps
    /// the edit open with the typed values so it can be retried.
    pub async fn update(&mut self) -> Result<(), ActionError> {
        let Mode::Editing { id, name, age } = self.mode.clone() else {
            return Err(self.fail(ActionError::NotEditing));
        };
        self.ensure_enabled()?;
        self.ensure_confirmed()?;
        match self.run("update", move |svc| svc.update(id, &name, &age)).await {
            Ok(()) => {
                info!(%id, "friend updated");
                self.mode = Mode::Idle;
                self.clear_error();
                self.refresh().await
            }
            Err(ActionError::Core(CoreError::NotFound)) => {
                warn!(%id, "edited friend no longer exists");
                self.mode = Mode::Idle;
                // A failed refresh sets its own notice; the missing record is
                // the more useful message either way.
                let _ = self.refresh().await;
                Err(self.fail(ActionError::Core(CoreError::NotFound)))
            }
            Err(e) => Err(self.fail_write(e)),
        }
    }

    /// Hide a dismissible notice. Fatal notices stay.
    pub fn dismiss_notice(&mut self) {
        if matches!(&self.notice, Some(n) if n.severity == Severity::Error) {
            self.notice = None;
        }
    }

    fn ensure_enabled(&self) -> Result<(), ActionError> {
        if self.disabled {
            return Err(ActionError::Disabled);
        }
        Ok(())
    }

    fn ensure_confirmed(&mut self) -> Result<(), ActionError> {
        if self.unconfirmed_write {
            return Err(self.fail(ActionError::Unconfirmed));
        }
        Ok(())
    }

    fn clear_error(&mut self) {
        self.dismiss_notice();
    }

    // Record a failure as the visible notice and hand it back to the caller.
    fn fail(&mut self, err: ActionError) -> ActionError {
        let fatal = matches!(err, ActionError::Core(CoreError::StorageUnavailable(_)));
        if fatal {
            self.disabled = true;
            self.mode = Mode::Idle;
            warn!(error = %err, "storage unavailable, disabling changes");
        } else {
            debug!(error = %err, "action failed");
        }
        let already_fatal = matches!(&self.notice, Some(n) if n.severity == Severity::Fatal);
        if fatal || !already_fatal {
            let message = match &err {
                ActionError::Core(CoreError::NotFound) => {
                    "that friend no longer exists; the list was reloaded".to_string()
                }
                other => other.to_string(),
            };
            self.notice = Some(Notice {
                severity: if fatal { Severity::Fatal } else { Severity::Error },
                message,
            });
        }
        err
    }

    // A timed-out mutation has an unknown outcome until the list is re-read.
    fn fail_write(&mut self, err: ActionError) -> ActionError {
        if matches!(err, ActionError::Timeout(_)) {
            self.unconfirmed_write = true;
        }
        self.fail(err)
    }

    // Wait, bounded by the timeout, for a call abandoned earlier.
    async fn settle(&mut self) -> Result<(), ActionError> {
        let Some(mut prev) = self.in_flight.take() else {
            return Ok(());
        };
        if tokio::time::timeout(self.timeout, &mut prev.task).await.is_err() {
            let op = prev.op;
            self.in_flight = Some(prev);
            return Err(ActionError::Busy(op));
        }
        debug!(op = prev.op, "abandoned store call finished");
        Ok(())
    }

    async fn run<T, F>(&mut self, op: &'static str, f: F) -> Result<T, ActionError>
    where
        T: Send + 'static,
        F: FnOnce(&FriendService<R>) -> Result<T, CoreError> + Send + 'static,
    {
        self.settle().await?;
        let service = Arc::clone(&self.service);
        let mut task = tokio::task::spawn_blocking(move || f(service.as_ref()));
        let outcome = tokio::time::timeout(self.timeout, &mut task).await;
        match outcome {
            Ok(Ok(result)) => result.map_err(ActionError::from),
            Ok(Err(join)) => Err(ActionError::Task(join.to_string())),
            Err(_) => {
                warn!(op, timeout_ms = self.timeout.as_millis() as u64, "store call timed out");
                self.in_flight = Some(InFlight {
                    op,
                    task: tokio::spawn(async move {
                        let _ = task.await;
                    }),
                });
                Err(ActionError::Timeout(self.timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::adapters::memory_repo::InMemoryRepo;
    use domain::NewFriend;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory store with switchable faults and a write counter.
    #[derive(Default)]
    struct ScriptedRepo {
        inner: InMemoryRepo,
        writes: AtomicUsize,
        fail_reads: Mutex<Option<CoreError>>,
        fail_writes: Mutex<Option<CoreError>>,
        read_delay: Mutex<Option<Duration>>,
        write_delay: Mutex<Option<Duration>>,
        panic_on_read: AtomicBool,
    }

    impl ScriptedRepo {
        fn read_fault(&self) -> Result<(), CoreError> {
            if self.panic_on_read.load(Ordering::SeqCst) {
                panic!("store crashed");
            }
            let delay = *self.read_delay.lock().unwrap();
            if let Some(delay) = delay {
                std::thread::sleep(delay);
            }
            match self.fail_reads.lock().unwrap().clone() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }

        fn write_fault(&self) -> Result<(), CoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let delay = *self.write_delay.lock().unwrap();
            if let Some(delay) = delay {
                std::thread::sleep(delay);
            }
            match self.fail_writes.lock().unwrap().clone() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }
    }

    impl FriendRepository for ScriptedRepo {
        fn list_all(&self) -> Result<Vec<Friend>, CoreError> {
            self.read_fault()?;
            self.inner.list_all()
        }
        fn insert(&self, friend: NewFriend) -> Result<FriendId, CoreError> {
            self.write_fault()?;
            self.inner.insert(friend)
        }
        fn remove(&self, id: FriendId) -> Result<(), CoreError> {
            self.write_fault()?;
            self.inner.remove(id)
        }
        fn update(&self, id: FriendId, fields: NewFriend) -> Result<(), CoreError> {
            self.write_fault()?;
            self.inner.update(id, fields)
        }
        fn get(&self, id: FriendId) -> Result<Option<Friend>, CoreError> {
            self.read_fault()?;
            self.inner.get(id)
        }
    }

    fn controller() -> (ListController<Arc<ScriptedRepo>>, Arc<ScriptedRepo>) {
        controller_with_timeout(Duration::from_secs(5))
    }

    fn controller_with_timeout(
        timeout: Duration,
    ) -> (ListController<Arc<ScriptedRepo>>, Arc<ScriptedRepo>) {
        let repo = Arc::new(ScriptedRepo::default());
        let ctl = ListController::new(FriendService::new(Arc::clone(&repo)), timeout);
        (ctl, repo)
    }

    async fn add(
        ctl: &mut ListController<Arc<ScriptedRepo>>,
        name: &str,
        age: &str,
    ) -> Result<(), ActionError> {
        ctl.set_add_name(name);
        ctl.set_add_age(age);
        ctl.add().await
    }

    fn rows(ctl: &ListController<Arc<ScriptedRepo>>) -> Vec<(u64, String, i64)> {
        ctl.view()
            .friends
            .iter()
            .map(|f| (f.id.get(), f.name.clone(), f.age))
            .collect()
    }

    #[tokio::test]
    async fn mount_shows_existing_records() {
        let (mut ctl, repo) = controller();
        repo.insert(NewFriend::new("Bob", 25)).unwrap();
        ctl.mount().await.unwrap();
        assert_eq!(rows(&ctl), vec![(1, "Bob".into(), 25)]);
        assert_eq!(ctl.view().mode, &Mode::Idle);
    }

    #[tokio::test]
    async fn add_edit_update_delete_scenario() {
        let (mut ctl, _repo) = controller();
        ctl.mount().await.unwrap();
        add(&mut ctl, "Bob", "25").await.unwrap();
        assert_eq!(ctl.view().add_name, "");
        assert_eq!(ctl.view().add_age, "");
        add(&mut ctl, "Cy", "40").await.unwrap();

        ctl.begin_edit(FriendId::new(1)).await.unwrap();
        assert_eq!(
            ctl.view().mode,
            &Mode::Editing {
                id: FriendId::new(1),
                name: "Bob".into(),
                age: "25".into()
            }
        );
        ctl.set_edit_name("Bobby").unwrap();
        ctl.set_edit_age("26").unwrap();
        ctl.update().await.unwrap();
        assert_eq!(ctl.view().mode, &Mode::Idle);
        assert_eq!(
            rows(&ctl),
            vec![(1, "Bobby".into(), 26), (2, "Cy".into(), 40)]
        );

        ctl.delete(FriendId::new(2)).await.unwrap();
        assert_eq!(rows(&ctl), vec![(1, "Bobby".into(), 26)]);
        assert!(ctl.view().notice.is_none());
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_store() {
        let (mut ctl, repo) = controller();
        let err = add(&mut ctl, "Ann", "thirty").await.unwrap_err();
        assert!(matches!(err, ActionError::Core(CoreError::InvalidInput(_))));
        let err = add(&mut ctl, "  ", "30").await.unwrap_err();
        assert!(matches!(err, ActionError::Core(CoreError::InvalidInput(_))));

        assert_eq!(repo.writes.load(Ordering::SeqCst), 0);
        assert_eq!(ctl.view().add_name, "  ");
        assert_eq!(ctl.view().add_age, "30");
        let notice = ctl.view().notice.unwrap();
        assert_eq!(notice.severity, Severity::Error);
        assert!(notice.message.contains("name is required"));
    }

    #[tokio::test]
    async fn cancel_discards_edits_without_store_access() {
        let (mut ctl, repo) = controller();
        add(&mut ctl, "Bob", "25").await.unwrap();
        let writes = repo.writes.load(Ordering::SeqCst);

        ctl.begin_edit(FriendId::new(1)).await.unwrap();
        ctl.set_edit_name("Robert").unwrap();
        ctl.cancel_edit().unwrap();
        assert_eq!(ctl.view().mode, &Mode::Idle);
        assert_eq!(repo.writes.load(Ordering::SeqCst), writes);
        assert_eq!(rows(&ctl), vec![(1, "Bob".into(), 25)]);
    }

    #[tokio::test]
    async fn edit_actions_require_edit_mode() {
        let (mut ctl, _repo) = controller();
        assert!(matches!(ctl.update().await, Err(ActionError::NotEditing)));
        assert!(matches!(ctl.cancel_edit(), Err(ActionError::NotEditing)));
        assert!(matches!(ctl.set_edit_age("1"), Err(ActionError::NotEditing)));
        assert!(matches!(
            ctl.begin_edit(FriendId::new(7)).await,
            Err(ActionError::UnknownRecord(_))
        ));
    }

    #[tokio::test]
    async fn failed_update_keeps_edit_open() {
        let (mut ctl, repo) = controller();
        add(&mut ctl, "Bob", "25").await.unwrap();
        ctl.begin_edit(FriendId::new(1)).await.unwrap();
        ctl.set_edit_name("Bobby").unwrap();

        *repo.fail_writes.lock().unwrap() = Some(CoreError::StorageWrite("disk".into()));
        let err = ctl.update().await.unwrap_err();
        assert!(matches!(err, ActionError::Core(CoreError::StorageWrite(_))));
        assert_eq!(
            ctl.view().mode,
            &Mode::Editing {
                id: FriendId::new(1),
                name: "Bobby".into(),
                age: "25".into()
            }
        );
        assert_eq!(ctl.view().notice.unwrap().severity, Severity::Error);

        *repo.fail_writes.lock().unwrap() = None;
        ctl.dismiss_notice();
        assert!(ctl.view().notice.is_none());
        ctl.update().await.unwrap();
        assert_eq!(rows(&ctl), vec![(1, "Bobby".into(), 25)]);
    }

    #[tokio::test]
    async fn update_of_vanished_record_returns_to_idle() {
        let (mut ctl, repo) = controller();
        add(&mut ctl, "Bob", "25").await.unwrap();
        add(&mut ctl, "Cy", "40").await.unwrap();
        ctl.begin_edit(FriendId::new(2)).await.unwrap();

        repo.inner.remove(FriendId::new(2)).unwrap();
        let err = ctl.update().await.unwrap_err();
        assert!(matches!(err, ActionError::Core(CoreError::NotFound)));
        assert_eq!(ctl.view().mode, &Mode::Idle);
        assert_eq!(rows(&ctl), vec![(1, "Bob".into(), 25)]);
        assert!(ctl.view().notice.unwrap().message.contains("no longer exists"));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_last_good_list() {
        let (mut ctl, repo) = controller();
        add(&mut ctl, "Bob", "25").await.unwrap();

        *repo.fail_reads.lock().unwrap() = Some(CoreError::StorageRead("io".into()));
        let err = add(&mut ctl, "Cy", "40").await.unwrap_err();
        assert!(matches!(err, ActionError::Core(CoreError::StorageRead(_))));
        assert_eq!(rows(&ctl), vec![(1, "Bob".into(), 25)]);

        *repo.fail_reads.lock().unwrap() = None;
        ctl.refresh().await.unwrap();
        assert_eq!(rows(&ctl).len(), 2);
    }

    #[tokio::test]
    async fn unavailable_store_disables_mutations() {
        let (mut ctl, repo) = controller();
        *repo.fail_reads.lock().unwrap() =
            Some(CoreError::StorageUnavailable("private mode".into()));
        let err = ctl.mount().await.unwrap_err();
        assert!(matches!(err, ActionError::Core(CoreError::StorageUnavailable(_))));

        let view = ctl.view();
        assert!(view.disabled);
        let notice = view.notice.unwrap();
        assert_eq!(notice.severity, Severity::Fatal);
        assert!(notice.message.contains("private mode"));

        assert!(matches!(add(&mut ctl, "Bob", "25").await, Err(ActionError::Disabled)));
        assert!(matches!(ctl.delete(FriendId::new(1)).await, Err(ActionError::Disabled)));
        assert_eq!(repo.writes.load(Ordering::SeqCst), 0);

        ctl.dismiss_notice();
        assert_eq!(ctl.view().notice.unwrap().severity, Severity::Fatal);
    }

    #[tokio::test]
    async fn hung_store_times_out() {
        let (mut ctl, repo) = controller_with_timeout(Duration::from_millis(20));
        *repo.read_delay.lock().unwrap() = Some(Duration::from_millis(300));
        let err = ctl.mount().await.unwrap_err();
        assert!(matches!(err, ActionError::Timeout(_)));
        let notice = ctl.view().notice.unwrap();
        assert_eq!(notice.severity, Severity::Error);
        assert!(notice.message.contains("20 ms"));
        assert!(!ctl.view().disabled);
    }

    #[tokio::test]
    async fn deleting_edited_record_leaves_edit_mode() {
        let (mut ctl, _repo) = controller();
        add(&mut ctl, "Bob", "25").await.unwrap();
        ctl.begin_edit(FriendId::new(1)).await.unwrap();
        ctl.delete(FriendId::new(1)).await.unwrap();
        assert_eq!(ctl.view().mode, &Mode::Idle);
        assert!(rows(&ctl).is_empty());
    }

    #[tokio::test]
    async fn deleting_missing_id_is_harmless() {
        let (mut ctl, _repo) = controller();
        add(&mut ctl, "Bob", "25").await.unwrap();
        ctl.delete(FriendId::new(42)).await.unwrap();
        assert_eq!(rows(&ctl).len(), 1);
        assert!(ctl.view().notice.is_none());
    }

    #[tokio::test]
    async fn timed_out_add_blocks_changes_until_refresh() {
        let (mut ctl, repo) = controller_with_timeout(Duration::from_millis(20));
        *repo.write_delay.lock().unwrap() = Some(Duration::from_millis(100));
        let err = add(&mut ctl, "Bob", "25").await.unwrap_err();
        assert!(matches!(err, ActionError::Timeout(_)));
        assert_eq!(ctl.view().add_name, "Bob");

        // The insert is still sleeping: nothing new is sent to the store.
        assert!(matches!(ctl.refresh().await, Err(ActionError::Busy("insert"))));
        assert!(matches!(ctl.add().await, Err(ActionError::Unconfirmed)));
        assert!(ctl.view().notice.unwrap().message.contains("refresh"));
        assert_eq!(repo.writes.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        ctl.refresh().await.unwrap();
        assert_eq!(rows(&ctl), vec![(1, "Bob".into(), 25)]);

        *repo.write_delay.lock().unwrap() = None;
        add(&mut ctl, "Cy", "40").await.unwrap();
        assert_eq!(rows(&ctl), vec![(1, "Bob".into(), 25), (2, "Cy".into(), 40)]);
    }

    #[tokio::test]
    async fn timed_out_read_is_awaited_before_next_call() {
        let (mut ctl, repo) = controller_with_timeout(Duration::from_millis(50));
        repo.insert(NewFriend::new("Bob", 25)).unwrap();
        *repo.read_delay.lock().unwrap() = Some(Duration::from_millis(70));
        assert!(matches!(ctl.mount().await, Err(ActionError::Timeout(_))));

        *repo.read_delay.lock().unwrap() = None;
        ctl.refresh().await.unwrap();
        assert_eq!(rows(&ctl), vec![(1, "Bob".into(), 25)]);
        // A read that timed out leaves no doubt about stored data.
        add(&mut ctl, "Cy", "40").await.unwrap();
    }

    #[tokio::test]
    async fn panicking_store_call_is_reported() {
        let (mut ctl, repo) = controller();
        repo.panic_on_read.store(true, Ordering::SeqCst);
        let err = ctl.mount().await.unwrap_err();
        assert!(matches!(err, ActionError::Task(_)));
        assert_eq!(ctl.view().notice.unwrap().severity, Severity::Error);
        assert!(!ctl.view().disabled);

        repo.panic_on_read.store(false, Ordering::SeqCst);
        ctl.refresh().await.unwrap();
    }

    #[tokio::test]
    async fn edit_is_prefilled_from_stored_record() {
        let (mut ctl, repo) = controller();
        add(&mut ctl, "Bob", "25").await.unwrap();
        repo.inner.update(FriendId::new(1), NewFriend::new("Robert", 26)).unwrap();

        ctl.begin_edit(FriendId::new(1)).await.unwrap();
        assert_eq!(
            ctl.view().mode,
            &Mode::Editing {
                id: FriendId::new(1),
                name: "Robert".into(),
                age: "26".into()
            }
        );
    }

    #[tokio::test]
    async fn editing_vanished_record_reloads_list() {
        let (mut ctl, repo) = controller();
        add(&mut ctl, "Bob", "25").await.unwrap();
        add(&mut ctl, "Cy", "40").await.unwrap();
        repo.inner.remove(FriendId::new(2)).unwrap();

        let err = ctl.begin_edit(FriendId::new(2)).await.unwrap_err();
        assert!(matches!(err, ActionError::Core(CoreError::NotFound)));
        assert_eq!(ctl.view().mode, &Mode::Idle);
        assert_eq!(rows(&ctl), vec![(1, "Bob".into(), 25)]);
        assert!(ctl.view().notice.unwrap().message.contains("no longer exists"));
    }
}
