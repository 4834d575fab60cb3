use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

#[derive(Debug, Default)]
pub struct TaskSeq {
    next: u64,
}

impl TaskSeq {
    pub fn next_id(&mut self) -> TaskId {
        let id = TaskId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// Request kinds with at most one live task each. A completion whose id is no
/// longer active is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    SessionInit,
    Auth,
    FeedLoad,
    FollowsLoad,
    PostSubmit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TaskMeta {
    #[default]
    None,
    /// Shown on the login page while the request runs.
    Auth {
        label: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct TaskStarted {
    pub id: TaskId,
    pub cancel: Option<CancellationToken>,
    pub meta: TaskMeta,
}

#[derive(Debug)]
pub struct TaskCompleted<E> {
    pub id: TaskId,
    pub result: E,
}

/// Task lifecycle state (stored in AppState, mutated only by reducer).
#[derive(Debug, Default, Clone)]
pub struct TaskState {
    pub active: Option<TaskId>,
    pub cancel: Option<CancellationToken>,
    pub meta: TaskMeta,
}

impl TaskState {
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn on_started(&mut self, started: &TaskStarted) {
        self.active = Some(started.id);
        self.cancel = started.cancel.clone();
        self.meta = started.meta.clone();
    }

    pub fn finish_if_active(&mut self, id: TaskId) -> bool {
        let ok = self.active == Some(id);
        if ok {
            self.clear();
        }
        ok
    }

    pub fn clear(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        self.active = None;
        self.meta = TaskMeta::None;
    }
}

#[derive(Debug, Default, Clone)]
pub struct Tasks {
    pub session_init: TaskState,
    pub auth: TaskState,
    pub feed_load: TaskState,
    pub follows_load: TaskState,
    pub post_submit: TaskState,
}

impl Tasks {
    pub fn state(&self, kind: TaskKind) -> &TaskState {
        match kind {
            TaskKind::SessionInit => &self.session_init,
            TaskKind::Auth => &self.auth,
            TaskKind::FeedLoad => &self.feed_load,
            TaskKind::FollowsLoad => &self.follows_load,
            TaskKind::PostSubmit => &self.post_submit,
        }
    }

    pub fn state_mut(&mut self, kind: TaskKind) -> &mut TaskState {
        match kind {
            TaskKind::SessionInit => &mut self.session_init,
            TaskKind::Auth => &mut self.auth,
            TaskKind::FeedLoad => &mut self.feed_load,
            TaskKind::FollowsLoad => &mut self.follows_load,
            TaskKind::PostSubmit => &mut self.post_submit,
        }
    }

    pub fn is_any_running(&self) -> bool {
        self.session_init.is_running()
            || self.auth.is_running()
            || self.feed_load.is_running()
            || self.follows_load.is_running()
            || self.post_submit.is_running()
    }

    /// Forgets every in-flight task so late completions are dropped.
    pub fn clear_all(&mut self) {
        self.session_init.clear();
        self.auth.clear();
        self.feed_load.clear();
        self.follows_load.clear();
        self.post_submit.clear();
    }
}
