use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{AppError, AppResult},
    models::{Candidate, ContentType, TitleLists},
    services::{facets::FacetPlan, FeedPipeline},
    store::{ListOp, PersistenceBridge, SwipeCommand},
};

/// Remaining unconsumed items at or below which a refill starts
const REFILL_LOOKAHEAD: usize = 2;

/// Lifecycle of the swipeable queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    Idle,
    Loading,
    Ready,
    Refilling,
    Exhausted,
    Error,
}

/// The four consumption actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeAction {
    MarkSeen,
    AddToWatch,
    /// No exclusion mutation; the item may resurface in a later session
    Skip,
    Reject,
}

/// Non-blocking notification about a failed background persistence write
#[derive(Debug, Clone)]
pub struct PersistenceNotice {
    pub title: String,
    pub message: String,
}

/// The session-scoped, swipeable discovery queue
///
/// Holds an append-only candidate list and a cursor; every consumption action
/// reads the current item, persists its decision through the bridge
/// (detached, optimistic), mutates the session lists, and advances the
/// cursor. Refills re-run the pipeline with the current exclusions and only
/// ever append. Tearing the queue down cancels in-flight pipeline work.
pub struct FeedQueue {
    user_id: String,
    content_type: ContentType,
    plan: FacetPlan,
    batch_size: usize,
    genre_hint: Option<String>,
    pipeline: FeedPipeline,
    bridge: PersistenceBridge,

    phase: FeedPhase,
    queue: Vec<Candidate>,
    cursor: usize,
    lists: TitleLists,
    refill_in_flight: bool,
    last_action: Option<(SwipeAction, Option<SwipeCommand>)>,

    cancel: CancellationToken,
    notice_tx: mpsc::UnboundedSender<PersistenceNotice>,
    notice_rx: mpsc::UnboundedReceiver<PersistenceNotice>,
}

impl FeedQueue {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: &str,
        content_type: ContentType,
        plan: FacetPlan,
        batch_size: usize,
        genre_hint: Option<String>,
        pipeline: FeedPipeline,
        bridge: PersistenceBridge,
    ) -> Self {
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        Self {
            user_id: user_id.to_string(),
            content_type,
            plan,
            batch_size,
            genre_hint,
            pipeline,
            bridge,
            phase: FeedPhase::Idle,
            queue: Vec::new(),
            cursor: 0,
            lists: TitleLists::default(),
            refill_in_flight: false,
            last_action: None,
            cancel: CancellationToken::new(),
            notice_tx,
            notice_rx,
        }
    }

    pub fn phase(&self) -> FeedPhase {
        self.phase
    }

    pub fn queue(&self) -> &[Candidate] {
        &self.queue
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn lists(&self) -> &TitleLists {
        &self.lists
    }

    /// The next unconsumed item
    pub fn current(&self) -> Option<&Candidate> {
        self.queue.get(self.cursor)
    }

    /// Initial fill: rebuilds the session lists from the bridge and runs the
    /// pipeline once.
    pub async fn load(&mut self) -> AppResult<()> {
        self.phase = FeedPhase::Loading;

        // A fresh user or an unreachable profile both start with empty lists
        self.lists = match self.bridge.load_profile(&self.user_id).await {
            Ok(profile) => profile.lists(self.content_type).clone(),
            Err(e) => {
                tracing::warn!(
                    user_id = %self.user_id,
                    error = %e,
                    "Profile load failed, starting session with empty lists"
                );
                TitleLists::default()
            }
        };

        let exclusions = self.lists.combined_exclusions();
        match self
            .pipeline
            .fetch_candidates(
                self.content_type,
                &self.plan,
                self.batch_size,
                &exclusions,
                self.genre_hint.as_deref(),
                &self.cancel,
            )
            .await
        {
            Ok(batch) => {
                self.append_unique(batch);
                self.phase = if self.queue.is_empty() {
                    FeedPhase::Exhausted
                } else {
                    FeedPhase::Ready
                };
                Ok(())
            }
            Err(e) => {
                self.phase = FeedPhase::Error;
                Err(e)
            }
        }
    }

    /// Explicit user-triggered reload out of `Error` or `Exhausted`
    pub async fn reload(&mut self) -> AppResult<()> {
        self.queue.clear();
        self.cursor = 0;
        self.last_action = None;
        self.load().await
    }

    /// Applies one consumption action to the current item.
    ///
    /// The queue is never mutated below the cursor: the item stays at its
    /// index, only the cursor and the session lists change. Persistence is
    /// detached and optimistic; failures surface via `take_notices`.
    pub async fn swipe(&mut self, action: SwipeAction) -> AppResult<()> {
        if !matches!(self.phase, FeedPhase::Ready | FeedPhase::Refilling) {
            return Err(AppError::InvalidInput(format!(
                "Cannot swipe while the feed is {:?}",
                self.phase
            )));
        }

        let candidate = self
            .current()
            .ok_or_else(|| AppError::NotFound("No candidate under the cursor".to_string()))?;
        let title = candidate.normalized_title.clone();
        let meta = candidate.entry_meta();

        let command = match action {
            SwipeAction::MarkSeen => {
                let displaced = self.lists.mark_seen(&title, meta.clone());
                Some(SwipeCommand::mark_seen(
                    &self.user_id,
                    self.content_type,
                    &title,
                    meta,
                    displaced,
                ))
            }
            SwipeAction::AddToWatch => {
                self.lists.add_to_watch(&title, meta.clone());
                Some(SwipeCommand::add_to_watch(
                    &self.user_id,
                    self.content_type,
                    &title,
                    meta,
                ))
            }
            SwipeAction::Reject => {
                self.lists.reject(&title);
                Some(SwipeCommand::reject(
                    &self.user_id,
                    self.content_type,
                    &title,
                ))
            }
            SwipeAction::Skip => None,
        };

        if let Some(ref command) = command {
            self.persist_detached(command.clone(), &title);
        }

        self.cursor += 1;
        self.last_action = Some((action, command));

        self.maybe_refill().await;
        Ok(())
    }

    /// Reverts the most recent swipe: steps the cursor back and applies the
    /// compensating command to both the session lists and the stores.
    ///
    /// Unlike the forward path this is awaited, so the caller learns whether
    /// the compensation actually landed.
    pub async fn undo_last(&mut self) -> AppResult<()> {
        let Some((_, command)) = self.last_action.take() else {
            return Err(AppError::InvalidInput("Nothing to undo".to_string()));
        };

        if let Some(command) = command {
            let inverse = command.inverse();
            apply_ops(&mut self.lists, inverse.forward_ops());
            self.bridge.apply(&inverse).await?;
        }

        self.cursor = self.cursor.saturating_sub(1);
        if matches!(self.phase, FeedPhase::Exhausted) {
            self.phase = FeedPhase::Ready;
        }
        Ok(())
    }

    /// Drains pending persistence-failure notices
    pub fn take_notices(&mut self) -> Vec<PersistenceNotice> {
        let mut notices = Vec::new();
        while let Ok(notice) = self.notice_rx.try_recv() {
            notices.push(notice);
        }
        notices
    }

    /// Cancels in-flight aggregation and enrichment work
    pub fn teardown(&self) {
        self.cancel.cancel();
    }

    fn persist_detached(&self, command: SwipeCommand, title: &str) {
        let bridge = self.bridge.clone();
        let notice_tx = self.notice_tx.clone();
        let title = title.to_string();

        // At-most-once: no retry, no rollback of the already-advanced cursor
        tokio::spawn(async move {
            if let Err(e) = bridge.apply(&command).await {
                tracing::warn!(title = %title, error = %e, "Swipe persistence failed");
                let _ = notice_tx.send(PersistenceNotice {
                    title,
                    message: "We could not save that decision".to_string(),
                });
            }
        });
    }

    async fn maybe_refill(&mut self) {
        let remaining = self.queue.len().saturating_sub(self.cursor);
        if remaining > REFILL_LOOKAHEAD || self.refill_in_flight {
            return;
        }
        self.refill().await;
    }

    async fn refill(&mut self) {
        self.refill_in_flight = true;
        let previous_phase = self.phase;
        self.phase = FeedPhase::Refilling;

        let exclusions = self.lists.combined_exclusions();
        let result = self
            .pipeline
            .fetch_candidates(
                self.content_type,
                &self.plan,
                self.batch_size,
                &exclusions,
                self.genre_hint.as_deref(),
                &self.cancel,
            )
            .await;
        self.refill_in_flight = false;

        match result {
            Ok(batch) => {
                let appended = self.append_unique(batch);
                if appended == 0 && self.cursor == self.queue.len() {
                    tracing::info!(user_id = %self.user_id, "Refill yielded nothing, feed exhausted");
                    self.phase = FeedPhase::Exhausted;
                } else {
                    self.phase = FeedPhase::Ready;
                }
            }
            Err(AppError::Cancelled) => {
                // Session is being torn down; the discarded batch is expected
                self.phase = previous_phase;
            }
            Err(e) => {
                tracing::error!(user_id = %self.user_id, error = %e, "Refill failed");
                self.phase = FeedPhase::Error;
            }
        }
    }

    /// Appends candidates whose normalized title is not already queued.
    ///
    /// Exclusion sets only cover seen/rejected titles; this guard keeps
    /// skipped or watch-listed items from re-entering the same session.
    fn append_unique(&mut self, batch: Vec<Candidate>) -> usize {
        let mut appended = 0;
        for candidate in batch {
            if self
                .queue
                .iter()
                .any(|queued| queued.normalized_title == candidate.normalized_title)
            {
                continue;
            }
            self.queue.push(candidate);
            appended += 1;
        }
        appended
    }
}

impl Drop for FeedQueue {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn apply_ops(lists: &mut TitleLists, ops: &[ListOp]) {
    for op in ops {
        match op {
            ListOp::Add { list, title, meta } => match list {
                crate::models::ListKind::Seen => {
                    lists.seen.insert(title.clone(), meta.clone());
                }
                crate::models::ListKind::ToWatch => {
                    lists.to_watch.insert(title.clone(), meta.clone());
                }
                crate::models::ListKind::Rejected => {
                    lists.rejected.insert(title.clone());
                }
            },
            ListOp::Remove { list, title } => {
                lists.remove(*list, title);
            }
        }
    }
}
