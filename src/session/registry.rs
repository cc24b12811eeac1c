use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::account::{AccountId, AccountRef};
use crate::error::{PipelineError, Result};

use super::fragment::{Fragment, FragmentStatus};
use super::meeting::{Meeting, MeetingStatus};

struct SessionEntry {
    meeting: Meeting,
    /// Keyed by sequence number, so sequence-order reads fall out of the map.
    fragments: BTreeMap<u64, Fragment>,
}

/// Owns every Meeting aggregate and linearizes all status changes through
/// `transition`'s compare-and-set. This is the only synchronization point in
/// the pipeline; blob writes and engine calls happen outside the lock.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a session in `Recording` state.
    pub async fn create(
        &self,
        account: &AccountRef,
        title: &str,
        participants: Vec<String>,
        max_duration_minutes: u32,
    ) -> Result<Meeting> {
        let meeting = Meeting::new(
            account.id.clone(),
            title,
            participants,
            max_duration_minutes,
        )?;

        let mut sessions = self.inner.write().await;
        sessions.insert(
            meeting.id,
            SessionEntry {
                meeting: meeting.clone(),
                fragments: BTreeMap::new(),
            },
        );

        info!(
            "created session {} for {} (ceiling {} min)",
            meeting.id, meeting.owner, meeting.max_duration_minutes
        );

        Ok(meeting)
    }

    /// Read a session, enforcing ownership. A session owned by another
    /// account is indistinguishable from an absent one.
    pub async fn get(&self, session_id: &Uuid, owner: &AccountId) -> Result<Meeting> {
        let sessions = self.inner.read().await;
        let entry = owned_entry(&sessions, session_id, owner)?;
        Ok(entry.meeting.clone())
    }

    /// All sessions for one account, newest first.
    pub async fn list(&self, owner: &AccountId) -> Vec<Meeting> {
        let sessions = self.inner.read().await;
        let mut meetings: Vec<Meeting> = sessions
            .values()
            .filter(|entry| entry.meeting.owner == *owner)
            .map(|entry| entry.meeting.clone())
            .collect();
        meetings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        meetings
    }

    /// Remove a session and return it with its fragments so the caller can
    /// drop the stored blobs.
    pub async fn remove(
        &self,
        session_id: &Uuid,
        owner: &AccountId,
    ) -> Result<(Meeting, Vec<Fragment>)> {
        let mut sessions = self.inner.write().await;
        owned_entry(&sessions, session_id, owner)?;
        let entry = sessions.remove(session_id).ok_or(PipelineError::NotFound)?;

        info!("removed session {}", session_id);

        Ok((entry.meeting, entry.fragments.into_values().collect()))
    }

    /// Guarded compare-and-set: the sole mutation path for `status`. Fails
    /// with `InvalidStateTransition` when the current status is not `from`
    /// or the state machine has no such edge; the error reports the actual
    /// current status.
    pub async fn transition(
        &self,
        session_id: &Uuid,
        owner: &AccountId,
        from: MeetingStatus,
        to: MeetingStatus,
    ) -> Result<Meeting> {
        let mut sessions = self.inner.write().await;
        let entry = owned_entry_mut(&mut sessions, session_id, owner)?;

        let current = entry.meeting.status;
        if current != from || !from.can_transition_to(to) {
            return Err(PipelineError::InvalidStateTransition { from: current, to });
        }

        entry.meeting.status = to;
        entry.meeting.updated_at = Utc::now();

        info!("session {} moved {} -> {}", session_id, from, to);

        Ok(entry.meeting.clone())
    }

    /// Re-anchor the duration window on the first admitted fragment, once.
    pub async fn anchor_started_at_once(&self, session_id: &Uuid) -> Result<Meeting> {
        let mut sessions = self.inner.write().await;
        let entry = entry_mut(&mut sessions, session_id)?;

        if !entry.meeting.clock_anchored {
            entry.meeting.started_at = Utc::now();
            entry.meeting.clock_anchored = true;
            entry.meeting.updated_at = entry.meeting.started_at;
        }

        Ok(entry.meeting.clone())
    }

    /// Fail-fast duplicate check run before the blob is stored.
    pub async fn ensure_sequence_available(&self, session_id: &Uuid, sequence: u64) -> Result<()> {
        let sessions = self.inner.read().await;
        let entry = entry_ref(&sessions, session_id)?;
        if entry.fragments.contains_key(&sequence) {
            return Err(duplicate_sequence(sequence));
        }
        Ok(())
    }

    /// Record an admitted fragment. Re-checks sequence uniqueness under the
    /// write lock; the losing side of a duplicate race gets `InvalidInput`
    /// and must discard its blob.
    pub async fn record_fragment(
        &self,
        session_id: &Uuid,
        owner: &AccountId,
        fragment: Fragment,
    ) -> Result<Fragment> {
        let mut sessions = self.inner.write().await;
        let entry = owned_entry_mut(&mut sessions, session_id, owner)?;

        if entry.fragments.contains_key(&fragment.sequence) {
            return Err(duplicate_sequence(fragment.sequence));
        }

        entry.fragments.insert(fragment.sequence, fragment.clone());
        entry.meeting.updated_at = Utc::now();

        Ok(fragment)
    }

    /// All fragments for a session in ascending sequence order.
    pub async fn fragments_sorted(&self, session_id: &Uuid) -> Result<Vec<Fragment>> {
        let sessions = self.inner.read().await;
        let entry = entry_ref(&sessions, session_id)?;
        Ok(entry.fragments.values().cloned().collect())
    }

    pub async fn mark_fragment_transcribed(
        &self,
        session_id: &Uuid,
        sequence: u64,
        text: String,
    ) -> Result<()> {
        self.update_fragment(session_id, sequence, |fragment| {
            fragment.status = FragmentStatus::Transcribed;
            fragment.transcript_text = Some(text);
        })
        .await
    }

    pub async fn mark_fragment_error(&self, session_id: &Uuid, sequence: u64) -> Result<()> {
        self.update_fragment(session_id, sequence, |fragment| {
            fragment.status = FragmentStatus::Error;
        })
        .await
    }

    /// Persist the assembled transcript. Durable independently of the later
    /// summarization outcome.
    pub async fn set_transcript(&self, session_id: &Uuid, transcript: String) -> Result<()> {
        let mut sessions = self.inner.write().await;
        let entry = entry_mut(&mut sessions, session_id)?;
        entry.meeting.transcript = Some(transcript);
        entry.meeting.updated_at = Utc::now();
        Ok(())
    }

    /// Persist the summary and move `Processing -> Completed` in one
    /// critical section, so callers either see both or neither.
    pub async fn set_summary_and_complete(
        &self,
        session_id: &Uuid,
        summary: String,
    ) -> Result<Meeting> {
        let mut sessions = self.inner.write().await;
        let entry = entry_mut(&mut sessions, session_id)?;

        let current = entry.meeting.status;
        if !current.can_transition_to(MeetingStatus::Completed) {
            return Err(PipelineError::InvalidStateTransition {
                from: current,
                to: MeetingStatus::Completed,
            });
        }

        entry.meeting.summary = Some(summary);
        entry.meeting.status = MeetingStatus::Completed;
        entry.meeting.error_reason = None;
        entry.meeting.updated_at = Utc::now();

        info!("session {} moved {} -> completed", session_id, current);

        Ok(entry.meeting.clone())
    }

    /// Move `Processing -> Error`, recording why the run failed.
    pub async fn set_error(&self, session_id: &Uuid, reason: &str) -> Result<Meeting> {
        let mut sessions = self.inner.write().await;
        let entry = entry_mut(&mut sessions, session_id)?;

        let current = entry.meeting.status;
        if !current.can_transition_to(MeetingStatus::Error) {
            return Err(PipelineError::InvalidStateTransition {
                from: current,
                to: MeetingStatus::Error,
            });
        }

        entry.meeting.status = MeetingStatus::Error;
        entry.meeting.error_reason = Some(reason.to_string());
        entry.meeting.updated_at = Utc::now();

        info!("session {} moved {} -> error: {}", session_id, current, reason);

        Ok(entry.meeting.clone())
    }

    /// Flip `usage_counted` false -> true. Returns whether this call flipped
    /// it, so the usage tick happens at most once per session ever.
    pub async fn try_mark_usage_counted(&self, session_id: &Uuid) -> Result<bool> {
        let mut sessions = self.inner.write().await;
        let entry = entry_mut(&mut sessions, session_id)?;

        if entry.meeting.usage_counted {
            return Ok(false);
        }
        entry.meeting.usage_counted = true;
        entry.meeting.updated_at = Utc::now();
        Ok(true)
    }

    async fn update_fragment(
        &self,
        session_id: &Uuid,
        sequence: u64,
        apply: impl FnOnce(&mut Fragment),
    ) -> Result<()> {
        let mut sessions = self.inner.write().await;
        let entry = entry_mut(&mut sessions, session_id)?;
        let fragment = entry
            .fragments
            .get_mut(&sequence)
            .ok_or(PipelineError::NotFound)?;
        apply(fragment);
        Ok(())
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn duplicate_sequence(sequence: u64) -> PipelineError {
    PipelineError::InvalidInput(format!(
        "fragment with sequence number {sequence} was already uploaded"
    ))
}

fn entry_ref<'a>(
    sessions: &'a HashMap<Uuid, SessionEntry>,
    session_id: &Uuid,
) -> Result<&'a SessionEntry> {
    sessions.get(session_id).ok_or(PipelineError::NotFound)
}

fn entry_mut<'a>(
    sessions: &'a mut HashMap<Uuid, SessionEntry>,
    session_id: &Uuid,
) -> Result<&'a mut SessionEntry> {
    sessions.get_mut(session_id).ok_or(PipelineError::NotFound)
}

fn owned_entry<'a>(
    sessions: &'a HashMap<Uuid, SessionEntry>,
    session_id: &Uuid,
    owner: &AccountId,
) -> Result<&'a SessionEntry> {
    let entry = entry_ref(sessions, session_id)?;
    if entry.meeting.owner != *owner {
        return Err(PipelineError::NotFound);
    }
    Ok(entry)
}

fn owned_entry_mut<'a>(
    sessions: &'a mut HashMap<Uuid, SessionEntry>,
    session_id: &Uuid,
    owner: &AccountId,
) -> Result<&'a mut SessionEntry> {
    let entry = entry_mut(sessions, session_id)?;
    if entry.meeting.owner != *owner {
        return Err(PipelineError::NotFound);
    }
    Ok(entry)
}
