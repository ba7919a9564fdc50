//! Message Stream Service
//!
//! The coordinator for one stream connection: a bounded polling loop over
//! the message store that turns new rows into ordered, enriched frames.
//!
//! Each connection is an independent cooperative task. There is no shared
//! in-memory state between connections; the only coordination points are
//! the message store's total order and the wall clock. The loop suspends at
//! exactly two places, the repository query and the inter-cycle sleep, so
//! one slow consumer never blocks the host from serving others.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::Stream;
use tokio::time::{sleep, Instant};

use crate::application::dto::response::StreamMessageDto;
use crate::config::StreamSettings;
use crate::domain::{ChatMessage, MentorRepository, MessageRepository, UserRepository};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

/// One frame of the event stream, before wire encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame {
    /// A non-empty batch of enriched messages, tagged with the cursor the
    /// client must resume from.
    Batch {
        cursor: i64,
        messages: Vec<StreamMessageDto>,
    },
    /// Heartbeat to defeat idle-connection timeouts in intermediaries.
    KeepAlive,
    /// The connection reached its lifetime; the client must reconnect
    /// carrying the last cursor it saw.
    Reconnect,
}

/// Coordinates delivery for stream connections.
pub struct StreamService {
    messages: Arc<dyn MessageRepository>,
    mentors: Arc<dyn MentorRepository>,
    users: Arc<dyn UserRepository>,
    settings: StreamSettings,
}

impl StreamService {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        mentors: Arc<dyn MentorRepository>,
        users: Arc<dyn UserRepository>,
        settings: StreamSettings,
    ) -> Self {
        Self {
            messages,
            mentors,
            users,
            settings,
        }
    }

    /// Produce the frame sequence for one connection.
    ///
    /// Admission has already happened by the time this runs; from here on,
    /// every failure is swallowed and ends the stream without an error
    /// frame. Correctness is restored by the client reconnecting from its
    /// last cursor, so a truncated connection can only delay delivery,
    /// never corrupt it.
    pub fn frames(
        &self,
        tenant_id: i64,
        channel_id: Option<i64>,
        start_cursor: i64,
    ) -> impl Stream<Item = StreamFrame> + Send + 'static {
        let messages = Arc::clone(&self.messages);
        let mentors = Arc::clone(&self.mentors);
        let users = Arc::clone(&self.users);
        let settings = self.settings.clone();

        async_stream::stream! {
            let _connection = metrics::StreamConnectionGuard::new();

            // Mentor snapshot is taken once and held fixed for the life of
            // the connection; changes surface only after reconnect.
            let mentor_set: HashSet<i64> = match channel_id {
                Some(channel) => {
                    match mentors.mentors_of(tenant_id, channel).await {
                        Ok(set) => set,
                        Err(e) => {
                            tracing::warn!(
                                tenant_id,
                                channel,
                                error = %e,
                                "mentor snapshot failed; closing stream"
                            );
                            return;
                        }
                    }
                }
                None => HashSet::new(),
            };

            let deadline = Instant::now() + settings.max_duration();
            let keepalive_every = settings.keepalive_every.max(1);
            let mut cursor = start_cursor;
            let mut idle_cycles: u32 = 0;

            loop {
                if Instant::now() >= deadline {
                    metrics::STREAM_RECONNECTS_TOTAL.inc();
                    yield StreamFrame::Reconnect;
                    break;
                }

                let batch = match messages
                    .find_after(tenant_id, channel_id, cursor, settings.batch_size)
                    .await
                {
                    Ok(batch) => batch,
                    Err(e) => {
                        tracing::warn!(
                            tenant_id,
                            ?channel_id,
                            error = %e,
                            "message poll failed; closing stream"
                        );
                        break;
                    }
                };

                if let Some(last) = batch.last() {
                    // Advance past everything fetched, join rows included,
                    // so they are never revisited on the next cycle.
                    cursor = last.id;
                    idle_cycles = 0;

                    let dtos = match enrich_batch(
                        users.as_ref(),
                        tenant_id,
                        &batch,
                        &mentor_set,
                    )
                    .await
                    {
                        Ok(dtos) => dtos,
                        Err(e) => {
                            tracing::warn!(
                                tenant_id,
                                ?channel_id,
                                error = %e,
                                "enrichment failed; closing stream"
                            );
                            break;
                        }
                    };

                    if !dtos.is_empty() {
                        metrics::STREAM_MESSAGES_DELIVERED_TOTAL.inc_by(dtos.len() as u64);
                        yield StreamFrame::Batch {
                            cursor,
                            messages: dtos,
                        };
                    }
                } else {
                    idle_cycles += 1;
                    if idle_cycles % keepalive_every == 0 {
                        yield StreamFrame::KeepAlive;
                    }
                }

                sleep(settings.poll_interval()).await;
            }
        }
    }
}

/// Enrich a batch: drop non-streamable rows, tag mentor senders, and
/// resolve confirmer display names with one batched lookup.
async fn enrich_batch(
    users: &dyn UserRepository,
    tenant_id: i64,
    batch: &[ChatMessage],
    mentor_set: &HashSet<i64>,
) -> Result<Vec<StreamMessageDto>, AppError> {
    let mut confirmer_ids: Vec<i64> = batch
        .iter()
        .filter(|m| m.kind.is_streamable())
        .filter_map(|m| m.confirmed_by)
        .collect();
    confirmer_ids.sort_unstable();
    confirmer_ids.dedup();

    let confirmer_names: HashMap<i64, String> = if confirmer_ids.is_empty() {
        HashMap::new()
    } else {
        users.display_names(tenant_id, &confirmer_ids).await?
    };

    Ok(batch
        .iter()
        .filter(|m| m.kind.is_streamable())
        .map(|m| StreamMessageDto::enriched(m, mentor_set, &confirmer_names))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use futures::StreamExt;
    use pretty_assertions::assert_eq;

    use crate::domain::{
        MessageKind, MockMentorRepository, MockMessageRepository, MockUserRepository,
    };

    fn settings() -> StreamSettings {
        StreamSettings {
            poll_interval_ms: 2000,
            max_duration_secs: 25,
            batch_size: 50,
            keepalive_every: 3,
        }
    }

    fn msg(id: i64, kind: MessageKind) -> ChatMessage {
        ChatMessage {
            id,
            tenant_id: 1,
            channel_id: None,
            kind,
            sender_id: Some(10 + id),
            sender_name: format!("user-{}", id),
            body: format!("message {}", id),
            confirmed: false,
            confirmed_by: None,
            created_at: Utc::now(),
        }
    }

    fn service(
        messages: MockMessageRepository,
        mentors: MockMentorRepository,
        users: MockUserRepository,
    ) -> StreamService {
        StreamService::new(
            Arc::new(messages),
            Arc::new(mentors),
            Arc::new(users),
            settings(),
        )
    }

    async fn collect(service: &StreamService, channel: Option<i64>, cursor: i64) -> Vec<StreamFrame> {
        service.frames(1, channel, cursor).collect::<Vec<_>>().await
    }

    // Scenario: messages 1..5 exist; a client with no cursor gets all five
    // in one batch tagged cursor 5, then only keep-alives and a final
    // reconnect for the rest of the connection lifetime.
    #[tokio::test(start_paused = true)]
    async fn full_backlog_is_delivered_in_one_batch() {
        let mut messages = MockMessageRepository::new();
        messages.expect_find_after().returning(|_, _, after, _| {
            if after == 0 {
                Ok((1..=5).map(|id| msg(id, MessageKind::Message)).collect())
            } else {
                Ok(vec![])
            }
        });

        let service = service(messages, MockMentorRepository::new(), MockUserRepository::new());
        let frames = collect(&service, None, 0).await;

        match &frames[0] {
            StreamFrame::Batch { cursor, messages } => {
                assert_eq!(*cursor, 5);
                let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
                assert_eq!(ids, ["1", "2", "3", "4", "5"]);
            }
            other => panic!("expected batch first, got {:?}", other),
        }

        assert_eq!(frames.last(), Some(&StreamFrame::Reconnect));
        assert!(frames[1..frames.len() - 1]
            .iter()
            .all(|f| *f == StreamFrame::KeepAlive));
    }

    // Scenario continued: resuming from cursor 5 with no further inserts
    // yields only keep-alive frames and the reconnect instruction, and
    // every poll carries the resumed cursor.
    #[tokio::test(start_paused = true)]
    async fn quiet_resume_yields_only_keepalives_and_reconnect() {
        let mut messages = MockMessageRepository::new();
        messages
            .expect_find_after()
            .withf(|_, _, after, _| *after == 5)
            .returning(|_, _, _, _| Ok(vec![]));

        let service = service(messages, MockMentorRepository::new(), MockUserRepository::new());
        let frames = collect(&service, None, 5).await;

        // 25s lifetime / 2s polls = 13 cycles, a ping every 3rd idle cycle.
        let keepalives = frames
            .iter()
            .filter(|f| **f == StreamFrame::KeepAlive)
            .count();
        assert_eq!(keepalives, 4);
        assert_eq!(frames.last(), Some(&StreamFrame::Reconnect));
        assert_eq!(frames.len(), keepalives + 1);
    }

    // Scenario: join rows are never delivered, at any cursor, but the
    // cursor still advances past them so they are not re-fetched.
    #[tokio::test(start_paused = true)]
    async fn join_rows_are_skipped_but_advance_the_cursor() {
        let mut messages = MockMessageRepository::new();
        messages.expect_find_after().returning(|_, _, after, _| {
            match after {
                0 => Ok(vec![msg(1, MessageKind::Message), msg(2, MessageKind::Join)]),
                2 => Ok(vec![msg(3, MessageKind::Join)]),
                3 => Ok(vec![msg(4, MessageKind::System)]),
                _ => Ok(vec![]),
            }
        });

        let service = service(messages, MockMentorRepository::new(), MockUserRepository::new());
        let frames = collect(&service, None, 0).await;

        let batches: Vec<_> = frames
            .iter()
            .filter_map(|f| match f {
                StreamFrame::Batch { cursor, messages } => Some((*cursor, messages.clone())),
                _ => None,
            })
            .collect();

        // Batch 1: message 1 delivered, join 2 silently consumed.
        assert_eq!(batches[0].0, 2);
        assert_eq!(batches[0].1.len(), 1);
        assert_eq!(batches[0].1[0].id, "1");

        // The all-join cycle produced no frame at all, but moved to 3.
        // Batch 2: the system row after it.
        assert_eq!(batches[1].0, 4);
        assert_eq!(batches[1].1[0].id, "4");
        assert_eq!(batches.len(), 2);
    }

    // A connection that is busy right up to its deadline still emits the
    // reconnect frame, and nothing is lost: the next connection resumes
    // from the advanced cursor.
    #[tokio::test(start_paused = true)]
    async fn deadline_fires_even_while_messages_keep_arriving() {
        let mut messages = MockMessageRepository::new();
        messages
            .expect_find_after()
            .returning(|_, _, after, _| Ok(vec![msg(after + 1, MessageKind::Message)]));

        let first = service(messages, MockMentorRepository::new(), MockUserRepository::new());
        let frames = collect(&first, None, 0).await;

        assert_eq!(frames.last(), Some(&StreamFrame::Reconnect));

        // Every cycle delivered one message; ids must be contiguous from 1.
        let delivered: Vec<i64> = frames
            .iter()
            .filter_map(|f| match f {
                StreamFrame::Batch { messages, .. } => {
                    Some(messages[0].id.parse::<i64>().unwrap())
                }
                _ => None,
            })
            .collect();
        assert!(delivered.len() >= 2);
        let expected: Vec<i64> = (1..=delivered.len() as i64).collect();
        assert_eq!(delivered, expected, "no gaps, no duplicates");

        let last_cursor = *delivered.last().unwrap();

        // The reconnecting client picks up exactly where it left off: every
        // poll of the next connection starts at the advanced cursor.
        let mut messages = MockMessageRepository::new();
        messages
            .expect_find_after()
            .withf(move |_, _, after, _| *after == last_cursor)
            .returning(|_, _, _, _| Ok(vec![]));
        let service = service(messages, MockMentorRepository::new(), MockUserRepository::new());
        let frames = collect(&service, None, last_cursor).await;
        assert_eq!(frames.last(), Some(&StreamFrame::Reconnect));
    }

    // Any repository failure inside the loop closes the stream without an
    // error frame; the client's reconnect restores delivery.
    #[tokio::test(start_paused = true)]
    async fn poll_failure_closes_the_stream_silently() {
        let mut messages = MockMessageRepository::new();
        messages
            .expect_find_after()
            .returning(|_, _, _, _| Err(AppError::Internal("pool exhausted".into())));

        let service = service(messages, MockMentorRepository::new(), MockUserRepository::new());
        let frames = collect(&service, None, 0).await;
        assert!(frames.is_empty(), "no frame may follow a failure");
    }

    #[tokio::test(start_paused = true)]
    async fn mentor_snapshot_failure_closes_before_any_poll() {
        let messages = MockMessageRepository::new();
        let mut mentors = MockMentorRepository::new();
        mentors
            .expect_mentors_of()
            .returning(|_, _| Err(AppError::Internal("directory unavailable".into())));

        let service = service(messages, mentors, MockUserRepository::new());
        let frames = collect(&service, Some(7), 0).await;
        assert!(frames.is_empty());
    }

    // The mentor set is loaded exactly once per connection; membership
    // changes mid-connection are not reflected until reconnect.
    #[tokio::test(start_paused = true)]
    async fn mentor_set_is_snapshotted_once_per_connection() {
        let mut messages = MockMessageRepository::new();
        messages.expect_find_after().returning(|_, _, after, _| {
            if after < 3 {
                let mut m = msg(after + 1, MessageKind::Message);
                m.channel_id = Some(7);
                m.sender_id = Some(if after == 0 { 11 } else { 12 });
                Ok(vec![m])
            } else {
                Ok(vec![])
            }
        });

        let mut mentors = MockMentorRepository::new();
        mentors
            .expect_mentors_of()
            .times(1)
            .returning(|_, _| Ok([11].into_iter().collect()));

        let service = service(messages, mentors, MockUserRepository::new());
        let frames = collect(&service, Some(7), 0).await;

        let flags: Vec<bool> = frames
            .iter()
            .filter_map(|f| match f {
                StreamFrame::Batch { messages, .. } => Some(messages[0].is_mentor),
                _ => None,
            })
            .collect();
        assert!(flags[0], "sender 11 is in the snapshot");
        assert!(flags[1..].iter().all(|f| !f), "sender 12 is not");
    }

    // Confirmer names are a read-time join, resolved once per batch.
    #[tokio::test(start_paused = true)]
    async fn confirmer_names_are_resolved_per_batch() {
        let mut messages = MockMessageRepository::new();
        messages.expect_find_after().returning(|_, _, after, _| {
            if after == 0 {
                let mut confirmed = msg(1, MessageKind::Message);
                confirmed.confirmed = true;
                confirmed.confirmed_by = Some(99);
                Ok(vec![confirmed, msg(2, MessageKind::Message)])
            } else {
                Ok(vec![])
            }
        });

        let mut users = MockUserRepository::new();
        users
            .expect_display_names()
            .withf(|_, ids| ids.len() == 1 && ids[0] == 99)
            .times(1)
            .returning(|_, _| Ok([(99, "Mentor Meg".to_string())].into_iter().collect()));

        let service = service(messages, MockMentorRepository::new(), users);
        let frames = collect(&service, None, 0).await;

        match &frames[0] {
            StreamFrame::Batch { messages, .. } => {
                assert_eq!(messages[0].confirmer_name.as_deref(), Some("Mentor Meg"));
                assert_eq!(messages[1].confirmer_name, None);
            }
            other => panic!("expected batch, got {:?}", other),
        }
    }
}
