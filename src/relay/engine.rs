//! The keyword relay: filter, format and forward observed messages.

use std::sync::Arc;

use chrono::Local;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use super::delivery::{DeliveryRoute, TargetChannel, deliver};
use super::formatter::{ForwardRecord, MessageFormatter};
use super::message::IncomingMessage;
use crate::auth::AuthorizationStore;
use crate::config::ChannelId;
use crate::telegram::UserSession;

/// Why a message was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Private,
    Empty,
    NoMatch,
}

/// Terminal state of one processed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Ignored(IgnoreReason),
    Delivered { keyword: String, route: DeliveryRoute },
    DeliveryFailed { keyword: String },
}

/// Running counters, reported by the heartbeat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Messages seen by the userbot.
    pub received: u64,

    /// Messages that contained a keyword.
    pub matched: u64,

    /// Matches that reached the target channel.
    pub delivered: u64,

    /// Matches for which every delivery route failed.
    pub failed: u64,
}

/// Watches incoming messages and forwards keyword hits to the target channel.
pub struct RelayEngine<S: UserSession> {
    session: Arc<S>,
    store: Arc<RwLock<AuthorizationStore>>,
    formatter: MessageFormatter,
    target: TargetChannel<S::Peer>,
    stats: RelayStats,
}

impl<S: UserSession> std::fmt::Debug for RelayEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayEngine")
            .field("target", &self.target)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<S: UserSession> RelayEngine<S> {
    #[must_use]
    pub fn new(
        session: Arc<S>,
        store: Arc<RwLock<AuthorizationStore>>,
        formatter: MessageFormatter,
        target: ChannelId,
    ) -> Self {
        Self {
            session,
            store,
            formatter,
            target: TargetChannel::new(target),
            stats: RelayStats::default(),
        }
    }

    /// Runs one message through the pipeline.
    ///
    /// Never fails: delivery errors are logged and reported as
    /// [`RelayOutcome::DeliveryFailed`].
    pub async fn process(&mut self, msg: &IncomingMessage) -> RelayOutcome {
        self.stats.received += 1;

        if msg.is_private {
            return RelayOutcome::Ignored(IgnoreReason::Private);
        }
        if msg.text.trim().is_empty() {
            return RelayOutcome::Ignored(IgnoreReason::Empty);
        }

        let keyword = {
            let store = self.store.read().await;
            store.find_keyword(&msg.text).map(str::to_owned)
        };
        let Some(keyword) = keyword else {
            return RelayOutcome::Ignored(IgnoreReason::NoMatch);
        };

        self.stats.matched += 1;
        debug!(
            "Message {} in chat {} matched keyword '{}'",
            msg.message_id, msg.chat_id, keyword
        );

        let record = ForwardRecord::from_incoming(msg, Local::now());
        let text = self.formatter.format(&record);

        match deliver(self.session.as_ref(), &self.target, &text).await {
            Ok(route) => {
                self.stats.delivered += 1;
                info!("Forwarded message containing keyword '{}' to target channel", keyword);
                RelayOutcome::Delivered { keyword, route }
            }
            Err(err) => {
                self.stats.failed += 1;
                error!("Error forwarding message with keyword '{}': {}", keyword, err);
                RelayOutcome::DeliveryFailed { keyword }
            }
        }
    }

    #[must_use]
    pub const fn stats(&self) -> RelayStats {
        self.stats
    }

    #[must_use]
    pub const fn target(&self) -> ChannelId {
        self.target.id()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::{TempDir, tempdir};

    use super::*;
    use crate::auth::ListFile;
    use crate::relay::SenderInfo;
    use crate::telegram::PeerKind;
    use crate::telegram::fake::FakeSession;

    const CHANNEL: i64 = -1_009_876;

    fn engine(dir: &TempDir, session: FakeSession) -> RelayEngine<FakeSession> {
        let store = AuthorizationStore::from_parts(
            1,
            vec![1],
            vec!["حصري".to_owned(), "urgent".to_owned()],
            ListFile::new(dir.path().join("admins.json")),
            ListFile::new(dir.path().join("keywords.json")),
        );
        RelayEngine::new(
            Arc::new(session),
            Arc::new(RwLock::new(store)),
            MessageFormatter::default(),
            ChannelId::new(CHANNEL),
        )
    }

    fn channel_session() -> FakeSession {
        FakeSession {
            peers: vec![FakeSession::chat(CHANNEL, PeerKind::Channel, "Relay")],
            ..FakeSession::default()
        }
    }

    fn message(text: &str) -> IncomingMessage {
        IncomingMessage {
            chat_id: -1_001_111,
            is_private: false,
            sender: Some(SenderInfo {
                id: 9,
                first_name: "Sara ".to_owned(),
                last_name: None,
                username: None,
            }),
            text: text.to_owned(),
            message_id: 7,
            sent_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_ignores_private_empty_and_unmatched() {
        let dir = tempdir().unwrap();
        let mut engine = engine(&dir, channel_session());

        let mut private = message("حصري");
        private.is_private = true;
        assert_eq!(
            engine.process(&private).await,
            RelayOutcome::Ignored(IgnoreReason::Private)
        );
        assert_eq!(
            engine.process(&message("   ")).await,
            RelayOutcome::Ignored(IgnoreReason::Empty)
        );
        assert_eq!(
            engine.process(&message("العرض الحصري")).await,
            RelayOutcome::Ignored(IgnoreReason::NoMatch)
        );

        let stats = engine.stats();
        assert_eq!(stats.received, 3);
        assert_eq!(stats.matched, 0);
        assert!(engine.session.sent().is_empty());
    }

    #[tokio::test]
    async fn test_forwards_first_match_once() {
        let dir = tempdir().unwrap();
        let mut engine = engine(&dir, channel_session());

        let outcome = engine.process(&message("URGENT: هذا عرض حصري اليوم")).await;
        assert_eq!(
            outcome,
            RelayOutcome::Delivered {
                keyword: "حصري".to_owned(),
                route: DeliveryRoute::Resolved,
            }
        );

        let sent = engine.session.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, CHANNEL);
        assert!(sent[0].1.contains("👤 Sender: Sara\n"));
        assert!(sent[0].1.contains("https://t.me/c/1111/7"));
    }

    #[tokio::test]
    async fn test_fallback_route() {
        let dir = tempdir().unwrap();
        let mut session = channel_session();
        session.unresolvable.insert(CHANNEL);
        let mut engine = engine(&dir, session);

        let outcome = engine.process(&message("urgent news")).await;
        assert_eq!(
            outcome,
            RelayOutcome::Delivered {
                keyword: "urgent".to_owned(),
                route: DeliveryRoute::Direct,
            }
        );
        assert_eq!(engine.session.direct_sent().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_the_engine() {
        let dir = tempdir().unwrap();
        let mut session = channel_session();
        session.unresolvable.insert(CHANNEL);
        session.direct_fails = true;
        let mut engine = engine(&dir, session);

        assert_eq!(
            engine.process(&message("urgent news")).await,
            RelayOutcome::DeliveryFailed {
                keyword: "urgent".to_owned()
            }
        );
        assert_eq!(
            engine.process(&message("nothing here")).await,
            RelayOutcome::Ignored(IgnoreReason::NoMatch)
        );

        let stats = engine.stats();
        assert_eq!(stats.received, 2);
        assert_eq!(stats.matched, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.delivered, 0);
    }

    #[tokio::test]
    async fn test_keyword_changes_apply_immediately() {
        let dir = tempdir().unwrap();
        let mut engine = engine(&dir, channel_session());

        assert_eq!(
            engine.process(&message("big sale")).await,
            RelayOutcome::Ignored(IgnoreReason::NoMatch)
        );

        engine.store.write().await.add_keyword("sale").unwrap();

        assert!(matches!(
            engine.process(&message("big sale")).await,
            RelayOutcome::Delivered { .. }
        ));
    }

    #[tokio::test]
    async fn test_falls_back_when_resolved_send_fails() {
        let dir = tempdir().unwrap();
        let mut session = channel_session();
        session.failing_sends.insert(CHANNEL);
        let mut engine = engine(&dir, session);

        let outcome = engine.process(&message("urgent news")).await;
        assert_eq!(
            outcome,
            RelayOutcome::Delivered {
                keyword: "urgent".to_owned(),
                route: DeliveryRoute::Direct,
            }
        );
        assert!(engine.session.sent().is_empty());
        assert_eq!(engine.session.direct_sent().len(), 1);
        assert_eq!(engine.stats().delivered, 1);
    }

    #[tokio::test]
    async fn test_target_resolved_once_across_matches() {
        let dir = tempdir().unwrap();
        let mut engine = engine(&dir, channel_session());

        engine.process(&message("urgent one")).await;
        engine.process(&message("urgent two")).await;

        assert_eq!(engine.session.sent().len(), 2);
        assert_eq!(engine.session.resolve_count(), 1);
    }
}
