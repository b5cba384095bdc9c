//! Fire-and-forget notifications.
//!
//! Transitions and conversions are announced to a [`NotificationSink`].
//! Delivery failures are logged and never fail the business action.

use async_trait::async_trait;
use docflow_shared::types::{DocumentId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::document::{DocumentStatus, DocumentType};
use crate::workflow::ActionKind;

/// Something worth telling interested parties about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// A document changed status.
    Transitioned {
        /// Document type.
        document_type: DocumentType,
        /// Document ID.
        document_id: DocumentId,
        /// Document number.
        number: String,
        /// Action applied.
        action: ActionKind,
        /// Status before.
        from: DocumentStatus,
        /// Status after.
        to: DocumentStatus,
        /// Who acted.
        actor: UserId,
        /// Owner of the document.
        owner: UserId,
    },
    /// A document was converted into another.
    Converted {
        /// Source type.
        source_type: DocumentType,
        /// Source ID.
        source_id: DocumentId,
        /// Target type.
        target_type: DocumentType,
        /// Target ID.
        target_id: DocumentId,
        /// Target number.
        target_number: String,
        /// Who converted.
        actor: UserId,
    },
}

/// Delivery failure.
#[derive(Debug, Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Receives notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers one notification.
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Sink that writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl NotificationSink for TracingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        match &notification {
            Notification::Transitioned {
                document_id,
                number,
                from,
                to,
                ..
            } => info!(document_id = %document_id, number = %number, from = %from, to = %to, "Document transitioned"),
            Notification::Converted {
                source_id,
                target_id,
                target_number,
                ..
            } => info!(source_id = %source_id, target_id = %target_id, target_number = %target_number, "Document converted"),
        }
        Ok(())
    }
}

/// Delivers a notification, logging failures instead of returning them.
pub async fn dispatch(sink: &dyn NotificationSink, notification: Notification) {
    if let Err(err) = sink.notify(notification).await {
        warn!(error = %err, "Notification dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converted() -> Notification {
        Notification::Converted {
            source_type: DocumentType::Quote,
            source_id: DocumentId::new(),
            target_type: DocumentType::Invoice,
            target_id: DocumentId::new(),
            target_number: "INV-2026-00001".to_string(),
            actor: UserId::new(),
        }
    }

    #[tokio::test]
    async fn test_dispatch_swallows_failures() {
        let mut sink = MockNotificationSink::new();
        sink.expect_notify()
            .times(1)
            .returning(|_| Err(NotifyError("smtp down".into())));

        dispatch(&sink, converted()).await;
    }

    #[tokio::test]
    async fn test_tracing_notifier_accepts_everything() {
        assert!(TracingNotifier.notify(converted()).await.is_ok());
    }

    #[test]
    fn test_notification_serde_tag() {
        let json = serde_json::to_value(converted()).unwrap();
        assert_eq!(json["kind"], "converted");
        assert_eq!(json["target_number"], "INV-2026-00001");
    }
}
