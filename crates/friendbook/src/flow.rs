//! Record creation.
//!
//! An [`AddFlow`] keeps the location feed running for the length of an
//! editing session and stamps the new record with whatever fix is cached at
//! the moment of saving.

use tracing::{debug, info};

use crate::error::Result;
use crate::location::LocationFeed;
use crate::record::Record;
use crate::store::RecordStore;

/// The user-entered fields of a new record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordDraft {
    /// Photo bytes, if one was picked.
    pub image: Option<Vec<u8>>,
    /// Display name.
    pub name: String,
    /// Phone number.
    pub contact_number: String,
    /// Social media handle.
    pub social_handle: String,
    /// Free-text note.
    pub note: String,
}

/// An in-progress record creation.
///
/// The feed is stopped when the flow is committed, cancelled or dropped.
#[derive(Debug)]
pub struct AddFlow<'a> {
    feed: &'a mut LocationFeed,
}

impl<'a> AddFlow<'a> {
    /// Start an editing session, starting the location feed.
    ///
    /// # Errors
    ///
    /// Returns an error if the feed cannot be started (no Tokio runtime).
    pub fn begin(feed: &'a mut LocationFeed) -> Result<Self> {
        feed.start()?;
        debug!("Add flow started");
        Ok(Self { feed })
    }

    /// Build the record from `draft` and the latest fix, then append it.
    ///
    /// The record is returned even when only the file write failed; that case
    /// surfaces as `Err` after the store has applied it under its policy.
    ///
    /// # Errors
    ///
    /// Returns the store's persistence error.
    pub fn commit(mut self, draft: RecordDraft, store: &mut RecordStore) -> Result<Record> {
        let coordinate = self.feed.last_known();
        self.feed.stop();

        let record = Record::new(
            draft.image,
            draft.name,
            draft.contact_number,
            draft.social_handle,
            draft.note,
            coordinate,
        );
        info!(id = %record.id, %coordinate, "Saving new record");
        store.append(record.clone())?;
        Ok(record)
    }

    /// Abandon the session.
    pub fn cancel(self) {
        debug!("Add flow cancelled");
    }
}

impl Drop for AddFlow<'_> {
    fn drop(&mut self) {
        self.feed.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::location::{Coordinate, PermissionStatus, PushLocationProvider};
    use crate::store::WritePolicy;

    fn draft(name: &str) -> RecordDraft {
        RecordDraft {
            image: Some(vec![9, 9, 9]),
            name: name.to_string(),
            contact_number: "+639177123456".to_string(),
            social_handle: "@ana".to_string(),
            note: "met at the market".to_string(),
        }
    }

    #[tokio::test]
    async fn test_commit_uses_latest_fix_and_stops_feed() {
        let provider = Arc::new(PushLocationProvider::new(PermissionStatus::Granted));
        let mut feed = LocationFeed::new(provider.clone(), 4);
        let mut fixes = feed.subscribe();
        let dir = tempfile::tempdir().unwrap();
        let mut store =
            RecordStore::open(dir.path().join("SavedFriends.json"), WritePolicy::Lenient);

        let flow = AddFlow::begin(&mut feed).unwrap();
        provider.wait_until_active().await;
        assert!(provider.deliver(vec![Coordinate::new(7.19, 125.45)]).await);
        fixes.changed().await.unwrap();

        let record = flow.commit(draft("Ana"), &mut store).unwrap();

        assert_eq!(record.coordinate(), Coordinate::new(7.19, 125.45));
        assert_eq!(record.name, "Ana");
        assert_eq!(record.image.as_deref(), Some(&[9, 9, 9][..]));
        assert_eq!(store.records(), [record]);
        assert!(!provider.is_active());
    }

    #[tokio::test]
    async fn test_commit_without_fix_uses_zero() {
        let provider = Arc::new(PushLocationProvider::new(PermissionStatus::Denied));
        let mut feed = LocationFeed::new(provider, 4);
        let dir = tempfile::tempdir().unwrap();
        let mut store =
            RecordStore::open(dir.path().join("SavedFriends.json"), WritePolicy::Lenient);

        let flow = AddFlow::begin(&mut feed).unwrap();
        let record = flow.commit(draft("Bo"), &mut store).unwrap();

        assert_eq!(record.coordinate(), Coordinate::default());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_stops_feed_and_adds_nothing() {
        let provider = Arc::new(PushLocationProvider::new(PermissionStatus::Granted));
        let mut feed = LocationFeed::new(provider.clone(), 4);
        let dir = tempfile::tempdir().unwrap();
        let store =
            RecordStore::open(dir.path().join("SavedFriends.json"), WritePolicy::Lenient);

        let flow = AddFlow::begin(&mut feed).unwrap();
        provider.wait_until_active().await;
        flow.cancel();

        assert!(!provider.is_active());
        assert!(!feed.is_running());
        assert!(store.is_empty());
    }

    #[test]
    fn test_begin_outside_runtime_fails() {
        let provider = Arc::new(PushLocationProvider::new(PermissionStatus::Granted));
        let mut feed = LocationFeed::new(provider, 4);
        assert!(AddFlow::begin(&mut feed).is_err());
    }

    #[test]
    fn test_draft_default_is_blank() {
        let blank = RecordDraft::default();
        assert!(blank.image.is_none());
        assert!(blank.name.is_empty());
    }
}
