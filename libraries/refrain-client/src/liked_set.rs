//! Optimistic local view of the user's likes.
//!
//! Membership flips immediately on toggle; the remote request settles later
//! and a failed request puts the membership back.

use crate::client::RefrainClient;
use crate::error::Result;
use crate::types::LikeKey;
use std::collections::HashSet;
use tracing::{debug, warn};

/// The set of liked tracks as the UI should show it.
#[derive(Debug, Clone, Default)]
pub struct LikedSet {
    liked: HashSet<LikeKey>,
}

impl LikedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &LikeKey) -> bool {
        self.liked.contains(key)
    }

    pub fn len(&self) -> usize {
        self.liked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.liked.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LikeKey> {
        self.liked.iter()
    }

    /// Replace the whole set, e.g. with a fresh server listing.
    pub fn replace(&mut self, keys: impl IntoIterator<Item = LikeKey>) {
        self.liked = keys.into_iter().collect();
    }

    /// Flip membership locally and return the new state.
    ///
    /// The caller is expected to send the matching request and report back
    /// through [`LikedSet::settle`].
    pub fn toggle(&mut self, key: LikeKey) -> bool {
        if self.liked.remove(&key) {
            false
        } else {
            self.liked.insert(key);
            true
        }
    }

    /// Apply the result of a request that tried to set `key` to `liked`.
    ///
    /// A failure reverts the optimistic flip unless a later toggle already
    /// moved the key away from the attempted state.
    pub fn settle(&mut self, key: LikeKey, liked: bool, succeeded: bool) {
        if succeeded {
            debug!(album_id = key.album_id, track_number = key.track_number, liked, "Like settled");
            return;
        }
        if self.contains(&key) != liked {
            return;
        }
        warn!(
            album_id = key.album_id,
            track_number = key.track_number,
            liked,
            "Like request failed, reverting"
        );
        if liked {
            self.liked.remove(&key);
        } else {
            self.liked.insert(key);
        }
    }

    /// Reload the set from the server.
    pub async fn refresh(&mut self, client: &RefrainClient) -> Result<()> {
        let keys = client.likes().await?;
        self.replace(keys);
        debug!(count = self.len(), "Liked set refreshed");
        Ok(())
    }

    /// Toggle locally, send the request, and revert if it fails.
    ///
    /// Without an access token nothing changes and `None` is returned.
    pub async fn toggle_remote(&mut self, client: &RefrainClient, key: LikeKey) -> Option<bool> {
        if !client.is_authenticated().await {
            warn!(
                album_id = key.album_id,
                track_number = key.track_number,
                "Sign in to like tracks"
            );
            return None;
        }

        let liked = self.toggle(key);
        let succeeded = client.set_liked(key, liked).await.is_ok();
        self.settle(key, liked, succeeded);
        Some(self.contains(&key))
    }
}
