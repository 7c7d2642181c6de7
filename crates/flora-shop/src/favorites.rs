//! Liked flowers with optimistic toggling.
//!
//! [`FavoritesStore`] keeps the set of flowers the user has liked and
//! persists it like the cart does. A toggle flips the local state and
//! persists it first, then asks the backend. The backend's answer wins; if
//! the call fails the previous state is restored and the error returned.

use indexmap::IndexSet;
use tracing::{debug, warn};

use flora_core::FlowerId;
use flora_storage::KeyValueStore;

use crate::error::ShopError;
use crate::gateway::LikeGateway;

/// Storage key for the liked flower ids.
pub const FAVORITES_KEY: &str = "favorites";

pub struct FavoritesStore<S: KeyValueStore> {
    medium: S,
    liked: IndexSet<FlowerId>,
    durable: bool,
}

impl<S: KeyValueStore> FavoritesStore<S> {
    /// Opens the stored favorites, or an empty set if none are readable.
    pub fn open(medium: S) -> Self {
        let liked = match medium.load_json::<Vec<FlowerId>>(FAVORITES_KEY) {
            Ok(Some(ids)) => ids.into_iter().collect(),
            Ok(None) => IndexSet::new(),
            Err(e) => {
                warn!(error = %e, "discarding unreadable favorites snapshot");
                IndexSet::new()
            }
        };
        FavoritesStore {
            medium,
            liked,
            durable: true,
        }
    }

    pub fn is_liked(&self, flower: &str) -> bool {
        self.liked.contains(flower)
    }

    /// Liked flower ids in the order they were liked.
    pub fn liked(&self) -> impl ExactSizeIterator<Item = &FlowerId> + '_ {
        self.liked.iter()
    }

    pub fn len(&self) -> usize {
        self.liked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.liked.is_empty()
    }

    /// False when the most recent write-through failed.
    pub fn is_durable(&self) -> bool {
        self.durable
    }

    pub fn into_medium(self) -> S {
        self.medium
    }

    /// Toggles the like on `flower` for `user_id` and reconciles with the
    /// backend. Returns the final like state.
    pub fn toggle<G: LikeGateway>(
        &mut self,
        flower: &FlowerId,
        user_id: &str,
        gateway: &mut G,
    ) -> Result<bool, ShopError> {
        let previous = self.liked.clone();
        let optimistic = !self.is_liked(flower.as_str());
        self.set_liked(flower, optimistic);
        self.persist();

        match gateway.toggle_like(flower, user_id) {
            Ok(response) => {
                if response.is_liked != optimistic {
                    debug!(flower = %flower, "backend disagreed with optimistic like; adopting its state");
                    self.set_liked(flower, response.is_liked);
                    self.persist();
                }
                Ok(response.is_liked)
            }
            Err(e) => {
                warn!(flower = %flower, error = %e, "like toggle failed; reverting");
                self.liked = previous;
                self.persist();
                Err(e.into())
            }
        }
    }

    /// Replaces the whole set, e.g. with the liked flowers a listing reported.
    pub fn replace_all(&mut self, flowers: impl IntoIterator<Item = FlowerId>) {
        self.liked = flowers.into_iter().collect();
        self.persist();
    }

    fn set_liked(&mut self, flower: &FlowerId, liked: bool) {
        if liked {
            self.liked.insert(flower.clone());
        } else {
            self.liked.shift_remove(flower.as_str());
        }
    }

    fn persist(&mut self) {
        let ids: Vec<&FlowerId> = self.liked.iter().collect();
        match self.medium.save_json(FAVORITES_KEY, &ids) {
            Ok(()) => self.durable = true,
            Err(e) => {
                self.durable = false;
                warn!(error = %e, "favorites write-through failed; keeping in-memory state");
            }
        }
    }
}
