//! Paged photo feed.
//!
//! Pages are appended in arrival order behind a page cursor; a guard flag
//! keeps at most one page fetch in flight. Every mutation broadcasts the
//! full photo list, so consumers only diff list lengths.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use shutter_types::{photo, Photo};

use crate::client::ApiClient;
use crate::credentials::{require_token, TokenStore};
use crate::error::ApiResult;
use crate::events::{EventHub, EventRx};

/// Broadcast after every feed mutation, carrying the full list.
#[derive(Debug, Clone)]
pub struct FeedChanged {
    pub photos: Vec<Photo>,
}

/// How a consumer should refresh its view after a [`FeedChanged`] event,
/// given the list length it was rendering and the length it received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedRefresh {
    /// Rebuild the whole view.
    Reload,
    /// Insert rows for exactly this index range, old rows are unchanged.
    InsertRange(Range<usize>),
}

/// Maps an observed length change to a refresh strategy. Growth is always
/// an append, so rows are inserted; anything else (shrink, or same length
/// with possibly different content, as after a like toggle) reloads.
pub fn reconcile(old_len: usize, new_len: usize) -> FeedRefresh {
    if new_len > old_len {
        FeedRefresh::InsertRange(old_len..new_len)
    } else {
        FeedRefresh::Reload
    }
}

/// Wire shape of one feed entry.
#[derive(Debug, Deserialize)]
struct PhotoPayload {
    id: String,
    width: u32,
    height: u32,
    created_at: Option<String>,
    description: Option<String>,
    #[serde(default)]
    liked_by_user: bool,
    #[serde(default)]
    likes: u64,
    urls: UrlsPayload,
}

#[derive(Debug, Deserialize)]
struct UrlsPayload {
    thumb: String,
    regular: String,
    full: String,
}

impl PhotoPayload {
    fn into_photo(self) -> Photo {
        Photo {
            id: self.id,
            width: self.width,
            height: self.height,
            created_at: photo::parse_created_at(self.created_at.as_deref()),
            description: self.description,
            thumb_url: self.urls.thumb,
            regular_url: self.urls.regular,
            full_url: self.urls.full,
            is_liked: self.liked_by_user,
            like_count: self.likes,
        }
    }
}

#[derive(Default)]
struct FeedState {
    photos: Vec<Photo>,
    last_loaded_page: u32,
}

/// Paged feed over `GET /photos`.
pub struct FeedService {
    client: ApiClient,
    store: Arc<dyn TokenStore>,
    state: Mutex<FeedState>,
    fetching: AtomicBool,
    events: EventHub<FeedChanged>,
}

impl FeedService {
    pub fn new(client: ApiClient, store: Arc<dyn TokenStore>) -> Self {
        Self {
            client,
            store,
            state: Mutex::new(FeedState::default()),
            fetching: AtomicBool::new(false),
            events: EventHub::new(),
        }
    }

    /// Fetches the page after the last loaded one and appends it.
    ///
    /// A call while a fetch is already in flight is a no-op, so rapid
    /// scroll triggers collapse into one request. On success the new
    /// entries are appended, the cursor advances and the full list is
    /// broadcast; on failure the list and cursor are untouched, so the
    /// next call retries the same page.
    ///
    /// # Errors
    /// Returns the classified [`crate::error::ApiError`] of the fetch.
    pub async fn load_next_page(&self) -> ApiResult<()> {
        if self.fetching.swap(true, Ordering::SeqCst) {
            tracing::debug!("page fetch already in flight; ignoring");
            return Ok(());
        }

        let result = self.fetch_next_page().await;
        self.fetching.store(false, Ordering::SeqCst);

        if let Err(err) = &result {
            tracing::warn!("feed page fetch failed: {err}");
        }
        result
    }

    async fn fetch_next_page(&self) -> ApiResult<()> {
        let token = require_token(self.store.as_ref())?;
        let page = self.cursor() + 1;

        let request = self
            .client
            .get("/photos")
            .query(&[("page", page)])
            .bearer_auth(token.as_str());
        let payloads: Vec<PhotoPayload> = self.client.fetch(request).await?;

        let photos = {
            let mut state = self.state.lock().expect("feed state lock poisoned");
            state
                .photos
                .extend(payloads.into_iter().map(PhotoPayload::into_photo));
            state.last_loaded_page = page;
            state.photos.clone()
        };

        tracing::debug!(page, total = photos.len(), "feed page loaded");
        self.events.publish(FeedChanged { photos });
        Ok(())
    }

    /// Flips the like state of one photo, server first.
    ///
    /// The local list only changes after the server confirmed, so a failed
    /// request leaves the feed exactly as it was. A confirmation for a
    /// photo no longer in the list is dropped silently.
    ///
    /// # Errors
    /// Returns the classified [`crate::error::ApiError`] of the request.
    pub async fn toggle_like(&self, photo_id: &str, currently_liked: bool) -> ApiResult<()> {
        let token = require_token(self.store.as_ref())?;

        let path = format!("/photos/{photo_id}/like");
        let request = if currently_liked {
            self.client.delete(&path)
        } else {
            self.client.post(&path)
        }
        .bearer_auth(token.as_str());
        self.client.fetch_empty(request).await?;

        let photos = {
            let mut state = self.state.lock().expect("feed state lock poisoned");
            match state.photos.iter().position(|p| p.id == photo_id) {
                Some(index) => {
                    state.photos[index] = state.photos[index].toggled_like();
                    Some(state.photos.clone())
                }
                None => None,
            }
        };

        if let Some(photos) = photos {
            tracing::debug!(photo_id, liked = !currently_liked, "like toggled");
            self.events.publish(FeedChanged { photos });
        }
        Ok(())
    }

    /// Empties the feed and rewinds the cursor, broadcasting the now-empty
    /// list. The next [`Self::load_next_page`] starts over at page 1.
    pub fn clear(&self) {
        {
            let mut state = self.state.lock().expect("feed state lock poisoned");
            state.photos.clear();
            state.last_loaded_page = 0;
        }
        self.events.publish(FeedChanged { photos: Vec::new() });
    }

    /// Snapshot of the current list.
    pub fn photos(&self) -> Vec<Photo> {
        self.state
            .lock()
            .expect("feed state lock poisoned")
            .photos
            .clone()
    }

    /// Number of the last successfully loaded page, 0 before any load.
    pub fn cursor(&self) -> u32 {
        self.state
            .lock()
            .expect("feed state lock poisoned")
            .last_loaded_page
    }

    pub fn subscribe(&self) -> EventRx<FeedChanged> {
        self.events.subscribe()
    }
}
