//! Typed data access over the document and object stores.
//!
//! Every mutation writes to the store and then re-reads only the collection it
//! touched. Each re-read takes a ticket after its write has completed, and a
//! result is applied only when its ticket is newer than the one already
//! applied for that collection, so a slow early refresh can never overwrite a
//! later one. A failed refresh leaves the previous data in place.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use validator::Validate;

use crate::error::AppError;
use crate::models::comment::{Comment, NewComment};
use crate::models::gallery::{GalleryItem, GalleryPatch, NewGalleryItem};
use crate::models::news::{NewNews, NewsItem, NewsPatch};
use crate::models::program::{NewProgramSie, ProgramItem, ProgramPatch};
use crate::models::{CREATED_AT, UPDATED_AT};
use crate::ranking;
use crate::store::{
    Collection, DocumentStore, ObjectStore, OrderBy, StoreError, StoredDocument, stamp, to_fields,
};
use crate::utils;

#[derive(Debug, Clone, Default, Serialize)]
pub struct SiteSnapshot {
    pub news: Vec<NewsItem>,
    pub programs: Vec<ProgramItem>,
    pub gallery: Vec<GalleryItem>,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub news_count: usize,
    pub program_count: usize,
    pub gallery_count: usize,
    /// Current-year members only, as shown on the public page.
    pub member_count: usize,
    pub comment_count: usize,
    pub pending_comments: usize,
    pub recent_news: Vec<NewsItem>,
    pub recent_comments: Vec<Comment>,
    pub active_sessions: usize,
}

#[derive(Default)]
struct SyncState {
    snapshot: SiteSnapshot,
    applied: [u64; 4],
}

enum Fetched {
    News(Vec<NewsItem>),
    Programs(Vec<ProgramItem>),
    Gallery(Vec<GalleryItem>),
    Comments(Vec<Comment>),
}

impl Fetched {
    fn collection(&self) -> Collection {
        match self {
            Fetched::News(_) => Collection::News,
            Fetched::Programs(_) => Collection::Programs,
            Fetched::Gallery(_) => Collection::Gallery,
            Fetched::Comments(_) => Collection::Comments,
        }
    }
}

fn order_for(collection: Collection) -> Option<OrderBy> {
    match collection {
        Collection::Programs => None,
        _ => Some(OrderBy::desc(CREATED_AT)),
    }
}

fn decode_all<T: DeserializeOwned>(collection: Collection, docs: Vec<StoredDocument>) -> Vec<T> {
    docs.into_iter()
        .filter_map(|doc| {
            let id = doc.id.clone();
            match doc.decode() {
                Ok(item) => Some(item),
                Err(e) => {
                    log::warn!("skipping malformed {} document {}: {}", collection, id, e);
                    None
                }
            }
        })
        .collect()
}

pub struct SiteData {
    documents: Arc<dyn DocumentStore>,
    objects: Arc<dyn ObjectStore>,
    state: RwLock<SyncState>,
    tickets: AtomicU64,
}

impl SiteData {
    pub fn new(documents: Arc<dyn DocumentStore>, objects: Arc<dyn ObjectStore>) -> Self {
        SiteData {
            documents,
            objects,
            state: RwLock::new(SyncState::default()),
            tickets: AtomicU64::new(0),
        }
    }

    // ---------- reads ----------

    pub async fn snapshot(&self) -> SiteSnapshot {
        self.state.read().await.snapshot.clone()
    }

    pub async fn news(&self) -> Vec<NewsItem> {
        self.state.read().await.snapshot.news.clone()
    }

    pub async fn programs(&self) -> Vec<ProgramItem> {
        self.state.read().await.snapshot.programs.clone()
    }

    pub async fn gallery(&self) -> Vec<GalleryItem> {
        self.state.read().await.snapshot.gallery.clone()
    }

    pub async fn comments(&self) -> Vec<Comment> {
        self.state.read().await.snapshot.comments.clone()
    }

    pub async fn find_news(&self, id: &str) -> Option<NewsItem> {
        let state = self.state.read().await;
        state.snapshot.news.iter().find(|n| n.id == id).cloned()
    }

    pub async fn find_gallery_item(&self, id: &str) -> Option<GalleryItem> {
        let state = self.state.read().await;
        state.snapshot.gallery.iter().find(|g| g.id == id).cloned()
    }

    /// Current-year members in display order.
    pub async fn members(&self, current_year: &str) -> Vec<GalleryItem> {
        let state = self.state.read().await;
        ranking::rank_members(&state.snapshot.gallery, current_year)
    }

    pub async fn summary(&self, active_sessions: usize, current_year: &str) -> DashboardSummary {
        let state = self.state.read().await;
        let snapshot = &state.snapshot;
        DashboardSummary {
            news_count: snapshot.news.len(),
            program_count: snapshot.programs.len(),
            gallery_count: snapshot.gallery.len(),
            member_count: ranking::rank_members(&snapshot.gallery, current_year).len(),
            comment_count: snapshot.comments.len(),
            pending_comments: snapshot.comments.iter().filter(|c| !c.approved).count(),
            recent_news: snapshot.news.iter().take(3).cloned().collect(),
            recent_comments: snapshot.comments.iter().take(5).cloned().collect(),
            active_sessions,
        }
    }

    // ---------- refresh ----------

    /// Initial load of all four collections.
    pub async fn refresh_all(&self) -> Result<(), StoreError> {
        for collection in Collection::ALL {
            let ticket = self.next_ticket();
            let fetched = self.fetch(collection).await?;
            self.apply(ticket, fetched).await;
        }
        Ok(())
    }

    async fn refresh(&self, collection: Collection) {
        let ticket = self.next_ticket();
        match self.fetch(collection).await {
            Ok(fetched) => self.apply(ticket, fetched).await,
            Err(e) => log::warn!("refresh of {} failed, keeping previous data: {}", collection, e),
        }
    }

    fn next_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn fetch(&self, collection: Collection) -> Result<Fetched, StoreError> {
        let docs = self.documents.list(collection, order_for(collection)).await?;
        Ok(match collection {
            Collection::News => Fetched::News(decode_all(collection, docs)),
            Collection::Programs => Fetched::Programs(decode_all(collection, docs)),
            Collection::Gallery => Fetched::Gallery(decode_all(collection, docs)),
            Collection::Comments => Fetched::Comments(decode_all(collection, docs)),
        })
    }

    async fn apply(&self, ticket: u64, fetched: Fetched) {
        let collection = fetched.collection();
        let mut state = self.state.write().await;
        let slot = collection.index();
        if ticket <= state.applied[slot] {
            log::debug!(
                "discarding stale {} refresh (ticket {} <= {})",
                collection,
                ticket,
                state.applied[slot]
            );
            return;
        }
        state.applied[slot] = ticket;
        match fetched {
            Fetched::News(items) => state.snapshot.news = items,
            Fetched::Programs(items) => state.snapshot.programs = items,
            Fetched::Gallery(items) => state.snapshot.gallery = items,
            Fetched::Comments(items) => state.snapshot.comments = items,
        }
    }

    // ---------- images ----------

    /// Store an uploaded image under `folder` and return its public URL.
    pub async fn upload_image(
        &self,
        bytes: &[u8],
        filename: &str,
        folder: &str,
    ) -> Result<String, AppError> {
        if bytes.is_empty() {
            return Err(AppError::Validation("File gambar kosong".to_string()));
        }
        let key = utils::object_key(folder, filename, Utc::now());
        let locator = self.objects.upload(bytes, &key).await?;
        log::info!("uploaded image {} ({} bytes)", locator, bytes.len());
        Ok(self.objects.public_url(&locator))
    }

    // Orphaned blobs are acceptable; a failed delete never blocks the document.
    async fn discard_image(&self, image_url: &str) {
        if image_url.trim().is_empty() {
            return;
        }
        if let Err(e) = self.objects.delete(image_url).await {
            log::warn!("failed to delete image {}: {}", image_url, e);
        }
    }

    // ---------- news ----------

    pub async fn add_news(&self, draft: NewNews) -> Result<String, AppError> {
        let draft = draft.normalized();
        draft.validate()?;

        let now = Utc::now();
        let mut fields = to_fields(&draft)?;
        stamp(&mut fields, CREATED_AT, now);
        stamp(&mut fields, UPDATED_AT, now);

        let id = self.documents.add(Collection::News, fields).await?;
        log::info!("news {} created", id);
        self.refresh(Collection::News).await;
        Ok(id)
    }

    pub async fn update_news(&self, id: &str, patch: NewsPatch) -> Result<(), AppError> {
        let patch = patch.normalized();
        patch.validate()?;

        let mut fields = to_fields(&patch)?;
        stamp(&mut fields, UPDATED_AT, Utc::now());

        self.documents.update(Collection::News, id, fields).await?;
        log::info!("news {} updated", id);
        self.refresh(Collection::News).await;
        Ok(())
    }

    pub async fn delete_news(&self, id: &str, image_url: Option<&str>) -> Result<(), AppError> {
        if let Some(url) = image_url {
            self.discard_image(url).await;
        }
        self.documents.delete(Collection::News, id).await?;
        log::info!("news {} deleted", id);
        self.refresh(Collection::News).await;
        Ok(())
    }

    // ---------- programs ----------

    pub async fn add_program_sie(&self, draft: NewProgramSie) -> Result<String, AppError> {
        let draft = draft.normalized();
        draft.validate()?;

        let mut fields = to_fields(&draft)?;
        stamp(&mut fields, UPDATED_AT, Utc::now());

        let id = self.documents.add(Collection::Programs, fields).await?;
        log::info!("program sie {} created", id);
        self.refresh(Collection::Programs).await;
        Ok(id)
    }

    pub async fn update_program(&self, id: &str, patch: ProgramPatch) -> Result<(), AppError> {
        let patch = patch.normalized();
        patch.validate()?;

        let mut fields = to_fields(&patch)?;
        stamp(&mut fields, UPDATED_AT, Utc::now());

        self.documents.update(Collection::Programs, id, fields).await?;
        log::info!("program sie {} updated", id);
        self.refresh(Collection::Programs).await;
        Ok(())
    }

    pub async fn delete_program_sie(&self, id: &str) -> Result<(), AppError> {
        self.documents.delete(Collection::Programs, id).await?;
        log::info!("program sie {} deleted", id);
        self.refresh(Collection::Programs).await;
        Ok(())
    }

    // ---------- gallery ----------

    pub async fn add_gallery_item(&self, draft: NewGalleryItem) -> Result<String, AppError> {
        let draft = draft.normalized(&utils::current_year());
        draft.validate()?;

        let mut fields = to_fields(&draft)?;
        stamp(&mut fields, CREATED_AT, Utc::now());

        let id = self.documents.add(Collection::Gallery, fields).await?;
        log::info!("gallery item {} created", id);
        self.refresh(Collection::Gallery).await;
        Ok(id)
    }

    pub async fn update_gallery_item(&self, id: &str, patch: GalleryPatch) -> Result<(), AppError> {
        let patch = patch.normalized();
        patch.validate()?;

        let fields = to_fields(&patch)?;
        self.documents.update(Collection::Gallery, id, fields).await?;
        log::info!("gallery item {} updated", id);
        self.refresh(Collection::Gallery).await;
        Ok(())
    }

    pub async fn delete_gallery_item(&self, id: &str, image_url: &str) -> Result<(), AppError> {
        self.discard_image(image_url).await;
        self.documents.delete(Collection::Gallery, id).await?;
        log::info!("gallery item {} deleted", id);
        self.refresh(Collection::Gallery).await;
        Ok(())
    }

    // ---------- comments ----------

    pub async fn add_comment(&self, draft: NewComment) -> Result<String, AppError> {
        let draft = draft.normalized();
        draft.validate()?;

        let mut fields = to_fields(&draft)?;
        stamp(&mut fields, CREATED_AT, Utc::now());
        fields.insert("approved".to_string(), Value::Bool(false));

        let id = self.documents.add(Collection::Comments, fields).await?;
        log::info!("comment {} received", id);
        self.refresh(Collection::Comments).await;
        Ok(id)
    }

    pub async fn update_comment(&self, id: &str, approved: bool) -> Result<(), AppError> {
        let mut fields = crate::store::Fields::new();
        fields.insert("approved".to_string(), Value::Bool(approved));

        self.documents.update(Collection::Comments, id, fields).await?;
        log::info!("comment {} approved={}", id, approved);
        self.refresh(Collection::Comments).await;
        Ok(())
    }

    pub async fn delete_comment(&self, id: &str) -> Result<(), AppError> {
        self.documents.delete(Collection::Comments, id).await?;
        log::info!("comment {} deleted", id);
        self.refresh(Collection::Comments).await;
        Ok(())
    }
}
