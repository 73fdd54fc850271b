// ============================================================================
// Menu Core - Menu Store
// File: crates/menu-core/src/services/menu_store.rs
// ============================================================================
//! Owns the per-set editor trees of the active site and coordinates loads,
//! saves, page sync and the local draft mirror.
//!
//! At most one load is outstanding. A load for the key already in flight is
//! a no-op; a load for another key aborts the previous one, and a superseded
//! response never commits. Saves are neither deduplicated nor cancellable and
//! work on the tree as it was when the save was called. The reload after a
//! save only replaces that same tree; edits made meanwhile are kept.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use menu_shared::config::MenuSettings;
use menu_shared::{DraftScope, PageRequest};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::{AbortController, AbortSignal, Debouncer};
use crate::domain::{EditorNode, InternalPage, LinkTarget, MenuNode, SetKey, SiteKind};
use crate::error::MenuError;
use crate::repositories::{CatalogGateway, DraftStorage, MenuRepository, PagesGateway};
use crate::tree::editor_ops::{self, NodePatch};
use crate::tree::transfer::validate_tree;
use crate::tree::{build, derive_triples, export_json, flatten, parse_import, to_editor};

/// Store tuning, usually taken from `MenuSettings`.
#[derive(Debug, Clone)]
pub struct MenuStoreConfig {
    pub page_size: u32,
    pub draft_key: String,
    pub draft_scope: DraftScope,
    pub draft_debounce: Duration,
    pub site_kind: SiteKind,
}

impl Default for MenuStoreConfig {
    fn default() -> Self {
        Self {
            page_size: menu_shared::constants::DEFAULT_MENU_PAGE_SIZE,
            draft_key: menu_shared::constants::DRAFT_SLOT_KEY.to_string(),
            draft_scope: DraftScope::default(),
            draft_debounce: Duration::from_millis(menu_shared::constants::DEFAULT_DRAFT_DEBOUNCE_MS),
            site_kind: "storefront".to_string(),
        }
    }
}

impl From<&MenuSettings> for MenuStoreConfig {
    fn from(settings: &MenuSettings) -> Self {
        Self {
            page_size: settings.page_size.clamp(1, menu_shared::constants::MAX_MENU_PAGE_SIZE),
            draft_key: settings.draft_key.clone(),
            draft_scope: settings.draft_scope,
            draft_debounce: Duration::from_millis(settings.draft_debounce_ms),
            site_kind: settings.site_kind.clone(),
        }
    }
}

/// Identity of a load request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub set_key: SetKey,
    pub site_id: String,
}

impl RequestKey {
    pub fn new(set_key: SetKey, site_id: &str) -> Self {
        Self {
            set_key,
            site_id: site_id.to_string(),
        }
    }
}

/// How a `load_from_server` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOutcome {
    /// Rows fetched and committed.
    Loaded { nodes: usize },
    /// Same key already loading; nothing fetched.
    InFlight,
    /// Same key loaded last; cached tree trusted.
    Cached,
    /// A newer request replaced this one; its result was discarded.
    Superseded,
    /// Rows fetched after a save, but the tree was edited while the save
    /// ran; the local tree was kept.
    Retained { nodes: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReport {
    pub rows_saved: usize,
    pub triples_pushed: usize,
    pub reloaded: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStatus {
    pub loading: bool,
    pub saving: bool,
}

/// Effective link of one scheduled node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledLink {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
}

struct InFlightLoad {
    key: RequestKey,
    generation: u64,
    controller: AbortController,
}

struct StoreState {
    site_id: String,
    site_kind: SiteKind,
    /// One array per set, replaced wholesale on every change.
    trees: HashMap<SetKey, Arc<Vec<EditorNode>>>,
    in_flight: Option<InFlightLoad>,
    /// Most recent completed load, cleared whenever another load starts.
    loaded: Option<RequestKey>,
    generation: u64,
    loading: HashMap<SetKey, usize>,
    saving: HashMap<SetKey, usize>,
}

struct DraftSnapshot {
    slot: String,
    trees: BTreeMap<SetKey, Arc<Vec<EditorNode>>>,
}

impl DraftSnapshot {
    fn to_json(&self) -> Result<String, MenuError> {
        let view: BTreeMap<SetKey, &[EditorNode]> = self
            .trees
            .iter()
            .map(|(set, nodes)| (*set, nodes.as_slice()))
            .collect();
        Ok(serde_json::to_string(&view)?)
    }
}

#[derive(Clone, Copy)]
enum Flag {
    Loading,
    Saving,
}

/// Raises a status flag for its lifetime so every operation settles.
struct StatusGuard {
    state: Arc<Mutex<StoreState>>,
    set_key: SetKey,
    flag: Flag,
}

impl StatusGuard {
    fn raise(state: &Arc<Mutex<StoreState>>, set_key: SetKey, flag: Flag) -> Self {
        {
            let mut st = state.lock();
            *Self::counter(&mut st, flag).entry(set_key).or_insert(0) += 1;
        }
        Self {
            state: state.clone(),
            set_key,
            flag,
        }
    }

    fn counter(st: &mut StoreState, flag: Flag) -> &mut HashMap<SetKey, usize> {
        match flag {
            Flag::Loading => &mut st.loading,
            Flag::Saving => &mut st.saving,
        }
    }
}

impl Drop for StatusGuard {
    fn drop(&mut self) {
        let mut st = self.state.lock();
        let counter = Self::counter(&mut st, self.flag);
        if let Some(count) = counter.get_mut(&self.set_key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                counter.remove(&self.set_key);
            }
        }
    }
}

pub struct MenuStore {
    menus: Arc<dyn MenuRepository>,
    pages: Arc<dyn PagesGateway>,
    catalog: Arc<dyn CatalogGateway>,
    drafts: Arc<dyn DraftStorage>,
    config: MenuStoreConfig,
    state: Arc<Mutex<StoreState>>,
    catalog_cache: DashMap<SiteKind, Arc<Vec<InternalPage>>>,
    draft_writer: Debouncer<DraftSnapshot>,
}

impl MenuStore {
    pub fn new(
        menus: Arc<dyn MenuRepository>,
        pages: Arc<dyn PagesGateway>,
        catalog: Arc<dyn CatalogGateway>,
        drafts: Arc<dyn DraftStorage>,
        config: MenuStoreConfig,
        site_id: &str,
    ) -> Self {
        let writer_storage = drafts.clone();
        let draft_writer = Debouncer::new(config.draft_debounce, move |snapshot: DraftSnapshot| {
            let storage = writer_storage.clone();
            async move {
                let written = match snapshot.to_json() {
                    Ok(json) => storage.write(&snapshot.slot, &json).await,
                    Err(e) => Err(e),
                };
                match written {
                    Ok(()) => debug!("Menu draft written to slot {}", snapshot.slot),
                    Err(e) => warn!("Failed to write menu draft {}: {}", snapshot.slot, e),
                }
            }
        });

        let state = StoreState {
            site_id: site_id.to_string(),
            site_kind: config.site_kind.clone(),
            trees: HashMap::new(),
            in_flight: None,
            loaded: None,
            generation: 0,
            loading: HashMap::new(),
            saving: HashMap::new(),
        };

        Self {
            menus,
            pages,
            catalog,
            drafts,
            config,
            state: Arc::new(Mutex::new(state)),
            catalog_cache: DashMap::new(),
            draft_writer,
        }
    }

    pub fn active_site(&self) -> String {
        self.state.lock().site_id.clone()
    }

    pub fn status(&self, set_key: SetKey) -> StoreStatus {
        let st = self.state.lock();
        StoreStatus {
            loading: st.loading.contains_key(&set_key),
            saving: st.saving.contains_key(&set_key),
        }
    }

    /// Current tree of `set_key` (empty when never loaded).
    pub fn tree(&self, set_key: SetKey) -> Arc<Vec<EditorNode>> {
        self.state
            .lock()
            .trees
            .get(&set_key)
            .cloned()
            .unwrap_or_default()
    }

    fn draft_slot(&self, site_id: &str) -> String {
        self.config.draft_scope.slot_key(&self.config.draft_key, site_id)
    }

    // ------------------------------------------------------------------
    // Draft mirror
    // ------------------------------------------------------------------

    /// Seed empty sets of the active site from the local draft slot.
    /// Returns how many sets were restored.
    pub async fn restore_draft(&self) -> Result<usize, MenuError> {
        let site_id = self.active_site();
        let slot = self.draft_slot(&site_id);
        let Some(text) = self.drafts.read(&slot).await? else {
            return Ok(0);
        };
        let drafts: BTreeMap<SetKey, Vec<EditorNode>> = serde_json::from_str(&text)?;

        let mut st = self.state.lock();
        if st.site_id != site_id {
            debug!("Site changed while reading draft {}, ignoring it", slot);
            return Ok(0);
        }
        let mut restored = 0;
        for (set_key, nodes) in drafts {
            if let Entry::Vacant(entry) = st.trees.entry(set_key) {
                entry.insert(Arc::new(nodes));
                restored += 1;
            }
        }
        info!("Restored {} menu sets from draft for site {}", restored, site_id);
        Ok(restored)
    }

    fn schedule_draft(&self) {
        let snapshot = {
            let st = self.state.lock();
            DraftSnapshot {
                slot: self.draft_slot(&st.site_id),
                trees: st.trees.iter().map(|(k, v)| (*k, v.clone())).collect(),
            }
        };
        self.draft_writer.trigger(snapshot);
    }

    /// Write any pending draft immediately.
    pub async fn flush_draft(&self) {
        self.draft_writer.flush().await;
    }

    // ------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------

    async fn pages_for(&self, site_kind: &str) -> Result<Arc<Vec<InternalPage>>, MenuError> {
        if let Some(pages) = self.catalog_cache.get(site_kind) {
            return Ok(pages.clone());
        }
        let pages = Arc::new(self.catalog.fetch_internal_pages(site_kind).await?);
        debug!("Loaded {} internal pages for site kind {}", pages.len(), site_kind);
        self.catalog_cache.insert(site_kind.to_string(), pages.clone());
        Ok(pages)
    }

    /// Internal pages of the active site kind.
    pub async fn internal_pages(&self) -> Result<Arc<Vec<InternalPage>>, MenuError> {
        let site_kind = self.state.lock().site_kind.clone();
        self.pages_for(&site_kind).await
    }

    /// Switch the catalog used for classification. Fetched once per kind.
    pub async fn select_site_kind(&self, site_kind: &str) -> Result<usize, MenuError> {
        let pages = self.pages_for(site_kind).await?;
        self.state.lock().site_kind = site_kind.to_string();
        Ok(pages.len())
    }

    // ------------------------------------------------------------------
    // Load
    // ------------------------------------------------------------------

    pub async fn load_from_server(&self, set_key: SetKey, site_id: &str) -> Result<LoadOutcome, MenuError> {
        self.load(set_key, site_id, false, None).await
    }

    /// Load even if this key was the last one loaded. In-flight
    /// deduplication still applies.
    pub async fn reload(&self, set_key: SetKey, site_id: &str) -> Result<LoadOutcome, MenuError> {
        self.load(set_key, site_id, true, None).await
    }

    /// `base` is the tree a save worked on. When set, the fetched rows only
    /// replace the tree if it is still that exact array.
    async fn load(
        &self,
        set_key: SetKey,
        site_id: &str,
        force: bool,
        base: Option<&Arc<Vec<EditorNode>>>,
    ) -> Result<LoadOutcome, MenuError> {
        let key = RequestKey::new(set_key, site_id);

        let (generation, signal, switched) = {
            let mut st = self.state.lock();
            if st.in_flight.as_ref().is_some_and(|f| f.key == key) {
                debug!("Load for {}/{} already in flight", set_key, site_id);
                return Ok(LoadOutcome::InFlight);
            }
            if !force && st.loaded.as_ref() == Some(&key) {
                debug!("Menu {}/{} already loaded, using cached tree", set_key, site_id);
                return Ok(LoadOutcome::Cached);
            }
            if let Some(previous) = st.in_flight.take() {
                info!(
                    "Cancelling load for {}/{} in favour of {}/{}",
                    previous.key.set_key, previous.key.site_id, set_key, site_id
                );
                previous.controller.abort();
            }

            let switched = st.site_id != site_id;
            if switched {
                info!("Switching active site {} -> {}", st.site_id, site_id);
                st.site_id = site_id.to_string();
                st.trees.clear();
            }

            st.loaded = None;
            st.generation += 1;
            let controller = AbortController::new();
            let signal = controller.signal();
            st.in_flight = Some(InFlightLoad {
                key: key.clone(),
                generation: st.generation,
                controller,
            });
            (st.generation, signal, switched)
        };

        let _loading = StatusGuard::raise(&self.state, set_key, Flag::Loading);

        if switched {
            if let Err(e) = self.restore_draft().await {
                warn!("Could not restore draft for site {}: {}", site_id, e);
            }
        }

        let fetched = async {
            let pages = self.internal_pages().await?;
            let rows = self.fetch_all(set_key, site_id, &signal).await?;
            Ok::<_, MenuError>((pages, rows))
        }
        .await;

        let committed = {
            let mut st = self.state.lock();
            let current = st.in_flight.as_ref().map(|f| f.generation) == Some(generation);
            if signal.is_aborted() || !current {
                debug!("Discarding superseded load for {}/{}", set_key, site_id);
                return Ok(LoadOutcome::Superseded);
            }
            st.in_flight = None;

            match fetched {
                Ok((pages, rows)) => {
                    st.loaded = Some(key);
                    let edited = base.is_some_and(|base| match st.trees.get(&set_key) {
                        Some(current) => !Arc::ptr_eq(base, current),
                        None => !base.is_empty(),
                    });
                    if edited {
                        let nodes = st.trees.get(&set_key).map_or(0, |t| t.len());
                        Ok(LoadOutcome::Retained { nodes })
                    } else {
                        let tree = to_editor(&build(rows), &pages);
                        let nodes = tree.len();
                        st.trees.insert(set_key, Arc::new(tree));
                        Ok(LoadOutcome::Loaded { nodes })
                    }
                }
                Err(MenuError::Aborted) => Ok(LoadOutcome::Superseded),
                Err(e) => Err(e),
            }
        };

        match &committed {
            Ok(LoadOutcome::Loaded { nodes }) => {
                info!("Loaded menu {}/{} ({} root nodes)", set_key, site_id, nodes);
                self.schedule_draft();
            }
            Ok(LoadOutcome::Retained { .. }) => {
                info!("Menu {}/{} edited during save, keeping local tree", set_key, site_id);
            }
            Err(e) => warn!("Failed to load menu {}/{}: {}", set_key, site_id, e),
            Ok(_) => {}
        }
        committed
    }

    async fn fetch_all(&self, set_key: SetKey, site_id: &str, signal: &AbortSignal) -> Result<Vec<MenuNode>, MenuError> {
        let mut page = PageRequest::first(self.config.page_size);
        let mut rows = Vec::new();
        loop {
            signal.check()?;
            let batch = self
                .menus
                .fetch_menu_rows(set_key, site_id, page, signal.clone())
                .await?;
            let done = batch.len() < page.page_size as usize;
            rows.extend(batch);
            if done {
                return Ok(rows);
            }
            page = page.next();
        }
    }

    // ------------------------------------------------------------------
    // Save and page sync
    // ------------------------------------------------------------------

    /// Saves and edits only apply to the site loaded last.
    pub fn ensure_active_site(&self, site_id: &str) -> Result<(), MenuError> {
        let active = self.active_site();
        if active != site_id {
            return Err(MenuError::Validation(format!(
                "Site {} is not the active site ({})",
                site_id, active
            )));
        }
        Ok(())
    }

    fn snapshot(&self, set_key: SetKey, site_id: &str) -> Result<Arc<Vec<EditorNode>>, MenuError> {
        self.ensure_active_site(site_id)?;
        Ok(self.tree(set_key))
    }

    /// Persist the tree as it is now, push page triples, then reload.
    /// `reloaded` is false when the tree was edited during the save.
    ///
    /// A rejected page push returns `MenuError::PagesSync`; the rows are
    /// already saved at that point and the reload is skipped.
    pub async fn save_to_server(&self, set_key: SetKey, site_id: &str) -> Result<SaveReport, MenuError> {
        let _saving = StatusGuard::raise(&self.state, set_key, Flag::Saving);
        let tree = self.snapshot(set_key, site_id)?;
        let pages = self.internal_pages().await?;

        let rows = flatten(&tree, set_key, &pages);
        let rows_saved = self.menus.save_menu_rows(set_key, site_id, &rows).await.map_err(|e| {
            error!("Failed to save menu {}/{}: {}", set_key, site_id, e);
            e
        })?;
        info!("Saved {} menu rows for {}/{}", rows_saved, set_key, site_id);

        let triples = derive_triples(&tree, &pages);
        let triples_pushed = if triples.is_empty() {
            0
        } else {
            self.pages
                .sync_pages_from_menu(site_id, &triples)
                .await
                .map_err(|e| {
                    error!("Menu {}/{} saved but page sync failed: {}", set_key, site_id, e);
                    MenuError::PagesSync {
                        saved_rows: rows_saved,
                        message: e.to_string(),
                    }
                })?;
            triples.len()
        };

        let reloaded = match self.load(set_key, site_id, true, Some(&tree)).await {
            Ok(outcome) => matches!(outcome, LoadOutcome::Loaded { .. }),
            Err(e) => {
                warn!("Reload after save of {}/{} failed: {}", set_key, site_id, e);
                false
            }
        };

        Ok(SaveReport {
            rows_saved,
            triples_pushed,
            reloaded,
        })
    }

    /// Push page triples for the current tree again, then reload. Recovery
    /// path after a `PagesSync` failure.
    pub async fn retry_page_sync(&self, set_key: SetKey, site_id: &str) -> Result<usize, MenuError> {
        let _saving = StatusGuard::raise(&self.state, set_key, Flag::Saving);
        let tree = self.snapshot(set_key, site_id)?;
        let pages = self.internal_pages().await?;
        let triples = derive_triples(&tree, &pages);
        if !triples.is_empty() {
            self.pages.sync_pages_from_menu(site_id, &triples).await?;
            info!("Synced {} pages for {}/{}", triples.len(), set_key, site_id);
        }
        if let Err(e) = self.load(set_key, site_id, true, Some(&tree)).await {
            warn!("Reload after page sync of {}/{} failed: {}", set_key, site_id, e);
        }
        Ok(triples.len())
    }

    // ------------------------------------------------------------------
    // Editor mutations
    // ------------------------------------------------------------------

    /// Apply `edit` to a copy of the set's tree; the copy replaces the tree
    /// only when `edit` succeeds.
    fn mutate<R>(
        &self,
        set_key: SetKey,
        edit: impl FnOnce(&mut Vec<EditorNode>) -> Result<R, MenuError>,
    ) -> Result<R, MenuError> {
        let result = {
            let mut st = self.state.lock();
            let mut nodes: Vec<EditorNode> = st
                .trees
                .get(&set_key)
                .map(|t| t.as_ref().clone())
                .unwrap_or_default();
            let result = edit(&mut nodes)?;
            st.trees.insert(set_key, Arc::new(nodes));
            result
        };
        self.schedule_draft();
        Ok(result)
    }

    pub fn replace_tree(&self, set_key: SetKey, nodes: Vec<EditorNode>) -> Result<(), MenuError> {
        validate_tree(&nodes)?;
        self.mutate(set_key, move |tree| {
            *tree = nodes;
            Ok(())
        })
    }

    pub fn add_node(
        &self,
        set_key: SetKey,
        parent_id: Option<&str>,
        node: EditorNode,
        index: Option<usize>,
    ) -> Result<(), MenuError> {
        if node.title.trim().is_empty() {
            return Err(MenuError::Validation("Menu title must not be empty".to_string()));
        }
        self.mutate(set_key, |tree| editor_ops::add_node(tree, parent_id, node, index))
    }

    pub fn remove_node(&self, set_key: SetKey, id: &str) -> Result<EditorNode, MenuError> {
        self.mutate(set_key, |tree| editor_ops::remove_node(tree, id))
    }

    pub fn move_node(
        &self,
        set_key: SetKey,
        id: &str,
        new_parent: Option<&str>,
        index: Option<usize>,
    ) -> Result<(), MenuError> {
        self.mutate(set_key, |tree| editor_ops::move_node(tree, id, new_parent, index))
    }

    pub fn update_node(&self, set_key: SetKey, id: &str, patch: NodePatch) -> Result<(), MenuError> {
        self.mutate(set_key, |tree| editor_ops::update_node(tree, id, patch))
    }

    pub fn set_link(&self, set_key: SetKey, id: &str, link: LinkTarget) -> Result<(), MenuError> {
        self.mutate(set_key, |tree| editor_ops::set_link(tree, id, link))
    }

    pub fn set_raw_path(&self, set_key: SetKey, id: &str, raw_path: Option<String>) -> Result<(), MenuError> {
        self.mutate(set_key, |tree| editor_ops::set_raw_path(tree, id, raw_path))
    }

    /// Replace the set's tree with a JSON document; all-or-nothing.
    pub fn import_json(&self, set_key: SetKey, text: &str) -> Result<usize, MenuError> {
        let nodes = parse_import(text)?;
        let count = nodes.len();
        self.mutate(set_key, move |tree| {
            *tree = nodes;
            Ok(())
        })?;
        info!("Imported {} root menu nodes into {}", count, set_key);
        Ok(count)
    }

    pub fn export_json(&self, set_key: SetKey) -> Result<String, MenuError> {
        export_json(&self.tree(set_key))
    }

    /// Effective url of every scheduled node of the set at `now`.
    pub fn effective_links(&self, set_key: SetKey, now: DateTime<Utc>) -> Vec<ScheduledLink> {
        let tree = self.tree(set_key);
        let mut links = Vec::new();
        let mut stack: Vec<&EditorNode> = tree.iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.children.iter().rev());
            if let LinkTarget::Scheduled { .. } = node.link {
                links.push(ScheduledLink {
                    id: node.id.clone(),
                    title: node.title.clone(),
                    url: node.effective_url(now).map(str::to_string),
                });
            }
        }
        links
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Semaphore;

    use crate::domain::{FlatRow, Schedule};
    use crate::repositories::{MemoryDraftStorage, MockPagesGateway};
    use crate::tree::builder::tests::row;

    const SITE: &str = "site1";

    #[derive(Default)]
    struct FakeMenus {
        rows: Mutex<HashMap<SetKey, Vec<MenuNode>>>,
        fetches: AtomicUsize,
        saves: AtomicUsize,
        gate: Option<Arc<Semaphore>>,
        save_gate: Option<Arc<Semaphore>>,
        honor_abort: bool,
        fail: AtomicBool,
    }

    impl FakeMenus {
        fn with_rows(set_key: SetKey, rows: Vec<MenuNode>) -> Self {
            let fake = Self::default();
            fake.rows.lock().insert(set_key, rows);
            fake
        }

        fn gated(honor_abort: bool) -> (Self, Arc<Semaphore>) {
            let gate = Arc::new(Semaphore::new(0));
            let fake = Self {
                gate: Some(gate.clone()),
                honor_abort,
                ..Self::default()
            };
            (fake, gate)
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MenuRepository for FakeMenus {
        async fn fetch_menu_rows(
            &self,
            set_key: SetKey,
            _site_id: &str,
            page: PageRequest,
            signal: AbortSignal,
        ) -> Result<Vec<MenuNode>, MenuError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                if self.honor_abort {
                    tokio::select! {
                        permit = gate.acquire() => permit.map_err(|e| MenuError::Internal(e.to_string()))?.forget(),
                        _ = signal.aborted() => return Err(MenuError::Aborted),
                    }
                } else {
                    gate.acquire().await.map_err(|e| MenuError::Internal(e.to_string()))?.forget();
                }
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(MenuError::Network("connection reset".to_string()));
            }
            let rows = self.rows.lock().get(&set_key).cloned().unwrap_or_default();
            Ok(rows
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .collect())
        }

        async fn save_menu_rows(&self, set_key: SetKey, site_id: &str, rows: &[FlatRow]) -> Result<usize, MenuError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.save_gate {
                gate.acquire().await.map_err(|e| MenuError::Internal(e.to_string()))?.forget();
            }
            let nodes = rows
                .iter()
                .map(|r| MenuNode {
                    id: r.id.clone(),
                    parent_id: r.parent_id.clone(),
                    title: r.title.clone(),
                    path: r.path.clone(),
                    icon: r.icon.clone(),
                    sort_order: r.sort_order,
                    visible: r.visible,
                    set_key: r.set_key,
                    site_id: site_id.to_string(),
                })
                .collect();
            self.rows.lock().insert(set_key, nodes);
            Ok(rows.len())
        }
    }

    struct FixedCatalog(Vec<InternalPage>);

    #[async_trait]
    impl CatalogGateway for FixedCatalog {
        async fn fetch_internal_pages(&self, _site_kind: &str) -> Result<Vec<InternalPage>, MenuError> {
            Ok(self.0.clone())
        }
    }

    fn catalog() -> Arc<FixedCatalog> {
        Arc::new(FixedCatalog(vec![
            InternalPage::new("p-home", "/"),
            InternalPage::new("p-shop", "/shop"),
        ]))
    }

    fn config() -> MenuStoreConfig {
        MenuStoreConfig {
            page_size: 2,
            draft_debounce: Duration::from_millis(20),
            ..MenuStoreConfig::default()
        }
    }

    fn store_with(menus: Arc<FakeMenus>, pages: MockPagesGateway, drafts: Arc<MemoryDraftStorage>) -> MenuStore {
        MenuStore::new(menus, Arc::new(pages), catalog(), drafts, config(), SITE)
    }

    fn home_rows() -> Vec<MenuNode> {
        vec![
            row("1", None, "Home", Some("/"), 1),
            row("2", Some("1"), "Shop", Some("/shop/"), 1),
            row("3", Some("1"), "Sale", Some("/sale"), 2),
            row("4", None, "Blog", Some("https://blog.example.com"), 2),
        ]
    }

    #[tokio::test]
    async fn test_load_pages_through_all_rows() {
        let menus = Arc::new(FakeMenus::with_rows(SetKey::Home, home_rows()));
        let store = store_with(menus.clone(), MockPagesGateway::new(), Arc::new(MemoryDraftStorage::new()));

        let outcome = store.load_from_server(SetKey::Home, SITE).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded { nodes: 2 });
        // page size 2 over 4 rows: two full pages and one empty page
        assert_eq!(menus.fetches(), 3);

        let tree = store.tree(SetKey::Home);
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[0].children[0].link, LinkTarget::Internal { page_id: Some("p-shop".to_string()) });
        assert_eq!(tree[1].link.kind(), "external");

        let again = store.load_from_server(SetKey::Home, SITE).await.unwrap();
        assert_eq!(again, LoadOutcome::Cached);
        assert_eq!(menus.fetches(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_loads_for_same_key_fetch_once() {
        let (menus, gate) = FakeMenus::gated(true);
        let menus = Arc::new(menus);
        menus.rows.lock().insert(SetKey::Home, vec![row("1", None, "Home", Some("/"), 1)]);
        let store = store_with(menus.clone(), MockPagesGateway::new(), Arc::new(MemoryDraftStorage::new()));

        let (first, second, _) = tokio::join!(
            store.load_from_server(SetKey::Home, SITE),
            store.load_from_server(SetKey::Home, SITE),
            async {
                tokio::time::sleep(Duration::from_millis(30)).await;
                gate.add_permits(1);
            }
        );

        assert_eq!(first.unwrap(), LoadOutcome::Loaded { nodes: 1 });
        assert_eq!(second.unwrap(), LoadOutcome::InFlight);
        assert_eq!(menus.fetches(), 1);
        assert_eq!(store.status(SetKey::Home), StoreStatus::default());
    }

    async fn superseded_load_never_commits(honor_abort: bool) {
        let (menus, gate) = FakeMenus::gated(honor_abort);
        let menus = Arc::new(menus);
        menus.rows.lock().insert(SetKey::Home, vec![row("h1", None, "Home", Some("/"), 1)]);
        menus.rows.lock().insert(SetKey::V1, vec![row("v1", None, "Catalog", Some("/shop"), 1)]);
        let store = Arc::new(store_with(
            menus.clone(),
            MockPagesGateway::new(),
            Arc::new(MemoryDraftStorage::new()),
        ));

        let home = tokio::spawn({
            let store = store.clone();
            async move { store.load_from_server(SetKey::Home, SITE).await }
        });
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(store.status(SetKey::Home).loading);

        let v1 = tokio::spawn({
            let store = store.clone();
            async move { store.load_from_server(SetKey::V1, SITE).await }
        });
        tokio::time::sleep(Duration::from_millis(30)).await;
        gate.add_permits(2);

        assert_eq!(home.await.unwrap().unwrap(), LoadOutcome::Superseded);
        assert_eq!(v1.await.unwrap().unwrap(), LoadOutcome::Loaded { nodes: 1 });
        assert!(store.tree(SetKey::Home).is_empty());
        assert_eq!(store.tree(SetKey::V1)[0].id, "v1");
        assert!(!store.status(SetKey::Home).loading);
        assert!(!store.status(SetKey::V1).loading);
    }

    #[tokio::test]
    async fn test_cancelled_load_aborts_fetch() {
        superseded_load_never_commits(true).await;
    }

    #[tokio::test]
    async fn test_late_response_of_cancelled_load_is_discarded() {
        superseded_load_never_commits(false).await;
    }

    #[tokio::test]
    async fn test_failed_load_keeps_tree_and_settles_status() {
        let menus = Arc::new(FakeMenus::with_rows(SetKey::Home, home_rows()));
        menus.fail.store(true, Ordering::SeqCst);
        let store = store_with(menus.clone(), MockPagesGateway::new(), Arc::new(MemoryDraftStorage::new()));
        store
            .replace_tree(SetKey::Home, vec![EditorNode::new("Local").with_id("local")])
            .unwrap();

        let err = store.load_from_server(SetKey::Home, SITE).await.unwrap_err();
        assert!(matches!(err, MenuError::Network(_)));
        assert_eq!(store.tree(SetKey::Home)[0].id, "local");
        assert_eq!(store.status(SetKey::Home), StoreStatus::default());

        // nothing was cached, so the next load fetches again
        menus.fail.store(false, Ordering::SeqCst);
        let outcome = store.load_from_server(SetKey::Home, SITE).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded { nodes: 2 });
    }

    #[tokio::test]
    async fn test_save_pushes_triples_and_reloads() {
        let menus = Arc::new(FakeMenus::with_rows(SetKey::Home, home_rows()));
        let mut pages = MockPagesGateway::new();
        pages
            .expect_sync_pages_from_menu()
            .withf(|site_id, items| {
                let paths: Vec<&str> = items.iter().map(|t| t.path.as_str()).collect();
                site_id.to_string() == SITE && paths == vec!["/", "/shop", "/sale"]
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let store = store_with(menus.clone(), pages, Arc::new(MemoryDraftStorage::new()));
        store.load_from_server(SetKey::Home, SITE).await.unwrap();
        store
            .update_node(SetKey::Home, "3", NodePatch { title: Some("Deals".into()), ..Default::default() })
            .unwrap();

        let fetches_before = menus.fetches();
        let report = store.save_to_server(SetKey::Home, SITE).await.unwrap();
        assert_eq!(report, SaveReport { rows_saved: 4, triples_pushed: 3, reloaded: true });
        assert!(menus.fetches() > fetches_before);
        assert_eq!(store.tree(SetKey::Home)[0].children[1].title, "Deals");

        let saved = menus.rows.lock().get(&SetKey::Home).cloned().unwrap();
        let shop = saved.iter().find(|r| r.id == "2").unwrap();
        assert_eq!(shop.path.as_deref(), Some("/shop"));
        assert!(saved.iter().all(|r| r.visible));
        assert_eq!(store.status(SetKey::Home), StoreStatus::default());
    }

    #[tokio::test]
    async fn test_rejected_page_sync_reports_partial_failure() {
        let menus = Arc::new(FakeMenus::with_rows(SetKey::Home, home_rows()));
        let mut pages = MockPagesGateway::new();
        pages
            .expect_sync_pages_from_menu()
            .times(2)
            .returning(|_, _| Err(MenuError::Network("503 Service Unavailable".to_string())));
        let store = store_with(menus.clone(), pages, Arc::new(MemoryDraftStorage::new()));
        store.load_from_server(SetKey::Home, SITE).await.unwrap();

        let fetches_before = menus.fetches();
        let err = store.save_to_server(SetKey::Home, SITE).await.unwrap_err();
        match &err {
            MenuError::PagesSync { saved_rows, .. } => assert_eq!(*saved_rows, 4),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.notice().title, "Menu saved, pages not synchronized");
        assert_eq!(menus.saves.load(Ordering::SeqCst), 1);
        assert_eq!(menus.fetches(), fetches_before);

        let retry = store.retry_page_sync(SetKey::Home, SITE).await;
        assert!(matches!(retry, Err(MenuError::Network(_))));
        assert!(!store.status(SetKey::Home).saving);
    }

    fn ids(tree: &[EditorNode]) -> Vec<&str> {
        tree.iter().map(|n| n.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_edit_during_save_survives_reload() {
        let save_gate = Arc::new(Semaphore::new(0));
        let menus = Arc::new(FakeMenus {
            save_gate: Some(save_gate.clone()),
            ..FakeMenus::default()
        });
        let mut pages = MockPagesGateway::new();
        pages.expect_sync_pages_from_menu().returning(|_, _| Ok(()));
        let store = Arc::new(store_with(menus.clone(), pages, Arc::new(MemoryDraftStorage::new())));
        store
            .replace_tree(SetKey::Home, vec![EditorNode::new("A").with_id("a")])
            .unwrap();

        let save = tokio::spawn({
            let store = store.clone();
            async move { store.save_to_server(SetKey::Home, SITE).await }
        });
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(store.status(SetKey::Home).saving);
        store
            .add_node(SetKey::Home, None, EditorNode::new("B").with_id("b"), None)
            .unwrap();
        save_gate.add_permits(2);

        let report = save.await.unwrap().unwrap();
        assert_eq!(report.rows_saved, 1);
        assert!(!report.reloaded);
        assert_eq!(ids(&store.tree(SetKey::Home)), vec!["a", "b"]);
        assert_eq!(menus.rows.lock().get(&SetKey::Home).map(Vec::len), Some(1));

        let report = store.save_to_server(SetKey::Home, SITE).await.unwrap();
        assert_eq!(report.rows_saved, 2);
        assert!(report.reloaded);
        assert_eq!(ids(&store.tree(SetKey::Home)), vec!["a", "b"]);
        assert_eq!(store.status(SetKey::Home), StoreStatus::default());
    }

    #[tokio::test]
    async fn test_save_without_internal_paths_skips_push() {
        let menus = Arc::new(FakeMenus::default());
        let mut pages = MockPagesGateway::new();
        pages.expect_sync_pages_from_menu().never();
        let store = store_with(menus.clone(), pages, Arc::new(MemoryDraftStorage::new()));
        store
            .add_node(
                SetKey::V1,
                None,
                EditorNode::new("Partner").with_id("x").with_link(LinkTarget::External {
                    url: "https://partner.example.com".to_string(),
                }),
                None,
            )
            .unwrap();

        let report = store.save_to_server(SetKey::V1, SITE).await.unwrap();
        assert_eq!(report, SaveReport { rows_saved: 1, triples_pushed: 0, reloaded: true });
        assert_eq!(store.tree(SetKey::V1)[0].link.kind(), "external");
    }

    #[tokio::test]
    async fn test_save_for_inactive_site_rejected() {
        let store = store_with(
            Arc::new(FakeMenus::default()),
            MockPagesGateway::new(),
            Arc::new(MemoryDraftStorage::new()),
        );
        let err = store.save_to_server(SetKey::Home, "other-site").await.unwrap_err();
        assert!(matches!(err, MenuError::Validation(_)));
    }

    #[tokio::test]
    async fn test_import_is_all_or_nothing() {
        let store = store_with(
            Arc::new(FakeMenus::default()),
            MockPagesGateway::new(),
            Arc::new(MemoryDraftStorage::new()),
        );
        store
            .replace_tree(SetKey::Home, vec![EditorNode::new("Keep").with_id("k")])
            .unwrap();

        let duplicate = r#"[{"id":"a","title":"A","linkType":"internal"},{"id":"a","title":"B","linkType":"internal"}]"#;
        assert!(store.import_json(SetKey::Home, duplicate).is_err());
        assert_eq!(store.tree(SetKey::Home)[0].id, "k");

        let exported = store.export_json(SetKey::Home).unwrap();
        assert_eq!(store.import_json(SetKey::V1, &exported).unwrap(), 1);
        assert_eq!(store.tree(SetKey::V1), store.tree(SetKey::Home));
    }

    #[tokio::test]
    async fn test_edits_are_mirrored_to_draft() {
        let drafts = Arc::new(MemoryDraftStorage::new());
        let store = store_with(Arc::new(FakeMenus::default()), MockPagesGateway::new(), drafts.clone());
        store
            .add_node(SetKey::Home, None, EditorNode::new("Promo").with_id("p"), None)
            .unwrap();
        store.flush_draft().await;

        let slot = DraftScope::PerSite.default_slot_key(SITE);
        let json = drafts.get(&slot).unwrap();
        assert!(json.contains("Promo"));

        let restored = store_with(Arc::new(FakeMenus::default()), MockPagesGateway::new(), drafts);
        assert_eq!(restored.restore_draft().await.unwrap(), 1);
        assert_eq!(restored.tree(SetKey::Home)[0].title, "Promo");
    }

    #[tokio::test]
    async fn test_draft_write_is_debounced() {
        let drafts = Arc::new(MemoryDraftStorage::new());
        let store = store_with(Arc::new(FakeMenus::default()), MockPagesGateway::new(), drafts.clone());
        for i in 0..5 {
            store
                .add_node(SetKey::Home, None, EditorNode::new(format!("Item {}", i)), None)
                .unwrap();
        }
        let slot = DraftScope::PerSite.default_slot_key(SITE);
        assert!(drafts.get(&slot).is_none());

        tokio::time::sleep(Duration::from_millis(200)).await;
        let json = drafts.get(&slot).unwrap();
        assert!(json.contains("Item 4"));
    }

    #[tokio::test]
    async fn test_rejected_edit_leaves_tree_untouched() {
        let store = store_with(
            Arc::new(FakeMenus::default()),
            MockPagesGateway::new(),
            Arc::new(MemoryDraftStorage::new()),
        );
        store
            .replace_tree(
                SetKey::Home,
                vec![EditorNode::new("A").with_id("a").with_children(vec![EditorNode::new("B").with_id("b")])],
            )
            .unwrap();
        let before = store.tree(SetKey::Home);

        assert!(store.move_node(SetKey::Home, "a", Some("b"), None).is_err());
        assert!(store.add_node(SetKey::Home, Some("a"), EditorNode::new("  "), None).is_err());
        assert!(Arc::ptr_eq(&before, &store.tree(SetKey::Home)));

        store.remove_node(SetKey::Home, "b").unwrap();
        assert!(before[0].children.len() == 1);
        assert!(store.tree(SetKey::Home)[0].children.is_empty());
    }

    #[tokio::test]
    async fn test_effective_links_for_scheduled_nodes() {
        let store = store_with(
            Arc::new(FakeMenus::default()),
            MockPagesGateway::new(),
            Arc::new(MemoryDraftStorage::new()),
        );
        let now = Utc::now();
        let schedules = vec![
            Schedule::new(now - chrono::Duration::hours(1), "A"),
            Schedule::new(now + chrono::Duration::hours(1), "B"),
            Schedule::new(now - chrono::Duration::hours(2), "C"),
        ];
        store
            .replace_tree(
                SetKey::Home,
                vec![
                    EditorNode::new("Plain").with_id("plain"),
                    EditorNode::new("Campaign")
                        .with_id("camp")
                        .with_link(LinkTarget::Scheduled { schedules }),
                ],
            )
            .unwrap();

        let links = store.effective_links(SetKey::Home, now);
        assert_eq!(
            links,
            vec![ScheduledLink { id: "camp".into(), title: "Campaign".into(), url: Some("A".into()) }]
        );
    }

    #[tokio::test]
    async fn test_loading_other_site_switches_active_site() {
        let drafts = Arc::new(MemoryDraftStorage::new());
        drafts
            .write(
                &DraftScope::PerSite.default_slot_key("site2"),
                r#"{"v1":[{"id":"d","title":"Drafted","linkType":"internal"}]}"#,
            )
            .await
            .unwrap();
        let menus = Arc::new(FakeMenus::with_rows(SetKey::Home, home_rows()));
        let store = store_with(menus, MockPagesGateway::new(), drafts);
        store
            .replace_tree(SetKey::V1, vec![EditorNode::new("Old").with_id("old")])
            .unwrap();

        store.load_from_server(SetKey::Home, "site2").await.unwrap();
        assert_eq!(store.active_site(), "site2");
        assert_eq!(store.tree(SetKey::V1)[0].title, "Drafted");
        assert_eq!(store.tree(SetKey::Home).len(), 2);
    }
}
