//! In-memory reference page.
//!
//! A plain element tree behind `parking_lot` locks, publishing mutation
//! batches over a `tokio` broadcast channel. Grouped changes (one
//! [`MemoryDom::with_batch`] call) arrive as a single batch, matching how a
//! browser observer coalesces records.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::trace;

use crate::errors::DomError;
use crate::ids::NodeId;
use crate::mutation::{MutationBatch, MutationRecord};
use crate::ports::{MediaProps, PageDom};
use crate::selector::{ComplexSelector, Selector};

const FEED_CAPACITY: usize = 256;

/// Mutable playback state attached to `video` elements.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaState {
    pub paused: bool,
    pub volume: f64,
    pub muted: bool,
    pub current_time: f64,
    pub duration: f64,
    pub video_height: u32,
    pub filter: Option<String>,
}

impl Default for MediaState {
    fn default() -> Self {
        Self {
            paused: true,
            volume: 1.0,
            muted: false,
            current_time: 0.0,
            duration: 0.0,
            video_height: 0,
            filter: None,
        }
    }
}

#[derive(Clone, Debug)]
struct ElementNode {
    tag: String,
    attrs: BTreeMap<String, String>,
    text: String,
    parent: Option<u64>,
    children: Vec<u64>,
    media: Option<MediaState>,
}

struct Tree {
    nodes: HashMap<u64, ElementNode>,
    root: u64,
    body: u64,
    next: u64,
}

impl Tree {
    fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            1,
            ElementNode {
                tag: "html".into(),
                attrs: BTreeMap::new(),
                text: String::new(),
                parent: None,
                children: vec![2],
                media: None,
            },
        );
        nodes.insert(
            2,
            ElementNode {
                tag: "body".into(),
                attrs: BTreeMap::new(),
                text: String::new(),
                parent: Some(1),
                children: Vec::new(),
                media: None,
            },
        );
        Self {
            nodes,
            root: 1,
            body: 2,
            next: 3,
        }
    }

    fn is_attached(&self, id: u64) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes.get(&current).and_then(|node| node.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn matches(&self, id: u64, branch: &ComplexSelector) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        let mut idx = branch.compounds.len() - 1;
        if !branch.compounds[idx].matches(&node.tag, &node.attrs) {
            return false;
        }
        let mut current = node.parent;
        while idx > 0 {
            let target = &branch.compounds[idx - 1];
            loop {
                let Some(candidate) = current else {
                    return false;
                };
                let Some(ancestor) = self.nodes.get(&candidate) else {
                    return false;
                };
                current = ancestor.parent;
                if target.matches(&ancestor.tag, &ancestor.attrs) {
                    idx -= 1;
                    break;
                }
            }
        }
        true
    }

    fn matches_any(&self, id: u64, selector: &Selector) -> bool {
        selector.branches.iter().any(|branch| self.matches(id, branch))
    }

    /// Document-order walk over the attached tree.
    fn collect_matches(&self, selector: &Selector) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if self.matches_any(id, selector) {
                found.push(NodeId(id));
            }
            if let Some(node) = self.nodes.get(&id) {
                for child in node.children.iter().rev() {
                    stack.push(*child);
                }
            }
        }
        found
    }

    fn hidden_by_style(&self, id: u64) -> bool {
        let mut current = Some(id);
        while let Some(candidate) = current {
            let Some(node) = self.nodes.get(&candidate) else {
                return true;
            };
            if let Some(style) = node.attrs.get("style") {
                let flattened: String = style
                    .chars()
                    .filter(|ch| !ch.is_whitespace())
                    .collect::<String>()
                    .to_ascii_lowercase();
                if flattened.contains("display:none") || flattened.contains("visibility:hidden") {
                    return true;
                }
            }
            current = node.parent;
        }
        false
    }
}

/// In-memory [`PageDom`] implementation.
pub struct MemoryDom {
    tree: RwLock<Tree>,
    feed: broadcast::Sender<MutationBatch>,
    batch: Mutex<Option<MutationBatch>>,
    fullscreen: Mutex<Option<NodeId>>,
    deny_fullscreen: AtomicBool,
    navigations: Mutex<Vec<String>>,
    clicks: Mutex<Vec<NodeId>>,
}

impl MemoryDom {
    pub fn new() -> Arc<Self> {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Arc::new(Self {
            tree: RwLock::new(Tree::new()),
            feed,
            batch: Mutex::new(None),
            fullscreen: Mutex::new(None),
            deny_fullscreen: AtomicBool::new(false),
            navigations: Mutex::new(Vec::new()),
            clicks: Mutex::new(Vec::new()),
        })
    }

    pub fn body(&self) -> NodeId {
        NodeId(self.tree.read().body)
    }

    /// Group every mutation made inside `f` into a single feed batch.
    pub fn with_batch<R>(&self, f: impl FnOnce() -> R) -> R {
        {
            let mut pending = self.batch.lock();
            if pending.is_none() {
                *pending = Some(Vec::new());
            }
        }
        let result = f();
        let drained = self.batch.lock().take();
        if let Some(records) = drained {
            if !records.is_empty() {
                let _ = self.feed.send(records);
            }
        }
        result
    }

    fn emit(&self, record: MutationRecord) {
        let mut pending = self.batch.lock();
        match pending.as_mut() {
            Some(buffer) => buffer.push(record),
            None => {
                drop(pending);
                let _ = self.feed.send(vec![record]);
            }
        }
    }

    fn insert_element(
        &self,
        parent: Option<NodeId>,
        tag: &str,
        media: Option<MediaState>,
    ) -> Result<NodeId, DomError> {
        let mut tree = self.tree.write();
        let parent_id = match parent {
            Some(NodeId(id)) => {
                if !tree.nodes.contains_key(&id) {
                    return Err(DomError::UnknownNode(NodeId(id)));
                }
                id
            }
            None => tree.body,
        };
        let id = tree.next;
        tree.next += 1;
        tree.nodes.insert(
            id,
            ElementNode {
                tag: tag.to_ascii_lowercase(),
                attrs: BTreeMap::new(),
                text: String::new(),
                parent: Some(parent_id),
                children: Vec::new(),
                media,
            },
        );
        if let Some(parent_node) = tree.nodes.get_mut(&parent_id) {
            parent_node.children.push(id);
        }
        drop(tree);
        self.emit(MutationRecord::child_added(NodeId(id)));
        Ok(NodeId(id))
    }

    /// Builder used by tests and the demo page.
    pub fn append_child_element(&self, parent: NodeId, tag: &str) -> NodeId {
        self.insert_element(Some(parent), tag, None)
            .expect("parent node exists")
    }

    /// Append a `video` element carrying the given playback state.
    pub fn append_media_element(&self, parent: NodeId, state: MediaState) -> NodeId {
        self.insert_element(Some(parent), "video", Some(state))
            .expect("parent node exists")
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        {
            let mut tree = self.tree.write();
            if let Some(element) = tree.nodes.get_mut(&node.0) {
                element.attrs.insert(name.to_string(), value.to_string());
            }
        }
        self.emit(MutationRecord::attribute_changed(node, name));
    }

    /// Set the element's direct text. Text changes are not on the mutation
    /// feed; the engine only reacts to structural and attribute changes.
    pub fn set_text(&self, node: NodeId, text: &str) {
        let mut tree = self.tree.write();
        if let Some(element) = tree.nodes.get_mut(&node.0) {
            element.text = text.to_string();
        }
    }

    pub fn update_media(&self, node: NodeId, f: impl FnOnce(&mut MediaState)) {
        let mut tree = self.tree.write();
        if let Some(state) = tree.nodes.get_mut(&node.0).and_then(|n| n.media.as_mut()) {
            f(state);
        }
    }

    pub fn set_fullscreen_denied(&self, denied: bool) {
        self.deny_fullscreen.store(denied, Ordering::SeqCst);
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().clone()
    }

    pub fn clicks(&self) -> Vec<NodeId> {
        self.clicks.lock().clone()
    }

    /// Live mutation-feed subscriptions. Lifecycle tests assert this stays
    /// at one across disable/enable cycles.
    pub fn mutation_subscriber_count(&self) -> usize {
        self.feed.receiver_count()
    }

    fn media_op(
        &self,
        node: NodeId,
        f: impl FnOnce(&mut MediaState),
    ) -> Result<(), DomError> {
        let mut tree = self.tree.write();
        let element = tree
            .nodes
            .get_mut(&node.0)
            .ok_or(DomError::UnknownNode(node))?;
        let state = element.media.as_mut().ok_or(DomError::NotMedia(node))?;
        f(state);
        Ok(())
    }

    fn parse(selector: &str) -> Result<Selector, DomError> {
        Selector::parse(selector)
            .map_err(|reason| DomError::Selector(selector.to_string(), reason))
    }
}

#[async_trait]
impl PageDom for MemoryDom {
    async fn query_all(&self, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let parsed = Self::parse(selector)?;
        Ok(self.tree.read().collect_matches(&parsed))
    }

    async fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>, DomError> {
        let parsed = Self::parse(selector)?;
        let tree = self.tree.read();
        let mut current = Some(node.0);
        while let Some(id) = current {
            if tree.matches_any(id, &parsed) {
                return Ok(Some(NodeId(id)));
            }
            current = tree.nodes.get(&id).and_then(|element| element.parent);
        }
        Ok(None)
    }

    async fn is_attached(&self, node: NodeId) -> bool {
        let tree = self.tree.read();
        tree.nodes.contains_key(&node.0) && tree.is_attached(node.0)
    }

    async fn own_text(&self, node: NodeId) -> Option<String> {
        self.tree
            .read()
            .nodes
            .get(&node.0)
            .map(|element| element.text.clone())
    }

    async fn class_names(&self, node: NodeId) -> Vec<String> {
        self.tree
            .read()
            .nodes
            .get(&node.0)
            .and_then(|element| element.attrs.get("class"))
            .map(|value| value.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    async fn has_rendered_box(&self, node: NodeId) -> bool {
        let tree = self.tree.read();
        tree.nodes.contains_key(&node.0)
            && tree.is_attached(node.0)
            && !tree.hidden_by_style(node.0)
    }

    async fn remove(&self, node: NodeId) -> Result<(), DomError> {
        {
            let mut tree = self.tree.write();
            if node.0 == tree.root || node.0 == tree.body {
                return Err(DomError::Detached(node));
            }
            if !tree.nodes.contains_key(&node.0) {
                return Err(DomError::UnknownNode(node));
            }
            if !tree.is_attached(node.0) {
                return Err(DomError::Detached(node));
            }
            let parent = tree.nodes.get(&node.0).and_then(|element| element.parent);
            if let Some(parent_id) = parent {
                if let Some(parent_node) = tree.nodes.get_mut(&parent_id) {
                    parent_node.children.retain(|child| *child != node.0);
                }
            }
            if let Some(element) = tree.nodes.get_mut(&node.0) {
                element.parent = None;
            }
        }
        trace!(%node, "removed element");
        self.emit(MutationRecord::child_removed(node));
        Ok(())
    }

    async fn append_element(
        &self,
        parent: Option<NodeId>,
        tag: &str,
        attrs: &[(String, String)],
    ) -> Result<NodeId, DomError> {
        let node = self.insert_element(parent, tag, None)?;
        if !attrs.is_empty() {
            let mut tree = self.tree.write();
            if let Some(element) = tree.nodes.get_mut(&node.0) {
                for (name, value) in attrs {
                    element.attrs.insert(name.clone(), value.clone());
                }
            }
        }
        Ok(node)
    }

    async fn click(&self, node: NodeId) -> Result<(), DomError> {
        let tree = self.tree.read();
        if !tree.nodes.contains_key(&node.0) {
            return Err(DomError::UnknownNode(node));
        }
        if !tree.is_attached(node.0) {
            return Err(DomError::Detached(node));
        }
        drop(tree);
        self.clicks.lock().push(node);
        Ok(())
    }

    async fn navigate(&self, url: &str) {
        self.navigations.lock().push(url.to_string());
    }

    async fn fullscreen_element(&self) -> Option<NodeId> {
        *self.fullscreen.lock()
    }

    async fn request_fullscreen(&self) -> Result<(), DomError> {
        if self.deny_fullscreen.load(Ordering::SeqCst) {
            return Err(DomError::FullscreenRejected);
        }
        let root = NodeId(self.tree.read().root);
        *self.fullscreen.lock() = Some(root);
        Ok(())
    }

    async fn exit_fullscreen(&self) -> Result<(), DomError> {
        *self.fullscreen.lock() = None;
        Ok(())
    }

    async fn media_props(&self, node: NodeId) -> Option<MediaProps> {
        self.tree
            .read()
            .nodes
            .get(&node.0)
            .and_then(|element| element.media.as_ref())
            .map(|state| MediaProps {
                paused: state.paused,
                volume: state.volume,
                muted: state.muted,
                current_time: state.current_time,
                duration: state.duration,
                video_height: state.video_height,
                filter: state.filter.clone(),
            })
    }

    async fn media_play(&self, node: NodeId) -> Result<(), DomError> {
        self.media_op(node, |state| state.paused = false)
    }

    async fn media_pause(&self, node: NodeId) -> Result<(), DomError> {
        self.media_op(node, |state| state.paused = true)
    }

    async fn media_set_volume(&self, node: NodeId, volume: f64) -> Result<(), DomError> {
        self.media_op(node, |state| state.volume = volume.clamp(0.0, 1.0))
    }

    async fn media_set_muted(&self, node: NodeId, muted: bool) -> Result<(), DomError> {
        self.media_op(node, |state| state.muted = muted)
    }

    async fn media_seek_by(&self, node: NodeId, seconds: f64) -> Result<(), DomError> {
        self.media_op(node, |state| {
            let mut next = (state.current_time + seconds).max(0.0);
            if state.duration > 0.0 {
                next = next.min(state.duration);
            }
            state.current_time = next;
        })
    }

    async fn media_set_filter(&self, node: NodeId, filter: &str) -> Result<(), DomError> {
        self.media_op(node, |state| state.filter = Some(filter.to_string()))
    }

    fn subscribe_mutations(&self) -> broadcast::Receiver<MutationBatch> {
        self.feed.subscribe()
    }
}
