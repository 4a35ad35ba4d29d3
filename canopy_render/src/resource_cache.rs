// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reference-counted cache of shared, expensive-to-build resources.
//!
//! Entries are keyed by resource identity and counted by owner (a scene node).
//! An entry lives exactly as long as its owner set is non-empty; there is no
//! LRU pressure.
//!
//! Fetches are asynchronous and deduplicated: every caller asking for a key
//! before it resolves awaits the same [`Shared`] future, so the loader runs at
//! most once per live entry. A fetch never draws or dirties anything directly.
//! On success it records the entry's owners in a ready list, which the frame
//! scheduler drains at the start of the next frame.
//!
//! ## Failure and cancellation
//!
//! - A failed fetch removes the pending entry and delivers the error to every
//!   waiting caller. The next request fetches again.
//! - An entry whose last owner releases it while pending is removed at once.
//!   The late value is handed to [`ResourceLoader::dispose`] and discarded.

use std::cell::{Ref, RefCell};
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Debug};
use std::future::Future;
use std::hash::Hash;
use std::rc::{Rc, Weak};
use std::task::Context;

use futures::future::{self, FutureExt, LocalBoxFuture, Shared};
use futures::task::{LocalSpawn, LocalSpawnExt, noop_waker_ref};

use crate::error::ResourceError;

/// Shared, interior-mutable handle to a cached value.
///
/// Every holder of a handle for a key sees [`ResourceCache::update`] on that key.
pub struct ResourceHandle<V>(Rc<RefCell<V>>);

impl<V> ResourceHandle<V> {
    /// Wrap a value.
    pub fn new(value: V) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    /// Borrow the current value.
    pub fn borrow(&self) -> Ref<'_, V> {
        self.0.borrow()
    }

    /// Replace the value, returning the old one.
    pub fn replace(&self, value: V) -> V {
        self.0.replace(value)
    }

    fn modify(&self, f: impl FnOnce(&mut V)) {
        f(&mut self.0.borrow_mut());
    }

    /// True if both handles point at the same cached object.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<V> Clone for ResourceHandle<V> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<V: Debug> Debug for ResourceHandle<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(v) => f.debug_tuple("ResourceHandle").field(&*v).finish(),
            Err(_) => f.write_str("ResourceHandle(<borrowed>)"),
        }
    }
}

/// Produces and frees resource values. Injected at construction.
pub trait ResourceLoader<K, V> {
    /// Start fetching and decoding `key`.
    fn load(&self, key: &K) -> LocalBoxFuture<'static, Result<V, ResourceError>>;

    /// Release native resources held by an evicted or discarded value.
    fn dispose(&self, _key: &K, _value: &V) {}
}

type FetchResult<V> = Result<ResourceHandle<V>, ResourceError>;
type Fetch<V> = Shared<LocalBoxFuture<'static, FetchResult<V>>>;

enum Slot<V> {
    Pending {
        fetch: Fetch<V>,
        generation: u64,
        /// A background task already polls `fetch`.
        driven: bool,
    },
    Ready(ResourceHandle<V>),
}

struct CacheEntry<V, O> {
    slot: Slot<V>,
    owners: HashSet<O>,
}

struct Inner<K, V, O> {
    entries: HashMap<K, CacheEntry<V, O>>,
    by_owner: HashMap<O, HashSet<K>>,
    ready: Vec<O>,
    detached: Vec<LocalBoxFuture<'static, ()>>,
    next_generation: u64,
    fetches: u64,
}

impl<K, V, O> Default for Inner<K, V, O> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            by_owner: HashMap::new(),
            ready: Vec::new(),
            detached: Vec::new(),
            next_generation: 0,
            fetches: 0,
        }
    }
}

impl<K: Eq + Hash + Clone, V, O: Eq + Hash + Copy> Inner<K, V, O> {
    fn attach(&mut self, key: &K, owner: O) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.owners.insert(owner);
            self.by_owner.entry(owner).or_default().insert(key.clone());
        }
    }

    /// Drop `owner` from `key`. Returns the entry if that emptied its owner set.
    fn detach(&mut self, key: &K, owner: O) -> Option<CacheEntry<V, O>> {
        let entry = self.entries.get_mut(key)?;
        entry.owners.remove(&owner);
        if entry.owners.is_empty() {
            self.entries.remove(key)
        } else {
            None
        }
    }

    fn forget_key_for(&mut self, key: &K, owner: O) {
        if let Some(keys) = self.by_owner.get_mut(&owner) {
            keys.remove(key);
            if keys.is_empty() {
                self.by_owner.remove(&owner);
            }
        }
    }

    /// Mark `key`'s pending fetch as driven. Returns `false` if it already was.
    fn claim_driver(&mut self, key: &K) -> bool {
        match self.entries.get_mut(key) {
            Some(CacheEntry {
                slot: Slot::Pending { driven, .. },
                ..
            }) => !core::mem::replace(driven, true),
            _ => false,
        }
    }

    fn is_current(&self, key: &K, generation: u64) -> bool {
        matches!(
            self.entries.get(key),
            Some(CacheEntry { slot: Slot::Pending { generation: g, .. }, .. }) if *g == generation
        )
    }
}

/// Reference-counted resource cache. Cloning yields another handle to the same cache.
pub struct ResourceCache<K, V, O> {
    inner: Rc<RefCell<Inner<K, V, O>>>,
    loader: Rc<dyn ResourceLoader<K, V>>,
    spawner: Option<Rc<dyn LocalSpawn>>,
}

impl<K, V, O> Clone for ResourceCache<K, V, O> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            loader: Rc::clone(&self.loader),
            spawner: self.spawner.clone(),
        }
    }
}

impl<K, V, O> Debug for ResourceCache<K, V, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ResourceCache");
        if let Ok(inner) = self.inner.try_borrow() {
            s.field("entries", &inner.entries.len())
                .field("owners", &inner.by_owner.len())
                .field("ready", &inner.ready.len())
                .field("fetches", &inner.fetches);
        }
        s.field("spawner", &self.spawner.is_some())
            .finish_non_exhaustive()
    }
}

impl<K, V, O> ResourceCache<K, V, O>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: 'static,
    O: Eq + Hash + Copy + Debug + 'static,
{
    /// Create an empty cache using `loader` to fetch and free values.
    pub fn new(loader: impl ResourceLoader<K, V> + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner::default())),
            loader: Rc::new(loader),
            spawner: None,
        }
    }

    /// Run fetches started by [`request`](Self::request) on `spawner`.
    ///
    /// Without a spawner such fetches are kept by the cache and polled by [`drive`](Self::drive).
    #[must_use]
    pub fn with_spawner(mut self, spawner: impl LocalSpawn + 'static) -> Self {
        self.spawner = Some(Rc::new(spawner));
        self
    }

    /// The resolved value for `key`, attaching `owner`. `None` if absent or still pending.
    pub fn get(&self, key: &K, owner: O) -> Option<ResourceHandle<V>> {
        let mut inner = self.inner.borrow_mut();
        let handle = match &inner.entries.get(key)?.slot {
            Slot::Ready(h) => h.clone(),
            Slot::Pending { .. } => return None,
        };
        inner.attach(key, owner);
        Some(handle)
    }

    /// Resolve `key`, attaching `owner` and starting a fetch if no entry exists.
    ///
    /// Concurrent calls for the same key share one fetch.
    pub fn get_or_create(
        &self,
        key: &K,
        owner: O,
    ) -> LocalBoxFuture<'static, Result<ResourceHandle<V>, ResourceError>> {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        if let Some(entry) = inner.entries.get(key) {
            let fut = match &entry.slot {
                Slot::Ready(h) => future::ready(Ok(h.clone())).boxed_local(),
                Slot::Pending { fetch, .. } => fetch.clone().boxed_local(),
            };
            inner.attach(key, owner);
            return fut;
        }

        let generation = inner.next_generation;
        inner.next_generation += 1;
        inner.fetches += 1;
        log::debug!("fetching {key:?}");

        let load = self.loader.load(key);
        let weak = Rc::downgrade(&self.inner);
        let loader = Rc::clone(&self.loader);
        let k = key.clone();
        let fetch = async move {
            let result = load.await;
            resolve(&weak, &*loader, k, generation, result)
        }
        .boxed_local()
        .shared();

        inner.entries.insert(
            key.clone(),
            CacheEntry {
                slot: Slot::Pending {
                    fetch: fetch.clone(),
                    generation,
                    driven: false,
                },
                owners: HashSet::new(),
            },
        );
        inner.attach(key, owner);
        fetch.boxed_local()
    }

    /// Non-blocking request for callers that cannot await, such as the draw routine.
    ///
    /// Returns the value if it is (or synchronously becomes) ready. Otherwise the
    /// fetch continues in the background and `owner` is reported by
    /// [`take_ready_owners`](Self::take_ready_owners) once it resolves.
    pub fn request(&self, key: &K, owner: O) -> Result<Option<ResourceHandle<V>>, ResourceError> {
        if let Some(handle) = self.get(key, owner) {
            return Ok(Some(handle));
        }
        let mut fut = self.get_or_create(key, owner);
        match (&mut fut).now_or_never() {
            Some(Ok(handle)) => {
                // The caller already has the value; no redraw needed for it.
                self.inner.borrow_mut().ready.retain(|o| *o != owner);
                Ok(Some(handle))
            }
            Some(Err(err)) => Err(err),
            None => {
                if !self.inner.borrow_mut().claim_driver(key) {
                    return Ok(None);
                }
                let task = fut.map(drop);
                match &self.spawner {
                    Some(spawner) => {
                        if let Err(err) = spawner.spawn_local(task) {
                            // Let the next request try again.
                            if let Some(CacheEntry {
                                slot: Slot::Pending { driven, .. },
                                ..
                            }) = self.inner.borrow_mut().entries.get_mut(key)
                            {
                                *driven = false;
                            }
                            return Err(ResourceError::Spawn {
                                key: format!("{key:?}"),
                                reason: err.to_string(),
                            });
                        }
                    }
                    None => self.inner.borrow_mut().detached.push(task.boxed_local()),
                }
                Ok(None)
            }
        }
    }

    /// Poll fetches that [`request`](Self::request) could not hand to a spawner.
    ///
    /// Returns how many are still pending. The frame scheduler calls this at
    /// the start of every frame.
    pub fn drive(&self) -> usize {
        let mut tasks = core::mem::take(&mut self.inner.borrow_mut().detached);
        if tasks.is_empty() {
            return 0;
        }
        let mut cx = Context::from_waker(noop_waker_ref());
        tasks.retain_mut(|task| task.as_mut().poll(&mut cx).is_pending());
        let mut inner = self.inner.borrow_mut();
        // Keep tasks queued while we were polling.
        tasks.append(&mut inner.detached);
        inner.detached = tasks;
        inner.detached.len()
    }

    /// Replace the value of a resolved entry in place. Every holder observes it.
    ///
    /// Returns `false` (and drops `value`) if `key` is absent or still pending.
    pub fn update(&self, key: &K, value: V) -> bool {
        let Some(handle) = self.ready_handle_notifying(key) else {
            return false;
        };
        let old = handle.replace(value);
        self.loader.dispose(key, &old);
        true
    }

    /// Mutate the value of a resolved entry in place, e.g. to attach a derived variant.
    pub fn modify(&self, key: &K, f: impl FnOnce(&mut V)) -> bool {
        let Some(handle) = self.ready_handle_notifying(key) else {
            return false;
        };
        handle.modify(f);
        true
    }

    fn ready_handle_notifying(&self, key: &K) -> Option<ResourceHandle<V>> {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        let entry = inner.entries.get(key)?;
        let Slot::Ready(handle) = &entry.slot else {
            return None;
        };
        inner.ready.extend(entry.owners.iter().copied());
        Some(handle.clone())
    }

    /// Drop `owner`'s reference to `key`, evicting the entry if no owners remain.
    pub fn release(&self, key: &K, owner: O) {
        let evicted = {
            let mut inner = self.inner.borrow_mut();
            inner.forget_key_for(key, owner);
            inner.detach(key, owner)
        };
        if let Some(entry) = evicted {
            self.evicted(key, entry);
        }
    }

    /// Drop every reference held by `owner`. Call once when the owner is destroyed.
    pub fn release_all(&self, owner: O) {
        let mut evicted = Vec::new();
        {
            let mut inner = self.inner.borrow_mut();
            inner.ready.retain(|o| *o != owner);
            let keys = inner.by_owner.remove(&owner).unwrap_or_default();
            for key in keys {
                if let Some(entry) = inner.detach(&key, owner) {
                    evicted.push((key, entry));
                }
            }
        }
        for (key, entry) in evicted {
            self.evicted(&key, entry);
        }
    }

    fn evicted(&self, key: &K, entry: CacheEntry<V, O>) {
        match entry.slot {
            Slot::Ready(handle) => {
                log::debug!("evicting {key:?}");
                self.loader.dispose(key, &handle.borrow());
            }
            Slot::Pending { .. } => log::debug!("abandoning pending fetch for {key:?}"),
        }
    }

    /// Owners whose resource resolved or changed since the last call, without duplicates.
    pub fn take_ready_owners(&self) -> Vec<O> {
        let mut ready = core::mem::take(&mut self.inner.borrow_mut().ready);
        let mut seen = HashSet::new();
        ready.retain(|o| seen.insert(*o));
        ready
    }

    /// True if an entry (pending or resolved) exists for `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.borrow().entries.contains_key(key)
    }

    /// True if `key` has a resolved value.
    pub fn is_ready(&self, key: &K) -> bool {
        matches!(
            self.inner.borrow().entries.get(key),
            Some(CacheEntry {
                slot: Slot::Ready(_),
                ..
            })
        )
    }

    /// Current owners of `key`.
    pub fn owners_of(&self, key: &K) -> Vec<O> {
        self.inner
            .borrow()
            .entries
            .get(key)
            .map(|e| e.owners.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of entries, pending or resolved.
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// True if the cache holds nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of loader fetches started over the cache's lifetime.
    pub fn fetch_count(&self) -> u64 {
        self.inner.borrow().fetches
    }
}

/// Completion of a fetch. Runs inside whichever task polls the shared future.
fn resolve<K, V, O>(
    weak: &Weak<RefCell<Inner<K, V, O>>>,
    loader: &dyn ResourceLoader<K, V>,
    key: K,
    generation: u64,
    result: Result<V, ResourceError>,
) -> FetchResult<V>
where
    K: Eq + Hash + Clone + Debug,
    O: Eq + Hash + Copy,
{
    let Some(cache) = weak.upgrade() else {
        if let Ok(value) = &result {
            loader.dispose(&key, value);
        }
        return Err(ResourceError::Abandoned(format!("{key:?}")));
    };
    let mut guard = cache.borrow_mut();
    let inner = &mut *guard;
    let current = inner.is_current(&key, generation);
    match result {
        Ok(value) if current => {
            let handle = ResourceHandle::new(value);
            if let Some(entry) = inner.entries.get_mut(&key) {
                entry.slot = Slot::Ready(handle.clone());
                inner.ready.extend(entry.owners.iter().copied());
            }
            log::debug!("resolved {key:?}");
            Ok(handle)
        }
        Ok(value) => {
            drop(guard);
            log::debug!("discarding late resolution of {key:?}");
            loader.dispose(&key, &value);
            Err(ResourceError::Abandoned(format!("{key:?}")))
        }
        Err(err) => {
            if current {
                if let Some(entry) = inner.entries.remove(&key) {
                    for owner in entry.owners {
                        inner.forget_key_for(&key, owner);
                    }
                }
            }
            log::warn!("fetching {key:?} failed: {err}");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot;
    use futures::executor::{LocalPool, block_on};
    use std::cell::Cell;

    type Gate = oneshot::Sender<Result<String, ResourceError>>;

    /// Loader whose fetches complete when the test opens their gate.
    #[derive(Clone, Default)]
    struct GatedLoader {
        loads: Rc<Cell<usize>>,
        gates: Rc<RefCell<HashMap<&'static str, Gate>>>,
        disposed: Rc<RefCell<Vec<String>>>,
    }

    impl GatedLoader {
        fn open(&self, key: &'static str, result: Result<String, ResourceError>) {
            let gate = self.gates.borrow_mut().remove(key).expect("no fetch in flight");
            gate.send(result).expect("fetch dropped");
        }
    }

    impl ResourceLoader<&'static str, String> for GatedLoader {
        fn load(&self, key: &&'static str) -> LocalBoxFuture<'static, Result<String, ResourceError>> {
            self.loads.set(self.loads.get() + 1);
            let (tx, rx) = oneshot::channel();
            self.gates.borrow_mut().insert(*key, tx);
            let key = *key;
            async move {
                rx.await.unwrap_or_else(|_| {
                    Err(ResourceError::Fetch {
                        key: key.into(),
                        reason: "gate dropped".into(),
                    })
                })
            }
            .boxed_local()
        }

        fn dispose(&self, _key: &&'static str, value: &String) {
            self.disposed.borrow_mut().push(value.clone());
        }
    }

    /// Loader that resolves synchronously.
    #[derive(Clone, Default)]
    struct ImmediateLoader {
        loads: Rc<Cell<usize>>,
    }

    impl ResourceLoader<&'static str, String> for ImmediateLoader {
        fn load(&self, key: &&'static str) -> LocalBoxFuture<'static, Result<String, ResourceError>> {
            self.loads.set(self.loads.get() + 1);
            future::ready(Ok(format!("decoded {key}"))).boxed_local()
        }
    }

    type Cache = ResourceCache<&'static str, String, u32>;

    #[test]
    fn concurrent_requests_share_one_fetch() {
        let loader = GatedLoader::default();
        let cache = Cache::new(loader.clone());
        let a = cache.get_or_create(&"img", 1);
        let b = cache.get_or_create(&"img", 2);
        assert_eq!(loader.loads.get(), 1);
        assert!(cache.get(&"img", 3).is_none(), "pending entries are not returned by get");

        loader.open("img", Ok("pixels".into()));
        let (a, b) = block_on(future::join(a, b));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(a.ptr_eq(&b));
        assert_eq!(*a.borrow(), "pixels");

        let mut ready = cache.take_ready_owners();
        ready.sort_unstable();
        assert_eq!(ready, [1, 2]);
        assert!(cache.take_ready_owners().is_empty());
    }

    #[test]
    fn refcount_eviction_and_refetch() {
        let loader = ImmediateLoader::default();
        let cache = Cache::new(loader.clone());
        let a = block_on(cache.get_or_create(&"img", 1)).unwrap();
        let b = block_on(cache.get_or_create(&"img", 2)).unwrap();
        assert!(a.ptr_eq(&b));

        cache.release(&"img", 1);
        assert!(cache.contains(&"img"));
        let still = cache.get(&"img", 2).unwrap();
        assert!(still.ptr_eq(&a), "remaining owner sees the same object");

        cache.release(&"img", 2);
        assert!(!cache.contains(&"img"));
        assert_eq!(loader.loads.get(), 1);

        let fresh = block_on(cache.get_or_create(&"img", 2)).unwrap();
        assert_eq!(loader.loads.get(), 2, "eviction forces a new fetch");
        assert!(!fresh.ptr_eq(&a));
    }

    #[test]
    fn failure_leaves_no_entry_and_retries() {
        let loader = GatedLoader::default();
        let cache = Cache::new(loader.clone());
        let a = cache.get_or_create(&"bad", 1);
        let b = cache.get_or_create(&"bad", 2);
        loader.open(
            "bad",
            Err(ResourceError::Decode {
                key: "bad".into(),
                reason: "truncated".into(),
            }),
        );
        let (a, b) = block_on(future::join(a, b));
        assert!(matches!(a, Err(ResourceError::Decode { .. })));
        assert_eq!(a.err(), b.err());
        assert!(!cache.contains(&"bad"));
        assert!(cache.owners_of(&"bad").is_empty());
        assert!(cache.take_ready_owners().is_empty());

        let _retry = cache.get_or_create(&"bad", 1);
        assert_eq!(loader.loads.get(), 2);
    }

    #[test]
    fn release_before_resolution_discards_the_value() {
        let loader = GatedLoader::default();
        let cache = Cache::new(loader.clone());
        let pending = cache.get_or_create(&"img", 1);
        cache.release(&"img", 1);
        assert!(!cache.contains(&"img"));

        loader.open("img", Ok("late".into()));
        let result = block_on(pending);
        assert!(matches!(result, Err(ResourceError::Abandoned(_))));
        assert!(!cache.contains(&"img"));
        assert_eq!(*loader.disposed.borrow(), ["late"]);
        assert!(cache.take_ready_owners().is_empty());
    }

    #[test]
    fn update_is_visible_to_every_holder() {
        let loader = ImmediateLoader::default();
        let cache = Cache::new(loader);
        let a = block_on(cache.get_or_create(&"img", 1)).unwrap();
        let b = block_on(cache.get_or_create(&"img", 2)).unwrap();
        cache.take_ready_owners();

        assert!(cache.update(&"img", "downsampled".into()));
        assert_eq!(*a.borrow(), "downsampled");
        assert_eq!(*b.borrow(), "downsampled");
        let mut ready = cache.take_ready_owners();
        ready.sort_unstable();
        assert_eq!(ready, [1, 2]);

        assert!(cache.modify(&"img", |s| s.push_str(" + tiles")));
        assert_eq!(*a.borrow(), "downsampled + tiles");
        assert!(!cache.update(&"missing", String::new()));
    }

    #[test]
    fn release_all_drops_every_key_of_an_owner() {
        let loader = ImmediateLoader::default();
        let cache = Cache::new(loader);
        for key in ["a", "b", "c"] {
            block_on(cache.get_or_create(&key, 7)).unwrap();
        }
        block_on(cache.get_or_create(&"b", 8)).unwrap();
        cache.release_all(7);
        assert!(!cache.contains(&"a"));
        assert!(!cache.contains(&"c"));
        assert_eq!(cache.owners_of(&"b"), [8]);
        assert!(!cache.take_ready_owners().contains(&7));
    }

    #[test]
    fn request_resolves_synchronously_when_possible() {
        let cache = Cache::new(ImmediateLoader::default());
        let handle = cache.request(&"img", 1).unwrap().unwrap();
        assert_eq!(*handle.borrow(), "decoded img");
        assert!(cache.is_ready(&"img"));
        assert!(cache.take_ready_owners().is_empty());
    }

    #[test]
    fn request_on_spawner_reports_ready_owner() {
        let loader = GatedLoader::default();
        let mut pool = LocalPool::new();
        let cache = Cache::new(loader.clone()).with_spawner(pool.spawner());
        assert!(cache.request(&"img", 4).unwrap().is_none());
        pool.run_until_stalled();
        assert!(cache.take_ready_owners().is_empty());

        loader.open("img", Ok("ok".into()));
        pool.run_until_stalled();
        assert_eq!(cache.take_ready_owners(), [4]);
        assert!(cache.get(&"img", 4).is_some());
    }

    #[test]
    fn request_without_spawner_is_driven() {
        let loader = GatedLoader::default();
        let cache = Cache::new(loader.clone());
        assert!(cache.request(&"img", 4).unwrap().is_none());
        assert_eq!(cache.drive(), 1);
        loader.open("img", Ok("ok".into()));
        assert_eq!(cache.drive(), 0);
        assert_eq!(cache.take_ready_owners(), [4]);
    }

    #[test]
    fn repeated_requests_share_one_background_task() {
        let loader = GatedLoader::default();
        let cache = Cache::new(loader.clone());
        for _ in 0..5 {
            assert!(cache.request(&"img", 4).unwrap().is_none());
        }
        assert!(cache.request(&"img", 5).unwrap().is_none());
        assert_eq!(cache.drive(), 1);
        assert_eq!(loader.loads.get(), 1);
        loader.open("img", Ok("ok".into()));
        assert_eq!(cache.drive(), 0);
        let mut owners = cache.take_ready_owners();
        owners.sort_unstable();
        assert_eq!(owners, [4, 5]);

        // A fresh fetch after eviction gets its own task.
        cache.release_all(4);
        cache.release_all(5);
        assert!(cache.request(&"img", 6).unwrap().is_none());
        assert_eq!(cache.drive(), 1);
    }
}
