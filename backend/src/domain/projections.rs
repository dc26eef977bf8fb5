//! Shared current-value views over the entity tables.
//!
//! A `Projection` turns a table's snapshot stream into a cached value that
//! any number of subscribers can read. All subscribers share one upstream
//! reader task. It starts with the first subscriber and is stopped once the
//! last subscriber has been gone for the keepalive period, so quickly
//! re-subscribing does not restart it.

use anyhow::Result;
use futures_util::stream::{BoxStream, StreamExt};
use shared::{BathroomList, DogList, FoodList, WalkList};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::storage::{BathroomStorage, DogStorage, FoodStorage, WalkStorage};

type SourceFactory<T> = Arc<dyn Fn() -> BoxStream<'static, Result<T>> + Send + Sync>;

#[derive(Default)]
struct Lifecycle {
    subscribers: usize,
    upstream: Option<JoinHandle<()>>,
    teardown: Option<JoinHandle<()>>,
}

impl Lifecycle {
    fn upstream_running(&self) -> bool {
        self.upstream.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn stop(&mut self) {
        if let Some(task) = self.upstream.take() {
            task.abort();
        }
        if let Some(task) = self.teardown.take() {
            task.abort();
        }
    }
}

struct ProjectionInner<T> {
    name: &'static str,
    keepalive: Duration,
    source: SourceFactory<T>,
    value: watch::Sender<T>,
    lifecycle: Mutex<Lifecycle>,
}

impl<T> ProjectionInner<T> {
    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn stop_if_idle(&self) {
        let mut lifecycle = self.lifecycle();
        if lifecycle.subscribers == 0 {
            debug!("Projection {} idle past keepalive, stopping", self.name);
            if let Some(task) = lifecycle.upstream.take() {
                task.abort();
            }
            lifecycle.teardown = None;
        }
    }
}

impl<T> Drop for ProjectionInner<T> {
    fn drop(&mut self) {
        let lifecycle = match self.lifecycle.get_mut() {
            Ok(lifecycle) => lifecycle,
            Err(poisoned) => poisoned.into_inner(),
        };
        lifecycle.stop();
    }
}

/// A cached, shared view derived from a snapshot stream
pub struct Projection<T> {
    inner: Arc<ProjectionInner<T>>,
}

impl<T> Clone for Projection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Projection<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// `source` is called each time the upstream (re)starts and must yield
    /// the full current value first, then one value per change.
    pub fn new<F>(name: &'static str, keepalive: Duration, initial: T, source: F) -> Self
    where
        F: Fn() -> BoxStream<'static, Result<T>> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(ProjectionInner {
                name,
                keepalive,
                source: Arc::new(source),
                value: watch::channel(initial).0,
                lifecycle: Mutex::new(Lifecycle::default()),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Latest known value, even when nobody is subscribed
    pub fn current(&self) -> T {
        self.inner.value.borrow().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lifecycle().subscribers
    }

    /// Whether the shared upstream reader is running
    pub fn is_active(&self) -> bool {
        self.inner.lifecycle().upstream_running()
    }

    /// Subscribe, starting the shared upstream if it is not running
    pub fn subscribe(&self) -> ProjectionSubscription<T> {
        let receiver = self.inner.value.subscribe();

        let mut lifecycle = self.inner.lifecycle();
        lifecycle.subscribers += 1;
        if let Some(task) = lifecycle.teardown.take() {
            task.abort();
        }

        if !lifecycle.upstream_running() {
            match Handle::try_current() {
                Ok(handle) => {
                    lifecycle.upstream = Some(spawn_upstream(&handle, &self.inner));
                }
                Err(_) => warn!(
                    "Projection {} subscribed outside a runtime, serving cached value only",
                    self.inner.name
                ),
            }
        }
        drop(lifecycle);

        ProjectionSubscription {
            receiver,
            inner: self.inner.clone(),
        }
    }
}

fn spawn_upstream<T>(handle: &Handle, inner: &Arc<ProjectionInner<T>>) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
{
    let name = inner.name;
    let mut source = (inner.source)();
    let weak: Weak<ProjectionInner<T>> = Arc::downgrade(inner);

    debug!("Projection {} starting upstream", name);
    handle.spawn(async move {
        while let Some(item) = source.next().await {
            let Some(inner) = weak.upgrade() else {
                break;
            };
            match item {
                Ok(value) => {
                    inner.value.send_replace(value);
                }
                Err(e) => error!("Projection {} failed to refresh: {:#}", name, e),
            }
        }
        debug!("Projection {} upstream ended", name);
    })
}

/// One subscriber's handle on a projection. Dropping it releases the subscription.
pub struct ProjectionSubscription<T: Send + Sync + 'static> {
    receiver: watch::Receiver<T>,
    inner: Arc<ProjectionInner<T>>,
}

impl<T> ProjectionSubscription<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn current(&self) -> T {
        self.receiver.borrow().clone()
    }

    /// Wait for the next value published after the last one seen
    pub async fn changed(&mut self) -> Result<T> {
        self.receiver.changed().await?;
        Ok(self.receiver.borrow_and_update().clone())
    }

    /// Wait until the value satisfies `predicate`, checking the current value first
    pub async fn wait_for(&mut self, predicate: impl FnMut(&T) -> bool) -> Result<T> {
        let value = self.receiver.wait_for(predicate).await?;
        Ok(value.clone())
    }
}

impl<T: Send + Sync + 'static> Drop for ProjectionSubscription<T> {
    fn drop(&mut self) {
        let mut lifecycle = self.inner.lifecycle();
        lifecycle.subscribers = lifecycle.subscribers.saturating_sub(1);
        if lifecycle.subscribers > 0 {
            return;
        }

        match Handle::try_current() {
            Ok(handle) => {
                let weak = Arc::downgrade(&self.inner);
                let keepalive = self.inner.keepalive;
                lifecycle.teardown = Some(handle.spawn(async move {
                    tokio::time::sleep(keepalive).await;
                    if let Some(inner) = weak.upgrade() {
                        inner.stop_if_idle();
                    }
                }));
            }
            Err(_) => lifecycle.stop(),
        }
    }
}

/// The list projections presentation subscribes to
#[derive(Clone)]
pub struct ProjectionSet {
    pub dog_list: Projection<DogList>,
    pub bathroom_list: Projection<BathroomList>,
    pub food_list: Projection<FoodList>,
    pub walk_list: Projection<WalkList>,
}

impl ProjectionSet {
    pub fn new(
        dogs: Arc<dyn DogStorage>,
        bathrooms: Arc<dyn BathroomStorage>,
        foods: Arc<dyn FoodStorage>,
        walks: Arc<dyn WalkStorage>,
        keepalive: Duration,
    ) -> Self {
        Self {
            dog_list: Projection::new("dog_list", keepalive, DogList::default(), move || {
                dogs.observe_all().map(|rows| rows.map(DogList::new)).boxed()
            }),
            bathroom_list: Projection::new(
                "bathroom_list",
                keepalive,
                BathroomList::default(),
                move || bathrooms.observe_all().map(|rows| rows.map(BathroomList::new)).boxed(),
            ),
            food_list: Projection::new("food_list", keepalive, FoodList::default(), move || {
                foods.observe_all().map(|rows| rows.map(FoodList::new)).boxed()
            }),
            walk_list: Projection::new("walk_list", keepalive, WalkList::default(), move || {
                walks.observe_all().map(|rows| rows.map(WalkList::new)).boxed()
            }),
        }
    }
}
