/// Per-execution request scope.
///
/// The scheduler activates a fresh scope around every execution, including
/// the deferred continuations of that execution, and destroys it once the
/// execution has completed. Beans are created lazily, at most once per scope,
/// and each created bean is destroyed exactly once.
use std::any::{Any, TypeId};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::trace;

use crate::error::ScopeError;

pub trait ScopedBean: Send + Sync + 'static {
    fn create() -> Self
    where
        Self: Sized;

    /// Called once when the owning scope is destroyed.
    fn pre_destroy(&self) {}
}

trait Contextual: Send + Sync {
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
    fn destroy(&self);
}

impl<T: ScopedBean> Contextual for T {
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn destroy(&self) {
        self.pre_destroy();
    }
}

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

tokio::task_local! {
    static CURRENT_SCOPE: RequestScope;
}

#[derive(Clone)]
pub struct RequestScope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    id: u64,
    instances: Mutex<Vec<(TypeId, Arc<dyn Contextual>)>>,
    destroyed: AtomicBool,
}

impl RequestScope {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
                instances: Mutex::new(Vec::new()),
                destroyed: AtomicBool::new(false),
            }),
        }
    }

    /// The scope active on the current task, if any.
    pub fn current() -> Option<RequestScope> {
        CURRENT_SCOPE.try_with(|scope| scope.clone()).ok()
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn is_active(&self) -> bool {
        !self.inner.destroyed.load(Ordering::SeqCst)
    }

    pub fn created_count(&self) -> usize {
        self.lock().len()
    }

    /// Runs `future` with this scope current.
    pub async fn run<F: Future>(&self, future: F) -> F::Output {
        CURRENT_SCOPE.scope(self.clone(), future).await
    }

    /// Runs `f` with this scope current, for code on a blocking thread.
    pub fn run_sync<R>(&self, f: impl FnOnce() -> R) -> R {
        CURRENT_SCOPE.sync_scope(self.clone(), f)
    }

    pub fn instance<T: ScopedBean>(&self) -> Result<Arc<T>, ScopeError> {
        if let Some(existing) = self.lookup::<T>()? {
            return Ok(existing);
        }

        // Created without the lock held so `create` may itself ask for beans.
        let bean = Arc::new(T::create());

        let mut instances = self.lock();
        if !self.is_active() {
            return Err(ScopeError::destroyed(self.inner.id));
        }
        if let Some(existing) = find::<T>(&instances) {
            return Ok(existing);
        }
        instances.push((TypeId::of::<T>(), Arc::clone(&bean) as Arc<dyn Contextual>));
        trace!(scope = self.inner.id, bean = std::any::type_name::<T>(), "bean created");
        Ok(bean)
    }

    /// Destroys every created bean, newest first. Returns how many were destroyed.
    ///
    /// Only the first call has any effect.
    pub fn destroy(&self) -> usize {
        if self.inner.destroyed.swap(true, Ordering::SeqCst) {
            return 0;
        }
        let instances = std::mem::take(&mut *self.lock());
        let count = instances.len();
        for (_, bean) in instances.into_iter().rev() {
            bean.destroy();
        }
        trace!(scope = self.inner.id, count, "request scope destroyed");
        count
    }

    fn lookup<T: ScopedBean>(&self) -> Result<Option<Arc<T>>, ScopeError> {
        let instances = self.lock();
        if !self.is_active() {
            return Err(ScopeError::destroyed(self.inner.id));
        }
        Ok(find::<T>(&instances))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(TypeId, Arc<dyn Contextual>)>> {
        self.inner
            .instances
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for RequestScope {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RequestScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestScope")
            .field("id", &self.inner.id)
            .field("active", &self.is_active())
            .finish()
    }
}

fn find<T: ScopedBean>(instances: &[(TypeId, Arc<dyn Contextual>)]) -> Option<Arc<T>> {
    instances
        .iter()
        .find(|(id, _)| *id == TypeId::of::<T>())
        .and_then(|(_, bean)| Arc::clone(bean).as_any().downcast::<T>().ok())
}

/// Bean of type `T` from the scope current on this task.
pub fn instance<T: ScopedBean>() -> Result<Arc<T>, ScopeError> {
    RequestScope::current()
        .ok_or(ScopeError::NotActive)?
        .instance::<T>()
}
