//! Bounded worker pool for concurrent task execution
//!
//! Limits the number of concurrently executing tasks to prevent resource
//! exhaustion and to keep downstream pacing predictable. The cap is a hard
//! ceiling: callers may request fewer workers, never more.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::debug;

use crate::error::{CommonError, CommonResult};

/// Hard ceiling on concurrently executing tasks, regardless of configuration
pub const MAX_WORKERS: usize = 3;

/// Configuration for worker pool behavior
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Requested number of concurrent workers; clamped to [`MAX_WORKERS`]
    pub workers: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self { workers: MAX_WORKERS }
    }
}

impl WorkerPoolConfig {
    /// Create a new configuration builder
    pub fn builder() -> WorkerPoolConfigBuilder {
        WorkerPoolConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be greater than 0".to_string());
        }
        Ok(())
    }

    /// The worker count actually used after clamping
    pub fn effective_workers(&self) -> usize {
        self.workers.min(MAX_WORKERS)
    }
}

/// Builder for WorkerPoolConfig
#[derive(Debug)]
pub struct WorkerPoolConfigBuilder {
    config: WorkerPoolConfig,
}

impl Default for WorkerPoolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerPoolConfigBuilder {
    pub fn new() -> Self {
        Self { config: WorkerPoolConfig::default() }
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    pub fn build(self) -> Result<WorkerPoolConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Metrics for worker pool monitoring
#[derive(Debug, Clone)]
pub struct WorkerPoolMetrics {
    /// Total number of tasks submitted
    pub submitted: u64,
    /// Total number of tasks that ran to completion (panicked tasks excluded)
    pub completed: u64,
    /// Current number of executing tasks
    pub current_active: usize,
    /// Maximum concurrent tasks allowed
    pub capacity: usize,
}

impl WorkerPoolMetrics {
    /// Calculate the current utilization as a fraction (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        self.current_active as f64 / self.capacity as f64
    }

    /// Check if the pool is at capacity
    pub fn is_at_capacity(&self) -> bool {
        self.current_active >= self.capacity
    }
}

/// Worker pool limiting concurrent task execution
///
/// A permit is claimed before each task is spawned, so at most
/// `capacity` tasks execute at once and submission applies backpressure
/// once the pool is full. Each submission returns a [`JoinHandle`] that
/// resolves to the task's output, or to a join error when the task panicked.
///
/// # Examples
///
/// ```rust
/// use decant_common::resilience::{WorkerPool, WorkerPoolConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = WorkerPool::new(WorkerPoolConfig::default())?;
///
/// let handle = pool.spawn(async { 21 * 2 }).await?;
/// assert_eq!(handle.await?, 42);
///
/// pool.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct WorkerPool {
    capacity: usize,
    semaphore: Arc<Semaphore>,
    tracker: TaskTracker,
    submitted: Arc<AtomicU64>,
    completed: Arc<AtomicU64>,
}

impl WorkerPool {
    /// Create a new worker pool with the given configuration
    pub fn new(config: WorkerPoolConfig) -> Result<Self, String> {
        config.validate()?;

        let capacity = config.effective_workers();
        Ok(Self {
            capacity,
            semaphore: Arc::new(Semaphore::new(capacity)),
            tracker: TaskTracker::new(),
            submitted: Arc::new(AtomicU64::new(0)),
            completed: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Create a worker pool with default configuration
    pub fn with_defaults() -> Self {
        Self {
            capacity: MAX_WORKERS,
            semaphore: Arc::new(Semaphore::new(MAX_WORKERS)),
            tracker: TaskTracker::new(),
            submitted: Arc::new(AtomicU64::new(0)),
            completed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Submit a task for execution
    ///
    /// Waits for a free worker slot before spawning, then returns a handle
    /// resolving to the task's output. A panicking task surfaces as a join
    /// error on the handle; the pool itself stays usable.
    ///
    /// # Errors
    /// Returns an error if the pool has been shut down.
    pub async fn spawn<F, T>(&self, task: F) -> CommonResult<JoinHandle<T>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| CommonError::task_cancelled("worker_pool"))?;

        self.submitted.fetch_add(1, Ordering::Relaxed);
        debug!("Worker pool: task starting ({} active)", self.current_active());

        let completed = Arc::clone(&self.completed);
        Ok(self.tracker.spawn(async move {
            let _permit = permit;
            let output = task.await;
            completed.fetch_add(1, Ordering::Relaxed);
            output
        }))
    }

    /// Stop accepting new tasks and wait for in-flight tasks to finish
    pub async fn shutdown(&self) {
        self.semaphore.close();
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// Get the current number of executing tasks
    pub fn current_active(&self) -> usize {
        self.capacity.saturating_sub(self.semaphore.available_permits())
    }

    /// Maximum number of concurrently executing tasks
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get pool metrics
    pub fn metrics(&self) -> WorkerPoolMetrics {
        WorkerPoolMetrics {
            submitted: self.submitted.load(Ordering::Acquire),
            completed: self.completed.load(Ordering::Acquire),
            current_active: self.current_active(),
            capacity: self.capacity,
        }
    }
}

impl Clone for WorkerPool {
    fn clone(&self) -> Self {
        Self {
            capacity: self.capacity,
            semaphore: Arc::clone(&self.semaphore),
            tracker: self.tracker.clone(),
            submitted: Arc::clone(&self.submitted),
            completed: Arc::clone(&self.completed),
        }
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("capacity", &self.capacity)
            .field("current_active", &self.current_active())
            .finish()
    }
}
