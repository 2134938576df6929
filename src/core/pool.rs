use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::core::errors::{AppError, AppResult};

/// Bounded pool for blocking work (PDF parsing, oracle HTTP calls).
///
/// Jobs run on tokio's blocking threads; the semaphore caps how many run at
/// once across every request sharing the pool.
#[derive(Debug, Clone)]
pub struct BlockingPool {
    permits: Arc<Semaphore>,
    width: usize,
}

impl BlockingPool {
    pub fn new(width: usize) -> Self {
        let width = width.max(1);
        Self {
            permits: Arc::new(Semaphore::new(width)),
            width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub async fn run<F, T>(&self, job: F) -> AppResult<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|err| AppError::Internal(format!("worker pool closed: {err}")))?;
        tokio::task::spawn_blocking(job).await.map_err(|err| {
            if err.is_panic() {
                AppError::Internal("blocking job panicked".to_string())
            } else {
                AppError::Internal(format!("blocking job cancelled: {err}"))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::BlockingPool;

    #[tokio::test]
    async fn returns_job_output() {
        let pool = BlockingPool::new(2);
        let value = pool.run(|| 21 * 2).await.expect("job should run");
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn panicking_job_becomes_internal_error() {
        let pool = BlockingPool::new(1);
        let err = pool
            .run(|| -> usize { panic!("boom") })
            .await
            .expect_err("panic should surface as error");
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_exceeds_width() {
        let pool = BlockingPool::new(2);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = vec![];
        for _ in 0..6 {
            let pool = pool.clone();
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                pool.run(move || {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    active.fetch_sub(1, Ordering::SeqCst);
                })
                .await
            }));
        }
        for handle in handles {
            handle.await.expect("task joins").expect("job runs");
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(pool.width(), 2);
    }
}
