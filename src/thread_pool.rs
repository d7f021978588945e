use crate::error::Result;
use std::{thread, sync::{atomic::{AtomicBool, Ordering}, Arc}};
use crossbeam::channel::{bounded, Sender, Receiver};

/// Pool running the store calls of the server.
///
/// The server submits one job per request, never one per connection, so a job
/// is always short and a bounded pool cannot be starved by idle clients.
pub trait ThreadPool: Clone + Send + 'static {
    /// construct a new thread pool with the specified threads num
    fn new(threads: u32) -> Result<Self>
    where Self: Sized;

    /// run `job` on the pool, blocking while a bounded queue is full
    fn spawn<F>(&self, job: F) where F: FnOnce() + Send + 'static;
}

/// spawns one fresh thread per job
#[derive(Clone)]
pub struct NaiveThreadPool {}

impl ThreadPool for NaiveThreadPool {
    fn new(_threads: u32) -> Result<Self> {
        Ok(Self{})
    }

    fn spawn<F>(&self, job: F) where F: FnOnce() + Send + 'static {
        thread::spawn(job);
    }
}

type Job = Box<dyn FnOnce() + Send + 'static>;

// One worker of the shared queue. Dropped while unwinding from a panicking
// job, it starts its own replacement on the same queue.
struct Worker {
    jobs: Receiver<Job>,
    stopped: Arc<AtomicBool>,
}

impl Worker {
    fn start(self) {
        thread::spawn(move || {
            while !self.stopped.load(Ordering::SeqCst) {
                match self.jobs.recv() {
                    Ok(job) => job(),
                    Err(_) => break,
                }
            }
        });
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if thread::panicking() {
            Worker {
                jobs: self.jobs.clone(),
                stopped: self.stopped.clone(),
            }.start();
        }
    }
}


/// fixed number of workers pulling jobs from a bounded shared queue
#[derive(Clone)]
pub struct SharedQueueThreadPool
{
    jobs: Sender<Job>,
    stopped: Arc<AtomicBool>,
    threads: u32,
}

impl ThreadPool for SharedQueueThreadPool
{
    fn new(threads: u32) -> Result<Self> {
        let threads = threads.max(1);
        let (jobs, queue) = bounded::<Job>((threads * 2) as usize);
        let stopped = Arc::new(AtomicBool::new(false));

        for _ in 0..threads {
            Worker { jobs: queue.clone(), stopped: stopped.clone() }.start();
        }

        Ok(Self { jobs, stopped, threads })
    }

    fn spawn<F>(&self, job: F) where F: FnOnce() + Send + 'static {
        // only fails once every worker is gone after `stop`
        let _ = self.jobs.send(Box::new(job));
    }
}

impl SharedQueueThreadPool {
    /// retire every worker once its current job is done
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        for _ in 0..self.threads {
            let _ = self.jobs.send(Box::new(|| {}));
        }
    }

    /// number of workers
    pub fn threads(&self) -> u32 {
        self.threads
    }
}

/// wrapper of a rayon thread pool
#[derive(Clone)]
pub struct RayonThreadPool(Arc<rayon::ThreadPool>);

impl ThreadPool for RayonThreadPool {
    fn new(threads: u32) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads as usize)
            .build()?;
        Ok(RayonThreadPool(Arc::new(pool)))
    }

    fn spawn<F>(&self, job: F) where F: FnOnce() + Send + 'static {
        self.0.spawn(job)
    }
}
