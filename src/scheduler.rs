use log::error;
use std::thread;

pub trait Scheduler {
    fn spawn<F>(&self, name: &str, f: F)
    where
        F: FnOnce() + Send + 'static;
}

pub struct ThreadScheduler;

impl ThreadScheduler {
    pub fn new() -> Self {
        ThreadScheduler
    }
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ThreadScheduler {
    fn spawn<F>(&self, name: &str, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Err(e) = thread::Builder::new().name(name.to_string()).spawn(f) {
            error!("Failed to spawn thread '{}': {}", name, e);
        }
    }
}
