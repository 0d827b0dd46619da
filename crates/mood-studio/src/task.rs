use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;

#[cfg(not(target_arch = "wasm32"))]
use futures::executor::{LocalPool, LocalSpawner};
#[cfg(not(target_arch = "wasm32"))]
use futures::task::LocalSpawnExt;

#[derive(Clone)]
pub struct Spawner {
    #[cfg(not(target_arch = "wasm32"))]
    local: LocalSpawner,
    in_flight: Rc<Cell<usize>>,
}

impl Spawner {
    pub fn spawn(&self, task: impl Future<Output = ()> + 'static) {
        let in_flight = Rc::clone(&self.in_flight);
        in_flight.set(in_flight.get() + 1);
        let tracked = async move {
            task.await;
            in_flight.set(in_flight.get().saturating_sub(1));
        };

        #[cfg(not(target_arch = "wasm32"))]
        if let Err(e) = self.local.spawn_local(tracked) {
            log::error!("Task runner is shut down, dropping task: {e}");
            self.in_flight.set(self.in_flight.get().saturating_sub(1));
        }

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(tracked);
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.get()
    }
}

pub struct TaskRunner {
    #[cfg(not(target_arch = "wasm32"))]
    pool: LocalPool,
    spawner: Spawner,
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRunner {
    pub fn new() -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        let pool = LocalPool::new();
        let spawner = Spawner {
            #[cfg(not(target_arch = "wasm32"))]
            local: pool.spawner(),
            in_flight: Rc::new(Cell::new(0)),
        };
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            pool,
            spawner,
        }
    }

    pub fn spawner(&self) -> Spawner {
        self.spawner.clone()
    }

    /// Polls every task that can make progress without blocking.
    pub fn run_until_stalled(&mut self) {
        #[cfg(not(target_arch = "wasm32"))]
        self.pool.run_until_stalled();
    }

    pub fn has_pending(&self) -> bool {
        self.spawner.in_flight() > 0
    }

    /// Drives `future` to completion, running spawned tasks alongside it.
    #[cfg(all(test, not(target_arch = "wasm32")))]
    pub(crate) fn block_on<F: Future>(&mut self, future: F) -> F::Output {
        self.pool.run_until(future)
    }
}
