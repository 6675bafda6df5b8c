//! The action loop
//!
//! [`EffectRuntime`] owns a store, an action queue and a [`TaskManager`].
//! Every action, whether queued by the caller, emitted by an effect handler
//! or produced by a finished task, is reduced on the runtime's own thread of
//! control. Effects from each reduction go to a handler closure supplied by
//! the caller, which may emit actions or spawn tasks through an
//! [`EffectContext`].

use std::marker::PhantomData;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::effect::{DispatchResult, EffectReducer};
use crate::middleware::Middleware;
use crate::store::{Store, StoreWithMiddleware};
use crate::tasks::TaskManager;
use crate::Action;

/// Anything the runtime can dispatch into
pub trait DispatchStore<S, A: Action, E> {
    fn dispatch(&mut self, action: A) -> DispatchResult<E>;
    fn state(&self) -> &S;
}

impl<S, A: Action, E> DispatchStore<S, A, E> for Store<S, A, E> {
    fn dispatch(&mut self, action: A) -> DispatchResult<E> {
        Store::dispatch(self, action)
    }

    fn state(&self) -> &S {
        Store::state(self)
    }
}

impl<S, A, E, M> DispatchStore<S, A, E> for StoreWithMiddleware<S, A, E, M>
where
    A: Action,
    M: Middleware<S, A>,
{
    fn dispatch(&mut self, action: A) -> DispatchResult<E> {
        StoreWithMiddleware::dispatch(self, action)
    }

    fn state(&self) -> &S {
        StoreWithMiddleware::state(self)
    }
}

/// What an effect handler may do: queue actions and manage tasks
pub struct EffectContext<'a, A: Action> {
    queue: &'a mpsc::UnboundedSender<A>,
    tasks: &'a mut TaskManager<A>,
}

impl<A: Action> EffectContext<'_, A> {
    /// Queue `action`; it is reduced after the current dispatch finishes.
    pub fn emit(&self, action: A) {
        // The receiver lives in the runtime, which outlives every context
        let _ = self.queue.send(action);
    }

    pub fn tasks(&mut self) -> &mut TaskManager<A> {
        self.tasks
    }
}

/// Store plus action queue plus background tasks
pub struct EffectRuntime<S, A: Action, E, St = Store<S, A, E>> {
    store: St,
    queue_tx: mpsc::UnboundedSender<A>,
    queue_rx: mpsc::UnboundedReceiver<A>,
    tasks: TaskManager<A>,
    _marker: PhantomData<fn() -> (S, E)>,
}

impl<S, A: Action, E> EffectRuntime<S, A, E> {
    /// Runtime over a plain [`Store`]
    pub fn new(state: S, reducer: EffectReducer<S, A, E>) -> Self {
        Self::from_store(Store::new(state, reducer))
    }
}

impl<S, A, E, St> EffectRuntime<S, A, E, St>
where
    A: Action,
    St: DispatchStore<S, A, E>,
{
    pub fn from_store(store: St) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        Self {
            store,
            queue_tx,
            queue_rx,
            tasks: TaskManager::new(),
            _marker: PhantomData,
        }
    }

    /// Queue `action` for the next [`settle`](Self::settle) or [`run`](Self::run)
    pub fn enqueue(&self, action: A) {
        let _ = self.queue_tx.send(action);
    }

    /// A sender other tasks can use to feed the queue
    pub fn action_tx(&self) -> mpsc::UnboundedSender<A> {
        self.queue_tx.clone()
    }

    pub fn state(&self) -> &S {
        self.store.state()
    }

    pub fn store_mut(&mut self) -> &mut St {
        &mut self.store
    }

    /// Reduce `action` immediately and hand its effects to `handler`.
    /// Returns the change flag.
    pub fn dispatch<H>(&mut self, action: A, handler: &mut H) -> bool
    where
        H: FnMut(E, &mut EffectContext<'_, A>),
    {
        let DispatchResult { changed, effects } = self.store.dispatch(action);
        if !effects.is_empty() {
            let mut ctx = EffectContext {
                queue: &self.queue_tx,
                tasks: &mut self.tasks,
            };
            effects.into_iter().for_each(|effect| handler(effect, &mut ctx));
        }
        changed
    }

    /// Reduce everything already queued, including actions emitted along
    /// the way. Returns how many actions that was.
    pub fn drain_queue<H>(&mut self, handler: &mut H) -> usize
    where
        H: FnMut(E, &mut EffectContext<'_, A>),
    {
        let mut count = 0;
        while let Ok(action) = self.queue_rx.try_recv() {
            self.dispatch(action, handler);
            count += 1;
        }
        count
    }

    /// Keep reducing until the queue is empty and no task is in flight.
    ///
    /// Returns the number of actions reduced. Meant for tests and one-shot
    /// command line use where there is no long-lived loop.
    pub async fn settle<H>(&mut self, mut handler: H) -> usize
    where
        H: FnMut(E, &mut EffectContext<'_, A>),
    {
        let mut count = self.drain_queue(&mut handler);
        while let Some(outcome) = self.tasks.next_settled().await {
            self.dispatch(outcome, &mut handler);
            count += 1 + self.drain_queue(&mut handler);
        }
        count
    }

    /// Reduce queued actions and task outcomes as they arrive until
    /// `cancel` fires. Tasks still in flight at that point are abandoned.
    pub async fn run<H>(&mut self, cancel: CancellationToken, mut handler: H)
    where
        H: FnMut(E, &mut EffectContext<'_, A>),
    {
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => break,
                Some(action) = self.queue_rx.recv() => action,
                Some(outcome) = self.tasks.next_settled() => outcome,
            };
            self.dispatch(next, &mut handler);
        }
        tracing::debug!(in_flight = self.tasks.in_flight(), "action loop stopped");
        self.tasks.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Clone, Debug, PartialEq)]
    enum Msg {
        Lookup(u32),
        DidLookup(u32),
        Ping,
    }

    impl Action for Msg {
        fn name(&self) -> &'static str {
            match self {
                Msg::Lookup(_) => "Lookup",
                Msg::DidLookup(_) => "DidLookup",
                Msg::Ping => "Ping",
            }
        }
    }

    #[derive(Debug)]
    enum Job {
        Lookup { id: u32, delay_ms: u64 },
        Ping,
    }

    #[derive(Default)]
    struct Model {
        busy: bool,
        found: Option<u32>,
        pings: usize,
    }

    fn reduce(model: &mut Model, msg: Msg) -> DispatchResult<Job> {
        match msg {
            Msg::Lookup(id) => {
                model.busy = true;
                // Lower ids answer later, so outcomes arrive newest first
                let delay_ms = u64::from(10u32.saturating_sub(id)) * 10;
                DispatchResult::changed_with(Job::Lookup { id, delay_ms }).with(Job::Ping)
            }
            Msg::DidLookup(id) => {
                model.busy = false;
                model.found = Some(id);
                DispatchResult::changed()
            }
            Msg::Ping => {
                model.pings += 1;
                DispatchResult::changed()
            }
        }
    }

    fn perform(job: Job, ctx: &mut EffectContext<'_, Msg>) {
        match job {
            Job::Lookup { id, delay_ms } => {
                ctx.tasks().spawn("lookup", async move {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    Msg::DidLookup(id)
                });
            }
            Job::Ping => ctx.emit(Msg::Ping),
        }
    }

    #[tokio::test]
    async fn test_settle_keeps_only_latest_outcome() {
        let mut runtime = EffectRuntime::new(Model::default(), reduce);

        runtime.enqueue(Msg::Lookup(1));
        runtime.enqueue(Msg::Lookup(2));
        let reduced = runtime.settle(perform).await;

        // two lookups, two pings, one surviving outcome
        assert_eq!(reduced, 5);
        let model = runtime.state();
        assert_eq!(model.found, Some(2));
        assert!(!model.busy);
        assert_eq!(model.pings, 2);
    }

    #[tokio::test]
    async fn test_settle_with_nothing_queued() {
        let mut runtime = EffectRuntime::new(Model::default(), reduce);
        assert_eq!(runtime.settle(perform).await, 0);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let mut runtime = EffectRuntime::new(Model::default(), reduce);
        let cancel = CancellationToken::new();
        let tx = runtime.action_tx();
        tx.send(Msg::Lookup(9)).unwrap();

        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            stopper.cancel();
        });

        tokio::time::timeout(Duration::from_secs(2), runtime.run(cancel, perform))
            .await
            .expect("run did not stop");
        assert_eq!(runtime.state().found, Some(9));
    }

    #[test]
    fn test_drain_queue_applies_emitted_actions_without_tasks() {
        let mut runtime = EffectRuntime::new(Model::default(), reduce);
        let mut handler = |job: Job, ctx: &mut EffectContext<'_, Msg>| match job {
            Job::Ping => ctx.emit(Msg::Ping),
            Job::Lookup { .. } => panic!("no lookups expected"),
        };

        runtime.enqueue(Msg::Ping);
        runtime.enqueue(Msg::DidLookup(3));
        assert_eq!(runtime.drain_queue(&mut handler), 2);
        assert_eq!(runtime.state().pings, 1);
        assert_eq!(runtime.state().found, Some(3));
        assert_eq!(runtime.drain_queue(&mut handler), 0);
    }

    #[test]
    fn test_dispatch_reports_change() {
        let mut runtime = EffectRuntime::new(Model::default(), reduce);
        let mut handler = |_: Job, _: &mut EffectContext<'_, Msg>| panic!("no effects expected");
        assert!(runtime.dispatch(Msg::DidLookup(4), &mut handler));
        assert_eq!(runtime.state().found, Some(4));
    }
}
