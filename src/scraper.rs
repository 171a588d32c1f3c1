//! Runs the candidate set against the target, self-spawning one cooperative
//! task per in-flight candidate and asking the [`Controller`] after every
//! completion whether to spawn more or let this task retire.

use crate::candidate::Candidate;
use crate::connection::{Connection, ConnectionStrategy};
use crate::controller::{ConcurrencyController, Controller};
use crate::generator::UriGenerator;
use crate::query::{Query, QueryStrategy};
use crate::request::RequestWriter;
use anyhow::Result;
use log::error;
use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::rc::Rc;
use tokio::sync::Notify;

/// Everything that's only ever touched between `.await` points: never held
/// across a suspension point, so the `RefCell` borrow can't collide with a
/// sibling task's borrow.
struct ControllerState {
    controller: ConcurrencyController,
    active_tasks: u32,
}

#[derive(Clone)]
pub struct Scraper {
    query: Rc<QueryStrategy>,
    connection: Rc<Connection>,
    writer: Rc<RequestWriter>,
    state: Rc<RefCell<ControllerState>>,
    /// Woken whenever a task retires; `run` polls `active_tasks` on each
    /// wake rather than trusting any single task to be "the last one",
    /// since any of the self-spawned siblings can be the one that drains
    /// the generator.
    idle: Rc<Notify>,
    verbose: bool,
    sensitive: bool,
    error_path: Rc<String>,
}

/// Decrements the shared in-flight counter on drop and wakes anyone waiting
/// on [`Scraper::run`], regardless of how the task that owned it exits. The
/// counter itself is incremented synchronously by the spawning task, before
/// the new task is even scheduled, so a racing check of `active_tasks` can
/// never observe the pre-spawn count.
struct ActiveTaskGuard {
    state: Rc<RefCell<ControllerState>>,
    idle: Rc<Notify>,
}

impl Drop for ActiveTaskGuard {
    fn drop(&mut self) {
        self.state.borrow_mut().active_tasks -= 1;
        self.idle.notify_waiters();
    }
}

impl Scraper {
    pub fn new(
        query: QueryStrategy,
        connection: Connection,
        writer: RequestWriter,
        controller: ConcurrencyController,
        verbose: bool,
        sensitive: bool,
        error_path: String,
    ) -> Self {
        Scraper {
            query: Rc::new(query),
            connection: Rc::new(connection),
            writer: Rc::new(writer),
            state: Rc::new(RefCell::new(ControllerState {
                controller,
                active_tasks: 0,
            })),
            idle: Rc::new(Notify::new()),
            verbose,
            sensitive,
            error_path: Rc::new(error_path),
        }
    }

    /// Spawns the first task and blocks (cooperatively) until every
    /// self-spawned task has exhausted the generator or backed off. Must
    /// run inside a `tokio::task::LocalSet`.
    pub async fn run(&self, generator: UriGenerator) {
        let generator = Rc::new(RefCell::new(generator));
        self.spawn_task(generator);
        loop {
            if self.state.borrow().active_tasks == 0 {
                return;
            }
            self.idle.notified().await;
        }
    }

    fn spawn_task(&self, generator: Rc<RefCell<UriGenerator>>) {
        self.state.borrow_mut().active_tasks += 1;
        let scraper = self.clone();
        tokio::task::spawn_local(async move {
            let _guard = ActiveTaskGuard {
                state: scraper.state.clone(),
                idle: scraper.idle.clone(),
            };
            loop {
                let Some(uri) = generator.borrow_mut().next() else {
                    break;
                };
                let candidate = Candidate::new(uri);

                let should_spawn_more = {
                    let state = scraper.state.borrow();
                    (state.active_tasks as usize) < state.controller.recommended_coroutines()
                };
                if should_spawn_more {
                    scraper.spawn_task(generator.clone());
                }

                if let Err(e) = scraper.run_one(candidate.description()).await {
                    scraper.log_error(candidate.description(), &e);
                }

                let should_retire = {
                    let mut state = scraper.state.borrow_mut();
                    let active = state.active_tasks;
                    state.controller.register_completion(active);
                    (state.active_tasks as usize) > state.controller.recommended_coroutines()
                };
                if should_retire {
                    break;
                }
            }
        });
    }

    /// Connects, sends exactly one request, runs the query against the
    /// response, then tears the connection down. No connection is reused
    /// across candidates (spec.md §5: "no per-candidate connection pooling").
    async fn run_one(&self, target: &str) -> Result<()> {
        let method = self.query.method();
        let request = self.writer.build(method, target)?;
        let stream = self.connection.connect().await?;

        let (mut sender, conn) = hyper::client::conn::http1::handshake(stream).await?;
        let (teardown_tx, teardown_rx) = tokio::sync::oneshot::channel();
        tokio::task::spawn_local(async move {
            let _ = teardown_tx.send(conn.await);
        });

        let response = sender.send_request(request).await?;
        let outcome = self.query.execute(response, target).await;

        // Dropping the sender tells hyper there will be no further requests
        // on this connection, which drives it through its own close/shutdown
        // sequence (TLS close_notify, then TCP teardown). Whether a non-EOF
        // error out of that sequence fails the candidate is gated on
        // `--sensitive`, mirroring the `sensitive_teardown` flag in spec.md
        // §4.3.
        drop(sender);
        if let Ok(conn_result) = teardown_rx.await {
            self.check_teardown(conn_result)?;
        }

        outcome
    }

    fn check_teardown(&self, result: std::result::Result<(), hyper::Error>) -> Result<()> {
        let Err(err) = result else {
            return Ok(());
        };
        let message = err.to_string().to_ascii_lowercase();
        let is_eof = message.contains("eof") || message.contains("closed");
        if is_eof || !self.sensitive {
            if !is_eof {
                error!("non-EOF teardown error ignored (not --sensitive): {err}");
            }
            return Ok(());
        }
        Err(err.into())
    }

    fn log_error(&self, target: &str, err: &anyhow::Error) {
        if let Ok(mut file) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.error_path.as_str())
        {
            let _ = writeln!(file, "{target}: {err}");
        }
        if self.verbose {
            eprintln!("[-] Exception: {err}");
        }
    }
}
