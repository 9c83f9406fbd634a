//! Engine hosted on a background thread.
//!
//! The driver talks to a `RemoteEngine` handle that forwards every call over
//! a channel and blocks until the worker replies, so a slow or remote engine
//! looks like any other `MeasurementEngine`. Calls stay strictly sequential:
//! one request is in flight at a time.

use crossbeam_channel::{Receiver, Sender};
use log::debug;
use std::thread::{self, JoinHandle};

use crate::driver::MeasurementEngine;
use crate::error::RemoteError;
use crate::lattice::{DataSiteId, StabilizerKind, SyndromeSiteId};
use crate::protocol::{Operation, SyndromeRequest};

/// Request sent from the driver side to the worker.
#[derive(Debug, Clone)]
pub enum EngineRequest {
    Measure {
        index: usize,
        round: usize,
        site: SyndromeSiteId,
        kind: StabilizerKind,
        data: Vec<DataSiteId>,
    },
    ApplyOps,
    Execute(Vec<Operation>),
}

/// Reply sent from the worker back to the driver side.
#[derive(Debug, Clone)]
pub enum EngineReply {
    Measured(bool),
    Ops(Vec<Operation>),
    Executed,
    Failed(String),
}

/// Handle that forwards engine calls to the worker thread.
pub struct RemoteEngine {
    tx: Sender<EngineRequest>,
    rx: Receiver<EngineReply>,
}

impl RemoteEngine {
    fn call(&mut self, request: EngineRequest) -> Result<EngineReply, RemoteError> {
        self.tx
            .send(request)
            .map_err(|_| RemoteError::Disconnected)?;
        match self.rx.recv().map_err(|_| RemoteError::Disconnected)? {
            EngineReply::Failed(message) => Err(RemoteError::Engine(message)),
            reply => Ok(reply),
        }
    }
}

impl MeasurementEngine for RemoteEngine {
    type Error = RemoteError;

    fn measure(&mut self, request: &SyndromeRequest<'_>) -> Result<bool, RemoteError> {
        match self.call(EngineRequest::Measure {
            index: request.index,
            round: request.round,
            site: request.site,
            kind: request.kind,
            data: request.data.to_vec(),
        })? {
            EngineReply::Measured(bit) => Ok(bit),
            _ => Err(RemoteError::UnexpectedReply),
        }
    }

    fn apply_ops(&mut self) -> Result<Vec<Operation>, RemoteError> {
        match self.call(EngineRequest::ApplyOps)? {
            EngineReply::Ops(ops) => Ok(ops),
            _ => Err(RemoteError::UnexpectedReply),
        }
    }

    fn execute(&mut self, ops: &[Operation]) -> Result<(), RemoteError> {
        match self.call(EngineRequest::Execute(ops.to_vec()))? {
            EngineReply::Executed => Ok(()),
            _ => Err(RemoteError::UnexpectedReply),
        }
    }
}

fn serve<E: MeasurementEngine>(engine: &mut E, request: EngineRequest) -> EngineReply {
    let reply = match request {
        EngineRequest::Measure {
            index,
            round,
            site,
            kind,
            data,
        } => {
            let request = SyndromeRequest {
                index,
                round,
                site,
                kind,
                data: &data,
            };
            engine.measure(&request).map(EngineReply::Measured)
        }
        EngineRequest::ApplyOps => engine.apply_ops().map(EngineReply::Ops),
        EngineRequest::Execute(ops) => engine.execute(&ops).map(|_| EngineReply::Executed),
    };
    reply.unwrap_or_else(|e| EngineReply::Failed(e.to_string()))
}

/// Background thread owning an engine.
pub struct EngineWorker<E> {
    remote: RemoteEngine,
    thread: JoinHandle<E>,
}

impl<E> EngineWorker<E>
where
    E: MeasurementEngine + Send + 'static,
{
    /// Spawn the worker thread and move `engine` onto it.
    pub fn spawn(engine: E) -> Self {
        let (req_tx, req_rx) = crossbeam_channel::unbounded::<EngineRequest>();
        let (resp_tx, resp_rx) = crossbeam_channel::unbounded::<EngineReply>();

        let thread = thread::spawn(move || {
            let mut engine = engine;
            while let Ok(req) = req_rx.recv() {
                if resp_tx.send(serve(&mut engine, req)).is_err() {
                    break;
                }
            }
            debug!("engine worker shutting down");
            engine
        });

        EngineWorker {
            remote: RemoteEngine {
                tx: req_tx,
                rx: resp_rx,
            },
            thread,
        }
    }

    /// Handle to pass to the round driver.
    pub fn engine(&mut self) -> &mut RemoteEngine {
        &mut self.remote
    }

    /// Close the channel and take the engine back. `None` if the worker panicked.
    pub fn shutdown(self) -> Option<E> {
        let EngineWorker { remote, thread } = self;
        drop(remote);
        thread.join().ok()
    }
}
