// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use crate::ids::RecordId;
use crate::model::Record;
use crate::notice::SyncOp;
use crate::session::Session;

/// The backend a controller mirrors.
///
/// Calls block; the controller only ever makes them from its sync worker.
pub trait RemoteSource: Send + Sync {
    fn fetch_all(&self, session: &Session) -> Result<Vec<Record>>;
    fn create(&self, session: &Session, record: &Record) -> Result<()>;
    fn update(&self, session: &Session, record: &Record) -> Result<()>;
    fn delete(&self, session: &Session, id: &RecordId) -> Result<()>;
}

#[derive(Debug, Clone)]
pub(crate) enum SyncJob {
    Load,
    Create { record: Record },
    Update { record: Record },
    Delete { id: RecordId },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Loaded(Result<Vec<Record>, String>),
    Synced {
        op: SyncOp,
        id: RecordId,
        result: Result<(), String>,
    },
}

/// One background thread per controller, fed in FIFO order.
///
/// Dropping the worker closes the job queue. A job already running finishes
/// and its outcome is discarded.
pub struct SyncWorker {
    jobs: Sender<SyncJob>,
    outcomes: Receiver<SyncOutcome>,
    in_flight: usize,
}

impl SyncWorker {
    pub fn spawn(source: Arc<dyn RemoteSource>, session: Session) -> Result<Self> {
        let (jobs, job_rx) = mpsc::channel::<SyncJob>();
        let (outcome_tx, outcomes) = mpsc::channel();

        thread::Builder::new()
            .name("procdesk-sync".to_owned())
            .spawn(move || {
                for job in job_rx {
                    let outcome = run_job(source.as_ref(), &session, job);
                    if outcome_tx.send(outcome).is_err() {
                        debug!("controller gone; dropping sync outcome");
                    }
                }
            })
            .context("spawn sync worker thread")?;

        Ok(Self {
            jobs,
            outcomes,
            in_flight: 0,
        })
    }

    pub(crate) fn submit(&mut self, job: SyncJob) -> Result<()> {
        self.jobs
            .send(job)
            .map_err(|_| anyhow::anyhow!("sync worker stopped"))?;
        self.in_flight += 1;
        Ok(())
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn try_next(&mut self) -> Option<SyncOutcome> {
        let outcome = self.outcomes.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(outcome)
    }

    pub fn next_timeout(&mut self, timeout: Duration) -> Option<SyncOutcome> {
        match self.outcomes.recv_timeout(timeout) {
            Ok(outcome) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(outcome)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                warn!("sync worker exited with {} jobs in flight", self.in_flight);
                self.in_flight = 0;
                None
            }
        }
    }
}

fn run_job(source: &dyn RemoteSource, session: &Session, job: SyncJob) -> SyncOutcome {
    match job {
        SyncJob::Load => SyncOutcome::Loaded(source.fetch_all(session).map_err(flatten)),
        SyncJob::Create { record } => SyncOutcome::Synced {
            op: SyncOp::Create,
            result: source.create(session, &record).map_err(flatten),
            id: record.id,
        },
        SyncJob::Update { record } => SyncOutcome::Synced {
            op: SyncOp::Update,
            result: source.update(session, &record).map_err(flatten),
            id: record.id,
        },
        SyncJob::Delete { id } => {
            let result = source.delete(session, &id).map_err(flatten);
            SyncOutcome::Synced {
                op: SyncOp::Delete,
                id,
                result,
            }
        }
    }
}

fn flatten(error: anyhow::Error) -> String {
    format!("{error:#}")
}
