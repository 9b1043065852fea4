use diesel::SqliteConnection;
use log::error;
use std::any::Any;
use tokio::sync::{mpsc, oneshot};

use super::DbPool;
use crate::errors::StorageError;
use tallyfolio_core::errors::{DatabaseError, Error, Result};

type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;
type AnyBox = Box<dyn Any + Send + 'static>;
type Envelope = (Job<AnyBox>, oneshot::Sender<Result<AnyBox>>);

/// Handle for sending write jobs to the single writer task.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<Envelope>,
}

impl WriteHandle {
    /// Runs `job` on the writer's dedicated connection inside an immediate
    /// transaction and returns its result.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |c| job(c).map(|v| Box::new(v) as AnyBox)),
                ret_tx,
            ))
            .await
            .map_err(|_| writer_gone("the writer task has stopped"))?;

        let boxed = ret_rx
            .await
            .map_err(|_| writer_gone("the writer task dropped the reply"))??;
        boxed
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| writer_gone("unexpected result type from the writer task"))
    }
}

fn writer_gone(message: &str) -> Error {
    Error::Database(DatabaseError::Internal(message.to_string()))
}

/// Spawns the background task that owns one pooled connection and applies
/// write jobs serially. SQLite allows a single writer; funnelling every write
/// through here avoids `SQLITE_BUSY` between pool connections.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) = mpsc::channel::<Envelope>(1024);

    tokio::spawn(async move {
        let mut conn = match pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                error!("Writer task could not acquire a connection: {}", e);
                let message = e.to_string();
                while let Some((_, reply_tx)) = rx.recv().await {
                    let _ = reply_tx.send(Err(Error::Database(DatabaseError::ConnectionFailed(
                        message.clone(),
                    ))));
                }
                return;
            }
        };

        while let Some((job, reply_tx)) = rx.recv().await {
            let result: Result<AnyBox> = conn
                .immediate_transaction::<_, StorageError, _>(|c| job(c).map_err(StorageError::from))
                .map_err(Error::from);

            // The requester may have gone away; nothing to do then.
            let _ = reply_tx.send(result);
        }
    });

    WriteHandle { tx }
}
