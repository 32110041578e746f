//! Redis backends for the drover storage contracts.
//!
//! The work queue is a Redis list: `LRANGE 0 max-1` for the ranged
//! read, `LTRIM count -1` for the head trim. `LTRIM` drops a prefix by
//! index, so entries appended between the read and the trim land after
//! the trimmed prefix and survive — the ordering guarantee the
//! dispatch loop relies on.
//!
//! Connections are acquired lazily and dropped on any transport
//! failure, so the next call reconnects instead of wedging on a dead
//! socket. The loop's idle backoff provides the retry cadence.

use drover_core::prelude::{RawEntry, ResultRecord, ResultStore, TransportError, WorkQueue};
use redis::Commands;

fn transport(err: redis::RedisError) -> TransportError {
    TransportError(err.into())
}

/// A FIFO work queue stored as a Redis list under a fixed key.
pub struct RedisWorkQueue {
    client: redis::Client,
    conn: Option<redis::Connection>,
    key: String,
}

impl RedisWorkQueue {
    /// Create a queue client for `key` at `url`. No connection is made
    /// until the first call.
    pub fn open(url: &str, key: impl Into<String>) -> Result<Self, TransportError> {
        let client = redis::Client::open(url).map_err(transport)?;

        Ok(Self {
            client,
            conn: None,
            key: key.into(),
        })
    }

    fn connection(&mut self) -> Result<&mut redis::Connection, TransportError> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => self.client.get_connection().map_err(transport)?,
        };

        Ok(self.conn.insert(conn))
    }
}

impl WorkQueue for RedisWorkQueue {
    fn read_range(&mut self, max: usize) -> Result<Vec<RawEntry>, TransportError> {
        if max == 0 {
            return Ok(vec![]);
        }

        let key = self.key.clone();
        let conn = self.connection()?;

        match conn.lrange(&key, 0, max as isize - 1) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                self.conn = None;
                Err(transport(err))
            }
        }
    }

    fn trim_head(&mut self, count: usize) -> Result<(), TransportError> {
        if count == 0 {
            return Ok(());
        }

        let key = self.key.clone();
        let conn = self.connection()?;

        let trimmed: Result<(), _> = conn.ltrim(&key, count as isize, -1);
        match trimmed {
            Ok(()) => Ok(()),
            Err(err) => {
                self.conn = None;
                Err(transport(err))
            }
        }
    }
}

/// A last-write-wins result store: one Redis string per request id,
/// holding the JSON of the [`ResultRecord`].
pub struct RedisResultStore {
    client: redis::Client,
    conn: Option<redis::Connection>,
}

impl RedisResultStore {
    pub fn open(url: &str) -> Result<Self, TransportError> {
        let client = redis::Client::open(url).map_err(transport)?;

        Ok(Self { client, conn: None })
    }

    fn connection(&mut self) -> Result<&mut redis::Connection, TransportError> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => self.client.get_connection().map_err(transport)?,
        };

        Ok(self.conn.insert(conn))
    }
}

impl ResultStore for RedisResultStore {
    fn put(&mut self, id: &str, record: &ResultRecord) -> Result<(), TransportError> {
        let json = serde_json::to_string(record).map_err(|err| TransportError(err.into()))?;

        let conn = self.connection()?;
        let written: Result<(), _> = conn.set(id, json);
        match written {
            Ok(()) => Ok(()),
            Err(err) => {
                self.conn = None;
                Err(transport(err))
            }
        }
    }
}
