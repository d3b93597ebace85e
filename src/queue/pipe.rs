//! Pipes pair an inbound and an outbound queue set under one id; the pipe
//! table owns every open pipe.

use tracing::debug;

use crate::protocol::{Error, MessageBuffer, Result};

use super::{Envelope, PipeConfig, QueueSet, Rejected};

/// Largest pipe id.
pub const PIPE_ID_MAX: u16 = 0xFFF;

/// Who a pipe serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipeKind {
    /// Control traffic of the node itself
    System,
    /// Application traffic
    User,
}

/// Inbound and outbound queue sets addressed by one id.
#[derive(Debug)]
pub struct Pipe {
    id: u16,
    kind: PipeKind,
    rx: QueueSet,
    tx: QueueSet,
}

impl Pipe {
    fn new(id: u16, kind: PipeKind, config: &PipeConfig) -> Result<Self> {
        Ok(Self {
            id,
            kind,
            rx: QueueSet::with_config(&config.rx)?,
            tx: QueueSet::with_config(&config.tx)?,
        })
    }

    /// Pipe id
    #[must_use]
    pub const fn id(&self) -> u16 {
        self.id
    }

    /// Pipe kind
    #[must_use]
    pub const fn kind(&self) -> PipeKind {
        self.kind
    }

    /// Inbound queues
    #[must_use]
    pub const fn rx(&self) -> &QueueSet {
        &self.rx
    }

    /// Outbound queues
    #[must_use]
    pub const fn tx(&self) -> &QueueSet {
        &self.tx
    }

    /// Dispatch a received envelope into the inbound queues.
    pub fn submit(&mut self, envelope: Envelope) -> std::result::Result<usize, Rejected<Envelope>> {
        self.rx.dispatch(envelope)
    }

    /// Take the head of inbound queue `index`.
    pub fn receive(&mut self, index: usize) -> Result<Envelope> {
        self.rx.take(index)
    }

    /// Dispatch an envelope into the outbound queues.
    pub fn send(&mut self, envelope: Envelope) -> std::result::Result<usize, Rejected<Envelope>> {
        self.tx.dispatch(envelope)
    }

    /// Take the head of outbound queue `index`.
    pub fn transmit(&mut self, index: usize) -> Result<Envelope> {
        self.tx.take(index)
    }

    /// Destroy both queue sets, inbound buffers first.
    pub fn destroy(self) -> Vec<MessageBuffer> {
        let mut buffers = self.rx.destroy();
        buffers.extend(self.tx.destroy());
        buffers
    }
}

/// Every open pipe, in ascending id order.
#[derive(Debug, Default)]
pub struct PipeTable {
    pipes: Vec<Pipe>,
}

impl PipeTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a pipe and return its id.
    ///
    /// The id is one past the most recently opened pipe still in the table,
    /// or 0 for an empty table. Fails [`Error::OutOfRange`] past
    /// [`PIPE_ID_MAX`].
    pub fn open(&mut self, kind: PipeKind, config: &PipeConfig) -> Result<u16> {
        let id = self.pipes.last().map_or(0, |pipe| u32::from(pipe.id) + 1);
        if id > u32::from(PIPE_ID_MAX) {
            return Err(Error::out_of_range(
                "pipe id",
                u64::from(id),
                u64::from(PIPE_ID_MAX),
            ));
        }
        #[allow(clippy::cast_possible_truncation)]
        let id = id as u16;

        self.pipes.push(Pipe::new(id, kind, config)?);
        debug!(pipe = id, ?kind, open = self.pipes.len(), "pipe opened");
        Ok(id)
    }

    /// Pipe with `id`.
    #[must_use]
    pub fn get(&self, id: u16) -> Option<&Pipe> {
        self.position(id).map(|index| &self.pipes[index])
    }

    /// Mutable pipe with `id`.
    pub fn get_mut(&mut self, id: u16) -> Option<&mut Pipe> {
        self.position(id).map(|index| &mut self.pipes[index])
    }

    /// Remove and return the pipe with `id`.
    pub fn close(&mut self, id: u16) -> Result<Pipe> {
        let index = self.position(id).ok_or(Error::not_found("pipe"))?;
        let pipe = self.pipes.remove(index);
        debug!(pipe = id, open = self.pipes.len(), "pipe closed");
        Ok(pipe)
    }

    /// Close every pipe and return their buffers.
    pub fn clear(&mut self) -> Vec<MessageBuffer> {
        let closed = self.pipes.len();
        let buffers = self.pipes.drain(..).flat_map(Pipe::destroy).collect();
        debug!(closed, "pipe table cleared");
        buffers
    }

    /// Number of open pipes
    #[must_use]
    pub fn len(&self) -> usize {
        self.pipes.len()
    }

    /// Whether no pipe is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pipes.is_empty()
    }

    /// Iterate pipes in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Pipe> {
        self.pipes.iter()
    }

    fn position(&self, id: u16) -> Option<usize> {
        self.pipes.binary_search_by_key(&id, Pipe::id).ok()
    }
}
