//! Call detail and channel event record loggers.

use crate::config::RecordSinkSettings;
use crate::error::CoreResult;
use crate::translate::PARTITION_FIELD;
use bson::oid::ObjectId;
use bson::{doc, DateTime, Document};
use rtconf_store::{ClientPool, PooledClient};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

/// A record that is stored as one document with a fixed field order.
pub trait ToDocument {
    /// Builds the document, appending the partition field when given.
    fn to_document(&self, partition: Option<ObjectId>) -> Document;
}

fn with_partition(mut document: Document, partition: Option<ObjectId>) -> Document {
    if let Some(partition) = partition {
        document.insert(PARTITION_FIELD, partition);
    }
    document
}

/// One call detail record.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct CdrRecord {
    pub clid: String,
    pub src: String,
    pub dst: String,
    pub dcontext: String,
    pub channel: String,
    pub dstchannel: String,
    pub lastapp: String,
    pub lastdata: String,
    pub disposition: String,
    pub amaflags: String,
    pub accountcode: String,
    pub uniqueid: String,
    pub userfield: String,
    pub peeraccount: String,
    pub linkedid: String,
    pub duration: i32,
    pub billsec: i32,
    pub sequence: i32,
    pub start: DateTime,
    pub answer: DateTime,
    pub end: DateTime,
}

impl ToDocument for CdrRecord {
    fn to_document(&self, partition: Option<ObjectId>) -> Document {
        with_partition(
            doc! {
                "clid": self.clid.as_str(),
                "src": self.src.as_str(),
                "dst": self.dst.as_str(),
                "dcontext": self.dcontext.as_str(),
                "channel": self.channel.as_str(),
                "dstchannel": self.dstchannel.as_str(),
                "lastapp": self.lastapp.as_str(),
                "lastdata": self.lastdata.as_str(),
                "disposition": self.disposition.as_str(),
                "amaflags": self.amaflags.as_str(),
                "accountcode": self.accountcode.as_str(),
                "uniqueid": self.uniqueid.as_str(),
                "userfield": self.userfield.as_str(),
                "peeraccount": self.peeraccount.as_str(),
                "linkedid": self.linkedid.as_str(),
                "duration": self.duration,
                "billsec": self.billsec,
                "sequence": self.sequence,
                "start": self.start,
                "answer": self.answer,
                "end": self.end,
            },
            partition,
        )
    }
}

/// One channel event record.
#[derive(Debug, Clone, PartialEq)]
pub struct CelRecord {
    /// Numeric event type.
    pub event_type: i32,
    /// Name of the event type.
    pub event_name: String,
    /// Name given to a user-defined event; replaces `event_name` when set.
    pub user_defined_name: Option<String>,
    /// Caller ID name.
    pub cid_name: String,
    /// Caller ID number.
    pub cid_num: String,
    /// Caller ANI.
    pub cid_ani: String,
    /// Caller RDNIS.
    pub cid_rdnis: String,
    /// Caller DNID.
    pub cid_dnid: String,
    /// Dialplan extension.
    pub exten: String,
    /// Dialplan context.
    pub context: String,
    /// Channel name.
    pub channame: String,
    /// Application name.
    pub appname: String,
    /// Application data.
    pub appdata: String,
    /// Account code.
    pub accountcode: String,
    /// Peer account code.
    pub peeraccount: String,
    /// Channel unique ID.
    pub uniqueid: String,
    /// Linked ID.
    pub linkedid: String,
    /// User field.
    pub userfield: String,
    /// Bridged peer.
    pub peer: String,
    /// Extra event data.
    pub extra: String,
    /// When the event happened.
    pub eventtime: DateTime,
}

impl CelRecord {
    /// The name stored in `eventname`.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.user_defined_name
            .as_deref()
            .unwrap_or(&self.event_name)
    }
}

impl ToDocument for CelRecord {
    fn to_document(&self, partition: Option<ObjectId>) -> Document {
        with_partition(
            doc! {
                "eventtype": self.event_type,
                "eventname": self.display_name(),
                "cid_name": self.cid_name.as_str(),
                "cid_num": self.cid_num.as_str(),
                "cid_ani": self.cid_ani.as_str(),
                "cid_rdnis": self.cid_rdnis.as_str(),
                "cid_dnid": self.cid_dnid.as_str(),
                "exten": self.exten.as_str(),
                "context": self.context.as_str(),
                "channame": self.channame.as_str(),
                "appname": self.appname.as_str(),
                "appdata": self.appdata.as_str(),
                "accountcode": self.accountcode.as_str(),
                "peeraccount": self.peeraccount.as_str(),
                "uniqueid": self.uniqueid.as_str(),
                "linkedid": self.linkedid.as_str(),
                "userfield": self.userfield.as_str(),
                "peer": self.peer.as_str(),
                "extra": self.extra.as_str(),
                "eventtime": self.eventtime,
            },
            partition,
        )
    }
}

/// Writes records to the configured collection, one insert per record.
pub struct RecordLogger {
    pool: Arc<dyn ClientPool>,
    settings: RecordSinkSettings,
}

impl RecordLogger {
    /// Creates a logger writing through `pool`.
    pub fn new(pool: Arc<dyn ClientPool>, settings: RecordSinkSettings) -> Self {
        Self { pool, settings }
    }

    /// The sink settings.
    #[must_use]
    pub fn settings(&self) -> &RecordSinkSettings {
        &self.settings
    }

    /// Inserts one record.
    ///
    /// # Errors
    ///
    /// Returns an error if no client is available or the insert fails; the
    /// failure is also logged.
    pub fn log<R: ToDocument>(&self, record: &R) -> CoreResult<()> {
        let document = record.to_document(self.settings.partition);
        let result = self.insert(document);
        if let Err(err) = &result {
            error!(
                database = %self.settings.database,
                collection = %self.settings.collection,
                error = %err,
                "record not stored"
            );
        }
        result
    }

    fn insert(&self, document: Document) -> CoreResult<()> {
        let client = PooledClient::borrow(&*self.pool)?;
        let collection = client.collection(&self.settings.database, &self.settings.collection)?;
        debug!(document = %document, "record");
        collection.insert_one(document)?;
        Ok(())
    }
}

impl fmt::Debug for RecordLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordLogger")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
