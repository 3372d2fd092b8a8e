//! PST mailbox reading using the outlook-pst crate
//!
//! Native Rust parsing of the MS-PST format, no libpff/readpst required.
//! Both Unicode (Outlook 2003+) and ANSI (Outlook 97-2002) files are read
//! through the `dyn Store` API. The store, folders and messages are reference
//! counted handles over the open file; they are all dropped when
//! [`PstReader::read`] returns, which closes the file on every exit path.

use super::walk::{walk_folder, FieldValue, MailFolder, MailMessage, MessageField};
use crate::context::RunContext;
use crate::email::NativeRecord;
use crate::error::{IngestError, Result};
use log::debug;
use outlook_pst::ltp::prop_context::PropertyValue;
use outlook_pst::messaging::folder::Folder;
use outlook_pst::messaging::message::Message;
use outlook_pst::messaging::store::{AnsiStore, EntryId, Store, UnicodeStore};
use outlook_pst::ndb::node_id::{NodeId, NID_ROOT_FOLDER};
use outlook_pst::{AnsiPstFile, UnicodePstFile};
use std::path::Path;
use std::rc::Rc;

// MAPI Property IDs
// See: https://learn.microsoft.com/en-us/openspecs/exchange_server_protocols/ms-oxprops/
const PR_SUBJECT: u16 = 0x0037;
const PR_TRANSPORT_MESSAGE_HEADERS: u16 = 0x007D;
const PR_SENDER_NAME: u16 = 0x0C1A;
const PR_MESSAGE_DELIVERY_TIME: u16 = 0x0E06;
const PR_BODY: u16 = 0x1000;
const PR_RTF_COMPRESSED: u16 = 0x1009;

/// Reads every message of a PST file by walking its folder hierarchy
#[derive(Debug, Default, Clone, Copy)]
pub struct PstReader;

impl PstReader {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Open `pst_path` and extract one native record per readable message,
    /// starting at the store's root folder
    ///
    /// # Errors
    /// Returns an error only when the container itself cannot be opened.
    /// Message and folder failures are recorded in `ctx`.
    pub fn read(&self, pst_path: &Path, ctx: &mut RunContext) -> Result<Vec<NativeRecord>> {
        debug!("Opening PST file: {}", pst_path.display());

        let store = open_store(pst_path)?;

        if let Ok(name) = store.properties().display_name() {
            debug!("PST store: {name}");
        }

        let root_entry_id = store
            .properties()
            .make_entry_id(NID_ROOT_FOLDER)
            .map_err(|e| IngestError::Pst(format!("Failed to get root folder: {e}")))?;

        let root_folder = store
            .open_folder(&root_entry_id)
            .map_err(|e| IngestError::Pst(format!("Failed to read root folder: {e}")))?;

        let root = PstFolder::new(Rc::clone(&store), root_folder);
        let mut records = Vec::new();
        walk_folder(&root, &pst_path.display().to_string(), ctx, &mut records);

        debug!(
            "Extracted {} messages from {}",
            records.len(),
            pst_path.display()
        );

        Ok(records)
    }
}

/// Open a Unicode PST, falling back to the ANSI format
fn open_store(pst_path: &Path) -> Result<Rc<dyn Store>> {
    let unicode_err = match UnicodePstFile::open(pst_path) {
        Ok(pst) => {
            let store: Rc<dyn Store> = UnicodeStore::read(Rc::new(pst))
                .map_err(|e| IngestError::Pst(format!("Failed to read PST store: {e}")))?;
            return Ok(store);
        }
        Err(e) => e,
    };

    debug!(
        "{} is not a Unicode PST ({unicode_err}), trying ANSI",
        pst_path.display()
    );

    let pst = AnsiPstFile::open(pst_path)
        .map_err(|e| IngestError::Pst(format!("Failed to open PST file: {unicode_err}; as ANSI: {e}")))?;
    let store: Rc<dyn Store> = AnsiStore::read(Rc::new(pst))
        .map_err(|e| IngestError::Pst(format!("Failed to read ANSI PST store: {e}")))?;
    Ok(store)
}

/// One PST folder with its contents and hierarchy table row ids resolved up front
pub struct PstFolder {
    store: Rc<dyn Store>,
    folder: Rc<dyn Folder>,
    message_rows: Vec<u32>,
    subfolder_rows: Vec<u32>,
}

impl PstFolder {
    fn new(store: Rc<dyn Store>, folder: Rc<dyn Folder>) -> Self {
        let message_rows = folder
            .contents_table()
            .map(|table| {
                table
                    .rows_matrix()
                    .map(|row| -> u32 { row.id().into() })
                    .collect()
            })
            .unwrap_or_default();

        let subfolder_rows = folder
            .hierarchy_table()
            .map(|table| {
                table
                    .rows_matrix()
                    .map(|row| -> u32 { row.id().into() })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            store,
            folder,
            message_rows,
            subfolder_rows,
        }
    }

    /// Table row ids are complete node ids, type bits included
    fn entry_id(&self, rows: &[u32], index: usize) -> Result<EntryId> {
        let row_id = rows
            .get(index)
            .copied()
            .ok_or_else(|| IngestError::Pst(format!("Row {index} out of range")))?;

        self.store
            .properties()
            .make_entry_id(NodeId::from(row_id))
            .map_err(|_| IngestError::Pst(format!("Invalid entry id for row {row_id:#x}")))
    }
}

impl MailFolder for PstFolder {
    type Message = PstMessage;

    fn display_name(&self) -> Option<String> {
        self.folder.properties().display_name().ok()
    }

    fn message_count(&self) -> usize {
        self.message_rows.len()
    }

    fn message(&self, index: usize) -> Result<PstMessage> {
        let entry_id = self.entry_id(&self.message_rows, index)?;
        let message = self
            .store
            .open_message(&entry_id, None)
            .map_err(|e| IngestError::Pst(format!("Failed to read message: {e}")))?;
        Ok(PstMessage { message })
    }

    fn subfolder_count(&self) -> usize {
        self.subfolder_rows.len()
    }

    fn subfolder(&self, index: usize) -> Result<Self> {
        let entry_id = self.entry_id(&self.subfolder_rows, index)?;
        let folder = self
            .store
            .open_folder(&entry_id)
            .map_err(|e| IngestError::Pst(format!("Failed to read folder: {e}")))?;
        Ok(Self::new(Rc::clone(&self.store), folder))
    }
}

/// One PST message
pub struct PstMessage {
    message: Rc<dyn Message>,
}

impl MailMessage for PstMessage {
    fn read_field(&self, field: MessageField) -> Option<FieldValue> {
        let properties = self.message.properties();
        match field {
            MessageField::Subject => property_value(properties.get(PR_SUBJECT)),
            MessageField::SenderName => property_value(properties.get(PR_SENDER_NAME)),
            MessageField::TransportHeaders => {
                property_value(properties.get(PR_TRANSPORT_MESSAGE_HEADERS))
            }
            MessageField::PlainBody => property_value(properties.get(PR_BODY)),
            MessageField::RichBody => match properties.get(PR_RTF_COMPRESSED) {
                Some(PropertyValue::Binary(b)) => decompress_rtf_body(b.buffer()),
                _ => None,
            },
            MessageField::DeliveryTime => {
                property_value(properties.get(PR_MESSAGE_DELIVERY_TIME))
            }
        }
    }
}

/// Map the property types we care about onto [`FieldValue`]
fn property_value(value: Option<&PropertyValue>) -> Option<FieldValue> {
    match value {
        Some(PropertyValue::String8(s)) => Some(FieldValue::Text(s.to_string())),
        Some(PropertyValue::Unicode(s)) => Some(FieldValue::Text(s.to_string())),
        Some(PropertyValue::Binary(b)) => Some(FieldValue::Bytes(b.buffer().to_vec())),
        Some(PropertyValue::Time(ticks)) => Some(FieldValue::FileTime(*ticks)),
        _ => None,
    }
}

/// Expand an MS-OXRTFCP (LZFu or uncompressed) `PR_RTF_COMPRESSED` payload
fn decompress_rtf_body(payload: &[u8]) -> Option<FieldValue> {
    match compressed_rtf::decompress_rtf(payload) {
        Ok(rtf) => Some(FieldValue::Text(rtf)),
        Err(_) => {
            debug!("Skipping undecodable compressed RTF body ({} bytes)", payload.len());
            None
        }
    }
}
