//! End-to-end wiring: a [`ConnectionManager`] feeds raw bytes in,
//! decoded [`Record`]s come out on a bounded channel.

use std::sync::Arc;

use tokio::sync::mpsc;

use han_client::{ConnectionFactory, ConnectionManager, HdlcContentAssembler, ModeDAssembler, RawApduAssembler};
use han_cosem::{AutoDecoder, Record, RecordValue};
use han_session::hdlc::HdlcReader;
use han_session::mode_d::{decode_p1_readout, FieldValue, ModeDReader};

const DEFAULT_QUEUE_CAPACITY: usize = 64;

fn field_value_to_record_value(value: FieldValue) -> RecordValue {
    match value {
        FieldValue::Text(s) => RecordValue::Text(s),
        FieldValue::Integer(n) => RecordValue::Integer(n),
        FieldValue::Float(f) => RecordValue::Float(f),
        FieldValue::Timestamp(t) => RecordValue::Timestamp(t),
    }
}

/// Run an HDLC-framed pipeline (Aidon/Kaifa/Kamstrup over an M-Bus/HDLC
/// HAN port): connect, validate frames, auto-decode their content, and
/// push the resulting records to a channel.
///
/// Returns the receiving end of the record channel and a handle that
/// stops the pipeline when dropped or closed.
pub fn spawn_hdlc_pipeline(
    factory: Arc<dyn ConnectionFactory>,
) -> (mpsc::Receiver<Record>, han_client::ConnectionCloser) {
    let (frame_tx, mut frame_rx) = mpsc::channel(DEFAULT_QUEUE_CAPACITY);
    let (record_tx, record_rx) = mpsc::channel(DEFAULT_QUEUE_CAPACITY);

    let mut manager = ConnectionManager::new(
        factory,
        || HdlcContentAssembler::new(HdlcReader::new(false, true)),
        frame_tx,
    );
    let closer = manager.closer();

    tokio::spawn(async move { manager.run().await });

    tokio::spawn(async move {
        let mut decoder = AutoDecoder::new();
        while let Some(content) = frame_rx.recv().await {
            let decoded = decoder.decode_frame_content(&content);
            if let Some((_, record)) = decoded {
                if record_tx.send(record).await.is_err() {
                    break;
                }
            } else {
                log::debug!("no decoder recognized the frame content");
            }
        }
    });

    (record_rx, closer)
}

/// Run a pipeline for meters that deliver one bare DLMS APDU per read,
/// with no HDLC flag/FCS framing to strip: connect, auto-decode each
/// chunk as a complete notification, and push the resulting records to
/// a channel.
pub fn spawn_raw_apdu_pipeline(
    factory: Arc<dyn ConnectionFactory>,
) -> (mpsc::Receiver<Record>, han_client::ConnectionCloser) {
    let (apdu_tx, mut apdu_rx) = mpsc::channel(DEFAULT_QUEUE_CAPACITY);
    let (record_tx, record_rx) = mpsc::channel(DEFAULT_QUEUE_CAPACITY);

    let mut manager = ConnectionManager::new(factory, RawApduAssembler::new, apdu_tx);
    let closer = manager.closer();

    tokio::spawn(async move { manager.run().await });

    tokio::spawn(async move {
        let mut decoder = AutoDecoder::new();
        while let Some(content) = apdu_rx.recv().await {
            let decoded = decoder.decode_frame_content(&content);
            if let Some((_, record)) = decoded {
                if record_tx.send(record).await.is_err() {
                    break;
                }
            } else {
                log::debug!("no decoder recognized the apdu content");
            }
        }
    });

    (record_rx, closer)
}

/// Run a P1/Mode D ASCII pipeline: connect, assemble whole readouts,
/// decode each into a record, and push it to a channel.
pub fn spawn_p1_pipeline(
    factory: Arc<dyn ConnectionFactory>,
) -> (mpsc::Receiver<Record>, han_client::ConnectionCloser) {
    let (readout_tx, mut readout_rx) = mpsc::channel(DEFAULT_QUEUE_CAPACITY);
    let (record_tx, record_rx) = mpsc::channel(DEFAULT_QUEUE_CAPACITY);

    let mut manager = ConnectionManager::new(factory, || ModeDAssembler::new(ModeDReader::new()), readout_tx);
    let closer = manager.closer();

    tokio::spawn(async move { manager.run().await });

    tokio::spawn(async move {
        while let Some(readout) = readout_rx.recv().await {
            match decode_p1_readout(&readout) {
                Ok(fields) => {
                    let record: Record = fields
                        .into_iter()
                        .map(|(name, value)| (name, field_value_to_record_value(value)))
                        .collect();
                    if record_tx.send(record).await.is_err() {
                        break;
                    }
                }
                Err(e) => log::warn!("failed to decode P1 readout: {}", e),
            }
        }
    });

    (record_rx, closer)
}
