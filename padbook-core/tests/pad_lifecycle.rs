#![allow(missing_docs)]
use padbook_core::ids::{STREAM_LEN, TAG_LEN};
use padbook_core::lock::LOCK_FILE_NAME;
use padbook_core::{
    Artifact, Batch, BatchId, BatchLock, Component, Decoder, Encoder, LockFile, NoLock, OtpError,
    PadGenerator, PadIndex, PadStore, SecureEraser,
};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn generated(store: &PadStore) -> Batch {
    let report = PadGenerator::with_os_entropy()
        .generate_batch(store)
        .expect("Failed to generate batch");
    store.batch(report.batch)
}

/// Copies a batch directory to a second store, as the out-of-band hand-off would.
fn copy_batch(batch: &Batch, to: &Path) -> PadStore {
    let peer = PadStore::open(to);
    let target = peer.batch(batch.id()).dir();
    fs::create_dir_all(&target).expect("Failed to create peer batch dir");
    for entry in fs::read_dir(batch.dir()).expect("Failed to read batch dir") {
        let entry = entry.expect("Failed to read entry");
        fs::copy(entry.path(), target.join(entry.file_name())).expect("Failed to copy pad file");
    }
    peer
}

fn index(value: u8) -> PadIndex {
    PadIndex::new(value).expect("index in range")
}

#[test]
fn test_round_trip_between_two_copies() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let sender = PadStore::open(temp_dir.path().join("alice"));
    let batch = generated(&sender);
    let receiver = copy_batch(&batch, &temp_dir.path().join("bob"));
    assert_eq!(
        sender.fingerprint(&batch).unwrap(),
        receiver.fingerprint(&receiver.batch(batch.id())).unwrap()
    );

    let encoder = Encoder::new(&sender, LockFile);
    let decoder = Decoder::new(&receiver, LockFile);
    for len in [1, 2, 17, 255, 1000, STREAM_LEN] {
        let plaintext: Vec<u8> = (0..len).map(|i| (i * 31 % 256) as u8).collect();
        let sent = encoder.encode(&batch, &plaintext).unwrap();
        sent.erasure.as_ref().unwrap();
        let bytes = sent.output.to_bytes();
        assert_eq!(bytes.len(), len + 2 * TAG_LEN);

        let received = decoder.decode(&receiver.batch(batch.id()), &bytes).unwrap();
        assert_eq!(received.pad, sent.pad);
        assert_eq!(received.into_result().unwrap(), plaintext);
    }
}

#[test]
fn test_every_byte_value_survives() {
    let temp_dir = tempdir().unwrap();
    let store = PadStore::open(temp_dir.path().join("alice"));
    let batch = generated(&store);
    let peer = copy_batch(&batch, &temp_dir.path().join("bob"));

    let plaintext: Vec<u8> = (0..=255).collect();
    let artifact = Encoder::new(&store, NoLock)
        .encode(&batch, &plaintext)
        .unwrap()
        .into_result()
        .unwrap();
    let recovered = Decoder::new(&peer, NoLock)
        .decode(&peer.batch(batch.id()), &artifact.to_bytes())
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(recovered, plaintext);
}

#[test]
fn test_artifact_framing_uses_the_pad_tags() {
    let temp_dir = tempdir().unwrap();
    let store = PadStore::open(temp_dir.path());
    let batch = generated(&store);
    let prefix = store.read_tag(&batch, index(0), Component::Prefix).unwrap();
    let suffix = store.read_tag(&batch, index(0), Component::Suffix).unwrap();
    let key = store
        .read_pad_component(&batch, index(0), Component::CipherStream, 3)
        .unwrap()
        .to_vec();

    let sent = Encoder::new(&store, NoLock).encode(&batch, b"abc").unwrap();
    let bytes = sent.output.to_bytes();
    assert_eq!(&bytes[..TAG_LEN], &prefix);
    assert_eq!(&bytes[bytes.len() - TAG_LEN..], &suffix);
    let expected: Vec<u8> = b"abc".iter().zip(&key).map(|(p, k)| p.wrapping_add(*k)).collect();
    assert_eq!(&bytes[TAG_LEN..TAG_LEN + 3], &expected[..]);
}

#[test]
fn test_batch_ids_are_monotonic() {
    let temp_dir = tempdir().unwrap();
    let store = PadStore::open(temp_dir.path().join("pads"));
    let mut generator = PadGenerator::with_os_entropy();

    let first = generator.generate_batch(&store).unwrap();
    let second = generator.generate_batch(&store).unwrap();
    assert_eq!(first.batch, BatchId::FIRST);
    assert!(second.batch > first.batch);
    assert_eq!(second.batch.to_string(), "0001");
    assert_eq!(first.pads_written, 100);
}

#[test]
fn test_pads_are_consumed_in_index_order() {
    let temp_dir = tempdir().unwrap();
    let store = PadStore::open(temp_dir.path());
    let batch = generated(&store);
    let encoder = Encoder::new(&store, NoLock);

    let first = encoder.encode(&batch, b"one").unwrap();
    let second = encoder.encode(&batch, b"two").unwrap();
    assert_eq!(first.pad.index, index(0));
    assert_eq!(second.pad.index, index(1));
    assert!(!batch.pad_path(index(0), Component::CipherStream).exists());
    assert!(batch.pad_path(index(0), Component::Prefix).exists());
    assert!(batch.pad_path(index(0), Component::Suffix).exists());
}

#[test]
fn test_batch_exhaustion() {
    let temp_dir = tempdir().unwrap();
    let store = PadStore::open(temp_dir.path());
    let batch = generated(&store);
    let encoder = Encoder::new(&store, LockFile);

    for _ in 0..100 {
        encoder.encode(&batch, b"x").unwrap().into_result().unwrap();
    }
    let err = encoder.encode(&batch, b"x").unwrap_err();
    assert!(matches!(err, OtpError::NoPadsAvailable { batch: b } if b == batch.id()));

    let status = store.status(&batch).unwrap();
    assert_eq!(status.available, 0);
    assert_eq!(status.consumed, 100);
    assert_eq!(store.first_batch_with_pads().unwrap(), None);
}

#[test]
fn test_missing_batch_has_no_pads() {
    let temp_dir = tempdir().unwrap();
    let store = PadStore::open(temp_dir.path());
    let ghost = store.batch(BatchId::new(12).unwrap());
    let err = Encoder::new(&store, LockFile).encode(&ghost, b"hi").unwrap_err();
    assert!(matches!(err, OtpError::NoPadsAvailable { .. }));
}

#[test]
fn test_message_length_limits() {
    let temp_dir = tempdir().unwrap();
    let store = PadStore::open(temp_dir.path());
    let batch = generated(&store);
    let encoder = Encoder::new(&store, NoLock);

    assert!(matches!(
        encoder.encode(&batch, b"").unwrap_err(),
        OtpError::InvalidMessageLength { len: 0, .. }
    ));
    let too_long = vec![0u8; STREAM_LEN + 1];
    assert!(matches!(
        encoder.encode(&batch, &too_long).unwrap_err(),
        OtpError::InvalidMessageLength { .. }
    ));
    // Rejected messages consume nothing.
    assert_eq!(store.list_available_pads(&batch).unwrap().len(), 100);
}

#[test]
fn test_suffix_tampering_is_detected() {
    let temp_dir = tempdir().unwrap();
    let store = PadStore::open(temp_dir.path().join("alice"));
    let batch = generated(&store);
    let peer = copy_batch(&batch, &temp_dir.path().join("bob"));
    let peer_batch = peer.batch(batch.id());

    let mut bytes = Encoder::new(&store, NoLock)
        .encode(&batch, b"attack at dawn")
        .unwrap()
        .into_result()
        .unwrap()
        .to_bytes();
    let genuine = bytes.clone();
    let last = bytes.len() - 1;
    for position in [last - TAG_LEN + 1, last] {
        bytes[position] ^= 0x01;
        let err = Decoder::new(&peer, LockFile).decode(&peer_batch, &bytes).unwrap_err();
        assert!(matches!(err, OtpError::SuffixMismatch { .. }));
        assert!(err.is_security_alert());
        bytes[position] ^= 0x01;
    }

    // The pad was not consumed by the failed attempts.
    assert!(peer_batch.pad_path(index(0), Component::CipherStream).exists());
    let recovered = Decoder::new(&peer, LockFile)
        .decode(&peer_batch, &genuine)
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(recovered, b"attack at dawn");
}

#[test]
fn test_unknown_prefix_is_pad_not_found() {
    let temp_dir = tempdir().unwrap();
    let store = PadStore::open(temp_dir.path());
    let batch = generated(&store);

    let stranger = Artifact::new([0xEE; TAG_LEN], vec![1, 2, 3], [0xDD; TAG_LEN]);
    let err = Decoder::new(&store, NoLock)
        .decode(&batch, &stranger.to_bytes())
        .unwrap_err();
    assert!(matches!(err, OtpError::PadNotFound { .. }));
    assert_eq!(store.list_available_pads(&batch).unwrap().len(), 100);
}

#[test]
fn test_replayed_artifact_is_refused() {
    let temp_dir = tempdir().unwrap();
    let store = PadStore::open(temp_dir.path().join("alice"));
    let batch = generated(&store);
    let peer = copy_batch(&batch, &temp_dir.path().join("bob"));
    let peer_batch = peer.batch(batch.id());

    let bytes = Encoder::new(&store, NoLock)
        .encode(&batch, b"only once")
        .unwrap()
        .into_result()
        .unwrap()
        .to_bytes();
    let decoder = Decoder::new(&peer, NoLock);
    decoder.decode(&peer_batch, &bytes).unwrap().into_result().unwrap();

    let err = decoder.decode(&peer_batch, &bytes).unwrap_err();
    assert!(matches!(
        err,
        OtpError::PadNotFound { .. } | OtpError::TruncatedPad { .. }
    ));
}

#[test]
fn test_short_cipher_stream_is_truncated_pad() {
    let temp_dir = tempdir().unwrap();
    let store = PadStore::open(temp_dir.path().join("alice"));
    let batch = generated(&store);
    let peer = copy_batch(&batch, &temp_dir.path().join("bob"));
    let peer_batch = peer.batch(batch.id());

    let bytes = Encoder::new(&store, NoLock)
        .encode(&batch, &[7u8; 100])
        .unwrap()
        .into_result()
        .unwrap()
        .to_bytes();
    let stream = peer_batch.pad_path(index(0), Component::CipherStream);
    let key = fs::read(&stream).unwrap();
    fs::write(&stream, &key[..40]).unwrap();

    let err = Decoder::new(&peer, NoLock).decode(&peer_batch, &bytes).unwrap_err();
    assert!(matches!(
        err,
        OtpError::TruncatedPad { needed: 100, available: 40, .. }
    ));
}

#[test]
fn test_malformed_artifact_is_rejected_before_scanning() {
    let temp_dir = tempdir().unwrap();
    let store = PadStore::open(temp_dir.path());
    // The batch does not even exist: length is checked first.
    let ghost = store.batch(BatchId::new(3).unwrap());
    let err = Decoder::new(&store, LockFile).decode(&ghost, &[0u8; 90]).unwrap_err();
    assert!(matches!(err, OtpError::MalformedArtifact { len: 90, .. }));

    let err = Decoder::new(&store, LockFile)
        .decode(&ghost, &[0u8; 2 * TAG_LEN])
        .unwrap_err();
    assert!(matches!(err, OtpError::MalformedArtifact { .. }));
}

#[test]
fn test_locate_finds_the_right_batch() {
    let temp_dir = tempdir().unwrap();
    let store = PadStore::open(temp_dir.path());
    let _older = generated(&store);
    let newer = generated(&store);

    let artifact = Encoder::new(&store, NoLock)
        .encode(&newer, b"which batch?")
        .unwrap()
        .output;
    let decoder = Decoder::new(&store, NoLock);
    assert_eq!(decoder.locate(&artifact).unwrap(), newer);

    let stranger = Artifact::new([0xEE; TAG_LEN], vec![1], [0xDD; TAG_LEN]);
    assert!(matches!(
        decoder.locate(&stranger).unwrap_err(),
        OtpError::PadNotFound { batch: None, .. }
    ));
}

#[test]
fn test_locate_skips_a_partially_written_batch() {
    let temp_dir = tempdir().unwrap();
    let store = PadStore::open(temp_dir.path());
    let interrupted = generated(&store);
    let complete = generated(&store);

    // An interrupted generation leaves the last prefix file short.
    let short_prefix = interrupted.pad_path(index(99), Component::Prefix);
    let tag = fs::read(&short_prefix).unwrap();
    fs::write(&short_prefix, &tag[..20]).unwrap();

    let artifact = Encoder::new(&store, NoLock)
        .encode(&complete, b"hi")
        .unwrap()
        .output;
    let decoder = Decoder::new(&store, NoLock);
    assert_eq!(decoder.locate(&artifact).unwrap(), complete);
    assert!(matches!(
        decoder.identify(&interrupted, &artifact).unwrap_err(),
        OtpError::PadNotFound { .. }
    ));

    let received = decoder.decode_artifact(&complete, &artifact).unwrap();
    assert_eq!(received.output, b"hi");
}

#[test]
fn test_locked_batch_is_refused() {
    let temp_dir = tempdir().unwrap();
    let store = PadStore::open(temp_dir.path());
    let batch = generated(&store);

    let held = LockFile.acquire(&batch.dir()).unwrap();
    let err = Encoder::new(&store, LockFile).encode(&batch, b"blocked").unwrap_err();
    assert!(matches!(err, OtpError::BatchLocked { .. }));
    assert_eq!(store.list_available_pads(&batch).unwrap().len(), 100);

    drop(held);
    Encoder::new(&store, LockFile)
        .encode(&batch, b"free")
        .unwrap()
        .into_result()
        .unwrap();
    assert!(!batch.dir().join(LOCK_FILE_NAME).exists());
}

/// Refuses every erase, like a read-only medium would.
struct StuckEraser;

impl SecureEraser for StuckEraser {
    fn secure_delete(&self, path: &Path) -> padbook_core::Result<()> {
        Err(OtpError::EraseFailed {
            path: path.to_path_buf(),
            source: std::io::Error::other("medium is read-only"),
        })
    }
}

#[test]
fn test_erase_failure_is_surfaced_with_the_artifact() {
    let temp_dir = tempdir().unwrap();
    let plain = PadStore::open(temp_dir.path());
    let batch = generated(&plain);
    let store = PadStore::with_eraser(temp_dir.path(), StuckEraser);

    let sent = Encoder::new(&store, NoLock).encode(&batch, b"delivered").unwrap();
    assert_eq!(sent.output.ciphertext().len(), 9);
    assert!(matches!(sent.erasure, Err(OtpError::EraseFailed { .. })));
    assert!(matches!(
        sent.into_result().unwrap_err(),
        OtpError::EraseFailed { .. }
    ));
}
