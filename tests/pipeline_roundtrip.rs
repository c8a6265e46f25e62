//! Full write-then-read chains through the compressed-object bridge.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use zipstream::checksum::Crc32;
use zipstream::crypto::HeaderRandom;
use zipstream::stream::{EncryptOptions, EncryptStage};
use zipstream::{
    CompressedObject, CompressionMethod, CompressionOptions, EncryptionInfo, Error, Password,
};

/// Seeded bulk data with a skewed byte distribution so DEFLATE has
/// something to chew on.
fn bulk_data(seed: u64, len: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(b'a'..=b'f')).collect()
}

fn write_object(content: &[u8], method: CompressionMethod) -> CompressedObject {
    let mut chain =
        CompressedObject::compress_pipeline(method, &CompressionOptions::default()).unwrap();
    let data = chain.run(content).unwrap();
    CompressedObject::from_stream(chain.info(), data).unwrap()
}

#[test]
fn store_roundtrip() {
    let content = bulk_data(1, 10_000);
    let object = write_object(&content, CompressionMethod::Store);
    assert_eq!(object.compressed_size, content.len() as u64);
    assert_eq!(object.read_content(None).unwrap(), content);
}

#[cfg(feature = "deflate")]
#[test]
fn deflate_roundtrip() {
    let content = bulk_data(2, 100_000);
    let object = write_object(&content, CompressionMethod::Deflate);
    assert!(object.compressed_size < object.uncompressed_size);
    assert_eq!(object.crc32, Crc32::compute(&content));
    assert_eq!(object.read_content(None).unwrap(), content);
}

#[cfg(feature = "deflate")]
#[test]
fn deflate_roundtrip_empty() {
    let object = write_object(b"", CompressionMethod::Deflate);
    assert_eq!(object.uncompressed_size, 0);
    assert_eq!(object.read_content(None).unwrap(), b"");
}

#[cfg(feature = "deflate")]
#[test]
fn encrypted_deflate_roundtrip() {
    let content = bulk_data(3, 50_000);
    let crc = Crc32::compute(&content);

    let mut chain = CompressedObject::compress_pipeline(
        CompressionMethod::Deflate,
        &CompressionOptions { level: Some(9) },
    )
    .unwrap()
    .pipe(Box::new(
        EncryptStage::new(EncryptOptions {
            password: Password::new("archive password"),
            method: "traditional".into(),
            crc32: 0,
            random: HeaderRandom::strong(),
        })
        .unwrap(),
    ));
    let data = chain.run(&content).unwrap();

    let mut object = CompressedObject::from_stream(chain.info(), data).unwrap();
    // The encrypt stage accounts for its 12-byte header.
    assert_eq!(object.compressed_size, object.data.len() as u64);
    object.encryption = Some(EncryptionInfo {
        method: "traditional".into(),
        crc32: crc,
        dos_date_raw: 0,
        bit_flag: 0,
    });

    assert!(matches!(
        object.read_content(None),
        Err(Error::PasswordRequired)
    ));
    assert!(matches!(
        object.read_content(Some(&Password::new("other password"))),
        Err(Error::WrongPassword)
    ));
    assert_eq!(
        object
            .read_content(Some(&Password::new("archive password")))
            .unwrap(),
        content
    );
}

#[test]
fn corrupted_size_is_rejected() {
    let content = bulk_data(4, 1_000);
    let mut object = write_object(&content, CompressionMethod::Store);
    object.uncompressed_size += 1;

    let err = object.read_content(None).unwrap_err();
    assert!(err.is_corruption());
    assert!(matches!(err, Error::SizeMismatch { .. }));
}

#[cfg(feature = "deflate")]
#[test]
fn pause_and_resume_mid_stream() {
    let content = bulk_data(5, 30_000);
    let object = write_object(&content, CompressionMethod::Deflate);

    let mut chain = object.content_pipeline(None).unwrap();
    let mid = object.data.len() / 2;
    chain.push(&object.data[..mid]).unwrap();
    chain.pause();
    chain.push(&object.data[mid..]).unwrap();
    chain.resume().unwrap();
    chain.finish().unwrap();
    assert_eq!(chain.drain(), content);
}

#[test]
fn unknown_codec_name_fails_at_assembly() {
    let mut chain =
        CompressedObject::compress_pipeline(CompressionMethod::Store, &CompressionOptions::default())
            .unwrap();
    let data = chain.run(b"x").unwrap();

    // Replay the metadata under a bogus codec name.
    let mut info = chain.info().clone();
    info.set(
        "compression",
        zipstream::stream::MetaValue::Str("LZMA".into()),
    );
    let err = CompressedObject::from_stream(&info, data).unwrap_err();
    assert!(matches!(err, Error::UnknownCompression { .. }));
}
