//! Bridge between stored entry payloads and streaming chains.
//!
//! A [`CompressedObject`] is the at-rest form of one archive entry: the
//! compressed (and possibly encrypted) bytes plus the sizes, checksum, and
//! codec recorded for them. It does not parse or serialize any container
//! structure; it only knows how to assemble the chains that move content
//! into and out of that at-rest form.

use crate::codec::{CompressionMethod, CompressionOptions};
use crate::crypto::Password;
use crate::stream::{
    Crc32Probe, DataLengthProbe, DecryptOptions, DecryptStage, MetaValue, Pipeline, StreamInfo,
};
use crate::{Error, Result};

/// Encryption parameters recorded alongside an encrypted entry.
#[derive(Debug, Clone)]
pub struct EncryptionInfo {
    /// Encryption method name; only `"traditional"` is supported.
    pub method: String,
    /// CRC-32 of the plaintext, for header verification.
    pub crc32: u32,
    /// Raw 32-bit DOS date/time of the entry.
    pub dos_date_raw: u32,
    /// General-purpose bit flag of the entry.
    pub bit_flag: u16,
}

/// One entry's payload in its stored form.
#[derive(Debug, Clone)]
pub struct CompressedObject {
    /// Size of `data` in bytes (encryption header included, if any).
    pub compressed_size: u64,
    /// Size the content decompresses to.
    pub uncompressed_size: u64,
    /// CRC-32 of the decompressed content.
    pub crc32: u32,
    /// Codec the payload is stored with.
    pub compression: CompressionMethod,
    /// The stored payload bytes.
    pub data: Vec<u8>,
    /// Present when the payload is encrypted.
    pub encryption: Option<EncryptionInfo>,
}

impl CompressedObject {
    /// Builds the read-side chain: optional decryption, decompression, and
    /// a length check against the recorded uncompressed size.
    ///
    /// The caller pushes the stored payload bytes and drains plaintext.
    /// Password correctness is not judged here; a wrong password surfaces
    /// as [`Error::WrongPassword`] once the encryption header arrives.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PasswordRequired`] if the entry is encrypted and no
    /// password was given, and configuration errors for an unsupported
    /// encryption method. No chain is constructed on failure.
    pub fn content_pipeline(&self, password: Option<&Password>) -> Result<Pipeline> {
        let mut chain = Pipeline::new();

        if let Some(encryption) = &self.encryption {
            let password = password.ok_or(Error::PasswordRequired)?;
            let stage = DecryptStage::new(&DecryptOptions {
                password: password.clone(),
                method: encryption.method.clone(),
                crc32: encryption.crc32,
                dos_date_raw: encryption.dos_date_raw,
                bit_flag: encryption.bit_flag,
            })?;
            chain = chain.pipe(Box::new(stage));
        }

        let expected = self.uncompressed_size;
        let chain = chain
            .pipe(self.compression.uncompress_stage())
            .pipe(Box::new(DataLengthProbe::new("data_length")))
            .on_end(move |info| {
                let actual = info.u64("data_length").unwrap_or(0);
                if actual != expected {
                    return Err(Error::SizeMismatch { expected, actual });
                }
                Ok(())
            });

        log::debug!("content chain: {}", chain.name());
        Ok(chain)
    }

    /// Runs the content chain over the stored payload and returns the
    /// plaintext.
    pub fn read_content(&self, password: Option<&Password>) -> Result<Vec<u8>> {
        let mut chain = self.content_pipeline(password)?;
        chain.run(&self.data)
    }

    /// Builds a pass-through chain annotated with this entry's recorded
    /// metadata, for re-emitting the payload in its stored form.
    pub fn compressed_pipeline(&self) -> Pipeline {
        Pipeline::new()
            .with_info("compressedSize", MetaValue::U64(self.compressed_size))
            .with_info("uncompressedSize", MetaValue::U64(self.uncompressed_size))
            .with_info("crc32", MetaValue::U32(self.crc32))
            .with_info("compression", MetaValue::Str(self.compression.name().into()))
    }

    /// Builds the write-side chain: checksum and length probes around a
    /// fresh compressor.
    ///
    /// The finished chain's metadata carries everything
    /// [`from_stream`](Self::from_stream) needs. Encryption, when wanted,
    /// is piped on by the caller after the final length probe.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCompressionLevel`] before any chain exists
    /// if the options name a level outside the codec's range.
    pub fn compress_pipeline(
        method: CompressionMethod,
        options: &CompressionOptions,
    ) -> Result<Pipeline> {
        let chain = Pipeline::new()
            .with_info("compression", MetaValue::Str(method.name().into()))
            .pipe(Box::new(Crc32Probe::new()))
            .pipe(Box::new(DataLengthProbe::new("uncompressedSize")))
            .pipe(method.compress_stage(options)?)
            .pipe(Box::new(DataLengthProbe::new("compressedSize")));

        log::debug!("compress chain: {}", chain.name());
        Ok(chain)
    }

    /// Assembles an entry from a finished write-side chain's metadata and
    /// drained output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingMetadata`] if the chain did not record one
    /// of the required entries, and [`Error::UnknownCompression`] for an
    /// unrecognized codec annotation.
    pub fn from_stream(info: &StreamInfo, data: Vec<u8>) -> Result<Self> {
        let compression = info
            .str("compression")
            .ok_or(Error::MissingMetadata { key: "compression" })
            .and_then(CompressionMethod::from_name)?;
        let crc32 = info
            .u32("crc32")
            .ok_or(Error::MissingMetadata { key: "crc32" })?;
        let uncompressed_size = info.u64("uncompressedSize").ok_or(Error::MissingMetadata {
            key: "uncompressedSize",
        })?;
        let compressed_size = info.u64("compressedSize").ok_or(Error::MissingMetadata {
            key: "compressedSize",
        })?;

        Ok(Self {
            compressed_size,
            uncompressed_size,
            crc32,
            compression,
            data,
            encryption: None,
        })
    }
}

/// Packs a calendar timestamp into the raw 32-bit DOS date/time format.
///
/// The date lives in the high 16 bits (`(year - 1980) << 9 | month << 5 |
/// day`), the time in the low 16 (`hour << 11 | minute << 5 | second / 2`).
/// Years before 1980 clamp to the epoch; `month` is 1-12.
pub fn dos_date_time(year: u32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> u32 {
    let date = (year.saturating_sub(1980) << 9) | (month << 5) | day;
    let time = (hour << 11) | (minute << 5) | (second / 2);
    (date << 16) | time
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::Crc32;
    use crate::crypto::HeaderRandom;
    use crate::stream::{EncryptOptions, EncryptStage};

    fn store_object(content: &[u8]) -> CompressedObject {
        CompressedObject {
            compressed_size: content.len() as u64,
            uncompressed_size: content.len() as u64,
            crc32: Crc32::compute(content),
            compression: CompressionMethod::Store,
            data: content.to_vec(),
            encryption: None,
        }
    }

    #[test]
    fn test_store_read_content() {
        let object = store_object(b"plain stored content");
        assert_eq!(
            object.read_content(None).unwrap(),
            b"plain stored content"
        );
    }

    #[cfg(feature = "deflate")]
    #[test]
    fn test_deflate_write_then_read() {
        let content = b"write me down, then read me back ".repeat(40);

        let mut chain =
            CompressedObject::compress_pipeline(CompressionMethod::Deflate, &Default::default())
                .unwrap();
        let data = chain.run(&content).unwrap();
        let object = CompressedObject::from_stream(chain.info(), data).unwrap();

        assert_eq!(object.compression, CompressionMethod::Deflate);
        assert_eq!(object.uncompressed_size, content.len() as u64);
        assert_eq!(object.compressed_size, object.data.len() as u64);
        assert_eq!(object.crc32, Crc32::compute(&content));
        assert_eq!(object.read_content(None).unwrap(), content);
    }

    #[test]
    fn test_password_required() {
        let mut object = store_object(b"locked");
        object.encryption = Some(EncryptionInfo {
            method: "traditional".into(),
            crc32: object.crc32,
            dos_date_raw: 0,
            bit_flag: 0,
        });

        let err = object.content_pipeline(None).unwrap_err();
        assert!(matches!(err, Error::PasswordRequired));
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn test_encrypted_roundtrip_through_bridge() {
        let content = b"bridged and enciphered";
        let crc = Crc32::compute(content);

        // Write side: store + encrypt appended by the caller.
        let mut chain = CompressedObject::compress_pipeline(
            CompressionMethod::Store,
            &Default::default(),
        )
        .unwrap()
        .pipe(Box::new(
            EncryptStage::new(EncryptOptions {
                password: Password::new("hunter2"),
                method: "traditional".into(),
                crc32: 0,
                random: HeaderRandom::strong(),
            })
            .unwrap(),
        ));
        let data = chain.run(content).unwrap();
        assert_eq!(data.len(), content.len() + 12);

        let mut object = CompressedObject::from_stream(chain.info(), data).unwrap();
        object.encryption = Some(EncryptionInfo {
            method: "traditional".into(),
            crc32: crc,
            dos_date_raw: 0,
            bit_flag: 0,
        });

        // Chain construction succeeds for any password; correctness is
        // judged when the header flows.
        assert!(object.content_pipeline(Some(&Password::new("wrong"))).is_ok());
        assert!(matches!(
            object.read_content(Some(&Password::new("wrong"))),
            Err(Error::WrongPassword)
        ));

        assert_eq!(
            object.read_content(Some(&Password::new("hunter2"))).unwrap(),
            content
        );
    }

    #[test]
    fn test_size_mismatch_detected() {
        let mut object = store_object(b"12345678");
        object.uncompressed_size = 9; // lie about the recorded size
        let err = object.read_content(None).unwrap_err();
        assert!(matches!(
            err,
            Error::SizeMismatch {
                expected: 9,
                actual: 8
            }
        ));
    }

    #[test]
    fn test_from_stream_missing_metadata() {
        let info = StreamInfo::new();
        let err = CompressedObject::from_stream(&info, Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingMetadata { key: "compression" }
        ));
    }

    #[test]
    fn test_dos_date_time_packing() {
        // 2024-06-15 12:30:42 UTC
        assert_eq!(dos_date_time(2024, 6, 15, 12, 30, 42), 0x58CF_63D5);
        // Pre-epoch years clamp to 1980
        assert_eq!(dos_date_time(1975, 1, 1, 0, 0, 0) >> 25, 0);
    }
}
