//! SHA-1 checksums for storage round trips

use rand::RngCore;
use sha1::{Digest, Sha1};
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const CHUNK_SIZE: usize = 1024 * 1024;

pub fn sha1_hex(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}

/// Fill a new file with `size` random bytes and return their checksum
pub async fn write_random_file(path: &Path, size: u64) -> std::io::Result<String> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    let mut generated = 0u64;
    while generated < size {
        let length = (size - generated).min(CHUNK_SIZE as u64) as usize;
        rand::thread_rng().fill_bytes(&mut buf[..length]);
        file.write_all(&buf[..length]).await?;
        hasher.update(&buf[..length]);
        generated += length as u64;
    }
    file.flush().await?;

    Ok(hex::encode(hasher.finalize()))
}

/// Checksum of a local file, read in fixed-size chunks
pub async fn file_checksum(path: &Path) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let read = file.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
