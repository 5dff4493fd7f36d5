//! Local flat vector index: exact L2 search over an in-process vector
//! table, persisted as a file pair.
//!
//! Layout on disk (always read and written together, in one directory):
//! - `index.bin`: `u32` dimension, `u32` count, then packed little-endian
//!   `f32` vectors in insertion order.
//! - `metadata.json`: JSON array whose position equals the vector's
//!   insertion rank.
//!
//! The alignment between the two files must never drift: inserts are
//! append-only and write vectors and metadata in the same order. Writers
//! serialize through the write half of an async `RwLock` around the whole
//! load-mutate-persist window; readers share the lock so they never observe
//! a half-written pair.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use vidseq_core::defaults::{INDEX_FILE, METADATA_FILE};
use vidseq_core::{Error, FrameMatch, FrameRecord, Result, VectorIndex};

#[derive(Debug)]
struct IndexState {
    dimension: usize,
    /// Packed row-major vectors; row i spans `[i*dimension, (i+1)*dimension)`.
    vectors: Vec<f32>,
    /// Position-aligned with vector insertion rank.
    metadata: Vec<FrameRecord>,
}

impl IndexState {
    fn count(&self) -> usize {
        self.metadata.len()
    }

    fn row(&self, i: usize) -> &[f32] {
        &self.vectors[i * self.dimension..(i + 1) * self.dimension]
    }
}

/// File-backed flat index with exact (squared) L2 search.
#[derive(Debug)]
pub struct LocalVectorIndex {
    index_file: PathBuf,
    metadata_file: PathBuf,
    state: RwLock<IndexState>,
}

impl LocalVectorIndex {
    /// Open the index in `dir`, loading the existing file pair if present,
    /// else creating an empty index at `dimension`.
    pub async fn open(dir: &Path, dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::Config("index dimension must be non-zero".into()));
        }
        tokio::fs::create_dir_all(dir).await?;

        let index_file = dir.join(INDEX_FILE);
        let metadata_file = dir.join(METADATA_FILE);

        let state = if tokio::fs::try_exists(&index_file).await? {
            let blob = tokio::fs::read(&index_file).await?;
            let (loaded_dim, vectors) = decode_blob(&blob)?;

            let metadata_bytes = tokio::fs::read(&metadata_file).await?;
            let metadata: Vec<FrameRecord> = serde_json::from_slice(&metadata_bytes)?;

            if vectors.len() != metadata.len() * loaded_dim {
                return Err(Error::Index(format!(
                    "index/metadata drift: {} vector values for {} records at dimension {}",
                    vectors.len(),
                    metadata.len(),
                    loaded_dim
                )));
            }

            info!(
                dir = %dir.display(),
                dimension = loaded_dim,
                count = metadata.len(),
                "Loaded existing local vector index"
            );

            IndexState {
                dimension: loaded_dim,
                vectors,
                metadata,
            }
        } else {
            info!(dir = %dir.display(), dimension, "Creating new local vector index");
            IndexState {
                dimension,
                vectors: Vec::new(),
                metadata: Vec::new(),
            }
        };

        Ok(Self {
            index_file,
            metadata_file,
            state: RwLock::new(state),
        })
    }

    /// The index dimension (loaded or configured).
    pub async fn dimension(&self) -> usize {
        self.state.read().await.dimension
    }

    /// Number of stored vectors.
    pub async fn count(&self) -> usize {
        self.state.read().await.count()
    }

    /// Append vectors and their metadata, then persist the file pair.
    ///
    /// Vectors and metadata are appended in the same order; the positional
    /// alignment invariant depends on it.
    pub async fn add_vectors(
        &self,
        vectors: &[Vec<f32>],
        metadata: Vec<FrameRecord>,
    ) -> Result<()> {
        if vectors.len() != metadata.len() {
            return Err(Error::Index(format!(
                "add_vectors called with {} vectors but {} metadata records",
                vectors.len(),
                metadata.len()
            )));
        }

        let mut state = self.state.write().await;
        for v in vectors {
            if v.len() != state.dimension {
                return Err(Error::DimensionMismatch {
                    expected: state.dimension,
                    actual: v.len(),
                });
            }
        }

        for (v, m) in vectors.iter().zip(metadata) {
            state.vectors.extend_from_slice(v);
            state.metadata.push(m);
        }

        self.persist(&state).await?;
        debug!(added = vectors.len(), total = state.count(), "Appended vectors to local index");
        Ok(())
    }

    /// Exact nearest-neighbor search; returns up to `k` records annotated
    /// with their squared-L2 `distance`, nearest first.
    pub async fn search(&self, query: &[f32], k: usize) -> Result<Vec<(FrameRecord, f32)>> {
        let state = self.state.read().await;
        if query.len() != state.dimension {
            return Err(Error::DimensionMismatch {
                expected: state.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = (0..state.count())
            .map(|i| (i, l2_squared(query, state.row(i))))
            .collect();
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, dist)| (state.metadata[i].clone(), dist))
            .collect())
    }

    /// Write the file pair. Called with the write lock held.
    async fn persist(&self, state: &IndexState) -> Result<()> {
        let blob = encode_blob(state.dimension, &state.vectors);
        tokio::fs::write(&self.index_file, blob).await?;

        let metadata = serde_json::to_vec(&state.metadata)?;
        tokio::fs::write(&self.metadata_file, metadata).await?;
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for LocalVectorIndex {
    /// Append-only: the local index never rewrites an existing row; the
    /// record id stays derivable from the metadata itself.
    async fn upsert(&self, _id: &str, vector: &[f32], metadata: &FrameRecord) -> Result<()> {
        self.add_vectors(&[vector.to_vec()], vec![metadata.clone()])
            .await
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<FrameMatch>> {
        let hits = self.search(vector, k).await?;
        Ok(hits
            .into_iter()
            .map(|(record, distance)| FrameMatch {
                record,
                // Ranking parity with the remote path: higher is better.
                score: 1.0 - distance,
            })
            .collect())
    }
}

fn l2_squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn encode_blob(dimension: usize, vectors: &[f32]) -> Vec<u8> {
    let count = if dimension == 0 { 0 } else { vectors.len() / dimension };
    let mut blob = Vec::with_capacity(8 + vectors.len() * 4);
    blob.extend_from_slice(&(dimension as u32).to_le_bytes());
    blob.extend_from_slice(&(count as u32).to_le_bytes());
    for v in vectors {
        blob.extend_from_slice(&v.to_le_bytes());
    }
    blob
}

fn decode_blob(blob: &[u8]) -> Result<(usize, Vec<f32>)> {
    if blob.len() < 8 {
        return Err(Error::Index("index blob truncated before header".into()));
    }
    let dimension = u32::from_le_bytes(blob[0..4].try_into().unwrap()) as usize;
    let count = u32::from_le_bytes(blob[4..8].try_into().unwrap()) as usize;

    let expected = 8 + dimension * count * 4;
    if blob.len() != expected {
        return Err(Error::Index(format!(
            "index blob length {} does not match header ({} x {})",
            blob.len(),
            count,
            dimension
        )));
    }

    let vectors = blob[8..]
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
        .collect();
    Ok((dimension, vectors))
}
