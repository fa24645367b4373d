//! Multipart upload state machine / 分片上传状态机
//!
//! Init → UploadPart* → Complete, with Abort reachable from any part failure.
//! Parts go out through a bounded fan-out (`concurrency` in flight, 1 means
//! strictly sequential). The first failure stops new parts from launching;
//! parts already in flight drain before the session is aborted.

use futures::stream::{FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;

use super::backend::{CompletedPart, ObjectBackend};
use crate::chunk::{check_part_size, ChunkSplitter, FileChunk};
use crate::error::{Result, UploadError};
use crate::file::{SourceReader, UploadFile};

/// One multipart upload of one object / 单个对象的分片上传
pub struct MultipartUpload<'a> {
    backend: &'a dyn ObjectBackend,
    key: String,
    content_type: String,
    concurrency: usize,
}

impl<'a> MultipartUpload<'a> {
    pub fn new(
        backend: &'a dyn ObjectBackend,
        key: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            key: key.into(),
            content_type: content_type.into(),
            concurrency: 1,
        }
    }

    /// Number of parts allowed in flight / 并发上传分片数
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Run the whole session for `file` with `part_size` byte parts / 执行分片上传
    pub async fn run(
        &self,
        file: &UploadFile,
        part_size: u64,
        cancel: &CancellationToken,
    ) -> Result<()> {
        check_part_size(file.size(), part_size)?;
        if cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }

        let mut reader = file.open().await?;

        let upload_id = self
            .backend
            .initiate_multipart(&self.key, &self.content_type)
            .await
            .map_err(|source| UploadError::Initiate {
                key: self.key.clone(),
                source,
            })?;

        tracing::debug!("分片上传开始: key={}, upload_id={}", self.key, upload_id);

        let parts = self
            .upload_parts(&upload_id, reader.as_mut(), file.size(), part_size, cancel)
            .await;
        drop(reader);

        let mut parts = match parts {
            Ok(parts) => parts,
            Err(e) => {
                self.abort(&upload_id).await;
                return Err(e);
            }
        };

        if cancel.is_cancelled() {
            self.abort(&upload_id).await;
            return Err(UploadError::Cancelled);
        }

        parts.sort_by_key(|p| p.part_number);
        self.backend
            .complete_multipart(&self.key, &upload_id, parts)
            .await
            .map_err(|source| UploadError::Complete {
                key: self.key.clone(),
                source,
            })?;

        tracing::debug!("分片上传完成: key={}", self.key);
        Ok(())
    }

    /// Fan out parts, fan in ETags. Stops launching on first failure or cancel.
    ///
    /// A chunk is read from `source` only when its part is launched, so at most
    /// `concurrency` part buffers are alive at once.
    async fn upload_parts(
        &self,
        upload_id: &str,
        source: &mut dyn SourceReader,
        file_size: u64,
        part_size: u64,
        cancel: &CancellationToken,
    ) -> Result<Vec<CompletedPart>> {
        let mut splitter = ChunkSplitter::new(source, file_size, part_size)?;
        let session = cancel.child_token();
        let mut parts = Vec::with_capacity(splitter.chunk_count().max(1) as usize);
        let mut in_flight = FuturesUnordered::new();
        let mut failure: Option<UploadError> = None;
        let mut exhausted = false;

        // 空文件也需要一个分片才能完成上传
        if splitter.chunk_count() == 0 {
            in_flight.push(self.upload_part(upload_id, FileChunk::empty()));
            exhausted = true;
        }

        loop {
            while !exhausted && !session.is_cancelled() && in_flight.len() < self.concurrency {
                match splitter.next_chunk().await {
                    Some(Ok(chunk)) => in_flight.push(self.upload_part(upload_id, chunk)),
                    Some(Err(e)) => {
                        failure.get_or_insert(e);
                        session.cancel();
                    }
                    None => exhausted = true,
                }
            }

            let Some(result) = in_flight.next().await else {
                break;
            };

            match result {
                Ok(part) => parts.push(part),
                Err(e) => {
                    failure.get_or_insert(e);
                    session.cancel();
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None if cancel.is_cancelled() => Err(UploadError::Cancelled),
            None => Ok(parts),
        }
    }

    async fn upload_part(&self, upload_id: &str, chunk: FileChunk) -> Result<CompletedPart> {
        tracing::debug!(
            "上传分片: key={}, part={}, size={}",
            self.key,
            chunk.number,
            chunk.size
        );

        let etag = self
            .backend
            .upload_part(&self.key, upload_id, chunk.number, chunk.data, &self.content_type)
            .await
            .map_err(|source| UploadError::PartUpload {
                key: self.key.clone(),
                part_number: chunk.number,
                source,
            })?;

        Ok(CompletedPart {
            part_number: chunk.number,
            etag,
        })
    }

    /// Best-effort abort; its failure must not mask the primary error / 取消分片上传
    async fn abort(&self, upload_id: &str) {
        if let Err(e) = self.backend.abort_multipart(&self.key, upload_id).await {
            tracing::warn!(
                "取消分片上传失败: key={}, upload_id={}, error={}",
                self.key,
                upload_id,
                e
            );
        } else {
            tracing::debug!("分片上传已取消: key={}", self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::MB;
    use crate::error::ErrorKind;
    use crate::storage::testing::{Call, MemoryBackend};

    fn file(len: usize) -> UploadFile {
        UploadFile::from_bytes("big.bin", vec![1u8; len])
    }

    fn is_abort(c: &Call) -> bool {
        matches!(c, Call::Abort(_))
    }

    fn is_complete(c: &Call) -> bool {
        matches!(c, Call::Complete(_))
    }

    #[tokio::test]
    async fn test_parts_in_order() {
        let backend = MemoryBackend::default();
        let upload = MultipartUpload::new(&backend, "k/big.bin", "application/octet-stream");

        upload
            .run(&file(25 * MB as usize), 10 * MB, &CancellationToken::new())
            .await
            .unwrap();

        let ten = 10 * MB as usize;
        assert_eq!(backend.part_sizes(), vec![(1, ten), (2, ten), (3, 5 * MB as usize)]);
        assert_eq!(backend.count(is_abort), 0);
        assert_eq!(backend.calls().last(), Some(&Call::Complete(vec![1, 2, 3])));
    }

    #[tokio::test]
    async fn test_part_failure_aborts_once() {
        let backend = MemoryBackend {
            fail_part: Some(2),
            ..Default::default()
        };
        let upload = MultipartUpload::new(&backend, "k", "application/octet-stream");

        let err = upload.run(&file(30), 10, &CancellationToken::new()).await.unwrap_err();

        match &err {
            UploadError::PartUpload { part_number, .. } => assert_eq!(*part_number, 2),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(backend.count(is_abort), 1);
        assert_eq!(backend.count(is_complete), 0);
        // 顺序上传：第3片不会发出
        assert_eq!(backend.part_sizes(), vec![(1, 10), (2, 10)]);
    }

    #[tokio::test]
    async fn test_concurrent_part_failure_drains_then_aborts() {
        let backend = MemoryBackend {
            fail_part: Some(2),
            ..Default::default()
        };
        let upload =
            MultipartUpload::new(&backend, "k", "application/octet-stream").with_concurrency(3);

        let err = upload.run(&file(100), 10, &CancellationToken::new()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PartUpload);
        assert_eq!(backend.count(is_abort), 1);
        assert_eq!(backend.count(is_complete), 0);
        // 中止在所有已发出分片之后
        assert!(is_abort(backend.calls().last().unwrap()));
        assert!(backend.part_sizes().len() < 10);
    }

    #[tokio::test]
    async fn test_abort_failure_is_swallowed() {
        let backend = MemoryBackend {
            fail_part: Some(1),
            fail_abort: true,
            ..Default::default()
        };
        let upload = MultipartUpload::new(&backend, "k", "application/octet-stream");

        let err = upload.run(&file(30), 10, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PartUpload);
        assert_eq!(backend.count(is_abort), 1);
    }

    #[tokio::test]
    async fn test_init_failure_is_terminal() {
        let backend = MemoryBackend {
            fail_init: true,
            ..Default::default()
        };
        let upload = MultipartUpload::new(&backend, "k", "application/octet-stream");

        let err = upload.run(&file(30), 10, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Initiate);
        assert_eq!(backend.calls(), vec![Call::Initiate("k".to_string())]);
    }

    #[tokio::test]
    async fn test_complete_failure_leaves_session() {
        let backend = MemoryBackend {
            fail_complete: true,
            ..Default::default()
        };
        let upload = MultipartUpload::new(&backend, "k", "application/octet-stream");

        let err = upload.run(&file(30), 10, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Complete);
        assert_eq!(backend.count(is_abort), 0);
    }

    #[tokio::test]
    async fn test_part_size_checked_before_init() {
        let backend = MemoryBackend::default();
        let upload = MultipartUpload::new(&backend, "k", "application/octet-stream");

        let err = upload.run(&file(30), 0, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPartSize);

        let err = upload.run(&file(20_000), 1, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooManyParts);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_mid_upload_aborts() {
        let cancel = CancellationToken::new();
        let backend = MemoryBackend {
            cancel_after_part: Some((1, cancel.clone())),
            ..Default::default()
        };
        let upload = MultipartUpload::new(&backend, "k", "application/octet-stream");

        let err = upload.run(&file(30), 10, &cancel).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(backend.part_sizes(), vec![(1, 10)]);
        assert_eq!(backend.count(is_abort), 1);
        assert_eq!(backend.count(is_complete), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let backend = MemoryBackend::default();
        let upload = MultipartUpload::new(&backend, "k", "application/octet-stream");

        let err = upload.run(&file(30), 10, &cancel).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_file_sends_one_part() {
        let backend = MemoryBackend::default();
        let upload = MultipartUpload::new(&backend, "k", "application/octet-stream");

        upload.run(&file(0), 10, &CancellationToken::new()).await.unwrap();
        assert_eq!(backend.part_sizes(), vec![(1, 0)]);
        assert_eq!(backend.count(is_complete), 1);
    }

    #[tokio::test]
    async fn test_short_source_after_init_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shrinking.bin");
        std::fs::write(&path, [1u8; 10]).unwrap();
        let file = UploadFile::from_path(&path).await.unwrap();
        // 文件在描述之后被截断，实际数据少于记录的大小
        std::fs::write(&path, [1u8; 3]).unwrap();

        let backend = MemoryBackend::default();
        let upload = MultipartUpload::new(&backend, "k", "application/octet-stream");

        let err = upload.run(&file, 4, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, UploadError::ChunkRead { number: 1, .. }));
        assert_eq!(
            backend.calls(),
            vec![Call::Initiate("k".to_string()), Call::Abort("k".to_string())]
        );
    }

    #[tokio::test]
    async fn test_short_source_drains_launched_parts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shrinking.bin");
        std::fs::write(&path, [1u8; 12]).unwrap();
        let file = UploadFile::from_path(&path).await.unwrap();
        std::fs::write(&path, [1u8; 6]).unwrap();

        let backend = MemoryBackend::default();
        let upload = MultipartUpload::new(&backend, "k", "application/octet-stream");

        let err = upload.run(&file, 4, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, UploadError::ChunkRead { number: 2, .. }));
        assert_eq!(backend.part_sizes(), vec![(1, 4)]);
        assert_eq!(backend.count(is_abort), 1);
        assert_eq!(backend.count(is_complete), 0);
    }
}
