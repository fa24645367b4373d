//! In-memory object backend used by unit tests / 测试用内存后端

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use super::backend::{CompletedPart, ObjectBackend};
use crate::error::BackendError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Put(String),
    Initiate(String),
    Part(u32, usize),
    Complete(Vec<u32>),
    Abort(String),
    Delete(String),
}

#[derive(Default)]
pub struct MemoryBackend {
    pub calls: Mutex<Vec<Call>>,
    pub objects: Mutex<BTreeMap<String, Bytes>>,
    pub fail_init: bool,
    pub fail_part: Option<u32>,
    pub fail_complete: bool,
    pub fail_abort: bool,
    pub fail_delete: Vec<String>,
    /// Cancel this token once the given part has been transmitted
    pub cancel_after_part: Option<(u32, CancellationToken)>,
}

impl MemoryBackend {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    pub fn part_sizes(&self) -> Vec<(u32, usize)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::Part(n, size) => Some((*n, *size)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl ObjectBackend for MemoryBackend {
    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        _content_type: &str,
    ) -> Result<(), BackendError> {
        self.record(Call::Put(key.to_string()));
        self.objects.lock().insert(key.to_string(), data);
        Ok(())
    }

    async fn initiate_multipart(
        &self,
        key: &str,
        _content_type: &str,
    ) -> Result<String, BackendError> {
        self.record(Call::Initiate(key.to_string()));
        if self.fail_init {
            return Err("initiate refused".into());
        }
        Ok("upload-1".to_string())
    }

    async fn upload_part(
        &self,
        _key: &str,
        _upload_id: &str,
        part_number: u32,
        data: Bytes,
        _content_type: &str,
    ) -> Result<String, BackendError> {
        self.record(Call::Part(part_number, data.len()));
        if self.fail_part == Some(part_number) {
            return Err(format!("part {} rejected", part_number).into());
        }
        if let Some((after, token)) = &self.cancel_after_part {
            if *after == part_number {
                token.cancel();
            }
        }
        Ok(format!("etag-{}", part_number))
    }

    async fn complete_multipart(
        &self,
        key: &str,
        _upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Result<(), BackendError> {
        self.record(Call::Complete(parts.iter().map(|p| p.part_number).collect()));
        if self.fail_complete {
            return Err("complete refused".into());
        }
        self.objects.lock().insert(key.to_string(), Bytes::new());
        Ok(())
    }

    async fn abort_multipart(&self, key: &str, _upload_id: &str) -> Result<(), BackendError> {
        self.record(Call::Abort(key.to_string()));
        if self.fail_abort {
            return Err("abort refused".into());
        }
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), BackendError> {
        self.record(Call::Delete(key.to_string()));
        if self.fail_delete.iter().any(|k| k == key) {
            return Err(format!("cannot delete {}", key).into());
        }
        self.objects.lock().remove(key);
        Ok(())
    }
}
