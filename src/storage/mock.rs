//! Mock storage adapter for testing
//!
//! Scripted responses keyed by path, consumed one per call, plus recorded
//! calls so tests can verify exactly what the cache asked the backend for.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::StorageAdapter;
use crate::error::StorageError;

/// A recorded `put_file_content` call.
#[derive(Debug, Clone)]
pub struct PutCall {
    pub data: String,
    pub path: String,
    pub is_public: bool,
}

/// Call counts for test verification.
#[derive(Debug, Clone, Default)]
pub struct CallCounts {
    pub get_json: usize,
    pub list_subdirectories: usize,
    pub put_file_content: usize,
}

/// Scripted mock [`StorageAdapter`].
///
/// Responses are queued per path and consumed in order; an exhausted queue
/// yields a backend error naming the path, so an unexpected extra call
/// surfaces in the test that triggered it.
pub struct MockStorage {
    get_json_responses: Mutex<HashMap<String, VecDeque<Result<Value, StorageError>>>>,
    list_responses: Mutex<HashMap<String, VecDeque<Result<Vec<String>, StorageError>>>>,
    put_failure: Mutex<Option<StorageError>>,
    call_counts: Mutex<CallCounts>,
    put_calls: Mutex<Vec<PutCall>>,
    listed_paths: Mutex<Vec<String>>,
    max_concurrent: usize,
}

impl Default for MockStorage {
    fn default() -> Self {
        Self {
            get_json_responses: Mutex::new(HashMap::new()),
            list_responses: Mutex::new(HashMap::new()),
            put_failure: Mutex::new(None),
            call_counts: Mutex::new(CallCounts::default()),
            put_calls: Mutex::new(Vec::new()),
            listed_paths: Mutex::new(Vec::new()),
            max_concurrent: 10,
        }
    }
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a `get_json` response for a path.
    pub fn on_get_json(self, path: &str, response: Result<Value, StorageError>) -> Self {
        self.get_json_responses
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Queue a `list_subdirectories` response for a path. Repeated calls
    /// for the same path consume responses in the queued order.
    pub fn on_list(self, path: &str, response: Result<Vec<String>, StorageError>) -> Self {
        self.queue_list(path, response);
        self
    }

    /// Queue a listing response on an already-shared mock (for scripting a
    /// second refresh round after `load`).
    pub fn queue_list(&self, path: &str, response: Result<Vec<String>, StorageError>) {
        self.list_responses
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(response);
    }

    /// Make the next `put_file_content` call fail.
    pub fn fail_next_put(&self, error: StorageError) {
        *self.put_failure.lock().unwrap() = Some(error);
    }

    pub fn call_counts(&self) -> CallCounts {
        self.call_counts.lock().unwrap().clone()
    }

    pub fn put_calls(&self) -> Vec<PutCall> {
        self.put_calls.lock().unwrap().clone()
    }

    pub fn listed_paths(&self) -> Vec<String> {
        self.listed_paths.lock().unwrap().clone()
    }
}

/// Convenience for scripting successful version listings.
pub fn versions(items: &[&str]) -> Result<Vec<String>, StorageError> {
    Ok(items.iter().map(|s| s.to_string()).collect())
}

#[async_trait]
impl StorageAdapter for MockStorage {
    async fn get_json(&self, path: &str) -> Result<Value, StorageError> {
        self.call_counts.lock().unwrap().get_json += 1;
        self.get_json_responses
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| {
                Err(StorageError::Backend(format!(
                    "no scripted get_json response for {path}"
                )))
            })
    }

    async fn list_subdirectories(&self, path: &str) -> Result<Vec<String>, StorageError> {
        self.call_counts.lock().unwrap().list_subdirectories += 1;
        self.listed_paths.lock().unwrap().push(path.to_string());
        self.list_responses
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| {
                Err(StorageError::Backend(format!(
                    "no scripted list response for {path}"
                )))
            })
    }

    async fn put_file_content(
        &self,
        data: &str,
        path: &str,
        is_public: bool,
    ) -> Result<(), StorageError> {
        self.call_counts.lock().unwrap().put_file_content += 1;
        self.put_calls.lock().unwrap().push(PutCall {
            data: data.to_string(),
            path: path.to_string(),
            is_public,
        });
        match self.put_failure.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn max_concurrent_requests(&self) -> usize {
        self.max_concurrent
    }
}
