//! Mock dialogue service for tests

use super::{DialogueError, DialogueRequest, DialogueService, Fragment};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Mock dialogue service that returns queued replies
pub struct MockDialogueService {
    replies: Mutex<VecDeque<Result<Vec<Fragment>, DialogueError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<DialogueRequest>>,
}

impl MockDialogueService {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn queue_fragments(&self, fragments: Vec<Fragment>) {
        self.replies.lock().unwrap().push_back(Ok(fragments));
    }

    /// Queue a failure
    pub fn queue_error(&self, error: DialogueError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<DialogueRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Default for MockDialogueService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DialogueService for MockDialogueService {
    async fn send(&self, request: &DialogueRequest) -> Result<Vec<Fragment>, DialogueError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DialogueError::network("No mock reply queued")))
    }

    fn endpoint(&self) -> &str {
        "mock://dialogue"
    }
}
