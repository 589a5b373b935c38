//! In-memory client factory for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use http::StatusCode;

use crate::client::{ClientError, ClientFactory, ClientResult, HttpClient};
use crate::probe::BoxFuture;

#[derive(Debug, Clone, Copy)]
pub enum FakeResponse {
    Status(u16),
    ConnectError,
    /// Never completes; exercises deadlines and cancellation.
    Hang,
}

/// Records every client created and every path requested.
#[derive(Default)]
pub struct FakeFactory {
    responses: HashMap<String, FakeResponse>,
    created: Arc<Mutex<Vec<String>>>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, name: &str, response: FakeResponse) -> Self {
        self.responses.insert(name.to_string(), response);
        self
    }

    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    /// `"<client>:<path>"` for every GET issued.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl ClientFactory for FakeFactory {
    fn create_client(&self, name: &str) -> ClientResult<Arc<dyn HttpClient>> {
        self.created.lock().unwrap().push(name.to_string());
        let response = *self
            .responses
            .get(name)
            .ok_or_else(|| ClientError::UnknownClient(name.to_string()))?;
        Ok(Arc::new(FakeClient {
            name: name.to_string(),
            response,
            requested: self.requested.clone(),
        }))
    }
}

struct FakeClient {
    name: String,
    response: FakeResponse,
    requested: Arc<Mutex<Vec<String>>>,
}

impl HttpClient for FakeClient {
    fn get<'a>(&'a self, path: &'a str) -> BoxFuture<'a, ClientResult<StatusCode>> {
        self.requested
            .lock()
            .unwrap()
            .push(format!("{}:{path}", self.name));
        let response = self.response;
        Box::pin(async move {
            match response {
                FakeResponse::Status(code) => Ok(StatusCode::from_u16(code).unwrap()),
                FakeResponse::ConnectError => {
                    Err(ClientError::Connect("connection refused".to_string()))
                }
                FakeResponse::Hang => std::future::pending().await,
            }
        })
    }
}
