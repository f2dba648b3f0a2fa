#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use axum::Router;
use domestic_connect::backend::BackendClient;
use domestic_connect::config::BackendConfig;
use domestic_connect::marketplace::accounts::{
    CredentialRecord, CredentialRepository, RepositoryError,
};
use url::Url;

/// Serve `router` on an ephemeral port and return a client pointed at it.
pub async fn backend_stub(router: Router) -> BackendClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("stub server");
    });

    BackendClient::new(&BackendConfig {
        base_url: Url::parse(&format!("http://{addr}")).expect("stub url"),
        timeout: Duration::from_secs(5),
    })
    .expect("client builds")
}

#[derive(Default)]
pub struct MemoryCredentials {
    records: Mutex<HashMap<String, CredentialRecord>>,
}

impl CredentialRepository for MemoryCredentials {
    fn insert(&self, record: CredentialRecord) -> Result<CredentialRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("credentials lock");
        if guard.contains_key(&record.email) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.email.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: CredentialRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("credentials lock");
        match guard.get_mut(&record.email) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, email: &str) -> Result<Option<CredentialRecord>, RepositoryError> {
        Ok(self.records.lock().expect("credentials lock").get(email).cloned())
    }
}
