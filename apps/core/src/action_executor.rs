use thiserror::Error;

use crate::payload::{Dispatch, Payload};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("empty launch url")]
    EmptyUrl,
    #[error("dispatch failed: {0}")]
    Failed(String),
}

/// Host side effects the resolver triggers on commit.
pub trait Dispatcher: Send + Sync {
    fn launch(&self, url: &str) -> Result<(), DispatchError>;

    fn dispatch_intent(
        &self,
        action: &str,
        domain: Option<&str>,
        sub_domain: Option<&str>,
        payload: &Payload,
    ) -> Result<(), DispatchError>;

    fn dispatch_interest(
        &self,
        topic: &str,
        domain: Option<&str>,
        sub_domain: Option<&str>,
        body: &str,
    ) -> Result<(), DispatchError>;
}

pub fn execute(dispatcher: &dyn Dispatcher, dispatch: &Dispatch) -> Result<(), DispatchError> {
    match dispatch {
        Dispatch::Launch { url } => {
            let trimmed = url.trim();
            if trimmed.is_empty() {
                return Err(DispatchError::EmptyUrl);
            }
            dispatcher.launch(trimmed)
        }
        Dispatch::Intent {
            action,
            domain,
            sub_domain,
            payload,
        } => dispatcher.dispatch_intent(action, domain.as_deref(), sub_domain.as_deref(), payload),
        Dispatch::Interest {
            topic,
            domain,
            sub_domain,
            body,
        } => dispatcher.dispatch_interest(topic, domain.as_deref(), sub_domain.as_deref(), body),
    }
}

/// Dispatcher that only records dispatches in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDispatcher;

impl Dispatcher for LoggingDispatcher {
    fn launch(&self, url: &str) -> Result<(), DispatchError> {
        tracing::info!(url, "launch");
        Ok(())
    }

    fn dispatch_intent(
        &self,
        action: &str,
        domain: Option<&str>,
        sub_domain: Option<&str>,
        payload: &Payload,
    ) -> Result<(), DispatchError> {
        let payload = serde_json::to_string(payload).map_err(|e| DispatchError::Failed(e.to_string()))?;
        tracing::info!(action, ?domain, ?sub_domain, %payload, "dispatch intent");
        Ok(())
    }

    fn dispatch_interest(
        &self,
        topic: &str,
        domain: Option<&str>,
        sub_domain: Option<&str>,
        body: &str,
    ) -> Result<(), DispatchError> {
        tracing::info!(topic, ?domain, ?sub_domain, body, "dispatch interest");
        Ok(())
    }
}
