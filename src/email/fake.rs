use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use async_trait::async_trait;

use super::{EmailError, EmailMessage, MailTransport};

/// Records outgoing mail instead of sending it; can be told to fail.
#[derive(Default)]
pub struct FakeMailer {
    sent: Mutex<Vec<EmailMessage>>,
    failing: AtomicBool,
}

impl FakeMailer {
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Last path segment of the first link in the most recent email.
    pub fn last_link_token(&self) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let body = &sent.last()?.text_body;
        let url = body.split_whitespace().find(|w| w.starts_with("http"))?;
        url.rsplit('/').next().map(str::to_string)
    }
}

#[async_trait]
impl MailTransport for FakeMailer {
    async fn deliver(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EmailError::Smtp("connection refused".into()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}
