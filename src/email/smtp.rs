use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{error, info, instrument};

use super::{EmailError, EmailMessage, MailTransport};
use crate::config::SmtpConfig;

/// SMTP delivery through lettre's async transport.
pub struct SmtpMailer {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    #[instrument(skip(config), fields(host = %config.host, port = config.port))]
    pub fn new(config: &SmtpConfig) -> Result<Self, EmailError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| EmailError::Address(format!("invalid from address: {e}")))?;

        let tls_parameters = TlsParameters::new(config.host.clone())
            .map_err(|e| EmailError::Smtp(format!("TLS configuration error: {e}")))?;
        // 465 is implicit TLS; anything else upgrades with STARTTLS when offered.
        let tls = if config.port == 465 {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Opportunistic(tls_parameters)
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            .port(config.port)
            .tls(tls)
            .timeout(Some(Duration::from_secs(10)));
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        info!("SMTP transport configured");
        Ok(Self {
            from,
            transport: builder.build(),
        })
    }

    fn build_message(&self, message: EmailMessage) -> Result<Message, EmailError> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| EmailError::Address(format!("invalid to address: {e}")))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(message.text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(message.html_body),
                    ),
            )
            .map_err(|e| EmailError::Message(e.to_string()))
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    #[instrument(skip(self, message), fields(subject = %message.subject))]
    async fn deliver(&self, message: EmailMessage) -> Result<(), EmailError> {
        let email = self.build_message(message)?;
        self.transport.send(email).await.map_err(|e| {
            error!(error = %e, "SMTP send failed");
            EmailError::Smtp(e.to_string())
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(from: &str) -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".into(),
            port: 587,
            username: "user".into(),
            password: "pass".into(),
            from: from.into(),
        }
    }

    #[tokio::test]
    async fn builds_multipart_message() {
        let mailer = SmtpMailer::new(&config("Tournament <contact@tournament.com>")).unwrap();
        let msg = mailer
            .build_message(EmailMessage {
                to: "bob@x.com".into(),
                subject: "Hello".into(),
                text_body: "plain".into(),
                html_body: "<p>html</p>".into(),
            })
            .unwrap();
        let raw = String::from_utf8(msg.formatted()).unwrap();
        assert!(raw.contains("To: bob@x.com"));
        assert!(raw.contains("multipart/alternative"));
    }

    #[tokio::test]
    async fn rejects_bad_addresses() {
        assert!(matches!(
            SmtpMailer::new(&config("not an address")),
            Err(EmailError::Address(_))
        ));

        let mailer = SmtpMailer::new(&config("contact@tournament.com")).unwrap();
        let res = mailer.build_message(EmailMessage {
            to: "nobody".into(),
            subject: "s".into(),
            text_body: String::new(),
            html_body: String::new(),
        });
        assert!(matches!(res, Err(EmailError::Address(_))));
    }
}
