use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use tracing::debug;

use crate::config::SmtpConfig;

/// Outbound mail seam. The SMTP transport lives behind this trait so the
/// handlers stay testable without a relay.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// Shared SMTP transport, constructed once at startup.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    timeout: Duration,
}

impl SmtpMailer {
    pub fn from_config(cfg: &SmtpConfig) -> anyhow::Result<Self> {
        // Plain connection; relays like Mailtrap upgrade with STARTTLS.
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(cfg.host.as_str()).port(cfg.port);
        if let (Some(user), Some(pass)) = (&cfg.username, &cfg.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(Self {
            transport: builder.build(),
            sender: cfg.sender.parse()?,
            timeout: Duration::from_secs(cfg.timeout_secs),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.sender.clone())
            .to(to.parse()?)
            .subject(subject)
            .body(body.to_string())?;

        tokio::time::timeout(self.timeout, self.transport.send(message))
            .await
            .map_err(|_| anyhow::anyhow!("smtp send timed out after {:?}", self.timeout))??;
        debug!(to, subject, "email dispatched");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".into(),
            port: 2525,
            username: Some("user".into()),
            password: Some("pass".into()),
            sender: "noreply@example.com".into(),
            timeout_secs: 10,
        }
    }

    #[test]
    fn builds_transport_from_config() {
        let mailer = SmtpMailer::from_config(&config());
        assert!(mailer.is_ok());
    }

    #[test]
    fn rejects_malformed_sender_address() {
        let mut cfg = config();
        cfg.sender = "not an address".into();
        assert!(SmtpMailer::from_config(&cfg).is_err());
    }
}
