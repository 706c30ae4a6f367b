use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info, warn};

use crate::config::SmtpConfig;

/// Outbound notification hook fired after an answer is stored.
///
/// Best-effort by contract: `notify_answer` reports success as a bool and
/// never fails the caller. When `is_configured` is false the workflow skips
/// the call entirely.
#[async_trait]
pub trait AnswerNotifier: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn notify_answer(&self, name: &str, email: &str, answer: &str) -> bool;
}

/// SMTP-backed notifier. Built without a transport when SMTP settings are
/// absent or unusable, in which case it reports itself unconfigured.
pub struct EmailNotifier {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    sender: Option<Mailbox>,
}

impl EmailNotifier {
    pub fn from_config(config: Option<&SmtpConfig>) -> Self {
        let Some(config) = config else {
            return Self::unconfigured();
        };

        // Port 465 is implicit TLS; everything else negotiates STARTTLS.
        let builder = if config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        };

        let transport = match builder {
            Ok(builder) => builder
                .port(config.port)
                .credentials(Credentials::new(
                    config.username.clone(),
                    config.password.clone(),
                ))
                .build(),
            Err(err) => {
                warn!(host = %config.host, %err, "smtp transport rejected; notifications disabled");
                return Self::unconfigured();
            }
        };

        let sender = match config.username.parse::<Mailbox>() {
            Ok(mailbox) => mailbox,
            Err(err) => {
                warn!(%err, "smtp username is not a mailable address; notifications disabled");
                return Self::unconfigured();
            }
        };

        Self {
            transport: Some(transport),
            sender: Some(sender),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            transport: None,
            sender: None,
        }
    }
}

#[async_trait]
impl AnswerNotifier for EmailNotifier {
    fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    async fn notify_answer(&self, name: &str, email: &str, answer: &str) -> bool {
        let (Some(transport), Some(sender)) = (&self.transport, &self.sender) else {
            return false;
        };

        let recipient: Mailbox = match email.parse() {
            Ok(mailbox) => mailbox,
            Err(err) => {
                warn!(%email, %err, "recipient address rejected");
                return false;
            }
        };

        let message = match Message::builder()
            .from(sender.clone())
            .to(recipient)
            .subject(format!("reply to {name}'s question"))
            .body(answer.to_string())
        {
            Ok(message) => message,
            Err(err) => {
                error!(%err, "failed to compose answer notification");
                return false;
            }
        };

        match transport.send(message).await {
            Ok(_) => {
                info!(%email, "answer notification sent");
                true
            }
            Err(err) => {
                error!(%email, %err, "answer notification failed");
                false
            }
        }
    }
}
