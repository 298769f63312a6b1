use std::sync::Arc;

use anyhow::{anyhow, Context};
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use regex::Regex;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use crate::config::Config;

pub const MAX_RETRIES: u32 = 3;
pub const RETRY_DELAY_MS: u64 = 1000;

/// A fully rendered email with HTML and plaintext alternatives.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Replaces `{{key}}` markers. Values are escaped, so user text cannot inject markup.
pub fn render_template(template: &str, placeholders: &[(&str, String)]) -> String {
    let mut html = template.to_string();
    for (key, value) in placeholders {
        html = html.replace(&format!("{{{{{}}}}}", key), &ammonia::clean_text(value));
    }
    html
}

pub fn validate_email(email: &str) -> anyhow::Result<()> {
    let email_regex = Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .context("invalid email regex")?;

    if email_regex.is_match(email) {
        Ok(())
    } else {
        Err(anyhow!("Invalid email address format: {}", email))
    }
}

pub trait MailTransport: Send + Sync {
    fn deliver(&self, email: &RenderedEmail) -> anyhow::Result<()>;
}

/// Delivers through an SMTP relay. STARTTLS unless the port is 465.
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(host: &str, config: &Config) -> anyhow::Result<Self> {
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let builder = if config.smtp_port == 465 {
            SmtpTransport::relay(host)
        } else {
            SmtpTransport::starttls_relay(host)
        }
        .context("failed to create SMTP transport")?;

        let transport = builder.port(config.smtp_port).credentials(creds).build();
        let from = config
            .from_email
            .parse::<Mailbox>()
            .context("FROM_EMAIL is not a valid mailbox")?;

        Ok(Self { transport, from })
    }
}

impl MailTransport for SmtpMailer {
    fn deliver(&self, email: &RenderedEmail) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(email.to.parse::<Mailbox>().context("invalid recipient")?)
            .subject(email.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                email.text.clone(),
                email.html.clone(),
            ))
            .context("failed to build email")?;

        self.transport.send(&message).context("SMTP send failed")?;
        Ok(())
    }
}

/// Logs instead of sending. Used when no SMTP host is configured.
pub struct ConsoleMailer;

impl MailTransport for ConsoleMailer {
    fn deliver(&self, email: &RenderedEmail) -> anyhow::Result<()> {
        info!(
            to = %email.to,
            subject = %email.subject,
            "Email (not sent, SMTP disabled):\n{}",
            email.text
        );
        Ok(())
    }
}

pub fn transport_from_config(config: &Config) -> Arc<dyn MailTransport> {
    match config.smtp_host.as_deref() {
        Some(host) => match SmtpMailer::new(host, config) {
            Ok(mailer) => {
                info!("SMTP mailer configured for {}:{}", host, config.smtp_port);
                Arc::new(mailer)
            }
            Err(e) => {
                error!("SMTP setup failed: {:#}. Emails will be logged only.", e);
                Arc::new(ConsoleMailer)
            }
        },
        None => {
            warn!("SMTP_HOST not set. Emails will be logged only.");
            Arc::new(ConsoleMailer)
        }
    }
}

/// Sends on the blocking pool, retrying with exponential backoff.
pub async fn send_with_retries(
    transport: Arc<dyn MailTransport>,
    email: RenderedEmail,
    base_delay: Duration,
) -> anyhow::Result<()> {
    validate_email(&email.to)?;

    let email = Arc::new(email);
    let mut last_error = None;

    for attempt in 1..=MAX_RETRIES {
        let transport = Arc::clone(&transport);
        let job = Arc::clone(&email);
        let result = tokio::task::spawn_blocking(move || transport.deliver(&job))
            .await
            .map_err(|e| anyhow!("email task panicked: {}", e))
            .and_then(|r| r);

        match result {
            Ok(()) => {
                info!("Email '{}' sent to {}", email.subject, email.to);
                return Ok(());
            }
            Err(e) => {
                last_error = Some(e);
                if attempt < MAX_RETRIES {
                    let delay = base_delay * 2_u32.pow(attempt - 1);
                    warn!(
                        "Email send attempt {} failed for {}. Retrying in {}ms...",
                        attempt,
                        email.to,
                        delay.as_millis()
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    let err = last_error.unwrap_or_else(|| anyhow!("unknown email sending error"));
    Err(err.context(format!("failed after {} attempts", MAX_RETRIES)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyTransport {
        failures_left: AtomicU32,
        calls: AtomicU32,
    }

    impl MailTransport for FlakyTransport {
        fn deliver(&self, _email: &RenderedEmail) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                Err(anyhow!("relay unavailable"))
            } else {
                Ok(())
            }
        }
    }

    fn email() -> RenderedEmail {
        RenderedEmail {
            to: "ada@example.com".to_string(),
            subject: "Hi".to_string(),
            html: "<p>Hi</p>".to_string(),
            text: "Hi".to_string(),
        }
    }

    #[test]
    fn test_email_validation() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name+tag@domain.co.uk").is_ok());
        assert!(validate_email("invalid-email").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn test_render_escapes_values() {
        let html = render_template(
            "<p>{{name}} wrote {{body}}</p>",
            &[("name", "ada".to_string()), ("body", "<script>x</script>".to_string())],
        );
        assert!(html.starts_with("<p>ada wrote "));
        assert!(!html.contains("<script>"));
        assert!(!html.contains("{{"));
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let transport = Arc::new(FlakyTransport {
            failures_left: AtomicU32::new(2),
            calls: AtomicU32::new(0),
        });

        send_with_retries(transport.clone(), email(), Duration::from_millis(1))
            .await
            .unwrap();
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let transport = Arc::new(FlakyTransport {
            failures_left: AtomicU32::new(10),
            calls: AtomicU32::new(0),
        });

        let result = send_with_retries(transport.clone(), email(), Duration::from_millis(1)).await;
        assert!(result.is_err());
        assert_eq!(transport.calls.load(Ordering::SeqCst), MAX_RETRIES);
    }

    #[tokio::test]
    async fn test_rejects_invalid_recipient_without_sending() {
        let transport = Arc::new(FlakyTransport {
            failures_left: AtomicU32::new(0),
            calls: AtomicU32::new(0),
        });
        let mut bad = email();
        bad.to = "not-an-email".to_string();

        assert!(send_with_retries(transport.clone(), bad, Duration::from_millis(1))
            .await
            .is_err());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }
}
