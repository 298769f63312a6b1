// service/notification_service.rs
//! Email outbox. Handlers enqueue jobs and return; a background worker
//! renders and delivers them.
use std::sync::Arc;

use tokio::{sync::mpsc, task::JoinHandle, time::Duration};
use uuid::Uuid;

use crate::{
    mail::{
        mails,
        sendmail::{send_with_retries, MailTransport, RenderedEmail, RETRY_DELAY_MS},
    },
    models::{ordermodel::PaymentGateway, registrationmodel::AccountCategory},
    utils::otp_generator::OTP_TTL_MINUTES,
};

#[derive(Debug, Clone, PartialEq)]
pub enum EmailJob {
    Otp {
        email: String,
        username: String,
        otp: String,
    },
    Welcome {
        email: String,
        username: String,
        category: AccountCategory,
    },
    OrderReceipt {
        email: String,
        username: String,
        gig_title: String,
        amount: f64,
        currency: String,
        reference: String,
        gateway: PaymentGateway,
    },
    NewMessage {
        email: String,
        username: String,
        sender: String,
        preview: String,
        conversation_id: Uuid,
    },
    JobApplication {
        email: String,
        username: String,
        applicant: String,
        job_title: String,
        job_id: Uuid,
    },
}

impl EmailJob {
    pub fn recipient(&self) -> &str {
        match self {
            EmailJob::Otp { email, .. }
            | EmailJob::Welcome { email, .. }
            | EmailJob::OrderReceipt { email, .. }
            | EmailJob::NewMessage { email, .. }
            | EmailJob::JobApplication { email, .. } => email,
        }
    }

    pub fn render(&self, app_url: &str) -> RenderedEmail {
        match self {
            EmailJob::Otp { email, username, otp } => {
                mails::otp_email(email, username, otp, OTP_TTL_MINUTES)
            }
            EmailJob::Welcome {
                email,
                username,
                category,
            } => mails::welcome_email(email, username, *category, app_url),
            EmailJob::OrderReceipt {
                email,
                username,
                gig_title,
                amount,
                currency,
                reference,
                gateway,
            } => mails::order_receipt_email(
                email,
                username,
                gig_title,
                *amount,
                currency,
                reference,
                gateway.to_str(),
                app_url,
            ),
            EmailJob::NewMessage {
                email,
                username,
                sender,
                preview,
                conversation_id,
            } => mails::new_message_email(
                email,
                username,
                sender,
                preview,
                &conversation_id.to_string(),
                app_url,
            ),
            EmailJob::JobApplication {
                email,
                username,
                applicant,
                job_title,
                job_id,
            } => mails::job_application_email(
                email,
                username,
                applicant,
                job_title,
                &job_id.to_string(),
                app_url,
            ),
        }
    }
}

/// Accepts email jobs. Enqueueing never fails the caller.
pub trait Outbox: Send + Sync {
    fn enqueue(&self, job: EmailJob);
}

#[derive(Debug, Clone)]
pub struct EmailOutbox {
    sender: mpsc::UnboundedSender<EmailJob>,
}

impl EmailOutbox {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<EmailJob>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Outbox for EmailOutbox {
    fn enqueue(&self, job: EmailJob) {
        let recipient = job.recipient().to_string();
        if let Err(e) = self.sender.send(job) {
            tracing::error!("Email outbox closed, dropping email to {}: {}", recipient, e);
        }
    }
}

/// Drains the outbox until every sender is dropped. Each job is delivered on
/// its own task so one slow retry does not hold up the queue.
pub fn spawn_email_worker(
    mut receiver: mpsc::UnboundedReceiver<EmailJob>,
    transport: Arc<dyn MailTransport>,
    app_url: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("Email worker started");
        while let Some(job) = receiver.recv().await {
            let email = job.render(&app_url);
            let transport = Arc::clone(&transport);
            tokio::spawn(async move {
                let to = email.to.clone();
                if let Err(e) =
                    send_with_retries(transport, email, Duration::from_millis(RETRY_DELAY_MS)).await
                {
                    tracing::error!("Email to {} failed: {:#}", to, e);
                }
            });
        }
        tracing::info!("Email worker stopped");
    })
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Records jobs instead of sending them.
    #[derive(Default)]
    pub struct CapturingOutbox {
        pub jobs: Mutex<Vec<EmailJob>>,
    }

    impl CapturingOutbox {
        pub fn jobs(&self) -> Vec<EmailJob> {
            self.jobs.lock().unwrap().clone()
        }

        pub fn last_otp_for(&self, email: &str) -> Option<String> {
            self.jobs().into_iter().rev().find_map(|job| match job {
                EmailJob::Otp { email: to, otp, .. } if to == email => Some(otp),
                _ => None,
            })
        }
    }

    impl Outbox for CapturingOutbox {
        fn enqueue(&self, job: EmailJob) {
            self.jobs.lock().unwrap().push(job);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct RecordingTransport {
        sent: Mutex<Vec<RenderedEmail>>,
    }

    impl MailTransport for RecordingTransport {
        fn deliver(&self, email: &RenderedEmail) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_worker_delivers_enqueued_jobs() {
        let transport = Arc::new(RecordingTransport {
            sent: Mutex::new(Vec::new()),
        });
        let (outbox, receiver) = EmailOutbox::channel();
        let worker = spawn_email_worker(receiver, transport.clone(), "http://app".to_string());

        outbox.enqueue(EmailJob::Otp {
            email: "ada@example.com".to_string(),
            username: "ada".to_string(),
            otp: "123456".to_string(),
        });
        drop(outbox);
        worker.await.unwrap();

        // Delivery runs on a detached task; give it a moment.
        for _ in 0..50 {
            if !transport.sent.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ada@example.com");
        assert!(sent[0].text.contains("123456"));
    }

    #[test]
    fn test_render_uses_category_content() {
        let job = EmailJob::Welcome {
            email: "o@example.com".to_string(),
            username: "acme".to_string(),
            category: AccountCategory::Organization,
        };
        assert_eq!(job.recipient(), "o@example.com");
        assert!(job.render("http://app").text.contains("Post a job"));
    }
}
