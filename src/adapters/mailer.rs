use crate::domain::model::EmailMessage;
use crate::domain::ports::Mailer;
use crate::utils::error::Result;

/// Mailer that records outgoing mail in the log instead of delivering it.
#[derive(Debug, Clone)]
pub struct LogMailer {
    from_address: String,
}

impl LogMailer {
    pub fn new(from_address: impl Into<String>) -> Self {
        Self {
            from_address: from_address.into(),
        }
    }
}

impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        tracing::info!(
            from = %self.from_address,
            to = %message.to,
            subject = %message.subject,
            "📧 Sending email"
        );
        tracing::debug!(body = %message.body, "Email body");
        Ok(())
    }
}
