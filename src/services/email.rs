use crate::config::email::{frontend_url, EmailConfig};
use anyhow::{Context, Result};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

#[derive(Clone)]
pub struct EmailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: Option<String>,
    frontend_url: String,
}

impl EmailService {
    /// Without SMTP settings every send is a logged no-op.
    pub fn from_env() -> Self {
        let Some(cfg) = EmailConfig::from_env() else {
            return Self::disabled(frontend_url());
        };

        let creds = Credentials::new(cfg.smtp_username.clone(), cfg.smtp_password.clone());
        match AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host) {
            Ok(builder) => Self {
                transport: Some(builder.port(cfg.smtp_port).credentials(creds).build()),
                from_address: Some(cfg.from_address),
                frontend_url: cfg.frontend_url,
            },
            Err(e) => {
                tracing::warn!("Failed to build SMTP transport: {e}");
                Self::disabled(cfg.frontend_url)
            }
        }
    }

    pub fn disabled(frontend_url: String) -> Self {
        Self {
            transport: None,
            from_address: None,
            frontend_url,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    pub fn verification_link(&self, token: &str) -> String {
        format!("{}/verify-email?token={}", self.frontend_url, token)
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/reset-password?token={}", self.frontend_url, token)
    }

    pub async fn send_verification_email(
        &self,
        to: &str,
        token: &str,
        ttl_hours: i64,
    ) -> Result<()> {
        let body = format!(
            "Welcome to Inkpost! Confirm your email address with the link below:\n\n{}\n\nThe link is valid for {} hours.",
            self.verification_link(token),
            ttl_hours
        );
        self.send_email(to, "Confirm your Inkpost email", &body)
            .await
    }

    pub async fn send_password_reset_email(
        &self,
        to: &str,
        token: &str,
        ttl_minutes: i64,
    ) -> Result<()> {
        let body = format!(
            "Someone asked to reset the password of your Inkpost account.\n\nChoose a new password here:\n\n{}\n\nThe link is valid for {} minutes. Ignore this message if it wasn't you.",
            self.reset_link(token),
            ttl_minutes
        );
        self.send_email(to, "Reset your Inkpost password", &body)
            .await
    }

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let (Some(transport), Some(from_address)) = (&self.transport, &self.from_address) else {
            tracing::debug!("SMTP not configured, skipping email to {to}");
            return Ok(());
        };

        let from: Mailbox = from_address
            .parse()
            .with_context(|| format!("Invalid from address '{from_address}'"))?;
        let to_mailbox: Mailbox = to
            .parse()
            .with_context(|| format!("Invalid to address '{to}'"))?;

        let email = Message::builder()
            .from(from)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        transport.send(email).await?;
        tracing::info!("Email sent to {to}: {subject}");
        Ok(())
    }
}
