use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;

use crate::config::EmailConfig;

/// Outbound email collaborator. Best-effort by design: a missing SMTP
/// configuration or a delivery failure is logged and never fails the
/// request that triggered it.
#[derive(Clone)]
pub struct Mailer {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: String,
    client_url: String,
}

impl Mailer {
    pub fn new(config: &EmailConfig, client_url: &str) -> Self {
        let transport = match (&config.user, &config.password) {
            (Some(user), Some(password)) => {
                match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host) {
                    Ok(builder) => Some(Arc::new(
                        builder
                            .port(config.smtp_port)
                            .credentials(Credentials::new(user.clone(), password.clone()))
                            .build(),
                    )),
                    Err(e) => {
                        tracing::warn!("SMTP relay setup failed, emails disabled: {e}");
                        None
                    }
                }
            }
            _ => {
                tracing::warn!(
                    "EMAIL_USER/EMAIL_PASSWORD not configured, emails will be logged instead"
                );
                None
            }
        };

        Self {
            transport,
            from: config.from.clone(),
            client_url: client_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn send_verification(&self, to: &str, first_name: &str, code: &str) {
        let subject = "Verify Your Sanctuary Connect Account";
        let text = format!(
            "Hi {first_name},\n\nWelcome to Sanctuary Connect!\n\n\
             Your verification code is: {code}\n\n\
             This code will expire in 10 minutes.\n\n\
             If you didn't create this account, please ignore this email."
        );
        let html = format!(
            "<p>Hi {first_name},</p>\
             <p>Welcome to Sanctuary Connect! To complete your account setup, \
             please verify your email address using the code below:</p>\
             <p style=\"font-size:32px;font-weight:bold;letter-spacing:2px;\
             font-family:monospace\">{code}</p>\
             <p>This verification code will expire in <strong>10 minutes</strong>.</p>"
        );
        self.send(to, subject, text, html, Some(code)).await;
    }

    pub async fn send_password_reset(&self, to: &str, first_name: &str, reset_token: &str) {
        let reset_link = format!("{}/reset-password?token={}", self.client_url, reset_token);
        let subject = "Reset Your Sanctuary Connect Password";
        let text = format!(
            "Hi {first_name},\n\n\
             We received a request to reset your Sanctuary Connect password.\n\n\
             Reset it here: {reset_link}\n\n\
             This link will expire in 1 hour. If you didn't request this, \
             you can ignore this email."
        );
        let html = format!(
            "<p>Hi {first_name},</p>\
             <p>We received a request to reset your Sanctuary Connect password. \
             Click the link below to reset it:</p>\
             <p><a href=\"{reset_link}\">Reset Password</a></p>\
             <p>This link will expire in <strong>1 hour</strong>. \
             If you didn't request this, you can ignore this email.</p>"
        );
        self.send(to, subject, text, html, None).await;
    }

    pub async fn send_welcome(&self, to: &str, church_name: &str) {
        let subject = "Welcome to Sanctuary Connect";
        let text = format!(
            "Welcome aboard!\n\n{church_name} is now set up on Sanctuary Connect.\n\n\
             Log in to start managing your members, events, and giving."
        );
        let html = format!(
            "<p>Welcome aboard!</p>\
             <p><strong>{church_name}</strong> is now set up on Sanctuary Connect.</p>\
             <p>Log in to start managing your members, events, and giving.</p>"
        );
        self.send(to, subject, text, html, None).await;
    }

    async fn send(&self, to: &str, subject: &str, text: String, html: String, code: Option<&str>) {
        let Some(transport) = &self.transport else {
            match code {
                Some(code) => tracing::warn!("Email not configured; code for {to}: {code}"),
                None => tracing::warn!("Email not configured; skipped '{subject}' to {to}"),
            }
            return;
        };

        let message = Message::builder()
            .from(match self.from.parse() {
                Ok(from) => from,
                Err(e) => {
                    tracing::error!("Invalid from address '{}': {e}", self.from);
                    return;
                }
            })
            .to(match to.parse() {
                Ok(to) => to,
                Err(e) => {
                    tracing::error!("Invalid recipient address '{to}': {e}");
                    return;
                }
            })
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    ),
            );

        match message {
            Ok(message) => {
                if let Err(e) = transport.send(message).await {
                    tracing::error!("Failed to send '{subject}' to {to}: {e}");
                } else {
                    tracing::info!("Email '{subject}' sent to {to}");
                }
            }
            Err(e) => tracing::error!("Failed to build email '{subject}': {e}"),
        }
    }
}
