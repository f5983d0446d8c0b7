//! Outbound alert fan-out.
//!
//! Channels are independent: every configured channel gets one
//! delivery attempt set per alert, failures are recorded per channel
//! and never roll back the report that triggered them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use floodnet_config::{Alerts, AlertsTwilio, AlertsWebhook};
use floodnet_database::Report;
use floodnet_models::v0::{Category, Severity};
use floodnet_result::{create_error, Result};
use futures::future::join_all;

/// Deterministic alert content rendered from a report
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AlertMessage {
    /// Message body shared by every channel
    pub body: String,
    /// Public evidence URL, attached as media where supported
    pub media_url: String,
}

/// Civic activation code responders key into the municipal system
fn system_code(category: &Category) -> &'static str {
    match category {
        Category::FlashFlood => "1000002",
        Category::DrainageBlockage => "1000001",
    }
}

fn issue_label(category: &Category) -> &'static str {
    match category {
        Category::FlashFlood => "CRITICAL FLOOD",
        Category::DrainageBlockage => "DRAIN OVERFLOW",
    }
}

impl AlertMessage {
    pub fn from_report(report: &Report) -> AlertMessage {
        let severity = Severity::from_impact_level(report.impact_level);

        let place = if report.landmark.is_empty() {
            report.location.clone()
        } else {
            format!("{} (near {})", report.location, report.landmark)
        };

        AlertMessage {
            body: format!(
                "🚨 *GOVT ALERT SYSTEM* 🚨\n\n\
                 ⚠️ Issue: {} (severity {})\n\
                 🔢 *ACTIVATE CODE: {}*\n\
                 📍 Location: {}\n\
                 🗺 Map: https://maps.google.com/?q={},{}\n\n\
                 Take immediate action.",
                issue_label(&report.category),
                severity.label(),
                system_code(&report.category),
                place,
                report.latitude,
                report.longitude,
            ),
            media_url: report.image_url.clone(),
        }
    }
}

#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Stable channel name used as the key of the dispatch outcome
    fn name(&self) -> &'static str;

    /// Deliver one alert; failure affects this channel only
    async fn send(&self, alert: &AlertMessage) -> Result<()>;
}

/// Twilio Messages API channel (WhatsApp or SMS depending on the
/// configured sender), broadcasting to the configured recipient list
pub struct TwilioChannel {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from: String,
    recipients: Vec<String>,
}

impl TwilioChannel {
    pub fn new(config: &AlertsTwilio) -> TwilioChannel {
        TwilioChannel {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("reqwest Client"),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from: config.from.clone(),
            recipients: config.recipients.clone(),
        }
    }
}

#[async_trait]
impl AlertChannel for TwilioChannel {
    fn name(&self) -> &'static str {
        "twilio"
    }

    async fn send(&self, alert: &AlertMessage) -> Result<()> {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.account_sid
        );

        for recipient in &self.recipients {
            let response = self
                .client
                .post(&url)
                .basic_auth(&self.account_sid, Some(&self.auth_token))
                .form(&[
                    ("From", self.from.as_str()),
                    ("To", recipient.as_str()),
                    ("Body", alert.body.as_str()),
                    ("MediaUrl", alert.media_url.as_str()),
                ])
                .send()
                .await
                .map_err(|_| {
                    create_error!(DispatchFailed {
                        channel: "twilio".to_string()
                    })
                })?;

            if !response.status().is_success() {
                tracing::error!("twilio answered {} for {recipient}", response.status());
                return Err(create_error!(DispatchFailed {
                    channel: "twilio".to_string()
                }));
            }
        }

        Ok(())
    }
}

/// Generic webhook channel posting the alert as JSON
pub struct WebhookChannel {
    client: reqwest::Client,
    url: String,
}

impl WebhookChannel {
    pub fn new(config: &AlertsWebhook) -> WebhookChannel {
        WebhookChannel {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("reqwest Client"),
            url: config.url.clone(),
        }
    }
}

#[async_trait]
impl AlertChannel for WebhookChannel {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, alert: &AlertMessage) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(alert)
            .send()
            .await
            .map_err(|_| {
                create_error!(DispatchFailed {
                    channel: "webhook".to_string()
                })
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            tracing::error!("webhook answered {}", response.status());
            Err(create_error!(DispatchFailed {
                channel: "webhook".to_string()
            }))
        }
    }
}

/// Per-channel results of one alert fan-out
#[derive(Debug)]
pub struct DispatchOutcome {
    pub per_channel: HashMap<&'static str, Result<()>>,
}

impl DispatchOutcome {
    pub fn delivered(&self) -> usize {
        self.per_channel.values().filter(|r| r.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.per_channel.len() - self.delivered()
    }
}

/// Fans one alert out to every configured channel concurrently
pub struct AlertDispatcher {
    channels: Vec<Arc<dyn AlertChannel>>,
    max_attempts: u32,
}

impl AlertDispatcher {
    pub fn new(channels: Vec<Arc<dyn AlertChannel>>, max_attempts: u32) -> AlertDispatcher {
        AlertDispatcher {
            channels,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Build the production channel set; channels without credentials
    /// configured are left out
    pub fn from_config(config: &Alerts) -> AlertDispatcher {
        let mut channels: Vec<Arc<dyn AlertChannel>> = Vec::new();

        if !config.twilio.account_sid.is_empty() && !config.twilio.recipients.is_empty() {
            channels.push(Arc::new(TwilioChannel::new(&config.twilio)));
        }

        if !config.webhook.url.is_empty() {
            channels.push(Arc::new(WebhookChannel::new(&config.webhook)));
        }

        AlertDispatcher::new(channels, config.max_attempts)
    }

    /// Send the alert for a report on every channel, joining the
    /// independent sends into one outcome
    pub async fn dispatch(&self, report: &Report) -> DispatchOutcome {
        let alert = AlertMessage::from_report(report);

        let sends = self.channels.iter().map(|channel| {
            let alert = &alert;
            async move {
                let mut result = channel.send(alert).await;
                for _ in 1..self.max_attempts {
                    if result.is_ok() {
                        break;
                    }
                    result = channel.send(alert).await;
                }
                (channel.name(), result)
            }
        });

        DispatchOutcome {
            per_channel: join_all(sends).await.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use floodnet_database::Report;
    use floodnet_models::v0::{Category, ReportStatus};
    use floodnet_result::{create_error, Result};

    use super::{AlertChannel, AlertDispatcher, AlertMessage};

    fn report() -> Report {
        Report::new(
            26.1579,
            91.6676,
            "Zoo Road".to_string(),
            "Ganeshguri flyover".to_string(),
            Category::FlashFlood,
            3,
            "http://localhost/evidence/a.jpg".to_string(),
            ReportStatus::Approved,
            "flood detected".to_string(),
        )
    }

    pub(crate) struct CountingChannel {
        name: &'static str,
        fail_first: usize,
        calls: AtomicUsize,
    }

    impl CountingChannel {
        pub fn new(name: &'static str, fail_first: usize) -> CountingChannel {
            CountingChannel {
                name,
                fail_first,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AlertChannel for CountingChannel {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn send(&self, _alert: &AlertMessage) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                Err(create_error!(DispatchFailed {
                    channel: self.name.to_string()
                }))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn message_content_is_deterministic() {
        let alert = AlertMessage::from_report(&report());
        assert!(alert.body.contains("CRITICAL FLOOD"));
        assert!(alert.body.contains("severity high"));
        assert!(alert.body.contains("ACTIVATE CODE: 1000002"));
        assert!(alert.body.contains("Zoo Road (near Ganeshguri flyover)"));
        assert!(alert
            .body
            .contains("https://maps.google.com/?q=26.1579,91.6676"));
        assert_eq!(alert.media_url, "http://localhost/evidence/a.jpg");
    }

    #[test]
    fn drainage_reports_carry_the_drain_code() {
        let mut report = report();
        report.category = Category::DrainageBlockage;
        report.impact_level = 1;

        let alert = AlertMessage::from_report(&report);
        assert!(alert.body.contains("DRAIN OVERFLOW"));
        assert!(alert.body.contains("ACTIVATE CODE: 1000001"));
        assert!(alert.body.contains("severity low"));
    }

    #[async_std::test]
    async fn one_failing_channel_does_not_block_the_other() {
        let dispatcher = AlertDispatcher::new(
            vec![
                Arc::new(CountingChannel::new("healthy", 0)),
                Arc::new(CountingChannel::new("broken", usize::MAX)),
            ],
            1,
        );

        let outcome = dispatcher.dispatch(&report()).await;
        assert_eq!(outcome.delivered(), 1);
        assert_eq!(outcome.failed(), 1);
        assert!(outcome.per_channel["healthy"].is_ok());
        assert!(outcome.per_channel["broken"].is_err());
    }

    #[async_std::test]
    async fn retry_policy_recovers_transient_failures() {
        let channel = Arc::new(CountingChannel::new("flaky", 1));
        let dispatcher = AlertDispatcher::new(vec![channel.clone()], 3);

        let outcome = dispatcher.dispatch(&report()).await;
        assert!(outcome.per_channel["flaky"].is_ok());
        assert_eq!(channel.calls.load(Ordering::SeqCst), 2);
    }

    #[async_std::test]
    async fn single_attempt_by_default() {
        let channel = Arc::new(CountingChannel::new("broken", usize::MAX));
        let dispatcher = AlertDispatcher::new(vec![channel.clone()], 1);

        let outcome = dispatcher.dispatch(&report()).await;
        assert!(outcome.per_channel["broken"].is_err());
        assert_eq!(channel.calls.load(Ordering::SeqCst), 1);
    }
}
