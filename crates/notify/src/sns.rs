//! Amazon SNS notifier.
//!
//! Publishes to a single topic. The topic is optional at construction so a
//! process with incomplete configuration can still start; publishing then
//! fails with [`NotifyError::Config`].

use async_trait::async_trait;
use aws_sdk_sns::error::DisplayErrorContext;
use tracing::debug;

use crate::traits::{Notification, Notifier, NotifyError};

pub struct SnsNotifier {
    client: aws_sdk_sns::Client,
    topic_arn: Option<String>,
}

impl SnsNotifier {
    pub fn new(sdk_config: &aws_types::SdkConfig, topic_arn: Option<String>) -> Self {
        Self {
            client: aws_sdk_sns::Client::new(sdk_config),
            topic_arn,
        }
    }

    fn topic(&self) -> Result<&str, NotifyError> {
        self.topic_arn
            .as_deref()
            .ok_or_else(|| NotifyError::Config("SNS_TOPIC_ARN not set".into()))
    }
}

fn sdk_error<E>(err: E) -> NotifyError
where
    E: std::error::Error + Send + Sync + 'static,
{
    NotifyError::Sns(DisplayErrorContext(err).to_string())
}

#[async_trait]
impl Notifier for SnsNotifier {
    async fn publish(&self, notification: &Notification) -> Result<String, NotifyError> {
        let topic = self.topic()?;
        debug!(topic, subject = %notification.subject, "SNS publish");

        let output = self
            .client
            .publish()
            .topic_arn(topic)
            .subject(&notification.subject)
            .message(&notification.body)
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(output.message_id().unwrap_or_default().to_string())
    }

    async fn check(&self) -> Result<(), NotifyError> {
        let topic = self.topic()?;
        self.client
            .get_topic_attributes()
            .topic_arn(topic)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "sns"
    }
}
