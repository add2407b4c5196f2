//! Connectivity checks for each external component.

use chrono::Utc;
use serde::Serialize;

use crate::pipeline::Pipeline;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentCheck {
    pub component: String,
    pub ok: bool,
    pub detail: String,
}

impl ComponentCheck {
    fn from_result<E: std::fmt::Display>(component: &str, result: Result<String, E>) -> Self {
        let component = component.to_string();
        match result {
            Ok(detail) => Self { component, ok: true, detail },
            Err(e) => Self { component, ok: false, detail: e.to_string() },
        }
    }
}

/// Check configuration, the query engine, the notifier and the model.
///
/// No query is submitted. The model gets one tiny canary request when
/// enrichment is enabled. A test notification is published only when
/// `send_test` is set.
pub async fn check_components(pipeline: &Pipeline, send_test: bool) -> Vec<ComponentCheck> {
    let config = ComponentCheck::from_result(
        "config",
        pipeline
            .queries()
            .map(|queries| format!("{} detectors configured", queries.len())),
    );

    let athena = ComponentCheck::from_result(
        "athena",
        pipeline.engine().ping().await.map(|()| "workgroups reachable".to_string()),
    );

    let notifier = pipeline.notifier();
    let notify = ComponentCheck::from_result(
        notifier.channel_name(),
        notifier.check().await.map(|()| "topic reachable".to_string()),
    );

    let enricher = pipeline.enricher();
    let llm = match (enricher.provider_name(), enricher.canary().await) {
        (Some(provider), Some(result)) => ComponentCheck::from_result(
            "llm",
            result.map(|_| format!("enabled via {provider}, model answered")),
        ),
        _ => ComponentCheck {
            component: "llm".to_string(),
            ok: true,
            detail: "disabled, template narratives only".to_string(),
        },
    };

    let mut checks = vec![config, athena, notify, llm];

    if send_test {
        let notice = pipeline.composer().test_notice(Utc::now());
        checks.push(ComponentCheck::from_result(
            "delivery",
            notifier
                .publish(&notice)
                .await
                .map(|message_id| format!("test notification sent ({message_id})")),
        ));
    }

    checks
}
