use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use roaming_outcomes::config::LoggingConfig;
use roaming_outcomes::domain::outcome::text::LINE_SEPARATOR;
use roaming_outcomes::application::roaming::StatusPushClient;
use roaming_outcomes::domain::{EvseStatus, EvseStatusUpdate, RoamingProviderId};
use roaming_outcomes::{
    init_tracing, AppConfig, CancelSignal, DestinationOutcome, FanOutPusher, OutcomeKind, ProviderError,
    PushClient, RequestContext, RoamingProviderRegistry, StatusPush, StatusPushOutcome,
};

enum Answer {
    Accept(&'static str),
    AcceptWithWarning(&'static str),
    /// The partner's own request budget expires; every update is rejected
    PartnerTimeout(Duration),
    Fault(&'static str),
    Panic,
    Hang,
    /// Reply names another provider
    Impersonate(&'static str),
    /// Reply belongs to an earlier request
    Stale,
}

struct ScriptedProvider {
    id: RoamingProviderId,
    delay: Duration,
    answer: Answer,
}

impl ScriptedProvider {
    fn new(id: &str, delay: Duration, answer: Answer) -> Arc<StatusPushClient> {
        Arc::new(Self {
            id: id.into(),
            delay,
            answer,
        })
    }
}

#[async_trait]
impl PushClient<StatusPush, EvseStatusUpdate> for ScriptedProvider {
    fn provider_id(&self) -> &RoamingProviderId {
        &self.id
    }

    async fn push(
        &self,
        ctx: &RequestContext,
        command: &StatusPush,
    ) -> Result<StatusPushOutcome, ProviderError> {
        tokio::time::sleep(self.delay).await;
        match &self.answer {
            Answer::Accept(description) => Ok(DestinationOutcome::new(
                ctx,
                self.id.clone(),
                OutcomeKind::Success,
                *description,
            )
            .expect("success is terminal")),
            Answer::AcceptWithWarning(warning) => {
                Ok(DestinationOutcome::success(ctx, self.id.clone()).with_warnings([*warning]))
            }
            Answer::PartnerTimeout(after) => Ok(DestinationOutcome::timeout(ctx, self.id.clone(), *after)
                .with_rejected_items(command.iter().cloned())
                .with_warnings(["timeout"])),
            Answer::Fault(message) => Err(ProviderError::Transport(message.to_string())),
            Answer::Panic => panic!("client bug"),
            Answer::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(DestinationOutcome::success(ctx, self.id.clone()))
            }
            Answer::Impersonate(other) => Ok(DestinationOutcome::success(ctx, (*other).into())),
            Answer::Stale => {
                let earlier = RequestContext::new(ctx.sender.clone());
                Ok(DestinationOutcome::success(&earlier, self.id.clone()))
            }
        }
    }
}

fn updates() -> Arc<StatusPush> {
    Arc::new(vec![
        EvseStatusUpdate::new("DE*GEF*E0001*1", EvseStatus::Charging),
        EvseStatusUpdate::new("DE*GEF*E0002*1", EvseStatus::Available),
    ])
}

fn pusher(
    clients: Vec<Arc<StatusPushClient>>,
    budget: Duration,
) -> FanOutPusher<StatusPush, EvseStatusUpdate> {
    let _ = init_tracing(&LoggingConfig::default());
    let registry = RoamingProviderRegistry::new();
    for client in clients {
        registry.register(client, true);
    }
    FanOutPusher::new(registry.shared(), budget)
}

#[tokio::test(start_paused = true)]
async fn two_successes_and_a_partner_timeout_merge_to_partial() {
    let command = updates();
    let pusher = pusher(
        vec![
            ScriptedProvider::new("A", Duration::from_millis(50), Answer::Accept("A accepted")),
            ScriptedProvider::new("B", Duration::from_millis(20), Answer::Accept("B accepted")),
            ScriptedProvider::new(
                "C",
                Duration::from_secs(10),
                Answer::PartnerTimeout(Duration::from_secs(10)),
            ),
        ],
        Duration::from_secs(30),
    );
    let ctx = RequestContext::new("roaming-hub");

    let merged = pusher.push(&ctx, command.clone()).await;

    assert_eq!(merged.kind(), OutcomeKind::Partial);
    assert_eq!(merged.correlation_id(), ctx.correlation_id);
    assert_eq!(merged.destination().map(|d| d.as_str()), Some("A"));
    assert_eq!(merged.rejected_items(), command.as_slice());
    assert_eq!(merged.warnings().as_slice(), &["timeout"]);

    let lines: Vec<&str> = merged.description().split(LINE_SEPARATOR).collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "A accepted");
    assert_eq!(lines[1], "B accepted");
    assert!(lines[2].contains("10"));

    let kinds: Vec<_> = merged.breakdown().iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![OutcomeKind::Success, OutcomeKind::Success, OutcomeKind::Timeout]
    );
    assert!(merged.runtime().unwrap() >= Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn all_providers_accepting_gives_success() {
    let pusher = pusher(
        vec![
            ScriptedProvider::new("OICP", Duration::from_millis(5), Answer::AcceptWithWarning("slow partner")),
            ScriptedProvider::new("OCPI", Duration::from_millis(1), Answer::AcceptWithWarning("slow partner")),
        ],
        Duration::from_secs(30),
    );
    let ctx = RequestContext::new("roaming-hub");

    let merged = pusher.push(&ctx, updates()).await;

    assert_eq!(merged.kind(), OutcomeKind::Success);
    assert!(merged.rejected_items().is_empty());
    assert_eq!(merged.warnings().as_slice(), &["slow partner", "slow partner"]);
}

#[tokio::test(start_paused = true)]
async fn budget_expiry_turns_silent_provider_into_timeout() {
    let command = updates();
    let pusher = pusher(
        vec![
            ScriptedProvider::new("A", Duration::ZERO, Answer::Accept("")),
            ScriptedProvider::new("B", Duration::ZERO, Answer::Hang),
        ],
        Duration::from_secs(5),
    );
    let ctx = RequestContext::new("roaming-hub");

    let merged = pusher.push(&ctx, command.clone()).await;

    assert_eq!(merged.kind(), OutcomeKind::Partial);
    assert_eq!(merged.rejected_items(), command.as_slice());
    let silent = &merged.breakdown()[1];
    assert_eq!(silent.destination, Some(RoamingProviderId::new("B")));
    assert_eq!(silent.kind, OutcomeKind::Timeout);
    assert!(silent.description.contains('5'));
    assert_eq!(merged.warnings().len(), 1);
    assert!(merged.warnings().as_slice()[0].contains("B did not answer"));
}

#[tokio::test(start_paused = true)]
async fn cancellation_reports_outstanding_providers_as_timeout() {
    let pusher = pusher(
        vec![
            ScriptedProvider::new("A", Duration::ZERO, Answer::Accept("")),
            ScriptedProvider::new("B", Duration::ZERO, Answer::Hang),
            ScriptedProvider::new("C", Duration::ZERO, Answer::Hang),
        ],
        Duration::from_secs(60),
    );
    let ctx = RequestContext::new("roaming-hub");
    let cancel = CancelSignal::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let merged = pusher.push_with_cancel(&ctx, updates(), &cancel).await;

    assert_eq!(merged.kind(), OutcomeKind::Partial);
    assert_eq!(merged.breakdown().len(), 3);
    assert_eq!(merged.breakdown()[1].kind, OutcomeKind::Timeout);
    assert_eq!(merged.breakdown()[2].kind, OutcomeKind::Timeout);
    assert_eq!(merged.rejected_items().len(), 4);
    assert!(merged.runtime().unwrap() < Duration::from_secs(60));
}

#[tokio::test]
async fn faults_become_error_outcomes() {
    let pusher = pusher(
        vec![
            ScriptedProvider::new("A", Duration::ZERO, Answer::Fault("connection reset")),
            ScriptedProvider::new("B", Duration::ZERO, Answer::Panic),
        ],
        Duration::from_secs(5),
    );
    let ctx = RequestContext::new("roaming-hub");

    let merged = pusher.push(&ctx, updates()).await;

    assert_eq!(merged.kind(), OutcomeKind::Error);
    assert_eq!(merged.breakdown()[0].description, "Transport error: connection reset");
    assert!(merged.breakdown()[1].description.starts_with("Push task failed"));
    assert_eq!(merged.rejected_items().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn slots_follow_provider_order_not_completion_order() {
    let pusher = pusher(
        vec![
            ScriptedProvider::new("Z", Duration::ZERO, Answer::Accept("z")),
            ScriptedProvider::new("A", Duration::from_secs(3), Answer::Accept("a")),
        ],
        Duration::from_secs(30),
    );
    let ctx = RequestContext::new("roaming-hub");

    let merged = pusher.push(&ctx, updates()).await;

    assert_eq!(merged.destination().map(|d| d.as_str()), Some("A"));
    assert_eq!(merged.description(), format!("a{}z", LINE_SEPARATOR));
}

#[tokio::test]
async fn disabled_provider_answers_admin_down_without_contact() {
    let config = AppConfig::from_toml_str(
        r#"
        [push]
        timeout_secs = 5

        [[providers]]
        id = "OCPI"
        enabled = false
        "#,
    )
    .unwrap();
    let registry = RoamingProviderRegistry::from_config(
        &config.providers,
        [ScriptedProvider::new("OCPI", Duration::ZERO, Answer::Panic)],
    );
    let pusher = FanOutPusher::from_config(registry.shared(), &config.push);
    assert_eq!(pusher.budget(), Duration::from_secs(5));
    let ctx = RequestContext::new("roaming-hub");

    let merged = pusher.push(&ctx, updates()).await;

    assert_eq!(merged.kind(), OutcomeKind::AdminDown);
    assert_eq!(merged.breakdown().len(), 1);
    assert_eq!(merged.rejected_items().len(), 2);
}

#[tokio::test]
async fn no_providers_gives_error_sentinel() {
    let pusher = pusher(Vec::new(), Duration::from_secs(5));
    let ctx = RequestContext::new("roaming-hub");

    let merged = pusher.push(&ctx, updates()).await;

    assert_eq!(merged.kind(), OutcomeKind::Error);
    assert_eq!(merged.description(), "!");
    assert!(merged.destination().is_none());
}

#[tokio::test]
async fn reply_for_another_provider_is_error_under_registered_name() {
    let command = updates();
    let pusher = pusher(
        vec![
            ScriptedProvider::new("A", Duration::ZERO, Answer::Accept("")),
            ScriptedProvider::new("B", Duration::ZERO, Answer::Impersonate("SOMEONE_ELSE")),
        ],
        Duration::from_secs(5),
    );
    let ctx = RequestContext::new("roaming-hub");

    let merged = pusher.push(&ctx, command.clone()).await;

    assert_eq!(merged.kind(), OutcomeKind::Partial);
    assert_eq!(merged.destination().map(|d| d.as_str()), Some("A"));
    let impostor = &merged.breakdown()[1];
    assert_eq!(impostor.destination, Some(RoamingProviderId::new("B")));
    assert_eq!(impostor.kind, OutcomeKind::Error);
    assert_eq!(merged.rejected_items(), command.as_slice());
}

#[tokio::test]
async fn reply_for_another_request_is_error() {
    let pusher = pusher(
        vec![ScriptedProvider::new("A", Duration::ZERO, Answer::Stale)],
        Duration::from_secs(5),
    );
    let ctx = RequestContext::new("roaming-hub");

    let merged = pusher.push(&ctx, updates()).await;

    assert_eq!(merged.kind(), OutcomeKind::Error);
    assert_eq!(merged.correlation_id(), ctx.correlation_id);
    assert_eq!(merged.breakdown()[0].description, "Provider answered for another request");
    assert_eq!(merged.rejected_items().len(), 2);
}
