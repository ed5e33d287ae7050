//! Turn handling: verification, address resolution and intent dispatch

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::envelope::{RequestEnvelope, ResponseEnvelope, SkillRequest};
use crate::config::SkillConfig;
use crate::device_address::{DeviceAddressLookup, DeviceAddressRequest};
use crate::error::FailureResponse;
use crate::finder::ClosestErService;
use crate::messages;
use crate::models::SessionState;
use crate::{CareFinderError, Result};

pub const CLOSEST_ER_INTENT: &str = "ClosestErIntent";
pub const HELP_INTENT: &str = "AMAZON.HelpIntent";
pub const CANCEL_INTENT: &str = "AMAZON.CancelIntent";
pub const STOP_INTENT: &str = "AMAZON.StopIntent";
pub const NEXT_INTENT: &str = "AMAZON.NextIntent";
pub const PHONE_NUMBER_INTENT: &str = "PhoneNumberIntent";
pub const DIRECTIONS_INTENT: &str = "DirectionsIntent";

/// Answers skill requests
pub struct SkillHandler {
    config: SkillConfig,
    address_lookup: Arc<dyn DeviceAddressLookup>,
    finder: ClosestErService,
}

impl SkillHandler {
    pub fn new(
        config: SkillConfig,
        address_lookup: Arc<dyn DeviceAddressLookup>,
        finder: ClosestErService,
    ) -> Self {
        Self {
            config,
            address_lookup,
            finder,
        }
    }

    /// Handle one request.
    ///
    /// Only verification failures are returned as errors. Every other
    /// failure is turned into a spoken response.
    pub async fn handle(&self, envelope: RequestEnvelope) -> Result<ResponseEnvelope> {
        self.handle_at(envelope, Utc::now()).await
    }

    /// Same as [`SkillHandler::handle`] with an explicit clock for the
    /// timestamp check
    pub async fn handle_at(
        &self,
        envelope: RequestEnvelope,
        now: DateTime<Utc>,
    ) -> Result<ResponseEnvelope> {
        let span = info_span!(
            "skill_request",
            request_id = %envelope.request_id(),
            request_type = envelope.request.kind(),
        );
        async move {
            self.verify(&envelope, now)?;
            Ok(self.dispatch(&envelope).await)
        }
        .instrument(span)
        .await
    }

    fn verify(&self, envelope: &RequestEnvelope, now: DateTime<Utc>) -> Result<()> {
        if let Some(expected) = self.config.application_id.as_deref() {
            match envelope.application_id() {
                Some(actual) if actual == expected => {}
                actual => {
                    warn!(?actual, "Rejecting request for another application");
                    return Err(CareFinderError::invalid_request(
                        "application id does not match",
                    ));
                }
            }
        }

        let tolerance = i64::from(self.config.timestamp_tolerance_seconds);
        if tolerance > 0 {
            if let Some(timestamp) = envelope.request.meta().and_then(|meta| meta.timestamp) {
                let age = (now - timestamp).num_seconds().abs();
                if age > tolerance {
                    warn!(age, tolerance, "Rejecting stale request");
                    return Err(CareFinderError::invalid_request(format!(
                        "request timestamp is {age} seconds away from now"
                    )));
                }
            }
        }

        Ok(())
    }

    async fn dispatch(&self, envelope: &RequestEnvelope) -> ResponseEnvelope {
        let mut state = SessionState::from_attributes(envelope.session_attributes());

        let (intent, outcome) = match &envelope.request {
            SkillRequest::LaunchRequest(_) => (None, self.on_launch(envelope, &mut state).await),
            SkillRequest::IntentRequest(request) => {
                let name = request.intent.name.as_str();
                (Some(name), self.on_intent(name, envelope, &mut state).await)
            }
            SkillRequest::SessionEndedRequest(request) => {
                info!(reason = ?request.reason, "Session ended");
                (None, Ok(ResponseEnvelope::tell(messages::GOODBYE)))
            }
            SkillRequest::Unknown => (
                None,
                Ok(ResponseEnvelope::ask(messages::UNHANDLED, messages::UNHANDLED)),
            ),
        };

        state.advance(intent);

        let response = outcome.unwrap_or_else(|e| failure_to_response(&e));
        response.with_session(&state)
    }

    async fn on_launch(
        &self,
        envelope: &RequestEnvelope,
        state: &mut SessionState,
    ) -> Result<ResponseEnvelope> {
        if envelope.is_new_session() {
            self.ensure_address(envelope, state).await?;
        }
        let speech = format!(
            "{}{}{}",
            messages::WELCOME,
            messages::HELP,
            messages::HELP_GENERIC
        );
        Ok(ResponseEnvelope::ask(&speech, messages::SAY_THAT_AGAIN))
    }

    async fn on_intent(
        &self,
        name: &str,
        envelope: &RequestEnvelope,
        state: &mut SessionState,
    ) -> Result<ResponseEnvelope> {
        debug!(intent = name, "Dispatching intent");
        match name {
            CLOSEST_ER_INTENT => {
                self.ensure_address(envelope, state).await?;
                let reference = state.address.as_ref().map(|context| context.location);
                let result = self.finder.closest(reference.as_ref()).await?;
                Ok(ResponseEnvelope::ask(&result.speech, &result.reprompt))
            }
            HELP_INTENT => Ok(ResponseEnvelope::ask(
                messages::HELP,
                messages::WHAT_DO_YOU_WANT,
            )),
            CANCEL_INTENT | STOP_INTENT => Ok(ResponseEnvelope::tell(messages::GOODBYE)),
            NEXT_INTENT | PHONE_NUMBER_INTENT | DIRECTIONS_INTENT => Ok(ResponseEnvelope::ask(
                messages::FOLLOW_UP_UNAVAILABLE,
                messages::SAY_THAT_AGAIN,
            )),
            other => {
                info!(intent = other, "Unhandled intent");
                Ok(ResponseEnvelope::ask(messages::UNHANDLED, messages::UNHANDLED))
            }
        }
    }

    /// Make sure the session carries a geocoded home address
    async fn ensure_address(
        &self,
        envelope: &RequestEnvelope,
        state: &mut SessionState,
    ) -> Result<()> {
        if state.address.is_some() {
            return Ok(());
        }

        let consent_token = envelope.consent_token().ok_or_else(|| {
            CareFinderError::missing_permission("request carries no consent token")
        })?;
        let (Some(device_id), Some(api_endpoint)) = (envelope.device_id(), envelope.api_endpoint())
        else {
            return Err(CareFinderError::address_api(
                "request context has no device id or API endpoint",
            ));
        };

        let request = DeviceAddressRequest {
            api_endpoint,
            device_id,
            consent_token,
        };
        let address = self.address_lookup.full_address(&request).await?;
        let query = address.to_query()?;
        let context = self.finder.resolve_address(&query).await?;

        info!(
            location = %context.location.format_coordinates(),
            "Resolved device address"
        );
        state.address = Some(context);
        Ok(())
    }
}

fn failure_to_response(e: &CareFinderError) -> ResponseEnvelope {
    match e.failure_response() {
        FailureResponse::PermissionCard => {
            info!("Asking the user for address permission: {}", e);
            ResponseEnvelope::tell_with_permission_card(e.user_message())
        }
        FailureResponse::Tell => {
            warn!("Turn ended early: {}", e);
            ResponseEnvelope::tell(e.user_message())
        }
        FailureResponse::Apology => {
            error!("Turn failed: {}", e);
            ResponseEnvelope::tell(e.user_message())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device_address::DeviceAddress;
    use crate::feed::FacilityFeed;
    use crate::geocoding::{GeocodeCandidate, GeocodingProvider};
    use crate::location_resolver::LocationResolver;
    use crate::models::{FacilityRecord, GeoCoordinate};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const APP_ID: &str = "amzn1.ask.skill.test";

    struct FakeAddress {
        outcome: fn() -> Result<DeviceAddress>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DeviceAddressLookup for FakeAddress {
        async fn full_address(&self, request: &DeviceAddressRequest<'_>) -> Result<DeviceAddress> {
            assert_eq!(request.consent_token, "token-123");
            assert_eq!(request.device_id, "device-1");
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.outcome)()
        }
    }

    fn seattle() -> Result<DeviceAddress> {
        Ok(DeviceAddress {
            address_line1: Some("410 Terry Ave North".to_string()),
            state_or_region: Some("WA".to_string()),
            postal_code: Some("98109".to_string()),
            ..DeviceAddress::default()
        })
    }

    struct FixedGeocoder;

    #[async_trait]
    impl GeocodingProvider for FixedGeocoder {
        async fn candidates(&self, _address: &str) -> Result<Vec<GeocodeCandidate>> {
            Ok(vec![GeocodeCandidate {
                formatted_address: None,
                location: GeoCoordinate::new(27.9506, -82.4572),
            }])
        }
    }

    struct StaticFeed;

    #[async_trait]
    impl FacilityFeed for StaticFeed {
        async fn fetch(&self, _hostname: &str, _path: &str) -> Result<Vec<FacilityRecord>> {
            Ok(vec![
                FacilityRecord {
                    title: "Orlando Regional".to_string(),
                    display_name: None,
                    latitude: "28.5383".to_string(),
                    longitude: "-81.3792".to_string(),
                    description: "25 minutes".to_string(),
                },
                FacilityRecord {
                    title: "Tampa General".to_string(),
                    display_name: None,
                    latitude: "27.9378".to_string(),
                    longitude: "-82.4412".to_string(),
                    description: "11 minutes".to_string(),
                },
            ])
        }
    }

    fn handler_with(outcome: fn() -> Result<DeviceAddress>) -> (SkillHandler, Arc<FakeAddress>) {
        let lookup = Arc::new(FakeAddress {
            outcome,
            calls: AtomicUsize::new(0),
        });
        let finder = ClosestErService::new(
            LocationResolver::new(Arc::new(FixedGeocoder)),
            Arc::new(StaticFeed),
            "feeds.example.org",
            "/er.json",
        );
        let config = SkillConfig {
            application_id: Some(APP_ID.to_string()),
            ..SkillConfig::default()
        };
        (SkillHandler::new(config, lookup.clone(), finder), lookup)
    }

    fn envelope(request: Value, new: bool, attributes: Value) -> RequestEnvelope {
        serde_json::from_value(json!({
            "version": "1.0",
            "session": {
                "new": new,
                "sessionId": "session-1",
                "application": {"applicationId": APP_ID},
                "attributes": attributes
            },
            "context": {
                "System": {
                    "application": {"applicationId": APP_ID},
                    "user": {"userId": "user-1", "permissions": {"consentToken": "token-123"}},
                    "device": {"deviceId": "device-1"},
                    "apiEndpoint": "https://api.amazonalexa.com"
                }
            },
            "request": request
        }))
        .unwrap()
    }

    fn intent(name: &str) -> Value {
        json!({
            "type": "IntentRequest",
            "requestId": "request-1",
            "timestamp": "2024-05-01T12:00:00Z",
            "intent": {"name": name}
        })
    }

    fn now() -> DateTime<Utc> {
        "2024-05-01T12:00:30Z".parse().unwrap()
    }

    #[tokio::test]
    async fn test_launch_resolves_address_and_welcomes() {
        let (handler, lookup) = handler_with(seattle);
        let request = json!({
            "type": "LaunchRequest",
            "requestId": "request-1",
            "timestamp": "2024-05-01T12:00:00Z"
        });

        let response = handler
            .handle_at(envelope(request, true, json!({})), now())
            .await
            .unwrap();

        let ssml = response.ssml().unwrap();
        assert!(ssml.starts_with("<speak>Welcome to the CareFinder Skill!"));
        assert!(!response.response.should_end_session);
        assert!(response.session_attributes.contains_key("address"));
        assert_eq!(response.session_attributes["turn"], json!(1));
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_closest_er_intent() {
        let (handler, _) = handler_with(seattle);
        let response = handler
            .handle_at(envelope(intent(CLOSEST_ER_INTENT), false, json!({})), now())
            .await
            .unwrap();

        let ssml = response.ssml().unwrap();
        assert!(ssml.contains("The closest ER is Tampa General, 1.3 miles away."));
        assert!(ssml.contains("Current wait time is 11 minutes."));
        assert!(!response.response.should_end_session);
        assert_eq!(
            response.session_attributes["lastIntent"],
            json!(CLOSEST_ER_INTENT)
        );
    }

    #[tokio::test]
    async fn test_stored_address_skips_lookup() {
        let (handler, lookup) = handler_with(seattle);
        let attributes = json!({
            "address": {
                "address": "1 Main St, FL",
                "location": {"latitude": 27.9506, "longitude": -82.4572}
            },
            "turn": 3
        });

        let response = handler
            .handle_at(envelope(intent(CLOSEST_ER_INTENT), false, attributes), now())
            .await
            .unwrap();

        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
        assert_eq!(response.session_attributes["turn"], json!(4));
    }

    #[tokio::test]
    async fn test_missing_permission_sends_card() {
        let (handler, _) = handler_with(|| Err(CareFinderError::missing_permission("403")));
        let response = handler
            .handle_at(envelope(intent(CLOSEST_ER_INTENT), false, json!({})), now())
            .await
            .unwrap();

        assert!(response.response.card.is_some());
        assert!(response.response.should_end_session);
        assert_eq!(
            response.ssml(),
            Some("<speak>Please enable Location permissions in the Amazon Alexa app.</speak>")
        );
    }

    #[tokio::test]
    async fn test_no_address_tells_user() {
        let (handler, _) = handler_with(|| Err(CareFinderError::NoAddress));
        let response = handler
            .handle_at(envelope(intent(CLOSEST_ER_INTENT), false, json!({})), now())
            .await
            .unwrap();

        assert!(response.response.card.is_none());
        assert!(response.response.should_end_session);
        assert!(response.ssml().unwrap().contains("don't have an address set"));
    }

    #[tokio::test]
    async fn test_stop_says_goodbye() {
        let (handler, lookup) = handler_with(seattle);
        let response = handler
            .handle_at(envelope(intent(STOP_INTENT), false, json!({})), now())
            .await
            .unwrap();

        assert_eq!(
            response.ssml(),
            Some("<speak>GoodBye! Thanks for using the CareFinder Skill!</speak>")
        );
        assert!(response.response.should_end_session);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_follow_up_intents_are_declined() {
        let (handler, _) = handler_with(seattle);
        for name in [NEXT_INTENT, PHONE_NUMBER_INTENT, DIRECTIONS_INTENT] {
            let response = handler
                .handle_at(envelope(intent(name), false, json!({})), now())
                .await
                .unwrap();
            assert!(response.ssml().unwrap().contains("can't do that yet"));
            assert!(!response.response.should_end_session);
        }
    }

    #[tokio::test]
    async fn test_unknown_intent_is_unhandled() {
        let (handler, _) = handler_with(seattle);
        let response = handler
            .handle_at(envelope(intent("WeatherIntent"), false, json!({})), now())
            .await
            .unwrap();
        assert!(response.ssml().unwrap().contains("doesn't support that"));
    }

    #[tokio::test]
    async fn test_wrong_application_is_rejected() {
        let (handler, _) = handler_with(seattle);
        let mut request = envelope(intent(HELP_INTENT), false, json!({}));
        if let Some(context) = request.context.as_mut() {
            context.system.application = None;
        }
        if let Some(session) = request.session.as_mut() {
            session.application = None;
        }

        let result = handler.handle_at(request, now()).await;
        assert!(matches!(result, Err(CareFinderError::InvalidRequest { .. })));
    }

    #[tokio::test]
    async fn test_stale_request_is_rejected() {
        let (handler, _) = handler_with(seattle);
        let late: DateTime<Utc> = "2024-05-01T12:10:00Z".parse().unwrap();
        let result = handler
            .handle_at(envelope(intent(HELP_INTENT), false, json!({})), late)
            .await;
        assert!(matches!(result, Err(CareFinderError::InvalidRequest { .. })));
    }
}
