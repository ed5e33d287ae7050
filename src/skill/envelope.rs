//! Request and response envelopes exchanged with the voice platform

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::device_address::ALL_ADDRESS_PERMISSION;
use crate::models::SessionState;

/// Incoming skill request
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    #[serde(default)]
    pub version: String,
    pub session: Option<Session>,
    pub context: Option<Context>,
    pub request: SkillRequest,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub new: bool,
    pub session_id: String,
    pub application: Option<Application>,
    pub attributes: Option<Map<String, Value>>,
    pub user: Option<User>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub application_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: Option<String>,
    pub permissions: Option<Permissions>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub consent_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Context {
    #[serde(rename = "System")]
    pub system: SystemContext,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemContext {
    pub application: Option<Application>,
    pub user: Option<User>,
    pub device: Option<Device>,
    pub api_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_id: String,
}

/// Fields shared by every request type
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMeta {
    pub request_id: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub locale: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IntentRequest {
    #[serde(flatten)]
    pub meta: RequestMeta,
    pub intent: Intent,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Intent {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionEndedRequest {
    #[serde(flatten)]
    pub meta: RequestMeta,
    pub reason: Option<String>,
}

/// Request body, discriminated by its `type`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum SkillRequest {
    LaunchRequest(RequestMeta),
    IntentRequest(IntentRequest),
    SessionEndedRequest(SessionEndedRequest),
    #[serde(other)]
    Unknown,
}

impl SkillRequest {
    #[must_use]
    pub fn meta(&self) -> Option<&RequestMeta> {
        match self {
            SkillRequest::LaunchRequest(meta) => Some(meta),
            SkillRequest::IntentRequest(request) => Some(&request.meta),
            SkillRequest::SessionEndedRequest(request) => Some(&request.meta),
            SkillRequest::Unknown => None,
        }
    }

    /// Name used in logs for the request type
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            SkillRequest::LaunchRequest(_) => "LaunchRequest",
            SkillRequest::IntentRequest(_) => "IntentRequest",
            SkillRequest::SessionEndedRequest(_) => "SessionEndedRequest",
            SkillRequest::Unknown => "Unknown",
        }
    }
}

impl RequestEnvelope {
    #[must_use]
    pub fn request_id(&self) -> &str {
        self.request
            .meta()
            .map_or("unknown", |meta| meta.request_id.as_str())
    }

    #[must_use]
    pub fn is_new_session(&self) -> bool {
        self.session.as_ref().is_some_and(|session| session.new)
    }

    /// Application id from the system context, else from the session
    #[must_use]
    pub fn application_id(&self) -> Option<&str> {
        self.system()
            .and_then(|system| system.application.as_ref())
            .or_else(|| self.session.as_ref().and_then(|s| s.application.as_ref()))
            .map(|application| application.application_id.as_str())
    }

    /// Consent token from the system context, else from the session user
    #[must_use]
    pub fn consent_token(&self) -> Option<&str> {
        fn from_user(user: Option<&User>) -> Option<&str> {
            user.and_then(|u| u.permissions.as_ref())
                .and_then(|p| p.consent_token.as_deref())
                .filter(|token| !token.is_empty())
        }

        from_user(self.system().and_then(|system| system.user.as_ref()))
            .or_else(|| from_user(self.session.as_ref().and_then(|s| s.user.as_ref())))
    }

    #[must_use]
    pub fn device_id(&self) -> Option<&str> {
        self.system()
            .and_then(|system| system.device.as_ref())
            .map(|device| device.device_id.as_str())
    }

    #[must_use]
    pub fn api_endpoint(&self) -> Option<&str> {
        self.system().and_then(|system| system.api_endpoint.as_deref())
    }

    #[must_use]
    pub fn session_attributes(&self) -> Option<&Map<String, Value>> {
        self.session.as_ref().and_then(|s| s.attributes.as_ref())
    }

    fn system(&self) -> Option<&SystemContext> {
        self.context.as_ref().map(|context| &context.system)
    }
}

/// Outgoing skill response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub version: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub session_attributes: Map<String, Value>,
    pub response: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_speech: Option<OutputSpeech>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<Reprompt>,
    pub should_end_session: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutputSpeech {
    #[serde(rename = "SSML")]
    Ssml { ssml: String },
}

impl OutputSpeech {
    /// Wrap an SSML fragment in a `<speak>` element
    #[must_use]
    pub fn ssml(fragment: &str) -> Self {
        OutputSpeech::Ssml {
            ssml: format!("<speak>{}</speak>", fragment.trim()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reprompt {
    pub output_speech: OutputSpeech,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Card {
    AskForPermissionsConsent { permissions: Vec<String> },
}

impl ResponseEnvelope {
    fn new(speech: &str, reprompt: Option<&str>, card: Option<Card>, end: bool) -> Self {
        Self {
            version: "1.0".to_string(),
            session_attributes: Map::new(),
            response: ResponseBody {
                output_speech: Some(OutputSpeech::ssml(speech)),
                card,
                reprompt: reprompt.map(|text| Reprompt {
                    output_speech: OutputSpeech::ssml(text),
                }),
                should_end_session: end,
            },
        }
    }

    /// Speak and end the session
    #[must_use]
    pub fn tell(speech: &str) -> Self {
        Self::new(speech, None, None, true)
    }

    /// Speak and keep listening, with a reprompt
    #[must_use]
    pub fn ask(speech: &str, reprompt: &str) -> Self {
        Self::new(speech, Some(reprompt), None, false)
    }

    /// Speak, attach an address-permission consent card and end the session
    #[must_use]
    pub fn tell_with_permission_card(speech: &str) -> Self {
        let card = Card::AskForPermissionsConsent {
            permissions: vec![ALL_ADDRESS_PERMISSION.to_string()],
        };
        Self::new(speech, None, Some(card), true)
    }

    /// Carry `state` forward as session attributes
    #[must_use]
    pub fn with_session(mut self, state: &SessionState) -> Self {
        self.session_attributes = state.to_attributes();
        self
    }

    /// The SSML of the main speech, if any
    #[must_use]
    pub fn ssml(&self) -> Option<&str> {
        match &self.response.output_speech {
            Some(OutputSpeech::Ssml { ssml }) => Some(ssml),
            None => None,
        }
    }
}
