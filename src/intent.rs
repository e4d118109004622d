use std::{collections::BTreeMap, fmt::Display};

use serde::{Deserialize, Serialize};
use serde_json::json;

pub const ACTION_SEND: &str = "android.intent.action.SEND";
pub const BRIDGE_ACTIVITY_CLASS: &str = "com.mastercard.cp3.bridgera.CommunityPassApiActivity";
pub const MIME_TEXT_PLAIN: &str = "text/plain";
pub const SAVE_BIOMETRIC_CONSENT_REQUEST_CODE: i64 = 401;

pub const PROGRAM_GUID: &str = "PROGRAM_GUID";
pub const RELIANT_GUID: &str = "RELIANT_GUID";
pub const REQUEST_CODE: &str = "REQUEST_CODE";
pub const REQUEST_DATA: &str = "REQUEST_DATA";
pub const RESPONSE_DATA: &str = "RESPONSE_DATA";
pub const RESPONSE_ERROR: &str = "RESPONSE_ERROR";

/// Key/value payload attached to an intent, in both directions.
pub type Extras = BTreeMap<String, serde_json::Value>;

/// Identity constants the bridge activity uses to recognise the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    package_name: String,
    program_guid: String,
    reliant_guid: String,
}

impl Identity {
    pub fn new(package_name: String, program_guid: String, reliant_guid: String) -> Identity {
        Identity {
            package_name,
            program_guid,
            reliant_guid,
        }
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn program_guid(&self) -> &str {
        &self.program_guid
    }

    pub fn reliant_guid(&self) -> &str {
        &self.reliant_guid
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentName {
    pub package: String,
    pub class: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsentRequest {
    action: &'static str,
    component: ComponentName,
    #[serde(rename = "type")]
    mime_type: &'static str,
    extras: Extras,
}

impl ConsentRequest {
    pub fn action(&self) -> &str {
        self.action
    }

    pub fn component(&self) -> &ComponentName {
        &self.component
    }

    pub fn mime_type(&self) -> &str {
        self.mime_type
    }

    pub fn extras(&self) -> &Extras {
        &self.extras
    }
}

pub fn build_consent_request(identity: &Identity, consent: bool) -> ConsentRequest {
    let mut extras = Extras::new();
    extras.insert(PROGRAM_GUID.to_owned(), json!(identity.program_guid()));
    extras.insert(RELIANT_GUID.to_owned(), json!(identity.reliant_guid()));
    extras.insert(REQUEST_CODE.to_owned(), json!(SAVE_BIOMETRIC_CONSENT_REQUEST_CODE));
    extras.insert(
        REQUEST_DATA.to_owned(),
        json!(json!({ "consumerConsentValue": consent }).to_string()),
    );

    ConsentRequest {
        action: ACTION_SEND,
        component: ComponentName {
            package: identity.package_name().to_owned(),
            class: BRIDGE_ACTIVITY_CLASS.to_owned(),
        },
        mime_type: MIME_TEXT_PLAIN,
        extras,
    }
}

/// Status and error codes arrive either as strings or as bare numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Code {
    Text(String),
    Number(serde_json::Number),
}

impl Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Code::Text(s) => f.write_str(s),
            Code::Number(n) => n.fmt(f),
        }
    }
}

impl From<&str> for Code {
    fn from(s: &str) -> Code {
        Code::Text(s.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentResponse {
    #[serde(rename = "responseStatus")]
    pub response_status: Code,
    #[serde(rename = "consentID")]
    pub consent_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentError {
    pub code: Code,
    pub message: String,
}
