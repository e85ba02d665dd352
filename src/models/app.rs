//! Typed views of the management API objects this proxy inspects.
//!
//! Only the fields the proxy reads are named; everything else the upstream
//! sends is kept in `extra` and serialized back out untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A registered client application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct App {
    pub name: String,
    #[serde(rename = "appId")]
    pub app_id: String,
    pub credentials: Vec<Credential>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A consumer key/secret pair attached to an app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "consumerSecret")]
    pub consumer_secret: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Element of the `GET /apps` listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSummary {
    pub name: String,
    #[serde(rename = "appId")]
    pub app_id: String,
}

impl From<&App> for AppSummary {
    fn from(app: &App) -> Self {
        Self {
            name: app.name.clone(),
            app_id: app.app_id.clone(),
        }
    }
}
