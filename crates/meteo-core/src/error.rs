//! Error taxonomy for the weather lookup and the classifier that turns any
//! failure into a message fit for display.
//!
//! The `Display` strings of [`MeteoError`] are the raw, technical messages.
//! They only reach the end user through [`classify`], which recognises
//! transport and HTTP failures by substring and passes through messages that
//! are already phrased for the user.

use thiserror::Error;

/// Failures raised by the geo and weather clients.
#[derive(Debug, Error)]
pub enum MeteoError {
    /// Bad caller input (malformed postal code, missing city, day count out of range).
    #[error("{0}")]
    Validation(String),

    /// Missing or unusable configuration, such as the weather API token.
    #[error("{0}")]
    Config(String),

    /// Upstream payload does not have the expected shape.
    #[error("Format de réponse invalide: {0}")]
    Format(String),

    /// Upstream answered but returned nothing usable.
    #[error("{0}")]
    NotFound(String),

    /// Upstream answered with a non-2xx status.
    #[error("Erreur HTTP: {status} - {status_text} - {body}")]
    Http {
        status: u16,
        status_text: String,
        body: String,
    },

    /// The host could not be reached at all.
    #[error("NetworkError: {0}")]
    Network(String),
}

impl MeteoError {
    /// Message suitable for display, see [`classify`].
    pub fn user_message(&self) -> String {
        classify(&self.to_string())
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            MeteoError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub const MSG_NETWORK: &str =
    "Impossible de contacter le service. Vérifiez votre connexion internet.";
pub const MSG_SERVICE_UNAVAILABLE: &str =
    "Service météo temporairement indisponible. Veuillez réessayer plus tard.";
pub const MSG_AUTH: &str = "Erreur d'authentification avec l'API météo. Vérifiez votre token.";
pub const MSG_RATE_LIMIT: &str = "Trop de requêtes. Veuillez patienter quelques instants.";
pub const MSG_SERVER: &str = "Erreur du serveur météo. Veuillez réessayer plus tard.";

const NETWORK_MARKERS: &[&str] = &["NetworkError", "Failed to fetch"];
const DOMAIN_MARKERS: &[&str] = &["Token API", "code postal", "commune"];

/// Map a raw error message to a user-facing one.
///
/// Checks run in a fixed order and the first match wins, since a message may
/// carry several status-like substrings.
pub fn classify(message: &str) -> String {
    if NETWORK_MARKERS.iter().any(|m| message.contains(m)) {
        return MSG_NETWORK.to_string();
    }
    if message.contains("404") {
        return MSG_SERVICE_UNAVAILABLE.to_string();
    }
    if message.contains("401") || message.contains("403") {
        return MSG_AUTH.to_string();
    }
    if message.contains("429") {
        return MSG_RATE_LIMIT.to_string();
    }
    if message.contains("500") {
        return MSG_SERVER.to_string();
    }
    if DOMAIN_MARKERS.iter().any(|m| message.contains(m)) {
        return message.to_string();
    }
    format!("Une erreur est survenue: {}", message)
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_meteo_error(self) -> MeteoError;
}

impl ReqwestErrorExt for reqwest::Error {
    /// The request URL is stripped: it may carry the API token.
    fn into_meteo_error(self) -> MeteoError {
        let err = self.without_url();
        if err.is_timeout() {
            MeteoError::Network(format!("request timed out: {}", err))
        } else if err.is_decode() {
            MeteoError::Format(err.to_string())
        } else {
            MeteoError::Network(err.to_string())
        }
    }
}
