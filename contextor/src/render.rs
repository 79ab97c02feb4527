//! User-readable Markdown for failures that end up in the `response` field.

use ai_llm_service::AiLlmError;
use chrono::{DateTime, SecondsFormat, Utc};
use document_source::BuildFailure;
use serde::Serialize;

use crate::prompt::Persona;

/// Markdown for a failed completion call. Never empty.
pub fn api_error(err: &AiLlmError) -> String {
    let mut out = match err.status_code() {
        Some(status) => format!("❌ **Error de la API** (HTTP {status})\n\n"),
        None => format!("❌ **Error de la API** ({})\n\n", err.kind_label()),
    };

    match err.upstream() {
        Some(up) => {
            if let Some(kind) = &up.kind {
                out.push_str(&format!("- **Tipo:** {kind}\n"));
            }
            if let Some(msg) = &up.message {
                out.push_str(&format!("- **Mensaje:** {msg}\n"));
            }
            if let Some(code) = &up.code {
                out.push_str(&format!("- **Código:** {code}\n"));
            }
        }
        None => out.push_str(&format!("- **Detalle:** {err}\n")),
    }

    out.push('\n');
    out.push_str(hint(err));
    out
}

fn hint(err: &AiLlmError) -> &'static str {
    match err.status_code() {
        Some(401) | Some(403) => "El servicio de IA rechazó las credenciales configuradas.",
        Some(402) => "La cuenta del servicio de IA no tiene saldo disponible.",
        Some(429) => {
            "Se alcanzó el límite de solicitudes al servicio de IA. Por favor, intenta nuevamente en unos momentos."
        }
        Some(s) if s >= 500 => {
            "El servicio de IA no está disponible temporalmente. Por favor, intenta nuevamente más tarde."
        }
        _ => match err {
            AiLlmError::Timeout(_) => {
                "La consulta tardó demasiado en responder. Por favor, intenta con una pregunta más específica."
            }
            _ => "Error procesando la consulta. Por favor, intenta nuevamente.",
        },
    }
}

/// Markdown for a context that could not be built.
pub fn document_unavailable(failure: &BuildFailure, persona: &Persona) -> String {
    format!(
        "❌ **No se pudo procesar el documento predefinido**\n\n\
         No fue posible cargar *{title}* en este momento ({kind}).\n\n\
         Por favor, intenta nuevamente más tarde o consulta el documento directamente en {url}",
        title = persona.document_title,
        kind = failure.kind().as_str(),
        url = persona.document_url,
    )
}

/// Details of an unexpected fault caught at the request boundary.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub kind: String,
    pub message: String,
    pub location: String,
    pub session_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Diagnostic {
    pub fn new(
        kind: impl Into<String>,
        message: impl Into<String>,
        location: impl Into<String>,
        session_id: Option<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            location: location.into(),
            session_id,
            timestamp: Utc::now(),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "❌ **Error interno del servidor**\n\n\
             - **Tipo:** {kind}\n\
             - **Mensaje:** {message}\n\
             - **Ubicación:** {location}\n\
             - **Sesión:** {session}\n\
             - **Fecha:** {ts}\n\n\
             Por favor, intenta nuevamente. Si el problema persiste, contacta al administrador.",
            kind = self.kind,
            message = self.message,
            location = self.location,
            session = self.session_id.as_deref().unwrap_or("N/A"),
            ts = self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        )
    }
}
