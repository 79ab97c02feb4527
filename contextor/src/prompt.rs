//! Prompt builders. The assistant answers in Spanish, the language of the document.

use crate::select::{ExcerptKind, RelevantExcerpt};

/// System message for a single chunk of the chunk scan.
pub const CHUNK_SYSTEM: &str = "Eres un experto en comprensión de documentos PDF. \
Usa exclusivamente el fragmento de texto proporcionado para responder.";

/// Who the assistant speaks for and which document it answers from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub institution: String,
    pub document_title: String,
    pub document_url: String,
}

impl Persona {
    /// Fixed answer when the document does not contain the information.
    pub fn refusal_sentence(&self) -> String {
        format!(
            "Por el momento no puedo responder esa pregunta, para más información visita el sitio web de {} o visita {}",
            self.institution, self.document_url
        )
    }

    /// Whether `answer` is the refusal sentence, ignoring quotes and a final period.
    pub fn is_refusal(&self, answer: &str) -> bool {
        let norm = |s: &str| {
            s.trim()
                .trim_matches(|c: char| c == '\'' || c == '"' || c == '.')
                .trim()
                .to_string()
        };
        norm(answer) == norm(&self.refusal_sentence())
    }
}

/// Document text embedded in the system message.
#[derive(Debug, Clone, Copy)]
pub enum DocumentSection<'a> {
    Full(&'a str),
    Excerpt(&'a RelevantExcerpt),
}

/// System message: persona, document content, and answering rules.
pub fn system_prompt(persona: &Persona, section: DocumentSection<'_>) -> String {
    let (intro, label, content) = match section {
        DocumentSection::Full(text) => (
            "Tienes acceso completo al siguiente documento oficial de la institución",
            "CONTENIDO DEL DOCUMENTO",
            text.to_string(),
        ),
        DocumentSection::Excerpt(ex) => match ex.kind {
            ExcerptKind::Relevant => (
                "Tienes acceso a las secciones más relevantes del siguiente documento oficial de la institución",
                "SECCIONES RELEVANTES DEL DOCUMENTO",
                ex.render(),
            ),
            ExcerptKind::General | ExcerptKind::Fallback => (
                "Tienes acceso a la parte inicial del siguiente documento oficial de la institución",
                "CONTENIDO PARCIAL DEL DOCUMENTO",
                ex.render(),
            ),
        },
    };

    format!(
        "Eres un experto asistente educativo especializado en {institution}. {intro}:\n\n\
         DOCUMENTO: {title}\n\
         {label}:\n{content}\n\n\
         INSTRUCCIONES IMPORTANTES:\n\
         - Responde ÚNICAMENTE basado en la información del documento proporcionado\n\
         - Responde siempre en español\n\
         - Sé preciso, detallado y útil\n\
         - Si la información específica no está en el documento, responde: '{refusal}'\n\
         - No inventes información que no esté en el documento\n\
         - Cita secciones relevantes cuando sea apropiado\n\
         - Proporciona respuestas completas y bien estructuradas\n\
         - Usa la información exacta del documento proporcionado\n\
         - FORMATO DE RESPUESTA: Usa formato Markdown para mejorar la legibilidad:\n\
         \x20 * Usa **negrita** para información importante\n\
         \x20 * Usa *cursiva* para énfasis\n\
         \x20 * Usa listas con - o números para organizar información\n\
         \x20 * Usa ## para títulos de sección cuando sea apropiado\n\
         \x20 * Usa > para citas del documento\n\
         \x20 * Organiza la información de manera clara y fácil de leer",
        institution = persona.institution,
        title = persona.document_title,
        refusal = persona.refusal_sentence(),
    )
}

/// User message for chunk `number` of `total` (1-based).
pub fn chunk_prompt(
    persona: &Persona,
    chunk: &str,
    question: &str,
    number: usize,
    total: usize,
) -> String {
    format!(
        "Responde ÚNICAMENTE basado en el siguiente fragmento de texto extraído del documento PDF \
         (fragmento {number} de {total}). Si la información específica para responder la pregunta \
         no está en este fragmento, responde: '{refusal}'.\n\n\
         Fragmento del documento:\n{chunk}\n\n\
         Pregunta: {question}\n\n\
         Instrucciones:\n\
         - Responde ÚNICAMENTE basado en el fragmento de texto proporcionado\n\
         - Responde siempre en español\n\
         - Sé preciso y conciso\n\
         - No inventes información\n\
         - Cita secciones relevantes si es posible\n\
         - Si encuentras información relevante, proporciona una respuesta completa y detallada",
        refusal = persona.refusal_sentence(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::select;

    fn persona() -> Persona {
        Persona {
            institution: "ITCA-FEPADE".into(),
            document_title: "Guía Estudiantil".into(),
            document_url: "https://x/guia.pdf".into(),
        }
    }

    #[test]
    fn refusal_matching_ignores_quotes_and_period() {
        let p = persona();
        let r = p.refusal_sentence();
        assert!(p.is_refusal(&r));
        assert!(p.is_refusal(&format!("'{r}.'")));
        assert!(p.is_refusal(&format!("  {r}.\n")));
        assert!(!p.is_refusal("Las becas se solicitan en marzo."));
    }

    #[test]
    fn system_prompt_embeds_excerpt_and_rules() {
        let ex = select("Becas\n\nHorarios", "becas", 1_000);
        let sys = system_prompt(&persona(), DocumentSection::Excerpt(&ex));
        assert!(sys.starts_with("Eres un experto asistente educativo especializado en ITCA-FEPADE."));
        assert!(sys.contains("SECCIONES RELEVANTES DEL DOCUMENTO:\n"));
        assert!(sys.contains(&ex.trailer()));
        assert!(sys.contains(&persona().refusal_sentence()));
        assert!(sys.contains("  * Usa **negrita**"));
    }

    #[test]
    fn full_prompt_embeds_whole_text() {
        let sys = system_prompt(&persona(), DocumentSection::Full("TEXTO COMPLETO"));
        assert!(sys.contains("CONTENIDO DEL DOCUMENTO:\nTEXTO COMPLETO\n\n"));
    }

    #[test]
    fn chunk_prompt_names_position() {
        let p = chunk_prompt(&persona(), "trozo", "¿becas?", 2, 5);
        assert!(p.contains("(fragmento 2 de 5)"));
        assert!(p.contains("Fragmento del documento:\ntrozo\n\nPregunta: ¿becas?"));
    }
}
